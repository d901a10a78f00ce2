//! Minecraft formatted text.
//!
//! Servers describe themselves either with legacy `§` formatting codes or with
//! JSON chat components. Every such string is exposed three ways: as sent,
//! with the codes stripped, and rendered to HTML.

use serde_json::{Map, Value};

const SECTION: char = '§';

/// Named colors with their legacy code and HTML color.
const COLORS: [(&str, char, &str); 16] = [
    ("black", '0', "#000000"),
    ("dark_blue", '1', "#0000aa"),
    ("dark_green", '2', "#00aa00"),
    ("dark_aqua", '3', "#00aaaa"),
    ("dark_red", '4', "#aa0000"),
    ("dark_purple", '5', "#aa00aa"),
    ("gold", '6', "#ffaa00"),
    ("gray", '7', "#aaaaaa"),
    ("dark_gray", '8', "#555555"),
    ("blue", '9', "#5555ff"),
    ("green", 'a', "#55ff55"),
    ("aqua", 'b', "#55ffff"),
    ("red", 'c', "#ff5555"),
    ("light_purple", 'd', "#ff55ff"),
    ("yellow", 'e', "#ffff55"),
    ("white", 'f', "#ffffff"),
];

/// One string in its three renderings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Formatted {
    /// Text as received, formatting codes included
    pub raw: String,
    /// Text with all formatting codes removed
    pub clean: String,
    /// Text rendered as HTML spans
    pub html: String,
}

impl Formatted {
    /// Render a string that may contain legacy `§` codes.
    pub fn from_legacy(text: &str) -> Self {
        let mut clean = String::with_capacity(text.len());
        let mut html = String::with_capacity(text.len());
        let mut run = String::new();
        let mut style = Style::default();

        let mut chars = text.chars();
        while let Some(c) = chars.next() {
            if c == SECTION {
                let mut next = style;
                if let Some(rest) = next.apply_code(chars.as_str()) {
                    chars = rest.chars();
                    if next != style {
                        flush_run(&mut html, &style, &mut run);
                        style = next;
                    }
                    continue;
                }
            }

            clean.push(c);
            run.push(c);
        }
        flush_run(&mut html, &style, &mut run);

        Self {
            raw: text.to_owned(),
            clean,
            html,
        }
    }

    /// Render a JSON chat component (string, array, or object with `extra` children).
    pub fn from_component(component: &Value) -> Self {
        let mut raw = String::new();
        let mut last = Style::default();
        flatten(component, Style::default(), &mut last, &mut raw);
        Self::from_legacy(&raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// One of the sixteen legacy colors, by code
    Code(char),
    Rgb([u8; 3]),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Style {
    color: Option<Color>,
    obfuscated: bool,
    bold: bool,
    strikethrough: bool,
    underlined: bool,
    italic: bool,
}

impl Style {
    /// Apply the code at the start of `text`, which directly follows a `§`.
    /// Returns the text after the code, or `None` if there is no valid code.
    fn apply_code<'a>(&mut self, text: &'a str) -> Option<&'a str> {
        let mut chars = text.chars();
        let code = chars.next()?.to_ascii_lowercase();

        // §x§r§r§g§g§b§b
        if code == 'x' {
            let (rgb, rest) = hex_sequence(chars.as_str())?;
            self.set_color(Color::Rgb(rgb));
            return Some(rest);
        }

        self.apply(code).then(|| chars.as_str())
    }

    /// Apply a single-character legacy code. Returns false if `code` isn't one.
    fn apply(&mut self, code: char) -> bool {
        match code {
            '0'..='9' | 'a'..='f' => self.set_color(Color::Code(code)),
            'k' => self.obfuscated = true,
            'l' => self.bold = true,
            'm' => self.strikethrough = true,
            'n' => self.underlined = true,
            'o' => self.italic = true,
            'r' => *self = Style::default(),
            _ => return false,
        }
        true
    }

    // A color resets all formatting
    fn set_color(&mut self, color: Color) {
        *self = Style {
            color: Some(color),
            ..Style::default()
        };
    }

    fn is_plain(&self) -> bool {
        *self == Style::default()
    }

    /// Overlay the style fields of a chat component.
    fn inherit(mut self, fields: &Map<String, Value>) -> Style {
        if let Some(Value::String(name)) = fields.get("color") {
            if let Some(color) = named_color(name) {
                self.color = Some(color);
            }
        }

        for (key, flag) in [
            ("obfuscated", &mut self.obfuscated),
            ("bold", &mut self.bold),
            ("strikethrough", &mut self.strikethrough),
            ("underlined", &mut self.underlined),
            ("italic", &mut self.italic),
        ] {
            if let Some(Value::Bool(value)) = fields.get(key) {
                *flag = *value;
            }
        }

        self
    }

    fn push_codes(&self, out: &mut String) {
        match self.color {
            Some(Color::Code(code)) => {
                out.push(SECTION);
                out.push(code);
            }
            Some(Color::Rgb(rgb)) => {
                out.push(SECTION);
                out.push('x');
                for digit in hex_digits(rgb).chars() {
                    out.push(SECTION);
                    out.push(digit);
                }
            }
            None => {
                out.push(SECTION);
                out.push('r');
            }
        }

        for (enabled, code) in [
            (self.obfuscated, 'k'),
            (self.bold, 'l'),
            (self.strikethrough, 'm'),
            (self.underlined, 'n'),
            (self.italic, 'o'),
        ] {
            if enabled {
                out.push(SECTION);
                out.push(code);
            }
        }
    }

    fn css(&self) -> String {
        let mut rules = Vec::new();

        match self.color {
            Some(Color::Code(code)) => {
                if let Some(hex) = color_hex(code) {
                    rules.push(format!("color: {hex};"));
                }
            }
            Some(Color::Rgb(rgb)) => rules.push(format!("color: #{};", hex_digits(rgb))),
            None => {}
        }
        if self.bold {
            rules.push("font-weight: bold;".to_owned());
        }
        if self.italic {
            rules.push("font-style: italic;".to_owned());
        }

        let decorations: Vec<&str> = [
            (self.underlined, "underline"),
            (self.strikethrough, "line-through"),
        ]
        .into_iter()
        .filter_map(|(enabled, name)| enabled.then_some(name))
        .collect();
        if !decorations.is_empty() {
            rules.push(format!("text-decoration: {};", decorations.join(" ")));
        }

        rules.join(" ")
    }
}

/// A component color: a legacy color name or `#rrggbb`.
fn named_color(name: &str) -> Option<Color> {
    if let Some(hex) = name.strip_prefix('#') {
        return parse_rgb(hex).map(Color::Rgb);
    }

    COLORS
        .iter()
        .find(|(color, _, _)| *color == name)
        .map(|(_, code, _)| Color::Code(*code))
}

fn parse_rgb(hex: &str) -> Option<[u8; 3]> {
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let [_, r, g, b] = u32::from_str_radix(hex, 16).ok()?.to_be_bytes();
    Some([r, g, b])
}

fn hex_digits([r, g, b]: [u8; 3]) -> String {
    format!("{r:02x}{g:02x}{b:02x}")
}

/// Read the six `§`-prefixed digits that follow `§x`.
fn hex_sequence(text: &str) -> Option<([u8; 3], &str)> {
    let mut chars = text.chars();
    let mut digits = String::with_capacity(6);
    for _ in 0..6 {
        if chars.next()? != SECTION {
            return None;
        }
        digits.push(chars.next()?);
    }

    Some((parse_rgb(&digits)?, chars.as_str()))
}

fn color_hex(code: char) -> Option<&'static str> {
    COLORS
        .iter()
        .find(|(_, c, _)| *c == code)
        .map(|(_, _, hex)| *hex)
}

fn flatten(value: &Value, style: Style, last: &mut Style, out: &mut String) {
    match value {
        Value::String(text) => push_text(text, style, last, out),
        Value::Number(number) => push_text(&number.to_string(), style, last, out),
        Value::Bool(flag) => push_text(&flag.to_string(), style, last, out),
        Value::Array(parts) => {
            for part in parts {
                flatten(part, style, last, out);
            }
        }
        Value::Object(fields) => {
            let style = style.inherit(fields);

            if let Some(text) = fields.get("text") {
                if !text.is_object() && !text.is_array() {
                    flatten(text, style, last, out);
                }
            }

            if let Some(Value::Array(extra)) = fields.get("extra") {
                for child in extra {
                    flatten(child, style, last, out);
                }
            }
        }
        Value::Null => {}
    }
}

fn push_text(text: &str, style: Style, last: &mut Style, out: &mut String) {
    if text.is_empty() {
        return;
    }

    if style != *last {
        style.push_codes(out);
        *last = style;
    }

    out.push_str(text);
}

fn flush_run(html: &mut String, style: &Style, run: &mut String) {
    if run.is_empty() {
        return;
    }

    if style.is_plain() {
        escape_into(html, run);
    } else {
        html.push_str("<span");
        if style.obfuscated {
            html.push_str(" class=\"minecraft-format-obfuscated\"");
        }
        let css = style.css();
        if !css.is_empty() {
            html.push_str(" style=\"");
            html.push_str(&css);
            html.push('"');
        }
        html.push('>');
        escape_into(html, run);
        html.push_str("</span>");
    }

    run.clear();
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_text() {
        let text = Formatted::from_legacy("A Minecraft Server");
        assert_eq!(text.raw, "A Minecraft Server");
        assert_eq!(text.clean, "A Minecraft Server");
        assert_eq!(text.html, "A Minecraft Server");
    }

    #[test]
    fn test_legacy_codes() {
        let text = Formatted::from_legacy("§6A §lMinecraft§r Server");
        assert_eq!(text.raw, "§6A §lMinecraft§r Server");
        assert_eq!(text.clean, "A Minecraft Server");
        assert_eq!(
            text.html,
            "<span style=\"color: #ffaa00;\">A </span>\
             <span style=\"color: #ffaa00; font-weight: bold;\">Minecraft</span> Server"
        );
    }

    #[test]
    fn test_uppercase_codes() {
        let text = Formatted::from_legacy("§CRed");
        assert_eq!(text.clean, "Red");
        assert_eq!(text.html, "<span style=\"color: #ff5555;\">Red</span>");
    }

    #[test]
    fn test_unknown_code_is_kept() {
        let text = Formatted::from_legacy("100§z and §");
        assert_eq!(text.clean, "100§z and §");
    }

    #[test]
    fn test_html_is_escaped() {
        let text = Formatted::from_legacy("<b>Tom & \"Jerry\"</b>");
        assert_eq!(
            text.html,
            "&lt;b&gt;Tom &amp; &quot;Jerry&quot;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_obfuscated_and_decorations() {
        let text = Formatted::from_legacy("§k§n§mx");
        assert_eq!(
            text.html,
            "<span class=\"minecraft-format-obfuscated\" \
             style=\"text-decoration: underline line-through;\">x</span>"
        );
    }

    #[test]
    fn test_component_inherits_style() {
        let component = json!({
            "text": "Hello ",
            "color": "gold",
            "extra": [{ "text": "world", "bold": true }, "!"]
        });

        let text = Formatted::from_component(&component);
        assert_eq!(text.raw, "§6Hello §6§lworld§6!");
        assert_eq!(text.clean, "Hello world!");
    }

    #[test]
    fn test_component_string_and_array() {
        assert_eq!(Formatted::from_component(&json!("plain")).raw, "plain");

        let text = Formatted::from_component(&json!(["a", { "text": "b", "color": "red" }, "c"]));
        assert_eq!(text.raw, "a§cb§rc");
        assert_eq!(text.clean, "abc");
    }

    #[test]
    fn test_component_hex_color() {
        let component = json!({
            "text": "Sky",
            "color": "#3A9BDC",
            "extra": [{ "text": "Block", "bold": true }]
        });

        let text = Formatted::from_component(&component);
        assert_eq!(text.raw, "§x§3§a§9§b§d§cSky§x§3§a§9§b§d§c§lBlock");
        assert_eq!(text.clean, "SkyBlock");
        assert_eq!(
            text.html,
            "<span style=\"color: #3a9bdc;\">Sky</span>\
             <span style=\"color: #3a9bdc; font-weight: bold;\">Block</span>"
        );
    }

    #[test]
    fn test_legacy_hex_sequence() {
        let text = Formatted::from_legacy("§x§F§F§0§0§8§0pink§r plain");
        assert_eq!(text.clean, "pink plain");
        assert_eq!(
            text.html,
            "<span style=\"color: #ff0080;\">pink</span> plain"
        );
    }

    #[test]
    fn test_malformed_hex_color_is_ignored() {
        let text = Formatted::from_component(&json!({ "text": "x", "color": "#12345g" }));
        assert_eq!(text.raw, "x");

        // A truncated sequence isn't a color, but its digits still are codes
        let text = Formatted::from_legacy("§x§1§2end");
        assert_eq!(text.clean, "§xend");
    }
}
