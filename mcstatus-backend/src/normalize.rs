//! Conversion of upstream query results into client-facing documents.

use crate::models::{
    BedrockPlayers, BedrockStatusResponse, BedrockVersion, JavaPlayers, JavaStatusResponse,
    JavaVersion, Mod, Motd, Player, StatusResponse,
};
use crate::query;
use crate::text::Formatted;

impl From<Formatted> for Motd {
    fn from(text: Formatted) -> Self {
        Self {
            raw: text.raw,
            clean: text.clean,
            html: text.html,
        }
    }
}

impl From<query::JavaVersion> for JavaVersion {
    fn from(version: query::JavaVersion) -> Self {
        Self {
            name_raw: version.name.raw,
            name_clean: version.name.clean,
            name_html: version.name.html,
            protocol: version.protocol,
        }
    }
}

impl From<query::SamplePlayer> for Player {
    fn from(player: query::SamplePlayer) -> Self {
        Self {
            uuid: player.id,
            name_raw: player.name.raw,
            name_clean: player.name.clean,
            name_html: player.name.html,
        }
    }
}

impl From<query::ModEntry> for Mod {
    fn from(entry: query::ModEntry) -> Self {
        Self {
            name: entry.id,
            version: entry.version,
        }
    }
}

/// Document for a server that answered the modern status query.
///
/// A missing player sample or mod list becomes an empty list.
pub fn java_status(base: StatusResponse, status: query::JavaStatus) -> JavaStatusResponse {
    let list = status
        .players
        .sample
        .unwrap_or_default()
        .into_iter()
        .map(Player::from)
        .collect();

    let mods = status
        .mod_info
        .map(|info| info.mods.into_iter().map(Mod::from).collect())
        .unwrap_or_default();

    JavaStatusResponse {
        base,
        version: Some(status.version.into()),
        players: JavaPlayers {
            online: status.players.online,
            max: status.players.max,
            list,
        },
        motd: status.motd.into(),
        icon: status.favicon,
        mods,
    }
}

/// Document for a server that only answered the legacy ping.
///
/// The legacy protocol carries neither an icon nor mods, so those are always empty.
pub fn legacy_java_status(base: StatusResponse, status: query::LegacyJavaStatus) -> JavaStatusResponse {
    JavaStatusResponse {
        base,
        version: status.version.map(JavaVersion::from),
        players: JavaPlayers {
            online: status.players.online,
            max: status.players.max,
            list: Vec::new(),
        },
        motd: status.motd.into(),
        icon: None,
        mods: Vec::new(),
    }
}

/// Document for a Bedrock server.
///
/// `version` and `players` stay `null` unless at least one of their fields was
/// reported; once one is, the container exists and unreported fields are `null`.
pub fn bedrock_status(base: StatusResponse, status: query::BedrockStatus) -> BedrockStatusResponse {
    let mut version: Option<BedrockVersion> = None;
    let mut players: Option<BedrockPlayers> = None;

    if let Some(name) = status.version {
        version.get_or_insert_with(BedrockVersion::default).name = Some(name);
    }
    if let Some(protocol) = status.protocol_version {
        version.get_or_insert_with(BedrockVersion::default).protocol = Some(protocol);
    }

    if let Some(online) = status.online_players {
        players.get_or_insert_with(BedrockPlayers::default).online = Some(online);
    }
    if let Some(max) = status.max_players {
        players.get_or_insert_with(BedrockPlayers::default).max = Some(max);
    }

    BedrockStatusResponse {
        base,
        version,
        players,
        motd: status.motd.map(Motd::from),
        gamemode: status.gamemode,
        server_id: status.server_id,
        edition: status.edition,
    }
}
