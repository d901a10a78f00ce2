//! Client-facing status documents.
//!
//! Optional fields always serialize, as `null` or an empty list, so clients
//! never have to tell a missing key from an unknown value.

use serde::{Deserialize, Serialize};

/// Fields present in every status document, online or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub online: bool,
    pub host: String,
    pub port: u16,
    /// Whether the host is on the EULA blocklist. Independent of reachability.
    pub eula_blocked: bool,
}

impl StatusResponse {
    pub fn new(host: &str, port: u16, online: bool, eula_blocked: bool) -> Self {
        Self {
            online,
            host: host.to_owned(),
            port,
            eula_blocked,
        }
    }
}

/// Either a full document for a reachable server or the bare base record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Report<T> {
    Online(T),
    Offline(StatusResponse),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JavaStatusResponse {
    #[serde(flatten)]
    pub base: StatusResponse,
    pub version: Option<JavaVersion>,
    pub players: JavaPlayers,
    pub motd: Motd,
    pub icon: Option<String>,
    pub mods: Vec<Mod>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JavaVersion {
    pub name_raw: String,
    pub name_clean: String,
    pub name_html: String,
    pub protocol: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JavaPlayers {
    pub online: i64,
    pub max: i64,
    pub list: Vec<Player>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub uuid: String,
    pub name_raw: String,
    pub name_clean: String,
    pub name_html: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Motd {
    pub raw: String,
    pub clean: String,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mod {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BedrockStatusResponse {
    #[serde(flatten)]
    pub base: StatusResponse,
    pub version: Option<BedrockVersion>,
    pub players: Option<BedrockPlayers>,
    pub motd: Option<Motd>,
    pub gamemode: Option<String>,
    pub server_id: Option<String>,
    pub edition: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BedrockVersion {
    pub name: Option<String>,
    pub protocol: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BedrockPlayers {
    pub online: Option<i64>,
    pub max: Option<i64>,
}
