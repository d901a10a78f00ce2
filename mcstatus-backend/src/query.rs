//! Upstream status records and the client seam that produces them.
//!
//! The wire protocols live in `crate::ping`; this module only describes what a
//! successful query yields.

use crate::text::Formatted;
use std::future::Future;
use thiserror::Error;

/// Version block of a Java Edition status.
#[derive(Debug, Clone, PartialEq)]
pub struct JavaVersion {
    pub name: Formatted,
    pub protocol: i32,
}

/// Entry of the player sample shown in the client's server list hover.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplePlayer {
    pub id: String,
    pub name: Formatted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JavaPlayers {
    pub online: i64,
    pub max: i64,
    pub sample: Option<Vec<SamplePlayer>>,
}

/// Mod loader metadata advertised by modded servers.
#[derive(Debug, Clone, PartialEq)]
pub struct ModInfo {
    /// Loader type, e.g. `FML` or `FML2`
    pub kind: String,
    pub mods: Vec<ModEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModEntry {
    pub id: String,
    pub version: String,
}

/// Result of a modern (1.7+) Java Edition status query.
#[derive(Debug, Clone, PartialEq)]
pub struct JavaStatus {
    pub version: JavaVersion,
    pub players: JavaPlayers,
    pub motd: Formatted,
    /// Favicon as a data URI, if the server has one
    pub favicon: Option<String>,
    pub mod_info: Option<ModInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyPlayers {
    pub online: i64,
    pub max: i64,
}

/// Result of a legacy (pre-1.7) Java Edition ping.
/// Very old servers don't report a version at all.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyJavaStatus {
    pub version: Option<JavaVersion>,
    pub players: LegacyPlayers,
    pub motd: Formatted,
}

/// Result of a Bedrock Edition unconnected ping. Every field is optional upstream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BedrockStatus {
    pub edition: Option<String>,
    pub motd: Option<Formatted>,
    pub protocol_version: Option<i64>,
    pub version: Option<String>,
    pub online_players: Option<i64>,
    pub max_players: Option<i64>,
    pub server_id: Option<String>,
    pub gamemode: Option<String>,
    pub gamemode_id: Option<i64>,
    pub port_ipv4: Option<u16>,
    pub port_ipv6: Option<u16>,
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("query timed out")]
    Timeout,

    #[error(transparent)]
    Protocol(#[from] anyhow::Error),
}

/// Capability to query a server, given its host and port.
///
/// Failures are ordinary outcomes: the resolver falls back or reports the
/// server offline, it never inspects the error.
pub trait StatusClient: Send + Sync + 'static {
    /// Modern Java Edition status handshake.
    fn java(
        &self,
        host: &str,
        port: u16,
    ) -> impl Future<Output = Result<JavaStatus, QueryError>> + Send;

    /// Legacy Java Edition server list ping.
    fn java_legacy(
        &self,
        host: &str,
        port: u16,
    ) -> impl Future<Output = Result<LegacyJavaStatus, QueryError>> + Send;

    /// Bedrock Edition unconnected ping.
    fn bedrock(
        &self,
        host: &str,
        port: u16,
    ) -> impl Future<Output = Result<BedrockStatus, QueryError>> + Send;
}
