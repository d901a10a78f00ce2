//! Production `StatusClient`.
//!
//! Modern Java queries build their packets and decode the status document with
//! the `mc-ping` crate, reading the response frame with [`frame`]. Legacy Java
//! and Bedrock pings are spoken directly by [`legacy`] and [`bedrock`].
//!
//! Each query runs inline under the client's timeout, so dropping the caller
//! drops the query and closes its socket.

mod bedrock;
mod frame;
mod legacy;

use crate::query::{
    BedrockStatus, JavaPlayers, JavaStatus, JavaVersion, LegacyJavaStatus, ModEntry, ModInfo,
    QueryError, SamplePlayer, StatusClient,
};
use crate::text::Formatted;
use mc_ping::mc_text::{Description, ServerStatus};
use mc_ping::packets::{ClientHandshake, StatusQuery};
use serde::Deserialize;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct McPingClient {
    timeout: Duration,
}

impl McPingClient {
    /// `timeout` bounds a whole query: resolve, connect, request and response.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn bounded<T>(
        &self,
        query: impl Future<Output = anyhow::Result<T>>,
    ) -> Result<T, QueryError> {
        match tokio::time::timeout(self.timeout, query).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(QueryError::Timeout),
        }
    }
}

/// Handshake into the status state, request the status and decode the reply.
async fn java_ping(host: &str, port: u16) -> anyhow::Result<ServerStatus> {
    let mut stream = TcpStream::connect((host, port)).await?;

    let mut request = ClientHandshake::new(host.to_owned(), port).to_bytes();
    request.extend(StatusQuery::new().to_bytes());
    stream.write_all(&request).await?;

    let json = frame::read_status_response(&mut stream).await?;
    Ok(serde_json::from_slice(&json)?)
}

impl StatusClient for McPingClient {
    async fn java(&self, host: &str, port: u16) -> Result<JavaStatus, QueryError> {
        let status = self.bounded(java_ping(host, port)).await?;
        debug!(host, port, protocol = status.version.protocol, "java status received");
        Ok(java_status(status))
    }

    async fn java_legacy(&self, host: &str, port: u16) -> Result<LegacyJavaStatus, QueryError> {
        let status = self.bounded(legacy::ping(host, port)).await?;
        debug!(host, port, "legacy java status received");
        Ok(status)
    }

    async fn bedrock(&self, host: &str, port: u16) -> Result<BedrockStatus, QueryError> {
        let status = self.bounded(bedrock::ping(host, port)).await?;
        debug!(host, port, "bedrock status received");
        Ok(status)
    }
}

fn java_status(status: ServerStatus) -> JavaStatus {
    let motd = match &status.description {
        Description::Text(text) => Formatted::from_legacy(text),
        Description::Complex(component) => Formatted::from_component(component),
    };

    let sample = (!status.players.sample.is_empty()).then(|| {
        status
            .players
            .sample
            .iter()
            .map(|player| SamplePlayer {
                id: player.id.clone(),
                name: Formatted::from_legacy(&player.name),
            })
            .collect()
    });

    JavaStatus {
        version: JavaVersion {
            name: Formatted::from_legacy(&status.version.name),
            protocol: status.version.protocol,
        },
        players: JavaPlayers {
            online: status.players.online.into(),
            max: status.players.max.into(),
            sample,
        },
        motd,
        favicon: status.favicon.clone(),
        mod_info: mod_info(&status.extra),
    }
}

/// `modinfo` as sent by Forge up to 1.12
#[derive(Deserialize)]
struct FmlModInfo {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(rename = "modList", default)]
    mod_list: Vec<FmlMod>,
}

#[derive(Deserialize)]
struct FmlMod {
    modid: String,
    #[serde(default)]
    version: String,
}

/// `forgeData` as sent by Forge 1.13+
#[derive(Deserialize)]
struct ForgeData {
    #[serde(default)]
    mods: Vec<ForgeMod>,
}

#[derive(Deserialize)]
struct ForgeMod {
    #[serde(rename = "modId")]
    mod_id: String,
    #[serde(default)]
    modmarker: String,
}

fn mod_info(extra: &Value) -> Option<ModInfo> {
    if let Some(modinfo) = extra.get("modinfo") {
        let info = FmlModInfo::deserialize(modinfo).ok()?;
        return Some(ModInfo {
            kind: info.kind.unwrap_or_else(|| "FML".to_owned()),
            mods: info
                .mod_list
                .into_iter()
                .map(|m| ModEntry {
                    id: m.modid,
                    version: m.version,
                })
                .collect(),
        });
    }

    let data = ForgeData::deserialize(extra.get("forgeData")?).ok()?;
    Some(ModInfo {
        kind: "FML2".to_owned(),
        mods: data
            .mods
            .into_iter()
            .map(|m| ModEntry {
                id: m.mod_id,
                version: m.modmarker,
            })
            .collect(),
    })
}
