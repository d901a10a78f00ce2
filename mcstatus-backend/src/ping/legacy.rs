//! Server list ping of Java Edition servers older than 1.7.
//!
//! The client sends `FE 01`; the server answers with a kick packet (`FF`)
//! whose reason is a UTF-16BE string, prefixed by its length in code units.
//! Servers from 1.4 on send `§1\0protocol\0version\0motd\0online\0max`,
//! older ones `motd§online§max`.

use crate::query::{JavaVersion, LegacyJavaStatus, LegacyPlayers};
use crate::text::Formatted;
use anyhow::{Context, Result, bail, ensure};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

const LEGACY_PING: [u8; 2] = [0xfe, 0x01];
const KICK_PACKET_ID: u8 = 0xff;
const MODERN_PREFIX: &str = "§1\0";

pub async fn ping(host: &str, port: u16) -> Result<LegacyJavaStatus> {
    let mut stream = TcpStream::connect((host, port)).await?;
    stream.write_all(&LEGACY_PING).await?;
    let reason = read_kick(&mut stream).await?;
    parse(&reason)
}

async fn read_kick<R: AsyncRead + Unpin>(reader: &mut R) -> Result<String> {
    let id = reader.read_u8().await?;
    ensure!(id == KICK_PACKET_ID, "unexpected packet id {id:#04x}");

    let units = usize::from(reader.read_u16().await?);
    let mut bytes = vec![0; units * 2];
    reader
        .read_exact(&mut bytes)
        .await
        .context("connection closed inside the kick reason")?;

    let utf16: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    Ok(String::from_utf16(&utf16)?)
}

fn parse(reason: &str) -> Result<LegacyJavaStatus> {
    if let Some(fields) = reason.strip_prefix(MODERN_PREFIX) {
        let fields: Vec<&str> = fields.split('\0').collect();
        let &[protocol, version, motd, online, max] = fields.as_slice() else {
            bail!("expected 5 ping fields, got {}", fields.len());
        };

        return Ok(LegacyJavaStatus {
            version: Some(JavaVersion {
                name: Formatted::from_legacy(version),
                protocol: protocol.parse().context("protocol")?,
            }),
            players: players(online, max)?,
            motd: Formatted::from_legacy(motd),
        });
    }

    // The motd may itself contain `§`, the counts never do
    let mut fields = reason.rsplitn(3, '§');
    let (Some(max), Some(online), Some(motd)) = (fields.next(), fields.next(), fields.next())
    else {
        bail!("malformed ping response");
    };

    Ok(LegacyJavaStatus {
        version: None,
        players: players(online, max)?,
        motd: Formatted::from_legacy(motd),
    })
}

fn players(online: &str, max: &str) -> Result<LegacyPlayers> {
    Ok(LegacyPlayers {
        online: online.parse().context("online players")?,
        max: max.parse().context("max players")?,
    })
}
