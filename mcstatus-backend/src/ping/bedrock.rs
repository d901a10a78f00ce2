//! RakNet unconnected ping, answered by Bedrock Edition servers over UDP.
//!
//! The pong carries a `;`-separated server id string:
//! `edition;motd;protocol;version;online;max;server id;motd line 2;gamemode;gamemode id;port v4;port v6;`

use crate::query::BedrockStatus;
use crate::text::Formatted;
use anyhow::{Result, anyhow, ensure};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::net::{UdpSocket, lookup_host};

const UNCONNECTED_PING: u8 = 0x01;
const UNCONNECTED_PONG: u8 = 0x1c;

/// RakNet's offline message id, present in every unconnected packet.
const MAGIC: [u8; 16] = [
    0x00, 0xff, 0xff, 0x00, 0xfe, 0xfe, 0xfe, 0xfe, 0xfd, 0xfd, 0xfd, 0xfd, 0x12, 0x34, 0x56, 0x78,
];

const CLIENT_GUID: i64 = 0x6d63_7374_6174_7573;

/// id, time, server guid, magic, server id length
const PONG_HEADER_LEN: usize = 1 + 8 + 8 + MAGIC.len() + 2;

const MAX_DATAGRAM: usize = 2048;

pub async fn ping(host: &str, port: u16) -> Result<BedrockStatus> {
    let addr = lookup_host((host, port))
        .await?
        .next()
        .ok_or_else(|| anyhow!("{host} did not resolve to any address"))?;
    let local: SocketAddr = if addr.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };

    let socket = UdpSocket::bind(local).await?;
    socket.connect(addr).await?;
    socket.send(&ping_packet(now_millis())).await?;

    let mut buf = vec![0; MAX_DATAGRAM];
    let len = socket.recv(&mut buf).await?;
    parse_pong(&buf[..len])
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

fn ping_packet(time: i64) -> Vec<u8> {
    let mut packet = Vec::with_capacity(1 + 8 + MAGIC.len() + 8);
    packet.push(UNCONNECTED_PING);
    packet.extend(time.to_be_bytes());
    packet.extend(MAGIC);
    packet.extend(CLIENT_GUID.to_be_bytes());
    packet
}

fn parse_pong(packet: &[u8]) -> Result<BedrockStatus> {
    ensure!(
        packet.len() >= PONG_HEADER_LEN,
        "pong is only {} bytes",
        packet.len()
    );
    ensure!(
        packet[0] == UNCONNECTED_PONG,
        "unexpected packet id {:#04x}",
        packet[0]
    );
    ensure!(packet[17..33] == MAGIC, "pong is missing the offline message id");

    let len = usize::from(u16::from_be_bytes([packet[33], packet[34]]));
    let server_id = packet
        .get(PONG_HEADER_LEN..PONG_HEADER_LEN + len)
        .ok_or_else(|| anyhow!("server id of {len} bytes overruns the pong"))?;

    Ok(parse_server_id(&String::from_utf8_lossy(server_id)))
}

fn parse_server_id(server_id: &str) -> BedrockStatus {
    let fields: Vec<&str> = server_id.split(';').collect();

    let motd = match (field(&fields, 1), field(&fields, 7)) {
        (Some(first), Some(second)) => Some(format!("{first}\n{second}")),
        (first, second) => first.or(second).map(str::to_owned),
    };

    BedrockStatus {
        edition: field(&fields, 0).map(str::to_owned),
        motd: motd.map(|motd| Formatted::from_legacy(&motd)),
        protocol_version: number(&fields, 2),
        version: field(&fields, 3).map(str::to_owned),
        online_players: number(&fields, 4),
        max_players: number(&fields, 5),
        server_id: field(&fields, 6).map(str::to_owned),
        gamemode: field(&fields, 8).map(str::to_owned),
        gamemode_id: number(&fields, 9),
        port_ipv4: number(&fields, 10),
        port_ipv6: number(&fields, 11),
    }
}

/// Non-empty field at `index`
fn field<'a>(fields: &[&'a str], index: usize) -> Option<&'a str> {
    fields.get(index).copied().filter(|value| !value.is_empty())
}

fn number<T: FromStr>(fields: &[&str], index: usize) -> Option<T> {
    field(fields, index)?.parse().ok()
}
