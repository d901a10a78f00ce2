//! Framing of the modern Java Edition status exchange.
//!
//! Every packet is a VarInt length followed by that many bytes: a VarInt
//! packet id and the packet body. The status response body is one string,
//! itself a VarInt byte count followed by UTF-8 JSON.

use anyhow::{Context, Result, anyhow, bail, ensure};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Upper bound on a status response, to refuse absurd length prefixes.
/// Vanilla caps strings at 32767 UTF-16 units, so 128 KiB is generous.
pub const MAX_PACKET_LEN: usize = 128 * 1024;

const STATUS_RESPONSE_ID: i32 = 0x00;

/// Read one VarInt from the stream.
pub async fn read_varint<R: AsyncRead + Unpin>(reader: &mut R) -> Result<i32> {
    let mut value = 0u32;
    for position in 0..5 {
        let byte = reader.read_u8().await?;
        value |= u32::from(byte & 0x7f) << (7 * position);
        if byte & 0x80 == 0 {
            return Ok(value as i32);
        }
    }
    bail!("varint is longer than 5 bytes")
}

/// Decode one VarInt from the front of `bytes`, advancing past it.
fn take_varint(bytes: &mut &[u8]) -> Result<i32> {
    let mut value = 0u32;
    for position in 0..5 {
        let (&byte, rest) = bytes
            .split_first()
            .ok_or_else(|| anyhow!("packet ends inside a varint"))?;
        *bytes = rest;
        value |= u32::from(byte & 0x7f) << (7 * position);
        if byte & 0x80 == 0 {
            return Ok(value as i32);
        }
    }
    bail!("varint is longer than 5 bytes")
}

fn packet_len(len: i32) -> Result<usize> {
    let len = usize::try_from(len).with_context(|| format!("negative packet length {len}"))?;
    ensure!(len <= MAX_PACKET_LEN, "packet length {len} exceeds {MAX_PACKET_LEN}");
    Ok(len)
}

/// Read a whole status response frame and return its JSON payload.
/// The frame may arrive split over any number of reads.
pub async fn read_status_response<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>> {
    let len = packet_len(read_varint(reader).await?)?;
    let mut packet = vec![0; len];
    reader
        .read_exact(&mut packet)
        .await
        .context("connection closed before the status response was complete")?;

    let mut body = packet.as_slice();
    let id = take_varint(&mut body)?;
    ensure!(id == STATUS_RESPONSE_ID, "unexpected packet id {id:#04x}");

    let json_len = packet_len(take_varint(&mut body)?)?;
    let json = body
        .get(..json_len)
        .ok_or_else(|| anyhow!("status json is {json_len} bytes but packet holds {}", body.len()))?;
    Ok(json.to_vec())
}

#[cfg(test)]
pub(crate) fn write_varint(out: &mut Vec<u8>, value: i32) {
    let mut value = value as u32;
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// A status response frame around `json`, as a server sends it.
#[cfg(test)]
pub(crate) fn status_response(json: &str) -> Vec<u8> {
    let mut packet = Vec::new();
    write_varint(&mut packet, STATUS_RESPONSE_ID);
    write_varint(&mut packet, json.len() as i32);
    packet.extend_from_slice(json.as_bytes());

    let mut frame = Vec::new();
    write_varint(&mut frame, packet.len() as i32);
    frame.extend(packet);
    frame
}
