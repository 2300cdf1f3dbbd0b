//! RCON wire codec: length-prefixed binary framing, no I/O policy.
//!
//! A well-formed frame is
//! `length(4 LE) | request_id(4 LE) | type(4 LE) | payload(UTF-8) | NUL NUL`
//! where `length` counts everything after itself. The two trailing NUL bytes
//! are protocol padding, not payload.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::error::{RconError, Result};

/// Largest command/response payload the protocol allows (Minecraft servers
/// cap RCON payloads at 4096 bytes).
pub const MAX_PAYLOAD_SIZE: usize = 4096;

/// Size of the length prefix in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Smallest valid frame body: request id (4) + type (4) + two NUL terminators.
pub const MIN_BODY_SIZE: usize = 10;

/// Request id echoed by the server when authentication is rejected.
pub const AUTH_FAILURE_ID: i32 = -1;

/// RCON packet type codes. The server reuses `Command` (2) for auth
/// responses, so unknown codes are carried through rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    /// Authentication request (3).
    Login,
    /// Command request, also used by servers for auth responses (2).
    Command,
    /// Command response value (0).
    Response,
    /// Any other code observed on the wire.
    Other(i32),
}

impl PacketType {
    pub fn code(self) -> i32 {
        match self {
            PacketType::Login => 3,
            PacketType::Command => 2,
            PacketType::Response => 0,
            PacketType::Other(code) => code,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            3 => PacketType::Login,
            2 => PacketType::Command,
            0 => PacketType::Response,
            other => PacketType::Other(other),
        }
    }
}

/// A decoded RCON packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub request_id: i32,
    pub packet_type: PacketType,
    pub payload: String,
}

/// Encodes a complete frame, length prefix included.
///
/// Output is exactly `4 + 4 + 4 + payload.len() + 2` bytes.
pub fn encode_packet(request_id: i32, packet_type: PacketType, payload: &str) -> Vec<u8> {
    let payload_bytes = payload.as_bytes();
    let body_length = 4 + 4 + payload_bytes.len() + 2;
    let mut buffer = Vec::with_capacity(LENGTH_PREFIX_SIZE + body_length);

    buffer.extend_from_slice(&(body_length as i32).to_le_bytes());
    buffer.extend_from_slice(&request_id.to_le_bytes());
    buffer.extend_from_slice(&packet_type.code().to_le_bytes());
    buffer.extend_from_slice(payload_bytes);
    buffer.extend_from_slice(&[0, 0]);

    buffer
}

/// Decodes a frame body (everything after the length prefix).
pub fn decode_body(body: &[u8]) -> Result<Packet> {
    if body.len() < MIN_BODY_SIZE {
        return Err(RconError::MalformedPacket {
            reason: format!("frame body of {} bytes is below the {MIN_BODY_SIZE}-byte minimum", body.len()),
        });
    }

    let request_id = i32::from_le_bytes([body[0], body[1], body[2], body[3]]);
    let type_code = i32::from_le_bytes([body[4], body[5], body[6], body[7]]);
    let payload = std::str::from_utf8(&body[8..body.len() - 2])
        .map_err(|e| RconError::MalformedPacket {
            reason: format!("payload is not valid UTF-8: {e}"),
        })?
        .to_string();

    Ok(Packet {
        request_id,
        packet_type: PacketType::from_code(type_code),
        payload,
    })
}

/// Reads one complete packet from the stream.
///
/// The transport delivers bytes, not messages: partial reads are expected and
/// `read_exact` loops until the full frame has arrived. A declared length
/// that cannot be a valid frame fails with [`RconError::MalformedPacket`].
pub async fn read_packet<R>(reader: &mut R) -> Result<Packet>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; LENGTH_PREFIX_SIZE];
    reader.read_exact(&mut header).await?;
    let length = i32::from_le_bytes(header);

    if length < MIN_BODY_SIZE as i32 || length as usize > MAX_PAYLOAD_SIZE + MIN_BODY_SIZE {
        return Err(RconError::MalformedPacket {
            reason: format!("declared frame length {length} is outside the valid range"),
        });
    }

    let mut body = vec![0u8; length as usize];
    reader.read_exact(&mut body).await?;

    let packet = decode_body(&body)?;
    trace!(
        request_id = packet.request_id,
        packet_type = packet.packet_type.code(),
        payload_len = packet.payload.len(),
        "read packet"
    );
    Ok(packet)
}

/// Writes one complete packet to the stream and flushes it.
pub async fn write_packet<W>(
    writer: &mut W,
    request_id: i32,
    packet_type: PacketType,
    payload: &str,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_packet(request_id, packet_type, payload);
    writer.write_all(&frame).await?;
    writer.flush().await?;
    trace!(
        request_id,
        packet_type = packet_type.code(),
        payload_len = payload.len(),
        "wrote packet"
    );
    Ok(())
}
