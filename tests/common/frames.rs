//! Hand-rolled RCON frame helpers.
//!
//! Deliberately independent of the crate's codec so protocol tests verify
//! the wire format against a second implementation rather than against
//! itself.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

pub const TYPE_LOGIN: i32 = 3;
pub const TYPE_COMMAND: i32 = 2;
pub const TYPE_RESPONSE: i32 = 0;

/// Reads one frame from the stream. Returns `None` on clean EOF.
pub async fn read_frame(stream: &mut TcpStream) -> Option<(i32, i32, String)> {
    let mut header = [0u8; 4];
    if stream.read_exact(&mut header).await.is_err() {
        return None;
    }
    let length = i32::from_le_bytes(header) as usize;

    let mut body = vec![0u8; length];
    stream.read_exact(&mut body).await.ok()?;

    let request_id = i32::from_le_bytes([body[0], body[1], body[2], body[3]]);
    let packet_type = i32::from_le_bytes([body[4], body[5], body[6], body[7]]);
    let payload = String::from_utf8(body[8..length - 2].to_vec()).ok()?;

    Some((request_id, packet_type, payload))
}

/// Writes one frame: `length | request_id | type | payload | NUL NUL`.
pub async fn write_frame(stream: &mut TcpStream, request_id: i32, packet_type: i32, payload: &str) {
    let payload_bytes = payload.as_bytes();
    let body_length = (4 + 4 + payload_bytes.len() + 2) as i32;

    let mut frame = Vec::with_capacity(4 + body_length as usize);
    frame.extend_from_slice(&body_length.to_le_bytes());
    frame.extend_from_slice(&request_id.to_le_bytes());
    frame.extend_from_slice(&packet_type.to_le_bytes());
    frame.extend_from_slice(payload_bytes);
    frame.extend_from_slice(&[0, 0]);

    stream.write_all(&frame).await.expect("write frame");
    stream.flush().await.expect("flush frame");
}
