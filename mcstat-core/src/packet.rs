//! The three packets of the status exchange.
//!
//! ```text
//! client ── Handshake { id=0x00, protocol, host, port, next_state=1 } ──► server
//! client ── StatusRequest { id=0x00 } ────────────────────────────────► server
//! client ◄─ StatusResponse { id=0x00, json: String } ───────────────── server
//! ```
//!
//! Only packet bodies are built and parsed here; the length prefix is
//! added by [`PacketCodec`](crate::codec::PacketCodec).

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::error::ProbeError;
use crate::varint::{decode_varint, put_varint, varint_len};

/// Packet ID shared by the handshake, status request and status response.
pub const STATUS_PACKET_ID: u32 = 0x00;

/// Protocol version declared in the handshake. Servers answer status
/// requests regardless of the version a client claims.
pub const LEGACY_PROTOCOL_VERSION: u32 = 47;

/// `next_state` value asking the server for the status flow.
pub const NEXT_STATE_STATUS: u32 = 1;

// ── Handshake ────────────────────────────────────────────────────

/// Opening packet declaring intent to query status rather than log in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake<'a> {
    pub protocol_version: u32,
    pub host: &'a str,
    pub port: u16,
    pub next_state: u32,
}

impl<'a> Handshake<'a> {
    /// A status-intent handshake for `host:port`.
    pub fn status(protocol_version: u32, host: &'a str, port: u16) -> Self {
        Self {
            protocol_version,
            host,
            port,
            next_state: NEXT_STATE_STATUS,
        }
    }

    /// Serialize the packet body.
    pub fn encode(&self) -> Bytes {
        let mut body = BytesMut::with_capacity(
            1 + varint_len(self.protocol_version) + string_len(self.host) + 2 + 1,
        );
        put_varint(&mut body, STATUS_PACKET_ID);
        put_varint(&mut body, self.protocol_version);
        put_string(&mut body, self.host);
        body.put_u16(self.port);
        put_varint(&mut body, self.next_state);
        body.freeze()
    }
}

/// Body of the status request: just the packet ID.
pub fn status_request() -> Bytes {
    let mut body = BytesMut::with_capacity(1);
    put_varint(&mut body, STATUS_PACKET_ID);
    body.freeze()
}

/// Pull the JSON document out of a status response body.
///
/// The leading packet ID is read and discarded.
pub fn decode_status_response(mut body: Bytes) -> Result<String, ProbeError> {
    let packet_id = decode_varint(&mut body)?;
    if packet_id != STATUS_PACKET_ID {
        debug!(packet_id, "unexpected status response packet id");
    }
    get_string(&mut body)
}

// ── Strings ──────────────────────────────────────────────────────

/// Write a varint-length-prefixed UTF-8 string.
pub fn put_string<B: BufMut>(dst: &mut B, value: &str) {
    put_varint(dst, value.len() as u32);
    dst.put_slice(value.as_bytes());
}

fn string_len(value: &str) -> usize {
    varint_len(value.len() as u32) + value.len()
}

/// Read a varint-length-prefixed UTF-8 string.
pub fn get_string<B: Buf>(src: &mut B) -> Result<String, ProbeError> {
    let len = decode_varint(src)? as usize;
    if len > src.remaining() {
        return Err(ProbeError::malformed(format!(
            "string of {len} bytes exceeds the {} remaining",
            src.remaining()
        )));
    }
    let raw = src.copy_to_bytes(len);
    Ok(String::from_utf8(raw.to_vec())?)
}
