//! # mcstat-core
//!
//! Status probing and reachability monitoring for Minecraft Java
//! Edition servers over the Server List Ping protocol.
//!
//! This crate contains:
//! - **Varint**: the protocol's variable-length integer encoding
//! - **Codec**: `PacketCodec` for length-prefixed framing via `tokio_util`
//! - **Packets**: handshake, status request and status response bodies
//! - **Probe**: `probe` / `StatusProbe`, one deadline-bounded status query
//! - **Monitor**: `Monitor` / `MonitorHandle`, single-flight periodic probing
//!   with transition notifications
//! - **State**: `MonitorState`, the per-session transition rules
//! - **Error**: `ProbeError` and friends, `thiserror`-based

pub mod codec;
pub mod error;
pub mod monitor;
pub mod motd;
pub mod packet;
pub mod probe;
pub mod resolve;
pub mod state;
pub mod status;
pub mod varint;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use codec::{MAX_PACKET_LEN, PacketCodec, read_packet, write_packet};
pub use error::{AddressError, MonitorError, NotifyError, ProbeError};
pub use monitor::{Monitor, MonitorConfig, MonitorHandle, Notification, Notifier, StatusSink};
pub use motd::{NO_MOTD, normalize_motd};
pub use probe::{Probe, ProbeOptions, StatusProbe, probe, probe_with};
pub use state::{MonitorState, Observation};
pub use status::{Address, DEFAULT_PORT, ProbeResult, Reachability, ServerStatus};
pub use varint::{decode_varint, encode_varint};
