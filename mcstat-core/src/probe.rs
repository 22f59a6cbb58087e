//! The status probe: connect, handshake, request, decode.
//!
//! A probe is a straight-line sequence bounded by one deadline. It holds
//! no state between calls, so every invocation is independent.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpStream, lookup_host};
use tracing::{debug, trace};

use crate::codec::{framed, read_packet, write_packet};
use crate::error::ProbeError;
use crate::packet::{Handshake, LEGACY_PROTOCOL_VERSION, decode_status_response, status_request};
use crate::resolve::resolve_srv;
use crate::status::{Address, ProbeResult, ServerStatus};

/// Deadline applied when the caller does not pick one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

// ── ProbeOptions ─────────────────────────────────────────────────

/// Knobs for a single probe.
#[derive(Debug, Clone)]
pub struct ProbeOptions {
    /// Deadline covering resolution, connect and the whole exchange.
    pub timeout: Duration,
    /// Protocol version declared in the handshake.
    pub protocol_version: u32,
    /// Look up `_minecraft._tcp` SRV records for port-less addresses.
    pub resolve_srv: bool,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            protocol_version: LEGACY_PROTOCOL_VERSION,
            resolve_srv: true,
        }
    }
}

impl ProbeOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }
}

// ── Entry points ─────────────────────────────────────────────────

/// Probe `address` with default options and the given deadline.
pub async fn probe(address: &Address, timeout: Duration) -> ProbeResult {
    probe_with(address, &ProbeOptions::with_timeout(timeout)).await
}

/// Probe `address` with explicit options.
///
/// The connection is closed before this returns, whatever the outcome.
pub async fn probe_with(address: &Address, options: &ProbeOptions) -> ProbeResult {
    let outcome = tokio::time::timeout(options.timeout, exchange(address, options))
        .await
        .unwrap_or(Err(ProbeError::Timeout));

    match &outcome {
        Ok(status) => debug!(
            %address,
            version = %status.version,
            players = status.players_online,
            latency_ms = status.latency_ms,
            "probe succeeded"
        ),
        Err(e) => debug!(%address, "probe failed: {e}"),
    }
    outcome.into()
}

async fn exchange(address: &Address, options: &ProbeOptions) -> Result<ServerStatus, ProbeError> {
    let srv = if options.resolve_srv {
        resolve_srv(address).await
    } else {
        None
    };
    let target = srv.as_ref().unwrap_or(address);

    let started = Instant::now();
    let stream = connect(target).await?;
    let mut packets = framed(stream);

    let handshake = Handshake::status(options.protocol_version, target.host(), target.port());
    write_packet(&mut packets, handshake.encode()).await?;
    write_packet(&mut packets, status_request()).await?;
    trace!(%target, "handshake and status request sent");

    let body = read_packet(&mut packets).await?;
    let json = decode_status_response(body)?;
    let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
    let status = ServerStatus::from_json(&json, latency_ms)?;

    // Error paths drop the socket, which closes it.
    let mut stream = packets.into_inner();
    if let Err(e) = stream.shutdown().await {
        trace!("shutdown after status: {e}");
    }
    Ok(status)
}

/// Resolve `target` and connect to the first address that accepts.
async fn connect(target: &Address) -> Result<TcpStream, ProbeError> {
    let addrs: Vec<SocketAddr> = lookup_host((target.host(), target.port()))
        .await
        .map_err(|e| ProbeError::DnsFailure(format!("{}: {e}", target.host())))?
        .collect();
    if addrs.is_empty() {
        return Err(ProbeError::DnsFailure(target.host().to_string()));
    }

    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                stream.set_nodelay(true).ok();
                trace!(%addr, "connected");
                return Ok(stream);
            }
            Err(e) => {
                trace!(%addr, "connect failed: {e}");
                last_err = Some(e);
            }
        }
    }
    Err(last_err.map_or(ProbeError::ConnectionRefused, ProbeError::from_connect))
}

// ── Probe trait ──────────────────────────────────────────────────

/// Something that can produce a [`ProbeResult`] for an address.
///
/// The monitor drives probes through this seam so tests can substitute
/// scripted outcomes.
#[async_trait]
pub trait Probe: Send + Sync + 'static {
    async fn probe(&self, address: &Address) -> ProbeResult;
}

#[async_trait]
impl<P: Probe + ?Sized> Probe for Arc<P> {
    async fn probe(&self, address: &Address) -> ProbeResult {
        (**self).probe(address).await
    }
}

/// The network-backed [`Probe`].
#[derive(Debug, Clone, Default)]
pub struct StatusProbe {
    options: ProbeOptions,
}

impl StatusProbe {
    pub fn new(options: ProbeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ProbeOptions {
        &self.options
    }
}

#[async_trait]
impl Probe for StatusProbe {
    async fn probe(&self, address: &Address) -> ProbeResult {
        probe_with(address, &self.options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let opts = ProbeOptions::default();
        assert_eq!(opts.timeout, Duration::from_secs(5));
        assert_eq!(opts.protocol_version, 47);
        assert!(opts.resolve_srv);
    }

    #[tokio::test]
    async fn unresolvable_host_is_dns_failure() {
        let addr = Address::parse("nonexistent.invalid:25565").unwrap();
        let result = probe(&addr, Duration::from_secs(5)).await;
        assert!(
            matches!(
                result.error(),
                Some(ProbeError::DnsFailure(_) | ProbeError::Timeout)
            ),
            "{result:?}"
        );
    }
}
