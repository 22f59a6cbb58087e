//! Error types shared by the probe client and the monitor.
//!
//! A probe never panics on bad input: every failure is classified into
//! a [`ProbeError`] at the point where it happens, so callers only ever
//! see one of a handful of variants.

use std::io;
use thiserror::Error;

/// Why a single status probe failed.
///
/// Every variant is terminal for that probe attempt only. The monitor
/// keeps ticking regardless of how many probes fail in a row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    // ── Transport ────────────────────────────────────────────────
    /// The connect + exchange deadline elapsed.
    #[error("timed out")]
    Timeout,

    /// The TCP connection could not be established.
    #[error("connection refused")]
    ConnectionRefused,

    /// The host name did not resolve to any address.
    #[error("could not resolve host: {0}")]
    DnsFailure(String),

    // ── Wire ─────────────────────────────────────────────────────
    /// Malformed or unexpected bytes at the framing layer.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The bytes framed correctly but the status JSON was unusable.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Anything that does not fit another variant.
    #[error("{0}")]
    Other(String),
}

impl ProbeError {
    /// Shorthand for [`ProbeError::Protocol`].
    pub fn protocol(detail: impl Into<String>) -> Self {
        Self::Protocol(detail.into())
    }

    /// Shorthand for [`ProbeError::MalformedResponse`].
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::MalformedResponse(detail.into())
    }

    /// Classify an error returned while establishing the connection.
    pub fn from_connect(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut => Self::Timeout,
            _ => Self::ConnectionRefused,
        }
    }
}

/// Classifies I/O errors raised after the connection is up.
impl From<io::Error> for ProbeError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut => Self::Timeout,
            io::ErrorKind::UnexpectedEof => Self::protocol("truncated packet"),
            io::ErrorKind::InvalidData => Self::Protocol(err.to_string()),
            _ => Self::Other(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ProbeError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for ProbeError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::MalformedResponse(format!("invalid utf-8: {err}"))
    }
}

// ── AddressError ─────────────────────────────────────────────────

/// Rejected address input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// Nothing but whitespace was supplied.
    #[error("server address is empty")]
    Empty,

    /// The host part could not be used.
    #[error("invalid host: {0}")]
    InvalidHost(String),
}

// ── MonitorError ─────────────────────────────────────────────────

/// Errors raised when a monitoring session cannot be started.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    InvalidAddress(#[from] AddressError),

    /// A zero polling interval would spin.
    #[error("polling interval must be greater than zero")]
    ZeroInterval,
}

// ── NotifyError ──────────────────────────────────────────────────

/// Failure of a notification sink. Logged, never propagated.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("notification failed: {0}")]
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        assert_eq!(ProbeError::Timeout.to_string(), "timed out");
        let e = ProbeError::protocol("varint too long");
        assert!(e.to_string().contains("varint too long"));
        let e = ProbeError::DnsFailure("nowhere.invalid".into());
        assert!(e.to_string().contains("nowhere.invalid"));
    }

    #[test]
    fn connect_errors_are_refused_unless_timed_out() {
        let refused = io::Error::new(io::ErrorKind::ConnectionRefused, "nope");
        assert_eq!(ProbeError::from_connect(refused), ProbeError::ConnectionRefused);

        let reset = io::Error::new(io::ErrorKind::ConnectionReset, "reset");
        assert_eq!(ProbeError::from_connect(reset), ProbeError::ConnectionRefused);

        let slow = io::Error::new(io::ErrorKind::TimedOut, "slow");
        assert_eq!(ProbeError::from_connect(slow), ProbeError::Timeout);
    }

    #[test]
    fn from_io_after_connect() {
        let eof = io::Error::new(io::ErrorKind::UnexpectedEof, "eof");
        assert_eq!(ProbeError::from(eof), ProbeError::protocol("truncated packet"));

        let pipe = io::Error::new(io::ErrorKind::BrokenPipe, "pipe broke");
        assert!(matches!(ProbeError::from(pipe), ProbeError::Other(_)));
    }

    #[test]
    fn from_json() {
        let err = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err();
        assert!(matches!(ProbeError::from(err), ProbeError::MalformedResponse(_)));
    }

    #[test]
    fn monitor_error_wraps_address_error() {
        let e: MonitorError = AddressError::Empty.into();
        assert_eq!(e.to_string(), "server address is empty");
    }
}
