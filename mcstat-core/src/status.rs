//! Shared data model: server addresses and probe outcomes.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{AddressError, ProbeError};
use crate::motd::normalize_motd;

/// Port used when the input does not name one.
pub const DEFAULT_PORT: u16 = 25565;

// ── Address ──────────────────────────────────────────────────────

/// A server to probe.
///
/// Parsed once from user input and immutable afterwards. The host is
/// never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    host: String,
    port: u16,
    explicit_port: bool,
}

impl Address {
    /// Build an address from already separated parts.
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, AddressError> {
        let host = validate_host(host.into())?;
        Ok(Self {
            host,
            port,
            explicit_port: true,
        })
    }

    /// Parse `host`, `host:port` or `[v6]:port`.
    ///
    /// A missing, empty, zero or non-numeric port falls back to
    /// [`DEFAULT_PORT`] instead of rejecting the input.
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(AddressError::Empty);
        }

        let (host, port) = if let Some(rest) = input.strip_prefix('[') {
            let (host, tail) = rest
                .split_once(']')
                .ok_or_else(|| AddressError::InvalidHost(input.to_string()))?;
            let port = match tail {
                "" => None,
                tail => Some(
                    tail.strip_prefix(':')
                        .ok_or_else(|| AddressError::InvalidHost(input.to_string()))?,
                ),
            };
            (host, port)
        } else {
            match input.rsplit_once(':') {
                // A bare IPv6 literal has more than one colon.
                Some((host, _)) if host.contains(':') => (input, None),
                Some((host, port)) => (host, Some(port)),
                None => (input, None),
            }
        };

        let port = port
            .and_then(|p| p.trim().parse::<u16>().ok())
            .filter(|&p| p != 0);
        Ok(Self {
            host: validate_host(host.to_string())?,
            port: port.unwrap_or(DEFAULT_PORT),
            explicit_port: port.is_some(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether the user supplied a valid port. Only addresses without
    /// one are eligible for SRV lookup.
    pub fn has_explicit_port(&self) -> bool {
        self.explicit_port
    }
}

fn validate_host(host: String) -> Result<String, AddressError> {
    let host = host.trim();
    if host.is_empty() {
        return Err(AddressError::Empty);
    }
    if host.chars().any(char::is_whitespace) {
        return Err(AddressError::InvalidHost(host.to_string()));
    }
    Ok(host.to_string())
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

// ── ServerStatus ─────────────────────────────────────────────────

/// Decoded status of a reachable server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerStatus {
    pub version: String,
    /// Protocol number the server reports, if any.
    pub protocol: Option<u32>,
    pub players_online: u32,
    pub players_max: u32,
    /// Names from `players.sample`, in server order.
    pub player_sample: Vec<String>,
    pub motd: String,
    /// Wall-clock time of the whole exchange.
    pub latency_ms: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawStatus {
    version: Option<RawVersion>,
    players: Option<RawPlayers>,
    description: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawVersion {
    name: Option<String>,
    /// Proxies and maintenance plugins send `-1` or other junk here.
    protocol: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPlayers {
    online: Option<u32>,
    max: Option<u32>,
    /// Entries are `{"name", "id"}` objects, but not every server sticks
    /// to that.
    sample: Option<Vec<Value>>,
}

impl ServerStatus {
    /// Decode the status JSON document returned by the server.
    pub fn from_json(json: &str, latency_ms: f64) -> Result<Self, ProbeError> {
        let value: Value = serde_json::from_str(json)?;
        if !value.is_object() {
            return Err(ProbeError::malformed("status is not a JSON object"));
        }
        let raw: RawStatus = serde_json::from_value(value)?;

        let version = raw.version.unwrap_or_default();
        let players = raw.players.unwrap_or_default();
        Ok(Self {
            version: version.name.unwrap_or_else(|| "Unknown".to_string()),
            protocol: version
                .protocol
                .as_ref()
                .and_then(Value::as_u64)
                .and_then(|p| u32::try_from(p).ok()),
            players_online: players.online.unwrap_or(0),
            players_max: players.max.unwrap_or(0),
            player_sample: players
                .sample
                .unwrap_or_default()
                .into_iter()
                .filter_map(|p| p.get("name")?.as_str().map(str::to_string))
                .collect(),
            motd: normalize_motd(raw.description.as_ref()),
            latency_ms,
        })
    }
}

// ── ProbeResult ──────────────────────────────────────────────────

/// Outcome of one probe. Online-ness is the variant itself.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeResult {
    Status(ServerStatus),
    Failure(ProbeError),
}

impl ProbeResult {
    pub fn reachability(&self) -> Reachability {
        match self {
            Self::Status(_) => Reachability::Online,
            Self::Failure(_) => Reachability::Offline,
        }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, Self::Status(_))
    }

    pub fn status(&self) -> Option<&ServerStatus> {
        match self {
            Self::Status(status) => Some(status),
            Self::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ProbeError> {
        match self {
            Self::Status(_) => None,
            Self::Failure(err) => Some(err),
        }
    }
}

impl From<Result<ServerStatus, ProbeError>> for ProbeResult {
    fn from(result: Result<ServerStatus, ProbeError>) -> Self {
        match result {
            Ok(status) => Self::Status(status),
            Err(err) => Self::Failure(err),
        }
    }
}

// ── Reachability ─────────────────────────────────────────────────

/// Classification of the most recent probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Reachability {
    /// Nothing observed yet in this session.
    #[default]
    Unknown,
    Online,
    Offline,
}

impl fmt::Display for Reachability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "UNKNOWN"),
            Self::Online => write!(f, "ONLINE"),
            Self::Offline => write!(f, "OFFLINE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_host_only_uses_default_port() {
        let addr = Address::parse("mc.example.net").unwrap();
        assert_eq!(addr.host(), "mc.example.net");
        assert_eq!(addr.port(), DEFAULT_PORT);
        assert!(!addr.has_explicit_port());
    }

    #[test]
    fn parse_host_and_port() {
        let addr: Address = " localhost:25570 ".parse().unwrap();
        assert_eq!(addr.host(), "localhost");
        assert_eq!(addr.port(), 25570);
        assert!(addr.has_explicit_port());
        assert_eq!(addr.to_string(), "localhost:25570");
    }

    #[test]
    fn bad_port_falls_back() {
        for input in ["host:abc", "host:", "host:70000", "host:-1"] {
            let addr = Address::parse(input).unwrap();
            assert_eq!(addr.host(), "host", "{input}");
            assert_eq!(addr.port(), DEFAULT_PORT, "{input}");
            assert!(!addr.has_explicit_port());
        }
    }

    #[test]
    fn ipv6_forms() {
        let addr = Address::parse("[::1]:25566").unwrap();
        assert_eq!(addr.host(), "::1");
        assert_eq!(addr.port(), 25566);
        assert_eq!(addr.to_string(), "[::1]:25566");

        let bare = Address::parse("2001:db8::1").unwrap();
        assert_eq!(bare.host(), "2001:db8::1");
        assert_eq!(bare.port(), DEFAULT_PORT);

        assert!(Address::parse("[::1").is_err());
    }

    #[test]
    fn bracketed_host_with_trailing_junk_rejected() {
        assert!(matches!(
            Address::parse("[::1]junk"),
            Err(AddressError::InvalidHost(_))
        ));
        let addr = Address::parse("[::1]").unwrap();
        assert_eq!(addr.port(), DEFAULT_PORT);
        assert!(!addr.has_explicit_port());
    }

    #[test]
    fn port_zero_falls_back() {
        for input in ["host:0", "[::1]:0"] {
            let addr = Address::parse(input).unwrap();
            assert_eq!(addr.port(), DEFAULT_PORT, "{input}");
            assert!(!addr.has_explicit_port(), "{input}");
        }
    }

    #[test]
    fn empty_host_rejected() {
        assert_eq!(Address::parse("   ").unwrap_err(), AddressError::Empty);
        assert_eq!(Address::parse(":25565").unwrap_err(), AddressError::Empty);
        assert_eq!(Address::new("", 1).unwrap_err(), AddressError::Empty);
        assert!(matches!(
            Address::parse("my host"),
            Err(AddressError::InvalidHost(_))
        ));
    }

    #[test]
    fn status_from_full_json() {
        let json = r#"{
            "version": {"name": "1.20.1", "protocol": 763},
            "players": {"online": 3, "max": 20, "sample": [{"name": "Steve", "id": "x"}]},
            "description": "Welcome"
        }"#;
        let status = ServerStatus::from_json(json, 12.5).unwrap();
        assert_eq!(status.version, "1.20.1");
        assert_eq!(status.protocol, Some(763));
        assert_eq!(status.players_online, 3);
        assert_eq!(status.players_max, 20);
        assert_eq!(status.player_sample, vec!["Steve".to_string()]);
        assert_eq!(status.motd, "Welcome");
        assert_eq!(status.latency_ms, 12.5);
    }

    #[test]
    fn status_defaults_for_missing_fields() {
        let status = ServerStatus::from_json("{}", 1.0).unwrap();
        assert_eq!(status.version, "Unknown");
        assert_eq!(status.protocol, None);
        assert_eq!(status.players_online, 0);
        assert_eq!(status.players_max, 0);
        assert!(status.player_sample.is_empty());
        assert_eq!(status.motd, "No MOTD");
    }

    #[test]
    fn odd_protocol_number_is_dropped() {
        for protocol in ["-1", "\"1.8\"", "4294967296", "null"] {
            let json = format!(
                r#"{{"version":{{"name":"Maintenance","protocol":{protocol}}},"players":{{"online":0,"max":0}}}}"#
            );
            let status = ServerStatus::from_json(&json, 0.0).unwrap();
            assert_eq!(status.version, "Maintenance");
            assert_eq!(status.protocol, None, "{protocol}");
        }
    }

    #[test]
    fn sample_entries_without_name_are_skipped() {
        let json = r#"{"players":{"online":2,"max":10,"sample":[{"id":"abc"},{"name":7},"Steve",{"name":"Alex","id":"def"}]}}"#;
        let status = ServerStatus::from_json(json, 0.0).unwrap();
        assert_eq!(status.players_online, 2);
        assert_eq!(status.player_sample, vec!["Alex".to_string()]);
    }

    #[test]
    fn status_rejects_non_object() {
        for json in ["[]", "\"text\"", "42", "not json"] {
            assert!(
                matches!(
                    ServerStatus::from_json(json, 0.0),
                    Err(ProbeError::MalformedResponse(_))
                ),
                "{json}"
            );
        }
    }

    #[test]
    fn result_classification() {
        let ok = ProbeResult::from(ServerStatus::from_json("{}", 0.0));
        assert_eq!(ok.reachability(), Reachability::Online);
        assert!(ok.status().is_some());

        let failed = ProbeResult::Failure(ProbeError::Timeout);
        assert_eq!(failed.reachability(), Reachability::Offline);
        assert_eq!(failed.error(), Some(&ProbeError::Timeout));
        assert!(!failed.is_online());
    }
}
