//! Per-session monitoring state and the transition rules applied to
//! each completed probe.
//!
//! ```text
//!   Unknown ──first probe──► Online ◄──────► Offline
//!      │                        ▲               ▲
//!      └──────first probe───────┼───────────────┘
//!                         (notify only on ◄──► edges)
//! ```

use std::time::Duration;

use crate::status::{Address, Reachability};

// ── Observation ──────────────────────────────────────────────────

/// What a completed probe means for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// The session was stopped; the result must not be applied.
    Discarded,
    /// First result since the session started.
    Initial(Reachability),
    /// Same classification as the previous probe.
    Unchanged(Reachability),
    /// Reachability flipped.
    Changed {
        from: Reachability,
        to: Reachability,
    },
}

impl Observation {
    /// Whether the result should reach the status sink.
    pub fn is_applied(&self) -> bool {
        !matches!(self, Self::Discarded)
    }

    /// Whether this observation warrants a notification.
    ///
    /// The first observation only notifies when `notify_on_first` is set.
    pub fn notifies(&self, notify_on_first: bool) -> bool {
        match self {
            Self::Changed { .. } => true,
            Self::Initial(_) => notify_on_first,
            Self::Discarded | Self::Unchanged(_) => false,
        }
    }
}

// ── MonitorState ─────────────────────────────────────────────────

/// State owned by one monitoring session.
///
/// Created on start, mutated only by the session's control loop after
/// each completed probe, and dropped when the session stops or the
/// address changes.
#[derive(Debug, Clone)]
pub struct MonitorState {
    address: Address,
    interval: Duration,
    last: Reachability,
    running: bool,
}

impl MonitorState {
    pub fn new(address: Address, interval: Duration) -> Self {
        Self {
            address,
            interval,
            last: Reachability::Unknown,
            running: true,
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_reachability(&self) -> Reachability {
        self.last
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Mark the session stopped. Later observations are discarded.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Fold one classified probe result into the state.
    pub fn observe(&mut self, current: Reachability) -> Observation {
        if !self.running {
            return Observation::Discarded;
        }
        let previous = std::mem::replace(&mut self.last, current);
        match previous {
            Reachability::Unknown => Observation::Initial(current),
            prev if prev == current => Observation::Unchanged(current),
            prev => Observation::Changed {
                from: prev,
                to: current,
            },
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use Reachability::{Offline, Online};

    fn state() -> MonitorState {
        MonitorState::new(Address::parse("localhost").unwrap(), Duration::from_secs(120))
    }

    #[test]
    fn starts_unknown_and_running() {
        let s = state();
        assert_eq!(s.last_reachability(), Reachability::Unknown);
        assert!(s.is_running());
        assert_eq!(s.interval(), Duration::from_secs(120));
    }

    #[test]
    fn first_observation_is_initial() {
        let mut s = state();
        assert_eq!(s.observe(Offline), Observation::Initial(Offline));
        assert_eq!(s.last_reachability(), Offline);
    }

    #[test]
    fn sequence_notifies_only_on_edges() {
        let mut s = state();
        let notified = [Online, Online, Offline, Offline, Online]
            .into_iter()
            .map(|r| s.observe(r))
            .filter(|o| o.notifies(false))
            .collect::<Vec<_>>();

        assert_eq!(
            notified,
            vec![
                Observation::Changed {
                    from: Online,
                    to: Offline
                },
                Observation::Changed {
                    from: Offline,
                    to: Online
                },
            ]
        );
    }

    #[test]
    fn notify_on_first_flag() {
        let mut s = state();
        let first = s.observe(Online);
        assert!(!first.notifies(false));
        assert!(first.notifies(true));
        assert!(!s.observe(Online).notifies(true));
    }

    #[test]
    fn stopped_state_discards() {
        let mut s = state();
        s.observe(Online);
        s.stop();
        let o = s.observe(Offline);
        assert_eq!(o, Observation::Discarded);
        assert!(!o.is_applied());
        assert!(!o.notifies(true));
        assert_eq!(s.last_reachability(), Online);
    }
}
