//! Console rendering of probe results.

use std::io::Write;

use mcstat_core::{ProbeResult, StatusSink};

/// Multi-line status text for one probe result.
pub fn render(result: &ProbeResult) -> String {
    match result {
        ProbeResult::Status(status) => {
            let mut text = format!(
                "ONLINE\nVersion: {}\nPlayers: {}/{}\nMOTD: {}\nLatency: {:.1}ms",
                status.version,
                status.players_online,
                status.players_max,
                status.motd,
                status.latency_ms
            );
            if !status.player_sample.is_empty() {
                text.push_str("\nSample: ");
                text.push_str(&status.player_sample.join(", "));
            }
            text
        }
        ProbeResult::Failure(err) => format!("OFFLINE\n{err}"),
    }
}

/// [`StatusSink`] that prints every result to stdout.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl StatusSink for ConsoleSink {
    fn on_status(&self, result: &ProbeResult) {
        let mut out = std::io::stdout().lock();
        // A closed stdout must not take the monitor down.
        let _ = writeln!(out, "{}\n", render(result));
    }
}
