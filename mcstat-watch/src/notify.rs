//! Notification delivery.
//!
//! Every reachability change is logged. When a command is configured it
//! is also run as `<command> <title> <message>`, which covers
//! `notify-send`, `terminal-notifier` and ad-hoc webhook scripts alike.

use std::time::Duration;

use async_trait::async_trait;
use mcstat_core::{Notifier, NotifyError};
use tokio::process::Command;
use tracing::{debug, info};

/// Longest a notify command may run before it is abandoned.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Logs notifications and optionally forwards them to a program.
#[derive(Debug, Clone, Default)]
pub struct CommandNotifier {
    command: Option<String>,
}

impl CommandNotifier {
    pub fn new(command: Option<&str>) -> Self {
        Self {
            command: command.map(str::to_string),
        }
    }

    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }
}

#[async_trait]
impl Notifier for CommandNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        info!(%title, message = %message.replace('\n', " | "), "notification");

        let Some(program) = &self.command else {
            return Ok(());
        };
        let run = Command::new(program)
            .arg(title)
            .arg(message)
            .kill_on_drop(true)
            .status();
        let status = tokio::time::timeout(COMMAND_TIMEOUT, run)
            .await
            .map_err(|_| NotifyError::Failed(format!("{program} timed out")))??;

        if !status.success() {
            return Err(NotifyError::Failed(format!("{program} exited with {status}")));
        }
        debug!(%program, "notify command delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_only_always_succeeds() {
        let notifier = CommandNotifier::new(None);
        notifier.notify("MC Server ONLINE", "x\ny").await.unwrap();
    }

    #[tokio::test]
    async fn missing_program_is_io_error() {
        let notifier = CommandNotifier::new(Some("/nonexistent/mcstat-notify"));
        let err = notifier.notify("t", "m").await.unwrap_err();
        assert!(matches!(err, NotifyError::Io(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_program_is_reported() {
        let notifier = CommandNotifier::new(Some("false"));
        let err = notifier.notify("t", "m").await.unwrap_err();
        assert!(matches!(err, NotifyError::Failed(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_program() {
        let notifier = CommandNotifier::new(Some("true"));
        notifier.notify("t", "m").await.unwrap();
    }
}
