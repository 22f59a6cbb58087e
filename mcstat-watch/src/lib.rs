//! # mcstat-watch: terminal server watcher
//!
//! Wires the `mcstat-core` monitor to a terminal: the TOML
//! configuration, a console renderer for every probe result, and a
//! notifier that logs reachability changes and optionally hands them
//! to an external command (`notify-send`, a webhook script, ...).

pub mod config;
pub mod console;
pub mod notify;
