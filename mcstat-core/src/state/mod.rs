pub mod monitor;

pub use monitor::{MonitorState, Observation};
