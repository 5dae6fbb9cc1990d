//! Session lifecycle and the periodic check loop.

pub mod controller;
mod loop_worker;
pub mod state;

pub use controller::{MonitorController, MonitorDeps};
pub use state::{CyclePhase, MonitorStatus, ProductivityState, Visibility};
