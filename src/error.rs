use thiserror::Error;

/// Failures surfaced by the monitoring engine.
///
/// Only [`MonitorError::ScreenPermissionDenied`] and [`MonitorError::ModelLoad`]
/// ever reach the caller of `activate`; everything else is recovered inside the
/// check cycle and reported through the published state.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("screen capture permission denied")]
    ScreenPermissionDenied,

    #[error("webcam permission denied; focus detection disabled for this session")]
    WebcamPermissionDenied,

    #[error("failed to load {model} model: {reason}")]
    ModelLoad { model: &'static str, reason: String },

    #[error("capture failed: {0}")]
    Capture(String),

    #[error("classification failed: {0}")]
    Classification(String),

    #[error("interruption dispatch failed: {0}")]
    Dispatch(String),

    #[error("monitoring already active")]
    AlreadyActive,

    #[error("monitoring not active")]
    NotActive,

    #[error("invalid setting {field}: {value}")]
    InvalidSetting { field: &'static str, value: String },
}

pub type MonitorResult<T> = Result<T, MonitorError>;
