use std::sync::Arc;

use chrono::{DateTime, Utc};
use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::focus::GazeDirection;
use crate::interrupt::Yell;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum MonitorStatus {
    #[default]
    Inactive,
    Initializing,
    Active,
    Deactivating,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum CyclePhase {
    #[default]
    Idle,
    Capturing,
    Classifying,
    Deciding,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

/// Everything the UI shows about the running session. Written only by the
/// monitor; readers get snapshots through `watch`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductivityState {
    pub status: MonitorStatus,
    pub phase: CyclePhase,
    pub session_id: Option<String>,
    pub webcam_active: bool,

    pub is_work: bool,
    pub is_focused: bool,
    pub gaze_direction: GazeDirection,
    pub content_confidence: f64,
    pub focus_confidence: f64,
    pub detected_work_items: Vec<String>,
    pub detected_non_work_items: Vec<String>,

    pub last_checked_at: Option<DateTime<Utc>>,
    /// Last cycle start, including skipped cycles.
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub last_yell_time: Option<DateTime<Utc>>,
    pub last_yell: Option<Yell>,
    pub cycles_completed: u64,

    /// Latest screenshot for the preview pane. Not updated while hidden.
    #[serde(skip)]
    pub screenshot: Option<Arc<RgbImage>>,
    pub error: Option<String>,
    pub warning: Option<String>,
}

impl Default for ProductivityState {
    fn default() -> Self {
        Self {
            status: MonitorStatus::Inactive,
            phase: CyclePhase::Idle,
            session_id: None,
            webcam_active: false,
            is_work: true,
            is_focused: true,
            gaze_direction: GazeDirection::Unknown,
            content_confidence: 0.0,
            focus_confidence: 0.0,
            detected_work_items: Vec::new(),
            detected_non_work_items: Vec::new(),
            last_checked_at: None,
            last_attempt_at: None,
            last_yell_time: None,
            last_yell: None,
            cycles_completed: 0,
            screenshot: None,
            error: None,
            warning: None,
        }
    }
}

impl ProductivityState {
    pub fn new() -> Self {
        Self::default()
    }

    /// `last_yell_time` never moves backwards.
    pub fn record_yell(&mut self, at: DateTime<Utc>, yell: Yell) {
        self.last_yell_time = Some(match self.last_yell_time {
            Some(previous) => previous.max(at),
            None => at,
        });
        self.last_yell = Some(yell);
    }

    /// Drop per-session transient data on deactivation. Results and yell
    /// history stay for display.
    pub fn clear_transient(&mut self) {
        self.status = MonitorStatus::Inactive;
        self.phase = CyclePhase::Idle;
        self.session_id = None;
        self.webcam_active = false;
        self.screenshot = None;
        self.error = None;
        self.warning = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interrupt::MessageBucket;
    use crate::settings::YellStyle;
    use chrono::Duration;

    fn yell() -> Yell {
        Yell {
            bucket: MessageBucket::NotWorking,
            text: "back to work".to_string(),
            style: YellStyle::Coach,
        }
    }

    #[test]
    fn yell_time_is_monotonic() {
        let mut state = ProductivityState::new();
        let t0 = Utc::now();

        state.record_yell(t0, yell());
        state.record_yell(t0 - Duration::seconds(5), yell());
        assert_eq!(state.last_yell_time, Some(t0));

        state.record_yell(t0 + Duration::seconds(5), yell());
        assert_eq!(state.last_yell_time, Some(t0 + Duration::seconds(5)));
    }

    #[test]
    fn clearing_keeps_history() {
        let mut state = ProductivityState {
            status: MonitorStatus::Active,
            session_id: Some("s".into()),
            screenshot: Some(Arc::new(RgbImage::new(2, 2))),
            error: Some("boom".into()),
            cycles_completed: 4,
            is_work: false,
            ..ProductivityState::default()
        };
        state.record_yell(Utc::now(), yell());

        state.clear_transient();

        assert_eq!(state.status, MonitorStatus::Inactive);
        assert!(state.screenshot.is_none());
        assert!(state.error.is_none());
        assert!(state.session_id.is_none());
        assert!(state.last_yell_time.is_some());
        assert_eq!(state.cycles_completed, 4);
        assert!(!state.is_work);
    }
}
