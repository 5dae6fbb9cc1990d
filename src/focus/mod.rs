//! Focused / distracted classification from webcam face geometry.

pub mod config;
pub mod gaze;
pub mod latch;

use std::sync::Arc;

use serde::Serialize;
use tokio::time::Instant;

use crate::perception::{CaptureFrame, FaceDetection, FaceGeometry, Perception};

pub use config::{FocusConfig, FocusWeights, GazeBounds};
pub use gaze::{GazeDirection, ScreenArea};
pub use latch::SecondMonitorLatch;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusResult {
    pub focused: bool,
    pub confidence: f64,
    pub face_detected: bool,
    pub gaze_direction: GazeDirection,
    pub eyes_open: bool,
    pub screen_area: ScreenArea,
    /// The second-monitor latch forced this result to focused.
    pub latched: bool,
}

impl FocusResult {
    /// Terminal result when the camera sees nobody.
    pub fn no_face() -> Self {
        Self {
            focused: false,
            confidence: 0.0,
            face_detected: false,
            gaze_direction: GazeDirection::Unknown,
            eyes_open: false,
            screen_area: ScreenArea::OffScreen,
            latched: false,
        }
    }

    /// Used when face detection is off or the webcam is unavailable. Never a
    /// distraction signal.
    pub fn not_measured() -> Self {
        Self {
            focused: true,
            confidence: 1.0,
            face_detected: false,
            gaze_direction: GazeDirection::Unknown,
            eyes_open: true,
            screen_area: ScreenArea::Center,
            latched: false,
        }
    }

    /// Detector failure. Assume focused, with no confidence behind it.
    pub fn fail_open() -> Self {
        Self {
            confidence: 0.0,
            ..Self::not_measured()
        }
    }
}

/// Per-signal breakdown, kept for logging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusSignals {
    pub face_probability: f64,
    pub centeredness: f64,
    pub relative_size: f64,
    pub gaze_straight: f64,
    pub eyes_open: f64,
}

impl FocusSignals {
    pub fn weighted(&self, weights: &FocusWeights) -> f64 {
        self.face_probability * weights.face_detected
            + self.centeredness * weights.face_centered
            + self.relative_size * weights.face_size
            + self.gaze_straight * weights.gaze_direction
            + self.eyes_open * weights.eye_openness
    }
}

fn face_signals(
    face: &FaceGeometry,
    frame_width: u32,
    frame_height: u32,
    gaze: GazeDirection,
    eyes_open: bool,
    secondary_monitor_above: bool,
    config: &FocusConfig,
) -> FocusSignals {
    let (w, h) = (frame_width as f64, frame_height as f64);

    let probability = face.probability.unwrap_or(config.default_face_probability);
    let face_probability = if probability > config.face_probability_threshold {
        1.0
    } else {
        (probability / config.face_probability_threshold).clamp(0.0, 1.0)
    };

    let span = config.center_tolerance * 2.0;
    let offset = ((face.bounding_box.center().x / w) - 0.5).abs() * 2.0;
    let centeredness = 1.0 - offset.min(span) / span;

    let relative_size = (face.bounding_box.area() / (w * h) * config.face_size_scale).min(1.0);

    let looking_at_screen = gaze == GazeDirection::Straight
        || (secondary_monitor_above && gaze == GazeDirection::Up);

    FocusSignals {
        face_probability,
        centeredness,
        relative_size,
        gaze_straight: if looking_at_screen { 1.0 } else { 0.0 },
        eyes_open: if eyes_open { 1.0 } else { 0.0 },
    }
}

/// Pure focus decision for one detection.
///
/// `latch` is the session's second-monitor state and is updated when the user
/// glances up with `secondary_monitor_above` set.
pub fn evaluate_focus(
    detection: &FaceDetection,
    config: &FocusConfig,
    secondary_monitor_above: bool,
    latch: &mut SecondMonitorLatch,
    now: Instant,
) -> FocusResult {
    let Some(face) = &detection.face else {
        return FocusResult::no_face();
    };
    if detection.frame_width == 0 || detection.frame_height == 0 {
        return FocusResult::no_face();
    }

    let bounds = config.gaze_bounds(secondary_monitor_above);
    let (gaze_direction, eyes_open) = match &face.landmarks {
        Some(landmarks) => {
            let gaze = gaze::gaze_ratios(landmarks)
                .map(|ratios| gaze::classify_gaze(ratios, &bounds))
                .unwrap_or(GazeDirection::Unknown);
            let open = gaze::eye_openness(landmarks)
                .map(|ratio| ratio > config.eye_openness_threshold)
                .unwrap_or(true);
            (gaze, open)
        }
        None => (GazeDirection::Unknown, true),
    };

    let signals = face_signals(
        face,
        detection.frame_width,
        detection.frame_height,
        gaze_direction,
        eyes_open,
        secondary_monitor_above,
        config,
    );
    let mut confidence = signals.weighted(&config.weights).clamp(0.0, 1.0);
    let mut focused = confidence > config.focus_threshold;

    let mut latched = false;
    if secondary_monitor_above {
        if gaze_direction == GazeDirection::Up {
            latch.observe_up(now, config.latch_grace);
        }
        if latch.is_active(now) {
            latched = true;
            focused = true;
            confidence = confidence.max(config.latch_confidence);
        }
    }

    log_debug!(
        "focus signals {:?} -> {:.2} (gaze {}, latched {})",
        signals,
        confidence,
        gaze_direction.as_str(),
        latched
    );

    FocusResult {
        focused,
        confidence,
        face_detected: true,
        gaze_direction,
        eyes_open,
        screen_area: ScreenArea::from_gaze(gaze_direction),
        latched,
    }
}

pub struct FocusClassifier {
    perception: Arc<Perception>,
    config: FocusConfig,
}

impl FocusClassifier {
    pub fn new(perception: Arc<Perception>, config: FocusConfig) -> Self {
        Self { perception, config }
    }

    /// Run face detection on a webcam frame and evaluate focus. Detector
    /// errors fail open.
    pub async fn detect(
        &self,
        frame: &CaptureFrame,
        secondary_monitor_above: bool,
        latch: &mut SecondMonitorLatch,
    ) -> FocusResult {
        if !frame.is_decodable() {
            log_debug!("webcam frame not ready, assuming focused");
            return FocusResult::fail_open();
        }
        match self.perception.face.detect_face(frame).await {
            Ok(detection) => evaluate_focus(
                &detection,
                &self.config,
                secondary_monitor_above,
                latch,
                Instant::now(),
            ),
            Err(err) => {
                log_warn!("focus detection failed, assuming focused: {err}");
                FocusResult::fail_open()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::gaze::fixtures::face;
    use super::*;
    use crate::perception::{BoundingBox, FaceLandmarks};
    use std::time::Duration;

    const W: u32 = 640;
    const H: u32 = 480;

    fn detection(landmarks: Option<FaceLandmarks>) -> FaceDetection {
        FaceDetection {
            face: Some(FaceGeometry {
                // Centred, a quarter of the frame.
                bounding_box: BoundingBox {
                    x: 160.0,
                    y: 120.0,
                    width: 320.0,
                    height: 240.0,
                },
                probability: Some(0.95),
                landmarks,
            }),
            frame_width: W,
            frame_height: H,
        }
    }

    fn evaluate(detection: &FaceDetection, secondary: bool, latch: &mut SecondMonitorLatch, now: Instant) -> FocusResult {
        evaluate_focus(detection, &FocusConfig::default(), secondary, latch, now)
    }

    #[test]
    fn no_face_is_terminal() {
        let mut latch = SecondMonitorLatch::new();
        let result = evaluate(&FaceDetection::absent(W, H), false, &mut latch, Instant::now());

        assert!(!result.focused);
        assert_eq!(result.confidence, 0.0);
        assert!(!result.face_detected);
    }

    #[test]
    fn centred_face_looking_straight_is_focused() {
        let mut latch = SecondMonitorLatch::new();
        let result = evaluate(
            &detection(Some(face(0.5, 0.5, 0.3))),
            false,
            &mut latch,
            Instant::now(),
        );

        assert!(result.focused);
        assert!((result.confidence - 1.0).abs() < 1e-9);
        assert_eq!(result.gaze_direction, GazeDirection::Straight);
        assert_eq!(result.screen_area, ScreenArea::Center);
        assert!(result.eyes_open);
    }

    #[test]
    fn looking_sideways_costs_the_gaze_weight() {
        let mut latch = SecondMonitorLatch::new();
        let result = evaluate(
            &detection(Some(face(0.1, 0.5, 0.3))),
            false,
            &mut latch,
            Instant::now(),
        );

        assert_eq!(result.gaze_direction, GazeDirection::Left);
        assert!((result.confidence - 0.75).abs() < 1e-9);
        assert!(result.focused);

        // Looking away with closed eyes: 0.3 + 0.2 + 0.15 = 0.65.
        let result = evaluate(
            &detection(Some(face(0.1, 0.5, 0.05))),
            false,
            &mut latch,
            Instant::now(),
        );
        assert!(!result.eyes_open);
        assert!(!result.focused);
        assert_eq!(result.screen_area, ScreenArea::Left);
    }

    #[test]
    fn missing_landmarks_leave_gaze_unknown() {
        let mut latch = SecondMonitorLatch::new();
        let result = evaluate(&detection(None), false, &mut latch, Instant::now());

        assert_eq!(result.gaze_direction, GazeDirection::Unknown);
        assert!(result.eyes_open);
        // 0.3 + 0.2 + 0.15 + 0 + 0.1
        assert!((result.confidence - 0.75).abs() < 1e-9);
    }

    #[test]
    fn upward_glance_latches_for_grace_window() {
        let mut latch = SecondMonitorLatch::new();
        let t0 = Instant::now();

        let up = evaluate(&detection(Some(face(0.5, 0.2, 0.05))), true, &mut latch, t0);
        assert_eq!(up.gaze_direction, GazeDirection::Up);
        assert!(up.latched);
        assert!(up.focused);

        // Closed eyes, glancing left, 2.9 s later: still latched.
        let away = detection(Some(face(0.1, 0.5, 0.05)));
        let later = evaluate(&away, true, &mut latch, t0 + Duration::from_millis(2900));
        assert!(later.focused);
        assert!(later.confidence >= 0.8);

        let expired = evaluate(&away, true, &mut latch, t0 + Duration::from_millis(3100));
        assert!(!expired.latched);
        assert!(!expired.focused);
    }

    #[test]
    fn without_secondary_monitor_up_is_a_distraction() {
        let mut latch = SecondMonitorLatch::new();
        let result = evaluate(
            &detection(Some(face(0.5, 0.2, 0.05))),
            false,
            &mut latch,
            Instant::now(),
        );

        assert_eq!(result.gaze_direction, GazeDirection::Up);
        assert!(!result.latched);
        assert!(!result.focused);
        assert!(!latch.is_active(Instant::now()));
    }

    #[test]
    fn latch_never_rescues_an_empty_frame() {
        let mut latch = SecondMonitorLatch::new();
        let t0 = Instant::now();
        latch.observe_up(t0, Duration::from_secs(3));

        let result = evaluate(&FaceDetection::absent(W, H), true, &mut latch, t0);
        assert_eq!(result, FocusResult::no_face());
    }
}
