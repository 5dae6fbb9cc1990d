use std::time::Duration;

/// Weights of the five focus signals. They sum to 1.
#[derive(Debug, Clone, Copy)]
pub struct FocusWeights {
    pub face_detected: f64,
    pub face_centered: f64,
    pub face_size: f64,
    pub gaze_direction: f64,
    pub eye_openness: f64,
}

/// Iris-ratio bounds for discrete gaze. Ratios run 0..1 with 0.5 centred;
/// below `left`/`up` or above `right`/`down` counts as looking that way.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeBounds {
    pub left: f64,
    pub right: f64,
    pub up: f64,
    pub down: f64,
}

#[derive(Debug, Clone)]
pub struct FocusConfig {
    pub weights: FocusWeights,
    /// Detector scores above this count as a sure face.
    pub face_probability_threshold: f64,
    /// Score assumed when the detector reports none.
    pub default_face_probability: f64,
    /// Horizontal offset from frame centre (as a fraction of width) at which
    /// centredness reaches zero, halved.
    pub center_tolerance: f64,
    /// Face area fraction multiplier; a face filling a tenth of the frame
    /// already scores 1.
    pub face_size_scale: f64,
    pub gaze_bounds: GazeBounds,
    /// `up` bound used when a second display sits above the primary one.
    pub secondary_monitor_up_bound: f64,
    /// Eyelid gap over eye width above which the eyes count as open.
    pub eye_openness_threshold: f64,
    pub focus_threshold: f64,
    /// How long an upward glance keeps the second-monitor latch set.
    pub latch_grace: Duration,
    /// Confidence floor while the latch is set. Must exceed `focus_threshold`.
    pub latch_confidence: f64,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            weights: FocusWeights {
                face_detected: 0.3,
                face_centered: 0.2,
                face_size: 0.15,
                gaze_direction: 0.25,
                eye_openness: 0.1,
            },
            face_probability_threshold: 0.8,
            default_face_probability: 0.5,
            center_tolerance: 0.25,
            face_size_scale: 10.0,
            gaze_bounds: GazeBounds {
                left: 0.35,
                right: 0.65,
                up: 0.35,
                down: 0.65,
            },
            secondary_monitor_up_bound: 0.45,
            eye_openness_threshold: 0.2,
            focus_threshold: 0.7,
            latch_grace: Duration::from_secs(3),
            latch_confidence: 0.8,
        }
    }
}

impl FocusConfig {
    pub fn gaze_bounds(&self, secondary_monitor_above: bool) -> GazeBounds {
        if secondary_monitor_above {
            GazeBounds {
                up: self.secondary_monitor_up_bound,
                ..self.gaze_bounds
            }
        } else {
            self.gaze_bounds
        }
    }
}
