use serde::{Deserialize, Serialize};

use super::config::GazeBounds;
use crate::perception::{EyeLandmarks, FaceLandmarks, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GazeDirection {
    Straight,
    Left,
    Right,
    Up,
    Down,
    #[default]
    Unknown,
}

impl GazeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            GazeDirection::Straight => "straight",
            GazeDirection::Left => "left",
            GazeDirection::Right => "right",
            GazeDirection::Up => "up",
            GazeDirection::Down => "down",
            GazeDirection::Unknown => "unknown",
        }
    }
}

/// Where on the display the user appears to be looking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScreenArea {
    Center,
    Left,
    Right,
    Top,
    Bottom,
    #[default]
    OffScreen,
}

impl ScreenArea {
    pub fn from_gaze(gaze: GazeDirection) -> Self {
        match gaze {
            GazeDirection::Straight | GazeDirection::Unknown => ScreenArea::Center,
            GazeDirection::Left => ScreenArea::Left,
            GazeDirection::Right => ScreenArea::Right,
            GazeDirection::Up => ScreenArea::Top,
            GazeDirection::Down => ScreenArea::Bottom,
        }
    }
}

/// Iris position inside the eye opening, 0..1 per axis, 0.5 centred.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeRatios {
    pub horizontal: f64,
    pub vertical: f64,
}

fn mean(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point::new(sx / n, sy / n))
}

fn eye_ratios(eye: &EyeLandmarks) -> Option<GazeRatios> {
    let iris = mean(&eye.iris)?;

    let (min_x, max_x, min_y, max_y) = eye.contour.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
        |(min_x, max_x, min_y, max_y), p| {
            (min_x.min(p.x), max_x.max(p.x), min_y.min(p.y), max_y.max(p.y))
        },
    );
    let width = max_x - min_x;
    let height = max_y - min_y;
    if !(width > 0.0 && height > 0.0) {
        return None;
    }

    Some(GazeRatios {
        horizontal: (iris.x - min_x) / width,
        vertical: (iris.y - min_y) / height,
    })
}

/// Iris ratios averaged over both eyes. `None` when either eye is degenerate.
pub fn gaze_ratios(face: &FaceLandmarks) -> Option<GazeRatios> {
    let left = eye_ratios(&face.left_eye)?;
    let right = eye_ratios(&face.right_eye)?;
    Some(GazeRatios {
        horizontal: (left.horizontal + right.horizontal) / 2.0,
        vertical: (left.vertical + right.vertical) / 2.0,
    })
}

/// Horizontal deviation wins over vertical.
pub fn classify_gaze(ratios: GazeRatios, bounds: &GazeBounds) -> GazeDirection {
    if !ratios.horizontal.is_finite() || !ratios.vertical.is_finite() {
        GazeDirection::Unknown
    } else if ratios.horizontal < bounds.left {
        GazeDirection::Left
    } else if ratios.horizontal > bounds.right {
        GazeDirection::Right
    } else if ratios.vertical < bounds.up {
        GazeDirection::Up
    } else if ratios.vertical > bounds.down {
        GazeDirection::Down
    } else {
        GazeDirection::Straight
    }
}

fn eye_open_ratio(eye: &EyeLandmarks) -> Option<f64> {
    let width = eye.inner_corner.distance(&eye.outer_corner);
    if width <= 0.0 {
        return None;
    }
    Some(eye.upper_lid.distance(&eye.lower_lid) / width)
}

/// Eyelid gap over eye width, averaged over both eyes.
pub fn eye_openness(face: &FaceLandmarks) -> Option<f64> {
    let left = eye_open_ratio(&face.left_eye)?;
    let right = eye_open_ratio(&face.right_eye)?;
    Some((left + right) / 2.0)
}
