//! Black-box perception capabilities: a scene classifier (image to ranked
//! labels) and a face/landmark detector (video frame to face geometry).
//!
//! Models are loaded lazily through [`ModelLoader`] implementations and shared
//! through one [`Perception`] object built at startup and handed to the
//! classifiers by reference.

pub mod face;
pub mod scene;
pub mod stats;
pub mod warmup;

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::MonitorResult;

pub use face::FaceAdapter;
pub use scene::SceneAdapter;
pub use stats::{CodeLayout, PixelStats};
pub use warmup::{LazyModel, ModelLoader};

/// One captured image, screen or webcam. Never leaves the process.
#[derive(Debug, Clone)]
pub struct CaptureFrame {
    pub image: Arc<RgbImage>,
    pub captured_at: DateTime<Utc>,
}

impl CaptureFrame {
    pub fn new(image: RgbImage) -> Self {
        Self {
            image: Arc::new(image),
            captured_at: Utc::now(),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// A frame with a zero dimension has not been decoded yet.
    pub fn is_decodable(&self) -> bool {
        let (w, h) = self.dimensions();
        w > 0 && h > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub probability: f64,
}

impl Label {
    pub fn new(name: impl Into<String>, probability: f64) -> Self {
        Self {
            name: name.into(),
            probability,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }
}

/// Landmarks for a single eye in frame pixel coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EyeLandmarks {
    /// Points tracing the eye opening.
    pub contour: Vec<Point>,
    /// Iris points (center plus ring).
    pub iris: Vec<Point>,
    pub upper_lid: Point,
    pub lower_lid: Point,
    pub inner_corner: Point,
    pub outer_corner: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceLandmarks {
    pub left_eye: EyeLandmarks,
    pub right_eye: EyeLandmarks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceGeometry {
    pub bounding_box: BoundingBox,
    /// Detector's own face score, when the model reports one.
    pub probability: Option<f64>,
    /// Absent when the landmark stage found nothing or failed.
    pub landmarks: Option<FaceLandmarks>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FaceDetection {
    pub face: Option<FaceGeometry>,
    pub frame_width: u32,
    pub frame_height: u32,
}

impl FaceDetection {
    pub fn absent(frame_width: u32, frame_height: u32) -> Self {
        Self {
            face: None,
            frame_width,
            frame_height,
        }
    }

    pub fn present(&self) -> bool {
        self.face.is_some()
    }
}

/// Loaded scene/object classifier. Inference is synchronous and CPU bound;
/// adapters call it from a blocking worker.
pub trait SceneModel: Send + Sync {
    fn classify(&self, image: &RgbImage, top_k: usize) -> Result<Vec<Label>>;
}

/// Loaded face + landmark detector.
pub trait FaceModel: Send + Sync {
    fn detect(&self, image: &RgbImage) -> Result<Option<FaceGeometry>>;
}

/// Process-wide perception capability. Built once, shared by `Arc`.
pub struct Perception {
    pub scene: SceneAdapter,
    pub face: FaceAdapter,
}

impl Perception {
    pub fn new(
        scene_loader: Box<dyn ModelLoader<dyn SceneModel>>,
        face_loader: Box<dyn ModelLoader<dyn FaceModel>>,
    ) -> Self {
        Self {
            scene: SceneAdapter::new(scene_loader),
            face: FaceAdapter::new(face_loader),
        }
    }

    /// Warm up the scene model, and the face model when it will be used.
    pub async fn warm_up(&self, include_face: bool) -> MonitorResult<()> {
        self.scene.warm_up().await?;
        if include_face {
            self.face.warm_up().await?;
        }
        Ok(())
    }
}
