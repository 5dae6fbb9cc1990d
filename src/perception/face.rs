use std::sync::Arc;

use super::{CaptureFrame, FaceDetection, FaceModel, LazyModel, ModelLoader};
use crate::error::{MonitorError, MonitorResult};

pub struct FaceAdapter {
    model: LazyModel<dyn FaceModel>,
}

impl FaceAdapter {
    pub fn new(loader: Box<dyn ModelLoader<dyn FaceModel>>) -> Self {
        Self {
            model: LazyModel::new(loader),
        }
    }

    pub async fn warm_up(&self) -> MonitorResult<()> {
        self.model.get().await.map(|_| ())
    }

    pub fn is_ready(&self) -> bool {
        self.model.is_ready()
    }

    /// Detect the user's face in a webcam frame.
    ///
    /// A frame that has not been decoded yet (zero width or height) yields an
    /// absent face instead of an error.
    pub async fn detect_face(&self, frame: &CaptureFrame) -> MonitorResult<FaceDetection> {
        let (width, height) = frame.dimensions();
        if !frame.is_decodable() {
            return Ok(FaceDetection::absent(width, height));
        }

        let model = self.model.get().await?;
        let image = Arc::clone(&frame.image);

        let face = tokio::task::spawn_blocking(move || model.detect(&image))
            .await
            .map_err(|err| MonitorError::Classification(format!("face worker join failed: {err}")))?
            .map_err(|err| MonitorError::Classification(format!("{err:#}")))?;

        Ok(FaceDetection {
            face,
            frame_width: width,
            frame_height: height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::{BoundingBox, FaceGeometry};
    use anyhow::Result;
    use async_trait::async_trait;
    use image::RgbImage;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CenteredFace;

    impl FaceModel for CenteredFace {
        fn detect(&self, image: &RgbImage) -> Result<Option<FaceGeometry>> {
            let (w, h) = image.dimensions();
            Ok(Some(FaceGeometry {
                bounding_box: BoundingBox {
                    x: w as f64 * 0.35,
                    y: h as f64 * 0.3,
                    width: w as f64 * 0.3,
                    height: h as f64 * 0.4,
                },
                probability: Some(0.97),
                landmarks: None,
            }))
        }
    }

    struct CountingLoader(Arc<AtomicU32>);

    #[async_trait]
    impl ModelLoader<dyn FaceModel> for CountingLoader {
        fn name(&self) -> &'static str {
            "test-face"
        }

        async fn load(&self) -> Result<Arc<dyn FaceModel>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(CenteredFace))
        }
    }

    #[tokio::test]
    async fn undecoded_frame_reports_no_face_without_loading() {
        let loads = Arc::new(AtomicU32::new(0));
        let adapter = FaceAdapter::new(Box::new(CountingLoader(loads.clone())));

        let detection = adapter
            .detect_face(&CaptureFrame::new(RgbImage::new(0, 0)))
            .await
            .unwrap();

        assert!(!detection.present());
        assert_eq!(loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn detects_face_in_decoded_frame() {
        let loads = Arc::new(AtomicU32::new(0));
        let adapter = FaceAdapter::new(Box::new(CountingLoader(loads.clone())));

        let detection = adapter
            .detect_face(&CaptureFrame::new(RgbImage::new(640, 480)))
            .await
            .unwrap();

        assert!(detection.present());
        assert_eq!((detection.frame_width, detection.frame_height), (640, 480));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }
}
