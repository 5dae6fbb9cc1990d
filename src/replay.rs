//! Replays a folder of recorded screenshots through the real pipeline.
//!
//! Each image may have a `<image>.labels.json` sidecar holding the scene
//! labels to report for it (`[{"name": "code editor", "probability": 0.9}]`).
//! Images without one yield no labels, which scores as the default work bias.

use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use image::RgbImage;

use crate::capture::ScreenCapture;
use crate::perception::{CaptureFrame, FaceModel, Label, ModelLoader, SceneModel};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

type SharedLabels = Arc<Mutex<Vec<Label>>>;

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn sidecar_path(image: &Path) -> PathBuf {
    let mut name = image.as_os_str().to_owned();
    name.push(".labels.json");
    PathBuf::from(name)
}

fn read_sidecar(image: &Path) -> Result<Vec<Label>> {
    let path = sidecar_path(image);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("invalid labels in {}", path.display()))
}

/// Screen provider cycling through the images of a directory in name order.
pub struct ReplayScreen {
    frames: Vec<PathBuf>,
    cursor: AtomicUsize,
    labels: SharedLabels,
}

impl ReplayScreen {
    pub fn open(dir: &Path) -> Result<Self> {
        let mut frames = std::fs::read_dir(dir)
            .with_context(|| format!("failed to list {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| is_image(path))
            .collect::<Vec<_>>();
        frames.sort();

        if frames.is_empty() {
            bail!("no images found in {}", dir.display());
        }
        log_info!("replaying {} frames from {}", frames.len(), dir.display());

        Ok(Self {
            frames,
            cursor: AtomicUsize::new(0),
            labels: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Scene model that reports the sidecar labels of the frame captured last.
    pub fn scene_loader(&self) -> Box<dyn ModelLoader<dyn SceneModel>> {
        Box::new(SidecarSceneLoader {
            labels: Arc::clone(&self.labels),
        })
    }

    fn next_path(&self) -> &Path {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.frames.len();
        &self.frames[index]
    }

    fn set_labels(&self, labels: Vec<Label>) {
        *self.labels.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = labels;
    }
}

#[async_trait]
impl ScreenCapture for ReplayScreen {
    async fn request_access(&self) -> bool {
        true
    }

    async fn capture_frame(&self) -> Result<Option<CaptureFrame>> {
        let path = self.next_path().to_path_buf();
        let labels = match read_sidecar(&path) {
            Ok(labels) => labels,
            Err(err) => {
                log_warn!("{err:#}");
                Vec::new()
            }
        };

        let image: RgbImage = tokio::task::spawn_blocking({
            let path = path.clone();
            move || image::open(&path).map(|img| img.to_rgb8())
        })
        .await
        .map_err(|err| anyhow!("decode worker failed: {err}"))?
        .with_context(|| format!("failed to decode {}", path.display()))?;

        self.set_labels(labels);
        Ok(Some(CaptureFrame::new(image)))
    }

    async fn release(&self) {
        self.cursor.store(0, Ordering::Relaxed);
    }
}

struct SidecarScene {
    labels: SharedLabels,
}

impl SceneModel for SidecarScene {
    fn classify(&self, _image: &RgbImage, top_k: usize) -> Result<Vec<Label>> {
        let labels = self.labels.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(labels.iter().take(top_k).cloned().collect())
    }
}

struct SidecarSceneLoader {
    labels: SharedLabels,
}

#[async_trait]
impl ModelLoader<dyn SceneModel> for SidecarSceneLoader {
    fn name(&self) -> &'static str {
        "replay-scene"
    }

    async fn load(&self) -> Result<Arc<dyn SceneModel>> {
        Ok(Arc::new(SidecarScene {
            labels: Arc::clone(&self.labels),
        }))
    }
}

/// Replays carry no webcam footage, so there is no face model to load.
pub struct NoFaceModel;

#[async_trait]
impl ModelLoader<dyn FaceModel> for NoFaceModel {
    fn name(&self) -> &'static str {
        "replay-face"
    }

    async fn load(&self) -> Result<Arc<dyn FaceModel>> {
        Err(anyhow!("replay has no face model"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::Perception;
    use image::Rgb;

    fn write_frame(dir: &Path, name: &str, shade: u8, labels: Option<&str>) {
        let path = dir.join(name);
        RgbImage::from_pixel(8, 8, Rgb([shade, shade, shade]))
            .save(&path)
            .unwrap();
        if let Some(labels) = labels {
            std::fs::write(sidecar_path(&path), labels).unwrap();
        }
    }

    #[tokio::test]
    async fn frames_loop_in_name_order_with_their_labels() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(
            dir.path(),
            "b.png",
            200,
            Some(r#"[{"name": "netflix", "probability": 0.8}]"#),
        );
        write_frame(
            dir.path(),
            "a.png",
            10,
            Some(r#"[{"name": "code editor", "probability": 0.9}]"#),
        );
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let screen = ReplayScreen::open(dir.path()).unwrap();
        assert_eq!(screen.len(), 2);
        let perception = Perception::new(screen.scene_loader(), Box::new(NoFaceModel));

        let mut names = Vec::new();
        for _ in 0..3 {
            let frame = screen.capture_frame().await.unwrap().unwrap();
            let labels = perception
                .scene
                .classify_image(Arc::clone(&frame.image))
                .await
                .unwrap();
            names.push(labels[0].name.clone());
        }
        assert_eq!(names, ["code editor", "netflix", "code editor"]);
    }

    #[tokio::test]
    async fn missing_sidecar_means_no_labels() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "only.png", 50, None);

        let screen = ReplayScreen::open(dir.path()).unwrap();
        let perception = Perception::new(screen.scene_loader(), Box::new(NoFaceModel));
        let frame = screen.capture_frame().await.unwrap().unwrap();

        assert!(perception
            .scene
            .classify_image(frame.image)
            .await
            .unwrap()
            .is_empty());
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ReplayScreen::open(dir.path()).is_err());
    }

    #[tokio::test]
    async fn face_model_is_unavailable() {
        let perception = Perception::new(
            Box::new(SidecarSceneLoader {
                labels: Arc::new(Mutex::new(Vec::new())),
            }),
            Box::new(NoFaceModel),
        );
        assert!(perception.warm_up(false).await.is_ok());
        assert!(perception.warm_up(true).await.is_err());
    }
}
