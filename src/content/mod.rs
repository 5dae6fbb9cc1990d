//! Work / non-work classification of screenshots.

pub mod config;
pub mod fingerprint;
pub mod scoring;
pub mod similarity;
pub mod vocab;

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;

use crate::error::{MonitorError, MonitorResult};
use crate::perception::{CaptureFrame, Perception, PixelStats};

pub use config::ContentConfig;
pub use fingerprint::{fingerprint, Fingerprint, ResultCache};
pub use scoring::{score_labels, ContentScore};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub is_work: bool,
    pub confidence: f64,
    pub detected_work_items: Vec<String>,
    pub detected_non_work_items: Vec<String>,
    pub timestamp: DateTime<Utc>,
    /// Context rules that fired, for debugging.
    pub matched_rules: Vec<String>,
    /// Set when this result is the fail-open default.
    #[serde(skip)]
    pub error: Option<String>,
}

impl ClassificationResult {
    /// Assume productive. Used whenever classification could not run.
    pub fn fail_open(error: impl Into<String>) -> Self {
        Self {
            is_work: true,
            confidence: 0.0,
            detected_work_items: Vec::new(),
            detected_non_work_items: Vec::new(),
            timestamp: Utc::now(),
            matched_rules: Vec::new(),
            error: Some(error.into()),
        }
    }

    fn from_score(score: &ContentScore) -> Self {
        Self {
            is_work: score.is_work,
            confidence: score.confidence,
            detected_work_items: score.work_items.clone(),
            detected_non_work_items: score.non_work_items.clone(),
            timestamp: Utc::now(),
            matched_rules: score.matched_rules.iter().map(|r| r.to_string()).collect(),
            error: None,
        }
    }
}

pub struct ContentClassifier {
    perception: Arc<Perception>,
    config: ContentConfig,
    cache: Mutex<ResultCache<ContentScore>>,
}

impl ContentClassifier {
    pub fn new(perception: Arc<Perception>, config: ContentConfig) -> Self {
        let cache = ResultCache::new(config.cache_ttl, config.cache_capacity);
        Self {
            perception,
            config,
            cache: Mutex::new(cache),
        }
    }

    /// Classify a screenshot. Never fails: any inference error yields
    /// [`ClassificationResult::fail_open`].
    pub async fn classify(&self, frame: &CaptureFrame) -> ClassificationResult {
        match self.try_classify(frame).await {
            Ok(result) => result,
            Err(err) => {
                log_warn!("content classification failed, assuming work: {err}");
                ClassificationResult::fail_open(err.to_string())
            }
        }
    }

    async fn try_classify(&self, frame: &CaptureFrame) -> MonitorResult<ClassificationResult> {
        if !frame.is_decodable() {
            return Err(MonitorError::Classification(
                "screenshot has zero dimensions".to_string(),
            ));
        }

        let start = Instant::now();
        let image = Arc::clone(&frame.image);
        let (key, stats) = tokio::task::spawn_blocking(move || {
            (fingerprint(&image), PixelStats::from_image(&image))
        })
        .await
        .map_err(|err| MonitorError::Classification(format!("pixel stats worker failed: {err}")))?;

        let cached = self.cache().get(&key, Instant::now());
        if let Some(score) = cached {
            log_debug!("content cache hit for {}", key.phash);
            return Ok(ClassificationResult::from_score(&score));
        }

        let labels = self
            .perception
            .scene
            .classify_image(Arc::clone(&frame.image))
            .await?;
        let score = score_labels(&labels, &stats, &self.config);

        for decision in &score.decisions {
            log_debug!("  {decision}");
        }
        log_info!(
            "content: work={} confidence={:.2} (work {:.3} / non-work {:.3}, {} labels, {}ms)",
            score.is_work,
            score.confidence,
            score.work_score,
            score.non_work_score,
            labels.len(),
            start.elapsed().as_millis()
        );

        let result = ClassificationResult::from_score(&score);
        self.cache().insert(key, score, Instant::now());
        Ok(result)
    }

    pub fn clear_cache(&self) {
        self.cache().clear();
    }

    fn cache(&self) -> MutexGuard<'_, ResultCache<ContentScore>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::{FaceGeometry, FaceModel, Label, ModelLoader, SceneModel};
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use image::{Rgb, RgbImage};
    use std::sync::atomic::{AtomicU32, Ordering};

    struct ScriptedScene {
        labels: Vec<Label>,
        calls: Arc<AtomicU32>,
    }

    impl SceneModel for ScriptedScene {
        fn classify(&self, _image: &RgbImage, _top_k: usize) -> Result<Vec<Label>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.labels.clone())
        }
    }

    struct SceneLoader {
        labels: Vec<Label>,
        calls: Arc<AtomicU32>,
        fail: bool,
    }

    #[async_trait]
    impl ModelLoader<dyn SceneModel> for SceneLoader {
        fn name(&self) -> &'static str {
            "scripted-scene"
        }

        async fn load(&self) -> Result<Arc<dyn SceneModel>> {
            if self.fail {
                return Err(anyhow!("no weights"));
            }
            Ok(Arc::new(ScriptedScene {
                labels: self.labels.clone(),
                calls: self.calls.clone(),
            }))
        }
    }

    struct NoFace;

    impl FaceModel for NoFace {
        fn detect(&self, _image: &RgbImage) -> Result<Option<FaceGeometry>> {
            Ok(None)
        }
    }

    struct NoFaceLoader;

    #[async_trait]
    impl ModelLoader<dyn FaceModel> for NoFaceLoader {
        fn name(&self) -> &'static str {
            "no-face"
        }

        async fn load(&self) -> Result<Arc<dyn FaceModel>> {
            Ok(Arc::new(NoFace))
        }
    }

    fn classifier(labels: Vec<Label>, fail: bool) -> (ContentClassifier, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let perception = Perception::new(
            Box::new(SceneLoader {
                labels,
                calls: calls.clone(),
                fail,
            }),
            Box::new(NoFaceLoader),
        );
        (
            ContentClassifier::new(Arc::new(perception), ContentConfig::default()),
            calls,
        )
    }

    fn screenshot() -> CaptureFrame {
        // Light, low-variance page.
        CaptureFrame::new(RgbImage::from_pixel(64, 48, Rgb([200, 205, 210])))
    }

    #[tokio::test]
    async fn classifies_work_screen() {
        let (classifier, _) = classifier(
            vec![Label::new("code editor", 0.9), Label::new("keyboard", 0.5)],
            false,
        );

        let result = classifier.classify(&screenshot()).await;

        assert!(result.is_work);
        assert!(result.confidence > 0.6);
        assert!(result.error.is_none());
        assert!(result.detected_work_items.contains(&"keyboard".to_string()));
    }

    #[tokio::test]
    async fn model_failure_fails_open() {
        let (classifier, _) = classifier(Vec::new(), true);

        let result = classifier.classify(&screenshot()).await;

        assert!(result.is_work);
        assert_eq!(result.confidence, 0.0);
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn undecodable_screenshot_fails_open() {
        let (classifier, calls) = classifier(vec![Label::new("netflix", 0.9)], false);

        let result = classifier
            .classify(&CaptureFrame::new(RgbImage::new(0, 0)))
            .await;

        assert!(result.is_work);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn identical_screenshots_reuse_cached_result() {
        let (classifier, calls) = classifier(vec![Label::new("netflix", 0.8)], false);

        let first = classifier.classify(&screenshot()).await;
        let second = classifier.classify(&screenshot()).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.is_work, second.is_work);
        assert_eq!(first.confidence, second.confidence);

        classifier.clear_cache();
        classifier.classify(&screenshot()).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
