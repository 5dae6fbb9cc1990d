use std::cmp::Ordering;
use std::sync::Arc;

use image::RgbImage;

use super::{Label, LazyModel, ModelLoader, SceneModel};
use crate::error::{MonitorError, MonitorResult};

const DEFAULT_TOP_K: usize = 25;

pub struct SceneAdapter {
    model: LazyModel<dyn SceneModel>,
    top_k: usize,
}

impl SceneAdapter {
    pub fn new(loader: Box<dyn ModelLoader<dyn SceneModel>>) -> Self {
        Self {
            model: LazyModel::new(loader),
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub async fn warm_up(&self) -> MonitorResult<()> {
        self.model.get().await.map(|_| ())
    }

    pub fn is_ready(&self) -> bool {
        self.model.is_ready()
    }

    /// Ranked labels for `image`, highest probability first, at most `top_k`.
    pub async fn classify_image(&self, image: Arc<RgbImage>) -> MonitorResult<Vec<Label>> {
        let model = self.model.get().await?;
        let top_k = self.top_k;

        let labels = tokio::task::spawn_blocking(move || model.classify(&image, top_k))
            .await
            .map_err(|err| MonitorError::Classification(format!("scene worker join failed: {err}")))?
            .map_err(|err| MonitorError::Classification(format!("{err:#}")))?;

        Ok(normalize_labels(labels, top_k))
    }
}

/// Clamp probabilities into [0, 1], drop NaNs, sort descending, cap at `top_k`.
pub(crate) fn normalize_labels(labels: Vec<Label>, top_k: usize) -> Vec<Label> {
    let mut labels: Vec<Label> = labels
        .into_iter()
        .filter(|label| !label.probability.is_nan())
        .map(|mut label| {
            label.probability = label.probability.clamp(0.0, 1.0);
            label
        })
        .collect();

    labels.sort_by(|a, b| {
        b.probability
            .partial_cmp(&a.probability)
            .unwrap_or(Ordering::Equal)
    });
    labels.truncate(top_k);
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;

    struct FixedModel(Vec<Label>);

    impl SceneModel for FixedModel {
        fn classify(&self, _image: &RgbImage, _top_k: usize) -> Result<Vec<Label>> {
            Ok(self.0.clone())
        }
    }

    struct FixedLoader(Vec<Label>);

    #[async_trait]
    impl ModelLoader<dyn SceneModel> for FixedLoader {
        fn name(&self) -> &'static str {
            "fixed-scene"
        }

        async fn load(&self) -> Result<Arc<dyn SceneModel>> {
            Ok(Arc::new(FixedModel(self.0.clone())))
        }
    }

    #[tokio::test]
    async fn labels_come_back_sorted_and_capped() {
        let raw = vec![
            Label::new("keyboard", 0.2),
            Label::new("monitor", 1.4),
            Label::new("desk", f64::NAN),
            Label::new("screen", 0.6),
            Label::new("mouse", 0.1),
        ];
        let adapter = SceneAdapter::new(Box::new(FixedLoader(raw))).with_top_k(3);

        let labels = adapter
            .classify_image(Arc::new(RgbImage::new(4, 4)))
            .await
            .unwrap();

        let names: Vec<_> = labels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["monitor", "screen", "keyboard"]);
        assert_eq!(labels[0].probability, 1.0);
        assert!(adapter.is_ready());
    }
}
