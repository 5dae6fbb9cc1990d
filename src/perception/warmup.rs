use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::error::{MonitorError, MonitorResult};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Produces a loaded model. May be slow (weights download, graph compile).
#[async_trait]
pub trait ModelLoader<M: ?Sized + Send + Sync>: Send + Sync {
    fn name(&self) -> &'static str;

    async fn load(&self) -> Result<Arc<M>>;
}

/// Load-once model slot.
///
/// Concurrent callers during a load wait on the same in-flight attempt instead
/// of starting their own. A failed attempt leaves the slot empty so the next
/// caller retries.
pub struct LazyModel<M: ?Sized + Send + Sync> {
    loader: Box<dyn ModelLoader<M>>,
    cell: OnceCell<Arc<M>>,
    attempts: AtomicU32,
}

impl<M: ?Sized + Send + Sync> LazyModel<M> {
    pub fn new(loader: Box<dyn ModelLoader<M>>) -> Self {
        Self {
            loader,
            cell: OnceCell::new(),
            attempts: AtomicU32::new(0),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.cell.initialized()
    }

    pub async fn get(&self) -> MonitorResult<Arc<M>> {
        let name = self.loader.name();
        self.cell
            .get_or_try_init(|| async {
                let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
                log_info!("Loading {name} model (attempt {attempt})");
                match self.loader.load().await {
                    Ok(model) => {
                        log_info!("{name} model loaded");
                        Ok(model)
                    }
                    Err(err) => {
                        log_warn!("{name} model failed to load: {err:#}");
                        Err(MonitorError::ModelLoad {
                            model: name,
                            reason: format!("{err:#}"),
                        })
                    }
                }
            })
            .await
            .map(Arc::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    struct Dummy;

    struct CountingLoader {
        loads: Arc<AtomicU32>,
        fail_first: AtomicBool,
    }

    #[async_trait]
    impl ModelLoader<Dummy> for CountingLoader {
        fn name(&self) -> &'static str {
            "dummy"
        }

        async fn load(&self) -> Result<Arc<Dummy>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            if self.fail_first.swap(false, Ordering::SeqCst) {
                return Err(anyhow!("weights unavailable"));
            }
            Ok(Arc::new(Dummy))
        }
    }

    fn lazy(fail_first: bool) -> (Arc<LazyModel<Dummy>>, Arc<AtomicU32>) {
        let loads = Arc::new(AtomicU32::new(0));
        let model = LazyModel::new(Box::new(CountingLoader {
            loads: loads.clone(),
            fail_first: AtomicBool::new(fail_first),
        }));
        (Arc::new(model), loads)
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_load() {
        let (model, loads) = lazy(false);

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let model = model.clone();
                tokio::spawn(async move { model.get().await.is_ok() })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap());
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(model.is_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_load_is_retried_on_next_call() {
        let (model, loads) = lazy(true);

        let first = model.get().await;
        assert!(matches!(first, Err(MonitorError::ModelLoad { model: "dummy", .. })));
        assert!(!model.is_ready());

        assert!(model.get().await.is_ok());
        assert_eq!(loads.load(Ordering::SeqCst), 2);

        // Loaded models are never reloaded.
        assert!(model.get().await.is_ok());
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }
}
