use std::sync::{atomic::AtomicBool, Arc};

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::capture::{ScreenCapture, WebcamCapture};
use crate::content::{ContentClassifier, ContentConfig};
use crate::error::{MonitorError, MonitorResult};
use crate::focus::{FocusClassifier, FocusConfig, SecondMonitorLatch};
use crate::interrupt::{Dispatcher, SpeechOutput};
use crate::perception::Perception;
use crate::settings::SettingsStore;

use super::loop_worker::{monitor_loop, LastYell, SessionWorker};
use super::state::{MonitorStatus, ProductivityState, Visibility};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

const CYCLE_TIMEOUT: Duration = Duration::from_secs(20);
const CATCH_UP_DELAY: Duration = Duration::from_secs(1);

/// External capabilities the monitor drives.
pub struct MonitorDeps {
    pub perception: Arc<Perception>,
    pub screen: Arc<dyn ScreenCapture>,
    pub webcam: Arc<dyn WebcamCapture>,
    pub speech: Arc<dyn SpeechOutput>,
    pub settings: Arc<SettingsStore>,
}

struct ActiveSession {
    id: String,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
    webcam_active: bool,
}

/// Owns the monitoring session lifecycle:
/// `Inactive -> Initializing -> Active -> Deactivating -> Inactive`.
#[derive(Clone)]
pub struct MonitorController {
    perception: Arc<Perception>,
    screen: Arc<dyn ScreenCapture>,
    webcam: Arc<dyn WebcamCapture>,
    settings: Arc<SettingsStore>,
    content: Arc<ContentClassifier>,
    focus: Arc<FocusClassifier>,
    dispatcher: Arc<Dispatcher>,
    state: Arc<watch::Sender<ProductivityState>>,
    visibility: Arc<watch::Sender<Visibility>>,
    session: Arc<Mutex<Option<ActiveSession>>>,
    last_yell: LastYell,
    cycle_timeout: Duration,
}

impl MonitorController {
    pub fn new(deps: MonitorDeps) -> Self {
        let dispatcher = Dispatcher::new(deps.speech);
        Self::with_dispatcher(deps.perception, deps.screen, deps.webcam, deps.settings, dispatcher)
    }

    pub fn with_dispatcher(
        perception: Arc<Perception>,
        screen: Arc<dyn ScreenCapture>,
        webcam: Arc<dyn WebcamCapture>,
        settings: Arc<SettingsStore>,
        dispatcher: Dispatcher,
    ) -> Self {
        let (state, _) = watch::channel(ProductivityState::new());
        let (visibility, _) = watch::channel(Visibility::Visible);
        Self {
            content: Arc::new(ContentClassifier::new(
                Arc::clone(&perception),
                ContentConfig::default(),
            )),
            focus: Arc::new(FocusClassifier::new(
                Arc::clone(&perception),
                FocusConfig::default(),
            )),
            perception,
            screen,
            webcam,
            settings,
            dispatcher: Arc::new(dispatcher),
            state: Arc::new(state),
            visibility: Arc::new(visibility),
            session: Arc::new(Mutex::new(None)),
            last_yell: LastYell::default(),
            cycle_timeout: CYCLE_TIMEOUT,
        }
    }

    pub fn with_cycle_timeout(mut self, timeout: Duration) -> Self {
        self.cycle_timeout = timeout;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<ProductivityState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ProductivityState {
        self.state.borrow().clone()
    }

    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.settings
    }

    pub async fn is_active(&self) -> bool {
        self.session.lock().await.is_some()
    }

    /// Host page shown or hidden. Cycles keep running while hidden; on
    /// becoming visible a catch-up check runs shortly after.
    pub fn set_visibility(&self, visibility: Visibility) {
        let previous = self.visibility.send_replace(visibility);
        if previous != visibility {
            log_info!("visibility {:?} -> {:?}", previous, visibility);
        }
    }

    /// Start a monitoring session. Returns the new session id.
    ///
    /// Screen permission denial and model load failure abort activation;
    /// webcam denial only disables focus detection.
    pub async fn activate(&self) -> MonitorResult<String> {
        let mut session = self.session.lock().await;
        if session.is_some() {
            return Err(MonitorError::AlreadyActive);
        }

        let settings = self.settings.monitor();
        self.state.send_modify(|state| {
            *state = ProductivityState {
                status: MonitorStatus::Initializing,
                last_yell_time: state.last_yell_time,
                last_yell: state.last_yell.take(),
                ..ProductivityState::default()
            };
        });

        if !self.screen.request_access().await {
            log_warn!("screen capture permission denied");
            return Err(self.fail_activation(MonitorError::ScreenPermissionDenied, false).await);
        }

        let mut warning = None;
        let webcam_active = if settings.use_face_detection {
            if self.webcam.request_access().await {
                true
            } else {
                log_warn!("webcam permission denied, focus detection disabled for this session");
                warning = Some(MonitorError::WebcamPermissionDenied.to_string());
                false
            }
        } else {
            false
        };

        if let Err(err) = self.perception.warm_up(webcam_active).await {
            log_error!("model warm-up failed: {err}");
            return Err(self.fail_activation(err, webcam_active).await);
        }

        let session_id = Uuid::new_v4().to_string();
        let cancel = CancellationToken::new();

        self.state.send_modify(|state| {
            state.status = MonitorStatus::Active;
            state.session_id = Some(session_id.clone());
            state.webcam_active = webcam_active;
            state.warning = warning;
        });

        let worker = SessionWorker {
            session_id: session_id.clone(),
            content: Arc::clone(&self.content),
            focus: Arc::clone(&self.focus),
            dispatcher: Arc::clone(&self.dispatcher),
            screen: Arc::clone(&self.screen),
            webcam: webcam_active.then(|| Arc::clone(&self.webcam)),
            settings: Arc::clone(&self.settings),
            state: Arc::clone(&self.state),
            visibility: self.visibility.subscribe(),
            cancel: cancel.clone(),
            in_progress: Arc::new(AtomicBool::new(false)),
            cycle_timeout: self.cycle_timeout,
            catch_up_delay: CATCH_UP_DELAY,
            latch: SecondMonitorLatch::new(),
            last_yell: Arc::clone(&self.last_yell),
        };
        let handle = tokio::spawn(monitor_loop(worker));

        log_info!(
            "monitoring session {} active (webcam {})",
            session_id,
            if webcam_active { "on" } else { "off" }
        );

        *session = Some(ActiveSession {
            id: session_id.clone(),
            cancel,
            handle,
            webcam_active,
        });
        Ok(session_id)
    }

    async fn fail_activation(&self, err: MonitorError, webcam_active: bool) -> MonitorError {
        self.screen.release().await;
        if webcam_active {
            self.webcam.release().await;
        }
        self.state.send_modify(|state| {
            state.status = MonitorStatus::Inactive;
            state.error = Some(err.to_string());
        });
        err
    }

    /// Stop the session: no further cycles start, speech is cut off, capture
    /// handles are released. An in-flight cycle finishes without publishing.
    pub async fn deactivate(&self) -> MonitorResult<()> {
        let Some(active) = self.session.lock().await.take() else {
            return Err(MonitorError::NotActive);
        };

        log_info!("deactivating monitoring session {}", active.id);
        self.state
            .send_modify(|state| state.status = MonitorStatus::Deactivating);

        active.cancel.cancel();
        self.dispatcher.cancel_all();

        if let Err(err) = active.handle.await {
            log_error!("monitor loop task failed to join: {err}");
        }

        self.screen.release().await;
        if active.webcam_active {
            self.webcam.release().await;
        }
        self.content.clear_cache();

        self.state.send_modify(ProductivityState::clear_transient);
        log_info!("monitoring session {} stopped", active.id);
        Ok(())
    }
}
