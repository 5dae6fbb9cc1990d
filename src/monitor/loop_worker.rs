use std::pin::Pin;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::{Duration, Instant, Interval, MissedTickBehavior, Sleep};
use tokio_util::sync::CancellationToken;

use crate::capture::{ScreenCapture, WebcamCapture};
use crate::content::{ClassificationResult, ContentClassifier};
use crate::error::MonitorError;
use crate::focus::{FocusClassifier, FocusResult, SecondMonitorLatch};
use crate::interrupt::{decide, Dispatcher, InterruptDecision};
use crate::perception::CaptureFrame;
use crate::settings::{MonitorSettings, SettingsStore};

use super::state::{CyclePhase, ProductivityState, Visibility};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// When the last yell went out. Owned by the controller so the cooldown
/// survives deactivate/activate.
pub(crate) type LastYell = Arc<Mutex<Option<Instant>>>;

/// Everything one session's loop owns or shares.
pub(crate) struct SessionWorker {
    pub session_id: String,
    pub content: Arc<ContentClassifier>,
    pub focus: Arc<FocusClassifier>,
    pub dispatcher: Arc<Dispatcher>,
    pub screen: Arc<dyn ScreenCapture>,
    /// `None` when the webcam was not granted for this session.
    pub webcam: Option<Arc<dyn WebcamCapture>>,
    pub settings: Arc<SettingsStore>,
    pub state: Arc<watch::Sender<ProductivityState>>,
    pub visibility: watch::Receiver<Visibility>,
    pub cancel: CancellationToken,
    pub in_progress: Arc<AtomicBool>,
    pub cycle_timeout: Duration,
    pub catch_up_delay: Duration,

    pub latch: SecondMonitorLatch,
    pub last_yell: LastYell,
}

#[derive(Debug)]
enum CycleOutcome {
    Completed,
    Skipped(&'static str),
}

/// Clears the in-progress flag when a cycle ends, including by timeout.
struct CycleGuard(Arc<AtomicBool>);

impl CycleGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CycleGuard(Arc::clone(flag)))
    }
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn new_ticker(period: Duration, start: Instant) -> Interval {
    let mut ticker = tokio::time::interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn wait_catch_up(sleep: &mut Option<Pin<Box<Sleep>>>) {
    match sleep {
        Some(sleep) => sleep.await,
        None => std::future::pending().await,
    }
}

pub(crate) async fn monitor_loop(mut worker: SessionWorker) {
    let mut period = worker.settings.monitor().check_interval();
    // First tick completes immediately: the first check does not wait.
    let mut ticker = new_ticker(period, Instant::now());
    let mut catch_up: Option<Pin<Box<Sleep>>> = None;

    log_info!(
        "monitor loop started for session {} (every {}s)",
        worker.session_id,
        period.as_secs()
    );

    loop {
        tokio::select! {
            biased;
            _ = worker.cancel.cancelled() => {
                log_info!("monitor loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                worker.run_guarded().await;
            }
            _ = wait_catch_up(&mut catch_up) => {
                catch_up = None;
                log_info!("running catch-up check after becoming visible");
                worker.run_guarded().await;
                ticker.reset();
            }
            changed = worker.visibility.changed() => {
                if changed.is_err() {
                    // Controller dropped; nothing will cancel us anymore.
                    break;
                }
                let visibility = *worker.visibility.borrow_and_update();
                catch_up = match visibility {
                    Visibility::Visible => Some(Box::pin(tokio::time::sleep(worker.catch_up_delay))),
                    Visibility::Hidden => None,
                };
            }
        }

        let wanted = worker.settings.monitor().check_interval();
        if wanted != period {
            log_info!(
                "check interval changed {}s -> {}s",
                period.as_secs(),
                wanted.as_secs()
            );
            period = wanted;
            ticker = new_ticker(period, Instant::now() + period);
        }
    }
}

impl SessionWorker {
    async fn run_guarded(&mut self) {
        let Some(_guard) = CycleGuard::acquire(&self.in_progress) else {
            log_warn!("previous check still running, skipping this tick");
            return;
        };

        let timeout = self.cycle_timeout;
        match tokio::time::timeout(timeout, self.run_cycle()).await {
            Ok(CycleOutcome::Completed) => {}
            Ok(CycleOutcome::Skipped(reason)) => log_info!("check skipped: {reason}"),
            Err(_) => {
                log_warn!("check timed out (> {}s)", timeout.as_secs());
                self.publish(|state| state.phase = CyclePhase::Idle);
            }
        }
    }

    fn publish(&self, update: impl FnOnce(&mut ProductivityState)) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.state.send_modify(update);
    }

    async fn run_cycle(&mut self) -> CycleOutcome {
        let cycle_start = Instant::now();
        let settings = self.settings.monitor();
        self.publish(|state| {
            state.phase = CyclePhase::Capturing;
            state.last_attempt_at = Some(Utc::now());
        });

        let capture_start = Instant::now();
        let screenshot = match self.screen.capture_frame().await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                self.publish(|state| {
                    state.phase = CyclePhase::Idle;
                    state.warning = Some("no screenshot available".to_string());
                });
                return CycleOutcome::Skipped("no screenshot available");
            }
            Err(err) => {
                log_error!("screenshot capture failed: {err:#}");
                self.publish(|state| {
                    state.phase = CyclePhase::Idle;
                    state.warning = Some(MonitorError::Capture(format!("{err:#}")).to_string());
                });
                return CycleOutcome::Skipped("screenshot capture failed");
            }
        };

        let webcam_frame = match (&self.webcam, settings.use_face_detection) {
            (Some(webcam), true) => match webcam.current_frame().await {
                Ok(frame) => Some(frame),
                Err(err) => {
                    log_warn!("webcam frame unavailable: {err:#}");
                    Some(None)
                }
            },
            _ => None,
        };
        let capture_ms = capture_start.elapsed().as_millis();

        self.publish(|state| state.phase = CyclePhase::Classifying);

        let content_start = Instant::now();
        let content = self.content.classify(&screenshot).await;
        let content_ms = content_start.elapsed().as_millis();

        let focus_start = Instant::now();
        let focus = self.classify_focus(webcam_frame, &settings).await;
        let focus_ms = focus_start.elapsed().as_millis();

        if self.cancel.is_cancelled() {
            return CycleOutcome::Skipped("session deactivated during classification");
        }

        let visible = *self.visibility.borrow() == Visibility::Visible;
        self.publish(|state| {
            state.phase = CyclePhase::Deciding;
            apply_results(state, &content, &focus);
            if visible {
                state.screenshot = Some(Arc::clone(&screenshot.image));
            }
        });

        self.maybe_yell(&content, &focus, &settings).await;

        self.publish(|state| {
            state.phase = CyclePhase::Idle;
            state.cycles_completed += 1;
        });

        log_info!(
            "check done: work={} ({:.2}) focused={} ({:.2}) capture={}ms content={}ms focus={}ms total={}ms",
            content.is_work,
            content.confidence,
            focus.focused,
            focus.confidence,
            capture_ms,
            content_ms,
            focus_ms,
            cycle_start.elapsed().as_millis()
        );
        CycleOutcome::Completed
    }

    /// `webcam_frame` is `None` when focus is not measured this session, and
    /// `Some(None)` when the webcam is on but has no frame yet.
    async fn classify_focus(
        &mut self,
        webcam_frame: Option<Option<CaptureFrame>>,
        settings: &MonitorSettings,
    ) -> FocusResult {
        match webcam_frame {
            None => FocusResult::not_measured(),
            Some(None) => FocusResult::fail_open(),
            Some(Some(frame)) => {
                self.focus
                    .detect(&frame, settings.secondary_monitor_above, &mut self.latch)
                    .await
            }
        }
    }

    async fn maybe_yell(
        &mut self,
        content: &ClassificationResult,
        focus: &FocusResult,
        settings: &MonitorSettings,
    ) {
        let now = Instant::now();
        let last_yell = *self
            .last_yell
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let decision = decide(
            content.is_work,
            focus.focused,
            focus.gaze_direction,
            last_yell,
            now,
            settings.cooldown(),
        );

        let bucket = match decision {
            InterruptDecision::Stay => return,
            InterruptDecision::Cooling { remaining } => {
                log_info!(
                    "off task (work={}, focused={}) but cooling down, {}s remaining",
                    content.is_work,
                    focus.focused,
                    remaining.as_secs_f64().ceil()
                );
                return;
            }
            InterruptDecision::Fire(bucket) => bucket,
        };

        if self.cancel.is_cancelled() {
            return;
        }

        match self.dispatcher.dispatch(bucket, settings.style).await {
            Ok(yell) => {
                // Dispatch may have taken a while; the gate uses the decision time.
                *self
                    .last_yell
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(now);
                self.publish(|state| state.record_yell(Utc::now(), yell));
            }
            Err(err) => {
                self.publish(|state| state.warning = Some(err.to_string()));
            }
        }
    }
}

fn apply_results(state: &mut ProductivityState, content: &ClassificationResult, focus: &FocusResult) {
    state.is_work = content.is_work;
    state.content_confidence = content.confidence;
    state.detected_work_items = content.detected_work_items.clone();
    state.detected_non_work_items = content.detected_non_work_items.clone();
    state.is_focused = focus.focused;
    state.focus_confidence = focus.confidence;
    state.gaze_direction = focus.gaze_direction;
    state.last_checked_at = Some(content.timestamp);
    state.error = content.error.clone();
}
