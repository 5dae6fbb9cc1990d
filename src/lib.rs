#[macro_use]
mod utils;

pub mod capture;
pub mod content;
pub mod db;
pub mod error;
pub mod focus;
pub mod interrupt;
pub mod monitor;
pub mod perception;
pub mod replay;
pub mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use capture::NoWebcam;
use db::{Database, Identity, UserDirectory};
use interrupt::LogSpeech;
use monitor::{MonitorController, MonitorDeps, MonitorStatus};
use perception::Perception;
use replay::{NoFaceModel, ReplayScreen};
use settings::SettingsStore;

const DEFAULT_DATA_DIR: &str = ".yellmode";
const DEFAULT_USER_ID: &str = "local";

/// Process configuration read from the environment.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub data_dir: PathBuf,
    pub user_id: String,
    pub replay_dir: Option<PathBuf>,
}

impl RunConfig {
    pub fn from_env() -> Self {
        Self {
            data_dir: std::env::var_os("YELLMODE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            user_id: std::env::var("YELLMODE_USER_ID")
                .ok()
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| DEFAULT_USER_ID.to_string()),
            replay_dir: std::env::var_os("YELLMODE_REPLAY_DIR").map(PathBuf::from),
        }
    }
}

pub fn run() -> Result<()> {
    // RUST_LOG wins; otherwise info.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Yell Mode starting up...");

    let config = RunConfig::from_env();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(serve(config))
}

async fn serve(config: RunConfig) -> Result<()> {
    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("failed to create {}", config.data_dir.display()))?;

    let database = Database::new(config.data_dir.join("yellmode.sqlite3"))?;
    let directory = UserDirectory::new(database.clone());
    let identity = Identity {
        user_id: config.user_id.clone(),
        bearer_token: String::new(),
    };
    let user = directory.resolve(&identity).await?;

    let settings = Arc::new(SettingsStore::new(config.data_dir.join("settings.json"))?);
    if user.is_new() {
        database.save_settings(&user.id, &settings.monitor()).await?;
    } else {
        settings.update_monitor(user.monitor_settings())?;
    }

    let replay_dir = config
        .replay_dir
        .context("YELLMODE_REPLAY_DIR must point at a folder of screenshots")?;
    let screen = Arc::new(ReplayScreen::open(&replay_dir)?);
    let perception = Arc::new(Perception::new(
        screen.scene_loader(),
        Box::new(NoFaceModel),
    ));

    let controller = MonitorController::new(MonitorDeps {
        perception,
        screen,
        webcam: Arc::new(NoWebcam),
        speech: Arc::new(LogSpeech),
        settings: Arc::clone(&settings),
    });

    let mut updates = controller.subscribe();
    let reporter = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            if state.status == MonitorStatus::Active && state.phase == monitor::CyclePhase::Idle {
                log::info!(
                    "state: work={} ({:.2}) focused={} ({:.2}) checks={}",
                    state.is_work,
                    state.content_confidence,
                    state.is_focused,
                    state.focus_confidence,
                    state.cycles_completed
                );
            }
        }
    });

    controller.activate().await?;
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    controller.deactivate().await?;
    reporter.abort();

    database.save_settings(&user.id, &settings.monitor()).await?;
    log::info!("Yell Mode stopped");
    Ok(())
}
