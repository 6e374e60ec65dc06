#[cfg(feature = "chime")]
mod audio;
pub mod db;
pub mod notify;
pub mod settings;
mod shell;
mod tasks;
pub mod timer;
mod utils;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use db::Database;
use settings::SettingsStore;
use timer::{SystemClock, TimerController, TimerDeps};

const ENABLE_LOGS: bool = true;

const DATA_DIR_ENV: &str = "POMODO_DATA_DIR";
const DEBUG_ENV: &str = "POMODO_DEBUG";
const DEFAULT_DATA_DIR: &str = ".pomodo";

pub(crate) struct AppState {
    pub(crate) db: Database,
    pub(crate) timer: TimerController,
    pub(crate) settings: SettingsStore,
    /// Echo heartbeats to stderr.
    pub(crate) debug_mode: bool,
}

fn data_dir() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

fn debug_mode() -> bool {
    std::env::var(DEBUG_ENV)
        .map(|value| matches!(value.as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

pub fn run() -> Result<()> {
    // RUST_LOG overrides the default level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("pomodo starting up...");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;
    let result = runtime.block_on(serve());
    // stdin reads park a blocking thread that never returns on its own
    runtime.shutdown_timeout(Duration::from_millis(500));
    result
}

async fn serve() -> Result<()> {
    let data_dir = data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;

    let settings_store = SettingsStore::new(data_dir.join("settings.json"))?;
    let database = Database::new(data_dir.join("pomodo.sqlite3"))?;
    let timer_settings = settings_store.timer();
    let debug_mode = debug_mode();

    let deps = TimerDeps {
        clock: Arc::new(SystemClock),
        store: Arc::new(database.clone()),
        tasks: Arc::new(database.clone()),
        sink: notify::audible_sink(),
    };
    let timer_controller = TimerController::new(
        timer_settings.durations(),
        deps,
        timer_settings.ticker_config(debug_mode),
    );
    timer_controller.set_sound_enabled(timer_settings.sound_enabled);

    match timer_controller.reattach().await {
        Ok(Some(snapshot)) => log_info!(
            "Resumed {} session with {} left",
            snapshot.session_type,
            snapshot.remaining
        ),
        Ok(None) => {}
        Err(err) => log_error!("Could not restore the active session: {err}"),
    }

    let state = AppState {
        db: database,
        timer: timer_controller,
        settings: settings_store,
        debug_mode,
    };

    let outcome = shell::run_shell(&state).await;
    state.timer.shutdown().await;
    outcome
}
