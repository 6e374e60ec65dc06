use anyhow::{bail, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{PoisonError, RwLock},
    time::Duration,
};

use crate::timer::{SessionDurations, TickerConfig};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimerSettings {
    pub work_secs: u64,
    pub break_secs: u64,
    pub long_break_secs: u64,
    pub tick_interval_ms: u64,
    pub heartbeat_every_ticks: u32,
    pub sound_enabled: bool,
}

impl Default for TimerSettings {
    fn default() -> Self {
        let durations = SessionDurations::default();
        Self {
            work_secs: durations.work_secs,
            break_secs: durations.break_secs,
            long_break_secs: durations.long_break_secs,
            tick_interval_ms: 200,
            heartbeat_every_ticks: 25,
            sound_enabled: true,
        }
    }
}

impl TimerSettings {
    pub fn durations(&self) -> SessionDurations {
        SessionDurations {
            work_secs: self.work_secs,
            break_secs: self.break_secs,
            long_break_secs: self.long_break_secs,
        }
    }

    pub fn ticker_config(&self, debug_mode: bool) -> TickerConfig {
        TickerConfig {
            interval: Some(Duration::from_millis(self.tick_interval_ms)),
            heartbeat_every_ticks: if debug_mode { 1 } else { self.heartbeat_every_ticks },
        }
    }

    fn validate(&self) -> Result<()> {
        if self.work_secs == 0 || self.break_secs == 0 || self.long_break_secs == 0 {
            bail!("session durations must be greater than zero");
        }
        if self.tick_interval_ms == 0 {
            bail!("tick interval must be greater than zero");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UserSettings {
    #[serde(default)]
    timer: TimerSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            match serde_json::from_str::<UserSettings>(&contents) {
                Ok(data) if data.timer.validate().is_ok() => data,
                Ok(_) | Err(_) => {
                    warn!(
                        "Ignoring invalid settings in {}; using defaults",
                        path.display()
                    );
                    UserSettings::default()
                }
            }
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn timer(&self) -> TimerSettings {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .timer
            .clone()
    }

    pub fn update_timer(&self, settings: TimerSettings) -> Result<()> {
        settings.validate()?;
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        let mut updated = guard.clone();
        updated.timer = settings;
        self.persist(&updated)?;
        *guard = updated;
        Ok(())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        let settings = store.timer();
        assert_eq!(settings, TimerSettings::default());
        assert_eq!(settings.durations(), SessionDurations::default());
    }

    #[test]
    fn updates_persist_across_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();

        let mut settings = store.timer();
        settings.work_secs = 50 * 60;
        settings.sound_enabled = false;
        store.update_timer(settings.clone()).unwrap();

        let reloaded = SettingsStore::new(path).unwrap();
        assert_eq!(reloaded.timer(), settings);
        assert_eq!(reloaded.timer().durations().work_secs, 3000);
    }

    #[test]
    fn invalid_update_is_rejected_and_not_applied() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();

        let mut settings = store.timer();
        settings.break_secs = 0;
        assert!(store.update_timer(settings).is_err());
        assert_eq!(store.timer().break_secs, 300);
    }

    #[test]
    fn corrupt_or_partial_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let corrupt = dir.path().join("corrupt.json");
        fs::write(&corrupt, "{ not json").unwrap();
        assert_eq!(
            SettingsStore::new(corrupt).unwrap().timer(),
            TimerSettings::default()
        );

        let partial = dir.path().join("partial.json");
        fs::write(&partial, r#"{ "timer": { "work_secs": 600 } }"#).unwrap();
        let settings = SettingsStore::new(partial).unwrap().timer();
        assert_eq!(settings.work_secs, 600);
        assert_eq!(settings.break_secs, 300);
    }

    #[test]
    fn debug_mode_heartbeats_every_tick() {
        let settings = TimerSettings::default();
        assert_eq!(settings.ticker_config(true).heartbeat_every_ticks, 1);
        assert_eq!(settings.ticker_config(false).heartbeat_every_ticks, 25);
        assert_eq!(
            settings.ticker_config(false).interval,
            Some(Duration::from_millis(200))
        );
    }
}
