//! Boundary contracts between the timer and the rest of the application.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::{SessionType, TaskRef};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PendingTask {
    pub id: TaskRef,
    pub title: String,
}

/// Persisted metadata of an unfinished session, enough to rebuild the countdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSessionRecord {
    pub session_id: String,
    pub session_type: SessionType,
    pub duration_secs: u64,
    pub started_at: DateTime<Utc>,
    pub task_ref: Option<TaskRef>,
}

/// Read-only view of the task list, used to pick a task before a session.
#[async_trait]
pub trait TaskProvider: Send + Sync {
    async fn list_pending_tasks(&self) -> Result<Vec<PendingTask>>;
}

/// Best-effort bookkeeping of sessions. Failures never change timer state.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn record_session_start(
        &self,
        session_type: SessionType,
        duration_secs: u64,
        task_ref: Option<TaskRef>,
    ) -> Result<String>;

    async fn record_session_complete(&self, session_id: &str) -> Result<()>;

    async fn record_session_cancelled(&self, session_id: &str) -> Result<()>;

    async fn fetch_active_session(&self) -> Result<Option<ActiveSessionRecord>>;
}

/// Audible or visual cue on completion. Errors are logged and dropped.
pub trait NotificationSink: Send + Sync {
    fn on_session_complete(&self, session_type: SessionType) -> Result<()>;
}
