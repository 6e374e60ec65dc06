#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::Notify;

use super::collaborators::{
    ActiveSessionRecord, NotificationSink, PendingTask, SessionStore, TaskProvider,
};
use super::state::{SessionType, TaskRef};

#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Start {
        session_type: SessionType,
        duration_secs: u64,
        task_ref: Option<TaskRef>,
    },
    Complete(String),
    Cancelled(String),
}

#[derive(Clone, Default)]
pub struct MockSessionStore {
    pub calls: Arc<Mutex<Vec<StoreCall>>>,
    pub active: Arc<Mutex<Option<ActiveSessionRecord>>>,
    pub fail: Arc<Mutex<bool>>,
    /// When set, `record_session_start` waits for a permit before answering.
    pub start_gate: Option<Arc<Notify>>,
}

impl MockSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let store = Self::default();
        *store.fail.lock().unwrap() = true;
        store
    }

    /// Store whose start records hang until the returned gate is notified.
    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let store = Self {
            start_gate: Some(gate.clone()),
            ..Self::default()
        };
        (store, gate)
    }

    pub fn with_active(record: ActiveSessionRecord) -> Self {
        let store = Self::default();
        *store.active.lock().unwrap() = Some(record);
        store
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    fn check(&self) -> Result<()> {
        if *self.fail.lock().unwrap() {
            bail!("connection refused");
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MockSessionStore {
    async fn record_session_start(
        &self,
        session_type: SessionType,
        duration_secs: u64,
        task_ref: Option<TaskRef>,
    ) -> Result<String> {
        if let Some(gate) = &self.start_gate {
            gate.notified().await;
        }
        self.check()?;
        let mut calls = self.calls.lock().unwrap();
        calls.push(StoreCall::Start {
            session_type,
            duration_secs,
            task_ref,
        });
        Ok(format!("remote-{}", calls.len()))
    }

    async fn record_session_complete(&self, session_id: &str) -> Result<()> {
        self.check()?;
        self.calls
            .lock()
            .unwrap()
            .push(StoreCall::Complete(session_id.to_string()));
        Ok(())
    }

    async fn record_session_cancelled(&self, session_id: &str) -> Result<()> {
        self.check()?;
        self.calls
            .lock()
            .unwrap()
            .push(StoreCall::Cancelled(session_id.to_string()));
        Ok(())
    }

    async fn fetch_active_session(&self) -> Result<Option<ActiveSessionRecord>> {
        self.check()?;
        Ok(self.active.lock().unwrap().clone())
    }
}

#[derive(Clone, Default)]
pub struct MockTaskProvider {
    pub tasks: Arc<Mutex<Vec<PendingTask>>>,
}

impl MockTaskProvider {
    pub fn with_tasks(tasks: &[(TaskRef, &str)]) -> Self {
        let provider = Self::default();
        *provider.tasks.lock().unwrap() = tasks
            .iter()
            .map(|(id, title)| PendingTask {
                id: *id,
                title: title.to_string(),
            })
            .collect();
        provider
    }
}

#[async_trait]
impl TaskProvider for MockTaskProvider {
    async fn list_pending_tasks(&self) -> Result<Vec<PendingTask>> {
        Ok(self.tasks.lock().unwrap().clone())
    }
}

#[derive(Clone, Default)]
pub struct RecordingSink {
    pub notified: Arc<Mutex<Vec<SessionType>>>,
    pub fail: bool,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn notified(&self) -> Vec<SessionType> {
        self.notified.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn on_session_complete(&self, session_type: SessionType) -> Result<()> {
        self.notified.lock().unwrap().push(session_type);
        if self.fail {
            bail!("no audio device");
        }
        Ok(())
    }
}
