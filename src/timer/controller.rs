use std::{
    collections::HashMap,
    future::Future,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex as StdMutex, MutexGuard as StdMutexGuard, PoisonError,
    },
    time::Duration,
};

use log::error;
use serde::Serialize;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use super::{
    clock::Clock,
    collaborators::{NotificationSink, PendingTask, SessionStore, TaskProvider},
    error::TimerError,
    state::{
        RemainingTime, Session, SessionDurations, SessionTimer, SessionType, TaskRef, TimerStatus,
    },
};

// Set to false to silence timer lifecycle logging
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub status: TimerStatus,
    pub session_type: SessionType,
    pub remaining: RemainingTime,
    pub session: Option<Session>,
    pub selected_task: Option<TaskRef>,
}

impl TimerSnapshot {
    fn capture(timer: &SessionTimer, now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            status: timer.status(),
            session_type: timer.session_type(),
            remaining: timer.tick(now),
            session: timer.session().cloned(),
            selected_task: timer.selected_task(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum TimerEvent {
    StateChanged(TimerSnapshot),
    Heartbeat(TimerSnapshot),
    SessionCompleted {
        session: Session,
        next_type: SessionType,
    },
    CollaboratorUnavailable {
        operation: &'static str,
        message: String,
    },
}

/// Everything the controller talks to besides its own timer.
#[derive(Clone)]
pub struct TimerDeps {
    pub clock: Arc<dyn Clock>,
    pub store: Arc<dyn SessionStore>,
    pub tasks: Arc<dyn TaskProvider>,
    pub sink: Arc<dyn NotificationSink>,
}

#[derive(Debug, Clone, Copy)]
pub struct TickerConfig {
    /// `None` leaves ticking to the caller via [`TimerController::poll_completion`].
    pub interval: Option<Duration>,
    pub heartbeat_every_ticks: u32,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            interval: Some(Duration::from_millis(200)),
            heartbeat_every_ticks: 25,
        }
    }
}

struct Ticker {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

/// How a session ended while its start record was still in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Finished {
    Completed,
    Cancelled,
}

/// Local session ids whose start record has not come back yet.
type InFlight = HashMap<String, Option<Finished>>;

/// Owns the single session timer of the application and performs the side
/// effects of its transitions. Cheap to clone; clones share the same timer.
#[derive(Clone)]
pub struct TimerController {
    timer: Arc<Mutex<SessionTimer>>,
    clock: Arc<dyn Clock>,
    store: Arc<dyn SessionStore>,
    tasks: Arc<dyn TaskProvider>,
    sink: Arc<dyn NotificationSink>,
    events: broadcast::Sender<TimerEvent>,
    ticker: Arc<Mutex<Option<Ticker>>>,
    in_flight: Arc<StdMutex<InFlight>>,
    sound_enabled: Arc<AtomicBool>,
    config: TickerConfig,
}

impl TimerController {
    pub fn new(durations: SessionDurations, deps: TimerDeps, config: TickerConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            timer: Arc::new(Mutex::new(SessionTimer::new(durations))),
            clock: deps.clock,
            store: deps.store,
            tasks: deps.tasks,
            sink: deps.sink,
            events,
            ticker: Arc::new(Mutex::new(None)),
            in_flight: Arc::new(StdMutex::new(HashMap::new())),
            sound_enabled: Arc::new(AtomicBool::new(true)),
            config,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> TimerSnapshot {
        let now = self.clock.now();
        let timer = self.timer.lock().await;
        TimerSnapshot::capture(&timer, now)
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled.load(Ordering::Relaxed)
    }

    /// Mutes or unmutes the completion notification from the next completion on.
    pub fn set_sound_enabled(&self, enabled: bool) {
        self.sound_enabled.store(enabled, Ordering::Relaxed);
        log_info!("completion sound {}", if enabled { "on" } else { "off" });
    }

    pub async fn set_durations(&self, durations: SessionDurations) {
        self.timer.lock().await.set_durations(durations);
        self.emit_state_changed().await;
    }

    pub async fn pending_tasks(&self) -> Result<Vec<PendingTask>, TimerError> {
        self.tasks
            .list_pending_tasks()
            .await
            .map_err(|err| TimerError::unavailable("list pending tasks", &err))
    }

    pub async fn select_task(&self, task_ref: Option<TaskRef>) -> Result<TimerSnapshot, TimerError> {
        if let Some(task_id) = task_ref {
            self.ensure_pending(task_id).await?;
        }
        self.timer.lock().await.select_task(task_ref)?;
        self.emit_state_changed().await;
        Ok(self.snapshot().await)
    }

    pub async fn switch_session_type(
        &self,
        session_type: SessionType,
    ) -> Result<TimerSnapshot, TimerError> {
        self.timer.lock().await.switch_session_type(session_type)?;
        self.emit_state_changed().await;
        Ok(self.snapshot().await)
    }

    /// Starts a session. Type and duration default to the idle selection and
    /// its configured duration.
    pub async fn start_session(
        &self,
        session_type: Option<SessionType>,
        duration_secs: Option<u64>,
        task_ref: Option<TaskRef>,
    ) -> Result<TimerSnapshot, TimerError> {
        if let Some(task_id) = task_ref {
            match self.ensure_pending(task_id).await {
                Ok(()) => {}
                Err(TimerError::CollaboratorUnavailable { message, .. }) => {
                    log_warn!("could not verify task {task_id}, starting anyway: {message}");
                }
                Err(err) => return Err(err),
            }
        }

        let now = self.clock.now();
        let (local_id, kind, planned, task) = {
            let mut timer = self.timer.lock().await;
            let kind = session_type.unwrap_or(timer.session_type());
            let planned = duration_secs.unwrap_or(timer.durations().for_type(kind));
            let session = timer.start(kind, planned, task_ref, now)?;
            self.lock_in_flight().insert(session.id.clone(), None);
            (session.id.clone(), kind, planned, session.task_ref)
        };
        log_info!("started {kind} session {local_id} ({planned}s)");

        self.spawn_ticker().await;
        self.spawn_start_record(local_id, kind, planned, task);
        self.emit_state_changed().await;
        Ok(self.snapshot().await)
    }

    pub async fn pause(&self) -> Result<TimerSnapshot, TimerError> {
        let now = self.clock.now();
        self.timer.lock().await.pause(now)?;
        self.cancel_ticker().await;
        log_info!("timer paused");
        self.emit_state_changed().await;
        Ok(self.snapshot().await)
    }

    pub async fn resume(&self) -> Result<TimerSnapshot, TimerError> {
        let now = self.clock.now();
        self.timer.lock().await.resume(now)?;
        self.spawn_ticker().await;
        log_info!("timer resumed");
        self.emit_state_changed().await;
        Ok(self.snapshot().await)
    }

    /// Start when idle, pause when running, resume when paused.
    pub async fn toggle(&self) -> Result<TimerSnapshot, TimerError> {
        let status = self.timer.lock().await.status();
        match status {
            TimerStatus::Idle | TimerStatus::Completed => self.start_session(None, None, None).await,
            TimerStatus::Running => self.pause().await,
            TimerStatus::Paused => self.resume().await,
        }
    }

    /// Abandons the current session without running completion side effects.
    pub async fn reset(&self) -> TimerSnapshot {
        let discarded = {
            let mut timer = self.timer.lock().await;
            let discarded = timer.reset();
            if let Some(session) = discarded.as_ref() {
                if session.status != TimerStatus::Completed {
                    self.note_finished(&session.id, Finished::Cancelled);
                }
            }
            discarded
        };
        self.cancel_ticker().await;

        if let Some(session) = discarded {
            log_info!("discarded {} session {}", session.session_type, session.id);
            if session.status != TimerStatus::Completed {
                if let Some(remote_id) = session.remote_id {
                    let store = self.store.clone();
                    self.spawn_bookkeeping("record session cancelled", async move {
                        store.record_session_cancelled(&remote_id).await
                    });
                }
            }
        }

        self.emit_state_changed().await;
        self.snapshot().await
    }

    /// Restores the session the store still considers active, if any.
    pub async fn reattach(&self) -> Result<Option<TimerSnapshot>, TimerError> {
        let record = match self.store.fetch_active_session().await {
            Ok(Some(record)) => record,
            Ok(None) => return Ok(None),
            Err(err) => {
                self.report_unavailable("fetch active session", &err);
                return Err(TimerError::unavailable("fetch active session", &err));
            }
        };

        let now = self.clock.now();
        {
            let mut timer = self.timer.lock().await;
            let session = timer.reattach(record, now)?;
            log_info!(
                "reattached {} session {} started at {}",
                session.session_type,
                session.remote_id.as_deref().unwrap_or("?"),
                session.started_at
            );
        }

        self.spawn_ticker().await;
        self.emit_state_changed().await;
        Ok(Some(self.snapshot().await))
    }

    /// One detection pass. When the running session has run out, fires the
    /// completion side effects and returns the completed session.
    pub async fn poll_completion(&self) -> Option<Session> {
        let now = self.clock.now();
        let session = {
            let mut timer = self.timer.lock().await;
            if !timer.check_completion(now) {
                return None;
            }
            let session = timer.session().cloned()?;
            self.note_finished(&session.id, Finished::Completed);
            session
        };
        log_info!("{} session {} completed", session.session_type, session.id);

        if self.sound_enabled() {
            if let Err(err) = self.sink.on_session_complete(session.session_type) {
                log_warn!("completion notification failed: {err:#}");
            }
        }

        match session.remote_id.clone() {
            Some(remote_id) => {
                let store = self.store.clone();
                self.spawn_bookkeeping("record session complete", async move {
                    store.record_session_complete(&remote_id).await
                });
            }
            None => log_info!(
                "session {} has no store id yet; completion is recorded once the start is",
                session.id
            ),
        }

        self.timer.lock().await.take_completed();

        let _ = self.events.send(TimerEvent::SessionCompleted {
            session: session.clone(),
            next_type: session.session_type.next(),
        });
        self.emit_state_changed().await;
        Some(session)
    }

    pub async fn shutdown(&self) {
        self.cancel_ticker().await;
    }

    async fn ensure_pending(&self, task_id: TaskRef) -> Result<(), TimerError> {
        let pending = self.pending_tasks().await?;
        if pending.iter().any(|task| task.id == task_id) {
            Ok(())
        } else {
            Err(TimerError::UnknownTask(task_id))
        }
    }

    async fn spawn_ticker(&self) {
        let Some(period) = self.config.interval else {
            return;
        };

        let mut ticker_guard = self.ticker.lock().await;
        if let Some(old) = ticker_guard.take() {
            old.cancel_token.cancel();
            old.handle.abort();
        }

        let cancel_token = CancellationToken::new();
        let controller = self.clone();
        let token = cancel_token.clone();
        let handle = tokio::spawn(async move { controller.run_ticker(period, token).await });

        *ticker_guard = Some(Ticker {
            handle,
            cancel_token,
        });
    }

    async fn cancel_ticker(&self) {
        if let Some(ticker) = self.ticker.lock().await.take() {
            ticker.cancel_token.cancel();
            ticker.handle.abort();
        }
    }

    async fn run_ticker(self, period: Duration, cancel_token: CancellationToken) {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks: u32 = 0;

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = cancel_token.cancelled() => {
                    log_info!("timer ticker shutting down");
                    break;
                }
            }

            if !self.on_tick(&mut ticks).await {
                break;
            }
        }
    }

    /// One ticker step. Returns false once there is no running session to watch.
    async fn on_tick(&self, ticks: &mut u32) -> bool {
        if self.timer.lock().await.status() != TimerStatus::Running {
            return false;
        }
        if self.poll_completion().await.is_some() {
            return false;
        }

        *ticks = ticks.wrapping_add(1);
        if *ticks % self.config.heartbeat_every_ticks.max(1) == 0 {
            let snapshot = self.snapshot().await;
            let _ = self.events.send(TimerEvent::Heartbeat(snapshot));
        }
        true
    }

    /// Records the start without holding up the caller. If the session ended
    /// before the store answered, its final status follows right away.
    fn spawn_start_record(
        &self,
        local_id: String,
        session_type: SessionType,
        planned_secs: u64,
        task_ref: Option<TaskRef>,
    ) {
        let controller = self.clone();
        tokio::spawn(async move {
            let store = controller.store.clone();
            let remote_id = match store
                .record_session_start(session_type, planned_secs, task_ref)
                .await
            {
                Ok(remote_id) => remote_id,
                Err(err) => {
                    controller.lock_in_flight().remove(&local_id);
                    controller.report_unavailable("record session start", &err);
                    return;
                }
            };

            let finished = {
                let mut timer = controller.timer.lock().await;
                let finished = controller.lock_in_flight().remove(&local_id).flatten();
                if timer.attach_remote_id(&local_id, remote_id.clone()) {
                    return;
                }
                finished
            };

            let (operation, result) = match finished {
                Some(Finished::Completed) => (
                    "record session complete",
                    store.record_session_complete(&remote_id).await,
                ),
                Some(Finished::Cancelled) | None => (
                    "record session cancelled",
                    store.record_session_cancelled(&remote_id).await,
                ),
            };
            log_info!("session {local_id} ended before its start was recorded; sent {operation}");
            if let Err(err) = result {
                controller.report_unavailable(operation, &err);
            }
        });
    }

    fn lock_in_flight(&self) -> StdMutexGuard<'_, InFlight> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Remembers how a session ended while its start record is pending.
    fn note_finished(&self, local_id: &str, finished: Finished) {
        if let Some(slot) = self.lock_in_flight().get_mut(local_id) {
            *slot = Some(finished);
        }
    }

    /// Runs a store call in the background; failures are reported, never retried.
    fn spawn_bookkeeping<F>(&self, operation: &'static str, call: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let events = self.events.clone();
        tokio::spawn(async move {
            if let Err(err) = call.await {
                error!("{operation} failed: {err:#}");
                let _ = events.send(TimerEvent::CollaboratorUnavailable {
                    operation,
                    message: format!("{err:#}"),
                });
            }
        });
    }

    fn report_unavailable(&self, operation: &'static str, err: &anyhow::Error) {
        error!("{operation} failed: {err:#}");
        let _ = self.events.send(TimerEvent::CollaboratorUnavailable {
            operation,
            message: format!("{err:#}"),
        });
    }

    async fn emit_state_changed(&self) {
        let snapshot = self.snapshot().await;
        let _ = self.events.send(TimerEvent::StateChanged(snapshot));
    }
}
