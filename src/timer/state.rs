use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use super::collaborators::ActiveSessionRecord;
use super::error::TimerError;

/// Identifier of a task owned by the task list. The timer only carries it.
pub type TaskRef = i64;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    #[default]
    Work,
    Break,
    LongBreak,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Work => "work",
            SessionType::Break => "break",
            SessionType::LongBreak => "long_break",
        }
    }

    /// Type suggested once a session of this type completes.
    pub fn next(&self) -> SessionType {
        match self {
            SessionType::Work => SessionType::Break,
            SessionType::Break | SessionType::LongBreak => SessionType::Work,
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "work" | "focus" => Ok(SessionType::Work),
            "break" | "short_break" => Ok(SessionType::Break),
            "long" | "long_break" | "longbreak" => Ok(SessionType::LongBreak),
            other => Err(format!("unknown session type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Completed,
}

impl fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TimerStatus::Idle => "idle",
            TimerStatus::Running => "running",
            TimerStatus::Paused => "paused",
            TimerStatus::Completed => "completed",
        };
        f.write_str(label)
    }
}

/// Default planned duration per session type, in seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionDurations {
    pub work_secs: u64,
    pub break_secs: u64,
    pub long_break_secs: u64,
}

impl Default for SessionDurations {
    fn default() -> Self {
        Self {
            work_secs: 25 * 60,
            break_secs: 5 * 60,
            long_break_secs: 15 * 60,
        }
    }
}

impl SessionDurations {
    pub fn for_type(&self, session_type: SessionType) -> u64 {
        match session_type {
            SessionType::Work => self.work_secs,
            SessionType::Break => self.break_secs,
            SessionType::LongBreak => self.long_break_secs,
        }
    }
}

/// Countdown value derived from wall-clock deltas.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct RemainingTime {
    millis: u64,
}

impl RemainingTime {
    pub fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self {
            millis: secs.saturating_mul(1000),
        }
    }

    pub fn as_millis(&self) -> u64 {
        self.millis
    }

    /// Whole seconds, rounded up so a fresh session reads its full duration
    /// and zero is only shown once the countdown has actually elapsed.
    pub fn as_secs(&self) -> u64 {
        self.millis.div_ceil(1000)
    }

    pub fn is_zero(&self) -> bool {
        self.millis == 0
    }
}

impl fmt::Display for RemainingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.as_secs();
        write!(f, "{:02}:{:02}", secs / 60, secs % 60)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Local identifier, stable for the life of the session.
    pub id: String,
    /// Identifier handed back by the session store, once recorded.
    pub remote_id: Option<String>,
    pub session_type: SessionType,
    pub planned_secs: u64,
    pub started_at: DateTime<Utc>,
    pub paused_accumulated_ms: u64,
    pub task_ref: Option<TaskRef>,
    pub status: TimerStatus,
}

impl Session {
    pub fn paused_accumulated_secs(&self) -> u64 {
        self.paused_accumulated_ms / 1000
    }

    fn planned_ms(&self) -> u64 {
        self.planned_secs.saturating_mul(1000)
    }

    /// `max(0, planned - (now - started_at) + paused)`, with negative wall-clock
    /// elapsed treated as zero so the result never exceeds `planned`.
    fn remaining_at(&self, now: DateTime<Utc>) -> RemainingTime {
        let wall_ms = (now - self.started_at).num_milliseconds();
        let wall_ms = if wall_ms < 0 {
            debug!(
                "clock reads {}ms before start of session {}; clamping elapsed to zero",
                -wall_ms, self.id
            );
            0
        } else {
            wall_ms as u64
        };
        let active_ms = wall_ms.saturating_sub(self.paused_accumulated_ms);
        RemainingTime::from_millis(self.planned_ms().saturating_sub(active_ms))
    }
}

/// Countdown state machine for one focus or break session at a time.
///
/// Remaining time is never stored; it is derived from `started_at`, the
/// accumulated pause time and the instant passed in by the caller, so a
/// missed or late tick cannot make the countdown drift.
#[derive(Debug, Clone, Default)]
pub struct SessionTimer {
    durations: SessionDurations,
    session_type: SessionType,
    selected_task: Option<TaskRef>,
    session: Option<Session>,
    /// Instant the current pause began. Not part of the persisted session.
    paused_at: Option<DateTime<Utc>>,
}

impl SessionTimer {
    pub fn new(durations: SessionDurations) -> Self {
        Self {
            durations,
            ..Self::default()
        }
    }

    pub fn status(&self) -> TimerStatus {
        self.session
            .as_ref()
            .map(|session| session.status)
            .unwrap_or(TimerStatus::Idle)
    }

    /// True while a session is running or paused.
    pub fn is_active(&self) -> bool {
        matches!(self.status(), TimerStatus::Running | TimerStatus::Paused)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Type of the current session, or of the next one while idle.
    pub fn session_type(&self) -> SessionType {
        self.session_type
    }

    pub fn selected_task(&self) -> Option<TaskRef> {
        self.selected_task
    }

    pub fn durations(&self) -> SessionDurations {
        self.durations
    }

    pub fn set_durations(&mut self, durations: SessionDurations) {
        self.durations = durations;
    }

    pub fn start(
        &mut self,
        session_type: SessionType,
        planned_secs: u64,
        task_ref: Option<TaskRef>,
        now: DateTime<Utc>,
    ) -> Result<&Session, TimerError> {
        self.ensure_inactive("start")?;
        if planned_secs == 0 {
            return Err(TimerError::ZeroDuration);
        }

        let task_ref = task_ref.or(self.selected_task.take());
        self.session_type = session_type;
        self.paused_at = None;
        Ok(&*self.session.insert(Session {
            id: Uuid::new_v4().to_string(),
            remote_id: None,
            session_type,
            planned_secs,
            started_at: now,
            paused_accumulated_ms: 0,
            task_ref,
            status: TimerStatus::Running,
        }))
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<(), TimerError> {
        let status = self.status();
        match self.session.as_mut() {
            Some(session) if session.status == TimerStatus::Running => {
                session.status = TimerStatus::Paused;
                self.paused_at = Some(now);
                Ok(())
            }
            _ => Err(TimerError::InvalidTransition {
                operation: "pause",
                status,
            }),
        }
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<(), TimerError> {
        let status = self.status();
        match self.session.as_mut() {
            Some(session) if session.status == TimerStatus::Paused => {
                let paused_at = self.paused_at.take().unwrap_or(now);
                let paused_ms = (now - paused_at).num_milliseconds().max(0) as u64;
                session.paused_accumulated_ms =
                    session.paused_accumulated_ms.saturating_add(paused_ms);
                session.status = TimerStatus::Running;
                Ok(())
            }
            _ => Err(TimerError::InvalidTransition {
                operation: "resume",
                status,
            }),
        }
    }

    /// Discards the current session, if any, and returns it. The idle display
    /// falls back to the default duration of the current session type.
    pub fn reset(&mut self) -> Option<Session> {
        self.paused_at = None;
        self.session.take()
    }

    pub fn tick(&self, now: DateTime<Utc>) -> RemainingTime {
        match self.session.as_ref() {
            None => RemainingTime::from_secs(self.durations.for_type(self.session_type)),
            Some(session) => match session.status {
                TimerStatus::Running => session.remaining_at(now),
                TimerStatus::Paused => session.remaining_at(self.paused_at.unwrap_or(now)),
                TimerStatus::Completed | TimerStatus::Idle => RemainingTime::from_millis(0),
            },
        }
    }

    /// Returns true exactly once per session: the first call that observes a
    /// running session with nothing left. The session is moved to `Completed`,
    /// so later calls return false until a new session starts.
    pub fn check_completion(&mut self, now: DateTime<Utc>) -> bool {
        match self.session.as_mut() {
            Some(session)
                if session.status == TimerStatus::Running
                    && session.remaining_at(now).is_zero() =>
            {
                session.status = TimerStatus::Completed;
                true
            }
            _ => false,
        }
    }

    /// Acknowledges a completed session: discards it and pre-loads the next
    /// session type without starting it.
    pub fn take_completed(&mut self) -> Option<Session> {
        if self.status() != TimerStatus::Completed {
            return None;
        }
        let session = self.session.take()?;
        self.session_type = session.session_type.next();
        self.selected_task = None;
        Some(session)
    }

    /// Rebuilds a running session from persisted metadata. Pause history is
    /// not persisted, so accounting restarts from zero.
    pub fn reattach(
        &mut self,
        record: ActiveSessionRecord,
        _now: DateTime<Utc>,
    ) -> Result<&Session, TimerError> {
        self.ensure_inactive("reattach")?;
        if record.duration_secs == 0 {
            return Err(TimerError::ZeroDuration);
        }

        self.session_type = record.session_type;
        self.selected_task = None;
        self.paused_at = None;
        Ok(&*self.session.insert(Session {
            id: Uuid::new_v4().to_string(),
            remote_id: Some(record.session_id),
            session_type: record.session_type,
            planned_secs: record.duration_secs,
            started_at: record.started_at,
            paused_accumulated_ms: 0,
            task_ref: record.task_ref,
            status: TimerStatus::Running,
        }))
    }

    /// Records the store-assigned id, provided `local_id` is still the
    /// current session and has not finished.
    pub fn attach_remote_id(&mut self, local_id: &str, remote_id: String) -> bool {
        match self.session.as_mut() {
            Some(session)
                if session.id == local_id && session.status != TimerStatus::Completed =>
            {
                session.remote_id = Some(remote_id);
                true
            }
            _ => false,
        }
    }

    pub fn select_task(&mut self, task_ref: Option<TaskRef>) -> Result<(), TimerError> {
        self.ensure_inactive("select a task")?;
        self.selected_task = task_ref;
        Ok(())
    }

    pub fn switch_session_type(&mut self, session_type: SessionType) -> Result<(), TimerError> {
        self.ensure_inactive("switch session type")?;
        if self.status() == TimerStatus::Completed {
            self.session = None;
        }
        self.session_type = session_type;
        self.selected_task = None;
        Ok(())
    }

    fn ensure_inactive(&self, operation: &'static str) -> Result<(), TimerError> {
        if self.is_active() {
            return Err(TimerError::InvalidTransition {
                operation,
                status: self.status(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        t0() + Duration::seconds(secs)
    }

    fn at_ms(ms: i64) -> DateTime<Utc> {
        t0() + Duration::milliseconds(ms)
    }

    #[test]
    fn fresh_session_reports_full_duration() {
        for planned in [1, 59, 300, 1500, 86_400] {
            let mut timer = SessionTimer::default();
            timer.start(SessionType::Work, planned, None, at(0)).unwrap();
            assert_eq!(timer.tick(at(0)).as_secs(), planned);
            assert_eq!(timer.tick(at(0)).as_millis(), planned * 1000);
        }
    }

    #[test]
    fn pause_resume_scenario() {
        let mut timer = SessionTimer::default();
        timer.start(SessionType::Work, 1500, None, at(0)).unwrap();
        assert_eq!(timer.tick(at(900)).as_secs(), 600);

        timer.pause(at(900)).unwrap();
        assert_eq!(timer.status(), TimerStatus::Paused);
        assert_eq!(timer.tick(at(1500)).as_secs(), 600);

        timer.resume(at(1500)).unwrap();
        assert_eq!(timer.session().unwrap().paused_accumulated_secs(), 600);
        assert_eq!(timer.tick(at(1800)).as_secs(), 300);
    }

    #[test]
    fn paused_time_accumulates_across_pauses() {
        let mut timer = SessionTimer::default();
        timer.start(SessionType::Work, 1000, None, at(0)).unwrap();

        let mut last_paused = 0;
        let mut now = 0;
        for pause_len in [5, 0, 120, 30] {
            now += 10;
            let before = timer.tick(at(now));
            timer.pause(at(now)).unwrap();
            now += pause_len;
            assert_eq!(timer.tick(at(now)), before);
            timer.resume(at(now)).unwrap();
            assert_eq!(timer.tick(at(now)), before);

            let paused = timer.session().unwrap().paused_accumulated_ms;
            assert!(paused >= last_paused);
            last_paused = paused;
        }
        assert_eq!(last_paused, 155_000);
        assert_eq!(timer.tick(at(now)).as_secs(), 1000 - 40);
    }

    #[test]
    fn break_completes_exactly_once() {
        let mut timer = SessionTimer::default();
        timer.start(SessionType::Break, 300, None, at(0)).unwrap();
        assert!(timer.tick(at(300)).is_zero());
        assert!(timer.check_completion(at(300)));
        assert_eq!(timer.status(), TimerStatus::Completed);
        assert!(!timer.check_completion(at(301)));
        assert!(timer.tick(at(301)).is_zero());
    }

    fn completions_at_cadence(step_ms: i64) -> (usize, i64) {
        let mut timer = SessionTimer::default();
        timer.start(SessionType::Break, 60, None, at(0)).unwrap();
        let mut fired = 0;
        let mut first_fire = -1;
        let mut now = 0;
        while now <= 120_000 {
            if timer.check_completion(at_ms(now)) {
                fired += 1;
                if first_fire < 0 {
                    first_fire = now;
                }
            }
            now += step_ms;
        }
        (fired, first_fire)
    }

    #[test]
    fn completion_fires_once_regardless_of_cadence() {
        let (fired, first) = completions_at_cadence(1);
        assert_eq!(fired, 1);
        assert_eq!(first, 60_000);

        let (fired, first) = completions_at_cadence(10_000);
        assert_eq!(fired, 1);
        assert_eq!(first, 60_000);

        let (fired, first) = completions_at_cadence(7_000);
        assert_eq!(fired, 1);
        assert!(first >= 60_000 && first < 67_000);
    }

    #[test]
    fn start_while_running_is_rejected() {
        let mut timer = SessionTimer::default();
        let original = timer
            .start(SessionType::Work, 1500, Some(4), at(0))
            .unwrap()
            .clone();

        let err = timer
            .start(SessionType::Break, 300, None, at(10))
            .unwrap_err();
        assert!(matches!(
            err,
            TimerError::InvalidTransition {
                operation: "start",
                status: TimerStatus::Running
            }
        ));
        assert_eq!(timer.session(), Some(&original));
        assert_eq!(timer.tick(at(10)).as_secs(), 1490);
    }

    #[test]
    fn start_while_paused_is_rejected() {
        let mut timer = SessionTimer::default();
        timer.start(SessionType::Work, 1500, None, at(0)).unwrap();
        timer.pause(at(5)).unwrap();
        assert!(timer.start(SessionType::Work, 1500, None, at(6)).is_err());
        assert_eq!(timer.status(), TimerStatus::Paused);
    }

    #[test]
    fn zero_duration_is_rejected() {
        let mut timer = SessionTimer::default();
        assert!(matches!(
            timer.start(SessionType::Work, 0, None, at(0)),
            Err(TimerError::ZeroDuration)
        ));
        assert_eq!(timer.status(), TimerStatus::Idle);
    }

    #[test]
    fn invalid_pause_and_resume_are_rejected() {
        let mut timer = SessionTimer::default();
        assert!(matches!(
            timer.pause(at(0)),
            Err(TimerError::InvalidTransition { operation: "pause", status: TimerStatus::Idle })
        ));
        assert!(timer.resume(at(0)).is_err());

        timer.start(SessionType::Work, 100, None, at(0)).unwrap();
        assert!(matches!(
            timer.resume(at(1)),
            Err(TimerError::InvalidTransition { operation: "resume", status: TimerStatus::Running })
        ));
        timer.pause(at(2)).unwrap();
        assert!(timer.pause(at(3)).is_err());
    }

    #[test]
    fn reset_returns_to_idle_from_every_state() {
        let durations = SessionDurations::default();

        let mut idle = SessionTimer::new(durations);
        assert!(idle.reset().is_none());
        assert_eq!(idle.tick(at(0)).as_secs(), 1500);

        let mut running = SessionTimer::new(durations);
        running.start(SessionType::Break, 120, None, at(0)).unwrap();
        assert!(running.reset().is_some());
        assert_eq!(running.status(), TimerStatus::Idle);
        assert_eq!(running.tick(at(10)).as_secs(), 300);
        assert!(!running.check_completion(at(500)));

        let mut paused = SessionTimer::new(durations);
        paused.start(SessionType::Work, 60, None, at(0)).unwrap();
        paused.pause(at(30)).unwrap();
        paused.reset();
        assert_eq!(paused.tick(at(30)).as_secs(), 1500);
        assert!(!paused.check_completion(at(1000)));
        assert!(paused.resume(at(40)).is_err());

        let mut completed = SessionTimer::new(durations);
        completed.start(SessionType::Work, 10, None, at(0)).unwrap();
        assert!(completed.check_completion(at(10)));
        completed.reset();
        assert_eq!(completed.status(), TimerStatus::Idle);
        assert_eq!(completed.tick(at(20)).as_secs(), 1500);
    }

    #[test]
    fn take_completed_advances_to_opposite_type() {
        let mut timer = SessionTimer::default();
        timer.start(SessionType::Work, 10, Some(7), at(0)).unwrap();
        assert!(timer.take_completed().is_none());

        assert!(timer.check_completion(at(10)));
        let done = timer.take_completed().unwrap();
        assert_eq!(done.session_type, SessionType::Work);
        assert_eq!(done.task_ref, Some(7));
        assert_eq!(timer.status(), TimerStatus::Idle);
        assert_eq!(timer.session_type(), SessionType::Break);
        assert_eq!(timer.tick(at(11)).as_secs(), 300);

        timer.start(SessionType::LongBreak, 5, None, at(20)).unwrap();
        assert!(timer.check_completion(at(25)));
        timer.take_completed();
        assert_eq!(timer.session_type(), SessionType::Work);
    }

    #[test]
    fn clock_before_start_clamps_to_planned() {
        let mut timer = SessionTimer::default();
        timer.start(SessionType::Work, 1500, None, at(100)).unwrap();
        assert_eq!(timer.tick(at(40)).as_secs(), 1500);
        assert!(!timer.check_completion(at(40)));

        timer.pause(at(200)).unwrap();
        timer.resume(at(150)).unwrap();
        assert_eq!(timer.session().unwrap().paused_accumulated_ms, 0);
        assert_eq!(timer.tick(at(200)).as_secs(), 1400);
    }

    #[test]
    fn task_is_fixed_once_session_starts() {
        let mut timer = SessionTimer::default();
        timer.select_task(Some(3)).unwrap();
        timer.start(SessionType::Work, 60, None, at(0)).unwrap();
        assert_eq!(timer.session().unwrap().task_ref, Some(3));
        assert!(timer.select_task(Some(9)).is_err());
        assert_eq!(timer.session().unwrap().task_ref, Some(3));

        timer.pause(at(1)).unwrap();
        assert!(timer.select_task(None).is_err());
    }

    #[test]
    fn explicit_task_overrides_selection() {
        let mut timer = SessionTimer::default();
        timer.select_task(Some(3)).unwrap();
        let session = timer.start(SessionType::Work, 60, Some(5), at(0)).unwrap();
        assert_eq!(session.task_ref, Some(5));
    }

    #[test]
    fn switch_session_type_only_while_inactive() {
        let mut timer = SessionTimer::default();
        timer.select_task(Some(1)).unwrap();
        timer.switch_session_type(SessionType::LongBreak).unwrap();
        assert_eq!(timer.selected_task(), None);
        assert_eq!(timer.tick(at(0)).as_secs(), 900);

        timer.start(SessionType::LongBreak, 900, None, at(0)).unwrap();
        assert!(timer.switch_session_type(SessionType::Work).is_err());
        assert_eq!(timer.session_type(), SessionType::LongBreak);
    }

    #[test]
    fn reattach_rebuilds_running_session() {
        let mut timer = SessionTimer::default();
        let record = ActiveSessionRecord {
            session_id: "remote-1".into(),
            session_type: SessionType::Work,
            duration_secs: 1500,
            started_at: at(0),
            task_ref: Some(2),
        };
        let session = timer.reattach(record.clone(), at(600)).unwrap();
        assert_eq!(session.remote_id.as_deref(), Some("remote-1"));
        assert_eq!(session.task_ref, Some(2));
        assert_eq!(timer.tick(at(600)).as_secs(), 900);
        assert!(timer.reattach(record, at(601)).is_err());
    }

    #[test]
    fn reattach_after_deadline_completes_once() {
        let mut timer = SessionTimer::default();
        let record = ActiveSessionRecord {
            session_id: "remote-2".into(),
            session_type: SessionType::Break,
            duration_secs: 300,
            started_at: at(0),
            task_ref: None,
        };
        timer.reattach(record, at(4000)).unwrap();
        assert!(timer.tick(at(4000)).is_zero());
        assert!(timer.check_completion(at(4000)));
        assert!(!timer.check_completion(at(4001)));
    }

    #[test]
    fn remote_id_only_attaches_to_current_session() {
        let mut timer = SessionTimer::default();
        let local_id = timer
            .start(SessionType::Work, 60, None, at(0))
            .unwrap()
            .id
            .clone();
        assert!(!timer.attach_remote_id("stale", "r-0".into()));
        assert!(timer.attach_remote_id(&local_id, "r-1".into()));
        assert_eq!(timer.session().unwrap().remote_id.as_deref(), Some("r-1"));
    }

    #[test]
    fn remote_id_does_not_attach_to_finished_session() {
        let mut timer = SessionTimer::default();
        let local_id = timer
            .start(SessionType::Break, 60, None, at(0))
            .unwrap()
            .id
            .clone();
        assert!(timer.check_completion(at(60)));
        assert!(!timer.attach_remote_id(&local_id, "r-1".into()));
        assert_eq!(timer.session().unwrap().remote_id, None);

        timer.take_completed();
        assert!(!timer.attach_remote_id(&local_id, "r-1".into()));
    }

    #[test]
    fn defaults_are_idle_work() {
        assert_eq!(SessionType::default(), SessionType::Work);
        assert_eq!(TimerStatus::default(), TimerStatus::Idle);
    }

    #[test]
    fn remaining_time_formats_as_clock() {
        assert_eq!(RemainingTime::from_secs(1500).to_string(), "25:00");
        assert_eq!(RemainingTime::from_millis(61_001).to_string(), "01:02");
        assert_eq!(RemainingTime::from_millis(0).to_string(), "00:00");
    }

    #[test]
    fn session_type_parses_aliases() {
        assert_eq!("Work".parse::<SessionType>(), Ok(SessionType::Work));
        assert_eq!("long".parse::<SessionType>(), Ok(SessionType::LongBreak));
        assert!("nap".parse::<SessionType>().is_err());
    }
}
