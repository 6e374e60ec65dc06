use crate::{
    db::SessionRecord,
    settings::TimerSettings,
    timer::{PendingTask, SessionType, TaskRef, TimerController, TimerSnapshot},
    AppState,
};

fn controller_from_state(state: &AppState) -> TimerController {
    state.timer.clone()
}

pub async fn get_timer_state(state: &AppState) -> TimerSnapshot {
    controller_from_state(state).snapshot().await
}

pub async fn start_timer(
    state: &AppState,
    session_type: Option<SessionType>,
    minutes: Option<u64>,
) -> Result<TimerSnapshot, String> {
    let controller = controller_from_state(state);
    controller
        .start_session(session_type, minutes.map(|m| m.saturating_mul(60)), None)
        .await
        .map_err(|e| e.to_string())
}

pub async fn pause_timer(state: &AppState) -> Result<TimerSnapshot, String> {
    let controller = controller_from_state(state);
    controller.pause().await.map_err(|e| e.to_string())
}

pub async fn resume_timer(state: &AppState) -> Result<TimerSnapshot, String> {
    let controller = controller_from_state(state);
    controller.resume().await.map_err(|e| e.to_string())
}

pub async fn toggle_timer(state: &AppState) -> Result<TimerSnapshot, String> {
    let controller = controller_from_state(state);
    controller.toggle().await.map_err(|e| e.to_string())
}

pub async fn reset_timer(state: &AppState) -> TimerSnapshot {
    controller_from_state(state).reset().await
}

pub async fn switch_session_type(
    state: &AppState,
    session_type: SessionType,
) -> Result<TimerSnapshot, String> {
    let controller = controller_from_state(state);
    controller
        .switch_session_type(session_type)
        .await
        .map_err(|e| e.to_string())
}

pub async fn select_task(
    state: &AppState,
    task_id: Option<TaskRef>,
) -> Result<TimerSnapshot, String> {
    let controller = controller_from_state(state);
    controller
        .select_task(task_id)
        .await
        .map_err(|e| e.to_string())
}

pub async fn list_pending_tasks(state: &AppState) -> Result<Vec<PendingTask>, String> {
    let controller = controller_from_state(state);
    controller.pending_tasks().await.map_err(|e| e.to_string())
}

pub async fn list_sessions(state: &AppState, limit: usize) -> Result<Vec<SessionRecord>, String> {
    let db = &state.db;
    db.list_sessions(limit).await.map_err(|e| e.to_string())
}

/// Persists the sound preference and applies it to the next completion.
pub async fn set_sound_enabled(state: &AppState, enabled: bool) -> Result<TimerSettings, String> {
    let mut settings = state.settings.timer();
    settings.sound_enabled = enabled;
    state
        .settings
        .update_timer(settings.clone())
        .map_err(|e| e.to_string())?;
    controller_from_state(state).set_sound_enabled(enabled);
    Ok(settings)
}

/// Changes the default duration of one session type and applies it to the
/// idle display right away.
pub async fn set_default_duration(
    state: &AppState,
    session_type: SessionType,
    minutes: u64,
) -> Result<TimerSettings, String> {
    let mut settings = state.settings.timer();
    let secs = minutes.saturating_mul(60);
    match session_type {
        SessionType::Work => settings.work_secs = secs,
        SessionType::Break => settings.break_secs = secs,
        SessionType::LongBreak => settings.long_break_secs = secs,
    }

    state
        .settings
        .update_timer(settings.clone())
        .map_err(|e| e.to_string())?;
    controller_from_state(state)
        .set_durations(settings.durations())
        .await;
    Ok(settings)
}
