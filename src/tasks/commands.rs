use crate::{
    db::{Stats, Task},
    AppState,
};

pub async fn create_task(state: &AppState, title: &str) -> Result<Task, String> {
    let db = &state.db;
    db.create_task(title).await.map_err(|e| e.to_string())
}

pub async fn list_tasks(state: &AppState) -> Result<Vec<Task>, String> {
    let db = &state.db;
    db.list_tasks().await.map_err(|e| e.to_string())
}

pub async fn set_task_completed(
    state: &AppState,
    task_id: i64,
    completed: bool,
) -> Result<Task, String> {
    let db = &state.db;
    db.update_task(task_id, None, Some(completed))
        .await
        .map_err(|e| e.to_string())
}

pub async fn rename_task(state: &AppState, task_id: i64, title: String) -> Result<Task, String> {
    let db = &state.db;
    db.update_task(task_id, Some(title), None)
        .await
        .map_err(|e| e.to_string())
}

pub async fn delete_task(state: &AppState, task_id: i64) -> Result<(), String> {
    let db = &state.db;
    db.delete_task(task_id).await.map_err(|e| e.to_string())
}

pub async fn get_stats(state: &AppState) -> Result<Stats, String> {
    let db = &state.db;
    db.get_stats().await.map_err(|e| e.to_string())
}
