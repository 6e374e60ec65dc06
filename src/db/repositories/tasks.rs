use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::parse_datetime,
    models::Task,
};
use crate::timer::{PendingTask, TaskProvider};

fn row_to_task(row: &Row) -> Result<Task> {
    let created_at: String = row.get("created_at")?;

    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        completed: row.get("completed")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

fn fetch_task(conn: &Connection, task_id: i64) -> Result<Option<Task>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, completed, created_at
         FROM tasks
         WHERE id = ?1",
    )?;
    let task = stmt
        .query_row(params![task_id], |row| Ok(row_to_task(row)))
        .optional()?
        .transpose()?;
    Ok(task)
}

fn normalize_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        bail!("task title must not be empty");
    }
    Ok(trimmed.to_string())
}

impl Database {
    pub async fn create_task(&self, title: &str) -> Result<Task> {
        let title = normalize_title(title)?;
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO tasks (title, completed, created_at) VALUES (?1, 0, ?2)",
                params![title, Utc::now().to_rfc3339()],
            )?;

            let task_id = conn.last_insert_rowid();
            fetch_task(conn, task_id)?.ok_or_else(|| anyhow!("Task not found after insert"))
        })
        .await
    }

    /// All tasks, newest first.
    pub async fn list_tasks(&self) -> Result<Vec<Task>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, completed, created_at
                 FROM tasks
                 ORDER BY created_at DESC, id DESC",
            )?;

            let mut rows = stmt.query([])?;
            let mut tasks = Vec::new();
            while let Some(row) = rows.next()? {
                tasks.push(row_to_task(row)?);
            }

            Ok(tasks)
        })
        .await
    }

    pub async fn get_task(&self, task_id: i64) -> Result<Option<Task>> {
        self.execute(move |conn| fetch_task(conn, task_id)).await
    }

    /// Updates the title and/or completion flag; absent fields keep their value.
    pub async fn update_task(
        &self,
        task_id: i64,
        title: Option<String>,
        completed: Option<bool>,
    ) -> Result<Task> {
        let title = title.as_deref().map(normalize_title).transpose()?;
        self.execute(move |conn| {
            let current =
                fetch_task(conn, task_id)?.ok_or_else(|| anyhow!("Task {task_id} not found"))?;

            conn.execute(
                "UPDATE tasks SET title = ?1, completed = ?2 WHERE id = ?3",
                params![
                    title.unwrap_or(current.title),
                    completed.unwrap_or(current.completed),
                    task_id
                ],
            )?;

            fetch_task(conn, task_id)?.ok_or_else(|| anyhow!("Task {task_id} not found after update"))
        })
        .await
    }

    /// Deletes a task. Its sessions stay in the history, detached from it.
    pub async fn delete_task(&self, task_id: i64) -> Result<()> {
        self.execute(move |conn| {
            let rows_affected = conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;
            if rows_affected == 0 {
                bail!("Task {task_id} not found");
            }
            Ok(())
        })
        .await
    }

    pub async fn pending_tasks(&self) -> Result<Vec<PendingTask>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title
                 FROM tasks
                 WHERE completed = 0
                 ORDER BY created_at DESC, id DESC",
            )?;

            let mut rows = stmt.query([])?;
            let mut tasks = Vec::new();
            while let Some(row) = rows.next()? {
                tasks.push(PendingTask {
                    id: row.get(0)?,
                    title: row.get(1)?,
                });
            }

            Ok(tasks)
        })
        .await
    }
}

#[async_trait]
impl TaskProvider for Database {
    async fn list_pending_tasks(&self) -> Result<Vec<PendingTask>> {
        self.pending_tasks().await
    }
}
