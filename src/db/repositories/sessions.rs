use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use uuid::Uuid;

use crate::db::{
    connection::Database,
    helpers::{parse_datetime, parse_optional_datetime, parse_session_type, parse_status, to_i64, to_u64},
    models::{SessionRecord, SessionStatus},
};
use crate::timer::{ActiveSessionRecord, SessionStore, SessionType};

const SESSION_COLUMNS: &str = "s.id, s.task_id, t.title AS task_title, s.session_type, \
     s.duration_secs, s.status, s.started_at, s.completed_at";

fn row_to_session(row: &Row) -> Result<SessionRecord> {
    let session_type: String = row.get("session_type")?;
    let duration_secs: i64 = row.get("duration_secs")?;
    let status: String = row.get("status")?;
    let started_at: String = row.get("started_at")?;
    let completed_at: Option<String> = row.get("completed_at")?;

    Ok(SessionRecord {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        task_title: row.get("task_title")?,
        session_type: parse_session_type(&session_type)?,
        duration_secs: to_u64(duration_secs, "duration_secs")?,
        status: parse_status(&status)?,
        started_at: parse_datetime(&started_at, "started_at")?,
        completed_at: parse_optional_datetime(completed_at, "completed_at")?,
    })
}

impl Database {
    /// Inserts a running session. Any session still marked running is
    /// cancelled first so at most one row is ever active.
    pub async fn insert_session(
        &self,
        session_type: SessionType,
        duration_secs: u64,
        task_id: Option<i64>,
        started_at: DateTime<Utc>,
    ) -> Result<String> {
        self.execute(move |conn| {
            let session_id = Uuid::new_v4().to_string();
            let tx = conn.transaction()?;

            tx.execute(
                "UPDATE sessions SET status = ?1 WHERE status = ?2",
                params![
                    SessionStatus::Cancelled.as_str(),
                    SessionStatus::Running.as_str()
                ],
            )?;
            tx.execute(
                "INSERT INTO sessions (id, task_id, session_type, duration_secs, status, started_at, completed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL)",
                params![
                    session_id,
                    task_id,
                    session_type.as_str(),
                    to_i64(duration_secs)?,
                    SessionStatus::Running.as_str(),
                    started_at.to_rfc3339(),
                ],
            )?;

            tx.commit()?;
            Ok(session_id)
        })
        .await
    }

    pub async fn mark_session_status(
        &self,
        session_id: &str,
        status: SessionStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "UPDATE sessions
                 SET status = ?1,
                     completed_at = ?2
                 WHERE id = ?3",
                params![
                    status.as_str(),
                    completed_at.map(|dt| dt.to_rfc3339()),
                    session_id,
                ],
            )?;

            if rows_affected == 0 {
                bail!("Session {session_id} not found");
            }
            Ok(())
        })
        .await
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS}
                 FROM sessions s
                 LEFT JOIN tasks t ON s.task_id = t.id
                 WHERE s.id = ?1"
            ))?;

            let mut rows = stmt.query(params![session_id])?;
            let session = match rows.next()? {
                Some(row) => Some(row_to_session(row)?),
                None => None,
            };
            Ok(session)
        })
        .await
    }

    /// Most recently started session still marked running.
    pub async fn get_active_session(&self) -> Result<Option<SessionRecord>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS}
                 FROM sessions s
                 LEFT JOIN tasks t ON s.task_id = t.id
                 WHERE s.status = 'Running'
                 ORDER BY s.started_at DESC
                 LIMIT 1"
            ))?;

            let mut rows = stmt.query([])?;
            let session = match rows.next()? {
                Some(row) => Some(row_to_session(row)?),
                None => None,
            };
            Ok(session)
        })
        .await
    }

    /// Session history, newest first.
    pub async fn list_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS}
                 FROM sessions s
                 LEFT JOIN tasks t ON s.task_id = t.id
                 ORDER BY s.started_at DESC
                 LIMIT ?1"
            ))?;

            let mut rows = stmt.query(params![limit])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_session(row)?);
            }

            Ok(sessions)
        })
        .await
    }
}

#[async_trait]
impl SessionStore for Database {
    async fn record_session_start(
        &self,
        session_type: SessionType,
        duration_secs: u64,
        task_ref: Option<i64>,
    ) -> Result<String> {
        self.insert_session(session_type, duration_secs, task_ref, Utc::now())
            .await
    }

    async fn record_session_complete(&self, session_id: &str) -> Result<()> {
        self.mark_session_status(session_id, SessionStatus::Completed, Some(Utc::now()))
            .await
    }

    async fn record_session_cancelled(&self, session_id: &str) -> Result<()> {
        self.mark_session_status(session_id, SessionStatus::Cancelled, None)
            .await
    }

    async fn fetch_active_session(&self) -> Result<Option<ActiveSessionRecord>> {
        Ok(self
            .get_active_session()
            .await?
            .map(|session| ActiveSessionRecord {
                session_id: session.id,
                session_type: session.session_type,
                duration_secs: session.duration_secs,
                started_at: session.started_at,
                task_ref: session.task_id,
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::test_support::temp_database;

    #[tokio::test]
    async fn start_and_complete_round_trip() {
        let (_dir, db) = temp_database();
        let task = db.create_task("write report").await.unwrap();

        let id = db
            .record_session_start(SessionType::Work, 1500, Some(task.id))
            .await
            .unwrap();

        let active = db.fetch_active_session().await.unwrap().unwrap();
        assert_eq!(active.session_id, id);
        assert_eq!(active.session_type, SessionType::Work);
        assert_eq!(active.duration_secs, 1500);
        assert_eq!(active.task_ref, Some(task.id));

        db.record_session_complete(&id).await.unwrap();
        assert!(db.fetch_active_session().await.unwrap().is_none());

        let stored = db.get_session(&id).await.unwrap().unwrap();
        assert_eq!(stored.status, SessionStatus::Completed);
        assert!(stored.completed_at.is_some());
        assert_eq!(stored.task_title.as_deref(), Some("write report"));
    }

    #[tokio::test]
    async fn new_session_supersedes_stale_running_row() {
        let (_dir, db) = temp_database();
        let stale = db
            .record_session_start(SessionType::Work, 1500, None)
            .await
            .unwrap();
        let fresh = db
            .record_session_start(SessionType::Break, 300, None)
            .await
            .unwrap();

        let active = db.fetch_active_session().await.unwrap().unwrap();
        assert_eq!(active.session_id, fresh);
        let stale = db.get_session(&stale).await.unwrap().unwrap();
        assert_eq!(stale.status, SessionStatus::Cancelled);
    }

    #[tokio::test]
    async fn cancelled_session_is_not_reattached() {
        let (_dir, db) = temp_database();
        let id = db
            .record_session_start(SessionType::Break, 300, None)
            .await
            .unwrap();
        db.record_session_cancelled(&id).await.unwrap();
        assert!(db.fetch_active_session().await.unwrap().is_none());
        assert!(db.record_session_complete("missing").await.is_err());
    }

    #[tokio::test]
    async fn deleting_task_keeps_session_history() {
        let (_dir, db) = temp_database();
        let task = db.create_task("short lived").await.unwrap();
        let id = db
            .record_session_start(SessionType::Work, 60, Some(task.id))
            .await
            .unwrap();
        db.delete_task(task.id).await.unwrap();

        let sessions = db.list_sessions(10).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, id);
        assert_eq!(sessions[0].task_id, None);
        assert_eq!(sessions[0].task_title, None);
    }

    #[tokio::test]
    async fn oversized_limit_returns_everything() {
        let (_dir, db) = temp_database();
        for _ in 0..3 {
            let id = db
                .record_session_start(SessionType::Work, 60, None)
                .await
                .unwrap();
            db.record_session_complete(&id).await.unwrap();
        }

        assert_eq!(db.list_sessions(usize::MAX).await.unwrap().len(), 3);
        assert_eq!(db.list_sessions(2).await.unwrap().len(), 2);
    }
}
