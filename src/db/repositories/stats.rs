use anyhow::Result;
use rusqlite::{params, Connection};

use crate::db::{
    connection::Database,
    helpers::to_u64,
    models::{SessionStats, SessionStatus, Stats, TaskStats},
};
use crate::timer::SessionType;

fn count(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<u64> {
    let value: i64 = conn.query_row(sql, params, |row| row.get(0))?;
    to_u64(value, "count")
}

fn completed_of_type(conn: &Connection, session_type: SessionType) -> Result<u64> {
    count(
        conn,
        "SELECT COUNT(*) FROM sessions WHERE session_type = ?1 AND status = ?2",
        params![session_type.as_str(), SessionStatus::Completed.as_str()],
    )
}

fn completion_rate(completed: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let rate = completed as f64 / total as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}

impl Database {
    pub async fn get_stats(&self) -> Result<Stats> {
        self.execute(|conn| {
            let total = count(conn, "SELECT COUNT(*) FROM tasks", [])?;
            let completed = count(conn, "SELECT COUNT(*) FROM tasks WHERE completed = 1", [])?;

            let total_sessions = count(conn, "SELECT COUNT(*) FROM sessions", [])?;
            let completed_sessions = count(
                conn,
                "SELECT COUNT(*) FROM sessions WHERE status = ?1",
                params![SessionStatus::Completed.as_str()],
            )?;
            let focus_secs: i64 = conn.query_row(
                "SELECT COALESCE(SUM(duration_secs), 0) FROM sessions
                 WHERE session_type = ?1 AND status = ?2",
                params![SessionType::Work.as_str(), SessionStatus::Completed.as_str()],
                |row| row.get(0),
            )?;

            Ok(Stats {
                tasks: TaskStats {
                    total,
                    completed,
                    pending: total.saturating_sub(completed),
                    completion_rate: completion_rate(completed, total),
                },
                sessions: SessionStats {
                    total_sessions,
                    completed_sessions,
                    work_sessions: completed_of_type(conn, SessionType::Work)?,
                    break_sessions: completed_of_type(conn, SessionType::Break)?,
                    long_break_sessions: completed_of_type(conn, SessionType::LongBreak)?,
                    focus_minutes: to_u64(focus_secs, "focus_secs")? / 60,
                },
            })
        })
        .await
    }
}
