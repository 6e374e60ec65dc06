use thiserror::Error;

use super::state::{TaskRef, TimerStatus};

#[derive(Debug, Error)]
pub enum TimerError {
    #[error("cannot {operation} while the timer is {status}")]
    InvalidTransition {
        operation: &'static str,
        status: TimerStatus,
    },

    #[error("planned duration must be greater than zero")]
    ZeroDuration,

    #[error("task {0} is not a pending task")]
    UnknownTask(TaskRef),

    #[error("{operation} unavailable: {message}")]
    CollaboratorUnavailable {
        operation: &'static str,
        message: String,
    },
}

impl TimerError {
    pub fn unavailable(operation: &'static str, err: &anyhow::Error) -> Self {
        TimerError::CollaboratorUnavailable {
            operation,
            message: format!("{err:#}"),
        }
    }
}
