pub mod clock;
pub mod collaborators;
pub(crate) mod commands;
pub mod controller;
pub mod error;
#[cfg(test)]
pub(crate) mod mocks;
pub mod state;

pub use clock::{Clock, ManualClock, SystemClock};
pub use collaborators::{
    ActiveSessionRecord, NotificationSink, PendingTask, SessionStore, TaskProvider,
};
pub use controller::{TickerConfig, TimerController, TimerDeps, TimerEvent, TimerSnapshot};
pub use error::TimerError;
pub use state::{
    RemainingTime, Session, SessionDurations, SessionTimer, SessionType, TaskRef, TimerStatus,
};
