pub mod session;
pub mod stats;
pub mod task;

pub use session::{SessionRecord, SessionStatus};
pub use stats::{SessionStats, Stats, TaskStats};
pub use task::Task;
