use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: u64,
    pub completed: u64,
    pub pending: u64,
    /// Percentage of completed tasks, rounded to two decimals.
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub total_sessions: u64,
    pub completed_sessions: u64,
    pub work_sessions: u64,
    pub break_sessions: u64,
    pub long_break_sessions: u64,
    /// Sum of completed work session durations.
    pub focus_minutes: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub tasks: TaskStats,
    pub sessions: SessionStats,
}
