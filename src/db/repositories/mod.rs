pub mod sessions;
pub mod stats;
pub mod tasks;
