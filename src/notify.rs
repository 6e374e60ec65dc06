//! Completion cues.

use anyhow::Result;
use std::{
    io::{self, Write},
    sync::Arc,
};

use crate::timer::{NotificationSink, SessionType};

/// Discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn on_session_complete(&self, _session_type: SessionType) -> Result<()> {
        Ok(())
    }
}

/// Rings the terminal bell and prints a one-line notice.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalBell;

impl NotificationSink for TerminalBell {
    fn on_session_complete(&self, session_type: SessionType) -> Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "\x07{} session finished", session_type)?;
        stdout.flush()?;
        Ok(())
    }
}

#[cfg(feature = "chime")]
pub use chime::ChimeSink;

#[cfg(feature = "chime")]
mod chime {
    use anyhow::{anyhow, Result};

    use crate::audio::ChimeEngine;
    use crate::timer::{NotificationSink, SessionType};

    const WORK_DONE: [f32; 3] = [523.25, 659.25, 783.99];
    const BREAK_DONE: [f32; 3] = [783.99, 659.25, 523.25];

    #[derive(Default)]
    pub struct ChimeSink {
        engine: ChimeEngine,
    }

    impl NotificationSink for ChimeSink {
        fn on_session_complete(&self, session_type: SessionType) -> Result<()> {
            let notes = match session_type {
                SessionType::Work => &WORK_DONE,
                SessionType::Break | SessionType::LongBreak => &BREAK_DONE,
            };
            self.engine.chime(notes).map_err(|err| anyhow!(err))
        }
    }
}

/// Audible sink for the enabled features. Muting is the controller's job.
pub fn audible_sink() -> Arc<dyn NotificationSink> {
    #[cfg(feature = "chime")]
    {
        Arc::new(ChimeSink::default())
    }
    #[cfg(not(feature = "chime"))]
    {
        Arc::new(TerminalBell)
    }
}
