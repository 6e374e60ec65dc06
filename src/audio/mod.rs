//! Completion chime played through the default output device.

use log::error;
use rodio::{source::SineWave, OutputStream, Sink, Source};
use std::sync::{
    mpsc::{self, Sender},
    Mutex, PoisonError,
};
use std::thread;
use std::time::Duration;

const NOTE_MS: u64 = 180;
const VOLUME: f32 = 0.2;

enum AudioCommand {
    Chime(Vec<f32>),
    Stop,
}

pub struct ChimeEngine {
    tx: Mutex<Option<Sender<AudioCommand>>>,
}

impl ChimeEngine {
    pub fn new() -> Self {
        Self {
            tx: Mutex::new(None),
        }
    }

    fn ensure_thread(&self) -> Result<Sender<AudioCommand>, String> {
        let mut guard = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tx) = guard.as_ref() {
            return Ok(tx.clone());
        }

        let (tx, rx) = mpsc::channel::<AudioCommand>();

        // Output streams are not Send; they live and die on this thread
        thread::Builder::new()
            .name("audio-chime".to_string())
            .spawn(move || {
                let mut _stream: Option<OutputStream> = None;
                let mut sink: Option<Sink> = None;

                fn ensure_sink(
                    stream: &mut Option<OutputStream>,
                    sink: &mut Option<Sink>,
                ) -> Result<(), String> {
                    if sink.is_none() {
                        let (s, handle) = OutputStream::try_default()
                            .map_err(|e| format!("Failed to create audio output stream: {}", e))?;
                        let new_sink = Sink::try_new(&handle)
                            .map_err(|e| format!("Failed to create audio sink: {}", e))?;
                        *stream = Some(s);
                        *sink = Some(new_sink);
                    }
                    Ok(())
                }

                while let Ok(cmd) = rx.recv() {
                    match cmd {
                        AudioCommand::Chime(notes) => {
                            if let Err(err) = ensure_sink(&mut _stream, &mut sink) {
                                error!("{err}");
                                continue;
                            }
                            if let Some(ref s) = sink {
                                for frequency in notes {
                                    s.append(
                                        SineWave::new(frequency)
                                            .take_duration(Duration::from_millis(NOTE_MS))
                                            .amplify(VOLUME),
                                    );
                                }
                            }
                        }
                        AudioCommand::Stop => {
                            if let Some(s_old) = sink.take() {
                                s_old.stop();
                            }
                            _stream = None;
                            break;
                        }
                    }
                }
            })
            .map_err(|e| e.to_string())?;

        *guard = Some(tx.clone());
        Ok(tx)
    }

    /// Queues a short ascending or descending run of notes.
    pub fn chime(&self, notes: &[f32]) -> Result<(), String> {
        let tx = self.ensure_thread()?;
        tx.send(AudioCommand::Chime(notes.to_vec()))
            .map_err(|e| e.to_string())
    }
}

impl Default for ChimeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ChimeEngine {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.lock().unwrap_or_else(PoisonError::into_inner).take() {
            let _ = tx.send(AudioCommand::Stop);
        }
    }
}
