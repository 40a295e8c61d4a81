//! Recording clock, mute flag, and the cosmetic waveform levels.
//!
//! Two background tasks run only while recording: a 1-second ticker that
//! advances the clock and scans the transcript, and a fast waveform task
//! that jitters the level bars. Stopping aborts both, so no tick outlives
//! the recording flag.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::session::context::SharedSession;

pub const WAVEFORM_BARS: usize = 20;
pub const WAVEFORM_BASELINE: u8 = 20;
const WAVEFORM_TICK: Duration = Duration::from_millis(100);

pub struct RecordingState {
    pub is_recording: bool,
    pub is_muted: bool,
    pub elapsed_secs: u64,
    pub waveform: [u8; WAVEFORM_BARS],
    pub ticker: Option<JoinHandle<()>>,
    pub waveform_task: Option<JoinHandle<()>>,
}

impl Default for RecordingState {
    fn default() -> Self {
        RecordingState {
            is_recording: false,
            is_muted: false,
            elapsed_secs: 0,
            waveform: [WAVEFORM_BASELINE; WAVEFORM_BARS],
            ticker: None,
            waveform_task: None,
        }
    }
}

impl RecordingState {
    pub fn display(&self) -> String {
        format_elapsed(self.elapsed_secs)
    }

    /// Stops recording, aborts both tasks, and resets the waveform to its
    /// baseline.
    pub fn stop(&mut self) {
        self.is_recording = false;
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
        if let Some(handle) = self.waveform_task.take() {
            handle.abort();
        }
        self.waveform = [WAVEFORM_BASELINE; WAVEFORM_BARS];
    }

    pub fn snapshot(&self) -> RecordingSnapshot {
        RecordingSnapshot {
            is_recording: self.is_recording,
            is_muted: self.is_muted,
            elapsed_secs: self.elapsed_secs,
            display: self.display(),
            waveform: self.waveform.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordingSnapshot {
    pub is_recording: bool,
    pub is_muted: bool,
    pub elapsed_secs: u64,
    pub display: String,
    pub waveform: Vec<u8>,
}

/// Minutes:seconds with zero-padded seconds, e.g. `1:05`.
pub fn format_elapsed(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

pub async fn start(shared: &SharedSession) {
    let mut session = shared.lock().await;
    if session.recording.is_recording {
        return;
    }
    session.recording.stop();
    session.recording.is_recording = true;
    session.recording.elapsed_secs = 0;

    let ticker_session = Arc::clone(shared);
    session.recording.ticker = Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        interval.tick().await;
        loop {
            interval.tick().await;
            let mut session = ticker_session.lock().await;
            if !session.recording.is_recording {
                break;
            }
            session.recording.elapsed_secs += 1;
            session.process_transcript();
        }
    }));

    let waveform_session = Arc::clone(shared);
    session.recording.waveform_task = Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(WAVEFORM_TICK);
        loop {
            interval.tick().await;
            let mut session = waveform_session.lock().await;
            if !session.recording.is_recording {
                break;
            }
            let mut rng = rand::rng();
            for _ in 0..3 {
                let index = rng.random_range(0..WAVEFORM_BARS);
                session.recording.waveform[index] = rng.random_range(0..=100);
            }
        }
    }));
}

pub async fn stop(shared: &SharedSession) {
    let mut session = shared.lock().await;
    session.recording.stop();
}
