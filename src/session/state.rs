//! Shared session flags.
//!
//! The only state crossing between the audio callback thread and the event
//! context. Owned by the orchestrator; collaborators hold an `Arc`.
//! Single-writer discipline: the transport side writes the connection
//! state, the capture driver writes the recording state.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    Recording,
}

#[derive(Debug, Default)]
pub struct SessionState {
    connection: AtomicU8,
    recording: AtomicBool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection(&self) -> ConnectionState {
        match self.connection.load(Ordering::SeqCst) {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            _ => ConnectionState::Disconnected,
        }
    }

    pub fn set_connection(&self, state: ConnectionState) {
        let value = match state {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connecting => 1,
            ConnectionState::Connected => 2,
        };
        self.connection.store(value, Ordering::SeqCst);
    }

    pub fn recording(&self) -> RecordingState {
        if self.recording.load(Ordering::SeqCst) {
            RecordingState::Recording
        } else {
            RecordingState::Idle
        }
    }

    pub fn set_recording(&self, recording: bool) {
        self.recording.store(recording, Ordering::SeqCst);
    }

    pub fn is_connected(&self) -> bool {
        self.connection() == ConnectionState::Connected
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    /// Frames may only flow while connected and recording; anything
    /// captured outside that window is dropped, never queued.
    pub fn should_forward(&self) -> bool {
        self.is_connected() && self.is_recording()
    }

    /// Liveness poll used by the orchestrator's wait loop.
    pub fn is_live(&self) -> bool {
        self.should_forward()
    }
}
