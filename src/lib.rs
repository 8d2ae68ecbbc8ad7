//! Real-time microphone transcription client for the Verbum speech API.
//!
//! Captures audio from the best available input device, reshapes it to the
//! wire format the service expects (8 kHz mono 16-bit PCM with a light
//! gain boost) and streams it over a persistent WebSocket, printing
//! interim and final transcription results as they arrive.
//!
//! Modules:
//!
//! - `audio`: device selection, block transformation, capture driver
//! - `transport`: WebSocket session and wire event types
//! - `output`: result presentation
//! - `session`: shared state and the run orchestrator
//! - `config`: configuration structures and loading
//! - `platform`: capability detection resolved once at startup

pub mod audio;
pub mod config;
pub mod output;
pub mod platform;
pub mod session;
pub mod transport;

pub use audio::{AudioBlock, AudioError, CaptureDriver, DeviceDescriptor, WireFrame};
pub use config::{Config, ServerConfig, StreamingConfig, SttOptions};
pub use output::Presenter;
pub use platform::PlatformTuning;
pub use session::{ConnectionState, RecordingState, SessionOrchestrator, SessionState};
pub use transport::{
    FrameSender, ResultHandler, SpeechResult, TransportError, TransportSession,
};
