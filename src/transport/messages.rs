//! Wire event types exchanged with the speech service.

use serde::{Deserialize, Serialize};

pub const EVENT_SPEECH_RECOGNIZED: &str = "speechRecognized";
pub const EVENT_STREAM_END: &str = "streamEnd";

/// Connection-time auth payload. The token rides in the first message
/// after the handshake, never in the URL.
#[derive(Debug, Serialize)]
pub struct AuthPayload<'a> {
    pub token: &'a str,
}

/// Envelope for inbound text events on the socket; audio travels as binary
/// frames outside of it. Outbound control events carry no data member, so
/// they are emitted as bare `{"event": ...}` literals instead.
#[derive(Debug, Deserialize)]
pub struct EventEnvelope {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Interim vs final marker on a recognition result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Recognizing,
    Recognized,
}

/// Payload of a `speechRecognized` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechResult {
    pub status: ResultStatus,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    /// Utterance duration in milliseconds.
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub translations: Vec<Translation>,
    #[serde(default)]
    pub sentiment: Option<Sentiment>,
    #[serde(default)]
    pub redacted_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Translation {
    pub to: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sentiment {
    pub label: String,
    pub score: f64,
}
