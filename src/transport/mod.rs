pub mod messages;
pub mod session;

pub use messages::{ResultStatus, Sentiment, SpeechResult, Translation};
pub use session::{FrameSender, ResultHandler, TransportSession};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid server endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("websocket handshake failed: {0}")]
    Handshake(String),

    #[error("failed to send auth payload: {0}")]
    Auth(String),
}
