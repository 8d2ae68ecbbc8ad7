pub mod capture;
pub mod device;
pub mod transform;

pub use capture::CaptureDriver;
pub use device::{select_best_device, DeviceDescriptor, CANDIDATE_RATES, DEFAULT_ASSUMED_RATE};
pub use transform::{transform, AudioBlock, WireFrame, TARGET_SAMPLE_RATE};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("failed to query device configuration: {0}")]
    DeviceConfig(String),

    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to open input stream at any candidate rate (tried {0:?})")]
    AllRatesFailed(Vec<u32>),

    #[error("failed to build input stream: {0}")]
    StreamBuild(String),

    #[error("failed to start input stream: {0}")]
    StreamPlay(String),
}

pub type Result<T> = std::result::Result<T, AudioError>;
