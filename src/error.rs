//! Error types reported to the host shell
//!
//! Every failure in this crate surfaces as one of these enums. None of them
//! is fatal: the caller recovers by retrying or by recreating the session.

use thiserror::Error;

/// Failures of the capture session manager
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("no capture device available")]
    DeviceUnavailable,
    #[error("capture output could not be attached to the session")]
    OutputUnavailable,
    #[error("capture session is not running")]
    NotReady,
    #[error("a photo capture is already in flight")]
    AlreadyCapturing,
    #[error("photo capture timed out")]
    CaptureTimeout,
    #[error("captured frame could not be decoded: {0}")]
    FrameDecodeFailed(String),
    #[error("a session transition is already in progress")]
    Busy,
    #[error("capture was cancelled because the session stopped")]
    Cancelled,
    #[error("capture platform error: {0}")]
    Platform(String),
}

/// Failures of preprocessing, scoring and output decoding
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("scorer unavailable: {0}")]
    ScorerUnavailable(String),
    #[error("invalid image format: {0}")]
    InvalidImageFormat(String),
    #[error("unexpected scorer output shape: {0}")]
    UnexpectedOutputShape(String),
    #[error("validation worker failed: {0}")]
    WorkerFailed(String),
}

/// Failures of the combined capture-then-validate flow
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}
