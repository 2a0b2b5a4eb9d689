//! On-device receipt validation
//!
//! This crate consolidates:
//! - Camera session lifecycle and single-frame capture (capture/)
//! - Detection preprocessing, scoring and decoding (detection/)
//! - Validation of captured images (validator.rs)
//! - Capture-then-validate flow (pipeline.rs)
//! - Persisted settings (config.rs)

pub mod capture;
pub mod config;
pub mod detection;
pub mod error;
pub mod pipeline;
pub mod validator;

pub use capture::{CapturePlatform, CaptureSessionManager, CapturedImage, SessionState};
pub use config::Settings;
pub use detection::{BoundingBox, Scorer, ValidationResult};
pub use error::{CaptureError, DecodeError, PipelineError};
pub use pipeline::{ReceiptPipeline, ValidationOutcome};
pub use validator::ReceiptValidator;

/// Install the `env_logger` backend, honouring `RUST_LOG` (default `warn`).
///
/// Later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .try_init();
}
