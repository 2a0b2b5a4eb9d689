//! Camera capture
//!
//! This module consolidates:
//! - Host camera traits (platform.rs)
//! - Session lifecycle state machine (session.rs)
//! - Captured still image type (image.rs)

pub mod image;
pub mod platform;
pub mod session;

#[cfg(test)]
pub(crate) mod mock;

pub use self::image::CapturedImage;
pub use platform::{
    CameraPosition, CapturePlatform, OutputCapabilities, PhotoCompletion, PhotoOutput, PhotoResult,
    PhotoSettings, RawPhoto,
};
pub use session::{CaptureSessionManager, DEFAULT_CAPTURE_TIMEOUT, SessionConfig, SessionState};
