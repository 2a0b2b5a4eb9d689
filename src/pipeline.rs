//! Capture-then-validate flow

use std::sync::Arc;

use crate::capture::{CapturePlatform, CaptureSessionManager, CapturedImage};
use crate::config::Settings;
use crate::detection::ValidationResult;
use crate::error::PipelineError;
use crate::validator::ReceiptValidator;

/// A validated image together with its verdict
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub image: CapturedImage,
    pub result: ValidationResult,
}

/// Glues a capture session to a validator
pub struct ReceiptPipeline<P: CapturePlatform> {
    session: Arc<CaptureSessionManager<P>>,
    validator: Arc<ReceiptValidator>,
    stop_session_after_capture: bool,
}

impl<P: CapturePlatform> ReceiptPipeline<P> {
    pub fn new(
        session: Arc<CaptureSessionManager<P>>,
        validator: Arc<ReceiptValidator>,
        settings: &Settings,
    ) -> Self {
        Self {
            session,
            validator,
            stop_session_after_capture: settings.stop_session_after_capture,
        }
    }

    pub fn session(&self) -> &Arc<CaptureSessionManager<P>> {
        &self.session
    }

    pub fn validator(&self) -> &Arc<ReceiptValidator> {
        &self.validator
    }

    /// Take one photo from the running session and validate it.
    pub async fn capture_and_validate(&self) -> Result<ValidationOutcome, PipelineError> {
        let image = self.session.capture_once().await?;
        log::debug!(
            "Captured {}x{} image at {}",
            image.width(),
            image.height(),
            image.captured_at().format("%Y-%m-%d %H:%M:%S")
        );
        if self.stop_session_after_capture {
            log::debug!("Stopping capture session before validation");
            self.session.stop_session().await;
        }
        self.validate_image(image).await
    }

    /// Validate an image that did not come from the camera session.
    pub async fn validate_image(
        &self,
        image: CapturedImage,
    ) -> Result<ValidationOutcome, PipelineError> {
        let result = self
            .validator
            .validate_in_background(image.clone())
            .await?;
        Ok(ValidationOutcome { image, result })
    }
}
