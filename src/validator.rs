//! Receipt validation over captured images

use std::sync::Arc;

use crate::capture::CapturedImage;
use crate::config::Settings;
use crate::detection::{ModelLoader, ModelScorer, Scorer, ValidationResult, decode, preprocess};
use crate::error::DecodeError;

/// Runs one image through preprocessing, the scorer and the decoder
pub struct ReceiptValidator {
    scorer: Arc<dyn Scorer>,
    confidence_threshold: f32,
    input_size: u32,
}

impl ReceiptValidator {
    /// Out-of-range values in `settings` fall back to their defaults.
    pub fn new(scorer: Arc<dyn Scorer>, settings: &Settings) -> Self {
        let settings = settings.clone().sanitized();
        Self {
            scorer,
            confidence_threshold: settings.confidence_threshold,
            input_size: settings.input_size,
        }
    }

    /// Validator backed by the model file named in `settings`.
    ///
    /// A missing or unloadable model still yields a validator; its
    /// validations fail with [`DecodeError::ScorerUnavailable`].
    pub fn from_settings<L: ModelLoader>(loader: &L, settings: &Settings) -> Self {
        let scorer = match &settings.model_path {
            Some(path) => ModelScorer::load(loader, path),
            None => {
                log::warn!("No receipt model configured");
                ModelScorer::unconfigured()
            }
        };
        Self::new(Arc::new(scorer), settings)
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    pub fn input_size(&self) -> u32 {
        self.input_size
    }

    /// Decide whether `image` shows a receipt. Invokes the scorer exactly once.
    pub fn validate(&self, image: &CapturedImage) -> Result<ValidationResult, DecodeError> {
        let input = preprocess(image.rgba(), self.input_size)?;
        let output = self.scorer.score(&input).inspect_err(|e| {
            log::warn!("Scorer {} failed: {}", self.scorer.name(), e);
        })?;
        let result = decode(
            &output,
            image.width(),
            image.height(),
            self.confidence_threshold,
        )?;

        if result.is_receipt {
            log::info!(
                "Receipt detected with confidence {:.3} in {}x{} image",
                result.confidence,
                image.width(),
                image.height()
            );
        } else {
            log::info!("No receipt in {}x{} image", image.width(), image.height());
        }
        Ok(result)
    }

    /// Run [`validate`](Self::validate) on a blocking worker.
    pub async fn validate_in_background(
        self: &Arc<Self>,
        image: CapturedImage,
    ) -> Result<ValidationResult, DecodeError> {
        let validator = Arc::clone(self);
        tokio::task::spawn_blocking(move || validator.validate(&image))
            .await
            .map_err(|e| DecodeError::WorkerFailed(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{FixedScorer, OutputTensor};
    use image::{Rgba, RgbaImage};
    use std::path::Path;

    fn image(width: u32, height: u32) -> CapturedImage {
        CapturedImage::new(RgbaImage::from_pixel(width, height, Rgba([200, 200, 200, 255])))
    }

    fn validator(scorer: Arc<FixedScorer>) -> ReceiptValidator {
        ReceiptValidator::new(scorer, &Settings::default())
    }

    #[test]
    fn test_receipt_verdict_and_box() {
        let scorer = Arc::new(FixedScorer::receipt(0.95));
        let result = validator(Arc::clone(&scorer)).validate(&image(1000, 500)).unwrap();

        assert!(result.is_receipt);
        assert_eq!(result.confidence, 0.95);
        let bbox = result.bounding_box.unwrap();
        assert!((bbox.x - 200.0).abs() < 1e-3);
        assert!((bbox.y - 100.0).abs() < 1e-3);
        assert!((bbox.width - 600.0).abs() < 1e-3);
        assert!((bbox.height - 300.0).abs() < 1e-3);
        assert_eq!(scorer.call_count(), 1);
    }

    #[test]
    fn test_below_threshold_is_not_a_receipt() {
        let scorer = Arc::new(FixedScorer::receipt(0.85));
        let result = validator(scorer).validate(&image(64, 64)).unwrap();
        assert_eq!(result, ValidationResult::not_a_receipt());
    }

    #[test]
    fn test_threshold_comes_from_settings() {
        let settings = Settings {
            confidence_threshold: 0.8,
            input_size: 32,
            ..Settings::default()
        };
        let validator = ReceiptValidator::new(Arc::new(FixedScorer::receipt(0.85)), &settings);
        assert_eq!(validator.input_size(), 32);
        assert!(validator.validate(&image(64, 64)).unwrap().is_receipt);
    }

    #[test]
    fn test_invalid_threshold_falls_back_to_default() {
        for threshold in [f32::NAN, -0.5, 2.0] {
            let settings = Settings {
                confidence_threshold: threshold,
                ..Settings::default()
            };
            let validator = ReceiptValidator::new(Arc::new(FixedScorer::receipt(0.5)), &settings);
            assert_eq!(validator.confidence_threshold(), 0.9);
            assert_eq!(
                validator.validate(&image(16, 16)).unwrap(),
                ValidationResult::not_a_receipt()
            );
        }
    }

    #[test]
    fn test_no_detections() {
        let result = validator(Arc::new(FixedScorer::empty()))
            .validate(&image(64, 64))
            .unwrap();
        assert!(!result.is_receipt);
        assert_eq!(result.bounding_box, None);
    }

    #[test]
    fn test_scorer_errors_propagate() {
        let scorer = Arc::new(FixedScorer::failing(DecodeError::ScorerUnavailable(
            "model missing".into(),
        )));
        assert_eq!(
            validator(scorer).validate(&image(8, 8)).unwrap_err(),
            DecodeError::ScorerUnavailable("model missing".into())
        );
    }

    #[test]
    fn test_malformed_output_is_reported() {
        let scorer = Arc::new(FixedScorer::new(Ok(OutputTensor::new(
            vec![0.0; 4],
            vec![1, 4, 1],
        ))));
        assert!(matches!(
            validator(scorer).validate(&image(8, 8)),
            Err(DecodeError::UnexpectedOutputShape(_))
        ));
    }

    #[test]
    fn test_empty_image_is_rejected_before_scoring() {
        let scorer = Arc::new(FixedScorer::default());
        let empty = CapturedImage::new(RgbaImage::new(0, 0));
        assert!(matches!(
            validator(Arc::clone(&scorer)).validate(&empty),
            Err(DecodeError::InvalidImageFormat(_))
        ));
        assert_eq!(scorer.call_count(), 0);
    }

    #[test]
    fn test_unconfigured_model() {
        struct NeverLoader;
        impl ModelLoader for NeverLoader {
            type Model = FixedScorer;
            fn load(&self, _path: &Path) -> anyhow::Result<FixedScorer> {
                anyhow::bail!("not reached")
            }
        }

        let validator = ReceiptValidator::from_settings(&NeverLoader, &Settings::default());
        assert!(matches!(
            validator.validate(&image(8, 8)),
            Err(DecodeError::ScorerUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_validate_in_background() {
        let scorer = Arc::new(FixedScorer::receipt(0.99));
        let validator = Arc::new(validator(Arc::clone(&scorer)));

        let result = validator.validate_in_background(image(320, 240)).await.unwrap();

        assert!(result.is_receipt);
        assert_eq!(scorer.call_count(), 1);
    }

    #[tokio::test]
    async fn test_background_worker_panic_is_reported() {
        struct PanickingScorer;
        impl Scorer for PanickingScorer {
            fn name(&self) -> &str {
                "panicking"
            }
            fn score(&self, _input: &crate::detection::InputTensor) -> Result<OutputTensor, DecodeError> {
                panic!("scorer crashed")
            }
        }

        let validator = Arc::new(ReceiptValidator::new(
            Arc::new(PanickingScorer),
            &Settings::default(),
        ));
        assert!(matches!(
            validator.validate_in_background(image(8, 8)).await,
            Err(DecodeError::WorkerFailed(_))
        ));
    }
}
