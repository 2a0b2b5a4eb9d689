//! Scorer implementations
//!
//! The model itself is opaque: anything that turns an [`InputTensor`] into
//! an attribute-major [`OutputTensor`] can act as a scorer.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::tensor::{InputTensor, OutputTensor};
use crate::error::DecodeError;

/// Runs the detection model once per call
pub trait Scorer: Send + Sync {
    fn name(&self) -> &str;

    fn score(&self, input: &InputTensor) -> Result<OutputTensor, DecodeError>;
}

/// Host hook that turns a model file into a runnable scorer
pub trait ModelLoader {
    type Model: Scorer + 'static;

    fn load(&self, path: &Path) -> anyhow::Result<Self::Model>;
}

/// Scorer backed by an on-device model file.
///
/// A model that fails to load does not prevent construction; every call then
/// reports [`DecodeError::ScorerUnavailable`].
pub struct ModelScorer {
    path: PathBuf,
    model: Result<Box<dyn Scorer>, String>,
}

impl ModelScorer {
    pub fn load<L: ModelLoader>(loader: &L, path: &Path) -> Self {
        let model = if !path.exists() {
            log::warn!("Receipt model not found at {}", path.display());
            Err(format!("model file {} not found", path.display()))
        } else {
            match loader.load(path) {
                Ok(model) => {
                    log::info!("Loaded receipt model {}", path.display());
                    Ok(Box::new(model) as Box<dyn Scorer>)
                }
                Err(e) => {
                    log::warn!("Failed to load receipt model {}: {:#}", path.display(), e);
                    Err(format!("{:#}", e))
                }
            }
        };
        Self {
            path: path.to_path_buf(),
            model,
        }
    }

    /// Scorer for a setup with no model configured
    pub fn unconfigured() -> Self {
        Self {
            path: PathBuf::new(),
            model: Err("no receipt model configured".to_string()),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_ok()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Scorer for ModelScorer {
    fn name(&self) -> &str {
        match &self.model {
            Ok(model) => model.name(),
            Err(_) => "unloaded-model",
        }
    }

    fn score(&self, input: &InputTensor) -> Result<OutputTensor, DecodeError> {
        match &self.model {
            Ok(model) => model.score(input),
            Err(reason) => Err(DecodeError::ScorerUnavailable(reason.clone())),
        }
    }
}

/// Scorer with a canned answer, for tests and previews
pub struct FixedScorer {
    response: Result<OutputTensor, DecodeError>,
    calls: AtomicUsize,
}

impl FixedScorer {
    pub fn new(response: Result<OutputTensor, DecodeError>) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
        }
    }

    /// One receipt candidate covering the middle 60% of the frame
    pub fn receipt(confidence: f32) -> Self {
        Self::new(OutputTensor::from_rows(&[vec![
            0.5, 0.5, 0.6, 0.6, confidence, 1.0,
        ]]))
    }

    /// A tensor with no candidates at all
    pub fn empty() -> Self {
        Self::new(Ok(OutputTensor::new(Vec::new(), vec![1, 6, 0])))
    }

    pub fn failing(error: DecodeError) -> Self {
        Self::new(Err(error))
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl Default for FixedScorer {
    fn default() -> Self {
        Self::receipt(0.95)
    }
}

impl Scorer for FixedScorer {
    fn name(&self) -> &str {
        "fixed"
    }

    fn score(&self, _input: &InputTensor) -> Result<OutputTensor, DecodeError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.response.clone()
    }
}
