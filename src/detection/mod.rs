//! Receipt detection
//!
//! This module consolidates:
//! - Result types (types.rs)
//! - Scorer tensors (tensor.rs)
//! - Image preprocessing (preprocess.rs)
//! - Scorer implementations (scorer.rs)
//! - Output decoding (decoder.rs)

pub mod decoder;
pub mod preprocess;
pub mod scorer;
pub mod tensor;
pub mod types;

pub use decoder::{DEFAULT_CONFIDENCE_THRESHOLD, decode, decode_detections};
pub use preprocess::{DEFAULT_INPUT_SIZE, preprocess};
pub use scorer::{FixedScorer, ModelLoader, ModelScorer, Scorer};
pub use tensor::{InputTensor, OutputTensor};
pub use types::{BoundingBox, Detection, ValidationResult};
