//! Scorer input and output tensors
//!
//! Output layout is attribute-major: `[1, A, N]` (or `[A, N]`) with one row
//! per attribute `center_x, center_y, width, height, confidence, ...` and one
//! column per candidate.

use crate::error::DecodeError;

use super::types::Detection;

/// Number of leading attributes every candidate must carry
pub const BOX_ATTRIBUTES: usize = 5;

/// Planar RGB image tensor, shape `[1, 3, height, width]`, values in `[0, 1]`
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    pub data: Vec<f32>,
    pub width: u32,
    pub height: u32,
}

impl InputTensor {
    pub fn shape(&self) -> [usize; 4] {
        [1, 3, self.height as usize, self.width as usize]
    }
}

/// Raw scorer output
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTensor {
    pub data: Vec<f32>,
    pub shape: Vec<usize>,
}

impl OutputTensor {
    pub fn new(data: Vec<f32>, shape: Vec<usize>) -> Self {
        Self { data, shape }
    }

    /// Build an attribute-major `[1, A, N]` tensor from per-candidate rows.
    ///
    /// Rows of differing length are rejected.
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self, DecodeError> {
        let attributes = rows.first().map_or(BOX_ATTRIBUTES, Vec::len);
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != attributes) {
            return Err(DecodeError::UnexpectedOutputShape(format!(
                "candidate {} has {} attributes, expected {}",
                i,
                row.len(),
                attributes
            )));
        }
        let count = rows.len();
        let mut data = vec![0.0; attributes * count];
        for (i, row) in rows.iter().enumerate() {
            for (a, value) in row.iter().enumerate() {
                data[a * count + i] = *value;
            }
        }
        Ok(Self {
            data,
            shape: vec![1, attributes, count],
        })
    }

    /// Attribute count and candidate count, after validating the layout
    pub fn dimensions(&self) -> Result<(usize, usize), DecodeError> {
        let (attributes, count) = match self.shape.as_slice() {
            [1, attributes, count] | [attributes, count] => (*attributes, *count),
            [batch, _, _] => {
                return Err(DecodeError::UnexpectedOutputShape(format!(
                    "batch size {} (expected 1)",
                    batch
                )));
            }
            other => {
                return Err(DecodeError::UnexpectedOutputShape(format!(
                    "rank {} tensor {:?}",
                    other.len(),
                    other
                )));
            }
        };
        if attributes < BOX_ATTRIBUTES {
            return Err(DecodeError::UnexpectedOutputShape(format!(
                "{} attributes per candidate (need at least {})",
                attributes, BOX_ATTRIBUTES
            )));
        }
        let expected = attributes.checked_mul(count).ok_or_else(|| {
            DecodeError::UnexpectedOutputShape(format!("shape {:?} overflows", self.shape))
        })?;
        if self.data.len() != expected {
            return Err(DecodeError::UnexpectedOutputShape(format!(
                "{} values for shape {:?}",
                self.data.len(),
                self.shape
            )));
        }
        Ok((attributes, count))
    }

    /// Candidates in output order
    pub fn detections(&self) -> Result<impl Iterator<Item = Detection> + '_, DecodeError> {
        let (_, count) = self.dimensions()?;
        let at = move |attribute: usize, i: usize| self.data[attribute * count + i];
        Ok((0..count).map(move |i| Detection {
            center_x: at(0, i),
            center_y: at(1, i),
            width: at(2, i),
            height: at(3, i),
            confidence: at(4, i),
        }))
    }
}
