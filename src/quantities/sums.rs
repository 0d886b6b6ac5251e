use std::fmt::Display;
use std::sync::Arc;

use crate::quantities::{require_four_vectors, Quantity};
use crate::vectors::CachedVector;
use crate::{KinvarError, KinvarResult};

/// Scalar sum of transverse momenta over two or more operands.
///
/// Works on any vector kinds. The single-operand case is excluded since the
/// plain pt of one input is not a derived variable.
pub struct SumPt {
    vectors: Vec<Arc<CachedVector>>,
}

impl SumPt {
    pub fn new(vectors: Vec<Arc<CachedVector>>) -> KinvarResult<Self> {
        if vectors.len() < 2 {
            return Err(KinvarError::IncompatibleArguments);
        }
        Ok(Self { vectors })
    }
}

impl Quantity for SumPt {
    fn evaluate(&self) -> Option<f64> {
        let mut total = 0.0;
        for vector in &self.vectors {
            total += vector.value()?.pt();
        }
        Some(total)
    }

    fn parents(&self) -> &[Arc<CachedVector>] {
        &self.vectors
    }
}

impl Display for SumPt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .vectors
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "SumPt({joined})")
    }
}

/// Arithmetic mean of the pseudorapidities of two or more four-vector
/// operands, generalizing the Zeppenfeld mean rapidity.
pub struct MeanEta {
    vectors: Vec<Arc<CachedVector>>,
}

impl MeanEta {
    pub fn new(vectors: Vec<Arc<CachedVector>>) -> KinvarResult<Self> {
        if vectors.len() < 2 {
            return Err(KinvarError::IncompatibleArguments);
        }
        require_four_vectors(&vectors)?;
        Ok(Self { vectors })
    }
}

impl Quantity for MeanEta {
    fn evaluate(&self) -> Option<f64> {
        let mut total = 0.0;
        for vector in &self.vectors {
            total += vector.value()?.as_four()?.eta();
        }
        Some(total / self.vectors.len() as f64)
    }

    fn parents(&self) -> &[Arc<CachedVector>] {
        &self.vectors
    }
}

impl Display for MeanEta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .vectors
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "MeanEta({joined})")
    }
}
