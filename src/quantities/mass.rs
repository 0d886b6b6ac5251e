use std::fmt::Display;
use std::sync::Arc;

use crate::quantities::{require_four_vectors, require_pair, Quantity};
use crate::vectors::CachedVector;
use crate::{KinvarError, KinvarResult};

/// Invariant mass of a single vector sum.
///
/// Single-vector sums are rejected: the mass of one input is a property of
/// the reconstruction, not a derived variable worth scanning.
pub struct Mass {
    vectors: Vec<Arc<CachedVector>>,
}

impl Mass {
    pub fn new(vectors: Vec<Arc<CachedVector>>) -> KinvarResult<Self> {
        match vectors.as_slice() {
            [sum] if sum.n_components() >= 2 => Ok(Self { vectors }),
            _ => Err(KinvarError::IncompatibleArguments),
        }
    }
}

impl Quantity for Mass {
    fn evaluate(&self) -> Option<f64> {
        Some(self.vectors[0].value()?.m())
    }

    fn parents(&self) -> &[Arc<CachedVector>] {
        &self.vectors
    }
}

impl Display for Mass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Mass({})", self.vectors[0])
    }
}

/// Transverse mass of a pair of operands, `sqrt(Et_sum² − Px_sum² − Py_sum²)`
/// with the sign preserved when the radicand is negative.
///
/// Works on any vector kinds since only transverse components enter.
pub struct TransverseMass {
    vectors: Vec<Arc<CachedVector>>,
}

impl TransverseMass {
    pub fn new(vectors: Vec<Arc<CachedVector>>) -> KinvarResult<Self> {
        require_pair(&vectors)?;
        Ok(Self { vectors })
    }
}

impl Quantity for TransverseMass {
    fn evaluate(&self) -> Option<f64> {
        let a = self.vectors[0].value()?;
        let b = self.vectors[1].value()?;
        let et = a.et() + b.et();
        let px = a.px() + b.px();
        let py = a.py() + b.py();
        let diff = et * et - px * px - py * py;
        Some(if diff >= 0.0 {
            diff.sqrt()
        } else {
            -(-diff).sqrt()
        })
    }

    fn parents(&self) -> &[Arc<CachedVector>] {
        &self.vectors
    }
}

impl Display for TransverseMass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MT({}, {})", self.vectors[0], self.vectors[1])
    }
}

/// Transverse momentum of the first operand over the invariant mass of the
/// pair, `Pt(a) / M(a + b)`. Requires full four-vectors for the combined
/// mass.
pub struct PtOverMass {
    vectors: Vec<Arc<CachedVector>>,
}

impl PtOverMass {
    pub fn new(vectors: Vec<Arc<CachedVector>>) -> KinvarResult<Self> {
        require_pair(&vectors)?;
        require_four_vectors(&vectors)?;
        Ok(Self { vectors })
    }
}

impl Quantity for PtOverMass {
    fn evaluate(&self) -> Option<f64> {
        let a = self.vectors[0].value()?.as_four()?;
        let b = self.vectors[1].value()?.as_four()?;
        Some(a.pt() / (a + b).m())
    }

    fn parents(&self) -> &[Arc<CachedVector>] {
        &self.vectors
    }
}

impl Display for PtOverMass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PtOverMass({}, {})", self.vectors[0], self.vectors[1])
    }
}
