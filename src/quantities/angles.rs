use std::fmt::Display;
use std::sync::Arc;

use crate::quantities::{require_four_vectors, require_pair, Quantity};
use crate::utils::vectors::delta_phi;
use crate::vectors::CachedVector;
use crate::KinvarResult;

/// Azimuthal angle difference between two operands, wrapped into (−π, π].
///
/// Works on any vector kinds since only the transverse plane enters.
pub struct DeltaPhi {
    vectors: Vec<Arc<CachedVector>>,
}

impl DeltaPhi {
    pub fn new(vectors: Vec<Arc<CachedVector>>) -> KinvarResult<Self> {
        require_pair(&vectors)?;
        Ok(Self { vectors })
    }
}

impl Quantity for DeltaPhi {
    fn evaluate(&self) -> Option<f64> {
        let a = self.vectors[0].value()?;
        let b = self.vectors[1].value()?;
        Some(delta_phi(a.phi(), b.phi()))
    }

    fn parents(&self) -> &[Arc<CachedVector>] {
        &self.vectors
    }
}

impl Display for DeltaPhi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DeltaPhi({}, {})", self.vectors[0], self.vectors[1])
    }
}

/// Signed pseudorapidity difference between two four-vector operands.
pub struct DeltaEta {
    vectors: Vec<Arc<CachedVector>>,
}

impl DeltaEta {
    pub fn new(vectors: Vec<Arc<CachedVector>>) -> KinvarResult<Self> {
        require_pair(&vectors)?;
        require_four_vectors(&vectors)?;
        Ok(Self { vectors })
    }
}

impl Quantity for DeltaEta {
    fn evaluate(&self) -> Option<f64> {
        let a = self.vectors[0].value()?.as_four()?;
        let b = self.vectors[1].value()?.as_four()?;
        Some(a.eta() - b.eta())
    }

    fn parents(&self) -> &[Arc<CachedVector>] {
        &self.vectors
    }
}

impl Display for DeltaEta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DeltaEta({}, {})", self.vectors[0], self.vectors[1])
    }
}

/// Absolute pseudorapidity difference, for operands which cannot be told
/// apart (so the sign carries no information).
pub struct AbsDeltaEta {
    inner: DeltaEta,
}

impl AbsDeltaEta {
    pub fn new(vectors: Vec<Arc<CachedVector>>) -> KinvarResult<Self> {
        Ok(Self {
            inner: DeltaEta::new(vectors)?,
        })
    }
}

impl Quantity for AbsDeltaEta {
    fn evaluate(&self) -> Option<f64> {
        self.inner.evaluate().map(f64::abs)
    }

    fn parents(&self) -> &[Arc<CachedVector>] {
        self.inner.parents()
    }
}

impl Display for AbsDeltaEta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "AbsDeltaEta({}, {})",
            self.inner.vectors[0], self.inner.vectors[1]
        )
    }
}

/// 3D opening angle between the spatial parts of two four-vector operands.
///
/// Only meaningful when the initial-state longitudinal momentum is known,
/// i.e. at a lepton collider.
pub struct Angle3D {
    vectors: Vec<Arc<CachedVector>>,
}

impl Angle3D {
    pub fn new(vectors: Vec<Arc<CachedVector>>) -> KinvarResult<Self> {
        require_pair(&vectors)?;
        require_four_vectors(&vectors)?;
        Ok(Self { vectors })
    }
}

impl Quantity for Angle3D {
    fn evaluate(&self) -> Option<f64> {
        let a = self.vectors[0].value()?.as_four()?;
        let b = self.vectors[1].value()?.as_four()?;
        Some(a.angle(&b))
    }

    fn parents(&self) -> &[Arc<CachedVector>] {
        &self.vectors
    }
}

impl Display for Angle3D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Angle3D({}, {})", self.vectors[0], self.vectors[1])
    }
}

/// Distance in the (η, φ) plane between two four-vector operands,
/// `sqrt(Δη² + Δφ²)` with the azimuthal difference wrapped into (−π, π].
pub struct DeltaR {
    vectors: Vec<Arc<CachedVector>>,
}

impl DeltaR {
    pub fn new(vectors: Vec<Arc<CachedVector>>) -> KinvarResult<Self> {
        require_pair(&vectors)?;
        require_four_vectors(&vectors)?;
        Ok(Self { vectors })
    }
}

impl Quantity for DeltaR {
    fn evaluate(&self) -> Option<f64> {
        let a = self.vectors[0].value()?.as_four()?;
        let b = self.vectors[1].value()?.as_four()?;
        let dphi = delta_phi(a.phi(), b.phi());
        let deta = a.eta() - b.eta();
        Some((deta * deta + dphi * dphi).sqrt())
    }

    fn parents(&self) -> &[Arc<CachedVector>] {
        &self.vectors
    }
}

impl Display for DeltaR {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DeltaR({}, {})", self.vectors[0], self.vectors[1])
    }
}
