use std::fmt::Display;
use std::sync::Arc;

use crate::cache::Memo;
use crate::utils::enums::{Collider, VectorKind};
use crate::vectors::CachedVector;
use crate::{KinvarError, KinvarResult};

/// Invariant-mass-like quantities.
pub mod mass;
/// Angular quantities (azimuthal and pseudorapidity differences, 3D angles).
pub mod angles;
/// Quantities aggregating over two or more operands.
pub mod sums;

/// A pure scalar function node over one or more vector-sum parents.
///
/// Implementors are constructed against a fixed argument list and simply read
/// their parents' (cached) per-event values; `None` marks the result
/// undefined for the current event.
pub trait Quantity: Display {
    /// Compute the scalar for the current event.
    fn evaluate(&self) -> Option<f64>;
    /// The vector nodes this quantity reads.
    fn parents(&self) -> &[Arc<CachedVector>];
}

/// A [`Quantity`] wrapped in a per-event memo slot.
pub struct CachedQuantity {
    inner: Box<dyn Quantity>,
    slot: Memo<Option<f64>>,
}

impl CachedQuantity {
    /// Wrap a quantity node in caching.
    pub fn new(inner: Box<dyn Quantity>) -> Self {
        Self {
            inner,
            slot: Memo::new(),
        }
    }

    /// The scalar value for the current event, computed at most once per
    /// event.
    pub fn value(&self) -> Option<f64> {
        self.slot.get_or_compute(|| self.inner.evaluate())
    }

    /// Mark this node and (transitively) its parents stale. Subgraphs that
    /// were never evaluated for the current event are skipped.
    pub fn invalidate(&self) {
        if self.slot.clear() {
            for parent in self.inner.parents() {
                parent.invalidate();
            }
        }
    }
}

impl Display for CachedQuantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner.fmt(f)
    }
}

/// A registry entry describing one quantity function: its display name, its
/// admissible arities given the number of input vectors, and a constructor
/// over a candidate argument list.
///
/// Constructors fail with [`KinvarError::IncompatibleArguments`] when handed
/// vector kinds or component counts they cannot operate on; the
/// [`VariableBuilder`](crate::builder::VariableBuilder) catches this per
/// candidate and drops that candidate from the catalog.
pub struct FunctionEntry {
    /// The display name of the function.
    pub name: &'static str,
    /// The admissible argument counts given the maximum available group
    /// count.
    pub arities: fn(usize) -> Vec<usize>,
    /// Construct the quantity over a concrete argument list.
    pub construct: fn(Vec<Arc<CachedVector>>) -> KinvarResult<Box<dyn Quantity>>,
}

/// Invariant mass of a single vector sum with at least two components.
pub static MASS: FunctionEntry = FunctionEntry {
    name: "Mass",
    arities: |_| vec![1],
    construct: |vectors| Ok(Box::new(mass::Mass::new(vectors)?)),
};

/// Azimuthal angle difference, wrapped into (−π, π].
pub static DELTA_PHI: FunctionEntry = FunctionEntry {
    name: "DeltaPhi",
    arities: |_| vec![2],
    construct: |vectors| Ok(Box::new(angles::DeltaPhi::new(vectors)?)),
};

/// Pseudorapidity difference (signed, for distinguishable operands).
pub static DELTA_ETA: FunctionEntry = FunctionEntry {
    name: "DeltaEta",
    arities: |_| vec![2],
    construct: |vectors| Ok(Box::new(angles::DeltaEta::new(vectors)?)),
};

/// Absolute pseudorapidity difference (for indistinguishable operands).
pub static ABS_DELTA_ETA: FunctionEntry = FunctionEntry {
    name: "AbsDeltaEta",
    arities: |_| vec![2],
    construct: |vectors| Ok(Box::new(angles::AbsDeltaEta::new(vectors)?)),
};

/// 3D opening angle between the spatial parts of two four-vectors.
pub static ANGLE3D: FunctionEntry = FunctionEntry {
    name: "Angle3D",
    arities: |_| vec![2],
    construct: |vectors| Ok(Box::new(angles::Angle3D::new(vectors)?)),
};

/// Distance in the (η, φ) plane between two four-vectors.
pub static DELTA_R: FunctionEntry = FunctionEntry {
    name: "DeltaR",
    arities: |_| vec![2],
    construct: |vectors| Ok(Box::new(angles::DeltaR::new(vectors)?)),
};

/// Transverse momentum of the first operand over the pair's invariant mass.
pub static PT_OVER_MASS: FunctionEntry = FunctionEntry {
    name: "PtOverMass",
    arities: |_| vec![2],
    construct: |vectors| Ok(Box::new(mass::PtOverMass::new(vectors)?)),
};

/// Mean pseudorapidity of two or more four-vectors.
pub static MEAN_ETA: FunctionEntry = FunctionEntry {
    name: "MeanEta",
    arities: |max| (2..=max).collect(),
    construct: |vectors| Ok(Box::new(sums::MeanEta::new(vectors)?)),
};

/// Scalar sum of transverse momenta of two or more operands.
pub static SUM_PT: FunctionEntry = FunctionEntry {
    name: "SumPt",
    arities: |max| (2..=max).collect(),
    construct: |vectors| Ok(Box::new(sums::SumPt::new(vectors)?)),
};

/// Transverse mass of a pair of operands.
pub static TRANSVERSE_MASS: FunctionEntry = FunctionEntry {
    name: "TransverseMass",
    arities: |max| if max >= 2 { vec![2] } else { Vec::new() },
    construct: |vectors| Ok(Box::new(mass::TransverseMass::new(vectors)?)),
};

/// Every quantity function known to the crate.
pub static FUNCTIONS: &[&FunctionEntry] = &[
    &MASS,
    &DELTA_PHI,
    &DELTA_ETA,
    &ABS_DELTA_ETA,
    &ANGLE3D,
    &DELTA_R,
    &PT_OVER_MASS,
    &MEAN_ETA,
    &SUM_PT,
    &TRANSVERSE_MASS,
];

/// The default function set for a collider type.
///
/// Both sets include mass, azimuthal differences, and pt-over-mass ratios. At
/// a lepton collider the initial-state longitudinal momentum is known and 3D
/// opening angles are meaningful; at a hadron collider only quantities
/// invariant under boosts along the beam axis are generated, so absolute
/// pseudorapidity differences take their place.
pub fn default_functions(collider: Collider) -> Vec<&'static FunctionEntry> {
    let mut functions = vec![&MASS, &DELTA_PHI, &PT_OVER_MASS];
    match collider {
        Collider::Lepton => functions.push(&ANGLE3D),
        Collider::Hadron => functions.push(&ABS_DELTA_ETA),
    }
    functions
}

/// Check that a candidate argument list consists of full four-vectors only.
pub(crate) fn require_four_vectors(vectors: &[Arc<CachedVector>]) -> KinvarResult<()> {
    if vectors.iter().all(|v| v.kind() == VectorKind::FourVector) {
        Ok(())
    } else {
        Err(KinvarError::IncompatibleArguments)
    }
}

/// Check that a candidate argument list has exactly two entries.
pub(crate) fn require_pair(vectors: &[Arc<CachedVector>]) -> KinvarResult<()> {
    if vectors.len() == 2 {
        Ok(())
    } else {
        Err(KinvarError::IncompatibleArguments)
    }
}
