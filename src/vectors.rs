use std::fmt::Display;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::Memo;
use crate::data::{EventCursor, ExprCell};
use crate::utils::enums::VectorKind;
use crate::utils::vectors::{Momentum, Vec2, Vec4};
use crate::utils::default_vector_name;
use crate::{KinvarError, KinvarResult};

/// The mass of an input four-vector, either a fixed value (0 models a
/// three-vector, a constant models e.g. a τ lepton or a b jet) or a per-event
/// expression.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MassDef {
    /// A fixed mass shared by all events.
    Constant(f64),
    /// An expression read from the event source per event.
    Expression(String),
}

impl Default for MassDef {
    fn default() -> Self {
        Self::Constant(0.0)
    }
}

#[derive(Clone, Debug)]
enum MassSource {
    Constant(f64),
    Cell(ExprCell),
}

impl MassSource {
    fn get(&self) -> f64 {
        match self {
            MassSource::Constant(m) => *m,
            MassSource::Cell(cell) => cell.get(),
        }
    }
}

/// An input four-momentum read from `(pt, eta, phi, mass)` fields of the
/// event source.
#[derive(Clone, Debug)]
pub struct FourVector {
    name: String,
    pt: ExprCell,
    eta: ExprCell,
    phi: ExprCell,
    mass: MassSource,
}

impl FourVector {
    /// Register the field expressions of a four-vector with `cursor` and wrap
    /// the result in a [`CachedVector`] leaf.
    ///
    /// When `name` is `None` a display name is derived from the pt expression
    /// by stripping a trailing `pt` (so `"jet1Pt"` becomes `"jet1"`).
    pub fn register(
        cursor: &mut EventCursor,
        pt: &str,
        eta: &str,
        phi: &str,
        mass: MassDef,
        name: Option<&str>,
    ) -> KinvarResult<Arc<CachedVector>> {
        let name = name
            .map(ToString::to_string)
            .unwrap_or_else(|| default_vector_name(pt, "pt"));
        let mass = match mass {
            MassDef::Constant(m) => MassSource::Constant(m),
            MassDef::Expression(expression) => {
                MassSource::Cell(cursor.register_expression(&expression)?)
            }
        };
        Ok(CachedVector::new(VectorSource::Four(Self {
            name,
            pt: cursor.register_expression(pt)?,
            eta: cursor.register_expression(eta)?,
            phi: cursor.register_expression(phi)?,
            mass,
        })))
    }

    fn value(&self) -> Vec4 {
        Vec4::from_pt_eta_phi_m(
            self.pt.get(),
            self.eta.get(),
            self.phi.get(),
            self.mass.get(),
        )
    }
}

/// An input transverse-only momentum (typically missing transverse energy)
/// read from `(et, phi)` fields with an optional `pt` field and an optional
/// validity expression.
#[derive(Clone, Debug)]
pub struct TransverseVector {
    name: String,
    et: ExprCell,
    phi: ExprCell,
    pt: Option<ExprCell>,
    valid: Option<ExprCell>,
}

impl TransverseVector {
    /// Register the field expressions of a transverse vector with `cursor`
    /// and wrap the result in a [`CachedVector`] leaf.
    ///
    /// Without a `pt` expression the vector is massless (`pt = et`). When
    /// `valid` is given, events where it evaluates to zero leave this vector
    /// (and everything derived from it) undefined. When `name` is `None` a
    /// display name is derived from the et expression by stripping a trailing
    /// `et`.
    pub fn register(
        cursor: &mut EventCursor,
        et: &str,
        phi: &str,
        pt: Option<&str>,
        valid: Option<&str>,
        name: Option<&str>,
    ) -> KinvarResult<Arc<CachedVector>> {
        let name = name
            .map(ToString::to_string)
            .unwrap_or_else(|| default_vector_name(et, "et"));
        Ok(CachedVector::new(VectorSource::Transverse(Self {
            name,
            et: cursor.register_expression(et)?,
            phi: cursor.register_expression(phi)?,
            pt: pt.map(|expression| cursor.register_expression(expression)).transpose()?,
            valid: valid
                .map(|expression| cursor.register_expression(expression))
                .transpose()?,
        })))
    }

    fn value(&self) -> Option<Vec2> {
        if let Some(valid) = &self.valid {
            if valid.get() == 0.0 {
                return None;
            }
        }
        Some(Vec2::from_phi_et_pt(
            self.phi.get(),
            self.et.get(),
            self.pt.as_ref().map(ExprCell::get),
        ))
    }
}

#[derive(Debug)]
enum VectorSource {
    Four(FourVector),
    Transverse(TransverseVector),
    Sum {
        parts: Vec<Arc<CachedVector>>,
        kind: VectorKind,
    },
}

/// A node of the vector dependency graph: an input leaf or a sum of earlier
/// nodes, with a per-event memo of its value.
///
/// Sums of four-vectors are four-vectors; a transverse vector can only appear
/// as a sum on its own, since adding it to anything would need the unknown
/// longitudinal components. An undefined part makes the whole sum undefined
/// for that event.
#[derive(Debug)]
pub struct CachedVector {
    source: VectorSource,
    slot: Memo<Option<Momentum>>,
    evaluations: AtomicUsize,
}

impl CachedVector {
    fn new(source: VectorSource) -> Arc<Self> {
        Arc::new(Self {
            source,
            slot: Memo::new(),
            evaluations: AtomicUsize::new(0),
        })
    }

    /// Create a sum node over `parts`.
    ///
    /// Fails with [`KinvarError::IncompatibleArguments`] unless the parts are
    /// all four-vector-typed or a single transverse vector.
    pub fn sum(parts: Vec<Arc<CachedVector>>) -> KinvarResult<Arc<Self>> {
        let kind = match parts.as_slice() {
            [] => return Err(KinvarError::IncompatibleArguments),
            [only] => only.kind(),
            rest => {
                if rest.iter().all(|p| p.kind() == VectorKind::FourVector) {
                    VectorKind::FourVector
                } else {
                    return Err(KinvarError::IncompatibleArguments);
                }
            }
        };
        Ok(Self::new(VectorSource::Sum { parts, kind }))
    }

    /// The vector kind this node produces.
    pub fn kind(&self) -> VectorKind {
        match &self.source {
            VectorSource::Four(_) => VectorKind::FourVector,
            VectorSource::Transverse(_) => VectorKind::Transverse,
            VectorSource::Sum { kind, .. } => *kind,
        }
    }

    /// The number of input vectors feeding this node (1 for a leaf).
    pub fn n_components(&self) -> usize {
        match &self.source {
            VectorSource::Sum { parts, .. } => parts.len(),
            _ => 1,
        }
    }

    /// The direct parents of this node (empty for a leaf).
    pub fn parents(&self) -> &[Arc<CachedVector>] {
        match &self.source {
            VectorSource::Sum { parts, .. } => parts,
            _ => &[],
        }
    }

    /// The per-event value, computed at most once per event no matter how
    /// many quantities share this node. `None` marks the value undefined for
    /// the current event.
    pub fn value(&self) -> Option<Momentum> {
        self.slot.get_or_compute(|| {
            self.evaluations.fetch_add(1, Ordering::Relaxed);
            self.compute()
        })
    }

    fn compute(&self) -> Option<Momentum> {
        match &self.source {
            VectorSource::Four(leaf) => Some(Momentum::Four(leaf.value())),
            VectorSource::Transverse(leaf) => leaf.value().map(Momentum::Transverse),
            VectorSource::Sum { parts, kind } => match kind {
                VectorKind::Transverse => parts[0].value(),
                VectorKind::FourVector => {
                    let mut total = Vec4::default();
                    for part in parts {
                        total = total + part.value()?.as_four()?;
                    }
                    Some(Momentum::Four(total))
                }
            },
        }
    }

    /// Mark this node (and, transitively, its parents) stale.
    ///
    /// Subgraphs that were never evaluated for the current event are skipped:
    /// a node can only be cached if its parents are, so clearing stops at the
    /// first stale node.
    pub fn invalidate(&self) {
        if self.slot.clear() {
            for parent in self.parents() {
                parent.invalidate();
            }
        }
    }

    /// How many times this node's value was actually computed (as opposed to
    /// served from the memo).
    #[cfg(test)]
    pub(crate) fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }
}

impl Display for CachedVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            VectorSource::Four(leaf) => write!(f, "{}", leaf.name),
            VectorSource::Transverse(leaf) => write!(f, "{}", leaf.name),
            VectorSource::Sum { parts, .. } => {
                let joined = parts
                    .iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<_>>()
                    .join(" + ");
                write!(f, "{joined}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use indexmap::IndexMap;

    use super::*;
    use crate::data::MemorySource;

    fn cursor() -> EventCursor {
        let mut columns = IndexMap::new();
        columns.insert("jet1Pt".to_string(), vec![30.0, 40.0]);
        columns.insert("jet1Eta".to_string(), vec![0.5, 0.6]);
        columns.insert("jet1Phi".to_string(), vec![1.0, 1.1]);
        columns.insert("jet1M".to_string(), vec![5.0, 6.0]);
        columns.insert("jet2Pt".to_string(), vec![50.0, 60.0]);
        columns.insert("jet2Eta".to_string(), vec![-0.5, -0.6]);
        columns.insert("jet2Phi".to_string(), vec![-2.0, -2.1]);
        columns.insert("metEt".to_string(), vec![25.0, 35.0]);
        columns.insert("metPhi".to_string(), vec![0.3, 0.4]);
        columns.insert("metValid".to_string(), vec![1.0, 0.0]);
        EventCursor::new(Box::new(MemorySource::new(columns).unwrap()), 10)
    }

    fn jet1(cursor: &mut EventCursor) -> Arc<CachedVector> {
        FourVector::register(
            cursor,
            "jet1Pt",
            "jet1Eta",
            "jet1Phi",
            MassDef::Expression("jet1M".to_string()),
            None,
        )
        .unwrap()
    }

    fn jet2(cursor: &mut EventCursor) -> Arc<CachedVector> {
        FourVector::register(
            cursor,
            "jet2Pt",
            "jet2Eta",
            "jet2Phi",
            MassDef::Constant(0.0),
            None,
        )
        .unwrap()
    }

    fn met(cursor: &mut EventCursor) -> Arc<CachedVector> {
        TransverseVector::register(cursor, "metEt", "metPhi", None, Some("metValid"), None)
            .unwrap()
    }

    #[test]
    fn leaf_values_follow_the_cursor() {
        let mut cursor = cursor();
        let jet = jet1(&mut cursor);
        assert_eq!(jet.kind(), VectorKind::FourVector);
        assert_eq!(jet.n_components(), 1);
        assert!(jet.parents().is_empty());
        assert_eq!(jet.to_string(), "jet1");

        cursor.seek(0).unwrap();
        let p = jet.value().unwrap().as_four().unwrap();
        assert_relative_eq!(p.pt(), 30.0, epsilon = 1e-12);
        assert_relative_eq!(p.m(), 5.0, epsilon = 1e-9);

        jet.invalidate();
        cursor.seek(1).unwrap();
        let p = jet.value().unwrap().as_four().unwrap();
        assert_relative_eq!(p.pt(), 40.0, epsilon = 1e-12);
        assert_relative_eq!(p.m(), 6.0, epsilon = 1e-9);
    }

    #[test]
    fn sum_kind_rules() {
        let mut cursor = cursor();
        let a = jet1(&mut cursor);
        let b = jet2(&mut cursor);
        let m = met(&mut cursor);

        let four_sum = CachedVector::sum(vec![a.clone(), b.clone()]).unwrap();
        assert_eq!(four_sum.kind(), VectorKind::FourVector);
        assert_eq!(four_sum.n_components(), 2);
        assert_eq!(four_sum.to_string(), "jet1 + jet2");

        let lone_met = CachedVector::sum(vec![m.clone()]).unwrap();
        assert_eq!(lone_met.kind(), VectorKind::Transverse);
        assert_eq!(lone_met.to_string(), "met");

        assert!(matches!(
            CachedVector::sum(vec![a.clone(), m.clone()]),
            Err(KinvarError::IncompatibleArguments)
        ));
        assert!(matches!(
            CachedVector::sum(vec![m.clone(), m]),
            Err(KinvarError::IncompatibleArguments)
        ));
        assert!(matches!(
            CachedVector::sum(vec![]),
            Err(KinvarError::IncompatibleArguments)
        ));
    }

    #[test]
    fn sum_adds_componentwise() {
        let mut cursor = cursor();
        let a = jet1(&mut cursor);
        let b = jet2(&mut cursor);
        let sum = CachedVector::sum(vec![a.clone(), b.clone()]).unwrap();
        cursor.seek(0).unwrap();
        let expected = a.value().unwrap().as_four().unwrap() + b.value().unwrap().as_four().unwrap();
        assert_eq!(sum.value().unwrap().as_four().unwrap(), expected);
    }

    #[test]
    fn invalid_transverse_vector_is_undefined() {
        let mut cursor = cursor();
        let m = met(&mut cursor);
        let lone = CachedVector::sum(vec![m]).unwrap();
        cursor.seek(0).unwrap();
        assert!(lone.value().is_some());
        lone.invalidate();
        cursor.seek(1).unwrap();
        assert!(lone.value().is_none());
    }

    #[test]
    fn shared_nodes_evaluate_once_per_event() {
        let mut cursor = cursor();
        let a = jet1(&mut cursor);
        let b = jet2(&mut cursor);
        let shared = CachedVector::sum(vec![a.clone(), b.clone()]).unwrap();
        let outer1 = CachedVector::sum(vec![shared.clone()]).unwrap();
        let outer2 = CachedVector::sum(vec![shared.clone()]).unwrap();

        cursor.seek(0).unwrap();
        outer1.value();
        outer2.value();
        assert_eq!(shared.evaluations(), 1);
        assert_eq!(a.evaluations(), 1);

        outer1.invalidate();
        outer2.invalidate();
        cursor.seek(1).unwrap();
        outer1.value();
        outer2.value();
        assert_eq!(shared.evaluations(), 2);
        assert_eq!(a.evaluations(), 2);
    }

    #[test]
    fn invalidation_of_stale_nodes_is_a_noop() {
        let mut cursor = cursor();
        let a = jet1(&mut cursor);
        let sum = CachedVector::sum(vec![a.clone()]).unwrap();
        // never evaluated, repeated invalidation must not recurse or panic
        sum.invalidate();
        sum.invalidate();
        cursor.seek(0).unwrap();
        sum.value();
        sum.invalidate();
        sum.invalidate();
        assert_eq!(a.evaluations(), 1);
    }
}
