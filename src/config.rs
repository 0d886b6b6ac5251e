use serde::{Deserialize, Serialize};

use crate::builder::VariableBuilder;
use crate::data::{EventCursor, EventSource};
use crate::processor::Processor;
use crate::utils::enums::Collider;
use crate::vectors::{FourVector, MassDef, TransverseVector};
use crate::KinvarResult;

/// Field expressions of one input four-vector.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FourVectorDef {
    /// Expression for the transverse momentum.
    pub pt: String,
    /// Expression for the pseudorapidity.
    pub eta: String,
    /// Expression for the azimuthal angle.
    pub phi: String,
    /// The mass, a constant (default 0) or a per-event expression.
    #[serde(default)]
    pub mass: MassDef,
    /// An explicit display name (derived from the pt expression otherwise).
    #[serde(default)]
    pub name: Option<String>,
}

/// Field expressions of one input transverse vector.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransverseVectorDef {
    /// Expression for the transverse energy.
    pub et: String,
    /// Expression for the azimuthal angle.
    pub phi: String,
    /// Expression for the transverse momentum (massless when omitted).
    #[serde(default)]
    pub pt: Option<String>,
    /// Expression marking the vector valid (nonzero) or undefined (zero) per
    /// event.
    #[serde(default)]
    pub valid: Option<String>,
    /// An explicit display name (derived from the et expression otherwise).
    #[serde(default)]
    pub name: Option<String>,
}

/// One input vector of either kind.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VectorDef {
    /// A full four-momentum.
    Four(FourVectorDef),
    /// A transverse-only momentum.
    Transverse(TransverseVectorDef),
}

/// A passthrough expression copied into the output unchanged.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpectatorDef {
    /// The expression to read from the event source.
    pub expression: String,
    /// The output column name (the expression itself when omitted).
    #[serde(default)]
    pub alias: Option<String>,
}

fn default_sentinel() -> f64 {
    f64::NAN
}

fn default_batch_size() -> usize {
    10000
}

/// The full configuration of a scan: input vectors, the collider flag
/// selecting the default function set, spectators, the sentinel written for
/// undefined values, and the cursor batch size.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScanConfig {
    /// The input vectors in order.
    pub vectors: Vec<VectorDef>,
    /// The collider type.
    pub collider: Collider,
    /// Passthrough expressions.
    #[serde(default)]
    pub spectators: Vec<SpectatorDef>,
    /// The value written for undefined results (NaN by default).
    #[serde(default = "default_sentinel")]
    pub sentinel: f64,
    /// How many events each bulk read covers.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl ScanConfig {
    /// Set up a cursor over `source`, register every configured vector, and
    /// build the processor with its catalog.
    pub fn into_processor(
        self,
        source: Box<dyn EventSource>,
    ) -> KinvarResult<(EventCursor, Processor)> {
        let mut cursor = EventCursor::new(source, self.batch_size);
        let mut inputs = Vec::with_capacity(self.vectors.len());
        for vector in &self.vectors {
            inputs.push(match vector {
                VectorDef::Four(def) => FourVector::register(
                    &mut cursor,
                    &def.pt,
                    &def.eta,
                    &def.phi,
                    def.mass.clone(),
                    def.name.as_deref(),
                )?,
                VectorDef::Transverse(def) => TransverseVector::register(
                    &mut cursor,
                    &def.et,
                    &def.phi,
                    def.pt.as_deref(),
                    def.valid.as_deref(),
                    def.name.as_deref(),
                )?,
            });
        }
        let builder = VariableBuilder::new(inputs, self.collider)?;
        let mut processor = Processor::new(builder).with_sentinel(self.sentinel);
        for spectator in &self.spectators {
            processor.add_spectator(&spectator.expression, spectator.alias.as_deref());
        }
        Ok((cursor, processor))
    }
}
