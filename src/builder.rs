use std::sync::Arc;

use indexmap::IndexMap;

use crate::partitions::groupings;
use crate::quantities::{default_functions, CachedQuantity, FunctionEntry};
use crate::utils::enums::Collider;
use crate::vectors::CachedVector;
use crate::{KinvarError, KinvarResult};

/// One generated output variable: a positional column name, a human-readable
/// label describing the function and its arguments, and the cached quantity
/// node itself.
pub struct CatalogEntry {
    /// The positional output column name (`out00`, `out01`, ...).
    pub name: String,
    /// A label like `Mass(jet1 + jet2)` describing what the column holds.
    pub label: String,
    /// The cached function node producing the column's per-event values.
    pub quantity: CachedQuantity,
}

/// Builds the full catalog of derived variables from a list of input vectors.
///
/// For every function in the set, the builder queries its admissible
/// arities, enumerates every disjoint grouping of the inputs with that many
/// groups, turns each group into a (shared) cached vector sum, and attempts
/// to construct the function over each grouping's sums. Groupings a function
/// cannot operate on are skipped silently; everything else lands in the
/// catalog with a stable positional name.
///
/// Sum nodes are shared by their component set, so two catalog entries over
/// the same group reuse one node and its per-event cache.
pub struct VariableBuilder {
    inputs: Vec<Arc<CachedVector>>,
    catalog: Vec<CatalogEntry>,
}

impl VariableBuilder {
    /// Build the catalog using the default function set for `collider`.
    pub fn new(inputs: Vec<Arc<CachedVector>>, collider: Collider) -> KinvarResult<Self> {
        Self::with_functions(inputs, default_functions(collider))
    }

    /// Build the catalog from an explicit function set.
    pub fn with_functions(
        inputs: Vec<Arc<CachedVector>>,
        functions: Vec<&'static FunctionEntry>,
    ) -> KinvarResult<Self> {
        let mut sum_nodes: IndexMap<Vec<usize>, Arc<CachedVector>> = IndexMap::new();
        let mut lines_by_arity: IndexMap<usize, Vec<Vec<Arc<CachedVector>>>> = IndexMap::new();
        let mut catalog: Vec<CatalogEntry> = Vec::new();

        for function in functions {
            for arity in (function.arities)(inputs.len()) {
                if !lines_by_arity.contains_key(&arity) {
                    let lines = candidate_lines(&inputs, arity, &mut sum_nodes);
                    lines_by_arity.insert(arity, lines);
                }
                for line in &lines_by_arity[&arity] {
                    match (function.construct)(line.clone()) {
                        Ok(quantity) => {
                            let label = quantity.to_string();
                            catalog.push(CatalogEntry {
                                name: format!("out{:02}", catalog.len()),
                                label,
                                quantity: CachedQuantity::new(quantity),
                            });
                        }
                        Err(KinvarError::IncompatibleArguments) => {}
                        Err(error) => return Err(error),
                    }
                }
            }
        }

        Ok(Self { inputs, catalog })
    }

    /// The input vectors the catalog was built from.
    pub fn inputs(&self) -> &[Arc<CachedVector>] {
        &self.inputs
    }

    /// The generated variables in output order.
    pub fn catalog(&self) -> &[CatalogEntry] {
        &self.catalog
    }

    /// The number of generated variables.
    pub fn n_variables(&self) -> usize {
        self.catalog.len()
    }

    /// The positional output column names in order.
    pub fn names(&self) -> Vec<String> {
        self.catalog.iter().map(|entry| entry.name.clone()).collect()
    }

    /// Mark every catalog entry (and, transitively, the shared vector sums
    /// and input leaves) stale, to be called once per event before reading.
    pub fn invalidate_all(&self) {
        for entry in &self.catalog {
            entry.quantity.invalidate();
        }
    }
}

/// Enumerate the candidate argument lists of one arity: every disjoint
/// grouping of the inputs into `arity` groups, with each group replaced by
/// its (shared) sum node. Groupings containing a group that cannot form a
/// sum (a transverse vector mixed with anything else) are dropped.
fn candidate_lines(
    inputs: &[Arc<CachedVector>],
    arity: usize,
    sum_nodes: &mut IndexMap<Vec<usize>, Arc<CachedVector>>,
) -> Vec<Vec<Arc<CachedVector>>> {
    groupings(inputs.len(), arity)
        .into_iter()
        .filter_map(|grouping| {
            grouping
                .into_iter()
                .map(|block| {
                    if let Some(node) = sum_nodes.get(&block) {
                        return Some(node.clone());
                    }
                    let parts = block.iter().map(|&i| inputs[i].clone()).collect();
                    let node = CachedVector::sum(parts).ok()?;
                    sum_nodes.insert(block, node.clone());
                    Some(node)
                })
                .collect()
        })
        .collect()
}
