//! # kinvar
//!
//! `kinvar` builds derived scalar kinematic variables from a configured set of
//! per-event momentum vectors and evaluates all of them lazily over large
//! event samples.
//!
//! Given a list of input vectors (full four-momenta or transverse-only
//! vectors read from named columns of an event store), the
//! [`VariableBuilder`] enumerates every way the inputs can be grouped into
//! disjoint vector sums, applies each registered [`Quantity`] function to
//! every grouping whose arity and vector kinds it accepts, and wraps all of
//! the resulting nodes in a per-event cache so that shared sub-sums are
//! computed at most once per event. The [`Processor`] then drives the
//! [`EventCursor`] through the sample, invalidating and re-reading the whole
//! catalog once per event and handing each output row to an [`EventSink`].
//!
//! ```no_run
//! use kinvar::{
//!     Collider, EventCursor, FourVector, MassDef, MemorySink, ParquetSource, Processor,
//!     VariableBuilder,
//! };
//!
//! fn main() -> kinvar::KinvarResult<()> {
//!     let source = ParquetSource::open("events.parquet")?;
//!     let mut cursor = EventCursor::new(Box::new(source), 10000);
//!     let inputs = vec![
//!         FourVector::register(&mut cursor, "jet1Pt", "jet1Eta", "jet1Phi", MassDef::Constant(0.0), None)?,
//!         FourVector::register(&mut cursor, "jet2Pt", "jet2Eta", "jet2Phi", MassDef::Constant(0.0), None)?,
//!     ];
//!     let builder = VariableBuilder::new(inputs, Collider::Hadron)?;
//!     let mut sink = MemorySink::default();
//!     Processor::new(builder).process(&mut cursor, &mut sink, 0, None)?;
//!     Ok(())
//! }
//! ```
#![warn(clippy::perf, clippy::style)]

use thiserror::Error;

/// The catalog builder which pairs grouping enumeration with function application.
pub mod builder;
/// Methods for reading expression values from an event store in batches.
pub mod data;
/// Enumeration of set partitions and disjoint groupings of the input vectors.
pub mod partitions;
/// The per-event driver loop and output sinks.
pub mod processor;
/// [`Quantity`] functions over (sums of) vectors and their static registry.
pub mod quantities;
/// Utility functions, enums, and momentum value types.
pub mod utils;
/// Input vector leaves, vector sums, and the cached vector graph.
pub mod vectors;

/// Serde-friendly configuration surface for a full scan.
pub mod config;

pub(crate) mod cache;

pub use crate::builder::{CatalogEntry, VariableBuilder};
pub use crate::config::{
    FourVectorDef, ScanConfig, SpectatorDef, TransverseVectorDef, VectorDef,
};
pub use crate::data::{io::ParquetSource, EventCursor, EventSource, ExprCell, MemorySource};
pub use crate::partitions::{groupings, partitions};
pub use crate::processor::{EventSink, MemorySink, Processor};
pub use crate::quantities::{default_functions, CachedQuantity, FunctionEntry, Quantity, FUNCTIONS};
pub use crate::utils::enums::{Collider, VectorKind};
pub use crate::utils::vectors::{Momentum, Vec2, Vec4};
pub use crate::vectors::{CachedVector, FourVector, MassDef, TransverseVector};

pub use crate::data::io::ParquetSink;

/// Shorthand for a [`Result`] using [`KinvarError`].
pub type KinvarResult<T> = Result<T, KinvarError>;

/// The error type used by all `kinvar` internal methods.
#[derive(Error, Debug)]
pub enum KinvarError {
    /// An alias for [`std::io::Error`].
    #[error("IO Error: {0}")]
    IOError(#[from] std::io::Error),
    /// An alias for [`parquet::errors::ParquetError`].
    #[error("Parquet Error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),
    /// An alias for [`arrow::error::ArrowError`].
    #[error("Arrow Error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),
    /// An alias for [`shellexpand::LookupError`].
    #[error("Failed to expand path: {0}")]
    LookupError(#[from] shellexpand::LookupError<std::env::VarError>),
    /// Raised by a function or vector-sum constructor handed vector kinds it
    /// cannot operate on. The [`VariableBuilder`] catches this per candidate
    /// assignment and drops that assignment from the catalog.
    #[error("This function cannot be applied to the given combination of vector kinds!")]
    IncompatibleArguments,
    /// An error which occurs when two output columns would share a name.
    #[error("An output variable by the name \"{name}\" already exists in this catalog!")]
    DuplicateName {
        /// Name of the clashing output column.
        name: String,
    },
    /// An error which occurs when an expression does not resolve to a column
    /// of the underlying event source.
    #[error("No column named \"{name}\" in the event source!")]
    ColumnNotFound {
        /// The expression which failed lookup.
        name: String,
    },
    /// An error which occurs when the user tries to parse an invalid string of
    /// text, typically into an enum variant.
    #[error("Failed to parse string: \"{name}\" does not correspond to a valid \"{object}\"!")]
    ParseError {
        /// The string which was parsed.
        name: String,
        /// The name of the object it failed to parse into.
        object: String,
    },
    /// A custom fallback error for errors too complex or too infrequent to
    /// warrant their own error category.
    #[error("{0}")]
    Custom(String),
}
