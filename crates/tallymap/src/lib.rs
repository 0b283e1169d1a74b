//! Schema-checked grouping of keyed records into count/amount rollups.
//!
//! One [`aggregate::Aggregator`] owns an ordered field schema and a
//! mapping from key tuples to running totals; the rest of the crate is
//! the vocabulary it is built from and the sorted/CSV views over its
//! contents.
#![warn(unreachable_pub)]

pub mod aggregate;
pub mod error;
pub mod key;
pub mod schema;
pub mod total;
pub mod value;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, projections, or export helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        aggregate::{Aggregator, Direction, ValueOrder},
        key::Key,
        schema::FieldSchema,
        total::{Observation, Total},
        value::{Float64, Value},
    };
}
