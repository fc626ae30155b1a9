//! table-canon: census, canonical encoding, and structural comparison of
//! nested key/value tables that may share subtables or contain cycles.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: turn an arbitrary table graph into a deterministic string and
//!   compare graphs structurally, without looping forever on cycles.
//! - Layers:
//!   - TableArena: owns every table and hands out `TableId` handles
//!     (slotmap generational keys). Identity is the handle, never the
//!     contents.
//!   - census: one walk from a root counting the parent edges that reach
//!     each table; a table is descended once, later edges only count.
//!   - serialize: marks tables counted twice or more as ref-worthy, then
//!     encodes the graph with keys in canonical order, defining `<N>` on
//!     the first visit of a ref-worthy table and emitting `&N` afterwards.
//!   - compare: subset / deep / shallow equality by structural recursion.
//!
//! Constraints
//! - Read-only over the arena; every call allocates its own state.
//! - Deterministic: storage order of a table is never observable; keys
//!   are always sorted (strings, then integers, then booleans).
//! - Census and deep serialization terminate on any finite graph and keep
//!   their traversal on the heap, so depth is bounded by memory only.
//! - Subset and deep equality skip identical tables, so comparing a graph
//!   with itself terminates. Two distinct, mutually cyclic tables still
//!   recurse without end; bound those with `Comparator::with_max_depth`.
//!
//! Notes and non-goals
//! - No deserializer: the encoding is canonical, not reversible.
//! - No pretty printer and no schema checking.
//! - The library logs through `tracing` and never installs a subscriber.

pub mod arena;
pub mod census;
mod census_proptest;
pub mod compare;
pub mod error;
pub mod keys;
pub mod serialize;
pub mod value;

// Public surface
pub use arena::{Table, TableArena, TableId};
pub use census::{census, occurrences, Census};
pub use compare::{deep_equal, is_subset, shallow_equal, Comparator};
pub use error::{Error, Result};
pub use keys::{is_array_shaped, keys_of, sorted_keys};
pub use serialize::{
    canonical_key, serialize, serialize_deep, Canonicalizer, CycleContext, DefaultSerializer,
    ValueSerializer,
};
pub use value::{Key, Opaque, Value};
