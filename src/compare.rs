//! Structural subset and equality between table graphs.
//!
//! A value in `a` matches its counterpart in `b` when the two are
//! primitively equal, which for tables means the same table; only distinct
//! tables are descended. There is no visited set beyond that: a table
//! compared against itself stops at the first identical edge, but two
//! distinct tables that are mutually cyclic recurse until the stack runs
//! out. Callers that may see such pairs should use a [`Comparator`] with a
//! depth limit.

use crate::arena::TableArena;
use crate::error::{Error, Result};
use crate::keys::sorted_keys;
use crate::value::Value;
use tracing::trace;

/// Comparison with an optional bound on nesting depth.
#[derive(Clone, Copy, Debug)]
pub struct Comparator<'a> {
    arena: &'a TableArena,
    max_depth: Option<usize>,
}

impl<'a> Comparator<'a> {
    pub fn new(arena: &'a TableArena) -> Self {
        Self {
            arena,
            max_depth: None,
        }
    }

    /// Fail with `DepthLimitExceeded` instead of descending into more than
    /// `limit` nested tables below the roots.
    ///
    /// Each level still takes a native stack frame, so the limit only helps
    /// while `limit` levels fit on the calling thread's stack. Keep it in
    /// the low thousands on default-sized threads.
    #[must_use]
    pub fn with_max_depth(mut self, limit: usize) -> Self {
        self.max_depth = Some(limit);
        self
    }

    /// True iff every entry of `a` is matched in `b` by a value of the same
    /// type that is primitively equal or, for tables, itself a superset.
    ///
    /// # Errors
    ///
    /// `DepthLimitExceeded` when a depth limit is set and reached.
    pub fn is_subset(&self, a: &Value, b: &Value) -> Result<bool> {
        self.subset(a, b, 0)
    }

    /// Mutual subset.
    ///
    /// # Errors
    ///
    /// `DepthLimitExceeded` when a depth limit is set and reached.
    pub fn deep_equal(&self, a: &Value, b: &Value) -> Result<bool> {
        Ok(self.subset(a, b, 0)? && self.subset(b, a, 0)?)
    }

    fn subset(&self, a: &Value, b: &Value, depth: usize) -> Result<bool> {
        let (Value::Table(a_id), Value::Table(b_id)) = (a, b) else {
            return Ok(false);
        };
        let (Some(at), Some(bt)) = (self.arena.table(*a_id), self.arena.table(*b_id)) else {
            return Ok(false);
        };
        if let Some(limit) = self.max_depth {
            if depth > limit {
                trace!(limit, "comparison depth limit reached");
                return Err(Error::DepthLimitExceeded { limit });
            }
        }

        for key in sorted_keys(at.keys()) {
            let av = at.get(&key).unwrap_or(&Value::Nil);
            let bv = bt.get(&key).unwrap_or(&Value::Nil);
            if av.type_name() != bv.type_name() {
                return Ok(false);
            }
            let matched = if av.raw_eq(bv) {
                true
            } else if av.is_table() {
                self.subset(av, bv, depth + 1)?
            } else {
                false
            };
            if !matched {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// [`Comparator::is_subset`] without a depth limit.
pub fn is_subset(arena: &TableArena, a: &Value, b: &Value) -> bool {
    matches!(Comparator::new(arena).is_subset(a, b), Ok(true))
}

/// [`Comparator::deep_equal`] without a depth limit.
pub fn deep_equal(arena: &TableArena, a: &Value, b: &Value) -> bool {
    matches!(Comparator::new(arena).deep_equal(a, b), Ok(true))
}

/// One-level equality: identical values, or two tables with the same key
/// count whose values are pairwise primitively or identity equal.
pub fn shallow_equal(arena: &TableArena, left: &Value, right: &Value) -> bool {
    if left.raw_eq(right) {
        return true;
    }
    let (Some(lt), Some(rt)) = (
        left.as_table().and_then(|id| arena.table(id)),
        right.as_table().and_then(|id| arena.table(id)),
    ) else {
        return false;
    };
    lt.len() == rt.len()
        && lt
            .iter()
            .all(|(k, v)| rt.get(k).is_some_and(|rv| v.raw_eq(rv)))
}
