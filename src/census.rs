//! Occurrence census: how many parent edges reach each table from a root.
//!
//! A table is descended at most once; every later edge to it only bumps its
//! count. That alone guarantees termination on cyclic graphs and makes each
//! container-to-container edge inspected exactly once.

use crate::arena::{TableArena, TableId};
use crate::error::Result;
use crate::value::Value;
use hashbrown::HashMap;
use tracing::debug;

/// Per-root mapping from table identity to occurrence count.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Census {
    counts: HashMap<TableId, usize>,
}

impl Census {
    /// Occurrence count of `id`; zero when unreachable from the root.
    pub fn count(&self, id: TableId) -> usize {
        self.counts.get(&id).copied().unwrap_or(0)
    }

    pub fn contains(&self, id: TableId) -> bool {
        self.counts.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TableId, usize)> + '_ {
        self.counts.iter().map(|(id, n)| (*id, *n))
    }

    /// Keeps only tables reached through two or more edges.
    pub fn ref_worthy(mut self) -> Census {
        self.counts.retain(|_, n| *n >= 2);
        self
    }
}

/// Counts, for every table reachable from `root`, the edges that reach it.
/// The root starts at 1.
///
/// # Errors
///
/// `BadInput` when `root` is not a table of `arena`.
pub fn census(arena: &TableArena, root: &Value) -> Result<Census> {
    let root = arena.expect_table(root)?;
    let mut counts = HashMap::new();
    counts.insert(root, 1usize);

    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let Some(table) = arena.table(id) else {
            continue;
        };
        for child in table.iter().filter_map(|(_, v)| v.as_table()) {
            match counts.get_mut(&child) {
                Some(n) => *n += 1,
                None => {
                    counts.insert(child, 1);
                    stack.push(child);
                }
            }
        }
    }

    let census = Census { counts };
    debug!(
        %root,
        tables = census.len(),
        shared = census.iter().filter(|(_, n)| *n >= 2).count(),
        "census complete"
    );
    Ok(census)
}

/// Alias of [`census`].
pub fn occurrences(arena: &TableArena, root: &Value) -> Result<Census> {
    census(arena, root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    /// Invariant: each table reached through a single edge counts once.
    #[test]
    fn tree_counts_are_one() {
        let mut arena = TableArena::new();
        let pie = arena.array([Value::from("stilton"), Value::from("beef")]);
        let outer = arena.record([("veg", Value::from("potato")), ("pie", Value::Table(pie))]);

        let c = occurrences(&arena, &Value::Table(outer)).unwrap();
        assert_eq!(c.len(), 2);
        assert_eq!(c.count(outer), 1);
        assert_eq!(c.count(pie), 1);
    }

    /// Invariant: a self-loop terminates and gives the root a count of 2.
    #[test]
    fn self_cycle_terminates() {
        let mut arena = TableArena::new();
        let k = arena.create();
        arena.set(k, "self", Value::Table(k)).unwrap();
        let c = census(&arena, &Value::Table(k)).unwrap();
        assert_eq!(c.count(k), 2);
        assert_eq!(c.len(), 1);
    }

    /// Invariant: a table shared by two parents counts 2 and is descended once.
    #[test]
    fn shared_child_counts_each_edge() {
        let mut arena = TableArena::new();
        let leaf = arena.create();
        let shared = arena.record([("leaf", Value::Table(leaf))]);
        let root = arena.record([("a", Value::Table(shared)), ("b", Value::Table(shared))]);
        let c = census(&arena, &Value::Table(root)).unwrap();
        assert_eq!(c.count(shared), 2);
        assert_eq!(c.count(leaf), 1);

        let worthy = c.ref_worthy();
        assert_eq!(worthy.len(), 1);
        assert!(worthy.contains(shared));
    }

    #[test]
    fn unreachable_tables_are_absent() {
        let mut arena = TableArena::new();
        let stray = arena.create();
        let root = arena.create();
        let c = census(&arena, &Value::Table(root)).unwrap();
        assert!(!c.contains(stray));
        assert_eq!(c.count(stray), 0);
    }

    #[test]
    fn non_table_root_is_bad_input() {
        let arena = TableArena::new();
        let err = census(&arena, &Value::from("nope")).unwrap_err();
        assert_eq!(
            err,
            Error::BadInput {
                expected: "table",
                found: "string".to_string()
            }
        );
    }
}
