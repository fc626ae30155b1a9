//! Shallow iteration primitives the traversals are built on.

use crate::arena::Table;
use crate::value::Key;

/// Keys of `table` in storage order (unspecified).
pub fn keys_of(table: &Table) -> impl Iterator<Item = &Key> {
    table.keys()
}

/// Sorts keys into the canonical total order (see [`Key`]).
pub fn sorted_keys<'a, I>(keys: I) -> Vec<Key>
where
    I: IntoIterator<Item = &'a Key>,
{
    let mut keys: Vec<Key> = keys.into_iter().cloned().collect();
    keys.sort_unstable();
    keys
}

/// True when the keys are exactly the integers `1..=n` for `n = len`.
pub fn is_array_shaped(table: &Table) -> bool {
    let n = table.len() as i64;
    // Keys are unique, so n keys all within 1..=n must be exactly 1..=n.
    table
        .keys()
        .all(|k| matches!(k.as_int(), Some(i) if (1..=n).contains(&i)))
}
