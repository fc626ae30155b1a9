//! TableArena: owner of every table, handing out stable identity handles.
//!
//! Tables refer to each other through `Value::Table(TableId)`, so a graph
//! may be cyclic or share subtables freely. A `TableId` is the table's
//! identity: two tables with equal contents still have distinct ids.

use crate::error::{Error, Result};
use crate::value::{Key, Value};
use core::fmt;
use hashbrown::HashMap;
use slotmap::{DefaultKey, Key as _, SlotMap};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct TableId(DefaultKey);

impl TableId {
    pub fn get<'a>(&self, arena: &'a TableArena) -> Option<&'a Table> {
        arena.table(*self)
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table: 0x{:x}", self.0.data().as_ffi())
    }
}

/// Unordered key/value storage of a single table. Nil is never stored.
#[derive(Clone, Debug, Default)]
pub struct Table {
    entries: HashMap<Key, Value>,
}

impl Table {
    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in storage order, which is unspecified.
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.keys()
    }

    fn set(&mut self, key: Key, value: Value) -> Option<Value> {
        if value.is_nil() {
            self.entries.remove(&key)
        } else {
            self.entries.insert(key, value)
        }
    }
}

#[derive(Debug, Default)]
pub struct TableArena {
    slots: SlotMap<DefaultKey, Table>, // storage using generational keys
}

impl TableArena {
    pub fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: SlotMap::with_capacity_and_key(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Allocates an empty table.
    pub fn create(&mut self) -> TableId {
        TableId(self.slots.insert(Table::default()))
    }

    /// Allocates an array-shaped table holding `values` at keys `1..=n`.
    /// Nil items leave a gap, as assigning nil would.
    pub fn array<I>(&mut self, values: I) -> TableId
    where
        I: IntoIterator<Item = Value>,
    {
        let mut table = Table::default();
        for (i, v) in values.into_iter().enumerate() {
            table.set(Key::Int(i as i64 + 1), v);
        }
        TableId(self.slots.insert(table))
    }

    /// Allocates a table from key/value pairs; later pairs overwrite earlier ones.
    pub fn record<K, I>(&mut self, pairs: I) -> TableId
    where
        K: Into<Key>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut table = Table::default();
        for (k, v) in pairs {
            table.set(k.into(), v);
        }
        TableId(self.slots.insert(table))
    }

    /// Assigns `table[key] = value`, returning the previous value.
    /// Assigning `Value::Nil` removes the key.
    pub fn set(&mut self, id: TableId, key: impl Into<Key>, value: Value) -> Result<Option<Value>> {
        let table = self
            .slots
            .get_mut(id.0)
            .ok_or_else(|| Error::bad_input("table", format!("unknown {id}")))?;
        Ok(table.set(key.into(), value))
    }

    pub fn get(&self, id: TableId, key: &Key) -> Option<&Value> {
        self.table(id)?.get(key)
    }

    pub fn table(&self, id: TableId) -> Option<&Table> {
        self.slots.get(id.0)
    }

    pub fn contains(&self, id: TableId) -> bool {
        self.slots.contains_key(id.0)
    }

    /// Resolves a value that must be a table of this arena.
    pub(crate) fn expect_table(&self, value: &Value) -> Result<TableId> {
        match value {
            Value::Table(id) if self.contains(*id) => Ok(*id),
            Value::Table(id) => Err(Error::bad_input("table", format!("unknown {id}"))),
            other => Err(Error::bad_input("table", other.type_name())),
        }
    }

    /// Copies one level: nested tables are shared with the source.
    pub fn shallow_clone(&mut self, id: TableId) -> Result<TableId> {
        let copy = self
            .table(id)
            .cloned()
            .ok_or_else(|| Error::bad_input("table", format!("unknown {id}")))?;
        Ok(TableId(self.slots.insert(copy)))
    }

    /// Copies every table reachable from `id`. Sharing and cycles in the
    /// source are reproduced among the copies.
    pub fn deep_clone(&mut self, id: TableId) -> Result<TableId> {
        if !self.contains(id) {
            return Err(Error::bad_input("table", format!("unknown {id}")));
        }
        let mut copies: HashMap<TableId, TableId> = HashMap::new();
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            if copies.contains_key(&cur) {
                continue;
            }
            copies.insert(cur, self.create());
            order.push(cur);
            if let Some(table) = self.table(cur) {
                stack.extend(table.entries.values().filter_map(Value::as_table));
            }
        }
        for old in order {
            let Some(table) = self.table(old) else { continue };
            let entries: Vec<(Key, Value)> = table
                .iter()
                .map(|(k, v)| {
                    let v = match v {
                        Value::Table(t) => Value::Table(copies.get(t).copied().unwrap_or(*t)),
                        other => other.clone(),
                    };
                    (k.clone(), v)
                })
                .collect();
            if let Some(new) = copies.get(&old).and_then(|n| self.slots.get_mut(n.0)) {
                new.entries.extend(entries);
            }
        }
        Ok(copies[&id])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: assigning nil removes the key instead of storing it.
    #[test]
    fn nil_assignment_removes() {
        let mut arena = TableArena::new();
        let t = arena.record([("a", Value::Int(1))]);
        assert_eq!(arena.set(t, "a", Value::Nil).unwrap(), Some(Value::Int(1)));
        assert!(t.get(&arena).unwrap().is_empty());
    }

    /// Invariant: `array` keys values from 1 with no gaps.
    #[test]
    fn array_keys_start_at_one() {
        let mut arena = TableArena::new();
        let t = arena.array([Value::from("x"), Value::from("y")]);
        assert_eq!(arena.get(t, &Key::Int(1)), Some(&Value::from("x")));
        assert_eq!(arena.get(t, &Key::Int(2)), Some(&Value::from("y")));
        assert_eq!(arena.get(t, &Key::Int(0)), None);
    }

    /// Invariant: identical contents do not make identical tables.
    #[test]
    fn identity_is_not_content() {
        let mut arena = TableArena::new();
        let a = arena.create();
        let b = arena.create();
        assert_ne!(a, b);
        assert_ne!(a.to_string(), b.to_string());
        assert!(a.to_string().starts_with("table: 0x"));
    }

    /// Invariant: shallow clones share nested tables; deep clones do not.
    #[test]
    fn shallow_and_deep_clone() {
        let mut arena = TableArena::new();
        let inner = arena.array([Value::Int(1)]);
        let outer = arena.record([("inner", Value::Table(inner))]);

        let shallow = arena.shallow_clone(outer).unwrap();
        assert_eq!(arena.get(shallow, &Key::from("inner")), Some(&Value::Table(inner)));

        let deep = arena.deep_clone(outer).unwrap();
        let copied = arena.get(deep, &Key::from("inner")).and_then(Value::as_table).unwrap();
        assert_ne!(copied, inner);
        assert_eq!(arena.get(copied, &Key::Int(1)), Some(&Value::Int(1)));
    }

    /// Invariant: deep_clone reproduces a self-reference as a self-reference.
    #[test]
    fn deep_clone_preserves_cycles() {
        let mut arena = TableArena::new();
        let k = arena.create();
        arena.set(k, "self", Value::Table(k)).unwrap();
        let copy = arena.deep_clone(k).unwrap();
        assert_ne!(copy, k);
        assert_eq!(arena.get(copy, &Key::from("self")), Some(&Value::Table(copy)));
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn foreign_ids_are_bad_input() {
        let mut other = TableArena::new();
        let _ = other.create();
        let foreign = other.create();
        let mut arena = TableArena::new();
        assert!(matches!(
            arena.set(foreign, "k", Value::Int(1)),
            Err(Error::BadInput { .. })
        ));
        assert!(arena.expect_table(&Value::Int(3)).is_err());
    }
}
