//! Cycle-safe canonical serialization.
//!
//! Serialization runs in two passes over the graph below a root:
//! - a [`census`] finds tables reached through two or more edges
//!   ("ref-worthy"); only those can be revisited, so only those need a
//!   reference index;
//! - a second walk encodes each table as `{k:v,...}` with keys in
//!   canonical order. The first encoding of a ref-worthy table is prefixed
//!   with `<N>`; any later arrival at it emits `&N` and stops there.
//!
//! Array-shaped tables (keys exactly `1..=n`) omit their keys: `{1,2,3}`.
//!
//! Value and key rendering is delegated to a [`ValueSerializer`]. Each call
//! receives the [`CycleContext`] explicitly, so a serializer that wants to
//! descend into a nested table does so through [`CycleContext::visit`] and
//! shares the same reference numbering. Deep serialization descends nested
//! tables itself on an explicit stack; only leaves reach the serializer.

use crate::arena::{Table, TableArena, TableId};
use crate::census::{census, Census};
use crate::error::Result;
use crate::keys::{is_array_shaped, sorted_keys};
use crate::value::{Key, Value};
use hashbrown::HashMap;
use tracing::{debug, trace};

/// Renders one value (or key, passed as a value) to text.
pub trait ValueSerializer {
    fn serialize(&self, value: &Value, cx: &mut CycleContext<'_>) -> String;
}

impl<F> ValueSerializer for F
where
    F: Fn(&Value, &mut CycleContext<'_>) -> String,
{
    fn serialize(&self, value: &Value, cx: &mut CycleContext<'_>) -> String {
        self(value, cx)
    }
}

/// Leaf rendering for primitives. Tables and opaque values become an
/// identity tag such as `<table: 0x1>`, which is neither unique across
/// arenas nor cycle-aware.
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultSerializer;

impl DefaultSerializer {
    pub fn leaf(value: &Value) -> String {
        match value {
            Value::Nil => "nil".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Str(s) => quote(s),
            Value::Table(id) => format!("<{id}>"),
            Value::Opaque(o) => format!("<{o}>"),
        }
    }
}

impl ValueSerializer for DefaultSerializer {
    fn serialize(&self, value: &Value, _cx: &mut CycleContext<'_>) -> String {
        DefaultSerializer::leaf(value)
    }
}

// Always carries a `.` or exponent so 1.0 never encodes like the integer 1.
fn format_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        let s = if f > 0.0 { "inf" } else { "-inf" };
        s.to_string()
    } else {
        format!("{f:?}")
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// State for one top-level serialization: which tables are ref-worthy and
/// the indices assigned to them so far. Never outlives the call.
pub struct CycleContext<'a> {
    arena: &'a TableArena,
    ref_worthy: Census,
    indices: HashMap<TableId, usize>,
    next_index: usize,
}

impl<'a> CycleContext<'a> {
    pub(crate) fn new(arena: &'a TableArena, ref_worthy: Census) -> Self {
        Self {
            arena,
            ref_worthy,
            indices: HashMap::new(),
            next_index: 0,
        }
    }

    pub fn arena(&self) -> &'a TableArena {
        self.arena
    }

    pub fn is_ref_worthy(&self, id: TableId) -> bool {
        self.ref_worthy.contains(id)
    }

    /// Reference index already assigned to `id`, if any.
    pub fn index_of(&self, id: TableId) -> Option<usize> {
        self.indices.get(&id).copied()
    }

    /// Number of reference indices handed out so far.
    pub fn references(&self) -> usize {
        self.next_index
    }

    /// Encodes table `id`, or its backreference if it was already encoded.
    pub fn visit(
        &mut self,
        id: TableId,
        values: &dyn ValueSerializer,
        keys: &dyn ValueSerializer,
    ) -> String {
        let mut out = String::new();
        let Some(mut frame) = self.open(id, &mut out) else {
            return out;
        };
        while let Some(value) = self.next_entry(&mut frame, keys, &mut out) {
            out.push_str(&values.serialize(value, self));
        }
        out.push('}');
        out
    }

    /// Same encoding as [`visit`](Self::visit) with every nested table
    /// descended in place. Open tables live on an explicit stack, so the
    /// depth of the graph never touches the native stack.
    fn visit_deep(
        &mut self,
        id: TableId,
        leaf: &dyn ValueSerializer,
        keys: &dyn ValueSerializer,
    ) -> String {
        let mut out = String::new();
        let mut stack: Vec<Frame<'a>> = self.open(id, &mut out).into_iter().collect();
        while let Some(frame) = stack.last_mut() {
            match self.next_entry(frame, keys, &mut out) {
                Some(Value::Table(child)) => {
                    if let Some(child) = self.open(*child, &mut out) {
                        stack.push(child);
                    }
                }
                Some(other) => out.push_str(&leaf.serialize(other, self)),
                None => {
                    out.push('}');
                    stack.pop();
                }
            }
        }
        out
    }

    /// Writes the start of table `id` to `out`: its `<N>` definition and
    /// opening brace, or a complete `&N` / leaf tag when there is nothing
    /// to descend.
    fn open(&mut self, id: TableId, out: &mut String) -> Option<Frame<'a>> {
        let arena = self.arena;
        let Some(table) = arena.table(id) else {
            out.push_str(&DefaultSerializer::leaf(&Value::Table(id)));
            return None;
        };
        if self.is_ref_worthy(id) {
            if let Some(index) = self.index_of(id) {
                trace!(%id, index, "backreference");
                out.push_str(&format!("&{index}"));
                return None;
            }
            let index = self.next_index;
            self.next_index += 1;
            self.indices.insert(id, index);
            out.push_str(&format!("<{index}>"));
        }
        out.push('{');
        Some(Frame {
            table,
            keys: sorted_keys(table.keys()),
            next: 0,
            array: is_array_shaped(table),
        })
    }

    /// Writes the separator and key of the next entry of `frame` and hands
    /// back its value; `None` once the table is exhausted.
    fn next_entry(
        &mut self,
        frame: &mut Frame<'a>,
        keys: &dyn ValueSerializer,
        out: &mut String,
    ) -> Option<&'a Value> {
        let key = frame.keys.get(frame.next)?;
        let value = frame.table.get(key)?;
        if frame.next > 0 {
            out.push(',');
        }
        frame.next += 1;
        if !frame.array {
            out.push_str(&keys.serialize(&Value::from(key), self));
            out.push(':');
        }
        Some(value)
    }
}

/// A table whose encoding is in progress.
struct Frame<'t> {
    table: &'t Table,
    keys: Vec<Key>,
    next: usize,
    array: bool,
}

/// Configurable entry point. Both serializers default to [`DefaultSerializer`].
pub struct Canonicalizer<'a> {
    arena: &'a TableArena,
    values: Box<dyn ValueSerializer + 'a>,
    keys: Box<dyn ValueSerializer + 'a>,
}

impl<'a> Canonicalizer<'a> {
    pub fn new(arena: &'a TableArena) -> Self {
        Self {
            arena,
            values: Box::new(DefaultSerializer),
            keys: Box::new(DefaultSerializer),
        }
    }

    #[must_use]
    pub fn with_value_serializer(mut self, values: impl ValueSerializer + 'a) -> Self {
        self.values = Box::new(values);
        self
    }

    #[must_use]
    pub fn with_key_serializer(mut self, keys: impl ValueSerializer + 'a) -> Self {
        self.keys = Box::new(keys);
        self
    }

    /// Encodes the root table; nested tables are left to the value
    /// serializer (by default an identity tag).
    ///
    /// # Errors
    ///
    /// `BadInput` when `root` is not a table of the arena.
    pub fn serialize(&self, root: &Value) -> Result<String> {
        let (mut cx, id) = self.context(root)?;
        let out = cx.visit(id, self.values.as_ref(), self.keys.as_ref());
        debug!(root = %id, len = out.len(), references = cx.references(), "serialized");
        Ok(out)
    }

    /// Encodes the root and every nested table with one shared reference
    /// numbering; the value serializer only sees non-table values.
    ///
    /// # Errors
    ///
    /// `BadInput` when `root` is not a table of the arena.
    pub fn serialize_deep(&self, root: &Value) -> Result<String> {
        let (mut cx, id) = self.context(root)?;
        let out = cx.visit_deep(id, self.values.as_ref(), self.keys.as_ref());
        debug!(root = %id, len = out.len(), references = cx.references(), "serialized deep");
        Ok(out)
    }

    fn context(&self, root: &Value) -> Result<(CycleContext<'a>, TableId)> {
        let id = self.arena.expect_table(root)?;
        let ref_worthy = census(self.arena, root)?.ref_worthy();
        Ok((CycleContext::new(self.arena, ref_worthy), id))
    }
}

/// [`Canonicalizer::serialize`] with default serializers.
pub fn serialize(arena: &TableArena, root: &Value) -> Result<String> {
    Canonicalizer::new(arena).serialize(root)
}

/// [`Canonicalizer::serialize_deep`] with default serializers.
pub fn serialize_deep(arena: &TableArena, root: &Value) -> Result<String> {
    Canonicalizer::new(arena).serialize_deep(root)
}

/// Canonical text for any value, usable as an equality or grouping key:
/// tables are deep-serialized, anything else gets its leaf encoding.
pub fn canonical_key(arena: &TableArena, value: &Value) -> String {
    match serialize_deep(arena, value) {
        Ok(s) => s,
        Err(_) => DefaultSerializer::leaf(value),
    }
}
