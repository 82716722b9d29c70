//! Field capability checks, resolved once per operation.

use serde::Serialize;
use std::collections::HashMap;

/// Position of a field within every [`Record`](super::Record) of a store.
///
/// Obtained only through [`Schema::field`], so holding one proves the field
/// exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldId(usize);

impl FieldId {
    pub(crate) const fn index(self) -> usize {
        self.0
    }
}

/// Ordered field names of a record store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Schema {
    names: Vec<String>,
    #[serde(skip)]
    positions: HashMap<String, usize>,
}

impl Schema {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut schema = Self::default();
        for name in names {
            schema.intern(name.into());
        }
        schema
    }

    /// Register a field name, returning its id. Existing names keep their id.
    pub(crate) fn intern(&mut self, name: String) -> FieldId {
        if let Some(&pos) = self.positions.get(&name) {
            return FieldId(pos);
        }
        let pos = self.names.len();
        self.positions.insert(name.clone(), pos);
        self.names.push(name);
        FieldId(pos)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    /// Typed optional lookup. `None` means the field is not available and
    /// the caller should degrade instead of failing.
    pub fn field(&self, name: &str) -> Option<FieldId> {
        self.positions.get(name).copied().map(FieldId)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names from `wanted` that this schema does not provide.
    pub fn missing<'a>(&self, wanted: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        wanted
            .into_iter()
            .filter(|name| !self.has_field(name))
            .map(str::to_string)
            .collect()
    }
}
