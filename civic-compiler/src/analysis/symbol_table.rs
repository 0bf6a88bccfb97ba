//! Leveled lexical scope table.
//!
//! One [`Scope`] per static nesting level, stacked. Re-entering a level after
//! a sibling scope finished reuses the cleared table: the nesting level, not
//! the scope identity, is the addressing unit the code generator consumes
//! later.

use crate::ast::{ArrayDim, NodeId, Type};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
}

#[derive(Debug, Clone)]
pub struct Record {
    pub kind: SymbolKind,
    pub immutable: bool,
    pub initialized: bool,
    pub ty: Type,
    /// Arena index of the declaring node.
    pub dec: NodeId,
    /// Parameter types, for function records.
    pub params: Vec<Type>,
    /// Declared array dimensions, for array variables.
    pub dims: Vec<ArrayDim>,
}

impl Record {
    pub fn variable(ty: Type, dec: NodeId) -> Self {
        Self {
            kind: SymbolKind::Variable,
            immutable: false,
            initialized: false,
            ty,
            dec,
            params: Vec::new(),
            dims: Vec::new(),
        }
    }

    pub fn function(ty: Type, params: Vec<Type>, dec: NodeId) -> Self {
        Self {
            kind: SymbolKind::Function,
            immutable: false,
            initialized: false,
            ty,
            dec,
            params,
            dims: Vec::new(),
        }
    }

    pub fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    pub fn with_dims(mut self, dims: Vec<ArrayDim>) -> Self {
        self.dims = dims;
        self
    }

    pub fn is_array(&self) -> bool {
        !self.dims.is_empty()
    }
}

/// A flat name → record map for one nesting level.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    records: HashMap<String, Record>,
}

impl Scope {
    fn get(&self, name: &str) -> Option<&Record> {
        self.records.get(name)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut Record> {
        self.records.get_mut(name)
    }

    /// Fails without inserting when the name already exists in this scope.
    fn insert(&mut self, name: &str, record: Record) -> bool {
        if self.records.contains_key(name) {
            return false;
        }
        self.records.insert(name.to_string(), record);
        true
    }

    fn clear(&mut self) {
        self.records.clear();
    }
}

/// Stack of per-level scopes. Lookup walks from the current level down to
/// level 0, so inner declarations shadow outer ones.
#[derive(Debug)]
pub struct ScopeTable {
    level: i32,
    scopes: Vec<Scope>,
}

impl ScopeTable {
    pub fn new() -> Self {
        Self {
            level: -1,
            scopes: Vec::new(),
        }
    }

    /// Moves one level deeper, reusing (and clearing) the scope left behind
    /// by a finished sibling at the same depth.
    pub fn enter_scope(&mut self) {
        self.level += 1;
        let level = self.level as usize;
        if self.scopes.len() <= level {
            self.scopes.push(Scope::default());
        }
        self.scopes[level].clear();
    }

    /// Moves one level up; never drops below level 0.
    pub fn exit_scope(&mut self) {
        if self.level > 0 {
            self.level -= 1;
        }
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    /// Inserts into the current level only. Returns `false` (and inserts
    /// nothing) if the name already exists at this level; shadowing an outer
    /// level always succeeds. Callers turn a failure into a redefinition
    /// diagnostic.
    pub fn insert(&mut self, name: &str, record: Record) -> bool {
        self.scopes[self.level as usize].insert(name, record)
    }

    pub fn lookup(&self, name: &str) -> Option<&Record> {
        for level in (0..=self.level).rev() {
            if let Some(record) = self.scopes[level as usize].get(name) {
                return Some(record);
            }
        }
        None
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Record> {
        for level in (0..=self.level).rev() {
            if self.scopes[level as usize].get(name).is_some() {
                return self.scopes[level as usize].get_mut(name);
            }
        }
        None
    }
}

impl Default for ScopeTable {
    fn default() -> Self {
        Self::new()
    }
}
