//! Lexical scope store for one function body.
//!
//! Scopes live in an arena indexed by [`ScopeId`]. Every scope keeps two
//! fact maps: one for names it declares itself, and an overlay for writes
//! to names declared by an ancestor. The overlay is the scope's *effect*,
//! the set of outer writes that a branch merge reconciles with its siblings
//! before anything reaches the enclosing scope.

use std::collections::{BTreeSet, HashMap};

use crate::lattice::{BindingKind, Fact, ValueClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(usize);

#[derive(Debug, Default)]
struct Scope {
    parent: Option<ScopeId>,
    declared: HashMap<String, BindingKind>,
    local: HashMap<String, Fact>,
    outer: HashMap<String, Fact>,
}

/// Final facts for outer names written inside a scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Effect {
    facts: HashMap<String, Fact>,
}

impl Effect {
    pub fn get(&self, name: &str) -> Option<Fact> {
        self.facts.get(name).copied()
    }

    pub fn insert(&mut self, name: impl Into<String>, fact: Fact) {
        self.facts.insert(name.into(), fact);
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.facts.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Fact)> {
        self.facts.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Names left holding a non-nil pointer.
    pub fn assigned(&self) -> BTreeSet<&str> {
        self.with_fact(Fact::NonNil)
    }

    /// Names left holding a nil pointer.
    pub fn nilled(&self) -> BTreeSet<&str> {
        self.with_fact(Fact::Nil)
    }

    fn with_fact(&self, fact: Fact) -> BTreeSet<&str> {
        self.facts
            .iter()
            .filter(|(_, f)| **f == fact)
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

impl FromIterator<(String, Fact)> for Effect {
    fn from_iter<I: IntoIterator<Item = (String, Fact)>>(iter: I) -> Self {
        Self {
            facts: iter.into_iter().collect(),
        }
    }
}

/// Arena of scopes for a single function walk.
#[derive(Debug)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl Default for ScopeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeArena {
    /// A new arena holding only the function's root scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Open a child scope of `parent`.
    pub fn child(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            parent: Some(parent),
            ..Scope::default()
        });
        id
    }

    /// Drop `scope` and every scope opened after it.
    ///
    /// Scopes are opened and closed in stack order during a walk, so
    /// everything past `scope` is one of its descendants.
    pub fn release(&mut self, scope: ScopeId) {
        if scope.0 > 0 {
            self.scopes.truncate(scope.0);
        }
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Declare `name` in `scope`, replacing any earlier declaration there.
    /// `fact` is ignored for untracked bindings.
    pub fn declare(&mut self, scope: ScopeId, name: &str, kind: BindingKind, fact: Option<Fact>) {
        let s = &mut self.scopes[scope.0];
        s.declared.insert(name.to_string(), kind);
        match fact {
            Some(fact) if kind.is_tracked() => {
                s.local.insert(name.to_string(), fact);
            }
            _ => {
                s.local.remove(name);
            }
        }
    }

    /// Nearest declaration of `name` visible from `scope`.
    pub fn binding(&self, scope: ScopeId, name: &str) -> Option<(ScopeId, BindingKind)> {
        let mut cur = Some(scope);
        while let Some(id) = cur {
            let s = &self.scopes[id.0];
            if let Some(kind) = s.declared.get(name) {
                return Some((id, *kind));
            }
            cur = s.parent;
        }
        None
    }

    pub fn is_declared_in(&self, scope: ScopeId, name: &str) -> bool {
        self.scopes[scope.0].declared.contains_key(name)
    }

    /// Current fact for `name` as seen from `scope`.
    ///
    /// A declaration hides every fact recorded further out, so a shadowing
    /// name without a fact of its own is unknown.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<Fact> {
        let mut cur = Some(scope);
        while let Some(id) = cur {
            let s = &self.scopes[id.0];
            if s.declared.contains_key(name) {
                return s.local.get(name).copied();
            }
            if let Some(fact) = s.outer.get(name) {
                return Some(*fact);
            }
            cur = s.parent;
        }
        None
    }

    pub fn is_nil(&self, scope: ScopeId, name: &str) -> bool {
        self.lookup(scope, name) == Some(Fact::Nil)
    }

    pub fn is_assigned(&self, scope: ScopeId, name: &str) -> bool {
        self.lookup(scope, name) == Some(Fact::NonNil)
    }

    /// Record `fact` for `name` from within `scope`.
    ///
    /// Locally declared names are updated in place; names declared further
    /// out go to the overlay. Undeclared and untracked names are ignored.
    pub fn record_fact(&mut self, scope: ScopeId, name: &str, fact: Fact) {
        let Some((owner, kind)) = self.binding(scope, name) else {
            return;
        };
        if !kind.is_tracked() {
            return;
        }
        let s = &mut self.scopes[scope.0];
        if owner == scope {
            s.local.insert(name.to_string(), fact);
        } else {
            s.outer.insert(name.to_string(), fact);
        }
    }

    /// Apply the write `name = value` (or `name := value`) made in `scope`.
    ///
    /// `define_kind` is the binding kind a `:=` declares; `None` means a
    /// plain assignment. A `:=` naming a variable already declared in the
    /// same scope reuses it, matching Go's redeclaration rule.
    pub fn record_assignment(
        &mut self,
        scope: ScopeId,
        name: &str,
        define_kind: Option<BindingKind>,
        value: ValueClass,
    ) {
        if let Some(kind) = define_kind {
            if !self.is_declared_in(scope, name) {
                self.declare(scope, name, kind, value.fact_for(kind));
                return;
            }
        }
        let Some((_, kind)) = self.binding(scope, name) else {
            return;
        };
        if let Some(fact) = value.fact_for(kind) {
            self.record_fact(scope, name, fact);
        }
    }

    /// Outer writes made in `scope`.
    pub fn effect(&self, scope: ScopeId) -> Effect {
        Effect {
            facts: self.scopes[scope.0].outer.clone(),
        }
    }

    /// Write every fact of `effect` into `scope`.
    pub fn apply(&mut self, scope: ScopeId, effect: &Effect) {
        for (name, fact) in effect.iter() {
            self.record_fact(scope, name, fact);
        }
    }
}
