//! Abstract values for nil tracking.

use typednil_ir::ir::TypeClass;

/// What is known about a tracked variable at a program point.
///
/// A name with no fact at all is unknown as well; `Unknown` is only stored
/// when a write explicitly erased an earlier fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fact {
    /// Holds a non-nil pointer ("assigned").
    NonNil,
    /// Holds a nil pointer ("nilled").
    Nil,
    Unknown,
}

/// How a declared name participates in tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Pointer,
    /// Interface-typed: tracked so a typed nil stored into it is not lost.
    Interface,
    /// Declared only to shadow outer names.
    Untracked,
}

impl BindingKind {
    pub fn from_type(class: TypeClass) -> Self {
        match class {
            TypeClass::Pointer => BindingKind::Pointer,
            TypeClass::Interface => BindingKind::Interface,
            _ => BindingKind::Untracked,
        }
    }

    pub fn is_tracked(self) -> bool {
        self != BindingKind::Untracked
    }
}

/// Classification of a value being stored into a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueClass {
    /// The `nil` literal.
    UntypedNil,
    /// A nil of a concrete pointer type: `(*T)(nil)` or a nil-state variable.
    TypedNil,
    NonNil,
    Unknown,
}

impl ValueClass {
    /// The fact a binding of `kind` holds after this value is stored into it.
    ///
    /// Storing the `nil` literal into an interface yields a genuine nil
    /// interface, which is not a typed nil.
    pub fn fact_for(self, kind: BindingKind) -> Option<Fact> {
        match (kind, self) {
            (BindingKind::Untracked, _) => None,
            (BindingKind::Pointer, ValueClass::UntypedNil | ValueClass::TypedNil) => Some(Fact::Nil),
            (BindingKind::Interface, ValueClass::TypedNil) => Some(Fact::Nil),
            (BindingKind::Interface, ValueClass::UntypedNil) => Some(Fact::Unknown),
            (_, ValueClass::NonNil) => Some(Fact::NonNil),
            (_, ValueClass::Unknown) => Some(Fact::Unknown),
        }
    }
}
