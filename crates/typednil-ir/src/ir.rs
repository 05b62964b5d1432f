//! Typed AST for Go function bodies.
//!
//! These types mirror the JSON emitted by an external type-checker bridge
//! and by the bundled tree-sitter frontend. Every expression carries the
//! class of its resolved static type; the checker never resolves types itself.

use serde::{Deserialize, Serialize};

/// Root type: every package handed to the checker in one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisInput {
    pub packages: Vec<Package>,
    #[serde(default)]
    pub go_version: String,
    #[serde(default)]
    pub bridge_version: String,
}

/// A Go package after loading and type resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub import_path: String,
    pub name: String,
    #[serde(default)]
    pub dir: String,
    pub files: Vec<SourceFile>,
}

impl Package {
    /// Number of function declarations across all files.
    pub fn function_count(&self) -> usize {
        self.files.iter().map(|f| f.functions.len()).sum()
    }
}

/// File-level data: path plus its top-level function and method declarations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: String,
    #[serde(default)]
    pub is_test: bool,
    #[serde(default)]
    pub is_generated: bool,
    #[serde(default)]
    pub functions: Vec<FuncDecl>,
}

/// Source position inside a file. Both fields are 1-based, matching Go's
/// `token.Position`; the column counts bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub line: u32,
    pub column: u32,
}

impl Pos {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Classification of a resolved static type, as far as nil tracking cares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeClass {
    /// Could not be resolved.
    #[default]
    Unknown,
    /// The type of the predeclared `nil` identifier.
    UntypedNil,
    Pointer,
    /// Interface-like: can hold any value satisfying a method set.
    Interface,
    /// Everything else (structs, basics, slices, maps, ...).
    Value,
}

impl TypeClass {
    pub fn is_pointer(self) -> bool {
        self == TypeClass::Pointer
    }

    pub fn is_interface(self) -> bool {
        self == TypeClass::Interface
    }
}

/// A type as written in a declaration, with its resolved class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRef {
    pub text: String,
    #[serde(default)]
    pub class: TypeClass,
}

impl TypeRef {
    pub fn new(text: impl Into<String>, class: TypeClass) -> Self {
        Self {
            text: text.into(),
            class,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    pub pos: Pos,
}

impl Ident {
    pub fn new(name: impl Into<String>, pos: Pos) -> Self {
        Self {
            name: name.into(),
            pos,
        }
    }

    /// True for the blank identifier `_`.
    pub fn is_blank(&self) -> bool {
        self.name == "_"
    }
}

/// A parameter, receiver or result field: zero or more names sharing a type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    #[serde(default)]
    pub names: Vec<Ident>,
    pub ty: TypeRef,
}

/// One flattened result position of a signature.
#[derive(Debug, Clone, Copy)]
pub struct ResultSlot<'a> {
    pub index: usize,
    pub name: Option<&'a Ident>,
    pub ty: &'a TypeRef,
}

/// A top-level function or method declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuncDecl {
    pub name: String,
    pub pos: Pos,
    #[serde(default)]
    pub receiver: Option<Field>,
    #[serde(default)]
    pub params: Vec<Field>,
    #[serde(default)]
    pub results: Vec<Field>,
    /// `None` for declarations without a body (assembly stubs, linknames).
    #[serde(default)]
    pub body: Option<Block>,
}

impl FuncDecl {
    /// Result positions in declaration order; `(a, b error)` yields two slots.
    pub fn result_slots(&self) -> Vec<ResultSlot<'_>> {
        let mut slots = Vec::new();
        for field in &self.results {
            if field.names.is_empty() {
                slots.push(ResultSlot {
                    index: slots.len(),
                    name: None,
                    ty: &field.ty,
                });
                continue;
            }
            for name in &field.names {
                slots.push(ResultSlot {
                    index: slots.len(),
                    name: Some(name),
                    ty: &field.ty,
                });
            }
        }
        slots
    }

    /// Display name, `(*Recv).Name` for methods.
    pub fn display_name(&self) -> String {
        match &self.receiver {
            Some(recv) => format!("({}).{}", recv.ty.text, self.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Block {
    pub pos: Pos,
    #[serde(default)]
    pub stmts: Vec<Stmt>,
}

/// Statement kinds relevant to nil tracking; everything else is `Other`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stmt {
    VarDecl(VarDecl),
    Assign(AssignStmt),
    If(IfStmt),
    Switch(SwitchStmt),
    Loop(LoopStmt),
    Return(ReturnStmt),
    Block(Block),
    Labeled(LabeledStmt),
    Other { pos: Pos },
}

impl Stmt {
    pub fn pos(&self) -> Pos {
        match self {
            Stmt::VarDecl(s) => s.pos,
            Stmt::Assign(s) => s.pos,
            Stmt::If(s) => s.pos,
            Stmt::Switch(s) => s.pos,
            Stmt::Loop(s) => s.pos,
            Stmt::Return(s) => s.pos,
            Stmt::Block(b) => b.pos,
            Stmt::Labeled(s) => s.pos,
            Stmt::Other { pos } => *pos,
        }
    }
}

/// `var` or `const` declaration inside a function body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarDecl {
    pub pos: Pos,
    #[serde(default)]
    pub is_const: bool,
    pub specs: Vec<ValueSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueSpec {
    pub names: Vec<Ident>,
    #[serde(default)]
    pub ty: Option<TypeRef>,
    #[serde(default)]
    pub values: Vec<Expr>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignOp {
    /// `=`
    #[default]
    Assign,
    /// `:=`
    Define,
    /// `+=`, `<<=`, ...
    Compound,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignStmt {
    pub pos: Pos,
    pub lhs: Vec<Expr>,
    pub rhs: Vec<Expr>,
    #[serde(default)]
    pub op: AssignOp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IfStmt {
    pub pos: Pos,
    #[serde(default)]
    pub init: Option<Box<Stmt>>,
    pub body: Block,
    #[serde(default)]
    pub else_branch: Option<ElseBranch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElseBranch {
    If(Box<IfStmt>),
    Block(Block),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchKind {
    Expr,
    Type,
    Select,
}

/// Expression switch, type switch or select statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchStmt {
    pub pos: Pos,
    /// Serialized as `switch_kind`; `kind` is the statement tag.
    #[serde(rename = "switch_kind")]
    pub kind: SwitchKind,
    #[serde(default)]
    pub init: Option<Box<Stmt>>,
    #[serde(default)]
    pub clauses: Vec<CaseClause>,
}

impl SwitchStmt {
    pub fn has_default(&self) -> bool {
        self.clauses.iter().any(|c| c.is_default)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseClause {
    pub pos: Pos,
    /// `default:` clause (no guard expressions).
    #[serde(default)]
    pub is_default: bool,
    /// Names bound for the clause body only, e.g. the `v` of `switch v := x.(type)`.
    #[serde(default)]
    pub bindings: Vec<Ident>,
    #[serde(default)]
    pub body: Vec<Stmt>,
}

/// `for` loop in any of its forms, including `range`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopStmt {
    pub pos: Pos,
    #[serde(default)]
    pub init: Option<Box<Stmt>>,
    #[serde(default)]
    pub post: Option<Box<Stmt>>,
    #[serde(default)]
    pub range: Option<RangeClause>,
    pub body: Block,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeClause {
    #[serde(default)]
    pub lhs: Vec<Expr>,
    #[serde(default)]
    pub define: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnStmt {
    pub pos: Pos,
    #[serde(default)]
    pub results: Vec<Expr>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledStmt {
    pub pos: Pos,
    pub label: String,
    #[serde(default)]
    pub stmt: Option<Box<Stmt>>,
}

/// An expression with the class of its resolved static type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub pos: Pos,
    #[serde(default)]
    pub ty: TypeClass,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExprKind {
    Ident { name: String },
    /// The predeclared `nil`.
    Nil,
    /// `&x`
    AddressOf { operand: Box<Expr> },
    /// `*x`: a dereference, or a pointer type in conversion position.
    Star { operand: Box<Expr> },
    Paren { inner: Box<Expr> },
    Call { func: Box<Expr>, args: Vec<Expr> },
    /// `T{...}`
    Composite,
    Other,
}

impl Expr {
    pub fn new(pos: Pos, ty: TypeClass, kind: ExprKind) -> Self {
        Self { pos, ty, kind }
    }

    pub fn ident(name: impl Into<String>, pos: Pos) -> Self {
        Self::new(pos, TypeClass::Unknown, ExprKind::Ident { name: name.into() })
    }

    pub fn nil(pos: Pos) -> Self {
        Self::new(pos, TypeClass::UntypedNil, ExprKind::Nil)
    }

    pub fn address_of(operand: Expr, pos: Pos) -> Self {
        Self::new(
            pos,
            TypeClass::Pointer,
            ExprKind::AddressOf {
                operand: Box::new(operand),
            },
        )
    }

    pub fn other(pos: Pos, ty: TypeClass) -> Self {
        Self::new(pos, ty, ExprKind::Other)
    }

    /// The identifier name if this is a bare identifier.
    pub fn as_ident(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Ident { name } => Some(name),
            _ => None,
        }
    }

    /// Strip any number of enclosing parentheses.
    pub fn unparen(&self) -> &Expr {
        let mut expr = self;
        while let ExprKind::Paren { inner } = &expr.kind {
            expr = inner;
        }
        expr
    }

    /// `(*T)(nil)`: a parenthesized pointer type applied to the nil literal.
    pub fn is_pointer_conversion_of_nil(&self) -> bool {
        let ExprKind::Call { func, args } = &self.kind else {
            return false;
        };
        if args.len() != 1 {
            return false;
        }
        let ExprKind::Paren { inner } = &func.kind else {
            return false;
        };
        matches!(inner.kind, ExprKind::Star { .. }) && matches!(args[0].unparen().kind, ExprKind::Nil)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(line: u32, column: u32) -> Pos {
        Pos::new(line, column)
    }

    #[test]
    fn test_result_slots_flatten_names() {
        let func = FuncDecl {
            name: "f".into(),
            pos: p(1, 1),
            receiver: None,
            params: vec![],
            results: vec![
                Field {
                    names: vec![Ident::new("a", p(1, 10)), Ident::new("b", p(1, 13))],
                    ty: TypeRef::new("error", TypeClass::Interface),
                },
                Field {
                    names: vec![Ident::new("n", p(1, 22))],
                    ty: TypeRef::new("int", TypeClass::Value),
                },
            ],
            body: None,
        };
        let slots = func.result_slots();
        assert_eq!(slots.len(), 3);
        assert_eq!(slots[1].index, 1);
        assert_eq!(slots[1].name.map(|n| n.name.as_str()), Some("b"));
        assert!(slots[1].ty.class.is_interface());
        assert_eq!(slots[2].ty.class, TypeClass::Value);
    }

    #[test]
    fn test_result_slots_unnamed() {
        let func = FuncDecl {
            name: "f".into(),
            pos: p(1, 1),
            receiver: None,
            params: vec![],
            results: vec![
                Field {
                    names: vec![],
                    ty: TypeRef::new("*T", TypeClass::Pointer),
                },
                Field {
                    names: vec![],
                    ty: TypeRef::new("error", TypeClass::Interface),
                },
            ],
            body: None,
        };
        let slots = func.result_slots();
        assert_eq!(slots.len(), 2);
        assert!(slots.iter().all(|s| s.name.is_none()));
    }

    #[test]
    fn test_pointer_conversion_of_nil() {
        // (*T)(nil)
        let star = Expr::new(
            p(1, 2),
            TypeClass::Unknown,
            ExprKind::Star {
                operand: Box::new(Expr::ident("T", p(1, 3))),
            },
        );
        let paren = Expr::new(
            p(1, 1),
            TypeClass::Unknown,
            ExprKind::Paren {
                inner: Box::new(star),
            },
        );
        let call = Expr::new(
            p(1, 1),
            TypeClass::Pointer,
            ExprKind::Call {
                func: Box::new(paren.clone()),
                args: vec![Expr::nil(p(1, 6))],
            },
        );
        assert!(call.is_pointer_conversion_of_nil());

        let not_nil = Expr::new(
            p(1, 1),
            TypeClass::Pointer,
            ExprKind::Call {
                func: Box::new(paren),
                args: vec![Expr::ident("x", p(1, 6))],
            },
        );
        assert!(!not_nil.is_pointer_conversion_of_nil());
    }

    #[test]
    fn test_unparen() {
        let inner = Expr::ident("a", p(3, 4));
        let wrapped = Expr::new(
            p(3, 2),
            TypeClass::Unknown,
            ExprKind::Paren {
                inner: Box::new(Expr::new(
                    p(3, 3),
                    TypeClass::Unknown,
                    ExprKind::Paren {
                        inner: Box::new(inner),
                    },
                )),
            },
        );
        assert_eq!(wrapped.unparen().as_ident(), Some("a"));
    }

    #[test]
    fn test_stmt_json_shape() {
        let json = r#"{
            "kind": "assign",
            "pos": {"line": 4, "column": 2},
            "lhs": [{"pos": {"line": 4, "column": 2}, "kind": {"kind": "ident", "name": "a"}}],
            "rhs": [{"pos": {"line": 4, "column": 6}, "ty": "untyped_nil", "kind": {"kind": "nil"}}]
        }"#;
        let stmt: Stmt = serde_json::from_str(json).unwrap();
        let Stmt::Assign(assign) = stmt else {
            panic!("expected assignment");
        };
        assert_eq!(assign.op, AssignOp::Assign);
        assert_eq!(assign.lhs[0].as_ident(), Some("a"));
        assert_eq!(assign.rhs[0].ty, TypeClass::UntypedNil);
    }

    #[test]
    fn test_switch_kind_does_not_clash_with_tag() {
        let json = r#"{
            "kind": "switch",
            "switch_kind": "select",
            "pos": {"line": 7, "column": 2},
            "clauses": [{"pos": {"line": 8, "column": 2}, "is_default": true}]
        }"#;
        let stmt: Stmt = serde_json::from_str(json).unwrap();
        let Stmt::Switch(switch) = &stmt else {
            panic!("expected switch");
        };
        assert_eq!(switch.kind, SwitchKind::Select);
        assert!(switch.has_default());

        let back = serde_json::to_value(&stmt).unwrap();
        assert_eq!(back["kind"], "switch");
        assert_eq!(back["switch_kind"], "select");
    }

    #[test]
    fn test_display_name_method() {
        let func = FuncDecl {
            name: "Close".into(),
            pos: p(1, 1),
            receiver: Some(Field {
                names: vec![Ident::new("c", p(1, 7))],
                ty: TypeRef::new("*Conn", TypeClass::Pointer),
            }),
            params: vec![],
            results: vec![],
            body: None,
        };
        assert_eq!(func.display_name(), "(*Conn).Close");
    }
}
