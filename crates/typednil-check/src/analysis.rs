//! Typed nil return analysis.
//!
//! Walks each function body once, in source order, keeping per-scope nil
//! facts for pointer and interface variables. Branching constructs are
//! analyzed branch by branch and their effects merged (see [`crate::merge`]).
//! Every `return` is checked against the facts visible at that point.

use typednil_diagnostics::diagnostic::{sort_diagnostics, Diagnostic};
use typednil_diagnostics::source_lines::SourceLines;
use typednil_ir::ir::*;

use crate::lattice::{BindingKind, Fact, ValueClass};
use crate::merge::merge_branches;
use crate::rules;
use crate::scope::{Effect, ScopeArena, ScopeId};

/// The typed nil return analyzer.
pub struct TypedNilAnalyzer;

/// A nil pointer escaping through an interface result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Identifier position for explicit returns, `return` keyword for naked ones.
    pub pos: Pos,
    pub symbol: String,
    /// Flattened result position.
    pub slot: usize,
    /// Declared type of that result, e.g. `error`.
    pub result_type: String,
}

impl TypedNilAnalyzer {
    /// Analyze all packages in an `AnalysisInput` and return sorted diagnostics.
    pub fn analyze(input: &AnalysisInput) -> Vec<Diagnostic> {
        let mut lines = SourceLines::new();
        let mut all: Vec<Diagnostic> = input
            .packages
            .iter()
            .flat_map(|pkg| Self::analyze_package_with_lines(pkg, &mut lines))
            .collect();
        sort_diagnostics(&mut all);
        all
    }

    pub fn analyze_package(pkg: &Package) -> Vec<Diagnostic> {
        Self::analyze_package_with_lines(pkg, &mut SourceLines::new())
    }

    /// Analyze one package, quoting source lines through `lines`.
    pub fn analyze_package_with_lines(pkg: &Package, lines: &mut SourceLines) -> Vec<Diagnostic> {
        let mut all = Vec::new();
        for file in &pkg.files {
            for func in &file.functions {
                for finding in Self::check_function(func) {
                    let text = lines.line(&file.path, finding.pos.line);
                    all.push(rules::build_tnil001(&file.path, func, &finding, &text));
                }
            }
        }
        all
    }

    /// Check a single function declaration.
    pub fn check_function(func: &FuncDecl) -> Vec<Finding> {
        let Some(body) = &func.body else {
            return Vec::new();
        };
        let slots = func.result_slots();
        if !slots.iter().any(|s| s.ty.class.is_interface()) {
            return Vec::new();
        }

        let mut walker = FunctionWalker::new(func, &slots);
        let root = walker.arena.root();
        walker.declare_signature(func, root);
        walker.walk_stmts(root, &body.stmts);

        if !walker.findings.is_empty() {
            tracing::debug!(
                func = %func.display_name(),
                count = walker.findings.len(),
                "typed nil returns found"
            );
        }
        walker.findings
    }
}

/// An interface-typed result position.
#[derive(Debug)]
struct InterfaceSlot {
    index: usize,
    name: Option<String>,
    type_text: String,
}

struct FunctionWalker {
    arena: ScopeArena,
    slots: Vec<InterfaceSlot>,
    slot_count: usize,
    findings: Vec<Finding>,
}

impl FunctionWalker {
    fn new(func: &FuncDecl, slots: &[ResultSlot<'_>]) -> Self {
        tracing::trace!(func = %func.display_name(), "walking function");
        Self {
            arena: ScopeArena::new(),
            slots: slots
                .iter()
                .filter(|s| s.ty.class.is_interface())
                .map(|s| InterfaceSlot {
                    index: s.index,
                    name: s.name.filter(|n| !n.is_blank()).map(|n| n.name.clone()),
                    type_text: s.ty.text.clone(),
                })
                .collect(),
            slot_count: slots.len(),
            findings: Vec::new(),
        }
    }

    fn declare_signature(&mut self, func: &FuncDecl, root: ScopeId) {
        let inputs = func.receiver.iter().chain(func.params.iter());
        for field in inputs {
            let kind = BindingKind::from_type(field.ty.class);
            for name in field.names.iter().filter(|n| !n.is_blank()) {
                self.arena.declare(root, &name.name, kind, None);
            }
        }
        for field in &func.results {
            let kind = BindingKind::from_type(field.ty.class);
            // Named results start at their zero value.
            let zero = match kind {
                BindingKind::Pointer => Some(Fact::Nil),
                _ => None,
            };
            for name in field.names.iter().filter(|n| !n.is_blank()) {
                self.arena.declare(root, &name.name, kind, zero);
            }
        }
    }

    fn walk_stmts(&mut self, scope: ScopeId, stmts: &[Stmt]) {
        for stmt in stmts {
            self.walk_stmt(scope, stmt);
        }
    }

    fn walk_stmt(&mut self, scope: ScopeId, stmt: &Stmt) {
        match stmt {
            Stmt::VarDecl(decl) => self.walk_var_decl(scope, decl),
            Stmt::Assign(assign) => self.walk_assign(scope, assign),
            Stmt::If(stmt) => {
                let effect = self.if_effect(scope, stmt);
                self.arena.apply(scope, &effect);
            }
            Stmt::Switch(stmt) => self.walk_switch(scope, stmt),
            Stmt::Loop(stmt) => self.walk_loop(scope, stmt),
            Stmt::Return(ret) => self.check_return(scope, ret),
            Stmt::Block(block) => {
                let effect = self.branch_effect(scope, |w, s| w.walk_stmts(s, &block.stmts));
                self.arena.apply(scope, &effect);
            }
            Stmt::Labeled(labeled) => {
                if let Some(inner) = &labeled.stmt {
                    self.walk_stmt(scope, inner);
                }
            }
            Stmt::Other { .. } => {}
        }
    }

    fn walk_var_decl(&mut self, scope: ScopeId, decl: &VarDecl) {
        for spec in &decl.specs {
            // Initializers are evaluated before the names come into scope.
            let values: Option<Vec<(ValueClass, BindingKind)>> =
                (spec.values.len() == spec.names.len()).then(|| {
                    spec.values
                        .iter()
                        .map(|v| (self.classify(scope, v), self.infer_kind(scope, v)))
                        .collect()
                });

            for (i, name) in spec.names.iter().enumerate() {
                if name.is_blank() {
                    continue;
                }
                let value = values.as_ref().and_then(|v| v.get(i)).copied();
                let kind = match (&spec.ty, value) {
                    _ if decl.is_const => BindingKind::Untracked,
                    (Some(ty), _) => BindingKind::from_type(ty.class),
                    (None, Some((_, inferred))) => inferred,
                    (None, None) => BindingKind::Untracked,
                };
                let fact = match value {
                    Some((class, _)) => class.fact_for(kind),
                    // No initializer: the zero value.
                    None if spec.values.is_empty() => ValueClass::UntypedNil.fact_for(kind),
                    // `var a, b = f()`
                    None => ValueClass::Unknown.fact_for(kind),
                };
                self.arena.declare(scope, &name.name, kind, fact);
            }
        }
    }

    fn walk_assign(&mut self, scope: ScopeId, assign: &AssignStmt) {
        if assign.op == AssignOp::Compound {
            return;
        }
        let define = assign.op == AssignOp::Define;

        // Right-hand sides are evaluated before any target is written.
        let values: Vec<(ValueClass, BindingKind)> = if assign.lhs.len() == assign.rhs.len() {
            assign
                .rhs
                .iter()
                .map(|v| (self.classify(scope, v), self.infer_kind(scope, v)))
                .collect()
        } else {
            vec![(ValueClass::Unknown, BindingKind::Untracked); assign.lhs.len()]
        };

        for (target, (class, kind)) in assign.lhs.iter().zip(values) {
            let Some(name) = target.unparen().as_ident() else {
                continue;
            };
            if name == "_" {
                continue;
            }
            let define_kind = define.then_some(kind);
            self.arena.record_assignment(scope, name, define_kind, class);
        }
    }

    /// Net outer effect of an if / else-if / else chain.
    fn if_effect(&mut self, scope: ScopeId, stmt: &IfStmt) -> Effect {
        self.construct_effect(scope, stmt.init.as_deref(), |w, construct| {
            let mut branches =
                vec![w.branch_effect(construct, |w, s| w.walk_stmts(s, &stmt.body.stmts))];
            let exhaustive = match &stmt.else_branch {
                None => false,
                Some(ElseBranch::Block(block)) => {
                    branches.push(w.branch_effect(construct, |w, s| w.walk_stmts(s, &block.stmts)));
                    true
                }
                Some(ElseBranch::If(nested)) => {
                    branches.push(w.if_effect(construct, nested));
                    true
                }
            };
            merge_branches(&branches, exhaustive)
        })
    }

    fn walk_switch(&mut self, scope: ScopeId, stmt: &SwitchStmt) {
        let effect = self.construct_effect(scope, stmt.init.as_deref(), |w, construct| {
            let branches: Vec<Effect> = stmt
                .clauses
                .iter()
                .map(|clause| {
                    w.branch_effect(construct, |w, s| {
                        for binding in clause.bindings.iter().filter(|b| !b.is_blank()) {
                            w.arena.declare(s, &binding.name, BindingKind::Untracked, None);
                        }
                        w.walk_stmts(s, &clause.body);
                    })
                })
                .collect();
            let exhaustive = match stmt.kind {
                SwitchKind::Select => true,
                SwitchKind::Expr | SwitchKind::Type => stmt.has_default(),
            };
            merge_branches(&branches, exhaustive)
        });
        self.arena.apply(scope, &effect);
    }

    fn walk_loop(&mut self, scope: ScopeId, stmt: &LoopStmt) {
        let effect = self.construct_effect(scope, stmt.init.as_deref(), |w, construct| {
            if let Some(range) = stmt.range.as_ref().filter(|r| r.define) {
                for name in range.lhs.iter().filter_map(Expr::as_ident) {
                    if name != "_" {
                        w.arena.declare(construct, name, BindingKind::Untracked, None);
                    }
                }
            }
            let body = w.branch_effect(construct, |w, s| {
                if let Some(range) = stmt.range.as_ref().filter(|r| !r.define) {
                    for name in range.lhs.iter().filter_map(|e| e.unparen().as_ident()) {
                        w.arena.record_assignment(s, name, None, ValueClass::Unknown);
                    }
                }
                w.walk_stmts(s, &stmt.body.stmts);
                if let Some(post) = &stmt.post {
                    w.walk_stmt(s, post);
                }
            });
            merge_branches(&[body], false)
        });
        self.arena.apply(scope, &effect);
    }

    /// Analyze a construct in an intermediate scope holding its init clause.
    ///
    /// `merge` walks the branches under that scope and returns their merged
    /// effect, which is applied there; the intermediate scope's own effect is
    /// what the construct does to the enclosing scope.
    fn construct_effect<F>(&mut self, scope: ScopeId, init: Option<&Stmt>, merge: F) -> Effect
    where
        F: FnOnce(&mut Self, ScopeId) -> Effect,
    {
        let construct = self.arena.child(scope);
        if let Some(init) = init {
            self.walk_stmt(construct, init);
        }
        let merged = merge(self, construct);
        self.arena.apply(construct, &merged);
        let effect = self.arena.effect(construct);
        self.arena.release(construct);
        effect
    }

    /// Walk one branch in a fresh child scope and return its outer effect.
    fn branch_effect<F>(&mut self, parent: ScopeId, walk: F) -> Effect
    where
        F: FnOnce(&mut Self, ScopeId),
    {
        let scope = self.arena.child(parent);
        walk(self, scope);
        let effect = self.arena.effect(scope);
        self.arena.release(scope);
        effect
    }

    fn check_return(&mut self, scope: ScopeId, ret: &ReturnStmt) {
        if ret.results.is_empty() {
            for slot in &self.slots {
                let Some(name) = &slot.name else { continue };
                if self.arena.is_nil(scope, name) {
                    self.findings.push(Finding {
                        pos: ret.pos,
                        symbol: name.clone(),
                        slot: slot.index,
                        result_type: slot.type_text.clone(),
                    });
                }
            }
            return;
        }

        // `return f()` forwarding a multi-value call.
        if ret.results.len() != self.slot_count {
            tracing::debug!(pos = %ret.pos, "skipping return with mismatched result count");
            return;
        }

        for slot in &self.slots {
            let Some(expr) = ret.results.get(slot.index) else {
                continue;
            };
            let Some(name) = expr.as_ident() else {
                continue;
            };
            if self.arena.is_nil(scope, name) {
                self.findings.push(Finding {
                    pos: expr.pos,
                    symbol: name.to_string(),
                    slot: slot.index,
                    result_type: slot.type_text.clone(),
                });
            }
        }
    }

    /// Nil-ness of `expr` given the facts visible from `scope`.
    fn classify(&self, scope: ScopeId, expr: &Expr) -> ValueClass {
        let expr = expr.unparen();
        if expr.ty == TypeClass::UntypedNil || matches!(expr.kind, ExprKind::Nil) {
            return ValueClass::UntypedNil;
        }
        if expr.is_pointer_conversion_of_nil() {
            return ValueClass::TypedNil;
        }
        match &expr.kind {
            ExprKind::Ident { name } => match self.arena.lookup(scope, name) {
                Some(Fact::Nil) => ValueClass::TypedNil,
                Some(Fact::NonNil) => ValueClass::NonNil,
                _ => ValueClass::Unknown,
            },
            ExprKind::AddressOf { .. } => ValueClass::NonNil,
            _ if expr.ty == TypeClass::Pointer => ValueClass::NonNil,
            _ => ValueClass::Unknown,
        }
    }

    /// Binding kind a `:=` or untyped `var` gets from its initializer.
    fn infer_kind(&self, scope: ScopeId, expr: &Expr) -> BindingKind {
        let expr = expr.unparen();
        if let Some(name) = expr.as_ident() {
            if let Some((_, kind)) = self.arena.binding(scope, name) {
                return kind;
            }
        }
        if expr.is_pointer_conversion_of_nil() || matches!(expr.kind, ExprKind::AddressOf { .. }) {
            return BindingKind::Pointer;
        }
        BindingKind::from_type(expr.ty)
    }
}
