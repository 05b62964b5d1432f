//! Lowering of tree-sitter-go syntax trees into the typed AST.
//!
//! Only the statement and expression shapes that nil tracking looks at are
//! kept; everything else becomes `Stmt::Other` or `ExprKind::Other`.
//! Function literals are opaque.

use tree_sitter::Node;
use typednil_ir::ir::*;

use crate::parse::{node_pos, ParsedFile};
use crate::types::{first_named, TypeEnv};

/// Lower every function and method declaration of `file`.
pub fn lower_file(file: &ParsedFile, env: &TypeEnv) -> SourceFile {
    let lowerer = Lowerer { file, env };
    let root = file.root_node();
    let mut cursor = root.walk();
    let functions = root
        .named_children(&mut cursor)
        .filter(|n| matches!(n.kind(), "function_declaration" | "method_declaration"))
        .filter_map(|n| lowerer.func_decl(&n))
        .collect();

    SourceFile {
        path: file.path.clone(),
        is_test: file.is_test(),
        is_generated: file.is_generated(),
        functions,
    }
}

struct Lowerer<'a> {
    file: &'a ParsedFile,
    env: &'a TypeEnv,
}

impl<'a> Lowerer<'a> {
    fn text(&self, node: &Node<'_>) -> &'a str {
        self.file.node_text(node)
    }

    fn func_decl(&self, node: &Node<'_>) -> Option<FuncDecl> {
        let name = node.child_by_field_name("name")?;
        let receiver = node
            .child_by_field_name("receiver")
            .and_then(|n| self.fields(&n).into_iter().next());
        let params = node
            .child_by_field_name("parameters")
            .map(|n| self.fields(&n))
            .unwrap_or_default();
        let results = node
            .child_by_field_name("result")
            .map(|n| self.results(&n))
            .unwrap_or_default();
        let body = node.child_by_field_name("body").map(|n| self.block(&n));

        Some(FuncDecl {
            name: self.text(&name).to_string(),
            pos: node_pos(&name),
            receiver,
            params,
            results,
            body,
        })
    }

    fn fields(&self, list: &Node<'_>) -> Vec<Field> {
        let mut cursor = list.walk();
        list.named_children(&mut cursor)
            .filter(|n| {
                matches!(
                    n.kind(),
                    "parameter_declaration" | "variadic_parameter_declaration"
                )
            })
            .map(|decl| {
                let ty = match decl.child_by_field_name("type") {
                    // `...T` is a slice.
                    Some(t) if decl.kind() == "variadic_parameter_declaration" => {
                        TypeRef::new(format!("...{}", self.text(&t)), TypeClass::Value)
                    }
                    Some(t) => self.type_ref(&t),
                    None => TypeRef::new("", TypeClass::Unknown),
                };
                Field {
                    names: self.names(&decl),
                    ty,
                }
            })
            .collect()
    }

    fn results(&self, node: &Node<'_>) -> Vec<Field> {
        if node.kind() == "parameter_list" {
            self.fields(node)
        } else {
            vec![Field {
                names: vec![],
                ty: self.type_ref(node),
            }]
        }
    }

    fn names(&self, node: &Node<'_>) -> Vec<Ident> {
        let mut cursor = node.walk();
        let names = node
            .children_by_field_name("name", &mut cursor)
            .filter(|n| n.kind() == "identifier")
            .map(|n| Ident::new(self.text(&n), node_pos(&n)))
            .collect();
        names
    }

    fn type_ref(&self, ty: &Node<'_>) -> TypeRef {
        TypeRef::new(self.text(ty), self.env.class_of_type(ty, self.file))
    }

    // -- Statements ---------------------------------------------------------

    fn block(&self, node: &Node<'_>) -> Block {
        Block {
            pos: node_pos(node),
            stmts: self.stmt_list(node, None),
        }
    }

    /// Statements among `node`'s children, flattening `statement_list`.
    /// `skip` excludes one child (the communication of a select case).
    fn stmt_list(&self, node: &Node<'_>, skip: Option<usize>) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if Some(child.id()) == skip {
                continue;
            }
            if child.kind() == "statement_list" {
                stmts.extend(self.stmt_list(&child, None));
            } else if is_statement(child.kind()) {
                stmts.extend(self.stmt(&child));
            }
        }
        stmts
    }

    fn stmt(&self, node: &Node<'_>) -> Option<Stmt> {
        let pos = node_pos(node);
        let stmt = match node.kind() {
            "var_declaration" => Stmt::VarDecl(self.var_decl(node, false)),
            "const_declaration" => Stmt::VarDecl(self.var_decl(node, true)),
            "short_var_declaration" | "assignment_statement" => {
                Stmt::Assign(self.assign(node)?)
            }
            "if_statement" => Stmt::If(self.if_stmt(node)?),
            "expression_switch_statement" => Stmt::Switch(self.expr_switch(node)),
            "type_switch_statement" => Stmt::Switch(self.type_switch(node)),
            "select_statement" => Stmt::Switch(self.select(node)),
            "for_statement" => Stmt::Loop(self.for_stmt(node)?),
            "return_statement" => Stmt::Return(ReturnStmt {
                pos,
                results: self.expr_list(first_named(node).as_ref()),
            }),
            "block" => Stmt::Block(self.block(node)),
            "labeled_statement" => Stmt::Labeled(self.labeled(node)),
            "empty_statement" => return None,
            _ => Stmt::Other { pos },
        };
        Some(stmt)
    }

    fn var_decl(&self, node: &Node<'_>, is_const: bool) -> VarDecl {
        let mut specs = Vec::new();
        self.collect_specs(node, &mut specs);
        VarDecl {
            pos: node_pos(node),
            is_const,
            specs,
        }
    }

    fn collect_specs(&self, node: &Node<'_>, specs: &mut Vec<ValueSpec>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "var_spec" | "const_spec" => specs.push(ValueSpec {
                    names: self.names(&child),
                    ty: child.child_by_field_name("type").map(|t| self.type_ref(&t)),
                    values: self.expr_list(child.child_by_field_name("value").as_ref()),
                }),
                "var_spec_list" | "const_spec_list" => self.collect_specs(&child, specs),
                _ => {}
            }
        }
    }

    fn assign(&self, node: &Node<'_>) -> Option<AssignStmt> {
        let op = if node.kind() == "short_var_declaration" {
            AssignOp::Define
        } else {
            match node.child_by_field_name("operator").map(|o| self.text(&o)) {
                Some("=") | None => AssignOp::Assign,
                Some(_) => AssignOp::Compound,
            }
        };
        Some(AssignStmt {
            pos: node_pos(node),
            lhs: self.expr_list(node.child_by_field_name("left").as_ref()),
            rhs: self.expr_list(node.child_by_field_name("right").as_ref()),
            op,
        })
    }

    /// The init clause of an if, switch or for statement.
    fn init(&self, node: &Node<'_>, field: &str) -> Option<Box<Stmt>> {
        let init = node.child_by_field_name(field)?;
        self.stmt(&init).map(Box::new)
    }

    fn if_stmt(&self, node: &Node<'_>) -> Option<IfStmt> {
        let body = node.child_by_field_name("consequence")?;
        let else_branch = match node.child_by_field_name("alternative") {
            Some(alt) if alt.kind() == "if_statement" => {
                self.if_stmt(&alt).map(|s| ElseBranch::If(Box::new(s)))
            }
            Some(alt) => Some(ElseBranch::Block(self.block(&alt))),
            None => None,
        };
        Some(IfStmt {
            pos: node_pos(node),
            init: self.init(node, "initializer"),
            body: self.block(&body),
            else_branch,
        })
    }

    fn expr_switch(&self, node: &Node<'_>) -> SwitchStmt {
        SwitchStmt {
            pos: node_pos(node),
            kind: SwitchKind::Expr,
            init: self.init(node, "initializer"),
            clauses: self.clauses(node, &[], |_| None),
        }
    }

    fn type_switch(&self, node: &Node<'_>) -> SwitchStmt {
        let bindings: Vec<Ident> = match node.child_by_field_name("alias") {
            Some(alias) => {
                let mut cursor = alias.walk();
                let idents = alias
                    .named_children(&mut cursor)
                    .filter(|n| n.kind() == "identifier")
                    .map(|n| Ident::new(self.text(&n), node_pos(&n)))
                    .collect();
                idents
            }
            None => Vec::new(),
        };
        SwitchStmt {
            pos: node_pos(node),
            kind: SwitchKind::Type,
            init: self.init(node, "initializer"),
            clauses: self.clauses(node, &bindings, |_| None),
        }
    }

    /// Select cases become clauses whose body starts with the receive
    /// assignment, if any.
    fn select(&self, node: &Node<'_>) -> SwitchStmt {
        SwitchStmt {
            pos: node_pos(node),
            kind: SwitchKind::Select,
            init: None,
            clauses: self.clauses(node, &[], |case| {
                let comm = case.child_by_field_name("communication")?;
                Some((comm.id(), self.receive(&comm)))
            }),
        }
    }

    fn clauses<F>(&self, node: &Node<'_>, bindings: &[Ident], comm: F) -> Vec<CaseClause>
    where
        F: Fn(&Node<'_>) -> Option<(usize, Option<Stmt>)>,
    {
        let mut clauses = Vec::new();
        let mut cursor = node.walk();
        for case in node.named_children(&mut cursor) {
            let is_default = match case.kind() {
                "default_case" => true,
                "expression_case" | "type_case" | "communication_case" => false,
                _ => continue,
            };
            let (skip, mut body) = match comm(&case) {
                Some((id, stmt)) => (Some(id), stmt.into_iter().collect()),
                None => (None, Vec::new()),
            };
            body.extend(self.stmt_list(&case, skip));
            clauses.push(CaseClause {
                pos: node_pos(&case),
                is_default,
                bindings: bindings.to_vec(),
                body,
            });
        }
        clauses
    }

    /// `v, ok := <-ch` as an assignment from an unknown value.
    fn receive(&self, comm: &Node<'_>) -> Option<Stmt> {
        if comm.kind() != "receive_statement" {
            return None;
        }
        let left = comm.child_by_field_name("left")?;
        let define = has_token(comm, ":=");
        Some(Stmt::Assign(AssignStmt {
            pos: node_pos(comm),
            lhs: self.expr_list(Some(&left)),
            rhs: self.expr_list(comm.child_by_field_name("right").as_ref()),
            op: if define {
                AssignOp::Define
            } else {
                AssignOp::Assign
            },
        }))
    }

    fn for_stmt(&self, node: &Node<'_>) -> Option<LoopStmt> {
        let body = node.child_by_field_name("body")?;
        let mut init = None;
        let mut post = None;
        let mut range = None;

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "for_clause" => {
                    init = self.init(&child, "initializer");
                    post = self.init(&child, "update");
                }
                "range_clause" => {
                    range = Some(RangeClause {
                        lhs: self.expr_list(child.child_by_field_name("left").as_ref()),
                        define: has_token(&child, ":="),
                    });
                }
                _ => {}
            }
        }

        Some(LoopStmt {
            pos: node_pos(node),
            init,
            post,
            range,
            body: self.block(&body),
        })
    }

    fn labeled(&self, node: &Node<'_>) -> LabeledStmt {
        let label = node
            .child_by_field_name("label")
            .map(|l| self.text(&l).to_string())
            .unwrap_or_default();
        let mut cursor = node.walk();
        let inner = node
            .named_children(&mut cursor)
            .find(|n| is_statement(n.kind()))
            .and_then(|n| self.stmt(&n))
            .map(Box::new);
        LabeledStmt {
            pos: node_pos(node),
            label,
            stmt: inner,
        }
    }

    // -- Expressions ---------------------------------------------------------

    /// Elements of an `expression_list`, or the single expression itself.
    fn expr_list(&self, node: Option<&Node<'_>>) -> Vec<Expr> {
        let Some(node) = node else {
            return Vec::new();
        };
        if node.kind() != "expression_list" {
            return vec![self.expr(node)];
        }
        let mut cursor = node.walk();
        let exprs = node
            .named_children(&mut cursor)
            .filter(|n| n.kind() != "comment")
            .map(|n| self.expr(&n))
            .collect();
        exprs
    }

    fn expr(&self, node: &Node<'_>) -> Expr {
        let pos = node_pos(node);
        match node.kind() {
            "identifier" => Expr::ident(self.text(node), pos),
            "nil" => Expr::nil(pos),
            "unary_expression" => self.unary(node),
            // `*T` parsed as a type inside `(*T)(x)`.
            "pointer_type" => Expr::new(
                pos,
                TypeClass::Unknown,
                ExprKind::Star {
                    operand: Box::new(Expr::other(pos, TypeClass::Unknown)),
                },
            ),
            "parenthesized_expression" | "parenthesized_type" => match first_named(node) {
                Some(inner) => {
                    let inner = self.expr(&inner);
                    Expr::new(
                        pos,
                        inner.ty,
                        ExprKind::Paren {
                            inner: Box::new(inner),
                        },
                    )
                }
                None => Expr::other(pos, TypeClass::Unknown),
            },
            "call_expression" => self.call(node),
            "type_conversion_expression" => self.conversion(node),
            "composite_literal" => Expr::new(pos, TypeClass::Value, ExprKind::Composite),
            "type_assertion_expression" => {
                let class = node
                    .child_by_field_name("type")
                    .map(|t| self.env.class_of_type(&t, self.file))
                    .unwrap_or_default();
                Expr::other(pos, class)
            }
            "int_literal" | "float_literal" | "imaginary_literal" | "rune_literal"
            | "interpreted_string_literal" | "raw_string_literal" | "true" | "false"
            | "func_literal" => Expr::other(pos, TypeClass::Value),
            _ => Expr::other(pos, TypeClass::Unknown),
        }
    }

    fn unary(&self, node: &Node<'_>) -> Expr {
        let pos = node_pos(node);
        let op = node.child_by_field_name("operator").map(|o| self.text(&o));
        let Some(operand) = node.child_by_field_name("operand") else {
            return Expr::other(pos, TypeClass::Unknown);
        };
        match op {
            Some("&") => Expr::address_of(self.expr(&operand), pos),
            Some("*") => Expr::new(
                pos,
                TypeClass::Unknown,
                ExprKind::Star {
                    operand: Box::new(self.expr(&operand)),
                },
            ),
            _ => Expr::other(pos, TypeClass::Unknown),
        }
    }

    fn call(&self, node: &Node<'_>) -> Expr {
        let pos = node_pos(node);
        let Some(func) = node.child_by_field_name("function") else {
            return Expr::other(pos, TypeClass::Unknown);
        };
        let args = match node.child_by_field_name("arguments") {
            Some(list) => {
                let mut cursor = list.walk();
                let args = list
                    .named_children(&mut cursor)
                    .filter(|n| n.kind() != "comment")
                    .map(|n| self.expr(&n))
                    .collect();
                args
            }
            None => Vec::new(),
        };
        let ty = self.call_class(&func);
        Expr::new(
            pos,
            ty,
            ExprKind::Call {
                func: Box::new(self.expr(&func)),
                args,
            },
        )
    }

    /// Result class of calling `func`: conversions, `new`, and package
    /// functions with a single result.
    fn call_class(&self, func: &Node<'_>) -> TypeClass {
        match func.kind() {
            "identifier" => {
                let name = self.text(func);
                if name == "new" {
                    TypeClass::Pointer
                } else if self.env.is_type_name(name) {
                    self.env.class_of_name(name)
                } else {
                    self.env.func_result(name).unwrap_or_default()
                }
            }
            "parenthesized_expression" => match first_named(func) {
                Some(inner) if is_pointer_type_expr(&inner) => TypeClass::Pointer,
                Some(inner) => self.call_class(&inner),
                None => TypeClass::Unknown,
            },
            "parenthesized_type" | "pointer_type" | "type_identifier" | "qualified_type"
            | "generic_type" | "interface_type" => self.env.class_of_type(func, self.file),
            _ => TypeClass::Unknown,
        }
    }

    /// `T(x)` parsed as a conversion; `(*T)(nil)` keeps the call shape the
    /// checker recognises.
    fn conversion(&self, node: &Node<'_>) -> Expr {
        let pos = node_pos(node);
        let operand = node
            .child_by_field_name("operand")
            .map(|o| self.expr(&o))
            .unwrap_or_else(|| Expr::other(pos, TypeClass::Unknown));
        let Some(ty) = node.child_by_field_name("type") else {
            return Expr::other(pos, TypeClass::Unknown);
        };
        Expr::new(
            pos,
            self.env.class_of_type(&ty, self.file),
            ExprKind::Call {
                func: Box::new(self.expr(&ty)),
                args: vec![operand],
            },
        )
    }
}

/// `*T` in expression position.
fn is_pointer_type_expr(node: &Node<'_>) -> bool {
    match node.kind() {
        "pointer_type" => true,
        "unary_expression" => {
            let mut cursor = node.walk();
            let star = node
                .children(&mut cursor)
                .next()
                .is_some_and(|n| n.kind() == "*");
            star
        }
        _ => false,
    }
}

/// Whether `node` has an anonymous child token `token`.
fn has_token(node: &Node<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|n| !n.is_named() && n.kind() == token);
    found
}

fn is_statement(kind: &str) -> bool {
    matches!(
        kind,
        "var_declaration"
            | "const_declaration"
            | "type_declaration"
            | "short_var_declaration"
            | "assignment_statement"
            | "expression_statement"
            | "send_statement"
            | "inc_statement"
            | "dec_statement"
            | "return_statement"
            | "go_statement"
            | "defer_statement"
            | "if_statement"
            | "for_statement"
            | "expression_switch_statement"
            | "type_switch_statement"
            | "select_statement"
            | "labeled_statement"
            | "fallthrough_statement"
            | "break_statement"
            | "continue_statement"
            | "goto_statement"
            | "block"
            | "empty_statement"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_go_file;

    fn lower(src: &str) -> SourceFile {
        let parsed = parse_go_file(src, "/src/demo/main.go").unwrap();
        let env = TypeEnv::build(std::slice::from_ref(&parsed), &[]);
        lower_file(&parsed, &env)
    }

    fn body(file: &SourceFile, func: usize) -> &[Stmt] {
        &file.functions[func].body.as_ref().unwrap().stmts
    }

    #[test]
    fn test_signature() {
        let file = lower(
            r#"package demo

type T struct{}

func (t *T) Get(a, b int, p *T) (x *T, err error) {
	return
}
"#,
        );
        let f = &file.functions[0];
        assert_eq!(f.name, "Get");
        assert_eq!(f.display_name(), "(*T).Get");
        let recv = f.receiver.as_ref().unwrap();
        assert_eq!(recv.names[0].name, "t");
        assert_eq!(recv.ty.class, TypeClass::Pointer);
        assert_eq!(f.params.len(), 2);
        assert_eq!(f.params[0].names.len(), 2);
        assert_eq!(f.params[0].ty.class, TypeClass::Value);
        let slots = f.result_slots();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[1].ty.class, TypeClass::Interface);
        assert_eq!(slots[1].name.map(|n| n.name.as_str()), Some("err"));
    }

    #[test]
    fn test_var_decl_and_positions() {
        let file = lower(
            "package demo\n\ntype T struct{}\n\nfunc f() error {\n\tvar a *T = nil\n\treturn a\n}\n",
        );
        let stmts = body(&file, 0);
        let Stmt::VarDecl(decl) = &stmts[0] else {
            panic!("expected var decl, got {:?}", stmts[0]);
        };
        assert_eq!(decl.specs[0].names[0].name, "a");
        assert_eq!(decl.specs[0].ty.as_ref().unwrap().class, TypeClass::Pointer);
        assert_eq!(decl.specs[0].values[0].ty, TypeClass::UntypedNil);

        let Stmt::Return(ret) = &stmts[1] else {
            panic!("expected return");
        };
        assert_eq!(ret.pos, Pos::new(7, 2));
        assert_eq!(ret.results[0].as_ident(), Some("a"));
        assert_eq!(ret.results[0].pos, Pos::new(7, 9));
    }

    #[test]
    fn test_grouped_var_decl() {
        let file = lower("package demo\n\nfunc f() {\n\tvar (\n\t\ta *int\n\t\tb, c = 1, 2\n\t)\n}\n");
        let Stmt::VarDecl(decl) = &body(&file, 0)[0] else {
            panic!("expected var decl");
        };
        assert_eq!(decl.specs.len(), 2);
        assert_eq!(decl.specs[1].names.len(), 2);
        assert_eq!(decl.specs[1].values.len(), 2);
    }

    #[test]
    fn test_assignments() {
        let file = lower(
            "package demo\n\ntype T struct{}\n\nfunc f() {\n\tp := &T{}\n\tp = nil\n\tn := 0\n\tn += 1\n}\n",
        );
        let stmts = body(&file, 0);
        let ops: Vec<AssignOp> = stmts
            .iter()
            .filter_map(|s| match s {
                Stmt::Assign(a) => Some(a.op),
                _ => None,
            })
            .collect();
        assert_eq!(
            ops,
            vec![
                AssignOp::Define,
                AssignOp::Assign,
                AssignOp::Define,
                AssignOp::Compound
            ]
        );
        let Stmt::Assign(define) = &stmts[0] else {
            panic!("expected assignment");
        };
        assert!(matches!(define.rhs[0].kind, ExprKind::AddressOf { .. }));
        assert_eq!(define.rhs[0].ty, TypeClass::Pointer);
    }

    #[test]
    fn test_pointer_conversion_of_nil() {
        let file = lower(
            "package demo\n\ntype T struct{}\n\nfunc f() error {\n\tp := (*T)(nil)\n\treturn p\n}\n",
        );
        let Stmt::Assign(assign) = &body(&file, 0)[0] else {
            panic!("expected assignment");
        };
        assert!(assign.rhs[0].is_pointer_conversion_of_nil());
        assert_eq!(assign.rhs[0].ty, TypeClass::Pointer);
    }

    #[test]
    fn test_call_classes() {
        let file = lower(
            r#"package demo

type T struct{}

func newT() *T { return &T{} }

func f() {
	a := newT()
	b := new(T)
	c := other()
}
"#,
        );
        let tys: Vec<TypeClass> = body(&file, 1)
            .iter()
            .filter_map(|s| match s {
                Stmt::Assign(a) => Some(a.rhs[0].ty),
                _ => None,
            })
            .collect();
        assert_eq!(
            tys,
            vec![TypeClass::Pointer, TypeClass::Pointer, TypeClass::Unknown]
        );
    }

    #[test]
    fn test_if_else_chain() {
        let file = lower(
            r#"package demo

func f(x int) {
	if y := x; y > 0 {
	} else if x < 0 {
	} else {
	}
}
"#,
        );
        let Stmt::If(stmt) = &body(&file, 0)[0] else {
            panic!("expected if");
        };
        assert!(stmt.init.is_some());
        let Some(ElseBranch::If(nested)) = &stmt.else_branch else {
            panic!("expected else-if");
        };
        assert!(matches!(nested.else_branch, Some(ElseBranch::Block(_))));
    }

    #[test]
    fn test_switch_kinds() {
        let file = lower(
            r#"package demo

func f(x any, ch chan int) {
	switch x {
	case 1:
	default:
	case 2:
	}
	switch v := x.(type) {
	case int:
		_ = v
	}
	select {
	case n, ok := <-ch:
		_, _ = n, ok
	case ch <- 1:
	}
}
"#,
        );
        let stmts = body(&file, 0);
        let Stmt::Switch(expr) = &stmts[0] else {
            panic!("expected switch");
        };
        assert_eq!(expr.kind, SwitchKind::Expr);
        assert_eq!(expr.clauses.len(), 3);
        assert!(expr.has_default());
        assert!(expr.clauses[1].is_default);

        let Stmt::Switch(ty) = &stmts[1] else {
            panic!("expected type switch");
        };
        assert_eq!(ty.kind, SwitchKind::Type);
        assert_eq!(ty.clauses[0].bindings[0].name, "v");
        assert_eq!(ty.clauses[0].body.len(), 1);

        let Stmt::Switch(sel) = &stmts[2] else {
            panic!("expected select");
        };
        assert_eq!(sel.kind, SwitchKind::Select);
        assert_eq!(sel.clauses.len(), 2);
        // The receive becomes a leading `:=` assignment.
        let Stmt::Assign(recv) = &sel.clauses[0].body[0] else {
            panic!("expected receive assignment");
        };
        assert_eq!(recv.op, AssignOp::Define);
        assert_eq!(recv.lhs.len(), 2);
        assert_eq!(sel.clauses[0].body.len(), 2);
        assert!(sel.clauses[1].body.is_empty());
    }

    #[test]
    fn test_loops() {
        let file = lower(
            r#"package demo

func f(xs []int) {
	for i := 0; i < 3; i++ {
	}
	for _, x := range xs {
		_ = x
	}
	for {
	}
}
"#,
        );
        let stmts = body(&file, 0);
        let Stmt::Loop(clause) = &stmts[0] else {
            panic!("expected loop");
        };
        assert!(clause.init.is_some());
        assert!(clause.post.is_some());
        let Stmt::Loop(range) = &stmts[1] else {
            panic!("expected range loop");
        };
        let r = range.range.as_ref().unwrap();
        assert!(r.define);
        assert_eq!(r.lhs.len(), 2);
        assert_eq!(range.body.stmts.len(), 1);
        assert!(matches!(stmts[2], Stmt::Loop(_)));
    }

    #[test]
    fn test_labeled_and_other() {
        let file = lower(
            r#"package demo

func f() {
	defer func() {}()
outer:
	for {
		break outer
	}
	{
	}
}
"#,
        );
        let stmts = body(&file, 0);
        assert!(matches!(stmts[0], Stmt::Other { .. }));
        let Stmt::Labeled(labeled) = &stmts[1] else {
            panic!("expected labeled statement, got {:?}", stmts[1]);
        };
        assert_eq!(labeled.label, "outer");
        assert!(matches!(labeled.stmt.as_deref(), Some(Stmt::Loop(_))));
        assert!(matches!(stmts[2], Stmt::Block(_)));
    }

    #[test]
    fn test_function_without_body() {
        let file = lower("package demo\n\nfunc stub() error\n");
        assert!(file.functions[0].body.is_none());
    }

    #[test]
    fn test_lowered_json_snapshot() {
        let file = lower("package demo\n\nfunc f() error {\n\treturn nil\n}\n");
        let json = serde_json::to_string(&file.functions[0].body).unwrap();
        insta::assert_snapshot!(json, @r#"{"pos":{"line":3,"column":16},"stmts":[{"kind":"return","pos":{"line":4,"column":2},"results":[{"pos":{"line":4,"column":9},"ty":"untyped_nil","kind":{"kind":"nil"}}]}]}"#);
    }
}
