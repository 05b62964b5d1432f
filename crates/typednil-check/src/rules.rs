//! Typed nil rules (TNIL001).

use typednil_diagnostics::diagnostic::*;
use typednil_ir::ir::FuncDecl;

use crate::analysis::Finding;

pub const RULE_TYPED_NIL: &str = "TNIL001";

/// TNIL001: nil pointer returned through an interface result
pub fn build_tnil001(file: &str, func: &FuncDecl, finding: &Finding, source_line: &str) -> Diagnostic {
    DiagnosticBuilder::new(RULE_TYPED_NIL, Severity::Warning, "possible typed nil")
        .location(file, finding.pos.line, finding.pos.column)
        .symbol(&finding.symbol)
        .source_line(source_line)
        .function(func.display_name())
        .explanation(format!(
            "In function `{}`, `{}` holds a nil pointer when returned as result #{} ({}); \
             the caller receives a non-nil interface wrapping a nil pointer",
            func.display_name(),
            finding.symbol,
            finding.slot + 1,
            finding.result_type,
        ))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use typednil_ir::ir::Pos;

    #[test]
    fn test_build_tnil001() {
        let func = FuncDecl {
            name: "b".into(),
            pos: Pos::new(20, 1),
            receiver: None,
            params: vec![],
            results: vec![],
            body: None,
        };
        let finding = Finding {
            pos: Pos::new(31, 9),
            symbol: "a".into(),
            slot: 0,
            result_type: "error".into(),
        };
        let diag = build_tnil001("/go/src/demo/main.go", &func, &finding, "\treturn a, b");
        assert_eq!(diag.rule, "TNIL001");
        assert_eq!(diag.severity, Severity::Warning);
        assert_eq!(diag.location.line, 31);
        assert_eq!(diag.location.column, 9);
        assert_eq!(diag.symbol, "a");
        assert_eq!(diag.source_line, "return a, b");
        assert_eq!(diag.function, "b");
        assert!(diag.explanation.contains("result #1 (error)"));
    }
}
