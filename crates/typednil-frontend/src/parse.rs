//! Go source code parsing via tree-sitter-go.

use tree_sitter::{Language, Node, Parser, Tree};
use typednil_ir::ir::Pos;

/// Errors that can occur during parsing.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("failed to initialize parser: {0}")]
    InitError(String),
    #[error("failed to parse {0}")]
    ParseFailed(String),
    #[error("{0}: missing package clause")]
    MissingPackage(String),
}

/// A parsed Go source file.
#[derive(Debug)]
pub struct ParsedFile {
    pub tree: Tree,
    pub source: String,
    pub path: String,
}

impl ParsedFile {
    pub fn root_node(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Returns true if the parse tree contains any errors.
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// Get the source text for a given node.
    pub fn node_text(&self, node: &Node<'_>) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    /// The name in the `package` clause.
    pub fn package_name(&self) -> Option<&str> {
        let root = self.root_node();
        let mut cursor = root.walk();
        let clause = root
            .named_children(&mut cursor)
            .find(|n| n.kind() == "package_clause")?;
        let mut cursor = clause.walk();
        let name = clause
            .named_children(&mut cursor)
            .find(|n| n.kind() == "package_identifier")?;
        Some(self.node_text(&name))
    }

    pub fn is_test(&self) -> bool {
        self.path.ends_with("_test.go")
    }

    /// Whether the file carries the standard `// Code generated ... DO NOT EDIT.` marker.
    pub fn is_generated(&self) -> bool {
        self.source.lines().any(|line| {
            line.starts_with("// Code generated ") && line.trim_end().ends_with(" DO NOT EDIT.")
        })
    }
}

/// 1-based line and column of `node`'s first byte.
pub fn node_pos(node: &Node<'_>) -> Pos {
    let start = node.start_position();
    Pos::new(start.row as u32 + 1, start.column as u32 + 1)
}

fn create_parser() -> Result<Parser, ParseError> {
    let mut parser = Parser::new();
    let language: Language = tree_sitter_go::LANGUAGE.into();
    parser
        .set_language(&language)
        .map_err(|e| ParseError::InitError(e.to_string()))?;
    Ok(parser)
}

/// Parse Go source code with a known file path.
pub fn parse_go_file(source: &str, path: &str) -> Result<ParsedFile, ParseError> {
    let mut parser = create_parser()?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ParseError::ParseFailed(path.to_string()))?;

    Ok(ParsedFile {
        tree,
        source: source.to_string(),
        path: path.to_string(),
    })
}
