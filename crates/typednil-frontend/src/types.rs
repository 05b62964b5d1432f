//! Package-level type environment.
//!
//! The frontend only needs to know, for a type or an expression, whether it
//! is a pointer, an interface, or something else. Named types are resolved
//! through the package's own `type` declarations; predeclared names and a
//! configurable list of qualified interfaces cover the rest.

use std::collections::{HashMap, HashSet};

use tree_sitter::Node;
use typednil_ir::ir::TypeClass;

use crate::parse::ParsedFile;

/// Qualified interface types recognised without type-checking the importee.
pub const DEFAULT_INTERFACES: &[&str] = &[
    "context.Context",
    "fmt.Stringer",
    "fmt.Formatter",
    "io.Reader",
    "io.Writer",
    "io.Closer",
    "io.ReadCloser",
    "io.WriteCloser",
    "io.ReadWriter",
    "io.ReadWriteCloser",
    "io.ReaderAt",
    "io.WriterTo",
    "io.ReaderFrom",
    "io.Seeker",
    "io.ReadSeeker",
    "net.Conn",
    "net.Error",
    "net.Listener",
    "net.Addr",
    "sort.Interface",
    "http.Handler",
    "http.ResponseWriter",
    "driver.Valuer",
    "json.Marshaler",
    "json.Unmarshaler",
    "fs.FS",
    "fs.File",
    "fs.FileInfo",
    "reflect.Type",
];

const PREDECLARED_VALUES: &[&str] = &[
    "bool",
    "string",
    "int",
    "int8",
    "int16",
    "int32",
    "int64",
    "uint",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "uintptr",
    "float32",
    "float64",
    "complex64",
    "complex128",
    "byte",
    "rune",
];

/// Bound on alias chains such as `type A = B; type B = A`.
const MAX_RESOLVE_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
enum TypeDef {
    Class(TypeClass),
    /// Defined over or aliased to another named type.
    Named(String),
}

#[derive(Debug, Default)]
pub struct TypeEnv {
    named: HashMap<String, TypeDef>,
    /// Single-result package functions and the class of that result.
    funcs: HashMap<String, TypeClass>,
    interfaces: HashSet<String>,
}

impl TypeEnv {
    /// Build the environment for one package from all of its files.
    pub fn build(files: &[ParsedFile], extra_interfaces: &[String]) -> Self {
        let mut env = Self {
            interfaces: DEFAULT_INTERFACES
                .iter()
                .map(|s| s.to_string())
                .chain(extra_interfaces.iter().cloned())
                .collect(),
            ..Self::default()
        };
        for file in files {
            env.collect_types(file);
        }
        for file in files {
            env.collect_funcs(file);
        }
        tracing::trace!(
            types = env.named.len(),
            funcs = env.funcs.len(),
            "type environment built"
        );
        env
    }

    fn collect_types(&mut self, file: &ParsedFile) {
        let root = file.root_node();
        let mut cursor = root.walk();
        for decl in root.named_children(&mut cursor) {
            if decl.kind() != "type_declaration" {
                continue;
            }
            let mut spec_cursor = decl.walk();
            for spec in decl.named_children(&mut spec_cursor) {
                if !matches!(spec.kind(), "type_spec" | "type_alias") {
                    continue;
                }
                let (Some(name), Some(ty)) =
                    (spec.child_by_field_name("name"), spec.child_by_field_name("type"))
                else {
                    continue;
                };
                let def = self.type_def(&ty, file);
                self.named.insert(file.node_text(&name).to_string(), def);
            }
        }
    }

    fn type_def(&self, ty: &Node<'_>, file: &ParsedFile) -> TypeDef {
        match ty.kind() {
            "type_identifier" => TypeDef::Named(file.node_text(ty).to_string()),
            "generic_type" => match ty.child_by_field_name("type") {
                Some(base) => self.type_def(&base, file),
                None => TypeDef::Class(TypeClass::Unknown),
            },
            "parenthesized_type" => match first_named(ty) {
                Some(inner) => self.type_def(&inner, file),
                None => TypeDef::Class(TypeClass::Unknown),
            },
            _ => TypeDef::Class(self.class_of_type(ty, file)),
        }
    }

    fn collect_funcs(&mut self, file: &ParsedFile) {
        let root = file.root_node();
        let mut cursor = root.walk();
        for decl in root.named_children(&mut cursor) {
            if decl.kind() != "function_declaration" {
                continue;
            }
            let (Some(name), Some(result)) =
                (decl.child_by_field_name("name"), decl.child_by_field_name("result"))
            else {
                continue;
            };
            if let Some(class) = self.single_result_class(&result, file) {
                self.funcs.insert(file.node_text(&name).to_string(), class);
            }
        }
    }

    fn single_result_class(&self, result: &Node<'_>, file: &ParsedFile) -> Option<TypeClass> {
        if result.kind() != "parameter_list" {
            return Some(self.class_of_type(result, file));
        }
        let mut cursor = result.walk();
        let decls: Vec<Node<'_>> = result
            .named_children(&mut cursor)
            .filter(|n| n.kind() == "parameter_declaration")
            .collect();
        let [decl] = decls.as_slice() else {
            return None;
        };
        let mut name_cursor = decl.walk();
        if decl.children_by_field_name("name", &mut name_cursor).count() > 1 {
            return None;
        }
        let ty = decl.child_by_field_name("type")?;
        Some(self.class_of_type(&ty, file))
    }

    /// Class of a type node.
    pub fn class_of_type(&self, ty: &Node<'_>, file: &ParsedFile) -> TypeClass {
        match ty.kind() {
            "pointer_type" => TypeClass::Pointer,
            "interface_type" => TypeClass::Interface,
            "type_identifier" => self.class_of_name(file.node_text(ty)),
            "generic_type" => ty
                .child_by_field_name("type")
                .map(|base| self.class_of_type(&base, file))
                .unwrap_or_default(),
            "parenthesized_type" => first_named(ty)
                .map(|inner| self.class_of_type(&inner, file))
                .unwrap_or_default(),
            "qualified_type" => {
                let text: String = file.node_text(ty).split_whitespace().collect();
                if self.interfaces.contains(&text) {
                    TypeClass::Interface
                } else {
                    TypeClass::Unknown
                }
            }
            "slice_type" | "array_type" | "implicit_length_array_type" | "map_type"
            | "channel_type" | "function_type" | "struct_type" => TypeClass::Value,
            _ => TypeClass::Unknown,
        }
    }

    /// Class of a named type as seen from inside the package.
    pub fn class_of_name(&self, name: &str) -> TypeClass {
        self.resolve(name, 0)
    }

    fn resolve(&self, name: &str, depth: usize) -> TypeClass {
        if depth > MAX_RESOLVE_DEPTH {
            return TypeClass::Unknown;
        }
        match self.named.get(name) {
            Some(TypeDef::Class(class)) => *class,
            Some(TypeDef::Named(next)) if next != name => self.resolve(next, depth + 1),
            Some(TypeDef::Named(_)) => TypeClass::Unknown,
            None if matches!(name, "error" | "any") => TypeClass::Interface,
            None if PREDECLARED_VALUES.contains(&name) => TypeClass::Value,
            None => TypeClass::Unknown,
        }
    }

    pub fn is_type_name(&self, name: &str) -> bool {
        self.named.contains_key(name)
    }

    /// Result class of a call to the package function `name`, if it has a
    /// single result.
    pub fn func_result(&self, name: &str) -> Option<TypeClass> {
        self.funcs.get(name).copied()
    }
}

/// First named child, skipping comments.
pub(crate) fn first_named<'t>(node: &Node<'t>) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .find(|n| n.kind() != "comment");
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_go_file;

    fn env_for(src: &str) -> TypeEnv {
        let parsed = parse_go_file(src, "demo.go").unwrap();
        TypeEnv::build(&[parsed], &["custom.Iface".to_string()])
    }

    #[test]
    fn test_predeclared() {
        let env = env_for("package demo\n");
        assert_eq!(env.class_of_name("error"), TypeClass::Interface);
        assert_eq!(env.class_of_name("any"), TypeClass::Interface);
        assert_eq!(env.class_of_name("int"), TypeClass::Value);
        assert_eq!(env.class_of_name("Missing"), TypeClass::Unknown);
    }

    #[test]
    fn test_named_types() {
        let env = env_for(
            r#"package demo

type TestErr struct{}
type Handler interface{ Handle() error }
type Ptr *TestErr
type MyErr error
type Alias = Handler
type Loop = Loop
type (
	A = B
	B = A
)
"#,
        );
        assert_eq!(env.class_of_name("TestErr"), TypeClass::Value);
        assert_eq!(env.class_of_name("Handler"), TypeClass::Interface);
        assert_eq!(env.class_of_name("Ptr"), TypeClass::Pointer);
        assert_eq!(env.class_of_name("MyErr"), TypeClass::Interface);
        assert_eq!(env.class_of_name("Alias"), TypeClass::Interface);
        assert_eq!(env.class_of_name("Loop"), TypeClass::Unknown);
        assert_eq!(env.class_of_name("A"), TypeClass::Unknown);
        assert!(env.is_type_name("TestErr"));
    }

    #[test]
    fn test_local_declaration_shadows_predeclared() {
        let env = env_for("package demo\n\ntype error struct{}\n");
        assert_eq!(env.class_of_name("error"), TypeClass::Value);
    }

    #[test]
    fn test_func_results() {
        let env = env_for(
            r#"package demo

type T struct{}

func newT() *T { return &T{} }
func open() (r io.Reader) { return nil }
func pair() (*T, error) { return nil, nil }
func none() {}
"#,
        );
        assert_eq!(env.func_result("newT"), Some(TypeClass::Pointer));
        assert_eq!(env.func_result("open"), Some(TypeClass::Interface));
        assert_eq!(env.func_result("pair"), None);
        assert_eq!(env.func_result("none"), None);
    }

    #[test]
    fn test_configured_interfaces() {
        let env = env_for("package demo\n\ntype W custom.Iface\ntype C context.Context\n");
        assert_eq!(env.class_of_name("W"), TypeClass::Interface);
        assert_eq!(env.class_of_name("C"), TypeClass::Interface);
    }
}
