use crate::error::{LocatorError, Result};
use crate::types::ModuleKind;
use context_code_window::Language;
use tree_sitter::{Node, Parser, Point, Tree};

/// Get Tree-sitter language instance
pub(crate) fn tree_sitter_language(language: Language) -> Result<tree_sitter::Language> {
    match language {
        Language::Rust => Ok(tree_sitter_rust::LANGUAGE.into()),
        Language::Python => Ok(tree_sitter_python::LANGUAGE.into()),
        Language::JavaScript => Ok(tree_sitter_javascript::LANGUAGE.into()),
        Language::TypeScript => Ok(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
        _ => Err(LocatorError::tree_sitter(format!(
            "no grammar for {}",
            language.as_str()
        ))),
    }
}

/// Parsed file: the tree plus the text it was built from
pub(crate) struct SyntaxTree {
    tree: Tree,
    source: String,
}

impl SyntaxTree {
    pub(crate) fn parse(language: Language, lines: &[String]) -> Result<Self> {
        let ts_language = tree_sitter_language(language)?;
        let mut parser = Parser::new();
        parser
            .set_language(&ts_language)
            .map_err(|e| LocatorError::tree_sitter(format!("Failed to set language: {e}")))?;

        let mut source = lines.join("\n");
        source.push('\n');

        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| LocatorError::tree_sitter("Failed to parse source code"))?;

        Ok(Self { tree, source })
    }

    pub(crate) fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub(crate) fn text(&self, node: Node<'_>) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or_default()
    }

    /// Largest unit that starts exactly at the first non-blank column of `row`
    pub(crate) fn unit_starting_at(&self, row: usize, column: usize) -> Option<Node<'_>> {
        let root = self.root();
        let point = Point::new(row, column);
        let mut node = root.named_descendant_for_point_range(point, point)?;
        if node.start_position() != point {
            return None;
        }

        while let Some(parent) = node.parent() {
            if parent.id() == root.id()
                || parent.start_byte() != node.start_byte()
                || is_body_container(parent.kind())
            {
                break;
            }
            node = parent;
        }

        Some(node)
    }

    /// Closest declaration named `simple_name` that starts above `anchor_row` and encloses it
    pub(crate) fn enclosing_declaration(
        &self,
        language: Language,
        kind: ModuleKind,
        simple_name: &str,
        anchor_row: usize,
    ) -> Option<usize> {
        let kinds = declaration_kinds(language, kind);
        let mut best: Option<usize> = None;
        let mut cursor = self.root().walk();

        loop {
            let node = cursor.node();
            let start_row = node.start_position().row;
            let encloses = start_row <= anchor_row && node.end_position().row >= anchor_row;

            if encloses
                && start_row < anchor_row
                && kinds.contains(&node.kind())
                && self.declared_name(node).as_deref() == Some(simple_name)
            {
                best = Some(best.map_or(start_row, |row| row.max(start_row)));
            }

            // Only subtrees that contain the anchor can hold an enclosing declaration.
            if encloses && cursor.goto_first_child() {
                continue;
            }

            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return best.map(|row| row + 1);
                }
            }
        }
    }

    /// Unqualified name a declaration node introduces
    fn declared_name(&self, node: Node<'_>) -> Option<String> {
        let name_node = node
            .child_by_field_name("name")
            .or_else(|| node.child_by_field_name("type"))?;
        let text = self.text(name_node);
        let base = text.split('<').next().unwrap_or(text).trim();
        let simple = base
            .rsplit(|c| c == ':' || c == '.')
            .next()
            .unwrap_or(base)
            .trim_start_matches('&');
        (!simple.is_empty()).then(|| simple.to_string())
    }
}

/// Node kinds that declare a module-like type in each grammar
fn declaration_kinds(language: Language, kind: ModuleKind) -> &'static [&'static str] {
    match (language, kind) {
        (Language::Rust, ModuleKind::Class) => &[
            "struct_item",
            "enum_item",
            "union_item",
            "trait_item",
            "impl_item",
        ],
        (Language::Rust, ModuleKind::Module) => &["mod_item"],
        (Language::Python, _) => &["class_definition"],
        (Language::JavaScript, ModuleKind::Class) => &["class_declaration", "class"],
        (Language::TypeScript, ModuleKind::Class) => &[
            "class_declaration",
            "abstract_class_declaration",
            "interface_declaration",
            "class",
        ],
        (Language::TypeScript, ModuleKind::Module) => &["internal_module", "module"],
        _ => &[],
    }
}

/// Nodes that hold a sequence of statements rather than being one
fn is_body_container(kind: &str) -> bool {
    matches!(
        kind,
        "block"
            | "declaration_list"
            | "field_declaration_list"
            | "enum_variant_list"
            | "class_body"
            | "statement_block"
            | "program"
            | "source_file"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(code: &str) -> Vec<String> {
        code.lines().map(str::to_string).collect()
    }

    #[test]
    fn test_unsupported_language() {
        assert!(tree_sitter_language(Language::Ruby).is_err());
        assert!(tree_sitter_language(Language::Rust).is_ok());
    }

    #[test]
    fn test_rust_impl_encloses_method() {
        let code = lines(
            "struct Point {\n    x: i32,\n}\n\nimpl Point {\n    fn new() -> Self {\n        Self { x: 0 }\n    }\n}\n",
        );
        let tree = SyntaxTree::parse(Language::Rust, &code).unwrap();
        let line = tree.enclosing_declaration(Language::Rust, ModuleKind::Class, "Point", 5);
        assert_eq!(line, Some(5));
    }

    #[test]
    fn test_python_nested_class_picks_closest() {
        let code = lines(
            "class Outer:\n    class Inner:\n        def run(self):\n            pass\n\n    def go(self):\n        pass\n",
        );
        let tree = SyntaxTree::parse(Language::Python, &code).unwrap();
        assert_eq!(
            tree.enclosing_declaration(Language::Python, ModuleKind::Class, "Inner", 2),
            Some(2)
        );
        assert_eq!(
            tree.enclosing_declaration(Language::Python, ModuleKind::Class, "Outer", 5),
            Some(1)
        );
        assert_eq!(
            tree.enclosing_declaration(Language::Python, ModuleKind::Class, "Inner", 5),
            None
        );
    }

    #[test]
    fn test_unit_starting_at_method() {
        let code = lines("class A:\n    def f(self):\n        return 1\n\n    x = 2\n");
        let tree = SyntaxTree::parse(Language::Python, &code).unwrap();
        let node = tree.unit_starting_at(1, 4).unwrap();
        assert_eq!(node.kind(), "function_definition");
        assert_eq!(node.end_position().row, 2);
    }
}
