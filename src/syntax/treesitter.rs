use tree_sitter::{Node, Parser, Tree};

use super::SyntaxNode;
use crate::error::{JavaLoreError, Result};

/// Thin wrapper over a tree-sitter parser configured for Java.
pub struct JavaSourceParser {
    parser: Parser,
}

impl JavaSourceParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(tree_sitter_java::language())
            .map_err(|e| JavaLoreError::ParserInit(format!("{:?}", e)))?;
        Ok(Self { parser })
    }

    pub fn parse(&mut self, source: &str, path: &str) -> Result<ParsedSource> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| JavaLoreError::Parse {
                path: path.to_string(),
            })?;
        Ok(ParsedSource {
            tree,
            source: source.to_string(),
        })
    }
}

/// A parsed file: the tree plus the text its byte ranges point into.
pub struct ParsedSource {
    tree: Tree,
    source: String,
}

impl ParsedSource {
    pub fn root(&self) -> TsNode<'_> {
        TsNode {
            node: self.tree.root_node(),
            source: &self.source,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }
}

#[derive(Clone, Copy)]
pub struct TsNode<'a> {
    node: Node<'a>,
    source: &'a str,
}

impl<'a> TsNode<'a> {
    pub fn new(node: Node<'a>, source: &'a str) -> Self {
        Self { node, source }
    }

    fn wrap(&self, node: Node<'a>) -> Self {
        Self {
            node,
            source: self.source,
        }
    }
}

impl<'a> SyntaxNode for TsNode<'a> {
    fn kind(&self) -> &str {
        self.node.kind()
    }

    fn text(&self) -> &str {
        self.node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn children(&self) -> Vec<Self> {
        let mut cursor = self.node.walk();
        self.node
            .children(&mut cursor)
            .map(|child| self.wrap(child))
            .collect()
    }

    fn child_by_field(&self, field: &str) -> Option<Self> {
        self.node.child_by_field_name(field).map(|n| self.wrap(n))
    }

    fn start_line(&self) -> usize {
        self.node.start_position().row + 1
    }

    fn is_error(&self) -> bool {
        self.node.is_error() || self.node.is_missing()
    }
}

impl std::fmt::Debug for TsNode<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.node.kind(), self.start_line())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_class() {
        let mut parser = JavaSourceParser::new().unwrap();
        let parsed = parser
            .parse("package a.b;\npublic class C { void m() {} }", "C.java")
            .unwrap();
        let root = parsed.root();

        assert_eq!(root.kind(), "program");
        assert!(!parsed.has_errors());
        let class = root.first_child_of_kind("class_declaration").unwrap();
        assert_eq!(class.child_by_field("name").unwrap().text(), "C");
        assert_eq!(class.start_line(), 2);
    }

    #[test]
    fn test_syntax_errors_are_flagged() {
        let mut parser = JavaSourceParser::new().unwrap();
        let parsed = parser.parse("this is not valid java code {{{", "Bad.java").unwrap();
        assert!(parsed.has_errors());
    }
}
