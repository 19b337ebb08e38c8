use std::sync::Arc;

use super::SyntaxNode;

/// Owned syntax tree for callers that bring their own parser.
///
/// Kinds and field names follow the tree-sitter-java grammar.
#[derive(Debug, Clone)]
pub struct MemoryNode {
    inner: Arc<NodeData>,
}

#[derive(Debug)]
struct NodeData {
    kind: String,
    text: String,
    line: usize,
    error: bool,
    children: Vec<(Option<String>, MemoryNode)>,
}

impl MemoryNode {
    pub fn new(kind: impl Into<String>) -> Self {
        Self::build(kind.into(), String::new(), 1, false, Vec::new())
    }

    /// Leaf carrying source text, e.g. an identifier or keyword.
    pub fn leaf(kind: impl Into<String>, text: impl Into<String>) -> Self {
        Self::build(kind.into(), text.into(), 1, false, Vec::new())
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::build("ERROR".to_string(), text.into(), 1, true, Vec::new())
    }

    pub fn with_child(self, child: MemoryNode) -> Self {
        self.push(None, child)
    }

    pub fn with_field(self, field: impl Into<String>, child: MemoryNode) -> Self {
        self.push(Some(field.into()), child)
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        let data = self.into_data();
        Self::build(data.kind, text.into(), data.line, data.error, data.children)
    }

    pub fn at_line(self, line: usize) -> Self {
        let data = self.into_data();
        Self::build(data.kind, data.text, line, data.error, data.children)
    }

    fn push(self, field: Option<String>, child: MemoryNode) -> Self {
        let mut data = self.into_data();
        data.children.push((field, child));
        Self::build(data.kind, data.text, data.line, data.error, data.children)
    }

    fn into_data(self) -> NodeData {
        match Arc::try_unwrap(self.inner) {
            Ok(data) => data,
            Err(shared) => NodeData {
                kind: shared.kind.clone(),
                text: shared.text.clone(),
                line: shared.line,
                error: shared.error,
                children: shared.children.clone(),
            },
        }
    }

    fn build(
        kind: String,
        text: String,
        line: usize,
        error: bool,
        children: Vec<(Option<String>, MemoryNode)>,
    ) -> Self {
        Self {
            inner: Arc::new(NodeData {
                kind,
                text,
                line,
                error,
                children,
            }),
        }
    }
}

impl SyntaxNode for MemoryNode {
    fn kind(&self) -> &str {
        &self.inner.kind
    }

    fn text(&self) -> &str {
        &self.inner.text
    }

    fn children(&self) -> Vec<Self> {
        self.inner.children.iter().map(|(_, c)| c.clone()).collect()
    }

    fn child_by_field(&self, field: &str) -> Option<Self> {
        self.inner
            .children
            .iter()
            .find(|(name, _)| name.as_deref() == Some(field))
            .map(|(_, c)| c.clone())
    }

    fn start_line(&self) -> usize {
        self.inner.line
    }

    fn is_error(&self) -> bool {
        self.inner.error
    }
}
