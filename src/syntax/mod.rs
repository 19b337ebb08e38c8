//! Parse-tree traversal contract.
//!
//! The entity extractor only sees a tree through [`SyntaxNode`]. Any parser
//! whose node kinds follow the tree-sitter-java grammar names can drive it.

pub mod memory;
pub mod treesitter;

pub use memory::MemoryNode;
pub use treesitter::{JavaSourceParser, ParsedSource, TsNode};

pub trait SyntaxNode: Clone {
    /// Grammar kind of the node (`class_declaration`, `identifier`, `public`, ...).
    fn kind(&self) -> &str;

    /// Source text spanned by the node.
    fn text(&self) -> &str;

    /// All children in source order, anonymous tokens and comments included.
    fn children(&self) -> Vec<Self>;

    fn child_by_field(&self, field: &str) -> Option<Self>;

    /// 1-based line the node starts on.
    fn start_line(&self) -> usize;

    /// True for parser recovery nodes (syntax errors, missing tokens).
    fn is_error(&self) -> bool {
        false
    }

    fn first_child_of_kind(&self, kind: &str) -> Option<Self> {
        self.children().into_iter().find(|c| c.kind() == kind)
    }
}

/// Comment node kinds across tree-sitter-java releases.
pub fn is_comment_kind(kind: &str) -> bool {
    matches!(kind, "comment" | "block_comment" | "line_comment")
}
