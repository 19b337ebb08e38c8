use crate::syntax::{is_comment_kind, SyntaxNode};

/// Tracks the doc comment waiting for the next declaration in a sibling list.
///
/// A comment is handed out at most once. Any named non-declaration node in
/// between (an import, an initializer block, ...) discards it.
#[derive(Debug, Default)]
pub struct DocCommentTracker {
    pending: Option<String>,
}

impl DocCommentTracker {
    pub fn observe(&mut self, comment: &str) {
        if is_doc_comment(comment) {
            self.pending = Some(comment.to_string());
        }
    }

    pub fn claim(&mut self) -> Option<String> {
        self.pending.take()
    }

    pub fn reset(&mut self) {
        self.pending = None;
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

pub fn is_doc_comment(text: &str) -> bool {
    let text = text.trim_start();
    text.starts_with("/**") && !text.starts_with("/**/")
}

/// Doc comment the parser folded into the declaration itself, usually inside
/// its modifier list after a leading annotation.
pub fn embedded_doc_comment<N: SyntaxNode>(declaration: &N) -> Option<String> {
    for child in declaration.children() {
        if is_comment_kind(child.kind()) {
            if is_doc_comment(child.text()) {
                return Some(child.text().to_string());
            }
        } else if child.kind() == "modifiers" {
            let found = child
                .children()
                .into_iter()
                .filter(|c| is_comment_kind(c.kind()))
                .map(|c| c.text().to_string())
                .find(|text| is_doc_comment(text));
            if found.is_some() {
                return found;
            }
        } else {
            break;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::MemoryNode;

    #[test]
    fn test_claim_is_single_use() {
        let mut tracker = DocCommentTracker::default();
        tracker.observe("/** Doc. */");
        assert!(tracker.has_pending());
        assert_eq!(tracker.claim().as_deref(), Some("/** Doc. */"));
        assert!(tracker.claim().is_none());
    }

    #[test]
    fn test_plain_comments_are_ignored() {
        let mut tracker = DocCommentTracker::default();
        tracker.observe("/** Kept. */");
        tracker.observe("// trailing note");
        tracker.observe("/* block */");
        tracker.observe("/**/");
        assert_eq!(tracker.claim().as_deref(), Some("/** Kept. */"));
    }

    #[test]
    fn test_reset_discards() {
        let mut tracker = DocCommentTracker::default();
        tracker.observe("/** Lost. */");
        tracker.reset();
        assert!(tracker.claim().is_none());
    }

    #[test]
    fn test_embedded_comment_in_modifiers() {
        let decl = MemoryNode::new("method_declaration").with_child(
            MemoryNode::new("modifiers")
                .with_child(MemoryNode::leaf("marker_annotation", "@Override"))
                .with_child(MemoryNode::leaf("block_comment", "/** Inside. */"))
                .with_child(MemoryNode::leaf("public", "public")),
        );
        assert_eq!(embedded_doc_comment(&decl).as_deref(), Some("/** Inside. */"));
    }
}
