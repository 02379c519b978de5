//! # Mutator
//!
//! Structural edits on a [`Tree`]. Every edit keeps the printer's
//! bookkeeping consistent (the edited parent is snapshotted and its
//! ancestors flagged) and hands the comments of replaced or removed
//! statements to a neighbour instead of dropping them.

use super::comments::starts_own_line;
use super::node::{Comment, NodeId, SlotMut};
use super::tree::Tree;
use crate::errors::MutationError;
use tracing::debug;

impl Tree {
    fn parent_for_edit(&self, target: NodeId) -> Result<NodeId, MutationError> {
        match self.parent(target) {
            Some(parent) => Ok(parent),
            None if target == self.root() => Err(MutationError::Root),
            None => Err(MutationError::Detached),
        }
    }

    /// Put `replacement` where `target` is. `target` ends up detached.
    pub fn replace(&mut self, target: NodeId, replacement: NodeId) -> Result<(), MutationError> {
        let parent = self.parent_for_edit(target)?;
        self.touch(parent);
        if !self.node_mut(parent).kind.replace_child(target, replacement) {
            return Err(MutationError::Detached);
        }
        self.node_mut(replacement).parent = Some(parent);
        self.node_mut(target).parent = None;
        self.transfer_comments(target, &[replacement]);
        Ok(())
    }

    /// Put several nodes where `target` is. `target` must sit in a list.
    pub fn replace_many(&mut self, target: NodeId, replacements: Vec<NodeId>) -> Result<(), MutationError> {
        match replacements.as_slice() {
            [] => return self.remove(target),
            [single] => return self.replace(target, *single),
            _ => {}
        }
        let parent = self.parent_for_edit(target)?;
        self.touch(parent);
        let list = self
            .node_mut(parent)
            .kind
            .list_containing_mut(target)
            .ok_or(MutationError::NotInList)?;
        let index = list
            .iter()
            .position(|id| *id == target)
            .ok_or(MutationError::NotInList)?;
        list.splice(index..=index, replacements.iter().copied());

        for replacement in &replacements {
            self.node_mut(*replacement).parent = Some(parent);
        }
        self.node_mut(target).parent = None;
        self.transfer_comments(target, &replacements);
        Ok(())
    }

    pub fn insert_after(&mut self, anchor: NodeId, node: NodeId) -> Result<(), MutationError> {
        self.insert_next_to(anchor, node, 1)
    }

    pub fn insert_before(&mut self, anchor: NodeId, node: NodeId) -> Result<(), MutationError> {
        self.insert_next_to(anchor, node, 0)
    }

    fn insert_next_to(&mut self, anchor: NodeId, node: NodeId, offset: usize) -> Result<(), MutationError> {
        let parent = self.parent_for_edit(anchor)?;
        self.touch(parent);
        let list = self
            .node_mut(parent)
            .kind
            .list_containing_mut(anchor)
            .ok_or(MutationError::NotInList)?;
        let index = list
            .iter()
            .position(|id| *id == anchor)
            .ok_or(MutationError::NotInList)?;
        list.insert(index + offset, node);
        self.node_mut(node).parent = Some(parent);
        Ok(())
    }

    /// Append `node` to the list slot of `container` holding statements or
    /// elements.
    pub fn push_child(&mut self, container: NodeId, node: NodeId) -> Result<(), MutationError> {
        self.touch(container);
        let pushed = self
            .node_mut(container)
            .kind
            .slots_mut()
            .into_iter()
            .rev()
            .find_map(|slot| match slot {
                SlotMut::Many(ids) => {
                    ids.push(node);
                    Some(())
                }
                _ => None,
            });
        pushed.ok_or(MutationError::NotInList)?;
        self.node_mut(node).parent = Some(container);
        Ok(())
    }

    /// Detach `target` from its list (or optional slot).
    pub fn remove(&mut self, target: NodeId) -> Result<(), MutationError> {
        let parent = self.parent_for_edit(target)?;
        let next = self.next_sibling(target);
        let previous = self.previous_sibling(target);
        self.touch(parent);

        let removed = self.node_mut(parent).kind.slots_mut().into_iter().any(|slot| match slot {
            SlotMut::Many(ids) => {
                let before = ids.len();
                ids.retain(|id| *id != target);
                ids.len() != before
            }
            SlotMut::Opt(id) if *id == Some(target) => {
                *id = None;
                true
            }
            _ => false,
        });
        if !removed {
            return Err(MutationError::NotInList);
        }
        self.node_mut(target).parent = None;

        let node = self.node_mut(target);
        let leading = std::mem::take(&mut node.leading_comments);
        let trailing = std::mem::take(&mut node.trailing_comments);
        // Same-line trailing comments describe the removed code and go with it
        let orphans: Vec<Comment> = leading
            .into_iter()
            .chain(trailing.into_iter().filter(|c| starts_own_line(self, c)))
            .collect();
        if orphans.is_empty() {
            return Ok(());
        }
        if let Some(next) = next {
            self.prepend_leading(next, orphans);
        } else if let Some(previous) = previous {
            self.append_trailing(previous, orphans);
        } else {
            debug!("Dropping {} comments of the last removed statement", orphans.len());
        }
        Ok(())
    }

    fn prepend_leading(&mut self, id: NodeId, mut comments: Vec<Comment>) {
        let node = self.node_mut(id);
        comments.append(&mut node.leading_comments);
        node.leading_comments = comments;
        self.touch_comments(id);
    }

    fn append_trailing(&mut self, id: NodeId, mut comments: Vec<Comment>) {
        self.node_mut(id).trailing_comments.append(&mut comments);
        self.touch_comments(id);
    }

    /// Leading comments go to the first replacement. Trailing comments go
    /// to the last one when it closes its container, otherwise they lead
    /// the next sibling.
    fn transfer_comments(&mut self, old: NodeId, replacements: &[NodeId]) {
        let node = self.node_mut(old);
        let leading = std::mem::take(&mut node.leading_comments);
        let trailing = std::mem::take(&mut node.trailing_comments);
        let (Some(first), Some(last)) = (replacements.first(), replacements.last()) else {
            return;
        };

        if !leading.is_empty() {
            self.prepend_leading(*first, leading);
        }
        if !trailing.is_empty() {
            match self.next_sibling(*last) {
                Some(next) => self.prepend_leading(next, trailing),
                None => self.append_trailing(*last, trailing),
            }
        }
    }

    /// Speculative edit: run `f` on an isolated copy of `target`.
    ///
    /// The copy lives in the scratch arena and is spliced in as a temporary
    /// sibling of `target`'s enclosing statement, so scope and ancestor
    /// queries made by `f` behave as they would on the real node. The
    /// resulting copy is brought back into the live arena as a detached
    /// subtree; the live tree is left exactly as it was.
    pub fn transform_copy<R>(
        &mut self,
        target: NodeId,
        f: impl FnOnce(&mut Tree, NodeId) -> R,
    ) -> Result<(NodeId, R), MutationError> {
        let anchor = self.enclosing_statement(target).ok_or(MutationError::NotInList)?;
        let container = self.parent_for_edit(anchor)?;

        let copy = self.clone_into_scratch(target);
        self.splice_untracked(container, anchor, Some(copy))?;
        self.node_mut(copy).parent = Some(container);

        let result = f(self, copy);

        let detached = self.clone_subtree(copy);
        self.splice_untracked(container, copy, None)?;
        self.clear_scratch();
        Ok((detached, result))
    }

    /// Insert `node` after `anchor` (or remove `anchor` when `node` is
    /// absent) without any bookkeeping.
    fn splice_untracked(&mut self, container: NodeId, anchor: NodeId, node: Option<NodeId>) -> Result<(), MutationError> {
        let list = self
            .node_mut(container)
            .kind
            .list_containing_mut(anchor)
            .ok_or(MutationError::NotInList)?;
        let index = list
            .iter()
            .position(|id| *id == anchor)
            .ok_or(MutationError::NotInList)?;
        match node {
            Some(node) => list.insert(index + 1, node),
            None => {
                list.remove(index);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{NodeKind, NodeTag, parse};

    #[test]
    fn test_replace_moves_leading_comments() {
        let mut tree = parse("// about a\na();\nb();\n").unwrap();
        let first = tree.children(tree.root())[0];
        let replacement = tree.alloc(NodeKind::EmptyStatement);
        tree.replace(first, replacement).unwrap();
        assert_eq!(tree.node(replacement).leading_comments[0].text, "// about a");
        assert!(tree.parent(first).is_none());
    }

    #[test]
    fn test_trailing_comment_of_middle_statement_leads_next() {
        let mut tree = parse("a(); // note\nb();\n").unwrap();
        let statements = tree.children(tree.root());
        let x = tree.alloc(NodeKind::EmptyStatement);
        let y = tree.alloc(NodeKind::EmptyStatement);
        tree.replace_many(statements[0], vec![x, y]).unwrap();
        assert_eq!(tree.children(tree.root()), vec![x, y, statements[1]]);
        assert_eq!(tree.node(statements[1]).leading_comments[0].text, "// note");
    }

    #[test]
    fn test_remove_hands_leading_comments_to_previous_when_last() {
        let mut tree = parse("a();\n// about b\nb();\n").unwrap();
        let statements = tree.children(tree.root());
        tree.remove(statements[1]).unwrap();
        assert_eq!(tree.node(statements[0]).trailing_comments[0].text, "// about b");
    }

    #[test]
    fn test_replace_root_is_an_error() {
        let mut tree = parse("a();").unwrap();
        let root = tree.root();
        let node = tree.alloc(NodeKind::EmptyStatement);
        assert!(tree.replace(root, node).is_err());
    }

    #[test]
    fn test_transform_copy_leaves_live_tree_untouched() {
        let mut tree = parse("for (;;) { a(i); }\nb();\n").unwrap();
        let for_statement = tree.children(tree.root())[0];
        let body = *tree.children(for_statement).last().unwrap();

        let (copy, count) = tree
            .transform_copy(body, |tree, copy| {
                let ids: Vec<_> = tree
                    .preorder(copy)
                    .into_iter()
                    .filter(|id| tree.name_of(*id) == Some("i"))
                    .collect();
                for id in &ids {
                    tree.rename_identifier(*id, "item");
                }
                ids.len()
            })
            .unwrap();

        assert_eq!(count, 1);
        assert!(!copy.is_scratch());
        assert!(tree.parent(copy).is_none());
        assert_eq!(tree.children(tree.root()).len(), 2);
        assert!(tree.is_pristine(tree.root()));
        assert_eq!(tree.tag(copy), NodeTag::BlockStatement);
    }
}
