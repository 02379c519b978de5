//! # Tree
//!
//! Arena-backed syntax tree. The live arena holds the parsed program and any
//! node built by a transformation; the scratch arena holds speculative clones
//! and is emptied after every speculation.

use super::node::{ChildSpan, Comment, NodeData, NodeId, NodeKind, NodeTag, Original, Slot, SlotSpans};
use super::position::Span;
use super::source::SourceText;

pub struct Tree {
    source: SourceText,
    live: Vec<NodeData>,
    scratch: Vec<NodeData>,
    root: NodeId,
    hashbang: Option<String>,
}

impl Tree {
    pub(crate) fn from_parts(
        source: SourceText,
        live: Vec<NodeData>,
        root: NodeId,
        hashbang: Option<String>,
    ) -> Self {
        let mut tree = Self {
            source,
            live,
            scratch: Vec::new(),
            root,
            hashbang,
        };
        tree.link_parents(root);
        tree
    }

    pub fn source(&self) -> &SourceText {
        &self.source
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn hashbang(&self) -> Option<&str> {
        self.hashbang.as_deref()
    }

    pub fn node(&self, id: NodeId) -> &NodeData {
        if id.scratch {
            &self.scratch[id.index as usize]
        } else {
            &self.live[id.index as usize]
        }
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        if id.scratch {
            &mut self.scratch[id.index as usize]
        } else {
            &mut self.live[id.index as usize]
        }
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn tag(&self, id: NodeId) -> NodeTag {
        self.kind(id).tag()
    }

    pub fn span(&self, id: NodeId) -> Option<Span> {
        self.node(id).span
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.kind(id).children()
    }

    pub fn name_of(&self, id: NodeId) -> Option<&str> {
        self.kind(id).identifier_name()
    }

    /// Original text of a parsed node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.span(id).map(|span| self.source.slice(&span))
    }

    /// Ancestors from the parent up to the root
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |current| self.parent(*current))
    }

    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// `id` and all its descendants, parents before children
    pub fn preorder(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            result.push(current);
            let mut children = self.children(current);
            children.reverse();
            stack.extend(children);
        }
        result
    }

    /// Siblings sharing the parent's child list, in order
    pub fn siblings(&self, id: NodeId) -> Option<Vec<NodeId>> {
        let parent = self.parent(id)?;
        self.kind(parent).list_containing(id)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.siblings(id)?;
        let index = siblings.iter().position(|s| *s == id)?;
        siblings.get(index + 1).copied()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.siblings(id)?;
        let index = siblings.iter().position(|s| *s == id)?;
        index.checked_sub(1).and_then(|i| siblings.get(i).copied())
    }

    pub fn has_next_sibling(&self, id: NodeId) -> bool {
        self.next_sibling(id).is_some()
    }

    /// Closest ancestor-or-self that is a statement sitting in a list of
    /// statements, where new siblings can be spliced in.
    pub fn enclosing_statement(&self, id: NodeId) -> Option<NodeId> {
        std::iter::once(id).chain(self.ancestors(id)).find(|candidate| {
            self.kind(*candidate).is_statement()
                && self
                    .parent(*candidate)
                    .is_some_and(|p| self.kind(p).has_statement_list())
        })
    }

    /// Span extended over the comments attached at parse time
    pub fn full_span(&self, id: NodeId) -> Option<Span> {
        let node = self.node(id);
        node.extent.or(node.span)
    }

    /// Allocate a detached node built by a transformation.
    pub fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId::live(self.live.len());
        self.live.push(NodeData::new(kind, None));
        self.adopt_children(id);
        id
    }

    pub(crate) fn alloc_scratch(&mut self, data: NodeData) -> NodeId {
        let id = NodeId::scratch(self.scratch.len());
        self.scratch.push(data);
        id
    }

    pub(crate) fn clear_scratch(&mut self) {
        self.scratch.clear();
    }

    /// Point the parent reference of every child of `id` at `id`.
    pub(crate) fn adopt_children(&mut self, id: NodeId) {
        for child in self.children(id) {
            self.node_mut(child).parent = Some(id);
        }
    }

    fn link_parents(&mut self, id: NodeId) {
        for node in self.preorder(id) {
            self.adopt_children(node);
        }
    }

    /// Record that `id`'s own fields are about to change.
    pub(crate) fn touch(&mut self, id: NodeId) {
        let node = self.node(id);
        if node.original.is_none() && node.span.is_some() {
            let original = Original {
                shape: node.kind.shape(),
                slots: self.child_spans(&node.kind),
            };
            self.node_mut(id).original = Some(original);
        }
        self.mark_dirty(id);
    }

    pub(crate) fn child_spans(&self, kind: &NodeKind) -> Option<Vec<SlotSpans>> {
        let child_span = |id: NodeId| {
            Some(ChildSpan {
                span: self.span(id)?,
                extent: self.full_span(id)?,
            })
        };
        kind.slots()
            .into_iter()
            .map(|slot| match slot {
                Slot::One(None) => Some(SlotSpans::One(None)),
                Slot::One(Some(id)) => child_span(id).map(|span| SlotSpans::One(Some(span))),
                Slot::Many(ids) => ids
                    .into_iter()
                    .map(child_span)
                    .collect::<Option<Vec<_>>>()
                    .map(SlotSpans::Many),
            })
            .collect()
    }

    /// Flag every ancestor as holding a mutated descendant. Edits inside
    /// the scratch arena never dirty the live tree they are attached to.
    pub(crate) fn mark_dirty(&mut self, id: NodeId) {
        let ancestors: Vec<NodeId> = self
            .ancestors(id)
            .take_while(|ancestor| !id.scratch || ancestor.scratch)
            .collect();
        for ancestor in ancestors {
            self.node_mut(ancestor).dirty = true;
        }
    }

    /// Mutate a node's fields in place, keeping bookkeeping consistent.
    pub fn update(&mut self, id: NodeId, f: impl FnOnce(&mut NodeKind)) {
        self.touch(id);
        f(&mut self.node_mut(id).kind);
        self.adopt_children(id);
    }

    pub fn rename_identifier(&mut self, id: NodeId, new_name: &str) {
        self.update(id, |kind| {
            if let NodeKind::Identifier { name } = kind {
                *name = new_name.to_string();
            }
        });
    }

    pub fn set_comments(&mut self, id: NodeId, leading: Vec<Comment>, trailing: Vec<Comment>) {
        let node = self.node_mut(id);
        node.leading_comments = leading;
        node.trailing_comments = trailing;
        self.touch_comments(id);
    }

    pub(crate) fn touch_comments(&mut self, id: NodeId) {
        self.node_mut(id).comments_moved = true;
        self.mark_dirty(id);
    }

    /// The node and every descendant still print as their original text.
    pub fn is_pristine(&self, id: NodeId) -> bool {
        let node = self.node(id);
        node.span.is_some() && !node.is_touched() && !node.dirty && !node.comments_moved
    }

    /// Deep copy of a subtree into the live arena. Copies keep their spans
    /// so untouched copies still print as the original text.
    pub fn clone_subtree(&mut self, id: NodeId) -> NodeId {
        let mut data = self.node(id).clone();
        let children = data.kind.children();
        let copies: Vec<(NodeId, NodeId)> = children
            .into_iter()
            .map(|child| (child, self.clone_subtree(child)))
            .collect();
        data.kind.map_children(|child| {
            copies
                .iter()
                .find(|(old, _)| *old == child)
                .map(|(_, copy)| *copy)
                .unwrap_or(child)
        });
        data.parent = None;
        let copy = NodeId::live(self.live.len());
        self.live.push(data);
        self.adopt_children(copy);
        copy
    }

    /// Deep copy of a subtree into the scratch arena
    pub(crate) fn clone_into_scratch(&mut self, id: NodeId) -> NodeId {
        let mut data = self.node(id).clone();
        let children = data.kind.children();
        let copies: Vec<(NodeId, NodeId)> = children
            .into_iter()
            .map(|child| (child, self.clone_into_scratch(child)))
            .collect();
        data.kind.map_children(|child| {
            copies
                .iter()
                .find(|(old, _)| *old == child)
                .map(|(_, copy)| *copy)
                .unwrap_or(child)
        });
        data.parent = None;
        let copy = self.alloc_scratch(data);
        self.adopt_children(copy);
        copy
    }
}

impl std::fmt::Debug for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tree")
            .field("root", &self.root)
            .field("nodes", &self.live.len())
            .field("scratch", &self.scratch.len())
            .finish()
    }
}
