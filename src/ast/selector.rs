//! # Selector
//!
//! Finds the node a recipe should work on. A [`Pattern`] is a partial table
//! of handlers keyed by node tag; each handler decides whether a node of
//! its kind is a target and extracts whatever the recipe needs from it.
//!
//! Traversal visits parents before children. [`select_deepest`] keeps
//! looking below a match and prefers the innermost one, so that with nested
//! `if` statements the one closest to the cursor is picked.

use super::node::{NodeId, NodeTag};
use super::tree::Tree;
use std::collections::HashMap;

type Handler<'a, T> = Box<dyn Fn(&Tree, NodeId) -> Option<T> + 'a>;

/// A matched node plus what its handler extracted
#[derive(Debug, Clone, PartialEq)]
pub struct Match<T> {
    pub node: NodeId,
    pub binding: T,
}

pub struct Pattern<'a, T> {
    handlers: HashMap<NodeTag, Handler<'a, T>>,
}

impl<T> Default for Pattern<'_, T> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }
}

impl<'a, T> Pattern<'a, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for one node kind. Unlisted kinds never match.
    pub fn on(mut self, tag: NodeTag, handler: impl Fn(&Tree, NodeId) -> Option<T> + 'a) -> Self {
        self.handlers.insert(tag, Box::new(handler));
        self
    }

    pub fn matches(&self, tree: &Tree, id: NodeId) -> Option<T> {
        let handler = self.handlers.get(&tree.tag(id))?;
        handler(tree, id)
    }
}

/// Innermost node matching `pattern`, searching from the root.
pub fn select_deepest<T>(tree: &Tree, pattern: &Pattern<'_, T>) -> Option<Match<T>> {
    deepest_from(tree, pattern, tree.root())
}

/// Innermost match within the subtree rooted at `id`
pub fn select_deepest_in<T>(tree: &Tree, pattern: &Pattern<'_, T>, id: NodeId) -> Option<Match<T>> {
    deepest_from(tree, pattern, id)
}

fn deepest_from<T>(tree: &Tree, pattern: &Pattern<'_, T>, id: NodeId) -> Option<Match<T>> {
    for node in tree.preorder(id) {
        if let Some(binding) = pattern.matches(tree, node) {
            let nested = tree
                .children(node)
                .into_iter()
                .find_map(|child| deepest_from(tree, pattern, child));
            return Some(nested.unwrap_or(Match { node, binding }));
        }
    }
    None
}

/// Outermost match, no tie-break
pub fn select_first<T>(tree: &Tree, pattern: &Pattern<'_, T>) -> Option<Match<T>> {
    tree.preorder(tree.root())
        .into_iter()
        .find_map(|node| pattern.matches(tree, node).map(|binding| Match { node, binding }))
}

/// Every match in the subtree rooted at `id`, in document order
pub fn select_all_in<T>(tree: &Tree, pattern: &Pattern<'_, T>, id: NodeId) -> Vec<Match<T>> {
    tree.preorder(id)
        .into_iter()
        .filter_map(|node| pattern.matches(tree, node).map(|binding| Match { node, binding }))
        .collect()
}

pub fn select_all<T>(tree: &Tree, pattern: &Pattern<'_, T>) -> Vec<Match<T>> {
    select_all_in(tree, pattern, tree.root())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Selection, parse};

    fn if_under(selection: Selection) -> Pattern<'static, ()> {
        Pattern::new().on(NodeTag::IfStatement, move |tree: &Tree, id| {
            tree.span(id)
                .filter(|span| selection.is_inside_node(span))
                .map(|_| ())
        })
    }

    const NESTED: &str = "if (a) {\n  if (b) {\n    c();\n  }\n}\n";

    #[test]
    fn test_deepest_match_wins() {
        let tree = parse(NESTED).unwrap();
        let found = select_deepest(&tree, &if_under(Selection::cursor_at(2, 4))).unwrap();
        assert_eq!(tree.text(found.node).unwrap(), "if (b) {\n    c();\n  }");
    }

    #[test]
    fn test_first_match_is_outermost() {
        let tree = parse(NESTED).unwrap();
        let found = select_first(&tree, &if_under(Selection::cursor_at(2, 4))).unwrap();
        assert_eq!(tree.span(found.node).unwrap().start, 0);
    }

    #[test]
    fn test_outer_match_when_cursor_outside_inner() {
        let tree = parse(NESTED).unwrap();
        let found = select_deepest(&tree, &if_under(Selection::cursor_at(0, 1))).unwrap();
        assert_eq!(tree.span(found.node).unwrap().start, 0);
    }

    #[test]
    fn test_no_match() {
        let tree = parse("a();\n").unwrap();
        assert!(select_deepest(&tree, &if_under(Selection::cursor_at(0, 0))).is_none());
    }

    #[test]
    fn test_select_all_in_document_order() {
        let tree = parse("a; b; a;").unwrap();
        let pattern = Pattern::new().on(NodeTag::Identifier, |tree: &Tree, id| {
            tree.name_of(id).filter(|name| *name == "a").map(str::to_string)
        });
        let found = select_all(&tree, &pattern);
        assert_eq!(found.len(), 2);
        assert!(tree.span(found[0].node).unwrap().start < tree.span(found[1].node).unwrap().start);
    }
}
