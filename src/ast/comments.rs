//! # Comment Attachment
//!
//! Comments collected by the lexer are attached to the statements around
//! them so they travel with those statements through mutations. Comments
//! that do not sit between two statements (inside an expression, say) are
//! left floating: they stay in the original text of their enclosing node.

use super::node::{Comment, NodeId, NodeKind};
use super::position::Span;
use super::tree::Tree;

/// Statements (or class members) of a statement-list node
pub fn statement_list(kind: &NodeKind) -> Option<&Vec<NodeId>> {
    match kind {
        NodeKind::Program { body }
        | NodeKind::BlockStatement { body }
        | NodeKind::ClassDeclaration { body, .. } => Some(body),
        NodeKind::SwitchCase { consequent, .. } => Some(consequent),
        _ => None,
    }
}

enum Placement {
    Leading(NodeId),
    Trailing(NodeId),
}

pub(crate) fn attach(tree: &mut Tree, comments: Vec<Comment>) {
    for comment in comments {
        let Some(span) = comment.span else {
            continue;
        };
        let Some(placement) = placement(tree, &span) else {
            continue;
        };
        match placement {
            Placement::Leading(owner) => {
                let node = tree.node_mut(owner);
                node.extent = node.extent.map(|extent| extent.cover(span));
                node.leading_comments.push(comment);
            }
            Placement::Trailing(owner) => {
                let node = tree.node_mut(owner);
                node.extent = node.extent.map(|extent| extent.cover(span));
                node.trailing_comments.push(comment);
            }
        }
    }
}

fn placement(tree: &Tree, comment: &Span) -> Option<Placement> {
    let container = container_for(tree, tree.root(), comment)?;
    let list = statement_list(tree.kind(container))?;
    let spans: Vec<(NodeId, Span)> = list
        .iter()
        .filter_map(|id| tree.span(*id).map(|span| (*id, span)))
        .collect();

    let previous = spans.iter().rev().find(|(_, span)| span.end <= comment.start);
    let next = spans.iter().find(|(_, span)| span.start >= comment.end);

    match (previous, next) {
        (Some((id, span)), _) if span.end_pos.line == comment.start_pos.line => Some(Placement::Trailing(*id)),
        (_, Some((id, _))) => Some(Placement::Leading(*id)),
        (Some((id, _)), None) => Some(Placement::Trailing(*id)),
        (None, None) => None,
    }
}

/// Deepest statement-list node holding the comment between its elements
fn container_for(tree: &Tree, node: NodeId, comment: &Span) -> Option<NodeId> {
    let inner = tree
        .children(node)
        .into_iter()
        .find(|child| tree.span(*child).is_some_and(|span| span.encloses(comment)));
    match inner {
        Some(child) => container_for(tree, child, comment),
        None => statement_list(tree.kind(node)).map(|_| node),
    }
}

/// The comment starts its own line in the original text
pub fn starts_own_line(tree: &Tree, comment: &Comment) -> bool {
    comment.span.is_some_and(|span| {
        let before = &tree.source().text()[..span.start];
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        before[line_start..].trim().is_empty()
    })
}
