//! Convert a counting `for` loop or a `for…of` loop into `list.forEach()`.
//!
//! ```js
//! for (let i = 0; i < items.length; i++) { console.log(items[i]); }
//! // becomes
//! items.forEach((item) => { console.log(item); });
//! ```
//!
//! The index only survives as the callback's second parameter when the body
//! still reads it once every `items[i]` has been replaced. That is decided
//! on an isolated copy of the body, so the live tree is only changed once
//! the outcome is known.

use super::references::references_named;
use crate::ast::{
    DeclarationKind, Match, NodeId, NodeKind, NodeTag, Pattern, Selection, Transformed, Tree, select_deepest,
    transform,
};
use crate::errors::{ErrorReason, MutationError, RefactorError};
use crate::refactoring::{Command, Recipe, RefactoringDefinition, RefactoringState};
use std::sync::Arc;

pub fn definition() -> RefactoringDefinition {
    RefactoringDefinition {
        key: "convertForToForEach",
        title: "Convert For-Loop to ForEach",
        recipe: Recipe::Pure(Arc::new(decide)),
    }
}

fn decide(state: &RefactoringState) -> Command {
    Command::from_transform(
        convert_for_to_for_each(&state.code, state.selection),
        ErrorReason::DidNotFindForLoopToConvert,
    )
}

#[derive(Debug, Clone)]
enum Loop {
    /// `for (let i = 0; i < list.length; i++)`
    Counting { list: NodeId, index: String, body: NodeId },
    /// `for (const item of list)`
    Iterating { list: NodeId, item: NodeId, body: NodeId },
}

pub fn convert_for_to_for_each(code: &str, selection: Selection) -> Result<Transformed, RefactorError> {
    let (transformed, ()) = transform(code, |tree| {
        let under_selection = move |tree: &Tree, id: NodeId| tree.span(id).is_some_and(|span| selection.is_inside_node(&span));
        let pattern = Pattern::new()
            .on(NodeTag::ForStatement, move |tree: &Tree, id| {
                under_selection(tree, id).then(|| counting_loop(tree, id)).flatten()
            })
            .on(NodeTag::ForOfStatement, move |tree: &Tree, id| {
                under_selection(tree, id).then(|| iterating_loop(tree, id)).flatten()
            });
        match select_deepest(tree, &pattern) {
            Some(found) => convert(tree, found),
            None => Ok(()),
        }
    })?;
    Ok(transformed)
}

fn counting_loop(tree: &Tree, id: NodeId) -> Option<Loop> {
    let NodeKind::ForStatement {
        init: Some(init),
        test: Some(test),
        update: Some(update),
        body,
    } = tree.kind(id)
    else {
        return None;
    };
    let NodeKind::VariableDeclaration { declarations, .. } = tree.kind(*init) else {
        return None;
    };
    let (index, start) = declared(tree, *declarations.first()?)?;
    if !matches!(tree.kind(start?), NodeKind::NumericLiteral { raw } if raw == "0") {
        return None;
    }

    let NodeKind::BinaryExpression { operator, left, right } = tree.kind(*test) else {
        return None;
    };
    if tree.name_of(*left) != Some(index) {
        return None;
    }
    let bound = match tree.kind(*right) {
        NodeKind::Identifier { name } => declarations
            .iter()
            .filter_map(|declarator| declared(tree, *declarator))
            .find(|(declared_name, _)| *declared_name == name.as_str())
            .and_then(|(_, init)| init)?,
        _ => *right,
    };
    let list = match operator.as_str() {
        "<" => length_of(tree, bound)?,
        "<=" => last_index_of(tree, bound)?,
        _ => return None,
    };

    if !increments(tree, *update, index) {
        return None;
    }
    Some(Loop::Counting {
        list,
        index: index.to_string(),
        body: *body,
    })
}

fn iterating_loop(tree: &Tree, id: NodeId) -> Option<Loop> {
    let NodeKind::ForOfStatement { left, right, body } = tree.kind(id) else {
        return None;
    };
    let NodeKind::VariableDeclaration { kind, declarations } = tree.kind(*left) else {
        return None;
    };
    if *kind == DeclarationKind::Var || declarations.len() != 1 {
        return None;
    }
    let NodeKind::VariableDeclarator { id: item, .. } = tree.kind(declarations[0]) else {
        return None;
    };
    if !is_list(tree, *right) {
        return None;
    }
    Some(Loop::Iterating {
        list: *right,
        item: *item,
        body: *body,
    })
}

/// Name and initializer of a declarator binding a plain identifier
fn declared(tree: &Tree, declarator: NodeId) -> Option<(&str, Option<NodeId>)> {
    let NodeKind::VariableDeclarator { id, init } = tree.kind(declarator) else {
        return None;
    };
    Some((tree.name_of(*id)?, *init))
}

/// `list` in `list.length`
fn length_of(tree: &Tree, id: NodeId) -> Option<NodeId> {
    let NodeKind::MemberExpression {
        object,
        property,
        computed: false,
        optional: false,
    } = tree.kind(id)
    else {
        return None;
    };
    (tree.name_of(*property) == Some("length") && is_list(tree, *object)).then_some(*object)
}

/// `list` in `list.length - 1`
fn last_index_of(tree: &Tree, id: NodeId) -> Option<NodeId> {
    let NodeKind::BinaryExpression { operator, left, right } = tree.kind(id) else {
        return None;
    };
    let minus_one = operator == "-" && matches!(tree.kind(*right), NodeKind::NumericLiteral { raw } if raw == "1");
    if !minus_one {
        return None;
    }
    length_of(tree, *left)
}

fn is_list(tree: &Tree, id: NodeId) -> bool {
    matches!(
        tree.kind(id),
        NodeKind::Identifier { .. } | NodeKind::MemberExpression { computed: false, .. }
    )
}

/// `i++`, `++i` or `i += 1`
fn increments(tree: &Tree, update: NodeId, index: &str) -> bool {
    match tree.kind(update) {
        NodeKind::UpdateExpression { operator, argument, .. } => {
            operator == "++" && tree.name_of(*argument) == Some(index)
        }
        NodeKind::AssignmentExpression { operator, left, right } => {
            operator == "+="
                && tree.name_of(*left) == Some(index)
                && matches!(tree.kind(*right), NodeKind::NumericLiteral { raw } if raw == "1")
        }
        _ => false,
    }
}

fn convert(tree: &mut Tree, found: Match<Loop>) -> Result<(), RefactorError> {
    let (list, params, body) = match found.binding {
        Loop::Counting { list, index, body } => {
            let item_name = singular(list_name(tree, list));
            let list_text = tree.text(list).map(str::to_string);
            let (body, uses_index) = tree.transform_copy(body, |tree, copy| {
                replace_list_accesses(tree, copy, list_text.as_deref(), &index, &item_name)
                    .map(|()| !references_named(tree, copy, &index).is_empty())
            })?;
            let mut params = vec![tree.identifier(&item_name)];
            if uses_index? {
                params.push(tree.identifier(&index));
            }
            (list, params, body)
        }
        Loop::Iterating { list, item, body } => (list, vec![item], body),
    };

    let body = if tree.tag(body) == NodeTag::BlockStatement {
        body
    } else {
        tree.block(vec![body])
    };
    let callback = tree.arrow(params, body);
    let for_each = tree.member(list, "forEach");
    let call = tree.call(for_each, vec![callback]);
    let statement = tree.expression_statement(call);
    tree.replace(found.node, statement)?;
    Ok(())
}

/// Turn every `list[index]` read under `root` into `item`. Writes to the
/// list keep going through the index.
fn replace_list_accesses(
    tree: &mut Tree,
    root: NodeId,
    list_text: Option<&str>,
    index: &str,
    item: &str,
) -> Result<(), MutationError> {
    let accesses: Vec<NodeId> = tree
        .preorder(root)
        .into_iter()
        .filter(|id| match tree.kind(*id) {
            NodeKind::MemberExpression {
                object,
                property,
                computed: true,
                ..
            } => {
                tree.name_of(*property) == Some(index)
                    && list_text.is_some()
                    && tree.text(*object) == list_text
                    && !is_written(tree, *id)
            }
            _ => false,
        })
        .collect();
    for access in accesses {
        let replacement = tree.identifier(item);
        tree.replace(access, replacement)?;
    }
    Ok(())
}

/// `list[i] = …`, `list[i] += …` or `list[i]++`
fn is_written(tree: &Tree, access: NodeId) -> bool {
    tree.parent(access).is_some_and(|parent| match tree.kind(parent) {
        NodeKind::AssignmentExpression { left, .. } => *left == access,
        NodeKind::UpdateExpression { .. } => true,
        _ => false,
    })
}

fn list_name(tree: &Tree, list: NodeId) -> &str {
    match tree.kind(list) {
        NodeKind::Identifier { name } => name,
        NodeKind::MemberExpression { property, .. } => tree.name_of(*property).unwrap_or("item"),
        _ => "item",
    }
}

/// Name for one element of `list`: `items` → `item`, `entries` → `entry`,
/// `data` → `dataItem`.
fn singular(list: &str) -> String {
    if let Some(stem) = list.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{stem}y");
        }
    }
    match list.strip_suffix('s') {
        Some(stem) if !stem.is_empty() && !stem.ends_with('s') => stem.to_string(),
        _ => format!("{list}Item"),
    }
}
