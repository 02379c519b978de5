//! Drop an `else` that the `if` branch never falls through to, moving its
//! statements after the `if`.
//!
//! ```js
//! if (!user) {
//!   return;
//! } else {
//!   greet(user);
//! }
//! // becomes
//! if (!user) {
//!   return;
//! }
//! greet(user);
//! ```
//!
//! An `if` closing a function body qualifies too: its branch gets an
//! explicit `return;` so the moved statements still only run on `else`.

use crate::ast::{NodeId, NodeKind, NodeTag, Pattern, Selection, Transformed, Tree, select_deepest, transform};
use crate::errors::{ErrorReason, RefactorError};
use crate::refactoring::{Command, Recipe, RefactoringDefinition, RefactoringState};
use std::sync::Arc;

pub fn definition() -> RefactoringDefinition {
    RefactoringDefinition {
        key: "removeRedundantElse",
        title: "Remove Redundant Else",
        recipe: Recipe::Pure(Arc::new(decide)),
    }
}

fn decide(state: &RefactoringState) -> Command {
    Command::from_transform(
        remove_redundant_else(&state.code, state.selection),
        ErrorReason::DidNotFindRedundantElse,
    )
}

#[derive(Debug, Clone, Copy)]
struct RedundantElse {
    consequent: NodeId,
    alternate: NodeId,
    needs_return: bool,
}

pub fn remove_redundant_else(code: &str, selection: Selection) -> Result<Transformed, RefactorError> {
    let (transformed, ()) = transform(code, |tree| {
        let pattern = Pattern::new().on(NodeTag::IfStatement, move |tree: &Tree, id| {
            tree.span(id)
                .filter(|span| selection.is_inside_node(span))
                .and_then(|_| redundant_else(tree, id))
        });
        let Some(found) = select_deepest(tree, &pattern) else {
            return Ok(());
        };
        let RedundantElse {
            consequent,
            alternate,
            needs_return,
        } = found.binding;

        if needs_return {
            let exit = tree.return_statement(None);
            tree.push_child(consequent, exit)?;
        }
        let moved = statements_of(tree, alternate);
        tree.remove(alternate)?;
        for statement in moved.into_iter().rev() {
            tree.insert_after(found.node, statement)?;
        }
        Ok(())
    })?;
    Ok(transformed)
}

fn redundant_else(tree: &Tree, id: NodeId) -> Option<RedundantElse> {
    let NodeKind::IfStatement {
        consequent,
        alternate: Some(alternate),
        ..
    } = tree.kind(id)
    else {
        return None;
    };
    let parent = tree.parent(id)?;
    if !tree.kind(parent).has_statement_list() {
        return None;
    }

    let needs_return = if exits(tree, *consequent) {
        false
    } else if closes_function_body(tree, id) && tree.tag(*consequent) == NodeTag::BlockStatement {
        true
    } else {
        return None;
    };
    Some(RedundantElse {
        consequent: *consequent,
        alternate: *alternate,
        needs_return,
    })
}

/// The branch always ends in `return` or `throw`.
fn exits(tree: &Tree, branch: NodeId) -> bool {
    statements_of(tree, branch)
        .last()
        .is_some_and(|last| matches!(tree.tag(*last), NodeTag::ReturnStatement | NodeTag::ThrowStatement))
}

fn closes_function_body(tree: &Tree, id: NodeId) -> bool {
    if tree.has_next_sibling(id) {
        return false;
    }
    tree.parent(id)
        .filter(|body| tree.tag(*body) == NodeTag::BlockStatement)
        .and_then(|body| tree.parent(body))
        .is_some_and(|function| tree.kind(function).is_function())
}

fn statements_of(tree: &Tree, branch: NodeId) -> Vec<NodeId> {
    match tree.kind(branch) {
        NodeKind::BlockStatement { body } => body.clone(),
        _ => vec![branch],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn removed(code: &str, selection: Selection) -> Transformed {
        remove_redundant_else(code, selection).unwrap()
    }

    #[test]
    fn test_else_after_return() {
        let code = "function f(a) {\n  if (a) {\n    return 1;\n  } else {\n    log(a);\n    return 2;\n  }\n}\n";
        assert_eq!(
            removed(code, Selection::cursor_at(1, 2)).code,
            "function f(a) {\n  if (a) {\n    return 1;\n  }\n  log(a);\n  return 2;\n}\n"
        );
    }

    #[test]
    fn test_last_statement_gets_explicit_return() {
        let code = "function f(a) {\n  if (a) {\n    one();\n  } else {\n    two();\n  }\n}\n";
        assert_eq!(
            removed(code, Selection::cursor_at(1, 2)).code,
            "function f(a) {\n  if (a) {\n    one();\n    return;\n  }\n  two();\n}\n"
        );
    }

    #[test]
    fn test_moved_template_literal_keeps_its_value() {
        let code = "function f(a) {\n  if (a) {\n    return 1;\n  } else {\n    log(`x\n    y`);\n  }\n}\n";
        assert_eq!(
            removed(code, Selection::cursor_at(1, 2)).code,
            "function f(a) {\n  if (a) {\n    return 1;\n  }\n  log(`x\n    y`);\n}\n"
        );
    }

    #[test]
    fn test_else_if_is_moved_whole() {
        let code = "if (a) {\n  throw error;\n} else if (b) {\n  c();\n}\nd();\n";
        assert_eq!(
            removed(code, Selection::cursor_at(0, 0)).code,
            "if (a) {\n  throw error;\n}\nif (b) {\n  c();\n}\nd();\n"
        );
    }

    #[test]
    fn test_needed_else_is_kept() {
        let code = "if (a) {\n  b();\n} else {\n  c();\n}\nd();\n";
        assert!(!removed(code, Selection::cursor_at(0, 0)).has_code_changed);
    }
}
