//! Flip an if/else: negate the test and swap the branches.

use crate::ast::{NodeId, NodeKind, NodeTag, Pattern, Selection, Transformed, Tree, select_deepest, transform};
use crate::errors::{ErrorReason, RefactorError};
use crate::refactoring::{Command, Recipe, RefactoringDefinition, RefactoringState};
use std::sync::Arc;

pub fn definition() -> RefactoringDefinition {
    RefactoringDefinition {
        key: "flipIfElse",
        title: "Flip If/Else",
        recipe: Recipe::Pure(Arc::new(decide)),
    }
}

fn decide(state: &RefactoringState) -> Command {
    Command::from_transform(
        flip_if_else(&state.code, state.selection),
        ErrorReason::DidNotFindIfElseToFlip,
    )
}

pub fn flip_if_else(code: &str, selection: Selection) -> Result<Transformed, RefactorError> {
    let (transformed, ()) = transform(code, |tree| {
        let pattern = Pattern::new().on(NodeTag::IfStatement, move |tree: &Tree, id| {
            tree.span(id).filter(|span| selection.is_inside_node(span)).map(|_| ())
        });
        if let Some(found) = select_deepest(tree, &pattern) {
            flip(tree, found.node);
        }
        Ok(())
    })?;
    Ok(transformed)
}

fn flip(tree: &mut Tree, if_statement: NodeId) {
    let NodeKind::IfStatement {
        test,
        consequent,
        alternate,
    } = tree.kind(if_statement).clone()
    else {
        return;
    };
    let negated = negate(tree, test);
    let new_consequent = alternate.unwrap_or_else(|| tree.block(Vec::new()));
    tree.update(if_statement, |kind| {
        if let NodeKind::IfStatement {
            test,
            consequent: current_consequent,
            alternate: current_alternate,
        } = kind
        {
            *test = negated;
            *current_consequent = new_consequent;
            *current_alternate = Some(consequent);
        }
    });
}

/// Logical negation of `test`, as a node to put in its place
fn negate(tree: &mut Tree, test: NodeId) -> NodeId {
    match tree.kind(test).clone() {
        NodeKind::UnaryExpression { operator, argument } if operator == "!" => argument,
        NodeKind::BinaryExpression { operator, .. } => match inverse_operator(&operator) {
            Some(inverse) => {
                tree.update(test, |kind| {
                    if let NodeKind::BinaryExpression { operator, .. } = kind {
                        *operator = inverse.to_string();
                    }
                });
                test
            }
            None => tree.unary("!", test),
        },
        _ => tree.unary("!", test),
    }
}

fn inverse_operator(operator: &str) -> Option<&'static str> {
    let inverse = match operator {
        "===" => "!==",
        "!==" => "===",
        "==" => "!=",
        "!=" => "==",
        "<" => ">=",
        ">=" => "<",
        ">" => "<=",
        "<=" => ">",
        _ => return None,
    };
    Some(inverse)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flipped(code: &str, selection: Selection) -> String {
        flip_if_else(code, selection).unwrap().code
    }

    #[test]
    fn test_flip_swaps_branches() {
        assert_eq!(
            flipped("if (a) { return 1; } else { return 2; }\n", Selection::cursor_at(0, 0)),
            "if (!a) { return 2; } else { return 1; }\n"
        );
    }

    #[test]
    fn test_flip_without_else() {
        assert_eq!(
            flipped("if (a) { b(); }\n", Selection::cursor_at(0, 0)),
            "if (!a) {} else { b(); }\n"
        );
    }

    #[test]
    fn test_double_negation_is_removed() {
        assert_eq!(
            flipped("if (!ready) { wait(); } else { go(); }\n", Selection::cursor_at(0, 0)),
            "if (ready) { go(); } else { wait(); }\n"
        );
    }

    #[test]
    fn test_comparison_is_inverted() {
        assert_eq!(
            flipped("if (a > b) { x(); } else { y(); }\n", Selection::cursor_at(0, 0)),
            "if (a <= b) { y(); } else { x(); }\n"
        );
    }

    #[test]
    fn test_compound_test_is_parenthesized() {
        assert_eq!(
            flipped("if (a && b) { x(); } else { y(); }\n", Selection::cursor_at(0, 0)),
            "if (!(a && b)) { y(); } else { x(); }\n"
        );
    }

    #[test]
    fn test_innermost_if_is_flipped() {
        let code = "if (a) {\n  if (b) {\n    x();\n  } else {\n    y();\n  }\n}\n";
        assert_eq!(
            flipped(code, Selection::cursor_at(1, 4)),
            "if (a) {\n  if (!b) {\n    y();\n  } else {\n    x();\n  }\n}\n"
        );
    }

    #[test]
    fn test_no_if_under_selection_leaves_code_alone() {
        let transformed = flip_if_else("a();\nif (b) { c(); }\n", Selection::cursor_at(0, 1)).unwrap();
        assert!(!transformed.has_code_changed);
        assert_eq!(transformed.code, "a();\nif (b) { c(); }\n");
    }

    #[test]
    fn test_decide_reports_missing_if() {
        let state = RefactoringState {
            code: "a();".into(),
            selection: Selection::cursor_at(0, 0),
            phase: crate::refactoring::Phase::New,
        };
        assert_eq!(
            decide(&state).action,
            crate::refactoring::Action::ShowError(ErrorReason::DidNotFindIfElseToFlip.to_string())
        );
    }
}
