//! Reduce `&&` / `||` expressions with a literal boolean operand to the side
//! that decides the result: `true && x` is `x`, `x || true` is `true`.
//! `!true` and `!false` count as literals.

use crate::ast::{NodeId, NodeKind, NodeTag, Pattern, Selection, Transformed, Tree, select_deepest, transform};
use crate::errors::{ErrorReason, RefactorError};
use crate::refactoring::{Command, Recipe, RefactoringDefinition, RefactoringState};
use std::sync::Arc;

pub fn definition() -> RefactoringDefinition {
    RefactoringDefinition {
        key: "simplifyBoolean",
        title: "Simplify Boolean",
        recipe: Recipe::Pure(Arc::new(decide)),
    }
}

fn decide(state: &RefactoringState) -> Command {
    Command::from_transform(
        simplify_boolean(&state.code, state.selection),
        ErrorReason::DidNotFindBooleanToSimplify,
    )
}

pub fn simplify_boolean(code: &str, selection: Selection) -> Result<Transformed, RefactorError> {
    let (transformed, ()) = transform(code, |tree| {
        let pattern = Pattern::new().on(NodeTag::LogicalExpression, move |tree: &Tree, id| {
            tree.span(id)
                .filter(|span| selection.is_inside_node(span))
                .and_then(|_| surviving_side(tree, id))
        });
        if let Some(found) = select_deepest(tree, &pattern) {
            tree.replace(found.node, found.binding)?;
        }
        Ok(())
    })?;
    Ok(transformed)
}

/// The operand the expression always evaluates to
fn surviving_side(tree: &Tree, id: NodeId) -> Option<NodeId> {
    let NodeKind::LogicalExpression { operator, left, right } = tree.kind(id) else {
        return None;
    };
    let (left, right) = (*left, *right);
    match (literal(tree, left), operator.as_str(), literal(tree, right)) {
        (Some(true), "||", _) | (Some(false), "&&", _) => Some(left),
        (_, "||", Some(false)) | (_, "&&", Some(true)) => Some(left),
        (Some(false), "||", _) | (Some(true), "&&", _) => Some(right),
        (_, "||", Some(true)) | (_, "&&", Some(false)) => Some(right),
        _ => None,
    }
}

/// Value of `true`, `false`, `!true` or `!false`
fn literal(tree: &Tree, id: NodeId) -> Option<bool> {
    match tree.kind(id) {
        NodeKind::BooleanLiteral { value } => Some(*value),
        NodeKind::UnaryExpression { operator, argument } if operator == "!" => match tree.kind(*argument) {
            NodeKind::BooleanLiteral { value } => Some(!*value),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simplified(code: &str, selection: Selection) -> Transformed {
        simplify_boolean(code, selection).unwrap()
    }

    #[test]
    fn test_true_and_keeps_other_side() {
        assert_eq!(
            simplified("if (true && isValid) { go(); }\n", Selection::cursor_at(0, 5)).code,
            "if (isValid) { go(); }\n"
        );
    }

    #[test]
    fn test_or_false() {
        assert_eq!(
            simplified("const a = b || false;\n", Selection::cursor_at(0, 11)).code,
            "const a = b;\n"
        );
    }

    #[test]
    fn test_negated_literal_decides() {
        assert_eq!(
            simplified("run(!false || retry());\n", Selection::cursor_at(0, 5)).code,
            "run(!false);\n"
        );
    }

    #[test]
    fn test_innermost_expression_first() {
        assert_eq!(
            simplified("f(a && (false || b));\n", Selection::cursor_at(0, 14)).code,
            "f(a && (b));\n"
        );
    }

    #[test]
    fn test_no_literal_operand() {
        assert!(!simplified("f(a && b);\n", Selection::cursor_at(0, 2)).has_code_changed);
    }
}
