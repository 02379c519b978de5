//! Replace every read of a variable with its initializer and drop the
//! declaration.

use super::references::{binding_references, expand_shorthand};
use crate::ast::{NodeId, NodeKind, NodeTag, Pattern, Selection, Transformed, Tree, select_deepest, transform};
use crate::errors::{ErrorReason, MutationError, RefactorError};
use crate::refactoring::{Command, Recipe, RefactoringDefinition, RefactoringState};
use std::sync::Arc;
use tracing::debug;

pub fn definition() -> RefactoringDefinition {
    RefactoringDefinition {
        key: "inlineVariable",
        title: "Inline Variable",
        recipe: Recipe::Pure(Arc::new(decide)),
    }
}

fn decide(state: &RefactoringState) -> Command {
    Command::from_transform(
        inline_variable(&state.code, state.selection),
        ErrorReason::DidNotFindInlinableCode,
    )
}

struct Inlinable {
    binding: NodeId,
    name: String,
    init: NodeId,
}

pub fn inline_variable(code: &str, selection: Selection) -> Result<Transformed, RefactorError> {
    let (transformed, ()) = transform(code, |tree| {
        let pattern = Pattern::new().on(NodeTag::VariableDeclarator, move |tree: &Tree, id| {
            tree.span(id)
                .filter(|span| selection.is_inside_node(span))
                .and_then(|_| inlinable(tree, id))
        });
        match select_deepest(tree, &pattern) {
            Some(found) => inline(tree, found.node, found.binding),
            None => Ok(()),
        }
    })?;
    Ok(transformed)
}

fn inlinable(tree: &Tree, declarator: NodeId) -> Option<Inlinable> {
    let NodeKind::VariableDeclarator { id, init: Some(init) } = tree.kind(declarator) else {
        return None;
    };
    let declaration = tree.parent(declarator)?;
    // `for (let i = 0; …)` declares a loop variable, not a value to inline
    let in_statement_list = tree
        .parent(declaration)
        .is_some_and(|parent| tree.kind(parent).has_statement_list());
    if !in_statement_list {
        return None;
    }
    Some(Inlinable {
        binding: *id,
        name: tree.name_of(*id)?.to_string(),
        init: *init,
    })
}

fn inline(tree: &mut Tree, declarator: NodeId, inlinable: Inlinable) -> Result<(), RefactorError> {
    let references: Vec<NodeId> = binding_references(tree, inlinable.binding, &inlinable.name)
        .into_iter()
        .filter(|reference| !tree.is_descendant_of(*reference, declarator))
        .collect();

    if references.iter().any(|reference| is_written(tree, *reference)) {
        return Err(RefactorError::Unsupported(ErrorReason::CantInlineRedeclaredVariables));
    }
    if references.is_empty() {
        return Err(RefactorError::NotFound(ErrorReason::DidNotFindInlinableCodeIdentifiers));
    }

    debug!("Inlining {} into {} references", inlinable.name, references.len());
    for reference in references {
        let value = tree.clone_subtree(inlinable.init);
        tree.replace(reference, value)?;
        expand_shorthand(tree, value);
    }

    let declaration = tree.parent(declarator).ok_or(MutationError::Detached)?;
    let single = matches!(
        tree.kind(declaration),
        NodeKind::VariableDeclaration { declarations, .. } if declarations.len() == 1
    );
    if single {
        tree.remove(declaration)?;
    } else {
        tree.remove(declarator)?;
    }
    Ok(())
}

/// The reference is assigned to or updated.
fn is_written(tree: &Tree, reference: NodeId) -> bool {
    let Some(parent) = tree.parent(reference) else {
        return false;
    };
    match tree.kind(parent) {
        NodeKind::AssignmentExpression { left, .. } => *left == reference,
        NodeKind::UpdateExpression { .. } => true,
        NodeKind::ForOfStatement { left, .. } | NodeKind::ForInStatement { left, .. } => *left == reference,
        _ => false,
    }
}
