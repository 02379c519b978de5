//! Split `const a = 1, b = 2;` into `let a, b;` followed by one assignment
//! per initialized variable.

use crate::ast::{
    DeclarationKind, NodeId, NodeKind, NodeTag, Pattern, Selection, Transformed, Tree, select_deepest, transform,
};
use crate::errors::{ErrorReason, RefactorError};
use crate::refactoring::{Command, Recipe, RefactoringDefinition, RefactoringState};
use std::sync::Arc;

pub fn definition() -> RefactoringDefinition {
    RefactoringDefinition {
        key: "splitDeclarationAndInitialization",
        title: "Split Declaration and Initialization",
        recipe: Recipe::Pure(Arc::new(decide)),
    }
}

fn decide(state: &RefactoringState) -> Command {
    Command::from_transform(
        split_declaration_and_initialization(&state.code, state.selection),
        ErrorReason::DidNotFindDeclarationToSplit,
    )
}

/// Name and initializer of each declarator
type Declared = Vec<(String, Option<NodeId>)>;

pub fn split_declaration_and_initialization(code: &str, selection: Selection) -> Result<Transformed, RefactorError> {
    let (transformed, ()) = transform(code, |tree| {
        let pattern = Pattern::new().on(NodeTag::VariableDeclaration, move |tree: &Tree, id| {
            tree.span(id)
                .filter(|span| selection.is_inside_node(span))
                .and_then(|_| splittable(tree, id))
        });
        let Some(found) = select_deepest(tree, &pattern) else {
            return Ok(());
        };
        let NodeKind::VariableDeclaration { kind, .. } = tree.kind(found.node) else {
            return Ok(());
        };
        let kind = match kind {
            DeclarationKind::Const => DeclarationKind::Let,
            other => *other,
        };

        let declarators = found
            .binding
            .iter()
            .map(|(name, _)| {
                let id = tree.identifier(name);
                tree.declarator(id, None)
            })
            .collect();
        let mut statements = vec![tree.declaration(kind, declarators)];
        for (name, init) in &found.binding {
            if let Some(init) = init {
                let target = tree.identifier(name);
                let assignment = tree.assignment(target, *init);
                statements.push(tree.expression_statement(assignment));
            }
        }
        tree.replace_many(found.node, statements)?;
        Ok(())
    })?;
    Ok(transformed)
}

/// Declarations of plain identifiers, at least one initialized, outside a
/// loop head
fn splittable(tree: &Tree, declaration: NodeId) -> Option<Declared> {
    let NodeKind::VariableDeclaration { declarations, .. } = tree.kind(declaration) else {
        return None;
    };
    let parent = tree.parent(declaration)?;
    if !tree.kind(parent).has_statement_list() {
        return None;
    }
    let declared = declarations
        .iter()
        .map(|declarator| match tree.kind(*declarator) {
            NodeKind::VariableDeclarator { id, init } => Some((tree.name_of(*id)?.to_string(), *init)),
            _ => None,
        })
        .collect::<Option<Declared>>()?;
    declared.iter().any(|(_, init)| init.is_some()).then_some(declared)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(code: &str, selection: Selection) -> Transformed {
        split_declaration_and_initialization(code, selection).unwrap()
    }

    #[test]
    fn test_const_becomes_let() {
        assert_eq!(split("const a = 1;\n", Selection::cursor_at(0, 0)).code, "let a;\na = 1;\n");
    }

    #[test]
    fn test_several_declarators_in_function() {
        let code = "function f() {\n  var a = 1, b, c = g();\n  return a + c;\n}\n";
        assert_eq!(
            split(code, Selection::cursor_at(1, 2)).code,
            "function f() {\n  var a, b, c;\n  a = 1;\n  c = g();\n  return a + c;\n}\n"
        );
    }

    #[test]
    fn test_leading_comment_stays_on_top() {
        let code = "// the answer\nlet answer = 42;\n";
        assert_eq!(
            split(code, Selection::cursor_at(1, 4)).code,
            "// the answer\nlet answer;\nanswer = 42;\n"
        );
    }

    #[test]
    fn test_nothing_to_split() {
        assert!(!split("let a;\n", Selection::cursor_at(0, 0)).has_code_changed);
        assert!(!split("const { a } = b;\n", Selection::cursor_at(0, 0)).has_code_changed);
        assert!(!split("for (let i = 0; i < 2; i++) {}\n", Selection::cursor_at(0, 6)).has_code_changed);
    }
}
