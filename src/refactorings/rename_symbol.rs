//! # Rename Symbol
//!
//! Rename is first delegated to the host, which usually knows scopes
//! across files. When the host can't do it, the recipe falls back to
//! asking for a new name and renaming every reference in the document.

use super::references::{binding_references, expand_shorthand, identifier_at};
use crate::ast::{Selection, Transformed, parse, transform};
use crate::editor::NativeCommand;
use crate::errors::{ErrorReason, RefactorError};
use crate::refactoring::{Command, Phase, Recipe, RefactoringDefinition, RefactoringState};
use std::sync::Arc;
use tracing::debug;

pub fn definition() -> RefactoringDefinition {
    RefactoringDefinition {
        key: "renameSymbol",
        title: "Rename Symbol",
        recipe: Recipe::Pure(Arc::new(decide)),
    }
}

fn decide(state: &RefactoringState) -> Command {
    match &state.phase {
        Phase::New => Command::delegate(NativeCommand::RenameSymbol),
        Phase::CommandNotSupported => match current_name(&state.code, state.selection) {
            Ok(Some(name)) => Command::ask_user(Some(name)),
            Ok(None) => Command::show_error(ErrorReason::DidNotFindIdentifiersToRename),
            Err(error) => Command::show_error(error),
        },
        Phase::UserResponse(None) => Command::do_nothing(),
        Phase::UserResponse(Some(answer)) => {
            let new_name = answer.trim();
            if new_name.is_empty() {
                return Command::do_nothing();
            }
            match rename_symbol(&state.code, state.selection, new_name) {
                Ok(transformed) if transformed.has_code_changed => Command::write(transformed.code, None),
                Ok(_) => Command::do_nothing(),
                Err(error) => Command::show_error(error),
            }
        }
    }
}

/// Name of the identifier under the selection
fn current_name(code: &str, selection: Selection) -> Result<Option<String>, RefactorError> {
    let tree = parse(code)?;
    Ok(identifier_at(&tree, selection)
        .and_then(|id| tree.name_of(id))
        .map(str::to_string))
}

/// Rename the selected binding and every reference resolving to it.
pub fn rename_symbol(code: &str, selection: Selection, new_name: &str) -> Result<Transformed, RefactorError> {
    let (transformed, ()) = transform(code, |tree| {
        let (selected, name) = identifier_at(tree, selection)
            .and_then(|id| Some((id, tree.name_of(id)?.to_string())))
            .ok_or(RefactorError::NotFound(ErrorReason::DidNotFindIdentifiersToRename))?;
        if name == new_name {
            return Ok(());
        }

        let references = binding_references(tree, selected, &name);
        debug!("Renaming {} references of {} to {}", references.len(), name, new_name);
        for reference in references {
            tree.rename_identifier(reference, new_name);
            expand_shorthand(tree, reference);
        }
        Ok(())
    })?;
    Ok(transformed)
}
