//! # Refactorings
//!
//! The built-in refactorings. Most are pure decision functions over the
//! editor state; change signature and toggle highlight need the editor
//! while deciding and implement [`EditorRefactoring`] instead.
//!
//! [`EditorRefactoring`]: crate::refactoring::EditorRefactoring

pub mod change_signature;
pub mod convert_for_to_for_each;
pub mod flip_if_else;
pub mod inline_variable;
mod references;
pub mod remove_redundant_else;
pub mod rename_symbol;
pub mod simplify_boolean;
pub mod split_declaration_and_initialization;
pub mod toggle_highlight;

use crate::refactoring::RefactoringDefinition;

/// Definitions of every built-in refactoring
pub fn all() -> Vec<RefactoringDefinition> {
    vec![
        flip_if_else::definition(),
        convert_for_to_for_each::definition(),
        change_signature::definition(),
        rename_symbol::definition(),
        inline_variable::definition(),
        split_declaration_and_initialization::definition(),
        remove_redundant_else::definition(),
        simplify_boolean::definition(),
        toggle_highlight::definition(),
    ]
}
