//! # Refactoring System
//!
//! The command protocol refactorings speak, the interpreter that carries
//! the commands out, and the catalog the host picks refactorings from.

pub mod catalog;
pub mod engine;

pub use catalog::{RefactoringCatalog, RefactoringDefinition, RefactoringInfo};
pub use engine::{
    Action, Command, EditorRefactoring, ExecutionReport, Phase, Recipe, Refactoring, RefactoringState, execute,
};
