//! # refactor-engine
//!
//! Format-preserving refactorings for JavaScript. Source text is parsed into
//! a tree that remembers where every node came from, a refactoring picks the
//! construct under the user's selection and rewrites it, and the printer
//! reuses the original text for everything the rewrite did not touch.
//!
//! Refactorings never perform effects themselves: they return
//! [`Command`](refactoring::Command)s that [`execute`](refactoring::execute)
//! carries out against an [`Editor`](editor::Editor).

pub mod ast;
pub mod config;
pub mod editor;
pub mod errors;
pub mod refactoring;
pub mod refactorings;

pub use ast::{Position, Selection, Transformed, transform};
pub use config::EngineConfig;
pub use editor::{Editor, FsEditor, FsEditorOptions, InMemoryEditor};
pub use errors::{ErrorReason, RefactorError};
pub use refactoring::{RefactoringCatalog, execute};
