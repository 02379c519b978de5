//! # Editor Collaborator
//!
//! The engine never touches a buffer, a file or a prompt directly. All of
//! that goes through an [`Editor`]: the host editor in production, an
//! [`InMemoryEditor`] in tests, a [`FsEditor`] for the command line.

mod dialog;
mod fs;
mod in_memory;

pub use dialog::{DialogHost, DialogSession};
pub use fs::{FsEditor, FsEditorOptions};
pub use in_memory::{InMemoryEditor, PositionAnswer};

use crate::ast::{Position, Selection};
use crate::errors::EditorError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub type Code = String;

/// Operations the host editor may be able to do natively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NativeCommand {
    RenameSymbol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegateResult {
    Ok,
    NotSupported,
}

/// An occurrence of a symbol somewhere in the workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeReference {
    pub path: PathBuf,
    pub selection: Selection,
}

/// A parameter in the reorder dialog: where it was and where it goes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedPosition {
    pub label: String,
    pub start_at: usize,
    pub end_at: usize,
}

impl SelectedPosition {
    /// Positions for `labels` in their current order
    pub fn unchanged(labels: &[String]) -> Vec<SelectedPosition> {
        labels
            .iter()
            .enumerate()
            .map(|(index, label)| SelectedPosition {
                label: label.clone(),
                start_at: index,
                end_at: index,
            })
            .collect()
    }

    /// Positions after moving parameters into `order`, where `order[k]` is
    /// the current index of the parameter that should end up at `k`.
    pub fn reordered(labels: &[String], order: &[usize]) -> Option<Vec<SelectedPosition>> {
        let mut seen = vec![false; labels.len()];
        let mut positions = Vec::with_capacity(order.len());
        for (end_at, start_at) in order.iter().enumerate() {
            let label = labels.get(*start_at)?;
            if std::mem::replace(seen.get_mut(*start_at)?, true) {
                return None;
            }
            positions.push(SelectedPosition {
                label: label.clone(),
                start_at: *start_at,
                end_at,
            });
        }
        (positions.len() == labels.len()).then_some(positions)
    }
}

#[async_trait]
pub trait Editor: Send + Sync {
    /// Code of the active document
    async fn code(&self) -> Code;

    async fn selection(&self) -> Selection;

    /// Replace the active document, optionally moving the cursor.
    async fn write(&self, code: Code, cursor: Option<Position>) -> Result<(), EditorError>;

    async fn write_in(&self, path: &Path, code: Code) -> Result<(), EditorError>;

    async fn code_of(&self, path: &Path) -> Result<Code, EditorError>;

    async fn show_error(&self, message: &str);

    /// `None` means the user cancelled.
    async fn ask_user_input(&self, default_value: Option<String>) -> Option<String>;

    async fn ask_user_choice(&self, choices: Vec<String>) -> Option<String>;

    /// Let the user reorder parameters. `None` means the dialog was
    /// cancelled or superseded.
    async fn ask_for_positions(&self, params: Vec<SelectedPosition>, path: &Path) -> Option<Vec<SelectedPosition>>;

    async fn delegate(&self, command: NativeCommand) -> DelegateResult;

    async fn get_selection_references(&self, selection: Selection) -> Result<Vec<CodeReference>, EditorError>;

    async fn workspace_files(&self) -> Result<Vec<PathBuf>, EditorError>;

    /// Path of the active document
    fn document_path(&self) -> PathBuf;

    async fn highlight(&self, source: Selection, targets: Vec<Selection>);

    async fn remove_highlight(&self, source: Selection);

    /// Source selection of the highlight covering `selection`, if any
    async fn find_highlight(&self, selection: Selection) -> Option<Selection>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<String> {
        vec!["a".into(), "b".into(), "c".into()]
    }

    #[test]
    fn test_reordered_positions() {
        let positions = SelectedPosition::reordered(&labels(), &[2, 0, 1]).unwrap();
        assert_eq!(positions[0].label, "c");
        assert_eq!((positions[0].start_at, positions[0].end_at), (2, 0));
    }

    #[test]
    fn test_reorder_rejects_duplicates_and_gaps() {
        assert!(SelectedPosition::reordered(&labels(), &[0, 0, 1]).is_none());
        assert!(SelectedPosition::reordered(&labels(), &[0, 1]).is_none());
        assert!(SelectedPosition::reordered(&labels(), &[0, 1, 5]).is_none());
    }
}
