// Common test utilities
#![allow(dead_code)]

use refactor_engine::{EngineConfig, InMemoryEditor, Selection};
use std::fs;
use tempfile::TempDir;

/// Workspace directory holding `files` (relative path, content)
pub fn setup_workspace(files: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for (path, content) in files {
        let path = temp_dir.path().join(path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
    temp_dir
}

pub fn workspace_config(dir: &TempDir) -> EngineConfig {
    EngineConfig {
        root_directory: dir.path().to_path_buf(),
        ..Default::default()
    }
}

/// In-memory editor on `code` with the cursor at `line`:`character` (0-based)
pub fn editor_at(code: &str, line: usize, character: usize) -> InMemoryEditor {
    InMemoryEditor::new(code).with_selection(Selection::cursor_at(line, character))
}
