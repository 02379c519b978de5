//! # Refactoring Catalog
//!
//! Registry of the refactorings the engine knows, keyed by the command name
//! the host binds them to.

use super::engine::{ExecutionReport, Recipe, execute};
use crate::editor::Editor;
use crate::errors::EditorError;
use crate::refactorings;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

/// One registered refactoring
#[derive(Clone)]
pub struct RefactoringDefinition {
    pub key: &'static str,
    pub title: &'static str,
    pub recipe: Recipe,
}

/// Listing entry, as printed by `list --json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefactoringInfo {
    pub key: String,
    pub title: String,
}

#[derive(Default)]
pub struct RefactoringCatalog {
    refactorings: HashMap<&'static str, RefactoringDefinition>,
}

impl RefactoringCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding every built-in refactoring
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        for definition in refactorings::all() {
            catalog.register(definition);
        }
        debug!("Loaded {} refactorings", catalog.refactorings.len());
        catalog
    }

    pub fn register(&mut self, definition: RefactoringDefinition) {
        debug!("Registering refactoring '{}'", definition.key);
        self.refactorings.insert(definition.key, definition);
    }

    pub fn get(&self, key: &str) -> Option<&RefactoringDefinition> {
        self.refactorings.get(key)
    }

    /// All keys, sorted
    pub fn list_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.refactorings.keys().map(|key| key.to_string()).collect();
        ids.sort();
        ids
    }

    pub fn summary(&self) -> Vec<RefactoringInfo> {
        self.list_ids()
            .into_iter()
            .filter_map(|key| {
                self.get(&key).map(|definition| RefactoringInfo {
                    title: definition.title.to_string(),
                    key,
                })
            })
            .collect()
    }

    /// Run the refactoring registered under `key`. `None` when the key is
    /// unknown.
    pub async fn run(&self, key: &str, editor: &dyn Editor) -> Option<Result<ExecutionReport, EditorError>> {
        let definition = self.get(key)?;
        info!("Running '{}'", definition.title);
        Some(execute(&definition.recipe, editor).await)
    }
}
