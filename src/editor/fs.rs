//! # File-backed Editor
//!
//! Editor collaborator for the command line. The active document is loaded
//! once and kept in memory; other files are read from the workspace root on
//! demand. There is no UI: prompts are answered from values given up front
//! and run out into cancellations, and native commands are never available.

use super::{Code, CodeReference, DelegateResult, Editor, NativeCommand, SelectedPosition};
use crate::ast::{Position, Selection};
use crate::config::EngineConfig;
use crate::errors::EditorError;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const IDENTIFIER: &str = r"[A-Za-z_$][\w$]*";

#[derive(Debug, Clone, Default)]
pub struct FsEditorOptions {
    /// Prompt answers, in order
    pub answers: Vec<String>,
    /// New parameter order for the reorder dialog
    pub order: Option<Vec<usize>>,
    /// Keep writes in memory instead of touching the disk
    pub dry_run: bool,
}

#[derive(Debug, Default)]
struct Buffer {
    code: Code,
    selection: Selection,
    highlights: Vec<(Selection, Vec<Selection>)>,
    errors: Vec<String>,
    written: Vec<(PathBuf, Code)>,
}

pub struct FsEditor {
    config: EngineConfig,
    path: PathBuf,
    buffer: Mutex<Buffer>,
    answers: Mutex<VecDeque<String>>,
    order: Option<Vec<usize>>,
    dry_run: bool,
}

impl FsEditor {
    /// Load `path` (relative to the workspace root) as the active document.
    pub async fn open(
        config: EngineConfig,
        path: &Path,
        selection: Selection,
        options: FsEditorOptions,
    ) -> Result<Self, EditorError> {
        let path = config.resolve(path);
        let code = read_file(&path).await?;
        info!("Opened {} ({} bytes)", path.display(), code.len());
        Ok(Self {
            config,
            path,
            buffer: Mutex::new(Buffer {
                code,
                selection,
                ..Buffer::default()
            }),
            answers: Mutex::new(options.answers.into()),
            order: options.order,
            dry_run: options.dry_run,
        })
    }

    /// Every write so far, in order. In dry-run mode this is the only place
    /// they end up.
    pub async fn written(&self) -> Vec<(PathBuf, Code)> {
        self.buffer.lock().await.written.clone()
    }

    pub async fn errors(&self) -> Vec<String> {
        self.buffer.lock().await.errors.clone()
    }

    fn is_document(&self, path: &Path) -> bool {
        let resolved = self.config.resolve(path);
        if resolved == self.path {
            return true;
        }
        match (resolved.canonicalize(), self.path.canonicalize()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    async fn commit(&self, path: PathBuf, code: Code) -> Result<(), EditorError> {
        if !self.dry_run {
            tokio::fs::write(&path, &code)
                .await
                .map_err(|source| EditorError::Io {
                    path: path.clone(),
                    source,
                })?;
            info!("Wrote {}", path.display());
        }
        self.buffer.lock().await.written.push((path, code));
        Ok(())
    }

    fn glob_set(patterns: &[String]) -> Result<GlobSet, EditorError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(Glob::new(pattern)?);
        }
        Ok(builder.build()?)
    }

    /// Identifier whose text covers the start of `selection`
    async fn identifier_at(&self, selection: Selection) -> Result<Option<String>, EditorError> {
        let code = self.buffer.lock().await.code.clone();
        let identifier = Regex::new(IDENTIFIER)?;
        let start = selection.start();
        let Some(line) = code.lines().nth(start.line) else {
            return Ok(None);
        };
        let found = identifier.find_iter(line).find(|m| {
            let from = line[..m.start()].chars().count();
            let to = from + m.as_str().chars().count();
            from <= start.character && start.character <= to
        });
        Ok(found.map(|m| m.as_str().to_string()))
    }
}

async fn read_file(path: &Path) -> Result<Code, EditorError> {
    tokio::fs::read_to_string(path).await.map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            EditorError::FileNotFound(path.to_path_buf())
        } else {
            EditorError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

/// Selections of every standalone occurrence of `name` in `code`
fn occurrences(code: &str, name: &str, identifier: &Regex) -> Vec<Selection> {
    code.lines()
        .enumerate()
        .flat_map(|(line_index, line)| {
            identifier
                .find_iter(line)
                .filter(|m| m.as_str() == name)
                .map(move |m| {
                    let character = line[..m.start()].chars().count();
                    let length = m.as_str().chars().count();
                    Selection::new(
                        Position::new(line_index, character),
                        Position::new(line_index, character + length),
                    )
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

#[async_trait]
impl Editor for FsEditor {
    async fn code(&self) -> Code {
        self.buffer.lock().await.code.clone()
    }

    async fn selection(&self) -> Selection {
        self.buffer.lock().await.selection
    }

    async fn write(&self, code: Code, cursor: Option<Position>) -> Result<(), EditorError> {
        {
            let mut buffer = self.buffer.lock().await;
            buffer.code = code.clone();
            if let Some(cursor) = cursor {
                buffer.selection = Selection::new(cursor, cursor);
            }
        }
        self.commit(self.path.clone(), code).await
    }

    async fn write_in(&self, path: &Path, code: Code) -> Result<(), EditorError> {
        if self.is_document(path) {
            return self.write(code, None).await;
        }
        self.commit(self.config.resolve(path), code).await
    }

    async fn code_of(&self, path: &Path) -> Result<Code, EditorError> {
        if self.is_document(path) {
            return Ok(self.code().await);
        }
        read_file(&self.config.resolve(path)).await
    }

    async fn show_error(&self, message: &str) {
        warn!("{}", message);
        self.buffer.lock().await.errors.push(message.to_string());
    }

    async fn ask_user_input(&self, _default_value: Option<String>) -> Option<String> {
        self.answers.lock().await.pop_front()
    }

    async fn ask_user_choice(&self, choices: Vec<String>) -> Option<String> {
        let answer = self.answers.lock().await.pop_front()?;
        choices.into_iter().find(|choice| *choice == answer)
    }

    async fn ask_for_positions(&self, params: Vec<SelectedPosition>, path: &Path) -> Option<Vec<SelectedPosition>> {
        let order = self.order.as_ref()?;
        let labels: Vec<String> = params.into_iter().map(|param| param.label).collect();
        let positions = SelectedPosition::reordered(&labels, order);
        if positions.is_none() {
            warn!(
                "Order {:?} is not a permutation of the {} parameters in {}",
                order,
                labels.len(),
                path.display()
            );
        }
        positions
    }

    async fn delegate(&self, command: NativeCommand) -> DelegateResult {
        debug!("No native support for {:?}", command);
        DelegateResult::NotSupported
    }

    async fn get_selection_references(&self, selection: Selection) -> Result<Vec<CodeReference>, EditorError> {
        let Some(name) = self.identifier_at(selection).await? else {
            return Ok(Vec::new());
        };
        let identifier = Regex::new(IDENTIFIER)?;
        let files = self.workspace_files().await?;
        debug!("Searching {} files for references to {}", files.len(), name);

        let mut references: Vec<CodeReference> = stream::iter(files)
            .map(|path| async move {
                let code = self.code_of(&path).await;
                (path, code)
            })
            .buffer_unordered(self.config.max_concurrency.max(1))
            .filter_map(|(path, code)| {
                let name = name.as_str();
                let identifier = &identifier;
                async move {
                    match code {
                        Ok(code) => Some(
                            occurrences(&code, name, identifier)
                                .into_iter()
                                .map(|selection| CodeReference {
                                    path: path.clone(),
                                    selection,
                                })
                                .collect::<Vec<_>>(),
                        ),
                        Err(e) => {
                            tracing::event!(
                                tracing::Level::WARN,
                                file_path = ?path,
                                error = %e,
                                "Error reading file"
                            );
                            None
                        }
                    }
                }
            })
            .flat_map(stream::iter)
            .collect()
            .await;

        references.sort_by(|a, b| {
            a.path
                .cmp(&b.path)
                .then(a.selection.start().cmp(&b.selection.start()))
        });
        Ok(references)
    }

    async fn workspace_files(&self) -> Result<Vec<PathBuf>, EditorError> {
        let include = Self::glob_set(&self.config.include)?;
        let exclude = Self::glob_set(&self.config.exclude)?;
        let root = &self.config.root_directory;

        let mut files = Vec::new();
        for entry in WalkDir::new(root)
            .max_depth(10)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(path);
            if !include.is_match(relative) || exclude.is_match(relative) {
                continue;
            }
            match entry.metadata() {
                Ok(metadata) if metadata.len() <= self.config.max_file_size => {
                    files.push(path.to_path_buf());
                }
                Ok(_) => debug!("Skipping oversized file {}", path.display()),
                Err(e) => warn!("Cannot stat {}: {}", path.display(), e),
            }
        }
        files.sort();
        Ok(files)
    }

    fn document_path(&self) -> PathBuf {
        self.path.clone()
    }

    async fn highlight(&self, source: Selection, targets: Vec<Selection>) {
        let mut buffer = self.buffer.lock().await;
        buffer.highlights.retain(|(existing, _)| *existing != source);
        buffer.highlights.push((source, targets));
    }

    async fn remove_highlight(&self, source: Selection) {
        self.buffer
            .lock()
            .await
            .highlights
            .retain(|(existing, _)| *existing != source);
    }

    async fn find_highlight(&self, selection: Selection) -> Option<Selection> {
        self.buffer
            .lock()
            .await
            .highlights
            .iter()
            .find(|(source, targets)| {
                selection.is_inside(source) || targets.iter().any(|target| selection.is_inside(target))
            })
            .map(|(source, _)| *source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occurrences_skip_longer_identifiers() {
        let identifier = Regex::new(IDENTIFIER).unwrap();
        let found = occurrences("add(1);\nconst adder = add;\n$add();\n", "add", &identifier);
        assert_eq!(
            found,
            vec![
                Selection::from_coords(0, 0, 0, 3),
                Selection::from_coords(1, 14, 1, 17),
            ]
        );
    }

    #[test]
    fn test_occurrences_count_characters_not_bytes() {
        let identifier = Regex::new(IDENTIFIER).unwrap();
        let found = occurrences("const é = 1; f(x);\n", "f", &identifier);
        assert_eq!(found, vec![Selection::from_coords(0, 13, 0, 14)]);
    }
}
