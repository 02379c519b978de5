//! Scripted editor holding documents in memory.
//!
//! Used by tests and embedders that drive the engine without a UI: prompts
//! are answered from a queue, reference lookup returns whatever was
//! configured and every write is recorded.

use super::{Code, CodeReference, DelegateResult, DialogHost, Editor, NativeCommand, SelectedPosition};
use crate::ast::{Position, Selection};
use crate::errors::EditorError;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// How the parameter ordering dialog gets answered
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PositionAnswer {
    /// `order[k]` is the current index of the parameter moved to `k`
    Order(Vec<usize>),
    #[default]
    Cancel,
    /// Wait until someone resolves the session through [`InMemoryEditor::dialogs`]
    Interactive,
}

#[derive(Debug, Default)]
struct Documents {
    code: Code,
    selection: Option<Selection>,
    cursor: Option<Position>,
    files: HashMap<PathBuf, Code>,
    highlights: Vec<(Selection, Vec<Selection>)>,
    errors: Vec<String>,
    writes: usize,
}

pub struct InMemoryEditor {
    path: PathBuf,
    documents: Mutex<Documents>,
    answers: Mutex<VecDeque<Option<String>>>,
    positions: PositionAnswer,
    delegate_result: DelegateResult,
    references: Vec<CodeReference>,
    failing_writes: Vec<PathBuf>,
    dialogs: DialogHost<Vec<SelectedPosition>>,
}

impl InMemoryEditor {
    pub fn new(code: impl Into<Code>) -> Self {
        Self {
            path: PathBuf::from("index.js"),
            documents: Mutex::new(Documents {
                code: code.into(),
                ..Documents::default()
            }),
            answers: Mutex::new(VecDeque::new()),
            positions: PositionAnswer::default(),
            delegate_result: DelegateResult::NotSupported,
            references: Vec::new(),
            failing_writes: Vec::new(),
            dialogs: DialogHost::new(),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.documents.get_mut().selection = Some(selection);
        self
    }

    /// Another workspace file
    pub fn with_file(mut self, path: impl Into<PathBuf>, code: impl Into<Code>) -> Self {
        self.documents.get_mut().files.insert(path.into(), code.into());
        self
    }

    /// Next answer to a prompt; `None` cancels it.
    pub fn with_answer(mut self, answer: Option<&str>) -> Self {
        self.answers.get_mut().push_back(answer.map(str::to_string));
        self
    }

    pub fn with_positions(mut self, positions: PositionAnswer) -> Self {
        self.positions = positions;
        self
    }

    pub fn with_delegate_result(mut self, result: DelegateResult) -> Self {
        self.delegate_result = result;
        self
    }

    pub fn with_references(mut self, references: Vec<CodeReference>) -> Self {
        self.references = references;
        self
    }

    /// Make `write_in` fail for `path`
    pub fn with_failing_write(mut self, path: impl Into<PathBuf>) -> Self {
        self.failing_writes.push(path.into());
        self
    }

    pub fn dialogs(&self) -> &DialogHost<Vec<SelectedPosition>> {
        &self.dialogs
    }

    pub async fn code_in(&self, path: &Path) -> Option<Code> {
        let documents = self.documents.lock().await;
        if path == self.path {
            return Some(documents.code.clone());
        }
        documents.files.get(path).cloned()
    }

    pub async fn cursor(&self) -> Option<Position> {
        self.documents.lock().await.cursor
    }

    pub async fn errors(&self) -> Vec<String> {
        self.documents.lock().await.errors.clone()
    }

    /// Number of successful writes, active document and other files
    pub async fn write_count(&self) -> usize {
        self.documents.lock().await.writes
    }

    pub async fn highlights(&self) -> Vec<(Selection, Vec<Selection>)> {
        self.documents.lock().await.highlights.clone()
    }

    async fn next_answer(&self) -> Option<String> {
        self.answers.lock().await.pop_front().flatten()
    }
}

#[async_trait]
impl Editor for InMemoryEditor {
    async fn code(&self) -> Code {
        self.documents.lock().await.code.clone()
    }

    async fn selection(&self) -> Selection {
        self.documents
            .lock()
            .await
            .selection
            .unwrap_or_else(|| Selection::cursor_at(0, 0))
    }

    async fn write(&self, code: Code, cursor: Option<Position>) -> Result<(), EditorError> {
        let mut documents = self.documents.lock().await;
        documents.code = code;
        if let Some(cursor) = cursor {
            documents.cursor = Some(cursor);
            documents.selection = Some(Selection::new(cursor, cursor));
        }
        documents.writes += 1;
        Ok(())
    }

    async fn write_in(&self, path: &Path, code: Code) -> Result<(), EditorError> {
        if self.failing_writes.iter().any(|failing| failing == path) {
            return Err(EditorError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        let mut documents = self.documents.lock().await;
        if path == self.path {
            documents.code = code;
        } else {
            documents.files.insert(path.to_path_buf(), code);
        }
        documents.writes += 1;
        Ok(())
    }

    async fn code_of(&self, path: &Path) -> Result<Code, EditorError> {
        self.code_in(path)
            .await
            .ok_or_else(|| EditorError::FileNotFound(path.to_path_buf()))
    }

    async fn show_error(&self, message: &str) {
        self.documents.lock().await.errors.push(message.to_string());
    }

    async fn ask_user_input(&self, _default_value: Option<String>) -> Option<String> {
        self.next_answer().await
    }

    async fn ask_user_choice(&self, choices: Vec<String>) -> Option<String> {
        let answer = self.next_answer().await?;
        choices.into_iter().find(|choice| *choice == answer)
    }

    async fn ask_for_positions(&self, params: Vec<SelectedPosition>, _path: &Path) -> Option<Vec<SelectedPosition>> {
        let session = self.dialogs.open().await;
        match &self.positions {
            PositionAnswer::Order(order) => {
                let labels: Vec<String> = params.into_iter().map(|param| param.label).collect();
                match SelectedPosition::reordered(&labels, order) {
                    Some(positions) => self.dialogs.confirm(positions).await,
                    None => self.dialogs.cancel().await,
                };
            }
            PositionAnswer::Cancel => {
                self.dialogs.cancel().await;
            }
            PositionAnswer::Interactive => {}
        }
        session.response().await
    }

    async fn delegate(&self, _command: NativeCommand) -> DelegateResult {
        self.delegate_result
    }

    async fn get_selection_references(&self, _selection: Selection) -> Result<Vec<CodeReference>, EditorError> {
        Ok(self.references.clone())
    }

    async fn workspace_files(&self) -> Result<Vec<PathBuf>, EditorError> {
        let documents = self.documents.lock().await;
        let mut files: Vec<PathBuf> = std::iter::once(self.path.clone())
            .chain(documents.files.keys().cloned())
            .collect();
        files.sort();
        Ok(files)
    }

    fn document_path(&self) -> PathBuf {
        self.path.clone()
    }

    async fn highlight(&self, source: Selection, targets: Vec<Selection>) {
        let mut documents = self.documents.lock().await;
        documents.highlights.retain(|(existing, _)| *existing != source);
        documents.highlights.push((source, targets));
    }

    async fn remove_highlight(&self, source: Selection) {
        self.documents
            .lock()
            .await
            .highlights
            .retain(|(existing, _)| *existing != source);
    }

    async fn find_highlight(&self, selection: Selection) -> Option<Selection> {
        self.documents
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
    use std::sync::Arc;

    #[tokio::test]
    async fn test_answers_are_consumed_in_order() {
        let editor = InMemoryEditor::new("").with_answer(Some("first")).with_answer(None);
        assert_eq!(editor.ask_user_input(None).await, Some("first".to_string()));
        assert_eq!(editor.ask_user_input(None).await, None);
        assert_eq!(editor.ask_user_input(None).await, None);
    }

    #[tokio::test]
    async fn test_choice_must_be_offered() {
        let editor = InMemoryEditor::new("").with_answer(Some("b")).with_answer(Some("z"));
        let choices = vec!["a".to_string(), "b".to_string()];
        assert_eq!(editor.ask_user_choice(choices.clone()).await, Some("b".to_string()));
        assert_eq!(editor.ask_user_choice(choices).await, None);
    }

    #[tokio::test]
    async fn test_write_moves_cursor() {
        let editor = InMemoryEditor::new("a;");
        editor.write("b;".into(), Some(Position::new(0, 1))).await.unwrap();
        assert_eq!(editor.code().await, "b;");
        assert_eq!(editor.cursor().await, Some(Position::new(0, 1)));
        assert_eq!(editor.write_count().await, 1);
    }

    #[tokio::test]
    async fn test_scripted_order() {
        let editor = InMemoryEditor::new("").with_positions(PositionAnswer::Order(vec![1, 0]));
        let params = SelectedPosition::unchanged(&["a".to_string(), "b".to_string()]);
        let positions = editor.ask_for_positions(params, Path::new("index.js")).await.unwrap();
        assert_eq!(positions[0].label, "b");
    }

    #[tokio::test]
    async fn test_interactive_dialog_resolved_from_outside() {
        let editor = Arc::new(InMemoryEditor::new("").with_positions(PositionAnswer::Interactive));
        let params = SelectedPosition::unchanged(&["a".to_string()]);
        let waiting = {
            let editor = editor.clone();
            let params = params.clone();
            tokio::spawn(async move { editor.ask_for_positions(params, Path::new("index.js")).await })
        };
        while !editor.dialogs().is_open().await {
            tokio::task::yield_now().await;
        }
        assert!(editor.dialogs().confirm(params.clone()).await);
        assert_eq!(waiting.await.unwrap(), Some(params));
    }

    #[tokio::test]
    async fn test_highlight_lookup() {
        let editor = InMemoryEditor::new("");
        let source = Selection::from_coords(0, 4, 0, 5);
        let target = Selection::from_coords(2, 0, 2, 1);
        editor.highlight(source, vec![target]).await;
        assert_eq!(editor.find_highlight(Selection::cursor_at(2, 1)).await, Some(source));
        editor.remove_highlight(source).await;
        assert_eq!(editor.find_highlight(Selection::cursor_at(2, 1)).await, None);
    }
}
