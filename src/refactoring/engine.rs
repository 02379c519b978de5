//! # Refactoring Engine
//!
//! A refactoring is a pure function from the editor state to a [`Command`].
//! It never talks to the editor itself: it asks the interpreter to write,
//! to delegate to the host or to prompt the user, and gets called again
//! with the outcome. [`execute`] is the only place where these commands
//! turn into effects.

use crate::ast::{Position, Selection, Transformed};
use crate::editor::{Code, DelegateResult, Editor, NativeCommand};
use crate::errors::{EditorError, ErrorReason, RefactorError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Commands a single invocation may go through before giving up
const MAX_STEPS: usize = 64;

/// Why a refactoring is being (re)invoked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    New,
    /// The host could not perform the delegated command
    CommandNotSupported,
    /// Answer to the last prompt, `None` when cancelled
    UserResponse(Option<String>),
}

#[derive(Debug, Clone)]
pub struct RefactoringState {
    pub code: Code,
    pub selection: Selection,
    pub phase: Phase,
}

pub type Refactoring = Arc<dyn Fn(&RefactoringState) -> Command + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    DoNothing,
    ShowError(String),
    Write { code: Code, cursor: Option<Position> },
    Delegate(NativeCommand),
    AskUser { default_value: Option<String> },
}

pub struct Command {
    pub action: Action,
    /// Continuation run with fresh state once the action is done
    pub then_run: Option<Refactoring>,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("action", &self.action)
            .field("then_run", &self.then_run.is_some())
            .finish()
    }
}

impl Command {
    fn new(action: Action) -> Self {
        Self { action, then_run: None }
    }

    pub fn do_nothing() -> Self {
        Self::new(Action::DoNothing)
    }

    pub fn show_error(error: impl fmt::Display) -> Self {
        Self::new(Action::ShowError(error.to_string()))
    }

    pub fn write(code: Code, cursor: Option<Position>) -> Self {
        Self::new(Action::Write { code, cursor })
    }

    pub fn delegate(command: NativeCommand) -> Self {
        Self::new(Action::Delegate(command))
    }

    pub fn ask_user(default_value: Option<String>) -> Self {
        Self::new(Action::AskUser { default_value })
    }

    pub fn then(mut self, next: Refactoring) -> Self {
        self.then_run = Some(next);
        self
    }

    /// Write the transformed code, or report `reason` when the selection
    /// did not lead to any change.
    pub fn from_transform(result: Result<Transformed, RefactorError>, reason: ErrorReason) -> Self {
        match result {
            Ok(transformed) if transformed.has_code_changed => Self::write(transformed.code, None),
            Ok(_) => Self::show_error(reason),
            Err(error) => Self::show_error(error),
        }
    }
}

/// Refactorings that need the editor while deciding, like the cross-file
/// signature change. They get the editor once and hand back the command to
/// finish with.
#[async_trait]
pub trait EditorRefactoring: Send + Sync {
    async fn prepare(&self, editor: &dyn Editor) -> Command;
}

#[derive(Clone)]
pub enum Recipe {
    Pure(Refactoring),
    Interactive(Arc<dyn EditorRefactoring>),
}

/// What one invocation did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    pub writes: usize,
    pub error: Option<String>,
}

/// Run `recipe` against `editor` until it settles.
pub async fn execute(recipe: &Recipe, editor: &dyn Editor) -> Result<ExecutionReport, EditorError> {
    match recipe {
        Recipe::Pure(refactoring) => run_from(refactoring.clone(), Phase::New, editor).await,
        Recipe::Interactive(refactoring) => {
            let command = refactoring.prepare(editor).await;
            let mut report = ExecutionReport::default();
            let next = apply(command, None, editor, &mut report).await?;
            if let Some((refactoring, phase)) = next {
                let rest = run_from(refactoring, phase, editor).await?;
                report.writes += rest.writes;
                report.error = report.error.or(rest.error);
            }
            Ok(report)
        }
    }
}

/// Trampoline over pending (refactoring, phase) pairs. Each step reads the
/// editor state again, so continuations see what earlier writes did.
async fn run_from(refactoring: Refactoring, phase: Phase, editor: &dyn Editor) -> Result<ExecutionReport, EditorError> {
    let mut report = ExecutionReport::default();
    let mut queue = VecDeque::from([(refactoring, phase)]);
    let mut steps = 0;

    while let Some((refactoring, phase)) = queue.pop_front() {
        steps += 1;
        if steps > MAX_STEPS {
            warn!("Refactoring did not settle after {} steps, stopping", MAX_STEPS);
            break;
        }

        let state = RefactoringState {
            code: editor.code().await,
            selection: editor.selection().await,
            phase,
        };
        let command = refactoring(&state);
        debug!("Step {}: {:?}", steps, command);
        if let Some(next) = apply(command, Some(refactoring), editor, &mut report).await? {
            queue.push_back(next);
        }
    }
    Ok(report)
}

/// Perform one command. Returns what to run next, if anything.
async fn apply(
    command: Command,
    current: Option<Refactoring>,
    editor: &dyn Editor,
    report: &mut ExecutionReport,
) -> Result<Option<(Refactoring, Phase)>, EditorError> {
    let Command { action, then_run } = command;
    let continuation = then_run.map(|next| (next, Phase::New));

    match action {
        Action::DoNothing => Ok(None),
        Action::ShowError(message) => {
            info!("Refactoring failed: {}", message);
            editor.show_error(&message).await;
            report.error = Some(message);
            Ok(None)
        }
        Action::Write { code, cursor } => {
            editor.write(code, cursor).await?;
            report.writes += 1;
            Ok(continuation)
        }
        Action::Delegate(native) => match editor.delegate(native).await {
            DelegateResult::Ok => Ok(continuation),
            DelegateResult::NotSupported => {
                debug!("Editor cannot {:?}, falling back", native);
                Ok(current.map(|refactoring| (refactoring, Phase::CommandNotSupported)))
            }
        },
        Action::AskUser { default_value } => {
            let answer = editor.ask_user_input(default_value).await;
            Ok(current.map(|refactoring| (refactoring, Phase::UserResponse(answer))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::InMemoryEditor;

    fn pure(f: impl Fn(&RefactoringState) -> Command + Send + Sync + 'static) -> Recipe {
        Recipe::Pure(Arc::new(f))
    }

    #[tokio::test]
    async fn test_write_then_continuation_sees_new_code() {
        let second: Refactoring = Arc::new(|state: &RefactoringState| {
            Command::write(format!("{}b;", state.code), None)
        });
        let recipe = pure(move |_| Command::write("a;".into(), None).then(second.clone()));

        let editor = InMemoryEditor::new("");
        let report = execute(&recipe, &editor).await.unwrap();
        assert_eq!(editor.code().await, "a;b;");
        assert_eq!(report.writes, 2);
    }

    #[tokio::test]
    async fn test_unsupported_delegate_reinvokes_with_phase() {
        let recipe = pure(|state| match state.phase {
            Phase::New => Command::delegate(NativeCommand::RenameSymbol),
            Phase::CommandNotSupported => Command::write("fallback".into(), None),
            Phase::UserResponse(_) => Command::do_nothing(),
        });

        let editor = InMemoryEditor::new("");
        execute(&recipe, &editor).await.unwrap();
        assert_eq!(editor.code().await, "fallback");
    }

    #[tokio::test]
    async fn test_supported_delegate_stops() {
        let recipe = pure(|state| match state.phase {
            Phase::New => Command::delegate(NativeCommand::RenameSymbol),
            _ => Command::write("fallback".into(), None),
        });

        let editor = InMemoryEditor::new("").with_delegate_result(DelegateResult::Ok);
        let report = execute(&recipe, &editor).await.unwrap();
        assert_eq!(report.writes, 0);
    }

    #[tokio::test]
    async fn test_cancelled_prompt_is_passed_back() {
        let recipe = pure(|state| match &state.phase {
            Phase::New => Command::ask_user(Some("x".into())),
            Phase::UserResponse(Some(answer)) => Command::write(answer.clone(), None),
            _ => Command::do_nothing(),
        });

        let editor = InMemoryEditor::new("before").with_answer(None);
        let report = execute(&recipe, &editor).await.unwrap();
        assert_eq!(editor.code().await, "before");
        assert_eq!(report, ExecutionReport::default());
    }

    #[tokio::test]
    async fn test_show_error_is_reported() {
        let recipe = pure(|_| Command::show_error(ErrorReason::DidNotFindIfElseToFlip));
        let editor = InMemoryEditor::new("");
        let report = execute(&recipe, &editor).await.unwrap();
        assert_eq!(editor.errors().await.len(), 1);
        assert!(report.error.unwrap().contains("if statement"));
    }

    #[tokio::test]
    async fn test_endless_recipe_is_cut_off() {
        let recipe = pure(|_| Command::ask_user(None));
        let editor = InMemoryEditor::new("");
        let report = execute(&recipe, &editor).await.unwrap();
        assert_eq!(report.writes, 0);
    }
}
