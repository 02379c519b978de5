//! # Error Types
//!
//! Errors of the refactoring engine, from the user-facing reasons a recipe
//! reports down to collaborator I/O failures.

use crate::ast::Position;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Why a recipe could not do its job, worded for the person at the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorReason {
    DidNotFindIfElseToFlip,
    DidNotFindForLoopToConvert,
    CantChangeSignature,
    DidNotFindIdentifiersToRename,
    DidNotFindInlinableCode,
    DidNotFindInlinableCodeIdentifiers,
    CantInlineRedeclaredVariables,
    DidNotFindDeclarationToSplit,
    DidNotFindRedundantElse,
    DidNotFindBooleanToSimplify,
}

impl fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ErrorReason::DidNotFindIfElseToFlip => did_not_find("an if statement to flip"),
            ErrorReason::DidNotFindForLoopToConvert => did_not_find("a valid for loop to convert"),
            ErrorReason::CantChangeSignature => cant_do_it("change function signature"),
            ErrorReason::DidNotFindIdentifiersToRename => did_not_find("the identifiers to rename"),
            ErrorReason::DidNotFindInlinableCode => did_not_find("a valid code to inline"),
            ErrorReason::DidNotFindInlinableCodeIdentifiers => {
                "I didn't find references of this variable in the code 🤔".to_string()
            }
            ErrorReason::CantInlineRedeclaredVariables => cant_do_it("inline redeclared variables yet"),
            ErrorReason::DidNotFindDeclarationToSplit => {
                did_not_find("a declaration that can be splitted")
            }
            ErrorReason::DidNotFindRedundantElse => did_not_find("a redundant else to remove"),
            ErrorReason::DidNotFindBooleanToSimplify => did_not_find("a boolean to simplify"),
        };
        f.write_str(&message)
    }
}

pub fn did_not_find(element: &str) -> String {
    format!("I didn't find {element} from current selection 🤔")
}

fn cant_do_it(element: &str) -> String {
    format!("I'm sorry, I can't {element} 😅")
}

/// Malformed source: the tree could not be built
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({}:{})", .position.line + 1, .position.character + 1)]
pub struct ParseError {
    pub message: String,
    pub position: Position,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: Position) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// Structural edit that cannot be applied where it was requested
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error("node has no parent to be replaced in")]
    Detached,
    #[error("node does not sit in a list of siblings")]
    NotInList,
    #[error("cannot replace the root of the tree")]
    Root,
}

/// Failure of the editor collaborator
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("Glob error: {0}")]
    Glob(#[from] globset::Error),
    #[error("Directory traversal error: {0}")]
    WalkDir(#[from] walkdir::Error),
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// Unreadable or malformed configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Failure of one refactoring invocation
#[derive(Debug, Error)]
pub enum RefactorError {
    /// The selection matched nothing the recipe can work on
    #[error("{0}")]
    NotFound(ErrorReason),
    /// The construct was found but this shape of it cannot be transformed
    #[error("{0}")]
    Unsupported(ErrorReason),
    #[error(
        "I can't build the AST from the source code. This may be due to a syntax error that you can fix. Here's what went wrong: {0}"
    )]
    Parse(#[from] ParseError),
    #[error("Mutation error: {0}")]
    Mutation(#[from] MutationError),
    #[error("Editor error: {0}")]
    Editor(#[from] EditorError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_wording() {
        assert_eq!(
            ErrorReason::DidNotFindIfElseToFlip.to_string(),
            "I didn't find an if statement to flip from current selection 🤔"
        );
        assert_eq!(
            ErrorReason::CantChangeSignature.to_string(),
            "I'm sorry, I can't change function signature 😅"
        );
    }

    #[test]
    fn test_parse_error_reports_one_based_location() {
        let error = RefactorError::from(ParseError::new("Unexpected token", Position::new(2, 4)));
        assert!(error.to_string().ends_with("Unexpected token (3:5)"));
    }
}
