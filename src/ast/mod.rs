//! # Syntax Tree
//!
//! Everything needed to go from source text to a tree and back:
//! tokenizing and parsing, comment attachment, selection-scoped matching,
//! structural edits and format-preserving printing.

mod builders;
pub mod comments;
pub mod lexer;
mod mutator;
pub mod node;
pub mod parser;
pub mod position;
pub mod printer;
pub mod selector;
pub mod source;
pub mod transformation;
pub mod tree;

pub use node::{Comment, CommentKind, DeclarationKind, MethodKind, NodeData, NodeId, NodeKind, NodeTag};
pub use parser::parse;
pub use position::{Position, Selection, Span};
pub use printer::print;
pub use selector::{Match, Pattern, select_all, select_all_in, select_deepest, select_deepest_in, select_first};
pub use source::{IndentStyle, Newline, SourceText};
pub use transformation::{Transformed, transform};
pub use tree::Tree;
