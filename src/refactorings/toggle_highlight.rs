//! Highlight the identifier under the cursor with all its references, or
//! clear the highlight the cursor is already on.

use super::references::{identifier_at, references_named};
use crate::ast::{Selection, parse};
use crate::editor::Editor;
use crate::errors::RefactorError;
use crate::refactoring::{Command, EditorRefactoring, Recipe, RefactoringDefinition};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

pub fn definition() -> RefactoringDefinition {
    RefactoringDefinition {
        key: "toggleHighlight",
        title: "Toggle Highlight",
        recipe: Recipe::Interactive(Arc::new(ToggleHighlight)),
    }
}

pub struct ToggleHighlight;

#[async_trait]
impl EditorRefactoring for ToggleHighlight {
    async fn prepare(&self, editor: &dyn Editor) -> Command {
        let selection = editor.selection().await;
        if let Some(source) = editor.find_highlight(selection).await {
            editor.remove_highlight(source).await;
            return Command::do_nothing();
        }

        match highlighted_references(&editor.code().await, selection) {
            Ok(Some((source, targets))) => {
                debug!("Highlighting {} references", targets.len());
                editor.highlight(source, targets).await;
                Command::do_nothing()
            }
            Ok(None) => Command::do_nothing(),
            Err(error) => Command::show_error(error),
        }
    }
}

/// Selection of the identifier under `selection`, and of every other
/// reference with the same name
pub fn highlighted_references(
    code: &str,
    selection: Selection,
) -> Result<Option<(Selection, Vec<Selection>)>, RefactorError> {
    let tree = parse(code)?;
    let Some(identifier) = identifier_at(&tree, selection) else {
        return Ok(None);
    };
    let (Some(name), Some(span)) = (tree.name_of(identifier), tree.span(identifier)) else {
        return Ok(None);
    };
    let targets = references_named(&tree, tree.root(), name)
        .into_iter()
        .filter(|reference| *reference != identifier)
        .filter_map(|reference| tree.span(reference))
        .map(|span| Selection::from_span(&span))
        .collect();
    Ok(Some((Selection::from_span(&span), targets)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::InMemoryEditor;
    use crate::refactoring::execute;

    #[test]
    fn test_references_share_the_name() {
        let code = "let count = 0;\ncount++;\nitem.count;\n";
        let (source, targets) = highlighted_references(code, Selection::cursor_at(0, 5)).unwrap().unwrap();
        assert_eq!(source, Selection::from_coords(0, 4, 0, 9));
        assert_eq!(targets, vec![Selection::from_coords(1, 0, 1, 5)]);
    }

    #[tokio::test]
    async fn test_toggle_twice_clears() {
        let recipe = definition().recipe;
        let editor = InMemoryEditor::new("let count = 0;\ncount++;\n").with_selection(Selection::cursor_at(1, 1));

        execute(&recipe, &editor).await.unwrap();
        assert_eq!(
            editor.highlights().await,
            vec![(Selection::from_coords(1, 0, 1, 5), vec![Selection::from_coords(0, 4, 0, 9)])]
        );

        execute(&recipe, &editor).await.unwrap();
        assert!(editor.highlights().await.is_empty());
    }

    #[tokio::test]
    async fn test_nothing_to_highlight() {
        let editor = InMemoryEditor::new("1 + 2;\n").with_selection(Selection::cursor_at(0, 0));
        let report = execute(&definition().recipe, &editor).await.unwrap();
        assert!(report.error.is_none());
        assert!(editor.highlights().await.is_empty());
    }
}
