mod common;

use common::editor_at;
use refactor_engine::editor::{CodeReference, Editor, PositionAnswer};
use refactor_engine::{ErrorReason, InMemoryEditor, RefactoringCatalog, Selection};
use std::path::Path;

const INDEX: &str = "function area(width, height) {\n  return width * height;\n}\narea(2, 3);\n";
const SHAPES: &str = "const a = area(4, 5);\nconst b = area(6);\n";

fn reference(path: &str, line: usize, character: usize) -> CodeReference {
    CodeReference {
        path: path.into(),
        selection: Selection::from_coords(line, character, line, character + 4),
    }
}

fn workspace(shapes: &str, order: PositionAnswer) -> InMemoryEditor {
    editor_at(INDEX, 0, 10)
        .with_file("shapes.js", shapes)
        .with_positions(order)
        .with_references(vec![
            reference("index.js", 0, 9),
            reference("index.js", 3, 0),
            reference("shapes.js", 0, 10),
            reference("shapes.js", 1, 10),
        ])
}

async fn change_signature(editor: &InMemoryEditor) -> refactor_engine::refactoring::ExecutionReport {
    RefactoringCatalog::with_defaults()
        .run("changeSignature", editor)
        .await
        .expect("changeSignature is registered")
        .expect("editor operations succeed")
}

#[tokio::test]
async fn test_swap_parameters_across_files() {
    let editor = workspace(SHAPES, PositionAnswer::Order(vec![1, 0]));
    let report = change_signature(&editor).await;

    assert!(report.error.is_none());
    assert_eq!(
        editor.code().await,
        "function area(height, width) {\n  return width * height;\n}\narea(3, 2);\n"
    );
    assert_eq!(
        editor.code_in(Path::new("shapes.js")).await.unwrap(),
        "const a = area(5, 4);\nconst b = area(undefined, 6);\n"
    );
    assert_eq!(editor.write_count().await, 2);
}

#[tokio::test]
async fn test_cancelled_dialog_changes_nothing() {
    let editor = workspace(SHAPES, PositionAnswer::Cancel);
    let report = change_signature(&editor).await;

    assert!(report.error.is_none());
    assert_eq!(editor.write_count().await, 0);
    assert_eq!(editor.code().await, INDEX);
}

#[tokio::test]
async fn test_unchanged_order_changes_nothing() {
    let editor = workspace(SHAPES, PositionAnswer::Order(vec![0, 1]));
    change_signature(&editor).await;

    assert_eq!(editor.write_count().await, 0);
}

#[tokio::test]
async fn test_unparsable_file_aborts_the_batch() {
    let editor = workspace("const = area(4, 5);\n", PositionAnswer::Order(vec![1, 0]));
    let report = change_signature(&editor).await;

    assert_eq!(report.error, Some(ErrorReason::CantChangeSignature.to_string()));
    assert_eq!(editor.errors().await, vec![ErrorReason::CantChangeSignature.to_string()]);
    assert_eq!(editor.write_count().await, 0);
    assert_eq!(editor.code().await, INDEX);
}

#[tokio::test]
async fn test_failed_write_is_reported() {
    let editor = workspace(SHAPES, PositionAnswer::Order(vec![1, 0])).with_failing_write("shapes.js");
    let report = change_signature(&editor).await;

    assert_eq!(report.error, Some(ErrorReason::CantChangeSignature.to_string()));
}

#[tokio::test]
async fn test_no_function_under_cursor() {
    let editor = editor_at("const total = 1;\n", 0, 6).with_positions(PositionAnswer::Order(vec![0]));
    let report = change_signature(&editor).await;

    assert_eq!(report.error, Some(ErrorReason::CantChangeSignature.to_string()));
}

#[tokio::test]
async fn test_without_editor_references_the_document_is_searched() {
    let editor = editor_at("const add = (a, b) => a + b;\nadd(1, 2);\n", 0, 13)
        .with_positions(PositionAnswer::Order(vec![1, 0]));
    change_signature(&editor).await;

    assert_eq!(editor.code().await, "const add = (b, a) => a + b;\nadd(2, 1);\n");
}

#[tokio::test]
async fn test_dialog_session_waits_for_confirmation() {
    let editor = std::sync::Arc::new(workspace(SHAPES, PositionAnswer::Interactive));
    let running = {
        let editor = editor.clone();
        tokio::spawn(async move { change_signature(&editor).await })
    };

    while !editor.dialogs().is_open().await {
        tokio::task::yield_now().await;
    }
    let swapped = refactor_engine::editor::SelectedPosition::reordered(
        &["width".to_string(), "height".to_string()],
        &[1, 0],
    )
    .unwrap();
    assert!(editor.dialogs().confirm(swapped).await);

    let report = running.await.unwrap();
    assert!(report.error.is_none());
    assert_eq!(editor.write_count().await, 2);
}
