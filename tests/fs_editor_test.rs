mod common;

use common::{setup_workspace, workspace_config};
use refactor_engine::editor::Editor;
use refactor_engine::{FsEditor, FsEditorOptions, RefactoringCatalog, Selection};
use std::fs;
use std::path::Path;

#[tokio::test]
async fn test_refactoring_is_written_to_disk() {
    let dir = setup_workspace(&[("src/app.js", "if (ok) { start(); } else { stop(); }\n")]);
    let editor = FsEditor::open(
        workspace_config(&dir),
        Path::new("src/app.js"),
        Selection::cursor_at(0, 0),
        FsEditorOptions::default(),
    )
    .await
    .unwrap();

    let report = RefactoringCatalog::with_defaults()
        .run("flipIfElse", &editor)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(report.writes, 1);
    assert_eq!(
        fs::read_to_string(dir.path().join("src/app.js")).unwrap(),
        "if (!ok) { stop(); } else { start(); }\n"
    );
}

#[tokio::test]
async fn test_dry_run_leaves_files_alone() {
    let code = "if (ok) { start(); } else { stop(); }\n";
    let dir = setup_workspace(&[("app.js", code)]);
    let options = FsEditorOptions {
        dry_run: true,
        ..Default::default()
    };
    let editor = FsEditor::open(workspace_config(&dir), Path::new("app.js"), Selection::cursor_at(0, 0), options)
        .await
        .unwrap();

    RefactoringCatalog::with_defaults()
        .run("flipIfElse", &editor)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(fs::read_to_string(dir.path().join("app.js")).unwrap(), code);
    let written = editor.written().await;
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].1, "if (!ok) { stop(); } else { start(); }\n");
}

#[tokio::test]
async fn test_missing_file() {
    let dir = setup_workspace(&[]);
    let result = FsEditor::open(
        workspace_config(&dir),
        Path::new("nope.js"),
        Selection::cursor_at(0, 0),
        FsEditorOptions::default(),
    )
    .await;
    assert!(matches!(
        result,
        Err(refactor_engine::errors::EditorError::FileNotFound(_))
    ));
}

#[tokio::test]
async fn test_workspace_files_respect_globs() {
    let dir = setup_workspace(&[
        ("index.js", "a();\n"),
        ("lib/util.mjs", "b();\n"),
        ("node_modules/dep/index.js", "c();\n"),
        ("README.md", "# readme\n"),
    ]);
    let editor = FsEditor::open(
        workspace_config(&dir),
        Path::new("index.js"),
        Selection::cursor_at(0, 0),
        FsEditorOptions::default(),
    )
    .await
    .unwrap();

    let files = editor.workspace_files().await.unwrap();
    let relative: Vec<String> = files
        .iter()
        .map(|path| {
            path.strip_prefix(dir.path())
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    assert_eq!(relative, vec!["index.js", "lib/util.mjs"]);
}

#[tokio::test]
async fn test_change_signature_on_disk() {
    let dir = setup_workspace(&[
        ("lib.js", "function greet(greeting, name) {\n  return greeting + name;\n}\n"),
        ("main.js", "greet('Hello ', 'Ada');\nconst regreet = 1;\n"),
    ]);
    let options = FsEditorOptions {
        order: Some(vec![1, 0]),
        ..Default::default()
    };
    let editor = FsEditor::open(workspace_config(&dir), Path::new("lib.js"), Selection::cursor_at(0, 10), options)
        .await
        .unwrap();

    let report = RefactoringCatalog::with_defaults()
        .run("changeSignature", &editor)
        .await
        .unwrap()
        .unwrap();

    assert!(report.error.is_none(), "{:?}", report.error);
    assert_eq!(
        fs::read_to_string(dir.path().join("lib.js")).unwrap(),
        "function greet(name, greeting) {\n  return greeting + name;\n}\n"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("main.js")).unwrap(),
        "greet('Ada', 'Hello ');\nconst regreet = 1;\n"
    );
}

#[tokio::test]
async fn test_prompt_answers_run_out() {
    let dir = setup_workspace(&[("app.js", "let count = 0;\n")]);
    let options = FsEditorOptions {
        answers: vec!["total".to_string()],
        ..Default::default()
    };
    let editor = FsEditor::open(workspace_config(&dir), Path::new("app.js"), Selection::cursor_at(0, 4), options)
        .await
        .unwrap();

    assert_eq!(editor.ask_user_input(None).await, Some("total".to_string()));
    assert_eq!(editor.ask_user_input(None).await, None);
}
