mod common;

use common::editor_at;
use refactor_engine::editor::{DelegateResult, Editor};
use refactor_engine::{ErrorReason, RefactoringCatalog};

async fn run(key: &str, editor: &refactor_engine::InMemoryEditor) -> refactor_engine::refactoring::ExecutionReport {
    RefactoringCatalog::with_defaults()
        .run(key, editor)
        .await
        .expect("refactoring is registered")
        .expect("editor operations succeed")
}

#[tokio::test]
async fn test_convert_for_loop_to_for_each() {
    let editor = editor_at(
        "for (let i = 0; i < items.length; i++) {\n  console.log(items[i]);\n}\n",
        0,
        0,
    );
    let report = run("convertForToForEach", &editor).await;

    assert_eq!(report.writes, 1);
    assert_eq!(
        editor.code().await,
        "items.forEach((item) => {\n  console.log(item);\n});\n"
    );
}

#[tokio::test]
async fn test_innermost_loop_is_converted() {
    let code = "for (const row of rows) {\n  for (const cell of row) {\n    draw(cell);\n  }\n}\n";
    let editor = editor_at(code, 2, 4);
    run("convertForToForEach", &editor).await;

    assert_eq!(
        editor.code().await,
        "for (const row of rows) {\n  row.forEach((cell) => {\n    draw(cell);\n  });\n}\n"
    );
}

#[tokio::test]
async fn test_flip_keeps_comments_in_place() {
    let code = "// decide\nif (ready) {\n  go(); // now\n} else {\n  wait();\n}\n";
    let editor = editor_at(code, 1, 0);
    run("flipIfElse", &editor).await;

    assert_eq!(
        editor.code().await,
        "// decide\nif (!ready) {\n  wait();\n} else {\n  go(); // now\n}\n"
    );
}

#[tokio::test]
async fn test_no_match_shows_error_and_keeps_code() {
    let code = "const answer = 42;\n\n\n// untouched   spacing\nlog( answer );\n";
    let editor = editor_at(code, 0, 0);
    let report = run("flipIfElse", &editor).await;

    assert_eq!(report.writes, 0);
    assert_eq!(report.error, Some(ErrorReason::DidNotFindIfElseToFlip.to_string()));
    assert_eq!(editor.errors().await, vec![ErrorReason::DidNotFindIfElseToFlip.to_string()]);
    assert_eq!(editor.code().await, code);
}

#[tokio::test]
async fn test_parse_error_is_reported() {
    let editor = editor_at("if (a {\n", 0, 0);
    let report = run("flipIfElse", &editor).await;

    let error = report.error.unwrap();
    assert!(error.starts_with("I can't build the AST from the source code"));
    assert_eq!(editor.code().await, "if (a {\n");
}

#[tokio::test]
async fn test_new_block_uses_tab_indentation() {
    let editor = editor_at("function f() {\n\tfor (const x of xs) run(x);\n}\n", 1, 1);
    run("convertForToForEach", &editor).await;

    assert_eq!(
        editor.code().await,
        "function f() {\n\txs.forEach((x) => {\n\t\trun(x);\n\t});\n}\n"
    );
}

#[tokio::test]
async fn test_new_block_uses_four_spaces() {
    let editor = editor_at("function f() {\n    for (const x of xs) run(x);\n}\n", 1, 4);
    run("convertForToForEach", &editor).await;

    assert_eq!(
        editor.code().await,
        "function f() {\n    xs.forEach((x) => {\n        run(x);\n    });\n}\n"
    );
}

#[tokio::test]
async fn test_hashbang_is_followed_by_one_blank_line() {
    let editor = editor_at("#!/usr/bin/env node\nif (a) { b(); } else { c(); }\n", 1, 0);
    run("flipIfElse", &editor).await;

    assert_eq!(
        editor.code().await,
        "#!/usr/bin/env node\n\nif (!a) { c(); } else { b(); }\n"
    );
}

#[tokio::test]
async fn test_crlf_line_endings_survive() {
    let editor = editor_at("if (a) {\r\n  b();\r\n} else {\r\n  c();\r\n}\r\n", 0, 0);
    run("flipIfElse", &editor).await;

    assert_eq!(editor.code().await, "if (!a) {\r\n  c();\r\n} else {\r\n  b();\r\n}\r\n");
}

#[tokio::test]
async fn test_rename_falls_back_to_prompt() {
    let editor = editor_at("let count = 0;\ncount += 1;\n", 0, 4).with_answer(Some("total"));
    let report = run("renameSymbol", &editor).await;

    assert_eq!(report.writes, 1);
    assert_eq!(editor.code().await, "let total = 0;\ntotal += 1;\n");
}

#[tokio::test]
async fn test_rename_cancelled_prompt_does_nothing() {
    let editor = editor_at("let count = 0;\n", 0, 4).with_answer(None);
    let report = run("renameSymbol", &editor).await;

    assert_eq!(report.writes, 0);
    assert!(report.error.is_none());
    assert_eq!(editor.code().await, "let count = 0;\n");
}

#[tokio::test]
async fn test_rename_handled_by_host() {
    let editor = editor_at("let count = 0;\n", 0, 4).with_delegate_result(DelegateResult::Ok);
    let report = run("renameSymbol", &editor).await;

    assert_eq!(report.writes, 0);
    assert!(report.error.is_none());
}

#[tokio::test]
async fn test_inline_variable() {
    let editor = editor_at("function area(r) {\n  const pi = 3.14;\n  return pi * r * r;\n}\n", 1, 8);
    run("inlineVariable", &editor).await;

    assert_eq!(editor.code().await, "function area(r) {\n  return 3.14 * r * r;\n}\n");
}

#[tokio::test]
async fn test_inline_reassigned_variable_is_refused() {
    let editor = editor_at("let a = 1;\na = 2;\n", 0, 4);
    let report = run("inlineVariable", &editor).await;

    assert_eq!(
        report.error,
        Some(ErrorReason::CantInlineRedeclaredVariables.to_string())
    );
}

#[tokio::test]
async fn test_split_declaration() {
    let editor = editor_at("const greeting = 'hi', name = user.name;\n", 0, 0);
    run("splitDeclarationAndInitialization", &editor).await;

    assert_eq!(
        editor.code().await,
        "let greeting, name;\ngreeting = 'hi';\nname = user.name;\n"
    );
}

#[tokio::test]
async fn test_remove_redundant_else() {
    let code = "function check(user) {\n  if (!user) {\n    return false;\n  } else {\n    return user.active;\n  }\n}\n";
    let editor = editor_at(code, 1, 2);
    run("removeRedundantElse", &editor).await;

    assert_eq!(
        editor.code().await,
        "function check(user) {\n  if (!user) {\n    return false;\n  }\n  return user.active;\n}\n"
    );
}

#[tokio::test]
async fn test_simplify_boolean() {
    let editor = editor_at("const visible = shown && true;\n", 0, 16);
    run("simplifyBoolean", &editor).await;

    assert_eq!(editor.code().await, "const visible = shown;\n");
}

#[tokio::test]
async fn test_toggle_highlight() {
    let editor = editor_at("let count = 0;\ncount++;\n", 0, 5);
    run("toggleHighlight", &editor).await;
    assert_eq!(editor.highlights().await.len(), 1);

    run("toggleHighlight", &editor).await;
    assert!(editor.highlights().await.is_empty());
}
