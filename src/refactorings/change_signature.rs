//! # Change Signature
//!
//! Reorder the parameters of a function and the arguments of every call to
//! it, across the workspace.
//!
//! The user picks the new order in the editor's dialog. The editor then
//! reports every reference to the function; files holding references are
//! read concurrently and transformed one after the other. Nothing is
//! written unless every file could be transformed. Writes themselves are
//! not transactional: a failing write leaves earlier files changed.

use crate::ast::{
    NodeId, NodeKind, NodeTag, Pattern, Selection, Transformed, Tree, parse, select_deepest, transform,
};
use crate::editor::{CodeReference, Editor, SelectedPosition};
use crate::errors::{ErrorReason, RefactorError};
use crate::refactoring::{Command, EditorRefactoring, Recipe, RefactoringDefinition};
use async_trait::async_trait;
use futures::future::try_join_all;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub fn definition() -> RefactoringDefinition {
    RefactoringDefinition {
        key: "changeSignature",
        title: "Change Signature",
        recipe: Recipe::Interactive(Arc::new(ChangeSignature)),
    }
}

pub struct ChangeSignature;

#[async_trait]
impl EditorRefactoring for ChangeSignature {
    async fn prepare(&self, editor: &dyn Editor) -> Command {
        match change_signature(editor).await {
            Ok(()) => Command::do_nothing(),
            Err(error @ RefactorError::Parse(_)) => Command::show_error(error),
            Err(error) => {
                warn!("Cannot change signature: {}", error);
                Command::show_error(ErrorReason::CantChangeSignature)
            }
        }
    }
}

/// The function under the selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// How each parameter is shown in the ordering dialog
    pub labels: Vec<String>,
    /// Where the function's name is, to look up its references
    pub name: Selection,
}

async fn change_signature(editor: &dyn Editor) -> Result<(), RefactorError> {
    let code = editor.code().await;
    let selection = editor.selection().await;
    let signature = find_signature(&code, selection)?
        .filter(|signature| !signature.labels.is_empty())
        .ok_or(RefactorError::NotFound(ErrorReason::CantChangeSignature))?;

    let path = editor.document_path();
    let positions = SelectedPosition::unchanged(&signature.labels);
    let Some(positions) = editor.ask_for_positions(positions, &path).await else {
        debug!("Parameter ordering cancelled");
        return Ok(());
    };
    if !is_permutation(&positions, signature.labels.len()) {
        return Err(RefactorError::Unsupported(ErrorReason::CantChangeSignature));
    }
    if positions.iter().all(|position| position.start_at == position.end_at) {
        return Ok(());
    }

    let mut references = editor.get_selection_references(signature.name).await?;
    if references.is_empty() {
        debug!("No references from the editor, using the document's own");
        references = local_references(&code, signature.name)?
            .into_iter()
            .map(|selection| CodeReference {
                path: path.clone(),
                selection,
            })
            .collect();
    }
    let files = group_by_path(references);
    let contents = try_join_all(files.iter().map(|(path, _)| editor.code_of(path))).await?;

    let mut updates = Vec::new();
    for ((path, selections), code) in files.into_iter().zip(contents) {
        let transformed = update_code(&code, &selections, &positions).map_err(|error| {
            warn!("Cannot update {}: {}", path.display(), error);
            RefactorError::Unsupported(ErrorReason::CantChangeSignature)
        })?;
        if transformed.has_code_changed {
            updates.push((path, transformed.code));
        }
    }

    info!("Updating signature in {} files", updates.len());
    for (path, code) in updates {
        editor.write_in(&path, code).await?;
    }
    Ok(())
}

/// Every parameter is moved exactly once, to a slot that exists.
fn is_permutation(positions: &[SelectedPosition], count: usize) -> bool {
    let mut starts: Vec<usize> = positions.iter().map(|position| position.start_at).collect();
    let mut ends: Vec<usize> = positions.iter().map(|position| position.end_at).collect();
    starts.sort_unstable();
    ends.sort_unstable();
    let expected: Vec<usize> = (0..count).collect();
    starts == expected && ends == expected
}

/// References grouped per file, files in the order they were first seen
fn group_by_path(references: Vec<CodeReference>) -> Vec<(PathBuf, Vec<Selection>)> {
    let mut files: Vec<(PathBuf, Vec<Selection>)> = Vec::new();
    for reference in references {
        match files.iter_mut().find(|(path, _)| *path == reference.path) {
            Some((_, selections)) => selections.push(reference.selection),
            None => files.push((reference.path, vec![reference.selection])),
        }
    }
    files
}

/// Every identifier in `code` spelled like the one at `name`, property
/// names included since methods are called through them
fn local_references(code: &str, name: Selection) -> Result<Vec<Selection>, RefactorError> {
    let tree = parse(code)?;
    let spelled = tree
        .preorder(tree.root())
        .into_iter()
        .find(|id| tree.span(*id).is_some_and(|span| Selection::from_span(&span) == name))
        .and_then(|id| tree.name_of(id));
    let Some(spelled) = spelled else {
        return Ok(vec![name]);
    };
    Ok(tree
        .preorder(tree.root())
        .into_iter()
        .filter(|id| tree.name_of(*id) == Some(spelled))
        .filter_map(|id| tree.span(id))
        .map(|span| Selection::from_span(&span))
        .collect())
}

/// Parameters of the innermost function declaration, method, or function
/// assigned to a variable, under the selection.
pub fn find_signature(code: &str, selection: Selection) -> Result<Option<Signature>, RefactorError> {
    let tree = parse(code)?;
    let under = move |tree: &Tree, id: NodeId| tree.span(id).is_some_and(|span| selection.is_inside_node(&span));
    let pattern = Pattern::new()
        .on(NodeTag::FunctionDeclaration, move |tree: &Tree, id| {
            let NodeKind::FunctionDeclaration { id: name, params, .. } = tree.kind(id) else {
                return None;
            };
            under(tree, id).then(|| signature(tree, *name, params)).flatten()
        })
        .on(NodeTag::Method, move |tree: &Tree, id| {
            let NodeKind::Method { key, params, .. } = tree.kind(id) else {
                return None;
            };
            under(tree, id).then(|| signature(tree, *key, params)).flatten()
        })
        .on(NodeTag::VariableDeclarator, move |tree: &Tree, id| {
            let NodeKind::VariableDeclarator { id: name, init: Some(init) } = tree.kind(id) else {
                return None;
            };
            let params = function_params(tree, *init)?;
            under(tree, id).then(|| signature(tree, *name, params)).flatten()
        });
    Ok(select_deepest(&tree, &pattern).map(|found| found.binding))
}

fn function_params(tree: &Tree, id: NodeId) -> Option<&Vec<NodeId>> {
    match tree.kind(id) {
        NodeKind::ArrowFunctionExpression { params, .. } | NodeKind::FunctionExpression { params, .. } => Some(params),
        _ => None,
    }
}

fn signature(tree: &Tree, name: NodeId, params: &[NodeId]) -> Option<Signature> {
    Some(Signature {
        labels: params.iter().map(|param| label(tree, *param)).collect(),
        name: Selection::from_span(&tree.span(name)?),
    })
}

fn label(tree: &Tree, param: NodeId) -> String {
    let list = |ids: &[NodeId]| ids.iter().map(|id| label(tree, *id)).collect::<Vec<_>>().join(", ");
    match tree.kind(param) {
        NodeKind::Identifier { name } => name.clone(),
        NodeKind::RestElement { argument } => format!("...{}", label(tree, *argument)),
        NodeKind::AssignmentPattern { left, .. } => label(tree, *left),
        NodeKind::ObjectPattern { properties } => format!("{{{}}}", list(properties)),
        NodeKind::ArrayPattern { elements } => format!("[{}]", list(elements)),
        NodeKind::ObjectProperty {
            key, value, shorthand, ..
        } => {
            if *shorthand {
                label(tree, *value)
            } else {
                tree.text(*key).unwrap_or_default().to_string()
            }
        }
        _ => tree.text(param).unwrap_or_default().to_string(),
    }
}

/// Apply the new parameter order to every declaration and same-line call
/// found at `selections` in `code`.
pub fn update_code(
    code: &str,
    selections: &[Selection],
    positions: &[SelectedPosition],
) -> Result<Transformed, RefactorError> {
    let (transformed, ()) = transform(code, |tree| {
        let targets: Vec<NodeId> = tree
            .preorder(tree.root())
            .into_iter()
            .filter(|id| {
                name_span_of(tree, *id).is_some_and(|name| {
                    selections
                        .iter()
                        .any(|selection| selection.start() == name.start() && selection.is_same_line_than(&name))
                })
            })
            .collect();
        for target in targets {
            reorder(tree, target, positions);
        }
        Ok(())
    })?;
    Ok(transformed)
}

/// Where the name of the function a node declares or calls sits
fn name_span_of(tree: &Tree, id: NodeId) -> Option<Selection> {
    let name = match tree.kind(id) {
        NodeKind::FunctionDeclaration { id: name, .. } | NodeKind::FunctionExpression { id: Some(name), .. } => *name,
        NodeKind::Method { key, .. } => *key,
        NodeKind::VariableDeclarator { id: name, init: Some(init) } => {
            function_params(tree, *init)?;
            *name
        }
        NodeKind::CallExpression { callee, .. } | NodeKind::NewExpression { callee, .. } => match tree.kind(*callee) {
            NodeKind::Identifier { .. } => *callee,
            NodeKind::MemberExpression {
                property,
                computed: false,
                ..
            } => *property,
            _ => return None,
        },
        _ => return None,
    };
    tree.span(name).map(|span| Selection::from_span(&span))
}

fn reorder(tree: &mut Tree, id: NodeId, positions: &[SelectedPosition]) {
    let target = match tree.kind(id) {
        NodeKind::VariableDeclarator { init: Some(init), .. } => *init,
        _ => id,
    };
    match tree.kind(target).clone() {
        NodeKind::FunctionDeclaration { params, .. }
        | NodeKind::FunctionExpression { params, .. }
        | NodeKind::ArrowFunctionExpression { params, .. }
        | NodeKind::Method { params, .. } => {
            if params.len() != positions.len() {
                debug!("Skipping a function with {} parameters", params.len());
                return;
            }
            let mut reordered = params.clone();
            for position in positions {
                reordered[position.end_at] = params[position.start_at];
            }
            set_list(tree, target, reordered);
        }
        NodeKind::CallExpression { arguments, .. } | NodeKind::NewExpression { arguments, .. } => {
            if arguments
                .iter()
                .any(|argument| tree.tag(*argument) == NodeTag::SpreadElement)
            {
                return;
            }
            let reordered = reorder_arguments(tree, &arguments, positions);
            set_list(tree, target, reordered);
        }
        _ => {}
    }
}

/// Arguments in their new positions. A parameter that moved past the last
/// argument passed leaves `undefined` holes behind it; arguments beyond the
/// declared parameters stay at the end.
fn reorder_arguments(tree: &mut Tree, arguments: &[NodeId], positions: &[SelectedPosition]) -> Vec<NodeId> {
    let mut slots: Vec<Option<NodeId>> = vec![None; positions.len()];
    for position in positions {
        if let Some(argument) = arguments.get(position.start_at) {
            slots[position.end_at] = Some(*argument);
        }
    }
    let filled = slots.iter().rposition(Option::is_some).map_or(0, |last| last + 1);

    let mut reordered = Vec::with_capacity(arguments.len().max(filled));
    for slot in &slots[..filled] {
        let argument = match slot {
            Some(argument) => *argument,
            None => tree.undefined(),
        };
        reordered.push(argument);
    }
    reordered.extend(arguments.iter().skip(positions.len()));
    reordered
}

fn set_list(tree: &mut Tree, id: NodeId, list: Vec<NodeId>) {
    let unchanged = match tree.kind(id) {
        NodeKind::CallExpression { arguments, .. } | NodeKind::NewExpression { arguments, .. } => *arguments == list,
        NodeKind::FunctionDeclaration { params, .. }
        | NodeKind::FunctionExpression { params, .. }
        | NodeKind::ArrowFunctionExpression { params, .. }
        | NodeKind::Method { params, .. } => *params == list,
        _ => true,
    };
    if unchanged {
        return;
    }
    tree.update(id, |kind| match kind {
        NodeKind::CallExpression { arguments, .. } | NodeKind::NewExpression { arguments, .. } => *arguments = list,
        NodeKind::FunctionDeclaration { params, .. }
        | NodeKind::FunctionExpression { params, .. }
        | NodeKind::ArrowFunctionExpression { params, .. }
        | NodeKind::Method { params, .. } => *params = list,
        _ => {}
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn swapped(labels: &[&str]) -> Vec<SelectedPosition> {
        let labels: Vec<String> = labels.iter().map(|label| label.to_string()).collect();
        let mut order: Vec<usize> = (0..labels.len()).collect();
        order.swap(0, 1);
        SelectedPosition::reordered(&labels, &order).unwrap()
    }

    #[test]
    fn test_labels() {
        let code = "function f(a, { b, c: d }, [e], g = 1, ...rest) {}\n";
        let signature = find_signature(code, Selection::cursor_at(0, 0)).unwrap().unwrap();
        assert_eq!(signature.labels, vec!["a", "{b, c}", "[e]", "g", "...rest"]);
        assert_eq!(signature.name, Selection::from_coords(0, 9, 0, 10));
    }

    #[test]
    fn test_arrow_selection_widens_to_declarator() {
        let code = "const add = (a, b) => a + b;\n";
        let signature = find_signature(code, Selection::cursor_at(0, 14)).unwrap().unwrap();
        assert_eq!(signature.labels, vec!["a", "b"]);
        assert_eq!(signature.name, Selection::from_coords(0, 6, 0, 9));
    }

    #[test]
    fn test_method_signature() {
        let code = "class A {\n  sum(x, y) {\n    return x + y;\n  }\n}\n";
        let signature = find_signature(code, Selection::cursor_at(2, 4)).unwrap().unwrap();
        assert_eq!(signature.labels, vec!["x", "y"]);
    }

    #[test]
    fn test_update_declaration_and_call() {
        let code = "function add(a, b) {\n  return a + b;\n}\nadd(1, 2);\n";
        let selections = [Selection::from_coords(0, 9, 0, 12), Selection::from_coords(3, 0, 3, 3)];
        let transformed = update_code(code, &selections, &swapped(&["a", "b"])).unwrap();
        assert_eq!(transformed.code, "function add(b, a) {\n  return a + b;\n}\nadd(2, 1);\n");
    }

    #[test]
    fn test_missing_argument_becomes_undefined() {
        let code = "add(1);\n";
        let selections = [Selection::from_coords(0, 0, 0, 3)];
        let transformed = update_code(code, &selections, &swapped(&["a", "b"])).unwrap();
        assert_eq!(transformed.code, "add(undefined, 1);\n");
    }

    #[test]
    fn test_extra_arguments_stay_last() {
        let code = "obj.add(1, 2, 3);\n";
        let selections = [Selection::from_coords(0, 4, 0, 7)];
        let transformed = update_code(code, &selections, &swapped(&["a", "b"])).unwrap();
        assert_eq!(transformed.code, "obj.add(2, 1, 3);\n");
    }

    #[test]
    fn test_comments_follow_their_arguments() {
        let code = "add(\n  1, // first\n  2 // second\n);\n";
        let selections = [Selection::from_coords(0, 0, 0, 3)];
        let transformed = update_code(code, &selections, &swapped(&["a", "b"])).unwrap();
        assert_eq!(transformed.code, "add(\n  2, // second\n  1 // first\n);\n");

        let code = "add(/* one */ 1, /* two */ 2);\n";
        let transformed = update_code(code, &selections, &swapped(&["a", "b"])).unwrap();
        assert_eq!(transformed.code, "add(/* two */ 2, /* one */ 1);\n");
    }

    #[test]
    fn test_line_comment_moved_last_keeps_the_paren_out() {
        let code = "add(\n  1, // first\n  2);\n";
        let selections = [Selection::from_coords(0, 0, 0, 3)];
        let transformed = update_code(code, &selections, &swapped(&["a", "b"])).unwrap();
        assert_eq!(transformed.code, "add(\n  2,\n  1 // first\n);\n");
    }

    #[test]
    fn test_calls_elsewhere_are_untouched() {
        let code = "add(1, 2);\nadd(3, 4);\n";
        let selections = [Selection::from_coords(1, 0, 1, 3)];
        let transformed = update_code(code, &selections, &swapped(&["a", "b"])).unwrap();
        assert_eq!(transformed.code, "add(1, 2);\nadd(4, 3);\n");
    }

    #[test]
    fn test_group_by_path_keeps_first_seen_order() {
        let reference = |path: &str, line| CodeReference {
            path: PathBuf::from(path),
            selection: Selection::cursor_at(line, 0),
        };
        let files = group_by_path(vec![reference("b.js", 0), reference("a.js", 1), reference("b.js", 2)]);
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].0, PathBuf::from("b.js"));
        assert_eq!(files[0].1.len(), 2);
    }
}
