//! Identifier lookups shared by the refactorings.

use crate::ast::{NodeId, NodeKind, NodeTag, Pattern, Selection, Tree, select_deepest};

/// The identifier stands for a binding, as opposed to a property name or a
/// label.
pub fn is_reference(tree: &Tree, id: NodeId) -> bool {
    let Some(parent) = tree.parent(id) else {
        return true;
    };
    match tree.kind(parent) {
        NodeKind::MemberExpression {
            property,
            computed: false,
            ..
        } => *property != id,
        NodeKind::ObjectProperty {
            key, computed: false, ..
        }
        | NodeKind::Method {
            key, computed: false, ..
        } => *key != id,
        NodeKind::BreakStatement { .. } | NodeKind::ContinueStatement { .. } => false,
        _ => true,
    }
}

/// References named `name` within `root`, in document order
pub fn references_named(tree: &Tree, root: NodeId, name: &str) -> Vec<NodeId> {
    tree.preorder(root)
        .into_iter()
        .filter(|id| tree.name_of(*id) == Some(name) && is_reference(tree, *id))
        .collect()
}

/// References bound to the same declaration as `binding`. Nested scopes that
/// declare their own `name` (parameters, block declarations, catch clauses)
/// are not entered.
pub fn binding_references(tree: &Tree, binding: NodeId, name: &str) -> Vec<NodeId> {
    let owner = tree
        .ancestors(binding)
        .find(|ancestor| rebinds(tree, *ancestor, name) || catch_binds(tree, *ancestor, name).is_some())
        .unwrap_or(tree.root());

    let mut found = Vec::new();
    let mut stack = vec![owner];
    while let Some(current) = stack.pop() {
        if current != owner && rebinds(tree, current, name) {
            continue;
        }
        if tree.name_of(current) == Some(name) && is_reference(tree, current) {
            found.push(current);
        }
        let mut children = tree.children(current);
        if current != owner {
            if let Some((param, handler)) = catch_binds(tree, current, name) {
                children.retain(|child| *child != param && Some(*child) != handler);
            }
        }
        children.reverse();
        stack.extend(children);
    }
    found
}

/// `node` opens a scope holding its own binding of `name`.
fn rebinds(tree: &Tree, node: NodeId, name: &str) -> bool {
    match tree.kind(node) {
        NodeKind::FunctionDeclaration { params, .. }
        | NodeKind::ArrowFunctionExpression { params, .. }
        | NodeKind::Method { params, .. } => params.iter().any(|param| pattern_binds(tree, *param, name)),
        NodeKind::FunctionExpression { id, params, .. } => {
            id.is_some_and(|id| tree.name_of(id) == Some(name))
                || params.iter().any(|param| pattern_binds(tree, *param, name))
        }
        NodeKind::Program { body } | NodeKind::BlockStatement { body } => {
            body.iter().any(|statement| declares(tree, *statement, name))
        }
        NodeKind::SwitchCase { consequent, .. } => consequent.iter().any(|statement| declares(tree, *statement, name)),
        NodeKind::ForStatement { init: Some(init), .. } => declares(tree, *init, name),
        NodeKind::ForOfStatement { left, .. } | NodeKind::ForInStatement { left, .. } => declares(tree, *left, name),
        _ => false,
    }
}

/// Catch parameter and handler of a `try` whose catch clause binds `name`
fn catch_binds(tree: &Tree, node: NodeId, name: &str) -> Option<(NodeId, Option<NodeId>)> {
    match tree.kind(node) {
        NodeKind::TryStatement {
            param: Some(param),
            handler,
            ..
        } if pattern_binds(tree, *param, name) => Some((*param, *handler)),
        _ => None,
    }
}

fn declares(tree: &Tree, statement: NodeId, name: &str) -> bool {
    match tree.kind(statement) {
        NodeKind::VariableDeclaration { declarations, .. } => declarations.iter().any(|declarator| {
            matches!(
                tree.kind(*declarator),
                NodeKind::VariableDeclarator { id, .. } if pattern_binds(tree, *id, name)
            )
        }),
        NodeKind::FunctionDeclaration { id, .. } | NodeKind::ClassDeclaration { id, .. } => {
            tree.name_of(*id) == Some(name)
        }
        NodeKind::ExportNamedDeclaration { declaration } | NodeKind::ExportDefaultDeclaration { declaration } => {
            declares(tree, *declaration, name)
        }
        _ => false,
    }
}

/// `pattern` binds `name`, directly or through destructuring.
fn pattern_binds(tree: &Tree, pattern: NodeId, name: &str) -> bool {
    match tree.kind(pattern) {
        NodeKind::Identifier { name: bound } => bound == name,
        NodeKind::ObjectPattern { properties } => properties.iter().any(|property| match tree.kind(*property) {
            NodeKind::ObjectProperty { value, .. } => pattern_binds(tree, *value, name),
            NodeKind::RestElement { argument } => pattern_binds(tree, *argument, name),
            _ => false,
        }),
        NodeKind::ArrayPattern { elements } => elements.iter().any(|element| pattern_binds(tree, *element, name)),
        NodeKind::AssignmentPattern { left, .. } => pattern_binds(tree, *left, name),
        NodeKind::RestElement { argument } => pattern_binds(tree, *argument, name),
        _ => false,
    }
}

/// Innermost identifier under the selection
pub fn identifier_at(tree: &Tree, selection: Selection) -> Option<NodeId> {
    let pattern = Pattern::new().on(NodeTag::Identifier, move |tree: &Tree, id| {
        tree.span(id).filter(|span| selection.is_inside_node(span)).map(|_| ())
    });
    select_deepest(tree, &pattern).map(|found| found.node)
}

/// `{ a }` has to become `{ a: value }` once its value no longer reads `a`.
/// Also covers the defaulted form `{ a = 1 }`.
pub fn expand_shorthand(tree: &mut Tree, value: NodeId) {
    let Some(mut parent) = tree.parent(value) else {
        return;
    };
    let mut value = value;
    if let NodeKind::AssignmentPattern { left, .. } = tree.kind(parent) {
        if *left != value {
            return;
        }
        value = parent;
        let Some(grandparent) = tree.parent(parent) else {
            return;
        };
        parent = grandparent;
    }
    let is_shorthand_value = matches!(
        tree.kind(parent),
        NodeKind::ObjectProperty { value: current, shorthand: true, .. } if *current == value
    );
    if is_shorthand_value {
        tree.update(parent, |kind| {
            if let NodeKind::ObjectProperty { shorthand, .. } = kind {
                *shorthand = false;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::parse;

    #[test]
    fn test_property_names_are_not_references() {
        let tree = parse("a.a; ({ a: a }); a[a];").unwrap();
        assert_eq!(references_named(&tree, tree.root(), "a").len(), 4);
    }

    #[test]
    fn test_binding_references_skip_shadowing_scopes() {
        let code = "const a = 1;\nfunction g(a) { return a; }\nfunction h() { let a = 2; return a; }\ntry {} catch (a) { a; }\nf(a, () => a);\n";
        let tree = parse(code).unwrap();
        let binding = identifier_at(&tree, Selection::cursor_at(0, 6)).unwrap();
        let found = binding_references(&tree, binding, "a");
        let lines: Vec<usize> = found
            .iter()
            .map(|id| tree.span(*id).unwrap().start_pos.line)
            .collect();
        assert_eq!(lines, vec![0, 4, 4]);
    }

    #[test]
    fn test_binding_references_from_a_parameter() {
        let tree = parse("const a = 1;\nfunction g(a) { return a; }\n").unwrap();
        let parameter = identifier_at(&tree, Selection::cursor_at(1, 11)).unwrap();
        let found = binding_references(&tree, parameter, "a");
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|id| tree.span(*id).unwrap().start_pos.line == 1));
    }

    #[test]
    fn test_identifier_at_cursor() {
        let tree = parse("const total = price;\n").unwrap();
        let found = identifier_at(&tree, Selection::cursor_at(0, 16)).unwrap();
        assert_eq!(tree.name_of(found), Some("price"));
        assert!(identifier_at(&tree, Selection::cursor_at(0, 2)).is_none());
    }

    #[test]
    fn test_expand_defaulted_shorthand() {
        let mut tree = parse("const { a = 1 } = options;\n").unwrap();
        let value = references_named(&tree, tree.root(), "a")[0];
        tree.rename_identifier(value, "b");
        expand_shorthand(&mut tree, value);
        assert_eq!(crate::ast::print(&tree), "const { a: b = 1 } = options;\n");
    }
}
