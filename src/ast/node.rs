//! # Syntax Nodes
//!
//! Nodes are a closed tagged union over the supported JavaScript constructs.
//! Children are referenced by [`NodeId`] into the owning [`super::Tree`]'s
//! arenas, never by pointer.

use super::position::Span;

/// Stable index of a node in one of the tree's arenas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) scratch: bool,
}

impl NodeId {
    pub(crate) fn live(index: usize) -> Self {
        Self {
            index: index as u32,
            scratch: false,
        }
    }

    pub(crate) fn scratch(index: usize) -> Self {
        Self {
            index: index as u32,
            scratch: true,
        }
    }

    /// Placeholder used when comparing node shapes.
    pub(crate) const SENTINEL: NodeId = NodeId {
        index: u32::MAX,
        scratch: false,
    };

    pub fn is_scratch(&self) -> bool {
        self.scratch
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    Var,
    Let,
    Const,
}

impl DeclarationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationKind::Var => "var",
            DeclarationKind::Let => "let",
            DeclarationKind::Const => "const",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Constructor,
    Method,
    Get,
    Set,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    Line,
    Block,
}

/// A source comment, raw text including its delimiters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub kind: CommentKind,
    pub text: String,
    pub span: Option<Span>,
}

impl Comment {
    pub fn line(body: &str) -> Self {
        Self {
            kind: CommentKind::Line,
            text: format!("//{body}"),
            span: None,
        }
    }

    pub fn block(body: &str) -> Self {
        Self {
            kind: CommentKind::Block,
            text: format!("/*{body}*/"),
            span: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Program {
        body: Vec<NodeId>,
    },

    // Statements
    VariableDeclaration {
        kind: DeclarationKind,
        declarations: Vec<NodeId>,
    },
    VariableDeclarator {
        id: NodeId,
        init: Option<NodeId>,
    },
    FunctionDeclaration {
        id: NodeId,
        params: Vec<NodeId>,
        body: NodeId,
        is_async: bool,
        generator: bool,
    },
    ClassDeclaration {
        id: NodeId,
        super_class: Option<NodeId>,
        body: Vec<NodeId>,
    },
    /// Class member or object literal method
    Method {
        kind: MethodKind,
        key: NodeId,
        computed: bool,
        is_static: bool,
        is_async: bool,
        params: Vec<NodeId>,
        body: NodeId,
    },
    ReturnStatement {
        argument: Option<NodeId>,
    },
    IfStatement {
        test: NodeId,
        consequent: NodeId,
        alternate: Option<NodeId>,
    },
    ForStatement {
        init: Option<NodeId>,
        test: Option<NodeId>,
        update: Option<NodeId>,
        body: NodeId,
    },
    ForOfStatement {
        left: NodeId,
        right: NodeId,
        body: NodeId,
    },
    ForInStatement {
        left: NodeId,
        right: NodeId,
        body: NodeId,
    },
    WhileStatement {
        test: NodeId,
        body: NodeId,
    },
    DoWhileStatement {
        body: NodeId,
        test: NodeId,
    },
    BlockStatement {
        body: Vec<NodeId>,
    },
    ExpressionStatement {
        expression: NodeId,
    },
    ThrowStatement {
        argument: NodeId,
    },
    BreakStatement {
        label: Option<NodeId>,
    },
    ContinueStatement {
        label: Option<NodeId>,
    },
    EmptyStatement,
    TryStatement {
        block: NodeId,
        param: Option<NodeId>,
        handler: Option<NodeId>,
        finalizer: Option<NodeId>,
    },
    SwitchStatement {
        discriminant: NodeId,
        cases: Vec<NodeId>,
    },
    SwitchCase {
        test: Option<NodeId>,
        consequent: Vec<NodeId>,
    },
    /// `import …` and `export {…}` / `export * from …`, kept verbatim
    ModuleDeclaration {
        raw: String,
    },
    ExportNamedDeclaration {
        declaration: NodeId,
    },
    ExportDefaultDeclaration {
        declaration: NodeId,
    },

    // Patterns
    ObjectPattern {
        properties: Vec<NodeId>,
    },
    ArrayPattern {
        elements: Vec<NodeId>,
    },
    AssignmentPattern {
        left: NodeId,
        right: NodeId,
    },
    RestElement {
        argument: NodeId,
    },

    // Expressions
    Identifier {
        name: String,
    },
    ThisExpression,
    NumericLiteral {
        raw: String,
    },
    StringLiteral {
        raw: String,
    },
    TemplateLiteral {
        raw: String,
    },
    RegExpLiteral {
        raw: String,
    },
    BooleanLiteral {
        value: bool,
    },
    NullLiteral,
    ArrayExpression {
        elements: Vec<NodeId>,
    },
    ObjectExpression {
        properties: Vec<NodeId>,
    },
    ObjectProperty {
        key: NodeId,
        value: NodeId,
        computed: bool,
        shorthand: bool,
    },
    SpreadElement {
        argument: NodeId,
    },
    MemberExpression {
        object: NodeId,
        property: NodeId,
        computed: bool,
        optional: bool,
    },
    CallExpression {
        callee: NodeId,
        arguments: Vec<NodeId>,
        optional: bool,
    },
    NewExpression {
        callee: NodeId,
        arguments: Vec<NodeId>,
    },
    UnaryExpression {
        operator: String,
        argument: NodeId,
    },
    UpdateExpression {
        operator: String,
        prefix: bool,
        argument: NodeId,
    },
    BinaryExpression {
        operator: String,
        left: NodeId,
        right: NodeId,
    },
    LogicalExpression {
        operator: String,
        left: NodeId,
        right: NodeId,
    },
    ConditionalExpression {
        test: NodeId,
        consequent: NodeId,
        alternate: NodeId,
    },
    AssignmentExpression {
        operator: String,
        left: NodeId,
        right: NodeId,
    },
    SequenceExpression {
        expressions: Vec<NodeId>,
    },
    ArrowFunctionExpression {
        params: Vec<NodeId>,
        body: NodeId,
        is_async: bool,
    },
    FunctionExpression {
        id: Option<NodeId>,
        params: Vec<NodeId>,
        body: NodeId,
        is_async: bool,
        generator: bool,
    },
    AwaitExpression {
        argument: NodeId,
    },
}

/// Variant tag of a [`NodeKind`], used to key handler tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeTag {
    Program,
    VariableDeclaration,
    VariableDeclarator,
    FunctionDeclaration,
    ClassDeclaration,
    Method,
    ReturnStatement,
    IfStatement,
    ForStatement,
    ForOfStatement,
    ForInStatement,
    WhileStatement,
    DoWhileStatement,
    BlockStatement,
    ExpressionStatement,
    ThrowStatement,
    BreakStatement,
    ContinueStatement,
    EmptyStatement,
    TryStatement,
    SwitchStatement,
    SwitchCase,
    ModuleDeclaration,
    ExportNamedDeclaration,
    ExportDefaultDeclaration,
    ObjectPattern,
    ArrayPattern,
    AssignmentPattern,
    RestElement,
    Identifier,
    ThisExpression,
    NumericLiteral,
    StringLiteral,
    TemplateLiteral,
    RegExpLiteral,
    BooleanLiteral,
    NullLiteral,
    ArrayExpression,
    ObjectExpression,
    ObjectProperty,
    SpreadElement,
    MemberExpression,
    CallExpression,
    NewExpression,
    UnaryExpression,
    UpdateExpression,
    BinaryExpression,
    LogicalExpression,
    ConditionalExpression,
    AssignmentExpression,
    SequenceExpression,
    ArrowFunctionExpression,
    FunctionExpression,
    AwaitExpression,
}

/// Owned view of one child position of a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    One(Option<NodeId>),
    Many(Vec<NodeId>),
}

/// Mutable view of one child position of a node
pub enum SlotMut<'a> {
    One(&'a mut NodeId),
    Opt(&'a mut Option<NodeId>),
    Many(&'a mut Vec<NodeId>),
}

impl SlotMut<'_> {
    fn snapshot(&self) -> Slot {
        match self {
            SlotMut::One(id) => Slot::One(Some(**id)),
            SlotMut::Opt(id) => Slot::One(**id),
            SlotMut::Many(ids) => Slot::Many(ids.to_vec()),
        }
    }
}

impl NodeKind {
    pub fn tag(&self) -> NodeTag {
        use NodeKind as K;
        match self {
            K::Program { .. } => NodeTag::Program,
            K::VariableDeclaration { .. } => NodeTag::VariableDeclaration,
            K::VariableDeclarator { .. } => NodeTag::VariableDeclarator,
            K::FunctionDeclaration { .. } => NodeTag::FunctionDeclaration,
            K::ClassDeclaration { .. } => NodeTag::ClassDeclaration,
            K::Method { .. } => NodeTag::Method,
            K::ReturnStatement { .. } => NodeTag::ReturnStatement,
            K::IfStatement { .. } => NodeTag::IfStatement,
            K::ForStatement { .. } => NodeTag::ForStatement,
            K::ForOfStatement { .. } => NodeTag::ForOfStatement,
            K::ForInStatement { .. } => NodeTag::ForInStatement,
            K::WhileStatement { .. } => NodeTag::WhileStatement,
            K::DoWhileStatement { .. } => NodeTag::DoWhileStatement,
            K::BlockStatement { .. } => NodeTag::BlockStatement,
            K::ExpressionStatement { .. } => NodeTag::ExpressionStatement,
            K::ThrowStatement { .. } => NodeTag::ThrowStatement,
            K::BreakStatement { .. } => NodeTag::BreakStatement,
            K::ContinueStatement { .. } => NodeTag::ContinueStatement,
            K::EmptyStatement => NodeTag::EmptyStatement,
            K::TryStatement { .. } => NodeTag::TryStatement,
            K::SwitchStatement { .. } => NodeTag::SwitchStatement,
            K::SwitchCase { .. } => NodeTag::SwitchCase,
            K::ModuleDeclaration { .. } => NodeTag::ModuleDeclaration,
            K::ExportNamedDeclaration { .. } => NodeTag::ExportNamedDeclaration,
            K::ExportDefaultDeclaration { .. } => NodeTag::ExportDefaultDeclaration,
            K::ObjectPattern { .. } => NodeTag::ObjectPattern,
            K::ArrayPattern { .. } => NodeTag::ArrayPattern,
            K::AssignmentPattern { .. } => NodeTag::AssignmentPattern,
            K::RestElement { .. } => NodeTag::RestElement,
            K::Identifier { .. } => NodeTag::Identifier,
            K::ThisExpression => NodeTag::ThisExpression,
            K::NumericLiteral { .. } => NodeTag::NumericLiteral,
            K::StringLiteral { .. } => NodeTag::StringLiteral,
            K::TemplateLiteral { .. } => NodeTag::TemplateLiteral,
            K::RegExpLiteral { .. } => NodeTag::RegExpLiteral,
            K::BooleanLiteral { .. } => NodeTag::BooleanLiteral,
            K::NullLiteral => NodeTag::NullLiteral,
            K::ArrayExpression { .. } => NodeTag::ArrayExpression,
            K::ObjectExpression { .. } => NodeTag::ObjectExpression,
            K::ObjectProperty { .. } => NodeTag::ObjectProperty,
            K::SpreadElement { .. } => NodeTag::SpreadElement,
            K::MemberExpression { .. } => NodeTag::MemberExpression,
            K::CallExpression { .. } => NodeTag::CallExpression,
            K::NewExpression { .. } => NodeTag::NewExpression,
            K::UnaryExpression { .. } => NodeTag::UnaryExpression,
            K::UpdateExpression { .. } => NodeTag::UpdateExpression,
            K::BinaryExpression { .. } => NodeTag::BinaryExpression,
            K::LogicalExpression { .. } => NodeTag::LogicalExpression,
            K::ConditionalExpression { .. } => NodeTag::ConditionalExpression,
            K::AssignmentExpression { .. } => NodeTag::AssignmentExpression,
            K::SequenceExpression { .. } => NodeTag::SequenceExpression,
            K::ArrowFunctionExpression { .. } => NodeTag::ArrowFunctionExpression,
            K::FunctionExpression { .. } => NodeTag::FunctionExpression,
            K::AwaitExpression { .. } => NodeTag::AwaitExpression,
        }
    }

    /// Child positions in source order.
    pub fn slots_mut(&mut self) -> Vec<SlotMut<'_>> {
        use NodeKind as K;
        use SlotMut::{Many, One, Opt};
        match self {
            K::Program { body } => vec![Many(body)],
            K::VariableDeclaration { declarations, .. } => vec![Many(declarations)],
            K::VariableDeclarator { id, init } => vec![One(id), Opt(init)],
            K::FunctionDeclaration {
                id, params, body, ..
            } => vec![One(id), Many(params), One(body)],
            K::ClassDeclaration {
                id,
                super_class,
                body,
            } => vec![One(id), Opt(super_class), Many(body)],
            K::Method {
                key, params, body, ..
            } => vec![One(key), Many(params), One(body)],
            K::ReturnStatement { argument } => vec![Opt(argument)],
            K::IfStatement {
                test,
                consequent,
                alternate,
            } => vec![One(test), One(consequent), Opt(alternate)],
            K::ForStatement {
                init,
                test,
                update,
                body,
            } => vec![Opt(init), Opt(test), Opt(update), One(body)],
            K::ForOfStatement { left, right, body } | K::ForInStatement { left, right, body } => {
                vec![One(left), One(right), One(body)]
            }
            K::WhileStatement { test, body } => vec![One(test), One(body)],
            K::DoWhileStatement { body, test } => vec![One(body), One(test)],
            K::BlockStatement { body } => vec![Many(body)],
            K::ExpressionStatement { expression } => vec![One(expression)],
            K::ThrowStatement { argument } => vec![One(argument)],
            K::BreakStatement { label } | K::ContinueStatement { label } => vec![Opt(label)],
            K::TryStatement {
                block,
                param,
                handler,
                finalizer,
            } => vec![One(block), Opt(param), Opt(handler), Opt(finalizer)],
            K::SwitchStatement {
                discriminant,
                cases,
            } => vec![One(discriminant), Many(cases)],
            K::SwitchCase { test, consequent } => vec![Opt(test), Many(consequent)],
            K::ExportNamedDeclaration { declaration }
            | K::ExportDefaultDeclaration { declaration } => vec![One(declaration)],
            K::ObjectPattern { properties } => vec![Many(properties)],
            K::ArrayPattern { elements } => vec![Many(elements)],
            K::AssignmentPattern { left, right } => vec![One(left), One(right)],
            K::RestElement { argument } => vec![One(argument)],
            K::ArrayExpression { elements } => vec![Many(elements)],
            K::ObjectExpression { properties } => vec![Many(properties)],
            K::ObjectProperty { key, value, .. } => vec![One(key), One(value)],
            K::SpreadElement { argument } => vec![One(argument)],
            K::MemberExpression {
                object, property, ..
            } => vec![One(object), One(property)],
            K::CallExpression {
                callee, arguments, ..
            } => vec![One(callee), Many(arguments)],
            K::NewExpression { callee, arguments } => vec![One(callee), Many(arguments)],
            K::UnaryExpression { argument, .. } => vec![One(argument)],
            K::UpdateExpression { argument, .. } => vec![One(argument)],
            K::BinaryExpression { left, right, .. }
            | K::LogicalExpression { left, right, .. }
            | K::AssignmentExpression { left, right, .. } => vec![One(left), One(right)],
            K::ConditionalExpression {
                test,
                consequent,
                alternate,
            } => vec![One(test), One(consequent), One(alternate)],
            K::SequenceExpression { expressions } => vec![Many(expressions)],
            K::ArrowFunctionExpression { params, body, .. } => vec![Many(params), One(body)],
            K::FunctionExpression {
                id, params, body, ..
            } => vec![Opt(id), Many(params), One(body)],
            K::AwaitExpression { argument } => vec![One(argument)],
            K::EmptyStatement
            | K::ModuleDeclaration { .. }
            | K::Identifier { .. }
            | K::ThisExpression
            | K::NumericLiteral { .. }
            | K::StringLiteral { .. }
            | K::TemplateLiteral { .. }
            | K::RegExpLiteral { .. }
            | K::BooleanLiteral { .. }
            | K::NullLiteral => vec![],
        }
    }

    pub fn slots(&self) -> Vec<Slot> {
        let mut copy = self.clone();
        copy.slots_mut().iter().map(SlotMut::snapshot).collect()
    }

    /// Children in source order
    pub fn children(&self) -> Vec<NodeId> {
        self.slots()
            .into_iter()
            .flat_map(|slot| match slot {
                Slot::One(id) => id.into_iter().collect::<Vec<_>>(),
                Slot::Many(ids) => ids,
            })
            .collect()
    }

    pub fn map_children(&mut self, mut f: impl FnMut(NodeId) -> NodeId) {
        for slot in self.slots_mut() {
            match slot {
                SlotMut::One(id) => *id = f(*id),
                SlotMut::Opt(Some(id)) => *id = f(*id),
                SlotMut::Opt(None) => {}
                SlotMut::Many(ids) => {
                    for id in ids.iter_mut() {
                        *id = f(*id);
                    }
                }
            }
        }
    }

    /// Point the slot holding `old` at `new`. Returns false when `old` is
    /// not a child.
    pub fn replace_child(&mut self, old: NodeId, new: NodeId) -> bool {
        for slot in self.slots_mut() {
            match slot {
                SlotMut::One(id) if *id == old => {
                    *id = new;
                    return true;
                }
                SlotMut::Opt(id) if *id == Some(old) => {
                    *id = Some(new);
                    return true;
                }
                SlotMut::Many(ids) => {
                    if let Some(index) = ids.iter().position(|id| *id == old) {
                        ids[index] = new;
                        return true;
                    }
                }
                _ => {}
            }
        }
        false
    }

    /// The child list holding `child`, if it sits in a list slot
    pub fn list_containing_mut(&mut self, child: NodeId) -> Option<&mut Vec<NodeId>> {
        self.slots_mut().into_iter().find_map(|slot| match slot {
            SlotMut::Many(ids) if ids.contains(&child) => Some(ids),
            _ => None,
        })
    }

    pub fn list_containing(&self, child: NodeId) -> Option<Vec<NodeId>> {
        self.slots().into_iter().find_map(|slot| match slot {
            Slot::Many(ids) if ids.contains(&child) => Some(ids),
            _ => None,
        })
    }

    /// The variant with its scalar fields but no children, for comparing
    /// whether two nodes differ only in what they point to.
    pub fn shape(&self) -> NodeKind {
        let mut shape = self.clone();
        for slot in shape.slots_mut() {
            match slot {
                SlotMut::One(id) => *id = NodeId::SENTINEL,
                SlotMut::Opt(Some(id)) => *id = NodeId::SENTINEL,
                SlotMut::Opt(None) => {}
                SlotMut::Many(ids) => ids.clear(),
            }
        }
        shape
    }

    pub fn is_statement(&self) -> bool {
        matches!(
            self.tag(),
            NodeTag::VariableDeclaration
                | NodeTag::FunctionDeclaration
                | NodeTag::ClassDeclaration
                | NodeTag::ReturnStatement
                | NodeTag::IfStatement
                | NodeTag::ForStatement
                | NodeTag::ForOfStatement
                | NodeTag::ForInStatement
                | NodeTag::WhileStatement
                | NodeTag::DoWhileStatement
                | NodeTag::BlockStatement
                | NodeTag::ExpressionStatement
                | NodeTag::ThrowStatement
                | NodeTag::BreakStatement
                | NodeTag::ContinueStatement
                | NodeTag::EmptyStatement
                | NodeTag::TryStatement
                | NodeTag::SwitchStatement
                | NodeTag::ModuleDeclaration
                | NodeTag::ExportNamedDeclaration
                | NodeTag::ExportDefaultDeclaration
        )
    }

    /// Nodes whose list slot holds statements (or class members)
    pub fn has_statement_list(&self) -> bool {
        matches!(
            self.tag(),
            NodeTag::Program
                | NodeTag::BlockStatement
                | NodeTag::ClassDeclaration
                | NodeTag::SwitchCase
        )
    }

    pub fn is_function(&self) -> bool {
        matches!(
            self.tag(),
            NodeTag::FunctionDeclaration
                | NodeTag::FunctionExpression
                | NodeTag::ArrowFunctionExpression
                | NodeTag::Method
        )
    }

    pub fn identifier_name(&self) -> Option<&str> {
        match self {
            NodeKind::Identifier { name } => Some(name),
            _ => None,
        }
    }
}

/// Source ranges of one child at the time its parent was first touched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildSpan {
    pub span: Span,
    /// Span including the attached comments
    pub extent: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotSpans {
    One(Option<ChildSpan>),
    Many(Vec<ChildSpan>),
}

/// Snapshot of a parsed node taken before its own fields first change
#[derive(Debug, Clone)]
pub struct Original {
    pub shape: NodeKind,
    /// Absent when some child had no source text to point at
    pub slots: Option<Vec<SlotSpans>>,
}

/// One arena entry
#[derive(Debug, Clone)]
pub struct NodeData {
    pub kind: NodeKind,
    /// Absent for nodes built by a transformation
    pub span: Option<Span>,
    pub parent: Option<NodeId>,
    pub leading_comments: Vec<Comment>,
    pub trailing_comments: Vec<Comment>,
    /// Layout before the first mutation of this node's own fields
    pub(crate) original: Option<Original>,
    /// Some descendant was mutated
    pub(crate) dirty: bool,
    /// Comments differ from the ones attached at parse time
    pub(crate) comments_moved: bool,
    /// Span covering the comments attached at parse time
    pub(crate) extent: Option<Span>,
}

impl NodeData {
    pub fn new(kind: NodeKind, span: Option<Span>) -> Self {
        Self {
            kind,
            span,
            parent: None,
            leading_comments: Vec::new(),
            trailing_comments: Vec::new(),
            original: None,
            dirty: false,
            comments_moved: false,
            extent: span,
        }
    }

    pub fn is_touched(&self) -> bool {
        self.original.is_some()
    }

    pub fn has_comments(&self) -> bool {
        !self.leading_comments.is_empty() || !self.trailing_comments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(index: usize) -> NodeId {
        NodeId::live(index)
    }

    #[test]
    fn test_children_in_source_order() {
        let kind = NodeKind::ForStatement {
            init: Some(id(1)),
            test: None,
            update: Some(id(3)),
            body: id(4),
        };
        assert_eq!(kind.children(), vec![id(1), id(3), id(4)]);
    }

    #[test]
    fn test_replace_child_in_list() {
        let mut kind = NodeKind::CallExpression {
            callee: id(1),
            arguments: vec![id(2), id(3)],
            optional: false,
        };
        assert!(kind.replace_child(id(3), id(9)));
        assert_eq!(kind.children(), vec![id(1), id(2), id(9)]);
        assert!(!kind.replace_child(id(42), id(9)));
    }

    #[test]
    fn test_shape_ignores_children_but_not_scalars() {
        let a = NodeKind::BinaryExpression {
            operator: "===".into(),
            left: id(1),
            right: id(2),
        };
        let b = NodeKind::BinaryExpression {
            operator: "===".into(),
            left: id(5),
            right: id(6),
        };
        let c = NodeKind::BinaryExpression {
            operator: "!==".into(),
            left: id(1),
            right: id(2),
        };
        assert_eq!(a.shape(), b.shape());
        assert_ne!(a.shape(), c.shape());
    }
}
