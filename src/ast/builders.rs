//! Constructors for nodes built by transformations. New nodes carry no
//! source span and are laid out by the printer.

use super::node::{DeclarationKind, NodeId, NodeKind};
use super::tree::Tree;

impl Tree {
    pub fn identifier(&mut self, name: &str) -> NodeId {
        self.alloc(NodeKind::Identifier {
            name: name.to_string(),
        })
    }

    pub fn undefined(&mut self) -> NodeId {
        self.identifier("undefined")
    }

    pub fn boolean(&mut self, value: bool) -> NodeId {
        self.alloc(NodeKind::BooleanLiteral { value })
    }

    pub fn block(&mut self, body: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::BlockStatement { body })
    }

    pub fn expression_statement(&mut self, expression: NodeId) -> NodeId {
        self.alloc(NodeKind::ExpressionStatement { expression })
    }

    pub fn return_statement(&mut self, argument: Option<NodeId>) -> NodeId {
        self.alloc(NodeKind::ReturnStatement { argument })
    }

    pub fn member(&mut self, object: NodeId, property: &str) -> NodeId {
        let property = self.identifier(property);
        self.alloc(NodeKind::MemberExpression {
            object,
            property,
            computed: false,
            optional: false,
        })
    }

    pub fn call(&mut self, callee: NodeId, arguments: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::CallExpression {
            callee,
            arguments,
            optional: false,
        })
    }

    pub fn arrow(&mut self, params: Vec<NodeId>, body: NodeId) -> NodeId {
        self.alloc(NodeKind::ArrowFunctionExpression {
            params,
            body,
            is_async: false,
        })
    }

    pub fn unary(&mut self, operator: &str, argument: NodeId) -> NodeId {
        self.alloc(NodeKind::UnaryExpression {
            operator: operator.to_string(),
            argument,
        })
    }

    pub fn assignment(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.alloc(NodeKind::AssignmentExpression {
            operator: "=".to_string(),
            left,
            right,
        })
    }

    pub fn declarator(&mut self, id: NodeId, init: Option<NodeId>) -> NodeId {
        self.alloc(NodeKind::VariableDeclarator { id, init })
    }

    pub fn declaration(&mut self, kind: DeclarationKind, declarations: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::VariableDeclaration { kind, declarations })
    }
}
