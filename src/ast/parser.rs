//! # Tree Builder
//!
//! Recursive-descent parser turning [`SourceText`] into a [`Tree`].
//! Parentheses are not represented: the printer re-derives them from
//! operator precedence when it has to lay out new code.

use super::comments;
use super::lexer::{Token, TokenKind, tokenize};
use super::node::{DeclarationKind, MethodKind, NodeData, NodeId, NodeKind};
use super::position::Span;
use super::source::SourceText;
use super::tree::Tree;
use crate::errors::ParseError;
use tracing::debug;

const ASSIGNMENT_OPERATORS: &[&str] = &[
    "=", "+=", "-=", "*=", "/=", "%=", "**=", "<<=", ">>=", ">>>=", "&=", "|=", "^=", "&&=",
    "||=", "??=",
];

/// Words that can never name a binding or a plain reference
const RESERVED: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do",
    "else", "export", "extends", "finally", "for", "function", "if", "import", "in",
    "instanceof", "new", "return", "switch", "throw", "try", "typeof", "var", "void", "while",
    "with",
];

/// Binding power of a binary operator, higher binds tighter.
pub fn binary_precedence(operator: &str) -> Option<u8> {
    let precedence = match operator {
        "??" | "||" => 1,
        "&&" => 2,
        "|" => 3,
        "^" => 4,
        "&" => 5,
        "==" | "!=" | "===" | "!==" => 6,
        "<" | ">" | "<=" | ">=" | "instanceof" | "in" => 7,
        "<<" | ">>" | ">>>" => 8,
        "+" | "-" => 9,
        "*" | "/" | "%" => 10,
        "**" => 11,
        _ => return None,
    };
    Some(precedence)
}

pub fn is_logical_operator(operator: &str) -> bool {
    matches!(operator, "&&" | "||" | "??")
}

/// Parse `code` into a tree, attaching comments to statements.
pub fn parse(code: &str) -> Result<Tree, ParseError> {
    let mut source = SourceText::new(code);
    let lexed = tokenize(&source)?;
    source.set_templates(
        lexed
            .tokens
            .iter()
            .filter(|token| token.kind == TokenKind::Template)
            .map(|token| (token.start, token.end))
            .collect(),
    );
    let hashbang = lexed
        .hashbang_end
        .map(|end| source.text()[..end].to_string());

    let (nodes, root) = {
        let mut parser = Parser::new(&source, lexed.tokens);
        let root = parser.parse_program()?;
        (parser.nodes, root)
    };
    debug!("Parsed {} nodes, {} comments", nodes.len(), lexed.comments.len());

    let mut tree = Tree::from_parts(source, nodes, root, hashbang);
    comments::attach(&mut tree, lexed.comments);
    Ok(tree)
}

struct Parser<'a> {
    source: &'a SourceText,
    text: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    prev_end: usize,
    nodes: Vec<NodeData>,
    /// Inside a `for (…;` head, where `in` is not an operator
    no_in: bool,
}

impl<'a> Parser<'a> {
    fn new(source: &'a SourceText, tokens: Vec<Token>) -> Self {
        Self {
            source,
            text: source.text(),
            tokens,
            pos: 0,
            prev_end: 0,
            nodes: Vec::new(),
            no_in: false,
        }
    }

    // Token cursor

    fn cur(&self) -> Token {
        self.peek(0)
    }

    fn peek(&self, ahead: usize) -> Token {
        let index = (self.pos + ahead).min(self.tokens.len() - 1);
        self.tokens[index]
    }

    fn token_text(&self, token: Token) -> &'a str {
        &self.text[token.start..token.end]
    }

    fn cur_text(&self) -> &'a str {
        self.token_text(self.cur())
    }

    fn token_is(&self, token: Token, text: &str) -> bool {
        matches!(token.kind, TokenKind::Punct | TokenKind::Ident) && self.token_text(token) == text
    }

    fn is(&self, text: &str) -> bool {
        self.token_is(self.cur(), text)
    }

    fn peek_is(&self, ahead: usize, text: &str) -> bool {
        self.token_is(self.peek(ahead), text)
    }

    fn at_eof(&self) -> bool {
        self.cur().kind == TokenKind::Eof
    }

    fn bump(&mut self) -> Token {
        let token = self.cur();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
            self.prev_end = token.end;
        }
        token
    }

    fn eat(&mut self, text: &str) -> bool {
        if self.is(text) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, text: &str) -> Result<Token, ParseError> {
        if self.is(text) {
            Ok(self.bump())
        } else {
            Err(self.error_here(format!("Expected '{text}'")))
        }
    }

    fn error_here(&self, message: impl Into<String>) -> ParseError {
        let token = self.cur();
        let message = message.into();
        let message = if token.kind == TokenKind::Eof {
            format!("{message} but reached the end of input")
        } else {
            format!("{message} but found '{}'", self.token_text(token))
        };
        ParseError::new(message, self.source.position_at(token.start))
    }

    fn unexpected(&self) -> ParseError {
        let token = self.cur();
        let message = if token.kind == TokenKind::Eof {
            "Unexpected end of input".to_string()
        } else {
            format!("Unexpected token '{}'", self.token_text(token))
        };
        ParseError::new(message, self.source.position_at(token.start))
    }

    /// Automatic semicolon insertion: a line break, `}` or the end of input
    /// terminate a statement as well as `;` does.
    fn consume_semicolon(&mut self) -> Result<(), ParseError> {
        if self.eat(";") || self.is("}") || self.at_eof() || self.cur().newline_before {
            return Ok(());
        }
        Err(self.unexpected())
    }

    // Node allocation

    fn span_from(&self, start: usize) -> Span {
        Span::new(
            start,
            self.prev_end,
            self.source.position_at(start),
            self.source.position_at(self.prev_end),
        )
    }

    fn finish(&mut self, kind: NodeKind, start: usize) -> NodeId {
        let span = self.span_from(start);
        self.push(kind, span)
    }

    fn push(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId::live(self.nodes.len());
        self.nodes.push(NodeData::new(kind, Some(span)));
        id
    }

    fn span_of(&self, id: NodeId) -> Option<Span> {
        self.nodes[id.index as usize].span
    }

    // Program and statements

    fn parse_program(&mut self) -> Result<NodeId, ParseError> {
        let mut body = Vec::new();
        while !self.at_eof() {
            body.push(self.parse_statement()?);
        }
        let end = self.text.len();
        let span = Span::new(0, end, self.source.position_at(0), self.source.position_at(end));
        Ok(self.push(NodeKind::Program { body }, span))
    }

    fn parse_statement(&mut self) -> Result<NodeId, ParseError> {
        let token = self.cur();
        let start = token.start;

        if token.kind == TokenKind::Punct {
            match self.cur_text() {
                "{" => return self.parse_block(),
                ";" => {
                    self.bump();
                    return Ok(self.finish(NodeKind::EmptyStatement, start));
                }
                _ => {}
            }
        }

        if token.kind == TokenKind::Ident {
            match self.cur_text() {
                "var" | "const" => return self.parse_variable_declaration(false),
                "let" if self.starts_binding(1) => return self.parse_variable_declaration(false),
                "function" => return self.parse_function(false),
                "async" if self.peek_is(1, "function") && !self.peek(1).newline_before => {
                    return self.parse_function(false);
                }
                "class" => return self.parse_class(),
                "return" => return self.parse_return(),
                "if" => return self.parse_if(),
                "for" => return self.parse_for(),
                "while" => return self.parse_while(),
                "do" => return self.parse_do_while(),
                "throw" => return self.parse_throw(),
                "break" | "continue" => return self.parse_jump(),
                "try" => return self.parse_try(),
                "switch" => return self.parse_switch(),
                "import" if !self.peek_is(1, "(") && !self.peek_is(1, ".") => {
                    return self.parse_module_declaration();
                }
                "export" => return self.parse_export(),
                _ => {}
            }
        }

        let expression = self.parse_expression()?;
        self.consume_semicolon()?;
        Ok(self.finish(NodeKind::ExpressionStatement { expression }, start))
    }

    /// `let` followed by something that can only be a binding
    fn starts_binding(&self, ahead: usize) -> bool {
        let token = self.peek(ahead);
        match token.kind {
            TokenKind::Ident => !RESERVED.contains(&self.token_text(token)),
            TokenKind::Punct => matches!(self.token_text(token), "[" | "{"),
            _ => false,
        }
    }

    fn parse_block(&mut self) -> Result<NodeId, ParseError> {
        let start = self.expect("{")?.start;
        let mut body = Vec::new();
        while !self.is("}") {
            if self.at_eof() {
                return Err(self.error_here("Expected '}'"));
            }
            body.push(self.parse_statement()?);
        }
        self.bump();
        Ok(self.finish(NodeKind::BlockStatement { body }, start))
    }

    fn declaration_kind(&mut self) -> Result<DeclarationKind, ParseError> {
        let kind = match self.cur_text() {
            "var" => DeclarationKind::Var,
            "let" => DeclarationKind::Let,
            "const" => DeclarationKind::Const,
            _ => return Err(self.unexpected()),
        };
        self.bump();
        Ok(kind)
    }

    fn parse_variable_declaration(&mut self, in_for_head: bool) -> Result<NodeId, ParseError> {
        let start = self.cur().start;
        let kind = self.declaration_kind()?;
        let mut declarations = Vec::new();
        loop {
            let declarator_start = self.cur().start;
            let id = self.parse_binding_target()?;
            let init = if self.eat("=") {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            declarations.push(self.finish(NodeKind::VariableDeclarator { id, init }, declarator_start));
            if !self.eat(",") {
                break;
            }
        }
        if !in_for_head {
            self.consume_semicolon()?;
        }
        Ok(self.finish(NodeKind::VariableDeclaration { kind, declarations }, start))
    }

    fn parse_function(&mut self, is_expression: bool) -> Result<NodeId, ParseError> {
        let start = self.cur().start;
        let is_async = self.eat("async");
        self.expect("function")?;
        let generator = self.eat("*");
        let id = if self.cur().kind == TokenKind::Ident && !self.is("(") {
            Some(self.parse_identifier()?)
        } else {
            None
        };
        let params = self.parse_params()?;
        let body = self.with_in_allowed(Self::parse_block)?;

        let kind = if is_expression {
            NodeKind::FunctionExpression {
                id,
                params,
                body,
                is_async,
                generator,
            }
        } else {
            let Some(id) = id else {
                return Err(self.error_here("Expected a function name"));
            };
            NodeKind::FunctionDeclaration {
                id,
                params,
                body,
                is_async,
                generator,
            }
        };
        Ok(self.finish(kind, start))
    }

    fn parse_params(&mut self) -> Result<Vec<NodeId>, ParseError> {
        self.expect("(")?;
        let mut params = Vec::new();
        while !self.is(")") {
            if self.is("...") {
                params.push(self.parse_rest_element()?);
            } else {
                params.push(self.parse_binding_element()?);
            }
            if !self.eat(",") {
                break;
            }
        }
        self.expect(")")?;
        Ok(params)
    }

    fn parse_class(&mut self) -> Result<NodeId, ParseError> {
        let start = self.expect("class")?.start;
        let id = self.parse_identifier()?;
        let super_class = if self.eat("extends") {
            Some(self.parse_call_chain()?)
        } else {
            None
        };
        self.expect("{")?;
        let mut body = Vec::new();
        while !self.is("}") {
            if self.eat(";") {
                continue;
            }
            if self.at_eof() {
                return Err(self.error_here("Expected '}'"));
            }
            body.push(self.parse_method(true)?);
        }
        self.bump();
        Ok(self.finish(
            NodeKind::ClassDeclaration {
                id,
                super_class,
                body,
            },
            start,
        ))
    }

    /// A method modifier word is a modifier only when a key follows it.
    fn is_modifier(&self, word: &str) -> bool {
        self.is(word)
            && !self.peek(1).newline_before
            && !matches!(self.token_text(self.peek(1)), "(" | ":" | "," | "}" | "=" | ";")
    }

    fn parse_method(&mut self, in_class: bool) -> Result<NodeId, ParseError> {
        let start = self.cur().start;
        let is_static = in_class && self.is_modifier("static") && {
            self.bump();
            true
        };
        let is_async = self.is_modifier("async") && {
            self.bump();
            true
        };
        let mut kind = MethodKind::Method;
        if self.is_modifier("get") {
            self.bump();
            kind = MethodKind::Get;
        } else if self.is_modifier("set") {
            self.bump();
            kind = MethodKind::Set;
        }
        let (key, computed) = self.parse_property_key()?;
        if !self.is("(") {
            return Err(self.error_here("Expected '('"));
        }
        if in_class
            && !computed
            && kind == MethodKind::Method
            && matches!(&self.nodes[key.index as usize].kind, NodeKind::Identifier { name } if name == "constructor")
        {
            kind = MethodKind::Constructor;
        }
        let params = self.parse_params()?;
        let body = self.with_in_allowed(Self::parse_block)?;
        Ok(self.finish(
            NodeKind::Method {
                kind,
                key,
                computed,
                is_static,
                is_async,
                params,
                body,
            },
            start,
        ))
    }

    fn parse_return(&mut self) -> Result<NodeId, ParseError> {
        let start = self.expect("return")?.start;
        let argument = if self.is(";") || self.is("}") || self.at_eof() || self.cur().newline_before {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_semicolon()?;
        Ok(self.finish(NodeKind::ReturnStatement { argument }, start))
    }

    fn parse_paren_expression(&mut self) -> Result<NodeId, ParseError> {
        self.expect("(")?;
        let expression = self.with_in_allowed(Self::parse_expression)?;
        self.expect(")")?;
        Ok(expression)
    }

    fn parse_if(&mut self) -> Result<NodeId, ParseError> {
        let start = self.expect("if")?.start;
        let test = self.parse_paren_expression()?;
        let consequent = self.parse_statement()?;
        let alternate = if self.eat("else") {
            Some(self.parse_statement()?)
        } else {
            None
        };
        Ok(self.finish(
            NodeKind::IfStatement {
                test,
                consequent,
                alternate,
            },
            start,
        ))
    }

    fn parse_for(&mut self) -> Result<NodeId, ParseError> {
        let start = self.expect("for")?.start;
        self.expect("(")?;

        let init = if self.is(";") {
            None
        } else {
            let previous = std::mem::replace(&mut self.no_in, true);
            let init = if self.is("var") || self.is("const") || (self.is("let") && self.starts_binding(1)) {
                self.parse_variable_declaration(true)
            } else {
                self.parse_expression()
            };
            self.no_in = previous;
            Some(init?)
        };

        if let Some(left) = init {
            let is_of = self.is("of");
            if is_of || self.is("in") {
                self.bump();
                let right = self.with_in_allowed(Self::parse_assignment)?;
                self.expect(")")?;
                let body = self.parse_statement()?;
                let kind = if is_of {
                    NodeKind::ForOfStatement { left, right, body }
                } else {
                    NodeKind::ForInStatement { left, right, body }
                };
                return Ok(self.finish(kind, start));
            }
        }

        self.expect(";")?;
        let test = if self.is(";") {
            None
        } else {
            Some(self.with_in_allowed(Self::parse_expression)?)
        };
        self.expect(";")?;
        let update = if self.is(")") {
            None
        } else {
            Some(self.with_in_allowed(Self::parse_expression)?)
        };
        self.expect(")")?;
        let body = self.parse_statement()?;
        Ok(self.finish(
            NodeKind::ForStatement {
                init,
                test,
                update,
                body,
            },
            start,
        ))
    }

    fn parse_while(&mut self) -> Result<NodeId, ParseError> {
        let start = self.expect("while")?.start;
        let test = self.parse_paren_expression()?;
        let body = self.parse_statement()?;
        Ok(self.finish(NodeKind::WhileStatement { test, body }, start))
    }

    fn parse_do_while(&mut self) -> Result<NodeId, ParseError> {
        let start = self.expect("do")?.start;
        let body = self.parse_statement()?;
        self.expect("while")?;
        let test = self.parse_paren_expression()?;
        self.eat(";");
        Ok(self.finish(NodeKind::DoWhileStatement { body, test }, start))
    }

    fn parse_throw(&mut self) -> Result<NodeId, ParseError> {
        let start = self.expect("throw")?.start;
        if self.cur().newline_before {
            return Err(self.error_here("Illegal newline after throw"));
        }
        let argument = self.parse_expression()?;
        self.consume_semicolon()?;
        Ok(self.finish(NodeKind::ThrowStatement { argument }, start))
    }

    fn parse_jump(&mut self) -> Result<NodeId, ParseError> {
        let keyword = self.bump();
        let is_break = self.token_text(keyword) == "break";
        let label = if self.cur().kind == TokenKind::Ident
            && !self.cur().newline_before
            && !RESERVED.contains(&self.cur_text())
        {
            Some(self.parse_identifier()?)
        } else {
            None
        };
        self.consume_semicolon()?;
        let kind = if is_break {
            NodeKind::BreakStatement { label }
        } else {
            NodeKind::ContinueStatement { label }
        };
        Ok(self.finish(kind, keyword.start))
    }

    fn parse_try(&mut self) -> Result<NodeId, ParseError> {
        let start = self.expect("try")?.start;
        let block = self.parse_block()?;
        let mut param = None;
        let mut handler = None;
        if self.eat("catch") {
            if self.eat("(") {
                param = Some(self.parse_binding_target()?);
                self.expect(")")?;
            }
            handler = Some(self.parse_block()?);
        }
        let finalizer = if self.eat("finally") {
            Some(self.parse_block()?)
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            return Err(self.error_here("Expected 'catch' or 'finally'"));
        }
        Ok(self.finish(
            NodeKind::TryStatement {
                block,
                param,
                handler,
                finalizer,
            },
            start,
        ))
    }

    fn parse_switch(&mut self) -> Result<NodeId, ParseError> {
        let start = self.expect("switch")?.start;
        let discriminant = self.parse_paren_expression()?;
        self.expect("{")?;
        let mut cases = Vec::new();
        while !self.is("}") {
            let case_start = self.cur().start;
            let test = if self.eat("case") {
                Some(self.with_in_allowed(Self::parse_expression)?)
            } else {
                self.expect("default")?;
                None
            };
            self.expect(":")?;
            let mut consequent = Vec::new();
            while !self.is("case") && !self.is("default") && !self.is("}") {
                if self.at_eof() {
                    return Err(self.error_here("Expected '}'"));
                }
                consequent.push(self.parse_statement()?);
            }
            cases.push(self.finish(NodeKind::SwitchCase { test, consequent }, case_start));
        }
        self.bump();
        Ok(self.finish(
            NodeKind::SwitchStatement {
                discriminant,
                cases,
            },
            start,
        ))
    }

    /// `import …` and re-export lists are kept as raw text up to the module
    /// string that ends them.
    fn parse_module_declaration(&mut self) -> Result<NodeId, ParseError> {
        let start = self.bump().start;
        let mut depth = 0usize;
        loop {
            let token = self.cur();
            match token.kind {
                TokenKind::Eof => return Err(self.unexpected()),
                TokenKind::Str if depth == 0 => {
                    self.bump();
                    break;
                }
                _ => {}
            }
            match self.cur_text() {
                "{" => depth += 1,
                "}" => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.bump();
            // `export { a, b }` without a source ends at its closing brace
            if depth == 0 && self.token_text(token) == "}" && !self.is("from") {
                break;
            }
        }
        self.consume_semicolon()?;
        let raw = self.text[start..self.prev_end].to_string();
        Ok(self.finish(NodeKind::ModuleDeclaration { raw }, start))
    }

    fn parse_export(&mut self) -> Result<NodeId, ParseError> {
        let start = self.cur().start;
        if self.peek_is(1, "{") || self.peek_is(1, "*") {
            return self.parse_module_declaration();
        }
        self.expect("export")?;
        if self.eat("default") {
            let declaration = if self.is("function")
                || self.is("class")
                || (self.is("async") && self.peek_is(1, "function"))
            {
                if self.is("class") {
                    self.parse_class()?
                } else {
                    self.parse_function(true)?
                }
            } else {
                let expression = self.parse_assignment()?;
                self.consume_semicolon()?;
                expression
            };
            return Ok(self.finish(NodeKind::ExportDefaultDeclaration { declaration }, start));
        }
        let declaration = self.parse_statement()?;
        Ok(self.finish(NodeKind::ExportNamedDeclaration { declaration }, start))
    }

    // Patterns

    fn parse_identifier(&mut self) -> Result<NodeId, ParseError> {
        let token = self.cur();
        if token.kind != TokenKind::Ident || RESERVED.contains(&self.cur_text()) {
            return Err(self.error_here("Expected an identifier"));
        }
        self.bump();
        let name = self.token_text(token).to_string();
        Ok(self.finish(NodeKind::Identifier { name }, token.start))
    }

    fn parse_binding_target(&mut self) -> Result<NodeId, ParseError> {
        if self.is("[") {
            self.parse_array_pattern()
        } else if self.is("{") {
            self.parse_object_pattern()
        } else {
            self.parse_identifier()
        }
    }

    fn parse_binding_element(&mut self) -> Result<NodeId, ParseError> {
        let start = self.cur().start;
        let target = self.parse_binding_target()?;
        if self.eat("=") {
            let right = self.with_in_allowed(Self::parse_assignment)?;
            return Ok(self.finish(NodeKind::AssignmentPattern { left: target, right }, start));
        }
        Ok(target)
    }

    fn parse_rest_element(&mut self) -> Result<NodeId, ParseError> {
        let start = self.expect("...")?.start;
        let argument = self.parse_binding_target()?;
        Ok(self.finish(NodeKind::RestElement { argument }, start))
    }

    fn parse_array_pattern(&mut self) -> Result<NodeId, ParseError> {
        let start = self.expect("[")?.start;
        let mut elements = Vec::new();
        while !self.is("]") {
            if self.is(",") {
                return Err(self.error_here("Array holes are not supported"));
            }
            if self.is("...") {
                elements.push(self.parse_rest_element()?);
            } else {
                elements.push(self.parse_binding_element()?);
            }
            if !self.eat(",") {
                break;
            }
        }
        self.expect("]")?;
        Ok(self.finish(NodeKind::ArrayPattern { elements }, start))
    }

    fn parse_object_pattern(&mut self) -> Result<NodeId, ParseError> {
        let start = self.expect("{")?.start;
        let mut properties = Vec::new();
        while !self.is("}") {
            if self.is("...") {
                properties.push(self.parse_rest_element()?);
            } else {
                let property_start = self.cur().start;
                let (key, computed) = self.parse_property_key()?;
                let (value, shorthand) = if self.eat(":") {
                    (self.parse_binding_element()?, false)
                } else {
                    let value = self.shorthand_value(key, computed)?;
                    if self.eat("=") {
                        let right = self.with_in_allowed(Self::parse_assignment)?;
                        let pattern = NodeKind::AssignmentPattern { left: value, right };
                        (self.finish(pattern, property_start), true)
                    } else {
                        (value, true)
                    }
                };
                properties.push(self.finish(
                    NodeKind::ObjectProperty {
                        key,
                        value,
                        computed,
                        shorthand,
                    },
                    property_start,
                ));
            }
            if !self.eat(",") {
                break;
            }
        }
        self.expect("}")?;
        Ok(self.finish(NodeKind::ObjectPattern { properties }, start))
    }

    /// Value node of `{ a }`: a second identifier over the key's text
    fn shorthand_value(&mut self, key: NodeId, computed: bool) -> Result<NodeId, ParseError> {
        let name = match &self.nodes[key.index as usize].kind {
            NodeKind::Identifier { name } if !computed && !RESERVED.contains(&name.as_str()) => name.clone(),
            _ => return Err(self.error_here("Expected ':'")),
        };
        let span = self.span_of(key).ok_or_else(|| self.unexpected())?;
        Ok(self.push(NodeKind::Identifier { name }, span))
    }

    /// Property name: any identifier-like word, a string, a number, or a
    /// `[computed]` expression.
    fn parse_property_key(&mut self) -> Result<(NodeId, bool), ParseError> {
        let token = self.cur();
        if self.eat("[") {
            let key = self.with_in_allowed(Self::parse_assignment)?;
            self.expect("]")?;
            return Ok((key, true));
        }
        let kind = match token.kind {
            TokenKind::Ident => NodeKind::Identifier {
                name: self.token_text(token).to_string(),
            },
            TokenKind::Str => NodeKind::StringLiteral {
                raw: self.token_text(token).to_string(),
            },
            TokenKind::Num => NodeKind::NumericLiteral {
                raw: self.token_text(token).to_string(),
            },
            _ => return Err(self.error_here("Expected a property name")),
        };
        self.bump();
        Ok((self.finish(kind, token.start), false))
    }

    // Expressions

    fn with_in_allowed<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, ParseError>) -> Result<T, ParseError> {
        let previous = std::mem::replace(&mut self.no_in, false);
        let result = f(self);
        self.no_in = previous;
        result
    }

    fn parse_expression(&mut self) -> Result<NodeId, ParseError> {
        let start = self.cur().start;
        let first = self.parse_assignment()?;
        if !self.is(",") {
            return Ok(first);
        }
        let mut expressions = vec![first];
        while self.eat(",") {
            expressions.push(self.parse_assignment()?);
        }
        Ok(self.finish(NodeKind::SequenceExpression { expressions }, start))
    }

    /// Index of the token closing the bracket at `open`
    fn matching_close(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (index, token) in self.tokens.iter().enumerate().skip(open) {
            if token.kind != TokenKind::Punct {
                continue;
            }
            match self.token_text(*token) {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(index);
                    }
                }
                _ => {}
            }
        }
        None
    }

    fn arrow_ahead(&self, from: usize) -> bool {
        let Some(token) = self.tokens.get(from) else {
            return false;
        };
        let arrow_at = |index: usize| {
            self.tokens
                .get(index)
                .is_some_and(|t| self.token_is(*t, "=>") && !t.newline_before)
        };
        match token.kind {
            TokenKind::Ident => !RESERVED.contains(&self.token_text(*token)) && arrow_at(from + 1),
            TokenKind::Punct if self.token_text(*token) == "(" => {
                self.matching_close(from).is_some_and(|close| arrow_at(close + 1))
            }
            _ => false,
        }
    }

    fn is_arrow_start(&self) -> bool {
        if self.is("async") && !self.peek(1).newline_before && self.arrow_ahead(self.pos + 1) {
            return true;
        }
        self.arrow_ahead(self.pos)
    }

    fn parse_arrow(&mut self) -> Result<NodeId, ParseError> {
        let start = self.cur().start;
        let is_async = self.is("async") && !self.peek_is(1, "=>") && {
            self.bump();
            true
        };
        let params = if self.is("(") {
            self.parse_params()?
        } else {
            vec![self.parse_identifier()?]
        };
        self.expect("=>")?;
        let body = if self.is("{") {
            self.with_in_allowed(Self::parse_block)?
        } else {
            self.parse_assignment()?
        };
        Ok(self.finish(
            NodeKind::ArrowFunctionExpression {
                params,
                body,
                is_async,
            },
            start,
        ))
    }

    fn parse_assignment(&mut self) -> Result<NodeId, ParseError> {
        if self.is_arrow_start() {
            return self.parse_arrow();
        }
        let start = self.cur().start;
        let left = self.parse_conditional()?;
        let token = self.cur();
        if token.kind == TokenKind::Punct && ASSIGNMENT_OPERATORS.contains(&self.token_text(token)) {
            self.bump();
            let operator = self.token_text(token).to_string();
            let right = self.parse_assignment()?;
            return Ok(self.finish(NodeKind::AssignmentExpression { operator, left, right }, start));
        }
        Ok(left)
    }

    fn parse_conditional(&mut self) -> Result<NodeId, ParseError> {
        let start = self.cur().start;
        let test = self.parse_binary(1)?;
        if !self.eat("?") {
            return Ok(test);
        }
        let consequent = self.with_in_allowed(Self::parse_assignment)?;
        self.expect(":")?;
        let alternate = self.parse_assignment()?;
        Ok(self.finish(
            NodeKind::ConditionalExpression {
                test,
                consequent,
                alternate,
            },
            start,
        ))
    }

    fn current_binary_operator(&self) -> Option<(&'a str, u8)> {
        let token = self.cur();
        let text = self.token_text(token);
        match token.kind {
            TokenKind::Punct => binary_precedence(text).map(|p| (text, p)),
            TokenKind::Ident if text == "instanceof" || (text == "in" && !self.no_in) => {
                binary_precedence(text).map(|p| (text, p))
            }
            _ => None,
        }
    }

    /// Precedence climbing; `**` is the only right-associative operator.
    fn parse_binary(&mut self, min_precedence: u8) -> Result<NodeId, ParseError> {
        let start = self.cur().start;
        let mut left = self.parse_unary()?;
        while let Some((operator, precedence)) = self.current_binary_operator() {
            if precedence < min_precedence {
                break;
            }
            self.bump();
            let next = if operator == "**" { precedence } else { precedence + 1 };
            let right = self.parse_binary(next)?;
            let operator = operator.to_string();
            let kind = if is_logical_operator(&operator) {
                NodeKind::LogicalExpression { operator, left, right }
            } else {
                NodeKind::BinaryExpression { operator, left, right }
            };
            left = self.finish(kind, start);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<NodeId, ParseError> {
        let token = self.cur();
        let start = token.start;
        let text = self.token_text(token);
        let is_unary = match token.kind {
            TokenKind::Punct => matches!(text, "!" | "-" | "+" | "~"),
            TokenKind::Ident => matches!(text, "typeof" | "void" | "delete"),
            _ => false,
        };
        if is_unary {
            self.bump();
            let argument = self.parse_unary()?;
            let operator = text.to_string();
            return Ok(self.finish(NodeKind::UnaryExpression { operator, argument }, start));
        }
        if self.is("++") || self.is("--") {
            self.bump();
            let argument = self.parse_unary()?;
            return Ok(self.finish(
                NodeKind::UpdateExpression {
                    operator: text.to_string(),
                    prefix: true,
                    argument,
                },
                start,
            ));
        }
        if self.is("await") && !self.peek_is(1, ")") && !self.peek_is(1, ";") && !self.peek_is(1, "=") {
            self.bump();
            let argument = self.parse_unary()?;
            return Ok(self.finish(NodeKind::AwaitExpression { argument }, start));
        }

        let argument = self.parse_call_chain()?;
        if (self.is("++") || self.is("--")) && !self.cur().newline_before {
            let operator = self.cur_text().to_string();
            self.bump();
            return Ok(self.finish(
                NodeKind::UpdateExpression {
                    operator,
                    prefix: false,
                    argument,
                },
                start,
            ));
        }
        Ok(argument)
    }

    fn parse_call_chain(&mut self) -> Result<NodeId, ParseError> {
        let start = self.cur().start;
        let mut expression = if self.is("new") {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        loop {
            if self.eat(".") {
                let property = self.parse_property_name()?;
                expression = self.member(expression, property, false, false, start);
            } else if self.eat("?.") {
                if self.is("(") {
                    let arguments = self.parse_arguments()?;
                    expression = self.finish(
                        NodeKind::CallExpression {
                            callee: expression,
                            arguments,
                            optional: true,
                        },
                        start,
                    );
                } else if self.eat("[") {
                    let property = self.with_in_allowed(Self::parse_expression)?;
                    self.expect("]")?;
                    expression = self.member(expression, property, true, true, start);
                } else {
                    let property = self.parse_property_name()?;
                    expression = self.member(expression, property, false, true, start);
                }
            } else if self.eat("[") {
                let property = self.with_in_allowed(Self::parse_expression)?;
                self.expect("]")?;
                expression = self.member(expression, property, true, false, start);
            } else if self.is("(") {
                let arguments = self.parse_arguments()?;
                expression = self.finish(
                    NodeKind::CallExpression {
                        callee: expression,
                        arguments,
                        optional: false,
                    },
                    start,
                );
            } else {
                break;
            }
        }
        Ok(expression)
    }

    fn member(&mut self, object: NodeId, property: NodeId, computed: bool, optional: bool, start: usize) -> NodeId {
        self.finish(
            NodeKind::MemberExpression {
                object,
                property,
                computed,
                optional,
            },
            start,
        )
    }

    /// Identifier after a dot; keywords are fine here
    fn parse_property_name(&mut self) -> Result<NodeId, ParseError> {
        let token = self.cur();
        if token.kind != TokenKind::Ident {
            return Err(self.error_here("Expected a property name"));
        }
        self.bump();
        let name = self.token_text(token).to_string();
        Ok(self.finish(NodeKind::Identifier { name }, token.start))
    }

    fn parse_new(&mut self) -> Result<NodeId, ParseError> {
        let start = self.expect("new")?.start;
        let mut callee = if self.is("new") {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        loop {
            if self.eat(".") {
                let property = self.parse_property_name()?;
                callee = self.member(callee, property, false, false, start);
            } else if self.eat("[") {
                let property = self.with_in_allowed(Self::parse_expression)?;
                self.expect("]")?;
                callee = self.member(callee, property, true, false, start);
            } else {
                break;
            }
        }
        let arguments = if self.is("(") {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        Ok(self.finish(NodeKind::NewExpression { callee, arguments }, start))
    }

    fn parse_arguments(&mut self) -> Result<Vec<NodeId>, ParseError> {
        self.expect("(")?;
        let mut arguments = Vec::new();
        while !self.is(")") {
            arguments.push(self.parse_spread_or_assignment()?);
            if !self.eat(",") {
                break;
            }
        }
        self.expect(")")?;
        Ok(arguments)
    }

    fn parse_spread_or_assignment(&mut self) -> Result<NodeId, ParseError> {
        let start = self.cur().start;
        if self.eat("...") {
            let argument = self.with_in_allowed(Self::parse_assignment)?;
            return Ok(self.finish(NodeKind::SpreadElement { argument }, start));
        }
        self.with_in_allowed(Self::parse_assignment)
    }

    fn parse_primary(&mut self) -> Result<NodeId, ParseError> {
        let token = self.cur();
        let start = token.start;
        let raw = self.token_text(token).to_string();
        let kind = match token.kind {
            TokenKind::Ident => match raw.as_str() {
                "function" => return self.parse_function(true),
                "async" if self.peek_is(1, "function") && !self.peek(1).newline_before => {
                    return self.parse_function(true);
                }
                "this" => NodeKind::ThisExpression,
                "true" => NodeKind::BooleanLiteral { value: true },
                "false" => NodeKind::BooleanLiteral { value: false },
                "null" => NodeKind::NullLiteral,
                word if RESERVED.contains(&word) => return Err(self.unexpected()),
                _ => NodeKind::Identifier { name: raw },
            },
            TokenKind::Num => NodeKind::NumericLiteral { raw },
            TokenKind::Str => NodeKind::StringLiteral { raw },
            TokenKind::Template => NodeKind::TemplateLiteral { raw },
            TokenKind::Regex => NodeKind::RegExpLiteral { raw },
            TokenKind::Punct => match raw.as_str() {
                "(" => return self.parse_paren_expression(),
                "[" => return self.parse_array_expression(),
                "{" => return self.parse_object_expression(),
                _ => return Err(self.unexpected()),
            },
            TokenKind::Eof => return Err(self.unexpected()),
        };
        self.bump();
        Ok(self.finish(kind, start))
    }

    fn parse_array_expression(&mut self) -> Result<NodeId, ParseError> {
        let start = self.expect("[")?.start;
        let mut elements = Vec::new();
        while !self.is("]") {
            if self.is(",") {
                return Err(self.error_here("Array holes are not supported"));
            }
            elements.push(self.parse_spread_or_assignment()?);
            if !self.eat(",") {
                break;
            }
        }
        self.expect("]")?;
        Ok(self.finish(NodeKind::ArrayExpression { elements }, start))
    }

    fn parse_object_expression(&mut self) -> Result<NodeId, ParseError> {
        let start = self.expect("{")?.start;
        let mut properties = Vec::new();
        while !self.is("}") {
            properties.push(self.parse_object_member()?);
            if !self.eat(",") {
                break;
            }
        }
        self.expect("}")?;
        Ok(self.finish(NodeKind::ObjectExpression { properties }, start))
    }

    fn parse_object_member(&mut self) -> Result<NodeId, ParseError> {
        let start = self.cur().start;
        if self.eat("...") {
            let argument = self.with_in_allowed(Self::parse_assignment)?;
            return Ok(self.finish(NodeKind::SpreadElement { argument }, start));
        }
        let is_method = self.is_modifier("async")
            || self.is_modifier("get")
            || self.is_modifier("set")
            || {
                // `key(` after a plain or computed key
                let key_end = if self.is("[") {
                    self.matching_close(self.pos).map(|close| close + 1)
                } else {
                    Some(self.pos + 1)
                };
                key_end.is_some_and(|index| self.tokens.get(index).is_some_and(|t| self.token_is(*t, "(")))
            };
        if is_method {
            return self.parse_method(false);
        }

        let (key, computed) = self.parse_property_key()?;
        let (value, shorthand) = if self.eat(":") {
            (self.with_in_allowed(Self::parse_assignment)?, false)
        } else {
            (self.shorthand_value(key, computed)?, true)
        };
        Ok(self.finish(
            NodeKind::ObjectProperty {
                key,
                value,
                computed,
                shorthand,
            },
            start,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::node::NodeTag;

    fn statement_tags(code: &str) -> Vec<NodeTag> {
        let tree = parse(code).unwrap();
        tree.children(tree.root()).iter().map(|id| tree.tag(*id)).collect()
    }

    fn first_expression(code: &str) -> (Tree, NodeId) {
        let tree = parse(code).unwrap();
        let statement = tree.children(tree.root())[0];
        let expression = tree.children(statement)[0];
        (tree, expression)
    }

    #[test]
    fn test_statements() {
        let tags = statement_tags(
            "const a = 1;\nfunction f(x, ...rest) { return x; }\nif (a) b(); else { c() }\nfor (const x of xs) {}\nwhile (true) break\n",
        );
        assert_eq!(
            tags,
            vec![
                NodeTag::VariableDeclaration,
                NodeTag::FunctionDeclaration,
                NodeTag::IfStatement,
                NodeTag::ForOfStatement,
                NodeTag::WhileStatement,
            ]
        );
    }

    #[test]
    fn test_semicolon_insertion_at_line_breaks() {
        let tags = statement_tags("let a = 1\nlet b = a\nb++\n");
        assert_eq!(tags.len(), 3);
        assert!(parse("let a = 1 let b = 2").is_err());
    }

    #[test]
    fn test_precedence_and_associativity() {
        let (tree, expression) = first_expression("a + b * c ** d ** e;");
        let NodeKind::BinaryExpression { operator, right, .. } = tree.kind(expression) else {
            panic!("expected binary expression");
        };
        assert_eq!(operator, "+");
        assert_eq!(tree.text(*right), Some("b * c ** d ** e"));
        let NodeKind::BinaryExpression { right, .. } = tree.kind(*right) else {
            panic!("expected binary expression");
        };
        assert_eq!(tree.text(*right), Some("c ** d ** e"));
    }

    #[test]
    fn test_parentheses_are_dropped() {
        let (tree, expression) = first_expression("(a || b) && c;");
        let NodeKind::LogicalExpression { left, .. } = tree.kind(expression) else {
            panic!("expected logical expression");
        };
        assert_eq!(tree.text(*left), Some("a || b"));
        assert_eq!(tree.text(expression), Some("(a || b) && c"));
    }

    #[test]
    fn test_arrow_functions() {
        let (tree, expression) = first_expression("items.map((item, i) => item * i);");
        let NodeKind::CallExpression { arguments, .. } = tree.kind(expression) else {
            panic!("expected call");
        };
        assert_eq!(tree.tag(arguments[0]), NodeTag::ArrowFunctionExpression);
        assert_eq!(tree.children(arguments[0]).len(), 3);
    }

    #[test]
    fn test_classic_for_loop_with_in_operator_in_body() {
        let tags = statement_tags("for (let i = 0, len = a.length; i < len; i++) { if ('x' in o) {} }");
        assert_eq!(tags, vec![NodeTag::ForStatement]);
    }

    #[test]
    fn test_class_members() {
        let tree = parse("class A extends B {\n  constructor(x) { super(x); }\n  static get size() { return 1; }\n}").unwrap();
        let class = tree.children(tree.root())[0];
        let methods: Vec<_> = tree
            .children(class)
            .into_iter()
            .filter(|id| tree.tag(*id) == NodeTag::Method)
            .map(|id| match tree.kind(id) {
                NodeKind::Method { kind, is_static, .. } => (*kind, *is_static),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(methods, vec![(MethodKind::Constructor, false), (MethodKind::Get, true)]);
    }

    #[test]
    fn test_object_literal_forms() {
        let (tree, declaration) = first_expression("const o = { a, b: 1, [k]: 2, ...rest, run() {}, get x() { return 1; } };");
        let init = tree.children(declaration)[1];
        let tags: Vec<_> = tree.children(init).iter().map(|id| tree.tag(*id)).collect();
        assert_eq!(
            tags,
            vec![
                NodeTag::ObjectProperty,
                NodeTag::ObjectProperty,
                NodeTag::ObjectProperty,
                NodeTag::SpreadElement,
                NodeTag::Method,
                NodeTag::Method,
            ]
        );
    }

    #[test]
    fn test_modules_try_and_switch() {
        let tags = statement_tags(
            "import fs from 'fs';\nexport const a = 1;\nexport { a as b };\ntry { a() } catch (e) {} finally {}\nswitch (a) { case 1: b(); break; default: c(); }\nexport default function () {}\n",
        );
        assert_eq!(
            tags,
            vec![
                NodeTag::ModuleDeclaration,
                NodeTag::ExportNamedDeclaration,
                NodeTag::ModuleDeclaration,
                NodeTag::TryStatement,
                NodeTag::SwitchStatement,
                NodeTag::ExportDefaultDeclaration,
            ]
        );
    }

    #[test]
    fn test_hashbang_is_kept() {
        let tree = parse("#!/usr/bin/env node\nmain();\n").unwrap();
        assert_eq!(tree.hashbang(), Some("#!/usr/bin/env node"));
        assert_eq!(statement_tags("#!/usr/bin/env node\nmain();\n"), vec![NodeTag::ExpressionStatement]);
    }

    #[test]
    fn test_syntax_error_position() {
        let error = parse("const a = ;").err().unwrap();
        assert_eq!(error.position.line, 0);
        assert_eq!(error.position.character, 10);
    }
}
