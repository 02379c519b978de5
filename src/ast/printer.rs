//! # Printer
//!
//! Regenerates source text from a partially mutated [`Tree`].
//!
//! Each node is printed by the first strategy that applies:
//!
//! 1. **Reuse** - the node and its subtree are untouched: copy the original
//!    text, re-indented when the node now sits at another depth.
//! 2. **Patch** - the node has its original shape but some child changed:
//!    copy the original text and splice the reprinted children into it.
//!    List separators between elements that were neighbours before are
//!    kept verbatim.
//! 3. **Layout** - the node is new or changed shape: print it with a fixed
//!    layout, its children going through the same three strategies.
//!
//! Parentheses are not part of the tree. Layout adds them from operator
//! precedence; patching adds them only where the original text had none.

use super::comments::starts_own_line;
use super::node::{ChildSpan, Comment, MethodKind, NodeId, NodeKind, NodeTag, Slot, SlotSpans};
use super::parser::binary_precedence;
use super::position::Span;
use super::source::SourceText;
use super::tree::Tree;

/// Print the whole program.
pub fn print(tree: &Tree) -> String {
    Printer::new(tree).print_program()
}

pub struct Printer<'t> {
    tree: &'t Tree,
    source: &'t SourceText,
    unit: String,
}

impl<'t> Printer<'t> {
    pub fn new(tree: &'t Tree) -> Self {
        Self {
            tree,
            source: tree.source(),
            unit: tree.source().indent().unit(),
        }
    }

    pub fn print_program(&self) -> String {
        self.print(self.tree.root(), "")
    }

    /// Print `id` as if its first line started at indentation `indent`.
    pub fn print(&self, id: NodeId, indent: &str) -> String {
        if self.tree.is_pristine(id) {
            if let Some(span) = self.tree.span(id) {
                return self.reuse(span.start, span.end, indent);
            }
        }
        if let Some(text) = self.patch(id, indent) {
            return text;
        }
        self.layout(id, indent)
    }

    fn reuse(&self, start: usize, end: usize, indent: &str) -> String {
        let base = self.source.line_indent(start);
        self.piece(start, end, base, indent)
    }

    /// Original text of `start..end` moved from indentation `base` to
    /// `indent`. Lines starting inside a template literal are kept as is.
    fn piece(&self, start: usize, end: usize, base: &str, indent: &str) -> String {
        let text = self.source.slice_range(start, end);
        if base == indent || !text.contains('\n') {
            return text.to_string();
        }
        let mut out = String::with_capacity(text.len());
        let mut line_start = start;
        for (number, line) in text.split('\n').enumerate() {
            if number > 0 {
                out.push('\n');
            }
            let rebased = (number > 0 && !self.source.in_template(line_start) && !line.trim().is_empty())
                .then(|| line.strip_prefix(base))
                .flatten();
            match rebased {
                Some(rest) => {
                    out.push_str(indent);
                    out.push_str(rest);
                }
                None => out.push_str(line),
            }
            line_start += line.len() + 1;
        }
        out
    }

    /// Indentation for a child that sat at `offset` in the original text,
    /// keeping its depth relative to the parent.
    fn nested_indent(&self, base: &str, indent: &str, offset: usize) -> String {
        match self.source.line_indent(offset).strip_prefix(base) {
            Some(rest) => format!("{indent}{rest}"),
            None => indent.to_string(),
        }
    }

    fn inner(&self, indent: &str) -> String {
        format!("{indent}{}", self.unit)
    }

    // Patch

    fn patch(&self, id: NodeId, indent: &str) -> Option<String> {
        let node = self.tree.node(id);
        let span = node.span?;
        let (shape, old_slots) = match &node.original {
            Some(original) => (original.shape.clone(), original.slots.clone()?),
            None => (node.kind.shape(), self.tree.child_spans(&node.kind)?),
        };
        if shape != node.kind.shape() {
            return None;
        }

        let base = self.source.line_indent(span.start);
        let mut out = String::new();
        let mut cursor = span.start;
        for (old, new) in old_slots.iter().zip(node.kind.slots()) {
            match (old, new) {
                (SlotSpans::One(None), Slot::One(None)) => {}
                (SlotSpans::One(Some(old_child)), Slot::One(Some(child))) => {
                    // Shorthand properties share one span between key and value
                    if old_child.span.start < cursor {
                        return None;
                    }
                    out.push_str(&self.piece(cursor, old_child.span.start, base, indent));
                    let child_indent = self.nested_indent(base, indent, old_child.span.start);
                    let text = self.print(child, &child_indent);
                    if self.needs_parens(id, child) && !self.is_parenthesized(&old_child.span) {
                        out.push_str(&format!("({text})"));
                    } else {
                        out.push_str(&text);
                    }
                    cursor = old_child.span.end;
                }
                (SlotSpans::Many(old_list), Slot::Many(new_list)) => {
                    let (Some(first), Some(last)) = (old_list.first(), old_list.last()) else {
                        if new_list.is_empty() {
                            continue;
                        }
                        return None;
                    };
                    if new_list.is_empty() || first.extent.start < cursor {
                        return None;
                    }
                    let statements = node.kind.has_statement_list();
                    // `{ a(); }` written on one line: new statements go one level in
                    let one_line_block =
                        statements && node.kind.tag() != NodeTag::Program && first.span.start_pos.line == span.start_pos.line;
                    let element_indent = if one_line_block {
                        self.inner(indent)
                    } else {
                        self.nested_indent(base, indent, first.span.start)
                    };
                    let commented = if statements {
                        None
                    } else {
                        self.reorder_commented(old_list, &new_list, cursor, span.end, indent, &element_indent)
                    };
                    match commented {
                        Some(list) => {
                            out.push_str(&self.piece(cursor, list.start, base, indent));
                            out.push_str(&list.text);
                            cursor = list.end;
                        }
                        None => {
                            out.push_str(&self.piece(cursor, first.extent.start, base, indent));
                            out.push_str(&self.patch_list(id, old_list, &new_list, base, indent, &element_indent));
                            cursor = last.extent.end;
                        }
                    }
                }
                _ => return None,
            }
        }
        out.push_str(&self.piece(cursor, span.end, base, indent));
        Some(out)
    }

    fn patch_list(
        &self,
        parent: NodeId,
        old: &[ChildSpan],
        new: &[NodeId],
        base: &str,
        indent: &str,
        element_indent: &str,
    ) -> String {
        let old_index = |id: NodeId| {
            let span = self.tree.span(id)?;
            old.iter().position(|child| child.span == span)
        };
        let statements = self.tree.kind(parent).has_statement_list();

        let mut out = String::new();
        for (position, element) in new.iter().enumerate() {
            if position > 0 {
                match (old_index(new[position - 1]), old_index(*element)) {
                    (Some(previous), Some(current)) if current == previous + 1 => {
                        out.push_str(&self.piece(old[previous].extent.end, old[current].extent.start, base, indent));
                    }
                    _ if statements => out.push_str(&format!("\n{element_indent}")),
                    _ if old.len() >= 2 => {
                        out.push_str(&self.piece(old[0].extent.end, old[1].extent.start, base, indent));
                    }
                    _ => out.push_str(", "),
                }
            }
            out.push_str(&self.print_element(*element, element_indent));
        }
        out
    }

    /// Reordered comma list whose original text has comments between the
    /// elements. Comments travel with the element they belong to: comments
    /// ending the element's line trail it, comments right before it lead it.
    /// `None` when the list kept its order or has nothing to carry.
    fn reorder_commented(
        &self,
        old: &[ChildSpan],
        new: &[NodeId],
        cursor: usize,
        limit: usize,
        indent: &str,
        element_indent: &str,
    ) -> Option<CommentedList> {
        let old_index = |id: NodeId| {
            let span = self.tree.span(id)?;
            old.iter().position(|child| child.span == span)
        };
        let in_place = new.len() == old.len() && new.iter().enumerate().all(|(at, id)| old_index(*id) == Some(at));
        if in_place {
            return None;
        }

        let text = self.source.text();
        let (first, last) = (old.first()?, old.last()?);
        let mut decorations = vec![Decoration::default(); old.len()];
        let mut separators = Vec::with_capacity(old.len());

        for at in 1..old.len() {
            let (start, end) = (old[at - 1].span.end, old[at].span.start);
            let gap = fillers(&text[start..end], start);
            let commas = gap.iter().filter(|(filler, ..)| *filler == Filler::Comma).count();
            if commas != 1 || gap.iter().any(|(filler, ..)| *filler == Filler::Other) {
                return None;
            }
            let comma = gap.iter().position(|(filler, ..)| *filler == Filler::Comma)?;
            for (filler, from, to) in &gap[..comma] {
                if filler.is_comment() {
                    decorations[at - 1].trail(&text[*from..*to], *filler);
                }
            }

            let mut rest = comma + 1;
            let line_break = gap[rest..]
                .iter()
                .position(|(filler, ..)| *filler == Filler::Space { newline: true })
                .map(|offset| rest + offset);
            if let Some(line_break) = line_break {
                if gap[rest..line_break].iter().any(|(filler, ..)| filler.is_comment()) {
                    for (filler, from, to) in &gap[rest..line_break] {
                        if filler.is_comment() {
                            decorations[at - 1].trail(&text[*from..*to], *filler);
                        }
                    }
                    rest = line_break;
                }
            }

            let leading = gap[rest..]
                .iter()
                .position(|(filler, ..)| filler.is_comment())
                .map(|offset| gap[rest + offset].1);
            let separator_start = gap.get(rest).map_or(end, |(_, from, _)| *from);
            let separator_end = leading.unwrap_or(end);
            separators.push(format!(",{}", &text[separator_start..separator_end]));
            if let Some(leading) = leading {
                decorations[at].leading = text[leading..end].to_string();
            }
        }

        let prefix = fillers(&text[cursor..first.span.start], cursor);
        let after_punctuation = prefix
            .iter()
            .rposition(|(filler, ..)| !filler.is_comment() && !matches!(filler, Filler::Space { .. }))
            .map_or(0, |position| position + 1);
        let start = match prefix[after_punctuation..].iter().find(|(filler, ..)| filler.is_comment()) {
            Some((_, from, _)) => {
                decorations[0].leading = text[*from..first.span.start].to_string();
                *from
            }
            None => first.span.start,
        };

        let mut end = last.span.end;
        for (filler, from, to) in fillers(&text[last.span.end..limit], last.span.end) {
            match filler {
                Filler::Space { newline: false } => {}
                Filler::LineComment | Filler::BlockComment => {
                    decorations[old.len() - 1].trail(&text[from..to], filler);
                    end = to;
                }
                _ => break,
            }
        }

        if decorations.iter().all(Decoration::is_empty) {
            return None;
        }

        let mut out = String::new();
        for (at, element) in new.iter().enumerate() {
            let decoration = old_index(*element)
                .map(|index| decorations[index].clone())
                .unwrap_or_default();
            out.push_str(&decoration.leading);
            out.push_str(&self.print_element(*element, element_indent));
            if at + 1 == new.len() {
                out.push_str(&decoration.trailing);
                let closes_line = text[end..].trim_start_matches([' ', '\t']).starts_with('\n');
                if decoration.ends_with_line_comment && !closes_line {
                    out.push('\n');
                    out.push_str(indent);
                }
                break;
            }
            let separator = separators
                .get(at)
                .or(separators.last())
                .map_or(", ", String::as_str);
            let after_comma = separator.strip_prefix(',').unwrap_or(separator);
            out.push(',');
            out.push_str(&decoration.trailing);
            if decoration.ends_with_line_comment && !after_comma.contains('\n') {
                out.push('\n');
                out.push_str(element_indent);
            } else {
                out.push_str(after_comma);
            }
        }
        Some(CommentedList { start, end, text: out })
    }

    /// A list element along with the comments attached to it.
    fn print_element(&self, id: NodeId, indent: &str) -> String {
        let node = self.tree.node(id);
        if node.comments_moved || (node.span.is_none() && node.has_comments()) {
            let mut out = String::new();
            for comment in &node.leading_comments {
                out.push_str(&self.comment_text(comment, indent));
                out.push('\n');
                out.push_str(indent);
            }
            out.push_str(&self.print(id, indent));
            for comment in &node.trailing_comments {
                if starts_own_line(self.tree, comment) {
                    out.push('\n');
                    out.push_str(indent);
                } else {
                    out.push(' ');
                }
                out.push_str(&self.comment_text(comment, indent));
            }
            return out;
        }

        match (node.span, node.extent) {
            (Some(span), Some(extent)) if span != extent => {
                if self.tree.is_pristine(id) {
                    return self.reuse(extent.start, extent.end, indent);
                }
                let base = self.source.line_indent(extent.start);
                format!(
                    "{}{}{}",
                    self.piece(extent.start, span.start, base, indent),
                    self.print(id, indent),
                    self.piece(span.end, extent.end, base, indent)
                )
            }
            _ => self.print(id, indent),
        }
    }

    fn comment_text(&self, comment: &Comment, indent: &str) -> String {
        match comment.span {
            Some(span) => reindent(&comment.text, self.source.line_indent(span.start), indent),
            None => comment.text.clone(),
        }
    }

    fn is_parenthesized(&self, span: &Span) -> bool {
        let text = self.source.text();
        let before = text[..span.start].trim_end().ends_with('(');
        let after = text[span.end..].trim_start().starts_with(')');
        before && after
    }

    // Parentheses

    fn needs_parens(&self, parent: NodeId, child: NodeId) -> bool {
        use NodeKind as K;
        let child_kind = self.tree.kind(child);
        let child_precedence = precedence(child_kind);
        match self.tree.kind(parent) {
            K::BinaryExpression { operator, left, .. } | K::LogicalExpression { operator, left, .. } => {
                let parent_precedence = 2 + binary_precedence(operator).unwrap_or(0);
                let mixes_nullish = matches!(child_kind, K::LogicalExpression { operator: inner, .. }
                    if (inner == "??") != (operator == "??"));
                if child_precedence != parent_precedence {
                    return child_precedence < parent_precedence || (mixes_nullish && is_logical(operator));
                }
                // Same level: `**` groups to the right, everything else to the left
                if child == *left {
                    operator == "**" || mixes_nullish
                } else {
                    operator != "**" || mixes_nullish
                }
            }
            K::UnaryExpression { .. } | K::AwaitExpression { .. } => child_precedence < 14,
            K::UpdateExpression { .. } => child_precedence < 15,
            K::MemberExpression { object, .. } if child == *object => {
                child_precedence < 16 || matches!(child_kind, K::NumericLiteral { .. })
            }
            K::CallExpression { callee, .. } if child == *callee => child_precedence < 16,
            K::NewExpression { callee, .. } if child == *callee => {
                child_precedence < 16 || matches!(child_kind, K::CallExpression { .. })
            }
            K::ConditionalExpression { test, .. } if child == *test => child_precedence <= 2,
            K::AssignmentExpression { left, .. } if child == *left => false,
            K::ArrowFunctionExpression { body, .. } if child == *body => {
                matches!(child_kind, K::ObjectExpression { .. } | K::SequenceExpression { .. })
            }
            K::ExpressionStatement { .. } => {
                matches!(child_kind, K::ObjectExpression { .. } | K::FunctionExpression { .. })
            }
            K::ConditionalExpression { .. }
            | K::AssignmentExpression { .. }
            | K::CallExpression { .. }
            | K::NewExpression { .. }
            | K::ArrayExpression { .. }
            | K::SpreadElement { .. }
            | K::ObjectProperty { .. }
            | K::VariableDeclarator { .. }
            | K::AssignmentPattern { .. }
            | K::ExportDefaultDeclaration { .. } => child_precedence < 1,
            _ => false,
        }
    }

    fn child(&self, parent: NodeId, child: NodeId, indent: &str) -> String {
        let text = self.print(child, indent);
        if self.needs_parens(parent, child) {
            format!("({text})")
        } else {
            text
        }
    }

    fn join(&self, parent: NodeId, ids: &[NodeId], separator: &str, indent: &str) -> String {
        ids.iter()
            .map(|id| self.child(parent, *id, indent))
            .collect::<Vec<_>>()
            .join(separator)
    }

    // Layout

    /// Statements of a block-like node, one per line at `inner` depth
    fn statements(&self, ids: &[NodeId], inner: &str) -> String {
        ids.iter()
            .map(|id| format!("{inner}{}", self.print_element(*id, inner)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn braced(&self, ids: &[NodeId], indent: &str) -> String {
        if ids.is_empty() {
            return "{}".to_string();
        }
        let inner = self.inner(indent);
        format!("{{\n{}\n{indent}}}", self.statements(ids, &inner))
    }

    /// Body of a loop or branch: blocks stay on the header line, single
    /// statements go on their own indented line.
    fn body(&self, id: NodeId, indent: &str) -> String {
        if self.tree.tag(id) == NodeTag::BlockStatement {
            format!(" {}", self.print(id, indent))
        } else {
            let inner = self.inner(indent);
            format!("\n{inner}{}", self.print(id, &inner))
        }
    }

    fn params(&self, parent: NodeId, params: &[NodeId], indent: &str) -> String {
        format!("({})", self.join(parent, params, ", ", indent))
    }

    fn is_in_for_head(&self, id: NodeId) -> bool {
        self.tree.parent(id).is_some_and(|parent| match self.tree.kind(parent) {
            NodeKind::ForStatement { init, .. } => *init == Some(id),
            NodeKind::ForOfStatement { left, .. } | NodeKind::ForInStatement { left, .. } => *left == id,
            _ => false,
        })
    }

    fn layout(&self, id: NodeId, indent: &str) -> String {
        use NodeKind as K;
        let inner = self.inner(indent);
        let p = |child: &NodeId| self.child(id, *child, indent);

        match self.tree.kind(id) {
            K::Program { body } => {
                let mut out = String::new();
                if let Some(hashbang) = self.tree.hashbang() {
                    out.push_str(hashbang);
                    out.push('\n');
                }
                out.push_str(&self.statements(body, ""));
                if !body.is_empty() && self.source.text().ends_with('\n') {
                    out.push('\n');
                }
                out
            }
            K::VariableDeclaration { kind, declarations } => {
                let semicolon = if self.is_in_for_head(id) { "" } else { ";" };
                format!("{} {}{semicolon}", kind.as_str(), self.join(id, declarations, ", ", indent))
            }
            K::VariableDeclarator { id: target, init } => match init {
                Some(init) => format!("{} = {}", p(target), p(init)),
                None => p(target),
            },
            K::FunctionDeclaration {
                id: name,
                params,
                body,
                is_async,
                generator,
            } => format!(
                "{}function{} {}{} {}",
                if *is_async { "async " } else { "" },
                if *generator { "*" } else { "" },
                p(name),
                self.params(id, params, indent),
                self.print(*body, indent)
            ),
            K::ClassDeclaration {
                id: name,
                super_class,
                body,
            } => {
                let heritage = super_class
                    .map(|parent| format!(" extends {}", p(&parent)))
                    .unwrap_or_default();
                format!("class {}{heritage} {}", p(name), self.braced(body, indent))
            }
            K::Method {
                kind,
                key,
                computed,
                is_static,
                is_async,
                params,
                body,
            } => {
                let mut out = String::new();
                if *is_static {
                    out.push_str("static ");
                }
                if *is_async {
                    out.push_str("async ");
                }
                match kind {
                    MethodKind::Get => out.push_str("get "),
                    MethodKind::Set => out.push_str("set "),
                    MethodKind::Constructor | MethodKind::Method => {}
                }
                if *computed {
                    out.push_str(&format!("[{}]", p(key)));
                } else {
                    out.push_str(&p(key));
                }
                out.push_str(&self.params(id, params, indent));
                out.push(' ');
                out.push_str(&self.print(*body, indent));
                out
            }
            K::ReturnStatement { argument } => match argument {
                Some(argument) => format!("return {};", p(argument)),
                None => "return;".to_string(),
            },
            K::IfStatement {
                test,
                consequent,
                alternate,
            } => {
                let mut out = format!("if ({}){}", p(test), self.body(*consequent, indent));
                if let Some(alternate) = alternate {
                    if self.tree.tag(*consequent) == NodeTag::BlockStatement {
                        out.push_str(" else");
                    } else {
                        out.push_str(&format!("\n{indent}else"));
                    }
                    if self.tree.tag(*alternate) == NodeTag::IfStatement {
                        out.push_str(&format!(" {}", self.print(*alternate, indent)));
                    } else {
                        out.push_str(&self.body(*alternate, indent));
                    }
                }
                out
            }
            K::ForStatement {
                init,
                test,
                update,
                body,
            } => {
                let part = |slot: &Option<NodeId>| slot.as_ref().map(p).unwrap_or_default();
                format!(
                    "for ({}; {}; {}){}",
                    part(init),
                    part(test),
                    part(update),
                    self.body(*body, indent)
                )
            }
            K::ForOfStatement { left, right, body } => {
                format!("for ({} of {}){}", p(left), p(right), self.body(*body, indent))
            }
            K::ForInStatement { left, right, body } => {
                format!("for ({} in {}){}", p(left), p(right), self.body(*body, indent))
            }
            K::WhileStatement { test, body } => format!("while ({}){}", p(test), self.body(*body, indent)),
            K::DoWhileStatement { body, test } => {
                format!("do{} while ({});", self.body(*body, indent), p(test))
            }
            K::BlockStatement { body } => self.braced(body, indent),
            K::ExpressionStatement { expression } => format!("{};", p(expression)),
            K::ThrowStatement { argument } => format!("throw {};", p(argument)),
            K::BreakStatement { label } => match label {
                Some(label) => format!("break {};", p(label)),
                None => "break;".to_string(),
            },
            K::ContinueStatement { label } => match label {
                Some(label) => format!("continue {};", p(label)),
                None => "continue;".to_string(),
            },
            K::EmptyStatement => ";".to_string(),
            K::TryStatement {
                block,
                param,
                handler,
                finalizer,
            } => {
                let mut out = format!("try {}", self.print(*block, indent));
                if let Some(handler) = handler {
                    match param {
                        Some(param) => out.push_str(&format!(" catch ({}) ", p(param))),
                        None => out.push_str(" catch "),
                    }
                    out.push_str(&self.print(*handler, indent));
                }
                if let Some(finalizer) = finalizer {
                    out.push_str(&format!(" finally {}", self.print(*finalizer, indent)));
                }
                out
            }
            K::SwitchStatement { discriminant, cases } => {
                let cases = cases
                    .iter()
                    .map(|case| format!("{inner}{}", self.print(*case, &inner)))
                    .collect::<Vec<_>>();
                if cases.is_empty() {
                    format!("switch ({}) {{}}", p(discriminant))
                } else {
                    format!("switch ({}) {{\n{}\n{indent}}}", p(discriminant), cases.join("\n"))
                }
            }
            K::SwitchCase { test, consequent } => {
                let label = match test {
                    Some(test) => format!("case {}:", p(test)),
                    None => "default:".to_string(),
                };
                if consequent.is_empty() {
                    label
                } else {
                    format!("{label}\n{}", self.statements(consequent, &inner))
                }
            }
            K::ModuleDeclaration { raw } => raw.clone(),
            K::ExportNamedDeclaration { declaration } => format!("export {}", p(declaration)),
            K::ExportDefaultDeclaration { declaration } => {
                let text = p(declaration);
                if self.tree.kind(*declaration).is_statement() || self.tree.tag(*declaration) == NodeTag::FunctionExpression {
                    format!("export default {text}")
                } else {
                    format!("export default {text};")
                }
            }

            K::ObjectPattern { properties } => {
                if properties.is_empty() {
                    "{}".to_string()
                } else {
                    format!("{{ {} }}", self.join(id, properties, ", ", indent))
                }
            }
            K::ArrayPattern { elements } => format!("[{}]", self.join(id, elements, ", ", indent)),
            K::AssignmentPattern { left, right } => format!("{} = {}", p(left), p(right)),
            K::RestElement { argument } => format!("...{}", p(argument)),

            K::Identifier { name } => name.clone(),
            K::ThisExpression => "this".to_string(),
            K::NumericLiteral { raw }
            | K::StringLiteral { raw }
            | K::TemplateLiteral { raw }
            | K::RegExpLiteral { raw } => raw.clone(),
            K::BooleanLiteral { value } => value.to_string(),
            K::NullLiteral => "null".to_string(),
            K::ArrayExpression { elements } => format!("[{}]", self.join(id, elements, ", ", indent)),
            K::ObjectExpression { properties } => {
                if properties.is_empty() {
                    return "{}".to_string();
                }
                let properties = properties
                    .iter()
                    .map(|property| format!("{inner}{}", self.child(id, *property, &inner)))
                    .collect::<Vec<_>>();
                format!("{{\n{}\n{indent}}}", properties.join(",\n"))
            }
            K::ObjectProperty {
                key,
                value,
                computed,
                shorthand,
            } => {
                if *shorthand {
                    p(value)
                } else if *computed {
                    format!("[{}]: {}", p(key), p(value))
                } else {
                    format!("{}: {}", p(key), p(value))
                }
            }
            K::SpreadElement { argument } => format!("...{}", p(argument)),
            K::MemberExpression {
                object,
                property,
                computed,
                optional,
            } => {
                let access = match (*computed, *optional) {
                    (true, true) => format!("?.[{}]", p(property)),
                    (true, false) => format!("[{}]", p(property)),
                    (false, true) => format!("?.{}", p(property)),
                    (false, false) => format!(".{}", p(property)),
                };
                format!("{}{access}", p(object))
            }
            K::CallExpression {
                callee,
                arguments,
                optional,
            } => format!(
                "{}{}({})",
                p(callee),
                if *optional { "?." } else { "" },
                self.join(id, arguments, ", ", indent)
            ),
            K::NewExpression { callee, arguments } => {
                format!("new {}({})", p(callee), self.join(id, arguments, ", ", indent))
            }
            K::UnaryExpression { operator, argument } => {
                let argument = p(argument);
                let spaced = operator.chars().all(char::is_alphabetic)
                    || (matches!(operator.as_str(), "-" | "+") && argument.starts_with(operator.as_str()));
                if spaced {
                    format!("{operator} {argument}")
                } else {
                    format!("{operator}{argument}")
                }
            }
            K::UpdateExpression {
                operator,
                prefix,
                argument,
            } => {
                if *prefix {
                    format!("{operator}{}", p(argument))
                } else {
                    format!("{}{operator}", p(argument))
                }
            }
            K::BinaryExpression { operator, left, right }
            | K::LogicalExpression { operator, left, right }
            | K::AssignmentExpression { operator, left, right } => {
                format!("{} {operator} {}", p(left), p(right))
            }
            K::ConditionalExpression {
                test,
                consequent,
                alternate,
            } => format!("{} ? {} : {}", p(test), p(consequent), p(alternate)),
            K::SequenceExpression { expressions } => self.join(id, expressions, ", ", indent),
            K::ArrowFunctionExpression { params, body, is_async } => format!(
                "{}{} => {}",
                if *is_async { "async " } else { "" },
                self.params(id, params, indent),
                p(body)
            ),
            K::FunctionExpression {
                id: name,
                params,
                body,
                is_async,
                generator,
            } => format!(
                "{}function{}{}{} {}",
                if *is_async { "async " } else { "" },
                if *generator { "*" } else { "" },
                name.map(|name| format!(" {}", p(&name))).unwrap_or_default(),
                self.params(id, params, indent),
                self.print(*body, indent)
            ),
            K::AwaitExpression { argument } => format!("await {}", p(argument)),
        }
    }
}

/// Printed list slot replacing the original text `start..end`
struct CommentedList {
    start: usize,
    end: usize,
    text: String,
}

/// Comments a list element carries when it moves
#[derive(Debug, Clone, Default)]
struct Decoration {
    leading: String,
    trailing: String,
    ends_with_line_comment: bool,
}

impl Decoration {
    fn trail(&mut self, comment: &str, filler: Filler) {
        self.trailing.push(' ');
        self.trailing.push_str(comment);
        self.ends_with_line_comment = filler == Filler::LineComment;
    }

    fn is_empty(&self) -> bool {
        self.leading.is_empty() && self.trailing.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Filler {
    Space { newline: bool },
    LineComment,
    BlockComment,
    Comma,
    Other,
}

impl Filler {
    fn is_comment(&self) -> bool {
        matches!(self, Filler::LineComment | Filler::BlockComment)
    }
}

/// Split the text around list elements into whitespace, comments and
/// punctuation, with absolute offsets.
fn fillers(text: &str, offset: usize) -> Vec<(Filler, usize, usize)> {
    let mut out = Vec::new();
    let mut at = 0;
    while let Some(ch) = text[at..].chars().next() {
        let rest = &text[at..];
        let (filler, len) = if rest.starts_with("//") {
            (Filler::LineComment, rest.find('\n').unwrap_or(rest.len()))
        } else if rest.starts_with("/*") {
            (Filler::BlockComment, rest.find("*/").map_or(rest.len(), |close| close + 2))
        } else if ch == ',' {
            (Filler::Comma, 1)
        } else if ch.is_whitespace() {
            let len = rest.find(|c: char| !c.is_whitespace()).unwrap_or(rest.len());
            (
                Filler::Space {
                    newline: rest[..len].contains('\n'),
                },
                len,
            )
        } else {
            (Filler::Other, ch.len_utf8())
        };
        out.push((filler, offset + at, offset + at + len));
        at += len;
    }
    out
}

fn is_logical(operator: &str) -> bool {
    matches!(operator, "&&" | "||" | "??")
}

/// Binding strength of an expression, used to decide on parentheses
fn precedence(kind: &NodeKind) -> u8 {
    use NodeKind as K;
    match kind {
        K::SequenceExpression { .. } => 0,
        K::AssignmentExpression { .. } | K::ArrowFunctionExpression { .. } => 1,
        K::ConditionalExpression { .. } => 2,
        K::BinaryExpression { operator, .. } | K::LogicalExpression { operator, .. } => {
            2 + binary_precedence(operator).unwrap_or(0)
        }
        K::UnaryExpression { .. } | K::AwaitExpression { .. } => 14,
        K::UpdateExpression { prefix: true, .. } => 14,
        K::UpdateExpression { prefix: false, .. } => 15,
        K::CallExpression { .. } | K::NewExpression { .. } | K::MemberExpression { .. } => 16,
        _ => 17,
    }
}

/// Move lines after the first from indentation `from` to `to`.
pub fn reindent(text: &str, from: &str, to: &str) -> String {
    if from == to || !text.contains('\n') {
        return text.to_string();
    }
    let mut lines = text.split('\n');
    let mut out = lines.next().unwrap_or_default().to_string();
    for line in lines {
        out.push('\n');
        match line.strip_prefix(from) {
            Some(rest) if !line.trim().is_empty() => {
                out.push_str(to);
                out.push_str(rest);
            }
            _ => out.push_str(line),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{DeclarationKind, parse};

    fn round_trip(code: &str) {
        let tree = parse(code).unwrap();
        assert_eq!(print(&tree), code);
    }

    #[test]
    fn test_untouched_tree_prints_original_text() {
        round_trip("#!/usr/bin/env node\n// header\nconst a = 1 ;\n\n\nfunction f( x ){\n    return (x  +1)\n}\n");
        round_trip("if(a){b()}else{   c() }");
    }

    #[test]
    fn test_renaming_patches_only_the_identifier() {
        let mut tree = parse("const total = price  *  (count + 1); // keep\n").unwrap();
        let ids: Vec<_> = tree
            .preorder(tree.root())
            .into_iter()
            .filter(|id| tree.name_of(*id) == Some("count"))
            .collect();
        tree.rename_identifier(ids[0], "quantity");
        assert_eq!(print(&tree), "const total = price  *  (quantity + 1); // keep\n");
    }

    #[test]
    fn test_new_nodes_get_parentheses_from_precedence() {
        let mut tree = parse("x = a * b;\n").unwrap();
        let a = tree
            .preorder(tree.root())
            .into_iter()
            .find(|id| tree.name_of(*id) == Some("a"))
            .unwrap();
        let left = tree.alloc(NodeKind::Identifier { name: "c".into() });
        let right = tree.alloc(NodeKind::Identifier { name: "d".into() });
        let sum = tree.alloc(NodeKind::BinaryExpression {
            operator: "+".into(),
            left,
            right,
        });
        tree.replace(a, sum).unwrap();
        assert_eq!(print(&tree), "x = (c + d) * b;\n");
    }

    #[test]
    fn test_inserted_statement_uses_document_indentation() {
        let mut tree = parse("function f() {\n\tone();\n}\n").unwrap();
        let function = tree.children(tree.root())[0];
        let body = *tree.children(function).last().unwrap();
        let first = tree.children(body)[0];
        let name = tree.alloc(NodeKind::Identifier { name: "b".into() });
        let declarator = tree.alloc(NodeKind::VariableDeclarator { id: name, init: None });
        let declaration = tree.alloc(NodeKind::VariableDeclaration {
            kind: DeclarationKind::Let,
            declarations: vec![declarator],
        });
        tree.insert_after(first, declaration).unwrap();
        assert_eq!(print(&tree), "function f() {\n\tone();\n\tlet b;\n}\n");
    }

    #[test]
    fn test_moved_block_is_reindented() {
        let mut tree = parse("if (a) {\n  if (b) {\n    c();\n  }\n}\n").unwrap();
        let outer = tree.children(tree.root())[0];
        let block = tree.children(outer)[1];
        let inner = tree.children(block)[0];
        tree.replace(outer, inner).unwrap();
        assert_eq!(print(&tree), "if (b) {\n  c();\n}\n");
    }

    #[test]
    fn test_moved_block_keeps_template_lines() {
        let mut tree = parse("if (a) {\n  if (b) {\n    c(`one\n    two`);\n  }\n}\n").unwrap();
        let outer = tree.children(tree.root())[0];
        let block = tree.children(outer)[1];
        let inner = tree.children(block)[0];
        tree.replace(outer, inner).unwrap();
        assert_eq!(print(&tree), "if (b) {\n  c(`one\n    two`);\n}\n");
    }

    #[test]
    fn test_reindent() {
        assert_eq!(reindent("{\n    a;\n  }", "  ", ""), "{\n  a;\n}");
        assert_eq!(reindent("{\n\n  a;\n}", "", "\t"), "{\n\n\t  a;\n\t}");
    }
}
