//! # Source Text
//!
//! Immutable document text plus the layout facts the printer needs to give
//! new code the same look as the rest of the document: the newline family
//! and the indentation unit.

use super::position::{Position, Span};

/// Line terminator family of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Newline {
    Lf,
    CrLf,
}

impl Newline {
    pub fn as_str(&self) -> &'static str {
        match self {
            Newline::Lf => "\n",
            Newline::CrLf => "\r\n",
        }
    }
}

/// Indentation unit of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentStyle {
    Tabs,
    Spaces(usize),
}

impl Default for IndentStyle {
    fn default() -> Self {
        IndentStyle::Spaces(2)
    }
}

impl IndentStyle {
    /// Sample the leading whitespace of the first indented line.
    pub fn detect(text: &str) -> Self {
        for line in text.lines() {
            let trimmed = line.trim_start_matches([' ', '\t']);
            // Blank lines and block comment continuations say nothing useful
            if trimmed.is_empty() || trimmed.starts_with('*') {
                continue;
            }
            let leading = &line[..line.len() - trimmed.len()];
            match leading.chars().next() {
                Some('\t') => return IndentStyle::Tabs,
                Some(' ') => return IndentStyle::Spaces(leading.len()),
                _ => continue,
            }
        }
        IndentStyle::default()
    }

    /// One level of indentation, as new code should be written in this
    /// document.
    pub fn unit(&self) -> String {
        match self {
            IndentStyle::Tabs => "\t".to_string(),
            IndentStyle::Spaces(width) => " ".repeat(*width),
        }
    }
}

/// Document text, normalized to `\n` line endings
#[derive(Debug, Clone)]
pub struct SourceText {
    text: String,
    newline: Newline,
    indent: IndentStyle,
    line_starts: Vec<usize>,
    /// Byte ranges of template literals, sorted by start
    templates: Vec<(usize, usize)>,
}

impl SourceText {
    pub fn new(raw: &str) -> Self {
        let newline = if raw.contains("\r\n") {
            Newline::CrLf
        } else {
            Newline::Lf
        };
        let text = standardize_eol(raw);
        let indent = IndentStyle::detect(&text);
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));

        Self {
            text,
            newline,
            indent,
            line_starts,
            templates: Vec::new(),
        }
    }

    pub(crate) fn set_templates(&mut self, templates: Vec<(usize, usize)>) {
        self.templates = templates;
    }

    /// `offset` lies inside a template literal, where line breaks and
    /// indentation are part of the string value.
    pub fn in_template(&self, offset: usize) -> bool {
        let after = self.templates.partition_point(|(start, _)| *start < offset);
        after > 0 && offset < self.templates[after - 1].1
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn newline(&self) -> Newline {
        self.newline
    }

    pub fn indent(&self) -> IndentStyle {
        self.indent
    }

    pub fn slice(&self, span: &Span) -> &str {
        &self.text[span.start..span.end]
    }

    pub fn slice_range(&self, start: usize, end: usize) -> &str {
        &self.text[start..end]
    }

    pub fn position_at(&self, offset: usize) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let line_start = self.line_starts[line];
        let character = self.text[line_start..offset].chars().count();
        Position::new(line, character)
    }

    /// Byte offset of a position, clamped to the document
    pub fn offset_at(&self, position: Position) -> usize {
        let Some(&line_start) = self.line_starts.get(position.line) else {
            return self.text.len();
        };
        let line_end = self
            .line_starts
            .get(position.line + 1)
            .map(|next| next - 1)
            .unwrap_or(self.text.len());
        self.text[line_start..line_end]
            .char_indices()
            .nth(position.character)
            .map(|(i, _)| line_start + i)
            .unwrap_or(line_end)
    }

    /// Leading whitespace of the line containing `offset`
    pub fn line_indent(&self, offset: usize) -> &str {
        let line = self.position_at(offset).line;
        let start = self.line_starts[line];
        let rest = &self.text[start..];
        let width = rest.len() - rest.trim_start_matches([' ', '\t']).len();
        &rest[..width]
    }

    /// Convert printer output back to the document's newline family.
    pub fn restore_eol(&self, code: &str) -> String {
        match self.newline {
            Newline::Lf => code.to_string(),
            Newline::CrLf => code.replace('\n', "\r\n"),
        }
    }
}

pub fn standardize_eol(code: &str) -> String {
    code.replace('\r', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_template() {
        let mut source = SourceText::new("a(`x\n  y`);\n");
        source.set_templates(vec![(2, 9)]);
        assert!(!source.in_template(2));
        assert!(source.in_template(5));
        assert!(!source.in_template(9));
        assert!(!source.in_template(11));
    }

    #[test]
    fn test_detect_tabs() {
        let source = SourceText::new("function f() {\n\treturn 1;\n}\n");
        assert_eq!(source.indent(), IndentStyle::Tabs);
    }

    #[test]
    fn test_detect_space_width_from_first_indented_line() {
        let source = SourceText::new("/**\n * doc\n */\nif (a) {\n    b();\n  c();\n}\n");
        assert_eq!(source.indent(), IndentStyle::Spaces(4));
    }

    #[test]
    fn test_defaults_to_two_spaces() {
        assert_eq!(SourceText::new("a();\nb();").indent(), IndentStyle::Spaces(2));
    }

    #[test]
    fn test_crlf_is_normalized_and_restored() {
        let source = SourceText::new("a();\r\nb();\r\n");
        assert_eq!(source.text(), "a();\nb();\n");
        assert_eq!(source.newline(), Newline::CrLf);
        assert_eq!(source.restore_eol(source.text()), "a();\r\nb();\r\n");
    }

    #[test]
    fn test_positions_and_offsets() {
        let source = SourceText::new("ab\n  cé d\n");
        let offset = source.text().find('d').unwrap();
        assert_eq!(source.position_at(offset), Position::new(1, 5));
        assert_eq!(source.offset_at(Position::new(1, 5)), offset);
        assert_eq!(source.line_indent(offset), "  ");
    }

    #[test]
    fn test_indent_units() {
        assert_eq!(IndentStyle::Tabs.unit(), "\t");
        assert_eq!(IndentStyle::Spaces(4).unit(), "    ");
    }
}
