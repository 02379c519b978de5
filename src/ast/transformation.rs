//! # Transformation
//!
//! One parse → mutate → print round. This is the only entry point recipes
//! use to change code: it owns the tree for the duration of the call and
//! applies the document-level fixups after printing.

use super::parser::parse;
use super::printer::print;
use super::source::standardize_eol;
use super::tree::Tree;
use crate::errors::RefactorError;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    pub code: String,
    pub has_code_changed: bool,
}

/// Parse `code`, let `f` mutate the tree, print the result.
///
/// When nothing changed the original text is returned byte for byte.
pub fn transform<T>(
    code: &str,
    f: impl FnOnce(&mut Tree) -> Result<T, RefactorError>,
) -> Result<(Transformed, T), RefactorError> {
    let mut tree = parse(code)?;
    let value = f(&mut tree)?;

    let printed = print(&tree);
    let has_code_changed = standardize_eol(&printed) != standardize_eol(code);
    if !has_code_changed {
        let unchanged = Transformed {
            code: code.to_string(),
            has_code_changed,
        };
        return Ok((unchanged, value));
    }

    let printed = fix_hashbang(&printed, tree.hashbang());
    debug!("Transformation changed {} bytes into {}", code.len(), printed.len());
    let transformed = Transformed {
        code: tree.source().restore_eol(&printed),
        has_code_changed,
    };
    Ok((transformed, value))
}

/// Exactly one blank line separates a hashbang from the code.
fn fix_hashbang(code: &str, hashbang: Option<&str>) -> String {
    let Some(hashbang) = hashbang else {
        return code.to_string();
    };
    let Some(rest) = code.strip_prefix(hashbang) else {
        return code.to_string();
    };
    format!("{hashbang}\n\n{}", rest.trim_start_matches('\n'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;

    #[test]
    fn test_no_change_returns_original_bytes() {
        let code = "a();\r\nb();\r\n";
        let (transformed, ()) = transform(code, |_| Ok(())).unwrap();
        assert_eq!(transformed.code, code);
        assert!(!transformed.has_code_changed);
    }

    #[test]
    fn test_crlf_is_restored_after_change() {
        let (transformed, ()) = transform("a;\r\nb;\r\n", |tree| {
            let first = tree.children(tree.root())[0];
            let expression = tree.children(first)[0];
            tree.rename_identifier(expression, "c");
            Ok(())
        })
        .unwrap();
        assert_eq!(transformed.code, "c;\r\nb;\r\n");
    }

    #[test]
    fn test_hashbang_gets_one_blank_line_when_changed() {
        let code = "#!/usr/bin/env node\nrun();\n";
        let (transformed, ()) = transform(code, |tree| {
            let first = tree.children(tree.root())[0];
            let call = tree.children(first)[0];
            let callee = tree.children(call)[0];
            tree.rename_identifier(callee, "start");
            Ok(())
        })
        .unwrap();
        assert_eq!(transformed.code, "#!/usr/bin/env node\n\nstart();\n");
    }

    #[test]
    fn test_parse_error_is_reported() {
        let error = transform("const = ;", |_| Ok(())).err().unwrap();
        assert!(matches!(error, RefactorError::Parse(_)));
    }

    #[test]
    fn test_value_is_passed_through() {
        let (_, count) = transform("a; b; c;", |tree| {
            Ok(tree
                .preorder(tree.root())
                .into_iter()
                .filter(|id| matches!(tree.kind(*id), NodeKind::Identifier { .. }))
                .count())
        })
        .unwrap();
        assert_eq!(count, 3);
    }
}
