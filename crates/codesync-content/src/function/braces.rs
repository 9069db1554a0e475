//! Brace-counting heuristic for curly-brace languages
//!
//! The declaration is found textually, then the body is scanned forward
//! until the brace depth returns to zero. Braces inside literals, comments
//! and the parameter list do not count, nor do the braces of a Go
//! `interface{...}` or `struct{...}` result type.

use regex::Regex;

use super::{BraceSyntax, FunctionSpan};
use crate::{Error, Language, Result};

impl BraceSyntax {
    fn language(&self) -> Language {
        match self {
            Self::Go => Language::Go,
            Self::JavaScript => Language::JavaScript,
        }
    }

    /// Declaration patterns in priority order. Each exposes a `decl` group
    /// starting where the function text starts.
    fn declaration_patterns(&self, name: &str) -> Vec<String> {
        let name = regex::escape(name);
        match self {
            Self::Go => vec![format!(
                r"(?m)^[ \t]*(?P<decl>func[ \t]+(?:\([^)]*\)[ \t]*)?{name}[ \t]*[\[(])"
            )],
            Self::JavaScript => vec![
                format!(
                    r"(?m)(?:^|[^\w$])(?P<decl>(?:async[ \t]+)?function(?:\s*\*\s*|\s+){name}\s*\()"
                ),
                format!(r"(?m)(?:^|[^\w$.])(?P<decl>(?:(?:const|let|var)\s+)?{name}\s*=[^=>])"),
            ],
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Lex {
    Code,
    LineComment,
    BlockComment,
    /// Quoted literal with backslash escapes; `multiline` for JS templates
    Quoted { quote: u8, multiline: bool },
    /// Go raw string, no escapes
    Raw,
}

pub(super) fn locate(syntax: BraceSyntax, source: &str, name: &str) -> Result<FunctionSpan> {
    let language = syntax.language();
    let start = find_declaration(syntax, source, name)?
        .ok_or_else(|| Error::not_found(language, name))?;
    let end = scan_body(syntax, source, start)?;

    let span = FunctionSpan::new(start, end);
    Ok(match syntax {
        BraceSyntax::Go => span.with_leading_comments(source),
        BraceSyntax::JavaScript => span,
    })
}

fn find_declaration(syntax: BraceSyntax, source: &str, name: &str) -> Result<Option<usize>> {
    for pattern in syntax.declaration_patterns(name) {
        let regex =
            Regex::new(&pattern).map_err(|e| Error::parse(syntax.language(), e.to_string()))?;
        if let Some(decl) = regex.captures(source).and_then(|c| c.name("decl")) {
            return Ok(Some(decl.start()));
        }
    }
    Ok(None)
}

/// Byte offset just past the closing brace of the body starting after
/// `start`.
fn scan_body(syntax: BraceSyntax, source: &str, start: usize) -> Result<usize> {
    let language = syntax.language();
    let no_body = || Error::parse(language, format!("declaration at byte {start} has no body"));

    // Every delimiter is ASCII, so scanning bytes never splits a character
    let bytes = source.as_bytes();
    let mut state = Lex::Code;
    let mut escaped = false;
    let mut depth = 0usize;
    let mut parens = 0isize;
    // Depth inside a result type literal before the body opens
    let mut type_depth = 0usize;
    let mut opened = false;
    let mut i = start;

    while i < bytes.len() {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();
        match state {
            Lex::Code => match b {
                b'/' if next == Some(b'/') => {
                    state = Lex::LineComment;
                    i += 1;
                }
                b'/' if next == Some(b'*') => {
                    state = Lex::BlockComment;
                    i += 1;
                }
                b'"' | b'\'' => {
                    state = Lex::Quoted {
                        quote: b,
                        multiline: false,
                    }
                }
                b'`' => {
                    state = match syntax {
                        BraceSyntax::Go => Lex::Raw,
                        BraceSyntax::JavaScript => Lex::Quoted {
                            quote: b,
                            multiline: true,
                        },
                    }
                }
                b'(' | b'[' if !opened => parens += 1,
                b')' | b']' if !opened => parens -= 1,
                b'{' if !opened
                    && parens <= 0
                    && (type_depth > 0 || opens_type_literal(syntax, &bytes[start..i])) =>
                {
                    type_depth += 1;
                }
                b'}' if !opened && type_depth > 0 => type_depth -= 1,
                b'{' if opened || parens <= 0 => {
                    depth += 1;
                    opened = true;
                }
                b'}' if opened => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(i + 1);
                    }
                }
                b';' if !opened && parens <= 0 && type_depth == 0 => return Err(no_body()),
                // Go requires the body to open on the signature's last line
                b'\n' if !opened && parens <= 0 && type_depth == 0 && syntax == BraceSyntax::Go => {
                    return Err(no_body());
                }
                _ => {}
            },
            Lex::LineComment => {
                if b == b'\n' {
                    state = Lex::Code;
                    continue;
                }
            }
            Lex::BlockComment => {
                if b == b'*' && next == Some(b'/') {
                    state = Lex::Code;
                    i += 1;
                }
            }
            Lex::Quoted { quote, multiline } => {
                if escaped {
                    escaped = false;
                } else if b == b'\\' {
                    escaped = true;
                } else if b == quote || (b == b'\n' && !multiline) {
                    state = Lex::Code;
                }
            }
            Lex::Raw => {
                if b == b'`' {
                    state = Lex::Code;
                }
            }
        }
        i += 1;
    }

    if opened {
        Err(Error::parse(language, "unbalanced braces in function body"))
    } else {
        Err(no_body())
    }
}

/// Whether the code before a `{` ends with Go's `interface` or `struct`
/// keyword, making the brace part of a type literal.
fn opens_type_literal(syntax: BraceSyntax, before: &[u8]) -> bool {
    if syntax != BraceSyntax::Go {
        return false;
    }
    let before = before.trim_ascii_end();
    [b"interface".as_slice(), b"struct".as_slice()]
        .iter()
        .any(|keyword| {
            before.ends_with(keyword)
                && !before[..before.len() - keyword.len()]
                    .last()
                    .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn braces_in_strings_and_comments_are_ignored() {
        let src = "func F() string {\n\t// }\n\ts := \"}{\"\n\tr := '}'\n\treturn `}` + s + string(r)\n}\nfunc G() {}\n";
        let span = locate(BraceSyntax::Go, src, "F").unwrap();
        assert!(span.text(src).ends_with("string(r)\n}"));
    }

    #[test]
    fn parameter_braces_do_not_open_the_body() {
        let src = "function f(opts = {}) {\n  return opts;\n}\n";
        let span = locate(BraceSyntax::JavaScript, src, "f").unwrap();
        assert_eq!(span.text(src), "function f(opts = {}) {\n  return opts;\n}");
    }

    #[test]
    fn arrow_assignment_fallback() {
        let src = "const add = (a, b) => {\n  return a + b;\n};\n";
        let span = locate(BraceSyntax::JavaScript, src, "add").unwrap();
        assert_eq!(span.text(src), "const add = (a, b) => {\n  return a + b;\n}");
    }

    #[test]
    fn go_result_type_literals_do_not_open_the_body() {
        let src = "func Any() interface{} {\n\treturn nil\n}\n\nfunc Next() {}\n";
        let span = locate(BraceSyntax::Go, src, "Any").unwrap();
        assert_eq!(span.text(src), "func Any() interface{} {\n\treturn nil\n}");

        let src = "func Pair() struct{ a int; b string } {\n\treturn struct{ a int; b string }{}\n}\n";
        let span = locate(BraceSyntax::Go, src, "Pair").unwrap();
        assert!(span.text(src).ends_with("{}\n}"));
    }

    #[test]
    fn declaration_without_body_is_parse_error() {
        let src = "func Asm(x int) int\n\nfunc Other() {}\n";
        let err = locate(BraceSyntax::Go, src, "Asm").unwrap_err();
        assert!(matches!(err, Error::ParseError { .. }));
    }
}
