//! Indentation heuristic for Python-style block structure
//!
//! A function starts at `def <name>(` (or `async def`) and runs until the
//! first later line indented no deeper than the declaration, ignoring blank
//! lines, shallow `#` comments and anything inside a docstring.

use regex::Regex;

use super::FunctionSpan;
use crate::{Error, Language, Result};

struct Line<'a> {
    start: usize,
    end: usize,
    text: &'a str,
}

fn lines(source: &str) -> Vec<Line<'_>> {
    let mut offset = 0;
    source
        .split_inclusive('\n')
        .map(|raw| {
            let line = Line {
                start: offset,
                end: offset + raw.len(),
                text: raw.trim_end_matches(['\n', '\r']),
            };
            offset += raw.len();
            line
        })
        .collect()
}

fn indentation(text: &str) -> usize {
    text.len() - text.trim_start_matches([' ', '\t']).len()
}

fn docstring_delimiters(text: &str) -> usize {
    text.matches("\"\"\"").count() + text.matches("'''").count()
}

/// Net parenthesis balance of a line, used to follow multi-line signatures.
fn paren_balance(text: &str) -> isize {
    text.chars().fold(0, |acc, c| match c {
        '(' | '[' => acc + 1,
        ')' | ']' => acc - 1,
        _ => acc,
    })
}

pub(super) fn locate(source: &str, name: &str) -> Result<FunctionSpan> {
    let pattern = format!(r"^[ \t]*(?:async[ \t]+)?def[ \t]+{}[ \t]*\(", regex::escape(name));
    let declaration =
        Regex::new(&pattern).map_err(|e| Error::parse(Language::Python, e.to_string()))?;

    let lines = lines(source);
    let Some(decl_idx) = lines.iter().position(|l| declaration.is_match(l.text)) else {
        return Err(Error::not_found(Language::Python, name));
    };
    let decl = &lines[decl_idx];
    let decl_indent = indentation(decl.text);

    // The header may span lines until its parentheses close
    let mut header_end = decl_idx;
    let mut balance = paren_balance(decl.text);
    while balance > 0 && header_end + 1 < lines.len() {
        header_end += 1;
        balance += paren_balance(lines[header_end].text);
    }

    let mut end = lines[header_end].end;
    let mut in_docstring = false;

    for line in &lines[header_end + 1..] {
        let trimmed = line.text.trim();
        if !in_docstring {
            if trimmed.is_empty() {
                continue;
            }
            let indent = indentation(line.text);
            if indent <= decl_indent {
                if trimmed.starts_with('#') {
                    continue;
                }
                break;
            }
        }
        if docstring_delimiters(line.text) % 2 == 1 {
            in_docstring = !in_docstring;
        }
        end = line.end;
    }

    Ok(FunctionSpan::new(decl.start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stops_at_dedent_across_blank_lines() {
        let src = "def a():\n    x = 1\n\n    if x:\n        y = 2\n\n\ndef b():\n    pass\n";
        let span = locate(src, "a").unwrap();
        assert_eq!(span.text(src), "def a():\n    x = 1\n\n    if x:\n        y = 2\n");
    }

    #[test]
    fn docstring_lines_at_column_zero_stay_inside() {
        let src = "def a():\n    \"\"\"Doc\nwrapped at col 0\n    \"\"\"\n    return 1\nz = 0\n";
        let span = locate(src, "a").unwrap();
        assert!(span.text(src).ends_with("    return 1\n"));
    }

    #[test]
    fn multi_line_signature() {
        let src = "def a(\n    x,\n    y,\n):\n    return x + y\nq = 1\n";
        let span = locate(src, "a").unwrap();
        assert_eq!(span.text(src), "def a(\n    x,\n    y,\n):\n    return x + y\n");
    }

    #[test]
    fn prefix_name_does_not_match() {
        let err = locate("def abc():\n    pass\n", "ab").unwrap_err();
        assert!(matches!(err, Error::FunctionNotFound { .. }));
    }
}
