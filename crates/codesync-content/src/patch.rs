//! Unified patch parsing and application
//!
//! Application is strict: every context and removed line of a hunk must
//! match the target exactly. A hunk may float away from its declared
//! position when earlier edits shifted the file, but it is never fuzzed.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use codesync_fs::NormalizedPath;

use crate::{Error, Result};

static HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").expect("valid hunk header regex")
});

/// One line of a hunk body, line ending included when present
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchLine {
    Context(String),
    Remove(String),
    Add(String),
}

impl PatchLine {
    fn text_mut(&mut self) -> &mut String {
        match self {
            Self::Context(s) | Self::Remove(s) | Self::Add(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchHunk {
    pub old_start: usize,
    pub old_len: usize,
    pub new_start: usize,
    pub new_len: usize,
    pub lines: Vec<PatchLine>,
}

impl PatchHunk {
    /// Lines the hunk expects to find in the target.
    fn old_lines(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|l| match l {
                PatchLine::Context(s) | PatchLine::Remove(s) => Some(s.as_str()),
                PatchLine::Add(_) => None,
            })
            .collect()
    }

    /// Lines the hunk leaves behind.
    fn new_lines(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|l| match l {
                PatchLine::Context(s) | PatchLine::Add(s) => Some(s.as_str()),
                PatchLine::Remove(_) => None,
            })
            .collect()
    }

    /// 0-based index in the original where the hunk's old lines begin.
    fn declared_index(&self) -> usize {
        if self.old_len == 0 {
            self.old_start
        } else {
            self.old_start.saturating_sub(1)
        }
    }
}

/// A parsed single-file unified patch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Patch {
    pub hunks: Vec<PatchHunk>,
}

struct OpenHunk {
    hunk: PatchHunk,
    old_remaining: usize,
    new_remaining: usize,
    header_line: usize,
}

impl OpenHunk {
    fn is_complete(&self) -> bool {
        self.old_remaining == 0 && self.new_remaining == 0
    }

    fn finish(self) -> Result<PatchHunk> {
        if !self.is_complete() {
            return Err(Error::InvalidPatch {
                line: self.header_line,
                message: "hunk is shorter than its header declares".to_string(),
            });
        }
        Ok(self.hunk)
    }
}

impl Patch {
    /// Parse unified diff text.
    ///
    /// File headers (`---`, `+++`, `diff`, `index`) before a hunk are
    /// skipped. An empty input parses to a patch without hunks.
    pub fn parse(text: &str) -> Result<Self> {
        let mut hunks = Vec::new();
        let mut open: Option<OpenHunk> = None;

        for (idx, raw) in text.split_inclusive('\n').enumerate() {
            let line_no = idx + 1;
            let body = raw.strip_suffix('\n').unwrap_or(raw);

            if let Some(caps) = HUNK_HEADER.captures(body) {
                if let Some(prev) = open.take() {
                    hunks.push(prev.finish()?);
                }
                let number = |i: usize, default: usize| -> Result<usize> {
                    match caps.get(i) {
                        Some(m) => m.as_str().parse().map_err(|_| Error::InvalidPatch {
                            line: line_no,
                            message: format!("range value out of bounds: {}", m.as_str()),
                        }),
                        None => Ok(default),
                    }
                };
                let old_start = number(1, 0)?;
                let old_len = number(2, 1)?;
                let new_start = number(3, 0)?;
                let new_len = number(4, 1)?;
                open = Some(OpenHunk {
                    hunk: PatchHunk {
                        old_start,
                        old_len,
                        new_start,
                        new_len,
                        lines: Vec::new(),
                    },
                    old_remaining: old_len,
                    new_remaining: new_len,
                    header_line: line_no,
                });
                continue;
            }

            let Some(current) = open.as_mut() else {
                continue;
            };

            if let Some(marker) = body.strip_prefix('\\') {
                // "\ No newline at end of file" applies to the line before it
                let Some(last) = current.hunk.lines.last_mut() else {
                    return Err(Error::InvalidPatch {
                        line: line_no,
                        message: format!("marker without a preceding line:{marker}"),
                    });
                };
                let text = last.text_mut();
                if text.ends_with('\n') {
                    text.pop();
                }
                continue;
            }

            if current.is_complete() {
                // Trailing text after the last hunk of a file
                if let Some(done) = open.take() {
                    hunks.push(done.finish()?);
                }
                continue;
            }

            let (kind, content) = match body.chars().next() {
                Some(' ') => (' ', &body[1..]),
                Some('-') => ('-', &body[1..]),
                Some('+') => ('+', &body[1..]),
                // Some tools strip the space from empty context lines
                None => (' ', ""),
                Some(other) => {
                    return Err(Error::InvalidPatch {
                        line: line_no,
                        message: format!("unexpected line prefix `{other}`"),
                    });
                }
            };
            let content = format!("{content}\n");

            match kind {
                ' ' => {
                    if current.old_remaining == 0 || current.new_remaining == 0 {
                        return Err(overflow(line_no));
                    }
                    current.old_remaining -= 1;
                    current.new_remaining -= 1;
                    current.hunk.lines.push(PatchLine::Context(content));
                }
                '-' => {
                    if current.old_remaining == 0 {
                        return Err(overflow(line_no));
                    }
                    current.old_remaining -= 1;
                    current.hunk.lines.push(PatchLine::Remove(content));
                }
                _ => {
                    if current.new_remaining == 0 {
                        return Err(overflow(line_no));
                    }
                    current.new_remaining -= 1;
                    current.hunk.lines.push(PatchLine::Add(content));
                }
            }
        }

        if let Some(last) = open.take() {
            hunks.push(last.finish()?);
        }

        Ok(Self { hunks })
    }

    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    /// Apply every hunk to `base`, in order.
    ///
    /// Each hunk is looked up at its declared position adjusted by the drift
    /// of previous hunks, then searched outward line by line. A hunk whose
    /// lines occur nowhere after the previous hunk rejects the whole patch.
    pub fn apply_to(&self, base: &str) -> Result<String> {
        let base_lines: Vec<&str> = base.split_inclusive('\n').collect();
        let mut out = String::with_capacity(base.len());
        let mut cursor = 0usize;
        let mut offset: isize = 0;

        for (idx, hunk) in self.hunks.iter().enumerate() {
            let old = hunk.old_lines();
            let declared = hunk.declared_index();
            let hint = (declared as isize + offset).max(cursor as isize) as usize;

            let position = if old.is_empty() {
                Some(hint.min(base_lines.len()))
            } else {
                find_block(&base_lines, &old, cursor, hint)
            };

            let Some(position) = position else {
                return Err(Error::PatchRejected {
                    hunk: idx + 1,
                    line: hunk.old_start,
                });
            };

            if position != declared {
                debug!(hunk = idx + 1, declared, position, "Hunk applied at shifted position");
            }

            for line in &base_lines[cursor..position] {
                out.push_str(line);
            }
            for line in hunk.new_lines() {
                out.push_str(line);
            }
            cursor = position + old.len();
            offset = position as isize - declared as isize;
        }

        for line in &base_lines[cursor..] {
            out.push_str(line);
        }
        Ok(out)
    }
}

fn overflow(line: usize) -> Error {
    Error::InvalidPatch {
        line,
        message: "hunk is longer than its header declares".to_string(),
    }
}

/// Find `needle` in `haystack[from..]`, preferring the position closest to
/// `hint`.
fn find_block(haystack: &[&str], needle: &[&str], from: usize, hint: usize) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    let last = haystack.len() - needle.len();
    if from > last {
        return None;
    }
    let hint = hint.clamp(from, last);
    let matches_at = |pos: usize| haystack[pos..pos + needle.len()] == *needle;

    let span = (hint - from).max(last - hint);
    for delta in 0..=span {
        if let Some(pos) = hint.checked_add(delta)
            && pos <= last
            && matches_at(pos)
        {
            return Some(pos);
        }
        if delta > 0
            && let Some(pos) = hint.checked_sub(delta)
            && pos >= from
            && matches_at(pos)
        {
            return Some(pos);
        }
    }
    None
}

/// Parse and apply a unified patch to `base`.
pub fn apply(base: &str, patch: &str) -> Result<String> {
    Patch::parse(patch)?.apply_to(base)
}

/// Apply a unified patch to the file at `path` in place.
///
/// The file is only rewritten when every hunk applies. Returns the new
/// content.
pub fn apply_patch_file(path: &NormalizedPath, patch: &str) -> Result<String> {
    let base = codesync_fs::io::read_text(path)?;
    let patched = apply(&base, patch)?;
    if patched != base {
        codesync_fs::io::write_text(path, &patched)?;
    }
    Ok(patched)
}
