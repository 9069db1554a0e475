//! Line diffs between two texts
//!
//! Uses the `similar` crate's Myers implementation over line tokens. Equal
//! runs are folded away; insert and delete runs become tagged hunks.

use std::fmt::Write as _;

use colored::Colorize;
use serde::{Deserialize, Serialize};
use similar::{Algorithm, ChangeTag, DiffOp, TextDiff};

use codesync_fs::NormalizedPath;

use crate::Result;

/// Lines of unchanged context around each unified patch hunk
const CONTEXT_RADIUS: usize = 3;

/// Direction of a hunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiffTag {
    Added,
    Removed,
}

/// A contiguous run of added or removed lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffHunk {
    /// 1-based line where the run starts: original numbering for removed
    /// runs, updated numbering for added runs
    pub line_start: usize,
    /// The literal lines, line endings included
    pub content: String,
    pub tag: DiffTag,
}

impl DiffHunk {
    /// Number of lines in the hunk.
    pub fn line_count(&self) -> usize {
        self.content.lines().count()
    }
}

/// Aggregate line counts of a diff
///
/// `changed` counts the overlap `min(added, removed)`, which is then taken
/// out of both `added` and `removed`. This is an estimate for replaced lines,
/// not move detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub added: usize,
    pub removed: usize,
    pub changed: usize,
}

impl DiffStats {
    fn from_raw(added: usize, removed: usize) -> Self {
        let changed = added.min(removed);
        Self {
            added: added - changed,
            removed: removed - changed,
            changed,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.added == 0 && self.removed == 0 && self.changed == 0
    }
}

/// Structured difference between two texts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    pub original: String,
    pub updated: String,
    pub hunks: Vec<DiffHunk>,
    pub stats: DiffStats,
}

impl DiffResult {
    /// True when both sides are identical.
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    /// Unified patch turning `original` into `updated`.
    pub fn to_patch(&self) -> String {
        unified_patch(&self.original, &self.updated, "original", "updated")
    }

    /// Human-readable rendering, see [`render`].
    pub fn render(&self, colorize: bool) -> String {
        render(self, colorize)
    }
}

/// Compute the line diff between two texts.
pub fn diff(original: &str, updated: &str) -> DiffResult {
    let text_diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_lines(original, updated);
    let old_lines = text_diff.old_slices();
    let new_lines = text_diff.new_slices();

    let mut hunks: Vec<DiffHunk> = Vec::new();
    let mut added = 0;
    let mut removed = 0;

    for op in text_diff.ops() {
        match *op {
            DiffOp::Equal { .. } => {}
            DiffOp::Delete {
                old_index, old_len, ..
            } => {
                let run = &old_lines[old_index..old_index + old_len];
                push_run(&mut hunks, DiffTag::Removed, old_index, run);
                removed += old_len;
            }
            DiffOp::Insert {
                new_index, new_len, ..
            } => {
                let run = &new_lines[new_index..new_index + new_len];
                push_run(&mut hunks, DiffTag::Added, new_index, run);
                added += new_len;
            }
            DiffOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            } => {
                let removed_run = &old_lines[old_index..old_index + old_len];
                let added_run = &new_lines[new_index..new_index + new_len];
                push_run(&mut hunks, DiffTag::Removed, old_index, removed_run);
                push_run(&mut hunks, DiffTag::Added, new_index, added_run);
                removed += old_len;
                added += new_len;
            }
        }
    }

    DiffResult {
        original: original.to_string(),
        updated: updated.to_string(),
        hunks,
        stats: DiffStats::from_raw(added, removed),
    }
}

/// Append a run of lines, merging it into the previous hunk when that hunk
/// has the same tag and ends where this run starts.
fn push_run(hunks: &mut Vec<DiffHunk>, tag: DiffTag, index: usize, lines: &[&str]) {
    if lines.is_empty() {
        return;
    }
    let line_start = index + 1;

    if let Some(last) = hunks.last_mut()
        && last.tag == tag
        && last.line_start + last.line_count() == line_start
        && last.content.ends_with('\n')
    {
        last.content.push_str(&lines.concat());
        return;
    }

    hunks.push(DiffHunk {
        line_start,
        content: lines.concat(),
        tag,
    });
}

/// Produce a unified diff of two texts.
///
/// Returns an empty string when the texts are identical. Hunk ranges are
/// counted from the emitted lines, so every hunk body matches its header.
pub fn unified_patch(original: &str, updated: &str, label_a: &str, label_b: &str) -> String {
    let text_diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_lines(original, updated);
    let changes: Vec<(ChangeTag, &str)> = text_diff
        .iter_all_changes()
        .map(|change| (change.tag(), change.value()))
        .collect();

    // 0-based (old, new) line numbers at which each change starts
    let mut positions = Vec::with_capacity(changes.len());
    let (mut old_line, mut new_line) = (0usize, 0usize);
    for (tag, _) in &changes {
        positions.push((old_line, new_line));
        match tag {
            ChangeTag::Equal => {
                old_line += 1;
                new_line += 1;
            }
            ChangeTag::Delete => old_line += 1,
            ChangeTag::Insert => new_line += 1,
        }
    }

    let mut groups: Vec<(usize, usize)> = Vec::new();
    for (idx, (tag, _)) in changes.iter().enumerate() {
        if *tag == ChangeTag::Equal {
            continue;
        }
        let start = idx.saturating_sub(CONTEXT_RADIUS);
        let end = (idx + 1 + CONTEXT_RADIUS).min(changes.len());
        match groups.last_mut() {
            Some(last) if start <= last.1 => last.1 = end,
            _ => groups.push((start, end)),
        }
    }
    if groups.is_empty() {
        return String::new();
    }

    let mut out = format!("--- {label_a}\n+++ {label_b}\n");
    for (start, end) in groups {
        let group = &changes[start..end];
        let (old_start, new_start) = positions[start];
        let old_len = group.iter().filter(|(tag, _)| *tag != ChangeTag::Insert).count();
        let new_len = group.iter().filter(|(tag, _)| *tag != ChangeTag::Delete).count();
        let _ = writeln!(
            out,
            "@@ -{} +{} @@",
            hunk_range(old_start, old_len),
            hunk_range(new_start, new_len)
        );

        for (tag, value) in group {
            let sign = match tag {
                ChangeTag::Equal => ' ',
                ChangeTag::Delete => '-',
                ChangeTag::Insert => '+',
            };
            out.push(sign);
            out.push_str(value);
            if !value.ends_with('\n') {
                out.push_str("\n\\ No newline at end of file\n");
            }
        }
    }
    out
}

/// `start,len` range of a hunk header. A single line omits the length and
/// an empty range names the line before it.
fn hunk_range(start: usize, len: usize) -> String {
    match len {
        0 => format!("{start},0"),
        1 => format!("{}", start + 1),
        _ => format!("{},{len}", start + 1),
    }
}

/// Re-apply a diff onto `base`.
///
/// `base` may differ from the diff's original text; the change is applied
/// through a unified patch, so hunks whose context no longer matches are
/// rejected rather than merged.
pub fn apply_diff(base: &str, result: &DiffResult) -> Result<String> {
    crate::patch::apply(base, &result.to_patch())
}

/// Format a diff for display.
///
/// Starts with a `Changes: +A -R ~C` header followed by each hunk under an
/// `@@ Line N @@` marker. With `colorize`, added lines are green and removed
/// lines red, subject to the `colored` crate's terminal detection.
pub fn render(result: &DiffResult, colorize: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Changes: +{} -{} ~{}\n",
        result.stats.added, result.stats.removed, result.stats.changed
    );

    for hunk in &result.hunks {
        let _ = writeln!(out, "@@ Line {} @@", hunk.line_start);

        let sign = match hunk.tag {
            DiffTag::Added => '+',
            DiffTag::Removed => '-',
        };
        for line in hunk.content.lines() {
            let text = if line.is_empty() {
                sign.to_string()
            } else {
                format!("{sign} {line}")
            };
            if colorize {
                let painted = match hunk.tag {
                    DiffTag::Added => text.green(),
                    DiffTag::Removed => text.red(),
                };
                let _ = writeln!(out, "{painted}");
            } else {
                let _ = writeln!(out, "{text}");
            }
        }
        out.push('\n');
    }

    out
}

/// Write the plain rendering of a diff to a file.
pub fn write_rendered(result: &DiffResult, path: &NormalizedPath) -> Result<()> {
    codesync_fs::io::write_text(path, &render(result, false))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn identical_texts_have_no_hunks() {
        let result = diff("a\nb\n", "a\nb\n");
        assert!(result.is_empty());
        assert!(result.stats.is_zero());
    }

    #[test]
    fn replaced_line_counts_as_changed() {
        let result = diff("a\nb\nc\n", "a\nB\nc\n");
        assert_eq!(
            result.stats,
            DiffStats {
                added: 0,
                removed: 0,
                changed: 1
            }
        );
        assert_eq!(result.hunks.len(), 2);
        assert_eq!(result.hunks[0].tag, DiffTag::Removed);
        assert_eq!(result.hunks[0].line_start, 2);
        assert_eq!(result.hunks[0].content, "b\n");
        assert_eq!(result.hunks[1].tag, DiffTag::Added);
        assert_eq!(result.hunks[1].content, "B\n");
    }

    #[test]
    fn overlap_is_removed_from_raw_counts() {
        let result = diff("x\n", "y\nz\nw\n");
        assert_eq!(
            result.stats,
            DiffStats {
                added: 2,
                removed: 0,
                changed: 1
            }
        );
    }

    #[test]
    fn added_hunks_use_updated_numbering() {
        let result = diff("one\ntwo\n", "zero\none\ntwo\nthree\n");
        let starts: Vec<(DiffTag, usize)> =
            result.hunks.iter().map(|h| (h.tag, h.line_start)).collect();
        assert_eq!(starts, vec![(DiffTag::Added, 1), (DiffTag::Added, 4)]);
        assert_eq!(result.stats.added, 2);
    }

    #[test]
    fn consecutive_runs_fold_into_one_hunk() {
        let result = diff("keep\n", "keep\na\nb\nc\n");
        assert_eq!(result.hunks.len(), 1);
        assert_eq!(result.hunks[0].content, "a\nb\nc\n");
        assert_eq!(result.hunks[0].line_count(), 3);
    }

    #[test]
    fn render_plain_output() {
        let result = diff("func main() {\nprintln(1)\n}\n", "func main() {\nprintln(2)\n}\n");
        insta::assert_snapshot!(render(&result, false), @r"
        Changes: +0 -0 ~1

        @@ Line 2 @@
        - println(1)

        @@ Line 2 @@
        + println(2)
        ");
    }

    #[test]
    fn render_marks_blank_lines_with_bare_sign() {
        let result = diff("a\n", "a\n\nb\n");
        let rendered = render(&result, false);
        assert!(rendered.contains("+\n+ b\n"), "got: {rendered}");
    }

    #[test]
    fn render_colorized_keeps_content() {
        let result = diff("old\n", "new\n");
        let rendered = render(&result, true);
        assert!(rendered.starts_with("Changes: +0 -0 ~1"));
        assert!(rendered.contains("- old"));
        assert!(rendered.contains("+ new"));
    }

    #[test]
    fn unified_patch_has_headers() {
        let patch = unified_patch("a\n", "b\n", "local/a.txt", "remote/a.txt");
        assert!(patch.starts_with("--- local/a.txt\n+++ remote/a.txt\n@@"));
        assert!(patch.contains("-a\n+b\n"));
    }

    #[test]
    fn unified_patch_of_identical_texts_is_empty() {
        assert_eq!(unified_patch("same\n", "same\n", "a", "b"), "");
    }
}
