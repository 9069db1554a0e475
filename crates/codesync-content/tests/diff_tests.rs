//! Tests for the diff engine and patch application

use codesync_content::diff::write_rendered;
use codesync_content::{
    DiffTag, Error, Patch, apply, apply_diff, apply_patch_file, diff, unified_patch,
};
use codesync_fs::NormalizedPath;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;
use tempfile::TempDir;

fn text_strategy() -> impl Strategy<Value = String> {
    (prop::collection::vec("[a-c ]{0,3}", 0..12), any::<bool>()).prop_map(|(lines, trailing)| {
        let mut text = lines.join("\n");
        if trailing && !text.is_empty() {
            text.push('\n');
        }
        text
    })
}

proptest! {
    #[test]
    fn prop_applying_diff_reproduces_updated(a in text_strategy(), b in text_strategy()) {
        let result = diff(&a, &b);
        prop_assert_eq!(apply_diff(&a, &result).unwrap(), b);
    }

    #[test]
    fn prop_self_diff_is_empty(a in text_strategy()) {
        let result = diff(&a, &a);
        prop_assert!(result.is_empty());
        prop_assert_eq!(unified_patch(&a, &a, "a", "b"), "");
    }
}

#[rstest]
#[case::append_line("a\nb\n", "a\nb\nc\n")]
#[case::drop_trailing_newline("a\nb\n", "a\nb")]
#[case::add_trailing_newline("a\nb", "a\nb\n")]
#[case::from_empty("", "first\nsecond\n")]
#[case::to_empty("first\nsecond\n", "")]
#[case::distant_edits(
    "1\n2\n3\n4\n5\n6\n7\n8\n9\n10\n11\n12\n",
    "one\n2\n3\n4\n5\n6\n7\n8\n9\n10\n11\ntwelve\n"
)]
#[case::lines_to_blank_run("a\na\na\n\n", "\n\n\n\n\n\n\n\n")]
#[case::blank_run_shrinks("\n\n\n\n\n", "\n")]
#[case::blank_lines_around_text("\n b\n\n", "\n\n b\n\n\n")]
#[case::blanks_without_trailing_newline("\n\nc", "c\n\n")]
fn test_round_trip_cases(#[case] original: &str, #[case] updated: &str) {
    let result = diff(original, updated);
    assert_eq!(apply_diff(original, &result).unwrap(), updated);
}

#[test]
fn test_patch_ranges_match_hunk_bodies() {
    let patch = unified_patch("a\na\na\n\n", "\n\n\n\n\n\n\n\n", "a", "b");
    let parsed = Patch::parse(&patch).unwrap();
    assert_eq!(parsed.hunks.len(), 1);
    let hunk = &parsed.hunks[0];
    assert_eq!((hunk.old_start, hunk.old_len), (1, 4));
    assert_eq!((hunk.new_start, hunk.new_len), (1, 8));
}

#[test]
fn test_hunks_carry_literal_lines() {
    let result = diff("keep\nold\n", "keep\nnew\nextra\n");
    let tags: Vec<DiffTag> = result.hunks.iter().map(|h| h.tag).collect();
    assert_eq!(tags, vec![DiffTag::Removed, DiffTag::Added]);
    assert_eq!(result.hunks[0].content, "old\n");
    assert_eq!(result.hunks[1].content, "new\nextra\n");
    assert_eq!(result.stats.changed, 1);
    assert_eq!(result.stats.added, 1);
    assert_eq!(result.stats.removed, 0);
}

#[test]
fn test_patch_applies_to_shifted_base() {
    let original = "fn a\nbody\nend\n";
    let patch = unified_patch(original, "fn a\nBODY\nend\n", "a", "b");
    let shifted = "header\nheader\nfn a\nbody\nend\n";
    assert_eq!(apply(shifted, &patch).unwrap(), "header\nheader\nfn a\nBODY\nend\n");
}

#[test]
fn test_patch_rejected_on_context_mismatch() {
    let patch = unified_patch("x\ny\nz\n", "x\nY\nz\n", "a", "b");
    let err = apply("x\ndifferent\nz\n", &patch).unwrap_err();
    assert!(matches!(err, Error::PatchRejected { hunk: 1, .. }), "got {err:?}");
}

#[test]
fn test_second_hunk_rejection_reports_index() {
    let original: String = (1..=20).map(|n| format!("line {n}\n")).collect();
    let updated = original.replace("line 2\n", "LINE 2\n").replace("line 18\n", "LINE 18\n");
    let patch = unified_patch(&original, &updated, "a", "b");
    let base = original.replace("line 18\n", "local 18\n");
    let err = apply(&base, &patch).unwrap_err();
    assert!(matches!(err, Error::PatchRejected { hunk: 2, .. }), "got {err:?}");
}

#[test]
fn test_apply_patch_file_rewrites_on_success_only() {
    let dir = TempDir::new().unwrap();
    let path = NormalizedPath::new(dir.path().join("notes.txt"));
    std::fs::write(path.to_native(), "one\ntwo\n").unwrap();

    let patch = unified_patch("one\ntwo\n", "one\n2\n", "a", "b");
    let out = apply_patch_file(&path, &patch).unwrap();
    assert_eq!(out, "one\n2\n");
    assert_eq!(std::fs::read_to_string(path.to_native()).unwrap(), "one\n2\n");

    // Same patch again no longer matches
    let err = apply_patch_file(&path, &patch).unwrap_err();
    assert!(matches!(err, Error::PatchRejected { .. }));
    assert_eq!(std::fs::read_to_string(path.to_native()).unwrap(), "one\n2\n");
}

#[test]
fn test_write_rendered_is_plain_text() {
    let dir = TempDir::new().unwrap();
    let path = NormalizedPath::new(dir.path().join("out/diff.txt"));
    write_rendered(&diff("a\n", "b\n"), &path).unwrap();
    let written = std::fs::read_to_string(path.to_native()).unwrap();
    assert!(written.starts_with("Changes: +0 -0 ~1\n"));
    assert!(!written.contains('\u{1b}'));
}
