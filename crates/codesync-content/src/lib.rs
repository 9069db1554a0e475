//! Content operations for codesync
//!
//! - [`diff`]: line-granularity diffs between two texts, their rendering,
//!   and unified patches
//! - [`patch`]: parsing and context-checked application of unified patches
//! - [`function`]: locating, extracting, and replacing a single named
//!   function inside a source file

pub mod diff;
pub mod error;
pub mod function;
pub mod language;
pub mod patch;

pub use diff::{DiffHunk, DiffResult, DiffStats, DiffTag, apply_diff, diff, render, unified_patch};
pub use error::{Error, Result};
pub use function::{
    BraceSyntax, FunctionSpan, LanguageStrategy, TreeGrammar, extract_function, locate_function,
    replace_function,
};
pub use language::Language;
pub use patch::{Patch, apply, apply_patch_file};
