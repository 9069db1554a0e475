//! Supported source languages for function-level sync

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::function::{BraceSyntax, LanguageStrategy, TreeGrammar};

/// Languages whose functions can be extracted and replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Go,
    JavaScript,
    Python,
}

impl Language {
    /// Parse a configuration identifier such as `go`, `js` or `python`.
    pub fn from_identifier(id: &str) -> Option<Self> {
        match id.trim().to_lowercase().as_str() {
            "go" | "golang" => Some(Self::Go),
            "javascript" | "js" => Some(Self::JavaScript),
            "python" | "py" => Some(Self::Python),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Go => "go",
            Self::JavaScript => "javascript",
            Self::Python => "python",
        }
    }

    /// Strategy used to locate a function for extraction.
    pub fn locator(&self) -> LanguageStrategy {
        match self {
            Self::Go => LanguageStrategy::GoDeclarations,
            Self::JavaScript => LanguageStrategy::TreeWalk(TreeGrammar::JavaScript),
            Self::Python => LanguageStrategy::Indentation,
        }
    }

    /// Strategy used to locate the span a replacement is spliced over.
    pub fn replacer(&self) -> LanguageStrategy {
        match self {
            Self::Go => LanguageStrategy::BraceScan(BraceSyntax::Go),
            Self::JavaScript => LanguageStrategy::BraceScan(BraceSyntax::JavaScript),
            Self::Python => LanguageStrategy::Indentation,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_identifier(s).ok_or_else(|| Error::UnsupportedLanguage(s.to_string()))
    }
}
