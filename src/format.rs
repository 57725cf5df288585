//! Target office formats and their CLI tokens.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// The three office formats a PDF can be converted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    /// Flowing word-processing document (`.docx`).
    Word,
    /// Multi-sheet workbook (`.xlsx`).
    Excel,
    /// Slide deck (`.pptx`).
    Ppt,
}

impl TargetFormat {
    /// Every supported format, in CLI listing order.
    pub const ALL: [TargetFormat; 3] = [TargetFormat::Word, TargetFormat::Excel, TargetFormat::Ppt];

    /// The token accepted on the command line.
    pub fn token(self) -> &'static str {
        match self {
            TargetFormat::Word => "word",
            TargetFormat::Excel => "excel",
            TargetFormat::Ppt => "ppt",
        }
    }

    /// Conventional file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            TargetFormat::Word => "docx",
            TargetFormat::Excel => "xlsx",
            TargetFormat::Ppt => "pptx",
        }
    }

    /// Human-readable application name used in success messages.
    pub fn display_name(self) -> &'static str {
        match self {
            TargetFormat::Word => "Word",
            TargetFormat::Excel => "Excel",
            TargetFormat::Ppt => "PowerPoint",
        }
    }

    /// Whether `path` carries this format's conventional extension.
    pub fn matches_extension(self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(self.extension()))
    }

    /// Comma-separated token list, e.g. for usage text.
    pub fn supported_tokens() -> String {
        Self::ALL
            .iter()
            .map(|f| f.token())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for TargetFormat {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.token() == token)
            .ok_or(ConvertError::UnsupportedFormat {
                token: s.to_string(),
            })
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
