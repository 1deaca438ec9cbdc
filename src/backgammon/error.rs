use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while extracting one match from an XG web export.
///
/// Every variant except [`XgError::NoMatches`] is fatal to the match being extracted only.
#[derive(Debug, Error)]
pub enum XgError {
    #[error("format error: missing {field} (expected one of {expected:?})")]
    Format {
        field: &'static str,
        expected: Vec<&'static str>,
    },

    #[error("integrity check failed: {field} expected {expected}, found {found}")]
    Integrity {
        field: &'static str,
        expected: String,
        found: String,
    },

    #[error("invalid {field} value '{value}'")]
    NumericParse { field: &'static str, value: String },

    #[error("missing required file '{}'", path.display())]
    MissingFile { path: PathBuf },

    #[error("no match directories found for '{pattern}'")]
    NoMatches { pattern: String },

    #[error("invalid path pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid position identifier '{raw}': {reason}")]
    Position { raw: String, reason: &'static str },

    #[error("game {game_number}: {source}")]
    InGame {
        game_number: u32,
        #[source]
        source: Box<XgError>,
    },
}

impl XgError {
    pub(crate) fn format(field: &'static str, expected: &[&'static str]) -> Self {
        Self::Format {
            field,
            expected: expected.to_vec(),
        }
    }

    pub(crate) fn integrity(
        field: &'static str,
        expected: impl ToString,
        found: impl ToString,
    ) -> Self {
        Self::Integrity {
            field,
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub(crate) fn numeric(field: &'static str, value: &str) -> Self {
        Self::NumericParse {
            field,
            value: value.to_string(),
        }
    }

    pub(crate) fn in_game(self, game_number: u32) -> Self {
        Self::InGame {
            game_number,
            source: Box::new(self),
        }
    }

    /// Short kind label used in row-level diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Format { .. } => "format",
            Self::Integrity { .. } => "integrity",
            Self::NumericParse { .. } => "numeric",
            Self::MissingFile { .. } => "missing_file",
            Self::NoMatches { .. } | Self::Pattern { .. } => "configuration",
            Self::Io { .. } => "io",
            Self::Position { .. } => "position",
            Self::InGame { source, .. } => source.kind(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ErrorAccumulator(Option<String>);

impl ErrorAccumulator {
    pub fn push(&mut self, msg: &str) {
        match &mut self.0 {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(msg);
            }
            None => {
                self.0 = Some(msg.to_string());
            }
        }
    }

    pub fn take(&mut self) -> Option<String> {
        self.0.take()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}
