//! Parse errors.

use std::path::{Path, PathBuf};

/// Error returned by [`Parser::parse`](crate::Parser::parse).
///
/// Line numbers are 1-based and relative to the file the line comes from:
/// the root source when `file` is `None`, an included file otherwise.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Malformed or unterminated block.
    #[error("Syntax error at line {line}{}: {message}", in_file(.file.as_deref()))]
    Syntax {
        line: usize,
        file: Option<PathBuf>,
        message: String,
    },
    /// Include target could not be resolved.
    #[error("Unresolved include '{target}' at line {line}{}", in_file(.file.as_deref()))]
    Resolution {
        line: usize,
        file: Option<PathBuf>,
        target: String,
    },
}

/// Category of a [`ParseError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseErrorKind {
    Syntax,
    Resolution,
}

impl ParseError {
    pub fn kind(&self) -> ParseErrorKind {
        match self {
            Self::Syntax { .. } => ParseErrorKind::Syntax,
            Self::Resolution { .. } => ParseErrorKind::Resolution,
        }
    }

    /// Line of the offending construct.
    pub fn line(&self) -> usize {
        match self {
            Self::Syntax { line, .. } | Self::Resolution { line, .. } => *line,
        }
    }

    /// Included file containing the offending line, if not the root source.
    pub fn file(&self) -> Option<&Path> {
        match self {
            Self::Syntax { file, .. } | Self::Resolution { file, .. } => file.as_deref(),
        }
    }
}

fn in_file(file: Option<&Path>) -> String {
    file.map(|f| format!(" in {}", f.display()))
        .unwrap_or_default()
}
