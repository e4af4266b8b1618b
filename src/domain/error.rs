// Error and diagnostic types for cflow output parsing.

use thiserror::Error;

/// Why a line that looked like a call entry could not be classified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error("indentation is not a multiple of {unit} spaces")]
    UnevenIndent { unit: usize },
    #[error("tab character in indentation")]
    TabIndent,
    #[error("level marker {marker} disagrees with indentation depth {indent}")]
    LevelMismatch { marker: usize, indent: usize },
    #[error("unreadable level marker")]
    BadLevelMarker,
    #[error("missing function name")]
    MissingName,
    #[error("unterminated `<...>` annotation")]
    UnterminatedAnnotation,
    #[error("invalid line number `{0}` in location")]
    BadLocation(String),
    #[error("unexpected trailing text `{0}`")]
    UnexpectedTrailing(String),
}

/// Recoverable problems found while rebuilding the call forest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseIssue {
    /// The line was skipped.
    #[error("line {line}: {reason}: `{content}`")]
    ClassificationFailure {
        line: usize,
        content: String,
        reason: FailureReason,
    },
    /// The line was kept but attached at a shallower depth than it claimed.
    #[error("line {line}: `{name}` skips levels (depth {depth}), attached at depth {attached_depth}")]
    StructuralAnomaly {
        line: usize,
        name: String,
        depth: usize,
        attached_depth: usize,
    },
}

impl ParseIssue {
    pub fn line(&self) -> usize {
        match self {
            ParseIssue::ClassificationFailure { line, .. } => *line,
            ParseIssue::StructuralAnomaly { line, .. } => *line,
        }
    }

    pub fn is_classification_failure(&self) -> bool {
        matches!(self, ParseIssue::ClassificationFailure { .. })
    }
}

/// Fatal outcome of a parse: nothing left to render.
#[derive(Debug, Error)]
pub enum ForestError {
    #[error(
        "no call-graph entries in input ({skipped} non-data lines, {} unparsable)",
        .issues.len()
    )]
    EmptyInput {
        skipped: usize,
        issues: Vec<ParseIssue>,
    },
}
