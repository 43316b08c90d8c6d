//! Error types shared by the generator and the validator.

use thiserror::Error;

use crate::obligation::Obligation;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CoverError>;

/// Everything that can go wrong while building or checking a covering array.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoverError {
    /// Caller-supplied input violates a precondition. Reported before any
    /// generation work begins.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// The supplied rows leave at least one obligation uncovered.
    #[error("{total_missing} obligation(s) uncovered, first: {}", first_gap(.missing))]
    CoverageGap {
        total_missing: u64,
        /// A bounded sample of the uncovered obligations, in enumeration order.
        missing: Vec<Obligation>,
    },

    /// A row has the wrong length or a value outside its parameter's range.
    #[error("row {row} is malformed: {reason}")]
    MalformedRow { row: usize, reason: String },

    /// A row contains a combination the caller excluded.
    #[error("row {row} contains excluded combination {exclusion:?}")]
    ExcludedRow {
        row: usize,
        exclusion: Vec<(usize, usize)>,
    },

    /// The obligation set is too large to track.
    #[error("obligation count {obligations} exceeds limit {limit}")]
    Overflow { obligations: u128, limit: u64 },
}

impl CoverError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code, used by the harness in reports and logs.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid_input",
            Self::CoverageGap { .. } => "coverage_gap",
            Self::MalformedRow { .. } => "malformed_row",
            Self::ExcludedRow { .. } => "excluded_row",
            Self::Overflow { .. } => "overflow",
        }
    }
}

fn first_gap(missing: &[Obligation]) -> String {
    missing
        .first()
        .map_or_else(|| "<none recorded>".to_string(), ToString::to_string)
}
