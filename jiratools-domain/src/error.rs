use thiserror::Error;

/// Failure reported by an [`IssueSource`](crate::IssueSource) call.
///
/// Always fatal for the run that triggered it; nothing in the core retries.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct SourceError(#[from] anyhow::Error);

impl SourceError {
    pub fn msg(message: impl Into<String>) -> Self {
        Self(anyhow::anyhow!(message.into()))
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("issue source request failed: {0}")]
    Source(#[from] SourceError),

    #[error("no board found for project '{project}'")]
    NoBoardFound { project: String },

    #[error(
        "look-back {look_back} is out of range for project '{project}': only {available} matching sprint(s)"
    )]
    LookBackOutOfRange {
        project: String,
        look_back: usize,
        available: usize,
    },

    #[error("invalid report options: {0}")]
    InvalidOptions(String),
}

impl ReportError {
    /// Only a missing board lets a multi-project run carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NoBoardFound { .. })
    }
}
