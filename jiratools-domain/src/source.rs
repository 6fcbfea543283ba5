use crate::{
    error::SourceError,
    model::{Board, Issue, SearchPage, Sprint, SprintState},
};

/// Read-only access to the issue-tracking service.
///
/// Implementations must be shareable across the blocking resolver's worker
/// threads; every call is an independent request.
pub trait IssueSource: Sync {
    fn search(
        &self,
        jql: &str,
        start_at: usize,
        page_size: usize,
    ) -> Result<SearchPage, SourceError>;

    fn list_boards(&self, project_key: &str) -> Result<Vec<Board>, SourceError>;

    /// Sprints of a board in the given state, oldest first.
    fn list_sprints(&self, board_id: u64, state: SprintState) -> Result<Vec<Sprint>, SourceError>;

    fn issues_for_sprint(&self, sprint_id: u64) -> Result<Vec<Issue>, SourceError>;
}

