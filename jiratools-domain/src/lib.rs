//! Issue aggregation for sprint reports, release notes and blocking-status
//! audits, written against the [`IssueSource`] capability.

mod annotate;
mod blocking;
mod classify;
mod error;
pub mod jql;
mod model;
mod pager;
mod release;
mod source;
mod sprint;

#[cfg(test)]
mod fake;

pub use annotate::{
    annotate, annotate_all, browse_url, is_emphasized, AnnotateOptions, IssueRecord, RenderMode,
};
pub use blocking::{
    classify_concurrently, default_workers, evaluate_links, resolve_blocking_status,
    ActionableLinkedIssues, BlockingOptions, LinkVerdict, DEFAULT_OPEN_ISSUE_LIMIT,
};
pub use classify::{classify, is_incomplete, Classified};
pub use error::{ReportError, SourceError};
pub use model::{
    Board, Issue, IssueLink, IssueTypes, LinkDirection, SearchPage, Sprint, SprintState,
    STATUS_IN_PROGRESS, STATUS_TO_DO, STATUS_WORK_IN_PROGRESS,
};
pub use pager::{collect_pages, SearchPager, DEFAULT_PAGE_SIZE};
pub use release::{release_notes, ReleaseNotes, ReleaseNotesOptions};
pub use source::IssueSource;
pub use sprint::{
    collect_sprint_reports, resolve_sprint, select_sprint, SprintData, SprintReportOptions,
    SprintReports,
};
