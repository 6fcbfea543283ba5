use crate::model::{Issue, IssueTypes, STATUS_IN_PROGRESS, STATUS_TO_DO};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Classified {
    pub complete: Vec<Issue>,
    pub incomplete: Vec<Issue>,
    pub types: IssueTypes,
}

/// Literal status-name match; workflow categories are not consulted.
pub fn is_incomplete(issue: &Issue) -> bool {
    issue.status == STATUS_IN_PROGRESS || issue.status == STATUS_TO_DO
}

/// Splits issues into complete/incomplete, keeping input order in each bucket.
pub fn classify(issues: impl IntoIterator<Item = Issue>) -> Classified {
    let mut classified = Classified::default();
    for issue in issues {
        classified.types.insert(&issue.issue_type);
        if is_incomplete(&issue) {
            classified.incomplete.push(issue);
        } else {
            classified.complete.push(issue);
        }
    }
    classified
}
