use tracing::info;

use crate::{
    annotate::{annotate_all, AnnotateOptions, IssueRecord},
    error::ReportError,
    jql::{fix_version_jql, quote},
    model::IssueTypes,
    pager::SearchPager,
    source::IssueSource,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReleaseNotesOptions {
    pub projects: Vec<String>,
    pub fix_version: String,
    pub page_size: usize,
    pub annotate: AnnotateOptions,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReleaseNotes {
    pub title: String,
    /// Size of the unfiltered result set.
    pub total_issues: usize,
    pub records: Vec<IssueRecord>,
    pub types: IssueTypes,
}

/// Release notes for a fix version.
///
/// The unfiltered and label-filtered queries are two independent pager runs;
/// the filtered one only happens when a filter label is set.
pub fn release_notes<S>(source: &S, options: &ReleaseNotesOptions) -> Result<ReleaseNotes, ReportError>
where
    S: IssueSource + ?Sized,
{
    if options.projects.is_empty() {
        return Err(ReportError::InvalidOptions(
            "at least one project is required".to_string(),
        ));
    }
    let version = options.fix_version.trim();
    if version.is_empty() {
        return Err(ReportError::InvalidOptions(
            "fix version cannot be empty".to_string(),
        ));
    }

    let pager = SearchPager::new(source, options.page_size);
    let base = fix_version_jql(&options.projects, version);
    let all = pager.fetch_all(&base.render())?;
    let total_issues = all.len();

    let filter = options.annotate.filter_label.trim();
    let annotate = AnnotateOptions {
        filter_label: filter.to_string(),
        ..options.annotate.clone()
    };
    let visible = if filter.is_empty() {
        all
    } else {
        let filtered_jql = base.and(format!("labels = {}", quote(filter))).render();
        pager.fetch_all(&filtered_jql)?
    };
    info!(
        version,
        total = total_issues,
        visible = visible.len(),
        "collected release issues"
    );

    let types = visible.iter().map(|issue| issue.issue_type.as_str()).collect();
    Ok(ReleaseNotes {
        title: format!("Release Notes for {version}"),
        total_issues,
        records: annotate_all(visible, &annotate),
        types,
    })
}
