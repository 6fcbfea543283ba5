use crate::model::Issue;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderMode {
    /// Bulleted Markdown list.
    Markdown,
    /// Confluence wiki table rows.
    #[default]
    Wiki,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnnotateOptions {
    pub release_label: String,
    /// Label the issues were already filtered on, if any.
    pub filter_label: String,
    pub mode: RenderMode,
    pub base_url: String,
}

/// An issue with its rendered line and release emphasis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssueRecord {
    pub issue: Issue,
    pub line: String,
    pub emphasized: bool,
}

/// Emphasis is suppressed when the release label is also the active filter,
/// since every visible issue carries it then.
pub fn is_emphasized(issue: &Issue, release_label: &str, filter_label: &str) -> bool {
    !release_label.is_empty() && issue.has_label(release_label) && release_label != filter_label
}

pub fn annotate(issue: Issue, options: &AnnotateOptions) -> IssueRecord {
    let emphasized = is_emphasized(&issue, &options.release_label, &options.filter_label);
    let line = render_line(&issue, options.mode, &options.base_url, emphasized);
    IssueRecord {
        issue,
        line,
        emphasized,
    }
}

pub fn annotate_all(
    issues: impl IntoIterator<Item = Issue>,
    options: &AnnotateOptions,
) -> Vec<IssueRecord> {
    issues
        .into_iter()
        .map(|issue| annotate(issue, options))
        .collect()
}

pub fn browse_url(base_url: &str, key: &str) -> String {
    format!("{}/browse/{key}", base_url.trim_end_matches('/'))
}

fn render_line(issue: &Issue, mode: RenderMode, base_url: &str, emphasized: bool) -> String {
    let url = browse_url(base_url, &issue.key);
    let assignee = issue.assignee.as_deref().unwrap_or("UNASSIGNED");
    let summary = issue.summary.as_str();

    match (mode, emphasized) {
        (RenderMode::Markdown, false) => format!(
            "  * [{}]({url}) {summary} -- {assignee} -- {}",
            issue.key, issue.status
        ),
        (RenderMode::Markdown, true) => format!(
            "  * **[{}]({url}) {summary}** -- {assignee} -- {}",
            issue.key, issue.status
        ),
        (RenderMode::Wiki, false) => format!(
            "|[{}|{url}]|{}|{assignee}|{}|",
            issue.key,
            escape_wiki_cell(summary),
            issue.status
        ),
        (RenderMode::Wiki, true) => format!(
            "|*[{}|{url}]*|*{}*|{assignee}|{}|",
            issue.key,
            escape_wiki_cell(summary),
            issue.status
        ),
    }
}

fn escape_wiki_cell(value: &str) -> String {
    value.replace('|', "\\|")
}
