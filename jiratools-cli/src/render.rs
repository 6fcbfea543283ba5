//! Text output for the reports: Markdown, Confluence wiki markup and CSV.

use std::io;

use jiratools_domain::{
    browse_url, ActionableLinkedIssues, Issue, IssueRecord, ReleaseNotes, RenderMode, SprintData,
};

const WIKI_TABLE_HEADER: &str = "||Key||Summary||Assignee||Status||";
const CSV_HEADER: [&str; 8] = [
    "Type", "Key", "Summary", "Status", "Assignee", "Reporter", "Created", "Link",
];

pub fn render_sprint(data: &SprintData, mode: RenderMode) -> String {
    let mut out = String::new();
    push_heading(&mut out, mode, 1, &data.name);
    if !data.types.is_empty() {
        let types = data.types.iter().collect::<Vec<_>>().join(", ");
        out.push_str(&format!("Issue types: {types}\n\n"));
    }

    push_heading(&mut out, mode, 2, "Done");
    push_records(&mut out, mode, data.completed.iter());
    out.push('\n');
    push_heading(&mut out, mode, 2, "Incomplete");
    push_records(&mut out, mode, data.incomplete.iter());
    out.push_str("\n\n");
    out
}

/// Records grouped under one heading per issue type.
pub fn render_release_notes(notes: &ReleaseNotes, mode: RenderMode) -> String {
    let mut out = String::new();
    push_heading(&mut out, mode, 1, &notes.title);
    if notes.records.len() != notes.total_issues {
        out.push_str(&format!(
            "Showing {} of {} issues.\n\n",
            notes.records.len(),
            notes.total_issues
        ));
    }

    for issue_type in notes.types.iter() {
        push_heading(&mut out, mode, 2, issue_type);
        push_records(
            &mut out,
            mode,
            notes
                .records
                .iter()
                .filter(|record| record.issue.issue_type == issue_type),
        );
        out.push('\n');
    }
    out
}

pub fn render_actionable(actionable: &ActionableLinkedIssues, base_url: &str) -> String {
    let rule = format!("{}\n", "-".repeat(54));
    let mut out = String::new();

    if actionable.is_empty() {
        out.push_str(&rule);
        out.push_str("  All issues seem to still have pending linked issues.\n");
        out.push_str(&rule);
        return out;
    }

    let sections = [
        ("have completed linked issues", &actionable.resolved),
        ("have linked issues in progress", &actionable.in_progress),
    ];
    for (label, issues) in sections {
        if issues.is_empty() {
            continue;
        }
        out.push_str(&rule);
        out.push_str(&format!("   The following {} issues {label}\n", issues.len()));
        out.push_str(&rule);
        for issue in sorted_by_key(issues) {
            out.push_str(&format!(
                "[{}] {} - {}\n",
                issue.key,
                issue.summary,
                browse_url(base_url, &issue.key)
            ));
        }
        out.push_str(&rule);
    }
    out
}

pub fn render_assigned(issues: &[Issue], base_url: &str) -> String {
    issues
        .iter()
        .map(|issue| {
            format!(
                "- [{}] {} ({}) -- {}\n\t({})\n",
                issue.key,
                issue.summary,
                issue.issue_type,
                issue.status,
                browse_url(base_url, &issue.key)
            )
        })
        .collect()
}

/// One row per issue after the header; the writer is flushed before returning.
pub fn write_csv<W: io::Write>(
    writer: &mut csv::Writer<W>,
    issues: &[Issue],
    base_url: &str,
) -> csv::Result<()> {
    writer.write_record(CSV_HEADER)?;
    for issue in issues {
        let link = browse_url(base_url, &issue.key);
        writer.write_record([
            issue.issue_type.as_str(),
            issue.key.as_str(),
            issue.summary.as_str(),
            issue.status.as_str(),
            issue.assignee_or_unassigned(),
            issue.reporter.as_deref().unwrap_or_default(),
            issue.created.as_deref().unwrap_or_default(),
            link.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn push_heading(out: &mut String, mode: RenderMode, level: usize, text: &str) {
    let heading = match mode {
        RenderMode::Markdown => format!("{} {text}\n\n", "#".repeat(level)),
        RenderMode::Wiki => format!("h{level}. {text}\n\n"),
    };
    out.push_str(&heading);
}

fn push_records<'a>(
    out: &mut String,
    mode: RenderMode,
    records: impl Iterator<Item = &'a IssueRecord>,
) {
    if mode == RenderMode::Wiki {
        out.push_str(WIKI_TABLE_HEADER);
        out.push('\n');
    }
    for record in records {
        out.push_str(&record.line);
        out.push('\n');
    }
}

fn sorted_by_key(issues: &[Issue]) -> Vec<&Issue> {
    let mut sorted = issues.iter().collect::<Vec<_>>();
    sorted.sort_by(|a, b| a.key.cmp(&b.key));
    sorted
}
