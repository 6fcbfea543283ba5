use std::io::Write;

use anyhow::{Context, Result};
use jiratools_config::ToolsConfig;
use jiratools_domain::{
    collect_sprint_reports, default_workers, jql, release_notes, resolve_blocking_status,
    AnnotateOptions, BlockingOptions, IssueSource, ReleaseNotesOptions, RenderMode, SearchPager,
    SprintReportOptions, SprintState,
};
use tracing::{info, warn};

use crate::{
    cli_args::{MineArgs, ReleaseNotesArgs, ServicedeskArgs, UnblockedArgs},
    render::{render_actionable, render_assigned, render_release_notes, render_sprint, write_csv},
};

pub fn release_notes_command<S, W>(
    source: &S,
    config: &ToolsConfig,
    args: &ReleaseNotesArgs,
    out: &mut W,
) -> Result<()>
where
    S: IssueSource + ?Sized,
    W: Write,
{
    let mode = if args.markdown {
        RenderMode::Markdown
    } else {
        RenderMode::Wiki
    };
    // Sprint reports never filter, so only the fix-version path carries a filter label.
    let annotate = AnnotateOptions {
        release_label: args
            .release_label
            .clone()
            .unwrap_or_else(|| config.reports.release_label.clone()),
        filter_label: String::new(),
        mode,
        base_url: config.base_url().to_string(),
    };

    if let Some(fix_version) = args.fix_version.as_deref() {
        let options = ReleaseNotesOptions {
            projects: args.projects.clone(),
            fix_version: fix_version.to_string(),
            page_size: config.reports.page_size,
            annotate: AnnotateOptions {
                filter_label: args.filter_label.clone().unwrap_or_default(),
                ..annotate
            },
        };
        let notes = release_notes(source, &options)?;
        out.write_all(render_release_notes(&notes, mode).as_bytes())?;
        return Ok(());
    }

    let options = SprintReportOptions {
        state: if args.active {
            SprintState::Active
        } else {
            SprintState::Closed
        },
        look_back: args.look_back,
        annotate,
    };
    let reports = collect_sprint_reports(source, &args.projects, &options)?;
    if !reports.skipped.is_empty() {
        warn!(
            skipped = %reports.skipped.join(","),
            reported = reports.per_project.len(),
            "some projects were left out of the report"
        );
    }

    if args.separate {
        for data in &reports.per_project {
            out.write_all(render_sprint(data, mode).as_bytes())?;
        }
    } else {
        out.write_all(render_sprint(&reports.combined, mode).as_bytes())?;
    }
    Ok(())
}

pub fn unblocked_command<S, W>(
    source: &S,
    config: &ToolsConfig,
    args: &UnblockedArgs,
    out: &mut W,
) -> Result<()>
where
    S: IssueSource + ?Sized,
    W: Write,
{
    let options = BlockingOptions {
        open_issue_limit: config.reports.open_issue_limit,
        workers: args
            .workers
            .or(config.reports.workers)
            .unwrap_or_else(default_workers),
    };
    let actionable = resolve_blocking_status(source, &args.project, &options)?;
    info!(
        project = %args.project,
        resolved = actionable.resolved.len(),
        in_progress = actionable.in_progress.len(),
        "blocking status resolved"
    );
    out.write_all(render_actionable(&actionable, config.base_url()).as_bytes())?;
    Ok(())
}

pub fn servicedesk_command<S, W>(
    source: &S,
    config: &ToolsConfig,
    args: &ServicedeskArgs,
    out: &mut W,
) -> Result<()>
where
    S: IssueSource + ?Sized,
    W: Write,
{
    let query = jql::recent_issues_jql(&args.project, args.days);
    let issues = SearchPager::new(source, config.reports.page_size).fetch_all(&query)?;

    match args.output.as_deref() {
        Some(path) => {
            let mut writer = csv::Writer::from_path(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_csv(&mut writer, &issues, config.base_url())
                .with_context(|| format!("failed to write CSV to {}", path.display()))?;
            info!(path = %path.display(), rows = issues.len(), "wrote CSV");
        }
        None => write_csv(&mut csv::Writer::from_writer(out), &issues, config.base_url())?,
    }
    Ok(())
}

pub fn mine_command<S, W>(
    source: &S,
    config: &ToolsConfig,
    args: &MineArgs,
    out: &mut W,
) -> Result<()>
where
    S: IssueSource + ?Sized,
    W: Write,
{
    let query = jql::assigned_issues_jql(&args.include, &args.exclude);
    let issues = SearchPager::new(source, config.reports.page_size).fetch_all(&query)?;
    out.write_all(render_assigned(&issues, config.base_url()).as_bytes())?;
    Ok(())
}
