use std::{
    num::NonZeroUsize,
    sync::{
        atomic::{AtomicUsize, Ordering},
        mpsc,
    },
    thread,
};

use tracing::{debug, info, warn};

use crate::{
    error::ReportError,
    jql::open_issues_jql,
    model::{Issue, STATUS_IN_PROGRESS, STATUS_TO_DO, STATUS_WORK_IN_PROGRESS},
    source::IssueSource,
};

/// Row cap for the open-issue search; larger projects are truncated.
pub const DEFAULT_OPEN_ISSUE_LIMIT: usize = 999;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockingOptions {
    pub open_issue_limit: usize,
    pub workers: usize,
}

impl Default for BlockingOptions {
    fn default() -> Self {
        Self {
            open_issue_limit: DEFAULT_OPEN_ISSUE_LIMIT,
            workers: default_workers(),
        }
    }
}

pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(4)
}

/// Open issues whose linked issues changed state in an actionable way.
/// Order within each list depends on worker scheduling.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActionableLinkedIssues {
    /// Every linked issue is past "To Do"/"In Progress".
    pub resolved: Vec<Issue>,
    /// A linked issue is "In Progress" while the issue itself has not started.
    pub in_progress: Vec<Issue>,
}

impl ActionableLinkedIssues {
    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty() && self.in_progress.is_empty()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LinkVerdict {
    pub resolved: bool,
    pub in_progress: bool,
}

/// Scans an issue's links once; both memberships come from the same pass.
pub fn evaluate_links(issue: &Issue) -> LinkVerdict {
    let mut linked = 0usize;
    let mut pending = false;
    let mut started = false;

    for target in issue.linked_issues() {
        linked += 1;
        debug!(
            issue = %issue.key,
            linked = %target.key,
            status = %target.status,
            "inspected linked issue"
        );
        if target.status == STATUS_IN_PROGRESS {
            started = true;
            pending = true;
        } else if target.status == STATUS_TO_DO {
            pending = true;
        }
    }

    let self_started = issue.status == STATUS_IN_PROGRESS || issue.status == STATUS_WORK_IN_PROGRESS;
    LinkVerdict {
        resolved: linked > 0 && !pending,
        in_progress: linked > 0 && started && !self_started,
    }
}

/// Classifies every unresolved issue of a project by the state of its links.
///
/// Only the initial search can fail; link data arrives embedded in it.
pub fn resolve_blocking_status<S>(
    source: &S,
    project_key: &str,
    options: &BlockingOptions,
) -> Result<ActionableLinkedIssues, ReportError>
where
    S: IssueSource + ?Sized,
{
    let jql = open_issues_jql(project_key);
    let page = source.search(&jql, 0, options.open_issue_limit)?;
    if page.total > page.issues.len() {
        warn!(
            project = project_key,
            total = page.total,
            fetched = page.issues.len(),
            "open issue search truncated"
        );
    }
    info!(
        project = project_key,
        open = page.issues.len(),
        workers = options.workers,
        "checking linked issues"
    );

    Ok(classify_concurrently(page.issues, options.workers))
}

pub fn classify_concurrently(issues: Vec<Issue>, workers: usize) -> ActionableLinkedIssues {
    fan_out(issues, workers, evaluate_links)
}

/// Runs `evaluate` once per issue on a pool of scoped workers and merges the
/// verdicts through a channel. Returns only after every issue is classified.
fn fan_out<F>(issues: Vec<Issue>, workers: usize, evaluate: F) -> ActionableLinkedIssues
where
    F: Fn(&Issue) -> LinkVerdict + Sync,
{
    let mut actionable = ActionableLinkedIssues::default();
    if issues.is_empty() {
        return actionable;
    }

    let workers = workers.clamp(1, issues.len());
    let next = AtomicUsize::new(0);
    let (verdict_tx, verdict_rx) = mpsc::channel::<(usize, LinkVerdict)>();
    let mut classified = 0usize;

    thread::scope(|scope| {
        for _ in 0..workers {
            let verdict_tx = verdict_tx.clone();
            let (issues, next, evaluate) = (&issues, &next, &evaluate);
            scope.spawn(move || loop {
                let index = next.fetch_add(1, Ordering::Relaxed);
                let Some(issue) = issues.get(index) else {
                    break;
                };
                if verdict_tx.send((index, evaluate(issue))).is_err() {
                    break;
                }
            });
        }
        drop(verdict_tx);

        // Ends once every worker has dropped its sender.
        for (index, verdict) in verdict_rx {
            classified += 1;
            if verdict.resolved {
                actionable.resolved.push(issues[index].clone());
            }
            if verdict.in_progress {
                actionable.in_progress.push(issues[index].clone());
            }
        }
    });

    debug!(
        classified,
        resolved = actionable.resolved.len(),
        in_progress = actionable.in_progress.len(),
        "linked issue check complete"
    );
    actionable
}
