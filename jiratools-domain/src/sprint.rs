use tracing::{debug, info, warn};

use crate::{
    annotate::{annotate_all, AnnotateOptions, IssueRecord},
    classify::classify,
    error::ReportError,
    model::{IssueTypes, Sprint, SprintState},
    source::IssueSource,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SprintReportOptions {
    pub state: SprintState,
    /// 0 selects the most recent sprint in `state`.
    pub look_back: usize,
    pub annotate: AnnotateOptions,
}

impl Default for SprintReportOptions {
    fn default() -> Self {
        Self {
            state: SprintState::Closed,
            look_back: 0,
            annotate: AnnotateOptions::default(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SprintData {
    pub name: String,
    pub completed: Vec<IssueRecord>,
    pub incomplete: Vec<IssueRecord>,
    pub types: IssueTypes,
}

impl SprintData {
    /// Concatenates the parts in order; types are unioned by first appearance.
    pub fn combine<'a>(name: String, parts: impl IntoIterator<Item = &'a SprintData>) -> Self {
        let mut combined = Self {
            name,
            ..Self::default()
        };
        for part in parts {
            combined.completed.extend(part.completed.iter().cloned());
            combined.incomplete.extend(part.incomplete.iter().cloned());
            combined.types.extend_from(&part.types);
        }
        combined
    }

    pub fn issue_count(&self) -> usize {
        self.completed.len() + self.incomplete.len()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SprintReports {
    pub per_project: Vec<SprintData>,
    pub combined: SprintData,
    /// Projects skipped because they have no board.
    pub skipped: Vec<String>,
}

/// Picks the sprint `look_back` positions before the newest one.
pub fn select_sprint(
    project_key: &str,
    sprints: &[Sprint],
    look_back: usize,
) -> Result<Sprint, ReportError> {
    let available = sprints.len();
    if available == 0 || look_back > available - 1 {
        return Err(ReportError::LookBackOutOfRange {
            project: project_key.to_string(),
            look_back,
            available,
        });
    }
    Ok(sprints[available - 1 - look_back].clone())
}

/// Resolves one project's board and sprint, then builds its [`SprintData`].
pub fn resolve_sprint<S>(
    source: &S,
    project_key: &str,
    options: &SprintReportOptions,
) -> Result<SprintData, ReportError>
where
    S: IssueSource + ?Sized,
{
    let boards = source.list_boards(project_key)?;
    // First listed board wins when several match.
    let Some(board) = boards.first() else {
        return Err(ReportError::NoBoardFound {
            project: project_key.to_string(),
        });
    };
    debug!(project = project_key, board_id = board.id, board = %board.name, "using board");

    let sprints = source.list_sprints(board.id, options.state)?;
    let sprint = select_sprint(project_key, &sprints, options.look_back)?;
    info!(
        project = project_key,
        sprint = %sprint.name,
        state = %options.state,
        look_back = options.look_back,
        "resolved sprint"
    );

    let issues = source.issues_for_sprint(sprint.id)?;
    let classified = classify(issues);

    Ok(SprintData {
        name: sprint.name,
        completed: annotate_all(classified.complete, &options.annotate),
        incomplete: annotate_all(classified.incomplete, &options.annotate),
        types: classified.types,
    })
}

/// Builds sprint data for every project; projects without a board are skipped,
/// every other failure aborts the run.
pub fn collect_sprint_reports<S>(
    source: &S,
    projects: &[String],
    options: &SprintReportOptions,
) -> Result<SprintReports, ReportError>
where
    S: IssueSource + ?Sized,
{
    if projects.is_empty() {
        return Err(ReportError::InvalidOptions(
            "at least one project is required".to_string(),
        ));
    }

    let mut reports = SprintReports::default();
    for project in projects {
        match resolve_sprint(source, project, options) {
            Ok(data) => reports.per_project.push(data),
            Err(error) if error.is_recoverable() => {
                warn!(project = %project, %error, "skipping project");
                reports.skipped.push(project.clone());
            }
            Err(error) => return Err(error),
        }
    }

    reports.combined = SprintData::combine(
        format!("Combined Data for {} Projects", projects.join(",")),
        &reports.per_project,
    );
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::{
        collect_sprint_reports, resolve_sprint, select_sprint, SprintData, SprintReportOptions,
    };
    use crate::{
        error::ReportError,
        fake::{typed, FakeSource},
        model::{Sprint, SprintState},
    };

    fn ten_sprints() -> Vec<Sprint> {
        (0..10)
            .map(|index| Sprint {
                id: index,
                name: format!("S{index}"),
                state: SprintState::Closed,
            })
            .collect()
    }

    #[test]
    fn look_back_counts_from_newest_sprint() {
        let sprints = ten_sprints();

        assert_eq!(select_sprint("DEMO", &sprints, 0).expect("sprint").name, "S9");
        assert_eq!(select_sprint("DEMO", &sprints, 2).expect("sprint").name, "S7");
        assert_eq!(select_sprint("DEMO", &sprints, 9).expect("sprint").name, "S0");

        let error = select_sprint("DEMO", &sprints, 10).expect_err("out of range");
        assert!(matches!(
            error,
            ReportError::LookBackOutOfRange {
                look_back: 10,
                available: 10,
                ..
            }
        ));
    }

    #[test]
    fn no_sprints_is_out_of_range() {
        let error = select_sprint("DEMO", &[], 0).expect_err("out of range");
        assert!(matches!(error, ReportError::LookBackOutOfRange { available: 0, .. }));
        assert!(!error.is_recoverable());
    }

    fn demo_source() -> FakeSource {
        FakeSource::default()
            .with_board("DEMO", 7)
            .with_board("DEMO", 8)
            .with_sprints(7, SprintState::Closed, &["Sprint 1", "Sprint 2", "Sprint 3"])
            .with_sprints(7, SprintState::Active, &["Sprint 4"])
            .with_sprint_issues(
                702,
                vec![
                    typed("DEMO-1", "Story", "Done"),
                    typed("DEMO-2", "Bug", "To Do"),
                    typed("DEMO-3", "Story", "Closed"),
                ],
            )
            .with_sprint_issues(701, vec![typed("DEMO-9", "Task", "Done")])
            .with_sprint_issues(700, vec![typed("DEMO-10", "Epic", "In Progress")])
    }

    #[test]
    fn resolves_latest_closed_sprint_on_first_board() {
        let source = demo_source();

        let data = resolve_sprint(&source, "DEMO", &SprintReportOptions::default()).expect("data");

        assert_eq!(data.name, "Sprint 3");
        assert_eq!(data.completed.len(), 2);
        assert_eq!(data.incomplete.len(), 1);
        assert_eq!(data.incomplete[0].issue.key, "DEMO-2");
        assert_eq!(data.types.iter().collect::<Vec<_>>(), vec!["Story", "Bug"]);
    }

    #[test]
    fn honors_state_and_look_back() {
        let source = demo_source();
        let options = SprintReportOptions {
            look_back: 1,
            ..SprintReportOptions::default()
        };
        let data = resolve_sprint(&source, "DEMO", &options).expect("data");
        assert_eq!(data.name, "Sprint 2");

        let active = SprintReportOptions {
            state: SprintState::Active,
            look_back: 1,
            ..SprintReportOptions::default()
        };
        let error = resolve_sprint(&source, "DEMO", &active).expect_err("out of range");
        assert!(matches!(error, ReportError::LookBackOutOfRange { .. }));
    }

    #[test]
    fn skips_projects_without_board_and_combines_the_rest() {
        let source = demo_source()
            .with_board("OPS", 9)
            .with_sprints(9, SprintState::Closed, &["Ops 1"])
            .with_sprint_issues(
                900,
                vec![typed("OPS-1", "Incident", "Done"), typed("OPS-2", "Bug", "In Progress")],
            );
        let projects = vec!["DEMO".to_string(), "GHOST".to_string(), "OPS".to_string()];

        let reports =
            collect_sprint_reports(&source, &projects, &SprintReportOptions::default())
                .expect("reports");

        assert_eq!(reports.skipped, vec!["GHOST"]);
        assert_eq!(reports.per_project.len(), 2);
        assert_eq!(reports.combined.name, "Combined Data for DEMO,GHOST,OPS Projects");
        let completed = reports
            .combined
            .completed
            .iter()
            .map(|record| record.issue.key.as_str())
            .collect::<Vec<_>>();
        assert_eq!(completed, vec!["DEMO-1", "DEMO-3", "OPS-1"]);
        assert_eq!(reports.combined.incomplete.len(), 2);
        assert_eq!(
            reports.combined.types.iter().collect::<Vec<_>>(),
            vec!["Story", "Bug", "Incident"]
        );
    }

    #[test]
    fn look_back_failure_aborts_multi_project_run() {
        let source = demo_source();
        let options = SprintReportOptions {
            look_back: 5,
            ..SprintReportOptions::default()
        };

        let error = collect_sprint_reports(&source, &["DEMO".to_string()], &options)
            .expect_err("fatal");
        assert!(!error.is_recoverable());
    }

    #[test]
    fn rejects_empty_project_list() {
        let error = collect_sprint_reports(&FakeSource::default(), &[], &SprintReportOptions::default())
            .expect_err("invalid");
        assert!(matches!(error, ReportError::InvalidOptions(_)));
    }

    #[test]
    fn combine_of_nothing_is_empty() {
        let combined = SprintData::combine("empty".to_string(), &[]);
        assert_eq!(combined.issue_count(), 0);
        assert!(combined.types.is_empty());
    }
}
