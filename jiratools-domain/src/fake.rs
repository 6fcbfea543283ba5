//! In-memory issue source used by the unit tests of this crate.

use std::{collections::HashMap, sync::Mutex};

use crate::{
    error::SourceError,
    model::{Board, Issue, IssueLink, LinkDirection, SearchPage, Sprint, SprintState},
    source::IssueSource,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchCall {
    pub jql: String,
    pub start_at: usize,
    pub page_size: usize,
}

#[derive(Default)]
pub struct FakeSource {
    pub searches: HashMap<String, Vec<Issue>>,
    pub boards: HashMap<String, Vec<Board>>,
    pub sprints: HashMap<(u64, SprintState), Vec<Sprint>>,
    pub sprint_issues: HashMap<u64, Vec<Issue>>,
    pub fail_search: bool,
    pub calls: Mutex<Vec<SearchCall>>,
}

impl FakeSource {
    pub fn with_search(mut self, jql: &str, issues: Vec<Issue>) -> Self {
        self.searches.insert(jql.to_string(), issues);
        self
    }

    pub fn with_board(mut self, project: &str, id: u64) -> Self {
        self.boards.entry(project.to_string()).or_default().push(Board {
            id,
            name: format!("{project} board"),
            board_type: Some("scrum".to_string()),
        });
        self
    }

    pub fn with_sprints(mut self, board_id: u64, state: SprintState, names: &[&str]) -> Self {
        let sprints = names
            .iter()
            .enumerate()
            .map(|(index, name)| Sprint {
                id: board_id * 100 + index as u64,
                name: name.to_string(),
                state,
            })
            .collect();
        self.sprints.insert((board_id, state), sprints);
        self
    }

    pub fn with_sprint_issues(mut self, sprint_id: u64, issues: Vec<Issue>) -> Self {
        self.sprint_issues.insert(sprint_id, issues);
        self
    }

    pub fn search_calls(&self) -> Vec<SearchCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

impl IssueSource for FakeSource {
    fn search(
        &self,
        jql: &str,
        start_at: usize,
        page_size: usize,
    ) -> Result<SearchPage, SourceError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(SearchCall {
                jql: jql.to_string(),
                start_at,
                page_size,
            });
        }
        if self.fail_search {
            return Err(SourceError::msg("search failed: status=500"));
        }

        let all = self.searches.get(jql).cloned().unwrap_or_default();
        let issues = all.iter().skip(start_at).take(page_size).cloned().collect();
        Ok(SearchPage {
            issues,
            start_at,
            max_results: page_size,
            total: all.len(),
        })
    }

    fn list_boards(&self, project_key: &str) -> Result<Vec<Board>, SourceError> {
        Ok(self.boards.get(project_key).cloned().unwrap_or_default())
    }

    fn list_sprints(&self, board_id: u64, state: SprintState) -> Result<Vec<Sprint>, SourceError> {
        Ok(self
            .sprints
            .get(&(board_id, state))
            .cloned()
            .unwrap_or_default())
    }

    fn issues_for_sprint(&self, sprint_id: u64) -> Result<Vec<Issue>, SourceError> {
        self.sprint_issues
            .get(&sprint_id)
            .cloned()
            .ok_or_else(|| SourceError::msg(format!("sprint {sprint_id} not found")))
    }
}

pub fn issue(key: &str, status: &str) -> Issue {
    Issue {
        key: key.to_string(),
        issue_type: "Task".to_string(),
        status: status.to_string(),
        summary: format!("Summary of {key}"),
        ..Issue::default()
    }
}

pub fn typed(key: &str, issue_type: &str, status: &str) -> Issue {
    Issue {
        issue_type: issue_type.to_string(),
        ..issue(key, status)
    }
}

pub fn linked_to(mut owner: Issue, linked: &[Issue]) -> Issue {
    for (index, target) in linked.iter().enumerate() {
        let direction = if index % 2 == 0 {
            LinkDirection::Outward
        } else {
            LinkDirection::Inward
        };
        owner.links.push(IssueLink {
            direction,
            relation: "blocks".to_string(),
            issue: target.clone(),
        });
    }
    owner
}

pub fn numbered(prefix: &str, count: usize) -> Vec<Issue> {
    (1..=count)
        .map(|index| issue(&format!("{prefix}-{index}"), "Done"))
        .collect()
}
