use std::{fmt, str::FromStr};

pub const STATUS_TO_DO: &str = "To Do";
pub const STATUS_IN_PROGRESS: &str = "In Progress";
pub const STATUS_WORK_IN_PROGRESS: &str = "Work in progress";

/// Snapshot of a tracked work item as returned by the issue source.
///
/// Never mutated after fetch; derived state lives in wrapper records such as
/// [`IssueRecord`](crate::IssueRecord).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Issue {
    pub key: String,
    pub issue_type: String,
    pub status: String,
    pub summary: String,
    pub assignee: Option<String>,
    pub reporter: Option<String>,
    pub created: Option<String>,
    pub labels: Vec<String>,
    pub links: Vec<IssueLink>,
}

impl Issue {
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|value| value == label)
    }

    /// Linked issues from both link directions, flattened.
    pub fn linked_issues(&self) -> impl Iterator<Item = &Issue> {
        self.links.iter().map(|link| &link.issue)
    }

    pub fn assignee_or_unassigned(&self) -> &str {
        self.assignee.as_deref().unwrap_or("Unassigned")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkDirection {
    Inward,
    Outward,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssueLink {
    pub direction: LinkDirection,
    /// Relation label as seen from the owning issue, e.g. "is blocked by".
    pub relation: String,
    pub issue: Issue,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    pub id: u64,
    pub name: String,
    pub board_type: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SprintState {
    Active,
    Closed,
    Future,
}

impl SprintState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Closed => "closed",
            Self::Future => "future",
        }
    }
}

impl fmt::Display for SprintState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SprintState {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "closed" => Ok(Self::Closed),
            "future" => Ok(Self::Future),
            other => Err(format!("unknown sprint state '{other}'")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sprint {
    pub id: u64,
    pub name: String,
    pub state: SprintState,
}

/// One page of a search, with the envelope fields the pager needs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchPage {
    pub issues: Vec<Issue>,
    pub start_at: usize,
    pub max_results: usize,
    pub total: usize,
}

/// Distinct issue type names in order of first appearance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IssueTypes(Vec<String>);

impl IssueTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the name was not seen before.
    pub fn insert(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.0.push(name.to_string());
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|value| value == name)
    }

    pub fn extend_from(&mut self, other: &IssueTypes) {
        for name in other.iter() {
            self.insert(name);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> FromIterator<&'a str> for IssueTypes {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        let mut types = Self::new();
        for name in iter {
            types.insert(name);
        }
        types
    }
}
