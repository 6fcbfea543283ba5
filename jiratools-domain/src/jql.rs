//! JQL strings used by the reports.

/// A conjunction of clauses with an optional ordering, rendered on demand so
/// extra filters always land before `ORDER BY`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Jql {
    clauses: Vec<String>,
    order_by: Option<String>,
}

impl Jql {
    pub fn new(clause: impl Into<String>) -> Self {
        Self {
            clauses: vec![clause.into()],
            order_by: None,
        }
    }

    pub fn and(mut self, clause: impl Into<String>) -> Self {
        self.clauses.push(clause.into());
        self
    }

    pub fn order_by(mut self, order: impl Into<String>) -> Self {
        self.order_by = Some(order.into());
        self
    }

    pub fn render(&self) -> String {
        let mut jql = self.clauses.join(" AND ");
        if let Some(order) = self.order_by.as_deref() {
            jql.push_str(" ORDER BY ");
            jql.push_str(order);
        }
        jql
    }
}

pub fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

pub fn open_issues_jql(project_key: &str) -> String {
    Jql::new(format!("project={project_key}"))
        .and("resolved is EMPTY")
        .render()
}

/// Unresolved issues of the current user, narrowed by an include list or,
/// failing that, an exclude list.
pub fn assigned_issues_jql(include: &[String], exclude: &[String]) -> String {
    let mut jql = Jql::new("assignee = currentUser()").and("resolution IS EMPTY");
    if !include.is_empty() {
        jql = jql.and(format!("project in ({})", include.join(",")));
    } else if !exclude.is_empty() {
        jql = jql.and(format!("project NOT in ({})", exclude.join(",")));
    }
    jql.render()
}

/// Issues created in the last `days` days, newest first; `days <= 0` means all.
pub fn recent_issues_jql(project_key: &str, days: i64) -> String {
    let mut jql = Jql::new(format!("project={project_key}"));
    if days > 0 {
        jql = jql.and(format!("createdDate > startOfDay(-{days}d)"));
    }
    jql.order_by("createdDate DESC").render()
}

pub fn fix_version_jql(projects: &[String], fix_version: &str) -> Jql {
    Jql::new(format!("project in ({})", projects.join(",")))
        .and(format!("fixVersion = {}", quote(fix_version)))
        .order_by("issuetype ASC, key ASC")
}
