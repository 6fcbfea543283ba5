use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use jiratools_config::ToolsConfig;
use jiratools_domain::{
    collect_pages, Board, Issue, IssueLink, IssueSource, LinkDirection, SearchPage, SourceError,
    Sprint, SprintState,
};
use reqwest::blocking::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::debug;

const REQUEST_TIMEOUT_SECS: u64 = 30;
const AGILE_PAGE_SIZE: usize = 50;
const ISSUE_FIELDS: [&str; 8] = [
    "summary",
    "status",
    "issuetype",
    "assignee",
    "reporter",
    "created",
    "labels",
    "issuelinks",
];

#[derive(Clone, Debug, PartialEq, Eq)]
enum AuthMode {
    Basic { user: String, password: String },
    Bearer { token: String },
}

/// Blocking Jira client; one instance is shared by every report.
pub struct JiraClient {
    api_version: String,
    server: String,
    http: Client,
    auth_mode: AuthMode,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchPayload {
    #[serde(default)]
    issues: Vec<IssuePayload>,
    #[serde(default)]
    start_at: usize,
    #[serde(default)]
    max_results: usize,
    #[serde(default)]
    total: usize,
}

#[derive(Deserialize)]
struct IssuePayload {
    key: String,
    #[serde(default)]
    fields: IssueFields,
}

#[derive(Default, Deserialize)]
struct IssueFields {
    summary: Option<String>,
    status: Option<NameLike>,
    issuetype: Option<NameLike>,
    assignee: Option<UserLike>,
    reporter: Option<UserLike>,
    created: Option<String>,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    issuelinks: Vec<IssueLinkPayload>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueLinkPayload {
    #[serde(rename = "type")]
    link_type: Option<LinkTypePayload>,
    inward_issue: Option<IssuePayload>,
    outward_issue: Option<IssuePayload>,
}

#[derive(Default, Deserialize)]
struct LinkTypePayload {
    name: Option<String>,
    inward: Option<String>,
    outward: Option<String>,
}

#[derive(Default, Deserialize)]
struct NameLike {
    name: Option<String>,
}

#[derive(Default, Deserialize)]
struct UserLike {
    #[serde(rename = "displayName")]
    display_name: Option<String>,
    name: Option<String>,
    #[serde(rename = "emailAddress")]
    email_address: Option<String>,
}

/// Agile API list envelope (`/board`, `/board/{id}/sprint`).
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValuesPayload<T> {
    #[serde(default = "Vec::new")]
    values: Vec<T>,
    #[serde(default = "default_is_last")]
    is_last: bool,
}

#[derive(Deserialize)]
struct BoardPayload {
    id: u64,
    name: Option<String>,
    #[serde(rename = "type")]
    board_type: Option<String>,
}

#[derive(Deserialize)]
struct SprintPayload {
    id: u64,
    name: Option<String>,
    state: Option<String>,
}

impl JiraClient {
    pub fn from_config(config: &ToolsConfig) -> Result<Self> {
        let server = config
            .jira_server
            .as_deref()
            .ok_or_else(|| anyhow!("jira_server not configured"))?;
        let auth_mode = parse_auth_mode(config)?;

        let http = Client::builder()
            .danger_accept_invalid_certs(config.insecure)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .with_context(|| "failed to build Jira HTTP client")?;

        Ok(Self {
            api_version: config.api_version().to_string(),
            server: server.to_string(),
            http,
            auth_mode,
        })
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    fn search_page(&self, jql: &str, start_at: usize, max_results: usize) -> Result<SearchPage> {
        let endpoint = format!("{}/{}", self.api_base(), self.search_endpoint());
        let payload: SearchPayload = self.get_json(
            self.http.get(endpoint).query(&[
                ("jql", jql.to_string()),
                ("startAt", start_at.to_string()),
                ("maxResults", max_results.to_string()),
                ("fields", ISSUE_FIELDS.join(",")),
            ]),
            "search",
        )?;
        Ok(into_search_page(payload))
    }

    fn boards(&self, project_key: &str) -> Result<Vec<Board>> {
        let endpoint = format!("{}/board", self.agile_base());
        let boards = collect_values(|start_at| {
            self.get_json::<ValuesPayload<BoardPayload>>(
                self.http.get(&endpoint).query(&[
                    ("projectKeyOrId", project_key.to_string()),
                    ("startAt", start_at.to_string()),
                    ("maxResults", AGILE_PAGE_SIZE.to_string()),
                ]),
                "board list",
            )
        })?;
        Ok(boards.into_iter().map(into_board).collect())
    }

    fn sprints(&self, board_id: u64, state: SprintState) -> Result<Vec<Sprint>> {
        let endpoint = format!("{}/board/{board_id}/sprint", self.agile_base());
        let sprints = collect_values(|start_at| {
            self.get_json::<ValuesPayload<SprintPayload>>(
                self.http.get(&endpoint).query(&[
                    ("state", state.as_str().to_string()),
                    ("startAt", start_at.to_string()),
                    ("maxResults", AGILE_PAGE_SIZE.to_string()),
                ]),
                "sprint list",
            )
        })?;
        sprints
            .into_iter()
            .map(|payload| into_sprint(payload, state))
            .collect()
    }

    fn sprint_issues_page(
        &self,
        sprint_id: u64,
        start_at: usize,
        max_results: usize,
    ) -> Result<SearchPage> {
        let endpoint = format!("{}/sprint/{sprint_id}/issue", self.agile_base());
        let payload: SearchPayload = self.get_json(
            self.http.get(endpoint).query(&[
                ("startAt", start_at.to_string()),
                ("maxResults", max_results.to_string()),
                ("fields", ISSUE_FIELDS.join(",")),
            ]),
            "sprint issue list",
        )?;
        Ok(into_search_page(payload))
    }

    fn get_json<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let response = self
            .with_auth(request)
            .send()
            .with_context(|| format!("failed to execute Jira {what} request"))?;
        debug!(request = what, url = %response.url(), status = %response.status(), "jira response");

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            bail!("jira {what} request failed: status={status} body={body}");
        }

        response
            .json()
            .with_context(|| format!("failed to decode Jira {what} response"))
    }

    fn api_base(&self) -> String {
        format!("{}/rest/api/{}", self.server, self.api_version)
    }

    fn agile_base(&self) -> String {
        format!("{}/rest/agile/1.0", self.server)
    }

    fn search_endpoint(&self) -> &str {
        if self.api_version == "3" {
            "search/jql"
        } else {
            "search"
        }
    }

    fn with_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_mode {
            AuthMode::Basic { user, password } => request.basic_auth(user, Some(password)),
            AuthMode::Bearer { token } => request.bearer_auth(token),
        }
    }
}

impl IssueSource for JiraClient {
    fn search(
        &self,
        jql: &str,
        start_at: usize,
        page_size: usize,
    ) -> Result<SearchPage, SourceError> {
        Ok(self.search_page(jql, start_at, page_size)?)
    }

    fn list_boards(&self, project_key: &str) -> Result<Vec<Board>, SourceError> {
        Ok(self.boards(project_key)?)
    }

    fn list_sprints(&self, board_id: u64, state: SprintState) -> Result<Vec<Sprint>, SourceError> {
        Ok(self.sprints(board_id, state)?)
    }

    fn issues_for_sprint(&self, sprint_id: u64) -> Result<Vec<Issue>, SourceError> {
        collect_pages(AGILE_PAGE_SIZE, |start_at, page_size| {
            Ok(self.sprint_issues_page(sprint_id, start_at, page_size)?)
        })
    }
}

fn default_is_last() -> bool {
    true
}

/// Follows `isLast` through an Agile list endpoint, advancing by the number
/// of values each page returned.
fn collect_values<T, F>(mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(usize) -> Result<ValuesPayload<T>>,
{
    let mut values = Vec::new();
    loop {
        let page = fetch(values.len())?;
        let returned = page.values.len();
        values.extend(page.values);
        if page.is_last || returned == 0 {
            break;
        }
    }
    Ok(values)
}

fn parse_auth_mode(config: &ToolsConfig) -> Result<AuthMode> {
    let secret = config
        .jira_password
        .as_deref()
        .ok_or_else(|| anyhow!("jira_password not configured"))?;

    match config.auth_method() {
        "basic" => {
            let user = config
                .jira_user
                .as_deref()
                .ok_or_else(|| anyhow!("jira_user not configured for basic auth"))?;
            Ok(AuthMode::Basic {
                user: user.to_string(),
                password: secret.to_string(),
            })
        }
        "bearer" => Ok(AuthMode::Bearer {
            token: secret.to_string(),
        }),
        other => bail!("unsupported auth method '{}'", other),
    }
}

fn into_search_page(payload: SearchPayload) -> SearchPage {
    SearchPage {
        issues: payload.issues.into_iter().map(into_issue).collect(),
        start_at: payload.start_at,
        max_results: payload.max_results,
        total: payload.total,
    }
}

fn into_issue(payload: IssuePayload) -> Issue {
    let fields = payload.fields;
    Issue {
        key: payload.key,
        issue_type: fields
            .issuetype
            .and_then(name_like)
            .unwrap_or_else(|| "Unknown".to_string()),
        status: fields
            .status
            .and_then(name_like)
            .unwrap_or_else(|| "Unknown".to_string()),
        summary: fields
            .summary
            .and_then(non_empty)
            .unwrap_or_else(|| "<no summary>".to_string()),
        assignee: fields.assignee.and_then(display_name_like),
        reporter: fields.reporter.and_then(display_name_like),
        created: fields.created.and_then(non_empty),
        labels: fields.labels.into_iter().filter_map(non_empty).collect(),
        links: fields.issuelinks.into_iter().flat_map(into_links).collect(),
    }
}

/// A link row names the other issue on exactly one side; both are read in case
/// a payload carries both.
fn into_links(payload: IssueLinkPayload) -> Vec<IssueLink> {
    let link_type = payload.link_type.unwrap_or_default();
    let name = link_type.name.and_then(non_empty);
    let mut links = Vec::new();

    if let Some(issue) = payload.outward_issue {
        links.push(IssueLink {
            direction: LinkDirection::Outward,
            relation: link_type
                .outward
                .and_then(non_empty)
                .or_else(|| name.clone())
                .unwrap_or_default(),
            issue: into_issue(issue),
        });
    }
    if let Some(issue) = payload.inward_issue {
        links.push(IssueLink {
            direction: LinkDirection::Inward,
            relation: link_type
                .inward
                .and_then(non_empty)
                .or(name)
                .unwrap_or_default(),
            issue: into_issue(issue),
        });
    }
    links
}

fn into_board(payload: BoardPayload) -> Board {
    Board {
        id: payload.id,
        name: payload
            .name
            .and_then(non_empty)
            .unwrap_or_else(|| format!("board {}", payload.id)),
        board_type: payload.board_type.and_then(non_empty),
    }
}

fn into_sprint(payload: SprintPayload, requested: SprintState) -> Result<Sprint> {
    let state = match payload.state.as_deref() {
        Some(value) => value
            .parse::<SprintState>()
            .map_err(|error| anyhow!("sprint {}: {error}", payload.id))?,
        None => requested,
    };
    Ok(Sprint {
        id: payload.id,
        name: payload
            .name
            .and_then(non_empty)
            .unwrap_or_else(|| format!("Sprint {}", payload.id)),
        state,
    })
}

fn name_like(value: NameLike) -> Option<String> {
    value.name.and_then(non_empty)
}

fn display_name_like(value: UserLike) -> Option<String> {
    value
        .display_name
        .or(value.name)
        .or(value.email_address)
        .and_then(non_empty)
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use jiratools_config::ToolsConfig;
    use jiratools_domain::{LinkDirection, SprintState};
    use serde_json::json;

    use super::{
        collect_values, into_board, into_search_page, into_sprint, parse_auth_mode, AuthMode,
        BoardPayload, JiraClient, SearchPayload, SprintPayload, ValuesPayload,
    };

    fn client(api_version: &str) -> JiraClient {
        JiraClient {
            api_version: api_version.to_string(),
            server: "https://jira.example.com".to_string(),
            http: reqwest::blocking::Client::new(),
            auth_mode: AuthMode::Bearer {
                token: "x".to_string(),
            },
        }
    }

    #[test]
    fn chooses_endpoints_for_api_versions() {
        assert_eq!(client("2").search_endpoint(), "search");
        assert_eq!(client("3").search_endpoint(), "search/jql");
        assert_eq!(client("3").api_base(), "https://jira.example.com/rest/api/3");
        assert_eq!(
            client("2").agile_base(),
            "https://jira.example.com/rest/agile/1.0"
        );
    }

    #[test]
    fn maps_search_page_with_embedded_links() {
        let payload: SearchPayload = serde_json::from_value(json!({
            "startAt": 0,
            "maxResults": 50,
            "total": 1,
            "issues": [{
                "key": "DEMO-1",
                "fields": {
                    "summary": " Ship it ",
                    "status": {"name": "To Do"},
                    "issuetype": {"name": "Story"},
                    "assignee": {"displayName": "Alice"},
                    "labels": ["release", " "],
                    "issuelinks": [
                        {
                            "type": {"name": "Blocks", "inward": "is blocked by", "outward": "blocks"},
                            "inwardIssue": {
                                "key": "OPS-4",
                                "fields": {"status": {"name": "In Progress"}, "summary": "Deploy"}
                            }
                        },
                        {
                            "type": {"name": "Relates"},
                            "outwardIssue": {"key": "OPS-5", "fields": {"status": {"name": "Done"}}}
                        }
                    ]
                }
            }]
        }))
        .expect("payload");

        let page = into_search_page(payload);
        assert_eq!(page.total, 1);
        assert_eq!(page.max_results, 50);

        let issue = &page.issues[0];
        assert_eq!(issue.summary, "Ship it");
        assert_eq!(issue.status, "To Do");
        assert_eq!(issue.issue_type, "Story");
        assert_eq!(issue.assignee.as_deref(), Some("Alice"));
        assert_eq!(issue.labels, vec!["release"]);
        assert_eq!(issue.links.len(), 2);
        assert_eq!(issue.links[0].direction, LinkDirection::Inward);
        assert_eq!(issue.links[0].relation, "is blocked by");
        assert_eq!(issue.links[0].issue.status, "In Progress");
        assert_eq!(issue.links[1].direction, LinkDirection::Outward);
        assert_eq!(issue.links[1].relation, "Relates");
        assert_eq!(issue.links[1].issue.summary, "<no summary>");
    }

    #[test]
    fn missing_envelope_fields_default_to_zero() {
        let payload: SearchPayload =
            serde_json::from_value(json!({"issues": []})).expect("payload");
        let page = into_search_page(payload);
        assert_eq!((page.start_at, page.max_results, page.total), (0, 0, 0));
    }

    #[test]
    fn maps_envelope_offsets() {
        let payload: SearchPayload = serde_json::from_value(json!({
            "issues": [],
            "startAt": 50,
            "maxResults": 50,
            "total": 120
        }))
        .expect("payload");
        let page = into_search_page(payload);
        assert_eq!((page.start_at, page.max_results, page.total), (50, 50, 120));
    }

    #[test]
    fn maps_board_and_sprint_payloads() {
        let board = into_board(BoardPayload {
            id: 12,
            name: None,
            board_type: Some("scrum".to_string()),
        });
        assert_eq!(board.name, "board 12");

        let sprint = into_sprint(
            SprintPayload {
                id: 3,
                name: Some("Sprint 3".to_string()),
                state: Some("CLOSED".to_string()),
            },
            SprintState::Active,
        )
        .expect("sprint");
        assert_eq!(sprint.state, SprintState::Closed);

        let defaulted = into_sprint(
            SprintPayload {
                id: 4,
                name: None,
                state: None,
            },
            SprintState::Active,
        )
        .expect("sprint");
        assert_eq!(defaulted.state, SprintState::Active);
        assert_eq!(defaulted.name, "Sprint 4");
    }

    #[test]
    fn follows_is_last_across_pages() {
        let mut starts = Vec::new();
        let values = collect_values(|start_at| {
            starts.push(start_at);
            Ok(ValuesPayload {
                values: vec![start_at, start_at + 1],
                is_last: start_at >= 2,
            })
        })
        .expect("values");

        assert_eq!(values, vec![0, 1, 2, 3]);
        assert_eq!(starts, vec![0, 2]);
    }

    #[test]
    fn agile_list_errors_propagate() {
        let result = collect_values::<u64, _>(|_| Err(anyhow!("status=401")));
        assert!(result.is_err());
    }

    #[test]
    fn values_envelope_without_is_last_is_final() {
        let payload: ValuesPayload<BoardPayload> =
            serde_json::from_value(json!({"values": [{"id": 1, "name": "Team"}]}))
                .expect("payload");
        assert!(payload.is_last);
        assert_eq!(payload.values.len(), 1);
    }

    #[test]
    fn basic_auth_requires_user() {
        let config = ToolsConfig {
            jira_server: Some("https://jira.example.com".to_string()),
            jira_password: Some("secret".to_string()),
            auth_method: Some("basic".to_string()),
            ..ToolsConfig::default()
        };
        let error = parse_auth_mode(&config).expect_err("missing user");
        assert!(error.to_string().contains("jira_user"));

        let bearer = ToolsConfig {
            auth_method: None,
            ..config
        };
        assert_eq!(
            parse_auth_mode(&bearer).expect("auth"),
            AuthMode::Bearer {
                token: "secret".to_string()
            }
        );
    }
}
