use std::{
    env, fs,
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tracing::debug;

const DEFAULT_PAGE_SIZE: usize = 100;
const DEFAULT_OPEN_ISSUE_LIMIT: usize = 999;

pub const CONFIG_FILE_ENV: &str = "JIRATOOLS_CONFIG_FILE";
pub const URL_ENV: &str = "JIRA_URL";
pub const USERNAME_ENV: &str = "JIRA_USERNAME";
pub const API_KEY_ENV: &str = "JIRA_API_KEY";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportSettings {
    pub page_size: usize,
    /// `None` lets the resolver size its pool from available parallelism.
    pub workers: Option<usize>,
    pub open_issue_limit: usize,
    pub release_label: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            workers: None,
            open_issue_limit: DEFAULT_OPEN_ISSUE_LIMIT,
            release_label: String::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolsConfig {
    pub jira_server: Option<String>,
    pub jira_user: Option<String>,
    pub jira_password: Option<String>,
    pub api_version: Option<String>,
    pub auth_method: Option<String>,
    pub insecure: bool,
    pub reports: ReportSettings,
}

#[derive(Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    general: RawGeneral,
    #[serde(default)]
    reports: RawReports,
    jira_server: Option<String>,
    jira_user: Option<String>,
    jira_password: Option<String>,
    api_version: Option<String>,
    auth_method: Option<String>,
    insecure: Option<bool>,
}

#[derive(Default, Deserialize)]
struct RawGeneral {
    jira_server: Option<String>,
    jira_user: Option<String>,
    jira_password: Option<String>,
    api_version: Option<String>,
    auth_method: Option<String>,
    insecure: Option<bool>,
}

#[derive(Default, Deserialize)]
struct RawReports {
    page_size: Option<usize>,
    workers: Option<usize>,
    open_issue_limit: Option<usize>,
    release_label: Option<String>,
}

impl ToolsConfig {
    /// Loads the default config file (if any) and applies environment overrides.
    pub fn load_default() -> Result<Self> {
        Self::load(None)
    }

    /// An explicit path must exist; the default path is optional as long as the
    /// environment names a server.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_path(path)?,
            None => {
                let path = default_config_path();
                if path.exists() {
                    Self::load_from_path(&path)?
                } else {
                    debug!(path = %path.display(), "no config file, using environment only");
                    Self::from_raw(RawConfig::default())
                }
            }
        };
        config.apply_env_overrides(|key| env::var(key).ok());

        if config.jira_server.is_none() {
            return Err(anyhow!(
                "jira_server not configured (set it in the config file or {URL_ENV})"
            ));
        }
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let payload = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let raw: RawConfig =
            serde_yaml::from_str(&payload).with_context(|| "invalid YAML config format")?;
        Ok(Self::from_raw(raw))
    }

    pub fn api_version(&self) -> &str {
        match self.api_version.as_deref() {
            Some("3") => "3",
            _ => "2",
        }
    }

    pub fn auth_method(&self) -> &str {
        let requested = self
            .auth_method
            .as_deref()
            .map(|value| value.trim().to_ascii_lowercase());
        match requested.as_deref() {
            Some("basic") => "basic",
            Some("bearer") => "bearer",
            _ if self.api_version() == "3" => "basic",
            _ => "bearer",
        }
    }

    /// Server URL without a trailing slash, or an empty string.
    pub fn base_url(&self) -> &str {
        self.jira_server.as_deref().unwrap_or_default()
    }

    fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(server) = lookup(URL_ENV).and_then(normalize_jira_server) {
            self.jira_server = Some(server);
        }
        if let Some(user) = lookup(USERNAME_ENV).and_then(non_empty) {
            self.jira_user = Some(user);
        }
        if let Some(secret) = lookup(API_KEY_ENV).and_then(resolve_jira_password) {
            self.jira_password = Some(secret);
        }
    }

    fn from_raw(raw: RawConfig) -> Self {
        let reports = ReportSettings {
            page_size: raw
                .reports
                .page_size
                .filter(|size| *size > 0)
                .unwrap_or(DEFAULT_PAGE_SIZE),
            workers: raw.reports.workers.filter(|count| *count > 0),
            open_issue_limit: raw
                .reports
                .open_issue_limit
                .filter(|limit| *limit > 0)
                .unwrap_or(DEFAULT_OPEN_ISSUE_LIMIT),
            release_label: raw
                .reports
                .release_label
                .and_then(non_empty)
                .unwrap_or_default(),
        };

        Self {
            jira_server: raw
                .general
                .jira_server
                .or(raw.jira_server)
                .and_then(normalize_jira_server),
            jira_user: raw.general.jira_user.or(raw.jira_user).and_then(non_empty),
            jira_password: raw
                .general
                .jira_password
                .or(raw.jira_password)
                .and_then(resolve_jira_password),
            api_version: raw
                .general
                .api_version
                .or(raw.api_version)
                .and_then(non_empty),
            auth_method: raw
                .general
                .auth_method
                .or(raw.auth_method)
                .and_then(non_empty),
            insecure: raw.general.insecure.or(raw.insecure).unwrap_or(false),
            reports,
        }
    }
}

pub fn default_config_path() -> PathBuf {
    if let Some(override_path) = env::var_os(CONFIG_FILE_ENV) {
        return PathBuf::from(override_path);
    }

    let mut base = env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    base.push(".config");
    base.push("jiratools");
    base.push("config.yaml");
    base
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

fn normalize_jira_server(value: String) -> Option<String> {
    let trimmed = non_empty(value)?;
    let trimmed = trimmed.trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Some(trimmed.to_string())
    } else {
        Some(format!("https://{trimmed}"))
    }
}

fn resolve_jira_password(value: String) -> Option<String> {
    resolve_jira_password_with(value, fetch_secret_from_manager)
}

/// Plain secrets pass through; `pass::key` / `passage::key` are looked up.
fn resolve_jira_password_with<F>(value: String, fetch: F) -> Option<String>
where
    F: Fn(&str, &str) -> Option<String>,
{
    let password = non_empty(value)?;
    match parse_secret_reference(&password) {
        Some((provider, key)) => fetch(provider, key),
        None => Some(password),
    }
}

fn parse_secret_reference(value: &str) -> Option<(&str, &str)> {
    let (provider, key) = value.split_once("::")?;
    let key = key.trim();
    if key.is_empty() || !matches!(provider, "pass" | "passage") {
        return None;
    }
    Some((provider, key))
}

fn fetch_secret_from_manager(provider: &str, key: &str) -> Option<String> {
    let output = Command::new(provider).arg("show").arg(key).output().ok()?;
    if !output.status.success() {
        debug!(provider, key, "secret lookup failed");
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    // pass keeps metadata below the first line.
    stdout.lines().next().map(str::to_string).and_then(non_empty)
}
