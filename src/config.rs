use std::{env, path::PathBuf, time::Duration};

use anyhow::{Context, Result, anyhow};
use reqwest::Url;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_CSRF_COOKIE: &str = "csrftoken";
pub const DEFAULT_DISPLAY_LIMIT: usize = 5;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;
pub const DEFAULT_TOAST_MS: u64 = 5000;
pub const MAX_HISTORY_RETRIES: u32 = 3;
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;
pub const MAX_BACKUP_NAME_LEN: usize = 50;

/// Runtime settings for the console, read from the environment.
#[derive(Clone, Debug)]
pub struct ConsoleConfig {
    pub base_url: Url,
    pub csrf_cookie: String,
    pub session_cookie: Option<String>,
    pub page_size: usize,
    pub retry_base_delay: Duration,
    pub max_retries: u32,
    pub toast_duration: Duration,
    pub snapshot_path: Option<PathBuf>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            csrf_cookie: DEFAULT_CSRF_COOKIE.to_string(),
            session_cookie: None,
            page_size: DEFAULT_DISPLAY_LIMIT,
            retry_base_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            max_retries: MAX_HISTORY_RETRIES,
            toast_duration: Duration::from_millis(DEFAULT_TOAST_MS),
            snapshot_path: None,
        }
    }
}

impl ConsoleConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = ConsoleConfig::default();

        if let Some(raw) = non_empty(lookup("BACKUP_BASE_URL")) {
            config.base_url = parse_base_url(&raw)?;
        }

        if let Some(name) = non_empty(lookup("BACKUP_CSRF_COOKIE")) {
            config.csrf_cookie = name;
        }

        config.session_cookie = non_empty(lookup("BACKUP_SESSION_COOKIE"));

        if let Some(raw) = non_empty(lookup("BACKUP_PAGE_SIZE")) {
            let page_size: usize = raw
                .parse()
                .with_context(|| format!("BACKUP_PAGE_SIZE must be a number, got `{raw}`"))?;
            if page_size == 0 {
                return Err(anyhow!("BACKUP_PAGE_SIZE must be at least 1"));
            }
            config.page_size = page_size;
        }

        if let Some(raw) = non_empty(lookup("BACKUP_RETRY_DELAY_MS")) {
            let millis: u64 = raw
                .parse()
                .with_context(|| format!("BACKUP_RETRY_DELAY_MS must be a number, got `{raw}`"))?;
            config.retry_base_delay = Duration::from_millis(millis);
        }

        if let Some(raw) = non_empty(lookup("BACKUP_TOAST_MS")) {
            let millis: u64 = raw
                .parse()
                .with_context(|| format!("BACKUP_TOAST_MS must be a number, got `{raw}`"))?;
            config.toast_duration = Duration::from_millis(millis);
        }

        config.snapshot_path = non_empty(lookup("BACKUP_CONSOLE_SNAPSHOT")).map(PathBuf::from);

        Ok(config)
    }
}

/// Endpoints are resolved under the base path, so it always ends in `/`.
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw).with_context(|| format!("BACKUP_BASE_URL is not a valid URL: `{raw}`"))?;
    if url.cannot_be_a_base() {
        return Err(anyhow!("BACKUP_BASE_URL cannot be used as a base URL: `{raw}`"));
    }
    if !url.path().ends_with('/') {
        let dir = format!("{}/", url.path());
        url.set_path(&dir);
    }
    Ok(url)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
