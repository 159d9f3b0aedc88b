pub mod classify;
pub mod csrf;
pub mod models;

use std::sync::Arc;

use reqwest::{
    Client, RequestBuilder, Response, Url,
    cookie::Jar,
    multipart::{Form, Part},
};
use tracing::{debug, warn};

use crate::{
    config::ConsoleConfig,
    error::{ConsoleError, ConsoleResult},
};

pub use csrf::CsrfTokenProvider;
pub use models::{
    ApiEnvelope, BackupRecord, CreateBackupRequest, OperationType, RestoreCategory, RestoreMode,
    RestoreSummary, SmartRestoreRequest,
};

pub const CSRF_HEADER: &str = "X-CSRFToken";
pub const REQUESTED_WITH_HEADER: &str = "X-Requested-With";
pub const REQUESTED_WITH: &str = "XMLHttpRequest";
pub const UPLOAD_FIELD: &str = "backup_file";

pub mod endpoints {
    use reqwest::Url;

    use crate::error::{ConsoleError, ConsoleResult};

    pub const CSRF_TOKEN: &str = "/backup/csrf-token/";
    pub const HISTORY: &str = "/backup/history/";
    pub const CREATE: &str = "/backup/create/";
    pub const RESTORE_UPLOAD: &str = "/backup/restore/";

    pub fn restore_from_history(id: i64) -> String {
        format!("/backup/restore-from-history/{id}/")
    }

    pub fn smart_restore(id: i64) -> String {
        format!("/backup/restore/history/{id}/")
    }

    pub fn delete(id: i64) -> String {
        format!("/backup/delete/{id}/")
    }

    /// Resolves `path` under the base URL's own path, so a console mounted
    /// at `https://host/school/` talks to `https://host/school/backup/...`.
    pub fn url(base: &Url, path: &str) -> ConsoleResult<Url> {
        let mut base = base.clone();
        if !base.path().ends_with('/') {
            let dir = format!("{}/", base.path());
            base.set_path(&dir);
        }

        base.join(path.trim_start_matches('/')).map_err(|err| {
            ConsoleError::transport(None, format!("invalid endpoint `{path}`: {err}"))
        })
    }
}

/// Outcome of a successful mutating call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionReply {
    pub message: Option<String>,
    pub summary: Option<RestoreSummary>,
}

/// Client for the server's backup endpoints.
#[derive(Clone)]
pub struct BackupApi {
    http: Client,
    base_url: Url,
    csrf: CsrfTokenProvider,
}

impl BackupApi {
    pub fn from_config(config: &ConsoleConfig) -> ConsoleResult<Self> {
        let jar = Arc::new(Jar::default());
        if let Some(session) = config.session_cookie.as_deref() {
            jar.add_cookie_str(session, &config.base_url);
        }

        let http = Client::builder()
            .cookie_provider(jar.clone())
            .build()
            .map_err(|err| ConsoleError::transport(None, format!("failed to build HTTP client: {err}")))?;

        let csrf = CsrfTokenProvider::new(
            http.clone(),
            jar,
            config.base_url.clone(),
            config.csrf_cookie.clone(),
        );

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            csrf,
        })
    }

    pub async fn fetch_history(&self, show_all: bool) -> ConsoleResult<Vec<BackupRecord>> {
        let mut url = endpoints::url(&self.base_url, endpoints::HISTORY)?;
        url.query_pairs_mut()
            .append_pair("show_all", if show_all { "true" } else { "false" });

        let response = self
            .http
            .get(url)
            .header(REQUESTED_WITH_HEADER, REQUESTED_WITH)
            .send()
            .await?;

        let envelope = read_envelope(response).await?;
        Ok(envelope.data.unwrap_or_default())
    }

    pub async fn create_backup(&self, backup_name: Option<String>) -> ConsoleResult<ActionReply> {
        let request = self
            .authorized(reqwest::Method::POST, endpoints::CREATE)
            .await?
            .json(&CreateBackupRequest { backup_name });
        send_action(request).await
    }

    pub async fn restore_upload(
        &self,
        file_name: &str,
        contents: Vec<u8>,
    ) -> ConsoleResult<ActionReply> {
        let part = Part::bytes(contents)
            .file_name(sanitize_filename::sanitize(file_name))
            .mime_str(mime::APPLICATION_JSON.as_ref())
            .map_err(|err| ConsoleError::validation(format!("invalid upload part: {err}")))?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let request = self
            .authorized(reqwest::Method::POST, endpoints::RESTORE_UPLOAD)
            .await?
            .multipart(form);
        send_action(request).await
    }

    pub async fn restore_from_history(&self, id: i64) -> ConsoleResult<ActionReply> {
        let request = self
            .authorized(reqwest::Method::POST, &endpoints::restore_from_history(id))
            .await?;
        send_action(request).await
    }

    pub async fn smart_restore(
        &self,
        id: i64,
        category: RestoreCategory,
        mode: RestoreMode,
    ) -> ConsoleResult<ActionReply> {
        let request = self
            .authorized(reqwest::Method::POST, &endpoints::smart_restore(id))
            .await?
            .json(&SmartRestoreRequest {
                restore_category: category,
                restore_mode: mode,
            });
        send_action(request).await
    }

    pub async fn delete_backup(&self, id: i64) -> ConsoleResult<ActionReply> {
        let request = self
            .authorized(reqwest::Method::DELETE, &endpoints::delete(id))
            .await?;
        send_action(request).await
    }

    /// Request builder carrying the CSRF token and AJAX marker header.
    async fn authorized(&self, method: reqwest::Method, path: &str) -> ConsoleResult<RequestBuilder> {
        let token = self.csrf.token().await?;
        let url = endpoints::url(&self.base_url, path)?;
        debug!(%method, %url, "sending authorized request");

        Ok(self
            .http
            .request(method, url)
            .header(CSRF_HEADER, token)
            .header(REQUESTED_WITH_HEADER, REQUESTED_WITH))
    }
}

async fn send_action(request: RequestBuilder) -> ConsoleResult<ActionReply> {
    let response = request.send().await?;
    let envelope = read_envelope(response).await?;
    Ok(ActionReply {
        message: envelope.message,
        summary: envelope.summary,
    })
}

/// Reads a response into a successful envelope or a classified error.
async fn read_envelope(response: Response) -> ConsoleResult<ApiEnvelope> {
    let status = response.status();
    let url = response.url().clone();
    let body = response.text().await?;

    if !status.is_success() {
        warn!(%url, %status, "backup endpoint returned an error status");
        return Err(classify::classify_failure(status, &body));
    }

    let envelope: ApiEnvelope = serde_json::from_str(&body).map_err(|err| {
        warn!(%url, ?err, "backup endpoint returned a non-JSON body");
        classify::classify_text(Some(status.as_u16()), &body)
    })?;

    if !envelope.is_success() {
        return Err(ConsoleError::application(
            envelope
                .message
                .unwrap_or_else(|| "The server reported a failure.".to_string()),
        ));
    }

    Ok(envelope)
}
