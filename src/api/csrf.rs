use std::sync::Arc;

use cookie::Cookie;
use reqwest::{
    Client, Url,
    cookie::{CookieStore, Jar},
};
use tracing::{debug, error};

use crate::{
    api::{REQUESTED_WITH, REQUESTED_WITH_HEADER, endpoints, models::ApiEnvelope},
    error::{ConsoleError, ConsoleResult},
};

const TOKEN_UNAVAILABLE: &str =
    "Could not obtain a security token. Refresh the page and try again.";

/// Supplies the CSRF token required on mutating requests.
///
/// The cookie jar is the cache: a token cookie set by the server is reused
/// until the server replaces it.
#[derive(Clone)]
pub struct CsrfTokenProvider {
    http: Client,
    jar: Arc<Jar>,
    base_url: Url,
    cookie_name: String,
}

impl CsrfTokenProvider {
    pub fn new(http: Client, jar: Arc<Jar>, base_url: Url, cookie_name: impl Into<String>) -> Self {
        Self {
            http,
            jar,
            base_url,
            cookie_name: cookie_name.into(),
        }
    }

    pub async fn token(&self) -> ConsoleResult<String> {
        if let Some(token) = self.cookie_token() {
            return Ok(token);
        }

        debug!(cookie = %self.cookie_name, "csrf cookie absent, requesting token");
        self.fetch_token().await.map_err(|err| {
            error!(?err, "failed to obtain csrf token");
            ConsoleError::authorization(TOKEN_UNAVAILABLE)
        })
    }

    /// Token stored in the cookie jar for the backup origin, if any.
    pub fn cookie_token(&self) -> Option<String> {
        let header = self.jar.cookies(&self.base_url)?;
        let raw = header.to_str().ok()?;

        Cookie::split_parse(raw)
            .filter_map(Result::ok)
            .find(|cookie| cookie.name() == self.cookie_name)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty())
    }

    async fn fetch_token(&self) -> ConsoleResult<String> {
        let url = endpoints::url(&self.base_url, endpoints::CSRF_TOKEN)?;
        let response = self
            .http
            .get(url)
            .header(REQUESTED_WITH_HEADER, REQUESTED_WITH)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConsoleError::transport(
                Some(status.as_u16()),
                format!("token endpoint answered {status}"),
            ));
        }

        let envelope: ApiEnvelope = response.json().await?;
        if !envelope.is_success() {
            return Err(ConsoleError::application(
                envelope
                    .message
                    .unwrap_or_else(|| format!("token endpoint reported `{}`", envelope.status)),
            ));
        }

        envelope
            .csrf_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ConsoleError::application("token endpoint returned no token"))
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;
    use crate::testutil::{MockBackupServer, closed_port_url};

    fn provider_for(base_url: Url, jar: Arc<Jar>) -> CsrfTokenProvider {
        let http = Client::builder()
            .cookie_provider(jar.clone())
            .build()
            .expect("client");
        CsrfTokenProvider::new(http, jar, base_url, "csrftoken")
    }

    #[tokio::test]
    async fn cookie_fast_path_skips_the_endpoint() {
        let server = MockBackupServer::start().await;
        let jar = Arc::new(Jar::default());
        jar.add_cookie_str("csrftoken=from-cookie; Path=/", &server.base_url());
        jar.add_cookie_str("sessionid=abc; Path=/", &server.base_url());

        let provider = provider_for(server.base_url(), jar);
        assert_eq!(provider.token().await.unwrap(), "from-cookie");
        assert_eq!(server.hits(endpoints::CSRF_TOKEN), 0);
    }

    #[tokio::test]
    async fn fetched_token_is_cached_in_the_jar() {
        let server = MockBackupServer::start().await;
        let provider = provider_for(server.base_url(), Arc::new(Jar::default()));

        assert_eq!(provider.token().await.unwrap(), server.token());
        assert_eq!(provider.token().await.unwrap(), server.token());
        assert_eq!(server.hits(endpoints::CSRF_TOKEN), 1);
    }

    #[tokio::test]
    async fn failed_envelope_is_an_authorization_error() {
        let server = MockBackupServer::start().await;
        server.fail_token_endpoint();
        let provider = provider_for(server.base_url(), Arc::new(Jar::default()));

        let err = provider.token().await.unwrap_err();
        assert_eq!(err, ConsoleError::authorization(TOKEN_UNAVAILABLE));
    }

    #[tokio::test]
    async fn error_status_from_token_endpoint_is_an_authorization_error() {
        let server = MockBackupServer::start().await;
        server.fail_token_endpoint_with(
            StatusCode::INTERNAL_SERVER_ERROR,
            "<h1>Server Error (500)</h1>",
        );
        let provider = provider_for(server.base_url(), Arc::new(Jar::default()));

        let err = provider.token().await.unwrap_err();
        assert_eq!(err, ConsoleError::authorization(TOKEN_UNAVAILABLE));
        assert_eq!(server.hits(endpoints::CSRF_TOKEN), 1);
    }

    #[tokio::test]
    async fn html_page_from_token_endpoint_is_an_authorization_error() {
        let server = MockBackupServer::start().await;
        server.fail_token_endpoint_with(StatusCode::OK, "<html><body>Login required</body></html>");
        let provider = provider_for(server.base_url(), Arc::new(Jar::default()));

        let err = provider.token().await.unwrap_err();
        assert_eq!(err, ConsoleError::authorization(TOKEN_UNAVAILABLE));
    }

    #[tokio::test]
    async fn unreachable_server_is_an_authorization_error() {
        let provider = provider_for(closed_port_url().await, Arc::new(Jar::default()));
        let err = provider.token().await.unwrap_err();
        assert!(matches!(err, ConsoleError::Authorization(_)));
    }
}
