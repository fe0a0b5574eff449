//! `reqwest` implementation of the GitLab API contract (REST API v4)

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::error::{ApiError, ApiResult};
use super::types::{Label, Milestone, Project, Session, User};
use super::{GitlabClient, GitlabConnector};
use crate::config::HttpConfig;

/// Page size requested from list endpoints
const PER_PAGE: &str = "100";

/// Header GitLab uses to announce the next page of a list
const NEXT_PAGE_HEADER: &str = "x-next-page";

/// Upper bound on pages fetched from one list endpoint
const MAX_PAGES: u32 = 1000;

/// OAuth token response of the resource-owner password grant
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Connector issuing real HTTP requests against a GitLab instance
#[derive(Debug, Clone)]
pub struct HttpConnector {
    http: Client,
    api_prefix: String,
}

impl HttpConnector {
    pub fn new(config: &HttpConfig) -> ApiResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ApiError::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_prefix: config.api_prefix.clone(),
        })
    }

    fn client(&self, host: &str, token: &str) -> ApiResult<HttpClient> {
        let host = normalize_host(host)?;
        Ok(HttpClient {
            http: self.http.clone(),
            api_base: format!("{host}{}", self.api_prefix),
            host,
            token: token.to_string(),
        })
    }
}

#[async_trait]
impl GitlabConnector for HttpConnector {
    fn connect_with_token(&self, host: &str, token: &str) -> ApiResult<Arc<dyn GitlabClient>> {
        Ok(Arc::new(self.client(host, token)?))
    }

    async fn connect_with_password(
        &self,
        host: &str,
        username: &str,
        password: &str,
    ) -> ApiResult<Session> {
        let base = normalize_host(host)?;
        tracing::debug!(host = %base, "Exchanging password for access token");

        let response = self
            .http
            .post(format!("{base}/oauth/token"))
            .form(&[
                ("grant_type", "password"),
                ("username", username),
                ("password", password),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // GitLab answers a wrong password with 400 invalid_grant
            if status == StatusCode::BAD_REQUEST && body.contains("invalid_grant") {
                return Err(ApiError::Unauthorized {
                    status: status.as_u16(),
                });
            }
            return Err(ApiError::from_status(status.as_u16(), body));
        }

        let token: TokenResponse = response.json().await?;
        let client = self.client(host, &token.access_token)?;
        let user = client.fetch_user().await?;

        Ok(Session {
            user,
            private_token: token.access_token,
        })
    }
}

/// Client bound to one host and one token
#[derive(Clone)]
pub struct HttpClient {
    http: Client,
    host: String,
    api_base: String,
    token: String,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("host", &self.host)
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    async fn send(&self, path: &str, query: &[(&str, &str)]) -> ApiResult<Response> {
        let response = self
            .http
            .get(format!("{}{path}", self.api_base))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await?;
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = check_status(self.send(path, &[]).await?).await?;
        Ok(response.json().await?)
    }

    /// Collect every page of a list endpoint
    async fn get_all<T: DeserializeOwned>(&self, path: &str) -> ApiResult<Vec<T>> {
        let mut items = Vec::new();
        let mut page: u32 = 1;

        loop {
            let page_str = page.to_string();
            let query = [("per_page", PER_PAGE), ("page", page_str.as_str())];
            let response = check_status(self.send(path, &query).await?).await?;

            let next = next_page(
                page,
                response
                    .headers()
                    .get(NEXT_PAGE_HEADER)
                    .and_then(|v| v.to_str().ok()),
            );

            let batch: Vec<T> = response.json().await?;
            items.extend(batch);

            match next {
                Some(n) => page = n,
                None => break,
            }
        }

        Ok(items)
    }

    async fn fetch_user(&self) -> ApiResult<User> {
        self.get_json("/user").await
    }
}

#[async_trait]
impl GitlabClient for HttpClient {
    fn host(&self) -> &str {
        &self.host
    }

    async fn current_session(&self) -> ApiResult<Session> {
        let user = self.fetch_user().await?;
        Ok(Session {
            user,
            private_token: self.token.clone(),
        })
    }

    async fn get_project(&self, namespace: &str, name: &str) -> ApiResult<Option<Project>> {
        let id = encode_project_id(namespace, name);
        let response = self.send(&format!("/projects/{id}"), &[]).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = check_status(response).await?;
        Ok(Some(response.json().await?))
    }

    async fn project_members(&self, project_id: u64) -> ApiResult<Vec<User>> {
        self.get_all(&format!("/projects/{project_id}/members/all"))
            .await
    }

    async fn project_milestones(&self, project_id: u64) -> ApiResult<Vec<Milestone>> {
        self.get_all(&format!("/projects/{project_id}/milestones"))
            .await
    }

    async fn project_labels(&self, project_id: u64) -> ApiResult<Vec<Label>> {
        self.get_all(&format!("/projects/{project_id}/labels"))
            .await
    }
}

async fn check_status(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::from_status(status.as_u16(), body))
}

/// Page to fetch after `current`, if the header announces a later one
///
/// Pages must strictly increase, so a server pointing backwards cannot keep
/// the loop going.
fn next_page(current: u32, header: Option<&str>) -> Option<u32> {
    if current >= MAX_PAGES {
        return None;
    }
    header
        .map(str::trim)
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|&next| next > current)
}

/// Validate `host` as an absolute http(s) URL and drop any trailing slash
fn normalize_host(host: &str) -> ApiResult<String> {
    let parsed = Url::parse(host).map_err(|e| ApiError::InvalidHost(format!("{host}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ApiError::InvalidHost(format!(
            "{host}: unsupported scheme {}",
            parsed.scheme()
        )));
    }
    Ok(host.trim_end_matches('/').to_string())
}

/// GitLab accepts `namespace/name` as a project id when URL-encoded
fn encode_project_id(namespace: &str, name: &str) -> String {
    url::form_urlencoded::byte_serialize(format!("{namespace}/{name}").as_bytes()).collect()
}
