//! Thin REST client for the GitHub API
//!
//! Maps HTTP statuses onto [`RemoteError`] so callers can tell an idempotent
//! conflict ("already exists") apart from a permission or transport failure.

use liftoff_core::error::{RemoteError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, LINK, RETRY_AFTER, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Public GitHub API endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw+json";

/// Error payload returned by the API
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

/// Authenticated client scoped to one repository
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    api_url: String,
    token: String,
    owner: String,
    repo: String,
}

impl GitHubClient {
    /// Create a client for `owner/repo`
    pub fn new(
        api_url: impl Into<String>,
        token: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_MEDIA_TYPE));
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static(API_VERSION),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("liftoff/", env!("CARGO_PKG_VERSION"))),
        );

        let http = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            owner: owner.into(),
            repo: repo.into(),
        })
    }

    /// Repository owner
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// API path below `/repos/{owner}/{repo}`
    pub fn repo_path(&self, suffix: &str) -> String {
        format!("/repos/{}/{}{}", self.owner, self.repo, suffix)
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.api_url, path)
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        trace!(%method, %url, "github request");
        self.http.request(method, url).bearer_auth(&self.token)
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        check(response).await
    }

    /// GET a JSON resource
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.execute(self.request(Method::GET, path)).await?;
        decode(response).await
    }

    /// GET a JSON resource, mapping 404 to `None`
    pub async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        match self.get(path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// GET raw file content, mapping 404 to `None`
    pub async fn get_raw(&self, path: &str) -> Result<Option<String>> {
        let builder = self
            .request(Method::GET, path)
            .header(ACCEPT, RAW_MEDIA_TYPE);
        match self.execute(builder).await {
            Ok(response) => {
                let text = response
                    .text()
                    .await
                    .map_err(|e| RemoteError::Decode(e.to_string()))?;
                Ok(Some(text))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// GET one page, returning the URL of the next page if the API links one
    pub async fn get_page<T: DeserializeOwned>(&self, path: &str) -> Result<(T, Option<String>)> {
        let response = self.execute(self.request(Method::GET, path)).await?;
        let next = next_link(response.headers());
        let value = decode(response).await?;
        Ok((value, next))
    }

    /// GET a list, following `Link: rel="next"` until exhausted or `limit` items are read
    pub async fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        limit: Option<usize>,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(path.to_string());
        let mut pages = 0usize;

        while let Some(page) = next {
            let (batch, link): (Vec<T>, _) = self.get_page(&page).await?;
            pages += 1;
            items.extend(batch);

            if limit.is_some_and(|max| items.len() >= max) {
                break;
            }
            next = link;
        }

        if let Some(max) = limit {
            items.truncate(max);
        }
        debug!(path, pages, count = items.len(), "listed paginated resource");
        Ok(items)
    }

    /// Send a JSON body and decode the JSON response
    pub async fn send<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .execute(self.request(method, path).json(body))
            .await?;
        decode(response).await
    }

    /// Send a request whose response body is ignored
    pub async fn send_no_content<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let mut builder = self.request(method, path);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.execute(builder).await?;
        Ok(())
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| RemoteError::Decode(e.to_string()).into())
}

async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let headers = response.headers().clone();
    let text = response.text().await.unwrap_or_default();
    let body: ApiErrorBody = serde_json::from_str(&text).unwrap_or_default();
    let message = if body.message.is_empty() {
        text.clone()
    } else {
        body.message.clone()
    };

    debug!(status = status.as_u16(), message = %message, "github request failed");
    Err(classify(status, &headers, message, &body).into())
}

fn classify(
    status: StatusCode,
    headers: &HeaderMap,
    message: String,
    body: &ApiErrorBody,
) -> RemoteError {
    let retry_after = headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok());
    let rate_exhausted = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        == Some("0");

    match status {
        StatusCode::NOT_FOUND => RemoteError::NotFound(message),
        StatusCode::TOO_MANY_REQUESTS => RemoteError::RateLimited { retry_after },
        StatusCode::FORBIDDEN if rate_exhausted => RemoteError::RateLimited { retry_after },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::PermissionDenied(message),
        StatusCode::CONFLICT => RemoteError::Conflict(message),
        StatusCode::UNPROCESSABLE_ENTITY if mentions_existing(&message, body) => {
            RemoteError::Conflict(message)
        }
        _ => RemoteError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

fn mentions_existing(message: &str, body: &ApiErrorBody) -> bool {
    let message = message.to_lowercase();
    if message.contains("already exists") {
        return true;
    }
    body.errors.iter().any(|e| {
        let text = e.to_string().to_lowercase();
        text.contains("already_exists") || text.contains("already exists")
    })
}

/// URL of the `rel="next"` page in a `Link` header
fn next_link(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|part| {
        let (url, params) = part.split_once(';')?;
        if params.split(';').any(|p| p.trim() == r#"rel="next""#) {
            Some(url.trim().trim_start_matches('<').trim_end_matches('>').to_string())
        } else {
            None
        }
    })
}
