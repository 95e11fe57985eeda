// API client module: a small blocking HTTP client for the GitHub REST API.
// Every call is synchronous; pagination suspends the caller until each page
// has arrived.

use crate::error::FetchError;
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK};
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!("followback/", env!("CARGO_PKG_VERSION"));

/// Unique, unordered set of account handles.
pub type RelationshipSet = HashSet<String>;

/// Which side of a follow relationship to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipKind {
    Followers,
    Following,
}

impl RelationshipKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationshipKind::Followers => "followers",
            RelationshipKind::Following => "following",
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Only the handle is read from a listed account; anything else in the
/// item is ignored.
#[derive(Deserialize)]
struct AccountItem {
    login: String,
}

/// Raw result of a single DELETE /user/following/{target}.
#[derive(Debug)]
pub enum DeleteStatus {
    Status(StatusCode),
    Failed(FetchError),
}

/// Blocking API client holding the reqwest client and the API base URL.
/// The token is not stored: it is passed through on every call.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(ApiClient { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn auth_headers(token: &str) -> Result<HeaderMap, FetchError> {
        let mut headers = HeaderMap::new();
        let val = format!("token {}", token.trim());
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&val)?);
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
        Ok(headers)
    }

    /// GET `base_url + endpoint` and every page linked from it via
    /// `rel="next"`, concatenating the JSON array of each page in order.
    pub fn fetch_all(
        &self,
        token: &str,
        endpoint: &str,
    ) -> Result<Vec<serde_json::Value>, FetchError> {
        let headers = Self::auth_headers(token)?;
        let mut items = Vec::new();
        let mut url = Some(format!("{}{}", self.base_url, endpoint));

        while let Some(current) = url {
            let res = self.client.get(&current).headers(headers.clone()).send()?;
            let res = check_status(res)?;
            url = res
                .headers()
                .get(LINK)
                .and_then(|v| v.to_str().ok())
                .and_then(next_link);

            let page: Vec<serde_json::Value> = serde_json::from_slice(&res.bytes()?)?;
            tracing::debug!(url = %current, items = page.len(), "Fetched page");
            items.extend(page);
        }
        Ok(items)
    }

    /// Handles of every account on one side of `account`'s relationships.
    /// Items without a `login` are skipped.
    pub fn relationship_set(
        &self,
        token: &str,
        account: &str,
        kind: RelationshipKind,
    ) -> Result<RelationshipSet, FetchError> {
        let endpoint = format!("/users/{}/{}", account, kind);
        let set: RelationshipSet = self
            .fetch_all(token, &endpoint)?
            .into_iter()
            .filter_map(|item| serde_json::from_value::<AccountItem>(item).ok())
            .map(|item| item.login)
            .collect();
        tracing::info!(account, %kind, count = set.len(), "Collected relationship set");
        Ok(set)
    }

    /// Issue one DELETE /user/following/{target}. Never fails: transport
    /// errors are returned as `DeleteStatus::Failed`.
    pub fn unfollow(&self, token: &str, target: &str) -> DeleteStatus {
        let url = format!("{}/user/following/{}", self.base_url, target);
        let sent = Self::auth_headers(token).and_then(|headers| {
            self.client.delete(&url).headers(headers).send().map_err(FetchError::from)
        });
        match sent {
            Ok(res) => DeleteStatus::Status(res.status()),
            Err(e) => DeleteStatus::Failed(e),
        }
    }
}

fn check_status(res: Response) -> Result<Response, FetchError> {
    let status = res.status();
    match status {
        StatusCode::FORBIDDEN => Err(FetchError::Forbidden),
        StatusCode::NOT_FOUND => Err(FetchError::NotFound),
        s if !s.is_success() => Err(FetchError::Request {
            status: s.as_u16(),
            reason: s.canonical_reason().unwrap_or("Unknown").to_string(),
        }),
        _ => Ok(res),
    }
}

/// Extract the `rel="next"` target from a Link header such as
/// `<https://api.github.com/user/1/followers?page=2>; rel="next", <...>; rel="last"`.
pub fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let mut segments = part.split(';');
        let target = segments.next()?.trim();
        let is_next = segments.any(|param| {
            let param = param.trim();
            param
                .strip_prefix("rel=")
                .map(|rel| rel.trim_matches('"').split_whitespace().any(|r| r == "next"))
                .unwrap_or(false)
        });
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_link_found_among_relations() {
        let header = r#"<https://api.github.com/user/1/followers?page=1>; rel="prev", <https://api.github.com/user/1/followers?page=3>; rel="next", <https://api.github.com/user/1/followers?page=5>; rel="last""#;
        assert_eq!(
            next_link(header).as_deref(),
            Some("https://api.github.com/user/1/followers?page=3")
        );
    }

    #[test]
    fn next_link_absent_on_last_page() {
        let header = r#"<https://api.github.com/user/1/followers?page=1>; rel="first", <https://api.github.com/user/1/followers?page=4>; rel="prev""#;
        assert_eq!(next_link(header), None);
    }

    #[test]
    fn next_link_ignores_malformed_target() {
        assert_eq!(next_link(r#"https://example.com; rel="next""#), None);
        assert_eq!(next_link(""), None);
    }

    #[test]
    fn auth_headers_trim_token() {
        let headers = ApiClient::auth_headers("  abc123 \n").unwrap();
        assert_eq!(headers[AUTHORIZATION], "token abc123");
        assert_eq!(headers[ACCEPT], GITHUB_MEDIA_TYPE);
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let api = ApiClient::new("http://localhost:9999/").unwrap();
        assert_eq!(api.base_url(), "http://localhost:9999");
    }
}
