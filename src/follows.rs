// Non-mutual follow computation and the unfollow batch, plus the string
// functions the UI binds to its actions. This is the only place where a
// failure stops being an `Err` of some typed enum and becomes an
// `ErrorMessage` value.

use crate::api::{ApiClient, DeleteStatus, RelationshipKind, RelationshipSet};
use crate::error::{ErrorMessage, FetchError, InputError};
use crate::scrape::{with_session, ScrapeSettings, Scraper, SessionLauncher};
use reqwest::StatusCode;
use std::fmt;

/// A way of listing one side of an account's relationships.
pub trait RelationshipSource {
    type Error: std::error::Error;

    fn relationship_set(
        &mut self,
        account: &str,
        kind: RelationshipKind,
    ) -> Result<RelationshipSet, Self::Error>;
}

/// REST strategy: an API client plus the token to pass through.
pub struct ApiSource<'a> {
    api: &'a ApiClient,
    token: &'a str,
}

impl<'a> ApiSource<'a> {
    pub fn new(api: &'a ApiClient, token: &'a str) -> Self {
        ApiSource { api, token }
    }
}

impl RelationshipSource for ApiSource<'_> {
    type Error = FetchError;

    fn relationship_set(
        &mut self,
        account: &str,
        kind: RelationshipKind,
    ) -> Result<RelationshipSet, FetchError> {
        self.api.relationship_set(self.token, account, kind)
    }
}

/// `following - followers`, exact string match.
pub fn non_mutual(following: &RelationshipSet, followers: &RelationshipSet) -> RelationshipSet {
    following.difference(followers).cloned().collect()
}

/// Accounts `account` follows that do not follow back. An empty set is a
/// successful result.
pub fn find_non_mutual<S: RelationshipSource>(
    source: &mut S,
    account: &str,
) -> Result<RelationshipSet, ErrorMessage> {
    let followers = source
        .relationship_set(account, RelationshipKind::Followers)
        .map_err(|e| ErrorMessage::from_error(&e))?;
    let following = source
        .relationship_set(account, RelationshipKind::Following)
        .map_err(|e| ErrorMessage::from_error(&e))?;
    Ok(non_mutual(&following, &followers))
}

/// Per-target result of an unfollow request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnfollowOutcome {
    Unfollowed(String),
    Forbidden(String),
    NotFound(String),
    Failed { account: String, status: Option<u16>, reason: String },
}

impl UnfollowOutcome {
    fn from_delete(account: &str, status: DeleteStatus) -> Self {
        let account = account.to_string();
        match status {
            DeleteStatus::Status(StatusCode::NO_CONTENT) => UnfollowOutcome::Unfollowed(account),
            DeleteStatus::Status(StatusCode::FORBIDDEN) => UnfollowOutcome::Forbidden(account),
            DeleteStatus::Status(StatusCode::NOT_FOUND) => UnfollowOutcome::NotFound(account),
            DeleteStatus::Status(other) => UnfollowOutcome::Failed {
                account,
                status: Some(other.as_u16()),
                reason: other.canonical_reason().unwrap_or("Unknown").to_string(),
            },
            DeleteStatus::Failed(e) => UnfollowOutcome::Failed {
                account,
                status: None,
                reason: e.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UnfollowOutcome::Unfollowed(_))
    }
}

impl fmt::Display for UnfollowOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnfollowOutcome::Unfollowed(a) => write!(f, "Unfollowed {}", a),
            UnfollowOutcome::Forbidden(a) => write!(
                f,
                "Forbidden: could not unfollow {} (token needs the `user:follow` scope, or you are rate-limited)",
                a
            ),
            UnfollowOutcome::NotFound(a) => write!(f, "Not found: {} does not exist", a),
            UnfollowOutcome::Failed { account, status: Some(code), reason } => {
                write!(f, "Failed to unfollow {}: status {} ({})", account, code, reason)
            }
            UnfollowOutcome::Failed { account, status: None, reason } => {
                write!(f, "Failed to unfollow {}: {}", account, reason)
            }
        }
    }
}

/// Split a free-text comma-separated list, trimming entries and dropping
/// empty ones.
pub fn parse_unfollow_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Unfollow each target in order, one request at a time. A failure on one
/// target is recorded and the rest are still processed.
pub fn unfollow_many(
    api: &ApiClient,
    token: &str,
    targets: &[String],
) -> Result<Vec<UnfollowOutcome>, InputError> {
    if targets.is_empty() {
        return Err(InputError::EmptyUnfollowList);
    }
    let outcomes = targets
        .iter()
        .map(|target| {
            let outcome = UnfollowOutcome::from_delete(target, api.unfollow(token, target));
            if !outcome.is_success() {
                tracing::warn!(target = %target, outcome = %outcome, "Unfollow did not succeed");
            }
            outcome
        })
        .collect();
    Ok(outcomes)
}

/// Render a non-mutual result the way the results panel shows it.
pub fn render_non_mutual(result: Result<RelationshipSet, ErrorMessage>) -> String {
    match result {
        Err(msg) => msg.to_string(),
        Ok(set) if set.is_empty() => {
            "All users you follow are following you back (or the lists are empty).".to_string()
        }
        Ok(set) => {
            let mut sorted: Vec<String> = set.into_iter().collect();
            sorted.sort();
            format!("These users do NOT follow you back:\n{}", sorted.join("\n"))
        }
    }
}

/// "Check" action, REST strategy.
pub fn check_follows(api: &ApiClient, account: &str, token: &str) -> String {
    let account = account.trim();
    let token = token.trim();
    if account.is_empty() {
        return ErrorMessage::from(InputError::MissingAccount).to_string();
    }
    if token.is_empty() {
        return ErrorMessage::from(InputError::MissingToken).to_string();
    }
    render_non_mutual(find_non_mutual(&mut ApiSource::new(api, token), account))
}

/// "Check" action, browser strategy. The session lives for exactly the two
/// listing scrapes.
pub fn check_follows_scraped<L: SessionLauncher>(
    launcher: &L,
    settings: &ScrapeSettings,
    account: &str,
) -> String {
    let account = account.trim();
    if account.is_empty() {
        return ErrorMessage::from(InputError::MissingAccount).to_string();
    }
    let result = with_session(launcher, |session| {
        let mut scraper = Scraper::new(session, settings)?;
        Ok(find_non_mutual(&mut scraper, account))
    })
    .unwrap_or_else(|e| Err(ErrorMessage::from_error(&e)));
    render_non_mutual(result)
}

/// "Unfollow" action.
pub fn unfollow_users(api: &ApiClient, token: &str, list: &str) -> String {
    let token = token.trim();
    if token.is_empty() {
        return ErrorMessage::from(InputError::MissingToken).to_string();
    }
    match unfollow_many(api, token, &parse_unfollow_list(list)) {
        Ok(outcomes) => outcomes
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n"),
        Err(e) => ErrorMessage::from(e).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> RelationshipSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    struct FakeSource {
        followers: Option<RelationshipSet>,
        following: RelationshipSet,
        calls: Vec<RelationshipKind>,
    }

    impl RelationshipSource for FakeSource {
        type Error = FetchError;

        fn relationship_set(
            &mut self,
            _account: &str,
            kind: RelationshipKind,
        ) -> Result<RelationshipSet, FetchError> {
            self.calls.push(kind);
            match kind {
                RelationshipKind::Followers => self.followers.clone().ok_or(FetchError::Forbidden),
                RelationshipKind::Following => Ok(self.following.clone()),
            }
        }
    }

    #[test]
    fn difference_is_following_minus_followers() {
        let following = set(&["a", "b", "c"]);
        let followers = set(&["b", "d"]);
        assert_eq!(non_mutual(&following, &followers), set(&["a", "c"]));
    }

    #[test]
    fn difference_is_case_sensitive() {
        let following = set(&["Octocat"]);
        let followers = set(&["octocat"]);
        assert_eq!(non_mutual(&following, &followers), set(&["Octocat"]));
    }

    #[test]
    fn empty_difference_is_success() {
        let mut source = FakeSource {
            followers: Some(set(&["a", "b"])),
            following: set(&["a"]),
            calls: vec![],
        };
        assert_eq!(find_non_mutual(&mut source, "me"), Ok(RelationshipSet::new()));
        assert_eq!(
            source.calls,
            vec![RelationshipKind::Followers, RelationshipKind::Following]
        );
    }

    #[test]
    fn source_failure_becomes_error_message() {
        let mut source = FakeSource {
            followers: None,
            following: set(&["a"]),
            calls: vec![],
        };
        let err = find_non_mutual(&mut source, "me").unwrap_err();
        assert!(err.to_string().starts_with("Error: 403 Forbidden"));
        assert_eq!(source.calls, vec![RelationshipKind::Followers]);
    }

    #[test]
    fn render_sorts_result() {
        let text = render_non_mutual(Ok(set(&["zed", "alice", "Bob"])));
        assert_eq!(text, "These users do NOT follow you back:\nBob\nalice\nzed");
    }

    #[test]
    fn render_empty_and_error() {
        assert_eq!(
            render_non_mutual(Ok(RelationshipSet::new())),
            "All users you follow are following you back (or the lists are empty)."
        );
        let err = ErrorMessage::from(InputError::MissingAccount);
        assert_eq!(
            render_non_mutual(Err(err)),
            "Error: Please provide a valid GitHub username."
        );
    }

    #[test]
    fn unfollow_list_is_trimmed_and_compacted() {
        assert_eq!(parse_unfollow_list(" a, ,b ,,c,"), vec!["a", "b", "c"]);
        assert!(parse_unfollow_list(" , ,").is_empty());
    }

    #[test]
    fn delete_status_mapping() {
        let ok = UnfollowOutcome::from_delete("a", DeleteStatus::Status(StatusCode::NO_CONTENT));
        assert_eq!(ok, UnfollowOutcome::Unfollowed("a".into()));
        let forbidden =
            UnfollowOutcome::from_delete("b", DeleteStatus::Status(StatusCode::FORBIDDEN));
        assert_eq!(forbidden, UnfollowOutcome::Forbidden("b".into()));
        let missing =
            UnfollowOutcome::from_delete("c", DeleteStatus::Status(StatusCode::NOT_FOUND));
        assert_eq!(missing, UnfollowOutcome::NotFound("c".into()));
        let other = UnfollowOutcome::from_delete("d", DeleteStatus::Status(StatusCode::OK));
        assert_eq!(other.to_string(), "Failed to unfollow d: status 200 (OK)");
    }
}
