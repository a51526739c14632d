use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Author display name locations, first match wins
const AUTHOR_POINTERS: [&str; 5] = [
    "/author/display_name",
    "/author/user/displayName",
    "/author/user/name",
    "/author/user/display_name",
    "/author/nickname",
];

/// Browser URL locations: Server's `links.self[0]`, then Cloud's `links.html`
const URL_POINTERS: [&str; 3] = ["/links/self/0/href", "/links/html/href", "/links/self/href"];

const CREATED_POINTERS: [&str; 2] = ["/createdDate", "/created_on"];

const CLOSED_POINTERS: [&str; 3] = ["/closedDate", "/closed_on", "/merged_on"];

pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Canonical pull request lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PullRequestState {
    Open,
    Merged,
    Declined,
    Superseded,
}

impl PullRequestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Merged => "MERGED",
            Self::Declined => "DECLINED",
            Self::Superseded => "SUPERSEDED",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "OPEN" => Some(Self::Open),
            "MERGED" => Some(Self::Merged),
            "DECLINED" => Some(Self::Declined),
            "SUPERSEDED" => Some(Self::Superseded),
            _ => None,
        }
    }
}

impl fmt::Display for PullRequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fold the wire `state` string and the legacy `closed`/`merged` flags into
/// one state. A closed pull request that was neither declined nor superseded
/// counts as merged.
pub fn normalize_state(
    state: Option<&str>,
    closed: Option<bool>,
    merged: Option<bool>,
) -> PullRequestState {
    let parsed = state.and_then(PullRequestState::parse);

    match parsed {
        Some(PullRequestState::Merged) => PullRequestState::Merged,
        Some(terminal @ (PullRequestState::Declined | PullRequestState::Superseded)) => terminal,
        _ if merged == Some(true) || closed == Some(true) => PullRequestState::Merged,
        Some(other) => other,
        None => PullRequestState::Open,
    }
}

/// Display name of a pull request's author, `"Unknown"` when no shape matches
pub fn resolve_author(pr: &Value) -> String {
    AUTHOR_POINTERS
        .iter()
        .find_map(|ptr| pr.pointer(ptr).and_then(non_empty_str))
        .unwrap_or(UNKNOWN_AUTHOR)
        .to_string()
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

/// Server sends epoch milliseconds, Cloud sends RFC 3339 strings
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis),
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    }
}

fn first_timestamp(pr: &Value, pointers: &[&str]) -> Option<DateTime<Utc>> {
    pointers
        .iter()
        .find_map(|ptr| pr.pointer(ptr).and_then(parse_timestamp))
}

/// A pull request normalized across dialects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: u64,
    pub title: String,
    pub state: PullRequestState,
    pub author: String,
    pub created_at: Option<DateTime<Utc>>,
    /// Merge/close time; pull requests without one are left out of monthly buckets
    pub closed_at: Option<DateTime<Utc>>,
    pub url: Option<String>,
}

impl PullRequest {
    /// Build from a raw page item. Items without a numeric id are rejected.
    pub fn from_json(pr: &Value) -> Option<Self> {
        let id = pr.get("id").and_then(Value::as_u64)?;

        let state = normalize_state(
            pr.get("state").and_then(Value::as_str),
            pr.get("closed").and_then(Value::as_bool),
            pr.get("merged").and_then(Value::as_bool),
        );

        // Cloud has no merge timestamp; the last update of a finished PR is its close
        let closed_at = first_timestamp(pr, &CLOSED_POINTERS).or_else(|| {
            if state == PullRequestState::Open {
                None
            } else {
                first_timestamp(pr, &["/updated_on"])
            }
        });

        Some(Self {
            id,
            title: pr
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            state,
            author: resolve_author(pr),
            created_at: first_timestamp(pr, &CREATED_POINTERS),
            closed_at,
            url: URL_POINTERS
                .iter()
                .find_map(|ptr| pr.pointer(ptr).and_then(non_empty_str))
                .map(str::to_string),
        })
    }

    pub fn is_merged(&self) -> bool {
        self.state == PullRequestState::Merged
    }

    /// Time from creation to merge, when both are known
    pub fn resolution_time(&self) -> Option<chrono::Duration> {
        match (self.created_at, self.closed_at) {
            (Some(created), Some(closed)) if closed >= created => Some(closed - created),
            _ => None,
        }
    }
}
