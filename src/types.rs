use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::WrappedError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PullRequestState {
    Open,
    Closed,
    Merged,
}

impl PullRequestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PullRequestState::Open => "OPEN",
            PullRequestState::Closed => "CLOSED",
            PullRequestState::Merged => "MERGED",
        }
    }
}

impl FromStr for PullRequestState {
    type Err = WrappedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(PullRequestState::Open),
            "CLOSED" => Ok(PullRequestState::Closed),
            "MERGED" => Ok(PullRequestState::Merged),
            other => Err(WrappedError::InvalidState(other.to_string())),
        }
    }
}

impl fmt::Display for PullRequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Repository {
    pub owner: String,
    pub name: String,
    pub full_name: String,
}

impl Repository {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        let owner = owner.into();
        let name = name.into();
        let full_name = format!("{}/{}", owner, name);
        Self {
            owner,
            name,
            full_name,
        }
    }

    pub fn from_full_name(full_name: &str) -> anyhow::Result<Self> {
        let parts: Vec<&str> = full_name.split('/').collect();
        if parts.len() != 2 || parts.iter().any(|p| p.is_empty()) {
            return Err(anyhow::anyhow!(
                "Invalid repository full name format. Expected 'owner/name', got: {}",
                full_name
            ));
        }
        Ok(Self::new(parts[0], parts[1]))
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

/// A pull request the viewer contributed, with its reviews inlined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: String,
    pub number: u64,
    pub title: String,
    pub repository: Repository,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
    /// Set for CLOSED and MERGED pull requests only.
    pub closed_at: Option<DateTime<Utc>>,
    /// Set for MERGED pull requests only.
    pub merged_at: Option<DateTime<Utc>>,
    pub state: PullRequestState,
    pub commits_count: u32,
    pub comments_count: u32,
    pub reviews: Vec<PrReview>,
    pub url: String,
}

impl PullRequest {
    /// Time from creation to merge. `None` unless merged with a recorded merge time.
    pub fn duration(&self) -> Option<Duration> {
        match (self.state, self.merged_at) {
            (PullRequestState::Merged, Some(merged_at)) => Some(merged_at - self.created_at),
            _ => None,
        }
    }

    pub fn created_in(&self, year: i32) -> bool {
        self.created_at.year() == year
    }

    pub fn to_ref(&self) -> PullRequestRef {
        PullRequestRef {
            title: self.title.clone(),
            owner: self.repository.owner.clone(),
            repo: self.repository.name.clone(),
            number: self.number,
            url: self.url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrReview {
    pub id: String,
    pub author: String,
    /// APPROVED, CHANGES_REQUESTED, COMMENTED, DISMISSED or PENDING
    pub state: String,
    pub comments: Vec<PrReviewComment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrReviewComment {
    pub id: String,
    pub author: String,
    /// Id of the comment this one answers, possibly in another review.
    pub reply_to: Option<String>,
}

/// The part of a pull request worth printing in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRef {
    pub title: String,
    pub owner: String,
    pub repo: String,
    pub number: u64,
    pub url: String,
}

impl fmt::Display for PullRequestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{} {}", self.owner, self.repo, self.number, self.title)
    }
}

/// The authenticated user as returned by `GET /user`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubUser {
    pub login: String,
    pub id: u64,
    pub node_id: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "type", default)]
    pub user_type: String,
    pub name: Option<String>,
    #[serde(default)]
    pub followers: u32,
    #[serde(default)]
    pub following: u32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub suspended_at: Option<DateTime<Utc>>,
}

/// An organization from `GET /user/orgs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub login: String,
    pub id: u64,
    pub node_id: String,
    pub url: String,
    #[serde(default)]
    pub avatar_url: String,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn pr(state: PullRequestState, merged_at: Option<DateTime<Utc>>) -> PullRequest {
        PullRequest {
            id: "PR_1".to_string(),
            number: 1,
            title: "Fix typo".to_string(),
            repository: Repository::new("octo", "hello"),
            is_private: false,
            created_at: at(2023, 1, 1),
            closed_at: merged_at,
            merged_at,
            state,
            commits_count: 1,
            comments_count: 0,
            reviews: vec![],
            url: "https://github.com/octo/hello/pull/1".to_string(),
        }
    }

    #[test]
    fn test_state_parsing() {
        assert_eq!(
            "MERGED".parse::<PullRequestState>().unwrap(),
            PullRequestState::Merged
        );
        assert_eq!(PullRequestState::Open.to_string(), "OPEN");
        let err = "DRAFT".parse::<PullRequestState>().unwrap_err();
        assert!(matches!(err, WrappedError::InvalidState(s) if s == "DRAFT"));
    }

    #[test]
    fn test_duration_only_for_merged() {
        let merged = pr(PullRequestState::Merged, Some(at(2023, 1, 3)));
        assert_eq!(merged.duration(), Some(Duration::days(2)));

        assert_eq!(pr(PullRequestState::Merged, None).duration(), None);
        assert_eq!(pr(PullRequestState::Open, None).duration(), None);
    }

    #[test]
    fn test_repository_full_name() {
        let repo = Repository::from_full_name("tokio-rs/axum").unwrap();
        assert_eq!(repo.owner, "tokio-rs");
        assert_eq!(repo.name, "axum");
        assert_eq!(repo.to_string(), "tokio-rs/axum");
        assert!(Repository::from_full_name("axum").is_err());
        assert!(Repository::from_full_name("tokio-rs/").is_err());
    }

    #[test]
    fn test_ref_display() {
        let r = pr(PullRequestState::Open, None).to_ref();
        assert_eq!(r.to_string(), "octo/hello#1 Fix typo");
    }
}
