use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::{GitHubUser, Organization, PullRequest};

/// Where pull requests and the viewer's profile come from.
///
/// Implementations resolve pagination and pacing themselves; callers get the
/// complete, fully nested result or an error.
#[async_trait]
pub trait PullRequestSource {
    async fn get_authenticated_user(&self) -> Result<GitHubUser>;

    /// Every pull request the viewer contributed within `[from, to]`.
    async fn list_pull_requests(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PullRequest>>;

    async fn list_organizations(&self) -> Result<Vec<Organization>>;
}
