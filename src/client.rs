use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use octocrab::Octocrab;
use serde_json::json;
use tokio::sync::OnceCell;
use tokio::time::{sleep, Duration};

use crate::config::{FetchConfig, GitHubConfig, PageConfig};
use crate::error::{Result, WrappedError};
use crate::graphql::{
    contributions_query, convert_pull_request, convert_reviews, reviews_query, run_query,
    ContributionsData, GraphQlClient, GraphQlTransport, ReviewsData,
};
use crate::source::PullRequestSource;
use crate::types::{GitHubUser, Organization, PrReview, PullRequest};

pub struct GitHubClient {
    octocrab: Octocrab,
    graphql: GraphQlClient,
    page_delay: Duration,
    pages: PageConfig,
    config: GitHubConfig,
    viewer: OnceCell<GitHubUser>,
}

impl GitHubClient {
    pub fn new() -> Result<Self> {
        Self::with_config(FetchConfig::default())
    }

    pub fn with_config(config: FetchConfig) -> Result<Self> {
        let token = config.github.resolve_token()?;

        let mut builder = Octocrab::builder().personal_token(token.clone());

        if !config.github.api_base_url.is_empty()
            && config.github.api_base_url != "https://api.github.com"
        {
            builder = builder
                .base_uri(config.github.api_base_url.as_str())
                .map_err(|e| WrappedError::ConfigError(format!("Invalid base URI: {}", e)))?;
        }

        let octocrab = builder.build()?;
        let graphql = GraphQlClient::new(&config.github, token)?;

        Ok(Self {
            octocrab,
            graphql,
            page_delay: config.rate_limiting.delay_duration(),
            pages: config.pagination,
            config: config.github,
            viewer: OnceCell::new(),
        })
    }

    fn pager(&self) -> ContributionPager<'_, GraphQlClient> {
        ContributionPager::new(&self.graphql, &self.pages, self.page_delay, &self.config.host)
    }

    pub async fn get_rate_limit(&self) -> Result<String> {
        let rate_limit =
            self.octocrab.ratelimit().get().await.map_err(|e| {
                WrappedError::ApiError(format!("Failed to get rate limit: {}", e))
            })?;

        Ok(format!(
            "Rate limit: {}/{} remaining, resets at {}",
            rate_limit.resources.core.remaining,
            rate_limit.resources.core.limit,
            rate_limit.resources.core.reset
        ))
    }
}

#[async_trait]
impl PullRequestSource for GitHubClient {
    async fn get_authenticated_user(&self) -> Result<GitHubUser> {
        self.viewer
            .get_or_try_init(|| async {
                debug!("Fetching authenticated user");
                let user: GitHubUser = self.octocrab.get("/user", None::<&()>).await.map_err(
                    |e| WrappedError::AuthError(format!("Failed to get user: {}", e)),
                )?;
                Ok::<_, WrappedError>(user)
            })
            .await
            .cloned()
    }

    async fn list_pull_requests(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PullRequest>> {
        self.pager().list(from, to).await
    }

    async fn list_organizations(&self) -> Result<Vec<Organization>> {
        debug!("Fetching organizations");

        let orgs: Vec<Organization> = self
            .octocrab
            .get("/user/orgs", None::<&()>)
            .await
            .map_err(|e| WrappedError::ApiError(format!("Failed to list organizations: {}", e)))?;

        Ok(orgs)
    }
}

/// Walks the viewer's pull request contributions one GraphQL page at a time.
pub struct ContributionPager<'a, Q: ?Sized> {
    transport: &'a Q,
    pages: &'a PageConfig,
    page_delay: Duration,
    host: &'a str,
}

impl<'a, Q> ContributionPager<'a, Q>
where
    Q: GraphQlTransport + ?Sized + Sync,
{
    pub fn new(
        transport: &'a Q,
        pages: &'a PageConfig,
        page_delay: Duration,
        host: &'a str,
    ) -> Self {
        Self {
            transport,
            pages,
            page_delay,
            host,
        }
    }

    fn page_variables(&self) -> serde_json::Value {
        json!({
            "reviewsFirst": self.pages.reviews_per_page,
            "commentsFirst": self.pages.review_comments_per_page,
        })
    }

    pub async fn list(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<PullRequest>> {
        info!("Collecting pull requests from {} to {}", from, to);

        let query = contributions_query();
        let mut pull_requests = Vec::new();
        let mut cursor: Option<String> = None;
        let mut page = 1u32;

        loop {
            let mut variables = self.page_variables();
            variables["from"] = json!(from.to_rfc3339());
            variables["to"] = json!(to.to_rfc3339());
            variables["first"] = json!(self.pages.pull_requests_per_page);
            variables["after"] = json!(cursor);

            debug!("Fetching page {} of pull request contributions", page);
            let data: ContributionsData = run_query(self.transport, &query, variables).await?;
            let contributions = data.viewer.contributions_collection.pull_request_contributions;

            if contributions.total_count == 0 {
                break;
            }

            let next_cursor = contributions.page_info.next_cursor().map(str::to_string);

            for node in contributions.nodes {
                let (mut pr, more_reviews) = convert_pull_request(node.pull_request, self.host)?;
                if let Some(after) = more_reviews {
                    let extra = self.fetch_remaining_reviews(&pr.id, after).await?;
                    pr.reviews.extend(extra);
                }

                debug!(
                    "{}#{} {:?} created={} merged={:?}",
                    pr.repository, pr.number, pr.title, pr.created_at, pr.merged_at
                );
                pull_requests.push(pr);
            }

            match next_cursor {
                Some(next) => {
                    cursor = Some(next);
                    page += 1;
                    sleep(self.page_delay).await;
                }
                None => break,
            }
        }

        info!("Collected {} pull requests", pull_requests.len());
        Ok(pull_requests)
    }

    /// Follows the review cursor of one pull request until it runs out.
    async fn fetch_remaining_reviews(&self, pr_id: &str, after: String) -> Result<Vec<PrReview>> {
        let query = reviews_query();
        let mut reviews = Vec::new();
        let mut cursor = Some(after);

        while let Some(after) = cursor.take() {
            sleep(self.page_delay).await;
            debug!("Fetching more reviews for {} after {}", pr_id, after);

            let mut variables = self.page_variables();
            variables["id"] = json!(pr_id);
            variables["after"] = json!(after);

            let data: ReviewsData = run_query(self.transport, &query, variables).await?;
            let node = data.node.ok_or_else(|| {
                WrappedError::NotFound(format!("Pull request {} disappeared while paging", pr_id))
            })?;

            cursor = node.reviews.page_info.next_cursor().map(str::to_string);
            reviews.extend(convert_reviews(node.reviews.nodes));
        }

        Ok(reviews)
    }
}
