pub mod client;
pub mod config;
pub mod display;
pub mod error;
pub mod filters;
pub mod graphql;
pub mod ranking;
pub mod source;
pub mod stats;
pub mod types;
pub mod wrapper;

pub use client::GitHubClient;
pub use config::{FetchConfig, GitHubConfig, PageConfig, RateLimitConfig, WrapConfig};
pub use display::{write_report, write_report_json};
pub use error::{Result, WrappedError};
pub use filters::ContributionWindow;
pub use ranking::RankingItem;
pub use source::PullRequestSource;
pub use stats::DurationStats;
pub use types::{
    GitHubUser, Organization, PrReview, PrReviewComment, PullRequest, PullRequestRef,
    PullRequestState, Repository,
};
pub use wrapper::{summarize, wrap_pull_requests, SummaryOptions, WrappedReport};

pub struct GitHubWrapped {
    client: GitHubClient,
}

impl GitHubWrapped {
    pub fn new(token: Option<String>) -> Result<Self> {
        let mut config = FetchConfig::default();
        config.github.token = token;
        Self::with_config(config)
    }

    pub fn with_config(config: FetchConfig) -> Result<Self> {
        Ok(Self {
            client: GitHubClient::with_config(config)?,
        })
    }

    pub async fn viewer(&self) -> Result<GitHubUser> {
        self.client.get_authenticated_user().await
    }

    pub async fn organizations(&self) -> Result<Vec<Organization>> {
        self.client.list_organizations().await
    }

    pub async fn wrap(&self, config: &WrapConfig) -> Result<WrappedReport> {
        wrap_pull_requests(&self.client, config).await
    }

    pub async fn get_rate_limit(&self) -> Result<String> {
        self.client.get_rate_limit().await
    }
}

pub struct GitHubWrappedBuilder {
    config: FetchConfig,
}

impl GitHubWrappedBuilder {
    pub fn new() -> Self {
        Self {
            config: FetchConfig::default(),
        }
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.github.token = Some(token.into());
        self
    }

    pub fn token_env_var(mut self, var_name: impl Into<String>) -> Self {
        self.config.github.token_env_var = var_name.into();
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.github.api_base_url = url.into();
        self
    }

    pub fn graphql_url(mut self, url: impl Into<String>) -> Self {
        self.config.github.graphql_url = url.into();
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.github.host = host.into();
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.github.user_agent = agent.into();
        self
    }

    pub fn timeout(mut self, seconds: u64) -> Self {
        self.config.github.timeout_seconds = seconds;
        self
    }

    pub fn page_delay_ms(mut self, millis: u64) -> Self {
        self.config.rate_limiting.delay_between_pages_ms = millis;
        self
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn build(self) -> Result<GitHubWrapped> {
        GitHubWrapped::with_config(self.config)
    }
}

impl Default for GitHubWrappedBuilder {
    fn default() -> Self {
        Self::new()
    }
}
