use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, WrappedError};

pub const DEFAULT_YEAR: i32 = 2023;
pub const DEFAULT_TOP_N: usize = 3;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchConfig {
    pub github: GitHubConfig,
    pub rate_limiting: RateLimitConfig,
    pub pagination: PageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Explicit token; takes precedence over the environment.
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub token_env_var: String,
    pub api_base_url: String,
    pub graphql_url: String,
    /// Web host used to build pull request URLs.
    pub host: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            token_env_var: "GITHUB_TOKEN".to_string(),
            api_base_url: "https://api.github.com".to_string(),
            graphql_url: "https://api.github.com/graphql".to_string(),
            host: "github.com".to_string(),
            user_agent: "gh-wrapped/0.1.0".to_string(),
            timeout_seconds: 10,
        }
    }
}

impl GitHubConfig {
    /// Looks up the token: explicit value, then `token_env_var`, then `GH_TOKEN`.
    pub fn resolve_token(&self) -> Result<String> {
        if let Some(token) = self.token.as_ref().filter(|t| !t.trim().is_empty()) {
            return Ok(token.trim().to_string());
        }

        [self.token_env_var.as_str(), "GH_TOKEN"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .map(|token| token.trim().to_string())
            .find(|token| !token.is_empty())
            .ok_or_else(|| {
                WrappedError::AuthError(format!(
                    "{} environment variable not set",
                    self.token_env_var
                ))
            })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub delay_between_pages_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            delay_between_pages_ms: 1000,
        }
    }
}

impl RateLimitConfig {
    pub fn delay_duration(&self) -> Duration {
        Duration::from_millis(self.delay_between_pages_ms)
    }
}

/// Page sizes for the contributions query and its nested connections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    pub pull_requests_per_page: u32,
    pub reviews_per_page: u32,
    pub review_comments_per_page: u32,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            pull_requests_per_page: 100,
            reviews_per_page: 50,
            review_comments_per_page: 50,
        }
    }
}

/// What to summarize, independent of how it is fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrapConfig {
    pub year: i32,
    pub include_private: bool,
    pub top_n: usize,
    pub debug: bool,
}

impl Default for WrapConfig {
    fn default() -> Self {
        Self {
            year: DEFAULT_YEAR,
            include_private: true,
            top_n: DEFAULT_TOP_N,
            debug: debug_from_env(),
        }
    }
}

/// `DEBUG=true` (any case) turns on debug logging.
pub fn debug_from_env() -> bool {
    std::env::var("DEBUG")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
