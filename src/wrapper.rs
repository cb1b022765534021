//! Turns a year of pull requests into a [`WrappedReport`].

use log::{debug, info};
use serde::Serialize;

use crate::config::{WrapConfig, DEFAULT_TOP_N};
use crate::error::Result;
use crate::filters::{
    is_closed_in_year, is_merged_in_year, is_open_in_year, retain_visible, ContributionWindow,
};
use crate::ranking::{count_ranking, most_frequent, top_n_by_key, RankingItem, SortOrder};
use crate::source::PullRequestSource;
use crate::stats::DurationStats;
use crate::types::{PullRequest, PullRequestRef, Repository};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryOptions {
    pub year: i32,
    pub login: String,
    pub top_n: usize,
}

impl SummaryOptions {
    pub fn new(year: i32, login: impl Into<String>) -> Self {
        Self {
            year,
            login: login.into(),
            top_n: DEFAULT_TOP_N,
        }
    }

    pub fn top_n(mut self, n: usize) -> Self {
        self.top_n = n;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WrappedReport {
    pub login: String,
    pub year: i32,
    /// Every pull request handed to the summary.
    pub total_count: usize,
    /// Created and merged within the year.
    pub merged_count: usize,
    /// Created and closed without merging within the year.
    pub closed_count: usize,
    /// Created within the year and still open.
    pub open_count: usize,
    pub shortest: Vec<PullRequestRef>,
    pub longest: Vec<PullRequestRef>,
    /// `None` when no pull request has a merge duration.
    pub duration_stats: Option<DurationStats>,
    pub most_commented: Vec<RankingItem<PullRequestRef>>,
    pub most_commits: Vec<RankingItem<PullRequestRef>>,
    pub submission_ranking: Vec<RankingItem<Repository>>,
    /// Most frequent review author. Counts the viewer's own reviews, the reviews
    /// GitHub creates for thread replies, and `ghost` for deleted accounts.
    pub most_reviewed_by: Option<String>,
}

/// Aggregates `pull_requests` into a report. Fails only for `top_n == 0`.
pub fn summarize(pull_requests: &[PullRequest], options: &SummaryOptions) -> Result<WrappedReport> {
    let year = options.year;
    let n = options.top_n;

    let merged_count = pull_requests
        .iter()
        .filter(|pr| is_merged_in_year(pr, year))
        .count();
    let closed_count = pull_requests
        .iter()
        .filter(|pr| is_closed_in_year(pr, year))
        .count();
    let open_count = pull_requests
        .iter()
        .filter(|pr| is_open_in_year(pr, year))
        .count();

    let shortest = top_n_by_key(pull_requests, n, SortOrder::Ascending, PullRequest::duration)?;
    let longest = top_n_by_key(pull_requests, n, SortOrder::Descending, PullRequest::duration)?;

    let durations: Vec<_> = pull_requests.iter().filter_map(PullRequest::duration).collect();
    let duration_stats = DurationStats::from_durations(&durations);

    let most_commented = top_n_by_key(pull_requests, n, SortOrder::Descending, |pr| {
        Some(pr.comments_count)
    })?;
    let most_commits = top_n_by_key(pull_requests, n, SortOrder::Descending, |pr| {
        Some(pr.commits_count)
    })?;

    let submission_ranking = count_ranking(pull_requests.iter().map(|pr| pr.repository.clone()));

    let most_reviewed_by = most_frequent(
        pull_requests
            .iter()
            .flat_map(|pr| pr.reviews.iter())
            .map(|review| review.author.as_str()),
    )
    .map(str::to_string);

    debug!(
        "Summarized {} pull requests for {} ({} with a merge duration)",
        pull_requests.len(),
        year,
        durations.len()
    );

    Ok(WrappedReport {
        login: options.login.clone(),
        year,
        total_count: pull_requests.len(),
        merged_count,
        closed_count,
        open_count,
        shortest: shortest.into_iter().map(PullRequest::to_ref).collect(),
        longest: longest.into_iter().map(PullRequest::to_ref).collect(),
        duration_stats,
        most_commented: most_commented
            .into_iter()
            .map(|pr| RankingItem {
                item: pr.to_ref(),
                value: pr.comments_count as usize,
            })
            .collect(),
        most_commits: most_commits
            .into_iter()
            .map(|pr| RankingItem {
                item: pr.to_ref(),
                value: pr.commits_count as usize,
            })
            .collect(),
        submission_ranking,
        most_reviewed_by,
    })
}

/// Fetches the viewer and their pull requests for `config.year`, then summarizes.
///
/// Any fetch error aborts the run before aggregation.
pub async fn wrap_pull_requests<S>(source: &S, config: &WrapConfig) -> Result<WrappedReport>
where
    S: PullRequestSource + Sync,
{
    let window = ContributionWindow::for_year(config.year)?;
    let viewer = source.get_authenticated_user().await?;
    info!("Running as {}", viewer.login);

    let pull_requests = source.list_pull_requests(window.from, window.to).await?;
    let fetched = pull_requests.len();
    let pull_requests = retain_visible(pull_requests, config.include_private);
    if pull_requests.len() != fetched {
        info!(
            "Skipped {} pull requests on private repositories",
            fetched - pull_requests.len()
        );
    }

    let options = SummaryOptions::new(config.year, viewer.login).top_n(config.top_n);
    summarize(&pull_requests, &options)
}
