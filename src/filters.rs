use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WrappedError};
use crate::types::{PullRequest, PullRequestState};

/// The `[from, to]` range of contributions fetched for one report year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl ContributionWindow {
    pub fn for_year(year: i32) -> Result<Self> {
        let from = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single();
        let to = Utc.with_ymd_and_hms(year, 12, 31, 23, 59, 59).single();

        match (from, to) {
            (Some(from), Some(to)) => Ok(Self { from, to }),
            _ => Err(WrappedError::ConfigError(format!(
                "Year {} is out of range",
                year
            ))),
        }
    }
}

/// Created in `year` and merged in `year`. A missing merge time passes.
pub fn is_merged_in_year(pr: &PullRequest, year: i32) -> bool {
    pr.created_in(year)
        && pr.merged_at.map_or(true, |merged_at| merged_at.year() == year)
        && pr.state == PullRequestState::Merged
}

/// Created in `year` and closed unmerged in `year`. A missing close time passes.
pub fn is_closed_in_year(pr: &PullRequest, year: i32) -> bool {
    pr.created_in(year)
        && pr.closed_at.map_or(true, |closed_at| closed_at.year() == year)
        && pr.state == PullRequestState::Closed
}

pub fn is_open_in_year(pr: &PullRequest, year: i32) -> bool {
    pr.created_in(year) && pr.state == PullRequestState::Open
}

/// Drops pull requests on private repositories unless `include_private`.
pub fn retain_visible(prs: Vec<PullRequest>, include_private: bool) -> Vec<PullRequest> {
    if include_private {
        return prs;
    }
    prs.into_iter().filter(|pr| !pr.is_private).collect()
}
