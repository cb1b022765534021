//! Summary statistics over pull request durations.

use chrono::Duration;
use serde::{Serialize, Serializer};

/// Average, extremes and percentiles of a non-empty set of durations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DurationStats {
    pub count: usize,
    #[serde(serialize_with = "serialize_seconds")]
    pub average: Duration,
    #[serde(serialize_with = "serialize_seconds")]
    pub min: Duration,
    #[serde(serialize_with = "serialize_seconds")]
    pub max: Duration,
    #[serde(serialize_with = "serialize_seconds")]
    pub p50: Duration,
    #[serde(serialize_with = "serialize_seconds")]
    pub p90: Duration,
    #[serde(serialize_with = "serialize_seconds")]
    pub p99: Duration,
}

impl DurationStats {
    /// Returns `None` when there is nothing to summarize.
    pub fn from_durations(durations: &[Duration]) -> Option<Self> {
        if durations.is_empty() {
            return None;
        }

        let mut millis: Vec<i64> = durations.iter().map(|d| d.num_milliseconds()).collect();
        millis.sort_unstable();

        let total: i128 = millis.iter().map(|&ms| ms as i128).sum();
        let average = (total / millis.len() as i128) as i64;

        Some(Self {
            count: millis.len(),
            average: Duration::milliseconds(average),
            min: Duration::milliseconds(millis[0]),
            max: Duration::milliseconds(millis[millis.len() - 1]),
            p50: Duration::milliseconds(percentile(&millis, 50.0)),
            p90: Duration::milliseconds(percentile(&millis, 90.0)),
            p99: Duration::milliseconds(percentile(&millis, 99.0)),
        })
    }
}

/// Linear interpolation between the closest ranks of a sorted, non-empty sample.
fn percentile(sorted: &[i64], p: f64) -> i64 {
    let rank = (p / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;

    let low = sorted[lower] as f64;
    let high = sorted[upper] as f64;
    (low + (high - low) * weight).round() as i64
}

fn serialize_seconds<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_i64(duration.num_seconds())
}

/// Renders a duration as `3d 4h 5m`, dropping leading zero units.
pub fn humanize(duration: Duration) -> String {
    let total_minutes = duration.num_minutes();
    if total_minutes <= 0 {
        return format!("{}s", duration.num_seconds().max(0));
    }

    let days = total_minutes / (24 * 60);
    let hours = (total_minutes / 60) % 24;
    let minutes = total_minutes % 60;

    match (days, hours) {
        (0, 0) => format!("{}m", minutes),
        (0, _) => format!("{}h {}m", hours, minutes),
        _ => format!("{}d {}h {}m", days, hours, minutes),
    }
}
