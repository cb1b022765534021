use std::io::Write;

use crate::error::Result;
use crate::stats::humanize;
use crate::types::PullRequestRef;
use crate::wrapper::WrappedReport;

fn write_refs<W: Write>(out: &mut W, heading: &str, refs: &[PullRequestRef]) -> Result<()> {
    writeln!(out, "### {}\n", heading)?;
    if refs.is_empty() {
        writeln!(out, "Nothing here.\n")?;
        return Ok(());
    }
    for (rank, pr) in refs.iter().enumerate() {
        writeln!(out, "{}. {} ({})", rank + 1, pr, pr.url)?;
    }
    writeln!(out)?;
    Ok(())
}

/// Writes the report as markdown-ish text.
pub fn write_report<W: Write>(report: &WrappedReport, out: &mut W) -> Result<()> {
    writeln!(out, "## {}'s {} on GitHub\n", report.login, report.year)?;
    writeln!(out, "| Pull requests | Merged | Closed | Open |")?;
    writeln!(out, "|---------------|--------|--------|------|")?;
    writeln!(
        out,
        "| {} | {} | {} | {} |\n",
        report.total_count, report.merged_count, report.closed_count, report.open_count
    )?;

    writeln!(out, "### Time to merge\n")?;
    match &report.duration_stats {
        Some(stats) => {
            writeln!(out, "Across {} merged pull requests:\n", stats.count)?;
            writeln!(out, "- average: {}", humanize(stats.average))?;
            writeln!(out, "- fastest: {}", humanize(stats.min))?;
            writeln!(out, "- slowest: {}", humanize(stats.max))?;
            writeln!(
                out,
                "- p50 / p90 / p99: {} / {} / {}\n",
                humanize(stats.p50),
                humanize(stats.p90),
                humanize(stats.p99)
            )?;
        }
        None => writeln!(out, "No merged pull requests.\n")?,
    }

    write_refs(out, "Merged fastest", &report.shortest)?;
    write_refs(out, "Took the longest", &report.longest)?;

    writeln!(out, "### Most discussed\n")?;
    for entry in &report.most_commented {
        writeln!(out, "- {} comments: {}", entry.value, entry.item)?;
    }
    writeln!(out)?;

    writeln!(out, "### Most commits\n")?;
    for entry in &report.most_commits {
        writeln!(out, "- {} commits: {}", entry.value, entry.item)?;
    }
    writeln!(out)?;

    writeln!(out, "### Where you contributed\n")?;
    for (rank, entry) in report.submission_ranking.iter().enumerate() {
        writeln!(out, "{}. {} ({})", rank + 1, entry.item, entry.value)?;
    }
    writeln!(out)?;

    match &report.most_reviewed_by {
        Some(login) => writeln!(out, "Your most frequent reviewer: @{}", login)?,
        None => writeln!(out, "Nobody reviewed your pull requests this year.")?,
    }

    Ok(())
}

pub fn write_report_json<W: Write>(report: &WrappedReport, out: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}
