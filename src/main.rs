use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use log::{debug, LevelFilter};

use gh_wrapped::config::{debug_from_env, DEFAULT_TOP_N, DEFAULT_YEAR};
use gh_wrapped::{write_report, write_report_json, GitHubWrappedBuilder, WrapConfig};

#[derive(Parser, Debug)]
#[command(name = "gh-wrapped")]
#[command(about = "Your year of GitHub pull requests, wrapped", version)]
struct Cli {
    /// Calendar year to summarize
    #[arg(short = 'y', long, default_value_t = DEFAULT_YEAR)]
    year: i32,

    /// Whether to include pull requests on private repositories
    #[arg(long, default_value_t = true, action = ArgAction::Set, value_name = "BOOL")]
    include_private: bool,

    /// Number of entries in each top list
    #[arg(short = 'n', long = "top", default_value_t = DEFAULT_TOP_N, value_name = "NUM")]
    top_n: usize,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Also list the organizations you belong to
    #[arg(long)]
    orgs: bool,

    /// Enable debug logging (same as DEBUG=true)
    #[arg(long)]
    debug: bool,
}

impl Cli {
    fn wrap_config(&self) -> WrapConfig {
        WrapConfig {
            year: self.year,
            include_private: self.include_private,
            top_n: self.top_n,
            debug: self.debug || debug_from_env(),
        }
    }
}

/// `GH_HOST` names the web host used in pull request links.
fn host_from_env() -> Option<String> {
    std::env::var("GH_HOST")
        .ok()
        .map(|host| host.trim().to_string())
        .filter(|host| !host.is_empty())
}

fn client_builder(host: Option<String>) -> GitHubWrappedBuilder {
    let builder = GitHubWrappedBuilder::new();
    match host {
        Some(host) => builder.host(host),
        None => builder,
    }
}

fn init_logger(debug: bool) {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_target(debug)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.wrap_config();
    init_logger(config.debug);
    debug!("{:?}", config);

    let wrapped = client_builder(host_from_env())
        .build()
        .context("Failed to create GitHub client")?;

    if cli.orgs {
        let orgs = wrapped
            .organizations()
            .await
            .context("Failed to list organizations")?;
        for org in &orgs {
            println!("{}", org.login);
        }
    }

    let report = wrapped
        .wrap(&config)
        .await
        .with_context(|| format!("Failed to wrap pull requests for {}", config.year))?;

    if config.debug {
        if let Ok(rate_limit) = wrapped.get_rate_limit().await {
            debug!("{}", rate_limit);
        }
    }

    let mut stdout = std::io::stdout().lock();
    if cli.json {
        write_report_json(&report, &mut stdout)?;
    } else {
        write_report(&report, &mut stdout)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["gh-wrapped"]).unwrap();
        assert_eq!(cli.year, DEFAULT_YEAR);
        assert!(cli.include_private);
        assert_eq!(cli.top_n, 3);
        assert!(!cli.json);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "gh-wrapped",
            "--year",
            "2024",
            "--include-private",
            "false",
            "--top",
            "5",
            "--json",
            "--debug",
        ])
        .unwrap();
        let config = cli.wrap_config();
        assert_eq!(config.year, 2024);
        assert!(!config.include_private);
        assert_eq!(config.top_n, 5);
        assert!(config.debug);
        assert!(cli.json);
    }

    #[test]
    fn test_client_builder_host() {
        let builder = client_builder(Some("ghe.example.com".to_string()));
        assert_eq!(builder.config().github.host, "ghe.example.com");

        let builder = client_builder(None);
        assert_eq!(builder.config().github.host, "github.com");
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
