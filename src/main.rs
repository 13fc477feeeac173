mod changelog;
mod config;
mod pipeline;
mod pr;
mod report;

use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::EnvFilter;

use crate::config::{Config, Overrides};
use crate::pr::{FixtureFetcher, GitHubClient, PageFetcher};

const MOCK_REPOSITORY: &str = "octo-org/demo";

/// PR Changelog: builds a grouped markdown changelog from the `<added>`,
/// `<changed>` and `<fixed>` sections of recent GitHub Pull Request descriptions.
///
/// Every option can also come from a CI host input (`INPUT_<NAME>`), the
/// environment or .pr-changelog.toml.
#[derive(Parser, Debug)]
#[command(name = "pr-changelog", version, about)]
struct Cli {
    /// GitHub API token (falls back to GITHUB_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// Repository as owner/name (falls back to GITHUB_REPOSITORY)
    #[arg(long = "repo")]
    repository: Option<String>,

    /// Only include PRs targeting this base branch
    #[arg(long)]
    branch: Option<String>,

    /// Lifecycle filter: open, closed or all
    #[arg(long)]
    state: Option<String>,

    /// Look back this many days when no date range is given
    #[arg(long)]
    days_back: Option<String>,

    /// Explicit window as MM/DD/YYYY-MM/DD/YYYY, overrides --days-back
    #[arg(long)]
    date_range: Option<String>,

    /// IANA timezone used to interpret --date-range (default UTC)
    #[arg(long)]
    timezone: Option<String>,

    /// Output base name; `.md` is appended
    #[arg(long)]
    md_output_name: Option<String>,

    /// Output file name, used as-is
    #[arg(long)]
    file_output_name: Option<String>,

    /// GitHub API base URL (falls back to GITHUB_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Config file path (default: .pr-changelog.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use built-in sample PRs for demo purposes (no GitHub token needed)
    #[arg(long)]
    r#mock: bool,

    /// Print the changelog instead of writing the output file
    #[arg(long)]
    stdout: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        let mut repository = self.repository.clone();
        if self.r#mock && repository.is_none() {
            repository = Some(MOCK_REPOSITORY.to_string());
        }
        Overrides {
            token: self.token.clone(),
            repository,
            api_url: self.api_url.clone(),
            branch: self.branch.clone(),
            state: self.state.clone(),
            days_back: self.days_back.clone(),
            date_range: self.date_range.clone(),
            timezone: self.timezone.clone(),
            md_output_name: self.md_output_name.clone(),
            file_output_name: self.file_output_name.clone(),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "changelog generation failed");
            report::outcome::report_failure(&err.to_string());
            ExitCode::FAILURE
        }
    }
}

#[instrument(skip_all, fields(mock = cli.r#mock))]
async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    info!("loading configuration");
    let file_config = Config::load(cli.config.as_deref())?;
    let settings = file_config.resolve(&cli.overrides(), &config::process_env, Utc::now())?;
    debug!(
        repo = %settings.repo,
        state = %settings.policy.state,
        lower = %settings.policy.lower_bound,
        upper = ?settings.policy.upper_bound,
        branch = ?settings.policy.branch,
        "resolved settings"
    );

    let fetcher: Box<dyn PageFetcher> = if cli.r#mock {
        info!("using mock PR data for demo");
        let fixture = include_str!("../tests/fixtures/pulls.json");
        Box::new(FixtureFetcher::from_json(fixture, Utc::now())?)
    } else {
        Box::new(GitHubClient::new(
            &settings.api_url,
            settings.require_token()?,
        ))
    };

    let generated = pipeline::generate(
        &settings.repo,
        &settings.policy,
        fetcher.as_ref(),
        &settings.output_path,
    )
    .await?;
    info!(selected = generated.selected, "changelog rendered");

    if cli.stdout {
        println!("{}", generated.rendered.text);
        return Ok(());
    }

    let path = report::write(&generated.rendered)?;
    report::print_summary(&generated.extraction, &path.display().to_string());
    report::outcome::report_success(&path)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_maps_overrides() {
        let cli = Cli::parse_from([
            "pr-changelog",
            "--repo",
            "org/repo",
            "--state",
            "all",
            "--days-back",
            "14",
            "--md-output-name",
            "NOTES",
        ]);
        let overrides = cli.overrides();
        assert_eq!(overrides.repository.as_deref(), Some("org/repo"));
        assert_eq!(overrides.state.as_deref(), Some("all"));
        assert_eq!(overrides.days_back.as_deref(), Some("14"));
        assert_eq!(overrides.md_output_name.as_deref(), Some("NOTES"));
        assert!(overrides.token.is_none());
    }

    #[test]
    fn test_mock_defaults_repository() {
        let cli = Cli::parse_from(["pr-changelog", "--mock"]);
        assert_eq!(cli.overrides().repository.as_deref(), Some(MOCK_REPOSITORY));
    }

    #[tokio::test]
    async fn test_mock_fixture_produces_changelog() {
        let fixture = include_str!("../tests/fixtures/pulls.json");
        let fetcher = FixtureFetcher::from_json(fixture, Utc::now()).unwrap();
        let settings = Config::default()
            .resolve(
                &Cli::parse_from(["pr-changelog", "--mock"]).overrides(),
                &|_: &str| -> Option<String> { None },
                Utc::now(),
            )
            .unwrap();

        let generated = pipeline::generate(
            &settings.repo,
            &settings.policy,
            &fetcher,
            &settings.output_path,
        )
        .await
        .unwrap();

        assert!(generated.selected > 0);
        assert!(generated.rendered.text.starts_with("## added\n"));
        assert!(generated.rendered.text.contains("### [Add OAuth2 login flow]"));
    }
}
