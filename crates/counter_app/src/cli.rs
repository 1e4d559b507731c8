use std::path::PathBuf;
use std::time::Duration;

use clap::builder::RangedU64ValueParser;
use clap::Parser;
use counter_core::RepositoryFilter;
use counter_engine::{
    AggregateSettings, Credentials, FetchSettings, PagingSettings, RunConfig, DEFAULT_CONCURRENCY,
    MAX_CONCURRENCY,
};
use engine_logging::LogDestination;
use log::LevelFilter;

/// Count the components of every repository in a Nexus repository manager.
///
/// The ranked result is rewritten after each repository completes, so the
/// output file is usable while the run is still in progress.
#[derive(Debug, Parser)]
#[command(name = "component-counter", version)]
pub struct Cli {
    /// Base URL of the REST API, e.g. https://nexus.example.com/service/rest/v1
    #[arg(long)]
    pub url: String,

    /// Only count repositories of this type (hosted, proxy, group, ...)
    #[arg(long = "type", value_name = "TYPE")]
    pub repo_type: Option<String>,

    /// Only count repositories of this format (npm, maven2, docker, ...)
    #[arg(long)]
    pub format: Option<String>,

    /// Repositories paginated at the same time
    #[arg(
        long,
        default_value_t = DEFAULT_CONCURRENCY,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..=MAX_CONCURRENCY as u64)
    )]
    pub concurrency: usize,

    /// Directory receiving `<type>_<format>_components.json`
    #[arg(long, default_value = "./")]
    pub output_dir: PathBuf,

    #[arg(long, env = "NEXUS_USERNAME")]
    pub username: Option<String>,

    #[arg(long, env = "NEXUS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Give up on a repository that still has pages after this many
    #[arg(
        long,
        default_value_t = PagingSettings::default().max_pages,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub max_pages: usize,

    /// Total time allowed for one HTTP request
    #[arg(long, value_name = "SECS", default_value_t = 300)]
    pub request_timeout: u64,

    /// Also write the log to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log debug details
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Requests are unauthenticated unless a username is given.
    pub fn credentials(&self) -> Option<Credentials> {
        self.username.as_ref().map(|username| {
            Credentials::new(username.clone(), self.password.clone().unwrap_or_default())
        })
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            request_timeout: Duration::from_secs(self.request_timeout),
            credentials: self.credentials(),
            ..FetchSettings::default()
        }
    }

    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            base_url: self.url.clone(),
            filter: RepositoryFilter::new(self.repo_type.clone(), self.format.clone()),
            output_dir: self.output_dir.clone(),
            aggregate: AggregateSettings {
                concurrency: self.concurrency,
                paging: PagingSettings {
                    max_pages: self.max_pages,
                },
            },
        }
    }

    pub fn log_destination(&self) -> LogDestination {
        match &self.log_file {
            Some(path) => LogDestination::Both(path.clone()),
            None => LogDestination::Terminal,
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serial_test::serial;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(
            ["component-counter"]
                .iter()
                .chain(args)
                .copied()
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_match_documented_values() {
        let cli = parse(&["--url", "https://nexus/service/rest/v1"]).unwrap();
        let config = cli.run_config();
        assert_eq!(config.base_url, "https://nexus/service/rest/v1");
        assert_eq!(config.aggregate.concurrency, 10);
        assert_eq!(config.aggregate.paging.max_pages, 100_000);
        assert_eq!(config.output_dir, PathBuf::from("./"));
        assert_eq!(
            config.output_path(),
            PathBuf::from("./").join("all_all_components.json")
        );
        assert_eq!(cli.fetch_settings().request_timeout, Duration::from_secs(300));
        assert_eq!(cli.log_destination(), LogDestination::Terminal);
        assert_eq!(cli.log_level(), LevelFilter::Info);
    }

    #[test]
    fn filters_select_output_name() {
        let cli = parse(&[
            "--url",
            "http://localhost:8081/service/rest/v1",
            "--type",
            "hosted",
            "--format",
            "npm",
            "--output-dir",
            "out",
        ])
        .unwrap();
        assert_eq!(
            cli.run_config().output_path(),
            PathBuf::from("out").join("hosted_npm_components.json")
        );
    }

    #[test]
    fn url_is_required() {
        assert!(parse(&[]).is_err());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        assert!(parse(&["--url", "http://nexus", "--concurrency", "0"]).is_err());
        let cli = parse(&["--url", "http://nexus", "--concurrency", "3"]).unwrap();
        assert_eq!(cli.concurrency, 3);
    }

    #[test]
    fn concurrency_above_limiter_capacity_is_rejected() {
        let too_many = (MAX_CONCURRENCY as u64 + 1).to_string();
        assert!(parse(&["--url", "http://nexus", "--concurrency", &too_many]).is_err());
        let max = MAX_CONCURRENCY.to_string();
        let cli = parse(&["--url", "http://nexus", "--concurrency", &max]).unwrap();
        assert_eq!(cli.run_config().aggregate.concurrency, MAX_CONCURRENCY);
    }

    #[test]
    #[serial]
    fn credentials_are_read_from_environment() {
        std::env::set_var("NEXUS_USERNAME", "reader");
        std::env::set_var("NEXUS_PASSWORD", "from-env");
        let cli = parse(&["--url", "http://nexus"]);
        std::env::remove_var("NEXUS_USERNAME");
        std::env::remove_var("NEXUS_PASSWORD");

        assert_eq!(
            cli.unwrap().fetch_settings().credentials,
            Some(Credentials::new("reader", "from-env"))
        );
    }

    #[test]
    #[serial]
    fn flags_override_environment_credentials() {
        std::env::set_var("NEXUS_USERNAME", "reader");
        std::env::set_var("NEXUS_PASSWORD", "from-env");
        let cli = parse(&[
            "--url",
            "http://nexus",
            "--username",
            "admin",
            "--password",
            "admin123",
        ]);
        std::env::remove_var("NEXUS_USERNAME");
        std::env::remove_var("NEXUS_PASSWORD");

        assert_eq!(
            cli.unwrap().fetch_settings().credentials,
            Some(Credentials::new("admin", "admin123"))
        );
    }

    #[test]
    fn explicit_credentials_reach_fetch_settings() {
        let cli = parse(&[
            "--url",
            "http://nexus",
            "--username",
            "admin",
            "--password",
            "admin123",
        ])
        .unwrap();
        assert_eq!(
            cli.fetch_settings().credentials,
            Some(Credentials::new("admin", "admin123"))
        );
    }

    #[test]
    fn log_file_logs_to_both() {
        let cli = parse(&["--url", "http://nexus", "--log-file", "run.log", "-v"]).unwrap();
        assert_eq!(
            cli.log_destination(),
            LogDestination::Both(PathBuf::from("run.log"))
        );
        assert_eq!(cli.log_level(), LevelFilter::Debug);
    }
}
