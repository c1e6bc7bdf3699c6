// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands:
// - serve: run the HTTP API with the background health checker
// - check: probe every stored link once, print a report and exit
//
// Every tunable has a default, so `linksnapper serve` on its own is a working
// setup: links in ./data, API on port 8080, a sweep every 48 hours.
// =============================================================================

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::checker::ProberConfig;
use crate::sweep::CheckerConfig;

#[derive(Parser, Debug)]
#[command(
    name = "linksnapper",
    version,
    about = "A bookmark manager that keeps checking your links still work",
    long_about = "linksnapper stores bookmarks in a category tree, serves them over a JSON API \
                  and periodically checks that every stored URL still answers."
)]
pub struct Cli {
    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,

    /// Log at debug level (RUST_LOG overrides this)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the bookmark API and check links in the background
    ///
    /// Example: linksnapper serve --data-dir ~/.linksnapper --bind 127.0.0.1:8080
    Serve {
        #[command(flatten)]
        store: StoreArgs,

        #[command(flatten)]
        probe: ProbeArgs,

        /// Address the HTTP server listens on
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: SocketAddr,

        /// Seconds between health sweeps (default: 48 hours)
        #[arg(long, default_value_t = 172_800, value_parser = clap::value_parser!(u64).range(1..))]
        check_interval_secs: u64,

        /// Don't run the background health checker
        #[arg(long)]
        no_health_check: bool,
    },

    /// Check every stored link once and report the results
    ///
    /// Exits with 1 if any link is unhealthy.
    Check {
        #[command(flatten)]
        store: StoreArgs,

        #[command(flatten)]
        probe: ProbeArgs,

        /// Output results in JSON format instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Directory holding links.json (created if missing)
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ProbeArgs {
    /// Maximum number of links probed at the same time
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub concurrency: u64,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub probe_timeout_secs: u64,

    /// Redirects to follow before taking the response as final
    #[arg(long, default_value_t = 10)]
    pub max_redirects: usize,
}

impl ProbeArgs {
    pub fn prober_config(&self) -> ProberConfig {
        ProberConfig {
            timeout: Duration::from_secs(self.probe_timeout_secs),
            max_redirects: self.max_redirects,
        }
    }

    pub fn checker_config(&self, interval: Duration) -> CheckerConfig {
        CheckerConfig {
            interval,
            concurrency: self.concurrency as usize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::parse_from(["linksnapper", "serve"]);
        assert_eq!(cli.log_format, LogFormat::Pretty);
        match cli.command {
            Commands::Serve {
                store,
                probe,
                bind,
                check_interval_secs,
                no_health_check,
            } => {
                assert_eq!(store.data_dir, PathBuf::from("data"));
                assert_eq!(bind, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
                assert_eq!(check_interval_secs, 48 * 60 * 60);
                assert!(!no_health_check);

                let checker = probe.checker_config(Duration::from_secs(check_interval_secs));
                assert_eq!(checker.concurrency, 10);
                let prober = probe.prober_config();
                assert_eq!(prober.timeout, Duration::from_secs(10));
                assert_eq!(prober.max_redirects, 10);
            }
            other => panic!("expected serve, got {:?}", other),
        }
    }

    #[test]
    fn test_check_flags() {
        let cli = Cli::parse_from([
            "linksnapper",
            "check",
            "--data-dir",
            "/tmp/links",
            "--concurrency",
            "3",
            "--json",
            "--log-format",
            "json",
        ]);
        assert_eq!(cli.log_format, LogFormat::Json);
        match cli.command {
            Commands::Check { store, probe, json } => {
                assert_eq!(store.data_dir, PathBuf::from("/tmp/links"));
                assert_eq!(probe.concurrency, 3);
                assert!(json);
            }
            other => panic!("expected check, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let result = Cli::try_parse_from(["linksnapper", "check", "--concurrency", "0"]);
        assert!(result.is_err());
    }
}
