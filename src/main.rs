// src/main.rs
// =============================================================================
// This is the entry point of linksnapper.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (tracing), pretty or JSON, always on stderr
// 3. Dispatch to the subcommand handler
//    - serve: load the store, start the health checker, serve the API until
//      SIGINT/SIGTERM, then stop the checker and let its last sweep finish
//    - check: load the store, run one sweep, print the results
// 4. Exit with proper code (0 = success, 1 = unhealthy links, 2 = error)
// =============================================================================

mod api;
mod categories;
mod checker;
mod cli;
mod models;
mod store;
mod sweep;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use checker::{HttpProber, Prober};
use cli::{Cli, Commands, LogFormat, ProbeArgs, StoreArgs};
use models::{HealthStatus, Link};
use store::LinkStore;
use sweep::{run_sweep, HealthChecker};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_format, cli.verbose);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Serve {
            store,
            probe,
            bind,
            check_interval_secs,
            no_health_check,
        } => {
            let interval = Duration::from_secs(check_interval_secs);
            handle_serve(&store, &probe, bind, interval, !no_health_check).await?;
            Ok(0)
        }
        Commands::Check { store, probe, json } => handle_check(&store, &probe, json).await,
    }
}

fn init_tracing(format: LogFormat, verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("linksnapper=debug,tower_http=debug,info")
        } else {
            EnvFilter::new("linksnapper=info,warn")
        }
    });

    // stderr, so `check --json` output on stdout stays parseable
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

async fn open_store(args: &StoreArgs) -> Result<Arc<LinkStore>> {
    let store = LinkStore::load(&args.data_dir)
        .await
        .with_context(|| format!("Failed to initialize store in {}", args.data_dir.display()))?;
    Ok(Arc::new(store))
}

fn build_prober(args: &ProbeArgs) -> Result<Arc<dyn Prober>> {
    let prober = HttpProber::new(&args.prober_config()).context("Failed to create HTTP client")?;
    Ok(Arc::new(prober))
}

// Handles the 'serve' subcommand
async fn handle_serve(
    store_args: &StoreArgs,
    probe_args: &ProbeArgs,
    bind: std::net::SocketAddr,
    interval: Duration,
    health_check: bool,
) -> Result<()> {
    let store = open_store(store_args).await?;
    let prober = build_prober(probe_args)?;

    let checker = Arc::new(HealthChecker::new(
        Arc::clone(&store),
        prober,
        probe_args.checker_config(interval),
    ));
    if health_check {
        checker.start();
    } else {
        info!("background health checks disabled");
    }

    let router = api::create_router(api::AppState {
        store: Arc::clone(&store),
        checker: Arc::clone(&checker),
    });
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!(%bind, "starting server");

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed");

    // stop sweeping even if the server errored, and let the current sweep
    // write its results before we exit
    info!("shutting down");
    checker.shutdown().await;
    served?;

    info!("server stopped gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}

// Handles the 'check' subcommand
//
// Returns:
//   Ok(0) = every link is healthy
//   Ok(1) = at least one link is unhealthy
async fn handle_check(store_args: &StoreArgs, probe_args: &ProbeArgs, json: bool) -> Result<i32> {
    let store = open_store(store_args).await?;
    let prober = build_prober(probe_args)?;

    let links = store.list().await;
    if links.is_empty() {
        if json {
            println!("[]");
        } else {
            println!("✅ No links stored in {}", store.path().display());
        }
        return Ok(0);
    }

    if !json {
        println!("🌐 Checking {} link(s)...\n", links.len());
    }

    let summary = run_sweep(&store, &prober, probe_args.concurrency as usize).await;
    let results = store.list().await;

    print_results(&results, json)?;

    if summary.write_failures > 0 {
        eprintln!(
            "⚠️  {} result(s) could not be saved to {}",
            summary.write_failures,
            store.path().display()
        );
    }

    let unhealthy = results.iter().filter(|l| l.health.is_unhealthy()).count();
    Ok(if unhealthy > 0 { 1 } else { 0 })
}

// Prints the results either as a table or JSON
fn print_results(links: &[Link], json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(links)?;
        println!("{}", json_output);
    } else {
        print_table(links);
    }
    Ok(())
}

// Prints results as a human-readable table in the terminal
fn print_table(links: &[Link]) {
    println!("{:<60} {:<15} {:<30}", "URL", "STATUS", "MESSAGE");
    println!("{}", "=".repeat(105));

    for link in links {
        let url_display = truncate(&link.url, 57);
        println!(
            "{:<60} {:<15} {:<30}",
            url_display,
            format_status(link.health.status),
            health_message(link)
        );
    }

    println!();

    let healthy = links.iter().filter(|l| l.health.is_healthy()).count();
    let unhealthy = links.iter().filter(|l| l.health.is_unhealthy()).count();

    println!("📊 Summary:");
    println!("   ✅ Healthy: {}", healthy);
    println!("   ❌ Unhealthy: {}", unhealthy);
    println!("   📋 Total: {}", links.len());
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

fn health_message(link: &Link) -> String {
    match (&link.health.status_code, &link.health.error) {
        (_, Some(error)) => error.clone(),
        (Some(code), None) => format!("HTTP {}", code),
        (None, None) => String::new(),
    }
}

fn format_status(status: HealthStatus) -> &'static str {
    match status {
        HealthStatus::Healthy => "✅ HEALTHY",
        HealthStatus::Unhealthy => "❌ UNHEALTHY",
        HealthStatus::Unknown => "❔ UNKNOWN",
    }
}
