use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use owo_colors::OwoColorize;
use quire_core::{
    Browser, BrowserConfig, ConfigDefaults, Credentials, DEFAULT_USER_AGENT, DetailPages, FetchConfig, HttpBrowser,
    ProgressBoard, RunContext, load_config, run,
};

mod echo;
mod logging;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// How often the progress ticker redraws.
const TICK: Duration = Duration::from_secs(5);

/// Archive newsletter publications to HTML and plain text
#[derive(Parser, Debug)]
#[command(name = "quire")]
#[command(author = "Quire Contributors")]
#[command(version)]
#[command(about = "Archive newsletter publications to HTML and plain text", long_about = None)]
struct Args {
    /// Publication list (JSON)
    #[arg(short, long, default_value = "config.json", value_name = "FILE")]
    config: PathBuf,

    /// Output directory for entries that do not set their own
    #[arg(short, long, default_value = "./archive", value_name = "DIR")]
    output_dir: PathBuf,

    /// Stored browser session (Playwright storage-state JSON)
    #[arg(long, default_value = "storage_state.json", value_name = "FILE")]
    storage_state: PathBuf,

    /// Login email, used when no stored session exists
    #[arg(long, env = "QUIRE_EMAIL", value_name = "EMAIL")]
    email: Option<String>,

    /// Login password, used when no stored session exists
    #[arg(long, env = "QUIRE_PASSWORD", value_name = "PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Skip a publication when login fails instead of continuing anonymously
    #[arg(long)]
    require_login: bool,

    /// When to fetch post pages for their body (never, missing, always)
    #[arg(long, value_name = "MODE")]
    detail_pages: Option<DetailPages>,

    /// Re-process posts that are already archived
    #[arg(long)]
    no_skip_existing: bool,

    /// Listing page timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Post page timeout in seconds
    #[arg(long, default_value = "90", value_name = "SECS")]
    detail_timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Print the resolved publications and exit
    #[arg(long)]
    list: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Also write debug logs to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

impl Args {
    fn config_defaults(&self) -> ConfigDefaults {
        ConfigDefaults {
            output_directory: self.output_dir.clone(),
            skip_existing: !self.no_skip_existing,
            detail_pages: self.detail_pages.unwrap_or_default(),
        }
    }

    fn browser_config(&self) -> BrowserConfig {
        let credentials = match (&self.email, &self.password) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some(Credentials { email: email.clone(), password: password.clone() })
            }
            _ => None,
        };

        BrowserConfig {
            user_agent: self.user_agent.clone().unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            storage_state: Some(self.storage_state.clone()),
            credentials,
            require_login: self.require_login,
            login_timeout: self.timeout,
        }
    }

    fn fetch_config(&self) -> FetchConfig {
        FetchConfig { timeout: self.timeout, detail_timeout: self.detail_timeout, ..Default::default() }
    }
}

/// Redraw in-flight progress until aborted
async fn tick_progress(board: ProgressBoard) {
    let mut interval = tokio::time::interval(TICK);
    interval.tick().await;
    let mut last = Vec::new();

    loop {
        interval.tick().await;
        let snapshot = board.snapshot();
        if !snapshot.is_empty() && snapshot != last {
            echo::print_progress(&snapshot);
            last = snapshot;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    let _log_guard = logging::init_logging(args.verbose, args.log_file.as_deref())?;

    if args.verbose {
        echo::print_banner();
        echo::print_info("Debug logging enabled");
        if let Some(path) = &args.log_file {
            echo::print_info(&format!("Writing debug log to {}", path.display()));
        }
        eprintln!();
    }

    if args.verbose {
        echo::print_step(1, 3, &format!("Loading publications from {}", args.config.display().bright_white()));
    }

    let configs = match load_config(&args.config, &args.config_defaults()) {
        Ok(configs) => configs,
        Err(e) => {
            tracing::error!(error = %e, "failed to load configuration");
            echo::print_error(&e.to_string());
            return Ok(ExitCode::FAILURE);
        }
    };

    tracing::info!(publications = configs.len(), config = %args.config.display(), "loaded configuration");

    if args.list {
        echo::print_publications(&configs);
        return Ok(ExitCode::SUCCESS);
    }

    if configs.is_empty() {
        echo::print_warning("No valid publications in the configuration");
        return Ok(ExitCode::SUCCESS);
    }

    if args.verbose {
        eprintln!("  {} {}", "Publications:".dimmed(), configs.len().to_string().bright_white());
        eprintln!();
        echo::print_step(2, 3, "Opening browser");
    }

    let browser: Arc<dyn Browser> = Arc::new(
        HttpBrowser::new(args.browser_config())
            .with_context(|| format!("Failed to load stored session: {}", args.storage_state.display()))?,
    );

    if args.verbose {
        echo::print_step(3, 3, "Archiving publications");
    }

    let ctx = RunContext::new().with_fetch_config(args.fetch_config());
    let started = Instant::now();
    let ticker = tokio::spawn(tick_progress(ctx.progress.clone()));

    let summaries = run(browser, configs, &ctx).await;
    ticker.abort();

    for summary in &summaries {
        echo::print_summary(summary);
    }

    let downloaded: usize = summaries.iter().map(|s| s.downloaded).sum();
    eprintln!();
    echo::print_success(&format!(
        "Archived {} new posts across {} publications",
        downloaded,
        summaries.len()
    ));
    echo::print_elapsed(started.elapsed());

    Ok(ExitCode::SUCCESS)
}
