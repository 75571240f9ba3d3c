use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use purchase_harvester::config::Config;
use purchase_harvester::credentials::load_credentials;
use purchase_harvester::harvest::{
    ChromiumNavigator, FailurePolicy, HarvestEvent, HarvestReport, Harvester, SkippedItem,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "purchase-harvester")]
#[command(about = "Summarize your Mercado Libre purchases")]
#[command(long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_COMMIT_HASH"), ")"))]
struct Cli {
    /// Readable cookie file in json or txt format
    #[arg(short, long)]
    cookies: PathBuf,

    /// Path to config file
    #[arg(long, default_value = "harvester.toml")]
    config: PathBuf,

    /// Skip pages and purchases that fail to load instead of aborting
    #[arg(long)]
    lenient: bool,

    /// Chrome/Chromium executable to use
    #[arg(long)]
    chrome: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    println!("Welcome to the ML Summary\n");
    println!("Summarize all your purchases: the total spent, the biggest one,");
    println!("the lowest one, and other stats.\n");

    let mut config = Config::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config: {}", cli.config.display()))?;
    if cli.lenient {
        config.harvest.strict = false;
    }
    if let Some(chrome) = cli.chrome {
        config.browser.chrome_path = Some(chrome);
    }

    let credentials = match load_credentials(&cli.cookies) {
        Ok(credentials) => credentials,
        Err(err) => exit_with_error(&err.to_string()),
    };
    println!("Loading {} cookies\n", credentials.len());

    println!("🚀 Initializing web...");
    let navigator = ChromiumNavigator::launch(&config.browser, &credentials).await?;
    let mut harvester = Harvester::new(navigator).with_policy(config.harvest.failure_policy());

    let outcome = harvester.run(print_event).await;
    // The browser is torn down even when the harvest failed.
    let shutdown = harvester.into_navigator().shutdown().await;

    let report = outcome?;
    if let Err(err) = shutdown {
        tracing::warn!(error = %err, "Browser did not shut down cleanly");
    }

    print_report(&report, config.harvest.failure_policy());
    Ok(())
}

/// Used when `RUST_LOG` is unset. chromiumoxide's connection and handler
/// targets log every unparsed CDP event, so they stay off.
const DEFAULT_LOG_FILTER: &str =
    "info,chromiumoxide=warn,chromiumoxide::conn=off,chromiumoxide::handler=off";

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().with_writer(std::io::stderr).json())
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .init();
    }
}

fn exit_with_error(message: &str) -> ! {
    println!("❌ Error: {message}");
    std::process::exit(1);
}

fn print_event(event: &HarvestEvent) {
    match event {
        HarvestEvent::CountResolved { purchases, .. } => {
            println!("🚀 Found ({purchases}) purchases\n");
        }
        HarvestEvent::PageLoading { page } => {
            println!("🚀 Loading purchases, page ({page})..");
        }
        HarvestEvent::PageLoaded { entries, .. } => {
            println!(" Found {entries} purchases");
        }
        HarvestEvent::Classified {
            pending,
            received,
            canceled,
        } => {
            println!();
            println!("🚀 Found {pending} pending purchases");
            println!("🚀 Found {received} received purchases");
            println!("🚀 Found {canceled} canceled purchases");
            println!("🚀 Found {} valid purchases\n", pending + received);
        }
        HarvestEvent::DetailLoading { reference } => {
            println!("🚀 Loading purchase details..");
            println!("URL: {reference}");
        }
        HarvestEvent::Skipped(SkippedItem::Page { page, error }) => {
            println!("⚠️ Skipped page {page}: {error}");
        }
        HarvestEvent::Skipped(SkippedItem::Detail { reference, error }) => {
            println!("⚠️ Skipped purchase {reference}: {error}");
        }
    }
}

fn print_report(report: &HarvestReport, policy: FailurePolicy) {
    let summary = &report.summary;
    println!("\nStats\n");
    println!("🚀 Total purchases: {}", summary.total);
    if let Some(largest) = &summary.largest {
        println!(
            "🚀 Biggest purchase: {} ({}, {})",
            largest.total, largest.id, largest.date
        );
    }
    if let Some(smallest) = &summary.smallest {
        println!(
            "🚀 Lowest purchase: {} ({}, {})",
            smallest.total, smallest.id, smallest.date
        );
    }
    if policy == FailurePolicy::Lenient && !report.skipped.is_empty() {
        println!("⚠️ {} items skipped", report.skipped.len());
    }
}
