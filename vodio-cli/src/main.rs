mod output;

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use anyhow::Context;
use bili_api::{BASE_URL, BiliClient, Quality, extract_bvid};
use clap::Parser;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use inquire::Confirm;
use tokio_util::sync::CancellationToken;
use tracing::{Level, error, info};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};
use vodio_engine::{
    DEFAULT_DOWNLOAD_DIR, DownloadManager, DownloadOutcome, DownloaderConfig, ManagerConfig,
    RetryPolicy,
};

use crate::output::ProgressRenderer;

#[derive(Parser, Debug)]
#[command(author, version, about = "Download Bilibili videos and multi-part collections", long_about = None)]
struct Args {
    /// Video URL or bare BV id
    url: String,

    /// Directory downloads are written into
    #[arg(long, default_value = DEFAULT_DOWNLOAD_DIR)]
    dir: PathBuf,

    /// Quality (qn): 16, 32, 64, 74, 80, 112, 116 or 120
    #[arg(long)]
    quality: Option<u32>,

    /// Attempts per item before giving up
    #[arg(long, default_value_t = 3)]
    retries: u32,

    /// Download every part of a collection without asking
    #[arg(short = 'y', long)]
    yes: bool,

    /// Download only the first part of a collection
    #[arg(long, conflicts_with = "yes")]
    first_only: bool,

    /// Print the final summary as JSON
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    match run(args).await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            error!("application error: {e:#}");
            eprintln!("{} {e:#}", "Error:".red().bold());
            process::exit(1);
        }
    }
}

async fn run(args: Args) -> anyhow::Result<bool> {
    let quality = match args.quality {
        Some(qn) => Quality::try_from(qn).map_err(anyhow::Error::msg)?,
        None => Quality::default(),
    };
    let bvid = extract_bvid(&args.url)?.to_string();

    let token = CancellationToken::new();
    let interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping after the current block");
            interrupt.cancel();
        }
    });

    let resolver = BiliClient::new()?;
    let config = ManagerConfig {
        download_dir: args.dir.clone(),
        quality: quality as u32,
        retry: RetryPolicy::with_max_attempts(args.retries),
        downloader: DownloaderConfig {
            referer: Some(BASE_URL.to_string()),
            ..Default::default()
        },
    };
    let manager = DownloadManager::new(resolver, config)?;

    let pb = spinner("Fetching video information...");
    let meta = manager.fetch_meta(&bvid).await;
    pb.finish_and_clear();
    let meta = meta.with_context(|| format!("failed to resolve {bvid}"))?;

    if !args.quiet {
        println!("{} {}", "Title:".green(), meta.title.cyan());
        if meta.is_collection() {
            println!(
                "{} {}",
                "Parts:".green(),
                meta.parts.len().to_string().cyan()
            );
        }
    }

    let whole_collection = if !meta.is_collection() {
        true
    } else if args.first_only {
        false
    } else if args.yes {
        true
    } else {
        Confirm::new("This is a multi-part collection. Download every part?")
            .with_default(true)
            .prompt()
            .context("collection prompt failed")?
    };

    let quiet = args.quiet;
    let worker_token = token.clone();
    let handle = tokio::spawn(async move {
        let renderer = ProgressRenderer::new(quiet);
        if whole_collection {
            manager
                .download_video(&bvid, &meta, &renderer, &worker_token)
                .await
        } else {
            manager
                .download_first_part(&bvid, &meta, &renderer, &worker_token)
                .await
                .map(DownloadOutcome::Single)
        }
    });
    let outcome = handle.await.context("download task ended unexpectedly")??;

    match outcome {
        DownloadOutcome::Single(path) => {
            if args.json {
                let summary = serde_json::json!({ "success": 1, "path": path });
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!(
                    "{} {}",
                    "Saved:".green().bold(),
                    path.display().to_string().cyan()
                );
            }
            Ok(true)
        }
        DownloadOutcome::Collection(result) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!(
                    "{} {} of {} items downloaded",
                    "Done:".green().bold(),
                    result.success.to_string().cyan(),
                    result.total().to_string().cyan()
                );
                for title in &result.failed {
                    let retries = result.retry_info.get(title).copied().unwrap_or(0);
                    println!(
                        "  {} {title} ({retries} failed attempts)",
                        "failed:".red()
                    );
                }
            }
            Ok(result.all_succeeded())
        }
    }
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap()
            .tick_strings(&[
                "▹▹▹▹▹",
                "▸▹▹▹▹",
                "▹▸▹▹▹",
                "▹▹▸▹▹",
                "▹▹▹▸▹",
                "▹▹▹▹▸",
                "▪▪▪▪▪",
            ]),
    );
    pb.set_message(message.to_string());
    pb
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_level(verbose))
        .init();
}
