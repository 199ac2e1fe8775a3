///
/// This module implements the CLI interface for image-poster: command parsing,
/// argument exposure and the async entrypoint shared by `main` and the tests.
///
/// All pipeline logic (posted set, scanning, selection, orchestration) lives in
/// the [`image-poster-core`] crate. This module only wires settings, credentials
/// and the X client into it.
///
/// ## How To Use
/// - From a scheduler: `image-poster post --root /srv/image-bot`.
/// - To check what is left: `image-poster status`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`image-poster-core`]: ../../image-poster-core/
use crate::client::XClient;
use crate::load_config::{load_credentials, load_settings};
use anyhow::Result;
use clap::{Parser, Subcommand};
use image_poster_core::run::{plan_batch, post_batch};
use image_poster_core::scan::inventory;
use image_poster_core::select::BATCH_SIZE;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

/// CLI for image-poster: post unposted images from a local pool to X.
#[derive(Parser)]
#[clap(
    name = "image-poster",
    version,
    about = "Post batches of unposted images from a local pool to X and archive them"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload four unposted images, publish them as one post and archive them
    Post {
        /// Optional YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
        /// Directory holding images/, posted/ and posted.json
        #[clap(long)]
        root: Option<PathBuf>,
        /// Only show which images would be posted
        #[clap(long)]
        dry_run: bool,
    },
    /// Show how many images were posted and how many are left
    Status {
        /// Optional YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
        /// Directory holding images/, posted/ and posted.json
        #[clap(long)]
        root: Option<PathBuf>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Post {
            config,
            root,
            dry_run,
        } => {
            let settings = load_settings(config.as_deref(), root.as_deref())?;
            let mut rng = StdRng::from_entropy();

            if dry_run {
                let batch = plan_batch(&settings.layout, &mut rng)?;
                tracing::info!(command = "post", dry_run, "Planned batch without publishing");
                println!("Dry run, would post:");
                for candidate in &batch.candidates {
                    println!("  {}", candidate.id);
                }
                return Ok(());
            }

            let credentials = load_credentials()?;
            let client = XClient::new(credentials, &settings.endpoints)
                .map_err(|e| anyhow::anyhow!("Failed to construct X client: {e}"))?;
            tracing::info!(command = "post", "Starting post run");
            match post_batch(&settings.layout, &client, &mut rng).await {
                Ok(report) => {
                    tracing::info!(command = "post", ?report, "Post run complete");
                    println!("Posted OK");
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "post", error = %e, "Post run failed");
                    Err(e.into())
                }
            }
        }
        Commands::Status { config, root } => {
            let settings = load_settings(config.as_deref(), root.as_deref())?;
            let counts = inventory(&settings.layout)?;
            tracing::info!(command = "status", ?counts, "Inventory complete");
            println!("posted: {}", counts.posted);
            println!("unposted: {}", counts.unposted);
            if counts.unposted < BATCH_SIZE {
                println!("fewer than {BATCH_SIZE} unposted images left, the next post will fail");
            }
            Ok(())
        }
    }
}
