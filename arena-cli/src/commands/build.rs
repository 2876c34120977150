use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use arena_core::{archive_file_name, ArenaConfig, BuildStatus, BuildTracker};
use clap::Args;
use colored::Colorize;

#[derive(Args)]
pub struct BuildArgs {
    #[arg(long, help = "Requirements session to build from")]
    pub session: String,

    #[arg(long, default_value = "", help = "Project brief, used to name the archive")]
    pub brief: String,

    #[arg(short, long, default_value = ".", help = "Directory to save the archive in")]
    pub output: PathBuf,

    #[arg(long, default_value = "600", help = "Give up after this many seconds")]
    pub timeout: u64,

    #[arg(long, help = "Arena server URL (overrides client.server_url)")]
    pub server: Option<String>,
}

pub async fn cmd_build(config: &ArenaConfig, args: BuildArgs) -> Result<()> {
    let server = args
        .server
        .clone()
        .unwrap_or_else(|| config.client.server_url.clone());
    let tracker = BuildTracker::new(
        server,
        Duration::from_millis(config.client.build_poll_interval_ms),
    );

    println!("{} {}", "→".blue(), "Queueing build...".cyan());
    let build_id = tracker.start(&args.session).await?;
    println!("  {} Build id: {}", "→".blue(), build_id.yellow());

    let mut last_status = None;
    let record = tokio::time::timeout(
        Duration::from_secs(args.timeout),
        tracker.wait_for_completion(&build_id, |record| {
            if last_status != Some(record.status) {
                last_status = Some(record.status);
                println!(
                    "  {} {} {}",
                    "·".dimmed(),
                    record.status.to_string().bold(),
                    record.message.as_deref().unwrap_or_default().dimmed()
                );
            }
        }),
    )
    .await
    .map_err(|_| anyhow!("Build {} did not finish within {}s", build_id, args.timeout))??;

    if record.status == BuildStatus::Failed {
        return Err(anyhow!(
            "Build failed: {}",
            record.message.unwrap_or_else(|| "no details".to_string())
        ));
    }

    let archive = tracker.download(&build_id).await?;
    let path = args.output.join(archive_file_name(&args.brief));
    std::fs::write(&path, &archive)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!(
        "{} Archive saved to {} ({} bytes)",
        "✓".green().bold(),
        path.display(),
        archive.len()
    );
    Ok(())
}
