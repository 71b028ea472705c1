//! List messages.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use msgboard_cable::CableHub;
use msgboard_core::{Config, MessageService};
use std::path::Path;
use std::sync::Arc;

#[derive(Args)]
pub struct ListArgs {
    /// Show only the N most recent messages
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: ListArgs, config: Config, project_dir: &Path) -> Result<()> {
    let pool = msgboard_db::init_pool(&config.database_path(project_dir))?;
    // Listing never saves, so nothing is published.
    let service = MessageService::new(pool, Arc::new(CableHub::default()));

    let messages = match args.limit {
        Some(limit) => service.list_recent(limit).await?,
        None => service.list_all().await?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    if messages.is_empty() {
        println!("  {}", "No messages yet.".dimmed());
        return Ok(());
    }

    for message in &messages {
        println!("  {}  {}", message.created_at.dimmed(), message.content);
    }

    Ok(())
}
