//! Post a message from the command line.
//!
//! The message goes through the same store and after-save broadcast as a
//! web submission. Without Redis the broadcast is relayed to the running
//! server over HTTP.

use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use msgboard_cable::{Broadcaster, HttpRelay, RedisBroadcaster};
use msgboard_core::{BoardError, Config, MessageService};
use std::path::Path;
use std::sync::Arc;

#[derive(Args)]
pub struct PostArgs {
    /// Message text
    pub text: String,

    /// Server to relay the broadcast to when Redis is not configured
    #[arg(long, env = "MSGBOARD_URL")]
    pub server_url: Option<String>,
}

pub async fn execute(args: PostArgs, config: Config, project_dir: &Path) -> Result<()> {
    let pool = msgboard_db::init_pool(&config.database_path(project_dir))?;
    let server_url = args.server_url.unwrap_or_else(|| config.server_url.clone());

    let broadcaster: Arc<dyn Broadcaster> = match &config.redis_url {
        Some(url) => Arc::new(RedisBroadcaster::connect(url).await?),
        None => Arc::new(HttpRelay::with_url(&server_url)),
    };

    let service = MessageService::from_config(pool, broadcaster, &config);
    let message = service.create(&args.text).await.map_err(|e| match e {
        BoardError::Broadcast(_) => anyhow!(
            "{}\n  Is `msgboard serve` running at {}? Pass --broadcast-failure log to save anyway.",
            e,
            server_url
        ),
        e => e.into(),
    })?;

    println!(
        "  {} {} {}",
        "Posted".green().bold(),
        message.content,
        format!("({})", message.id).dimmed()
    );

    Ok(())
}
