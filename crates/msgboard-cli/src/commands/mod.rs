//! CLI command definitions and handlers.

use anyhow::Result;
use clap::{Parser, Subcommand};
use msgboard_core::{BroadcastFailurePolicy, Config};
use std::path::PathBuf;

pub mod list;
pub mod post;
pub mod serve;

/// Minimal message board with real-time updates
#[derive(Parser)]
#[command(name = "msgboard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory (defaults to current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Config file (defaults to <project>/.msgboard/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, global = true, env = "MSGBOARD_DB")]
    pub database: Option<PathBuf>,

    /// Redis URL used for broadcasting
    #[arg(long, global = true, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// What to do when a broadcast fails: propagate or log
    #[arg(long, global = true)]
    pub broadcast_failure: Option<BroadcastFailurePolicy>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve(serve::ServeArgs),

    /// Post a message
    Post(post::PostArgs),

    /// List messages, newest first
    List(list::ListArgs),
}

impl Cli {
    /// The project directory, defaulting to the current directory.
    pub fn project_dir(&self) -> Result<PathBuf> {
        match &self.project {
            Some(dir) => Ok(dir.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }

    /// Config file contents with global flags applied on top.
    fn resolve_config(&self, project_dir: &std::path::Path) -> Result<Config> {
        let path = self
            .config
            .clone()
            .unwrap_or_else(|| Config::default_path(project_dir));
        let mut config = Config::load(&path)?;

        if let Some(database) = &self.database {
            config.database = Some(database.clone());
        }
        if let Some(url) = &self.redis_url {
            config.redis_url = Some(url.clone());
        }
        if let Some(policy) = self.broadcast_failure {
            config.broadcast_failure = policy;
        }
        Ok(config)
    }

    pub async fn execute(self) -> Result<()> {
        let project_dir = self.project_dir()?;
        let config = self.resolve_config(&project_dir)?;

        match self.command {
            Commands::Serve(args) => serve::execute(args, config, &project_dir).await,
            Commands::Post(args) => post::execute(args, config, &project_dir).await,
            Commands::List(args) => list::execute(args, config, &project_dir).await,
        }
    }
}
