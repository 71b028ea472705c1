//! Web server command.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use msgboard_core::Config;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, env = "MSGBOARD_PORT")]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long, env = "MSGBOARD_HOST")]
    pub host: Option<String>,

    /// Also write logs to a file
    #[arg(long)]
    pub log: bool,

    /// Log file path (defaults to <project>/.msgboard/serve.log)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

pub async fn execute(args: ServeArgs, mut config: Config, project_dir: &Path) -> Result<()> {
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(host) = args.host {
        config.host = host;
    }

    let db_path = config.database_path(project_dir);
    let pool = msgboard_db::init_pool(&db_path)?;

    println!();
    println!("  {} {}", "msgboard".cyan().bold(), "Web Server".bold());
    println!();
    println!("  {}      http://{}", "Board".green(), config.bind_addr());
    println!("  {}  ws://{}/cable", "WebSocket".green(), config.bind_addr());
    println!("  {}   {}", "Database".green(), db_path.display());
    if let Some(url) = &config.redis_url {
        println!("  {}      {}", "Redis".green(), url);
    }
    println!();
    println!("  {}", "Ctrl+C to stop".dimmed());
    println!();

    msgboard_web::run_server(config, pool).await?;

    Ok(())
}
