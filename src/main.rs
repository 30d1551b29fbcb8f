use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use filebridge::client;
use filebridge::service::{Service, ServiceConfig};
use filebridge::utils;

#[derive(Parser)]
#[command(name = "filebridge", version, about = "File-protocol automation bridge")]
struct AppCli {
    /// Run in daemon mode (background)
    #[arg(long)]
    daemon: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Communication base folder (overrides config)
    #[arg(short, long, global = true)]
    base: Option<PathBuf>,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Round-trip a ping through a running service
    Ping,
    /// Run a script through a running service and print the response
    Exec { script: String },
    /// Report whether a service instance is advertised as running
    Status,
}

fn run_daemon() -> Result<()> {
    use daemonize::Daemonize;
    let daemonize = Daemonize::new()
        .pid_file("filebridge.pid")
        .working_directory(".")
        .umask(0o027)
        .privileged_action(|| {
            info!("daemon started");
        });

    daemonize.start().map_err(|e| anyhow::anyhow!(e))?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    utils::logging::init();

    let args = AppCli::parse();
    let mut config = match &args.config {
        Some(path) => ServiceConfig::from_file(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(base) = args.base {
        config.base_path = base;
    }

    match args.command {
        Some(Commands::Ping) => {
            let response = client::ping(&config.base_path).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Some(Commands::Exec { script }) => {
            let response = client::execute_script(&config.base_path, &script).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Some(Commands::Status) => {
            let running = client::service_running(&config.base_path)?;
            println!("{}", if running { "running" } else { "stopped" });
        }
        None => {
            // Default: run the bridge service in the foreground
            if args.daemon {
                run_daemon()?;
            }
            let service = Service::new(config);
            service.start()?;
            info!("service running, press Ctrl-C to stop");
            tokio::signal::ctrl_c().await?;
            service.stop().await;
        }
    }

    Ok(())
}
