use std::net::IpAddr;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing::error;

use tasklane_cli::config::parse_port;
use tasklane_cli::{init_tracing, run_migrate, run_server, Config};

#[derive(Parser)]
#[command(name = "tasklane")]
#[command(about = "Tasklane - todo lists with ordering and attachments")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        #[arg(long, value_parser = port_arg, help = "Port to listen on (overrides PORT)")]
        port: Option<u16>,
        #[arg(long, help = "Address to bind (overrides HOST)")]
        host: Option<IpAddr>,
        #[arg(long, help = "SQLite database file (overrides DATABASE_PATH)")]
        database_path: Option<PathBuf>,
        #[arg(long, help = "Attachment blob directory (overrides UPLOAD_DIR)")]
        upload_dir: Option<PathBuf>,
        #[arg(long, help = "Allowed browser origin (overrides CORS_ORIGIN)")]
        cors_origin: Option<String>,
    },
    /// Converge the database schema and print what changed
    Migrate {
        #[arg(long, help = "SQLite database file (overrides DATABASE_PATH)")]
        database_path: Option<PathBuf>,
    },
}

fn port_arg(raw: &str) -> Result<u16, String> {
    parse_port(raw).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            process::exit(2);
        }
    };

    let result = match cli.command {
        Commands::Serve {
            port,
            host,
            database_path,
            upload_dir,
            cors_origin,
        } => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(path) = database_path {
                config.database_path = path;
            }
            if let Some(dir) = upload_dir {
                config.upload_dir = dir;
            }
            if let Some(origin) = cors_origin {
                config.cors_origin = origin;
            }
            run_server(config).await
        }
        Commands::Migrate { database_path } => {
            if let Some(path) = database_path {
                config.database_path = path;
            }
            run_migrate(&config).await.and_then(|report| {
                println!("{}", serde_json::to_string_pretty(&report)?);
                Ok(())
            })
        }
    };

    if let Err(e) = result {
        error!("{:#}", e);
        process::exit(1);
    }
}
