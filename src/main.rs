use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use codebase_client::{
    present, selection, ClientConfig, CodebaseClient, SelectionMode,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "codebase", about = "Upload local code to a codebase service and read it back")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of the codebase service
    #[arg(long, global = true, env = "CODEBASE_API_BASE")]
    base_url: Option<String>,

    /// Config file (defaults to <config dir>/codebase-client/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether the service is reachable
    Health,

    /// Upload files, or one directory with --dir
    Upload {
        /// Files to upload, or the directory to upload with --dir
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Upload a whole directory tree
        #[arg(long)]
        dir: bool,
        /// Fetch the codebase details after a successful upload
        #[arg(long)]
        show_details: bool,
    },

    /// List every uploaded codebase
    List,

    /// Show the files of one codebase
    Details {
        /// Directory id; defaults to the one uploaded in this run
        #[arg(long)]
        id: Option<String>,
    },

    /// Show a file's metadata and content
    Read {
        /// Directory id; defaults to the one uploaded in this run
        #[arg(long)]
        id: Option<String>,
        /// Path of the file inside the codebase
        path: String,
        /// Print the content without truncation
        #[arg(long)]
        full: bool,
    },

    /// Download one file
    Download {
        /// Directory id; defaults to the one uploaded in this run
        #[arg(long)]
        id: Option<String>,
        /// Path of the file inside the codebase
        path: String,
        /// Directory to save into
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },

    /// Download a codebase as a zip archive
    Zip {
        /// Directory id; defaults to the one uploaded in this run
        #[arg(long)]
        id: Option<String>,
        /// Directory to save into
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let path = cli.config.clone().or_else(ClientConfig::default_path);
    let mut config = match path {
        Some(path) => ClientConfig::load(&path)?,
        None => ClientConfig::default(),
    };
    // clap already picked up CODEBASE_API_BASE into --base-url
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url.clone());
    }
    Ok(config.validated()?)
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("codebase_client=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli).context("failed to load configuration")?;
    let mut client = CodebaseClient::new(&config).context("failed to build HTTP client")?;

    match cli.command {
        Commands::Health => {
            let status = client.check_health(true).await;
            println!("{}", present::health_summary(&status));
            if !status.online {
                bail!("service at {} is offline", config.base_url);
            }
        }
        Commands::Upload {
            paths,
            dir,
            show_details,
        } => {
            let (entries, mode) = if dir {
                let [root] = paths.as_slice() else {
                    bail!("--dir takes exactly one directory");
                };
                (selection::load_directory(root).await?, SelectionMode::Directory)
            } else {
                (selection::load_files(&paths).await?, SelectionMode::Files)
            };

            let batch = selection::normalize(entries, mode);
            if batch.is_empty() {
                bail!("no files selected");
            }
            eprintln!("{}", present::selection_summary(&batch));

            let observer = Arc::new(|fraction: f64| {
                eprint!("\rUploading... {:>5.1}%", fraction * 100.0);
                let _ = std::io::stderr().flush();
            });
            let result = client.upload(&batch, observer).await?;
            eprintln!();

            if let Some(body) = &result.raw_body {
                print_json(body)?;
            }
            if !result.success {
                bail!(
                    "upload failed: {}",
                    result.error_message.as_deref().unwrap_or("unknown error")
                );
            }
            if let Some(id) = client.last_directory_id() {
                println!("Directory ID: {}", id);
            }
            if show_details {
                let details = client.details(None).await?;
                print_json(&details.body)?;
            }
        }
        Commands::List => {
            let result = client.list().await?;
            print_json(&result.body)?;
        }
        Commands::Details { id } => {
            let result = client.details(id.as_deref()).await?;
            print_json(&result.body)?;
        }
        Commands::Read { id, path, full } => {
            let result = client.read_file_metadata(id.as_deref(), &path).await?;
            if full {
                print_json(&result.body)?;
            } else {
                print_json(&present::display_file_content(&result))?;
            }
            if !result.is_success() {
                bail!("service could not read {}", path);
            }
        }
        Commands::Download { id, path, out } => {
            let download = client.download_file(id.as_deref(), &path).await?;
            let saved = download.save_to(&out).await?;
            println!("Saved {} ({} bytes)", saved.display(), download.len());
        }
        Commands::Zip { id, out } => {
            let download = client.download_zip(id.as_deref()).await?;
            let saved = download.save_to(&out).await?;
            println!("Saved {} ({} bytes)", saved.display(), download.len());
        }
    }

    Ok(())
}
