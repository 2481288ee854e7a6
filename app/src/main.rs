#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

mod command;
mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use command::{
    BackupInput, BackupStrategy, CommandStrategy, InfoStrategy, InitStrategy, LoginStrategy,
    VersionStrategy,
};
use memvault_config::{Config, Overrides};
use memvault_core::{DestinationKind, RenderStrategy};

#[derive(Parser)]
#[command(name = "memvault")]
#[command(about = "Back up the MCP memory graph to Google Drive", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Archive the current remote copy and upload the memory file
    Backup {
        /// Destination folder name in Google Drive
        #[arg(short = 'f', long)]
        folder_name: Option<String>,

        /// Memory file to upload
        #[arg(short = 's', long)]
        source_path: Option<PathBuf>,

        /// Content type of the uploaded file
        #[arg(long)]
        mime_type: Option<String>,

        /// OAuth client secrets, used when no token exists yet
        #[arg(long)]
        credential_path: Option<PathBuf>,

        /// Upload the file as-is or write a Google Doc
        #[arg(short = 'd', long, value_enum)]
        destination: Option<DestinationArg>,

        /// Document layout (document destination only)
        #[arg(short = 'r', long, value_enum)]
        render: Option<RenderArg>,
    },
    /// Authorize Google Drive access and save the token
    Login {
        /// OAuth client secrets of the desktop app
        #[arg(long)]
        credential_path: Option<PathBuf>,
    },
    /// Initialize configuration
    Init,
    /// Show configuration
    Info,
    /// Show version
    Version,
}

#[derive(Clone, Copy, ValueEnum)]
enum DestinationArg {
    File,
    Document,
}

impl From<DestinationArg> for DestinationKind {
    fn from(arg: DestinationArg) -> Self {
        match arg {
            DestinationArg::File => Self::File,
            DestinationArg::Document => Self::Document,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum RenderArg {
    Raw,
    Formatted,
}

impl From<RenderArg> for RenderStrategy {
    fn from(arg: RenderArg) -> Self {
        match arg {
            RenderArg::Raw => Self::Raw,
            RenderArg::Formatted => Self::Formatted,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Backup {
            folder_name,
            source_path,
            mime_type,
            credential_path,
            destination,
            render,
        } => {
            let config = Config::load()?.with_overrides(Overrides {
                folder_name,
                source_path,
                mime_type,
                credential_path,
                destination: destination.map(Into::into),
                render: render.map(Into::into),
            });
            let _guard = logging::init(&config.logging)?;
            BackupStrategy.execute(BackupInput { config }).await?;
        }
        Commands::Login { credential_path } => {
            let config = Config::load()?.with_overrides(Overrides {
                credential_path,
                ..Overrides::default()
            });
            let _guard = logging::init(&config.logging)?;
            LoginStrategy.execute(config).await?;
        }
        Commands::Init => {
            InitStrategy.execute(()).await?;
        }
        Commands::Info => {
            InfoStrategy.execute(()).await?;
        }
        Commands::Version => {
            VersionStrategy.execute(()).await?;
        }
    }

    Ok(())
}
