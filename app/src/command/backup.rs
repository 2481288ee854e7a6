use memvault_config::Config;
use memvault_core::{BackupOrchestrator, FolderCache};
use memvault_providers::GoogleDrive;
use reqwest::Client;
use tracing::{error, info, warn};

/// Input parameters for the Backup command strategy.
#[derive(Debug, Clone)]
pub struct BackupInput {
    /// Configuration with command-line overrides already applied
    pub config: Config,
}

/// Strategy for executing one backup run.
///
/// Prints a single success or failure message. A failure is also returned so
/// the process exits non-zero.
#[derive(Debug, Clone, Copy)]
pub struct BackupStrategy;

impl super::CommandStrategy for BackupStrategy {
    type Input = BackupInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        match run(&input.config).await {
            Ok(file_id) => {
                let message = format!("백업이 성공적으로 완료되었습니다.\nFile ID: {file_id}");
                info!("{message}");
                println!("{message}");
                Ok(())
            }
            Err(e) => {
                let message = format!("백업 실패: {e:#}");
                error!("{message}");
                eprintln!("{message}");
                Err(e)
            }
        }
    }
}

async fn run(config: &Config) -> anyhow::Result<String> {
    let client = Client::new();
    let tokens = super::authenticate(config, &client).await?;
    let drive = GoogleDrive::new(client, tokens);

    let cache_path = config.cache.folder_cache_path.as_deref();
    let cache = match cache_path {
        Some(path) => FolderCache::load(path)?,
        None => FolderCache::new(),
    };

    info!(
        "Backing up {} into '{}' ({:?})",
        config.backup.source_path.display(),
        config.backup.folder_name,
        config.backup.destination
    );
    let mut orchestrator =
        BackupOrchestrator::new(drive, config.backup.options()).with_folder_cache(cache);
    let file_id = orchestrator
        .backup(&config.backup.source_path, &config.backup.folder_name)
        .await?;

    if let Some(path) = cache_path {
        // The backup itself succeeded; a stale cache only costs a lookup next run.
        if let Err(e) = orchestrator.folder_cache().save(path) {
            warn!("Failed to save folder cache: {e:#}");
        }
    }

    Ok(file_id)
}
