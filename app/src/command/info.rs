use std::path::Path;

use memvault_config::Config;
use memvault_core::{DestinationKind, FolderCache};
use memvault_providers::AuthorizedUser;

/// Strategy for displaying configuration information.
///
/// This strategy outputs:
/// - Backup source, destination folder and live object
/// - Credential and token status
/// - Folder cache and log locations
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;

        println!("=== memvault Configuration ===\n");

        println!("Config File: {}", Config::config_path().display());
        println!();

        let backup = &config.backup;
        println!("Backup:");
        println!(
            "  Source: {} ({})",
            backup.source_path.display(),
            existence(&backup.source_path)
        );
        println!("  Folder: {}", backup.folder_name);
        match backup.destination {
            DestinationKind::File => {
                println!("  Destination: file '{}' ({})", backup.file_name, backup.mime_type);
            }
            DestinationKind::Document => {
                println!(
                    "  Destination: document '{}' ({:?} layout)",
                    backup.document_name, backup.render
                );
                println!("  Document Title: {}", backup.document_title);
            }
        }
        if let Some(ref archive) = backup.archive_folder {
            println!("  Archive Folder: {archive}");
        }
        println!();

        println!("Authentication:");
        println!(
            "  Client Secrets: {} ({})",
            config.auth.credential_path.display(),
            existence(&config.auth.credential_path)
        );
        println!(
            "  Token: {} ({})",
            config.auth.token_path.display(),
            token_status(&config.auth.token_path)
        );
        println!();

        println!("Folder Cache:");
        match config.cache.folder_cache_path {
            Some(ref path) => match FolderCache::load(path) {
                Ok(cache) => println!("  {} ({} entries)", path.display(), cache.len()),
                Err(e) => println!("  {} (unreadable: {e})", path.display()),
            },
            None => println!("  (disabled - folders are looked up every run)"),
        }
        println!();

        println!("Logging:");
        println!("  Level: {}", config.logging.level);
        println!("  Directory: {}", config.logging.log_dir.display());

        Ok(())
    }
}

fn existence(path: &Path) -> &'static str {
    if path.exists() { "found" } else { "missing" }
}

fn token_status(path: &Path) -> String {
    if !path.exists() {
        return "missing - run 'memvault login'".to_string();
    }
    match AuthorizedUser::load(path) {
        Ok(user) => match user.expiry {
            Some(expiry) => format!("access token expires {}", expiry.to_rfc3339()),
            None => "refresh token only".to_string(),
        },
        Err(e) => format!("unreadable: {e}"),
    }
}
