use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// Destination and layout enums live in memvault_core so the orchestrator owns them
use memvault_core::backup::{DEFAULT_DOCUMENT_NAME, DEFAULT_FILE_NAME, DEFAULT_MIME_TYPE};
use memvault_core::document::DEFAULT_TITLE;
use memvault_core::{BackupOptions, DestinationKind, RenderStrategy};

const APP_DIR: &str = "memvault";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BackupConfig {
    #[serde(default = "BackupConfig::default_folder_name")]
    pub folder_name: String,
    #[serde(default = "BackupConfig::default_source_path")]
    pub source_path: PathBuf,
    #[serde(default)]
    pub destination: DestinationKind,
    #[serde(default)]
    pub render: RenderStrategy,
    #[serde(default = "BackupConfig::default_file_name")]
    pub file_name: String,
    #[serde(default = "BackupConfig::default_document_name")]
    pub document_name: String,
    #[serde(default = "BackupConfig::default_mime_type")]
    pub mime_type: String,
    #[serde(default = "BackupConfig::default_document_title")]
    pub document_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_folder: Option<String>,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            folder_name: Self::default_folder_name(),
            source_path: Self::default_source_path(),
            destination: DestinationKind::default(),
            render: RenderStrategy::default(),
            file_name: Self::default_file_name(),
            document_name: Self::default_document_name(),
            mime_type: Self::default_mime_type(),
            document_title: Self::default_document_title(),
            archive_folder: None,
        }
    }
}

impl BackupConfig {
    fn default_folder_name() -> String {
        "claude-memory".to_string()
    }

    /// Where the MCP memory server keeps its graph when installed globally with npm.
    fn default_source_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_default()
            .join("npm")
            .join("node_modules")
            .join("@modelcontextprotocol")
            .join("server-memory")
            .join("dist")
            .join("memory.json")
    }

    fn default_file_name() -> String {
        DEFAULT_FILE_NAME.to_string()
    }

    fn default_document_name() -> String {
        DEFAULT_DOCUMENT_NAME.to_string()
    }

    fn default_mime_type() -> String {
        DEFAULT_MIME_TYPE.to_string()
    }

    fn default_document_title() -> String {
        DEFAULT_TITLE.to_string()
    }

    #[must_use]
    pub fn options(&self) -> BackupOptions {
        BackupOptions {
            destination: self.destination,
            file_name: self.file_name.clone(),
            document_name: self.document_name.clone(),
            mime_type: self.mime_type.clone(),
            render: self.render,
            document_title: self.document_title.clone(),
            archive_folder: self.archive_folder.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuthConfig {
    /// OAuth client secrets of the installed app (`credentials.json`)
    #[serde(default = "AuthConfig::default_credential_path")]
    pub credential_path: PathBuf,
    /// Authorized-user token written by `memvault login`
    #[serde(default = "AuthConfig::default_token_path")]
    pub token_path: PathBuf,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            credential_path: Self::default_credential_path(),
            token_path: Self::default_token_path(),
        }
    }
}

impl AuthConfig {
    fn default_credential_path() -> PathBuf {
        Config::base_dir()
            .join("credentials")
            .join("credentials.json")
    }

    fn default_token_path() -> PathBuf {
        Config::base_dir().join("credentials").join("token.json")
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct CacheConfig {
    /// Persist folder name → id mappings between runs when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_cache_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
    #[serde(default = "LoggingConfig::default_log_dir")]
    pub log_dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            log_dir: Self::default_log_dir(),
        }
    }
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }

    fn default_log_dir() -> PathBuf {
        Config::base_dir().join("logs")
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub folder_name: Option<String>,
    pub source_path: Option<PathBuf>,
    pub mime_type: Option<String>,
    pub credential_path: Option<PathBuf>,
    pub destination: Option<DestinationKind>,
    pub render: Option<RenderStrategy>,
}

impl Config {
    /// `~/memvault`, or `./memvault` when no home directory is known.
    #[must_use]
    pub fn base_dir() -> PathBuf {
        dirs::home_dir().unwrap_or_default().join(APP_DIR)
    }

    #[must_use]
    pub fn config_path() -> PathBuf {
        Self::base_dir().join("config.json")
    }

    /// Load `~/memvault/config.json`, falling back to defaults when it does not exist.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config file {}: {e}", path.display()))?;

        Ok(config)
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(folder_name) = overrides.folder_name {
            self.backup.folder_name = folder_name;
        }
        if let Some(source_path) = overrides.source_path {
            self.backup.source_path = source_path;
        }
        if let Some(mime_type) = overrides.mime_type {
            self.backup.mime_type = mime_type;
        }
        if let Some(credential_path) = overrides.credential_path {
            self.auth.credential_path = credential_path;
        }
        if let Some(destination) = overrides.destination {
            self.backup.destination = destination;
        }
        if let Some(render) = overrides.render {
            self.backup.render = render;
        }
        self
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = Self::base_dir();
        std::fs::create_dir_all(config_dir.join("credentials"))?;
        Ok(config_dir)
    }

    pub fn create_config() -> anyhow::Result<()> {
        let config_dir = Self::ensure_config_dir()?;
        let config_path = config_dir.join("config.json");

        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                config_path.display()
            );
        }

        let template = serde_json::to_string_pretty(&Self::default())?;
        std::fs::write(&config_path, template)?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!(
            "   1. Download OAuth client secrets for a desktop app and save them to {}",
            Self::default().auth.credential_path.display()
        );
        println!("   2. Run 'memvault login' to authorize Google Drive access");
        println!("   3. Run 'memvault backup' to upload the memory file");
        println!();
        println!("🔧 Configuration options:");
        println!("   - backup.destination: file (verbatim upload) or document (Google Docs)");
        println!("   - backup.render: formatted or raw (document destination only)");
        println!("   - backup.archive_folder: move timestamped copies into a separate folder");
        println!("   - cache.folder_cache_path: remember folder ids between runs");
        println!();
        Ok(())
    }
}
