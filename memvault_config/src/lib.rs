mod schema;

pub use schema::{AuthConfig, BackupConfig, CacheConfig, Config, LoggingConfig, Overrides};
