//! One backup run: archive the live object, then overwrite or create it.

use std::path::Path;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::document::{BODY_START, DEFAULT_TITLE, DocumentEdit, DocumentRenderer, RenderStrategy};
use crate::error::{BackupError, BackupFailed};
use crate::folder::{FolderCache, FolderResolver};
use crate::memory::parse_with_warnings;
use crate::remote::{Lookup, ObjectKind, ObjectQuery, RemoteObject, RemoteStore};

pub const DEFAULT_FILE_NAME: &str = "memory.json";
pub const DEFAULT_DOCUMENT_NAME: &str = "memory";
pub const DEFAULT_MIME_TYPE: &str = "application/json";

/// Source of the timestamp used in archive names.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// What the live object is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationKind {
    /// Verbatim upload of the source file
    #[default]
    File,
    /// Text document rendered from the parsed graph
    Document,
}

#[derive(Debug, Clone)]
pub struct BackupOptions {
    pub destination: DestinationKind,
    pub file_name: String,
    pub document_name: String,
    pub mime_type: String,
    pub render: RenderStrategy,
    pub document_title: String,
    /// Folder the archival copies are moved into; `None` keeps them next to the live object.
    pub archive_folder: Option<String>,
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self {
            destination: DestinationKind::default(),
            file_name: DEFAULT_FILE_NAME.to_string(),
            document_name: DEFAULT_DOCUMENT_NAME.to_string(),
            mime_type: DEFAULT_MIME_TYPE.to_string(),
            render: RenderStrategy::default(),
            document_title: DEFAULT_TITLE.to_string(),
            archive_folder: None,
        }
    }
}

impl BackupOptions {
    /// Canonical name of the live object.
    #[must_use]
    pub fn live_name(&self) -> &str {
        match self.destination {
            DestinationKind::File => &self.file_name,
            DestinationKind::Document => &self.document_name,
        }
    }

    #[must_use]
    pub fn live_kind(&self) -> ObjectKind {
        match self.destination {
            DestinationKind::File => ObjectKind::File(self.mime_type.clone()),
            DestinationKind::Document => ObjectKind::Document,
        }
    }
}

/// `memory.json` → `memory_20240102030405.json`; names without an extension get the
/// stamp appended.
#[must_use]
pub fn archive_name(name: &str, at: DateTime<Local>) -> String {
    let stamp = at.format("%Y%m%d%H%M%S");
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}_{stamp}.{ext}"),
        _ => format!("{name}_{stamp}"),
    }
}

pub struct BackupOrchestrator<S, C = SystemClock> {
    store: S,
    resolver: FolderResolver,
    clock: C,
    options: BackupOptions,
}

impl<S: RemoteStore> BackupOrchestrator<S> {
    pub fn new(store: S, options: BackupOptions) -> Self {
        Self::with_clock(store, options, SystemClock)
    }
}

impl<S: RemoteStore, C: Clock> BackupOrchestrator<S, C> {
    pub fn with_clock(store: S, options: BackupOptions, clock: C) -> Self {
        Self {
            store,
            resolver: FolderResolver::default(),
            clock,
            options,
        }
    }

    /// Seed the folder resolver, e.g. with a cache loaded from disk.
    #[must_use]
    pub fn with_folder_cache(mut self, cache: FolderCache) -> Self {
        self.resolver = FolderResolver::new(cache);
        self
    }

    pub const fn folder_cache(&self) -> &FolderCache {
        self.resolver.cache()
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn options(&self) -> &BackupOptions {
        &self.options
    }

    /// Back up `source` into `folder_name` and return the live object's id.
    ///
    /// Nothing is retried. An archival copy made before a later failure is left in place.
    pub async fn backup(&mut self, source: &Path, folder_name: &str) -> Result<String, BackupFailed> {
        match self.run(source, folder_name).await {
            Ok(id) => Ok(id),
            Err(e) => {
                error!("Backup of {} failed: {e}", source.display());
                Err(BackupFailed::from(e))
            }
        }
    }

    async fn run(&mut self, source: &Path, folder_name: &str) -> Result<String, BackupError> {
        let folder_id = self
            .resolver
            .resolve(&self.store, folder_name)
            .await
            .map_err(|source| BackupError::FolderResolution {
                name: folder_name.to_string(),
                source,
            })?;
        if folder_id.is_empty() {
            return Err(BackupError::FolderResolution {
                name: folder_name.to_string(),
                source: anyhow::anyhow!("store returned an empty folder id"),
            });
        }

        let bytes = read_source(source)?;
        let text = std::str::from_utf8(&bytes).map_err(|e| BackupError::SourceRead {
            path: source.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;
        let (memory, warnings) = parse_with_warnings(text);
        if !warnings.is_empty() {
            warn!("{} malformed lines skipped in {}", warnings.len(), source.display());
        }
        info!(
            "Read {} entities and {} relations from {}",
            memory.entities.len(),
            memory.relations.len(),
            source.display()
        );

        let live_name = self.options.live_name().to_string();
        let query = ObjectQuery::new(&live_name, self.options.live_kind()).in_parent(&folder_id);
        let existing = match self.store.find(&query).await {
            Ok(Lookup::Found(object)) => Some(object),
            Ok(Lookup::NotFound) => None,
            Err(source) => {
                return Err(BackupError::RemoteQuery {
                    name: live_name,
                    source,
                });
            }
        };

        if let Some(live) = &existing {
            self.archive(live, &folder_id).await?;
        }

        match self.options.destination {
            DestinationKind::File => self.write_file(existing.as_ref(), &folder_id, bytes).await,
            DestinationKind::Document => {
                let renderer = DocumentRenderer::new(self.options.render)
                    .with_title(self.options.document_title.clone());
                let edits = renderer.render(&memory)?;
                self.write_document(existing.as_ref(), &folder_id, edits).await
            }
        }
    }

    async fn archive(&mut self, live: &RemoteObject, folder_id: &str) -> Result<String, BackupError> {
        let name = archive_name(&live.name, self.clock.now());
        let copy_id = self
            .store
            .copy(&live.id, &name, folder_id)
            .await
            .map_err(|e| BackupError::remote_write("copy", e))?;
        info!("Created backup copy: {name}");

        if let Some(archive_folder) = &self.options.archive_folder {
            let archive_id = self
                .resolver
                .resolve(&self.store, archive_folder)
                .await
                .map_err(|source| BackupError::FolderResolution {
                    name: archive_folder.clone(),
                    source,
                })?;
            self.store
                .move_object(&copy_id, folder_id, &archive_id)
                .await
                .map_err(|e| BackupError::remote_write("move", e))?;
            info!("Moved backup copy into '{archive_folder}'");
        }

        Ok(copy_id)
    }

    async fn write_file(
        &self,
        existing: Option<&RemoteObject>,
        folder_id: &str,
        content: Vec<u8>,
    ) -> Result<String, BackupError> {
        let mime_type = &self.options.mime_type;
        if let Some(live) = existing {
            self.store
                .update_file(&live.id, mime_type, content)
                .await
                .map_err(|e| BackupError::remote_write("update", e))?;
            info!("Existing file updated successfully");
            Ok(live.id.clone())
        } else {
            let id = self
                .store
                .create_file(&self.options.file_name, folder_id, mime_type, content)
                .await
                .map_err(|e| BackupError::remote_write("create", e))?;
            info!("New file created successfully");
            Ok(id)
        }
    }

    async fn write_document(
        &self,
        existing: Option<&RemoteObject>,
        folder_id: &str,
        edits: Vec<DocumentEdit>,
    ) -> Result<String, BackupError> {
        let (id, batch) = if let Some(live) = existing {
            let end = self
                .store
                .document_end_index(&live.id)
                .await
                .map_err(|e| BackupError::remote_write("read document", e))?;
            let mut batch = Vec::with_capacity(edits.len() + 1);
            // The final newline of the body cannot be deleted.
            if end > BODY_START + 1 {
                batch.push(DocumentEdit::DeleteContentRange {
                    start: BODY_START,
                    end: end - 1,
                });
            }
            batch.extend(edits);
            (live.id.clone(), batch)
        } else {
            let id = self
                .store
                .create_document(&self.options.document_name, folder_id)
                .await
                .map_err(|e| BackupError::remote_write("create", e))?;
            (id, edits)
        };

        self.store
            .batch_update(&id, &batch)
            .await
            .map_err(|e| BackupError::remote_write("batch update", e))?;
        info!("Document {id} written with {} edits", batch.len());
        Ok(id)
    }
}

fn read_source(path: &Path) -> Result<Vec<u8>, BackupError> {
    std::fs::read(path).map_err(|source| BackupError::SourceRead {
        path: path.to_path_buf(),
        source,
    })
}
