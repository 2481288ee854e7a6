//! The capability set the backup needs from a remote object store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::DocumentEdit;

pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
pub const DOCUMENT_MIME_TYPE: &str = "application/vnd.google-apps.document";

/// What kind of object a query is looking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectKind {
    Folder,
    Document,
    /// Plain file with the given content type
    File(String),
}

impl ObjectKind {
    #[must_use]
    pub fn mime_type(&self) -> &str {
        match self {
            Self::Folder => FOLDER_MIME_TYPE,
            Self::Document => DOCUMENT_MIME_TYPE,
            Self::File(mime) => mime,
        }
    }
}

/// Exact-name lookup, optionally restricted to one parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectQuery {
    pub name: String,
    pub kind: ObjectKind,
    pub parent: Option<String>,
}

impl ObjectQuery {
    pub fn new(name: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parent: None,
        }
    }

    #[must_use]
    pub fn in_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteObject {
    pub id: String,
    pub name: String,
    #[serde(rename = "mimeType", default)]
    pub mime_type: String,
    #[serde(default)]
    pub parents: Vec<String>,
}

/// Outcome of a lookup. Absence is a normal result, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(RemoteObject),
    NotFound,
}

impl Lookup {
    /// Keep the first listed match. Duplicate names resolve to whichever object
    /// the store lists first.
    #[must_use]
    pub fn first_of(objects: Vec<RemoteObject>) -> Self {
        objects.into_iter().next().map_or(Self::NotFound, Self::Found)
    }
}

/// Remote object store used by the folder resolver and the backup.
///
/// Every call blocks the backup until it completes. Implementations must
/// surface failures as errors; "not found" is reported through [`Lookup`].
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn find(&self, query: &ObjectQuery) -> anyhow::Result<Lookup>;

    /// Create a top-level folder and return its id.
    async fn create_folder(&self, name: &str) -> anyhow::Result<String>;

    async fn create_file(
        &self,
        name: &str,
        parent: &str,
        mime_type: &str,
        content: Vec<u8>,
    ) -> anyhow::Result<String>;

    /// Replace the content of an existing file.
    async fn update_file(&self, id: &str, mime_type: &str, content: Vec<u8>)
    -> anyhow::Result<()>;

    /// Create an empty text document and return its id.
    async fn create_document(&self, name: &str, parent: &str) -> anyhow::Result<String>;

    /// Copy an object under a new name into `parent`, returning the copy's id.
    async fn copy(&self, id: &str, name: &str, parent: &str) -> anyhow::Result<String>;

    /// Index one past the last position of the document body.
    async fn document_end_index(&self, id: &str) -> anyhow::Result<usize>;

    /// Apply all edits in one request, atomically.
    async fn batch_update(&self, id: &str, edits: &[DocumentEdit]) -> anyhow::Result<()>;

    async fn move_object(&self, id: &str, from_parent: &str, to_parent: &str)
    -> anyhow::Result<()>;
}
