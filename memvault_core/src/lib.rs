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

pub mod backup;
pub mod document;
pub mod error;
pub mod folder;
pub mod memory;
pub mod remote;

pub use backup::{
    BackupOptions, BackupOrchestrator, Clock, DestinationKind, SystemClock, archive_name,
};
pub use document::{DocumentEdit, DocumentRenderer, NamedStyle, RenderStrategy};
pub use error::{BackupError, BackupFailed, MalformedRecord};
pub use folder::{FolderCache, FolderResolver};
pub use memory::{Entity, ParsedMemory, Relation};
pub use remote::{Lookup, ObjectKind, ObjectQuery, RemoteObject, RemoteStore};
