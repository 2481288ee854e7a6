//! In-memory remote store with call recording and fault injection.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use memvault_core::remote::FOLDER_MIME_TYPE;
use memvault_core::{Clock, DocumentEdit, Lookup, ObjectQuery, RemoteObject, RemoteStore};

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub meta: RemoteObject,
    pub content: Vec<u8>,
    /// Document body in UTF-16 units, without the trailing newline
    pub body: Vec<u16>,
}

impl StoredObject {
    pub fn body_text(&self) -> String {
        String::from_utf16_lossy(&self.body)
    }
}

#[derive(Debug, Default)]
pub struct State {
    objects: Vec<StoredObject>,
    next_id: usize,
    calls: Vec<&'static str>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    pub state: Mutex<State>,
    pub fail_find: bool,
    /// Fail only lookups scoped to a parent folder
    pub fail_find_in_parent: bool,
    pub fail_create_folder: bool,
    pub fail_copy: bool,
    pub fail_batch: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, name: &str, mime_type: &str, parent: Option<&str>, content: &[u8]) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("seed-{}", state.next_id);
        state.objects.push(StoredObject {
            meta: RemoteObject {
                id: id.clone(),
                name: name.to_string(),
                mime_type: mime_type.to_string(),
                parents: parent.map(str::to_string).into_iter().collect(),
            },
            content: content.to_vec(),
            body: String::from_utf8_lossy(content).encode_utf16().collect(),
        });
        id
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| **c == call).count()
    }

    pub fn get(&self, id: &str) -> Option<StoredObject> {
        self.state
            .lock()
            .unwrap()
            .objects
            .iter()
            .find(|o| o.meta.id == id)
            .cloned()
    }

    pub fn in_folder(&self, folder_id: &str) -> Vec<StoredObject> {
        self.state
            .lock()
            .unwrap()
            .objects
            .iter()
            .filter(|o| o.meta.parents.iter().any(|p| p == folder_id))
            .cloned()
            .collect()
    }

    fn record(&self, call: &'static str) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn insert(&self, name: &str, mime_type: &str, parents: Vec<String>, content: Vec<u8>) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("obj-{}", state.next_id);
        state.objects.push(StoredObject {
            meta: RemoteObject {
                id: id.clone(),
                name: name.to_string(),
                mime_type: mime_type.to_string(),
                parents,
            },
            content,
            body: Vec::new(),
        });
        id
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn find(&self, query: &ObjectQuery) -> anyhow::Result<Lookup> {
        self.record("find");
        if self.fail_find || (self.fail_find_in_parent && query.parent.is_some()) {
            anyhow::bail!("simulated list failure");
        }
        let state = self.state.lock().unwrap();
        let matches = state
            .objects
            .iter()
            .filter(|o| o.meta.name == query.name && o.meta.mime_type == query.kind.mime_type())
            .filter(|o| {
                query
                    .parent
                    .as_ref()
                    .is_none_or(|p| o.meta.parents.contains(p))
            })
            .map(|o| o.meta.clone())
            .collect();
        Ok(Lookup::first_of(matches))
    }

    async fn create_folder(&self, name: &str) -> anyhow::Result<String> {
        self.record("create_folder");
        if self.fail_create_folder {
            anyhow::bail!("simulated create failure");
        }
        Ok(self.insert(name, FOLDER_MIME_TYPE, Vec::new(), Vec::new()))
    }

    async fn create_file(
        &self,
        name: &str,
        parent: &str,
        mime_type: &str,
        content: Vec<u8>,
    ) -> anyhow::Result<String> {
        self.record("create_file");
        Ok(self.insert(name, mime_type, vec![parent.to_string()], content))
    }

    async fn update_file(&self, id: &str, _mime_type: &str, content: Vec<u8>) -> anyhow::Result<()> {
        self.record("update_file");
        let mut state = self.state.lock().unwrap();
        let object = state
            .objects
            .iter_mut()
            .find(|o| o.meta.id == id)
            .ok_or_else(|| anyhow::anyhow!("no object {id}"))?;
        object.content = content;
        Ok(())
    }

    async fn create_document(&self, name: &str, parent: &str) -> anyhow::Result<String> {
        self.record("create_document");
        Ok(self.insert(
            name,
            memvault_core::remote::DOCUMENT_MIME_TYPE,
            vec![parent.to_string()],
            Vec::new(),
        ))
    }

    async fn copy(&self, id: &str, name: &str, parent: &str) -> anyhow::Result<String> {
        self.record("copy");
        if self.fail_copy {
            anyhow::bail!("simulated copy failure");
        }
        let source = self.get(id).ok_or_else(|| anyhow::anyhow!("no object {id}"))?;
        let copy_id = self.insert(
            name,
            &source.meta.mime_type,
            vec![parent.to_string()],
            source.content,
        );
        let mut state = self.state.lock().unwrap();
        if let Some(copy) = state.objects.iter_mut().find(|o| o.meta.id == copy_id) {
            copy.body = source.body;
        }
        Ok(copy_id)
    }

    async fn document_end_index(&self, id: &str) -> anyhow::Result<usize> {
        self.record("document_end_index");
        let object = self.get(id).ok_or_else(|| anyhow::anyhow!("no object {id}"))?;
        Ok(object.body.len() + 2)
    }

    async fn batch_update(&self, id: &str, edits: &[DocumentEdit]) -> anyhow::Result<()> {
        self.record("batch_update");
        if self.fail_batch {
            anyhow::bail!("simulated batch failure");
        }
        let mut state = self.state.lock().unwrap();
        let object = state
            .objects
            .iter_mut()
            .find(|o| o.meta.id == id)
            .ok_or_else(|| anyhow::anyhow!("no object {id}"))?;

        let mut body = object.body.clone();
        for edit in edits {
            match edit {
                DocumentEdit::InsertText { index, text } => {
                    let at = index - 1;
                    anyhow::ensure!(at <= body.len(), "insert past end at {index}");
                    body.splice(at..at, text.encode_utf16());
                }
                DocumentEdit::DeleteContentRange { start, end } => {
                    anyhow::ensure!(*end - 1 <= body.len(), "delete past end at {end}");
                    body.drain(start - 1..end - 1);
                }
                DocumentEdit::UpdateParagraphStyle { start, end, .. } => {
                    anyhow::ensure!(start < end && *end - 1 <= body.len(), "bad style range");
                }
            }
        }
        object.body = body;
        Ok(())
    }

    async fn move_object(&self, id: &str, from_parent: &str, to_parent: &str) -> anyhow::Result<()> {
        self.record("move_object");
        let mut state = self.state.lock().unwrap();
        let object = state
            .objects
            .iter_mut()
            .find(|o| o.meta.id == id)
            .ok_or_else(|| anyhow::anyhow!("no object {id}"))?;
        object.meta.parents.retain(|p| p != from_parent);
        object.meta.parents.push(to_parent.to_string());
        Ok(())
    }
}

pub struct FixedClock(pub DateTime<Local>);

impl FixedClock {
    pub fn new() -> Self {
        Self(Local.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

pub const ENTITY_LINE: &str =
    r#"{"type":"entity","name":"A","entityType":"T","observations":["x","y"]}"#;
pub const RELATION_LINE: &str = r#"{"type":"relation","from":"A","to":"B","relationType":"knows"}"#;
