//! Google Drive v3 + Docs v1 implementation of [`RemoteStore`].

use async_trait::async_trait;
use memvault_core::remote::{DOCUMENT_MIME_TYPE, FOLDER_MIME_TYPE};
use memvault_core::{DocumentEdit, Lookup, ObjectQuery, RemoteObject, RemoteStore};
use reqwest::header::LOCATION;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::auth::TokenSource;
use crate::error::ProviderError;

/// Base URLs of the three Google endpoints in use.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub drive: String,
    pub upload: String,
    pub docs: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            drive: "https://www.googleapis.com/drive/v3".to_string(),
            upload: "https://www.googleapis.com/upload/drive/v3".to_string(),
            docs: "https://docs.googleapis.com/v1".to_string(),
        }
    }
}

impl Endpoints {
    /// All endpoints under one host, laid out like the real API paths.
    #[must_use]
    pub fn under(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            drive: format!("{base}/drive/v3"),
            upload: format!("{base}/upload/drive/v3"),
            docs: format!("{base}/docs/v1"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<RemoteObject>,
}

#[derive(Debug, Deserialize)]
struct CreatedFile {
    id: String,
}

pub struct GoogleDrive<T> {
    client: Client,
    tokens: T,
    endpoints: Endpoints,
}

impl<T: TokenSource> GoogleDrive<T> {
    pub fn new(client: Client, tokens: T) -> Self {
        info!("Creating Google Drive client");
        Self {
            client,
            tokens,
            endpoints: Endpoints::default(),
        }
    }

    #[must_use]
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    async fn authorized(&self, request: RequestBuilder) -> anyhow::Result<RequestBuilder> {
        let token = self.tokens.access_token().await?;
        Ok(request.bearer_auth(token))
    }

    /// Send and decode a JSON response, keeping the API's error body on failure.
    async fn send_json(&self, request: RequestBuilder) -> anyhow::Result<Value> {
        let response = check(self.authorized(request).await?.send().await?).await?;
        Ok(response.json::<Value>().await?)
    }

    async fn send_for_id(&self, request: RequestBuilder) -> anyhow::Result<String> {
        let value = self.send_json(request).await?;
        let created: CreatedFile =
            serde_json::from_value(value).map_err(|_| ProviderError::MissingField("id"))?;
        Ok(created.id)
    }

    /// Open a resumable session with `metadata`, then upload `content` to it.
    async fn resumable_upload(
        &self,
        session: RequestBuilder,
        mime_type: &str,
        content: Vec<u8>,
    ) -> anyhow::Result<String> {
        let session = session
            .query(&[("uploadType", "resumable"), ("fields", "id")])
            .header("X-Upload-Content-Type", mime_type);
        let response = check(self.authorized(session).await?.send().await?).await?;
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ProviderError::MissingField("upload session location"))?
            .to_string();
        debug!("Uploading {} bytes to resumable session", content.len());

        let upload = self
            .client
            .put(location)
            .header(reqwest::header::CONTENT_TYPE, mime_type)
            .body(content);
        self.send_for_id(upload).await
    }
}

async fn check(response: reqwest::Response) -> anyhow::Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(ProviderError::Api {
        status: status.as_u16(),
        message,
    }
    .into())
}

/// Quote a value for a Drive search expression.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Drive search expression for an exact-name, non-trashed lookup.
#[must_use]
pub fn search_expression(query: &ObjectQuery) -> String {
    let mut q = format!(
        "name = {} and mimeType = {} and trashed = false",
        quote(&query.name),
        quote(query.kind.mime_type())
    );
    if let Some(parent) = &query.parent {
        q.push_str(&format!(" and {} in parents", quote(parent)));
    }
    q
}

/// Docs API request objects for an edit batch.
#[must_use]
pub fn edit_requests(edits: &[DocumentEdit]) -> Vec<Value> {
    edits
        .iter()
        .map(|edit| match edit {
            DocumentEdit::InsertText { index, text } => json!({
                "insertText": {
                    "location": { "index": index },
                    "text": text,
                }
            }),
            DocumentEdit::UpdateParagraphStyle { start, end, style } => json!({
                "updateParagraphStyle": {
                    "range": { "startIndex": start, "endIndex": end },
                    "paragraphStyle": { "namedStyleType": style.as_str() },
                    "fields": "namedStyleType",
                }
            }),
            DocumentEdit::DeleteContentRange { start, end } => json!({
                "deleteContentRange": {
                    "range": { "startIndex": start, "endIndex": end },
                }
            }),
        })
        .collect()
}

#[async_trait]
impl<T: TokenSource> RemoteStore for GoogleDrive<T> {
    async fn find(&self, query: &ObjectQuery) -> anyhow::Result<Lookup> {
        let q = search_expression(query);
        debug!("Drive search: {q}");
        let request = self
            .client
            .get(format!("{}/files", self.endpoints.drive))
            .query(&[
                ("q", q.as_str()),
                ("spaces", "drive"),
                ("fields", "files(id, name, mimeType, parents)"),
            ]);
        let list: FileList = serde_json::from_value(self.send_json(request).await?)?;
        Ok(Lookup::first_of(list.files))
    }

    async fn create_folder(&self, name: &str) -> anyhow::Result<String> {
        let request = self
            .client
            .post(format!("{}/files", self.endpoints.drive))
            .query(&[("fields", "id")])
            .json(&json!({ "name": name, "mimeType": FOLDER_MIME_TYPE }));
        self.send_for_id(request).await
    }

    async fn create_file(
        &self,
        name: &str,
        parent: &str,
        mime_type: &str,
        content: Vec<u8>,
    ) -> anyhow::Result<String> {
        let session = self
            .client
            .post(format!("{}/files", self.endpoints.upload))
            .json(&json!({ "name": name, "parents": [parent], "mimeType": mime_type }));
        self.resumable_upload(session, mime_type, content).await
    }

    async fn update_file(&self, id: &str, mime_type: &str, content: Vec<u8>) -> anyhow::Result<()> {
        let session = self
            .client
            .patch(format!("{}/files/{id}", self.endpoints.upload))
            .json(&json!({}));
        self.resumable_upload(session, mime_type, content).await?;
        Ok(())
    }

    async fn create_document(&self, name: &str, parent: &str) -> anyhow::Result<String> {
        let request = self
            .client
            .post(format!("{}/files", self.endpoints.drive))
            .query(&[("fields", "id")])
            .json(&json!({ "name": name, "mimeType": DOCUMENT_MIME_TYPE, "parents": [parent] }));
        self.send_for_id(request).await
    }

    async fn copy(&self, id: &str, name: &str, parent: &str) -> anyhow::Result<String> {
        let request = self
            .client
            .post(format!("{}/files/{id}/copy", self.endpoints.drive))
            .query(&[("fields", "id")])
            .json(&json!({ "name": name, "parents": [parent] }));
        self.send_for_id(request).await
    }

    async fn document_end_index(&self, id: &str) -> anyhow::Result<usize> {
        let request = self
            .client
            .get(format!("{}/documents/{id}", self.endpoints.docs))
            .query(&[("fields", "body.content.endIndex")]);
        let document = self.send_json(request).await?;

        let end = document["body"]["content"]
            .as_array()
            .and_then(|content| content.last())
            .and_then(|element| element["endIndex"].as_u64())
            .ok_or(ProviderError::MissingField("body.content.endIndex"))?;
        Ok(usize::try_from(end)?)
    }

    async fn batch_update(&self, id: &str, edits: &[DocumentEdit]) -> anyhow::Result<()> {
        if edits.is_empty() {
            return Ok(());
        }
        let request = self
            .client
            .post(format!("{}/documents/{id}:batchUpdate", self.endpoints.docs))
            .json(&json!({ "requests": edit_requests(edits) }));
        self.send_json(request).await?;
        Ok(())
    }

    async fn move_object(&self, id: &str, from_parent: &str, to_parent: &str) -> anyhow::Result<()> {
        let request = self
            .client
            .patch(format!("{}/files/{id}", self.endpoints.drive))
            .query(&[
                ("addParents", to_parent),
                ("removeParents", from_parent),
                ("fields", "id"),
            ])
            .json(&json!({}));
        self.send_json(request).await?;
        Ok(())
    }
}
