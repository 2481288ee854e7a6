//! HTTP-level tests of the Drive/Docs client against a mock server.

use memvault_core::{DocumentEdit, Lookup, ObjectKind, ObjectQuery, RemoteStore};
use memvault_providers::{Endpoints, GoogleDrive, ProviderError, StaticToken};
use serde_json::json;
use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn drive(server: &MockServer) -> GoogleDrive<StaticToken> {
    GoogleDrive::new(reqwest::Client::new(), StaticToken("test-token".to_string()))
        .with_endpoints(Endpoints::under(&server.uri()))
}

#[tokio::test]
async fn find_returns_first_listed_match() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(header("authorization", "Bearer test-token"))
        .and(query_param(
            "q",
            "name = 'claude-memory' and mimeType = 'application/vnd.google-apps.folder' and trashed = false",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [
                { "id": "first", "name": "claude-memory", "mimeType": "application/vnd.google-apps.folder" },
                { "id": "second", "name": "claude-memory", "mimeType": "application/vnd.google-apps.folder" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let drive = drive(&server).await;
    let lookup = drive
        .find(&ObjectQuery::new("claude-memory", ObjectKind::Folder))
        .await
        .unwrap();
    let Lookup::Found(folder) = lookup else {
        panic!("expected a folder");
    };
    assert_eq!(folder.id, "first");
}

#[tokio::test]
async fn empty_listing_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "files": [] })))
        .mount(&server)
        .await;

    let drive = drive(&server).await;
    let lookup = drive
        .find(&ObjectQuery::new("memory.json", ObjectKind::File("application/json".into())).in_parent("f1"))
        .await
        .unwrap();
    assert_eq!(lookup, Lookup::NotFound);
}

#[tokio::test]
async fn api_errors_keep_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/drive/v3/files/live/copy"))
        .respond_with(ResponseTemplate::new(403).set_body_string("quota exceeded"))
        .mount(&server)
        .await;

    let drive = drive(&server).await;
    let err = drive.copy("live", "memory_20240101000000.json", "f1").await.unwrap_err();
    match err.downcast_ref::<ProviderError>() {
        Some(ProviderError::Api { status, message }) => {
            assert_eq!(*status, 403);
            assert_eq!(message, "quota exceeded");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn copy_sends_name_and_parent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/drive/v3/files/live/copy"))
        .and(body_json(json!({ "name": "memory_20240101000000.json", "parents": ["f1"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "copy-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let drive = drive(&server).await;
    let id = drive.copy("live", "memory_20240101000000.json", "f1").await.unwrap();
    assert_eq!(id, "copy-1");
}

#[tokio::test]
async fn create_file_uses_resumable_session() {
    let server = MockServer::start().await;
    let session_url = format!("{}/upload-session/abc", server.uri());
    Mock::given(method("POST"))
        .and(path("/upload/drive/v3/files"))
        .and(query_param("uploadType", "resumable"))
        .and(header("x-upload-content-type", "application/json"))
        .and(body_json(json!({ "name": "memory.json", "parents": ["f1"], "mimeType": "application/json" })))
        .respond_with(ResponseTemplate::new(200).insert_header("Location", session_url.as_str()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/upload-session/abc"))
        .and(body_string("{\"type\":\"entity\"}\n"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "file-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let drive = drive(&server).await;
    let id = drive
        .create_file(
            "memory.json",
            "f1",
            "application/json",
            b"{\"type\":\"entity\"}\n".to_vec(),
        )
        .await
        .unwrap();
    assert_eq!(id, "file-1");
}

#[tokio::test]
async fn update_file_without_session_location_fails() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/upload/drive/v3/files/live"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let drive = drive(&server).await;
    let err = drive
        .update_file("live", "application/json", b"{}".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ProviderError>(),
        Some(ProviderError::MissingField(_))
    ));
}

#[tokio::test]
async fn document_end_index_reads_last_element() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/docs/v1/documents/doc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "body": { "content": [ { "endIndex": 1 }, { "endIndex": 42 } ] }
        })))
        .mount(&server)
        .await;

    let drive = drive(&server).await;
    assert_eq!(drive.document_end_index("doc-1").await.unwrap(), 42);
}

#[tokio::test]
async fn batch_update_submits_all_edits_in_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/docs/v1/documents/doc-1:batchUpdate"))
        .and(body_json(json!({
            "requests": [
                { "deleteContentRange": { "range": { "startIndex": 1, "endIndex": 10 } } },
                { "insertText": { "location": { "index": 1 }, "text": "hello\n" } }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "documentId": "doc-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let drive = drive(&server).await;
    drive
        .batch_update(
            "doc-1",
            &[
                DocumentEdit::DeleteContentRange { start: 1, end: 10 },
                DocumentEdit::InsertText {
                    index: 1,
                    text: "hello\n".to_string(),
                },
            ],
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn move_object_swaps_parents() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/drive/v3/files/copy-1"))
        .and(query_param("addParents", "archive"))
        .and(query_param("removeParents", "f1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "copy-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let drive = drive(&server).await;
    drive.move_object("copy-1", "f1", "archive").await.unwrap();
}
