pub mod helpers;
use self::helpers::*;

use block_blob_upload::client::{MemoryClient, Scripted};
use block_blob_upload::retry::RetryPolicy;
use block_blob_upload::error::ErrorKind;
use block_blob_upload::event::Event;
use block_blob_upload::source::{LocalFile, MemoryFile};
use block_blob_upload::upload::Upload;
use block_blob_upload::{CancellationToken, UploadBuilder, UploadRequest, UploadState};

use futures::StreamExt as _;
use std::io::Write as _;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread")]
async fn small_file_is_sent_in_one_request() {
    let _ = &*TRACER;

    let client = MemoryClient::new();
    let sink = Recorder::new();
    let req = UploadRequest::new(URL, memory_file(4_000_000)).max_single_shot_megabytes(6);

    let (upload, state) = uploader(&client).upload_once(req, sink.clone()).await;

    assert!(!upload.is_chunked());
    assert_eq!(state, UploadState::Completed { status: 201 });

    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url(), URL);
    assert_eq!(requests[0].body().len(), 4_000_000);
    assert_eq!(
        requests[0].header_value("Content-Type"),
        Some("application/octet-stream")
    );

    assert_eq!(sink.names().last(), Some(&"completed"));
    assert_eq!(sink.completed()[0].status, 201);
    assert_eq!(sink.progress().last().map(|p| p.progress), Some(100.0));
}

#[tokio::test(start_paused = true)]
async fn large_file_is_sent_in_blocks() {
    let _ = &*TRACER;

    let client = MemoryClient::new();
    let sink = Recorder::new();
    let file = memory_file(12_000_000).with_mime_type("application/pdf");
    let req = UploadRequest::new(URL, file).max_single_shot_megabytes(6);

    let (upload, state) = uploader(&client).upload_once(req, sink.clone()).await;

    assert!(upload.is_chunked());
    assert_eq!(state, UploadState::Completed { status: 201 });

    let requests = client.requests();
    assert_eq!(requests.len(), 4);

    let blocks = block_bodies(&requests);
    let sizes: Vec<usize> = blocks.iter().map(|(_, b)| b.len()).collect();
    assert_eq!(sizes, vec![5_242_880, 5_242_880, 1_514_240]);
    let ids = ["YmxvY2stMDAwMDAw", "YmxvY2stMDAwMDAx", "YmxvY2stMDAwMDAy"];
    for ((url, _), id) in blocks.iter().zip(ids) {
        assert_eq!(*url, format!("{URL}&comp=block&blockid={id}"));
    }
    let joined: Vec<u8> = blocks.iter().flat_map(|(_, b)| b.iter().copied()).collect();
    assert_eq!(joined, patterned(12_000_000));
    assert!(requests[..3]
        .iter()
        .all(|r| r.header_value("Content-Type") == Some("application/pdf")));

    let commit = &requests[3];
    assert!(is_commit(commit));
    assert_eq!(
        commit.header_value("content-type"),
        Some("application/x-www-form-urlencoded; charset=UTF-8")
    );
    assert_eq!(commit.header_value("x-ms-blob-content-type"), Some("application/pdf"));
    let xml = std::str::from_utf8(commit.body()).unwrap();
    let expected = ids.map(|id| format!("<Latest>{id}</Latest>")).concat();
    assert_eq!(
        xml,
        format!("<?xml version=\"1.0\" encoding=\"utf-8\"?><BlockList>{expected}</BlockList>")
    );

    let percents: Vec<f64> = sink.progress().iter().map(|p| p.progress).collect();
    assert_eq!(percents, vec![43.69, 87.38, 99.99, 99.99, 100.0]);
    assert_eq!(sink.names().last(), Some(&"completed"));
    assert!(sink.errors().is_empty());
}

#[tokio::test(start_paused = true)]
async fn exhausted_block_retries_roll_back_the_block() {
    let _ = &*TRACER;

    let client = MemoryClient::new();
    client
        .script(1, Scripted::Status(201))
        .script(10, Scripted::NetworkError);
    let sink = Recorder::new();
    let req = UploadRequest::new(URL, memory_file(12_000_000));

    let (mut upload, state) = uploader(&client).upload_once(req, sink.clone()).await;

    assert_eq!(state, UploadState::Failed);
    assert_eq!(client.requests().len(), 11);

    let session = upload.session().unwrap();
    assert_eq!(session.block_ids().count(), 1);
    assert_eq!(session.offset(), MIB5);
    assert_eq!(session.remaining(), 12_000_000 - MIB5);
    assert_eq!(session.uploaded(), MIB5);

    assert_eq!(sink.names(), vec!["progress", "error"]);
    assert_eq!(sink.errors(), vec![(ErrorKind::Network, None)]);

    // Resuming picks up at the failed block.
    sink.clear();
    assert_eq!(upload.retry().await, UploadState::Completed { status: 201 });

    let requests = client.requests();
    assert_eq!(requests.len(), 14);
    let blocks = block_bodies(&requests);
    assert_eq!(blocks.len(), 3);
    let joined: Vec<u8> = blocks.iter().flat_map(|(_, b)| b.iter().copied()).collect();
    assert_eq!(joined, patterned(12_000_000));

    let xml = std::str::from_utf8(requests[13].body()).unwrap();
    assert_eq!(xml.matches("<Latest>").count(), 3);

    let percents: Vec<f64> = sink.progress().iter().map(|p| p.progress).collect();
    assert_eq!(percents, vec![87.38, 99.99, 99.99, 100.0]);
}

#[tokio::test(start_paused = true)]
async fn block_with_error_status_is_not_retried() {
    let _ = &*TRACER;

    let client = MemoryClient::new();
    client.script(1, Scripted::Status(503));
    let sink = Recorder::new();
    let req = UploadRequest::new(URL, memory_file(8_000_000));

    let (upload, state) = uploader(&client).upload_once(req, sink.clone()).await;

    assert_eq!(state, UploadState::Failed);
    assert_eq!(client.requests().len(), 1);
    let session = upload.session().unwrap();
    assert_eq!(session.offset(), 0);
    assert_eq!(session.remaining(), 8_000_000);
    assert_eq!(session.block_ids().count(), 0);
    assert_eq!(sink.errors(), vec![(ErrorKind::Status, Some(503))]);
    assert!(sink.progress().is_empty());
}

#[tokio::test(start_paused = true)]
async fn failed_commit_emits_error_and_can_be_retried() {
    let _ = &*TRACER;

    let client = MemoryClient::new();
    client
        .script(3, Scripted::Status(201))
        .script(1, Scripted::Status(409));
    let sink = Recorder::new();
    let req = UploadRequest::new(URL, memory_file(12_000_000));

    let (mut upload, state) = uploader(&client).upload_once(req, sink.clone()).await;

    assert_eq!(state, UploadState::CommitFailed);
    let session = upload.session().unwrap();
    assert!(session.is_failed());
    assert!(!session.is_committed());
    assert_eq!(sink.errors(), vec![(ErrorKind::Commit, Some(409))]);
    assert!(sink.completed().is_empty());
    assert!(sink.progress().iter().all(|p| p.progress < 100.0));

    // Only the commit is sent again.
    assert_eq!(upload.retry().await, UploadState::Completed { status: 201 });
    let requests = client.requests();
    assert_eq!(requests.len(), 5);
    assert!(is_commit(&requests[4]));
    let session = upload.session().unwrap();
    assert!(session.is_committed());
    assert!(!session.is_failed());
    assert_eq!(sink.completed().len(), 1);

    // A committed upload does nothing more.
    assert_eq!(upload.retry().await, UploadState::Completed { status: 201 });
    assert_eq!(client.requests().len(), 5);
}

#[tokio::test(start_paused = true)]
async fn unreadable_block_is_rolled_back() {
    let _ = &*TRACER;

    let client = MemoryClient::new();
    let sink = Recorder::new();
    let file = TruncatedFile {
        inner: memory_file(11_000_000),
        claimed: 12_000_000,
    };
    let req = UploadRequest::new(URL, file);

    let (upload, state) = uploader(&client).upload_once(req, sink.clone()).await;

    assert_eq!(state, UploadState::Failed);
    assert_eq!(client.requests().len(), 2);
    let session = upload.session().unwrap();
    assert_eq!(session.block_ids().count(), 2);
    assert_eq!(session.offset(), 2 * MIB5);
    assert_eq!(session.offset() + session.remaining(), 12_000_000);
    assert_eq!(sink.errors(), vec![(ErrorKind::Read, None)]);
}

#[tokio::test(start_paused = true)]
async fn cancelled_upload_resumes_with_new_token() {
    let _ = &*TRACER;

    let client = MemoryClient::new();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let uploader = UploadBuilder::new(client.clone())
        .cancellation_token(cancel)
        .build();
    let sink = Recorder::new();
    let req = UploadRequest::new(URL, memory_file(7_000_000));

    let mut upload = uploader.upload(req, sink.clone());
    assert_eq!(upload.start().await, UploadState::Failed);
    assert!(client.requests().is_empty());
    assert_eq!(sink.errors(), vec![(ErrorKind::Cancelled, None)]);

    let Upload::Chunked(chunked) = &mut upload else {
        panic!("expected a chunked upload");
    };
    chunked.set_cancellation_token(CancellationToken::new());
    assert_eq!(chunked.retry().await, UploadState::Completed { status: 201 });
    assert_eq!(client.requests().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn cancelling_during_retry_delay_rolls_back_the_block() {
    let _ = &*TRACER;

    let client = MemoryClient::new();
    client
        .script(1, Scripted::Status(201))
        .script(5, Scripted::NetworkError);
    let cancel = CancellationToken::new();
    let uploader = UploadBuilder::new(client.clone())
        .cancellation_token(cancel.clone())
        .build();
    let sink = Recorder::new();
    let req = UploadRequest::new(URL, memory_file(12_000_000));

    // Block 2 fails at once and again 2s later; cancel while waiting for the
    // third attempt.
    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        cancel.cancel();
    });
    let (mut upload, state) = uploader.upload_once(req, sink.clone()).await;
    canceller.await.unwrap();

    assert_eq!(state, UploadState::Failed);
    assert_eq!(client.requests().len(), 3);
    assert_eq!(sink.names(), vec!["progress", "error"]);
    assert_eq!(sink.errors(), vec![(ErrorKind::Cancelled, None)]);

    let session = upload.session().unwrap();
    assert_eq!(session.offset(), MIB5);
    assert_eq!(session.remaining(), 12_000_000 - MIB5);
    assert_eq!(session.uploaded(), MIB5);
    assert_eq!(session.block_ids().count(), 1);
    assert_eq!(session.block_ids()[0].as_str(), "YmxvY2stMDAwMDAw");

    // The old token stays cancelled.
    sink.clear();
    assert_eq!(upload.retry().await, UploadState::Failed);
    assert_eq!(client.requests().len(), 3);
    assert_eq!(sink.errors(), vec![(ErrorKind::Cancelled, None)]);

    // Three network errors are left in the script before the blocks go
    // through.
    sink.clear();
    upload.set_cancellation_token(CancellationToken::new());
    assert_eq!(upload.retry().await, UploadState::Completed { status: 201 });
    let requests = client.requests();
    assert_eq!(requests.len(), 3 + 3 + 3);
    let blocks = block_bodies(&requests);
    let joined: Vec<u8> = blocks.iter().flat_map(|(_, b)| b.iter().copied()).collect();
    assert_eq!(joined, patterned(12_000_000));
    assert!(sink.errors().is_empty());
    assert_eq!(sink.names().last(), Some(&"completed"));
}

#[tokio::test(flavor = "multi_thread")]
async fn cancelled_single_request_resumes_with_new_token() {
    let _ = &*TRACER;

    let client = MemoryClient::new();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let uploader = UploadBuilder::new(client.clone())
        .cancellation_token(cancel)
        .build();
    let sink = Recorder::new();
    let req = UploadRequest::new(URL, memory_file(1_000));

    let (mut upload, state) = uploader.upload_once(req, sink.clone()).await;
    assert!(!upload.is_chunked());
    assert_eq!(state, UploadState::Failed);
    assert!(client.requests().is_empty());
    assert_eq!(sink.errors(), vec![(ErrorKind::Cancelled, None)]);

    upload.set_cancellation_token(CancellationToken::new());
    assert_eq!(upload.retry().await, UploadState::Completed { status: 201 });
    assert_eq!(client.requests().len(), 1);
}

#[test]
fn builder_settings_reach_the_uploader() {
    let defaults = uploader(&MemoryClient::new());
    assert_eq!(defaults.config().retry_policy(), RetryPolicy::default());
    assert_eq!(defaults.config().commit_delay(), Duration::from_millis(4000));

    let policy = RetryPolicy::new(Duration::from_millis(10), 3);
    let configured = UploadBuilder::new(MemoryClient::new())
        .retry_policy(policy)
        .commit_delay(Duration::ZERO)
        .build();
    assert_eq!(configured.config().retry_policy(), policy);
    assert_eq!(configured.config().commit_delay(), Duration::ZERO);
}

#[tokio::test(flavor = "multi_thread")]
async fn single_request_error_status_is_reported() {
    let _ = &*TRACER;

    let client = MemoryClient::new();
    client.script(1, Scripted::Status(403));
    let sink = Recorder::new();
    let req = UploadRequest::new(URL, memory_file(1_000));

    let (mut upload, state) = uploader(&client).upload_once(req, sink.clone()).await;

    assert_eq!(state, UploadState::Failed);
    assert_eq!(sink.errors(), vec![(ErrorKind::Status, Some(403))]);
    assert!(sink.completed().is_empty());

    assert_eq!(upload.retry().await, UploadState::Completed { status: 201 });
    assert_eq!(client.requests().len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn threshold_comes_from_the_request() {
    let _ = &*TRACER;

    let client = MemoryClient::new();
    let req = UploadRequest::new(URL, memory_file(12_000_000)).max_single_shot_megabytes(12);
    assert!(req.is_single_shot());

    let (upload, state) = uploader(&client).upload_once(req, Recorder::new()).await;

    assert!(!upload.is_chunked());
    assert!(state.is_completed());
    assert_eq!(client.requests().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_file_is_sent_in_one_request() {
    let client = MemoryClient::new();
    let sink = Recorder::new();
    let req = UploadRequest::new(URL, MemoryFile::default());

    let (_, state) = uploader(&client).upload_once(req, sink.clone()).await;

    assert!(state.is_completed());
    assert!(client.requests()[0].body().is_empty());
    assert_eq!(sink.completed().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn local_file_is_uploaded_in_blocks() -> anyhow::Result<()> {
    let _ = &*TRACER;

    let data = patterned(7_500_000);
    let mut tmp = tempfile::NamedTempFile::new()?;
    tmp.write_all(&data)?;
    tmp.flush()?;

    let file = LocalFile::open(tmp.path()).await?.with_mime_type("text/plain");
    assert_eq!(file.path(), tmp.path());
    let client = MemoryClient::new();
    let uploader = UploadBuilder::new(client.clone())
        .commit_delay(Duration::ZERO)
        .build();

    let (_, state) = uploader
        .upload_once(UploadRequest::new(URL, file), Recorder::new())
        .await;
    assert!(state.is_completed());

    let requests = client.requests();
    let blocks = block_bodies(&requests);
    assert_eq!(blocks.len(), 2);
    let joined: Vec<u8> = blocks.iter().flat_map(|(_, b)| b.iter().copied()).collect();
    assert_eq!(joined, data);
    assert_eq!(
        requests.last().and_then(|r| r.header_value("x-ms-blob-content-type")),
        Some("text/plain")
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn channel_sink_receives_events() {
    let client = MemoryClient::new();
    let (tx, rx) = futures::channel::mpsc::unbounded::<Event>();
    let req = UploadRequest::new(URL, memory_file(2_000));

    let (upload, _) = uploader(&client).upload_once(req, tx).await;
    drop(upload);

    let names: Vec<&str> = rx.map(|e| e.name()).collect().await;
    assert_eq!(names, vec!["progress", "completed"]);
}
