//! Resumable Download Tests
//!
//! Covers:
//! - Offsets persisted per body part and cleared on completion
//! - Non-resumable statuses
//! - `Range` header derivation from stored offsets
//! - Session flush to a file store and reload in a new session

use asyncnet::base::neterror::NetError;
use asyncnet::handler::{
    AsyncHandler, FileResumableProcessor, ResponseStatus, ResumableAsyncHandler,
    ResumableProcessor, ResumableSession, State,
};
use asyncnet::urlrequest::Request;
use http::{Method, StatusCode, Version};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use url::Url;

const URL: &str = "http://downloads.example.com/big.iso";

/// Records every store call.
#[derive(Default)]
struct RecordingProcessor {
    puts: Mutex<Vec<(String, u64)>>,
    removed: Mutex<Vec<String>>,
    stored: Mutex<HashMap<String, u64>>,
}

impl RecordingProcessor {
    fn puts(&self) -> Vec<(String, u64)> {
        self.puts.lock().unwrap().clone()
    }

    fn stored(&self, key: &str) -> Option<u64> {
        self.stored.lock().unwrap().get(key).copied()
    }
}

impl ResumableProcessor for RecordingProcessor {
    fn put(&self, key: &str, offset: u64) {
        self.puts.lock().unwrap().push((key.to_string(), offset));
        self.stored.lock().unwrap().insert(key.to_string(), offset);
    }

    fn remove(&self, key: &str) {
        self.removed.lock().unwrap().push(key.to_string());
        self.stored.lock().unwrap().remove(key);
    }

    fn save(&self, _index: &HashMap<String, u64>) -> Result<(), NetError> {
        Ok(())
    }

    fn load(&self) -> Result<HashMap<String, u64>, NetError> {
        Ok(HashMap::new())
    }
}

fn status(code: StatusCode) -> ResponseStatus {
    ResponseStatus::new(code, Version::HTTP_11, Url::parse(URL).unwrap())
}

#[test]
fn test_offsets_follow_body_parts() {
    let session = Arc::new(ResumableSession::new());
    let processor = Arc::new(RecordingProcessor::default());
    let mut handler = ResumableAsyncHandler::builder(session.clone())
        .processor(processor.clone())
        .build();

    assert_eq!(handler.on_status_received(&status(StatusCode::OK)).unwrap(), State::Continue);

    for (size, expected) in [(10usize, 10u64), (20, 30), (30, 60)] {
        let part = vec![0u8; size];
        assert_eq!(handler.on_body_part_received(&part).unwrap(), State::Continue);
        assert_eq!(processor.stored(URL), Some(expected));
        assert_eq!(session.offset(URL), Some(expected));
    }

    let offsets: Vec<u64> = processor.puts().into_iter().map(|(_, o)| o).collect();
    assert_eq!(offsets, vec![10, 30, 60]);

    let response = handler.on_completed().unwrap().unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(processor.stored(URL), None);
    assert_eq!(session.offset(URL), None);
    assert_eq!(*processor.removed.lock().unwrap(), vec![URL.to_string()]);
}

#[test]
fn test_not_found_aborts_without_persisting() {
    let session = Arc::new(ResumableSession::new());
    let processor = Arc::new(RecordingProcessor::default());
    let mut handler = ResumableAsyncHandler::builder(session.clone())
        .processor(processor.clone())
        .build();

    let state = handler.on_status_received(&status(StatusCode::NOT_FOUND)).unwrap();
    assert_eq!(state, State::Abort);

    assert_eq!(handler.on_body_part_received(b"error page").unwrap(), State::Abort);
    assert!(processor.puts().is_empty());
    assert_eq!(session.offset(URL), None);
}

#[test]
fn test_adjust_request_range_from_stored_offset() {
    let session = Arc::new(ResumableSession::new());
    session.record(URL, 4096);
    let handler = ResumableAsyncHandler::builder(session).build();

    let request = Request::builder(Method::GET, URL).unwrap().build();
    let first = handler.adjust_request_range(&request).unwrap();
    let second = handler.adjust_request_range(&request).unwrap();

    assert_eq!(first.headers().get_str("range"), Some("bytes=4096-"));
    assert_eq!(second.headers().get_str("range"), Some("bytes=4096-"));
    assert_eq!(second.headers().get_all("range").count(), 1);
    assert!(!request.headers().contains("range"));
}

#[test]
fn test_interrupted_download_resumes_after_restart() {
    let dir = tempfile::tempdir().unwrap();

    // first run: two parts arrive, then the process shuts down
    {
        let session = Arc::new(ResumableSession::new());
        let mut handler = ResumableAsyncHandler::builder(session.clone())
            .processor(Arc::new(FileResumableProcessor::new(dir.path())))
            .build();
        handler.on_status_received(&status(StatusCode::OK)).unwrap();
        handler.on_body_part_received(&[0u8; 512]).unwrap();
        handler.on_body_part_received(&[0u8; 256]).unwrap();
        handler.on_throwable(&NetError::ContentLengthMismatch);
        assert!(session.flush());
    }

    // second run picks the offset up from disk
    let session = Arc::new(ResumableSession::new());
    let mut handler = ResumableAsyncHandler::builder(session.clone())
        .processor(Arc::new(FileResumableProcessor::new(dir.path())))
        .build();
    assert_eq!(session.offset(URL), Some(768));

    let request = Request::builder(Method::GET, URL).unwrap().build();
    let request = handler.adjust_request_range(&request).unwrap();
    assert_eq!(request.headers().get_str("range"), Some("bytes=768-"));

    handler
        .on_status_received(&status(StatusCode::PARTIAL_CONTENT))
        .unwrap();
    handler.on_body_part_received(&[0u8; 232]).unwrap();
    assert_eq!(handler.byte_transferred(), 1000);
    handler.on_completed().unwrap();
    assert_eq!(session.offset(URL), None);
}

#[test]
fn test_completed_download_stays_forgotten() {
    let dir = tempfile::tempdir().unwrap();
    {
        let session = Arc::new(ResumableSession::new());
        let mut handler = ResumableAsyncHandler::builder(session.clone())
            .processor(Arc::new(FileResumableProcessor::new(dir.path())))
            .build();
        handler.on_status_received(&status(StatusCode::OK)).unwrap();
        handler.on_body_part_received(&[0u8; 768]).unwrap();
        assert!(session.flush());
    }

    let session = Arc::new(ResumableSession::new());
    let processor: Arc<dyn ResumableProcessor> =
        Arc::new(FileResumableProcessor::new(dir.path()));
    let mut handler = ResumableAsyncHandler::builder(session.clone())
        .processor(processor.clone())
        .build();
    assert_eq!(session.offset(URL), Some(768));
    handler
        .on_status_received(&status(StatusCode::PARTIAL_CONTENT))
        .unwrap();
    handler.on_body_part_received(&[0u8; 232]).unwrap();
    handler.on_completed().unwrap();

    let next = ResumableAsyncHandler::builder(session.clone())
        .processor(processor.clone())
        .build();
    assert_eq!(session.offset(URL), None);

    let request = Request::builder(Method::GET, URL).unwrap().build();
    let request = next.adjust_request_range(&request).unwrap();
    assert!(!request.headers().contains("range"));

    assert!(session.flush());
    assert!(processor.load().unwrap().is_empty());
    assert!(FileResumableProcessor::new(dir.path()).load().unwrap().is_empty());
}

#[test]
fn test_concurrent_transfers_share_session() {
    let session = Arc::new(ResumableSession::new());

    let workers: Vec<_> = (0..4)
        .map(|i| {
            let session = session.clone();
            std::thread::spawn(move || {
                let url = format!("http://h/file-{}", i);
                let mut handler = ResumableAsyncHandler::builder(session).build();
                handler
                    .on_status_received(&ResponseStatus::new(
                        StatusCode::OK,
                        Version::HTTP_11,
                        Url::parse(&url).unwrap(),
                    ))
                    .unwrap();
                for _ in 0..10 {
                    handler.on_body_part_received(&[0u8; 100]).unwrap();
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    for i in 0..4 {
        assert_eq!(session.offset(&format!("http://h/file-{}", i)), Some(1000));
    }
    assert_eq!(session.processor_count(), 4);
}
