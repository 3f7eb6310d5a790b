//! Stand-in source fetchers for exercising the refresh path without a network.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use crate::ingest::{IngestError, RawSource, SourceFetcher};

/// Serves the same bytes for every URL and records what was asked for.
#[derive(Clone)]
pub struct StaticFetcher {
    bytes: Arc<Mutex<Vec<u8>>>,
    content_type: Option<String>,
    requested: Arc<Mutex<Vec<String>>>,
}

impl StaticFetcher {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Arc::new(Mutex::new(bytes)),
            content_type: None,
            requested: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Serve different bytes from now on. Clones see the change.
    pub fn set_bytes(&self, bytes: Vec<u8>) {
        *self.bytes.lock().unwrap() = bytes;
    }

    pub fn calls(&self) -> usize {
        self.requested.lock().unwrap().len()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceFetcher for StaticFetcher {
    async fn fetch(&self, url: &str, _timeout: Duration) -> Result<RawSource, IngestError> {
        self.requested.lock().unwrap().push(url.to_string());
        let bytes = self.bytes.lock().unwrap().clone();
        Ok(RawSource::new(url, self.content_type.clone(), bytes))
    }
}

/// Fails every fetch with a download error.
#[derive(Clone)]
pub struct FailingFetcher {
    reason: String,
    calls: Arc<AtomicUsize>,
}

impl FailingFetcher {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceFetcher for FailingFetcher {
    async fn fetch(&self, _url: &str, _timeout: Duration) -> Result<RawSource, IngestError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(IngestError::Download(self.reason.clone()))
    }
}

/// Holds every fetch until the test releases it.
///
/// Lets a test keep a refresh in flight for as long as it needs to observe
/// the gate and the published snapshot.
#[derive(Clone)]
pub struct BlockingFetcher {
    inner: StaticFetcher,
    started: Arc<Notify>,
    release: Arc<Notify>,
}

/// Controls a [`BlockingFetcher`].
#[derive(Clone)]
pub struct BlockingHandle {
    started: Arc<Notify>,
    release: Arc<Notify>,
}

impl BlockingFetcher {
    pub fn new(bytes: Vec<u8>) -> (Self, BlockingHandle) {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let fetcher = Self {
            inner: StaticFetcher::new(bytes),
            started: started.clone(),
            release: release.clone(),
        };
        (fetcher, BlockingHandle { started, release })
    }

    pub fn calls(&self) -> usize {
        self.inner.calls()
    }
}

impl BlockingHandle {
    /// Wait until a fetch has started.
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    /// Let one pending (or the next) fetch complete.
    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl SourceFetcher for BlockingFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<RawSource, IngestError> {
        self.started.notify_one();
        self.release.notified().await;
        self.inner.fetch(url, timeout).await
    }
}
