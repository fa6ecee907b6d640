//! Content fetchers: the I/O seam of the resolver.
//!
//! A [`ContentFetcher`] turns a [`DocumentLocation`] into bytes. Timeouts
//! and transport details live here and surface to the resolver as plain
//! [`FetchError`]s.

use super::location::DocumentLocation;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::http::HttpBuilder;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, ObjectStoreScheme, PutPayload};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::{Builder as RuntimeBuilder, Runtime};
use url::Url;

/// Default per-request timeout for remote fetches.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised by a fetcher.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Nothing exists at the location.
    #[error("not found")]
    NotFound,

    /// No transport handles this URI scheme.
    #[error("unsupported URI scheme '{0}'")]
    UnsupportedScheme(String),

    /// The request did not finish in time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The fetcher cannot write.
    #[error("uploads are not supported by this fetcher")]
    UploadUnsupported,

    /// Local I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Object store failure.
    #[error("{0}")]
    Store(String),
}

impl From<object_store::Error> for FetchError {
    fn from(err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { .. } => FetchError::NotFound,
            other => FetchError::Store(other.to_string()),
        }
    }
}

/// Reads documents and SQL files, and optionally writes finished databases.
pub trait ContentFetcher: Send + Sync + fmt::Debug {
    /// Read the full content at `location`.
    fn fetch(&self, location: &DocumentLocation) -> Result<Vec<u8>, FetchError>;

    /// Write `data` to a remote `target`.
    fn upload(&self, target: &Url, data: Vec<u8>) -> Result<(), FetchError> {
        let _ = (target, data);
        Err(FetchError::UploadUnsupported)
    }
}

fn read_local(path: &std::path::Path) -> Result<Vec<u8>, FetchError> {
    std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => FetchError::NotFound,
        _ => FetchError::Io(e),
    })
}

/// Fetcher that only reads the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFetcher;

impl ContentFetcher for LocalFetcher {
    fn fetch(&self, location: &DocumentLocation) -> Result<Vec<u8>, FetchError> {
        match location {
            DocumentLocation::Local(path) => read_local(path),
            DocumentLocation::Remote(url) => {
                Err(FetchError::UnsupportedScheme(url.scheme().to_string()))
            }
        }
    }
}

/// Fetcher for local files plus S3, GCS, Azure and HTTP(S) via `object_store`.
///
/// Cloud credentials come from the provider's usual environment variables.
/// Remote calls block on a private current-thread runtime, so this must not
/// be used from inside an async context.
pub struct ObjectStoreFetcher {
    timeout: Duration,
    runtime: Mutex<Option<Runtime>>,
}

impl ObjectStoreFetcher {
    /// Create a fetcher with the default timeout.
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_FETCH_TIMEOUT,
            runtime: Mutex::new(None),
        }
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn store_for(url: &Url) -> Result<(Arc<dyn ObjectStore>, ObjectPath), FetchError> {
        let (scheme, path) = ObjectStoreScheme::parse(url)
            .map_err(|_| FetchError::UnsupportedScheme(url.scheme().to_string()))?;

        let store: Arc<dyn ObjectStore> = match scheme {
            ObjectStoreScheme::AmazonS3 => {
                Arc::new(AmazonS3Builder::from_env().with_url(url.as_str()).build()?)
            }
            ObjectStoreScheme::GoogleCloudStorage => Arc::new(
                GoogleCloudStorageBuilder::from_env()
                    .with_url(url.as_str())
                    .build()?,
            ),
            ObjectStoreScheme::MicrosoftAzure => Arc::new(
                MicrosoftAzureBuilder::from_env()
                    .with_url(url.as_str())
                    .build()?,
            ),
            ObjectStoreScheme::Http => Arc::new(
                HttpBuilder::new()
                    .with_url(url.origin().ascii_serialization())
                    .build()?,
            ),
            _ => return Err(FetchError::UnsupportedScheme(url.scheme().to_string())),
        };
        Ok((store, path))
    }

    fn block_on<F, T>(&self, future: F) -> Result<T, FetchError>
    where
        F: Future<Output = Result<T, FetchError>>,
    {
        let mut guard = self.runtime.lock();
        let runtime = match guard.take() {
            Some(runtime) => runtime,
            None => RuntimeBuilder::new_current_thread().enable_all().build()?,
        };
        let timeout = self.timeout;
        let result = runtime.block_on(async move {
            match tokio::time::timeout(timeout, future).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout(timeout)),
            }
        });
        *guard = Some(runtime);
        result
    }
}

impl Default for ObjectStoreFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObjectStoreFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStoreFetcher")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ContentFetcher for ObjectStoreFetcher {
    fn fetch(&self, location: &DocumentLocation) -> Result<Vec<u8>, FetchError> {
        match location {
            DocumentLocation::Local(path) => read_local(path),
            DocumentLocation::Remote(url) => {
                let (store, path) = Self::store_for(url)?;
                tracing::debug!(uri = %url, "fetching remote content");
                self.block_on(async move {
                    let bytes = store.get(&path).await?.bytes().await?;
                    Ok(bytes.to_vec())
                })
            }
        }
    }

    fn upload(&self, target: &Url, data: Vec<u8>) -> Result<(), FetchError> {
        let (store, path) = Self::store_for(target)?;
        tracing::debug!(uri = %target, bytes = data.len(), "uploading content");
        self.block_on(async move {
            store.put(&path, PutPayload::from(data)).await?;
            Ok(())
        })
    }
}

/// In-memory fetcher keyed by location identity.
///
/// Useful for tests and for embedding documents that never touch disk.
#[derive(Debug, Default, Clone)]
pub struct InMemoryFetcher {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryFetcher {
    /// Create an empty fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register content under a location identity (a URI or absolute path).
    pub fn insert(&self, identity: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.entries.lock().insert(identity.into(), content.into());
    }

    /// Content previously inserted or uploaded.
    pub fn get(&self, identity: &str) -> Option<Vec<u8>> {
        self.entries.lock().get(identity).cloned()
    }
}

impl ContentFetcher for InMemoryFetcher {
    fn fetch(&self, location: &DocumentLocation) -> Result<Vec<u8>, FetchError> {
        self.get(&location.identity()).ok_or(FetchError::NotFound)
    }

    fn upload(&self, target: &Url, data: Vec<u8>) -> Result<(), FetchError> {
        self.insert(target.to_string(), data);
        Ok(())
    }
}
