//! Document loading: locations, fetchers, and the import/merge resolver.

mod fetcher;
mod loader;
mod location;

pub use fetcher::{
    ContentFetcher, FetchError, InMemoryFetcher, LocalFetcher, ObjectStoreFetcher,
    DEFAULT_FETCH_TIMEOUT,
};
pub use loader::{ConfigLoader, LoadOptions, DEFAULT_MAX_IMPORT_DEPTH};
pub use location::{DocumentFormat, DocumentLocation};
