//! In-memory cache of fetched series, keyed by [`FetchRequest`].

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use crate::data_source::FetchRequest;
use crate::{RawRecord, ValidationError};

/// Defines how a pipeline run uses the session cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Read a cached result when present; otherwise fetch and store it.
    #[default]
    Use,
    /// Always fetch, then overwrite the cached entry.
    Refresh,
    /// Always fetch and leave the cache untouched.
    Bypass,
}

impl CacheMode {
    pub const fn reads(self) -> bool {
        matches!(self, Self::Use)
    }

    pub const fn writes(self) -> bool {
        matches!(self, Self::Use | Self::Refresh)
    }
}

impl FromStr for CacheMode {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "use" => Ok(Self::Use),
            "refresh" => Ok(Self::Refresh),
            "bypass" => Ok(Self::Bypass),
            other => Err(ValidationError::InvalidCacheMode {
                value: other.to_owned(),
            }),
        }
    }
}

/// Thread-safe map of successful fetch results.
///
/// Entries never expire; they are dropped only by [`FetchCache::clear`].
#[derive(Debug, Clone, Default)]
pub struct FetchCache {
    inner: Arc<tokio::sync::RwLock<HashMap<FetchRequest, Arc<Vec<RawRecord>>>>>,
}

impl FetchCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, request: &FetchRequest) -> Option<Arc<Vec<RawRecord>>> {
        let store = self.inner.read().await;
        store.get(request).cloned()
    }

    pub async fn put(&self, request: FetchRequest, records: Arc<Vec<RawRecord>>) {
        let mut store = self.inner.write().await;
        store.insert(request, records);
    }

    pub async fn clear(&self) {
        let mut store = self.inner.write().await;
        store.clear();
    }

    pub async fn len(&self) -> usize {
        let store = self.inner.read().await;
        store.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
