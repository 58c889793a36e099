//! Per-session state shared by pipeline runs.
//!
//! A [`Session`] owns everything that must not leak between independent
//! users of the same process: the fetch cache, the "slow fetch" notice flag
//! and the advisory messages collected for the presentation layer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::Instrument;

use crate::cache::{CacheMode, FetchCache};
use crate::data_source::{FetchRequest, TradeDataSource};
use crate::pipeline::PipelineInputs;
use crate::retry::{fetch_with_retry, FetchError, RetryConfig};
use crate::RawRecord;

/// Sink for user-facing advisory messages.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Forwards notices to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        tracing::info!(notice = message, "session notice");
    }
}

/// Records fetched for one request, plus whether they came from the cache.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub records: Arc<Vec<RawRecord>>,
    pub cache_hit: bool,
}

pub struct Session {
    cache: FetchCache,
    notifier: Arc<dyn Notifier>,
    slow_notice_shown: AtomicBool,
    notices: Mutex<Vec<String>>,
    last_inputs: Mutex<Option<PipelineInputs>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Arc::new(LogNotifier))
    }
}

impl Session {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            cache: FetchCache::new(),
            notifier,
            slow_notice_shown: AtomicBool::new(false),
            notices: Mutex::new(Vec::new()),
            last_inputs: Mutex::new(None),
        }
    }

    pub fn cache(&self) -> &FetchCache {
        &self.cache
    }

    /// Emits `message` unless a one-time notice was already shown in this
    /// session. Returns whether the notice was emitted.
    pub fn notify_once(&self, message: &str) -> bool {
        if self.slow_notice_shown.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.push_notice(message);
        true
    }

    fn push_notice(&self, message: &str) {
        self.notifier.notify(message);
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_owned());
    }

    /// Drains notices gathered since the last call.
    pub fn take_notices(&self) -> Vec<String> {
        std::mem::take(&mut *self.notices.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Records the inputs of a new run. Any change from the previous run
    /// invalidates the whole cache; returns `true` when that happened.
    pub async fn begin_run(&self, inputs: &PipelineInputs) -> bool {
        let changed = {
            let mut last = self
                .last_inputs
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let changed = last.as_ref().is_some_and(|previous| previous != inputs);
            *last = Some(inputs.clone());
            changed
        };

        if changed {
            tracing::debug!("pipeline inputs changed; clearing fetch cache");
            self.cache.clear().await;
        }
        changed
    }

    /// Explicit user-triggered reset: cache, notice flag and pending notices.
    pub async fn clear(&self) {
        self.cache.clear().await;
        self.slow_notice_shown.store(false, Ordering::SeqCst);
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        *self
            .last_inputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Fetches the series for `request`, consulting the cache per `mode` and
    /// retrying transient failures per `config`.
    pub async fn fetch_records(
        &self,
        source: &dyn TradeDataSource,
        config: &RetryConfig,
        mode: CacheMode,
        request: &FetchRequest,
    ) -> Result<Fetched, FetchError> {
        if mode.reads() {
            if let Some(records) = self.cache.get(request).await {
                tracing::debug!(request = %request.describe(), "fetch cache hit");
                return Ok(Fetched {
                    records,
                    cache_hit: true,
                });
            }
        }

        let label = format!("{} request", request.flow.label());
        let span = tracing::info_span!("fetch", request = %request.describe());
        let records = fetch_with_retry(self, config, &label, || source.on_period(request))
            .instrument(span)
            .await?;

        let records = Arc::new(records);
        if mode.writes() {
            self.cache.put(request.clone(), Arc::clone(&records)).await;
        }

        Ok(Fetched {
            records,
            cache_hit: false,
        })
    }
}
