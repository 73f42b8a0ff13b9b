//! Debounced address autocomplete.
//!
//! Each call to [`SuggestionDebouncer::input`] cancels the lookup scheduled
//! by the previous one and schedules a fresh lookup after the quiet
//! interval. Input shorter than [`MIN_QUERY_CHARS`] never triggers a lookup
//! and clears the visible list instead.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::services::{GeocodeCandidate, GeocodeError, GeocodeQuery, Geocoder};

pub const QUIET_INTERVAL: Duration = Duration::from_millis(500);
pub const MIN_QUERY_CHARS: usize = 4;
pub const SUGGESTION_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionUpdate {
    /// Hide the suggestion list.
    Cleared,
    Results {
        query: String,
        candidates: Vec<GeocodeCandidate>,
    },
    Failed {
        query: String,
        error: GeocodeError,
    },
}

pub struct SuggestionDebouncer {
    geocoder: Arc<dyn Geocoder>,
    quiet: Duration,
    limit: usize,
    generation: Arc<AtomicU64>,
    pending: Option<JoinHandle<()>>,
    updates: mpsc::UnboundedSender<SuggestionUpdate>,
}

impl SuggestionDebouncer {
    /// Creates a debouncer with the default interval and limit, and the
    /// receiver its updates are delivered to. Must be called inside a tokio
    /// runtime.
    pub fn new(geocoder: Arc<dyn Geocoder>) -> (Self, mpsc::UnboundedReceiver<SuggestionUpdate>) {
        Self::with_settings(geocoder, QUIET_INTERVAL, SUGGESTION_LIMIT)
    }

    pub fn with_settings(
        geocoder: Arc<dyn Geocoder>,
        quiet: Duration,
        limit: usize,
    ) -> (Self, mpsc::UnboundedReceiver<SuggestionUpdate>) {
        let (updates, receiver) = mpsc::unbounded_channel();
        let debouncer = Self {
            geocoder,
            quiet,
            limit,
            generation: Arc::new(AtomicU64::new(0)),
            pending: None,
            updates,
        };
        (debouncer, receiver)
    }

    /// Handles one keystroke's worth of input.
    pub fn input(
        &mut self,
        text: &str,
    ) {
        self.cancel();
        let query = text.trim().to_string();

        if query.chars().count() < MIN_QUERY_CHARS {
            let _ = self.updates.send(SuggestionUpdate::Cleared);
            return;
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let current = self.generation.clone();
        let geocoder = self.geocoder.clone();
        let updates = self.updates.clone();
        let quiet = self.quiet;
        let limit = self.limit;

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            debug!(query = %query, "looking up suggestions");

            let result = geocoder
                .search(&GeocodeQuery::FreeText(query.clone()), limit)
                .await;
            if current.load(Ordering::SeqCst) != generation {
                return;
            }
            let update = match result {
                Ok(candidates) => SuggestionUpdate::Results { query, candidates },
                Err(error) => SuggestionUpdate::Failed { query, error },
            };
            let _ = updates.send(update);
        }));
    }

    /// Drops any scheduled or in-flight lookup without notifying.
    pub fn cancel(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for SuggestionDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
