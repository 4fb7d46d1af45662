//! Autocomplete with supersession.
//!
//! Every keystroke issues a fresh `search` and retires the previous one.
//! Results come back through a channel as [`Completion`]s and are only
//! published if their handle is still current, so the visible candidates
//! always answer the latest text even when responses arrive out of order.
//! There is no timer: suppression is purely by issuance order.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::provider::PlaceCandidate;
use crate::query::{GeoQueryClient, HandleAllocator, QueryError, QueryHandle, QueryKind, QuerySlot};

/// A finished search, tagged with the handle it was issued under.
#[derive(Debug, Clone)]
pub struct Completion {
    pub handle: QueryHandle,
    pub text: String,
    pub result: Result<Vec<PlaceCandidate>, QueryError>,
}

/// Counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompleterStats {
    /// Searches sent to the provider.
    pub issued: u64,
    /// Completions accepted and published (including failures degraded
    /// to an empty list).
    pub published: u64,
    /// Searches retired by a newer keystroke or a cancel.
    pub superseded: u64,
    /// Late completions dropped because their handle was stale.
    pub discarded: u64,
    /// Accepted completions whose search failed.
    pub failed: u64,
}

/// Turns text edits into a stream of candidate lists.
#[derive(Debug)]
pub struct DebouncedCompleter {
    client: GeoQueryClient,
    handles: Arc<HandleAllocator>,
    slot: QuerySlot,
    completion_tx: mpsc::UnboundedSender<Completion>,
    text: String,
    last_error: Option<QueryError>,
    stats: CompleterStats,
}

impl DebouncedCompleter {
    /// Create a completer that reports finished searches on `completion_tx`.
    ///
    /// The owner must feed every received [`Completion`] back through
    /// [`accept`](Self::accept).
    pub fn new(
        client: GeoQueryClient,
        handles: Arc<HandleAllocator>,
        completion_tx: mpsc::UnboundedSender<Completion>,
    ) -> Self {
        Self {
            client,
            handles,
            slot: QuerySlot::new(QueryKind::Completion),
            completion_tx,
            text: String::new(),
            last_error: None,
            stats: CompleterStats::default(),
        }
    }

    /// Handle a text edit.
    ///
    /// Blank text publishes an empty list immediately (returned as `Some`)
    /// without a provider call. Otherwise a search is started and `None` is
    /// returned; its result arrives later as a [`Completion`].
    pub fn text_changed(&mut self, text: &str) -> Option<Vec<PlaceCandidate>> {
        self.text = text.to_string();
        if self.slot.cancel().is_some() {
            self.stats.superseded += 1;
        }

        if text.trim().is_empty() {
            debug!("Search text cleared");
            return Some(Vec::new());
        }

        let (handle, _) = self.slot.issue(&self.handles);
        self.stats.issued += 1;
        debug!(query = %handle, text, "Completion issued");

        let client = self.client.clone();
        let tx = self.completion_tx.clone();
        let text = text.to_string();
        tokio::spawn(async move {
            let result = client.search(&text).await;
            // Receiver gone means the owner shut down; nothing to publish.
            let _ = tx.send(Completion {
                handle,
                text,
                result,
            });
        });
        None
    }

    /// Handle a finished search.
    ///
    /// Returns the candidates to publish if `completion` is still current,
    /// `None` if it was superseded. Failures publish an empty list and are
    /// recorded in [`last_error`](Self::last_error).
    pub fn accept(&mut self, completion: Completion) -> Option<Vec<PlaceCandidate>> {
        if self.slot.complete(completion.handle).is_err() {
            self.stats.discarded += 1;
            debug!(query = %completion.handle, text = %completion.text, "Stale completion discarded");
            return None;
        }

        self.stats.published += 1;
        match completion.result {
            Ok(candidates) => {
                debug!(
                    query = %completion.handle,
                    count = candidates.len(),
                    "Completion published"
                );
                self.last_error = None;
                Some(candidates)
            }
            Err(e) => {
                warn!(
                    query = %completion.handle,
                    text = %completion.text,
                    error = %e,
                    "Completion failed"
                );
                self.stats.failed += 1;
                self.last_error = Some(e);
                Some(Vec::new())
            }
        }
    }

    /// Retire any in-flight search and clear the text.
    pub fn cancel(&mut self) {
        if self.slot.cancel().is_some() {
            self.stats.superseded += 1;
        }
        self.text.clear();
    }

    /// Text of the latest edit.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether a search is awaiting its completion.
    pub fn is_pending(&self) -> bool {
        self.slot.current().is_some()
    }

    /// Error of the most recent accepted completion, if it failed.
    pub fn last_error(&self) -> Option<&QueryError> {
        self.last_error.as_ref()
    }

    pub fn stats(&self) -> CompleterStats {
        self.stats
    }
}
