//! Query handles and supersession bookkeeping.
//!
//! Every logical request gets exactly one [`QueryHandle`]. A [`QuerySlot`]
//! tracks the single active handle for one operation kind: issuing a new
//! handle retires the previous one, and a completion is only accepted if
//! its handle is still the active one. Each handle is retired exactly once.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use super::QueryError;

/// Opaque token identifying one in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryHandle(u64);

impl QueryHandle {
    /// Issuance sequence number. Later handles compare greater.
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for QueryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

/// Issues unique, monotonically increasing handles.
#[derive(Debug, Default)]
pub struct HandleAllocator {
    next: AtomicU64,
}

impl HandleAllocator {
    /// Create an allocator starting at handle 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next handle.
    pub fn issue(&self) -> QueryHandle {
        QueryHandle(self.next.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

/// Operation kinds that each own an independent supersession slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// Autocomplete as the user types.
    Completion,
    /// Resolving a selected candidate.
    Selection,
    /// Multi-leg trip computation.
    Trip,
    /// Geocode + ETA travel estimate.
    Estimate,
    /// Reverse geocode of a tapped coordinate.
    Identify,
    /// Points of interest around the map center.
    Nearby,
}

impl QueryKind {
    /// Lowercase name for log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Completion => "completion",
            QueryKind::Selection => "selection",
            QueryKind::Trip => "trip",
            QueryKind::Estimate => "estimate",
            QueryKind::Identify => "identify",
            QueryKind::Nearby => "nearby",
        }
    }
}

/// Holds the active handle for one operation kind.
#[derive(Debug)]
pub struct QuerySlot {
    kind: QueryKind,
    current: Option<QueryHandle>,
}

impl QuerySlot {
    /// Create an empty slot.
    pub fn new(kind: QueryKind) -> Self {
        Self {
            kind,
            current: None,
        }
    }

    /// The operation kind this slot guards.
    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    /// The active handle, if a request is in flight.
    pub fn current(&self) -> Option<QueryHandle> {
        self.current
    }

    /// Whether `handle` is the active request.
    pub fn is_current(&self, handle: QueryHandle) -> bool {
        self.current == Some(handle)
    }

    /// Issue a new handle, retiring the previous one as cancelled.
    ///
    /// Returns the new handle and the retired one, if any.
    pub fn issue(&mut self, allocator: &HandleAllocator) -> (QueryHandle, Option<QueryHandle>) {
        let handle = allocator.issue();
        let retired = self.current.replace(handle);
        if let Some(old) = retired {
            tracing::debug!(
                kind = self.kind.as_str(),
                retired = %old,
                current = %handle,
                "Query superseded"
            );
        }
        (handle, retired)
    }

    /// Retire `handle` on completion.
    ///
    /// `Ok` means it was the active request and the caller may publish its
    /// result. Superseded or cancelled handles get
    /// [`QueryError::Superseded`] and their results must be dropped.
    pub fn complete(&mut self, handle: QueryHandle) -> Result<(), QueryError> {
        if self.is_current(handle) {
            self.current = None;
            Ok(())
        } else {
            tracing::trace!(kind = self.kind.as_str(), query = %handle, "Late result dropped");
            Err(QueryError::Superseded)
        }
    }

    /// Retire the active request without a result.
    pub fn cancel(&mut self) -> Option<QueryHandle> {
        let retired = self.current.take();
        if let Some(old) = retired {
            tracing::debug!(kind = self.kind.as_str(), retired = %old, "Query cancelled");
        }
        retired
    }
}
