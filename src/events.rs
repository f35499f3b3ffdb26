//! Per-query completion notifications.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use graphwire_core::GraphError;

use crate::query::{Bookmark, CypherQuery};
use crate::stats::QueryStats;

/// What happened to one executed query.
///
/// Borrowed from the call that produced it and valid only for the duration
/// of the notification; listeners copy out what they want to keep.
#[derive(Debug, Clone)]
pub struct OperationCompletedEvent<'a> {
    /// Query text with parameters inlined. Empty when no listener is
    /// registered, since nobody would read it.
    pub query_text: String,
    pub identifier: Option<&'a str>,
    pub timestamp: DateTime<Utc>,
    pub elapsed: Duration,
    /// Rows returned, or `-1` when the query failed.
    pub results_count: i64,
    pub last_bookmarks: &'a [Bookmark],
    pub error: Option<&'a GraphError>,
    pub custom_headers: &'a BTreeMap<String, String>,
    pub stats: Option<&'a QueryStats>,
}

impl OperationCompletedEvent<'_> {
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Receives an [`OperationCompletedEvent`] after every query, synchronously,
/// on the task that ran it.
///
/// Closures taking `&OperationCompletedEvent<'_>` implement this directly:
///
/// ```rust
/// # use graphwire::events::{OperationCompletedEvent, OperationListener};
/// fn assert_listener(_: impl OperationListener) {}
/// assert_listener(|event: &OperationCompletedEvent<'_>| {
///     println!("{} rows in {:?}", event.results_count, event.elapsed);
/// });
/// ```
pub trait OperationListener: Send + Sync {
    fn on_completed(&self, event: &OperationCompletedEvent<'_>);
}

impl<F> OperationListener for F
where
    F: Fn(&OperationCompletedEvent<'_>) + Send + Sync,
{
    fn on_completed(&self, event: &OperationCompletedEvent<'_>) {
        self(event)
    }
}

/// Outcome data the coordinator hands over once a call finishes.
pub(crate) struct Completion<'a> {
    pub elapsed: Duration,
    pub rows: Option<usize>,
    pub bookmarks: &'a [Bookmark],
    pub error: Option<&'a GraphError>,
    pub stats: Option<&'a QueryStats>,
}

/// The listeners registered on a client.
#[derive(Clone, Default)]
pub struct Listeners {
    inner: Vec<Arc<dyn OperationListener>>,
}

impl Listeners {
    pub fn push(&mut self, listener: Arc<dyn OperationListener>) {
        self.inner.push(listener);
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Build the event for `query` and deliver it to every listener.
    pub(crate) fn complete<'a>(&self, query: &'a CypherQuery, completion: Completion<'a>) {
        let event = self.event(query, completion);
        for listener in &self.inner {
            listener.on_completed(&event);
        }
    }

    fn event<'a>(&self, query: &'a CypherQuery, completion: Completion<'a>) -> OperationCompletedEvent<'a> {
        OperationCompletedEvent {
            query_text: if self.is_empty() { String::new() } else { query.debug_text() },
            identifier: query.correlation_id(),
            timestamp: Utc::now(),
            elapsed: completion.elapsed,
            results_count: match (completion.error, completion.rows) {
                (None, Some(rows)) => rows as i64,
                _ => -1,
            },
            last_bookmarks: completion.bookmarks,
            error: completion.error,
            custom_headers: query.custom_headers(),
            stats: completion.stats,
        }
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners").field("count", &self.inner.len()).finish()
    }
}
