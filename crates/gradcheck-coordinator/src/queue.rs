//! Service queue cache and its projection.
//!
//! The server owns the queue. The coordinator keeps the latest snapshot,
//! replaces it wholesale on every fetch, and derives the views the queue
//! monitor shows. It never predicts the effect of an enqueue or advance.

use chrono::{DateTime, Utc};
use gradcheck_core::{Identity, QueueEntry};
use tracing::{debug, warn};

/// One row of the rendered queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueLine {
    /// 1-indexed position in server order.
    pub position: usize,
    pub identity: Identity,
    pub is_current: bool,
}

/// Rendered queue: full list plus current and next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueView {
    pub lines: Vec<QueueLine>,
    pub current: Option<Identity>,
    pub next: Option<Identity>,
}

impl QueueView {
    /// Name of the current entry, or `"none"`.
    pub fn current_label(&self) -> &str {
        label(self.current.as_ref())
    }

    /// Name of the next entry, or `"none"`.
    pub fn next_label(&self) -> &str {
        label(self.next.as_ref())
    }
}

fn label(identity: Option<&Identity>) -> &str {
    identity.map_or("none", |identity| identity.name.as_str())
}

/// Latest queue snapshot from the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueSnapshot {
    entries: Vec<QueueEntry>,
    fetched_at: Option<DateTime<Utc>>,
}

impl QueueSnapshot {
    pub fn new(entries: Vec<QueueEntry>) -> Self {
        Self {
            entries,
            fetched_at: Some(Utc::now()),
        }
    }

    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    /// When the snapshot was fetched; `None` before the first fetch.
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    /// Derive the list, the current entry and the next entry.
    ///
    /// - current: the first entry flagged current, or none
    /// - next: the entry after current; the first entry when nothing is
    ///   current; none for an empty queue or when current is last
    ///
    /// ```
    /// use gradcheck_core::{Identity, QueueEntry};
    /// use gradcheck_coordinator::queue::QueueSnapshot;
    ///
    /// let entry = |id: &str, current| QueueEntry::new(Identity::new(id, id), current);
    /// let view = QueueSnapshot::new(vec![entry("A", false), entry("B", true), entry("C", false)]).render();
    ///
    /// assert_eq!(view.current_label(), "B");
    /// assert_eq!(view.next_label(), "C");
    /// assert_eq!(view.lines[0].position, 1);
    /// ```
    pub fn render(&self) -> QueueView {
        let lines: Vec<QueueLine> = self
            .entries
            .iter()
            .enumerate()
            .map(|(index, entry)| QueueLine {
                position: index + 1,
                identity: entry.identity.clone(),
                is_current: entry.is_current,
            })
            .collect();

        let flagged = self.entries.iter().filter(|entry| entry.is_current).count();
        if flagged > 1 {
            warn!(flagged, "server flagged several current entries; using the first");
        }

        let current_index = self.entries.iter().position(|entry| entry.is_current);
        let current = current_index.map(|index| self.entries[index].identity.clone());
        let next = match current_index {
            Some(index) => self.entries.get(index + 1),
            None => self.entries.first(),
        }
        .map(|entry| entry.identity.clone());

        QueueView {
            lines,
            current,
            next,
        }
    }
}

/// Queue snapshot owner with refresh coalescing.
///
/// At most one fetch is in flight. A refresh requested while one is running
/// is remembered and replayed once, after the running fetch lands.
#[derive(Debug, Clone, Default)]
pub struct QueueCoordinator {
    snapshot: QueueSnapshot,
    view: QueueView,
    in_flight: bool,
    pending: bool,
    message: Option<String>,
}

impl QueueCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> &QueueSnapshot {
        &self.snapshot
    }

    /// Projection of the current snapshot.
    pub fn view(&self) -> &QueueView {
        &self.view
    }

    /// Last operator-facing message (advance result, rejection).
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Claim the fetch slot. Returns `true` if the caller should fetch now.
    ///
    /// When a fetch is already running, `coalesce` decides whether this
    /// request is replayed afterwards (explicit refresh) or dropped
    /// (periodic tick).
    pub fn begin_refresh(&mut self, coalesce: bool) -> bool {
        if self.in_flight {
            if coalesce {
                self.pending = true;
            }
            debug!(coalesce, "queue fetch already in flight");
            return false;
        }
        self.in_flight = true;
        true
    }

    /// Apply a fetch result and release the slot.
    ///
    /// Returns `true` when a coalesced refresh is waiting. A failed fetch
    /// keeps the previous snapshot.
    pub fn finish_refresh(&mut self, result: gradcheck_services::Result<Vec<QueueEntry>>) -> bool {
        self.in_flight = false;
        match result {
            Ok(entries) => {
                debug!(entries = entries.len(), "queue snapshot replaced");
                self.snapshot = QueueSnapshot::new(entries);
                self.view = self.snapshot.render();
            }
            Err(error) => warn!(error = %error, "queue fetch failed; keeping last snapshot"),
        }
        std::mem::take(&mut self.pending)
    }
}
