//! Shared entity cache with optimistic updates.
//!
//! Every screen reads the same [`EntityCache`] for a record type. A mutation
//! marks its row [`Entry::Optimistic`] before the request is sent, then either
//! confirms it or reverts it to the pre-mutation record once the response
//! lands. Observers are told about every change over a broadcast channel.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use uuid::Uuid;

use crate::models::Record;

#[derive(Debug, Clone, PartialEq)]
pub enum Entry<T> {
    Confirmed(T),
    Optimistic { value: T, previous: T, op: OpToken },
    Failed { value: T, error: String },
}

impl<T> Entry<T> {
    /// What a view should render for this row.
    pub fn value(&self) -> &T {
        match self {
            Entry::Confirmed(v) => v,
            Entry::Optimistic { value, .. } => value,
            Entry::Failed { value, .. } => value,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Entry::Optimistic { .. })
    }
}

/// Identifies one in-flight optimistic mutation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OpToken {
    pub id: String,
    op: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    Replaced,
    Optimistic,
    Confirmed,
    Reverted,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheChange {
    /// `None` when the whole collection was replaced.
    pub id: Option<String>,
    pub kind: ChangeKind,
}

struct Inner<T> {
    order: Vec<String>,
    entries: HashMap<String, Entry<T>>,
    /// Patched values of mutations that a newer `begin` stacked on top of,
    /// kept until their responses land.
    superseded: HashMap<OpToken, T>,
}

pub struct EntityCache<T> {
    inner: Mutex<Inner<T>>,
    tx: broadcast::Sender<CacheChange>,
}

impl<T: Record> Default for EntityCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> EntityCache<T> {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self {
            inner: Mutex::new(Inner {
                order: Vec::new(),
                entries: HashMap::new(),
                superseded: HashMap::new(),
            }),
            tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn notify(&self, id: Option<String>, kind: ChangeKind) {
        // No receivers is fine.
        let _ = self.tx.send(CacheChange { id, kind });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheChange> {
        self.tx.subscribe()
    }

    /// Change notifications as a stream. Lagged notifications are dropped;
    /// readers re-query the cache anyway.
    pub fn changes(&self) -> impl Stream<Item = CacheChange> {
        BroadcastStream::new(self.tx.subscribe()).filter_map(|r| r.ok())
    }

    /// Installs a fresh server listing. The last fetch wins for settled rows.
    /// Rows with a mutation still in flight keep showing the optimistic value
    /// but will revert to the fetched record if that mutation fails.
    pub fn replace_all(&self, records: Vec<T>) {
        {
            let mut inner = self.lock();
            let mut old = std::mem::take(&mut inner.entries);
            inner.order.clear();

            for record in records {
                let id = record.id().to_string();
                let entry = match old.remove(&id) {
                    Some(Entry::Optimistic { value, op, .. }) => Entry::Optimistic {
                        value,
                        previous: record,
                        op,
                    },
                    _ => Entry::Confirmed(record),
                };
                if !inner.entries.contains_key(&id) {
                    inner.order.push(id.clone());
                }
                inner.entries.insert(id, entry);
            }
        }
        self.notify(None, ChangeKind::Replaced);
    }

    /// Appends or overwrites a settled record, e.g. one page of a listing.
    /// A row with a mutation in flight keeps its optimistic value and adopts
    /// the record as the one to revert to.
    pub fn upsert(&self, record: T) {
        let id = record.id().to_string();
        {
            let mut inner = self.lock();
            match inner.entries.get_mut(&id) {
                Some(Entry::Optimistic { previous, .. }) => *previous = record,
                Some(entry) => *entry = Entry::Confirmed(record),
                None => {
                    inner.order.push(id.clone());
                    inner.entries.insert(id.clone(), Entry::Confirmed(record));
                }
            }
        }
        self.notify(Some(id), ChangeKind::Confirmed);
    }

    pub fn remove(&self, id: &str) -> Option<T> {
        let removed = {
            let mut inner = self.lock();
            inner.order.retain(|i| i != id);
            inner.superseded.retain(|token, _| token.id != id);
            inner.entries.remove(id)
        };
        if removed.is_some() {
            self.notify(Some(id.to_string()), ChangeKind::Removed);
        }
        removed.map(|e| e.value().clone())
    }

    pub fn get(&self, id: &str) -> Option<T> {
        self.lock().entries.get(id).map(|e| e.value().clone())
    }

    pub fn entry(&self, id: &str) -> Option<Entry<T>> {
        self.lock().entries.get(id).cloned()
    }

    /// Rendered values in listing order.
    pub fn values(&self) -> Vec<T> {
        let inner = self.lock();
        inner
            .order
            .iter()
            .filter_map(|id| inner.entries.get(id))
            .map(|e| e.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Applies `patch` to the rendered value of `id` and marks the row
    /// optimistic. A newer `begin` on the same row supersedes older tokens.
    pub fn begin<F>(&self, id: &str, patch: F) -> Option<OpToken>
    where
        F: FnOnce(&mut T),
    {
        let token = {
            let mut guard = self.lock();
            let inner = &mut *guard;
            let entry = inner.entries.get_mut(id)?;

            let previous = match entry {
                Entry::Optimistic {
                    value,
                    previous,
                    op,
                } => {
                    inner.superseded.insert(op.clone(), value.clone());
                    previous.clone()
                }
                Entry::Confirmed(v) | Entry::Failed { value: v, .. } => v.clone(),
            };
            let mut value = entry.value().clone();
            patch(&mut value);

            let token = OpToken {
                id: id.to_string(),
                op: Uuid::new_v4(),
            };
            *entry = Entry::Optimistic {
                value,
                previous,
                op: token.clone(),
            };
            token
        };
        self.notify(Some(id.to_string()), ChangeKind::Optimistic);
        Some(token)
    }

    fn owns(entry: &Entry<T>, token: &OpToken) -> bool {
        matches!(entry, Entry::Optimistic { op, .. } if op == token)
    }

    /// Settles the mutation behind `token`, adopting the server's record when
    /// one came back. Returns false when the token was superseded.
    ///
    /// A superseded mutation that succeeds still counts: its result becomes
    /// the record the newer mutation reverts to, or the row itself if the
    /// newer one already failed.
    pub fn confirm(&self, token: &OpToken, server: Option<T>) -> bool {
        let (settled, changed) = {
            let mut guard = self.lock();
            let inner = &mut *guard;
            let stacked = inner.superseded.remove(token);
            match inner.entries.get_mut(&token.id) {
                Some(entry) if Self::owns(&*entry, token) => {
                    let value = server.unwrap_or_else(|| entry.value().clone());
                    *entry = Entry::Confirmed(value);
                    (true, true)
                }
                Some(entry) => match stacked {
                    Some(patched) => match entry {
                        Entry::Optimistic { previous, .. } => {
                            *previous = server.unwrap_or(patched);
                            (false, false)
                        }
                        Entry::Failed { .. } => {
                            *entry = Entry::Confirmed(server.unwrap_or(patched));
                            (false, true)
                        }
                        Entry::Confirmed(_) => (false, false),
                    },
                    None => (false, false),
                },
                None => (false, false),
            }
        };
        if changed {
            self.notify(Some(token.id.clone()), ChangeKind::Confirmed);
        }
        if !settled {
            tracing::debug!(id = %token.id, "confirmation for superseded mutation");
        }
        settled
    }

    /// Rolls the row back to its pre-mutation record and records the error.
    /// Returns false when the token was superseded.
    pub fn revert(&self, token: &OpToken, error: impl Into<String>) -> bool {
        let reverted = {
            let mut inner = self.lock();
            inner.superseded.remove(token);
            match inner.entries.get_mut(&token.id) {
                Some(entry) if Self::owns(&*entry, token) => {
                    if let Entry::Optimistic { previous, .. } = entry {
                        let value = previous.clone();
                        *entry = Entry::Failed {
                            value,
                            error: error.into(),
                        };
                    }
                    true
                }
                _ => false,
            }
        };
        if reverted {
            self.notify(Some(token.id.clone()), ChangeKind::Reverted);
        } else {
            tracing::debug!(id = %token.id, "ignoring failure for superseded mutation");
        }
        reverted
    }

    /// Patches a row that the server already confirmed. Returns false when
    /// the row is not cached. An in-flight mutation on the row keeps its
    /// optimistic value; the patch lands on the record it reverts to.
    pub fn apply_confirmed<F>(&self, id: &str, patch: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        let applied = {
            let mut inner = self.lock();
            match inner.entries.get_mut(id) {
                Some(Entry::Optimistic { previous, .. }) => {
                    patch(previous);
                    true
                }
                Some(entry) => {
                    let mut value = entry.value().clone();
                    patch(&mut value);
                    *entry = Entry::Confirmed(value);
                    true
                }
                None => false,
            }
        };
        if applied {
            self.notify(Some(id.to_string()), ChangeKind::Confirmed);
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: String,
        status: &'static str,
    }

    impl Record for Row {
        fn id(&self) -> &str {
            &self.id
        }
    }

    fn row(id: &str, status: &'static str) -> Row {
        Row {
            id: id.to_string(),
            status,
        }
    }

    fn cache() -> EntityCache<Row> {
        let cache = EntityCache::new();
        cache.replace_all(vec![row("a", "pending"), row("b", "pending")]);
        cache
    }

    #[test]
    fn test_optimistic_then_confirm() {
        let cache = cache();
        let token = cache.begin("a", |r| r.status = "approved").unwrap();
        assert!(cache.entry("a").unwrap().is_pending());
        assert_eq!(cache.get("a").unwrap().status, "approved");

        assert!(cache.confirm(&token, None));
        assert_eq!(cache.entry("a"), Some(Entry::Confirmed(row("a", "approved"))));
    }

    #[test]
    fn test_revert_restores_previous() {
        let cache = cache();
        let token = cache.begin("a", |r| r.status = "approved").unwrap();
        assert!(cache.revert(&token, "conflict"));

        match cache.entry("a").unwrap() {
            Entry::Failed { value, error } => {
                assert_eq!(value.status, "pending");
                assert_eq!(error, "conflict");
            }
            other => panic!("unexpected entry: {other:?}"),
        }
    }

    #[test]
    fn test_superseded_token_is_ignored() {
        let cache = cache();
        let first = cache.begin("a", |r| r.status = "approved").unwrap();
        let second = cache.begin("a", |r| r.status = "rejected").unwrap();

        // The older request's response lands last but must not win.
        assert!(cache.confirm(&second, None));
        assert!(!cache.revert(&first, "late failure"));
        assert_eq!(cache.get("a").unwrap().status, "rejected");
    }

    #[test]
    fn test_stacked_mutations_revert_to_settled_record() {
        let cache = cache();
        let _first = cache.begin("a", |r| r.status = "approved").unwrap();
        let second = cache.begin("a", |r| r.status = "completed").unwrap();
        cache.revert(&second, "nope");
        assert_eq!(cache.get("a").unwrap().status, "pending");
    }

    #[test]
    fn test_refetch_keeps_in_flight_value() {
        let cache = cache();
        let token = cache.begin("a", |r| r.status = "approved").unwrap();

        cache.replace_all(vec![row("a", "pending"), row("c", "pending")]);
        assert_eq!(cache.get("a").unwrap().status, "approved");
        assert!(cache.get("b").is_none());
        assert_eq!(cache.len(), 2);

        cache.revert(&token, "failed");
        assert_eq!(cache.get("a").unwrap().status, "pending");
    }

    #[test]
    fn test_superseded_success_survives_later_failure() {
        let cache = cache();
        let first = cache.begin("a", |r| r.status = "approved").unwrap();
        let second = cache.begin("a", |r| r.status = "completed").unwrap();

        assert!(!cache.confirm(&first, None));
        assert!(cache.entry("a").unwrap().is_pending());
        assert_eq!(cache.get("a").unwrap().status, "completed");

        assert!(cache.revert(&second, "conflict"));
        assert_eq!(cache.get("a").unwrap().status, "approved");
    }

    #[test]
    fn test_superseded_success_prefers_server_record() {
        let cache = cache();
        let first = cache.begin("a", |r| r.status = "approved").unwrap();
        let second = cache.begin("a", |r| r.status = "completed").unwrap();

        cache.confirm(&first, Some(row("a", "approved-by-server")));
        cache.revert(&second, "conflict");
        assert_eq!(cache.get("a").unwrap().status, "approved-by-server");
    }

    #[test]
    fn test_superseded_success_after_newer_failure() {
        let cache = cache();
        let first = cache.begin("a", |r| r.status = "approved").unwrap();
        let second = cache.begin("a", |r| r.status = "completed").unwrap();

        cache.revert(&second, "conflict");
        assert_eq!(cache.get("a").unwrap().status, "pending");

        cache.confirm(&first, None);
        assert_eq!(cache.entry("a"), Some(Entry::Confirmed(row("a", "approved"))));
    }

    #[test]
    fn test_upsert_keeps_in_flight_value() {
        let cache = cache();
        let token = cache.begin("a", |r| r.status = "approved").unwrap();

        cache.upsert(row("a", "reviewed"));
        assert!(cache.entry("a").unwrap().is_pending());
        assert_eq!(cache.get("a").unwrap().status, "approved");

        assert!(cache.revert(&token, "failed"));
        assert_eq!(cache.get("a").unwrap().status, "reviewed");
    }

    #[test]
    fn test_apply_confirmed_under_in_flight_mutation() {
        let cache = cache();
        let token = cache.begin("a", |r| r.status = "approved").unwrap();

        assert!(cache.apply_confirmed("a", |r| r.status = "rescheduled"));
        assert_eq!(cache.get("a").unwrap().status, "approved");

        cache.revert(&token, "failed");
        assert_eq!(cache.get("a").unwrap().status, "rescheduled");
    }

    #[test]
    fn test_begin_on_missing_row() {
        let cache = cache();
        assert!(cache.begin("zzz", |r| r.status = "x").is_none());
    }

    #[test]
    fn test_values_keep_listing_order() {
        let cache = cache();
        cache.upsert(row("c", "pending"));
        let ids: Vec<String> = cache.values().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        cache.remove("b");
        let ids: Vec<String> = cache.values().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_observers_are_notified() {
        let cache = cache();
        let mut rx = cache.subscribe();

        let token = cache.begin("a", |r| r.status = "approved").unwrap();
        cache.confirm(&token, None);

        let first = rx.recv().await.unwrap();
        assert_eq!(first.kind, ChangeKind::Optimistic);
        assert_eq!(first.id.as_deref(), Some("a"));
        assert_eq!(rx.recv().await.unwrap().kind, ChangeKind::Confirmed);
    }

    #[tokio::test]
    async fn test_change_stream() {
        let cache = cache();
        let mut changes = Box::pin(cache.changes());
        cache.remove("a");
        let change = changes.next().await.unwrap();
        assert_eq!(change.kind, ChangeKind::Removed);
    }
}
