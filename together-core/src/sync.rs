//! Merge-after-confirm cache synchronization.
//!
//! Every view in the client holds a flat collection of entities fetched
//! from the store. Writes are never applied optimistically: the mutation is
//! issued, awaited, and only the store's canonical row is merged back into
//! the collection. The same merge/relocate logic used to be re-derived per
//! entity kind; [`SyncedCollection`] factors it out, parameterized by the
//! entity type and an id-extraction function.

use std::fmt::Display;

use uuid::Uuid;

/// User-visible outcome of a synchronized write, surfaced as a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

/// Lifecycle of the collection's writes: `Idle` when no mutation is in
/// flight, `Pending` while at least one awaits its store round-trip.
/// Independent mutations on different entities may overlap; each is a
/// single attempt with no automatic retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Pending,
}

/// A client-held collection kept consistent with the store without a full
/// refetch after every write.
///
/// # Examples
///
/// ```
/// use together_core::sync::{Notice, SyncedCollection};
/// use uuid::Uuid;
///
/// #[derive(Clone)]
/// struct Row { id: Uuid, title: String }
///
/// let row = Row { id: Uuid::new_v4(), title: "picnic".into() };
/// let mut synced = SyncedCollection::with_items(vec![row.clone()], |r: &Row| r.id);
///
/// // A confirmed write replaces the cached copy with the store's row.
/// let mut canonical = row.clone();
/// canonical.title = "sunset picnic".into();
/// synced.begin();
/// synced.resolve_upsert::<String>(Ok(canonical), "Saved");
/// assert_eq!(synced.items()[0].title, "sunset picnic");
///
/// // A failed write leaves the cache untouched and raises a toast.
/// synced.begin();
/// synced.resolve_upsert::<String>(Err("network down".into()), "Saved");
/// assert_eq!(synced.items()[0].title, "sunset picnic");
/// assert!(matches!(synced.take_notices().last(), Some(Notice::Error(_))));
/// ```
pub struct SyncedCollection<T> {
    items: Vec<T>,
    id_of: fn(&T) -> Uuid,
    pending: usize,
    notices: Vec<Notice>,
}

impl<T> SyncedCollection<T> {
    pub fn new(id_of: fn(&T) -> Uuid) -> Self {
        Self::with_items(Vec::new(), id_of)
    }

    /// Seeds the collection from a fetch; order is preserved as the
    /// presentation order.
    pub fn with_items(items: Vec<T>, id_of: fn(&T) -> Uuid) -> Self {
        Self {
            items,
            id_of,
            pending: 0,
            notices: Vec::new(),
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn state(&self) -> SyncState {
        if self.pending > 0 {
            SyncState::Pending
        } else {
            SyncState::Idle
        }
    }

    /// Drains the notices raised since the last call, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Marks a mutation as issued. Paired with exactly one `resolve_*`
    /// call once the remote write settles.
    pub fn begin(&mut self) {
        self.pending += 1;
    }

    /// Merges the outcome of an insert, update, or domain-specific write
    /// (check-in, complete). On success the canonical row replaces any
    /// prior version of the entity, keeping its position in the
    /// presentation order, or is appended if it is new; exactly one copy
    /// exists afterwards. On failure the collection is left untouched and
    /// an error notice is raised. Returns whether the write succeeded.
    pub fn resolve_upsert<E: Display>(
        &mut self,
        outcome: Result<T, E>,
        success_message: &str,
    ) -> bool {
        self.pending = self.pending.saturating_sub(1);
        match outcome {
            Ok(row) => {
                let id = (self.id_of)(&row);
                let existing = self.items.iter().position(|it| (self.id_of)(it) == id);
                match existing {
                    Some(index) => {
                        self.items[index] = row;
                        // Drop any stray duplicates beyond the first.
                        let id_of = self.id_of;
                        let mut seen = false;
                        self.items.retain(|it| {
                            if id_of(it) == id {
                                let keep = !seen;
                                seen = true;
                                keep
                            } else {
                                true
                            }
                        });
                    }
                    None => self.items.push(row),
                }
                self.notices.push(Notice::Success(success_message.to_string()));
                true
            }
            Err(err) => {
                self.notices.push(Notice::Error(err.to_string()));
                false
            }
        }
    }

    /// Merges the outcome of a delete: on success every copy of the entity
    /// is removed; on failure the collection is untouched.
    pub fn resolve_delete<E: Display>(
        &mut self,
        id: Uuid,
        outcome: Result<(), E>,
        success_message: &str,
    ) -> bool {
        self.pending = self.pending.saturating_sub(1);
        match outcome {
            Ok(()) => {
                let id_of = self.id_of;
                self.items.retain(|it| id_of(it) != id);
                self.notices.push(Notice::Success(success_message.to_string()));
                true
            }
            Err(err) => {
                self.notices.push(Notice::Error(err.to_string()));
                false
            }
        }
    }
}
