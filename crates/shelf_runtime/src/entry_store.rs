//! Ordered shelf sequence and the pinned/unpinned partition.
//!
//! The store performs positional mutation only. Callers pick boundary-respecting indices with
//! [`EntryStore::next_insertion_index`]; the store never re-validates pin ordering on insert.
//! [`EntryStore::partition_violation`] reports the first breach for tests and for the optional
//! runtime check.

use shelf_contract::AppIdentity;
use thiserror::Error;

use crate::model::{Entry, Slot, SlotId, SlotKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// First breach of the partition invariant found in a sequence.
pub enum PartitionViolation {
    /// A pinned entry follows an unpinned one.
    #[error("pinned entry at {pinned} follows unpinned entry at {unpinned}")]
    PinnedAfterUnpinned {
        /// Index of the earlier unpinned entry.
        unpinned: usize,
        /// Index of the offending pinned entry.
        pinned: usize,
    },
    /// An unpinned entry has no tasks and should have been removed.
    #[error("unpinned entry at {index} has no tasks")]
    EmptyUnpinned {
        /// Index of the orphaned entry.
        index: usize,
    },
    /// Two entries share an application identity.
    #[error("{app} appears at both {first} and {second}")]
    DuplicateApp {
        /// Duplicated identity.
        app: AppIdentity,
        /// Index of the first occurrence.
        first: usize,
        /// Index of the second occurrence.
        second: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Ordered sequence of shelf slots.
pub struct EntryStore {
    slots: Vec<Slot>,
    next_slot_id: u64,
}

impl EntryStore {
    /// Creates a store holding `apps` as pinned entries, in order. Repeated identities keep
    /// their first position.
    pub fn from_pinned(apps: impl IntoIterator<Item = AppIdentity>) -> Self {
        let mut store = Self::default();
        store.rebuild_from_pinned(apps);
        store
    }

    /// Drops every slot and refills the sequence with `apps` as pinned entries. Slot ids keep
    /// increasing across rebuilds.
    pub fn rebuild_from_pinned(&mut self, apps: impl IntoIterator<Item = AppIdentity>) {
        self.slots.clear();
        for app in apps {
            if self.position_of_app(&app).is_none() {
                let index = self.slots.len();
                self.insert(SlotKind::App(Entry::pinned(app)), index);
            }
        }
    }

    /// Returns the slot sequence.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Returns the application entries in order, skipping the placeholder.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> + '_ {
        self.slots.iter().filter_map(Slot::entry)
    }

    /// Mutable variant of [`EntryStore::entries`].
    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut Entry> + '_ {
        self.slots.iter_mut().filter_map(Slot::entry_mut)
    }

    /// Number of slots, placeholder included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns whether the sequence has no slots at all.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Looks up a slot by handle.
    pub fn slot(&self, id: SlotId) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.id == id)
    }

    /// Mutable variant of [`EntryStore::slot`].
    pub fn slot_mut(&mut self, id: SlotId) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|slot| slot.id == id)
    }

    /// Returns the current position of a slot.
    pub fn index_of(&self, id: SlotId) -> Option<usize> {
        self.slots.iter().position(|slot| slot.id == id)
    }

    /// Inserts new content at `index` under a freshly allocated handle.
    ///
    /// # Panics
    ///
    /// Panics when `index` is greater than [`EntryStore::len`].
    pub fn insert(&mut self, kind: SlotKind, index: usize) -> SlotId {
        let id = SlotId(self.next_slot_id);
        self.next_slot_id += 1;
        self.insert_slot(
            Slot {
                id,
                kind,
                visible: true,
            },
            index,
        );
        id
    }

    /// Convenience wrapper inserting an application entry.
    pub fn insert_entry(&mut self, entry: Entry, index: usize) -> SlotId {
        self.insert(SlotKind::App(entry), index)
    }

    /// Reinserts a slot previously taken out of this store, keeping its handle.
    ///
    /// # Panics
    ///
    /// Panics when `index` is greater than [`EntryStore::len`].
    pub fn insert_slot(&mut self, slot: Slot, index: usize) {
        assert!(
            index <= self.slots.len(),
            "shelf insert index {index} out of range for {} slots",
            self.slots.len()
        );
        self.slots.insert(index, slot);
    }

    /// Removes a slot by handle, shifting later slots left.
    pub fn remove(&mut self, id: SlotId) -> Option<Slot> {
        let index = self.index_of(id)?;
        Some(self.slots.remove(index))
    }

    /// Removes the slot at `index`, shifting later slots left.
    ///
    /// # Panics
    ///
    /// Panics when `index` is not a valid position.
    pub fn remove_at(&mut self, index: usize) -> Slot {
        assert!(
            index < self.slots.len(),
            "shelf remove index {index} out of range for {} slots",
            self.slots.len()
        );
        self.slots.remove(index)
    }

    /// Moves an existing slot to `index`, interpreted after the slot was taken out.
    ///
    /// Returns `false` when the slot is unknown.
    pub fn move_slot(&mut self, id: SlotId, index: usize) -> bool {
        let Some(slot) = self.remove(id) else {
            return false;
        };
        self.insert_slot(slot, index);
        true
    }

    /// Removes every placeholder slot and returns how many were removed.
    pub fn remove_placeholders(&mut self) -> usize {
        let before = self.slots.len();
        self.slots.retain(|slot| !slot.is_placeholder());
        before - self.slots.len()
    }

    /// Updates a slot's visibility. Unknown handles are ignored.
    pub fn set_visible(&mut self, id: SlotId, visible: bool) {
        if let Some(slot) = self.slot_mut(id) {
            slot.visible = visible;
        }
    }

    /// Returns the position of the entry for `app`.
    pub fn position_of_app(&self, app: &AppIdentity) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.entry().is_some_and(|entry| entry.app() == app))
    }

    /// Returns the slot holding the entry for `app`.
    pub fn find_by_app(&self, app: &AppIdentity) -> Option<&Slot> {
        self.position_of_app(app).map(|index| &self.slots[index])
    }

    /// Returns the entry for `app` for in-place updates.
    pub fn entry_for_app_mut(&mut self, app: &AppIdentity) -> Option<&mut Entry> {
        self.entries_mut().find(|entry| entry.app() == app)
    }

    /// Returns the pinned identities in shelf order.
    pub fn pinned_subset(&self) -> Vec<AppIdentity> {
        self.entries()
            .filter(|entry| entry.pinned)
            .map(|entry| entry.app().clone())
            .collect()
    }

    /// Returns a position for an app that is not yet in the sequence.
    ///
    /// A pinned app goes right after the last pinned entry at or left of `hint` (index `0` when
    /// there is none). An unpinned app goes at the first unpinned entry at or right of `hint`
    /// (the end when there is none). Placeholders are skipped by both scans and `hint` is
    /// clamped to the sequence length.
    pub fn next_insertion_index(&self, hint: usize, pinned: bool) -> usize {
        let hint = hint.min(self.slots.len());
        if pinned {
            self.slots[..hint]
                .iter()
                .rposition(|slot| slot.entry().is_some_and(|entry| entry.pinned))
                .map_or(0, |index| index + 1)
        } else {
            self.slots[hint..]
                .iter()
                .position(|slot| slot.entry().is_some_and(|entry| !entry.pinned))
                .map_or(self.slots.len(), |offset| hint + offset)
        }
    }

    /// Returns the first partition breach, scanning left to right.
    pub fn partition_violation(&self) -> Option<PartitionViolation> {
        let mut first_unpinned = None;
        for (index, slot) in self.slots.iter().enumerate() {
            let Some(entry) = slot.entry() else {
                continue;
            };
            if let Some(first) = self.slots[..index]
                .iter()
                .position(|earlier| earlier.entry().is_some_and(|e| e.app() == entry.app()))
            {
                return Some(PartitionViolation::DuplicateApp {
                    app: entry.app().clone(),
                    first,
                    second: index,
                });
            }
            if entry.pinned {
                if let Some(unpinned) = first_unpinned {
                    return Some(PartitionViolation::PinnedAfterUnpinned {
                        unpinned,
                        pinned: index,
                    });
                }
            } else {
                if entry.has_no_tasks() {
                    return Some(PartitionViolation::EmptyUnpinned { index });
                }
                first_unpinned.get_or_insert(index);
            }
        }
        None
    }
}
