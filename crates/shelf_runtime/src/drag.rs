//! Pointer-driven reorder and pin session.
//!
//! A session moves through `Idle -> Armed -> Active -> Idle`. `Armed` means the shelf accepted
//! the drag but nothing in the sequence stands for it yet, or the pointer left the shelf.
//! `Active` means the handle (a lifted icon or the placeholder) is hidden in the sequence and
//! follows the pointer.

use shelf_contract::AppIdentity;
use tracing::debug;

use crate::{
    entry_store::EntryStore,
    model::{Entry, Slot, SlotId, SlotKind},
    reducer::ReducerError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Where a drag started.
pub enum DragOrigin {
    /// Long-press on an icon already on the shelf.
    ShelfIcon(SlotId),
    /// A shortcut dragged in from elsewhere.
    External,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Bookkeeping of an accepted drag.
pub struct DragContext {
    /// Slot that follows the pointer, if one exists in the sequence.
    pub handle: Option<SlotId>,
    /// Where the drag started.
    pub origin: DragOrigin,
    pinned_at_start: Vec<AppIdentity>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Drag session state.
pub enum DragState {
    /// No drag in progress.
    #[default]
    Idle,
    /// Drag accepted, no live handle over the shelf.
    Armed(DragContext),
    /// Handle present in the sequence and tracking the pointer.
    Active(DragContext),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Result of the pointer entering a slot or the trailing area.
pub enum DragMove {
    /// Nothing to do.
    Ignored,
    /// First placement of an external drag.
    PlaceholderCreated {
        /// Position of the new placeholder.
        index: usize,
    },
    /// The handle moved.
    Moved {
        /// Previous position.
        from: usize,
        /// New position.
        to: usize,
    },
    /// The move would cross the pinned/unpinned boundary the wrong way.
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Result of a drop.
pub enum DropOutcome {
    /// No drag was in progress.
    Ignored,
    /// The dragged app became a pinned entry in this slot.
    Pinned(SlotId),
    /// The dropped app is already pinned; the placeholder was discarded.
    AlreadyPinned,
    /// An existing icon was dropped; its position is already final.
    Kept,
    /// The payload did not resolve to a launchable app.
    Rejected,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// The single drag session of a shelf.
pub struct DragSession {
    state: DragState,
}

impl DragSession {
    /// Returns the current state.
    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// Returns whether no drag is in progress.
    pub fn is_idle(&self) -> bool {
        matches!(self.state, DragState::Idle)
    }

    /// Returns the slot currently following the pointer.
    pub fn handle(&self) -> Option<SlotId> {
        self.context().and_then(|ctx| ctx.handle)
    }

    fn context(&self) -> Option<&DragContext> {
        match &self.state {
            DragState::Idle => None,
            DragState::Armed(ctx) | DragState::Active(ctx) => Some(ctx),
        }
    }

    /// Returns whether the dragged app sorts with the pinned block. A placeholder, or no handle at
    /// all, stands for a new app that will be pinned.
    pub fn is_pinned_drag(&self, store: &EntryStore) -> bool {
        self.handle()
            .and_then(|id| store.slot(id))
            .and_then(Slot::entry)
            .map_or(true, |entry| entry.pinned)
    }

    fn live_handle(&self, store: &EntryStore) -> Option<SlotId> {
        self.handle().filter(|id| store.index_of(*id).is_some())
    }

    fn activate(&mut self, store: &mut EntryStore, handle: SlotId) {
        store.set_visible(handle, false);
        self.state = match std::mem::take(&mut self.state) {
            DragState::Armed(mut ctx) | DragState::Active(mut ctx) => {
                ctx.handle = Some(handle);
                DragState::Active(ctx)
            }
            DragState::Idle => DragState::Idle,
        };
    }

    fn create_placeholder(&mut self, store: &mut EntryStore, index: usize) -> DragMove {
        let id = store.insert(SlotKind::Placeholder, index);
        self.activate(store, id);
        debug!(%id, index, "drag placeholder created");
        DragMove::PlaceholderCreated { index }
    }

    /// Starts a session. Returns `Ok(false)` when the payload is not an app shortcut, in which
    /// case no state is created.
    ///
    /// # Errors
    ///
    /// Returns [`ReducerError::DragInProgress`] when a session is already running, and
    /// [`ReducerError::SlotNotFound`] or [`ReducerError::NotAnApp`] when a shelf origin does not
    /// name an app icon.
    pub fn start(
        &mut self,
        store: &mut EntryStore,
        origin: DragOrigin,
        accepts_payload: bool,
    ) -> Result<bool, ReducerError> {
        if !self.is_idle() {
            return Err(ReducerError::DragInProgress);
        }
        if !accepts_payload {
            debug!(?origin, "drag payload is not an app shortcut");
            return Ok(false);
        }

        let mut ctx = DragContext {
            handle: None,
            origin,
            pinned_at_start: store.pinned_subset(),
        };
        match origin {
            DragOrigin::ShelfIcon(id) => {
                let slot = store.slot(id).ok_or(ReducerError::SlotNotFound(id))?;
                if slot.entry().is_none() {
                    return Err(ReducerError::NotAnApp(id));
                }
                ctx.handle = Some(id);
            }
            // An empty shelf still needs somewhere to drop onto.
            DragOrigin::External if store.is_empty() => {
                ctx.handle = Some(store.insert(SlotKind::Placeholder, 0));
            }
            DragOrigin::External => {}
        }

        let handle = ctx.handle;
        match handle {
            Some(handle) => {
                self.state = DragState::Armed(ctx);
                self.activate(store, handle);
            }
            None => self.state = DragState::Armed(ctx),
        }
        debug!(?origin, "drag started");
        Ok(true)
    }

    /// Handles the pointer entering the icon in slot `target`.
    ///
    /// Moving left to right lands the handle after the target, moving right to left lands it in
    /// front. A pinned drag may not move right onto an unpinned target and an unpinned drag may
    /// not move left onto a pinned target.
    pub fn enter_slot(&mut self, store: &mut EntryStore, target: SlotId) -> DragMove {
        if self.is_idle() {
            return DragMove::Ignored;
        }
        let Some(target_index) = store.index_of(target) else {
            return DragMove::Ignored;
        };
        let Some(handle) = self.live_handle(store) else {
            let index = store.next_insertion_index(target_index, true);
            return self.create_placeholder(store, index);
        };
        self.activate(store, handle);
        if handle == target {
            return DragMove::Ignored;
        }
        let Some(handle_index) = store.index_of(handle) else {
            return DragMove::Ignored;
        };

        let drag_pinned = self.is_pinned_drag(store);
        let target_pinned = store.slots()[target_index]
            .entry()
            .map_or(true, |entry| entry.pinned);
        if handle_index < target_index && !target_pinned && drag_pinned {
            debug!(%handle, %target, "pinned drag may not pass an unpinned icon");
            return DragMove::Rejected;
        }
        if handle_index > target_index && target_pinned && !drag_pinned {
            debug!(%handle, %target, "unpinned drag may not pass a pinned icon");
            return DragMove::Rejected;
        }

        store.move_slot(handle, target_index);
        DragMove::Moved {
            from: handle_index,
            to: target_index,
        }
    }

    /// Handles the pointer over the empty area after the last icon.
    pub fn enter_end(&mut self, store: &mut EntryStore) -> DragMove {
        if self.is_idle() {
            return DragMove::Ignored;
        }
        let Some(handle) = self.live_handle(store) else {
            let index = store.next_insertion_index(store.len(), true);
            return self.create_placeholder(store, index);
        };

        let drag_pinned = self.is_pinned_drag(store);
        let Some(from) = store.index_of(handle) else {
            return DragMove::Ignored;
        };
        let Some(slot) = store.remove(handle) else {
            return DragMove::Ignored;
        };
        let to = store.next_insertion_index(store.len(), drag_pinned);
        store.insert_slot(slot, to);
        self.activate(store, handle);
        if from == to {
            DragMove::Ignored
        } else {
            DragMove::Moved { from, to }
        }
    }

    /// Handles the pointer leaving the shelf. The placeholder goes away and a lifted icon is shown
    /// again where it currently sits. Returns whether anything changed.
    pub fn exit(&mut self, store: &mut EntryStore) -> bool {
        if !matches!(self.state, DragState::Active(_)) {
            return false;
        }
        let DragState::Active(mut ctx) = std::mem::take(&mut self.state) else {
            return false;
        };
        if let Some(id) = ctx.handle {
            match store.slot(id).map(Slot::is_placeholder) {
                Some(true) => {
                    store.remove(id);
                    ctx.handle = None;
                }
                Some(false) => store.set_visible(id, true),
                None => ctx.handle = None,
            }
        }
        self.state = DragState::Armed(ctx);
        true
    }

    /// Handles a drop over the shelf. `app` is the payload's resolved identity, `None` when it
    /// could not be resolved to a launchable app. Call [`DragSession::finish`] afterwards.
    pub fn drop_app(&mut self, store: &mut EntryStore, app: Option<AppIdentity>) -> DropOutcome {
        if self.is_idle() {
            return DropOutcome::Ignored;
        }
        let handle = self
            .live_handle(store)
            .and_then(|id| store.slot(id).map(|slot| (id, slot.is_placeholder())));
        match (handle, app) {
            (Some((_, false)), _) => DropOutcome::Kept,
            (Some((placeholder, true)), None) => {
                store.remove(placeholder);
                DropOutcome::Rejected
            }
            (None, None) => DropOutcome::Rejected,
            (Some((placeholder, true)), Some(app)) => materialize(store, Some(placeholder), app),
            (None, Some(app)) => materialize(store, None, app),
        }
    }

    /// Ends the session: removes any placeholder, shows the handle again and returns to `Idle`.
    ///
    /// Returns whether the pinned block differs from when the drag started.
    pub fn finish(&mut self, store: &mut EntryStore) -> bool {
        let (DragState::Armed(ctx) | DragState::Active(ctx)) = std::mem::take(&mut self.state)
        else {
            return false;
        };
        store.remove_placeholders();
        if let Some(id) = ctx.handle {
            store.set_visible(id, true);
        }
        let changed = store.pinned_subset() != ctx.pinned_at_start;
        debug!(changed, "drag finished");
        changed
    }

    /// Forgets the session without touching the sequence. Used when the sequence was rebuilt.
    pub fn cancel(&mut self) {
        if !self.is_idle() {
            debug!("drag cancelled by shelf rebuild");
        }
        self.state = DragState::Idle;
    }

    /// Drops the handle when it is no longer in the sequence, for example after reconciliation
    /// removed a dragged unpinned icon.
    pub fn forget_missing_handle(&mut self, store: &EntryStore) {
        if self.handle().is_none() || self.live_handle(store).is_some() {
            return;
        }
        self.state = match std::mem::take(&mut self.state) {
            DragState::Armed(mut ctx) | DragState::Active(mut ctx) => {
                ctx.handle = None;
                DragState::Armed(ctx)
            }
            DragState::Idle => DragState::Idle,
        };
    }
}

fn materialize(
    store: &mut EntryStore,
    placeholder: Option<SlotId>,
    app: AppIdentity,
) -> DropOutcome {
    let mut entry = Entry::pinned(app);
    if let Some(existing) = store.position_of_app(entry.app()) {
        let already_pinned = store.slots()[existing]
            .entry()
            .is_some_and(|current| current.pinned);
        if already_pinned {
            if let Some(id) = placeholder {
                store.remove(id);
            }
            return DropOutcome::AlreadyPinned;
        }
        if let SlotKind::App(running) = store.remove_at(existing).kind {
            entry.tasks = running.tasks;
        }
    }

    let target = placeholder.and_then(|id| store.slot_mut(id));
    let id = match target {
        Some(slot) => {
            slot.kind = SlotKind::App(entry);
            slot.id
        }
        None => {
            let index = store.next_insertion_index(store.len(), true);
            store.insert_entry(entry, index)
        }
    };
    debug!(%id, "dropped app pinned");
    DropOutcome::Pinned(id)
}
