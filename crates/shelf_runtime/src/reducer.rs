//! Reducer actions, side-effect intents, and transition logic for the shelf runtime.

use platform_host::{IdentityResolver, UserDirectory};
use shelf_contract::{AppIdentity, DragPayload, TaskId};
use thiserror::Error;
use tracing::debug;

use crate::{
    drag::{DragMove, DragOrigin, DragSession, DropOutcome},
    entry_store::EntryStore,
    model::{SlotId, SlotKind},
    reconciler::{reconcile_tasks, ResolvedTask},
};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Actions accepted by [`reduce_shelf`] to mutate the shelf sequence.
pub enum ShelfAction {
    /// Replace the whole sequence with a pinned list, cancelling any drag.
    RebuildPinned {
        /// Pinned apps in order.
        apps: Vec<AppIdentity>,
    },
    /// Merge a resolved recent-task list.
    ApplyTasks {
        /// Tasks, most recent first.
        tasks: Vec<ResolvedTask>,
    },
    /// A drag began.
    DragStarted {
        /// Where the drag began.
        origin: DragOrigin,
        /// Whether the payload advertises an app shortcut.
        accepts_payload: bool,
    },
    /// The pointer entered an icon.
    DragEnteredSlot {
        /// Hovered slot.
        slot: SlotId,
    },
    /// The pointer entered the empty area after the last icon.
    DragEnteredEnd,
    /// The pointer left the shelf.
    DragExited,
    /// The payload was released over the shelf.
    Drop {
        /// Resolved payload identity, `None` when it did not resolve.
        app: Option<AppIdentity>,
    },
    /// The platform ended the drag without a drop on the shelf.
    DragEnded,
    /// Pin the app in a slot from its context menu.
    Pin {
        /// Slot to pin.
        slot: SlotId,
    },
    /// Unpin the app in a slot from its context menu.
    Unpin {
        /// Slot to unpin.
        slot: SlotId,
    },
    /// Unpin a set of apps, for example after their package went away.
    UnpinApps {
        /// Apps to unpin.
        apps: Vec<AppIdentity>,
    },
    /// The user clicked an icon.
    Activate {
        /// Clicked slot.
        slot: SlotId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Side-effect intents emitted by [`reduce_shelf`] for the shelf runtime to execute.
pub enum RuntimeEffect {
    /// The pinned block changed; hand it to the change notifier.
    PinnedSetChanged,
    /// Fetch recent tasks and reconcile.
    RefreshTasks,
    /// Start an app that has no running task.
    LaunchApp(AppIdentity),
    /// Bring a task to front.
    ActivateTask(TaskId),
    /// Offer a chooser between the running tasks of an app.
    ShowTaskMenu {
        /// App whose tasks are offered.
        app: AppIdentity,
        /// Task ids, most recent first.
        tasks: Vec<TaskId>,
    },
    /// A drop did not resolve to a launchable app.
    DropRejected,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Reducer errors for invalid actions.
pub enum ReducerError {
    /// The slot id is not in the sequence.
    #[error("slot {0} not found")]
    SlotNotFound(SlotId),
    /// The slot is the drag placeholder.
    #[error("slot {0} is not an app icon")]
    NotAnApp(SlotId),
    /// A drag started while another one was running.
    #[error("a drag is already in progress")]
    DragInProgress,
}

/// Applies a [`ShelfAction`] to the shelf sequence and drag session and collects resulting side
/// effects.
///
/// # Errors
///
/// Returns [`ReducerError`] when an action names a missing slot or a placeholder where an app is
/// required, or starts a second drag.
pub fn reduce_shelf(
    store: &mut EntryStore,
    drag: &mut DragSession,
    action: ShelfAction,
) -> Result<Vec<RuntimeEffect>, ReducerError> {
    let mut effects = Vec::new();
    match action {
        ShelfAction::RebuildPinned { apps } => {
            drag.cancel();
            store.rebuild_from_pinned(apps);
            effects.push(RuntimeEffect::RefreshTasks);
        }
        ShelfAction::ApplyTasks { tasks } => {
            reconcile_tasks(store, tasks);
            drag.forget_missing_handle(store);
        }
        ShelfAction::DragStarted {
            origin,
            accepts_payload,
        } => {
            drag.start(store, origin, accepts_payload)?;
        }
        ShelfAction::DragEnteredSlot { slot } => {
            log_move(drag.enter_slot(store, slot));
        }
        ShelfAction::DragEnteredEnd => {
            log_move(drag.enter_end(store));
        }
        ShelfAction::DragExited => {
            drag.exit(store);
        }
        ShelfAction::Drop { app } => {
            if drag.drop_app(store, app) == DropOutcome::Rejected {
                effects.push(RuntimeEffect::DropRejected);
            }
            finish_drag(store, drag, &mut effects);
        }
        ShelfAction::DragEnded => finish_drag(store, drag, &mut effects),
        ShelfAction::Pin { slot } => {
            let index = app_slot_index(store, slot)?;
            let already_pinned = store.slots()[index]
                .entry()
                .is_some_and(|entry| entry.pinned);
            if !already_pinned {
                let mut moved = store.remove_at(index);
                if let SlotKind::App(entry) = &mut moved.kind {
                    entry.pinned = true;
                }
                let target = store.next_insertion_index(store.len(), true);
                store.insert_slot(moved, target);
                effects.push(RuntimeEffect::PinnedSetChanged);
            }
        }
        ShelfAction::Unpin { slot } => {
            app_slot_index(store, slot)?;
            if unpin_slot(store, slot) {
                effects.push(RuntimeEffect::PinnedSetChanged);
            }
        }
        ShelfAction::UnpinApps { apps } => {
            let mut unpinned = false;
            for app in &apps {
                if let Some(slot) = store.find_by_app(app).map(|slot| slot.id) {
                    unpinned |= unpin_slot(store, slot);
                }
            }
            if unpinned {
                effects.push(RuntimeEffect::PinnedSetChanged);
            }
        }
        ShelfAction::Activate { slot } => {
            let index = app_slot_index(store, slot)?;
            if let Some(entry) = store.slots()[index].entry() {
                match entry.tasks.first() {
                    None => effects.push(RuntimeEffect::LaunchApp(entry.app().clone())),
                    Some(latest) => {
                        effects.push(RuntimeEffect::ActivateTask(latest.task_id));
                        if entry.tasks.len() > 1 {
                            effects.push(RuntimeEffect::ShowTaskMenu {
                                app: entry.app().clone(),
                                tasks: entry.task_ids(),
                            });
                        }
                    }
                }
            }
        }
    }
    Ok(effects)
}

/// Decodes a drop payload into a launchable app identity.
///
/// Every failure (malformed payload, unknown user serial, unlaunchable component) yields `None`.
pub fn resolve_payload(
    payload: &DragPayload,
    users: &dyn UserDirectory,
    resolver: &dyn IdentityResolver,
) -> Option<AppIdentity> {
    let (component, serial) = match payload.decode_shortcut() {
        Ok(decoded) => decoded,
        Err(err) => {
            debug!(%err, "drop payload rejected");
            return None;
        }
    };
    let user = users.user_for_serial(serial)?;
    let app = AppIdentity::new(component, user);
    resolver.build_launch_intent(&app)?;
    Some(app)
}

fn app_slot_index(store: &EntryStore, slot: SlotId) -> Result<usize, ReducerError> {
    let index = store
        .index_of(slot)
        .ok_or(ReducerError::SlotNotFound(slot))?;
    if store.slots()[index].is_placeholder() {
        return Err(ReducerError::NotAnApp(slot));
    }
    Ok(index)
}

// An unpinned entry with tasks moves to the end of the shelf; without tasks it leaves.
fn unpin_slot(store: &mut EntryStore, slot: SlotId) -> bool {
    let pinned = store
        .slot(slot)
        .and_then(|slot| slot.entry())
        .is_some_and(|entry| entry.pinned);
    if !pinned {
        return false;
    }
    let Some(mut moved) = store.remove(slot) else {
        return false;
    };
    let keep = match &mut moved.kind {
        SlotKind::App(entry) => {
            entry.pinned = false;
            !entry.has_no_tasks()
        }
        SlotKind::Placeholder => false,
    };
    if keep {
        let end = store.len();
        store.insert_slot(moved, end);
    }
    true
}

fn finish_drag(store: &mut EntryStore, drag: &mut DragSession, effects: &mut Vec<RuntimeEffect>) {
    if drag.finish(store) {
        effects.push(RuntimeEffect::PinnedSetChanged);
        effects.push(RuntimeEffect::RefreshTasks);
    }
}

fn log_move(step: DragMove) {
    if step != DragMove::Ignored {
        debug!(?step, "drag step");
    }
}
