//! Shelf slot and entry types.

use std::fmt;

use serde::{Deserialize, Serialize};
use shelf_contract::{AppIdentity, RecentTask, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
/// Stable handle of a slot in the shelf sequence. Never reused by the store that allocated it.
pub struct SlotId(pub u64);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One application icon: identity, pin flag and the tasks currently attributed to it.
pub struct Entry {
    app: AppIdentity,
    /// Whether the user explicitly keeps this icon on the shelf.
    pub pinned: bool,
    /// Tasks of this app, most recently used first.
    pub tasks: Vec<RecentTask>,
}

impl Entry {
    /// Creates a pinned entry with no tasks.
    pub fn pinned(app: AppIdentity) -> Self {
        Self {
            app,
            pinned: true,
            tasks: Vec::new(),
        }
    }

    /// Creates an unpinned entry owning its first task.
    pub fn for_task(app: AppIdentity, task: RecentTask) -> Self {
        Self {
            app,
            pinned: false,
            tasks: vec![task],
        }
    }

    /// Returns the application identity. It never changes for the lifetime of the entry.
    pub fn app(&self) -> &AppIdentity {
        &self.app
    }

    /// Returns whether no task is attributed to this entry.
    pub fn has_no_tasks(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Returns the ids of the attributed tasks in recency order.
    pub fn task_ids(&self) -> Vec<TaskId> {
        self.tasks.iter().map(|task| task.task_id).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Content of a shelf slot.
pub enum SlotKind {
    /// An application icon.
    App(Entry),
    /// Identity-less drop target reserved during a drag.
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A positioned slot in the shelf sequence.
pub struct Slot {
    /// Stable slot handle.
    pub id: SlotId,
    /// Slot content.
    pub kind: SlotKind,
    /// Whether the view layer should draw this slot. Only the drag handle is ever hidden.
    pub visible: bool,
}

impl Slot {
    /// Returns the entry when this slot is an application icon.
    pub fn entry(&self) -> Option<&Entry> {
        match &self.kind {
            SlotKind::App(entry) => Some(entry),
            SlotKind::Placeholder => None,
        }
    }

    /// Mutable variant of [`Slot::entry`].
    pub fn entry_mut(&mut self) -> Option<&mut Entry> {
        match &mut self.kind {
            SlotKind::App(entry) => Some(entry),
            SlotKind::Placeholder => None,
        }
    }

    /// Returns whether this slot is the drag placeholder.
    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, SlotKind::Placeholder)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Render-ready view of one slot handed to the view layer.
pub struct SlotView {
    /// Stable slot handle, used to address drag and menu actions back to the runtime.
    pub id: SlotId,
    /// Application identity, absent for the placeholder.
    pub app: Option<AppIdentity>,
    /// Pin flag; `false` for the placeholder.
    pub pinned: bool,
    /// Attributed task ids, most recent first.
    pub task_ids: Vec<TaskId>,
    /// Whether the slot is drawn.
    pub visible: bool,
}

impl From<&Slot> for SlotView {
    fn from(slot: &Slot) -> Self {
        let entry = slot.entry();
        Self {
            id: slot.id,
            app: entry.map(|entry| entry.app().clone()),
            pinned: entry.is_some_and(|entry| entry.pinned),
            task_ids: entry.map(Entry::task_ids).unwrap_or_default(),
            visible: slot.visible,
        }
    }
}
