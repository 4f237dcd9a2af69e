//! Launcher shelf runtime: ordered icon entries under the pinned/unpinned partition, recent-task
//! reconciliation, drag reordering and pinned-set change propagation.
//!
//! All mutation happens on one logical thread. Producers on other threads hand work to the
//! runtime through [`ShelfEventSender`]; the owner drains it with
//! [`ShelfRuntime::process_pending_events`].

pub mod config;
pub mod drag;
pub mod entry_store;
pub mod events;
pub mod host;
pub mod model;
pub mod notifier;
pub mod persistence;
pub mod pinned_model;
pub mod reconciler;
pub mod reducer;
pub mod runtime;

pub use config::{ConfigError, ConfigLoader, ShelfConfig, SHELF_CONFIG_PATH};
pub use drag::{DragContext, DragMove, DragOrigin, DragSession, DragState, DropOutcome};
pub use entry_store::{EntryStore, PartitionViolation};
pub use events::{shelf_event_channel, ShelfEvent, ShelfEventReceiver, ShelfEventSender};
pub use host::ShelfHostContext;
pub use model::{Entry, Slot, SlotId, SlotKind, SlotView};
pub use notifier::ChangeNotifier;
pub use persistence::{PinnedAppsRecord, PINNED_APPS_SCHEMA_VERSION};
pub use pinned_model::{PinnedAppsChanged, PinnedAppsModel, PinnedAppsSubscription};
pub use reconciler::{
    reconcile_tasks, resolve_task_app, resolve_tasks, ReconcileReport, ResolvedTask,
};
pub use reducer::{reduce_shelf, resolve_payload, ReducerError, RuntimeEffect, ShelfAction};
pub use runtime::ShelfRuntime;
