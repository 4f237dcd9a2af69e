//! Merges the live recent-task list into the shelf sequence.

use platform_host::IdentityResolver;
use shelf_contract::{AppIdentity, RecentTask};
use tracing::debug;

use crate::{
    entry_store::EntryStore,
    model::{Entry, SlotId},
};

#[derive(Debug, Clone, PartialEq, Eq)]
/// A recent task together with the shelf application it belongs to.
pub struct ResolvedTask {
    /// Application the task is attributed to.
    pub app: AppIdentity,
    /// The task itself.
    pub task: RecentTask,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Entries created and dropped by one reconciliation pass.
pub struct ReconcileReport {
    /// Apps that gained a new unpinned entry.
    pub added: Vec<AppIdentity>,
    /// Unpinned apps removed because none of their tasks survived.
    pub removed: Vec<AppIdentity>,
}

impl ReconcileReport {
    /// Returns whether the pass only refreshed task lists.
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Maps a task to the shelf application that should own it.
///
/// The task's own activity is used when it is launchable. Otherwise the front-door activity of
/// the same package and user stands in. Tasks resolving to neither are skipped by returning
/// `None`.
pub fn resolve_task_app(
    task: &RecentTask,
    resolver: &dyn IdentityResolver,
) -> Option<AppIdentity> {
    let app = AppIdentity::new(task.activity()?.clone(), task.user);
    if resolver.build_launch_intent(&app).is_some() {
        return Some(app);
    }
    let component = resolver.launch_component_for_package(app.package(), task.user)?;
    Some(AppIdentity::new(component, task.user))
}

/// Resolves every task in order, dropping the ones with no launchable app.
pub fn resolve_tasks(
    tasks: impl IntoIterator<Item = RecentTask>,
    resolver: &dyn IdentityResolver,
) -> Vec<ResolvedTask> {
    tasks
        .into_iter()
        .filter_map(|task| match resolve_task_app(&task, resolver) {
            Some(app) => Some(ResolvedTask { app, task }),
            None => {
                debug!(task = %task.task_id, "skipping task without a launchable app");
                None
            }
        })
        .collect()
}

/// Replaces every entry's task list with `tasks` (most recent first).
///
/// Existing entries keep their position. Apps without an entry get an unpinned one appended at
/// the end of the sequence, and unpinned entries left without tasks are removed. Running the
/// same list twice is a no-op the second time.
pub fn reconcile_tasks(
    store: &mut EntryStore,
    tasks: impl IntoIterator<Item = ResolvedTask>,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    for entry in store.entries_mut() {
        entry.tasks.clear();
    }

    for ResolvedTask { app, task } in tasks {
        if let Some(entry) = store.entry_for_app_mut(&app) {
            entry.tasks.push(task);
            continue;
        }
        report.added.push(app.clone());
        let end = store.len();
        store.insert_entry(Entry::for_task(app, task), end);
    }

    let orphans: Vec<SlotId> = store
        .slots()
        .iter()
        .filter(|slot| {
            slot.entry()
                .is_some_and(|entry| !entry.pinned && entry.has_no_tasks())
        })
        .map(|slot| slot.id)
        .collect();
    for id in orphans {
        if let Some(entry) = store.remove(id).and_then(|slot| slot.entry().cloned()) {
            report.removed.push(entry.app().clone());
        }
    }

    debug!(
        added = report.added.len(),
        removed = report.removed.len(),
        "reconciled recent tasks"
    );
    report
}
