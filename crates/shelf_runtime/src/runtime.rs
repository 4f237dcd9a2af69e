//! Shelf instance: owns the sequence and drag session, runs reducer effects against the host and
//! keeps the shared pinned list in sync.

use std::collections::{BTreeSet, VecDeque};

use shelf_contract::{AppIdentity, DragPayload, UserId};
use tracing::{debug, info, warn};

use crate::{
    config::ShelfConfig,
    drag::{DragOrigin, DragSession},
    entry_store::EntryStore,
    events::{shelf_event_channel, ShelfEvent, ShelfEventReceiver, ShelfEventSender},
    host::ShelfHostContext,
    model::{SlotId, SlotView},
    notifier::ChangeNotifier,
    pinned_model::{PinnedAppsModel, PinnedAppsSubscription},
    reconciler::{resolve_tasks, ResolvedTask},
    reducer::{reduce_shelf, resolve_payload, ReducerError, RuntimeEffect, ShelfAction},
};

/// One shelf bound to a host and to the shared pinned list.
///
/// Every method runs to completion on the calling thread. Work produced elsewhere arrives
/// through [`ShelfRuntime::sender`] and is applied by [`ShelfRuntime::process_pending_events`].
pub struct ShelfRuntime {
    config: ShelfConfig,
    host: ShelfHostContext,
    model: PinnedAppsModel,
    subscription: PinnedAppsSubscription,
    store: EntryStore,
    drag: DragSession,
    notifier: ChangeNotifier,
    sender: ShelfEventSender,
    events: ShelfEventReceiver,
}

impl ShelfRuntime {
    /// Creates a shelf showing the model's current pinned list. Call
    /// [`ShelfRuntime::attach`] to load the foreground user's list and pull recent tasks.
    pub fn new(config: ShelfConfig, host: ShelfHostContext, model: PinnedAppsModel) -> Self {
        let subscription = model.subscribe();
        let apps = model.apps();
        let (sender, events) = shelf_event_channel();
        Self {
            config,
            host,
            store: EntryStore::from_pinned(apps.clone()),
            notifier: ChangeNotifier::new(apps),
            subscription,
            model,
            drag: DragSession::default(),
            sender,
            events,
        }
    }

    /// Loads the foreground user's pinned list if needed, rebuilds the shelf from it and
    /// reconciles recent tasks.
    ///
    /// # Errors
    ///
    /// Returns the store error when loading failed. The shelf is still rebuilt, from an empty
    /// list in that case.
    pub async fn attach(&mut self) -> Result<(), String> {
        let user = self.host.users().current_user();
        let loaded = self
            .model
            .ensure_loaded(self.host.pinned_apps_store(), user)
            .await;
        self.subscription.drain();
        let apps = self.model.apps();
        self.notifier.mark_persisted(apps.clone());
        self.run(ShelfAction::RebuildPinned { apps })
            .map_err(|err| err.to_string())?;
        info!(%user, slots = self.store.len(), "shelf attached");
        loaded.map(|_| ())
    }

    /// Returns a thread-safe handle for host notifications.
    pub fn sender(&self) -> ShelfEventSender {
        self.sender.clone()
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &ShelfConfig {
        &self.config
    }

    /// Returns the shelf sequence.
    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    /// Returns the drag session.
    pub fn drag(&self) -> &DragSession {
        &self.drag
    }

    /// Returns the render-ready slot list.
    pub fn snapshot(&self) -> Vec<SlotView> {
        self.store.slots().iter().map(SlotView::from).collect()
    }

    /// Applies `action` and executes its effects, including follow-up reconciliation.
    ///
    /// # Errors
    ///
    /// Returns [`ReducerError`] from the reducer; effects of earlier steps stay applied.
    pub fn dispatch(&mut self, action: ShelfAction) -> Result<(), ReducerError> {
        self.run(action)
    }

    /// Fetches recent tasks from the host and merges them.
    pub fn refresh_tasks(&mut self) {
        let tasks = self.fetch_tasks();
        if let Err(err) = self.run(ShelfAction::ApplyTasks { tasks }) {
            warn!("task refresh failed: {err}");
        }
    }

    /// Starts a drag carrying `payload`. Returns whether the shelf accepted it.
    ///
    /// # Errors
    ///
    /// Returns [`ReducerError`] when a drag is already running or `origin` is not an app icon.
    pub fn drag_started(
        &mut self,
        origin: DragOrigin,
        payload: &DragPayload,
    ) -> Result<bool, ReducerError> {
        self.run(ShelfAction::DragStarted {
            origin,
            accepts_payload: payload.accepts_shortcut(),
        })?;
        Ok(!self.drag.is_idle())
    }

    /// Pointer entered the icon in `slot`.
    ///
    /// # Errors
    ///
    /// Propagates reducer errors.
    pub fn drag_entered_slot(&mut self, slot: SlotId) -> Result<(), ReducerError> {
        self.run(ShelfAction::DragEnteredSlot { slot })
    }

    /// Pointer entered the empty trailing area.
    ///
    /// # Errors
    ///
    /// Propagates reducer errors.
    pub fn drag_entered_end(&mut self) -> Result<(), ReducerError> {
        self.run(ShelfAction::DragEnteredEnd)
    }

    /// Pointer left the shelf.
    ///
    /// # Errors
    ///
    /// Propagates reducer errors.
    pub fn drag_exited(&mut self) -> Result<(), ReducerError> {
        self.run(ShelfAction::DragExited)
    }

    /// Drop over the shelf. Returns whether the drop landed: the payload app was pinned or a
    /// lifted icon stayed where it was dragged to. `false` when no drag was running or the
    /// payload did not resolve to a launchable app.
    ///
    /// # Errors
    ///
    /// Propagates reducer errors.
    pub fn drop(&mut self, payload: &DragPayload) -> Result<bool, ReducerError> {
        if self.drag.is_idle() {
            return Ok(false);
        }
        let app = resolve_payload(payload, self.host.users(), self.host.resolver());
        let effects = self.run_collecting(ShelfAction::Drop { app })?;
        Ok(!effects.contains(&RuntimeEffect::DropRejected))
    }

    /// Builds the payload carried when the icon in `slot` is lifted off the shelf. `None` for
    /// the placeholder or when the app's profile has no serial on this device.
    pub fn drag_payload(&self, slot: SlotId) -> Option<DragPayload> {
        let app = self.store.slot(slot)?.entry()?.app();
        let serial = self.host.users().serial_for_user(app.user)?;
        Some(DragPayload::for_app(app.component.clone(), serial))
    }

    /// Drag ended without a drop on the shelf.
    ///
    /// # Errors
    ///
    /// Propagates reducer errors.
    pub fn drag_ended(&mut self) -> Result<(), ReducerError> {
        self.run(ShelfAction::DragEnded)
    }

    /// Pins the app in `slot`.
    ///
    /// # Errors
    ///
    /// Returns [`ReducerError`] when `slot` is missing or the placeholder.
    pub fn pin(&mut self, slot: SlotId) -> Result<(), ReducerError> {
        self.run(ShelfAction::Pin { slot })
    }

    /// Unpins the app in `slot`.
    ///
    /// # Errors
    ///
    /// Returns [`ReducerError`] when `slot` is missing or the placeholder.
    pub fn unpin(&mut self, slot: SlotId) -> Result<(), ReducerError> {
        self.run(ShelfAction::Unpin { slot })
    }

    /// Handles a click on the icon in `slot`.
    ///
    /// # Errors
    ///
    /// Returns [`ReducerError`] when `slot` is missing or the placeholder.
    pub fn activate(&mut self, slot: SlotId) -> Result<(), ReducerError> {
        self.run(ShelfAction::Activate { slot })
    }

    /// Applies pinned-list changes published by other shelves. Returns whether the shelf was
    /// rebuilt.
    pub fn sync_pinned_apps(&mut self) -> bool {
        let current_user = self.model.current_user();
        let Some(latest) = self
            .subscription
            .drain()
            .into_iter()
            .rev()
            .find(|change| change.user == current_user)
        else {
            return false;
        };
        if !self
            .notifier
            .on_external_pinned_set_changed(&self.store, &latest.apps)
        {
            return false;
        }
        match self.run(ShelfAction::RebuildPinned { apps: latest.apps }) {
            Ok(()) => true,
            Err(err) => {
                warn!("pinned list rebuild failed: {err}");
                false
            }
        }
    }

    /// Applies every queued host notification, then any pinned-list change published by other
    /// shelves. Returns the number of notifications handled.
    ///
    /// # Errors
    ///
    /// Returns the first pinned-list store error from a user switch. Remaining notifications are
    /// still applied.
    pub async fn process_pending_events(&mut self) -> Result<usize, String> {
        let events = self.events.drain_ready();
        let handled = events.len();
        let mut first_error = None;
        for event in events {
            debug!(?event, "shelf event");
            if let Err(err) = self.handle_event(event).await {
                warn!("shelf event failed: {err}");
                first_error.get_or_insert(err);
            }
        }
        self.sync_pinned_apps();
        match first_error {
            Some(err) => Err(err),
            None => Ok(handled),
        }
    }

    /// Writes the shared pinned list if it has unsaved changes. Returns whether a write
    /// happened.
    ///
    /// # Errors
    ///
    /// Returns the store error.
    pub async fn flush_pinned_apps(&self) -> Result<bool, String> {
        self.model.flush(self.host.pinned_apps_store()).await
    }

    async fn handle_event(&mut self, event: ShelfEvent) -> Result<(), String> {
        if let Some((packages, user)) = event.packages_to_recheck() {
            self.unpin_unlaunchable(&packages, user);
            return Ok(());
        }
        match event {
            ShelfEvent::TaskStackChanged => self.refresh_tasks(),
            ShelfEvent::UserSwitched { user } => {
                info!(%user, "switching shelf user");
                let switched = self
                    .model
                    .switch_user(self.host.pinned_apps_store(), user)
                    .await;
                self.subscription.drain();
                let apps = self.model.apps();
                self.notifier.mark_persisted(apps.clone());
                if let Err(err) = self.run(ShelfAction::RebuildPinned { apps }) {
                    warn!("rebuild after user switch failed: {err}");
                }
                switched?;
            }
            ShelfEvent::ManagedProfileRemoved { user } => {
                let apps = self.pinned_apps_where(|app| app.user == user);
                self.unpin_apps(apps);
                self.host
                    .pinned_apps_store()
                    .clear_pinned_apps(user)
                    .await?;
            }
            ShelfEvent::PackageRemoved { .. }
            | ShelfEvent::PackageModified { .. }
            | ShelfEvent::PackagesAvailable { .. }
            | ShelfEvent::PackagesUnavailable { .. } => {}
        }
        Ok(())
    }

    fn unpin_unlaunchable(&mut self, packages: &[String], user: UserId) {
        let packages: BTreeSet<&str> = packages.iter().map(String::as_str).collect();
        let resolver = self.host.resolver();
        let apps = self.pinned_apps_where(|app| {
            app.user == user
                && packages.contains(app.package())
                && resolver.build_launch_intent(app).is_none()
        });
        self.unpin_apps(apps);
    }

    fn pinned_apps_where(&self, predicate: impl Fn(&AppIdentity) -> bool) -> Vec<AppIdentity> {
        self.store
            .pinned_subset()
            .into_iter()
            .filter(|app| predicate(app))
            .collect()
    }

    fn unpin_apps(&mut self, apps: Vec<AppIdentity>) {
        if apps.is_empty() {
            return;
        }
        info!(count = apps.len(), "unpinning apps that can no longer launch");
        if let Err(err) = self.run(ShelfAction::UnpinApps { apps }) {
            warn!("unpin failed: {err}");
        }
    }

    fn fetch_tasks(&self) -> Vec<ResolvedTask> {
        let tasks = self
            .host
            .tasks()
            .fetch_recent_tasks(self.config.max_recent_tasks);
        resolve_tasks(tasks, self.host.resolver())
    }

    fn run(&mut self, action: ShelfAction) -> Result<(), ReducerError> {
        self.run_collecting(action).map(|_| ())
    }

    /// Runs `action` and its follow-ups, returning every effect that was executed.
    fn run_collecting(
        &mut self,
        action: ShelfAction,
    ) -> Result<Vec<RuntimeEffect>, ReducerError> {
        let mut pending = VecDeque::from([action]);
        let mut executed = Vec::new();
        while let Some(action) = pending.pop_front() {
            let effects = reduce_shelf(&mut self.store, &mut self.drag, action)?;
            if self.config.verify_invariants {
                if let Some(violation) = self.store.partition_violation() {
                    warn!("shelf partition broken: {violation}");
                }
            }
            for effect in effects {
                if let Some(follow_up) = self.execute(effect.clone()) {
                    pending.push_back(follow_up);
                }
                executed.push(effect);
            }
        }
        Ok(executed)
    }

    fn execute(&mut self, effect: RuntimeEffect) -> Option<ShelfAction> {
        match effect {
            RuntimeEffect::PinnedSetChanged => {
                if let Some(apps) = self.notifier.on_pinned_set_changed(&self.store) {
                    self.model.set_apps(Some(&self.subscription), apps);
                }
                None
            }
            RuntimeEffect::RefreshTasks => Some(ShelfAction::ApplyTasks {
                tasks: self.fetch_tasks(),
            }),
            RuntimeEffect::LaunchApp(app) => {
                match self.host.resolver().build_launch_intent(&app) {
                    Some(intent) => self.host.launcher().launch(&intent),
                    None => {
                        warn!(%app, "activity not found");
                        self.host.launcher().report_activity_not_found(&app);
                    }
                }
                None
            }
            RuntimeEffect::ActivateTask(task_id) => {
                if let Err(err) = self.host.launcher().activate_task(task_id) {
                    warn!("failed to activate task {task_id}: {err}");
                }
                None
            }
            RuntimeEffect::ShowTaskMenu { app, tasks } => {
                self.host.launcher().show_task_menu(&app, &tasks);
                None
            }
            RuntimeEffect::DropRejected => {
                warn!("drop rejected: payload is not a launchable app");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use platform_host::{
        LaunchRequest, MemoryAppCatalog, MemoryPinnedAppsStore, MemoryTaskSource,
        PinnedAppsStore, PinnedAppsStoreFuture, RecordingLaunchService,
    };
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use shelf_contract::{ComponentName, LaunchIntent, RecentTask, TaskId, UserSerial};

    use super::*;
    use crate::persistence::{save_pinned_apps, PinnedAppsRecord};

    struct Harness {
        catalog: MemoryAppCatalog,
        tasks: MemoryTaskSource,
        launcher: RecordingLaunchService,
        store: MemoryPinnedAppsStore,
        model: PinnedAppsModel,
    }

    impl Harness {
        fn new() -> Self {
            let catalog = MemoryAppCatalog::default();
            catalog
                .add_user(UserId(0), UserSerial(0))
                .add_user(UserId(10), UserSerial(27));
            Self {
                catalog,
                tasks: MemoryTaskSource::default(),
                launcher: RecordingLaunchService::default(),
                store: MemoryPinnedAppsStore::default(),
                model: PinnedAppsModel::from_config(&ShelfConfig::default()),
            }
        }

        fn shelf(&self) -> ShelfRuntime {
            let host = ShelfHostContext::default()
                .with_app_catalog(self.catalog.clone())
                .with_task_source(self.tasks.clone())
                .with_launch_service(self.launcher.clone())
                .with_pinned_apps_store(self.store.clone());
            let config = ShelfConfig {
                verify_invariants: true,
                ..ShelfConfig::default()
            };
            ShelfRuntime::new(config, host, self.model.clone())
        }

        fn seed_pinned(&self, user: UserId, apps: Vec<AppIdentity>) {
            let record = PinnedAppsRecord {
                apps,
                ..PinnedAppsRecord::empty(user)
            };
            block_on(save_pinned_apps(&self.store, &record)).expect("seed");
        }
    }

    fn app(name: &str, user: i32) -> AppIdentity {
        AppIdentity::new(
            ComponentName::new(format!("com.example.{name}"), format!("com.example.{name}.Main")),
            UserId(user),
        )
    }

    fn task(name: &str, id: i32, user: i32) -> RecentTask {
        RecentTask::new(TaskId(id), app(name, user).component, UserId(user))
    }

    fn apps_on(shelf: &ShelfRuntime) -> Vec<(AppIdentity, bool)> {
        shelf
            .snapshot()
            .into_iter()
            .filter_map(|view| view.app.map(|app| (app, view.pinned)))
            .collect()
    }

    fn slot_of(shelf: &ShelfRuntime, app: &AppIdentity) -> SlotId {
        shelf.store().find_by_app(app).expect("slot").id
    }

    #[test]
    fn attach_loads_pinned_list_and_reconciles_tasks() {
        let harness = Harness::new();
        harness.catalog.install(app("x", 0)).install(app("z", 0));
        harness.seed_pinned(UserId(0), vec![app("x", 0)]);
        harness.tasks.set_tasks(vec![task("z", 1, 0), task("x", 2, 0)]);

        let mut shelf = harness.shelf();
        block_on(shelf.attach()).expect("attach");

        assert_eq!(
            apps_on(&shelf),
            vec![(app("x", 0), true), (app("z", 0), false)]
        );
    }

    #[test]
    fn drop_from_outside_pins_and_publishes_to_the_other_shelf() {
        let harness = Harness::new();
        harness.catalog.install(app("w", 10));
        let mut primary = harness.shelf();
        let mut secondary = harness.shelf();
        block_on(primary.attach()).expect("attach primary");
        block_on(secondary.attach()).expect("attach secondary");

        let payload = DragPayload::for_app(app("w", 10).component, UserSerial(27));
        assert_eq!(primary.drag_started(DragOrigin::External, &payload), Ok(true));
        assert_eq!(primary.drop(&payload), Ok(true));

        assert_eq!(apps_on(&primary), vec![(app("w", 10), true)]);
        assert_eq!(harness.model.apps(), vec![app("w", 10)]);
        assert_eq!(block_on(primary.flush_pinned_apps()), Ok(true));
        assert!(harness.store.stored_json(UserId(0)).is_some());

        assert_eq!(block_on(secondary.process_pending_events()), Ok(0));
        assert_eq!(apps_on(&secondary), vec![(app("w", 10), true)]);
    }

    #[test]
    fn non_shortcut_drag_is_refused() {
        let harness = Harness::new();
        let mut shelf = harness.shelf();

        assert_eq!(
            shelf.drag_started(DragOrigin::External, &DragPayload::default()),
            Ok(false)
        );
        assert!(shelf.drag().is_idle());
        assert!(shelf.snapshot().is_empty());
    }

    #[test]
    fn clicks_launch_or_activate_through_the_launch_service() {
        let harness = Harness::new();
        harness.catalog.install(app("x", 0)).install(app("y", 0));
        harness.seed_pinned(UserId(0), vec![app("x", 0), app("y", 0)]);
        harness
            .tasks
            .set_tasks(vec![task("y", 5, 0), task("y", 6, 0)]);
        let mut shelf = harness.shelf();
        block_on(shelf.attach()).expect("attach");

        shelf.activate(slot_of(&shelf, &app("x", 0))).expect("click x");
        shelf.activate(slot_of(&shelf, &app("y", 0))).expect("click y");
        harness.catalog.uninstall(&app("x", 0));
        shelf.activate(slot_of(&shelf, &app("x", 0))).expect("click gone x");

        assert_eq!(
            harness.launcher.take_requests(),
            vec![
                LaunchRequest::Launch(LaunchIntent {
                    component: app("x", 0).component,
                    user: UserId(0),
                }),
                LaunchRequest::ActivateTask(TaskId(5)),
                LaunchRequest::TaskMenu(app("y", 0), vec![TaskId(5), TaskId(6)]),
                LaunchRequest::NotFound(app("x", 0)),
            ]
        );
    }

    #[test]
    fn package_removal_unpins_only_unlaunchable_apps_of_that_user() {
        let harness = Harness::new();
        harness
            .catalog
            .install(app("mail", 0))
            .install(app("mail", 10))
            .install(app("maps", 0));
        harness.seed_pinned(
            UserId(0),
            vec![app("mail", 0), app("mail", 10), app("maps", 0)],
        );
        harness.tasks.set_tasks(vec![task("mail", 9, 0)]);
        let mut shelf = harness.shelf();
        block_on(shelf.attach()).expect("attach");

        harness.catalog.uninstall_package("com.example.mail", UserId(0));
        harness.tasks.set_tasks(vec![]);
        shelf.sender().send(ShelfEvent::PackageRemoved {
            package: "com.example.mail".to_string(),
            user: UserId(0),
        });
        assert_eq!(block_on(shelf.process_pending_events()), Ok(1));

        assert_eq!(
            apps_on(&shelf),
            vec![
                (app("mail", 10), true),
                (app("maps", 0), true),
                (app("mail", 0), false),
            ]
        );
        assert_eq!(
            harness.model.apps(),
            vec![app("mail", 10), app("maps", 0)]
        );
    }

    #[test]
    fn replacement_in_progress_does_not_unpin() {
        let harness = Harness::new();
        harness.seed_pinned(UserId(0), vec![app("mail", 0)]);
        let mut shelf = harness.shelf();
        block_on(shelf.attach()).expect("attach");

        shelf.sender().send(ShelfEvent::PackagesUnavailable {
            packages: vec!["com.example.mail".to_string()],
            user: UserId(0),
            replacing: true,
        });
        block_on(shelf.process_pending_events()).expect("events");

        assert_eq!(apps_on(&shelf), vec![(app("mail", 0), true)]);
    }

    #[test]
    fn managed_profile_removal_unpins_that_profile_and_forgets_its_list() {
        let harness = Harness::new();
        harness.seed_pinned(UserId(0), vec![app("mail", 0), app("mail", 10)]);
        harness.seed_pinned(UserId(10), vec![app("maps", 10)]);
        let mut shelf = harness.shelf();
        block_on(shelf.attach()).expect("attach");

        shelf
            .sender()
            .send(ShelfEvent::ManagedProfileRemoved { user: UserId(10) });
        block_on(shelf.process_pending_events()).expect("events");

        assert_eq!(apps_on(&shelf), vec![(app("mail", 0), true)]);
        assert_eq!(harness.store.stored_json(UserId(10)), None);
        assert!(harness.store.stored_json(UserId(0)).is_some());
    }

    #[test]
    fn user_switch_swaps_the_pinned_list() {
        let harness = Harness::new();
        harness.seed_pinned(UserId(0), vec![app("x", 0)]);
        harness.seed_pinned(UserId(10), vec![app("y", 10)]);
        let mut shelf = harness.shelf();
        block_on(shelf.attach()).expect("attach");

        shelf
            .sender()
            .send(ShelfEvent::UserSwitched { user: UserId(10) });
        block_on(shelf.process_pending_events()).expect("events");

        assert_eq!(harness.model.current_user(), UserId(10));
        assert_eq!(apps_on(&shelf), vec![(app("y", 10), true)]);
    }

    #[test]
    fn task_stack_change_event_refreshes_tasks() {
        let harness = Harness::new();
        harness.catalog.install(app("z", 0));
        let mut shelf = harness.shelf();
        block_on(shelf.attach()).expect("attach");
        assert!(shelf.snapshot().is_empty());

        harness.tasks.set_tasks(vec![task("z", 3, 0)]);
        let sender = shelf.sender();
        std::thread::spawn(move || sender.send(ShelfEvent::TaskStackChanged))
            .join()
            .expect("producer");
        block_on(shelf.process_pending_events()).expect("events");

        assert_eq!(apps_on(&shelf), vec![(app("z", 0), false)]);
    }

    #[test]
    fn user_switch_drops_running_apps_of_the_previous_user() {
        let harness = Harness::new();
        harness.catalog.install(app("z", 0));
        harness.tasks.set_tasks(vec![task("z", 1, 0)]);
        let mut shelf = harness.shelf();
        block_on(shelf.attach()).expect("attach");
        assert_eq!(apps_on(&shelf), vec![(app("z", 0), false)]);

        harness.tasks.set_tasks(vec![]);
        shelf
            .sender()
            .send(ShelfEvent::UserSwitched { user: UserId(10) });
        assert_eq!(block_on(shelf.process_pending_events()), Ok(1));

        assert_eq!(harness.model.current_user(), UserId(10));
        assert!(shelf.snapshot().is_empty());
    }

    struct FailingSaves(MemoryPinnedAppsStore);

    impl PinnedAppsStore for FailingSaves {
        fn load_pinned_apps(
            &self,
            user: UserId,
        ) -> PinnedAppsStoreFuture<'_, Result<Option<Value>, String>> {
            self.0.load_pinned_apps(user)
        }

        fn save_pinned_apps<'a>(
            &'a self,
            _user: UserId,
            _record: &'a Value,
        ) -> PinnedAppsStoreFuture<'a, Result<(), String>> {
            Box::pin(async { Err("disk full".to_string()) })
        }

        fn clear_pinned_apps(&self, user: UserId) -> PinnedAppsStoreFuture<'_, Result<(), String>> {
            self.0.clear_pinned_apps(user)
        }
    }

    #[test]
    fn user_switch_completes_when_the_pending_write_fails() {
        let harness = Harness::new();
        harness.catalog.install(app("x", 0));
        harness.seed_pinned(UserId(10), vec![app("y", 10)]);
        let host = ShelfHostContext::default()
            .with_app_catalog(harness.catalog.clone())
            .with_task_source(harness.tasks.clone())
            .with_pinned_apps_store(FailingSaves(harness.store.clone()));
        let mut shelf = ShelfRuntime::new(ShelfConfig::default(), host, harness.model.clone());
        block_on(shelf.attach()).expect("attach");

        let payload = DragPayload::for_app(app("x", 0).component, UserSerial(0));
        shelf
            .drag_started(DragOrigin::External, &payload)
            .expect("start");
        assert_eq!(shelf.drop(&payload), Ok(true));
        assert!(harness.model.has_pending_write());

        shelf
            .sender()
            .send(ShelfEvent::UserSwitched { user: UserId(10) });
        assert_eq!(
            block_on(shelf.process_pending_events()),
            Err("disk full".to_string())
        );

        assert_eq!(harness.model.current_user(), UserId(10));
        assert_eq!(apps_on(&shelf), vec![(app("y", 10), true)]);
        assert!(!harness.model.has_pending_write());
    }

    #[test]
    fn lifted_icon_dropped_with_unresolvable_payload_stays_where_it_was_moved() {
        let harness = Harness::new();
        harness.seed_pinned(UserId(0), vec![app("x", 0), app("y", 0)]);
        let mut shelf = harness.shelf();
        block_on(shelf.attach()).expect("attach");
        let (x, y) = (slot_of(&shelf, &app("x", 0)), slot_of(&shelf, &app("y", 0)));

        let payload = DragPayload::for_app(app("gone", 0).component, UserSerial(0));
        assert_eq!(shelf.drag_started(DragOrigin::ShelfIcon(x), &payload), Ok(true));
        shelf.drag_entered_slot(y).expect("enter y");
        assert_eq!(shelf.drop(&payload), Ok(true));

        assert_eq!(
            apps_on(&shelf),
            vec![(app("y", 0), true), (app("x", 0), true)]
        );
        assert!(shelf.drag().is_idle());
    }

    #[test]
    fn drop_without_a_running_drag_is_not_accepted() {
        let harness = Harness::new();
        harness.catalog.install(app("x", 0));
        let mut shelf = harness.shelf();
        block_on(shelf.attach()).expect("attach");

        let payload = DragPayload::for_app(app("x", 0).component, UserSerial(0));
        assert_eq!(shelf.drop(&payload), Ok(false));
        assert!(shelf.snapshot().is_empty());
    }

    #[test]
    fn lifted_icon_carries_the_serial_of_its_profile() {
        let harness = Harness::new();
        harness.catalog.install(app("w", 10));
        harness.seed_pinned(UserId(0), vec![app("w", 10), app("q", 11)]);
        let mut shelf = harness.shelf();
        block_on(shelf.attach()).expect("attach");
        let w = slot_of(&shelf, &app("w", 10));

        let payload = shelf.drag_payload(w).expect("payload for w");
        assert_eq!(
            payload,
            DragPayload::for_app(app("w", 10).component, UserSerial(27))
        );
        assert_eq!(shelf.drag_payload(slot_of(&shelf, &app("q", 11))), None);

        assert_eq!(shelf.drag_started(DragOrigin::ShelfIcon(w), &payload), Ok(true));
        assert_eq!(shelf.drop(&payload), Ok(true));
        assert_eq!(
            apps_on(&shelf),
            vec![(app("w", 10), true), (app("q", 11), true)]
        );
    }
}
