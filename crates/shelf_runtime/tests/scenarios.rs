//! End-to-end shelf scenarios driven through the public runtime API.

use futures::executor::block_on;
use platform_host::{
    MemoryAppCatalog, MemoryPinnedAppsStore, MemoryTaskSource, NoopTaskSource,
    RecordingLaunchService,
};
use pretty_assertions::assert_eq;
use shelf_contract::{
    AppIdentity, ComponentName, DragPayload, RecentTask, TaskId, UserId, UserSerial,
};
use shelf_runtime::{
    reconcile_tasks, reduce_shelf, DragMove, DragOrigin, DragSession, EntryStore,
    PinnedAppsModel, ResolvedTask, ShelfAction, ShelfConfig, ShelfHostContext, ShelfRuntime,
};

fn app(name: &str) -> AppIdentity {
    AppIdentity::new(
        ComponentName::new(format!("com.example.{name}"), format!("com.example.{name}.Main")),
        UserId(0),
    )
}

fn task(name: &str, id: i32) -> RecentTask {
    RecentTask::new(TaskId(id), app(name).component, UserId(0))
}

fn resolved(name: &str, id: i32) -> ResolvedTask {
    ResolvedTask {
        app: app(name),
        task: task(name, id),
    }
}

fn layout(store: &EntryStore) -> Vec<(Option<AppIdentity>, bool, Vec<TaskId>)> {
    store
        .slots()
        .iter()
        .map(|slot| match slot.entry() {
            Some(entry) => (Some(entry.app().clone()), entry.pinned, entry.task_ids()),
            None => (None, false, Vec::new()),
        })
        .collect()
}

fn id_of(store: &EntryStore, name: &str) -> shelf_runtime::SlotId {
    store.find_by_app(&app(name)).expect("slot").id
}

#[test]
fn task_for_pinned_app_attaches_without_reordering() {
    let mut store = EntryStore::from_pinned([app("x"), app("y")]);

    reconcile_tasks(&mut store, vec![resolved("y", 1)]);

    assert_eq!(
        layout(&store),
        vec![
            (Some(app("x")), true, vec![]),
            (Some(app("y")), true, vec![TaskId(1)]),
        ]
    );
}

#[test]
fn unpinned_app_leaves_when_its_last_task_ends() {
    let mut store = EntryStore::from_pinned([app("x")]);
    reconcile_tasks(&mut store, vec![resolved("z", 1)]);
    assert_eq!(store.len(), 2);

    let report = reconcile_tasks(&mut store, Vec::new());

    assert_eq!(report.removed, vec![app("z")]);
    assert_eq!(layout(&store), vec![(Some(app("x")), true, vec![])]);
}

#[test]
fn pinned_icon_cannot_be_dragged_into_the_running_block() {
    let mut store = EntryStore::from_pinned([app("x"), app("y")]);
    reconcile_tasks(&mut store, vec![resolved("z", 1)]);
    let before = layout(&store);
    let mut drag = DragSession::default();
    let (y, z) = (id_of(&store, "y"), id_of(&store, "z"));

    assert_eq!(drag.start(&mut store, DragOrigin::ShelfIcon(y), true), Ok(true));
    assert_eq!(drag.enter_slot(&mut store, z), DragMove::Rejected);
    assert_eq!(drag.enter_end(&mut store), DragMove::Ignored);
    assert!(store.partition_violation().is_none());

    assert!(!drag.finish(&mut store));
    assert_eq!(layout(&store), before);
}

#[test]
fn external_drop_at_the_end_pins_after_existing_apps() {
    let mut store = EntryStore::from_pinned([app("x")]);
    let mut drag = DragSession::default();

    reduce_shelf(
        &mut store,
        &mut drag,
        ShelfAction::DragStarted {
            origin: DragOrigin::External,
            accepts_payload: true,
        },
    )
    .expect("start");
    assert_eq!(
        drag.enter_end(&mut store),
        DragMove::PlaceholderCreated { index: 1 }
    );
    assert!(store.slots()[1].is_placeholder());

    reduce_shelf(
        &mut store,
        &mut drag,
        ShelfAction::Drop {
            app: Some(app("w")),
        },
    )
    .expect("drop");

    assert!(drag.is_idle());
    assert_eq!(
        layout(&store),
        vec![
            (Some(app("x")), true, vec![]),
            (Some(app("w")), true, vec![]),
        ]
    );
}

#[test]
fn running_icon_cannot_be_dragged_into_the_pinned_block() {
    let mut store = EntryStore::from_pinned([app("x")]);
    reconcile_tasks(&mut store, vec![resolved("z", 1), resolved("v", 2)]);
    let mut drag = DragSession::default();
    let (x, z, v) = (id_of(&store, "x"), id_of(&store, "z"), id_of(&store, "v"));

    drag.start(&mut store, DragOrigin::ShelfIcon(v), true)
        .expect("start");
    assert_eq!(drag.enter_slot(&mut store, x), DragMove::Rejected);
    assert_eq!(drag.enter_slot(&mut store, z), DragMove::Moved { from: 2, to: 1 });
    assert!(store.partition_violation().is_none());

    drag.exit(&mut store);
    assert!(store.slot(v).expect("v").visible);
    assert!(!drag.finish(&mut store));
}

#[test]
fn cancelled_external_drag_leaves_no_placeholder() {
    let mut store = EntryStore::from_pinned([app("x"), app("y")]);
    let mut drag = DragSession::default();
    let y = id_of(&store, "y");

    drag.start(&mut store, DragOrigin::External, true)
        .expect("start");
    drag.enter_slot(&mut store, y);
    assert_eq!(store.len(), 3);

    reduce_shelf(&mut store, &mut drag, ShelfAction::DragEnded).expect("end");

    assert!(drag.is_idle());
    assert_eq!(store.len(), 2);
    assert!(store.slots().iter().all(|slot| slot.visible));
}

struct Device {
    catalog: MemoryAppCatalog,
    tasks: MemoryTaskSource,
    store: MemoryPinnedAppsStore,
    model: PinnedAppsModel,
}

impl Device {
    fn new() -> Self {
        let catalog = MemoryAppCatalog::default();
        catalog.add_user(UserId(0), UserSerial(0));
        for name in ["x", "y", "z", "w"] {
            catalog.install(app(name));
        }
        Self {
            catalog,
            tasks: MemoryTaskSource::default(),
            store: MemoryPinnedAppsStore::default(),
            model: PinnedAppsModel::from_config(&ShelfConfig::default()),
        }
    }

    fn shelf(&self) -> ShelfRuntime {
        let host = ShelfHostContext::default()
            .with_app_catalog(self.catalog.clone())
            .with_task_source(self.tasks.clone())
            .with_launch_service(RecordingLaunchService::default())
            .with_pinned_apps_store(self.store.clone());
        let mut shelf = ShelfRuntime::new(ShelfConfig::default(), host, self.model.clone());
        block_on(shelf.attach()).expect("attach");
        shelf
    }
}

fn pinned_on(shelf: &ShelfRuntime) -> Vec<AppIdentity> {
    shelf.store().pinned_subset()
}

#[test]
fn reorder_on_one_shelf_reaches_the_other_and_survives_restart() {
    let device = Device::new();
    device.tasks.set_tasks(vec![task("z", 4)]);
    let mut left = device.shelf();
    let mut right = device.shelf();

    let z = left.store().find_by_app(&app("z")).expect("z").id;
    left.pin(z).expect("pin z");
    let payload = DragPayload::for_app(app("x").component, UserSerial(0));
    left.drag_started(DragOrigin::External, &payload)
        .expect("start");
    left.drag_entered_slot(z).expect("enter z");
    assert_eq!(left.drop(&payload), Ok(true));
    assert_eq!(pinned_on(&left), vec![app("x"), app("z")]);

    block_on(right.process_pending_events()).expect("sync");
    assert_eq!(pinned_on(&right), vec![app("x"), app("z")]);
    assert_eq!(block_on(left.flush_pinned_apps()), Ok(true));
    assert!(device.store.stored_json(UserId(0)).is_some());

    let restarted_model = PinnedAppsModel::from_config(&ShelfConfig::default());
    let host = ShelfHostContext::default()
        .with_app_catalog(device.catalog.clone())
        .with_task_source(NoopTaskSource)
        .with_pinned_apps_store(device.store.clone());
    let mut restarted = ShelfRuntime::new(ShelfConfig::default(), host, restarted_model);
    block_on(restarted.attach()).expect("attach after restart");
    assert_eq!(pinned_on(&restarted), vec![app("x"), app("z")]);
}

#[test]
fn dragging_a_running_app_onto_the_pinned_block_pins_it_with_its_tasks() {
    let device = Device::new();
    device.catalog.install(app("v"));
    device.tasks.set_tasks(vec![task("v", 8)]);
    let mut shelf = device.shelf();
    assert!(shelf.store().find_by_app(&app("v")).is_some());

    let payload = DragPayload::for_app(app("v").component, UserSerial(0));
    shelf
        .drag_started(DragOrigin::External, &payload)
        .expect("start");
    shelf.drag_entered_end().expect("enter end");
    assert_eq!(shelf.drop(&payload), Ok(true));

    assert_eq!(
        layout(shelf.store()),
        vec![(Some(app("v")), true, vec![TaskId(8)])]
    );
    assert_eq!(device.model.apps(), vec![app("v")]);
}

#[test]
fn unlaunchable_drop_is_rejected_without_changes() {
    let device = Device::new();
    let mut shelf = device.shelf();
    let payload = DragPayload::for_app(app("gone").component, UserSerial(0));

    assert_eq!(shelf.drag_started(DragOrigin::External, &payload), Ok(true));
    shelf.drag_entered_end().expect("enter end");
    assert_eq!(shelf.drop(&payload), Ok(false));

    assert!(shelf.snapshot().is_empty());
    assert!(device.model.apps().is_empty());
    assert!(!device.model.has_pending_write());
}

#[test]
fn lifting_a_pinned_icon_reorders_it_on_every_shelf() {
    let device = Device::new();
    let mut left = device.shelf();
    let mut right = device.shelf();
    for name in ["x", "y"] {
        let payload = DragPayload::for_app(app(name).component, UserSerial(0));
        left.drag_started(DragOrigin::External, &payload)
            .expect("start");
        left.drag_entered_end().expect("enter end");
        assert_eq!(left.drop(&payload), Ok(true));
    }
    assert_eq!(pinned_on(&left), vec![app("x"), app("y")]);

    let x = left.store().find_by_app(&app("x")).expect("x").id;
    let y = left.store().find_by_app(&app("y")).expect("y").id;
    let payload = left.drag_payload(x).expect("payload");
    assert_eq!(left.drag_started(DragOrigin::ShelfIcon(x), &payload), Ok(true));
    left.drag_entered_slot(y).expect("enter y");
    assert_eq!(left.drop(&payload), Ok(true));

    assert_eq!(pinned_on(&left), vec![app("y"), app("x")]);
    block_on(right.process_pending_events()).expect("sync");
    assert_eq!(pinned_on(&right), vec![app("y"), app("x")]);
}
