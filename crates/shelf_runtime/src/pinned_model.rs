//! Process-wide pinned list shared by every shelf instance.
//!
//! One [`PinnedAppsModel`] exists per application lifetime and is cloned into each shelf. Shelves
//! hold a [`PinnedAppsSubscription`] and drain it on their mutation thread. Writes are buffered
//! until [`PinnedAppsModel::flush`] stores them.

use std::{
    cell::RefCell,
    collections::BTreeMap,
    rc::{Rc, Weak},
};

use platform_host::PinnedAppsStore;
use shelf_contract::{AppIdentity, UserId};
use tracing::{info, warn};

use crate::{
    config::ShelfConfig,
    persistence::{load_pinned_apps, save_pinned_apps, PinnedAppsRecord},
};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Notification that the shared pinned list changed.
pub struct PinnedAppsChanged {
    /// Owner of the list.
    pub user: UserId,
    /// New pinned list in shelf order.
    pub apps: Vec<AppIdentity>,
    /// Model revision after the change.
    pub revision: u64,
}

#[derive(Debug)]
struct ModelInner {
    max_inbox_events: usize,
    current_user: UserId,
    apps: Vec<AppIdentity>,
    revision: u64,
    dirty: bool,
    loaded: bool,
    next_subscriber: u64,
    inboxes: BTreeMap<u64, Vec<PinnedAppsChanged>>,
}

impl ModelInner {
    fn publish(&mut self, skip: Option<u64>) {
        let event = PinnedAppsChanged {
            user: self.current_user,
            apps: self.apps.clone(),
            revision: self.revision,
        };
        let max_inbox_events = self.max_inbox_events;
        for (id, inbox) in self.inboxes.iter_mut() {
            if Some(*id) == skip {
                continue;
            }
            inbox.push(event.clone());
            if inbox.len() > max_inbox_events {
                let overflow = inbox.len() - max_inbox_events;
                inbox.drain(0..overflow);
            }
        }
    }

    fn record(&self) -> PinnedAppsRecord {
        PinnedAppsRecord {
            revision: self.revision,
            apps: self.apps.clone(),
            ..PinnedAppsRecord::empty(self.current_user)
        }
    }
}

#[derive(Debug, Clone)]
/// Shared handle to the pinned list of the current user.
pub struct PinnedAppsModel {
    inner: Rc<RefCell<ModelInner>>,
}

impl PinnedAppsModel {
    /// Creates an empty model for user `0`.
    pub fn new(max_inbox_events: usize) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ModelInner {
                max_inbox_events: max_inbox_events.max(1),
                current_user: UserId::default(),
                apps: Vec::new(),
                revision: 0,
                dirty: false,
                loaded: false,
                next_subscriber: 0,
                inboxes: BTreeMap::new(),
            })),
        }
    }

    /// Creates an empty model using the inbox bound from `config`.
    pub fn from_config(config: &ShelfConfig) -> Self {
        Self::new(config.max_inbox_events)
    }

    /// Returns the user whose list is loaded.
    pub fn current_user(&self) -> UserId {
        self.inner.borrow().current_user
    }

    /// Returns the pinned list.
    pub fn apps(&self) -> Vec<AppIdentity> {
        self.inner.borrow().apps.clone()
    }

    /// Returns the revision of the pinned list.
    pub fn revision(&self) -> u64 {
        self.inner.borrow().revision
    }

    /// Returns whether a change is waiting for [`PinnedAppsModel::flush`].
    pub fn has_pending_write(&self) -> bool {
        self.inner.borrow().dirty
    }

    /// Registers a new listener.
    pub fn subscribe(&self) -> PinnedAppsSubscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_subscriber;
        inner.next_subscriber += 1;
        inner.inboxes.insert(id, Vec::new());
        PinnedAppsSubscription {
            id,
            model: Rc::downgrade(&self.inner),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().inboxes.len()
    }

    /// Replaces the pinned list on behalf of `source` and notifies every other subscriber.
    ///
    /// Returns `false` when `apps` equals the current list.
    pub fn set_apps(
        &self,
        source: Option<&PinnedAppsSubscription>,
        apps: Vec<AppIdentity>,
    ) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.apps == apps {
            return false;
        }
        inner.apps = apps;
        inner.revision += 1;
        inner.dirty = true;
        inner.publish(source.map(|subscription| subscription.id));
        true
    }

    /// Loads `user`'s list and makes it current, notifying every subscriber. A pending write of
    /// the previous user is flushed first.
    ///
    /// # Errors
    ///
    /// Returns the first error of the pending write or the load. The switch happens either way:
    /// a failed write drops the previous user's unsaved change and a failed load leaves the new
    /// user with an empty list.
    pub async fn switch_user(
        &self,
        store: &dyn PinnedAppsStore,
        user: UserId,
    ) -> Result<(), String> {
        let flushed = self.flush(store).await;
        if let Err(err) = &flushed {
            let previous = self.current_user();
            warn!("dropping unsaved pinned apps of user {previous}: {err}");
        }
        let loaded = load_pinned_apps(store, user).await;

        let mut inner = self.inner.borrow_mut();
        let load_result = match loaded {
            Ok(record) => {
                inner.apps = record.apps;
                inner.revision = record.revision;
                inner.loaded = true;
                Ok(())
            }
            Err(err) => {
                warn!("pinned apps load failed for user {user}: {err}");
                inner.apps = Vec::new();
                inner.revision = 0;
                Err(err)
            }
        };
        inner.current_user = user;
        inner.dirty = false;
        info!(%user, pinned = inner.apps.len(), "pinned apps loaded");
        inner.publish(None);
        flushed.and(load_result)
    }

    /// Loads `user`'s list unless it is already the current one. Returns whether a load
    /// happened.
    ///
    /// # Errors
    ///
    /// Same as [`PinnedAppsModel::switch_user`].
    pub async fn ensure_loaded(
        &self,
        store: &dyn PinnedAppsStore,
        user: UserId,
    ) -> Result<bool, String> {
        {
            let inner = self.inner.borrow();
            if inner.loaded && inner.current_user == user {
                return Ok(false);
            }
        }
        self.switch_user(store, user).await.map(|()| true)
    }

    /// Stores the pending change, if any. Returns whether a write happened.
    ///
    /// # Errors
    ///
    /// Returns the store error; the change stays pending.
    pub async fn flush(&self, store: &dyn PinnedAppsStore) -> Result<bool, String> {
        let record = {
            let inner = self.inner.borrow();
            if !inner.dirty {
                return Ok(false);
            }
            inner.record()
        };
        save_pinned_apps(store, &record).await?;

        let mut inner = self.inner.borrow_mut();
        if inner.revision == record.revision && inner.current_user == record.user {
            inner.dirty = false;
        }
        info!(user = %record.user, revision = record.revision, "pinned apps saved");
        Ok(true)
    }
}

#[derive(Debug)]
/// A listener registration. Dropping it unsubscribes.
pub struct PinnedAppsSubscription {
    id: u64,
    model: Weak<RefCell<ModelInner>>,
}

impl PinnedAppsSubscription {
    /// Returns the subscriber id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Takes the queued notifications, oldest first.
    pub fn drain(&self) -> Vec<PinnedAppsChanged> {
        let Some(model) = self.model.upgrade() else {
            return Vec::new();
        };
        let mut inner = model.borrow_mut();
        let drained = inner.inboxes.get_mut(&self.id).map(std::mem::take);
        drained.unwrap_or_default()
    }
}

impl Drop for PinnedAppsSubscription {
    fn drop(&mut self) {
        if let Some(model) = self.model.upgrade() {
            if let Ok(mut inner) = model.try_borrow_mut() {
                inner.inboxes.remove(&self.id);
            }
        }
    }
}
