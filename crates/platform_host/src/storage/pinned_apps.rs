//! Per-user pinned-app list storage.
//!
//! Lists travel as JSON values. The store owns the byte format on disk but never interprets the
//! record, so schema upgrades stay with the runtime that defines it.

use std::{cell::RefCell, collections::BTreeMap, future::Future, pin::Pin, rc::Rc};

use serde_json::Value;
use shelf_contract::UserId;

/// Object-safe boxed future returned by [`PinnedAppsStore`].
pub type PinnedAppsStoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Device storage holding one pinned list per user, shared by every shelf instance.
pub trait PinnedAppsStore {
    /// Loads `user`'s stored list, `None` when nothing was saved yet.
    fn load_pinned_apps(
        &self,
        user: UserId,
    ) -> PinnedAppsStoreFuture<'_, Result<Option<Value>, String>>;

    /// Replaces `user`'s stored list.
    fn save_pinned_apps<'a>(
        &'a self,
        user: UserId,
        record: &'a Value,
    ) -> PinnedAppsStoreFuture<'a, Result<(), String>>;

    /// Forgets `user`'s list, for example when the profile is removed from the device.
    fn clear_pinned_apps(&self, user: UserId) -> PinnedAppsStoreFuture<'_, Result<(), String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Store that keeps nothing.
pub struct NoopPinnedAppsStore;

impl PinnedAppsStore for NoopPinnedAppsStore {
    fn load_pinned_apps(
        &self,
        _user: UserId,
    ) -> PinnedAppsStoreFuture<'_, Result<Option<Value>, String>> {
        Box::pin(async { Ok(None) })
    }

    fn save_pinned_apps<'a>(
        &'a self,
        _user: UserId,
        _record: &'a Value,
    ) -> PinnedAppsStoreFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }

    fn clear_pinned_apps(&self, _user: UserId) -> PinnedAppsStoreFuture<'_, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }
}

#[derive(Debug, Default)]
struct MemoryLists {
    by_user: BTreeMap<UserId, String>,
    saves: usize,
}

#[derive(Debug, Clone, Default)]
/// In-memory store keeping each list as JSON text. Clones share the same lists, like two
/// processes reading one settings file.
pub struct MemoryPinnedAppsStore {
    lists: Rc<RefCell<MemoryLists>>,
}

impl MemoryPinnedAppsStore {
    /// Returns the stored text of `user`'s list.
    pub fn stored_json(&self, user: UserId) -> Option<String> {
        self.lists.borrow().by_user.get(&user).cloned()
    }

    /// Stores `text` for `user` verbatim, bypassing encoding. Used to stage legacy or damaged
    /// lists.
    pub fn put_json(&self, user: UserId, text: impl Into<String>) {
        self.lists.borrow_mut().by_user.insert(user, text.into());
    }

    /// Number of successful saves since creation.
    pub fn save_count(&self) -> usize {
        self.lists.borrow().saves
    }
}

impl PinnedAppsStore for MemoryPinnedAppsStore {
    fn load_pinned_apps(
        &self,
        user: UserId,
    ) -> PinnedAppsStoreFuture<'_, Result<Option<Value>, String>> {
        Box::pin(async move {
            self.stored_json(user)
                .map(|text| serde_json::from_str(&text).map_err(|err| format!("{user}: {err}")))
                .transpose()
        })
    }

    fn save_pinned_apps<'a>(
        &'a self,
        user: UserId,
        record: &'a Value,
    ) -> PinnedAppsStoreFuture<'a, Result<(), String>> {
        Box::pin(async move {
            let text = serde_json::to_string(record).map_err(|err| err.to_string())?;
            let mut lists = self.lists.borrow_mut();
            lists.by_user.insert(user, text);
            lists.saves += 1;
            Ok(())
        })
    }

    fn clear_pinned_apps(&self, user: UserId) -> PinnedAppsStoreFuture<'_, Result<(), String>> {
        Box::pin(async move {
            self.lists.borrow_mut().by_user.remove(&user);
            Ok(())
        })
    }
}
