//! Application identity resolution and user directory contracts.

use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet},
    rc::Rc,
};

use shelf_contract::{AppIdentity, ComponentName, LaunchIntent, UserId, UserSerial};

/// Decides whether an application identity is currently launchable.
pub trait IdentityResolver {
    /// Returns a launch intent for `app`, or `None` when the component is gone, disabled, or not
    /// exported to the launcher.
    fn build_launch_intent(&self, app: &AppIdentity) -> Option<LaunchIntent>;

    /// Returns the front-door launcher activity of `package` for `user`, if any.
    fn launch_component_for_package(&self, package: &str, user: UserId) -> Option<ComponentName>;
}

/// Maps between users and their device-stable serial numbers.
pub trait UserDirectory {
    /// Returns the user currently in the foreground.
    fn current_user(&self) -> UserId;

    /// Returns the serial for `user` when the user exists.
    fn serial_for_user(&self, user: UserId) -> Option<UserSerial>;

    /// Returns the user owning `serial` when it exists.
    fn user_for_serial(&self, serial: UserSerial) -> Option<UserId>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Catalog with no users and nothing launchable.
pub struct NoopAppCatalog;

impl IdentityResolver for NoopAppCatalog {
    fn build_launch_intent(&self, _app: &AppIdentity) -> Option<LaunchIntent> {
        None
    }

    fn launch_component_for_package(
        &self,
        _package: &str,
        _user: UserId,
    ) -> Option<ComponentName> {
        None
    }
}

impl UserDirectory for NoopAppCatalog {
    fn current_user(&self) -> UserId {
        UserId(0)
    }

    fn serial_for_user(&self, _user: UserId) -> Option<UserSerial> {
        None
    }

    fn user_for_serial(&self, _serial: UserSerial) -> Option<UserId> {
        None
    }
}

#[derive(Debug, Default)]
struct CatalogInner {
    launchable: BTreeSet<AppIdentity>,
    users: BTreeMap<UserId, UserSerial>,
    current_user: UserId,
}

#[derive(Debug, Clone, Default)]
/// In-memory catalog of installed launcher activities and known users.
///
/// Clones share state, so a test can keep a handle and uninstall packages while the runtime
/// holds another.
pub struct MemoryAppCatalog {
    inner: Rc<RefCell<CatalogInner>>,
}

impl MemoryAppCatalog {
    /// Registers `user` with `serial`.
    pub fn add_user(&self, user: UserId, serial: UserSerial) -> &Self {
        self.inner.borrow_mut().users.insert(user, serial);
        self
    }

    /// Removes `user` and every app installed for it.
    pub fn remove_user(&self, user: UserId) {
        let mut inner = self.inner.borrow_mut();
        inner.users.remove(&user);
        inner.launchable.retain(|app| app.user != user);
    }

    /// Switches the foreground user.
    pub fn set_current_user(&self, user: UserId) {
        self.inner.borrow_mut().current_user = user;
    }

    /// Makes `app` launchable.
    pub fn install(&self, app: AppIdentity) -> &Self {
        self.inner.borrow_mut().launchable.insert(app);
        self
    }

    /// Removes a single launcher activity.
    pub fn uninstall(&self, app: &AppIdentity) {
        self.inner.borrow_mut().launchable.remove(app);
    }

    /// Removes every launcher activity of `package` for `user`.
    pub fn uninstall_package(&self, package: &str, user: UserId) {
        self.inner
            .borrow_mut()
            .launchable
            .retain(|app| !(app.user == user && app.package() == package));
    }
}

impl IdentityResolver for MemoryAppCatalog {
    fn build_launch_intent(&self, app: &AppIdentity) -> Option<LaunchIntent> {
        self.inner
            .borrow()
            .launchable
            .contains(app)
            .then(|| LaunchIntent {
                component: app.component.clone(),
                user: app.user,
            })
    }

    fn launch_component_for_package(&self, package: &str, user: UserId) -> Option<ComponentName> {
        self.inner
            .borrow()
            .launchable
            .iter()
            .find(|app| app.user == user && app.package() == package)
            .map(|app| app.component.clone())
    }
}

impl UserDirectory for MemoryAppCatalog {
    fn current_user(&self) -> UserId {
        self.inner.borrow().current_user
    }

    fn serial_for_user(&self, user: UserId) -> Option<UserSerial> {
        self.inner.borrow().users.get(&user).copied()
    }

    fn user_for_serial(&self, serial: UserSerial) -> Option<UserId> {
        self.inner
            .borrow()
            .users
            .iter()
            .find(|(_, candidate)| **candidate == serial)
            .map(|(user, _)| *user)
    }
}
