//! Host collaborator bundle consumed by the shelf runtime.

use std::rc::Rc;

use platform_host::{
    IdentityResolver, LaunchService, NoopAppCatalog, NoopLaunchService, NoopPinnedAppsStore,
    NoopTaskSource, PinnedAppsStore, TaskSource, UserDirectory,
};

#[derive(Clone)]
/// Host service bundle for shelf runtime side effects. Defaults to no-op adapters.
pub struct ShelfHostContext {
    resolver: Rc<dyn IdentityResolver>,
    users: Rc<dyn UserDirectory>,
    tasks: Rc<dyn TaskSource>,
    launcher: Rc<dyn LaunchService>,
    pinned_apps: Rc<dyn PinnedAppsStore>,
}

impl Default for ShelfHostContext {
    fn default() -> Self {
        Self {
            resolver: Rc::new(NoopAppCatalog),
            users: Rc::new(NoopAppCatalog),
            tasks: Rc::new(NoopTaskSource),
            launcher: Rc::new(NoopLaunchService),
            pinned_apps: Rc::new(NoopPinnedAppsStore),
        }
    }
}

impl ShelfHostContext {
    /// Uses one catalog as both identity resolver and user directory.
    pub fn with_app_catalog<C>(mut self, catalog: C) -> Self
    where
        C: IdentityResolver + UserDirectory + 'static,
    {
        let catalog = Rc::new(catalog);
        self.resolver = catalog.clone();
        self.users = catalog;
        self
    }

    /// Replaces the recent-task source.
    pub fn with_task_source(mut self, tasks: impl TaskSource + 'static) -> Self {
        self.tasks = Rc::new(tasks);
        self
    }

    /// Replaces the launch service.
    pub fn with_launch_service(mut self, launcher: impl LaunchService + 'static) -> Self {
        self.launcher = Rc::new(launcher);
        self
    }

    /// Replaces the pinned-list store.
    pub fn with_pinned_apps_store(mut self, store: impl PinnedAppsStore + 'static) -> Self {
        self.pinned_apps = Rc::new(store);
        self
    }

    /// Returns the configured identity resolver.
    pub fn resolver(&self) -> &dyn IdentityResolver {
        self.resolver.as_ref()
    }

    /// Returns the configured user directory.
    pub fn users(&self) -> &dyn UserDirectory {
        self.users.as_ref()
    }

    /// Returns the configured recent-task source.
    pub fn tasks(&self) -> &dyn TaskSource {
        self.tasks.as_ref()
    }

    /// Returns the configured launch service.
    pub fn launcher(&self) -> &dyn LaunchService {
        self.launcher.as_ref()
    }

    /// Returns the configured pinned-list store.
    pub fn pinned_apps_store(&self) -> &dyn PinnedAppsStore {
        self.pinned_apps.as_ref()
    }
}
