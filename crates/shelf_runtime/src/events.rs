//! Typed host notifications and the queue that carries them onto the mutation thread.
//!
//! Producers (task-stack listeners, package monitors, user broadcasts) may live on any thread.
//! They only hold a [`ShelfEventSender`]. The shelf owner drains the matching
//! [`ShelfEventReceiver`] between interactions so that no notification interleaves with a
//! reconciliation pass or a drag transition.

use futures::{
    channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender},
    FutureExt, StreamExt,
};
use serde::{Deserialize, Serialize};
use shelf_contract::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Notification delivered to a shelf by its host.
pub enum ShelfEvent {
    /// The recent-task list changed.
    TaskStackChanged,
    /// The foreground user changed.
    UserSwitched {
        /// New foreground user.
        user: UserId,
    },
    /// A managed profile was removed from the device.
    ManagedProfileRemoved {
        /// Removed profile.
        user: UserId,
    },
    /// A package was uninstalled.
    PackageRemoved {
        /// Package name.
        package: String,
        /// User the package was removed for.
        user: UserId,
    },
    /// A package's components changed.
    PackageModified {
        /// Package name.
        package: String,
        /// User the package belongs to.
        user: UserId,
    },
    /// Packages became available, for example after an update or an SD card mount.
    PackagesAvailable {
        /// Package names.
        packages: Vec<String>,
        /// User the packages belong to.
        user: UserId,
        /// Whether this is the second half of a package replacement.
        replacing: bool,
    },
    /// Packages became unavailable.
    PackagesUnavailable {
        /// Package names.
        packages: Vec<String>,
        /// User the packages belong to.
        user: UserId,
        /// Whether this is the first half of a package replacement.
        replacing: bool,
    },
}

impl ShelfEvent {
    /// Returns the packages whose pinned apps may have become unlaunchable.
    ///
    /// Availability changes only count once a replacement has finished installing, and
    /// unavailability only counts when the package is not about to come back.
    pub fn packages_to_recheck(&self) -> Option<(Vec<String>, UserId)> {
        match self {
            Self::PackageRemoved { package, user } | Self::PackageModified { package, user } => {
                Some((vec![package.clone()], *user))
            }
            Self::PackagesAvailable {
                packages,
                user,
                replacing: true,
            }
            | Self::PackagesUnavailable {
                packages,
                user,
                replacing: false,
            } => Some((packages.clone(), *user)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
/// Thread-safe producer half of the shelf event queue.
pub struct ShelfEventSender {
    tx: UnboundedSender<ShelfEvent>,
}

impl ShelfEventSender {
    /// Queues `event`. Returns `false` when the shelf has gone away.
    pub fn send(&self, event: ShelfEvent) -> bool {
        self.tx.unbounded_send(event).is_ok()
    }
}

#[derive(Debug)]
/// Consumer half of the shelf event queue, owned by the shelf runtime.
pub struct ShelfEventReceiver {
    rx: UnboundedReceiver<ShelfEvent>,
}

impl ShelfEventReceiver {
    /// Takes every event queued so far without waiting for more.
    pub fn drain_ready(&mut self) -> Vec<ShelfEvent> {
        let mut events = Vec::new();
        while let Some(Some(event)) = self.rx.next().now_or_never() {
            events.push(event);
        }
        events
    }
}

/// Creates a connected sender/receiver pair.
pub fn shelf_event_channel() -> (ShelfEventSender, ShelfEventReceiver) {
    let (tx, rx) = unbounded();
    (ShelfEventSender { tx }, ShelfEventReceiver { rx })
}
