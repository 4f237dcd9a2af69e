//! Typed host contracts consumed by the shelf runtime, plus in-memory and no-op adapters.
//!
//! The shelf core never talks to the platform directly. Identity resolution, the recent-task
//! feed, app launching and pinned-list persistence all sit behind the traits in this crate so
//! the runtime can be driven headless in tests and embedded in any host.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod apps;
pub mod launch;
pub mod storage;
pub mod tasks;

pub use apps::{IdentityResolver, MemoryAppCatalog, NoopAppCatalog, UserDirectory};
pub use launch::{LaunchRequest, LaunchService, NoopLaunchService, RecordingLaunchService};
pub use storage::pinned_apps::{
    MemoryPinnedAppsStore, NoopPinnedAppsStore, PinnedAppsStore, PinnedAppsStoreFuture,
};
pub use tasks::{MemoryTaskSource, NoopTaskSource, TaskSource};
