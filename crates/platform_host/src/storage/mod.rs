//! Persistence contracts for shelf state shared across shelf instances.

pub mod pinned_apps;
