//! Pinned-app record format and schema migration.

use platform_host::PinnedAppsStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shelf_contract::{AppIdentity, ComponentName, UserId};
use tracing::warn;

/// Current pinned-app record schema.
pub const PINNED_APPS_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Persisted pinned list of one user.
pub struct PinnedAppsRecord {
    /// Record schema version.
    pub schema_version: u32,
    /// Owner of the list.
    pub user: UserId,
    /// Monotonic revision, bumped on every accepted change.
    pub revision: u64,
    /// Pinned apps in shelf order.
    pub apps: Vec<AppIdentity>,
}

impl PinnedAppsRecord {
    /// Creates an empty record for `user`.
    pub fn empty(user: UserId) -> Self {
        Self {
            schema_version: PINNED_APPS_SCHEMA_VERSION,
            user,
            revision: 0,
            apps: Vec::new(),
        }
    }
}

fn migrate_pinned_apps(
    schema_version: u32,
    user: UserId,
    value: Value,
) -> Result<PinnedAppsRecord, String> {
    match schema_version {
        0 => {
            let flattened: Vec<String> =
                serde_json::from_value(value).map_err(|e| e.to_string())?;
            let apps = flattened
                .iter()
                .filter_map(|raw| match ComponentName::unflatten_from_string(raw) {
                    Ok(component) => Some(AppIdentity::new(component, user)),
                    Err(err) => {
                        warn!("dropping unreadable pinned app: {err}");
                        None
                    }
                })
                .collect();
            Ok(PinnedAppsRecord {
                schema_version: PINNED_APPS_SCHEMA_VERSION,
                user,
                revision: 0,
                apps,
            })
        }
        PINNED_APPS_SCHEMA_VERSION => serde_json::from_value(value).map_err(|e| e.to_string()),
        newer => Err(format!(
            "pinned apps schema {newer} is newer than supported {PINNED_APPS_SCHEMA_VERSION}"
        )),
    }
}

/// Decodes a stored value, upgrading older schemas.
///
/// Schema 0 is a bare array of flattened component strings belonging to `user`.
pub fn decode_pinned_apps(user: UserId, value: Value) -> Result<PinnedAppsRecord, String> {
    let schema_version = match &value {
        Value::Array(_) => 0,
        Value::Object(map) => map
            .get("schema_version")
            .and_then(Value::as_u64)
            .and_then(|version| u32::try_from(version).ok())
            .ok_or_else(|| "pinned apps record has no schema_version".to_string())?,
        _ => return Err("pinned apps record is neither a list nor an object".to_string()),
    };
    migrate_pinned_apps(schema_version, user, value)
}

/// Loads `user`'s pinned list, returning an empty record when nothing is stored yet.
///
/// # Errors
///
/// Returns an error when the store fails or the stored value cannot be decoded.
pub async fn load_pinned_apps(
    store: &dyn PinnedAppsStore,
    user: UserId,
) -> Result<PinnedAppsRecord, String> {
    match store.load_pinned_apps(user).await? {
        Some(value) => decode_pinned_apps(user, value),
        None => Ok(PinnedAppsRecord::empty(user)),
    }
}

/// Saves a pinned list for its owner.
///
/// # Errors
///
/// Returns an error when serialization or the store save fails.
pub async fn save_pinned_apps(
    store: &dyn PinnedAppsStore,
    record: &PinnedAppsRecord,
) -> Result<(), String> {
    let value = serde_json::to_value(record).map_err(|e| e.to_string())?;
    store.save_pinned_apps(record.user, &value).await
}
