//! Drag-and-drop payload codec for application launch shortcuts.
//!
//! A shortcut travels as a single clip item holding a MAIN intent for the app's launch component
//! with the user serial stored under [`EXTRA_PROFILE`]. Anything else is not accepted by the
//! shelf.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{ComponentName, UserSerial};

/// MIME type advertised by clips that carry an intent.
pub const MIMETYPE_TEXT_INTENT: &str = "text/vnd.android.intent";
/// Intent extra holding the user serial number of the shortcut's profile.
pub const EXTRA_PROFILE: &str = "profile";
/// Intent action used for launcher shortcuts.
pub const ACTION_MAIN: &str = "android.intent.action.MAIN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Description block of a clip: label plus advertised MIME types.
pub struct ClipDescription {
    /// User-visible clip label.
    pub label: String,
    /// MIME types of the clip items.
    pub mime_types: Vec<String>,
}

impl ClipDescription {
    /// Returns whether `mime_type` is advertised by this clip.
    pub fn has_mime_type(&self, mime_type: &str) -> bool {
        self.mime_types.iter().any(|candidate| candidate == mime_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Intent carried by a shortcut clip item.
pub struct ShortcutIntent {
    /// Intent action.
    pub action: String,
    /// Explicit target component.
    pub component: Option<ComponentName>,
    /// Intent extras.
    #[serde(default)]
    pub extras: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
/// One item inside a clip.
pub struct ClipItem {
    /// Intent payload when the item carries one.
    pub intent: Option<ShortcutIntent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
/// Platform drag-and-drop payload.
pub struct DragPayload {
    /// Clip description; poorly behaved sources may omit it.
    pub description: Option<ClipDescription>,
    /// Clip items.
    pub items: Vec<ClipItem>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Reasons a payload cannot be decoded into an application shortcut.
pub enum PayloadError {
    /// The clip has no description.
    #[error("drag payload has no clip description")]
    MissingDescription,
    /// The clip does not advertise the intent MIME type.
    #[error("drag payload does not carry an intent mime type")]
    UnsupportedMimeType,
    /// Shortcuts must be exactly one item.
    #[error("drag payload has {0} items; expected exactly one")]
    ItemCount(usize),
    /// The single item carries no intent.
    #[error("drag payload item has no intent")]
    MissingIntent,
    /// The intent has no usable profile serial.
    #[error("drag payload intent has no profile serial")]
    MissingProfile,
    /// The intent names no component.
    #[error("drag payload intent has no component")]
    MissingComponent,
    /// Transport-level JSON failure.
    #[error("malformed drag payload: {0}")]
    Malformed(String),
}

impl DragPayload {
    /// Encodes a launch shortcut for `component` owned by the user with `serial`.
    pub fn for_app(component: ComponentName, serial: UserSerial) -> Self {
        let mut extras = BTreeMap::new();
        extras.insert(EXTRA_PROFILE.to_string(), Value::from(serial.0));
        Self {
            description: Some(ClipDescription {
                label: String::new(),
                mime_types: vec![MIMETYPE_TEXT_INTENT.to_string()],
            }),
            items: vec![ClipItem {
                intent: Some(ShortcutIntent {
                    action: ACTION_MAIN.to_string(),
                    component: Some(component),
                    extras,
                }),
            }],
        }
    }

    /// Returns whether the payload looks like a shortcut the shelf can accept for a drop.
    pub fn accepts_shortcut(&self) -> bool {
        self.description
            .as_ref()
            .is_some_and(|description| description.has_mime_type(MIMETYPE_TEXT_INTENT))
    }

    /// Decodes the shortcut's launch component and user serial.
    ///
    /// # Errors
    ///
    /// Returns a [`PayloadError`] naming the first missing or invalid field.
    pub fn decode_shortcut(&self) -> Result<(ComponentName, UserSerial), PayloadError> {
        let description = self
            .description
            .as_ref()
            .ok_or(PayloadError::MissingDescription)?;
        if !description.has_mime_type(MIMETYPE_TEXT_INTENT) {
            return Err(PayloadError::UnsupportedMimeType);
        }
        let [item] = self.items.as_slice() else {
            return Err(PayloadError::ItemCount(self.items.len()));
        };
        let intent = item.intent.as_ref().ok_or(PayloadError::MissingIntent)?;
        let serial = intent
            .extras
            .get(EXTRA_PROFILE)
            .and_then(Value::as_i64)
            .filter(|serial| *serial != -1)
            .ok_or(PayloadError::MissingProfile)?;
        let component = intent
            .component
            .clone()
            .ok_or(PayloadError::MissingComponent)?;
        Ok((component, UserSerial(serial)))
    }

    /// Serializes the payload for platform transport.
    pub fn to_json(&self) -> Result<String, PayloadError> {
        serde_json::to_string(self).map_err(|e| PayloadError::Malformed(e.to_string()))
    }

    /// Parses a payload received from platform transport.
    pub fn from_json(raw: &str) -> Result<Self, PayloadError> {
        serde_json::from_str(raw).map_err(|e| PayloadError::Malformed(e.to_string()))
    }
}
