//! Shared identity and task types between the shelf runtime and its host collaborators.
//!
//! An application on the shelf is identified by the activity component that launches it plus the
//! user profile it runs under. Tasks reported by the host carry enough component data to derive
//! that identity again.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod payload;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use payload::{
    ClipDescription, ClipItem, DragPayload, PayloadError, ShortcutIntent, ACTION_MAIN,
    EXTRA_PROFILE, MIMETYPE_TEXT_INTENT,
};

/// Platform user or profile id. The default is the system user `0`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct UserId(pub i32);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Device-stable serial number of a user, used where a [`UserId`] may not survive transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserSerial(pub i64);

/// Fully qualified activity component: owning package plus activity class.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentName {
    package: String,
    class: String,
}

impl ComponentName {
    /// Creates a component from a package name and a fully qualified class name.
    pub fn new(package: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            class: class.into(),
        }
    }

    /// Returns the owning package name.
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Returns the fully qualified class name.
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Returns `package/class`, abbreviating the class to `.Suffix` when it lives inside the
    /// package namespace.
    pub fn flatten_to_short_string(&self) -> String {
        match self.class.strip_prefix(self.package.as_str()) {
            Some(rest) if rest.starts_with('.') => format!("{}/{}", self.package, rest),
            _ => format!("{}/{}", self.package, self.class),
        }
    }

    /// Parses the `package/class` or `package/.Suffix` forms.
    pub fn unflatten_from_string(raw: &str) -> Result<Self, String> {
        let Some((package, class)) = raw.split_once('/') else {
            return Err(format!("invalid component `{raw}`; expected `package/class`"));
        };
        if package.is_empty() || class.is_empty() || class == "." {
            return Err(format!("invalid component `{raw}`; empty package or class"));
        }
        let class = if class.starts_with('.') {
            format!("{package}{class}")
        } else {
            class.to_string()
        };
        Ok(Self::new(package, class))
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.flatten_to_short_string())
    }
}

/// Identity of a shelf application: launch component plus the user it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AppIdentity {
    /// Activity component used to launch the app.
    pub component: ComponentName,
    /// User profile the app runs under.
    pub user: UserId,
}

impl AppIdentity {
    /// Creates an identity from its parts.
    pub fn new(component: ComponentName, user: UserId) -> Self {
        Self { component, user }
    }

    /// Returns the owning package of the launch component.
    pub fn package(&self) -> &str {
        self.component.package()
    }
}

impl fmt::Display for AppIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.component, self.user)
    }
}

/// Opaque persistent identifier of a running or recent task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(pub i32);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Recent-task descriptor as reported by the host task source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentTask {
    /// Persistent task id used to bring the task back to front.
    pub task_id: TaskId,
    /// User the task runs under.
    pub user: UserId,
    /// Activity the task was originally started through when launched via an alias.
    pub orig_activity: Option<ComponentName>,
    /// First activity in the task.
    pub base_activity: Option<ComponentName>,
    /// Activity that started the task.
    pub real_activity: Option<ComponentName>,
    /// Component of the intent the task was created with.
    pub base_intent_component: Option<ComponentName>,
}

impl RecentTask {
    /// Creates a task whose base activity is `component`.
    pub fn new(task_id: TaskId, component: ComponentName, user: UserId) -> Self {
        Self {
            task_id,
            user,
            orig_activity: None,
            base_activity: Some(component),
            real_activity: None,
            base_intent_component: None,
        }
    }

    /// Returns the component that best represents this task.
    ///
    /// Precedence: the aliased original activity, then the base activity, then the activity that
    /// started the task, then the base intent's component.
    pub fn activity(&self) -> Option<&ComponentName> {
        self.orig_activity
            .as_ref()
            .or(self.base_activity.as_ref())
            .or(self.real_activity.as_ref())
            .or(self.base_intent_component.as_ref())
    }
}

/// Resolved launch request for an application the host knows how to start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchIntent {
    /// Activity to start.
    pub component: ComponentName,
    /// User to start it as.
    pub user: UserId,
}
