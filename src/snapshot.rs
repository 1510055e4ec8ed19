//! Read-only projections of registry state.
//!
//! Snapshots are detached copies: mutating a returned snapshot never affects
//! the registry. They are the only representation of instance state that
//! leaves the shell actor.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::instance::{InstanceId, WindowInstance};
use crate::registry::Registry;

/// Serializable view of one window instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowSnapshot {
    pub id: InstanceId,
    pub kind: String,
    pub title: String,
    pub is_destroyed: bool,
    pub is_visible: bool,
    pub is_focused: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl WindowSnapshot {
    /// Projects a live instance.
    #[must_use]
    pub fn of(instance: &WindowInstance) -> Self {
        Self {
            id: instance.id,
            kind: instance.kind.clone(),
            title: instance.title.clone(),
            is_destroyed: false,
            is_visible: instance.visible,
            is_focused: instance.focused,
            data: instance.data.clone(),
        }
    }

    /// Projects an instance that has just been removed from the registry,
    /// for close responses.
    #[must_use]
    pub fn of_destroyed(instance: &WindowInstance) -> Self {
        Self {
            is_destroyed: true,
            is_visible: false,
            is_focused: false,
            ..Self::of(instance)
        }
    }
}

/// Snapshots of every live instance, in insertion order.
#[must_use]
pub fn project_all(registry: &Registry) -> Vec<WindowSnapshot> {
    registry.iter().map(WindowSnapshot::of).collect()
}

/// Snapshot of one instance by id.
#[must_use]
pub fn project_one(registry: &Registry, id: InstanceId) -> Option<WindowSnapshot> {
    registry.get(id).map(WindowSnapshot::of)
}
