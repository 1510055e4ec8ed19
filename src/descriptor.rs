//! Static per-kind window configuration.
//!
//! A [`WindowDescriptor`] declares the instantiation policy, default geometry
//! and opaque platform options for one window kind. Descriptors are pure
//! data: they carry no behavior and the table is read-only once the shell is
//! running. Tables can be declared in code or loaded from JSON.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geometry::Size;

/// Cap on live instances for a non-singleton kind.
///
/// Serializes as `null` for unbounded or a number for a finite cap, so a JSON
/// descriptor can simply omit the field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InstanceLimit {
    #[default]
    Unbounded,
    Max(u32),
}

impl InstanceLimit {
    /// Returns the finite cap, if any.
    #[must_use]
    pub const fn cap(self) -> Option<u32> {
        match self {
            Self::Unbounded => None,
            Self::Max(limit) => Some(limit),
        }
    }
}

/// Declarative configuration for one window kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowDescriptor {
    /// Kind identifier, unique within a table.
    pub kind: String,
    /// Human-readable window title.
    #[serde(default)]
    pub title: String,
    /// At most one live instance of this kind.
    #[serde(default)]
    pub singleton: bool,
    /// Cap on live instances for non-singleton kinds.
    #[serde(default)]
    pub max_instances: InstanceLimit,
    /// Deferred creation: the surface is created on first open and reused
    /// (with a data refresh) on subsequent opens instead of being recreated.
    #[serde(default)]
    pub lazy: bool,
    /// The window is modal to its parent.
    #[serde(default)]
    pub modal: bool,
    /// The window must be attached to the window that spawned it.
    #[serde(default)]
    pub set_parent: bool,
    /// Center the window relative to its parent (or the screen).
    #[serde(default)]
    pub move_center: bool,
    /// Whether the window can be resized by the user.
    #[serde(default = "default_resizable")]
    pub resizable: bool,
    #[serde(default = "default_width")]
    pub default_width: f64,
    #[serde(default = "default_height")]
    pub default_height: f64,
    /// Raw platform creation options, passed through to the surface backend
    /// unchanged.
    #[serde(default)]
    pub platform_options: serde_json::Value,
}

const fn default_resizable() -> bool { true }
const fn default_width() -> f64 { 800.0 }
const fn default_height() -> f64 { 600.0 }

impl WindowDescriptor {
    /// Creates a descriptor with default policy (non-singleton, unbounded,
    /// eager, resizable, 800x600).
    #[must_use]
    pub fn new(kind: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            title: title.into(),
            singleton: false,
            max_instances: InstanceLimit::Unbounded,
            lazy: false,
            modal: false,
            set_parent: false,
            move_center: false,
            resizable: default_resizable(),
            default_width: default_width(),
            default_height: default_height(),
            platform_options: serde_json::Value::Null,
        }
    }

    /// Whether instances of this kind must reference a parent window.
    #[must_use]
    pub const fn requires_parent(&self) -> bool { self.modal || self.set_parent }

    /// Default size from the descriptor geometry.
    #[must_use]
    pub const fn default_size(&self) -> Size {
        Size::new(self.default_width, self.default_height)
    }
}

/// Lookup table from kind identifier to descriptor.
///
/// Built before the shell spawns; read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct DescriptorTable {
    descriptors: HashMap<String, WindowDescriptor>,
}

impl DescriptorTable {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Registers a descriptor, replacing (and warning about) a previous one
    /// for the same kind.
    pub fn register(&mut self, descriptor: WindowDescriptor) {
        if self.descriptors.insert(descriptor.kind.clone(), descriptor.clone()).is_some() {
            log::warn!("descriptor for kind '{}' replaced", descriptor.kind);
        }
    }

    #[must_use]
    pub fn get(&self, kind: &str) -> Option<&WindowDescriptor> { self.descriptors.get(kind) }

    #[must_use]
    pub fn contains(&self, kind: &str) -> bool { self.descriptors.contains_key(kind) }

    #[must_use]
    pub fn len(&self) -> usize { self.descriptors.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.descriptors.is_empty() }

    /// Parses a table from a JSON array of descriptors.
    ///
    /// # Errors
    ///
    /// Returns the underlying parse error if the JSON is malformed.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let descriptors: Vec<WindowDescriptor> = serde_json::from_str(json)?;
        let mut table = Self::new();
        for descriptor in descriptors {
            table.register(descriptor);
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_descriptor_has_default_policy() {
        let desc = WindowDescriptor::new("main", "Main Window");
        assert!(!desc.singleton);
        assert!(!desc.lazy);
        assert!(desc.resizable);
        assert_eq!(desc.max_instances, InstanceLimit::Unbounded);
        assert!((desc.default_width - 800.0).abs() < f64::EPSILON);
    }

    #[test]
    fn requires_parent_for_modal_or_set_parent() {
        let mut desc = WindowDescriptor::new("confirm", "Confirm");
        assert!(!desc.requires_parent());
        desc.modal = true;
        assert!(desc.requires_parent());
        desc.modal = false;
        desc.set_parent = true;
        assert!(desc.requires_parent());
    }

    #[test]
    fn instance_limit_cap() {
        assert_eq!(InstanceLimit::Unbounded.cap(), None);
        assert_eq!(InstanceLimit::Max(3).cap(), Some(3));
    }

    #[test]
    fn table_lookup_and_replace() {
        let mut table = DescriptorTable::new();
        table.register(WindowDescriptor::new("settings", "Settings"));
        assert!(table.contains("settings"));
        assert!(table.get("unknown").is_none());

        let mut replacement = WindowDescriptor::new("settings", "Preferences");
        replacement.singleton = true;
        table.register(replacement);
        assert_eq!(table.len(), 1);
        assert!(table.get("settings").unwrap().singleton);
    }

    #[test]
    fn descriptor_parses_from_json_with_defaults() {
        let json = r#"[
            {"kind": "settings", "title": "Settings", "singleton": true, "lazy": true},
            {"kind": "dashboard", "maxInstances": 4, "moveCenter": true}
        ]"#;
        let table = DescriptorTable::from_json_str(json).unwrap();
        assert_eq!(table.len(), 2);

        let settings = table.get("settings").unwrap();
        assert!(settings.singleton);
        assert!(settings.lazy);
        assert!(settings.resizable);

        let dashboard = table.get("dashboard").unwrap();
        assert_eq!(dashboard.max_instances, InstanceLimit::Max(4));
        assert!(dashboard.move_center);
        assert!((dashboard.default_height - 600.0).abs() < f64::EPSILON);
    }

    #[test]
    fn instance_limit_roundtrips_as_number_or_null() {
        assert_eq!(serde_json::to_string(&InstanceLimit::Max(2)).unwrap(), "2");
        assert_eq!(serde_json::to_string(&InstanceLimit::Unbounded).unwrap(), "null");
        let parsed: InstanceLimit = serde_json::from_str("5").unwrap();
        assert_eq!(parsed, InstanceLimit::Max(5));
        let parsed: InstanceLimit = serde_json::from_str("null").unwrap();
        assert_eq!(parsed, InstanceLimit::Unbounded);
    }

    #[test]
    fn platform_options_pass_through_unchanged() {
        let json = r#"[{"kind": "main", "platformOptions": {"titleBarStyle": "hidden"}}]"#;
        let table = DescriptorTable::from_json_str(json).unwrap();
        let options = &table.get("main").unwrap().platform_options;
        assert_eq!(options["titleBarStyle"], "hidden");
    }
}
