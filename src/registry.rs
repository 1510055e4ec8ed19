//! The in-memory instance registry.
//!
//! Authoritative map from instance id to live window state. Single-writer
//! discipline: the shell actor is the only component that inserts or removes;
//! everything else reads through snapshots. Backed by a Vec so per-kind
//! listings come back in insertion order.

use std::collections::BTreeMap;

use crate::instance::{InstanceId, WindowInstance};

#[derive(Debug, Default)]
pub struct Registry {
    windows: Vec<WindowInstance>,
    next_id: u64,
}

impl Registry {
    #[must_use]
    pub const fn new() -> Self {
        Self { windows: Vec::new(), next_id: 0 }
    }

    /// Allocates the next instance id. Ids are monotone and never reused,
    /// including after the instance they were assigned to is destroyed.
    pub const fn allocate_id(&mut self) -> InstanceId {
        self.next_id += 1;
        InstanceId::new(self.next_id)
    }

    /// Registers a new instance. Only the shell's open path calls this.
    pub fn insert(&mut self, instance: WindowInstance) {
        debug_assert!(
            self.get(instance.id).is_none(),
            "duplicate instance id {}",
            instance.id
        );
        self.windows.push(instance);
    }

    #[must_use]
    pub fn get(&self, id: InstanceId) -> Option<&WindowInstance> {
        self.windows.iter().find(|w| w.id == id)
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut WindowInstance> {
        self.windows.iter_mut().find(|w| w.id == id)
    }

    /// Removes and returns an instance. The id stays burned.
    pub fn remove(&mut self, id: InstanceId) -> Option<WindowInstance> {
        let idx = self.windows.iter().position(|w| w.id == id)?;
        Some(self.windows.remove(idx))
    }

    /// Live instances of a kind, in insertion order.
    pub fn list_by_kind<'a>(
        &'a self,
        kind: &'a str,
    ) -> impl Iterator<Item = &'a WindowInstance> {
        self.windows.iter().filter(move |w| w.kind == kind)
    }

    /// First live instance of a kind, if any. Singleton lookup.
    #[must_use]
    pub fn first_of_kind(&self, kind: &str) -> Option<&WindowInstance> {
        self.windows.iter().find(|w| w.kind == kind)
    }

    #[must_use]
    pub fn count_by_kind(&self, kind: &str) -> usize {
        self.windows.iter().filter(|w| w.kind == kind).count()
    }

    /// Per-kind live counts for every kind with at least one instance.
    #[must_use]
    pub fn counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for window in &self.windows {
            *counts.entry(window.kind.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Marks every child of a destroyed parent as orphaned. The children
    /// themselves stay alive. Returns how many were affected.
    pub fn orphan_children_of(&mut self, parent: InstanceId) -> usize {
        let mut orphaned = 0;
        for window in &mut self.windows {
            if window.parent == Some(parent) && !window.parent_orphaned {
                window.parent_orphaned = true;
                orphaned += 1;
            }
        }
        orphaned
    }

    pub fn iter(&self) -> impl Iterator<Item = &WindowInstance> { self.windows.iter() }

    #[must_use]
    pub fn len(&self) -> usize { self.windows.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.windows.is_empty() }

    /// Removes every instance, for shutdown teardown.
    pub fn drain(&mut self) -> Vec<WindowInstance> { std::mem::take(&mut self.windows) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::WindowDescriptor;
    use crate::geometry::Rect;

    fn make(registry: &mut Registry, kind: &str) -> InstanceId {
        let descriptor = WindowDescriptor::new(kind, kind);
        let id = registry.allocate_id();
        registry.insert(WindowInstance::new(id, &descriptor, Rect::default(), None));
        id
    }

    #[test]
    fn insert_get_remove() {
        let mut registry = Registry::new();
        let id = make(&mut registry, "main");
        assert!(registry.get(id).is_some());
        assert_eq!(registry.len(), 1);

        let removed = registry.remove(id).unwrap();
        assert_eq!(removed.id, id);
        assert!(registry.get(id).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn ids_are_monotone_and_never_reused() {
        let mut registry = Registry::new();
        let first = make(&mut registry, "main");
        registry.remove(first);
        let second = make(&mut registry, "main");
        assert!(second > first);
    }

    #[test]
    fn list_by_kind_preserves_insertion_order() {
        let mut registry = Registry::new();
        let a = make(&mut registry, "dashboard");
        make(&mut registry, "settings");
        let b = make(&mut registry, "dashboard");
        let c = make(&mut registry, "dashboard");

        let ids: Vec<InstanceId> = registry.list_by_kind("dashboard").map(|w| w.id).collect();
        assert_eq!(ids, vec![a, b, c]);
    }

    #[test]
    fn counts_by_kind() {
        let mut registry = Registry::new();
        make(&mut registry, "dashboard");
        make(&mut registry, "dashboard");
        let closed = make(&mut registry, "dashboard");
        make(&mut registry, "settings");
        registry.remove(closed);

        assert_eq!(registry.count_by_kind("dashboard"), 2);
        assert_eq!(registry.count_by_kind("settings"), 1);
        assert_eq!(registry.count_by_kind("missing"), 0);

        let counts = registry.counts();
        assert_eq!(counts.get("dashboard"), Some(&2));
        assert_eq!(counts.get("settings"), Some(&1));
    }

    #[test]
    fn orphaning_marks_children_without_removing_them() {
        let mut registry = Registry::new();
        let parent = make(&mut registry, "main");

        let descriptor = WindowDescriptor::new("dialog", "Dialog");
        let child_id = registry.allocate_id();
        registry.insert(WindowInstance::new(
            child_id,
            &descriptor,
            Rect::default(),
            Some(parent),
        ));

        registry.remove(parent);
        assert_eq!(registry.orphan_children_of(parent), 1);

        let child = registry.get(child_id).unwrap();
        assert!(child.parent_orphaned);
        assert_eq!(child.parent, Some(parent));
    }

    #[test]
    fn drain_empties_the_registry() {
        let mut registry = Registry::new();
        make(&mut registry, "main");
        make(&mut registry, "settings");
        let drained = registry.drain();
        assert_eq!(drained.len(), 2);
        assert!(registry.is_empty());
    }
}
