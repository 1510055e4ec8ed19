//! Live window instances.
//!
//! A [`WindowInstance`] is the registry's record of one addressable window.
//! Instances are created only through the shell's open path and mutated only
//! on the shell actor task.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;

use crate::descriptor::WindowDescriptor;
use crate::geometry::Rect;

/// Process-unique window instance identifier.
///
/// Ids are assigned monotonically by the registry and never reused while the
/// process is alive, even after the instance is destroyed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct InstanceId(u64);

impl InstanceId {
    #[must_use]
    pub const fn new(raw: u64) -> Self { Self(raw) }

    #[must_use]
    pub const fn raw(self) -> u64 { self.0 }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Outcome of a close-with-result rendezvous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "value", rename_all = "camelCase")]
pub enum CloseOutcome {
    /// The window closed and supplied a result value.
    Resolved(Value),
    /// The window closed without a result, or the shell shut down while the
    /// rendezvous was still pending.
    Unresolved,
}

/// Materialization sub-state of an instance.
///
/// A newly opened instance is registered immediately so concurrent opens for
/// a singleton kind observe it, but its platform surface may still be under
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfacePhase {
    /// The platform surface is being created; data pushes are buffered.
    Materializing,
    /// The surface is attached to the control channel.
    Ready,
}

/// One live, addressable window.
#[derive(Debug)]
pub struct WindowInstance {
    pub id: InstanceId,
    pub kind: String,
    pub title: String,
    pub created_at: Instant,
    /// The instance that spawned this one, when parenting was requested.
    pub parent: Option<InstanceId>,
    /// Set once the parent is destroyed; the child itself stays alive.
    pub parent_orphaned: bool,
    pub frame: Rect,
    /// Current associated payload. Last write wins; no merge semantics.
    pub data: Option<Value>,
    pub visible: bool,
    pub focused: bool,
    pub minimized: bool,
    pub maximized: bool,
    pub phase: SurfacePhase,
    /// Rendezvous slot installed when the creator asked to wait for a close
    /// result. Consumed by the first resolution.
    pub(crate) result_slot: Option<oneshot::Sender<CloseOutcome>>,
    /// Latest payload awaiting delivery while the surface materializes.
    pub(crate) pending_data: Option<Value>,
}

impl WindowInstance {
    /// Creates a registry record for a window that is about to materialize.
    #[must_use]
    pub fn new(
        id: InstanceId,
        descriptor: &WindowDescriptor,
        frame: Rect,
        parent: Option<InstanceId>,
    ) -> Self {
        Self {
            id,
            kind: descriptor.kind.clone(),
            title: descriptor.title.clone(),
            created_at: Instant::now(),
            parent,
            parent_orphaned: false,
            frame,
            data: None,
            visible: false,
            focused: false,
            minimized: false,
            maximized: false,
            phase: SurfacePhase::Materializing,
            result_slot: None,
            pending_data: None,
        }
    }

    #[must_use]
    pub const fn is_ready(&self) -> bool { matches!(self.phase, SurfacePhase::Ready) }

    pub(crate) const fn mark_ready(&mut self) { self.phase = SurfacePhase::Ready; }

    /// Installs the close-with-result rendezvous and returns the receiver the
    /// creator will await. No-op returning `None` if a slot is already
    /// pending; only one rendezvous per instance is accepted.
    pub(crate) fn install_result_slot(&mut self) -> Option<oneshot::Receiver<CloseOutcome>> {
        if self.result_slot.is_some() {
            log::debug!("instance {}: result slot already pending, not replacing", self.id);
            return None;
        }
        let (tx, rx) = oneshot::channel();
        self.result_slot = Some(tx);
        Some(rx)
    }

    #[must_use]
    pub const fn has_pending_result(&self) -> bool { self.result_slot.is_some() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::WindowDescriptor;

    fn instance() -> WindowInstance {
        let descriptor = WindowDescriptor::new("settings", "Settings");
        WindowInstance::new(InstanceId::new(1), &descriptor, Rect::default(), None)
    }

    #[test]
    fn new_instance_starts_materializing() {
        let inst = instance();
        assert!(!inst.is_ready());
        assert!(!inst.visible);
        assert!(!inst.has_pending_result());
        assert_eq!(inst.kind, "settings");
    }

    #[test]
    fn result_slot_installed_once() {
        let mut inst = instance();
        let first = inst.install_result_slot();
        assert!(first.is_some());
        assert!(inst.has_pending_result());

        // A second rendezvous is refused while one is pending.
        assert!(inst.install_result_slot().is_none());
    }

    #[tokio::test]
    async fn result_slot_resolves_receiver() {
        let mut inst = instance();
        let rx = inst.install_result_slot().unwrap();
        let tx = inst.result_slot.take().unwrap();
        tx.send(CloseOutcome::Resolved(serde_json::json!({"saved": true})))
            .unwrap();
        let outcome = rx.await.unwrap();
        assert_eq!(
            outcome,
            CloseOutcome::Resolved(serde_json::json!({"saved": true}))
        );
    }

    #[test]
    fn instance_id_display_and_raw() {
        let id = InstanceId::new(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(id.raw(), 42);
    }

    #[test]
    fn close_outcome_serializes_tagged() {
        let json = serde_json::to_string(&CloseOutcome::Unresolved).unwrap();
        assert!(json.contains("unresolved"));
        let json =
            serde_json::to_string(&CloseOutcome::Resolved(serde_json::json!(1))).unwrap();
        assert!(json.contains("resolved"));
    }
}
