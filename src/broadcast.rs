//! Data-synchronization broadcaster.
//!
//! Pushes `data` events carrying an instance's current payload to that
//! instance's UI surface, and resolves close-with-result rendezvous slots.
//!
//! Delivery policy: buffer-and-flush. While a surface is still materializing
//! the newest payload is held in the instance's pending-data buffer and
//! delivered as one push when the surface attaches. Intermediate payloads may
//! be superseded, the most recent one never is; `get_data` serves the latest
//! payload at all times regardless of delivery.

use std::sync::Arc;

use serde_json::Value;

use crate::instance::{CloseOutcome, WindowInstance};
use crate::surface::SurfaceBackend;

pub struct Broadcaster {
    backend: Arc<dyn SurfaceBackend>,
}

impl Broadcaster {
    #[must_use]
    pub fn new(backend: Arc<dyn SurfaceBackend>) -> Self { Self { backend } }

    /// Records `payload` as the instance's current data (last write wins) and
    /// delivers it: pushed immediately when the surface is attached, buffered
    /// otherwise.
    pub fn push_data(&self, instance: &mut WindowInstance, payload: Value) {
        instance.data = Some(payload.clone());
        if instance.is_ready() {
            self.backend.push_data(instance.id, &payload);
            instance.pending_data = None;
        } else {
            log::trace!(
                "instance {} still materializing, buffering data push",
                instance.id
            );
            instance.pending_data = Some(payload);
        }
    }

    /// Flushes the buffered payload once the surface has attached.
    pub fn flush(&self, instance: &mut WindowInstance) {
        if let Some(payload) = instance.pending_data.take() {
            self.backend.push_data(instance.id, &payload);
        }
    }

    /// Resolves the instance's close rendezvous, if one is pending. Only the
    /// first resolution is delivered; the slot is consumed by it.
    pub fn resolve_close(&self, instance: &mut WindowInstance, outcome: CloseOutcome) {
        if let Some(slot) = instance.result_slot.take()
            && slot.send(outcome).is_err()
        {
            log::debug!("instance {}: close result receiver dropped", instance.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::WindowDescriptor;
    use crate::geometry::Rect;
    use crate::instance::InstanceId;
    use crate::surface::NullBackend;

    fn setup() -> (Arc<NullBackend>, Broadcaster, WindowInstance) {
        let backend = NullBackend::new();
        let broadcaster = Broadcaster::new(backend.clone());
        let descriptor = WindowDescriptor::new("settings", "Settings");
        let instance =
            WindowInstance::new(InstanceId::new(1), &descriptor, Rect::default(), None);
        (backend, broadcaster, instance)
    }

    #[test]
    fn push_to_ready_surface_delivers_immediately() {
        let (backend, broadcaster, mut instance) = setup();
        instance.mark_ready();

        broadcaster.push_data(&mut instance, serde_json::json!({"tab": "general"}));
        assert_eq!(
            backend.last_push(instance.id),
            Some(serde_json::json!({"tab": "general"}))
        );
        assert_eq!(instance.data, Some(serde_json::json!({"tab": "general"})));
    }

    #[test]
    fn push_while_materializing_buffers_latest_only() {
        let (backend, broadcaster, mut instance) = setup();

        broadcaster.push_data(&mut instance, serde_json::json!({"tab": "general"}));
        broadcaster.push_data(&mut instance, serde_json::json!({"tab": "advanced"}));
        assert!(backend.pushed(instance.id).is_empty());

        instance.mark_ready();
        broadcaster.flush(&mut instance);

        // Only the most recent payload is delivered, and exactly once.
        assert_eq!(backend.pushed(instance.id).len(), 1);
        assert_eq!(
            backend.last_push(instance.id),
            Some(serde_json::json!({"tab": "advanced"}))
        );
    }

    #[test]
    fn flush_without_pending_data_is_a_no_op() {
        let (backend, broadcaster, mut instance) = setup();
        instance.mark_ready();
        broadcaster.flush(&mut instance);
        assert!(backend.pushed(instance.id).is_empty());
    }

    #[tokio::test]
    async fn resolve_close_delivers_once() {
        let (_backend, broadcaster, mut instance) = setup();
        let rx = instance.install_result_slot().unwrap();

        broadcaster.resolve_close(&mut instance, CloseOutcome::Resolved(serde_json::json!(1)));
        // Second resolution finds the slot consumed and is a no-op.
        broadcaster.resolve_close(&mut instance, CloseOutcome::Unresolved);

        assert_eq!(rx.await.unwrap(), CloseOutcome::Resolved(serde_json::json!(1)));
        assert!(!instance.has_pending_result());
    }
}
