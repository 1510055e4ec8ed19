//! The platform surface seam.
//!
//! The shell core never talks to a rendering layer directly. Everything
//! platform-facing goes through [`SurfaceBackend`]: materializing a surface,
//! pushing `data` events to it, and one-way state changes. Materialization is
//! the only long-running operation in the system, so it returns a boxed
//! future that the shell drives off the actor task.
//!
//! [`NullBackend`] is a headless implementation that records every call. It
//! backs the test suite and any embedding that realizes the window contract
//! without a separate process (e.g. an in-page navigation variant).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::geometry::Rect;
use crate::instance::InstanceId;

/// Platform-level surface construction failure.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct SurfaceError(pub String);

/// Everything a backend needs to materialize one surface.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceSpec {
    pub instance: InstanceId,
    pub kind: String,
    pub title: String,
    pub frame: Rect,
    pub resizable: bool,
    pub modal: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<InstanceId>,
    /// Raw platform options from the descriptor, passed through unchanged.
    pub platform_options: Value,
}

/// Interface to the rendering layer.
///
/// All methods except [`SurfaceBackend::materialize`] are fire-and-forget
/// from the shell's perspective; delivery to a surface is best-effort.
pub trait SurfaceBackend: Send + Sync + 'static {
    /// Creates the underlying platform surface. The returned future may
    /// suspend; the shell keeps the instance in the materializing phase until
    /// it completes.
    fn materialize(&self, spec: SurfaceSpec) -> BoxFuture<'static, Result<(), SurfaceError>>;

    /// Pushes the instance's current payload to its surface.
    fn push_data(&self, instance: InstanceId, payload: &Value);

    /// Tears down the platform surface of a destroyed instance.
    fn destroy(&self, instance: InstanceId);

    fn set_minimized(&self, instance: InstanceId, minimized: bool);

    fn set_maximized(&self, instance: InstanceId, maximized: bool);
}

/// Headless recording backend.
#[derive(Debug, Default)]
pub struct NullBackend {
    state: Mutex<NullBackendState>,
}

#[derive(Debug, Default)]
struct NullBackendState {
    materialized: Vec<SurfaceSpec>,
    pushed: HashMap<InstanceId, Vec<Value>>,
    destroyed: Vec<InstanceId>,
    fail_kinds: Vec<String>,
    latency: Option<Duration>,
}

impl NullBackend {
    #[must_use]
    pub fn new() -> Arc<Self> { Arc::new(Self::default()) }

    /// Makes materialization fail for the given kind, for failure-path tests.
    pub fn fail_kind(&self, kind: impl Into<String>) {
        self.state.lock().fail_kinds.push(kind.into());
    }

    /// Delays every materialization, to widen the materializing window.
    pub fn set_latency(&self, latency: Duration) {
        self.state.lock().latency = Some(latency);
    }

    /// Kinds materialized so far, in order.
    #[must_use]
    pub fn materialized_kinds(&self) -> Vec<String> {
        self.state.lock().materialized.iter().map(|s| s.kind.clone()).collect()
    }

    /// Every payload pushed to an instance, in delivery order.
    #[must_use]
    pub fn pushed(&self, instance: InstanceId) -> Vec<Value> {
        self.state.lock().pushed.get(&instance).cloned().unwrap_or_default()
    }

    /// The most recent payload pushed to an instance.
    #[must_use]
    pub fn last_push(&self, instance: InstanceId) -> Option<Value> {
        self.state.lock().pushed.get(&instance).and_then(|v| v.last().cloned())
    }

    #[must_use]
    pub fn destroyed(&self) -> Vec<InstanceId> { self.state.lock().destroyed.clone() }
}

impl SurfaceBackend for NullBackend {
    fn materialize(&self, spec: SurfaceSpec) -> BoxFuture<'static, Result<(), SurfaceError>> {
        let (latency, fail) = {
            let mut state = self.state.lock();
            let fail = state.fail_kinds.contains(&spec.kind);
            if !fail {
                state.materialized.push(spec.clone());
            }
            (state.latency, fail)
        };
        let kind = spec.kind;
        Box::pin(async move {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
            if fail {
                return Err(SurfaceError(format!("refused to materialize kind '{kind}'")));
            }
            Ok(())
        })
    }

    fn push_data(&self, instance: InstanceId, payload: &Value) {
        self.state.lock().pushed.entry(instance).or_default().push(payload.clone());
    }

    fn destroy(&self, instance: InstanceId) {
        self.state.lock().destroyed.push(instance);
    }

    fn set_minimized(&self, instance: InstanceId, minimized: bool) {
        log::trace!("null backend: instance {instance} minimized={minimized}");
    }

    fn set_maximized(&self, instance: InstanceId, maximized: bool) {
        log::trace!("null backend: instance {instance} maximized={maximized}");
    }
}
