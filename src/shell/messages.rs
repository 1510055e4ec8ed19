//! Message types for the shell actor.
//!
//! All communication with the actor happens through messages:
//! - [`ShellMessage`] - requests and internal events sent to the actor
//! - [`ShellQuery`] / [`QueryResult`] - registry reads with a response channel
//! - [`SurfaceNotice`] - lifecycle events originating from a UI surface

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::ShellError;
use crate::geometry::GeometryOverride;
use crate::instance::{CloseOutcome, InstanceId};
use crate::snapshot::WindowSnapshot;
use crate::surface::SurfaceError;

/// Options supplied with an open request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OpenOptions {
    /// Initial (or refreshed, for lazy singletons) data payload.
    pub data: Option<Value>,
    /// Geometry overrides merged over descriptor defaults.
    pub geometry: GeometryOverride,
    /// The instance issuing the request; becomes the parent when the
    /// descriptor asks for one.
    pub parent: Option<InstanceId>,
    /// Install a close-with-result rendezvous: the open reply carries a
    /// future resolved when the instance later closes.
    pub wait_for_result: bool,
}

impl OpenOptions {
    #[must_use]
    pub fn with_data(data: Value) -> Self {
        Self { data: Some(data), ..Self::default() }
    }

    #[must_use]
    pub fn parent(mut self, parent: InstanceId) -> Self {
        self.parent = Some(parent);
        self
    }

    #[must_use]
    pub const fn wait_for_result(mut self) -> Self {
        self.wait_for_result = true;
        self
    }
}

/// Reply to a successful open.
#[derive(Debug)]
pub struct OpenReply {
    pub snapshot: WindowSnapshot,
    /// Present when the request asked to wait for a close result and the
    /// rendezvous slot was installed on this call.
    pub close_result: Option<oneshot::Receiver<CloseOutcome>>,
}

impl OpenReply {
    #[must_use]
    pub const fn id(&self) -> InstanceId { self.snapshot.id }

    /// Awaits the close-with-result rendezvous. Resolves to
    /// [`CloseOutcome::Unresolved`] when no rendezvous was installed or the
    /// shell went away before resolving it.
    pub async fn wait_close(self) -> CloseOutcome {
        match self.close_result {
            Some(rx) => rx.await.unwrap_or(CloseOutcome::Unresolved),
            None => CloseOutcome::Unresolved,
        }
    }
}

/// Lifecycle events relayed from a UI surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceNotice {
    FocusChanged(bool),
    VisibilityChanged(bool),
    MinimizedChanged(bool),
    /// The platform surface closed on its own, optionally supplying a close
    /// result.
    Closed { result: Option<Value> },
}

/// Messages sent to the shell actor.
#[derive(Debug)]
pub enum ShellMessage {
    /// Open a window of a kind. `wait` distinguishes `create` (respond once
    /// the surface is materialized) from `create-async` (respond as soon as
    /// the instance is registered).
    Open {
        kind: String,
        options: OpenOptions,
        wait: bool,
        respond_to: oneshot::Sender<Result<OpenReply, ShellError>>,
    },

    /// Destroy an instance, resolving a pending rendezvous with `result`.
    Close {
        id: InstanceId,
        result: Option<Value>,
        respond_to: oneshot::Sender<Result<(), ShellError>>,
    },

    Minimize {
        id: InstanceId,
        respond_to: oneshot::Sender<Result<(), ShellError>>,
    },

    ToggleMaximize {
        id: InstanceId,
        respond_to: oneshot::Sender<Result<(), ShellError>>,
    },

    /// Synchronous snapshot read of an instance's current payload.
    GetData {
        id: InstanceId,
        respond_to: oneshot::Sender<Result<Option<Value>, ShellError>>,
    },

    /// Last-write-wins payload update followed by a `data` broadcast to the
    /// instance's own surface.
    UpdateData {
        id: InstanceId,
        payload: Value,
        respond_to: oneshot::Sender<Result<(), ShellError>>,
    },

    /// Lifecycle event relayed from an instance's UI surface.
    SurfaceEvent { id: InstanceId, notice: SurfaceNotice },

    /// Execute a registry query and send the result back.
    Query {
        query: ShellQuery,
        respond_to: oneshot::Sender<QueryResult>,
    },

    /// Internal: a spawned materialization completed.
    Materialized {
        id: InstanceId,
        result: Result<(), SurfaceError>,
    },

    /// Shut down, resolving every pending rendezvous as unresolved.
    Shutdown,
}

impl ShellMessage {
    /// Human-readable message name for logging and panic recovery.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Open { .. } => "Open",
            Self::Close { .. } => "Close",
            Self::Minimize { .. } => "Minimize",
            Self::ToggleMaximize { .. } => "ToggleMaximize",
            Self::GetData { .. } => "GetData",
            Self::UpdateData { .. } => "UpdateData",
            Self::SurfaceEvent { .. } => "SurfaceEvent",
            Self::Query { .. } => "Query",
            Self::Materialized { .. } => "Materialized",
            Self::Shutdown => "Shutdown",
        }
    }
}

/// Registry reads.
#[derive(Debug, Clone)]
pub enum ShellQuery {
    GetAll,
    GetById { id: InstanceId },
    Count { kind: String },
    CountByKind,
}

/// Query responses.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Snapshots(Vec<WindowSnapshot>),
    Snapshot(Option<WindowSnapshot>),
    Count(usize),
    Counts(BTreeMap<String, usize>),
}

impl QueryResult {
    #[must_use]
    pub fn into_snapshots(self) -> Option<Vec<WindowSnapshot>> {
        match self {
            Self::Snapshots(snapshots) => Some(snapshots),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_snapshot(self) -> Option<Option<WindowSnapshot>> {
        match self {
            Self::Snapshot(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_count(self) -> Option<usize> {
        match self {
            Self::Count(count) => Some(count),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_counts(self) -> Option<BTreeMap<String, usize>> {
        match self {
            Self::Counts(counts) => Some(counts),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_names() {
        assert_eq!(ShellMessage::Shutdown.name(), "Shutdown");
        let (tx, _rx) = oneshot::channel();
        let msg = ShellMessage::GetData { id: InstanceId::new(1), respond_to: tx };
        assert_eq!(msg.name(), "GetData");
    }

    #[test]
    fn open_options_builders() {
        let options = OpenOptions::with_data(serde_json::json!({"tab": "general"}))
            .parent(InstanceId::new(2))
            .wait_for_result();
        assert!(options.wait_for_result);
        assert_eq!(options.parent, Some(InstanceId::new(2)));
        assert!(options.data.is_some());
    }

    #[test]
    fn open_options_deserialize_with_defaults() {
        let options: OpenOptions = serde_json::from_str("{}").unwrap();
        assert!(!options.wait_for_result);
        assert!(options.data.is_none());

        let options: OpenOptions = serde_json::from_str(
            r#"{"data": {"tab": "advanced"}, "waitForResult": true, "geometry": {"width": 320.0}}"#,
        )
        .unwrap();
        assert!(options.wait_for_result);
        assert_eq!(options.geometry.width, Some(320.0));
    }

    #[test]
    fn query_result_conversions() {
        assert_eq!(QueryResult::Count(3).into_count(), Some(3));
        assert!(QueryResult::Count(3).into_snapshots().is_none());
        assert!(QueryResult::Snapshots(vec![]).into_snapshots().is_some());
        assert!(QueryResult::Snapshot(None).into_snapshot().is_some());
    }

    #[tokio::test]
    async fn open_reply_without_rendezvous_resolves_unresolved() {
        let snapshot = WindowSnapshot {
            id: InstanceId::new(1),
            kind: "main".to_string(),
            title: "Main".to_string(),
            is_destroyed: false,
            is_visible: true,
            is_focused: false,
            data: None,
        };
        let reply = OpenReply { snapshot, close_result: None };
        assert_eq!(reply.wait_close().await, CloseOutcome::Unresolved);
    }
}
