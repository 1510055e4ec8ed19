//! Handle for communicating with the shell actor.
//!
//! [`ShellHandle`] is the typed, in-process side of the control channel: a
//! cheap-to-clone mailbox sender with one async method per channel operation.
//! Channel failures fold into [`ShellError::ChannelClosed`] so callers have a
//! single error type for the whole contract.

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use super::messages::{
    OpenOptions, OpenReply, QueryResult, ShellMessage, ShellQuery, SurfaceNotice,
};
use crate::error::ShellError;
use crate::instance::InstanceId;
use crate::snapshot::WindowSnapshot;

/// Handle to a running shell actor. Cheap to clone, shareable across tasks.
#[derive(Clone)]
pub struct ShellHandle {
    sender: mpsc::Sender<ShellMessage>,
}

impl ShellHandle {
    pub(crate) const fn new(sender: mpsc::Sender<ShellMessage>) -> Self { Self { sender } }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T, ShellError>>) -> ShellMessage,
    ) -> Result<T, ShellError> {
        let (tx, rx) = oneshot::channel();
        self.sender.send(make(tx)).await.map_err(|_| ShellError::ChannelClosed)?;
        rx.await.map_err(|_| ShellError::ChannelClosed)?
    }

    /// Opens a window of `kind`, waiting for its surface to materialize.
    ///
    /// # Errors
    ///
    /// Returns the factory's typed failure, or [`ShellError::ChannelClosed`]
    /// if the shell is not running.
    pub async fn open(&self, kind: &str, options: OpenOptions) -> Result<OpenReply, ShellError> {
        let kind = kind.to_string();
        self.request(|respond_to| ShellMessage::Open { kind, options, wait: true, respond_to })
            .await
    }

    /// Opens a window of `kind`, returning as soon as the instance is
    /// registered while materialization proceeds in the background.
    ///
    /// # Errors
    ///
    /// Same failures as [`Self::open`], except materialization errors which
    /// surface later through the instance disappearing from the registry.
    pub async fn open_async(
        &self,
        kind: &str,
        options: OpenOptions,
    ) -> Result<OpenReply, ShellError> {
        let kind = kind.to_string();
        self.request(|respond_to| ShellMessage::Open { kind, options, wait: false, respond_to })
            .await
    }

    /// Destroys an instance. There is exactly one close path: a pending
    /// close-with-result rendezvous resolves with `result` when supplied.
    ///
    /// # Errors
    ///
    /// [`ShellError::UnknownInstance`] if the id was never created or is
    /// already destroyed.
    pub async fn close(
        &self,
        id: InstanceId,
        result: Option<Value>,
    ) -> Result<(), ShellError> {
        self.request(|respond_to| ShellMessage::Close { id, result, respond_to }).await
    }

    /// # Errors
    ///
    /// [`ShellError::UnknownInstance`] for a destroyed or unknown id.
    pub async fn minimize(&self, id: InstanceId) -> Result<(), ShellError> {
        self.request(|respond_to| ShellMessage::Minimize { id, respond_to }).await
    }

    /// # Errors
    ///
    /// [`ShellError::UnknownInstance`] for a destroyed or unknown id.
    pub async fn toggle_maximize(&self, id: InstanceId) -> Result<(), ShellError> {
        self.request(|respond_to| ShellMessage::ToggleMaximize { id, respond_to }).await
    }

    /// Snapshot read of an instance's current data payload.
    ///
    /// # Errors
    ///
    /// [`ShellError::UnknownInstance`] for a destroyed or unknown id.
    pub async fn get_data(&self, id: InstanceId) -> Result<Option<Value>, ShellError> {
        self.request(|respond_to| ShellMessage::GetData { id, respond_to }).await
    }

    /// Last-write-wins payload update; the new payload is broadcast back to
    /// the instance's own surface.
    ///
    /// # Errors
    ///
    /// [`ShellError::UnknownInstance`] for a destroyed or unknown id.
    pub async fn update_data(&self, id: InstanceId, payload: Value) -> Result<(), ShellError> {
        self.request(|respond_to| ShellMessage::UpdateData { id, payload, respond_to }).await
    }

    /// Executes a registry query.
    ///
    /// # Errors
    ///
    /// [`ShellError::ChannelClosed`] if the shell is not running.
    pub async fn query(&self, query: ShellQuery) -> Result<QueryResult, ShellError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ShellMessage::Query { query, respond_to: tx })
            .await
            .map_err(|_| ShellError::ChannelClosed)?;
        rx.await.map_err(|_| ShellError::ChannelClosed)
    }

    /// Executes a registry query with a deadline.
    ///
    /// # Errors
    ///
    /// [`ShellError::ChannelClosed`] if the shell is not running or the
    /// deadline passes.
    pub async fn query_timeout(
        &self,
        query: ShellQuery,
        timeout: Duration,
    ) -> Result<QueryResult, ShellError> {
        tokio::time::timeout(timeout, self.query(query))
            .await
            .map_err(|_| ShellError::ChannelClosed)?
    }

    /// Snapshots of every live instance.
    ///
    /// # Errors
    ///
    /// [`ShellError::ChannelClosed`] if the shell is not running.
    pub async fn get_all(&self) -> Result<Vec<WindowSnapshot>, ShellError> {
        Ok(self.query(ShellQuery::GetAll).await?.into_snapshots().unwrap_or_default())
    }

    /// Snapshot of one instance, `None` if destroyed or never created.
    ///
    /// # Errors
    ///
    /// [`ShellError::ChannelClosed`] if the shell is not running.
    pub async fn get_by_id(&self, id: InstanceId) -> Result<Option<WindowSnapshot>, ShellError> {
        Ok(self.query(ShellQuery::GetById { id }).await?.into_snapshot().flatten())
    }

    /// Live instance count for one kind.
    ///
    /// # Errors
    ///
    /// [`ShellError::ChannelClosed`] if the shell is not running.
    pub async fn count(&self, kind: &str) -> Result<usize, ShellError> {
        Ok(self
            .query(ShellQuery::Count { kind: kind.to_string() })
            .await?
            .into_count()
            .unwrap_or(0))
    }

    /// Live instance counts per kind.
    ///
    /// # Errors
    ///
    /// [`ShellError::ChannelClosed`] if the shell is not running.
    pub async fn count_by_kind(&self) -> Result<BTreeMap<String, usize>, ShellError> {
        Ok(self.query(ShellQuery::CountByKind).await?.into_counts().unwrap_or_default())
    }

    /// Relays a lifecycle event from an instance's UI surface. Fire and
    /// forget.
    ///
    /// # Errors
    ///
    /// [`ShellError::ChannelClosed`] if the shell is not running.
    pub fn notify_surface(&self, id: InstanceId, notice: SurfaceNotice) -> Result<(), ShellError> {
        self.sender
            .try_send(ShellMessage::SurfaceEvent { id, notice })
            .map_err(|_| ShellError::ChannelClosed)
    }

    /// Requests shutdown. Every pending close-with-result rendezvous
    /// resolves as unresolved before the actor exits.
    pub async fn shutdown(&self) {
        let _ = self.sender.send(ShellMessage::Shutdown).await;
    }

    /// Whether the actor is still running (mailbox open).
    #[must_use]
    pub fn is_alive(&self) -> bool { !self.sender.is_closed() }

    /// Explicit per-kind accessor handle.
    #[must_use]
    pub fn kind(&self, kind: &str) -> KindHandle {
        KindHandle { shell: self.clone(), kind: kind.to_string() }
    }
}

impl std::fmt::Debug for ShellHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellHandle").field("alive", &self.is_alive()).finish()
    }
}

/// Handle scoped to one window kind.
///
/// Looked up explicitly through [`ShellHandle::kind`]; one of these exists
/// per kind a client cares about, so client code reads
/// `shell.kind("settings").open(...)` without any reflective dispatch.
#[derive(Debug, Clone)]
pub struct KindHandle {
    shell: ShellHandle,
    kind: String,
}

impl KindHandle {
    #[must_use]
    pub fn kind_name(&self) -> &str { &self.kind }

    /// # Errors
    ///
    /// Same failures as [`ShellHandle::open`].
    pub async fn open(&self, options: OpenOptions) -> Result<OpenReply, ShellError> {
        self.shell.open(&self.kind, options).await
    }

    /// # Errors
    ///
    /// Same failures as [`ShellHandle::open_async`].
    pub async fn open_async(&self, options: OpenOptions) -> Result<OpenReply, ShellError> {
        self.shell.open_async(&self.kind, options).await
    }

    /// # Errors
    ///
    /// [`ShellError::ChannelClosed`] if the shell is not running.
    pub async fn count(&self) -> Result<usize, ShellError> {
        self.shell.count(&self.kind).await
    }

    /// Snapshots of this kind's live instances.
    ///
    /// # Errors
    ///
    /// [`ShellError::ChannelClosed`] if the shell is not running.
    pub async fn instances(&self) -> Result<Vec<WindowSnapshot>, ShellError> {
        let all = self.shell.get_all().await?;
        Ok(all.into_iter().filter(|w| w.kind == self.kind).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_alive_tracks_channel() {
        let (tx, rx) = mpsc::channel(8);
        let handle = ShellHandle::new(tx);
        assert!(handle.is_alive());
        drop(rx);
        assert!(!handle.is_alive());
    }

    #[tokio::test]
    async fn requests_to_closed_channel_fail() {
        let (tx, rx) = mpsc::channel(8);
        let handle = ShellHandle::new(tx);
        drop(rx);

        let err = handle.get_data(InstanceId::new(1)).await.unwrap_err();
        assert_eq!(err, ShellError::ChannelClosed);

        let err = handle.notify_surface(InstanceId::new(1), SurfaceNotice::FocusChanged(true));
        assert_eq!(err.unwrap_err(), ShellError::ChannelClosed);
    }

    #[test]
    fn kind_handle_carries_its_kind() {
        let (tx, _rx) = mpsc::channel(8);
        let handle = ShellHandle::new(tx);
        let settings = handle.kind("settings");
        assert_eq!(settings.kind_name(), "settings");
    }
}
