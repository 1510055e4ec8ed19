//! Wire-level control channel.
//!
//! [`WireRequest`] is the serialized form of every channel operation, tagged
//! by its `method` string; [`WireResponse`] is the uniform reply envelope
//! (`success` plus either `data` or a structured `error`); [`WirePush`] is
//! the server-initiated event stream, currently just the `window:data` push.
//!
//! [`dispatch`] bridges a decoded request to the shell handle and folds the
//! typed result back into the envelope, so a transport only has to move
//! framed JSON in both directions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ShellError;
use crate::instance::InstanceId;
use crate::shell::{OpenOptions, ShellHandle};

/// A decoded control-channel request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum WireRequest {
    /// Create (or converge on, for singletons) a window and respond once its
    /// surface is ready. With `waitForResult` set, the response is deferred
    /// until the window closes and carries the close outcome instead.
    #[serde(rename = "window:create")]
    Create {
        kind: String,
        #[serde(default)]
        options: OpenOptions,
    },

    /// Create a window and respond as soon as the instance is registered,
    /// while the surface materializes in the background.
    #[serde(rename = "window:create-async")]
    CreateAsync {
        kind: String,
        #[serde(default)]
        options: OpenOptions,
    },

    #[serde(rename = "window:close")]
    Close { id: InstanceId },

    /// Close a window and hand `result` to whoever opened it with
    /// `waitForResult`.
    #[serde(rename = "window:close-with-result")]
    CloseWithResult { id: InstanceId, result: Value },

    #[serde(rename = "window:minimize")]
    Minimize { id: InstanceId },

    #[serde(rename = "window:toggle-maximize")]
    ToggleMaximize { id: InstanceId },

    #[serde(rename = "window:get-data")]
    GetData { id: InstanceId },

    #[serde(rename = "window:update-data")]
    UpdateData { id: InstanceId, payload: Value },

    #[serde(rename = "window:count")]
    Count { kind: String },

    #[serde(rename = "window:count-by-type")]
    CountByType,
}

impl WireRequest {
    /// The wire method string, for logging.
    #[must_use]
    pub const fn method(&self) -> &'static str {
        match self {
            Self::Create { .. } => "window:create",
            Self::CreateAsync { .. } => "window:create-async",
            Self::Close { .. } => "window:close",
            Self::CloseWithResult { .. } => "window:close-with-result",
            Self::Minimize { .. } => "window:minimize",
            Self::ToggleMaximize { .. } => "window:toggle-maximize",
            Self::GetData { .. } => "window:get-data",
            Self::UpdateData { .. } => "window:update-data",
            Self::Count { .. } => "window:count",
            Self::CountByType => "window:count-by-type",
        }
    }
}

/// Uniform response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct WireResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ShellError>,
}

impl WireResponse {
    #[must_use]
    pub const fn ok(data: Value) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    #[must_use]
    pub const fn ok_empty() -> Self {
        Self { success: true, data: None, error: None }
    }

    #[must_use]
    pub const fn fail(error: ShellError) -> Self {
        Self { success: false, data: None, error: Some(error) }
    }
}

/// Server-initiated pushes.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum WirePush {
    /// The instance's current data payload, pushed to its own surface.
    #[serde(rename = "window:data")]
    Data { id: InstanceId, payload: Value },
}

fn fold<T: Serialize>(result: Result<T, ShellError>) -> WireResponse {
    match result {
        Ok(data) => match serde_json::to_value(data) {
            Ok(Value::Null) => WireResponse::ok_empty(),
            Ok(value) => WireResponse::ok(value),
            Err(err) => {
                log::error!("wire: response serialization failed: {err}");
                WireResponse::fail(ShellError::ChannelClosed)
            }
        },
        Err(error) => WireResponse::fail(error),
    }
}

/// Executes a decoded request against the shell and folds the outcome into
/// the response envelope.
pub async fn dispatch(shell: &ShellHandle, request: WireRequest) -> WireResponse {
    log::trace!("wire: dispatching '{}'", request.method());
    match request {
        WireRequest::Create { kind, options } => {
            if options.wait_for_result {
                // The rendezvous variant: hold the response open until the
                // window closes and answer with the close outcome.
                match shell.open(&kind, options).await {
                    Ok(reply) => fold(Ok(reply.wait_close().await)),
                    Err(error) => WireResponse::fail(error),
                }
            } else {
                fold(shell.open(&kind, options).await.map(|reply| reply.snapshot))
            }
        }
        WireRequest::CreateAsync { kind, options } => {
            fold(shell.open_async(&kind, options).await.map(|reply| reply.snapshot))
        }
        WireRequest::Close { id } => fold(shell.close(id, None).await),
        WireRequest::CloseWithResult { id, result } => {
            fold(shell.close(id, Some(result)).await)
        }
        WireRequest::Minimize { id } => fold(shell.minimize(id).await),
        WireRequest::ToggleMaximize { id } => fold(shell.toggle_maximize(id).await),
        WireRequest::GetData { id } => fold(shell.get_data(id).await),
        WireRequest::UpdateData { id, payload } => fold(shell.update_data(id, payload).await),
        WireRequest::Count { kind } => fold(shell.count(&kind).await),
        WireRequest::CountByType => fold(shell.count_by_kind().await),
    }
}
