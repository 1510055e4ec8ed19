//! Error types for the window shell core.
//!
//! Every failure that can cross the control channel is represented here as a
//! typed variant. The enum serializes with a `kind`/`message` shape so remote
//! callers receive structured errors instead of opaque exceptions; the wire
//! layer additionally folds errors into the uniform `{success, error}`
//! response.

use serde::Serialize;
use thiserror::Error;

use crate::instance::InstanceId;

/// Errors produced by the shell, the factory and the registry.
///
/// None of these are fatal to the control process: a failed `open` leaves the
/// registry unchanged and the request is safely retriable.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum ShellError {
    /// No descriptor is registered for the requested window kind.
    #[error("unknown window kind: {0}")]
    UnknownWindowKind(String),
    /// A non-singleton kind reached its instance cap.
    #[error("instance limit reached for kind '{kind}' (max {limit})")]
    InstanceLimitExceeded { kind: String, limit: u32 },
    /// The descriptor requires a parent window but no creator context was
    /// supplied with the request.
    #[error("window kind '{0}' requires a parent window but none was supplied")]
    MissingParentContext(String),
    /// The operation addressed an instance id that does not exist or was
    /// already destroyed.
    #[error("unknown window instance: {0}")]
    UnknownInstance(InstanceId),
    /// The underlying platform surface failed to construct.
    #[error("surface materialization failed: {0}")]
    MaterializationFailed(String),
    /// The shell actor has shut down; its mailbox is closed.
    #[error("shell is not running")]
    ChannelClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_kind_display() {
        let err = ShellError::UnknownWindowKind("settings".to_string());
        assert!(err.to_string().contains("settings"));
    }

    #[test]
    fn test_limit_display_includes_kind_and_cap() {
        let err = ShellError::InstanceLimitExceeded {
            kind: "dashboard".to_string(),
            limit: 4,
        };
        let msg = err.to_string();
        assert!(msg.contains("dashboard"));
        assert!(msg.contains('4'));
    }

    #[test]
    fn test_unknown_instance_display() {
        let err = ShellError::UnknownInstance(InstanceId::new(7));
        assert!(err.to_string().contains('7'));
    }

    #[test]
    fn test_error_serializes_with_kind() {
        let err = ShellError::MaterializationFailed("webview crashed".to_string());
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("MaterializationFailed"));
        assert!(json.contains("webview crashed"));
    }

    #[test]
    fn test_error_is_debug() {
        let err = ShellError::ChannelClosed;
        let debug = format!("{err:?}");
        assert!(debug.contains("ChannelClosed"));
    }
}
