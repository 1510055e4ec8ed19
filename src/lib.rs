//! Window orchestration core for multi-window desktop shells.
//!
//! A single control process owns every window decision: which kinds exist,
//! how many instances of each may live, how windows are placed, parented and
//! destroyed, and how data payloads flow to isolated UI surfaces that share
//! no memory with the core.
//!
//! The pieces:
//!
//! - [`WindowDescriptor`] / [`DescriptorTable`] - static per-kind policy
//!   (singleton, instance caps, lazy reuse, modality, parenting, placement).
//! - [`Shell`] / [`ShellHandle`] - the actor that owns the instance registry
//!   and sequences every factory decision, and its cloneable async handle.
//! - [`SurfaceBackend`] - the seam to the rendering layer; [`NullBackend`]
//!   is the headless implementation used in tests and embedded setups.
//! - [`wire`] - the serialized request/response/push contract for remote
//!   callers, with [`wire::dispatch`] bridging decoded requests to the shell.
//!
//! # Example
//!
//! ```
//! use transom::{OpenOptions, Shell, WindowDescriptor};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut settings = WindowDescriptor::new("settings", "Settings");
//! settings.singleton = true;
//! settings.lazy = true;
//!
//! let shell = Shell::builder().descriptor(settings).spawn();
//!
//! let reply = shell
//!     .open("settings", OpenOptions::with_data(serde_json::json!({"tab": "general"})))
//!     .await
//!     .unwrap();
//! assert_eq!(shell.count("settings").await.unwrap(), 1);
//!
//! shell.close(reply.id(), None).await.unwrap();
//! shell.shutdown().await;
//! # }
//! ```

pub mod broadcast;
pub mod descriptor;
pub mod error;
pub mod geometry;
pub mod instance;
pub mod registry;
pub mod shell;
pub mod snapshot;
pub mod surface;
pub mod wire;

pub use descriptor::{DescriptorTable, InstanceLimit, WindowDescriptor};
pub use error::ShellError;
pub use geometry::{GeometryOverride, Rect, Size};
pub use instance::{CloseOutcome, InstanceId};
pub use shell::{
    KindHandle, OpenOptions, OpenReply, Shell, ShellBuilder, ShellHandle, SurfaceNotice,
};
pub use snapshot::WindowSnapshot;
pub use surface::{NullBackend, SurfaceBackend, SurfaceError, SurfaceSpec};
