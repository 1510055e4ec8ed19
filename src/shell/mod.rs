//! The shell actor: window factory and control-channel sequencer.
//!
//! The actor owns the descriptor table and the instance registry and
//! processes messages sequentially, so factory decisions and registry
//! mutations never interleave. Surface materialization is the only
//! long-running operation; it runs in a spawned task and reports back through
//! the actor's own mailbox, which keeps registry handling atomic while
//! concurrent opens for the same singleton kind observe the materializing
//! instance instead of racing to create a duplicate.
//!
//! # Panic recovery
//!
//! A panicking message handler is caught and logged and the actor keeps
//! processing; one bad request must not take the whole shell down.

mod handle;
mod messages;

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

pub use handle::{KindHandle, ShellHandle};
pub use messages::{OpenOptions, OpenReply, QueryResult, ShellMessage, ShellQuery, SurfaceNotice};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::broadcast::Broadcaster;
use crate::descriptor::{DescriptorTable, WindowDescriptor};
use crate::error::ShellError;
use crate::geometry::{Rect, resolve_frame};
use crate::instance::{CloseOutcome, InstanceId, WindowInstance};
use crate::registry::Registry;
use crate::snapshot::{self, WindowSnapshot};
use crate::surface::{NullBackend, SurfaceBackend, SurfaceError, SurfaceSpec};

/// Mailbox capacity for the shell actor.
const MAILBOX_CAPACITY: usize = 256;

/// Screen frame used when the embedder does not supply one.
const DEFAULT_SCREEN: Rect = Rect::new(0.0, 0.0, 1920.0, 1080.0);

/// An open request waiting for materialization to finish.
struct PendingOpen {
    respond_to: oneshot::Sender<Result<OpenReply, ShellError>>,
    close_result: Option<oneshot::Receiver<CloseOutcome>>,
}

/// Builder for a shell actor.
///
/// Descriptors (including plugin-registered views) are declared here; once
/// [`ShellBuilder::spawn`] runs, the table is read-only.
pub struct ShellBuilder {
    table: DescriptorTable,
    backend: Option<Arc<dyn SurfaceBackend>>,
    screen: Rect,
}

impl Default for ShellBuilder {
    fn default() -> Self { Self::new() }
}

impl ShellBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: DescriptorTable::new(),
            backend: None,
            screen: DEFAULT_SCREEN,
        }
    }

    /// Registers a window-kind descriptor.
    #[must_use]
    pub fn descriptor(mut self, descriptor: WindowDescriptor) -> Self {
        self.table.register(descriptor);
        self
    }

    /// Replaces the whole descriptor table, e.g. one parsed from JSON.
    #[must_use]
    pub fn descriptors(mut self, table: DescriptorTable) -> Self {
        self.table = table;
        self
    }

    /// Registers a plugin-provided view as a window kind. A view registration
    /// (`panels.register`, `views.register`) is just one more descriptor
    /// whose kind is the view id; the view opens through the same contract as
    /// every built-in kind.
    #[must_use]
    pub fn register_view(mut self, view_id: &str, mut descriptor: WindowDescriptor) -> Self {
        descriptor.kind = view_id.to_string();
        self.table.register(descriptor);
        self
    }

    /// Sets the screen frame used for screen-relative placement.
    #[must_use]
    pub const fn screen(mut self, screen: Rect) -> Self {
        self.screen = screen;
        self
    }

    /// Sets the surface backend. Defaults to the headless [`NullBackend`].
    #[must_use]
    pub fn backend(mut self, backend: Arc<dyn SurfaceBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Spawns the shell actor and returns a handle for communicating with it.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(self) -> ShellHandle {
        log::debug!("shell: spawning actor with {} descriptors", self.table.len());
        let (sender, receiver) = mpsc::channel(MAILBOX_CAPACITY);
        let backend = self.backend.unwrap_or_else(|| NullBackend::new());

        let shell = Shell {
            registry: Registry::new(),
            table: self.table,
            broadcaster: Broadcaster::new(backend.clone()),
            backend,
            screen: self.screen,
            last_origins: HashMap::new(),
            pending_opens: HashMap::new(),
            receiver,
            self_sender: sender.clone(),
        };

        tokio::spawn(shell.run());

        ShellHandle::new(sender)
    }
}

/// The shell actor. Owns all orchestration state; constructed through
/// [`Shell::builder`].
pub struct Shell {
    registry: Registry,
    table: DescriptorTable,
    backend: Arc<dyn SurfaceBackend>,
    broadcaster: Broadcaster,
    screen: Rect,
    /// Last-used position per kind, the default origin for reopened kinds.
    last_origins: HashMap<String, (f64, f64)>,
    /// `create` requests per instance awaiting materialization.
    pending_opens: HashMap<InstanceId, Vec<PendingOpen>>,
    receiver: mpsc::Receiver<ShellMessage>,
    /// Clone handed to materialization tasks so completions come back through
    /// the mailbox.
    self_sender: mpsc::Sender<ShellMessage>,
}

impl Shell {
    #[must_use]
    pub fn builder() -> ShellBuilder { ShellBuilder::new() }

    async fn run(mut self) {
        log::trace!("shell: actor message loop starting");

        while let Some(msg) = self.receiver.recv().await {
            if matches!(msg, ShellMessage::Shutdown) {
                log::debug!("shell: received shutdown message");
                self.shutdown();
                return;
            }

            let msg_name = msg.name();
            let result = catch_unwind(AssertUnwindSafe(|| {
                self.handle_message(msg);
            }));

            if let Err(panic_info) = result {
                let panic_msg = panic_info
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic_info.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                log::error!("shell: PANIC while handling '{msg_name}': {panic_msg}");
            }
        }

        log::debug!("shell: mailbox closed, exiting");
        self.shutdown();
    }

    fn handle_message(&mut self, msg: ShellMessage) {
        match msg {
            ShellMessage::Open { kind, options, wait, respond_to } => {
                self.handle_open(&kind, options, wait, respond_to);
            }
            ShellMessage::Close { id, result, respond_to } => {
                if respond_to.send(self.destroy_instance(id, result)).is_err() {
                    log::warn!("shell: close response receiver dropped");
                }
            }
            ShellMessage::Minimize { id, respond_to } => {
                let result = self.registry.get_mut(id).map_or(
                    Err(ShellError::UnknownInstance(id)),
                    |instance| {
                        instance.minimized = true;
                        Ok(())
                    },
                );
                if result.is_ok() {
                    self.backend.set_minimized(id, true);
                }
                let _ = respond_to.send(result);
            }
            ShellMessage::ToggleMaximize { id, respond_to } => {
                let result = match self.registry.get_mut(id) {
                    Some(instance) => {
                        instance.maximized = !instance.maximized;
                        Ok(instance.maximized)
                    }
                    None => Err(ShellError::UnknownInstance(id)),
                };
                match result {
                    Ok(maximized) => {
                        self.backend.set_maximized(id, maximized);
                        let _ = respond_to.send(Ok(()));
                    }
                    Err(err) => {
                        let _ = respond_to.send(Err(err));
                    }
                }
            }
            ShellMessage::GetData { id, respond_to } => {
                let result = self
                    .registry
                    .get(id)
                    .map_or(Err(ShellError::UnknownInstance(id)), |instance| {
                        Ok(instance.data.clone())
                    });
                let _ = respond_to.send(result);
            }
            ShellMessage::UpdateData { id, payload, respond_to } => {
                let result = match self.registry.get_mut(id) {
                    Some(instance) => {
                        self.broadcaster.push_data(instance, payload);
                        Ok(())
                    }
                    None => Err(ShellError::UnknownInstance(id)),
                };
                let _ = respond_to.send(result);
            }
            ShellMessage::SurfaceEvent { id, notice } => self.handle_surface_event(id, notice),
            ShellMessage::Query { query, respond_to } => {
                if respond_to.send(self.execute_query(query)).is_err() {
                    log::warn!("shell: query response receiver dropped");
                }
            }
            ShellMessage::Materialized { id, result } => self.handle_materialized(id, result),
            ShellMessage::Shutdown => unreachable!("handled in run()"),
        }
    }

    // ========================================================================
    // Window Factory
    // ========================================================================

    fn handle_open(
        &mut self,
        kind: &str,
        options: OpenOptions,
        wait: bool,
        respond_to: oneshot::Sender<Result<OpenReply, ShellError>>,
    ) {
        let Some(descriptor) = self.table.get(kind).cloned() else {
            let _ = respond_to.send(Err(ShellError::UnknownWindowKind(kind.to_string())));
            return;
        };

        // Singleton reuse: a live (possibly still materializing) instance of
        // the kind is returned instead of creating a second one.
        if descriptor.singleton
            && let Some(existing) = self.registry.first_of_kind(kind).map(|w| w.id)
        {
            self.reuse_singleton(&descriptor, existing, options, wait, respond_to);
            return;
        }

        if let Some(limit) = descriptor.max_instances.cap()
            && self.registry.count_by_kind(kind) >= limit as usize
        {
            let _ = respond_to.send(Err(ShellError::InstanceLimitExceeded {
                kind: kind.to_string(),
                limit,
            }));
            return;
        }

        // Parent resolution: parenting descriptors need a creator context,
        // and a supplied parent must exist at creation time.
        if descriptor.requires_parent() && options.parent.is_none() {
            let _ = respond_to.send(Err(ShellError::MissingParentContext(kind.to_string())));
            return;
        }
        if let Some(parent) = options.parent
            && self.registry.get(parent).is_none()
        {
            let _ = respond_to.send(Err(ShellError::UnknownInstance(parent)));
            return;
        }

        let id = self.registry.allocate_id();
        let anchor = options.parent.and_then(|pid| self.registry.get(pid)).map(|p| p.frame);
        let frame = resolve_frame(
            descriptor.default_size(),
            options.geometry,
            descriptor.move_center,
            anchor,
            self.last_origins.get(kind).copied(),
            self.screen,
        );

        let mut instance = WindowInstance::new(id, &descriptor, frame, options.parent);
        if let Some(data) = options.data {
            // Buffered until the surface attaches; never dropped.
            instance.data = Some(data.clone());
            instance.pending_data = Some(data);
        }
        let close_result =
            if options.wait_for_result { instance.install_result_slot() } else { None };

        let spec = SurfaceSpec {
            instance: id,
            kind: descriptor.kind.clone(),
            title: descriptor.title.clone(),
            frame,
            resizable: descriptor.resizable,
            modal: descriptor.modal,
            parent: options.parent,
            platform_options: descriptor.platform_options.clone(),
        };
        log::debug!("shell: materializing instance {id} of kind '{kind}'");
        let materialize = self.backend.materialize(spec);
        let self_sender = self.self_sender.clone();
        tokio::spawn(async move {
            let result = materialize.await;
            let _ = self_sender.send(ShellMessage::Materialized { id, result }).await;
        });

        let snapshot = WindowSnapshot::of(&instance);
        self.registry.insert(instance);

        if wait {
            self.pending_opens
                .entry(id)
                .or_default()
                .push(PendingOpen { respond_to, close_result });
        } else {
            let _ = respond_to.send(Ok(OpenReply { snapshot, close_result }));
        }
    }

    fn reuse_singleton(
        &mut self,
        descriptor: &WindowDescriptor,
        id: InstanceId,
        options: OpenOptions,
        wait: bool,
        respond_to: oneshot::Sender<Result<OpenReply, ShellError>>,
    ) {
        let Some(instance) = self.registry.get_mut(id) else {
            let _ = respond_to.send(Err(ShellError::UnknownInstance(id)));
            return;
        };

        if descriptor.lazy {
            // Lazy singletons are re-fed the latest data on every reopen.
            if let Some(data) = options.data {
                self.broadcaster.push_data(instance, data);
            }
        } else if options.data.is_some() {
            // Data refresh is only guaranteed for lazy singletons; on a
            // non-lazy singleton the reopen is an idempotent no-op.
            log::warn!(
                "shell: open('{}') on live non-lazy singleton dropped supplied data",
                descriptor.kind
            );
        }

        let close_result =
            if options.wait_for_result { instance.install_result_slot() } else { None };

        if wait && !instance.is_ready() {
            self.pending_opens
                .entry(id)
                .or_default()
                .push(PendingOpen { respond_to, close_result });
            return;
        }

        let snapshot = WindowSnapshot::of(instance);
        let _ = respond_to.send(Ok(OpenReply { snapshot, close_result }));
    }

    // ========================================================================
    // Materialization
    // ========================================================================

    fn handle_materialized(&mut self, id: InstanceId, result: Result<(), SurfaceError>) {
        match result {
            Ok(()) => {
                let Some(instance) = self.registry.get_mut(id) else {
                    // Closed while materializing; the surface was already torn
                    // down by the close path.
                    log::debug!("shell: instance {id} materialized after destruction");
                    return;
                };
                instance.mark_ready();
                instance.visible = true;
                self.broadcaster.flush(instance);

                let snapshot = WindowSnapshot::of(instance);
                for waiter in self.pending_opens.remove(&id).unwrap_or_default() {
                    let _ = waiter.respond_to.send(Ok(OpenReply {
                        snapshot: snapshot.clone(),
                        close_result: waiter.close_result,
                    }));
                }
            }
            Err(err) => {
                log::warn!("shell: materialization of instance {id} failed: {err}");
                if let Some(mut instance) = self.registry.remove(id) {
                    self.broadcaster.resolve_close(&mut instance, CloseOutcome::Unresolved);
                }
                for waiter in self.pending_opens.remove(&id).unwrap_or_default() {
                    let _ = waiter
                        .respond_to
                        .send(Err(ShellError::MaterializationFailed(err.to_string())));
                }
            }
        }
    }

    // ========================================================================
    // Destruction
    // ========================================================================

    /// The single close path: explicit close requests and platform-initiated
    /// closes both land here.
    fn destroy_instance(
        &mut self,
        id: InstanceId,
        result: Option<Value>,
    ) -> Result<(), ShellError> {
        let Some(mut instance) = self.registry.remove(id) else {
            return Err(ShellError::UnknownInstance(id));
        };

        self.last_origins
            .insert(instance.kind.clone(), (instance.frame.x, instance.frame.y));

        let outcome = result.map_or(CloseOutcome::Unresolved, CloseOutcome::Resolved);
        self.broadcaster.resolve_close(&mut instance, outcome);

        let orphaned = self.registry.orphan_children_of(id);
        if orphaned > 0 {
            log::debug!("shell: instance {id} destroyed, orphaned {orphaned} children");
        }

        // A close can race materialization; waiters learn the instance is gone.
        for waiter in self.pending_opens.remove(&id).unwrap_or_default() {
            let _ = waiter.respond_to.send(Err(ShellError::UnknownInstance(id)));
        }

        self.backend.destroy(id);
        Ok(())
    }

    fn handle_surface_event(&mut self, id: InstanceId, notice: SurfaceNotice) {
        match notice {
            SurfaceNotice::FocusChanged(focused) => {
                if let Some(instance) = self.registry.get_mut(id) {
                    instance.focused = focused;
                } else {
                    log::trace!("shell: focus event for unknown instance {id}");
                }
            }
            SurfaceNotice::VisibilityChanged(visible) => {
                if let Some(instance) = self.registry.get_mut(id) {
                    instance.visible = visible;
                }
            }
            SurfaceNotice::MinimizedChanged(minimized) => {
                if let Some(instance) = self.registry.get_mut(id) {
                    instance.minimized = minimized;
                }
            }
            SurfaceNotice::Closed { result } => {
                if let Err(err) = self.destroy_instance(id, result) {
                    log::debug!("shell: surface close for gone instance: {err}");
                }
            }
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    fn execute_query(&self, query: ShellQuery) -> QueryResult {
        match query {
            ShellQuery::GetAll => QueryResult::Snapshots(snapshot::project_all(&self.registry)),
            ShellQuery::GetById { id } => {
                QueryResult::Snapshot(snapshot::project_one(&self.registry, id))
            }
            ShellQuery::Count { kind } => {
                QueryResult::Count(self.registry.count_by_kind(&kind))
            }
            ShellQuery::CountByKind => QueryResult::Counts(self.registry.counts()),
        }
    }

    // ========================================================================
    // Shutdown
    // ========================================================================

    fn shutdown(&mut self) {
        let live = self.registry.len();
        if live > 0 {
            log::debug!("shell: shutting down with {live} live instances");
        }
        for mut instance in self.registry.drain() {
            self.broadcaster.resolve_close(&mut instance, CloseOutcome::Unresolved);
            self.backend.destroy(instance.id);
        }
        for (_, waiters) in self.pending_opens.drain() {
            for waiter in waiters {
                let _ = waiter.respond_to.send(Err(ShellError::ChannelClosed));
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
