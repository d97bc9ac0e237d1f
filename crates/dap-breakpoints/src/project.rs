//! Project breakpoints: the public face of the breakpoint manager.
//!
//! Every mutation ends in an update pass: a full synchronization when an
//! adapter is connected, a local marker refresh otherwise. Response callbacks
//! share [`SyncContext`] with the owner; no lock is held while the connection,
//! the prompt service or the display handler is called.

use std::sync::Arc;

use parking_lot::Mutex;
use smol_str::SmolStr;
use tracing::{debug, info};

use crate::completion::CompletionGroup;
use crate::config::ConfiguredBreakpoints;
use crate::error::BreakpointError;
use crate::exceptions;
use crate::host::{AdapterConnection, BreakpointDisplayHandler, PromptService};
use crate::markers::{MarkerReconciler, MarkerService};
use crate::model::BreakpointOptions;
use crate::protocol::Capabilities;
use crate::snapshot::BreakpointSnapshot;
use crate::store::{normalize_path, BreakpointStore, ToggleOutcome};
use crate::sync::{self, SyncPlan};

/// State shared between the owner and in-flight response callbacks.
pub(crate) struct SyncContext {
    pub(crate) store: BreakpointStore,
    pub(crate) markers: MarkerReconciler,
    pub(crate) connection: Option<Arc<dyn AdapterConnection>>,
    pub(crate) capabilities: Capabilities,
    pub(crate) display: Option<Arc<dyn BreakpointDisplayHandler>>,
    pub(crate) configured: ConfiguredBreakpoints,
}

impl SyncContext {
    /// Pull marker drift into the breakpoints of `file` before a lookup.
    fn resolve_file(&mut self, file: &str) {
        let key = normalize_path(file);
        if let Some(breakpoints) = self.store.file_breakpoints_mut(&key) {
            self.markers.resolve_file(&key, breakpoints);
        }
    }

    fn resolve_all(&mut self) {
        for (file, breakpoints) in self.store.lines_mut() {
            self.markers.resolve_file(file, breakpoints);
        }
    }

    fn release_all_markers(&mut self) {
        for (file, breakpoints) in self.store.lines_mut() {
            for bp in breakpoints.iter_mut() {
                self.markers.release(file, bp);
            }
        }
    }
}

/// One row of the breakpoint list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreakpointListEntry {
    Line {
        file: String,
        line: u32,
        enabled: bool,
        text: String,
    },
    Function {
        name: SmolStr,
        text: String,
    },
}

/// User breakpoints of a project and their synchronization with an adapter.
pub struct ProjectBreakpoints {
    context: Arc<Mutex<SyncContext>>,
    prompt: Arc<dyn PromptService>,
}

impl ProjectBreakpoints {
    pub fn new(markers: Arc<dyn MarkerService>, prompt: Arc<dyn PromptService>) -> Self {
        Self {
            context: Arc::new(Mutex::new(SyncContext {
                store: BreakpointStore::new(),
                markers: MarkerReconciler::new(markers),
                connection: None,
                capabilities: Capabilities::default(),
                display: None,
                configured: ConfiguredBreakpoints::default(),
            })),
            prompt,
        }
    }

    // Connection lifecycle.

    pub fn on_connect(&self, connection: Arc<dyn AdapterConnection>) {
        info!("debug adapter connected");
        let mut context = self.context.lock();
        context.connection = Some(connection);
        context.store.forget_vacated();
    }

    /// Drop the session state and fall back to local markers.
    ///
    /// Negotiated exception filters survive so the user is not asked again.
    pub fn on_disconnect(&self) {
        info!("debug adapter disconnected");
        {
            let mut context = self.context.lock();
            context.connection = None;
            context.display = None;
            context.capabilities = Capabilities::default();
            context.store.forget_vacated();
        }
        self.refresh();
    }

    pub fn set_capabilities(&self, capabilities: Capabilities) {
        self.context.lock().capabilities = capabilities;
    }

    pub fn set_display_handler(&self, handler: Arc<dyn BreakpointDisplayHandler>) {
        self.context.lock().display = Some(handler);
    }

    pub fn set_configured_breakpoints(&self, configured: ConfiguredBreakpoints) {
        self.context.lock().configured = configured;
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.context.lock().connection.is_some()
    }

    // Mutations.

    pub fn toggle_line(
        &self,
        file: &str,
        line: u32,
        options: BreakpointOptions,
    ) -> Result<ToggleOutcome, BreakpointError> {
        if file.is_empty() {
            return Ok(ToggleOutcome::Unchanged);
        }
        let outcome = {
            let mut context = self.context.lock();
            context.resolve_file(file);
            let connected = context.connection.is_some();
            let outcome = context.store.toggle_line(file, line, options, connected);
            if let ToggleOutcome::Removed(bp) = &outcome {
                context.markers.discard(bp);
            }
            outcome
        };
        debug!(file, line, ?outcome, "line breakpoint toggled");
        self.update_ui()?;
        Ok(outcome)
    }

    pub fn set_line(
        &self,
        file: &str,
        line: u32,
        options: BreakpointOptions,
    ) -> Result<(), BreakpointError> {
        self.set_line_then(file, line, options, || {})
    }

    /// Upsert a breakpoint and run `then` once the update pass completes.
    ///
    /// Updating the options of an existing breakpoint needs no pass; `then`
    /// runs immediately.
    pub fn set_line_then(
        &self,
        file: &str,
        line: u32,
        options: BreakpointOptions,
        then: impl FnOnce() + Send + 'static,
    ) -> Result<(), BreakpointError> {
        let created = {
            let mut context = self.context.lock();
            context.resolve_file(file);
            context.store.set_line(file, line, options)
        };
        if !created {
            then();
            return Ok(());
        }
        self.update_ui_then(then)
    }

    /// Remove the breakpoint at `line`. Returns whether one existed.
    pub fn clear_line(&self, file: &str, line: u32) -> Result<bool, BreakpointError> {
        let removed = {
            let mut context = self.context.lock();
            context.resolve_file(file);
            let removed = context.store.clear_line(file, line);
            if let Some(bp) = &removed {
                context.markers.discard(bp);
            }
            removed.is_some()
        };
        if removed {
            self.update_ui()?;
        }
        Ok(removed)
    }

    /// Remove the breakpoint at `line` if it is temporary.
    pub fn clear_temporary_line(&self, file: &str, line: u32) -> Result<bool, BreakpointError> {
        let removed = {
            let mut context = self.context.lock();
            context.resolve_file(file);
            let removed = context.store.clear_temporary_line(file, line);
            if let Some(bp) = &removed {
                context.markers.discard(bp);
            }
            removed.is_some()
        };
        if removed {
            self.update_ui()?;
        }
        Ok(removed)
    }

    /// Drop every temporary breakpoint without an update pass.
    pub fn clear_all_temporary(&self) -> usize {
        let mut context = self.context.lock();
        context.resolve_all();
        let removed = context.store.clear_all_temporary();
        for bp in &removed {
            context.markers.discard(bp);
        }
        removed.len()
    }

    pub fn add_function(
        &self,
        name: impl Into<SmolStr>,
        options: BreakpointOptions,
    ) -> Result<(), BreakpointError> {
        self.context.lock().store.add_function(name, options);
        self.update_ui()
    }

    pub fn clear_function(&self, name: &str) -> Result<(), BreakpointError> {
        self.context.lock().store.clear_function(name);
        self.update_ui()
    }

    /// Remove everything, release all markers and forget exception filters.
    pub fn clear_all(&self) -> Result<(), BreakpointError> {
        {
            let mut context = self.context.lock();
            context.release_all_markers();
            context.store.clear_all();
        }
        self.update_ui()
    }

    // Update passes.

    pub fn update_ui(&self) -> Result<(), BreakpointError> {
        self.update_ui_then(|| {})
    }

    /// Synchronize when connected, refresh markers otherwise; then run `then`.
    pub fn update_ui_then(
        &self,
        then: impl FnOnce() + Send + 'static,
    ) -> Result<(), BreakpointError> {
        if self.is_connected() {
            return self.synchronize(then);
        }
        self.refresh();
        then();
        Ok(())
    }

    /// Push the whole model to the connected adapter.
    ///
    /// `on_complete` runs exactly once, after every request has been answered
    /// or has failed, and immediately when there is nothing to send. Exception
    /// filters are negotiated first when unset; an invalid configured default
    /// fails here, before any request is sent and without calling
    /// `on_complete`.
    pub fn synchronize(
        &self,
        on_complete: impl FnOnce() + Send + 'static,
    ) -> Result<(), BreakpointError> {
        let (connection, negotiation) = {
            let context = self.context.lock();
            let connection = context
                .connection
                .clone()
                .ok_or(BreakpointError::NotConnected)?;
            let negotiation = context
                .store
                .exception_filters()
                .is_none()
                .then(|| (context.capabilities.clone(), context.configured.clone()));
            (connection, negotiation)
        };

        if let Some((capabilities, configured)) = negotiation {
            let filters = exceptions::negotiate(&capabilities, &configured, self.prompt.as_ref())?;
            self.context.lock().store.set_exception_filters(Some(filters));
        }

        let (plan, display) = {
            let mut guard = self.context.lock();
            let context = &mut *guard;
            let plan = SyncPlan::build(&mut context.store, &context.markers, &context.capabilities)?;
            (plan, context.display.clone())
        };
        if let Some(display) = display {
            display.clear_all();
        }

        let group = CompletionGroup::new(on_complete);
        sync::issue(plan, &connection, &self.context, &self.prompt, group);
        Ok(())
    }

    /// Place markers for every line breakpoint (disconnected display).
    pub fn refresh(&self) {
        let mut guard = self.context.lock();
        let context = &mut *guard;
        for (file, breakpoints) in context.store.lines_mut() {
            for bp in breakpoints.iter_mut() {
                context.markers.show(file, bp);
            }
        }
    }

    // Listing.

    /// Current breakpoints as list rows, line breakpoints first.
    #[must_use]
    pub fn breakpoints(&self) -> Vec<BreakpointListEntry> {
        let mut context = self.context.lock();
        context.resolve_all();
        let mut entries = Vec::new();
        for (file, breakpoints) in context.store.lines() {
            for bp in breakpoints {
                entries.push(BreakpointListEntry::Line {
                    file: file.clone(),
                    line: bp.line,
                    enabled: bp.state.is_enabled(),
                    text: format!(
                        "Line breakpoint - {}: {}",
                        bp.state.as_str(),
                        bp.options.describe()
                    ),
                });
            }
        }
        for bp in context.store.functions() {
            entries.push(BreakpointListEntry::Function {
                name: bp.function.clone(),
                text: format!(
                    "Function breakpoint: {}: {}",
                    bp.function,
                    bp.options.describe()
                ),
            });
        }
        entries
    }

    /// Toggle a line row; a function row is cleared.
    pub fn toggle_list_entry(&self, entry: &BreakpointListEntry) -> Result<(), BreakpointError> {
        match entry {
            BreakpointListEntry::Function { name, .. } => self.clear_function(name),
            BreakpointListEntry::Line { file, line, .. } => self
                .toggle_line(file, *line, BreakpointOptions::default())
                .map(|_| ()),
        }
    }

    pub fn clear_list_entry(&self, entry: &BreakpointListEntry) -> Result<(), BreakpointError> {
        match entry {
            BreakpointListEntry::Function { name, .. } => self.clear_function(name),
            BreakpointListEntry::Line { file, line, .. } => {
                self.clear_line(file, *line).map(|_| ())
            }
        }
    }

    // Persistence.

    /// Snapshot of the model without marker ids.
    #[must_use]
    pub fn save(&self) -> BreakpointSnapshot {
        let mut context = self.context.lock();
        context.resolve_all();
        BreakpointSnapshot::capture(&context.store)
    }

    /// Replace the model with `snapshot` and run an update pass.
    pub fn load(&self, snapshot: BreakpointSnapshot) -> Result<(), BreakpointError> {
        {
            let mut context = self.context.lock();
            context.release_all_markers();
            context.store.clear_all();
            let BreakpointSnapshot {
                line,
                function,
                exception,
            } = snapshot;
            context.store.install(line, function, exception);
        }
        self.update_ui()
    }
}
