//! In-memory breakpoint store.
//! - line breakpoints keyed by normalized file path
//! - function breakpoints (duplicates allowed)
//! - negotiated exception filters (`None` until negotiated)
//!
//! The store never talks to markers or adapters; callers resolve marker drift
//! before lookups and release the markers of removed entries.

use std::path::Path;

use indexmap::{IndexMap, IndexSet};
use smol_str::SmolStr;

use crate::model::{
    BreakpointOptions, BreakpointState, ExceptionFilterSet, FunctionBreakpoint, LineBreakpoint,
};

/// Result of toggling a line breakpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Nothing to toggle, e.g. a buffer without a file name.
    Unchanged,
    Added,
    Disabled,
    Removed(LineBreakpoint),
}

#[derive(Debug, Clone, Default)]
pub struct BreakpointStore {
    lines: IndexMap<String, Vec<LineBreakpoint>>,
    functions: Vec<FunctionBreakpoint>,
    exception_filters: Option<ExceptionFilterSet>,
    /// Files whose last line breakpoint was removed since the last push.
    vacated: IndexSet<String>,
}

/// Absolute path when the file exists on disk, otherwise the name as given.
#[must_use]
pub fn normalize_path(file: &str) -> String {
    match std::path::absolute(Path::new(file)) {
        Ok(absolute) if absolute.is_file() => absolute.to_string_lossy().into_owned(),
        _ => file.to_string(),
    }
}

impl BreakpointStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.functions.is_empty()
    }

    /// Toggle the breakpoint at `line`.
    ///
    /// Absent creates an enabled breakpoint. An enabled breakpoint is parked as
    /// disabled only while no adapter is connected; every other case deletes.
    pub fn toggle_line(
        &mut self,
        file: &str,
        line: u32,
        options: BreakpointOptions,
        connected: bool,
    ) -> ToggleOutcome {
        if file.is_empty() {
            return ToggleOutcome::Unchanged;
        }
        let key = normalize_path(file);
        let Some(index) = self.position(&key, line) else {
            self.push_line(key, line, options);
            return ToggleOutcome::Added;
        };
        let bp = &mut self.lines[&key][index];
        if bp.state.is_enabled() && !connected {
            bp.state = BreakpointState::Disabled;
            return ToggleOutcome::Disabled;
        }
        ToggleOutcome::Removed(self.remove_at(&key, index))
    }

    /// Upsert a breakpoint. Existing entries only get new options.
    ///
    /// Returns `true` when a new breakpoint was created.
    pub fn set_line(&mut self, file: &str, line: u32, options: BreakpointOptions) -> bool {
        let key = normalize_path(file);
        if let Some(index) = self.position(&key, line) {
            self.lines[&key][index].options = options;
            return false;
        }
        self.push_line(key, line, options);
        true
    }

    pub fn clear_line(&mut self, file: &str, line: u32) -> Option<LineBreakpoint> {
        let key = normalize_path(file);
        let index = self.position(&key, line)?;
        Some(self.remove_at(&key, index))
    }

    /// Remove the breakpoint at `line` only when it is temporary.
    pub fn clear_temporary_line(&mut self, file: &str, line: u32) -> Option<LineBreakpoint> {
        let key = normalize_path(file);
        let index = self.position(&key, line)?;
        if !self.lines[&key][index].is_temporary() {
            return None;
        }
        Some(self.remove_at(&key, index))
    }

    pub fn clear_all_temporary(&mut self) -> Vec<LineBreakpoint> {
        let mut removed = Vec::new();
        let mut emptied = Vec::new();
        for (file, breakpoints) in &mut self.lines {
            let (temporary, kept): (Vec<_>, Vec<_>) =
                breakpoints.drain(..).partition(LineBreakpoint::is_temporary);
            *breakpoints = kept;
            if !temporary.is_empty() && breakpoints.is_empty() {
                emptied.push(file.clone());
            }
            removed.extend(temporary);
        }
        for file in emptied {
            self.lines.shift_remove(&file);
            self.vacated.insert(file);
        }
        removed
    }

    /// Append a function breakpoint; duplicates are allowed.
    pub fn add_function(&mut self, name: impl Into<SmolStr>, options: BreakpointOptions) {
        self.functions.push(FunctionBreakpoint {
            state: BreakpointState::Enabled,
            function: name.into(),
            options,
        });
    }

    /// Remove every function breakpoint named `name`.
    pub fn clear_function(&mut self, name: &str) -> usize {
        let before = self.functions.len();
        self.functions.retain(|bp| bp.function != name);
        before - self.functions.len()
    }

    /// Empty every collection and forget the negotiated exception filters.
    pub fn clear_all(&mut self) -> Vec<LineBreakpoint> {
        let mut removed = Vec::new();
        for (file, breakpoints) in self.lines.drain(..) {
            self.vacated.insert(file);
            removed.extend(breakpoints);
        }
        self.functions.clear();
        self.exception_filters = None;
        removed
    }

    /// Replace the whole model, e.g. from a snapshot.
    pub fn install(
        &mut self,
        lines: IndexMap<String, Vec<LineBreakpoint>>,
        functions: Vec<FunctionBreakpoint>,
        exception_filters: Option<ExceptionFilterSet>,
    ) {
        self.lines = lines
            .into_iter()
            .filter(|(_, breakpoints)| !breakpoints.is_empty())
            .collect();
        for file in self.lines.keys() {
            self.vacated.shift_remove(file);
        }
        self.functions = functions;
        self.exception_filters = exception_filters;
    }

    #[must_use]
    pub fn lines(&self) -> &IndexMap<String, Vec<LineBreakpoint>> {
        &self.lines
    }

    pub fn lines_mut(&mut self) -> impl Iterator<Item = (&String, &mut Vec<LineBreakpoint>)> {
        self.lines.iter_mut()
    }

    #[must_use]
    pub fn file_breakpoints(&self, file: &str) -> &[LineBreakpoint] {
        self.lines.get(file).map_or(&[], Vec::as_slice)
    }

    pub fn file_breakpoints_mut(&mut self, file: &str) -> Option<&mut Vec<LineBreakpoint>> {
        self.lines.get_mut(file)
    }

    #[must_use]
    pub fn find_line(&self, file: &str, line: u32) -> Option<&LineBreakpoint> {
        let key = normalize_path(file);
        self.file_breakpoints(&key).iter().find(|bp| bp.line == line)
    }

    #[must_use]
    pub fn functions(&self) -> &[FunctionBreakpoint] {
        &self.functions
    }

    #[must_use]
    pub fn exception_filters(&self) -> Option<&ExceptionFilterSet> {
        self.exception_filters.as_ref()
    }

    pub fn set_exception_filters(&mut self, filters: Option<ExceptionFilterSet>) {
        self.exception_filters = filters;
    }

    /// Files that need an empty push so the adapter drops their breakpoints.
    pub fn take_vacated(&mut self) -> Vec<String> {
        self.vacated.drain(..).collect()
    }

    pub fn forget_vacated(&mut self) {
        self.vacated.clear();
    }

    fn position(&self, key: &str, line: u32) -> Option<usize> {
        self.lines.get(key)?.iter().position(|bp| bp.line == line)
    }

    fn push_line(&mut self, key: String, line: u32, options: BreakpointOptions) {
        self.vacated.shift_remove(&key);
        self.lines
            .entry(key)
            .or_default()
            .push(LineBreakpoint::enabled(line, options));
    }

    fn remove_at(&mut self, key: &str, index: usize) -> LineBreakpoint {
        let breakpoints = &mut self.lines[key];
        let removed = breakpoints.remove(index);
        if breakpoints.is_empty() {
            self.lines.shift_remove(key);
            self.vacated.insert(key.to_string());
        }
        removed
    }
}
