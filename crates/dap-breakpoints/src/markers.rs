//! Marker placement and drift reconciliation.
//! - MarkerService: external marker surface (place/unplace/locate/define)
//! - MarkerKind: the four breakpoint marker kinds
//! - MarkerReconciler: lazy ids, line drift, local display pass

use std::sync::Arc;

use crate::model::{LineBreakpoint, MarkerId};

/// Group tag for every marker owned by the breakpoint manager.
pub const MARKER_GROUP: &str = "DapBreakpoint";

/// Visual properties of a marker kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerStyle {
    pub text: &'static str,
    pub double_text: &'static str,
    pub highlight: &'static str,
}

/// Marker surface provided by the editor.
///
/// Implementations use interior mutability; all calls come from the owner
/// thread or from adapter response callbacks.
pub trait MarkerService: Send + Sync {
    fn define_kind(&self, kind: &str, style: &MarkerStyle);
    fn place(&self, id: MarkerId, group: &str, kind: &str, file: &str, line: u32);
    fn unplace(&self, id: MarkerId, group: &str);
    /// Current line of marker `id` in `file`, if it is still placed.
    fn locate(&self, file: &str, id: MarkerId) -> Option<u32>;
    /// Whether `file` is loaded in a buffer. Markers are only placed there.
    fn has_buffer(&self, _file: &str) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Breakpoint,
    Conditional,
    Logpoint,
    Disabled,
}

impl MarkerKind {
    pub const ALL: [MarkerKind; 4] = [
        MarkerKind::Breakpoint,
        MarkerKind::Conditional,
        MarkerKind::Logpoint,
        MarkerKind::Disabled,
    ];

    /// Kind for a breakpoint: disabled wins, then logpoint, then conditional.
    #[must_use]
    pub fn for_breakpoint(bp: &LineBreakpoint) -> Self {
        if !bp.state.is_enabled() {
            Self::Disabled
        } else if bp.options.is_logpoint() {
            Self::Logpoint
        } else if bp.options.is_conditional() {
            Self::Conditional
        } else {
            Self::Breakpoint
        }
    }

    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Breakpoint => "dapBreakpoint",
            Self::Conditional => "dapBreakpointCond",
            Self::Logpoint => "dapBreakpointLog",
            Self::Disabled => "dapBreakpointDisabled",
        }
    }

    #[must_use]
    pub fn style(self) -> MarkerStyle {
        match self {
            Self::Breakpoint => MarkerStyle {
                text: "●",
                double_text: "●",
                highlight: "WarningMsg",
            },
            Self::Conditional => MarkerStyle {
                text: "◆",
                double_text: "◆",
                highlight: "WarningMsg",
            },
            Self::Logpoint => MarkerStyle {
                text: "◆",
                double_text: "◆",
                highlight: "SpellRare",
            },
            Self::Disabled => MarkerStyle {
                text: "●",
                double_text: "●",
                highlight: "LineNr",
            },
        }
    }
}

/// Keeps breakpoint lines in step with their markers.
pub struct MarkerReconciler {
    service: Arc<dyn MarkerService>,
    next_id: u32,
}

impl std::fmt::Debug for MarkerReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkerReconciler")
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl MarkerReconciler {
    /// Wrap `service` and define every breakpoint marker kind on it.
    pub fn new(service: Arc<dyn MarkerService>) -> Self {
        for kind in MarkerKind::ALL {
            service.define_kind(kind.tag(), &kind.style());
        }
        Self {
            service,
            next_id: 1,
        }
    }

    /// Pull the marker's current line into `bp` and return it.
    pub fn resolve_line(&self, file: &str, bp: &mut LineBreakpoint) -> u32 {
        let Some(id) = bp.marker else {
            return bp.line;
        };
        if !self.service.has_buffer(file) {
            return bp.line;
        }
        if let Some(line) = self.service.locate(file, id) {
            bp.line = line;
        }
        bp.line
    }

    pub fn resolve_file(&self, file: &str, breakpoints: &mut [LineBreakpoint]) {
        for bp in breakpoints {
            self.resolve_line(file, bp);
        }
    }

    /// Resolve the line, then unplace and forget the marker.
    pub fn release(&self, file: &str, bp: &mut LineBreakpoint) {
        self.resolve_line(file, bp);
        if let Some(id) = bp.marker.take() {
            self.service.unplace(id, MARKER_GROUP);
        }
    }

    /// Unplace the marker of a breakpoint that is already gone from the store.
    pub fn discard(&self, bp: &LineBreakpoint) {
        if let Some(id) = bp.marker {
            self.service.unplace(id, MARKER_GROUP);
        }
    }

    /// Place (or re-place) the marker for `bp`, assigning an id on first use.
    pub fn show(&mut self, file: &str, bp: &mut LineBreakpoint) {
        self.resolve_line(file, bp);
        let id = match bp.marker {
            Some(id) => {
                self.service.unplace(id, MARKER_GROUP);
                id
            }
            None => {
                let id = MarkerId(self.next_id);
                self.next_id += 1;
                bp.marker = Some(id);
                id
            }
        };
        if self.service.has_buffer(file) {
            let kind = MarkerKind::for_breakpoint(bp);
            self.service.place(id, MARKER_GROUP, kind.tag(), file, bp.line);
        }
    }
}
