//! Breakpoint management and Debug Adapter Protocol synchronization.
//!
//! [`ProjectBreakpoints`] owns the user's line, function and exception
//! breakpoints. It shows them as markers while no adapter is connected and
//! pushes the whole model to the adapter on every change once one is.

mod completion;
mod config;
mod error;
mod exceptions;
mod host;
mod markers;
mod model;
mod project;
mod protocol;
mod snapshot;
mod store;
mod sync;
mod temporary;

pub use completion::{CompletionGroup, CompletionToken};
pub use config::{ConfiguredBreakpoints, ExceptionDefault, FilterAnswer};
pub use error::BreakpointError;
pub use exceptions::{negotiate, needs_request};
pub use host::{
    AdapterConnection, BreakpointDisplayHandler, NotifyOptions, PromptService, RequestFailure,
    ResponseHandler,
};
pub use markers::{MarkerKind, MarkerReconciler, MarkerService, MarkerStyle, MARKER_GROUP};
pub use model::{
    BreakpointOptions, BreakpointState, ExceptionFilterSet, FunctionBreakpoint, LineBreakpoint,
    MarkerId,
};
pub use project::{BreakpointListEntry, ProjectBreakpoints};
pub use protocol::{
    Breakpoint, Capabilities, ExceptionBreakpointsFilter, MessageType, Request, Response,
    SetBreakpointsArguments, SetBreakpointsResponseBody, SetExceptionBreakpointsArguments,
    SetFunctionBreakpointsArguments, Source, SourceBreakpoint, SET_BREAKPOINTS,
    SET_EXCEPTION_BREAKPOINTS, SET_FUNCTION_BREAKPOINTS,
};
pub use snapshot::BreakpointSnapshot;
pub use store::{normalize_path, BreakpointStore, ToggleOutcome};
pub use temporary::{reconcile as reconcile_temporaries, TemporaryBreakpoint};
