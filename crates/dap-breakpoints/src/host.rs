//! Narrow interfaces the breakpoint manager consumes from its host.
//! - AdapterConnection: request/response exchange with the debug adapter
//! - PromptService: questions and notifications for the user
//! - BreakpointDisplayHandler: shows adapter-verified breakpoints

use std::fmt;

use serde_json::Value;

use crate::protocol::{Request, Response, Source};

/// Why an adapter request did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFailure {
    pub reason: String,
    pub message: Option<String>,
}

impl RequestFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            message: None,
        }
    }
}

impl fmt::Display for RequestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {message}", self.reason),
            None => f.write_str(&self.reason),
        }
    }
}

/// Completion callback for one adapter request. Invoked at most once.
pub type ResponseHandler = Box<dyn FnOnce(Result<Response<Value>, RequestFailure>) + Send>;

/// Request/response exchange with a live debug adapter.
///
/// `on_response` may run synchronously inside `do_request` or later from the
/// transport; the manager never holds its own locks across this call.
pub trait AdapterConnection: Send + Sync {
    fn do_request(&self, request: Request<Value>, on_response: ResponseHandler);
}

/// Notification flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifyOptions {
    pub persist: bool,
    pub is_error: bool,
}

impl NotifyOptions {
    /// Persistent error notice, used for every non-fatal breakpoint problem.
    #[must_use]
    pub fn persistent_error() -> Self {
        Self {
            persist: true,
            is_error: true,
        }
    }
}

/// Interactive prompting and user notifications.
pub trait PromptService: Send + Sync {
    /// Ask a question; blocks until answered. Returns the raw answer text.
    fn ask(&self, prompt: &str, default: &str) -> String;
    fn notify(&self, message: &str, options: NotifyOptions);
}

/// Host component that shows the adapter's view of breakpoints.
pub trait BreakpointDisplayHandler: Send + Sync {
    fn clear_all(&self);
    /// `source` is `None` for function breakpoint responses.
    fn add_breakpoints(&self, source: Option<&Source>, response: &Response<Value>);
}
