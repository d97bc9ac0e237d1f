//! Shared fakes for breakpoint manager tests.
#![allow(dead_code, unused_imports)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};

pub use dap_breakpoints::{
    AdapterConnection, BreakpointDisplayHandler, BreakpointOptions, Capabilities,
    ExceptionBreakpointsFilter, MarkerId, MarkerService, MarkerStyle, NotifyOptions,
    ProjectBreakpoints, PromptService, Request, RequestFailure, Response, ResponseHandler, Source,
    SET_BREAKPOINTS, SET_EXCEPTION_BREAKPOINTS, SET_FUNCTION_BREAKPOINTS,
};

pub type Responder =
    Box<dyn Fn(&Request<Value>) -> Result<Response<Value>, RequestFailure> + Send + Sync>;

/// Adapter that records requests and answers them from a responder.
///
/// Immediate connections answer inside `do_request`; deferred ones queue the
/// handlers until [`FakeConnection::reply_all`].
pub struct FakeConnection {
    deferred: bool,
    responder: Responder,
    sent: Mutex<Vec<Request<Value>>>,
    queued: Mutex<VecDeque<(Request<Value>, ResponseHandler)>>,
}

impl FakeConnection {
    pub fn immediate() -> Arc<Self> {
        Arc::new(Self::with(false, Box::new(echo)))
    }

    pub fn deferred() -> Arc<Self> {
        Arc::new(Self::with(true, Box::new(echo)))
    }

    pub fn answering(responder: Responder) -> Arc<Self> {
        Arc::new(Self::with(false, responder))
    }

    pub fn deferred_answering(responder: Responder) -> Arc<Self> {
        Arc::new(Self::with(true, responder))
    }

    fn with(deferred: bool, responder: Responder) -> Self {
        Self {
            deferred,
            responder,
            sent: Mutex::new(Vec::new()),
            queued: Mutex::new(VecDeque::new()),
        }
    }

    pub fn sent(&self) -> Vec<Request<Value>> {
        self.sent.lock().clone()
    }

    pub fn sent_commands(&self) -> Vec<String> {
        self.sent.lock().iter().map(|r| r.command.clone()).collect()
    }

    pub fn clear_sent(&self) {
        self.sent.lock().clear();
    }

    pub fn queued(&self) -> usize {
        self.queued.lock().len()
    }

    /// Answer the oldest queued request.
    pub fn reply_next(&self) -> bool {
        let next = self.queued.lock().pop_front();
        match next {
            Some((request, handler)) => {
                handler((self.responder)(&request));
                true
            }
            None => false,
        }
    }

    /// Answer the queued request at `index`, leaving the rest in order.
    pub fn reply_at(&self, index: usize) {
        let entry = self.queued.lock().remove(index);
        if let Some((request, handler)) = entry {
            handler((self.responder)(&request));
        }
    }

    pub fn reply_all(&self) {
        while self.reply_next() {}
    }
}

impl AdapterConnection for FakeConnection {
    fn do_request(&self, request: Request<Value>, on_response: ResponseHandler) {
        self.sent.lock().push(request.clone());
        if self.deferred {
            self.queued.lock().push_back((request, on_response));
        } else {
            on_response((self.responder)(&request));
        }
    }
}

/// Verify every requested line breakpoint where it was asked for.
pub fn echo(request: &Request<Value>) -> Result<Response<Value>, RequestFailure> {
    let body = request
        .arguments
        .as_ref()
        .and_then(|args| args.get("breakpoints"))
        .and_then(Value::as_array)
        .map(|items| {
            let breakpoints: Vec<Value> = items
                .iter()
                .map(|bp| json!({"verified": true, "line": bp.get("line")}))
                .collect();
            json!({ "breakpoints": breakpoints })
        });
    Ok(Response::success(&request.command, body))
}

/// Line arguments of a recorded `setBreakpoints` request.
pub fn requested_lines(request: &Request<Value>) -> Vec<u64> {
    request
        .arguments
        .as_ref()
        .and_then(|args| args.get("breakpoints"))
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(|bp| bp["line"].as_u64()).collect())
        .unwrap_or_default()
}

pub fn requested_path(request: &Request<Value>) -> Option<String> {
    request.arguments.as_ref()?["source"]["path"]
        .as_str()
        .map(str::to_string)
}

/// Editor marker surface kept in memory. Markers can be moved to simulate
/// edits above them.
#[derive(Default)]
pub struct FakeMarkers {
    pub kinds: Mutex<Vec<String>>,
    placed: Mutex<BTreeMap<MarkerId, (String, String, u32)>>,
}

impl FakeMarkers {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// `(kind, file, line)` of every placed marker, ordered by id.
    pub fn placed(&self) -> Vec<(String, String, u32)> {
        self.placed.lock().values().cloned().collect()
    }

    pub fn kind_at(&self, file: &str, line: u32) -> Option<String> {
        self.placed
            .lock()
            .values()
            .find(|(_, f, l)| f == file && *l == line)
            .map(|(kind, _, _)| kind.clone())
    }

    /// Shift every marker of `file` at or below `from` by `delta` lines.
    pub fn shift(&self, file: &str, from: u32, delta: i64) {
        for (_, f, line) in self.placed.lock().values_mut() {
            if f == file && *line >= from {
                *line = u32::try_from(i64::from(*line) + delta).unwrap();
            }
        }
    }
}

impl MarkerService for FakeMarkers {
    fn define_kind(&self, kind: &str, _style: &MarkerStyle) {
        self.kinds.lock().push(kind.to_string());
    }

    fn place(&self, id: MarkerId, _group: &str, kind: &str, file: &str, line: u32) {
        self.placed
            .lock()
            .insert(id, (kind.to_string(), file.to_string(), line));
    }

    fn unplace(&self, id: MarkerId, _group: &str) {
        self.placed.lock().remove(&id);
    }

    fn locate(&self, file: &str, id: MarkerId) -> Option<u32> {
        self.placed
            .lock()
            .get(&id)
            .filter(|(_, f, _)| f == file)
            .map(|(_, _, line)| *line)
    }
}

/// Prompt service answering from a script and recording notices.
#[derive(Default)]
pub struct FakePrompt {
    answers: Mutex<VecDeque<String>>,
    pub asked: Mutex<Vec<String>>,
    pub notices: Mutex<Vec<(String, NotifyOptions)>>,
}

impl FakePrompt {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn answering(answers: &[&str]) -> Arc<Self> {
        let prompt = Self::default();
        prompt
            .answers
            .lock()
            .extend(answers.iter().map(|a| (*a).to_string()));
        Arc::new(prompt)
    }

    pub fn notice_texts(&self) -> Vec<String> {
        self.notices.lock().iter().map(|(m, _)| m.clone()).collect()
    }
}

impl PromptService for FakePrompt {
    fn ask(&self, prompt: &str, _default: &str) -> String {
        self.asked.lock().push(prompt.to_string());
        self.answers.lock().pop_front().unwrap_or_default()
    }

    fn notify(&self, message: &str, options: NotifyOptions) {
        self.notices.lock().push((message.to_string(), options));
    }
}

/// Display handler recording what the adapter verified.
#[derive(Default)]
pub struct FakeDisplay {
    pub clears: AtomicUsize,
    /// `(source path, verified breakpoint count)` per response.
    pub added: Mutex<Vec<(Option<String>, usize)>>,
}

impl FakeDisplay {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl BreakpointDisplayHandler for FakeDisplay {
    fn clear_all(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }

    fn add_breakpoints(&self, source: Option<&Source>, response: &Response<Value>) {
        self.added.lock().push((
            source.and_then(|s| s.path.clone()),
            response.breakpoints().len(),
        ));
    }
}

/// Capabilities of a modern adapter with no exception filters.
pub fn plain_capabilities() -> Capabilities {
    Capabilities {
        supports_configuration_done_request: Some(true),
        ..Capabilities::default()
    }
}

pub fn raised_filter(default: bool) -> ExceptionBreakpointsFilter {
    ExceptionBreakpointsFilter {
        filter: "raised".into(),
        label: "Raised Exceptions".into(),
        description: None,
        default: Some(default),
    }
}

pub struct Harness {
    pub project: ProjectBreakpoints,
    pub markers: Arc<FakeMarkers>,
    pub prompt: Arc<FakePrompt>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_prompt(FakePrompt::new())
    }

    pub fn with_prompt(prompt: Arc<FakePrompt>) -> Self {
        let markers = FakeMarkers::new();
        let project = ProjectBreakpoints::new(markers.clone(), prompt.clone());
        Self {
            project,
            markers,
            prompt,
        }
    }

    /// Connect `connection` with `capabilities`.
    pub fn connect(&self, connection: &Arc<FakeConnection>, capabilities: Capabilities) {
        self.project.on_connect(connection.clone());
        self.project.set_capabilities(capabilities);
    }
}

/// Completion callback that counts its invocations.
pub fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
    let fired = Arc::new(AtomicUsize::new(0));
    let handle = Arc::clone(&fired);
    (fired, move || {
        handle.fetch_add(1, Ordering::SeqCst);
    })
}
