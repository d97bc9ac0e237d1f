//! One synchronization pass with the debug adapter.
//! - SyncPlan::build: release markers, build every request up front
//! - issue: fan the plan out through the connection under a completion group
//! - handle_response: route each response or failure back into the model

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::completion::{CompletionGroup, CompletionToken};
use crate::error::BreakpointError;
use crate::exceptions;
use crate::host::{AdapterConnection, NotifyOptions, PromptService, RequestFailure};
use crate::markers::MarkerReconciler;
use crate::model::LineBreakpoint;
use crate::project::SyncContext;
use crate::protocol::{
    Capabilities, Request, Response, SetBreakpointsArguments, SetFunctionBreakpointsArguments,
    Source, SET_BREAKPOINTS, SET_EXCEPTION_BREAKPOINTS, SET_FUNCTION_BREAKPOINTS,
};
use crate::store::BreakpointStore;
use crate::temporary::{self, TemporaryBreakpoint};

/// Where a response is routed once it arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ResponseTarget {
    File {
        file: String,
        source: Source,
        temporaries: Vec<TemporaryBreakpoint>,
    },
    Functions,
    Exceptions,
}

#[derive(Debug, Clone)]
pub(crate) struct PlannedRequest {
    pub(crate) request: Request<Value>,
    pub(crate) target: ResponseTarget,
}

/// Every request of one pass, serialized before anything is sent.
#[derive(Debug, Clone, Default)]
pub(crate) struct SyncPlan {
    pub(crate) requests: Vec<PlannedRequest>,
}

impl SyncPlan {
    /// Build the pass from the current model.
    ///
    /// Marker positions are pulled into the breakpoints and the markers are
    /// released; the adapter's verified view replaces them.
    pub(crate) fn build(
        store: &mut BreakpointStore,
        markers: &MarkerReconciler,
        capabilities: &Capabilities,
    ) -> Result<Self, BreakpointError> {
        let mut requests = Vec::new();

        for (file, breakpoints) in store.lines_mut() {
            for bp in breakpoints.iter_mut() {
                markers.release(file, bp);
            }
            requests.push(file_request(file, breakpoints)?);
        }
        for file in store.take_vacated() {
            requests.push(file_request(&file, &[])?);
        }

        if capabilities.function_breakpoints() {
            let breakpoints = store
                .functions()
                .iter()
                .filter(|bp| bp.state.is_enabled())
                .map(|bp| bp.options.to_function_breakpoint(&bp.function))
                .collect();
            requests.push(PlannedRequest {
                request: Request::new(
                    SET_FUNCTION_BREAKPOINTS,
                    &SetFunctionBreakpointsArguments { breakpoints },
                )?,
                target: ResponseTarget::Functions,
            });
        }

        if let Some(filters) = store.exception_filters() {
            if exceptions::needs_request(capabilities, filters) {
                requests.push(PlannedRequest {
                    request: Request::new(SET_EXCEPTION_BREAKPOINTS, &filters.to_arguments())?,
                    target: ResponseTarget::Exceptions,
                });
            }
        }

        Ok(Self { requests })
    }

    pub(crate) fn file_count(&self) -> usize {
        self.requests
            .iter()
            .filter(|planned| matches!(planned.target, ResponseTarget::File { .. }))
            .count()
    }
}

fn file_request(
    file: &str,
    breakpoints: &[LineBreakpoint],
) -> Result<PlannedRequest, BreakpointError> {
    let mut payload = Vec::new();
    let mut temporaries = Vec::new();
    for bp in breakpoints.iter().filter(|bp| bp.state.is_enabled()) {
        if bp.is_temporary() {
            temporaries.push(TemporaryBreakpoint {
                index: payload.len(),
                line: bp.line,
            });
        }
        payload.push(bp.options.to_source_breakpoint(bp.line));
    }
    let source = Source::for_path(file);
    let arguments = SetBreakpointsArguments {
        source: source.clone(),
        breakpoints: Some(payload),
        lines: None,
        source_modified: Some(false),
    };
    Ok(PlannedRequest {
        request: Request::new(SET_BREAKPOINTS, &arguments)?,
        target: ResponseTarget::File {
            file: file.to_string(),
            source,
            temporaries,
        },
    })
}

/// Send every planned request; `group` fires once all of them have answered.
pub(crate) fn issue(
    plan: SyncPlan,
    connection: &Arc<dyn AdapterConnection>,
    context: &Arc<Mutex<SyncContext>>,
    prompt: &Arc<dyn PromptService>,
    mut group: CompletionGroup,
) {
    info!(
        files = plan.file_count(),
        requests = plan.requests.len(),
        "synchronizing breakpoints"
    );
    for planned in plan.requests {
        let token = group.enlist();
        let context = Arc::clone(context);
        let prompt = Arc::clone(prompt);
        let target = planned.target;
        connection.do_request(
            planned.request,
            Box::new(move |result| {
                handle_response(&context, prompt.as_ref(), &target, result, token);
            }),
        );
    }
    group.seal();
}

fn handle_response(
    context: &Mutex<SyncContext>,
    prompt: &dyn PromptService,
    target: &ResponseTarget,
    result: Result<Response<Value>, RequestFailure>,
    token: CompletionToken,
) {
    let response = match result {
        Ok(response) if response.success => response,
        Ok(response) => {
            let failure = RequestFailure {
                reason: response
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("{} failed", response.command)),
                message: None,
            };
            report_failure(context, prompt, &failure);
            token.finish();
            return;
        }
        Err(failure) => {
            report_failure(context, prompt, &failure);
            token.finish();
            return;
        }
    };

    let display = context.lock().display.clone();
    match target {
        ResponseTarget::File {
            file,
            source,
            temporaries,
        } => {
            if let Some(display) = &display {
                display.add_breakpoints(Some(source), &response);
            }
            let verified = response.breakpoints();
            let warnings = {
                let mut context = context.lock();
                temporary::reconcile(&mut context.store, file, temporaries, &verified)
            };
            for warning in warnings {
                prompt.notify(&warning, NotifyOptions::persistent_error());
            }
        }
        ResponseTarget::Functions => {
            if let Some(display) = &display {
                display.add_breakpoints(None, &response);
            }
        }
        ResponseTarget::Exceptions => {
            debug!("exception breakpoints accepted");
        }
    }
    token.finish();
}

fn report_failure(
    context: &Mutex<SyncContext>,
    prompt: &dyn PromptService,
    failure: &RequestFailure,
) {
    warn!(%failure, "adapter rejected breakpoint request");
    let connected = context.lock().connection.is_some();
    if connected {
        prompt.notify(
            &format!("Unable to set breakpoint: {}", failure.reason),
            NotifyOptions::persistent_error(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::{MarkerService, MarkerStyle};
    use crate::model::{BreakpointOptions, ExceptionFilterSet, MarkerId};
    use serde_json::json;

    struct NoMarkers;

    impl MarkerService for NoMarkers {
        fn define_kind(&self, _kind: &str, _style: &MarkerStyle) {}
        fn place(&self, _id: MarkerId, _group: &str, _kind: &str, _file: &str, _line: u32) {}
        fn unplace(&self, _id: MarkerId, _group: &str) {}
        fn locate(&self, _file: &str, _id: MarkerId) -> Option<u32> {
            None
        }
    }

    fn build(store: &mut BreakpointStore, capabilities: &Capabilities) -> SyncPlan {
        let markers = MarkerReconciler::new(Arc::new(NoMarkers));
        SyncPlan::build(store, &markers, capabilities).unwrap()
    }

    #[test]
    fn file_payload_skips_disabled_and_indexes_temporaries() {
        let mut store = BreakpointStore::new();
        store.set_line("virtual://a.py", 1, BreakpointOptions::default());
        store.toggle_line("virtual://a.py", 1, BreakpointOptions::default(), false);
        store.set_line("virtual://a.py", 4, BreakpointOptions::with_condition("n > 2"));
        store.set_line("virtual://a.py", 9, BreakpointOptions::temporary());

        let plan = build(&mut store, &Capabilities::default());
        assert_eq!(plan.requests.len(), 1);
        let planned = &plan.requests[0];
        assert_eq!(planned.request.command, SET_BREAKPOINTS);
        assert_eq!(
            planned.request.arguments,
            Some(json!({
                "source": {"name": "a.py", "path": "virtual://a.py"},
                "breakpoints": [
                    {"line": 4, "condition": "n > 2"},
                    {"line": 9}
                ],
                "sourceModified": false
            }))
        );
        let ResponseTarget::File { temporaries, .. } = &planned.target else {
            panic!("expected file target");
        };
        assert_eq!(temporaries, &vec![TemporaryBreakpoint { index: 1, line: 9 }]);
    }

    #[test]
    fn function_request_requires_capability() {
        let mut store = BreakpointStore::new();
        store.add_function("main", BreakpointOptions::default());
        assert!(build(&mut store, &Capabilities::default()).requests.is_empty());

        let capabilities = Capabilities {
            supports_function_breakpoints: Some(true),
            ..Capabilities::default()
        };
        let plan = build(&mut store, &capabilities);
        assert_eq!(plan.requests.len(), 1);
        assert_eq!(
            plan.requests[0].request.arguments,
            Some(json!({"breakpoints": [{"name": "main"}]}))
        );
    }

    #[test]
    fn vacated_files_get_one_empty_request() {
        let mut store = BreakpointStore::new();
        store.set_line("virtual://a.py", 3, BreakpointOptions::default());
        store.clear_line("virtual://a.py", 3);
        let plan = build(&mut store, &Capabilities::default());
        assert_eq!(plan.file_count(), 1);
        assert_eq!(
            plan.requests[0].request.arguments.as_ref().unwrap()["breakpoints"],
            json!([])
        );
        assert!(build(&mut store, &Capabilities::default()).requests.is_empty());
    }

    #[test]
    fn exception_request_follows_negotiated_set() {
        let mut store = BreakpointStore::new();
        store.set_exception_filters(Some(ExceptionFilterSet {
            filters: vec!["raised".into()],
            exception_options: None,
        }));
        let capabilities = Capabilities {
            supports_configuration_done_request: Some(true),
            ..Capabilities::default()
        };
        let plan = build(&mut store, &capabilities);
        assert_eq!(plan.requests.len(), 1);
        assert_eq!(plan.requests[0].target, ResponseTarget::Exceptions);
        assert_eq!(
            plan.requests[0].request.arguments,
            Some(json!({"filters": ["raised"]}))
        );
    }
}
