//! DAP message shapes used by the breakpoint synchronization pass.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

pub const SET_BREAKPOINTS: &str = "setBreakpoints";
pub const SET_FUNCTION_BREAKPOINTS: &str = "setFunctionBreakpoints";
pub const SET_EXCEPTION_BREAKPOINTS: &str = "setExceptionBreakpoints";

/// DAP envelope message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Request,
    Response,
    Event,
}

/// Outgoing request payload. The connection assigns `seq` and the envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Request<T> {
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<T>,
}

impl Request<Value> {
    /// Build a request with typed arguments serialized to JSON.
    pub fn new<A: Serialize>(command: &str, arguments: &A) -> Result<Self, serde_json::Error> {
        Ok(Self {
            command: command.to_string(),
            arguments: Some(serde_json::to_value(arguments)?),
        })
    }
}

/// Generic DAP response message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Response<T> {
    #[serde(default)]
    pub seq: u32,
    #[serde(rename = "type", default = "response_type")]
    pub message_type: MessageType,
    #[serde(rename = "request_seq", alias = "requestSeq", default)]
    pub request_seq: u32,
    pub success: bool,
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<T>,
}

fn response_type() -> MessageType {
    MessageType::Response
}

impl Response<Value> {
    /// Successful response carrying `body`.
    #[must_use]
    pub fn success(command: &str, body: Option<Value>) -> Self {
        Self {
            seq: 0,
            message_type: MessageType::Response,
            request_seq: 0,
            success: true,
            command: command.to_string(),
            message: None,
            body,
        }
    }

    /// Breakpoints reported in a `setBreakpoints` style body.
    ///
    /// A missing body yields an empty list. Entries are decoded one by one so
    /// positions stay aligned with the request; an undecodable entry becomes
    /// an unverified breakpoint.
    #[must_use]
    pub fn breakpoints(&self) -> Vec<Breakpoint> {
        let Some(items) = self
            .body
            .as_ref()
            .and_then(|body| body.get("breakpoints"))
            .and_then(Value::as_array)
        else {
            return Vec::new();
        };
        items
            .iter()
            .map(|item| {
                serde_json::from_value(item.clone()).unwrap_or_else(|err| {
                    debug!(%err, "undecodable breakpoint in adapter response");
                    Breakpoint::unverified()
                })
            })
            .collect()
    }
}

/// DAP source reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_reference: Option<u32>,
}

impl Source {
    /// Source for a file path, named after its final component.
    #[must_use]
    pub fn for_path(path: &str) -> Self {
        let name = std::path::Path::new(path)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(path)
            .to_string();
        Self {
            name: Some(name),
            path: Some(path.to_string()),
            source_reference: None,
        }
    }
}

/// Exception filter advertised by the adapter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionBreakpointsFilter {
    pub filter: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,
}

/// Capabilities advertised by the debug adapter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_configuration_done_request: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_function_breakpoints: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_conditional_breakpoints: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_hit_conditional_breakpoints: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_log_points: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_exception_options: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception_breakpoint_filters: Option<Vec<ExceptionBreakpointsFilter>>,
}

impl Capabilities {
    #[must_use]
    pub fn function_breakpoints(&self) -> bool {
        self.supports_function_breakpoints.unwrap_or(false)
    }

    #[must_use]
    pub fn configuration_done(&self) -> bool {
        self.supports_configuration_done_request.unwrap_or(false)
    }

    #[must_use]
    pub fn exception_options(&self) -> bool {
        self.supports_exception_options.unwrap_or(false)
    }

    #[must_use]
    pub fn exception_filters(&self) -> &[ExceptionBreakpointsFilter] {
        self.exception_breakpoint_filters.as_deref().unwrap_or(&[])
    }
}

/// Source breakpoint request entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourceBreakpoint {
    pub line: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hit_condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_message: Option<String>,
    #[serde(flatten)]
    pub additional: BTreeMap<String, Value>,
}

/// Function breakpoint request entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FunctionBreakpoint {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hit_condition: Option<String>,
    #[serde(flatten)]
    pub additional: BTreeMap<String, Value>,
}

/// Arguments for `setBreakpoints`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointsArguments {
    pub source: Source,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakpoints: Option<Vec<SourceBreakpoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_modified: Option<bool>,
}

/// Arguments for `setFunctionBreakpoints`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SetFunctionBreakpointsArguments {
    pub breakpoints: Vec<FunctionBreakpoint>,
}

/// Arguments for `setExceptionBreakpoints`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SetExceptionBreakpointsArguments {
    pub filters: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception_options: Option<Vec<Value>>,
}

/// DAP breakpoint response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Breakpoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    #[serde(default)]
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

impl Breakpoint {
    /// Placeholder for an entry the adapter did not describe usably.
    #[must_use]
    pub fn unverified() -> Self {
        Self {
            id: None,
            verified: false,
            message: None,
            source: None,
            line: None,
            column: None,
        }
    }
}

/// Response body for `setBreakpoints`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointsResponseBody {
    pub breakpoints: Vec<Breakpoint>,
}
