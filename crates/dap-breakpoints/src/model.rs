//! User-declared breakpoint records.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;
use std::collections::BTreeMap;

use crate::protocol::{self, SetExceptionBreakpointsArguments, SourceBreakpoint};

/// Enablement of a user breakpoint. Deletion removes the record instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakpointState {
    Enabled,
    Disabled,
}

impl BreakpointState {
    #[must_use]
    pub fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "ENABLED",
            Self::Disabled => "DISABLED",
        }
    }
}

/// Breakpoint options. Unknown adapter-specific keys pass through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakpointOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit_condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_message: Option<String>,
    /// One-shot breakpoint, e.g. run-to-cursor. Never sent to the adapter.
    ///
    /// Any truthy JSON value is accepted when reading (`1`, `"yes"`).
    #[serde(
        default,
        skip_serializing_if = "std::ops::Not::not",
        deserialize_with = "truthy"
    )]
    pub temporary: bool,
    #[serde(flatten)]
    pub additional: BTreeMap<String, Value>,
}

/// JSON truthiness: `null`, `false`, `0` and empty strings, arrays or
/// objects are false.
fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => false,
        Value::Bool(flag) => flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    })
}

impl BreakpointOptions {
    #[must_use]
    pub fn temporary() -> Self {
        Self {
            temporary: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_condition(condition: impl Into<String>) -> Self {
        Self {
            condition: Some(condition.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_log_message(message: impl Into<String>) -> Self {
        Self {
            log_message: Some(message.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_conditional(&self) -> bool {
        self.condition.is_some() || self.hit_condition.is_some()
    }

    #[must_use]
    pub fn is_logpoint(&self) -> bool {
        self.log_message.is_some()
    }

    /// Wire entry for `setBreakpoints`; the temporary flag is dropped.
    #[must_use]
    pub fn to_source_breakpoint(&self, line: u32) -> SourceBreakpoint {
        SourceBreakpoint {
            line,
            condition: self.condition.clone(),
            hit_condition: self.hit_condition.clone(),
            log_message: self.log_message.clone(),
            additional: self.additional_without("line"),
        }
    }

    /// Wire entry for `setFunctionBreakpoints`.
    #[must_use]
    pub fn to_function_breakpoint(&self, name: &str) -> protocol::FunctionBreakpoint {
        let mut additional = self.additional_without("name");
        if let Some(message) = &self.log_message {
            additional.insert("logMessage".to_string(), Value::String(message.clone()));
        }
        protocol::FunctionBreakpoint {
            name: name.to_string(),
            condition: self.condition.clone(),
            hit_condition: self.hit_condition.clone(),
            additional,
        }
    }

    fn additional_without(&self, key: &str) -> BTreeMap<String, Value> {
        self.additional
            .iter()
            .filter(|(name, _)| name.as_str() != key)
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Compact JSON rendering used by breakpoint listings.
    #[must_use]
    pub fn describe(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Opaque handle of a placed marker. Process-local, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u32);

/// A line breakpoint within one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineBreakpoint {
    pub state: BreakpointState,
    pub line: u32,
    #[serde(default)]
    pub options: BreakpointOptions,
    #[serde(skip)]
    pub marker: Option<MarkerId>,
}

impl LineBreakpoint {
    #[must_use]
    pub fn enabled(line: u32, options: BreakpointOptions) -> Self {
        Self {
            state: BreakpointState::Enabled,
            line,
            options,
            marker: None,
        }
    }

    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.options.temporary
    }
}

/// A breakpoint on a function name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionBreakpoint {
    pub state: BreakpointState,
    pub function: SmolStr,
    #[serde(default)]
    pub options: BreakpointOptions,
}

/// Exception filters negotiated with the adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionFilterSet {
    #[serde(default)]
    pub filters: Vec<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception_options: Option<Vec<Value>>,
}

impl ExceptionFilterSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty() && self.exception_options.is_none()
    }

    #[must_use]
    pub fn to_arguments(&self) -> SetExceptionBreakpointsArguments {
        SetExceptionBreakpointsArguments {
            filters: self.filters.iter().map(ToString::to_string).collect(),
            exception_options: self.exception_options.clone(),
        }
    }
}
