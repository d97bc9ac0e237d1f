//! Persistable breakpoint snapshot.
//!
//! The JSON layout mirrors the in-memory model: `line` maps a file to its
//! breakpoints, `function` lists function breakpoints and `exception` holds the
//! negotiated filters (`null` until negotiated). Marker ids never appear.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BreakpointError;
use crate::model::{ExceptionFilterSet, FunctionBreakpoint, LineBreakpoint};
use crate::store::BreakpointStore;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakpointSnapshot {
    #[serde(default)]
    pub line: IndexMap<String, Vec<LineBreakpoint>>,
    #[serde(default)]
    pub function: Vec<FunctionBreakpoint>,
    #[serde(default)]
    pub exception: Option<ExceptionFilterSet>,
}

impl BreakpointSnapshot {
    #[must_use]
    pub fn capture(store: &BreakpointStore) -> Self {
        let line = store
            .lines()
            .iter()
            .map(|(file, breakpoints)| {
                let breakpoints = breakpoints
                    .iter()
                    .cloned()
                    .map(|mut bp| {
                        bp.marker = None;
                        bp
                    })
                    .collect();
                (file.clone(), breakpoints)
            })
            .collect();
        Self {
            line,
            function: store.functions().to_vec(),
            exception: store.exception_filters().cloned(),
        }
    }

    pub fn to_json(&self) -> Result<String, BreakpointError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, BreakpointError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_value(value: Value) -> Result<Self, BreakpointError> {
        Ok(serde_json::from_value(value)?)
    }
}
