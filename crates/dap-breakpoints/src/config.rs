//! Configured breakpoint defaults.
//!
//! Read-only input to exception filter negotiation. Loaded from a TOML file
//! (`[exception]` table) or from the JSON `breakpoints` object of a debug
//! configuration:
//!
//! ```toml
//! [exception]
//! raised = "N"
//! uncaught = true
//! ```

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;

use crate::error::BreakpointError;

/// User defaults consulted before prompting for exception filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfiguredBreakpoints {
    #[serde(default)]
    pub exception: IndexMap<SmolStr, ExceptionDefault>,
}

/// Raw configured value for one exception filter, validated on use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExceptionDefault {
    Flag(bool),
    Text(String),
    Other(Value),
}

/// Answer for one exception filter, configured or prompted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterAnswer {
    Yes,
    No,
    /// Defer to the adapter's own default for the filter.
    Default,
}

impl FilterAnswer {
    /// Interpret a prompt answer. Anything but `Y` or empty declines.
    #[must_use]
    pub fn from_prompt(answer: &str) -> Self {
        match answer {
            "Y" => Self::Yes,
            "" => Self::Default,
            _ => Self::No,
        }
    }

    #[must_use]
    pub fn includes(self, filter_default: bool) -> bool {
        match self {
            Self::Yes => true,
            Self::No => false,
            Self::Default => filter_default,
        }
    }
}

impl ExceptionDefault {
    /// Validate the configured value for `filter`.
    pub fn answer(&self, filter: &str) -> Result<FilterAnswer, BreakpointError> {
        match self {
            Self::Flag(true) => Ok(FilterAnswer::Yes),
            Self::Flag(false) => Ok(FilterAnswer::No),
            Self::Text(text) => match text.as_str() {
                "Y" => Ok(FilterAnswer::Yes),
                "N" => Ok(FilterAnswer::No),
                "" => Ok(FilterAnswer::Default),
                _ => Err(invalid(filter, text.clone())),
            },
            Self::Other(value) => Err(invalid(filter, value.to_string())),
        }
    }
}

fn invalid(filter: &str, value: String) -> BreakpointError {
    BreakpointError::InvalidExceptionFilterDefault {
        filter: filter.into(),
        value,
    }
}

impl ConfiguredBreakpoints {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BreakpointError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|err| BreakpointError::Config(format!("{}: {err}", path.display())))?;
        toml::from_str(&text)
            .map_err(|err| BreakpointError::Config(format!("{}: {err}", path.display())))
    }

    pub fn from_toml_str(text: &str) -> Result<Self, BreakpointError> {
        toml::from_str(text).map_err(|err| BreakpointError::Config(err.to_string()))
    }

    /// Parse the `breakpoints` object of a JSON debug configuration.
    pub fn from_json(value: Value) -> Result<Self, BreakpointError> {
        serde_json::from_value(value).map_err(|err| BreakpointError::Config(err.to_string()))
    }

    #[must_use]
    pub fn exception_default(&self, filter: &str) -> Option<&ExceptionDefault> {
        self.exception.get(filter)
    }
}
