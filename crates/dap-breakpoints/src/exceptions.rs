//! Exception filter negotiation.
//! - negotiate: capabilities + configured defaults + prompts -> filter set
//! - needs_request: whether a set must be pushed with setExceptionBreakpoints

use tracing::debug;

use crate::config::{ConfiguredBreakpoints, FilterAnswer};
use crate::error::BreakpointError;
use crate::host::PromptService;
use crate::model::ExceptionFilterSet;
use crate::protocol::Capabilities;

/// Derive the exception filter set for the connected adapter.
///
/// Configured defaults are validated for every declared filter before the
/// first prompt, so an invalid value fails without asking anything.
pub fn negotiate(
    capabilities: &Capabilities,
    configured: &ConfiguredBreakpoints,
    prompt: &dyn PromptService,
) -> Result<ExceptionFilterSet, BreakpointError> {
    let declared = capabilities.exception_filters();
    if declared.is_empty() && capabilities.configuration_done() {
        return Ok(ExceptionFilterSet::default());
    }

    let configured_answers = declared
        .iter()
        .map(|filter| {
            configured
                .exception_default(&filter.filter)
                .map(|value| value.answer(&filter.filter))
                .transpose()
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut filters = Vec::new();
    for (filter, configured_answer) in declared.iter().zip(configured_answers) {
        let enabled_by_default = filter.default.unwrap_or(false);
        let answer = configured_answer.unwrap_or_else(|| {
            let default_value = if enabled_by_default { "Y" } else { "N" };
            let question = format!(
                "{}: Break on {} (Y/N/default: {default_value})? ",
                filter.filter, filter.label
            );
            FilterAnswer::from_prompt(&prompt.ask(&question, default_value))
        });
        debug!(filter = %filter.filter, ?answer, "exception filter resolved");
        if answer.includes(enabled_by_default) {
            filters.push(filter.filter.as_str().into());
        }
    }

    Ok(ExceptionFilterSet {
        filters,
        exception_options: capabilities.exception_options().then(Vec::new),
    })
}

/// Whether `set` has to be sent to the adapter.
///
/// An empty set still goes out when the adapter declares filters (to switch
/// off its defaults) or lacks `configurationDone`, where the exception request
/// marks the end of configuration.
#[must_use]
pub fn needs_request(capabilities: &Capabilities, set: &ExceptionFilterSet) -> bool {
    !set.is_empty()
        || !capabilities.exception_filters().is_empty()
        || !capabilities.configuration_done()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExceptionDefault;
    use crate::host::NotifyOptions;
    use crate::protocol::ExceptionBreakpointsFilter;
    use parking_lot::Mutex;

    struct Scripted {
        answers: Mutex<Vec<&'static str>>,
        asked: Mutex<Vec<(String, String)>>,
    }

    impl Scripted {
        fn new(answers: &[&'static str]) -> Self {
            Self {
                answers: Mutex::new(answers.iter().rev().copied().collect()),
                asked: Mutex::new(Vec::new()),
            }
        }
    }

    impl PromptService for Scripted {
        fn ask(&self, prompt: &str, default: &str) -> String {
            self.asked
                .lock()
                .push((prompt.to_string(), default.to_string()));
            self.answers.lock().pop().unwrap_or_default().to_string()
        }

        fn notify(&self, _message: &str, _options: NotifyOptions) {}
    }

    fn raised_filter() -> ExceptionBreakpointsFilter {
        ExceptionBreakpointsFilter {
            filter: "raised".into(),
            label: "Raised".into(),
            description: None,
            default: Some(true),
        }
    }

    fn caps_with(filters: Vec<ExceptionBreakpointsFilter>) -> Capabilities {
        Capabilities {
            exception_breakpoint_filters: Some(filters),
            supports_configuration_done_request: Some(true),
            ..Capabilities::default()
        }
    }

    #[test]
    fn empty_answer_uses_filter_default() {
        let prompt = Scripted::new(&[""]);
        let set = negotiate(
            &caps_with(vec![raised_filter()]),
            &ConfiguredBreakpoints::default(),
            &prompt,
        )
        .unwrap();
        assert_eq!(set.filters, vec!["raised"]);
        let asked = prompt.asked.lock();
        assert_eq!(asked[0].0, "raised: Break on Raised (Y/N/default: Y)? ");
        assert_eq!(asked[0].1, "Y");
    }

    #[test]
    fn no_answer_excludes_filter() {
        let prompt = Scripted::new(&["N"]);
        let set = negotiate(
            &caps_with(vec![raised_filter()]),
            &ConfiguredBreakpoints::default(),
            &prompt,
        )
        .unwrap();
        assert!(set.filters.is_empty());
    }

    #[test]
    fn configured_default_skips_prompt() {
        let prompt = Scripted::new(&[]);
        let mut configured = ConfiguredBreakpoints::default();
        configured
            .exception
            .insert("raised".into(), ExceptionDefault::Flag(false));
        let set = negotiate(&caps_with(vec![raised_filter()]), &configured, &prompt).unwrap();
        assert!(set.filters.is_empty());
        assert!(prompt.asked.lock().is_empty());
    }

    #[test]
    fn invalid_configured_default_fails_before_prompting() {
        let prompt = Scripted::new(&["Y"]);
        let uncaught = ExceptionBreakpointsFilter {
            filter: "uncaught".into(),
            label: "Uncaught".into(),
            description: None,
            default: None,
        };
        let mut configured = ConfiguredBreakpoints::default();
        configured
            .exception
            .insert("uncaught".into(), ExceptionDefault::Text("maybe".into()));
        let err = negotiate(
            &caps_with(vec![raised_filter(), uncaught]),
            &configured,
            &prompt,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            BreakpointError::InvalidExceptionFilterDefault { ref filter, .. } if filter == "uncaught"
        ));
        assert!(prompt.asked.lock().is_empty());
    }

    #[test]
    fn nothing_to_negotiate_with_configuration_done() {
        let prompt = Scripted::new(&[]);
        let caps = Capabilities {
            supports_configuration_done_request: Some(true),
            ..Capabilities::default()
        };
        let set = negotiate(&caps, &ConfiguredBreakpoints::default(), &prompt).unwrap();
        assert!(set.is_empty());
        assert!(!needs_request(&caps, &set));
    }

    #[test]
    fn legacy_adapter_still_gets_an_exception_request() {
        let prompt = Scripted::new(&[]);
        let caps = Capabilities::default();
        let set = negotiate(&caps, &ConfiguredBreakpoints::default(), &prompt).unwrap();
        assert!(set.is_empty());
        assert!(needs_request(&caps, &set));
    }

    #[test]
    fn exception_options_placeholder() {
        let prompt = Scripted::new(&["Y"]);
        let mut caps = caps_with(vec![raised_filter()]);
        caps.supports_exception_options = Some(true);
        let set = negotiate(&caps, &ConfiguredBreakpoints::default(), &prompt).unwrap();
        assert_eq!(set.exception_options, Some(Vec::new()));
    }
}
