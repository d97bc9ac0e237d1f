//! Temporary breakpoint reconciliation.
//!
//! The adapter answers `setBreakpoints` with one entry per requested
//! breakpoint, in request order. Temporary breakpoints remember their index in
//! the request so the verified line can be copied back; later removal (after a
//! run-to-cursor stop) then targets the line the adapter actually used.

use tracing::debug;

use crate::protocol::Breakpoint;
use crate::store::BreakpointStore;

/// A temporary breakpoint as sent in one `setBreakpoints` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporaryBreakpoint {
    /// Position in the request's `breakpoints` array.
    pub index: usize,
    /// Line sent to the adapter.
    pub line: u32,
}

/// Copy verified lines onto the temporary breakpoints of `file`.
///
/// Returns user-facing warnings for temporaries the adapter did not verify.
pub fn reconcile(
    store: &mut BreakpointStore,
    file: &str,
    temporaries: &[TemporaryBreakpoint],
    response: &[Breakpoint],
) -> Vec<String> {
    let mut warnings = Vec::new();
    let mut updates = Vec::new();
    let stored = store.file_breakpoints(file);

    for temporary in temporaries {
        let Some(entry) = response.get(temporary.index) else {
            debug!(
                file,
                index = temporary.index,
                line = temporary.line,
                returned = response.len(),
                "adapter response has no entry for temporary breakpoint"
            );
            continue;
        };
        let verified_line = entry.line.filter(|_| entry.verified);
        let Some(verified_line) = verified_line else {
            warnings.push(format!(
                "Unable to set temporary breakpoint at line {} execution will continue...",
                temporary.line
            ));
            continue;
        };
        let Some(position) = stored
            .iter()
            .position(|bp| bp.is_temporary() && bp.line == temporary.line)
        else {
            debug!(file, line = temporary.line, "temporary breakpoint removed before response");
            continue;
        };
        updates.push((position, verified_line));
    }

    if let Some(breakpoints) = store.file_breakpoints_mut(file) {
        for (position, line) in updates {
            let bp = &mut breakpoints[position];
            if bp.line != line {
                debug!(file, from = bp.line, to = line, "temporary breakpoint relocated");
            }
            bp.line = line;
        }
    }
    warnings
}
