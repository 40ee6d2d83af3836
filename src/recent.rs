//! Recent-activity view: the last few scans for one (line, process) pair.

use crate::activity::ActivityRecord;

pub const DEFAULT_RECENT_COUNT: usize = 4;

/// Trailing `count` records matching `line_name` and `process` exactly, in
/// source order (most recent last).
pub fn recent<'a>(
    records: &'a [ActivityRecord],
    line_name: &str,
    process: &str,
    count: usize,
) -> Vec<&'a ActivityRecord> {
    let matching: Vec<&ActivityRecord> = records
        .iter()
        .filter(|r| r.line_name == line_name && r.process == process)
        .collect();
    let start = matching.len().saturating_sub(count);
    matching[start..].to_vec()
}
