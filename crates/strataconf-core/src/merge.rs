//! Structural merge
//!
//! Merges an override document into the settings tree, restricted to keys
//! the tree already has. Unknown keys are dropped rather than rejected; the
//! returned [`MergeReport`] says what happened so the caller can log it, or
//! fail in strict mode.
//!
//! Merge semantics:
//! - Key absent from the target: dropped
//! - Mapping over mapping: merged recursively
//! - Anything else over a non-mapping: overwritten, including `null` and `false`
//! - Mapping over non-mapping, or non-mapping over mapping: rejected, the
//!   shape of the target is kept
//! - Sequences are replaced, never merged element-wise

use crate::value::{join_key, Value};

/// Outcome of one [`merge_into`] call, as dotted keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Leaves that took the override's value
    pub applied: Vec<String>,
    /// Keys the target does not define
    pub dropped: Vec<String>,
    /// Keys whose override would change the shape of the target
    pub rejected: Vec<String>,
}

impl MergeReport {
    /// True when nothing was dropped or rejected
    pub fn is_clean(&self) -> bool {
        self.dropped.is_empty() && self.rejected.is_empty()
    }
}

/// Merge `source` into `target` in place
///
/// Both must be mappings for anything to happen; otherwise the target is
/// left unchanged and the report is empty. Never fails.
pub fn merge_into(target: &mut Value, source: Value) -> MergeReport {
    let mut report = MergeReport::default();
    merge_at(target, source, "", &mut report);
    report
}

fn merge_at(target: &mut Value, source: Value, prefix: &str, report: &mut MergeReport) {
    let (Value::Mapping(base), Value::Mapping(overlay)) = (target, source) else {
        return;
    };

    for (key, incoming) in overlay {
        let path = join_key(prefix, &key);
        let slot = match base.get_mut(&key) {
            Ok(Some(slot)) => slot,
            Ok(None) => {
                report.dropped.push(path);
                continue;
            }
            // frozen target
            Err(_) => {
                report.rejected.push(path);
                continue;
            }
        };

        match (slot.is_mapping(), incoming.is_mapping()) {
            (true, true) => merge_at(slot, incoming, &path, report),
            (false, false) => {
                *slot = incoming;
                report.applied.push(path);
            }
            _ => report.rejected.push(path),
        }
    }
}
