//! Shape and value locking
//!
//! Two passes over the same walk. [`lock_shape`] runs right after the
//! defaults are parsed and closes every mapping to new keys; [`lock_values`]
//! runs after the last override and freezes every mapping.
//!
//! Whether mappings nested inside sequences are locked is a policy choice,
//! see [`SequencePolicy`].

use crate::value::Value;

/// Lock markers carried by every mapping node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockState {
    closed: bool,
    frozen: bool,
}

impl LockState {
    /// No new keys may be added
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// No existing key may be reassigned or removed
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn close(&mut self) {
        self.closed = true;
    }

    // frozen implies closed
    fn freeze(&mut self) {
        self.closed = true;
        self.frozen = true;
    }
}

/// How the lock walk treats sequence elements
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SequencePolicy {
    /// Lock mappings found inside sequences as well
    #[default]
    Descend,
    /// Stop at sequences; their mapping elements stay open
    Skip,
}

/// Close every mapping in the tree to new keys
pub fn lock_shape(tree: &mut Value, policy: SequencePolicy) {
    walk(tree, policy, &LockState::close);
}

/// Freeze every mapping in the tree
pub fn lock_values(tree: &mut Value, policy: SequencePolicy) {
    walk(tree, policy, &LockState::freeze);
}

fn walk(value: &mut Value, policy: SequencePolicy, apply: &dyn Fn(&mut LockState)) {
    match value {
        Value::Mapping(table) => {
            apply(table.lock_state_mut());
            for child in table.children_mut() {
                walk(child, policy, apply);
            }
        }
        Value::Sequence(items) if policy == SequencePolicy::Descend => {
            for item in items {
                walk(item, policy, apply);
            }
        }
        _ => {}
    }
}
