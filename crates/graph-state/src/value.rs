// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Property value capabilities.

use std::fmt;
use std::hash::Hash;

use nickel::NodeIndex;

/// Value stored in a property bag.
///
/// A schema carries a single value type; applications with heterogeneous
/// properties use an enum. Values are totally ordered because canonicalization
/// compares them, and hashed because graph states are.
pub trait PropertyValue: Clone + Ord + Hash + fmt::Debug + Send + Sync + 'static {
    /// Value as seen from the opposite orientation.
    ///
    /// Only called for directed properties. Must be an involution:
    /// `v.negated().negated() == v`.
    fn negated(&self) -> Self;

    /// Node-valued capability, if this value depends on which endpoint of an
    /// edge is external.
    ///
    /// Scalar values keep the default and pass through externalization
    /// unchanged.
    fn as_externalizable(&self) -> Option<&dyn Externalizable<Self>> {
        None
    }
}

/// Capability of values that change when their edge becomes external.
pub trait Externalizable<V> {
    /// The value after the edge `nodes` became incident to `external_node`.
    ///
    /// Edge copies re-run externalization, so this must be idempotent.
    fn make_external(&self, nodes: (NodeIndex, NodeIndex), external_node: NodeIndex) -> V;
}

impl PropertyValue for i64 {
    fn negated(&self) -> Self {
        self.wrapping_neg()
    }
}

impl PropertyValue for i32 {
    fn negated(&self) -> Self {
        self.wrapping_neg()
    }
}

/// Value type for graphs without properties. It has no values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NoValue {}

impl PropertyValue for NoValue {
    fn negated(&self) -> Self {
        match *self {}
    }
}

impl fmt::Display for NoValue {
    fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_negation_is_an_involution_at_the_edges() {
        for v in [0i64, 7, -7, i64::MAX, i64::MIN] {
            assert_eq!(v.negated().negated(), v);
        }
        assert_eq!(5i32.negated(), -5);
    }

    #[test]
    fn scalars_are_not_externalizable() {
        assert!(3i64.as_externalizable().is_none());
    }
}
