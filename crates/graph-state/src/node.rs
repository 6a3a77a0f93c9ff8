// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Graph nodes.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use nickel::{NodeIndex, LEG};

use crate::bag::PropertyBag;
use crate::edge::NodeArg;
use crate::value::PropertyValue;

/// Ordering key of a node: its index, then its property values.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeKey<V> {
    /// Node index.
    pub index: NodeIndex,
    /// Applicable node property values in schema order.
    pub properties: Vec<Option<V>>,
}

/// A node index with optional node properties.
///
/// The external leg is the node with index [`LEG`]; it never carries
/// properties and orders before every ordinary node.
#[derive(Clone)]
pub struct Node<V> {
    index: NodeIndex,
    properties: Option<PropertyBag<V>>,
    key: OnceLock<NodeKey<V>>,
}

impl<V: PropertyValue> Node<V> {
    /// A node without properties.
    pub fn new(index: NodeIndex) -> Self {
        Self {
            index,
            properties: None,
            key: OnceLock::new(),
        }
    }

    /// The external leg.
    pub fn leg() -> Self {
        Self::new(LEG)
    }

    /// A node carrying `properties` (a bag built with `from_edge == false`).
    pub fn with_properties(index: NodeIndex, properties: PropertyBag<V>) -> Self {
        Self {
            index,
            properties: Some(properties),
            key: OnceLock::new(),
        }
    }

    /// Resolves an endpoint argument: an existing node passes through
    /// unchanged, a raw index is wrapped with `properties`.
    pub fn build(arg: impl Into<NodeArg<V>>, properties: Option<PropertyBag<V>>) -> Self {
        match arg.into() {
            NodeArg::Node(node) => node,
            NodeArg::Index(index) => Self {
                index,
                properties,
                key: OnceLock::new(),
            },
        }
    }

    /// The same node under a new index; properties are kept as they are.
    pub fn remap(&self, new_index: NodeIndex) -> Self {
        Self {
            index: new_index,
            properties: self.properties.clone(),
            key: OnceLock::new(),
        }
    }

    pub(crate) fn with_bag(&self, properties: Option<PropertyBag<V>>) -> Self {
        Self {
            index: self.index,
            properties,
            key: OnceLock::new(),
        }
    }

    /// Node index.
    pub fn index(&self) -> NodeIndex {
        self.index
    }

    /// Whether this is the external leg.
    pub fn is_leg(&self) -> bool {
        self.index == LEG
    }

    /// Node properties, if any.
    pub fn properties(&self) -> Option<&PropertyBag<V>> {
        self.properties.as_ref()
    }

    /// Value of the property at schema index `i`, if set.
    pub fn value_at(&self, i: usize) -> Option<&V> {
        self.properties.as_ref().and_then(|bag| bag.get_at(i))
    }

    /// `(index, property values...)`. Computed once.
    pub fn key(&self) -> &NodeKey<V> {
        self.key.get_or_init(|| NodeKey {
            index: self.index,
            properties: self
                .properties
                .as_ref()
                .map(|bag| bag.key().to_vec())
                .unwrap_or_default(),
        })
    }
}

impl<V: PropertyValue> From<NodeIndex> for Node<V> {
    fn from(index: NodeIndex) -> Self {
        Self::new(index)
    }
}

impl<V: PropertyValue> PartialEq for Node<V> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<V: PropertyValue> Eq for Node<V> {}

impl<V: PropertyValue> PartialOrd for Node<V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<V: PropertyValue> Ord for Node<V> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(other.key())
    }
}

impl<V: PropertyValue> Hash for Node<V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl<V: PropertyValue> fmt::Debug for Node<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut t = f.debug_tuple("Node");
        if self.is_leg() {
            t.field(&format_args!("LEG"));
        } else {
            t.field(&self.index);
        }
        if let Some(bag) = &self.properties {
            if !bag.is_none() {
                t.field(bag);
            }
        }
        t.finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::schema::{DisplayCodec, PropertyKey, PropertySchema};

    #[test]
    fn legs_order_before_ordinary_nodes() {
        let leg = Node::<i64>::leg();
        assert!(leg.is_leg());
        assert!(leg < Node::new(0));
        assert_eq!(Node::<i64>::from(3).key().index, 3);
    }

    #[test]
    fn build_passes_existing_nodes_through() {
        let schema = PropertySchema::create(vec![PropertyKey::node(
            "charge",
            false,
            DisplayCodec::<i64>::shared(),
        )])
        .unwrap();
        let bag = PropertyBag::from_values(false, &schema, [("charge", 2)]).unwrap();
        let wrapped = Node::build(4, Some(bag.clone()));
        assert_eq!(wrapped.value_at(0), Some(&2));
        let existing = Node::<i64>::new(4);
        assert_eq!(Node::build(existing.clone(), Some(bag)), existing);
        assert!(Node::build(existing, None).properties().is_none());
    }

    #[test]
    fn remap_keeps_properties() {
        let schema = PropertySchema::create(vec![PropertyKey::node(
            "charge",
            false,
            DisplayCodec::<i64>::shared(),
        )])
        .unwrap();
        let bag = PropertyBag::from_values(false, &schema, [("charge", 2)]).unwrap();
        let node = Node::with_properties(5, bag);
        let moved = node.remap(1);
        assert_eq!(moved.index(), 1);
        assert_eq!(moved.value_at(0), Some(&2));
        assert_eq!(moved.key().properties, vec![Some(2)]);
    }

    #[test]
    fn ordering_uses_index_then_properties() {
        let schema = PropertySchema::create(vec![PropertyKey::node(
            "charge",
            false,
            DisplayCodec::<i64>::shared(),
        )])
        .unwrap();
        let low = Node::with_properties(
            2,
            PropertyBag::from_values(false, &schema, [("charge", 1)]).unwrap(),
        );
        let high = Node::with_properties(
            2,
            PropertyBag::from_values(false, &schema, [("charge", 4)]).unwrap(),
        );
        assert!(low < high);
        assert!(high < Node::new(3));
    }
}
