// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Edges and their orientation normalization.
//!
//! Every edge, however it is produced (builder, copy, tadpole cut), goes
//! through the same assembly step:
//! 1. nodes of a schema-carrying edge get a node bag; the leg never does,
//! 2. if exactly one endpoint is internal, the edge bag is externalized,
//! 3. if the first node index exceeds the second, the pair is swapped and the
//!    edge bag negated.
//!
//! After assembly an edge never changes.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use nickel::{NodeIndex, NodeMap, LEG};

use crate::bag::PropertyBag;
use crate::edge_id::{global_edge_ids, EdgeId, EdgeIdGenerator};
use crate::error::GraphError;
use crate::node::{Node, NodeKey};
use crate::schema::PropertySchema;
use crate::value::PropertyValue;

/// Ordering key of an edge.
///
/// Field order is comparison order: internal node indices, edge property
/// values, then both node keys.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeKey<V> {
    /// Indices of the endpoints that are not the external node.
    pub internal_nodes: Vec<NodeIndex>,
    /// Edge property values in schema order.
    pub properties: Vec<Option<V>>,
    /// Keys of both stored endpoints.
    pub nodes: [NodeKey<V>; 2],
}

/// Endpoint argument for [`EdgeBuilder`]: a raw index (wrapped with the
/// builder's node properties) or a ready node (used as is).
#[derive(Clone)]
pub enum NodeArg<V> {
    /// Raw node index.
    Index(NodeIndex),
    /// Existing node.
    Node(Node<V>),
}

impl<V> From<NodeIndex> for NodeArg<V> {
    fn from(index: NodeIndex) -> Self {
        Self::Index(index)
    }
}

impl<V> From<Node<V>> for NodeArg<V> {
    fn from(node: Node<V>) -> Self {
        Self::Node(node)
    }
}

/// Builder for [`Edge`].
#[derive(Clone)]
pub struct EdgeBuilder<V> {
    nodes: [NodeArg<V>; 2],
    external_node: NodeIndex,
    edge_id: Option<EdgeId>,
    schema: Option<Arc<PropertySchema<V>>>,
    values: Vec<(String, V)>,
}

impl<V: PropertyValue> EdgeBuilder<V> {
    /// Marks `node` as the external connection point (default [`LEG`]).
    pub fn external(mut self, node: NodeIndex) -> Self {
        self.external_node = node;
        self
    }

    /// Uses `id` instead of drawing one from the generator.
    pub fn id(mut self, id: EdgeId) -> Self {
        self.edge_id = Some(id);
        self
    }

    /// Attaches the schema that property values are checked against.
    pub fn schema(mut self, schema: &Arc<PropertySchema<V>>) -> Self {
        self.schema = Some(Arc::clone(schema));
        self
    }

    /// Sets one property value. Node properties apply to endpoints given as
    /// raw indices.
    pub fn property(mut self, name: impl Into<String>, value: V) -> Self {
        self.values.push((name.into(), value));
        self
    }

    /// Builds the edge, drawing its id from [`global_edge_ids`] if none was set.
    pub fn build(self) -> Result<Edge<V>, GraphError> {
        self.build_with(global_edge_ids())
    }

    /// Builds the edge, drawing its id from `ids` if none was set.
    ///
    /// # Errors
    /// [`GraphError::MissingEdgeId`] if no id was set and `ids` does not
    /// assign one; [`GraphError::UnknownProperty`] for values the schema does
    /// not declare (or any value when there is no schema).
    pub fn build_with(self, ids: &dyn EdgeIdGenerator) -> Result<Edge<V>, GraphError> {
        let edge_id = self
            .edge_id
            .or_else(|| ids.next_id())
            .ok_or(GraphError::MissingEdgeId)?;
        let Some(schema) = self.schema else {
            if let Some((name, _)) = self.values.first() {
                return Err(GraphError::UnknownProperty(name.clone()));
            }
            let [a, b] = self.nodes.map(|arg| Node::build(arg, None));
            return Ok(Edge::assemble([a, b], self.external_node, edge_id, None));
        };
        let properties = PropertyBag::from_values(true, &schema, self.values.iter().cloned())?;
        let node_bag = PropertyBag::from_values(false, &schema, self.values.iter().cloned())?;
        let [a, b] = self.nodes.map(|arg| Node::build(arg, Some(node_bag.clone())));
        Ok(Edge::assemble(
            [a, b],
            self.external_node,
            edge_id,
            Some(properties),
        ))
    }
}

/// An edge between two nodes, possibly with one endpoint external.
#[derive(Clone)]
pub struct Edge<V> {
    nodes: [Node<V>; 2],
    external_node: NodeIndex,
    edge_id: EdgeId,
    properties: Option<PropertyBag<V>>,
    key: OnceLock<EdgeKey<V>>,
}

impl<V: PropertyValue> Edge<V> {
    /// Starts building an edge between `a` and `b`.
    pub fn builder(a: impl Into<NodeArg<V>>, b: impl Into<NodeArg<V>>) -> EdgeBuilder<V> {
        EdgeBuilder {
            nodes: [a.into(), b.into()],
            external_node: LEG,
            edge_id: None,
            schema: None,
            values: Vec::new(),
        }
    }

    pub(crate) fn assemble(
        nodes: [Node<V>; 2],
        external_node: NodeIndex,
        edge_id: EdgeId,
        properties: Option<PropertyBag<V>>,
    ) -> Self {
        let [a, b] = nodes.map(|n| match properties.as_ref() {
            _ if n.is_leg() => n.with_bag(None),
            Some(bag) if n.properties().is_none() => {
                n.with_bag(Some(PropertyBag::empty(false, bag.schema())))
            }
            _ => n,
        });
        let internal = [&a, &b]
            .iter()
            .filter(|n| n.index() != external_node)
            .count();
        let mut properties = properties;
        if internal == 1 {
            properties = properties.map(|p| p.externalize((a.index(), b.index()), external_node));
        }
        let nodes = if a.index() > b.index() {
            properties = properties.map(|p| p.negate());
            [b, a]
        } else {
            [a, b]
        };
        Self {
            nodes,
            external_node,
            edge_id,
            properties,
            key: OnceLock::new(),
        }
    }

    /// Stored endpoints; the first index never exceeds the second.
    pub fn nodes(&self) -> &[Node<V>; 2] {
        &self.nodes
    }

    /// External connection point ([`LEG`] unless set otherwise).
    pub fn external_node(&self) -> NodeIndex {
        self.external_node
    }

    /// Endpoints other than the external node, in stored order.
    pub fn internal_nodes(&self) -> Vec<&Node<V>> {
        self.nodes
            .iter()
            .filter(|n| n.index() != self.external_node)
            .collect()
    }

    /// Whether exactly one endpoint is internal.
    pub fn is_external(&self) -> bool {
        self.internal_nodes().len() == 1
    }

    /// Edge id.
    pub fn edge_id(&self) -> EdgeId {
        self.edge_id
    }

    /// Edge properties, already externalized for external edges.
    pub fn properties(&self) -> Option<&PropertyBag<V>> {
        self.properties.as_ref()
    }

    /// Schema of the edge properties.
    pub fn schema(&self) -> Option<&Arc<PropertySchema<V>>> {
        self.properties.as_ref().map(PropertyBag::schema)
    }

    /// Ordering key. Computed once.
    pub fn key(&self) -> &EdgeKey<V> {
        self.key.get_or_init(|| EdgeKey {
            internal_nodes: self.internal_nodes().iter().map(|n| n.index()).collect(),
            properties: self
                .properties
                .as_ref()
                .map(|bag| bag.key().to_vec())
                .unwrap_or_default(),
            nodes: [self.nodes[0].key().clone(), self.nodes[1].key().clone()],
        })
    }

    /// The same edge with node bags replaced from `bags`; endpoints missing
    /// from `bags` are kept. Orientation and edge values are unchanged.
    pub(crate) fn with_node_bags(&self, bags: &BTreeMap<NodeIndex, PropertyBag<V>>) -> Self {
        let nodes = self.nodes.clone().map(|n| match bags.get(&n.index()) {
            Some(bag) => n.with_bag(Some(bag.clone())),
            None => n,
        });
        Self {
            nodes,
            external_node: self.external_node,
            edge_id: self.edge_id,
            properties: self.properties.clone(),
            key: OnceLock::new(),
        }
    }

    /// Raw endpoint indices as fed to the topology oracle.
    pub(crate) fn index_pair(&self) -> (NodeIndex, NodeIndex) {
        (self.nodes[0].index(), self.nodes[1].index())
    }

    /// Node whose topology segment lists this edge.
    pub(crate) fn owner(&self) -> NodeIndex {
        if self.nodes[0].is_leg() {
            self.nodes[1].index()
        } else {
            self.nodes[0].index()
        }
    }

    /// The other endpoint. A self-loop returns its only node.
    pub fn co_node(&self, node: NodeIndex) -> Result<&Node<V>, GraphError> {
        match self.endpoint(node)? {
            0 => Ok(&self.nodes[1]),
            _ => Ok(&self.nodes[0]),
        }
    }

    fn endpoint(&self, node: NodeIndex) -> Result<usize, GraphError> {
        self.nodes
            .iter()
            .position(|n| n.index() == node)
            .ok_or(GraphError::NotAnEndpoint {
                node,
                edge_id: self.edge_id,
            })
    }

    /// Value of `name` as seen from `node`: stored values face away from the
    /// first endpoint, so directed values are negated for the second.
    pub fn get_attr_regard_to(&self, node: NodeIndex, name: &str) -> Result<Option<V>, GraphError> {
        let position = self.endpoint(node)?;
        let bag = self
            .properties
            .as_ref()
            .ok_or_else(|| GraphError::UnknownProperty(name.to_owned()))?;
        let i = bag
            .schema()
            .position(name)
            .ok_or_else(|| GraphError::UnknownProperty(name.to_owned()))?;
        let value = bag.get_at(i);
        Ok(match position {
            0 => value.cloned(),
            _ if bag.schema().directed_at(i) => value.map(PropertyValue::negated),
            _ => value.cloned(),
        })
    }

    /// Splits an internal self-loop into two leg edges on the same node, one
    /// per direction.
    pub fn cut_tadpole(&self, ids: &dyn EdgeIdGenerator) -> Result<(Self, Self), GraphError> {
        let [a, b] = &self.nodes;
        if a.index() != b.index() || self.internal_nodes().len() != 2 {
            return Err(GraphError::NotATadpole {
                edge_id: self.edge_id,
            });
        }
        let outgoing = Self::assemble(
            [a.clone(), Node::leg()],
            LEG,
            ids.next_id().ok_or(GraphError::MissingEdgeId)?,
            self.properties.clone(),
        );
        let incoming = Self::assemble(
            [Node::leg(), a.clone()],
            LEG,
            ids.next_id().ok_or(GraphError::MissingEdgeId)?,
            self.properties.clone(),
        );
        Ok((outgoing, incoming))
    }

    /// Relabels the endpoints (and the external node) through `node_map`;
    /// unmapped indices are kept. Orientation is renormalized.
    pub fn copy(&self, node_map: &NodeMap) -> Self {
        let remap = |n: NodeIndex| node_map.get(&n).copied().unwrap_or(n);
        let nodes = [
            self.nodes[0].remap(remap(self.nodes[0].index())),
            self.nodes[1].remap(remap(self.nodes[1].index())),
        ];
        Self::assemble(
            nodes,
            remap(self.external_node),
            self.edge_id,
            self.properties.clone(),
        )
    }

    /// [`copy`](Self::copy) with property overrides applied to the edge bag
    /// and to both node bags.
    pub fn copy_with<K: AsRef<str>>(
        &self,
        node_map: &NodeMap,
        overrides: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, GraphError> {
        let overrides: Vec<(String, V)> = overrides
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_owned(), v))
            .collect();
        let Some(bag) = &self.properties else {
            return match overrides.first() {
                Some((name, _)) => Err(GraphError::UnknownProperty(name.clone())),
                None => Ok(self.copy(node_map)),
            };
        };
        let properties = bag.update(true, overrides.iter().cloned())?;
        let remap = |n: NodeIndex| node_map.get(&n).copied().unwrap_or(n);
        let moved = |node: &Node<V>| -> Result<Node<V>, GraphError> {
            let updated = node
                .properties()
                .map(|nb| nb.update(false, overrides.iter().cloned()))
                .transpose()?;
            Ok(node.remap(remap(node.index())).with_bag(updated))
        };
        Ok(Self::assemble(
            [moved(&self.nodes[0])?, moved(&self.nodes[1])?],
            remap(self.external_node),
            self.edge_id,
            Some(properties),
        ))
    }

    /// Total order on edges sharing a schema.
    ///
    /// # Errors
    /// [`GraphError::SchemaMismatch`] across schema instances.
    pub fn compare(&self, other: &Self) -> Result<Ordering, GraphError> {
        self.check_schema(other)?;
        Ok(self.key().cmp(other.key()))
    }

    /// Compares only the property at schema index `i`: edge properties via
    /// the bags, node properties endpoint by endpoint.
    pub fn compare_by_property_index(&self, other: &Self, i: usize) -> Result<Ordering, GraphError> {
        self.check_schema(other)?;
        let (Some(ours), Some(theirs)) = (&self.properties, &other.properties) else {
            return Ok(Ordering::Equal);
        };
        if ours.schema().edge_property_at(i) {
            return ours.compare_by_index(theirs, i);
        }
        Ok(self
            .nodes
            .iter()
            .zip(&other.nodes)
            .map(|(a, b)| a.value_at(i).cmp(&b.value_at(i)))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal))
    }

    pub(crate) fn check_schema(&self, other: &Self) -> Result<(), GraphError> {
        match (self.schema(), other.schema()) {
            (None, None) => Ok(()),
            (Some(a), Some(b)) if PropertySchema::same(a, b) => Ok(()),
            _ => Err(GraphError::SchemaMismatch),
        }
    }
}

impl<V: PropertyValue> PartialEq for Edge<V> {
    fn eq(&self, other: &Self) -> bool {
        self.check_schema(other).is_ok() && self.key() == other.key()
    }
}

impl<V: PropertyValue> Eq for Edge<V> {}

impl<V: PropertyValue> Hash for Edge<V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl<V: PropertyValue> fmt::Debug for Edge<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Edge");
        s.field("nodes", &self.nodes);
        if self.external_node != LEG {
            s.field("external_node", &self.external_node);
        }
        s.field("edge_id", &self.edge_id);
        if let Some(bag) = &self.properties {
            s.field("properties", bag);
        }
        s.finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::edge_id::EdgeIds;
    use crate::schema::{DisplayCodec, PropertyKey};

    fn schema() -> Arc<PropertySchema<i64>> {
        PropertySchema::create(vec![
            PropertyKey::edge("weight", true, DisplayCodec::<i64>::shared()),
            PropertyKey::edge("color", false, DisplayCodec::<i64>::shared()),
            PropertyKey::node("charge", false, DisplayCodec::<i64>::shared()),
        ])
        .unwrap()
    }

    fn edge(a: NodeIndex, b: NodeIndex, weight: i64) -> Edge<i64> {
        Edge::builder(a, b)
            .schema(&schema_cache())
            .property("weight", weight)
            .property("color", 1)
            .build()
            .unwrap()
    }

    fn schema_cache() -> Arc<PropertySchema<i64>> {
        static SCHEMA: OnceLock<Arc<PropertySchema<i64>>> = OnceLock::new();
        Arc::clone(SCHEMA.get_or_init(schema))
    }

    #[test]
    fn swapped_construction_negates_directed_values() {
        let e = edge(3, 1, 5);
        assert_eq!(e.nodes()[0].index(), 1);
        assert_eq!(e.nodes()[1].index(), 3);
        assert_eq!(e.properties().unwrap().get("weight"), Some(&-5));
        assert_eq!(e.properties().unwrap().get("color"), Some(&1));
        assert_eq!(e.key(), edge(1, 3, -5).key());
        assert_eq!(e, edge(1, 3, -5));
    }

    #[test]
    fn leg_edges_are_external() {
        let e = edge(0, LEG, 2);
        assert!(e.is_external());
        assert_eq!(e.internal_nodes().len(), 1);
        assert_eq!(e.internal_nodes()[0].index(), 0);
        assert!(e.nodes()[0].is_leg());
        assert!(e.nodes()[0].properties().is_none());
        assert_eq!(e.key().internal_nodes, vec![0]);
        assert!(!edge(0, 1, 2).is_external());
    }

    #[test]
    fn regard_to_negates_for_second_endpoint() {
        let e = edge(0, 1, 7);
        assert_eq!(e.get_attr_regard_to(0, "weight"), Ok(Some(7)));
        assert_eq!(e.get_attr_regard_to(1, "weight"), Ok(Some(-7)));
        assert_eq!(e.get_attr_regard_to(1, "color"), Ok(Some(1)));
        assert_eq!(
            e.get_attr_regard_to(4, "weight"),
            Err(GraphError::NotAnEndpoint {
                node: 4,
                edge_id: e.edge_id()
            })
        );
        assert_eq!(e.co_node(0).unwrap().index(), 1);
        assert_eq!(e.co_node(1).unwrap().index(), 0);
    }

    #[test]
    fn tadpole_cut_yields_two_leg_edges() {
        let ids = EdgeIds::starting_at(100);
        let e = edge(2, 2, 4);
        let (out, inc) = e.cut_tadpole(&ids).unwrap();
        assert!(out.is_external() && inc.is_external());
        assert_eq!(out.properties().unwrap().get("weight"), Some(&-4));
        assert_eq!(inc.properties().unwrap().get("weight"), Some(&4));
        assert_eq!((out.edge_id(), inc.edge_id()), (100, 101));
        let plain = edge(1, 2, 4);
        assert_eq!(
            plain.cut_tadpole(&ids).unwrap_err(),
            GraphError::NotATadpole {
                edge_id: plain.edge_id()
            }
        );
    }

    #[test]
    fn copy_renormalizes_orientation() {
        let e = edge(0, 1, 3);
        let map = NodeMap::from([(0, 1), (1, 0)]);
        let moved = e.copy(&map);
        assert_eq!(moved.nodes()[0].index(), 0);
        assert_eq!(moved.properties().unwrap().get("weight"), Some(&-3));
        assert_eq!(moved.edge_id(), e.edge_id());
        let overridden = e.copy_with(&map, [("color", 9), ("charge", 5)]).unwrap();
        assert_eq!(overridden.properties().unwrap().get("color"), Some(&9));
        assert_eq!(overridden.nodes()[0].value_at(2), Some(&5));
    }

    #[test]
    fn compare_by_property_index_covers_node_properties() {
        let s = schema_cache();
        let low = Edge::builder(0, 1)
            .schema(&s)
            .property("charge", 1)
            .build()
            .unwrap();
        let high = Edge::builder(0, 1)
            .schema(&s)
            .property("charge", 2)
            .build()
            .unwrap();
        assert_eq!(low.compare_by_property_index(&high, 2), Ok(Ordering::Less));
        assert_eq!(low.compare_by_property_index(&high, 0), Ok(Ordering::Equal));
        assert_eq!(low.compare(&high), Ok(Ordering::Less));
    }

    #[test]
    fn cross_schema_edges_do_not_compare() {
        let other = schema();
        let foreign = Edge::builder(0, 1).schema(&other).build().unwrap();
        assert_eq!(edge(0, 1, 1).compare(&foreign), Err(GraphError::SchemaMismatch));
    }

    #[test]
    fn caller_supplied_ids_are_required() {
        let ids = EdgeIds::caller_supplied();
        let missing = Edge::<i64>::builder(0, 1).build_with(&ids);
        assert_eq!(missing.unwrap_err(), GraphError::MissingEdgeId);
        let given = Edge::<i64>::builder(0, 1).id(42).build_with(&ids).unwrap();
        assert_eq!(given.edge_id(), 42);
    }

    #[test]
    fn values_without_schema_are_rejected() {
        let err = Edge::<i64>::builder(0, 1).property("weight", 1).build();
        assert_eq!(err.unwrap_err(), GraphError::UnknownProperty("weight".into()));
    }
}
