// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Canonical graph states.
//!
//! Construction runs in three steps:
//! 1. the topology oracle ([`Canonicalize`]) yields every node relabeling
//!    with a minimal topology string (callers may supply these maps),
//! 2. every edge is copied through each map and each copy sorted by edge key,
//!    giving one candidate edge tuple per map,
//! 3. candidates are refined one schema property at a time, keeping only those
//!    minimal under that property, until one remains or the schema runs out.
//!
//! Whatever survives is mutually key-equal; more than one survivor means the
//! graph has a nontrivial automorphism.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use nickel::{Canonicalize, NodeIndex, NodeMap, LEG};
use tracing::{debug, instrument, trace};

use crate::bag::PropertyBag;
use crate::codec::{self, SEGMENT_SEP};
use crate::edge::Edge;
use crate::edge_id::{global_edge_ids, EdgeIdGenerator};
use crate::error::GraphError;
use crate::node::Node;
use crate::schema::PropertySchema;
use crate::value::PropertyValue;

/// Domain separator for [`GraphState::digest`].
const DIGEST_DOMAIN: &[u8] = b"graph-state:";

/// An immutable, canonically ordered graph.
#[derive(Clone)]
pub struct GraphState<V> {
    sortings: Vec<Vec<Edge<V>>>,
    nodes: Vec<NodeIndex>,
    schema: Option<Arc<PropertySchema<V>>>,
    encoded: String,
}

impl<V: PropertyValue> GraphState<V> {
    /// Canonicalizes `edges`.
    ///
    /// Node properties are merged per node index: a value set on any edge's
    /// copy of a node applies to every copy.
    ///
    /// # Errors
    /// [`GraphError::InconsistentProperties`] if only some edges carry
    /// properties, [`GraphError::SchemaMismatch`] if they use different
    /// schemas, [`GraphError::ConflictingNodeProperties`] if two copies of a
    /// node disagree on a value, [`GraphError::UnencodableToken`] if a codec
    /// emits a token the string form cannot hold, [`GraphError::Topology`] if
    /// the oracle rejects the edge list.
    pub fn new(edges: impl IntoIterator<Item = Edge<V>>) -> Result<Self, GraphError> {
        let (edges, schema) = prepare(edges)?;
        let pairs: Vec<_> = edges.iter().map(Edge::index_pair).collect();
        let node_maps = Canonicalize::new(&pairs)?.into_node_maps();
        Self::canonicalize(&edges, schema, &node_maps)
    }

    /// Canonicalizes `edges` using precomputed relabelings instead of asking
    /// the oracle. An empty `node_maps` means "keep the labels as they are".
    pub fn with_node_maps(
        edges: impl IntoIterator<Item = Edge<V>>,
        node_maps: &[NodeMap],
    ) -> Result<Self, GraphError> {
        let (edges, schema) = prepare(edges)?;
        if node_maps.is_empty() {
            return Self::canonicalize(&edges, schema, &[NodeMap::new()]);
        }
        Self::canonicalize(&edges, schema, node_maps)
    }

    /// Parses a canonical string against `schema`, drawing edge ids from the
    /// process-wide generator.
    pub fn parse(s: &str, schema: &Arc<PropertySchema<V>>) -> Result<Self, GraphError> {
        Self::parse_with(s, schema, global_edge_ids())
    }

    /// Parses a canonical string against `schema`, drawing edge ids from `ids`.
    ///
    /// Accepts the bare topology or the topology followed by exactly one
    /// segment per schema property.
    pub fn parse_with(
        s: &str,
        schema: &Arc<PropertySchema<V>>,
        ids: &dyn EdgeIdGenerator,
    ) -> Result<Self, GraphError> {
        Self::new(codec::decode(s, Some(schema), ids)?)
    }

    /// Parses a bare topology string into a property-less state.
    pub fn parse_topology(s: &str) -> Result<Self, GraphError> {
        Self::new(codec::decode(s, None, global_edge_ids())?)
    }

    #[instrument(level = "debug", skip_all, fields(edges = edges.len(), maps = node_maps.len()))]
    fn canonicalize(
        edges: &[Edge<V>],
        schema: Option<Arc<PropertySchema<V>>>,
        node_maps: &[NodeMap],
    ) -> Result<Self, GraphError> {
        let mut sortings: Vec<Vec<Edge<V>>> = node_maps
            .iter()
            .map(|map| {
                let mut candidate: Vec<Edge<V>> = edges.iter().map(|e| e.copy(map)).collect();
                candidate.sort_by(|a, b| a.key().cmp(b.key()));
                candidate
            })
            .collect();
        debug!(candidates = sortings.len(), "generated candidates");

        if let Some(schema) = &schema {
            for i in 0..schema.len() {
                if sortings.len() <= 1 {
                    break;
                }
                sortings = refine(sortings, i)?;
                debug!(
                    property = schema.name_at(i).unwrap_or_default(),
                    survivors = sortings.len(),
                    "refined candidates"
                );
                trace!(?sortings, "survivors");
            }
        }

        let first = sortings.first().map_or(&[][..], Vec::as_slice);
        let mut nodes: Vec<NodeIndex> = first
            .iter()
            .flat_map(|e| e.nodes().iter().map(Node::index))
            .collect();
        nodes.sort_unstable();
        nodes.dedup();
        let encoded = codec::encode(first, schema.as_ref())?;
        Ok(Self {
            sortings,
            nodes,
            schema,
            encoded,
        })
    }

    /// Every surviving candidate; all are key-equal to [`edges`](Self::edges).
    pub fn sortings(&self) -> &[Vec<Edge<V>>] {
        &self.sortings
    }

    /// Canonically ordered edges.
    pub fn edges(&self) -> &[Edge<V>] {
        self.sortings.first().map_or(&[][..], Vec::as_slice)
    }

    /// Sorted node indices across [`edges`](Self::edges), [`LEG`] included.
    pub fn nodes(&self) -> &[NodeIndex] {
        &self.nodes
    }

    /// Sorted node indices excluding [`LEG`].
    pub fn internal_nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.nodes.iter().copied().filter(|&n| n != LEG)
    }

    /// Edges with both endpoints internal.
    pub fn internal_edges(&self) -> impl Iterator<Item = &Edge<V>> {
        self.edges().iter().filter(|e| !e.is_external())
    }

    /// Edges with exactly one internal endpoint.
    pub fn external_edges(&self) -> impl Iterator<Item = &Edge<V>> {
        self.edges().iter().filter(|e| e.is_external())
    }

    /// Edges touching `node`, in canonical order.
    pub fn edges_for_node(&self, node: NodeIndex) -> impl Iterator<Item = &Edge<V>> {
        self.edges()
            .iter()
            .filter(move |e| e.nodes().iter().any(|n| n.index() == node))
    }

    /// Shared schema, if the edges carry properties.
    pub fn schema(&self) -> Option<&Arc<PropertySchema<V>>> {
        self.schema.as_ref()
    }

    /// Topology part of the canonical string.
    pub fn topology_str(&self) -> &str {
        self.encoded
            .split_once(SEGMENT_SEP)
            .map_or(self.encoded.as_str(), |(topology, _)| topology)
    }

    /// BLAKE3 digest of the canonical string.
    pub fn digest(&self) -> [u8; 32] {
        let mut h = blake3::Hasher::new();
        h.update(DIGEST_DOMAIN);
        h.update(self.encoded.as_bytes());
        h.finalize().into()
    }

    /// [`digest`](Self::digest) as lowercase hex.
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest())
    }
}

/// Collects `edges`, checks their schema, and merges node bags per index.
fn prepare<V: PropertyValue>(
    edges: impl IntoIterator<Item = Edge<V>>,
) -> Result<(Vec<Edge<V>>, Option<Arc<PropertySchema<V>>>), GraphError> {
    let edges: Vec<Edge<V>> = edges.into_iter().collect();
    let schema = common_schema(&edges)?;
    let Some(with_nodes) = schema.as_ref().filter(|s| s.has_any(false)) else {
        return Ok((edges, schema));
    };
    let bags = merged_node_bags(&edges, with_nodes)?;
    let edges = edges.iter().map(|e| e.with_node_bags(&bags)).collect();
    Ok((edges, schema))
}

/// One node bag per internal node index, holding every value any copy of the
/// node carries.
fn merged_node_bags<V: PropertyValue>(
    edges: &[Edge<V>],
    schema: &Arc<PropertySchema<V>>,
) -> Result<BTreeMap<NodeIndex, PropertyBag<V>>, GraphError> {
    let mut slots: BTreeMap<NodeIndex, Vec<Option<V>>> = BTreeMap::new();
    for node in edges.iter().flat_map(|e| e.nodes().iter()) {
        if node.is_leg() {
            continue;
        }
        let merged = slots
            .entry(node.index())
            .or_insert_with(|| vec![None; schema.len()]);
        for (i, slot) in merged.iter_mut().enumerate() {
            if schema.edge_property_at(i) {
                continue;
            }
            let Some(value) = node.value_at(i) else {
                continue;
            };
            match slot.as_ref() {
                None => *slot = Some(value.clone()),
                Some(existing) if existing == value => {}
                Some(_) => {
                    return Err(GraphError::ConflictingNodeProperties {
                        node: node.index(),
                        property: schema.name_at(i).unwrap_or_default().to_owned(),
                    });
                }
            }
        }
    }
    Ok(slots
        .into_iter()
        .map(|(n, values)| (n, PropertyBag::from_slots(false, Arc::clone(schema), values)))
        .collect())
}

/// Schema shared by all edges; `None` when no edge carries properties.
fn common_schema<V: PropertyValue>(
    edges: &[Edge<V>],
) -> Result<Option<Arc<PropertySchema<V>>>, GraphError> {
    let with_properties = edges.iter().filter(|e| e.properties().is_some()).count();
    if with_properties == 0 {
        return Ok(None);
    }
    if with_properties != edges.len() {
        return Err(GraphError::InconsistentProperties {
            with_properties,
            total: edges.len(),
        });
    }
    let mut schemas = edges.iter().filter_map(Edge::schema);
    let Some(first) = schemas.next() else {
        return Ok(None);
    };
    if schemas.any(|s| !PropertySchema::same(first, s)) {
        return Err(GraphError::SchemaMismatch);
    }
    Ok(Some(Arc::clone(first)))
}

/// Keeps the candidates minimal under property index `i`, in input order.
fn refine<V: PropertyValue>(
    candidates: Vec<Vec<Edge<V>>>,
    i: usize,
) -> Result<Vec<Vec<Edge<V>>>, GraphError> {
    let mut best: Vec<Vec<Edge<V>>> = Vec::new();
    for candidate in candidates {
        let Some(current) = best.first() else {
            best.push(candidate);
            continue;
        };
        match compare_candidates(&candidate, current, i)? {
            Ordering::Less => {
                best.clear();
                best.push(candidate);
            }
            Ordering::Equal => best.push(candidate),
            Ordering::Greater => {}
        }
    }
    Ok(best)
}

/// Edge-by-edge comparison under property index `i`; the first difference decides.
pub(crate) fn compare_candidates<V: PropertyValue>(
    a: &[Edge<V>],
    b: &[Edge<V>],
    i: usize,
) -> Result<Ordering, GraphError> {
    for (x, y) in a.iter().zip(b) {
        let ord = x.compare_by_property_index(y, i)?;
        if ord.is_ne() {
            return Ok(ord);
        }
    }
    Ok(a.len().cmp(&b.len()))
}

impl<V: PropertyValue> PartialEq for GraphState<V> {
    fn eq(&self, other: &Self) -> bool {
        self.edges() == other.edges()
    }
}

impl<V: PropertyValue> Eq for GraphState<V> {}

impl<V: PropertyValue> Hash for GraphState<V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.edges().hash(state);
    }
}

impl<V> fmt::Display for GraphState<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

impl<V: PropertyValue> fmt::Debug for GraphState<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphState")
            .field("encoded", &self.encoded)
            .field("sortings", &self.sortings.len())
            .field("edges", &self.edges())
            .finish()
    }
}
