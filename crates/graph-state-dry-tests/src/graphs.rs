// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Edge-list builders.

use std::collections::BTreeMap;
use std::sync::Arc;

use graph_state::{
    Edge, EdgeBuilder, EdgeIds, GraphError, NoValue, Node, NodeArg, NodeIndex, PropertyBag,
    PropertySchema, LEG,
};

use crate::value::TestValue;

/// `(a, b, flow)` with `flow == None` meaning "no value".
pub type FlowEdge = (NodeIndex, NodeIndex, Option<i64>);

/// Triangle on nodes `0, 1, 2`.
pub const TRIANGLE: [(NodeIndex, NodeIndex); 3] = [(0, 1), (1, 2), (2, 0)];

/// Property-less edges with ids `0..`.
pub fn bare_edges(pairs: &[(NodeIndex, NodeIndex)]) -> Result<Vec<Edge<NoValue>>, GraphError> {
    let ids = EdgeIds::starting_at(0);
    pairs
        .iter()
        .map(|&(a, b)| Edge::builder(a, b).build_with(&ids))
        .collect()
}

/// Edges carrying an optional `flow` under `schema`, with ids `0..`.
pub fn flow_edges(
    schema: &Arc<PropertySchema<TestValue>>,
    edges: &[FlowEdge],
) -> Result<Vec<Edge<TestValue>>, GraphError> {
    let ids = EdgeIds::starting_at(0);
    edges
        .iter()
        .map(|&(a, b, flow)| {
            let builder = Edge::builder(a, b).schema(schema);
            match flow {
                Some(v) => builder.property("flow", TestValue::Int(v)),
                None => builder,
            }
            .build_with(&ids)
        })
        .collect()
}

/// Applies the permutation `perm` (node `i` becomes `perm[i]`) to every
/// ordinary endpoint; legs and indices beyond `perm` are kept.
pub fn relabel(edges: &[FlowEdge], perm: &[NodeIndex]) -> Vec<FlowEdge> {
    edges
        .iter()
        .map(|&(a, b, flow)| (permuted(a, perm), permuted(b, perm), flow))
        .collect()
}

fn permuted(n: NodeIndex, perm: &[NodeIndex]) -> NodeIndex {
    usize::try_from(n)
        .ok()
        .and_then(|i| perm.get(i).copied())
        .unwrap_or(n)
}

/// One edge of a [`mixed_schema`](crate::mixed_schema) graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MixedEdge {
    /// First endpoint.
    pub a: NodeIndex,
    /// Second endpoint.
    pub b: NodeIndex,
    /// Directed edge value.
    pub flow: Option<i64>,
    /// Undirected edge label.
    pub kind: Option<String>,
    /// Node `charge` the builder puts on both raw-index endpoints.
    pub charge: Option<i64>,
}

fn edge_values(mut builder: EdgeBuilder<TestValue>, edge: &MixedEdge) -> EdgeBuilder<TestValue> {
    if let Some(v) = edge.flow {
        builder = builder.property("flow", TestValue::Int(v));
    }
    if let Some(kind) = &edge.kind {
        builder = builder.property("kind", TestValue::Label(kind.clone()));
    }
    builder
}

/// Mixed edges built from raw indices, so each edge's `charge` lands on both
/// of its endpoints. Ids start at `0`.
pub fn mixed_edges(
    schema: &Arc<PropertySchema<TestValue>>,
    edges: &[MixedEdge],
) -> Result<Vec<Edge<TestValue>>, GraphError> {
    let ids = EdgeIds::starting_at(0);
    edges
        .iter()
        .map(|edge| {
            let builder = edge_values(Edge::builder(edge.a, edge.b).schema(schema), edge);
            match edge.charge {
                Some(v) => builder.property("charge", TestValue::Int(v)),
                None => builder,
            }
            .build_with(&ids)
        })
        .collect()
}

/// Mixed edges whose endpoints are ready nodes carrying `charges[index]`.
/// Per-edge `charge` values are ignored. Ids start at `0`.
pub fn mixed_edges_with_nodes(
    schema: &Arc<PropertySchema<TestValue>>,
    edges: &[MixedEdge],
    charges: &[Option<i64>],
) -> Result<Vec<Edge<TestValue>>, GraphError> {
    let node = |n: NodeIndex| -> Result<NodeArg<TestValue>, GraphError> {
        if n == LEG {
            return Ok(Node::leg().into());
        }
        let charge = usize::try_from(n)
            .ok()
            .and_then(|i| charges.get(i).copied().flatten());
        let bag = PropertyBag::from_values(
            false,
            schema,
            charge.map(|v| ("charge", TestValue::Int(v))),
        )?;
        Ok(Node::with_properties(n, bag).into())
    };
    let ids = EdgeIds::starting_at(0);
    edges
        .iter()
        .map(|edge| {
            edge_values(Edge::builder(node(edge.a)?, node(edge.b)?).schema(schema), edge)
                .build_with(&ids)
        })
        .collect()
}

/// [`relabel`] for mixed edges.
pub fn relabel_mixed(edges: &[MixedEdge], perm: &[NodeIndex]) -> Vec<MixedEdge> {
    edges
        .iter()
        .map(|edge| MixedEdge {
            a: permuted(edge.a, perm),
            b: permuted(edge.b, perm),
            ..edge.clone()
        })
        .collect()
}

/// Moves `charges[i]` to index `perm[i]`.
pub fn permute_charges(charges: &[Option<i64>], perm: &[NodeIndex]) -> Vec<Option<i64>> {
    let mut out = vec![None; charges.len()];
    for (i, &charge) in charges.iter().enumerate() {
        let target = NodeIndex::try_from(i)
            .ok()
            .map(|n| permuted(n, perm))
            .and_then(|n| usize::try_from(n).ok());
        if let Some(slot) = target.and_then(|t| out.get_mut(t)) {
            *slot = charge;
        }
    }
    out
}

/// Whether [`mixed_edges`] would give one node index two different charges.
pub fn conflicting_charges(edges: &[MixedEdge]) -> bool {
    let mut seen: BTreeMap<NodeIndex, i64> = BTreeMap::new();
    for edge in edges {
        let Some(charge) = edge.charge else {
            continue;
        };
        for n in [edge.a, edge.b] {
            if n == LEG {
                continue;
            }
            if *seen.entry(n).or_insert(charge) != charge {
                return true;
            }
        }
    }
    false
}

/// Reverses every edge, negating its flow, and reverses the list order.
///
/// Self-loops keep their flow: swapping their endpoints is not a reversal.
pub fn reverse_all(edges: &[FlowEdge]) -> Vec<FlowEdge> {
    edges
        .iter()
        .rev()
        .map(|&(a, b, flow)| {
            if a == b {
                (a, b, flow)
            } else {
                (b, a, flow.map(i64::wrapping_neg))
            }
        })
        .collect()
}
