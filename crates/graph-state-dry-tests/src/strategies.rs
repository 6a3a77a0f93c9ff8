// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `proptest` strategies for small graphs.
//!
//! Sizes stay small: the topology oracle enumerates breadth-first labelings,
//! which grows factorially with the number of equivalent neighbours.

use graph_state::{NodeIndex, LEG};
use proptest::prelude::*;

use crate::graphs::{FlowEdge, MixedEdge};

/// Largest node count produced by [`graph_strategy`].
pub const MAX_NODES: NodeIndex = 6;

fn edge_strategy(nodes: NodeIndex) -> impl Strategy<Value = (NodeIndex, NodeIndex)> {
    (LEG..nodes, 0..nodes)
}

/// Edge lists on up to [`MAX_NODES`] nodes with up to seven edges, legs
/// included. Self-loops and parallel edges occur.
pub fn graph_strategy() -> impl Strategy<Value = Vec<(NodeIndex, NodeIndex)>> {
    (1..=MAX_NODES).prop_flat_map(|n| prop::collection::vec(edge_strategy(n), 1..8))
}

/// Attaches a small optional flow to each edge of `pairs`.
pub fn flows_for(pairs: Vec<(NodeIndex, NodeIndex)>) -> impl Strategy<Value = Vec<FlowEdge>> {
    let len = pairs.len();
    prop::collection::vec(prop::option::weighted(0.8, -3i64..=3), len).prop_map(move |flows| {
        pairs
            .iter()
            .zip(flows)
            .map(|(&(a, b), flow)| (a, b, flow))
            .collect()
    })
}

/// A permutation of `0..MAX_NODES`.
pub fn permutation_strategy() -> impl Strategy<Value = Vec<NodeIndex>> {
    Just((0..MAX_NODES).collect::<Vec<NodeIndex>>()).prop_shuffle()
}

/// Attaches optional `flow`, `kind`, and `charge` values to each edge of
/// `pairs`. Labels draw on the separator characters to exercise escaping.
pub fn mixed_for(pairs: Vec<(NodeIndex, NodeIndex)>) -> impl Strategy<Value = Vec<MixedEdge>> {
    let values = (
        prop::option::weighted(0.7, -2i64..=2),
        prop::option::weighted(0.5, "[ab_:|%]{1,3}"),
        prop::option::weighted(0.3, 0i64..=2),
    );
    prop::collection::vec(values, pairs.len()).prop_map(move |values| {
        pairs
            .iter()
            .zip(values)
            .map(|(&(a, b), (flow, kind, charge))| MixedEdge {
                a,
                b,
                flow,
                kind,
                charge,
            })
            .collect()
    })
}

/// One optional `charge` per node index `0..MAX_NODES`.
pub fn charges_strategy() -> impl Strategy<Value = Vec<Option<i64>>> {
    let len = usize::try_from(MAX_NODES).unwrap_or_default();
    prop::collection::vec(prop::option::of(-2i64..=2), len)
}
