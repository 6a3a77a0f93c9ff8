// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs, clippy::unwrap_used)]
use nickel::{Canonicalize, Nickel, NodeIndex, LEG};
use proptest::prelude::*;

fn edge_strategy(nodes: NodeIndex) -> impl Strategy<Value = (NodeIndex, NodeIndex)> {
    (LEG..nodes, 0..nodes)
}

fn graph_strategy() -> impl Strategy<Value = Vec<(NodeIndex, NodeIndex)>> {
    (1..6i32).prop_flat_map(|n| prop::collection::vec(edge_strategy(n), 1..8))
}

fn relabel(edges: &[(NodeIndex, NodeIndex)], perm: &[NodeIndex]) -> Vec<(NodeIndex, NodeIndex)> {
    let apply = |n: NodeIndex| {
        usize::try_from(n)
            .ok()
            .and_then(|i| perm.get(i).copied())
            .unwrap_or(n)
    };
    edges.iter().map(|&(a, b)| (apply(a), apply(b))).collect()
}

proptest! {
    #[test]
    fn relabeled_graphs_share_the_canonical_string(
        edges in graph_strategy(),
        perm in Just((0..6).collect::<Vec<NodeIndex>>()).prop_shuffle(),
        reversed in any::<bool>(),
    ) {
        let mut shuffled = relabel(&edges, &perm);
        if reversed {
            shuffled.reverse();
            shuffled = shuffled.into_iter().map(|(a, b)| (b, a)).collect();
        }
        let a = Canonicalize::new(&edges).unwrap();
        let b = Canonicalize::new(&shuffled).unwrap();
        prop_assert_eq!(a.nickel(), b.nickel());
        prop_assert_eq!(a.num_maps(), b.num_maps());
    }

    #[test]
    fn canonical_string_parses_back(edges in graph_strategy()) {
        let canon = Canonicalize::new(&edges).unwrap();
        let parsed = Nickel::parse(canon.nickel().as_str()).unwrap();
        prop_assert_eq!(&parsed, canon.nickel());
        prop_assert_eq!(parsed.edge_count(), edges.len());
    }
}
