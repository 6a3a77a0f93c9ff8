// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Canonical string form of a graph state.
//!
//! Layout: `topology:prop_1:...:prop_n`, one segment per schema property in
//! schema order.
//!
//! - The topology segment is the [`Nickel`] string, e.g. `e12|e3|33||`.
//! - An edge property segment mirrors the topology: one group per topology
//!   segment, each terminated by [`SEP`], holding one token per entry of that
//!   segment joined by [`SEP2`] (`5|-3_|` for `e1|12|`).
//! - A node property segment holds one token per internal node in ascending
//!   index order, joined by [`SEP`].
//! - A segment whose values are all null is empty; a null inside a non-empty
//!   segment is the empty token.

use std::collections::BTreeMap;
use std::sync::Arc;

use nickel::{Nickel, NodeIndex, LEG, SEP};
use tracing::{debug, instrument};

use crate::bag::PropertyBag;
use crate::edge::Edge;
use crate::edge_id::{EdgeIdGenerator, EdgeId};
use crate::error::GraphError;
use crate::node::Node;
use crate::schema::{Externalizer, PropertySchema};
use crate::value::PropertyValue;

/// Separator between the topology segment and the property segments.
pub const SEGMENT_SEP: char = ':';

/// Separator between edge tokens sharing one topology group.
pub const SEP2: char = '_';

/// Encodes canonically ordered edges.
pub(crate) fn encode<V: PropertyValue>(
    edges: &[Edge<V>],
    schema: Option<&Arc<PropertySchema<V>>>,
) -> Result<String, GraphError> {
    let pairs: Vec<_> = edges.iter().map(Edge::index_pair).collect();
    let nickel = Nickel::from_edges(&pairs)?;
    let mut out = nickel.as_str().to_owned();
    let Some(schema) = schema else {
        return Ok(out);
    };

    // Edge positions in topology order; parallel edges keep canonical order.
    let mut slots: Vec<(NodeIndex, NodeIndex, usize)> = edges
        .iter()
        .enumerate()
        .map(|(k, e)| {
            let owner = e.owner();
            let (a, b) = e.index_pair();
            let other = if a == owner { b } else { a };
            (owner, other, k)
        })
        .collect();
    slots.sort_by_key(|&(owner, other, _)| (owner, other));

    let mut nodes: BTreeMap<NodeIndex, &Node<V>> = BTreeMap::new();
    for node in edges.iter().flat_map(|e| e.nodes().iter()) {
        if !node.is_leg() {
            nodes.entry(node.index()).or_insert(node);
        }
    }

    for i in 0..schema.len() {
        out.push(SEGMENT_SEP);
        let Some(codec) = schema.externalizer_at(i) else {
            continue;
        };
        let name = schema.name_at(i).unwrap_or_default();
        if schema.edge_property_at(i) {
            let values: Vec<Option<&V>> = edges
                .iter()
                .map(|e| e.properties().and_then(|bag| bag.get_at(i)))
                .collect();
            if values.iter().all(Option::is_none) {
                continue;
            }
            let mut slot = slots.iter().peekable();
            for owner in 0..nickel.node_count() {
                let mut tokens = Vec::new();
                while let Some(&&(o, _, k)) = slot.peek() {
                    if usize::try_from(o).ok() != Some(owner) {
                        break;
                    }
                    tokens.push(token(codec, values[k], name)?);
                    slot.next();
                }
                out.push_str(&tokens.join(&SEP2.to_string()));
                out.push(SEP);
            }
        } else {
            let values: Vec<Option<&V>> = nodes.values().map(|n| n.value_at(i)).collect();
            if values.iter().all(Option::is_none) {
                continue;
            }
            let tokens = values
                .into_iter()
                .map(|v| token(codec, v, name))
                .collect::<Result<Vec<_>, _>>()?;
            out.push_str(&tokens.join(&SEP.to_string()));
        }
    }
    Ok(out)
}

/// Serializes one value; `None` is the empty token.
///
/// A non-null value must serialize to a non-empty token free of separators,
/// or the string could not be parsed back.
fn token<V>(codec: &dyn Externalizer<V>, value: Option<&V>, name: &str) -> Result<String, GraphError> {
    let Some(value) = value else {
        return Ok(String::new());
    };
    let token = codec.serialize(value);
    if token.is_empty() || token.contains([SEGMENT_SEP, SEP, SEP2]) {
        return Err(GraphError::UnencodableToken {
            property: name.to_owned(),
            token,
        });
    }
    Ok(token)
}

/// Decodes a string produced by [`encode`] into edges in topology order.
///
/// With `schema == None` only a bare topology is accepted.
#[instrument(level = "debug", skip_all, fields(len = s.len()))]
pub(crate) fn decode<V: PropertyValue>(
    s: &str,
    schema: Option<&Arc<PropertySchema<V>>>,
    ids: &dyn EdgeIdGenerator,
) -> Result<Vec<Edge<V>>, GraphError> {
    let parts: Vec<&str> = s.split(SEGMENT_SEP).collect();
    let expected = 1 + schema.map_or(0, |sc| sc.len());
    if parts.len() != 1 && parts.len() != expected {
        return Err(GraphError::SegmentCount {
            expected,
            found: parts.len(),
        });
    }
    let nickel = Nickel::parse(parts[0])?;
    let pairs = nickel.edges();
    debug!(edges = pairs.len(), nodes = nickel.node_count(), "parsed topology");

    let Some(schema) = schema else {
        return pairs
            .iter()
            .map(|&(owner, other)| {
                let edge_id = next_id(ids)?;
                Ok(Edge::assemble(
                    stored_pair(owner, other).map(Node::new),
                    LEG,
                    edge_id,
                    None,
                ))
            })
            .collect();
    };

    let internal: Vec<NodeIndex> = {
        let mut v: Vec<NodeIndex> = pairs
            .iter()
            .flat_map(|&(a, b)| [a, b])
            .filter(|&n| n != LEG)
            .collect();
        v.sort_unstable();
        v.dedup();
        v
    };
    let mut edge_slots = vec![vec![None; schema.len()]; pairs.len()];
    let mut node_slots = vec![vec![None; schema.len()]; internal.len()];

    for (i, part) in parts.iter().enumerate().skip(1).map(|(j, p)| (j - 1, *p)) {
        if part.is_empty() {
            continue;
        }
        let name = schema.name_at(i).unwrap_or_default();
        let codec = schema
            .externalizer_at(i)
            .ok_or_else(|| GraphError::UnknownProperty(name.to_owned()))?;
        if schema.edge_property_at(i) {
            let tokens = edge_tokens(part, &nickel, name)?;
            for (slots, tok) in edge_slots.iter_mut().zip(tokens) {
                slots[i] = untoken(codec, tok, name)?;
            }
        } else {
            let tokens: Vec<&str> = part.split(SEP).collect();
            if tokens.len() != internal.len() {
                return Err(GraphError::TokenCount {
                    property: name.to_owned(),
                    expected: internal.len(),
                    found: tokens.len(),
                });
            }
            for (slots, tok) in node_slots.iter_mut().zip(tokens) {
                slots[i] = untoken(codec, tok, name)?;
            }
        }
    }

    let nodes: BTreeMap<NodeIndex, Node<V>> = internal
        .iter()
        .zip(node_slots)
        .map(|(&n, slots)| {
            let bag = PropertyBag::from_slots(false, Arc::clone(schema), slots);
            (n, Node::with_properties(n, bag))
        })
        .collect();
    let node = |n: NodeIndex| nodes.get(&n).cloned().unwrap_or_else(|| Node::new(n));

    pairs
        .iter()
        .zip(edge_slots)
        .map(|(&(owner, other), slots)| {
            let edge_id = next_id(ids)?;
            let bag = PropertyBag::from_slots(true, Arc::clone(schema), slots);
            Ok(Edge::assemble(
                stored_pair(owner, other).map(&node),
                LEG,
                edge_id,
                Some(bag),
            ))
        })
        .collect()
}

/// Stored orientation of a topology entry: the leg comes first.
fn stored_pair(owner: NodeIndex, other: NodeIndex) -> [NodeIndex; 2] {
    if other == LEG {
        [LEG, owner]
    } else {
        [owner, other]
    }
}

fn next_id(ids: &dyn EdgeIdGenerator) -> Result<EdgeId, GraphError> {
    ids.next_id().ok_or(GraphError::MissingEdgeId)
}

/// Splits an edge property segment into one token per topology entry.
fn edge_tokens<'a>(part: &'a str, nickel: &Nickel, name: &str) -> Result<Vec<&'a str>, GraphError> {
    let groups: Vec<&str> = match part.strip_suffix(SEP) {
        Some(body) => body.split(SEP).collect(),
        None => Vec::new(),
    };
    if groups.len() != nickel.node_count() {
        return Err(GraphError::GroupCount {
            property: name.to_owned(),
            expected: nickel.node_count(),
            found: groups.len(),
        });
    }
    let mut tokens = Vec::with_capacity(nickel.edge_count());
    for (group, entries) in groups.into_iter().zip(nickel.segments()) {
        let found: Vec<&str> = if entries.is_empty() && group.is_empty() {
            Vec::new()
        } else {
            group.split(SEP2).collect()
        };
        if found.len() != entries.len() {
            return Err(GraphError::TokenCount {
                property: name.to_owned(),
                expected: entries.len(),
                found: found.len(),
            });
        }
        tokens.extend(found);
    }
    Ok(tokens)
}

fn untoken<V>(codec: &dyn Externalizer<V>, token: &str, name: &str) -> Result<Option<V>, GraphError> {
    if token.is_empty() {
        return Ok(None);
    }
    codec
        .deserialize(token)
        .map(Some)
        .map_err(|source| GraphError::Decode {
            property: name.to_owned(),
            source,
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::edge_id::EdgeIds;
    use crate::schema::{DisplayCodec, PropertyKey};

    fn schema() -> Arc<PropertySchema<i64>> {
        PropertySchema::create(vec![
            PropertyKey::edge("flow", true, DisplayCodec::<i64>::shared()),
            PropertyKey::node("mass", false, DisplayCodec::<i64>::shared()),
        ])
        .unwrap()
    }

    fn build(
        schema: &Arc<PropertySchema<i64>>,
        a: NodeIndex,
        b: NodeIndex,
        flow: Option<i64>,
    ) -> Edge<i64> {
        let mut builder = Edge::builder(a, b).schema(schema).id(0);
        if let Some(flow) = flow {
            builder = builder.property("flow", flow);
        }
        builder.build().unwrap()
    }

    #[test]
    fn edge_segment_mirrors_topology_groups() {
        let s = schema();
        let edges = vec![
            build(&s, LEG, 0, Some(5)),
            build(&s, 0, 1, Some(-3)),
            build(&s, 0, 1, None),
        ];
        assert_eq!(encode(&edges, Some(&s)).unwrap(), "e11||:5_-3_||:");
    }

    #[test]
    fn all_null_segments_are_empty() {
        let s = schema();
        let edges = vec![build(&s, 0, 1, None)];
        assert_eq!(encode(&edges, Some(&s)).unwrap(), "1||::");
    }

    #[test]
    fn node_segment_lists_internal_nodes() {
        let s = schema();
        let edges = vec![Edge::builder(0, 1)
            .schema(&s)
            .id(0)
            .property("mass", 4)
            .build()
            .unwrap()];
        assert_eq!(encode(&edges, Some(&s)).unwrap(), "1||::4|4");
    }

    struct Pairs;

    impl Externalizer<i64> for Pairs {
        fn serialize(&self, value: &i64) -> String {
            match value {
                0 => String::new(),
                v => format!("{v}_{v}"),
            }
        }

        fn deserialize(&self, token: &str) -> Result<i64, crate::error::DecodeError> {
            token.parse().map_err(|_| crate::error::DecodeError::InvalidToken {
                token: token.to_owned(),
                reason: "not an integer".into(),
            })
        }
    }

    #[test]
    fn tokens_that_cannot_be_parsed_back_are_rejected() {
        let s = PropertySchema::create(vec![
            PropertyKey::<i64>::edge("pair", false, Arc::new(Pairs)),
            PropertyKey::<i64>::node("mass", false, Arc::new(Pairs)),
        ])
        .unwrap();
        let edge = |a: NodeIndex, b: NodeIndex, name: &str, v: i64| {
            Edge::builder(a, b)
                .schema(&s)
                .id(0)
                .property(name, v)
                .build()
                .unwrap()
        };
        assert_eq!(
            encode(&[edge(0, 1, "pair", 3)], Some(&s)).unwrap_err(),
            GraphError::UnencodableToken {
                property: "pair".into(),
                token: "3_3".into()
            }
        );
        assert_eq!(
            encode(&[edge(0, 1, "pair", 0)], Some(&s)).unwrap_err(),
            GraphError::UnencodableToken {
                property: "pair".into(),
                token: String::new()
            }
        );
        assert!(matches!(
            encode(&[edge(0, 1, "mass", 2)], Some(&s)),
            Err(GraphError::UnencodableToken { ref property, .. }) if property == "mass"
        ));
    }

    #[test]
    fn decode_rebuilds_values_in_place() {
        let s = schema();
        let ids = EdgeIds::starting_at(0);
        let edges = decode("e11||:5_-3_||:1|2", Some(&s), &ids).unwrap();
        assert_eq!(edges.len(), 3);
        assert!(edges[0].is_external());
        assert_eq!(edges[0].properties().unwrap().get("flow"), Some(&5));
        assert_eq!(edges[1].properties().unwrap().get("flow"), Some(&-3));
        assert_eq!(edges[2].properties().unwrap().get("flow"), None);
        assert_eq!(edges[1].nodes()[1].value_at(1), Some(&2));
    }

    #[test]
    fn decode_accepts_bare_topology_with_schema() {
        let s = schema();
        let edges = decode("12|2||", Some(&s), &EdgeIds::default()).unwrap();
        assert_eq!(edges.len(), 3);
        assert!(edges
            .iter()
            .all(|e| e.properties().unwrap().key().iter().all(Option::is_none)));
    }

    #[test]
    fn decode_rejects_malformed_segments() {
        let s = schema();
        let ids = EdgeIds::default();
        assert_eq!(
            decode::<i64>("1||:", Some(&s), &ids).unwrap_err(),
            GraphError::SegmentCount {
                expected: 3,
                found: 2
            }
        );
        assert!(matches!(
            decode::<i64>("1||:5|:", Some(&s), &ids),
            Err(GraphError::GroupCount { expected: 2, found: 1, .. })
        ));
        assert!(matches!(
            decode::<i64>("1||:5_6||:", Some(&s), &ids),
            Err(GraphError::TokenCount { expected: 1, found: 2, .. })
        ));
        assert!(matches!(
            decode::<i64>("1||:x||:", Some(&s), &ids),
            Err(GraphError::Decode { ref property, .. }) if property == "flow"
        ));
        assert!(matches!(
            decode::<i64>("1||::3", Some(&s), &ids),
            Err(GraphError::TokenCount { expected: 2, found: 1, .. })
        ));
        assert!(matches!(
            decode::<i64>("1|", None, &ids),
            Err(GraphError::Topology(_))
        ));
    }
}
