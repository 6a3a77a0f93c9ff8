// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Canonical node relabeling.
//!
//! The search walks breadth-first labelings level by level. At level `l` the
//! node carrying label `l` is finalized: if no node carries it yet, every
//! unlabeled node is tried as the root of a new component; then every ordering
//! of its still-unlabeled neighbours receives the next free labels. Once all
//! neighbours are labeled, segment `l` of the Nickel string is fixed, so only
//! the labelings with the smallest segment survive to the next level. Ties are
//! kept, which is how automorphisms show up as multiple node maps.
//!
//! Neighbour orderings are restricted by colour refinement: nodes are coloured
//! by legs, self-loops and degree, then by the colours around them until the
//! partition is stable. Fresh neighbours are labeled in ascending colour, and
//! only nodes of the same colour are permuted among themselves. Colours are
//! preserved by every automorphism, so the result stays relabeling-invariant
//! and the surviving maps still number one per automorphism.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::encode::{owner_of, Nickel};
use crate::{NickelError, NodeIndex, LEG};

/// Node relabeling: old index to new index. [`LEG`] is never remapped.
pub type NodeMap = BTreeMap<NodeIndex, NodeIndex>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Endpoint {
    Leg,
    Node(usize),
}

/// Incidence lists keyed by position in the sorted node list.
struct Incidence {
    nodes: Vec<NodeIndex>,
    incident: Vec<Vec<Endpoint>>,
    /// Stable refinement colour of each node position.
    colours: Vec<usize>,
}

impl Incidence {
    fn new(edges: &[(NodeIndex, NodeIndex)]) -> Result<Self, NickelError> {
        let mut positions: BTreeMap<NodeIndex, usize> = BTreeMap::new();
        for &(a, b) in edges {
            owner_of(a, b)?;
            for n in [a, b] {
                if n != LEG {
                    positions.insert(n, 0);
                }
            }
        }
        let nodes: Vec<NodeIndex> = positions.keys().copied().collect();
        for (pos, slot) in positions.values_mut().enumerate() {
            *slot = pos;
        }
        let mut incident = vec![Vec::new(); nodes.len()];
        for &(a, b) in edges {
            match (positions.get(&a), positions.get(&b)) {
                (Some(&p), None) | (None, Some(&p)) => incident[p].push(Endpoint::Leg),
                (Some(&p), Some(&q)) if p == q => incident[p].push(Endpoint::Node(p)),
                (Some(&p), Some(&q)) => {
                    incident[p].push(Endpoint::Node(q));
                    incident[q].push(Endpoint::Node(p));
                }
                (None, None) => return Err(NickelError::LegLoop),
            }
        }
        let colours = refine(&incident);
        Ok(Self {
            nodes,
            incident,
            colours,
        })
    }
}

/// Colour refinement over the incidence lists.
fn refine(incident: &[Vec<Endpoint>]) -> Vec<usize> {
    let initial: Vec<(usize, usize, usize)> = incident
        .iter()
        .enumerate()
        .map(|(pos, eps)| {
            let legs = eps.iter().filter(|&&ep| ep == Endpoint::Leg).count();
            let loops = eps.iter().filter(|&&ep| ep == Endpoint::Node(pos)).count();
            (legs, loops, eps.len())
        })
        .collect();
    let (mut colours, mut classes) = rank(&initial);
    loop {
        let signatures: Vec<(usize, Vec<usize>)> = incident
            .iter()
            .enumerate()
            .map(|(pos, eps)| {
                let mut around: Vec<usize> = eps
                    .iter()
                    .filter_map(|ep| match *ep {
                        Endpoint::Node(q) if q != pos => Some(colours[q]),
                        _ => None,
                    })
                    .collect();
                around.sort_unstable();
                (colours[pos], around)
            })
            .collect();
        let (next, count) = rank(&signatures);
        // Each round only splits classes; no growth means the partition is stable.
        if count == classes {
            return colours;
        }
        colours = next;
        classes = count;
    }
}

/// Dense ranks of `items` in sorted order, and the number of distinct items.
fn rank<T: Ord + Clone>(items: &[T]) -> (Vec<usize>, usize) {
    let mut sorted = items.to_vec();
    sorted.sort();
    sorted.dedup();
    let ranks = items
        .iter()
        .map(|item| match sorted.binary_search(item) {
            Ok(i) | Err(i) => i,
        })
        .collect();
    (ranks, sorted.len())
}

/// A partial breadth-first labeling.
#[derive(Clone, Debug)]
struct Labeling {
    /// Position of the node carrying each assigned label.
    order: Vec<usize>,
    /// Label of each node position, if assigned.
    labels: Vec<Option<usize>>,
}

impl Labeling {
    fn empty(len: usize) -> Self {
        Self {
            order: Vec::with_capacity(len),
            labels: vec![None; len],
        }
    }

    fn assign(&mut self, pos: usize) {
        self.labels[pos] = Some(self.order.len());
        self.order.push(pos);
    }

    /// Labelings in which `level` is carried by some node.
    fn rooted(&self, level: usize) -> Vec<Self> {
        if self.order.len() > level {
            return vec![self.clone()];
        }
        (0..self.labels.len())
            .filter(|&pos| self.labels[pos].is_none())
            .map(|pos| {
                let mut next = self.clone();
                next.assign(pos);
                next
            })
            .collect()
    }

    /// Labelings in which every neighbour of the node at `level` is labeled.
    fn expanded(&self, graph: &Incidence, level: usize) -> Vec<Self> {
        let pos = self.order[level];
        let mut fresh: Vec<(usize, usize)> = graph.incident[pos]
            .iter()
            .filter_map(|ep| match *ep {
                Endpoint::Node(q) if self.labels[q].is_none() => Some((graph.colours[q], q)),
                _ => None,
            })
            .collect();
        fresh.sort_unstable();
        fresh.dedup();
        let mut orderings: Vec<Vec<usize>> = vec![Vec::new()];
        for group in fresh.chunk_by(|x, y| x.0 == y.0) {
            let members: Vec<usize> = group.iter().map(|&(_, q)| q).collect();
            let tails = permutations(&members);
            orderings = orderings
                .iter()
                .flat_map(|head| {
                    tails.iter().map(move |tail| {
                        let mut ordering = head.clone();
                        ordering.extend_from_slice(tail);
                        ordering
                    })
                })
                .collect();
        }
        orderings
            .into_iter()
            .map(|ordering| {
                let mut next = self.clone();
                for q in ordering {
                    next.assign(q);
                }
                next
            })
            .collect()
    }

    /// Segment owned by the node at `level`; all its neighbours must be labeled.
    fn segment(&self, graph: &Incidence, level: usize) -> Result<Vec<NodeIndex>, NickelError> {
        let pos = self.order[level];
        let mut segment = Vec::with_capacity(graph.incident[pos].len());
        for ep in &graph.incident[pos] {
            match *ep {
                Endpoint::Leg => segment.push(LEG),
                Endpoint::Node(q) => {
                    let label = self.labels[q].ok_or(NickelError::InvalidNode(graph.nodes[q]))?;
                    if label >= level {
                        segment.push(to_index(label)?);
                    }
                }
            }
        }
        segment.sort_unstable();
        Ok(segment)
    }

    fn node_map(&self, graph: &Incidence) -> Result<NodeMap, NickelError> {
        let mut map = NodeMap::new();
        for (pos, label) in self.labels.iter().enumerate() {
            let label = label.ok_or(NickelError::InvalidNode(graph.nodes[pos]))?;
            map.insert(graph.nodes[pos], to_index(label)?);
        }
        Ok(map)
    }
}

fn to_index(label: usize) -> Result<NodeIndex, NickelError> {
    NodeIndex::try_from(label).map_err(|_| NickelError::TooManyNodes {
        index: NodeIndex::MAX,
    })
}

fn permutations(items: &[usize]) -> Vec<Vec<usize>> {
    if items.is_empty() {
        return vec![Vec::new()];
    }
    let mut out = Vec::new();
    for (i, &head) in items.iter().enumerate() {
        let mut rest = items.to_vec();
        rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, head);
            out.push(tail);
        }
    }
    out
}

/// Result of canonicalizing an edge list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canonicalize {
    node_maps: Vec<NodeMap>,
    nickel: Nickel,
}

impl Canonicalize {
    /// Finds every node relabeling of `edges` that yields the minimal Nickel string.
    ///
    /// The returned maps are never empty; an edge list without nodes yields a
    /// single empty map.
    pub fn new(edges: &[(NodeIndex, NodeIndex)]) -> Result<Self, NickelError> {
        Nickel::from_edges(edges)?;
        let graph = Incidence::new(edges)?;
        let mut states = vec![Labeling::empty(graph.nodes.len())];

        for level in 0..graph.nodes.len() {
            let mut best: Option<Vec<NodeIndex>> = None;
            let mut survivors = Vec::new();
            for state in &states {
                for rooted in state.rooted(level) {
                    for candidate in rooted.expanded(&graph, level) {
                        let segment = candidate.segment(&graph, level)?;
                        match best.as_ref().map(|b| segment.cmp(b)) {
                            None | Some(Ordering::Less) => {
                                best = Some(segment);
                                survivors.clear();
                                survivors.push(candidate);
                            }
                            Some(Ordering::Equal) => survivors.push(candidate),
                            Some(Ordering::Greater) => {}
                        }
                    }
                }
            }
            states = survivors;
        }

        let node_maps = states
            .iter()
            .map(|state| state.node_map(&graph))
            .collect::<Result<Vec<_>, _>>()?;
        let nickel = match node_maps.first() {
            Some(map) => Nickel::from_edges(&relabel(edges, map))?,
            None => Nickel::default(),
        };
        Ok(Self { node_maps, nickel })
    }

    /// Every minimal relabeling, in discovery order.
    pub fn node_maps(&self) -> &[NodeMap] {
        &self.node_maps
    }

    /// Consumes the result, returning the relabelings.
    pub fn into_node_maps(self) -> Vec<NodeMap> {
        self.node_maps
    }

    /// Number of minimal relabelings.
    pub fn num_maps(&self) -> usize {
        self.node_maps.len()
    }

    /// The canonical (minimal) encoding.
    pub fn nickel(&self) -> &Nickel {
        &self.nickel
    }
}

/// Applies `map` to both endpoints of every edge; unmapped indices are kept.
pub(crate) fn relabel(edges: &[(NodeIndex, NodeIndex)], map: &NodeMap) -> Vec<(NodeIndex, NodeIndex)> {
    let apply = |n: NodeIndex| map.get(&n).copied().unwrap_or(n);
    edges.iter().map(|&(a, b)| (apply(a), apply(b))).collect()
}
