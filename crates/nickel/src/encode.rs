// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Adjacency form and string encoding.

use std::fmt;

use crate::{NickelError, NodeIndex, LEG, LEG_CHAR, SEP};

/// Largest node index with a single-character encoding.
pub const MAX_NODE: NodeIndex = 35;

const RADIX: u32 = 36;

pub(crate) fn node_char(index: NodeIndex) -> Result<char, NickelError> {
    if index == LEG {
        return Ok(LEG_CHAR);
    }
    let digit = u32::try_from(index).map_err(|_| NickelError::InvalidNode(index))?;
    char::from_digit(digit, RADIX)
        .map(|c| c.to_ascii_uppercase())
        .ok_or(NickelError::TooManyNodes { index })
}

fn char_node(c: char) -> Result<NodeIndex, NickelError> {
    if c == LEG_CHAR {
        return Ok(LEG);
    }
    if !(c.is_ascii_digit() || c.is_ascii_uppercase()) {
        return Err(NickelError::InvalidChar(c));
    }
    c.to_digit(RADIX)
        .and_then(|d| NodeIndex::try_from(d).ok())
        .ok_or(NickelError::InvalidChar(c))
}

/// Splits an edge into `(owner, other)`.
///
/// Leg edges are owned by their internal endpoint; internal edges by the
/// smaller endpoint.
pub(crate) fn owner_of(a: NodeIndex, b: NodeIndex) -> Result<(NodeIndex, NodeIndex), NickelError> {
    for n in [a, b] {
        if n != LEG {
            node_char(n)?;
        }
    }
    match (a, b) {
        (LEG, LEG) => Err(NickelError::LegLoop),
        (LEG, n) | (n, LEG) => Ok((n, LEG)),
        (x, y) => Ok((x.min(y), x.max(y))),
    }
}

fn slot(index: NodeIndex) -> Result<usize, NickelError> {
    usize::try_from(index).map_err(|_| NickelError::InvalidNode(index))
}

/// Adjacency form of an edge list together with its string encoding.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Nickel {
    segments: Vec<Vec<NodeIndex>>,
    encoded: String,
}

impl Nickel {
    /// Builds the adjacency form of `edges`.
    ///
    /// One segment is produced for every node from `0` up to the largest
    /// index present, so nodes without owned edges show up as empty segments.
    pub fn from_edges(edges: &[(NodeIndex, NodeIndex)]) -> Result<Self, NickelError> {
        let mut segments: Vec<Vec<NodeIndex>> = Vec::new();
        for &(a, b) in edges {
            let (owner, other) = owner_of(a, b)?;
            let top = slot(owner.max(other))?;
            if segments.len() <= top {
                segments.resize_with(top + 1, Vec::new);
            }
            segments[slot(owner)?].push(other);
        }
        for segment in &mut segments {
            segment.sort_unstable();
        }
        Self::from_segments(segments)
    }

    /// Parses a Nickel string.
    ///
    /// The empty string is the empty graph.
    pub fn parse(s: &str) -> Result<Self, NickelError> {
        if s.is_empty() {
            return Ok(Self::default());
        }
        let body = s.strip_suffix(SEP).ok_or(NickelError::MissingTerminator)?;
        let mut segments = Vec::new();
        for (i, part) in body.split(SEP).enumerate() {
            let owner = NodeIndex::try_from(i).map_err(|_| NickelError::TooManyNodes {
                index: NodeIndex::MAX,
            })?;
            let mut segment = Vec::with_capacity(part.len());
            for c in part.chars() {
                let entry = char_node(c)?;
                if entry != LEG && entry < owner {
                    return Err(NickelError::BackwardEntry {
                        segment: owner,
                        entry,
                    });
                }
                if segment.last().is_some_and(|&prev| prev > entry) {
                    return Err(NickelError::UnsortedSegment { segment: owner });
                }
                segment.push(entry);
            }
            segments.push(segment);
        }
        let count = segments.len();
        for entry in segments.iter().flatten() {
            if *entry != LEG && slot(*entry)? >= count {
                return Err(NickelError::InvalidNode(*entry));
            }
        }
        Self::from_segments(segments)
    }

    fn from_segments(segments: Vec<Vec<NodeIndex>>) -> Result<Self, NickelError> {
        let mut encoded = String::new();
        for segment in &segments {
            for &entry in segment {
                encoded.push(node_char(entry)?);
            }
            encoded.push(SEP);
        }
        Ok(Self { segments, encoded })
    }

    /// Per-node sorted entry lists; segment `i` belongs to node `i`.
    pub fn segments(&self) -> &[Vec<NodeIndex>] {
        &self.segments
    }

    /// Number of segments (one per node index up to the largest).
    pub fn node_count(&self) -> usize {
        self.segments.len()
    }

    /// Number of edges encoded.
    pub fn edge_count(&self) -> usize {
        self.segments.iter().map(Vec::len).sum()
    }

    /// Edges as `(owner, other)` pairs, in string order.
    pub fn edges(&self) -> Vec<(NodeIndex, NodeIndex)> {
        self.segments
            .iter()
            .zip(0..)
            .flat_map(|(segment, owner)| segment.iter().map(move |&other| (owner, other)))
            .collect()
    }

    /// The encoded string.
    pub fn as_str(&self) -> &str {
        &self.encoded
    }
}

impl fmt::Display for Nickel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Nickel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encoded)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Nickel {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
