// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Nickel: topology encoding and canonical relabeling for graphs with legs.
//!
//! The crate knows nothing about properties. It works on bare edge lists of
//! integer node indices, where [`LEG`] marks the dangling end of an external
//! edge, and provides two things:
//!
//! - [`Nickel`]: the adjacency form of an edge list and its compact string
//!   encoding (`e12|e3|33||`), plus the inverse parser.
//! - [`Canonicalize`]: every node relabeling whose Nickel string is minimal.
//!   Isomorphic edge lists produce the same minimal string; the number of
//!   surviving relabelings reflects the automorphisms of the graph.
//!
//! # Encoding
//!
//! Segment `i` lists one entry per edge owned by node `i`, sorted ascending.
//! An internal edge is owned by its smaller endpoint and contributes the other
//! endpoint; a leg edge is owned by its internal endpoint and contributes `e`.
//! Every segment is terminated by [`SEP`]. Indices `0..=9` encode as digits and
//! `10..=35` as `A..=Z`.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions
)]

mod canon;
mod encode;

pub use canon::{Canonicalize, NodeMap};
pub use encode::{Nickel, MAX_NODE};

use thiserror::Error;

/// Integer node index as seen by the topology layer.
pub type NodeIndex = i32;

/// Sentinel index for the dangling end of an external edge.
///
/// Ordinary node indices are non-negative, so `LEG` orders before every
/// ordinary node.
pub const LEG: NodeIndex = -1;

/// Segment separator of the Nickel string.
pub const SEP: char = '|';

/// Character standing for [`LEG`] in the Nickel string.
pub const LEG_CHAR: char = 'e';

/// Errors produced while encoding, parsing, or canonicalizing edge lists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NickelError {
    /// A node index is negative but not [`LEG`], or refers past the last segment.
    #[error("invalid node index: {0}")]
    InvalidNode(NodeIndex),
    /// A node index has no single-character encoding.
    #[error("node index {index} exceeds the encodable maximum {MAX_NODE}")]
    TooManyNodes {
        /// Offending index.
        index: NodeIndex,
    },
    /// An edge joins two legs and has no internal endpoint.
    #[error("edge joins two external legs")]
    LegLoop,
    /// The string contains a character that encodes no node.
    #[error("invalid nickel character: {0:?}")]
    InvalidChar(char),
    /// The string does not end with [`SEP`].
    #[error("nickel string must end with '{SEP}'")]
    MissingTerminator,
    /// A segment lists a node with a smaller index than its owner.
    #[error("segment {segment} lists node {entry} below its owner")]
    BackwardEntry {
        /// Owner of the segment.
        segment: NodeIndex,
        /// Entry that points backwards.
        entry: NodeIndex,
    },
    /// A segment's entries are not in ascending order.
    #[error("segment {segment} is not sorted")]
    UnsortedSegment {
        /// Owner of the segment.
        segment: NodeIndex,
    },
}
