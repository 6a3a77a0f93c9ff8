// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error types.

use nickel::{NickelError, NodeIndex};
use thiserror::Error;

use crate::edge_id::EdgeId;

/// Failure reported by an externalizer while decoding a token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The token is not a valid encoding of the property's value type.
    #[error("invalid token {token:?}: {reason}")]
    InvalidToken {
        /// Token as it appeared in the string.
        token: String,
        /// Codec-specific explanation.
        reason: String,
    },
}

/// Errors surfaced by schema construction, edge construction,
/// canonicalization, and string parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A property key was declared with an empty name.
    #[error("property name must not be empty")]
    EmptyPropertyName,
    /// Two property keys share a name.
    #[error("duplicate property in schema: {0}")]
    DuplicateProperty(String),
    /// A property name is not declared in the schema.
    #[error("unknown property: {0}")]
    UnknownProperty(String),
    /// Two property bags (or edges) were compared across different schema instances.
    #[error("property bags belong to different schemas")]
    SchemaMismatch,
    /// Some, but not all, edges of a graph carry properties.
    #[error("{with_properties} of {total} edges carry properties; expected all or none")]
    InconsistentProperties {
        /// Edges carrying a property bag.
        with_properties: usize,
        /// Edges in the graph.
        total: usize,
    },
    /// A node was used as an endpoint of an edge it does not touch.
    #[error("node {node} is not an endpoint of edge {edge_id}")]
    NotAnEndpoint {
        /// Queried node index.
        node: NodeIndex,
        /// Edge that was queried.
        edge_id: EdgeId,
    },
    /// `cut_tadpole` was called on something other than an internal self-loop.
    #[error("edge {edge_id} is not an internal self-loop")]
    NotATadpole {
        /// Offending edge.
        edge_id: EdgeId,
    },
    /// Two edges give the same node index different values for a node property.
    #[error("node {node} carries conflicting values for `{property}`")]
    ConflictingNodeProperties {
        /// Node index.
        node: NodeIndex,
        /// Node property with more than one value.
        property: String,
    },
    /// An externalizer produced a token the string form cannot carry back.
    #[error("property `{property}`: token {token:?} is empty or contains ':', '|' or '_'")]
    UnencodableToken {
        /// Property being encoded.
        property: String,
        /// Offending token.
        token: String,
    },
    /// The id generator only accepts caller-supplied ids and none was given.
    #[error("edge id generator requires a caller-supplied id")]
    MissingEdgeId,
    /// The string has the wrong number of `:`-separated segments.
    #[error("expected 1 or {expected} segments, found {found}")]
    SegmentCount {
        /// `1 + properties_count()`.
        expected: usize,
        /// Segments present.
        found: usize,
    },
    /// An edge-property segment does not mirror the topology's groups.
    #[error("property `{property}`: expected {expected} groups, found {found}")]
    GroupCount {
        /// Property being parsed.
        property: String,
        /// Groups in the topology.
        expected: usize,
        /// Groups present.
        found: usize,
    },
    /// A property segment (or group) holds the wrong number of tokens.
    #[error("property `{property}`: expected {expected} tokens, found {found}")]
    TokenCount {
        /// Property being parsed.
        property: String,
        /// Tokens expected.
        expected: usize,
        /// Tokens present.
        found: usize,
    },
    /// An externalizer rejected a token.
    #[error("property `{property}`: {source}")]
    Decode {
        /// Property being parsed.
        property: String,
        /// Codec failure.
        #[source]
        source: DecodeError,
    },
    /// The topology oracle rejected the edge list or topology string.
    #[error(transparent)]
    Topology(#[from] NickelError),
}
