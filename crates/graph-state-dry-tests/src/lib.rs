// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for graph-state crates.
//!
//! # Modules
//!
//! - [`value`] - Multi-variant property value and its codec
//! - [`schemas`] - Schema fixtures (fresh instance per call)
//! - [`graphs`] - Edge-list builders for common shapes
//! - [`strategies`] - `proptest` strategies for small graphs
#![forbid(unsafe_code)]

pub mod graphs;
pub mod schemas;
pub mod strategies;
pub mod value;

pub use graphs::{
    bare_edges, conflicting_charges, flow_edges, mixed_edges, mixed_edges_with_nodes,
    permute_charges, relabel, relabel_mixed, reverse_all, FlowEdge, MixedEdge, TRIANGLE,
};
pub use schemas::{flow_schema, mixed_schema, port_schema};
pub use strategies::{
    charges_strategy, flows_for, graph_strategy, mixed_for, permutation_strategy, MAX_NODES,
};
pub use value::{TestCodec, TestValue};
