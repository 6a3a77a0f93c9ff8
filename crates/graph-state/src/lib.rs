// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! graph-state: canonical forms for labeled multigraphs with external legs.
//!
//! Two graphs that are the same up to node relabeling and edge orientation
//! produce the same [`GraphState`], the same canonical string, and the same
//! digest.
//!
//! - [`PropertySchema`] declares the properties edges and nodes may carry.
//! - [`PropertyBag`] holds the values of one edge or node.
//! - [`Edge`] normalizes its orientation on construction, negating directed
//!   values when it swaps its endpoints.
//! - [`GraphState`] picks the minimal relabelings from the topology oracle
//!   ([`nickel`]) and refines them by property value.
//! - The string form (`Display` / [`GraphState::parse`]) round-trips.
//!
//! The library performs no I/O. Diagnostics go through `tracing`; no
//! subscriber is installed here.
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
    clippy::module_name_repetitions,
    clippy::missing_errors_doc
)]

mod bag;
mod codec;
mod edge;
mod edge_id;
mod error;
mod node;
mod schema;
mod state;
mod value;

pub use bag::PropertyBag;
pub use codec::{SEGMENT_SEP, SEP2};
pub use edge::{Edge, EdgeBuilder, EdgeKey, NodeArg};
pub use edge_id::{global_edge_ids, EdgeId, EdgeIdGenerator, EdgeIds};
pub use error::{DecodeError, GraphError};
pub use nickel::{NodeIndex, NodeMap, LEG, SEP};
pub use node::{Node, NodeKey};
pub use schema::{DisplayCodec, Externalizer, PropertyKey, PropertySchema};
pub use state::GraphState;
pub use value::{Externalizable, NoValue, PropertyValue};
