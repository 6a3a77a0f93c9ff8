// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Schema fixtures.
//!
//! Every function builds a new schema; schemas compare by identity, so tests
//! that need two edges to be comparable must share one returned `Arc`.

use std::sync::Arc;

use graph_state::{PropertyKey, PropertySchema};

use crate::value::{TestCodec, TestValue};

fn create(keys: Vec<PropertyKey<TestValue>>) -> Arc<PropertySchema<TestValue>> {
    match PropertySchema::create(keys) {
        Ok(schema) => schema,
        Err(e) => unreachable!("fixture schema is valid: {e}"),
    }
}

/// One directed edge property, `flow`.
pub fn flow_schema() -> Arc<PropertySchema<TestValue>> {
    create(vec![PropertyKey::edge("flow", true, TestCodec::shared())])
}

/// Edge `flow` (directed), edge `kind` (undirected), node `charge` (undirected).
pub fn mixed_schema() -> Arc<PropertySchema<TestValue>> {
    create(vec![
        PropertyKey::edge("flow", true, TestCodec::shared()),
        PropertyKey::edge("kind", false, TestCodec::shared()),
        PropertyKey::node("charge", false, TestCodec::shared()),
    ])
}

/// Edge `port` (undirected, node-valued) and edge `flow` (directed).
pub fn port_schema() -> Arc<PropertySchema<TestValue>> {
    create(vec![
        PropertyKey::edge("port", false, TestCodec::shared()),
        PropertyKey::edge("flow", true, TestCodec::shared()),
    ])
}
