// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Property schema and codec boundary.
//!
//! A [`PropertySchema`] is built once and shared behind an [`Arc`] by every
//! bag, node, and edge created with it. Bags compare only when they point at
//! the *same* schema allocation; two schemas with identical keys are still
//! different schemas.

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::{DecodeError, GraphError};

/// String codec for one property.
///
/// Contract:
/// - `serialize` must not emit `:`, `|` or `_`; those delimit the canonical
///   string.
/// - `deserialize(serialize(v))` must return `v`.
/// - Neither direction may consult ambient state.
pub trait Externalizer<V>: Send + Sync {
    /// Encodes `value` as a token.
    fn serialize(&self, value: &V) -> String;

    /// Decodes a token produced by [`serialize`](Externalizer::serialize).
    ///
    /// # Errors
    /// Returns [`DecodeError::InvalidToken`] if `token` is not a valid encoding.
    fn deserialize(&self, token: &str) -> Result<V, DecodeError>;
}

/// Externalizer backed by `Display` and `FromStr`.
pub struct DisplayCodec<V> {
    _marker: PhantomData<fn() -> V>,
}

impl<V> DisplayCodec<V> {
    /// Creates the codec.
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<V> Default for DisplayCodec<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> DisplayCodec<V>
where
    V: fmt::Display + FromStr + 'static,
    <V as FromStr>::Err: fmt::Display,
{
    /// Creates the codec behind an `Arc`, ready for a [`PropertyKey`].
    pub fn shared() -> Arc<dyn Externalizer<V>> {
        Arc::new(Self::new())
    }
}

impl<V> Externalizer<V> for DisplayCodec<V>
where
    V: fmt::Display + FromStr,
    <V as FromStr>::Err: fmt::Display,
{
    fn serialize(&self, value: &V) -> String {
        value.to_string()
    }

    fn deserialize(&self, token: &str) -> Result<V, DecodeError> {
        token.parse().map_err(|e: <V as FromStr>::Err| DecodeError::InvalidToken {
            token: token.to_owned(),
            reason: e.to_string(),
        })
    }
}

/// Declaration of one property.
#[derive(Clone)]
pub struct PropertyKey<V> {
    name: String,
    directed: bool,
    edge_property: bool,
    externalizer: Arc<dyn Externalizer<V>>,
}

impl<V> PropertyKey<V> {
    /// Declares a property.
    ///
    /// `directed` properties are negated when their owner's orientation flips.
    /// `edge_property` selects whether values live on edges or on nodes.
    pub fn new(
        name: impl Into<String>,
        directed: bool,
        edge_property: bool,
        externalizer: Arc<dyn Externalizer<V>>,
    ) -> Self {
        Self {
            name: name.into(),
            directed,
            edge_property,
            externalizer,
        }
    }

    /// Declares an edge property.
    pub fn edge(
        name: impl Into<String>,
        directed: bool,
        externalizer: Arc<dyn Externalizer<V>>,
    ) -> Self {
        Self::new(name, directed, true, externalizer)
    }

    /// Declares a node property.
    pub fn node(
        name: impl Into<String>,
        directed: bool,
        externalizer: Arc<dyn Externalizer<V>>,
    ) -> Self {
        Self::new(name, directed, false, externalizer)
    }

    /// Property name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<V> fmt::Debug for PropertyKey<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyKey")
            .field("name", &self.name)
            .field("directed", &self.directed)
            .field("edge_property", &self.edge_property)
            .finish_non_exhaustive()
    }
}

/// Immutable description of a fixed set of named properties.
///
/// Insertion order of the keys is the comparison and serialization order.
pub struct PropertySchema<V> {
    order: Vec<String>,
    positions: FxHashMap<String, usize>,
    directed: Vec<bool>,
    edge_property: Vec<bool>,
    externalizers: Vec<Arc<dyn Externalizer<V>>>,
}

impl<V> PropertySchema<V> {
    /// Builds a schema from `keys`, in order.
    ///
    /// An empty key list is allowed and means "no properties".
    ///
    /// # Errors
    /// [`GraphError::EmptyPropertyName`] or [`GraphError::DuplicateProperty`].
    pub fn create(keys: impl IntoIterator<Item = PropertyKey<V>>) -> Result<Arc<Self>, GraphError> {
        let mut schema = Self {
            order: Vec::new(),
            positions: FxHashMap::default(),
            directed: Vec::new(),
            edge_property: Vec::new(),
            externalizers: Vec::new(),
        };
        for key in keys {
            if key.name.is_empty() {
                return Err(GraphError::EmptyPropertyName);
            }
            if schema.positions.contains_key(&key.name) {
                return Err(GraphError::DuplicateProperty(key.name));
            }
            schema.positions.insert(key.name.clone(), schema.order.len());
            schema.order.push(key.name);
            schema.directed.push(key.directed);
            schema.edge_property.push(key.edge_property);
            schema.externalizers.push(key.externalizer);
        }
        Ok(Arc::new(schema))
    }

    /// A schema without properties.
    pub fn empty() -> Arc<Self> {
        Arc::new(Self {
            order: Vec::new(),
            positions: FxHashMap::default(),
            directed: Vec::new(),
            edge_property: Vec::new(),
            externalizers: Vec::new(),
        })
    }

    /// Whether `a` and `b` are the same schema instance.
    pub fn same(a: &Arc<Self>, b: &Arc<Self>) -> bool {
        Arc::ptr_eq(a, b)
    }

    /// Codec for `name`.
    pub fn externalizer(&self, name: &str) -> Option<&dyn Externalizer<V>> {
        self.position(name).and_then(|i| self.externalizer_at(i))
    }

    /// Whether `name` is directed. Unknown names are not.
    pub fn is_directed(&self, name: &str) -> bool {
        self.position(name).is_some_and(|i| self.directed_at(i))
    }

    /// Whether `name` exists and lives on edges (`from_edge`) or nodes (`!from_edge`).
    pub fn has_property(&self, name: &str, from_edge: bool) -> bool {
        self.position(name)
            .is_some_and(|i| self.edge_property_at(i) == from_edge)
    }

    /// Number of properties.
    pub fn properties_count(&self) -> usize {
        self.order.len()
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the schema declares no properties.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Property names in schema order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Schema index of `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Name of the property at schema index `i`.
    pub fn name_at(&self, i: usize) -> Option<&str> {
        self.order.get(i).map(String::as_str)
    }

    /// Whether the schema declares at least one property living on edges
    /// (`from_edge`) or on nodes.
    pub fn has_any(&self, from_edge: bool) -> bool {
        self.edge_property.iter().any(|&e| e == from_edge)
    }

    pub(crate) fn directed_at(&self, i: usize) -> bool {
        self.directed.get(i).copied().unwrap_or(false)
    }

    pub(crate) fn edge_property_at(&self, i: usize) -> bool {
        self.edge_property.get(i).copied().unwrap_or(false)
    }

    pub(crate) fn externalizer_at(&self, i: usize) -> Option<&dyn Externalizer<V>> {
        self.externalizers.get(i).map(AsRef::as_ref)
    }
}

impl<V> fmt::Debug for PropertySchema<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertySchema")
            .field("order", &self.order)
            .field("directed", &self.directed)
            .field("edge_property", &self.edge_property)
            .finish_non_exhaustive()
    }
}
