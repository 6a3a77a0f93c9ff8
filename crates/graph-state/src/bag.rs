// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Property values of a single edge or node.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use nickel::NodeIndex;

use crate::error::GraphError;
use crate::schema::PropertySchema;
use crate::value::PropertyValue;

/// Values of the properties that apply to one edge (`from_edge`) or one node.
///
/// Bags are immutable: negation, updates, and externalization return new
/// bags. Slots are indexed by schema position; slots of the other placement
/// stay empty.
#[derive(Clone)]
pub struct PropertyBag<V> {
    from_edge: bool,
    schema: Arc<PropertySchema<V>>,
    values: Vec<Option<V>>,
    key: OnceLock<Vec<Option<V>>>,
}

impl<V: PropertyValue> PropertyBag<V> {
    /// Builds a bag from `(name, value)` pairs.
    ///
    /// Names placed on the other kind of owner are dropped; names missing from
    /// `values` stay null.
    ///
    /// # Errors
    /// [`GraphError::UnknownProperty`] if a name is not in the schema at all.
    pub fn from_values<K: AsRef<str>>(
        from_edge: bool,
        schema: &Arc<PropertySchema<V>>,
        values: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, GraphError> {
        let slots = vec![None; schema.len()];
        Self::fill(from_edge, Arc::clone(schema), slots, values)
    }

    /// A bag with every value null.
    pub fn empty(from_edge: bool, schema: &Arc<PropertySchema<V>>) -> Self {
        Self::from_slots(from_edge, Arc::clone(schema), vec![None; schema.len()])
    }

    fn fill<K: AsRef<str>>(
        from_edge: bool,
        schema: Arc<PropertySchema<V>>,
        mut slots: Vec<Option<V>>,
        values: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, GraphError> {
        for (name, value) in values {
            let name = name.as_ref();
            let i = schema
                .position(name)
                .ok_or_else(|| GraphError::UnknownProperty(name.to_owned()))?;
            if schema.edge_property_at(i) == from_edge {
                slots[i] = Some(value);
            }
        }
        Ok(Self::from_slots(from_edge, schema, slots))
    }

    pub(crate) fn from_slots(
        from_edge: bool,
        schema: Arc<PropertySchema<V>>,
        values: Vec<Option<V>>,
    ) -> Self {
        Self {
            from_edge,
            schema,
            values,
            key: OnceLock::new(),
        }
    }

    /// The bag as seen from the opposite orientation: directed values are
    /// negated, the rest are kept.
    pub fn negate(&self) -> Self {
        let values = self
            .values
            .iter()
            .enumerate()
            .map(|(i, v)| match v {
                Some(v) if self.schema.directed_at(i) => Some(v.negated()),
                other => other.clone(),
            })
            .collect();
        Self::from_slots(self.from_edge, Arc::clone(&self.schema), values)
    }

    /// Like [`from_values`](Self::from_values), falling back to this bag's
    /// values for names absent from `overrides`.
    pub fn update<K: AsRef<str>>(
        &self,
        from_edge: bool,
        overrides: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, GraphError> {
        let slots = self
            .values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                if self.schema.edge_property_at(i) == from_edge {
                    v.clone()
                } else {
                    None
                }
            })
            .collect();
        Self::fill(from_edge, Arc::clone(&self.schema), slots, overrides)
    }

    /// Replaces every externalizable value by its external form with respect
    /// to `nodes` and `external_node`; other values pass through.
    pub fn externalize(&self, nodes: (NodeIndex, NodeIndex), external_node: NodeIndex) -> Self {
        let values = self
            .values
            .iter()
            .map(|slot| {
                slot.as_ref().map(|v| {
                    v.as_externalizable()
                        .map_or_else(|| v.clone(), |x| x.make_external(nodes, external_node))
                })
            })
            .collect();
        Self::from_slots(self.from_edge, Arc::clone(&self.schema), values)
    }

    /// Applicable values in schema order. Computed once.
    pub fn key(&self) -> &[Option<V>] {
        self.key.get_or_init(|| {
            self.values
                .iter()
                .enumerate()
                .filter(|(i, _)| self.schema.edge_property_at(*i) == self.from_edge)
                .map(|(_, v)| v.clone())
                .collect()
        })
    }

    /// Value of `name`, if set.
    pub fn get(&self, name: &str) -> Option<&V> {
        self.schema.position(name).and_then(|i| self.get_at(i))
    }

    /// Value at schema index `i`, if set.
    pub fn get_at(&self, i: usize) -> Option<&V> {
        self.values.get(i).and_then(Option::as_ref)
    }

    /// Compares only the property at schema index `i`; null orders first.
    ///
    /// # Errors
    /// [`GraphError::SchemaMismatch`] if the bags use different schema instances.
    pub fn compare_by_index(&self, other: &Self, i: usize) -> Result<Ordering, GraphError> {
        self.check_schema(other)?;
        Ok(self.get_at(i).cmp(&other.get_at(i)))
    }

    /// Lexicographic [`compare_by_index`](Self::compare_by_index) over all
    /// schema indices.
    pub fn compare(&self, other: &Self) -> Result<Ordering, GraphError> {
        self.check_schema(other)?;
        Ok((0..self.schema.len())
            .map(|i| self.get_at(i).cmp(&other.get_at(i)))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal))
    }

    /// Whether no property applies to this kind of owner.
    pub fn is_none(&self) -> bool {
        self.key().is_empty()
    }

    /// Whether the bag belongs to an edge.
    pub fn from_edge(&self) -> bool {
        self.from_edge
    }

    /// Shared schema.
    pub fn schema(&self) -> &Arc<PropertySchema<V>> {
        &self.schema
    }

    fn check_schema(&self, other: &Self) -> Result<(), GraphError> {
        if PropertySchema::same(&self.schema, &other.schema) {
            Ok(())
        } else {
            Err(GraphError::SchemaMismatch)
        }
    }
}

impl<V: PropertyValue> PartialEq for PropertyBag<V> {
    fn eq(&self, other: &Self) -> bool {
        PropertySchema::same(&self.schema, &other.schema)
            && self.from_edge == other.from_edge
            && self.key() == other.key()
    }
}

impl<V: PropertyValue> Eq for PropertyBag<V> {}

impl<V: PropertyValue> Hash for PropertyBag<V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl<V: PropertyValue> fmt::Debug for PropertyBag<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (i, v) in self.values.iter().enumerate() {
            if self.schema.edge_property_at(i) == self.from_edge {
                map.entry(&self.schema.name_at(i).unwrap_or("?"), v);
            }
        }
        map.finish()
    }
}
