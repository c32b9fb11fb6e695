// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Output records
//!
//! A [`Record`] mirrors one [`Schema`]: one [`FieldValue`] per field. It is
//! allocated once per element parser and cleared (not reallocated) before
//! every line, so repeated fields keep their capacity between lines.

use smallvec::SmallVec;

use crate::schema::{FieldSpec, Schema};

/// A converted scalar.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    /// Index into the declared variant list
    Enum(usize),
}

impl Value {
    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as float (integers widen)
    #[inline]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_enum(&self) -> Option<usize> {
        match self {
            Value::Enum(i) => Some(*i),
            _ => None,
        }
    }
}

/// Subfield values of one composite occurrence; `None` marks an absent
/// optional subfield. Repeated scalars use single-slot groups.
pub type Group = SmallVec<[Option<Value>; 4]>;

/// Value of one schema field.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldValue {
    Scalar(Option<Value>),
    Composite(Group),
    Repeated(Vec<Group>),
}

impl FieldValue {
    fn clear(&mut self) {
        match self {
            FieldValue::Scalar(value) => *value = None,
            FieldValue::Composite(group) => group.iter_mut().for_each(|slot| *slot = None),
            FieldValue::Repeated(items) => items.clear(),
        }
    }
}

/// Fields extracted from one line.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Record {
    fields: Vec<FieldValue>,
}

impl Record {
    /// Create an empty record shaped after `schema`.
    pub fn for_schema(schema: &Schema) -> Self {
        let fields = schema
            .fields()
            .iter()
            .map(|field| match field {
                FieldSpec::Scalar(_) => FieldValue::Scalar(None),
                FieldSpec::Composite(c) => {
                    FieldValue::Composite(std::iter::repeat(None).take(c.fields.len()).collect())
                }
                FieldSpec::Repeated(_) => FieldValue::Repeated(Vec::new()),
            })
            .collect();
        Self { fields }
    }

    /// Reset every field, keeping allocations.
    pub fn clear(&mut self) {
        self.fields.iter_mut().for_each(FieldValue::clear);
    }

    pub fn fields(&self) -> &[FieldValue] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FieldValue> {
        self.fields.get(index)
    }

    /// Scalar field value, if the field is a scalar and was present.
    pub fn scalar(&self, index: usize) -> Option<&Value> {
        match self.fields.get(index)? {
            FieldValue::Scalar(value) => value.as_ref(),
            _ => None,
        }
    }

    pub fn float(&self, index: usize) -> Option<f64> {
        self.scalar(index).and_then(Value::as_float)
    }

    pub fn int(&self, index: usize) -> Option<i64> {
        self.scalar(index).and_then(Value::as_int)
    }

    pub fn bool(&self, index: usize) -> Option<bool> {
        self.scalar(index).and_then(Value::as_bool)
    }

    pub fn text(&self, index: usize) -> Option<&str> {
        self.scalar(index).and_then(Value::as_str)
    }

    /// Subfields of a composite field.
    pub fn group(&self, index: usize) -> Option<&Group> {
        match self.fields.get(index)? {
            FieldValue::Composite(group) => Some(group),
            _ => None,
        }
    }

    /// Occurrences of a repeated field (empty slice for other field kinds).
    pub fn repeated(&self, index: usize) -> &[Group] {
        match self.fields.get(index) {
            Some(FieldValue::Repeated(items)) => items,
            _ => &[],
        }
    }

    pub(crate) fn field_mut(&mut self, index: usize) -> Option<&mut FieldValue> {
        self.fields.get_mut(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CompositeSpec, Delimiter, ScalarSpec, ValueKind};

    #[test]
    fn test_shape_follows_schema() {
        let schema = Schema::new(vec![
            FieldSpec::scalar("x", ValueKind::Float),
            FieldSpec::composite(
                CompositeSpec::new("pair", Delimiter::Space)
                    .field(ScalarSpec::new("a", ValueKind::Int))
                    .field(ScalarSpec::new("b", ValueKind::Int)),
            ),
            FieldSpec::repeated("rest", ScalarSpec::new("rest", ValueKind::Int), 1),
        ]);
        let record = Record::for_schema(&schema);
        assert_eq!(record.len(), 3);
        assert_eq!(record.get(0), Some(&FieldValue::Scalar(None)));
        assert_eq!(record.group(1).map(|g| g.len()), Some(2));
        assert!(record.repeated(2).is_empty());
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let schema = Schema::new(vec![FieldSpec::repeated(
            "rest",
            ScalarSpec::new("rest", ValueKind::Int),
            1,
        )]);
        let mut record = Record::for_schema(&schema);
        if let Some(FieldValue::Repeated(items)) = record.field_mut(0) {
            for i in 0..16 {
                items.push(smallvec::smallvec![Some(Value::Int(i))]);
            }
        }
        record.clear();
        match record.get(0) {
            Some(FieldValue::Repeated(items)) => {
                assert!(items.is_empty());
                assert!(items.capacity() >= 16);
            }
            other => panic!("unexpected field {:?}", other),
        }
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Int(3).as_float(), Some(3.0));
        assert_eq!(Value::Float(0.5).as_int(), None);
        assert_eq!(Value::Text("mat".into()).as_str(), Some("mat"));
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Enum(1).as_enum(), Some(1));
    }
}
