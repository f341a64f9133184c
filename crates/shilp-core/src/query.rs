//! Query expressions: compound filters and multi-key sorts.
//!
//! Expressions are plain values. [`FilterExpression::validate`] and
//! [`SortExpression::validate`] check the per-expression invariants; the
//! compound types only combine them. An empty compound is the "no constraint"
//! case and serializes to `{}`.
//!
//! # Wire form
//!
//! ```text
//! filters: {"and": [{"attribute": "age", "op": 2, "value": 25, "values": null}]}
//! sort:    {"sorts": [{"attribute": "created_at", "order": 1}]}
//! ```
//!
//! `value` and `values` are always present on a filter item, holding `null`
//! when unused.
//!
//! # Example
//!
//! ```
//! use shilp_core::query::{CompoundFilter, CompoundSort, FilterExpression, SortExpression};
//!
//! let filters = CompoundFilter::new()
//!     .and(FilterExpression::gt("rating", 4.0))
//!     .and(FilterExpression::is_in("category", ["technology", "science"]));
//! let sort = CompoundSort::new()
//!     .then(SortExpression::desc("rating"))
//!     .then(SortExpression::asc("title"));
//!
//! assert!(filters.validate().is_ok());
//! assert_eq!(sort.to_wire_form()["sorts"][0]["order"], 1);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::models::null_as_default;
pub use crate::models::enums::{FilterOp, SortOrder};

// =============================================================================
// SCALAR VALUES
// =============================================================================

/// Scalar compared by a filter expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        AttrValue::Int(v.into())
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::String(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::String(v)
    }
}

// =============================================================================
// FILTERS
// =============================================================================

/// Single filter condition on a metadata attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterExpression {
    pub attribute: String,
    pub op: FilterOp,
    /// Compared value for every operator except `IN`/`NOT_IN`.
    #[serde(default)]
    pub value: Option<AttrValue>,
    /// Value set for `IN`/`NOT_IN`.
    #[serde(default)]
    pub values: Option<Vec<AttrValue>>,
}

impl FilterExpression {
    /// Single-value expression. Use [`FilterExpression::set`] for `IN`/`NOT_IN`.
    pub fn new(attribute: impl Into<String>, op: FilterOp, value: impl Into<AttrValue>) -> Self {
        Self {
            attribute: attribute.into(),
            op,
            value: Some(value.into()),
            values: None,
        }
    }

    /// Set-membership expression.
    pub fn set<I, V>(attribute: impl Into<String>, op: FilterOp, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<AttrValue>,
    {
        Self {
            attribute: attribute.into(),
            op,
            value: None,
            values: Some(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn eq(attribute: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        Self::new(attribute, FilterOp::Equals, value)
    }

    pub fn neq(attribute: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        Self::new(attribute, FilterOp::NotEquals, value)
    }

    pub fn gt(attribute: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        Self::new(attribute, FilterOp::GreaterThan, value)
    }

    pub fn gte(attribute: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        Self::new(attribute, FilterOp::GreaterThanOrEqual, value)
    }

    pub fn lt(attribute: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        Self::new(attribute, FilterOp::LessThan, value)
    }

    pub fn lte(attribute: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        Self::new(attribute, FilterOp::LessThanOrEqual, value)
    }

    pub fn is_in<I, V>(attribute: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<AttrValue>,
    {
        Self::set(attribute, FilterOp::In, values)
    }

    pub fn not_in<I, V>(attribute: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<AttrValue>,
    {
        Self::set(attribute, FilterOp::NotIn, values)
    }

    /// Check the expression's invariants without side effects.
    pub fn validate(&self) -> Result<()> {
        if self.attribute.is_empty() {
            return Err(Error::Validation(
                "attribute name cannot be empty".to_string(),
            ));
        }

        if self.op.is_set_operator() {
            if self.values.as_ref().map_or(true, |v| v.is_empty()) {
                return Err(Error::Validation(
                    "IN/NOT IN operations require at least one value".to_string(),
                ));
            }
        } else if self.value.is_none() {
            return Err(Error::Validation(format!(
                "value cannot be None for operation {}",
                self.op
            )));
        }

        Ok(())
    }
}

/// Filter expressions combined by logical AND.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompoundFilter {
    #[serde(
        rename = "and",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub and_filters: Vec<FilterExpression>,
}

impl CompoundFilter {
    /// Empty filter (no constraint).
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a condition.
    pub fn and(mut self, expr: FilterExpression) -> Self {
        self.and_filters.push(expr);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.and_filters.is_empty()
    }

    /// Validate every contained expression, reporting the first failure.
    pub fn validate(&self) -> Result<()> {
        self.and_filters.iter().try_for_each(FilterExpression::validate)
    }

    /// Canonical wire form. Total: never fails, `{}` when empty.
    pub fn to_wire_form(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or_else(|_| JsonValue::Object(Default::default()))
    }
}

impl FromIterator<FilterExpression> for CompoundFilter {
    fn from_iter<T: IntoIterator<Item = FilterExpression>>(iter: T) -> Self {
        Self {
            and_filters: iter.into_iter().collect(),
        }
    }
}

// =============================================================================
// SORTING
// =============================================================================

/// Sort criterion on a metadata attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortExpression {
    pub attribute: String,
    pub order: SortOrder,
}

impl SortExpression {
    pub fn new(attribute: impl Into<String>, order: SortOrder) -> Self {
        Self {
            attribute: attribute.into(),
            order,
        }
    }

    pub fn asc(attribute: impl Into<String>) -> Self {
        Self::new(attribute, SortOrder::Ascending)
    }

    pub fn desc(attribute: impl Into<String>) -> Self {
        Self::new(attribute, SortOrder::Descending)
    }

    /// Check the expression's invariants without side effects.
    ///
    /// The order is a closed enum, so an unrecognized order can only come
    /// from decoding and is rejected there.
    pub fn validate(&self) -> Result<()> {
        if self.attribute.is_empty() {
            return Err(Error::Validation(
                "sort attribute cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Sort criteria; the first entry is the primary key, later entries break ties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundSort {
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub sorts: Vec<SortExpression>,
}

impl CompoundSort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tie-breaking criterion.
    pub fn then(mut self, expr: SortExpression) -> Self {
        self.sorts.push(expr);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sorts.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        self.sorts.iter().try_for_each(SortExpression::validate)
    }

    /// Canonical wire form. Total: never fails, `{}` when empty.
    pub fn to_wire_form(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or_else(|_| JsonValue::Object(Default::default()))
    }
}

impl FromIterator<SortExpression> for CompoundSort {
    fn from_iter<T: IntoIterator<Item = SortExpression>>(iter: T) -> Self {
        Self {
            sorts: iter.into_iter().collect(),
        }
    }
}
