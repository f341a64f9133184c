//! Hybrid vector/keyword search.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;

use super::null_as_default;
use crate::error::{Error, Result};
use crate::query::{CompoundFilter, CompoundSort};

/// Request body for the search endpoint.
///
/// Call [`SearchRequest::validate`] (the client does so before sending) to
/// check the invariants: a non-empty collection, and at least one of `query`
/// or `vector_query`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub collection: String,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weights: Option<HashMap<String, f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<CompoundFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<CompoundSort>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_query: Option<Vec<f32>>,
}

impl SearchRequest {
    /// Text search against `collection`.
    pub fn new(collection: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            query: query.into(),
            ..Default::default()
        }
    }

    /// Pure vector search against `collection`.
    pub fn by_vector(collection: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            collection: collection.into(),
            vector_query: Some(vector),
            ..Default::default()
        }
    }

    pub fn with_vector(mut self, vector: Vec<f32>) -> Self {
        self.vector_query = Some(vector);
        self
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }

    /// Cap the number of hits. Zero is rejected by [`SearchRequest::validate`].
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_weight(mut self, field: impl Into<String>, weight: f64) -> Self {
        self.weights
            .get_or_insert_with(HashMap::new)
            .insert(field.into(), weight);
        self
    }

    pub fn with_max_distance(mut self, max_distance: f64) -> Self {
        self.max_distance = Some(max_distance);
        self
    }

    pub fn with_filters(mut self, filters: CompoundFilter) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn with_sort(mut self, sort: CompoundSort) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Pre-flight checks, run before any network call.
    pub fn validate(&self) -> Result<()> {
        if self.collection.is_empty() {
            return Err(Error::Validation(
                "collection name cannot be empty".to_string(),
            ));
        }
        let has_vector = self.vector_query.as_ref().is_some_and(|v| !v.is_empty());
        if self.query.is_empty() && !has_vector {
            return Err(Error::Validation(
                "both vector_query and query cannot be empty".to_string(),
            ));
        }
        if self.limit == Some(0) {
            return Err(Error::Validation("limit must be positive".to_string()));
        }
        if let Some(filters) = &self.filters {
            filters.validate()?;
        }
        if let Some(sort) = &self.sort {
            sort.validate()?;
        }
        Ok(())
    }
}

/// A search hit: the server returns each document as a flat JSON object.
pub type SearchHit = Map<String, JsonValue>;

/// Response for searching data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<SearchHit>,
}

impl SearchResponse {
    /// Identifiers of the hits, in result order. Hits without a string `id` are skipped.
    pub fn ids(&self) -> Vec<&str> {
        self.data
            .iter()
            .filter_map(|hit| hit.get("id").and_then(JsonValue::as_str))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{FilterExpression, SortExpression};
    use serde_json::json;

    #[test]
    fn test_search_requires_collection() {
        let err = SearchRequest::new("", "x").validate().unwrap_err();
        assert!(err.to_string().contains("collection name cannot be empty"));

        let err = SearchRequest::by_vector("", vec![0.1]).validate().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_search_requires_query_or_vector() {
        let err = SearchRequest::new("docs", "").validate().unwrap_err();
        assert!(err
            .to_string()
            .contains("both vector_query and query cannot be empty"));

        let err = SearchRequest::new("docs", "")
            .with_vector(vec![])
            .with_limit(5)
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_search_accepts_vector_only() {
        assert!(SearchRequest::by_vector("docs", vec![0.1, 0.2])
            .validate()
            .is_ok());
    }

    #[test]
    fn test_search_rejects_zero_limit() {
        assert!(SearchRequest::new("docs", "x").with_limit(0).validate().is_err());
    }

    #[test]
    fn test_search_validates_nested_expressions() {
        let req = SearchRequest::new("docs", "x")
            .with_filters(CompoundFilter::new().and(FilterExpression::eq("", 1)));
        assert!(req.validate().is_err());

        let req = SearchRequest::new("docs", "x")
            .with_sort(CompoundSort::new().then(SortExpression::asc("")));
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_search_body_shape() {
        let req = SearchRequest::new("docs", "artificial intelligence")
            .with_limit(2)
            .with_filters(CompoundFilter::new().and(FilterExpression::gte("rating", 4.0)))
            .with_sort(CompoundSort::new().then(SortExpression::desc("views")));

        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(
            body,
            json!({
                "collection": "docs",
                "query": "artificial intelligence",
                "limit": 2,
                "filters": {"and": [{"attribute": "rating", "op": 3, "value": 4.0, "values": null}]},
                "sort": {"sorts": [{"attribute": "views", "order": 1}]}
            })
        );
    }

    #[test]
    fn test_search_response_ids() {
        let resp: SearchResponse = serde_json::from_value(json!({
            "success": true,
            "message": "",
            "data": [{"id": "a", "title": "x"}, {"title": "no id"}, {"id": "c"}]
        }))
        .unwrap();
        assert_eq!(resp.ids(), vec!["a", "c"]);
    }
}
