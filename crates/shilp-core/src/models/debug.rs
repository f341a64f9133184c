//! Debug introspection of the vector graph.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;

use super::null_as_default;

/// Response for the debug distance endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugDistanceResponse {
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Map<String, JsonValue>,
}

/// Neighbor node in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugNeighbor {
    pub node_id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vector_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub field: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub distance: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: Map<String, JsonValue>,
}

/// Detailed information about a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugNodeInfo {
    pub node_id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vector_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub field: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub level: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: Map<String, JsonValue>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub neighbors: Vec<DebugNeighbor>,
}

/// Response for the node info and neighbors endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugNodeInfoResponse {
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default)]
    pub data: Option<DebugNodeInfo>,
}

/// Node count on one graph level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugLevelInfo {
    pub level: u32,
    pub node_count: u64,
}

/// Response for the levels endpoint, keyed by field name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugLevelsResponse {
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: HashMap<String, Vec<DebugLevelInfo>>,
}

impl DebugLevelsResponse {
    /// Highest level present for `field`.
    pub fn top_level(&self, field: &str) -> Option<u32> {
        self.data.get(field)?.iter().map(|l| l.level).max()
    }
}

/// Response for the nodes-at-level endpoint, keyed by field name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugNodesAtLevelResponse {
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: HashMap<String, Vec<u64>>,
}

/// Vector node attached to a reference document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugVectorNode {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub field: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vector: Vec<f32>,
}

/// Reference document with its vector nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugReferenceNode {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: Map<String, JsonValue>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nodes: Vec<DebugVectorNode>,
}

/// Response for the reference node endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugReferenceNodeResponse {
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default)]
    pub data: Option<DebugReferenceNode>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_info_with_neighbors() {
        let resp: DebugNodeInfoResponse = serde_json::from_value(json!({
            "success": true,
            "message": "",
            "data": {
                "node_id": 7,
                "vector_id": "a#0",
                "field": "body",
                "level": 2,
                "metadata": {},
                "neighbors": [
                    {"node_id": 8, "vector_id": "b#0", "field": "body", "distance": 0.25, "metadata": null}
                ]
            }
        }))
        .unwrap();
        let info = resp.data.unwrap();
        assert_eq!(info.level, 2);
        assert_eq!(info.neighbors[0].node_id, 8);
        assert!(info.neighbors[0].metadata.is_empty());
    }

    #[test]
    fn test_levels_top_level() {
        let resp: DebugLevelsResponse = serde_json::from_value(json!({
            "success": true,
            "data": {"body": [{"level": 0, "node_count": 100}, {"level": 3, "node_count": 1}]}
        }))
        .unwrap();
        assert_eq!(resp.top_level("body"), Some(3));
        assert_eq!(resp.top_level("title"), None);
    }

    #[test]
    fn test_reference_node_absent() {
        let resp: DebugReferenceNodeResponse =
            serde_json::from_value(json!({"success": false, "message": "missing", "data": null}))
                .unwrap();
        assert!(resp.data.is_none());
    }
}
