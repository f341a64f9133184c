//! Debug introspection of a collection's vector graph.

use tracing::instrument;

use shilp_core::defaults::COLLECTIONS_PATH;
use shilp_core::{
    DebugDistanceResponse, DebugLevelsResponse, DebugNodeInfoResponse, DebugNodesAtLevelResponse,
    DebugReferenceNodeResponse, Result,
};

use crate::client::{require_non_empty, ShilpClient};
use crate::transport::segment;

fn debug_path(collection: &str, rest: &str) -> String {
    format!("{}/debug/{}/{}", COLLECTIONS_PATH, segment(collection), rest)
}

impl ShilpClient {
    /// Distance between a graph node and the embedding of `text`.
    #[instrument(skip(self, text))]
    pub async fn get_collection_distance(
        &self,
        collection: &str,
        field: &str,
        node_id: u64,
        text: &str,
    ) -> Result<DebugDistanceResponse> {
        require_non_empty("collection name", collection)?;
        require_non_empty("field", field)?;
        let path = debug_path(
            collection,
            &format!("{}/distance/{}", segment(field), node_id),
        );
        self.transport
            .get_json(&path, &[("text", text.to_string())])
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_collection_node_info(
        &self,
        collection: &str,
        field: &str,
        node_id: u64,
    ) -> Result<DebugNodeInfoResponse> {
        require_non_empty("collection name", collection)?;
        require_non_empty("field", field)?;
        let path = debug_path(collection, &format!("{}/nodes/{}", segment(field), node_id));
        self.transport.get_json(&path, &[]).await
    }

    /// Neighbors of a node on one graph level, optionally paginated.
    #[instrument(skip(self))]
    pub async fn get_collection_node_neighbors_at_level(
        &self,
        collection: &str,
        field: &str,
        node_id: u64,
        level: u32,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<DebugNodeInfoResponse> {
        require_non_empty("collection name", collection)?;
        require_non_empty("field", field)?;
        let path = debug_path(
            collection,
            &format!("{}/nodes/{}/neighbors/{}", segment(field), node_id, level),
        );

        let mut query = Vec::new();
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(offset) = offset {
            query.push(("offset", offset.to_string()));
        }
        self.transport.get_json(&path, &query).await
    }

    /// Node counts per level, keyed by field.
    #[instrument(skip(self))]
    pub async fn get_collection_levels(&self, collection: &str) -> Result<DebugLevelsResponse> {
        require_non_empty("collection name", collection)?;
        self.transport
            .get_json(&debug_path(collection, "levels"), &[])
            .await
    }

    /// Node ids present on `level`, keyed by field.
    #[instrument(skip(self))]
    pub async fn get_collection_nodes_at_level(
        &self,
        collection: &str,
        level: u32,
    ) -> Result<DebugNodesAtLevelResponse> {
        require_non_empty("collection name", collection)?;
        self.transport
            .get_json(&debug_path(collection, &format!("levels/{}", level)), &[])
            .await
    }

    /// The reference document a vector node belongs to.
    #[instrument(skip(self))]
    pub async fn get_collection_node_by_reference_node_id(
        &self,
        collection: &str,
        node_id: &str,
    ) -> Result<DebugReferenceNodeResponse> {
        require_non_empty("collection name", collection)?;
        require_non_empty("node id", node_id)?;
        let path = debug_path(
            collection,
            &format!("nodes/reference_node/{}", segment(node_id)),
        );
        self.transport.get_json(&path, &[]).await
    }
}
