//! Ingestion, search and storage browsing.

use reqwest::Method;
use std::path::Path;
use tracing::{debug, instrument};

use shilp_core::defaults::DATA_PATH;
use shilp_core::{
    FileReaderOptions, GenericResponse, IngestRequest, IngestResponse, IngestSourceType,
    ListEmbeddingModelsResponse, ListIngestionSourcesResponse, ListStorageResponse,
    ReadDocumentResponse, Result, SearchRequest, SearchResponse,
};

use crate::client::{require_non_empty, ShilpClient};
use crate::streaming::EventSubscription;
use crate::transport::decode;

fn data_path(endpoint: &str) -> String {
    format!("{}/{}", DATA_PATH, endpoint)
}

impl ShilpClient {
    /// Start a bulk ingestion job.
    #[instrument(skip(self, request), fields(collection = %request.collection_name))]
    pub async fn ingest_data(&self, request: &IngestRequest) -> Result<IngestResponse> {
        require_non_empty("collection name", &request.collection_name)?;
        self.transport
            .exchange_json(Method::POST, &data_path("ingest"), Some(request), &[])
            .await
    }

    /// Hybrid search. The request is validated before anything is sent.
    #[instrument(skip(self, request), fields(collection = %request.collection))]
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        request.validate()?;
        let resp: SearchResponse = self
            .transport
            .exchange_json(Method::POST, &data_path("search"), Some(request), &[])
            .await?;
        debug!(hits = resp.data.len(), "Search complete");
        Ok(resp)
    }

    /// Upload a local file to server storage for later ingestion.
    #[instrument(skip(self))]
    pub async fn upload_data_file(&self, file: &Path) -> Result<GenericResponse> {
        let value = self
            .transport
            .upload_file(&data_path("storage/upload"), file)
            .await?;
        decode(value)
    }

    /// List a storage directory. Empty `path` lists the storage root.
    #[instrument(skip(self))]
    pub async fn list_storage(
        &self,
        path: &str,
        source: Option<IngestSourceType>,
    ) -> Result<ListStorageResponse> {
        let mut query = Vec::new();
        if !path.is_empty() {
            query.push(("path", path.to_string()));
        }
        if let Some(source) = source {
            query.push(("source", source.as_str().to_string()));
        }
        self.transport
            .get_json(&data_path("storage/list"), &query)
            .await
    }

    /// Read the first rows of a stored document.
    #[instrument(skip(self, options))]
    pub async fn read_document(
        &self,
        path: &str,
        options: &FileReaderOptions,
    ) -> Result<ReadDocumentResponse> {
        let query = options.to_query(path)?;
        self.transport
            .get_json(&data_path("storage/read"), &query)
            .await
    }

    #[instrument(skip(self))]
    pub async fn list_embedding_models(&self) -> Result<ListEmbeddingModelsResponse> {
        self.transport
            .get_json(&data_path("embedding/models"), &[])
            .await
    }

    #[instrument(skip(self))]
    pub async fn list_ingest_sources(&self) -> Result<ListIngestionSourcesResponse> {
        self.transport
            .get_json(&data_path("ingest/sources"), &[])
            .await
    }

    /// Subscribe to live ingestion statistics for a collection.
    ///
    /// Each event is one raw line as sent by the server.
    #[instrument(skip(self))]
    pub async fn stream_ingest_stats(&self, collection: &str) -> Result<EventSubscription> {
        require_non_empty("collection name", collection)?;
        self.transport
            .subscribe(
                &data_path("ingest/stats"),
                &[("collection", collection.to_string())],
            )
            .await
    }

    /// Feed ingestion statistics to `on_line` until the server closes the stream.
    #[instrument(skip(self, on_line))]
    pub async fn watch_ingest_stats<F>(&self, collection: &str, on_line: F) -> Result<()>
    where
        F: FnMut(String),
    {
        require_non_empty("collection name", collection)?;
        self.transport
            .subscribe_events(
                &data_path("ingest/stats"),
                &[("collection", collection.to_string())],
                on_line,
            )
            .await
    }
}
