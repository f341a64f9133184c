//! Collection lifecycle operations.

use reqwest::Method;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

use shilp_core::defaults::COLLECTIONS_PATH;
use shilp_core::{
    AddCollectionRequest, GenericResponse, InsertRecordRequest, InsertRecordResponse,
    ListCollectionsResponse, Result,
};

use crate::client::{require_non_empty, ShilpClient};
use crate::streaming::ByteStream;
use crate::transport::{decode, segment, NO_BODY};

fn collection_path(name: &str, action: &str) -> String {
    if action.is_empty() {
        format!("{}/{}", COLLECTIONS_PATH, segment(name))
    } else {
        format!("{}/{}/{}", COLLECTIONS_PATH, segment(name), action)
    }
}

impl ShilpClient {
    /// List all collections along with the metadata backends the server offers.
    #[instrument(skip(self))]
    pub async fn list_collections(&self) -> Result<ListCollectionsResponse> {
        let resp: ListCollectionsResponse = self
            .transport
            .get_json(&format!("{}/", COLLECTIONS_PATH), &[])
            .await?;
        debug!(count = resp.data.len(), "Listed collections");
        Ok(resp)
    }

    #[instrument(skip(self, request), fields(collection = %request.name))]
    pub async fn add_collection(&self, request: &AddCollectionRequest) -> Result<GenericResponse> {
        require_non_empty("collection name", &request.name)?;
        let resp = self
            .transport
            .exchange_json(
                Method::POST,
                &format!("{}/", COLLECTIONS_PATH),
                Some(request),
                &[],
            )
            .await?;
        info!(collection = %request.name, "Collection added");
        Ok(resp)
    }

    #[instrument(skip(self))]
    pub async fn drop_collection(&self, name: &str) -> Result<GenericResponse> {
        self.collection_action(Method::DELETE, name, "").await
    }

    #[instrument(skip(self))]
    pub async fn rename_collection(&self, old_name: &str, new_name: &str) -> Result<GenericResponse> {
        require_non_empty("collection name", old_name)?;
        require_non_empty("new collection name", new_name)?;
        let path = format!(
            "{}/{}/rename/{}",
            COLLECTIONS_PATH,
            segment(old_name),
            segment(new_name)
        );
        self.transport
            .exchange_json(Method::PUT, &path, NO_BODY, &[])
            .await
    }

    /// Load a collection into memory.
    #[instrument(skip(self))]
    pub async fn load_collection(&self, name: &str) -> Result<GenericResponse> {
        self.collection_action(Method::POST, name, "load").await
    }

    /// Unload a collection from memory.
    #[instrument(skip(self))]
    pub async fn unload_collection(&self, name: &str) -> Result<GenericResponse> {
        self.collection_action(Method::POST, name, "unload").await
    }

    /// Flush pending writes of a collection to storage.
    #[instrument(skip(self))]
    pub async fn flush_collection(&self, name: &str) -> Result<GenericResponse> {
        self.collection_action(Method::POST, name, "flush").await
    }

    #[instrument(skip(self))]
    pub async fn reindex_collection(&self, name: &str) -> Result<GenericResponse> {
        self.collection_action(Method::PUT, name, "reindex").await
    }

    /// Train product quantization for a collection.
    #[instrument(skip(self))]
    pub async fn pq_train(&self, name: &str) -> Result<GenericResponse> {
        self.collection_action(Method::POST, name, "pq-train").await
    }

    #[instrument(skip(self))]
    pub async fn delete_record(&self, collection: &str, record_id: &str) -> Result<GenericResponse> {
        require_non_empty("record id", record_id)?;
        self.collection_action(Method::DELETE, collection, &segment(record_id))
            .await
    }

    /// Remove expired records from a collection.
    #[instrument(skip(self))]
    pub async fn expiry_cleanup(&self, collection: &str) -> Result<GenericResponse> {
        self.collection_action(Method::POST, collection, "expiry-cleanup")
            .await
    }

    /// Export a collection as an opaque binary blob.
    ///
    /// The body is not buffered; pipe it somewhere with [`ByteStream::copy_to`].
    #[instrument(skip(self))]
    pub async fn export_collection(&self, name: &str) -> Result<ByteStream> {
        require_non_empty("collection name", name)?;
        self.transport
            .exchange_for_stream(Method::POST, &collection_path(name, "export"), NO_BODY, &[])
            .await
    }

    /// Export a collection straight into a local file.
    ///
    /// If the transfer fails part way, `dest` is removed again.
    #[instrument(skip(self))]
    pub async fn export_collection_to_file(&self, name: &str, dest: &Path) -> Result<u64> {
        let stream = self.export_collection(name).await?;
        let mut file = tokio::fs::File::create(dest).await?;
        match stream.copy_to(&mut file).await {
            Ok(bytes) => {
                info!(collection = name, bytes, dest = %dest.display(), "Collection exported");
                Ok(bytes)
            }
            Err(e) => {
                drop(file);
                if let Err(rm) = tokio::fs::remove_file(dest).await {
                    warn!(dest = %dest.display(), error = %rm, "Failed to remove partial export");
                }
                warn!(collection = name, error = %e, "Collection export aborted");
                Err(e)
            }
        }
    }

    /// Import a collection from a previously exported file.
    #[instrument(skip(self))]
    pub async fn import_collection(&self, file: &Path) -> Result<GenericResponse> {
        let value = self
            .transport
            .upload_file(&format!("{}/import", COLLECTIONS_PATH), file)
            .await?;
        decode(value)
    }

    #[instrument(skip(self, request), fields(collection = %request.collection))]
    pub async fn insert_record(&self, request: &InsertRecordRequest) -> Result<InsertRecordResponse> {
        require_non_empty("collection name", &request.collection)?;
        self.transport
            .exchange_json(
                Method::POST,
                &format!("{}/record", COLLECTIONS_PATH),
                Some(request),
                &[],
            )
            .await
    }

    async fn collection_action(
        &self,
        method: Method,
        name: &str,
        action: &str,
    ) -> Result<GenericResponse> {
        require_non_empty("collection name", name)?;
        self.transport
            .exchange_json(method, &collection_path(name, action), NO_BODY, &[])
            .await
    }
}
