//! Blob storage collaborator.
//!
//! Bytes live elsewhere; this registry only knows which blob ids exist and how
//! to turn them into URLs.

use std::future::Future;

use serde::Serialize;
use sqlx::SqlitePool;

use crate::models::{new_id, now_ms};

/// A reserved blob id and where to send its bytes.
#[derive(Debug, Clone, Serialize)]
pub struct UploadTarget {
    pub storage_id: String,
    pub upload_url: String,
}

pub trait BlobStore: Send + Sync {
    /// URL for a stored blob, or `None` if the id is unknown.
    fn get_url(&self, id: &str) -> impl Future<Output = Result<Option<String>, sqlx::Error>> + Send;

    /// Who reserved the blob, or `None` if the id is unknown.
    fn owner_of(&self, id: &str)
    -> impl Future<Output = Result<Option<String>, sqlx::Error>> + Send;

    /// Reserve a new blob id for `owner_id` and return it with the URL the
    /// client uploads to.
    fn generate_upload_url(
        &self,
        owner_id: &str,
    ) -> impl Future<Output = Result<UploadTarget, sqlx::Error>> + Send;

    /// Release a blob. Deleting an unknown id is not an error.
    fn delete(&self, id: &str) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
}

#[derive(Clone)]
pub struct SqliteBlobStore {
    db: SqlitePool,
    base_url: String,
}

impl SqliteBlobStore {
    pub fn new(db: SqlitePool, base_url: impl Into<String>) -> Self {
        Self {
            db,
            base_url: base_url.into(),
        }
    }
}

impl BlobStore for SqliteBlobStore {
    async fn get_url(&self, id: &str) -> Result<Option<String>, sqlx::Error> {
        let exists: Option<(String,)> = sqlx::query_as("SELECT id FROM blobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(exists.map(|(id,)| format!("{}/{}", self.base_url, id)))
    }

    async fn owner_of(&self, id: &str) -> Result<Option<String>, sqlx::Error> {
        let owner: Option<(String,)> = sqlx::query_as("SELECT owner_id FROM blobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(owner.map(|(owner_id,)| owner_id))
    }

    async fn generate_upload_url(&self, owner_id: &str) -> Result<UploadTarget, sqlx::Error> {
        let id = new_id();
        sqlx::query("INSERT INTO blobs (id, owner_id, created_at) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(owner_id)
            .bind(now_ms())
            .execute(&self.db)
            .await?;

        Ok(UploadTarget {
            upload_url: format!("{}/upload/{}", self.base_url, id),
            storage_id: id,
        })
    }

    async fn delete(&self, id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM blobs WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
