use anyhow::{Context, Result};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use medialift_core::models::{MediaAsset, MediaKind};

const ASSET_COLUMNS: &str =
    "id, kind, local_path, title, description, tags, created_at, updated_at";

#[derive(Clone)]
pub struct AssetRepository {
    pool: PgPool,
}

impl AssetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new asset record for a locally attached file.
    #[tracing::instrument(skip(self, description, tags))]
    pub async fn create(
        &self,
        kind: MediaKind,
        local_path: &str,
        title: &str,
        description: &str,
        tags: &[String],
    ) -> Result<MediaAsset> {
        let asset: MediaAsset = sqlx::query_as::<Postgres, MediaAsset>(&format!(
            r#"
            INSERT INTO media_assets (kind, local_path, title, description, tags)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ASSET_COLUMNS}
            "#,
        ))
        .bind(kind)
        .bind(local_path)
        .bind(title)
        .bind(description)
        .bind(tags)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert media asset")?;

        tracing::info!(asset_id = %asset.id, kind = %kind, "Media asset created");
        Ok(asset)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<Option<MediaAsset>> {
        sqlx::query_as::<Postgres, MediaAsset>(&format!(
            "SELECT {ASSET_COLUMNS} FROM media_assets WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch media asset")
    }

    /// Metadata edits are allowed after upload; the file path is not.
    #[tracing::instrument(skip(self, description, tags))]
    pub async fn update_metadata(
        &self,
        id: Uuid,
        title: &str,
        description: &str,
        tags: &[String],
    ) -> Result<Option<MediaAsset>> {
        sqlx::query_as::<Postgres, MediaAsset>(&format!(
            r#"
            UPDATE media_assets
            SET title = $2, description = $3, tags = $4, updated_at = now()
            WHERE id = $1
            RETURNING {ASSET_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(tags)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to update media asset metadata")
    }

    /// Delete an asset; its provider host records cascade. Remote copies
    /// are untouched — remote deletion is an explicit provider operation.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM media_assets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete media asset")?;

        Ok(result.rows_affected() > 0)
    }
}
