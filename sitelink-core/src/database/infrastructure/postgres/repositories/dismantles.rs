use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::info;

use sitelink_model::{
    BatchId, BatchRow, Dismantle, DismantleId, InstallationId, ProviderId,
    RequestKind, RequestStatus,
};

use crate::database::ports::{DismantlesRepository, NewDismantle};
use crate::error::{CoreError, Result};

use super::installations::map_batch_row;

const DISMANTLE_COLUMNS: &str = "id, installation_id, location, provider_id, \
     provider_name, status, batch_id, created_at";

/// PostgreSQL-backed implementation of the `DismantlesRepository` port.
#[derive(Clone, Debug)]
pub struct PostgresDismantlesRepository {
    pool: PgPool,
}

impl PostgresDismantlesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_dismantle(row: &PgRow) -> Result<Dismantle> {
    let status: String = row.try_get("status")?;

    Ok(Dismantle {
        id: DismantleId(row.try_get("id")?),
        installation_id: InstallationId(row.try_get("installation_id")?),
        location: row.try_get("location")?,
        provider_id: row
            .try_get::<Option<i64>, _>("provider_id")?
            .map(ProviderId),
        provider_name: row.try_get("provider_name")?,
        status: status.parse()?,
        batch_id: BatchId(row.try_get("batch_id")?),
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl DismantlesRepository for PostgresDismantlesRepository {
    async fn insert(&self, rec: NewDismantle) -> Result<Dismantle> {
        let mut tx = self.pool().begin().await?;

        let flagged = sqlx::query(
            r#"
            UPDATE installations
            SET dismantle_pending = TRUE
            WHERE id = $1 AND dismantle_pending = FALSE
            "#,
        )
        .bind(rec.installation_id.as_i64())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if flagged == 0 {
            let exists: Option<i64> =
                sqlx::query_scalar("SELECT id FROM installations WHERE id = $1")
                    .bind(rec.installation_id.as_i64())
                    .fetch_optional(&mut *tx)
                    .await?;
            return Err(match exists {
                Some(_) => CoreError::RequestAlreadyPending {
                    installation: rec.installation_id,
                    kind: RequestKind::Dismantle,
                },
                None => CoreError::InstallationNotFound(rec.installation_id),
            });
        }

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO dismantles (
                installation_id, location, provider_id, provider_name, batch_id
            )
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {DISMANTLE_COLUMNS}
            "#
        ))
        .bind(rec.installation_id.as_i64())
        .bind(&rec.location)
        .bind(rec.provider_id.map(|p| p.as_i64()))
        .bind(&rec.provider_name)
        .bind(rec.batch_id.as_i64())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let dismantle = map_dismantle(&row)?;
        info!(
            id = dismantle.id.as_i64(),
            installation = dismantle.installation_id.as_i64(),
            "created dismantle"
        );
        Ok(dismantle)
    }

    async fn get(&self, id: DismantleId) -> Result<Option<Dismantle>> {
        let row = sqlx::query(&format!(
            "SELECT {DISMANTLE_COLUMNS} FROM dismantles WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(self.pool())
        .await?;

        row.as_ref().map(map_dismantle).transpose()
    }

    async fn list(&self) -> Result<Vec<Dismantle>> {
        let rows = sqlx::query(&format!(
            "SELECT {DISMANTLE_COLUMNS} FROM dismantles ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool())
        .await?;

        rows.iter().map(map_dismantle).collect()
    }

    async fn list_by_batch(&self, batch: BatchId) -> Result<Vec<Dismantle>> {
        let rows = sqlx::query(&format!(
            "SELECT {DISMANTLE_COLUMNS} FROM dismantles WHERE batch_id = $1 ORDER BY id"
        ))
        .bind(batch.as_i64())
        .fetch_all(self.pool())
        .await?;

        rows.iter().map(map_dismantle).collect()
    }

    async fn batch_summary(&self, filter: Option<&str>) -> Result<Vec<BatchRow>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT ON (batch_id)
                batch_id, id, location, status, created_at
            FROM dismantles
            WHERE $1::TEXT IS NULL OR batch_id::TEXT ILIKE '%' || $1 || '%'
            ORDER BY batch_id,
                created_at DESC,
                CASE status WHEN 'pending' THEN 0 ELSE 1 END
            "#,
        )
        .bind(filter)
        .fetch_all(self.pool())
        .await?;

        rows.iter()
            .map(|r| map_batch_row(RequestKind::Dismantle, r))
            .collect()
    }

    async fn approve(&self, id: DismantleId) -> Result<bool> {
        let mut tx = self.pool().begin().await?;

        let row = sqlx::query(
            r#"
            UPDATE dismantles
            SET status = 'approved'
            WHERE id = $1 AND status = 'pending'
            RETURNING installation_id
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(false);
        };

        let installation_id: i64 = row.try_get("installation_id")?;
        sqlx::query(
            r#"
            UPDATE installations
            SET status = 'dismantled',
                dismantle_pending = FALSE
            WHERE id = $1
            "#,
        )
        .bind(installation_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            id = id.as_i64(),
            installation = installation_id,
            "approved dismantle"
        );
        Ok(true)
    }

    async fn count_by_status(&self, status: RequestStatus) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM dismantles WHERE status = $1",
        )
        .bind(status.as_str())
        .fetch_one(self.pool())
        .await?;
        Ok(count)
    }
}
