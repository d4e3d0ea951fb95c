use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::info;

use sitelink_model::{
    BatchId, BatchRow, InstallationId, ProviderId, Relocation, RelocationId,
    RequestKind, RequestStatus,
};

use crate::database::ports::{NewRelocation, RelocationsRepository};
use crate::error::{CoreError, Result};

use super::installations::map_batch_row;

const RELOCATION_COLUMNS: &str = "id, installation_id, old_location, new_location, \
     old_address, new_address, old_area, new_area, old_communication, \
     new_communication, old_contact, new_contact, provider_id, provider_name, \
     status, batch_id, created_at";

/// PostgreSQL-backed implementation of the `RelocationsRepository` port.
#[derive(Clone, Debug)]
pub struct PostgresRelocationsRepository {
    pool: PgPool,
}

impl PostgresRelocationsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_relocation(row: &PgRow) -> Result<Relocation> {
    let status: String = row.try_get("status")?;
    let old_communication: String = row.try_get("old_communication")?;
    let new_communication: String = row.try_get("new_communication")?;

    Ok(Relocation {
        id: RelocationId(row.try_get("id")?),
        installation_id: InstallationId(row.try_get("installation_id")?),
        old_location: row.try_get("old_location")?,
        new_location: row.try_get("new_location")?,
        old_address: row.try_get("old_address")?,
        new_address: row.try_get("new_address")?,
        old_area: row.try_get("old_area")?,
        new_area: row.try_get("new_area")?,
        old_communication: old_communication.parse()?,
        new_communication: new_communication.parse()?,
        old_contact: row.try_get("old_contact")?,
        new_contact: row.try_get("new_contact")?,
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
impl RelocationsRepository for PostgresRelocationsRepository {
    async fn insert(&self, rec: NewRelocation) -> Result<Relocation> {
        let mut tx = self.pool().begin().await?;

        // Flag update doubles as the at-most-one-outstanding guard.
        let flagged = sqlx::query(
            r#"
            UPDATE installations
            SET relocation_pending = TRUE
            WHERE id = $1 AND relocation_pending = FALSE
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
                    kind: RequestKind::Relocation,
                },
                None => CoreError::InstallationNotFound(rec.installation_id),
            });
        }

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO relocations (
                installation_id, old_location, new_location, old_address,
                new_address, old_area, new_area, old_communication,
                new_communication, old_contact, new_contact, provider_id,
                provider_name, batch_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {RELOCATION_COLUMNS}
            "#
        ))
        .bind(rec.installation_id.as_i64())
        .bind(&rec.old_location)
        .bind(&rec.new_location)
        .bind(&rec.old_address)
        .bind(&rec.new_address)
        .bind(&rec.old_area)
        .bind(&rec.new_area)
        .bind(rec.old_communication.as_str())
        .bind(rec.new_communication.as_str())
        .bind(&rec.old_contact)
        .bind(&rec.new_contact)
        .bind(rec.provider_id.map(|p| p.as_i64()))
        .bind(&rec.provider_name)
        .bind(rec.batch_id.as_i64())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let relocation = map_relocation(&row)?;
        info!(
            id = relocation.id.as_i64(),
            installation = relocation.installation_id.as_i64(),
            "created relocation"
        );
        Ok(relocation)
    }

    async fn get(&self, id: RelocationId) -> Result<Option<Relocation>> {
        let row = sqlx::query(&format!(
            "SELECT {RELOCATION_COLUMNS} FROM relocations WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(self.pool())
        .await?;

        row.as_ref().map(map_relocation).transpose()
    }

    async fn list(&self) -> Result<Vec<Relocation>> {
        let rows = sqlx::query(&format!(
            "SELECT {RELOCATION_COLUMNS} FROM relocations ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool())
        .await?;

        rows.iter().map(map_relocation).collect()
    }

    async fn list_by_batch(&self, batch: BatchId) -> Result<Vec<Relocation>> {
        let rows = sqlx::query(&format!(
            "SELECT {RELOCATION_COLUMNS} FROM relocations WHERE batch_id = $1 ORDER BY id"
        ))
        .bind(batch.as_i64())
        .fetch_all(self.pool())
        .await?;

        rows.iter().map(map_relocation).collect()
    }

    async fn batch_summary(&self, filter: Option<&str>) -> Result<Vec<BatchRow>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT ON (batch_id)
                batch_id, id, new_location AS location, status, created_at
            FROM relocations
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
            .map(|r| map_batch_row(RequestKind::Relocation, r))
            .collect()
    }

    async fn approve(&self, id: RelocationId) -> Result<bool> {
        let mut tx = self.pool().begin().await?;

        let row = sqlx::query(
            r#"
            UPDATE relocations
            SET status = 'approved'
            WHERE id = $1 AND status = 'pending'
            RETURNING installation_id, new_location, new_address, new_area,
                      new_communication, new_contact
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
            SET location = $2,
                address = $3,
                area = $4,
                communication = $5,
                contact = $6,
                relocation_pending = FALSE
            WHERE id = $1
            "#,
        )
        .bind(installation_id)
        .bind(row.try_get::<String, _>("new_location")?)
        .bind(row.try_get::<String, _>("new_address")?)
        .bind(row.try_get::<String, _>("new_area")?)
        .bind(row.try_get::<String, _>("new_communication")?)
        .bind(row.try_get::<String, _>("new_contact")?)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            id = id.as_i64(),
            installation = installation_id,
            "approved relocation"
        );
        Ok(true)
    }

    async fn count_by_status(&self, status: RequestStatus) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM relocations WHERE status = $1",
        )
        .bind(status.as_str())
        .fetch_one(self.pool())
        .await?;
        Ok(count)
    }
}
