use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::info;

use sitelink_model::{
    BatchId, BatchRow, Communication, Installation, InstallationId, PriceId,
    ProviderId, RequestKind, RequestStatus,
};

use crate::allocation::Decision;
use crate::database::ports::{
    InstallationFilter, InstallationsRepository, NewInstallation,
};
use crate::error::Result;

const INSTALLATION_COLUMNS: &str = "id, location, address, contact, area, province, \
     communication, provider_id, provider_name, price_id, price, days, \
     status, relocation_pending, dismantle_pending, batch_id, created_at";

/// PostgreSQL-backed implementation of the `InstallationsRepository` port.
#[derive(Clone, Debug)]
pub struct PostgresInstallationsRepository {
    pool: PgPool,
}

impl PostgresInstallationsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

pub(super) fn map_installation(row: &PgRow) -> Result<Installation> {
    let status: String = row.try_get("status")?;
    let communication: String = row.try_get("communication")?;

    Ok(Installation {
        id: InstallationId(row.try_get("id")?),
        location: row.try_get("location")?,
        address: row.try_get("address")?,
        contact: row.try_get("contact")?,
        area: row.try_get("area")?,
        province: row.try_get("province")?,
        communication: communication.parse()?,
        provider_id: row
            .try_get::<Option<i64>, _>("provider_id")?
            .map(ProviderId),
        provider_name: row.try_get("provider_name")?,
        price_id: row.try_get::<Option<i64>, _>("price_id")?.map(PriceId),
        price: row.try_get("price")?,
        days: row.try_get("days")?,
        status: status.parse()?,
        relocation_pending: row.try_get("relocation_pending")?,
        dismantle_pending: row.try_get("dismantle_pending")?,
        batch_id: BatchId(row.try_get("batch_id")?),
        created_at: row.try_get("created_at")?,
    })
}

pub(super) fn map_batch_row(kind: RequestKind, row: &PgRow) -> Result<BatchRow> {
    let status: String = row.try_get("status")?;
    Ok(BatchRow {
        batch_id: BatchId(row.try_get("batch_id")?),
        kind,
        record_id: row.try_get("id")?,
        location: row.try_get("location")?,
        status: status.parse()?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl InstallationsRepository for PostgresInstallationsRepository {
    async fn insert(&self, rec: NewInstallation) -> Result<Installation> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO installations (
                location, address, contact, area, province, communication,
                provider_id, provider_name, price_id, price, days, batch_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {INSTALLATION_COLUMNS}
            "#
        ))
        .bind(&rec.location)
        .bind(&rec.address)
        .bind(&rec.contact)
        .bind(&rec.area)
        .bind(&rec.province)
        .bind(rec.communication.as_str())
        .bind(rec.provider_id.map(|p| p.as_i64()))
        .bind(&rec.provider_name)
        .bind(rec.price_id.map(|p| p.as_i64()))
        .bind(rec.price)
        .bind(rec.days)
        .bind(rec.batch_id.as_i64())
        .fetch_one(self.pool())
        .await?;

        let installation = map_installation(&row)?;
        info!(
            id = installation.id.as_i64(),
            location = %installation.location,
            batch = installation.batch_id.as_i64(),
            "created installation"
        );
        Ok(installation)
    }

    async fn get(&self, id: InstallationId) -> Result<Option<Installation>> {
        let row = sqlx::query(&format!(
            "SELECT {INSTALLATION_COLUMNS} FROM installations WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(self.pool())
        .await?;

        row.as_ref().map(map_installation).transpose()
    }

    async fn list(&self, filter: InstallationFilter) -> Result<Vec<Installation>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {INSTALLATION_COLUMNS}
            FROM installations
            WHERE ($1::TEXT IS NULL OR status = $1)
              AND ($2::TEXT IS NULL OR communication = $2)
              AND ($3::TEXT IS NULL OR province = $3)
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.communication.map(|c| c.as_str()))
        .bind(filter.province)
        .fetch_all(self.pool())
        .await?;

        rows.iter().map(map_installation).collect()
    }

    async fn list_by_batch(&self, batch: BatchId) -> Result<Vec<Installation>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {INSTALLATION_COLUMNS}
            FROM installations
            WHERE batch_id = $1
            ORDER BY id
            "#
        ))
        .bind(batch.as_i64())
        .fetch_all(self.pool())
        .await?;

        rows.iter().map(map_installation).collect()
    }

    async fn batch_summary(&self, filter: Option<&str>) -> Result<Vec<BatchRow>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT ON (batch_id)
                batch_id, id, location, status, created_at
            FROM installations
            WHERE $1::TEXT IS NULL OR batch_id::TEXT ILIKE '%' || $1 || '%'
            ORDER BY batch_id,
                created_at DESC,
                CASE status
                    WHEN 'pending' THEN 0
                    WHEN 'approved' THEN 1
                    ELSE 2
                END
            "#,
        )
        .bind(filter)
        .fetch_all(self.pool())
        .await?;

        rows.iter()
            .map(|r| map_batch_row(RequestKind::Installation, r))
            .collect()
    }

    async fn approve(&self, id: InstallationId) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE installations
            SET status = 'approved'
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id.as_i64())
        .execute(self.pool())
        .await?;

        let updated = result.rows_affected() > 0;
        if updated {
            info!(id = id.as_i64(), "approved installation");
        }
        Ok(updated)
    }

    async fn override_terms(
        &self,
        id: InstallationId,
        decision: &Decision,
    ) -> Result<bool> {
        let terms = decision.terms.as_ref();
        let result = sqlx::query(
            r#"
            UPDATE installations
            SET provider_id = $2,
                provider_name = $3,
                price_id = $4,
                price = $5,
                days = $6,
                communication = COALESCE($7, communication),
                status = 'approved'
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id.as_i64())
        .bind(terms.map(|_| decision.provider_id.as_i64()))
        .bind(terms.map(|_| decision.provider_name.as_str()))
        .bind(terms.map(|t| t.price_id.as_i64()))
        .bind(terms.map(|t| t.price))
        .bind(terms.map(|t| t.days))
        // A fixed-carrier override leaves no ranked terms; the row flips to
        // M2M so the provider/price/days consistency invariant holds.
        .bind(terms.is_none().then_some(Communication::M2m.as_str()))
        .execute(self.pool())
        .await?;

        let updated = result.rows_affected() > 0;
        if updated {
            info!(
                id = id.as_i64(),
                provider = decision.provider_id.as_i64(),
                "override approved installation"
            );
        }
        Ok(updated)
    }

    async fn count_by_status(&self, status: RequestStatus) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM installations WHERE status = $1",
        )
        .bind(status.as_str())
        .fetch_one(self.pool())
        .await?;
        Ok(count)
    }
}
