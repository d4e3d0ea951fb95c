use async_trait::async_trait;
use sqlx::PgPool;

use sitelink_model::ProviderId;

use crate::database::ports::LoadIndexRepository;
use crate::error::Result;

/// PostgreSQL-backed implementation of the `LoadIndexRepository` port.
///
/// Counts installations in non-terminal states; no snapshot isolation is
/// requested, the reading is intentionally best-effort.
#[derive(Clone, Debug)]
pub struct PostgresLoadIndexRepository {
    pool: PgPool,
}

impl PostgresLoadIndexRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoadIndexRepository for PostgresLoadIndexRepository {
    async fn count_active_by_provider(
        &self,
        provider: ProviderId,
        province: Option<&str>,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM installations
            WHERE provider_id = $1
              AND status IN ('pending', 'approved')
              AND ($2::TEXT IS NULL OR province = $2)
            "#,
        )
        .bind(provider.as_i64())
        .bind(province)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
