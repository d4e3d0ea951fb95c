use async_trait::async_trait;
use sqlx::{PgPool, Row};

use sitelink_model::{
    Coverage, Location, LocationId, PriceEntry, PriceId, Provider, ProviderId,
    SlaEntry,
};

use crate::database::ports::CatalogRepository;
use crate::error::Result;

/// PostgreSQL-backed implementation of the `CatalogRepository` port.
#[derive(Clone, Debug)]
pub struct PostgresCatalogRepository {
    pool: PgPool,
}

impl PostgresCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn provider_ids(providers: &[ProviderId]) -> Vec<i64> {
    providers.iter().map(|p| p.as_i64()).collect()
}

#[async_trait]
impl CatalogRepository for PostgresCatalogRepository {
    async fn find_location(&self, name: &str) -> Result<Option<Location>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, province
            FROM locations
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(self.pool())
        .await?;

        Ok(row
            .map(|r| -> Result<Location> {
                Ok(Location {
                    id: LocationId(r.try_get("id")?),
                    name: r.try_get("name")?,
                    province: r.try_get("province")?,
                })
            })
            .transpose()?)
    }

    async fn find_providers(&self) -> Result<Vec<Provider>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name
            FROM providers
            ORDER BY id
            "#,
        )
        .fetch_all(self.pool())
        .await?;

        rows.into_iter()
            .map(|r| {
                Ok(Provider {
                    id: ProviderId(r.try_get("id")?),
                    name: r.try_get("name")?,
                })
            })
            .collect()
    }

    async fn find_coverage(&self, location: &str) -> Result<Vec<Coverage>> {
        let rows = sqlx::query(
            r#"
            SELECT c.location_id, c.provider_id, c.available
            FROM coverage c
            JOIN locations l ON l.id = c.location_id
            WHERE l.name = $1
            ORDER BY c.provider_id
            "#,
        )
        .bind(location)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter()
            .map(|r| {
                Ok(Coverage {
                    location_id: LocationId(r.try_get("location_id")?),
                    provider_id: ProviderId(r.try_get("provider_id")?),
                    available: r.try_get("available")?,
                })
            })
            .collect()
    }

    async fn find_sla(
        &self,
        location: &str,
        providers: &[ProviderId],
    ) -> Result<Vec<SlaEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT s.provider_id, s.days
            FROM slas s
            JOIN locations l ON l.id = s.location_id
            WHERE l.name = $1 AND s.provider_id = ANY($2)
            ORDER BY s.days ASC, s.provider_id ASC
            "#,
        )
        .bind(location)
        .bind(provider_ids(providers))
        .fetch_all(self.pool())
        .await?;

        rows.into_iter()
            .map(|r| {
                Ok(SlaEntry {
                    provider_id: ProviderId(r.try_get("provider_id")?),
                    days: r.try_get("days")?,
                })
            })
            .collect()
    }

    async fn find_price(
        &self,
        location: &str,
        providers: &[ProviderId],
    ) -> Result<Vec<PriceEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT p.provider_id, p.price_id, p.amount
            FROM prices p
            JOIN locations l ON l.id = p.location_id
            WHERE l.name = $1 AND p.provider_id = ANY($2)
            ORDER BY p.amount ASC, p.provider_id ASC
            "#,
        )
        .bind(location)
        .bind(provider_ids(providers))
        .fetch_all(self.pool())
        .await?;

        rows.into_iter()
            .map(|r| {
                Ok(PriceEntry {
                    provider_id: ProviderId(r.try_get("provider_id")?),
                    price_id: PriceId(r.try_get("price_id")?),
                    amount: r.try_get("amount")?,
                })
            })
            .collect()
    }
}
