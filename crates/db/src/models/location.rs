use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id_location: i64,
    pub address: String,
    pub id_partner: i64,
}

impl Location {
    pub async fn create(
        pool: &SqlitePool,
        address: &str,
        id_partner: i64,
    ) -> Result<Self, sqlx::Error> {
        let result = sqlx::query("INSERT INTO location (address, idPartner) VALUES (?1, ?2)")
            .bind(address)
            .bind(id_partner)
            .execute(pool)
            .await?;

        Ok(Location {
            id_location: result.last_insert_rowid(),
            address: address.to_string(),
            id_partner,
        })
    }

    /// True when `id_location` exists and is owned by `id_partner`.
    pub async fn belongs_to_partner(
        pool: &SqlitePool,
        id_location: i64,
        id_partner: i64,
    ) -> Result<bool, sqlx::Error> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT idLocation FROM location WHERE idLocation = ?1 AND idPartner = ?2",
        )
        .bind(id_location)
        .bind(id_partner)
        .fetch_optional(pool)
        .await?;

        Ok(row.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_utils::{seed_fixtures, setup_test_pool};

    #[tokio::test]
    async fn ownership_is_per_partner() {
        let pool = setup_test_pool().await;
        let fx = seed_fixtures(&pool).await;

        assert!(Location::belongs_to_partner(&pool, fx.location_a, fx.partner_a).await.unwrap());
        assert!(!Location::belongs_to_partner(&pool, fx.location_b, fx.partner_a).await.unwrap());
        assert!(!Location::belongs_to_partner(&pool, 9999, fx.partner_a).await.unwrap());
    }
}
