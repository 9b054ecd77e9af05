use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

/// Tenant that owns locations. Tokens carry its id as the `id` claim.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Partner {
    pub id_partner: i64,
    pub name: String,
}

impl Partner {
    pub async fn create(pool: &SqlitePool, name: &str) -> Result<Self, sqlx::Error> {
        let result = sqlx::query("INSERT INTO partner (name) VALUES (?1)")
            .bind(name)
            .execute(pool)
            .await?;

        Ok(Partner {
            id_partner: result.last_insert_rowid(),
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_utils::setup_test_pool;

    #[tokio::test]
    async fn create_assigns_fresh_ids() {
        let pool = setup_test_pool().await;

        let first = Partner::create(&pool, "Exchange Corner").await.unwrap();
        let second = Partner::create(&pool, "Bureau Nord").await.unwrap();
        assert_ne!(first.id_partner, second.id_partner);

        let fetched = sqlx::query_as::<_, Partner>(
            "SELECT idPartner AS id_partner, name FROM partner WHERE idPartner = ?1",
        )
        .bind(first.id_partner)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(fetched.name, "Exchange Corner");
    }
}
