use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    pub id_currency: i64,
    pub name: String,
}

impl Currency {
    pub async fn create(pool: &SqlitePool, name: &str) -> Result<Self, sqlx::Error> {
        let result = sqlx::query("INSERT INTO currency (name) VALUES (?1)")
            .bind(name)
            .execute(pool)
            .await?;

        Ok(Currency {
            id_currency: result.last_insert_rowid(),
            name: name.to_string(),
        })
    }
}
