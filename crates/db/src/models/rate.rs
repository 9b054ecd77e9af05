use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use sqlx::{
    FromRow, Sqlite, SqlitePool,
    query::Query,
    sqlite::{SqliteArguments, SqliteQueryResult},
};
use thiserror::Error;

/// Canonical storage format of `rate.date`.
pub const RATE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum RateError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid rate value: {0}")]
    InvalidValue(f64),
}

/// Raw `rate` row.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rate {
    pub id_rates: i64,
    pub id_location: i64,
    pub id_currency: i64,
    pub date: String,
    pub value: f64,
}

/// Rate joined with its location address and currency name, as listed to partners.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateWithDetails {
    pub id_rates: i64,
    pub id_location: i64,
    pub address: String,
    pub id_currency: i64,
    pub name: String,
    pub date: String,
    pub value: f64,
}

/// Mutable fields of a rate, already validated and normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct RateFields {
    pub id_location: i64,
    pub id_currency: i64,
    pub date: String,
    pub value: f64,
}

impl RateFields {
    /// Normalizes `date` and rejects non-positive or non-finite values.
    pub fn new(id_location: i64, id_currency: i64, date: &str, value: f64) -> Result<Self, RateError> {
        let date = normalize_date(date).ok_or_else(|| RateError::InvalidDate(date.to_string()))?;
        if !value.is_finite() || value <= 0.0 {
            return Err(RateError::InvalidValue(value));
        }

        Ok(Self {
            id_location,
            id_currency,
            date,
            value,
        })
    }
}

/// Parses the date shapes the admin frontend sends and renders them as
/// `YYYY-MM-DD HH:MM:SS` in UTC. Fractional seconds are truncated.
pub fn normalize_date(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(input) {
        return Some(with_offset.with_timezone(&Utc).format(RATE_DATE_FORMAT).to_string());
    }

    const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(naive.format(RATE_DATE_FORMAT).to_string());
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.format(RATE_DATE_FORMAT).to_string())
}

/// `%term%` LIKE pattern with the wildcard characters of `term` escaped.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Runs a single write inside its own transaction.
///
/// A failed statement is rolled back explicitly. A failed commit drops the
/// transaction, which rolls it back before the connection is reused.
async fn execute_in_transaction<'q>(
    pool: &SqlitePool,
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
) -> Result<SqliteQueryResult, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let result = match query.execute(&mut *tx).await {
        Ok(result) => result,
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!("Rollback after failed statement failed: {}", rollback_err);
            }
            return Err(err);
        }
    };

    tx.commit().await?;
    Ok(result)
}

impl Rate {
    pub async fn find_by_id(pool: &SqlitePool, id_rates: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Rate>(
            r#"SELECT idRates AS id_rates, idLocation AS id_location, idCurrency AS id_currency,
                      date, value
               FROM rate
               WHERE idRates = ?1"#,
        )
        .bind(id_rates)
        .fetch_optional(pool)
        .await
    }

    /// Rates whose location belongs to `id_partner`, optionally narrowed to rows whose
    /// address or currency name contains `search` (case-insensitive).
    pub async fn find_by_partner(
        pool: &SqlitePool,
        id_partner: i64,
        search: Option<&str>,
    ) -> Result<Vec<RateWithDetails>, sqlx::Error> {
        let pattern = search
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(like_pattern);

        sqlx::query_as::<_, RateWithDetails>(
            r#"SELECT rate.idRates AS id_rates,
                      rate.idLocation AS id_location,
                      location.address AS address,
                      rate.idCurrency AS id_currency,
                      currency.name AS name,
                      rate.date AS date,
                      rate.value AS value
               FROM rate
               INNER JOIN location ON rate.idLocation = location.idLocation
               INNER JOIN currency ON rate.idCurrency = currency.idCurrency
               WHERE location.idPartner = ?1
                 AND (?2 IS NULL
                      OR location.address LIKE ?2 ESCAPE '\'
                      OR currency.name LIKE ?2 ESCAPE '\')
               ORDER BY rate.idRates"#,
        )
        .bind(id_partner)
        .bind(pattern)
        .fetch_all(pool)
        .await
    }

    /// Partner owning the rate through its location, `None` when the rate does not exist.
    pub async fn owner_of(pool: &SqlitePool, id_rates: i64) -> Result<Option<i64>, sqlx::Error> {
        let row: Option<(i64,)> = sqlx::query_as(
            r#"SELECT location.idPartner
               FROM rate
               INNER JOIN location ON rate.idLocation = location.idLocation
               WHERE rate.idRates = ?1"#,
        )
        .bind(id_rates)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(|(id_partner,)| id_partner))
    }

    /// Inserts a rate and returns the generated id.
    pub async fn create(pool: &SqlitePool, fields: &RateFields) -> Result<i64, RateError> {
        let query = sqlx::query(
            "INSERT INTO rate (idLocation, idCurrency, date, value) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(fields.id_location)
        .bind(fields.id_currency)
        .bind(fields.date.clone())
        .bind(fields.value);

        let result = execute_in_transaction(pool, query).await?;
        Ok(result.last_insert_rowid())
    }

    /// Replaces every mutable field. Returns the number of rows touched, which is
    /// zero when `id_rates` does not exist.
    pub async fn update(
        pool: &SqlitePool,
        id_rates: i64,
        fields: &RateFields,
    ) -> Result<u64, RateError> {
        let query = sqlx::query(
            r#"UPDATE rate
               SET idLocation = ?1, idCurrency = ?2, date = ?3, value = ?4
               WHERE idRates = ?5"#,
        )
        .bind(fields.id_location)
        .bind(fields.id_currency)
        .bind(fields.date.clone())
        .bind(fields.value)
        .bind(id_rates);

        let result = execute_in_transaction(pool, query).await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(pool: &SqlitePool, id_rates: i64) -> Result<u64, RateError> {
        let query = sqlx::query("DELETE FROM rate WHERE idRates = ?1").bind(id_rates);

        let result = execute_in_transaction(pool, query).await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_utils::{seed_fixtures, setup_test_pool};

    fn fields(id_location: i64, id_currency: i64, date: &str, value: f64) -> RateFields {
        RateFields::new(id_location, id_currency, date, value).expect("valid fields")
    }

    #[test]
    fn normalizes_supported_date_shapes() {
        assert_eq!(normalize_date("2024-03-01").as_deref(), Some("2024-03-01 00:00:00"));
        assert_eq!(
            normalize_date("2024-03-01T10:15:30.123Z").as_deref(),
            Some("2024-03-01 10:15:30")
        );
        assert_eq!(
            normalize_date("2024-03-01T10:15:30+02:00").as_deref(),
            Some("2024-03-01 08:15:30")
        );
        assert_eq!(
            normalize_date("2024-03-01 10:15:30").as_deref(),
            Some("2024-03-01 10:15:30")
        );
        assert_eq!(normalize_date("2024-03-01T10:15").as_deref(), Some("2024-03-01 10:15:00"));
    }

    #[test]
    fn rejects_unparseable_dates() {
        assert!(normalize_date("").is_none());
        assert!(normalize_date("   ").is_none());
        assert!(normalize_date("yesterday").is_none());
        assert!(normalize_date("2024-13-45").is_none());
    }

    #[test]
    fn rate_fields_reject_zero_and_non_finite_values() {
        assert!(matches!(
            RateFields::new(1, 1, "2024-03-01", 0.0),
            Err(RateError::InvalidValue(_))
        ));
        assert!(matches!(
            RateFields::new(1, 1, "2024-03-01", -1.5),
            Err(RateError::InvalidValue(_))
        ));
        assert!(matches!(
            RateFields::new(1, 1, "2024-03-01", f64::NAN),
            Err(RateError::InvalidValue(_))
        ));
        assert!(matches!(
            RateFields::new(1, 1, "not a date", 1.0),
            Err(RateError::InvalidDate(_))
        ));
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("EUR"), "%EUR%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[tokio::test]
    async fn list_is_scoped_to_partner() {
        let pool = setup_test_pool().await;
        let fx = seed_fixtures(&pool).await;

        let own = Rate::create(&pool, &fields(fx.location_a, fx.euro, "2024-03-01", 1.08))
            .await
            .unwrap();
        Rate::create(&pool, &fields(fx.location_b, fx.dollar, "2024-03-01", 0.92))
            .await
            .unwrap();

        let rates = Rate::find_by_partner(&pool, fx.partner_a, None).await.unwrap();
        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].id_rates, own);
        assert_eq!(rates[0].address, "Main Street 1");
        assert_eq!(rates[0].name, "EUR");
        assert_eq!(rates[0].date, "2024-03-01 00:00:00");

        let other = Rate::find_by_partner(&pool, fx.partner_b, None).await.unwrap();
        assert_eq!(other.len(), 1);
        assert_eq!(other[0].name, "USD");
    }

    #[tokio::test]
    async fn search_matches_address_or_currency() {
        let pool = setup_test_pool().await;
        let fx = seed_fixtures(&pool).await;

        Rate::create(&pool, &fields(fx.location_a, fx.euro, "2024-03-01", 1.08))
            .await
            .unwrap();
        Rate::create(&pool, &fields(fx.location_a, fx.dollar, "2024-03-02", 1.01))
            .await
            .unwrap();

        let by_currency = Rate::find_by_partner(&pool, fx.partner_a, Some("usd")).await.unwrap();
        assert_eq!(by_currency.len(), 1);
        assert_eq!(by_currency[0].name, "USD");

        let by_address = Rate::find_by_partner(&pool, fx.partner_a, Some("main street"))
            .await
            .unwrap();
        assert_eq!(by_address.len(), 2);

        let blank = Rate::find_by_partner(&pool, fx.partner_a, Some("  ")).await.unwrap();
        assert_eq!(blank.len(), 2);

        let none = Rate::find_by_partner(&pool, fx.partner_a, Some("Harbour")).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn update_replaces_fields_and_reports_missing_rows() {
        let pool = setup_test_pool().await;
        let fx = seed_fixtures(&pool).await;

        let id = Rate::create(&pool, &fields(fx.location_a, fx.euro, "2024-03-01", 1.08))
            .await
            .unwrap();

        let touched = Rate::update(&pool, id, &fields(fx.location_a, fx.dollar, "2024-04-01T12:00:00Z", 1.2))
            .await
            .unwrap();
        assert_eq!(touched, 1);

        let stored = Rate::find_by_id(&pool, id).await.unwrap().expect("rate missing");
        assert_eq!(stored.id_currency, fx.dollar);
        assert_eq!(stored.date, "2024-04-01 12:00:00");
        assert_eq!(stored.value, 1.2);

        let missing = Rate::update(&pool, id + 1000, &fields(fx.location_a, fx.euro, "2024-05-01", 2.0))
            .await
            .unwrap();
        assert_eq!(missing, 0);
        let unchanged = Rate::find_by_id(&pool, id).await.unwrap().expect("rate missing");
        assert_eq!(unchanged.value, 1.2);
    }

    #[tokio::test]
    async fn delete_removes_row() {
        let pool = setup_test_pool().await;
        let fx = seed_fixtures(&pool).await;

        let id = Rate::create(&pool, &fields(fx.location_a, fx.euro, "2024-03-01", 1.08))
            .await
            .unwrap();

        assert_eq!(Rate::delete(&pool, id).await.unwrap(), 1);
        assert!(Rate::find_by_id(&pool, id).await.unwrap().is_none());
        assert_eq!(Rate::delete(&pool, id).await.unwrap(), 0);
        assert!(Rate::find_by_partner(&pool, fx.partner_a, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_commit_leaves_no_row() {
        let pool = setup_test_pool().await;
        let fx = seed_fixtures(&pool).await;

        // the foreign keys are deferred, so the dangling location fails at COMMIT
        let err = Rate::create(&pool, &fields(9999, fx.euro, "2024-03-01", 1.0))
            .await
            .expect_err("commit should fail");
        assert!(matches!(err, RateError::Database(_)));

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM rate")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 0);
    }

    #[tokio::test]
    async fn owner_follows_location() {
        let pool = setup_test_pool().await;
        let fx = seed_fixtures(&pool).await;

        let id = Rate::create(&pool, &fields(fx.location_b, fx.euro, "2024-03-01", 1.0))
            .await
            .unwrap();

        assert_eq!(Rate::owner_of(&pool, id).await.unwrap(), Some(fx.partner_b));
        assert_eq!(Rate::owner_of(&pool, id + 1).await.unwrap(), None);
    }
}
