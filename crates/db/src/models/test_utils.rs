use sqlx::SqlitePool;

use super::{currency::Currency, location::Location, partner::Partner};
use crate::DBService;

pub(crate) async fn setup_test_pool() -> SqlitePool {
    DBService::new_with_url("sqlite::memory:", 1)
        .await
        .expect("failed to open sqlite memory db")
        .pool
}

/// Two partners with one location each, plus two currencies.
pub(crate) struct Fixtures {
    pub partner_a: i64,
    pub partner_b: i64,
    pub location_a: i64,
    pub location_b: i64,
    pub euro: i64,
    pub dollar: i64,
}

pub(crate) async fn seed_fixtures(pool: &SqlitePool) -> Fixtures {
    let partner_a = Partner::create(pool, "Partner A").await.expect("partner a");
    let partner_b = Partner::create(pool, "Partner B").await.expect("partner b");
    let location_a = Location::create(pool, "Main Street 1", partner_a.id_partner)
        .await
        .expect("location a");
    let location_b = Location::create(pool, "Harbour Road 7", partner_b.id_partner)
        .await
        .expect("location b");
    let euro = Currency::create(pool, "EUR").await.expect("euro");
    let dollar = Currency::create(pool, "USD").await.expect("dollar");

    Fixtures {
        partner_a: partner_a.id_partner,
        partner_b: partner_b.id_partner,
        location_a: location_a.id_location,
        location_b: location_b.id_location,
        euro: euro.id_currency,
        dollar: dollar.id_currency,
    }
}
