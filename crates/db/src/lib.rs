use std::str::FromStr;

use sqlx::{
    Error, Pool, Sqlite,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use utils::assets::database_path;

pub mod models;

#[derive(Clone)]
pub struct DBService {
    pub pool: Pool<Sqlite>,
}

impl DBService {
    /// Open the SQLite file under the asset directory and apply migrations.
    pub async fn new() -> Result<DBService, Error> {
        let database_url = format!("sqlite://{}", database_path()?.to_string_lossy());
        Self::new_with_url(&database_url, 5).await
    }

    /// Connect to an explicit URL. `sqlite::memory:` needs `max_connections == 1`,
    /// every connection would otherwise see its own empty database.
    pub async fn new_with_url(database_url: &str, max_connections: u32) -> Result<DBService, Error> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections);
        if database_url.contains(":memory:") {
            // closing the last connection drops the database
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }
        let pool = pool_options.connect_with(options).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::debug!("Database ready at {}", database_url);

        Ok(DBService { pool })
    }
}
