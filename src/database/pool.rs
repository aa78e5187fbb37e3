use std::str::FromStr;

use sqlx::{
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};

use crate::error::Error;

pub static MIGRATOR: Migrator = sqlx::migrate!();

/// Opens the pool and brings the schema up to date.
pub async fn connect(url: &str, max_connections: u32) -> Result<Pool<Sqlite>, Error> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    migrate(&pool).await?;
    log::info!("Connected to {url}");

    Ok(pool)
}

/// Single-connection in-memory database; every connection to `:memory:`
/// is a separate database, so the pool must never open a second one.
pub async fn connect_in_memory() -> Result<Pool<Sqlite>, Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    migrate(&pool).await?;

    Ok(pool)
}

async fn migrate(pool: &Pool<Sqlite>) -> Result<(), Error> {
    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| Error::Query(sqlx::Error::from(e)))
}
