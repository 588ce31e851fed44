use std::str::FromStr;

use anyhow::Result;
use sea_orm::{DatabaseConnection, SqlxSqliteConnector};
use sqlx::{
    SqlitePool,
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

pub type DbPool = SqlitePool;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Open the SQLite pool. In-memory databases are pinned to one long-lived
/// connection, otherwise each connection would see its own empty database.
pub async fn create_pool(database_url: &str) -> Result<DbPool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await?
    };
    Ok(pool)
}

pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Wrap the sqlx pool in a SeaORM connection so both share connections.
pub fn create_orm_conn(pool: DbPool) -> DatabaseConnection {
    SqlxSqliteConnector::from_sqlx_sqlite_pool(pool)
}
