use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::ConnectOptions;
use dotenvy::dotenv;
use log::LevelFilter;
use std::{env, str::FromStr};

/// Used when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://carwash.db";

pub fn database_url() -> String {
    dotenv().ok();
    env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Opens a single connection, creating the database file if it is missing.
pub async fn connect(database_url: &str) -> Result<SqliteConnection, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .log_statements(LevelFilter::Debug);
    options.connect().await
}
