//! # account_source: known accounts from a SQL store
//!
//! [`SqlAccountSource`] runs `SELECT <column> FROM <table>` against a SQLite or
//! PostgreSQL store and returns every non-NULL value as the known-account set.
//! The store kind is chosen from the URL scheme. Connecting is bounded by the
//! configured timeout; expiry is reported as [`ReconError::Connection`].

use std::collections::HashSet;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Connection, Row};
use tracing::{debug, error, info, warn};

use crate::config::StoreConfig;
use crate::contract::{AccountSource, ReconError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoreKind {
    Sqlite,
    Postgres,
}

impl StoreKind {
    fn from_url(url: &str) -> Result<Self, ReconError> {
        if url.starts_with("sqlite:") {
            Ok(StoreKind::Sqlite)
        } else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(StoreKind::Postgres)
        } else {
            let scheme = url.split(':').next().unwrap_or_default();
            Err(ReconError::Config(format!(
                "unsupported account store scheme `{scheme}` (expected sqlite: or postgres://)"
            )))
        }
    }
}

/// Account store reached over sqlx.
pub struct SqlAccountSource {
    url: String,
    kind: StoreKind,
    query: String,
    connect_timeout: Duration,
}

impl SqlAccountSource {
    pub fn new(config: &StoreConfig) -> Result<Self, ReconError> {
        let kind = StoreKind::from_url(&config.url)?;
        validate_identifier("table", &config.table)?;
        validate_identifier("column", &config.column)?;
        Ok(Self {
            url: config.url.clone(),
            kind,
            query: format!("SELECT {} FROM {}", config.column, config.table),
            connect_timeout: config.connect_timeout,
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    async fn fetch_sqlite(&self) -> Result<HashSet<String>, ReconError> {
        let options = SqliteConnectOptions::from_str(&self.url)
            .map_err(|e| ReconError::Config(format!("invalid sqlite url: {e}")))?;
        let mut conn = with_timeout(self.connect_timeout, SqliteConnection::connect_with(&options)).await?;
        info!(store = "sqlite", "Connected to account store");

        let rows: Vec<SqliteRow> = sqlx::query(&self.query)
            .fetch_all(&mut conn)
            .await
            .map_err(query_error)?;
        let accounts = collect_accounts(rows.iter().map(|row| row.try_get::<Option<String>, _>(0)))?;
        if let Err(e) = conn.close().await {
            warn!(error = %e, "Failed to close account store connection cleanly");
        }
        Ok(accounts)
    }

    async fn fetch_postgres(&self) -> Result<HashSet<String>, ReconError> {
        let options = PgConnectOptions::from_str(&self.url)
            .map_err(|e| ReconError::Config(format!("invalid postgres url: {e}")))?;
        let mut conn = with_timeout(self.connect_timeout, PgConnection::connect_with(&options)).await?;
        info!(store = "postgres", "Connected to account store");

        let rows: Vec<PgRow> = sqlx::query(&self.query)
            .fetch_all(&mut conn)
            .await
            .map_err(query_error)?;
        let accounts = collect_accounts(rows.iter().map(|row| row.try_get::<Option<String>, _>(0)))?;
        if let Err(e) = conn.close().await {
            warn!(error = %e, "Failed to close account store connection cleanly");
        }
        Ok(accounts)
    }
}

#[async_trait]
impl AccountSource for SqlAccountSource {
    async fn fetch_known_accounts(&self) -> Result<HashSet<String>, ReconError> {
        info!(kind = ?self.kind, query = %self.query, "Fetching known accounts");
        let result = match self.kind {
            StoreKind::Sqlite => self.fetch_sqlite().await,
            StoreKind::Postgres => self.fetch_postgres().await,
        };
        match &result {
            Ok(accounts) => info!(count = accounts.len(), "Fetched known accounts"),
            Err(e) => error!(error = %e, "Fetching known accounts failed"),
        }
        result
    }
}

async fn with_timeout<C, F>(limit: Duration, connect: F) -> Result<C, ReconError>
where
    F: Future<Output = Result<C, sqlx::Error>>,
{
    match tokio::time::timeout(limit, connect).await {
        Ok(Ok(conn)) => Ok(conn),
        Ok(Err(e)) => Err(ReconError::Connection(e.to_string())),
        Err(_) => Err(ReconError::Connection(format!(
            "timed out after {}ms",
            limit.as_millis()
        ))),
    }
}

fn query_error(e: sqlx::Error) -> ReconError {
    ReconError::Query(e.to_string())
}

fn collect_accounts<I>(values: I) -> Result<HashSet<String>, ReconError>
where
    I: Iterator<Item = Result<Option<String>, sqlx::Error>>,
{
    let mut accounts = HashSet::new();
    let mut nulls = 0usize;
    for value in values {
        match value.map_err(query_error)? {
            Some(account) => {
                accounts.insert(account);
            }
            None => nulls += 1,
        }
    }
    if nulls > 0 {
        warn!(nulls, "Skipped NULL account values");
    }
    debug!(distinct = accounts.len(), "Collected account values");
    Ok(accounts)
}

/// Accept `name` or `schema.name` made of ASCII letters, digits and underscores.
fn validate_identifier(what: &str, ident: &str) -> Result<(), ReconError> {
    let valid_part = |part: &str| {
        !part.is_empty()
            && !part.starts_with(|c: char| c.is_ascii_digit())
            && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    };
    let parts: Vec<&str> = ident.split('.').collect();
    if parts.len() <= 2 && parts.iter().all(|p| valid_part(p)) {
        Ok(())
    } else {
        Err(ReconError::Config(format!("invalid {what} name `{ident}`")))
    }
}
