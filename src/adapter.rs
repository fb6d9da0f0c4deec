//! The SQL Server query adapter.
//!
//! Holds the connection configuration and pool, substitutes positional
//! placeholders into SQL text, optionally wraps queries with pagination
//! clauses, and forwards the final SQL to the driver. Concurrency, pooling,
//! transport, and transactional atomicity all belong to the wrapped
//! tiberius/deadpool stack; multiple callers may share one adapter and the
//! adapter adds no synchronization of its own.

use async_trait::async_trait;

use crate::error::PersistenceError;
use crate::pagination::{
    self, PaginationOptions, generate_pagination_prefix, generate_pagination_suffix,
    wrap_with_pagination,
};
use crate::pool::{MssqlConnection, MssqlPool, PersistenceInfo, build_pool};
use crate::query::{build_record_set, execute_statement};
use crate::results::RecordSet;
use crate::substitute::substitute_placeholders;
use crate::transaction::Transaction;
use crate::types::SqlValue;

/// Environment variable that, when set to `1` or `true`, logs the final
/// substituted SQL text before execution.
pub const SQL_LOG_ENV: &str = "MSSQL_PERSISTENCE_LOG_SQL";

fn sql_logging_enabled() -> bool {
    std::env::var(SQL_LOG_ENV)
        .map(|v| {
            let v = v.trim().to_ascii_lowercase();
            v == "1" || v == "true"
        })
        .unwrap_or(false)
}

/// Row-limit traits of the SQL Server dialect, advertised to the persistence
/// framework so it can place limit clauses correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialectProfile {
    /// Plain INSERT statements need no returning clause.
    pub simple_create: bool,
    /// Plain UPDATE statements need no returning clause.
    pub simple_update: bool,
    /// Keyword used to limit row counts.
    pub limit_keyword: &'static str,
    /// The limit keyword precedes the projection (`SELECT TOP n ...`).
    pub limit_before_projection: bool,
}

impl Default for DialectProfile {
    fn default() -> Self {
        Self {
            simple_create: true,
            simple_update: true,
            limit_keyword: "TOP",
            limit_before_projection: true,
        }
    }
}

/// Capability interface the persistence framework programs against.
///
/// One concrete implementation exists per target SQL engine; this crate ships
/// [`MssqlPersistence`].
#[async_trait]
pub trait PersistenceAdapter {
    /// The connection configuration this adapter was built from.
    fn persistence_info(&self) -> &PersistenceInfo;

    /// Row-limit traits of the target dialect.
    fn dialect(&self) -> DialectProfile;

    /// Verify that a pooled connection can be checked out and used.
    async fn connect(&self) -> Result<(), PersistenceError>;

    /// Substitute placeholders and run a query, returning the record set.
    async fn query(
        &self,
        script: &str,
        values: &[SqlValue],
    ) -> Result<RecordSet, PersistenceError>;

    /// Substitute placeholders and run a DML statement, returning the
    /// affected-row count.
    async fn execute(&self, script: &str, values: &[SqlValue])
    -> Result<usize, PersistenceError>;

    /// Close the pool; subsequent operations fail to check out connections.
    async fn end(&self) -> Result<(), PersistenceError>;

    /// Pagination prefix for the given options and ordering column.
    fn generate_pagination_prefix(
        &self,
        options: &PaginationOptions,
        order_column: Option<&str>,
    ) -> String;

    /// Pagination suffix for the given options.
    fn generate_pagination_suffix(&self, options: &PaginationOptions) -> String;

    /// Total number of pages the base fragment would produce under the given
    /// options. Absent or invalid options count as a single page.
    async fn get_pages(
        &self,
        script: &str,
        options: &PaginationOptions,
    ) -> Result<u64, PersistenceError>;
}

/// SQL Server implementation of [`PersistenceAdapter`].
pub struct MssqlPersistence {
    info: PersistenceInfo,
    pool: MssqlPool,
    log_sql: bool,
}

impl MssqlPersistence {
    /// Build the adapter and its connection pool from the configuration.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::ConnectionError` if pool creation fails.
    pub fn new(info: PersistenceInfo) -> Result<Self, PersistenceError> {
        let pool = build_pool(&info)?;
        Ok(Self {
            log_sql: sql_logging_enabled(),
            info,
            pool,
        })
    }

    async fn acquire(&self) -> Result<MssqlConnection, PersistenceError> {
        self.pool.get().await.map_err(|e| {
            PersistenceError::ConnectionError(format!("SQL Server pool checkout error: {e}"))
        })
    }

    fn render(&self, script: &str, values: &[SqlValue]) -> String {
        let sql = substitute_placeholders(script, values);
        if self.log_sql {
            tracing::debug!(target: "mssql_persistence::sql", sql = %sql, "executing substituted sql");
        }
        sql.into_owned()
    }

    /// Run a paginated query: the base fragment is wrapped with the ranking
    /// prefix/suffix, placeholders are substituted, and only the rows of the
    /// requested page are returned. Invalid options degrade to an unpaginated
    /// query.
    ///
    /// # Errors
    ///
    /// Propagates query execution errors.
    pub async fn query_page(
        &self,
        script: &str,
        values: &[SqlValue],
        options: &PaginationOptions,
        order_column: Option<&str>,
    ) -> Result<RecordSet, PersistenceError> {
        let wrapped = wrap_with_pagination(script, options, order_column);
        self.query(&wrapped, values).await
    }

    /// Check out a dedicated connection and return a transaction handle in
    /// the Created state.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::ConnectionError` if checkout fails.
    pub async fn transaction(&self) -> Result<Transaction, PersistenceError> {
        Ok(Transaction::new(self.acquire().await?, self.log_sql))
    }
}

#[async_trait]
impl PersistenceAdapter for MssqlPersistence {
    fn persistence_info(&self) -> &PersistenceInfo {
        &self.info
    }

    fn dialect(&self) -> DialectProfile {
        DialectProfile::default()
    }

    async fn connect(&self) -> Result<(), PersistenceError> {
        let mut conn = self.acquire().await?;
        tiberius::Query::new("SELECT 1")
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                PersistenceError::ConnectionError(format!(
                    "SQL Server connectivity check error: {e}"
                ))
            })?;
        Ok(())
    }

    async fn query(
        &self,
        script: &str,
        values: &[SqlValue],
    ) -> Result<RecordSet, PersistenceError> {
        let sql = self.render(script, values);
        let mut conn = self.acquire().await?;
        build_record_set(&mut conn, &sql).await
    }

    async fn execute(
        &self,
        script: &str,
        values: &[SqlValue],
    ) -> Result<usize, PersistenceError> {
        let sql = self.render(script, values);
        let mut conn = self.acquire().await?;
        execute_statement(&mut conn, &sql).await
    }

    async fn end(&self) -> Result<(), PersistenceError> {
        self.pool.close();
        Ok(())
    }

    fn generate_pagination_prefix(
        &self,
        options: &PaginationOptions,
        order_column: Option<&str>,
    ) -> String {
        generate_pagination_prefix(options, order_column)
    }

    fn generate_pagination_suffix(&self, options: &PaginationOptions) -> String {
        generate_pagination_suffix(options)
    }

    async fn get_pages(
        &self,
        script: &str,
        options: &PaginationOptions,
    ) -> Result<u64, PersistenceError> {
        let Some(request) = options.validate() else {
            return Ok(1);
        };

        let count_sql = format!("SELECT COUNT(*) AS total_rows FROM ( {script} ) AS pages");
        let result = self.query(&count_sql, &[]).await?;

        let rows = result
            .results
            .first()
            .and_then(|row| row.get_by_index(0))
            .and_then(|value| value.as_int().copied());

        match rows {
            Some(rows) => {
                let rows = u64::try_from(rows).unwrap_or(0);
                Ok(pagination::pages_for_row_count(rows, request.page_size).max(1))
            }
            // Empty or malformed count result: leave the count unset and let
            // the caller treat the dataset as one page.
            None => Ok(1),
        }
    }
}
