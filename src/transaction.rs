//! Transaction handle bound to one pooled connection.
//!
//! Lifecycle: Created, then Active after a successful `begin`, then one of
//! the terminal states Committed or RolledBack. No transitions are legal out
//! of a terminal state, and a failed `begin` leaves the handle in Created.

use std::borrow::Cow;

use crate::error::PersistenceError;
use crate::pool::MssqlConnection;
use crate::query::{build_record_set, execute_statement};
use crate::results::RecordSet;
use crate::substitute::substitute_placeholders;
use crate::types::SqlValue;

/// Lifecycle state of a [`Transaction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Constructed but not begun.
    Created,
    /// `begin` succeeded; queries may run inside the transaction.
    Active,
    /// Terminal: `commit` succeeded.
    Committed,
    /// Terminal: `rollback` succeeded.
    RolledBack,
}

impl TransactionState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::RolledBack)
    }

    pub(crate) fn ensure_can_begin(self) -> Result<(), PersistenceError> {
        if self == Self::Created {
            Ok(())
        } else {
            Err(PersistenceError::TransactionError(format!(
                "cannot begin a transaction in the {self:?} state"
            )))
        }
    }

    pub(crate) fn ensure_active(self, operation: &str) -> Result<(), PersistenceError> {
        if self == Self::Active {
            Ok(())
        } else {
            Err(PersistenceError::TransactionError(format!(
                "cannot {operation} a transaction in the {self:?} state"
            )))
        }
    }
}

/// Isolation level applied at `begin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Snapshot,
    Serializable,
}

impl IsolationLevel {
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::ReadUncommitted => "READ UNCOMMITTED",
            Self::ReadCommitted => "READ COMMITTED",
            Self::RepeatableRead => "REPEATABLE READ",
            Self::Snapshot => "SNAPSHOT",
            Self::Serializable => "SERIALIZABLE",
        }
    }
}

/// Options for beginning a transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct BeginOptions {
    pub isolation_level: Option<IsolationLevel>,
}

impl BeginOptions {
    #[must_use]
    pub fn with_isolation_level(mut self, isolation_level: IsolationLevel) -> Self {
        self.isolation_level = Some(isolation_level);
        self
    }
}

/// Transaction handle for SQL Server.
///
/// Owns a dedicated pooled connection for its whole lifetime; every query
/// issued through the handle runs on that connection. Dropping a handle that
/// is still Active leaves the connection mid-transaction. Always finish with
/// [`commit`](Transaction::commit) or [`rollback`](Transaction::rollback).
pub struct Transaction {
    conn: MssqlConnection,
    state: TransactionState,
    log_sql: bool,
}

impl Transaction {
    pub(crate) fn new(conn: MssqlConnection, log_sql: bool) -> Self {
        Self {
            conn,
            state: TransactionState::Created,
            log_sql,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Begin the transaction, optionally setting an isolation level first.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::TransactionError` when not in the Created
    /// state, or `PersistenceError::ExecutionError` if the driver fails; a
    /// driver failure leaves the handle in Created.
    pub async fn begin(&mut self, options: &BeginOptions) -> Result<(), PersistenceError> {
        self.state.ensure_can_begin()?;

        let sql: Cow<'static, str> = match options.isolation_level {
            Some(level) => Cow::Owned(format!(
                "SET TRANSACTION ISOLATION LEVEL {}; BEGIN TRANSACTION",
                level.as_sql()
            )),
            None => Cow::Borrowed("BEGIN TRANSACTION"),
        };

        tiberius::Query::new(sql)
            .execute(&mut *self.conn)
            .await
            .map_err(|e| {
                PersistenceError::ExecutionError(format!("MSSQL begin transaction error: {e}"))
            })?;

        self.state = TransactionState::Active;
        Ok(())
    }

    /// Commit the transaction.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::TransactionError` when not Active, or
    /// `PersistenceError::ExecutionError` if the driver fails.
    pub async fn commit(&mut self) -> Result<(), PersistenceError> {
        self.state.ensure_active("commit")?;

        tiberius::Query::new("COMMIT TRANSACTION")
            .execute(&mut *self.conn)
            .await
            .map_err(|e| PersistenceError::ExecutionError(format!("MSSQL commit error: {e}")))?;

        self.state = TransactionState::Committed;
        Ok(())
    }

    /// Roll back the transaction.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::TransactionError` when not Active, or
    /// `PersistenceError::ExecutionError` if the driver fails.
    pub async fn rollback(&mut self) -> Result<(), PersistenceError> {
        self.state.ensure_active("rollback")?;

        tiberius::Query::new("ROLLBACK TRANSACTION")
            .execute(&mut *self.conn)
            .await
            .map_err(|e| PersistenceError::ExecutionError(format!("MSSQL rollback error: {e}")))?;

        self.state = TransactionState::RolledBack;
        Ok(())
    }

    /// Execute a SELECT inside the transaction.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::TransactionError` when not Active, or an
    /// execution error from the driver.
    pub async fn query(
        &mut self,
        script: &str,
        values: &[SqlValue],
    ) -> Result<RecordSet, PersistenceError> {
        self.state.ensure_active("query within")?;
        let sql = self.render(script, values);
        build_record_set(&mut self.conn, &sql).await
    }

    /// Execute a DML statement inside the transaction and return affected rows.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::TransactionError` when not Active, or an
    /// execution error from the driver.
    pub async fn execute(
        &mut self,
        script: &str,
        values: &[SqlValue],
    ) -> Result<usize, PersistenceError> {
        self.state.ensure_active("execute within")?;
        let sql = self.render(script, values);
        execute_statement(&mut self.conn, &sql).await
    }

    fn render(&self, script: &str, values: &[SqlValue]) -> String {
        let sql = substitute_placeholders(script, values);
        if self.log_sql {
            tracing::debug!(target: "mssql_persistence::sql", sql = %sql, "executing substituted sql");
        }
        sql.into_owned()
    }
}
