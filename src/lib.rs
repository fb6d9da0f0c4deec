//! Async persistence adapter for Microsoft SQL Server.
//!
//! A thin layer over the Tiberius driver and a deadpool-managed connection
//! pool. The adapter owns three pieces of logic of its own:
//!
//! - positional placeholder substitution (`$1`, `$2`, ...) rendering values as
//!   injection-safe T-SQL literals, including `IN (...)` list expansion;
//! - ranking-window pagination SQL generation with one-based page windows and
//!   total page counting;
//! - a transaction handle with an explicit Created/Active/terminal state
//!   machine bound to one pooled connection.
//!
//! Everything else (pooling, transport, the TDS protocol, transaction
//! atomicity) is delegated to the wrapped driver stack.
//!
//! ```rust,no_run
//! use mssql_persistence::prelude::*;
//!
//! # async fn demo() -> Result<(), PersistenceError> {
//! let info = PersistenceInfo::new("localhost", "app", "sa", "password").with_port(1433);
//! let adapter = MssqlPersistence::new(info)?;
//!
//! let options = PaginationOptions::new(10).with_page(2);
//! let page = adapter
//!     .query_page(
//!         "SELECT * FROM event WHERE kind = $1",
//!         &[SqlValue::Text("audit".into())],
//!         &options,
//!         Some("id"),
//!     )
//!     .await?;
//! # let _ = page;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod error;
pub mod escape;
pub mod pagination;
pub mod pool;
pub mod prelude;
pub mod query;
pub mod results;
pub mod substitute;
pub mod transaction;
pub mod types;

pub use adapter::{DialectProfile, MssqlPersistence, PersistenceAdapter, SQL_LOG_ENV};
pub use error::PersistenceError;
pub use escape::escape;
pub use pagination::{
    PageRequest, PaginationOptions, RankingStrategy, generate_pagination_prefix,
    generate_pagination_suffix, pages_for_row_count, wrap_with_pagination,
};
pub use pool::{MssqlClient, MssqlConnection, MssqlPool, PersistenceInfo, build_pool};
pub use query::{build_record_set, execute_statement};
pub use results::{DbRow, RecordSet};
pub use substitute::substitute_placeholders;
pub use transaction::{BeginOptions, IsolationLevel, Transaction, TransactionState};
pub use types::SqlValue;
