//! Convenient imports for common functionality.

pub use crate::adapter::{DialectProfile, MssqlPersistence, PersistenceAdapter};
pub use crate::error::PersistenceError;
pub use crate::pagination::{PageRequest, PaginationOptions, RankingStrategy};
pub use crate::pool::PersistenceInfo;
pub use crate::results::{DbRow, RecordSet};
pub use crate::substitute::substitute_placeholders;
pub use crate::transaction::{BeginOptions, IsolationLevel, Transaction, TransactionState};
pub use crate::types::SqlValue;
