//! Query execution against a checked-out SQL Server connection.
//!
//! Placeholder substitution happens before these functions run; the SQL
//! arriving here is final text and is executed as-is.

use chrono::NaiveDateTime;
use futures_util::TryStreamExt;

use crate::error::PersistenceError;
use crate::pool::MssqlClient;
use crate::results::RecordSet;
use crate::types::SqlValue;

/// Execute a query and build a record set from the returned rows.
///
/// Statements that produce no column metadata (DML routed through the query
/// path) yield an empty record set rather than an error.
///
/// # Errors
///
/// Returns `PersistenceError::ExecutionError` if execution or row streaming
/// fails.
pub async fn build_record_set(
    client: &mut MssqlClient,
    sql: &str,
) -> Result<RecordSet, PersistenceError> {
    let mut stream = tiberius::Query::new(sql).query(client).await.map_err(|e| {
        PersistenceError::ExecutionError(format!("SQL Server query error: {e}"))
    })?;

    let columns_opt = stream.columns().await.map_err(|e| {
        PersistenceError::ExecutionError(format!("SQL Server column fetch error: {e}"))
    })?;

    let Some(columns) = columns_opt else {
        return Ok(RecordSet::default());
    };

    let column_names: Vec<String> = columns.iter().map(|col| col.name().to_string()).collect();

    let mut record_set = RecordSet::with_capacity(10);
    // Store column names once, shared by every row
    let column_names = std::sync::Arc::new(column_names);
    record_set.set_column_names(column_names.clone());

    let mut rows_stream = stream.into_row_stream();
    while let Some(row) = rows_stream.try_next().await.map_err(|e| {
        PersistenceError::ExecutionError(format!("SQL Server row fetch error: {e}"))
    })? {
        let mut values = Vec::with_capacity(column_names.len());
        for i in 0..column_names.len() {
            values.push(extract_value(&row, i).unwrap_or(SqlValue::Null));
        }
        record_set.add_row_values(values);
    }

    Ok(record_set)
}

/// Execute a DML statement and return the summed affected-row count.
///
/// # Errors
///
/// Returns `PersistenceError::ExecutionError` if execution fails or the count
/// cannot be converted.
pub async fn execute_statement(
    client: &mut MssqlClient,
    sql: &str,
) -> Result<usize, PersistenceError> {
    let exec_result = tiberius::Query::new(sql).execute(client).await.map_err(|e| {
        PersistenceError::ExecutionError(format!("SQL Server execution error: {e}"))
    })?;

    let rows_affected: u64 = exec_result.rows_affected().iter().sum();
    convert_affected_rows(rows_affected)
}

pub(crate) fn convert_affected_rows(rows_affected: u64) -> Result<usize, PersistenceError> {
    usize::try_from(rows_affected).map_err(|e| {
        PersistenceError::ExecutionError(format!("Invalid rows affected count: {e}"))
    })
}

/// Extract a value from a row at a specific index.
fn extract_value(row: &tiberius::Row, idx: usize) -> Option<SqlValue> {
    // The Tiberius row API varies by column type, so probe the likely types
    // in order.

    if let Ok(Some(val)) = row.try_get::<i32, _>(idx) {
        return Some(SqlValue::Int(i64::from(val)));
    }

    if let Ok(Some(val)) = row.try_get::<i64, _>(idx) {
        return Some(SqlValue::Int(val));
    }

    if let Ok(Some(val)) = row.try_get::<f32, _>(idx) {
        return Some(SqlValue::Float(f64::from(val)));
    }

    if let Ok(Some(val)) = row.try_get::<f64, _>(idx) {
        return Some(SqlValue::Float(val));
    }

    if let Ok(Some(val)) = row.try_get::<bool, _>(idx) {
        return Some(SqlValue::Bool(val));
    }

    if let Ok(Some(val)) = row.try_get::<NaiveDateTime, _>(idx) {
        return Some(SqlValue::Timestamp(val));
    }

    if let Ok(Some(val)) = row.try_get::<&str, _>(idx) {
        // Datetime columns read back as text still get recognized
        if val.contains('-') && (val.contains(':') || val.contains(' ')) {
            if let Ok(dt) = NaiveDateTime::parse_from_str(val, "%Y-%m-%d %H:%M:%S%.f") {
                return Some(SqlValue::Timestamp(dt));
            } else if let Ok(dt) = NaiveDateTime::parse_from_str(val, "%Y-%m-%d %H:%M:%S") {
                return Some(SqlValue::Timestamp(dt));
            }
        }

        return Some(SqlValue::Text(val.to_string()));
    }

    if let Ok(Some(val)) = row.try_get::<&[u8], _>(idx) {
        return Some(SqlValue::Blob(val.to_vec()));
    }

    // NULL or an unsupported column type
    None
}
