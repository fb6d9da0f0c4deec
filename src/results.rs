use crate::types::SqlValue;

/// A row from a query result.
///
/// Column names are shared across all rows of a record set; a per-row index
/// cache avoids repeated string comparisons on lookup.
#[derive(Debug, Clone)]
pub struct DbRow {
    /// The column names for this row (shared across all rows in a record set)
    pub column_names: std::sync::Arc<Vec<String>>,
    /// The values for this row
    pub values: Vec<SqlValue>,
    #[doc(hidden)]
    pub(crate) column_index_cache: std::sync::Arc<std::collections::HashMap<String, usize>>,
}

impl DbRow {
    /// Create a new row from shared column names and values.
    #[must_use]
    pub fn new(column_names: std::sync::Arc<Vec<String>>, values: Vec<SqlValue>) -> Self {
        let cache = std::sync::Arc::new(
            column_names
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), i))
                .collect::<std::collections::HashMap<_, _>>(),
        );

        Self {
            column_names,
            values,
            column_index_cache: cache,
        }
    }

    /// Get the index of a column by name.
    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        if let Some(&idx) = self.column_index_cache.get(column_name) {
            return Some(idx);
        }

        // Fall back to linear search
        self.column_names.iter().position(|col| col == column_name)
    }

    /// Get a value from the row by column name.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&SqlValue> {
        let index_opt = self.get_column_index(column_name);
        if let Some(idx) = index_opt {
            self.values.get(idx)
        } else {
            None
        }
    }

    /// Get a value from the row by column index.
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }
}

/// A record set returned from a query.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    /// The rows returned by the query
    pub results: Vec<DbRow>,
    /// The number of rows returned or affected
    pub rows_affected: usize,
    /// Column names shared by all rows
    column_names: Option<std::sync::Arc<Vec<String>>>,
}

impl RecordSet {
    /// Create a new record set with a known capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> RecordSet {
        RecordSet {
            results: Vec::with_capacity(capacity),
            rows_affected: 0,
            column_names: None,
        }
    }

    /// Set the column names for this record set (shared by all rows).
    pub fn set_column_names(&mut self, column_names: std::sync::Arc<Vec<String>>) {
        self.column_names = Some(column_names);
    }

    /// Get the column names for this record set.
    #[must_use]
    pub fn get_column_names(&self) -> Option<&std::sync::Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    /// Append a row built from the shared column names.
    pub fn add_row_values(&mut self, values: Vec<SqlValue>) {
        if let Some(column_names) = &self.column_names {
            self.results.push(DbRow::new(column_names.clone(), values));
            self.rows_affected += 1;
        }
    }
}
