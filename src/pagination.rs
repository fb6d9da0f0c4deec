//! Pagination clause generation for the SQL Server dialect.
//!
//! A base query fragment is wrapped with a ranking window sub-select and a
//! `BETWEEN` filter over session-scoped variables (`@PageNumber`, `@RowsPage`),
//! which the dialect requires for this shape of paging. Page numbering is
//! one-based throughout: page N with size S covers ranks
//! `[(N-1)*S + 1, N*S]`, and the same convention drives page counting.
//!
//! Pagination is an additive, opt-in decoration: options without a positive
//! page size fail validation silently and the base fragment passes through
//! unmodified.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Ranking strategy used to assign ordinal positions to rows before paging.
///
/// `CountOnly` is the fallback when no ordering column is available; it keeps
/// the generated SQL valid but assigns every row the same rank, so callers
/// wanting real pagination must supply an ordering column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingStrategy {
    /// `DENSE_RANK() OVER(ORDER BY col)`, collapsing ties.
    #[default]
    DenseRank,
    /// `ROW_NUMBER() OVER(ORDER BY col)`, not collapsing ties.
    RowNumber,
    /// `COUNT(*) OVER()`; rank is meaningless and paging is effectively off.
    CountOnly,
}

/// Caller-supplied pagination options.
///
/// `page_size` accepts the `pagesize`/`pageSize` spellings when deserialized.
/// Computed page counts are returned from the counting operation rather than
/// written back into this struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationOptions {
    /// 1-based page number; absent defaults to the first page.
    pub page: Option<u64>,
    /// Rows per page; pagination is requested only when this is present and
    /// positive.
    #[serde(alias = "pagesize", alias = "pageSize")]
    pub page_size: Option<u64>,
    /// Ranking strategy for the window sub-select.
    pub ranking: RankingStrategy,
    /// Apply a distinct projection before ranking (on unless disabled).
    pub distinct: bool,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            page: None,
            page_size: None,
            ranking: RankingStrategy::default(),
            distinct: true,
        }
    }
}

impl PaginationOptions {
    /// Options requesting pages of `page_size` rows, starting at page 1.
    #[must_use]
    pub fn new(page_size: u64) -> Self {
        Self {
            page_size: Some(page_size),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = Some(page_size);
        self
    }

    #[must_use]
    pub fn with_ranking(mut self, ranking: RankingStrategy) -> Self {
        self.ranking = ranking;
        self
    }

    #[must_use]
    pub fn with_distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    /// Validate the options into a normalized page request.
    ///
    /// `None` means "no pagination requested", never an error: the page size
    /// is absent or zero. An absent page defaults to 1; page 0 normalizes to 1
    /// under the one-based convention.
    #[must_use]
    pub fn validate(&self) -> Option<PageRequest> {
        match self.page_size {
            Some(page_size) if page_size > 0 => Some(PageRequest {
                page: self.page.unwrap_or(1).max(1),
                page_size,
            }),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_some()
    }
}

/// A validated, normalized pagination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number, at least 1.
    pub page: u64,
    /// Rows per page, at least 1.
    pub page_size: u64,
}

impl PageRequest {
    /// Inclusive rank window covered by this request.
    #[must_use]
    pub fn window(&self) -> (u64, u64) {
        let first = (self.page - 1) * self.page_size + 1;
        let last = self.page * self.page_size;
        (first, last)
    }
}

fn rank_expression(ranking: RankingStrategy, order_column: Option<&str>) -> String {
    match (order_column, ranking) {
        (Some(col), RankingStrategy::DenseRank) => format!("DENSE_RANK() OVER(ORDER BY {col})"),
        (Some(col), RankingStrategy::RowNumber) => format!("ROW_NUMBER() OVER(ORDER BY {col})"),
        _ => "COUNT(*) OVER()".to_string(),
    }
}

/// Generate the SQL prefix that precedes the base fragment.
///
/// `order_column` is interpolated verbatim into the `OVER(ORDER BY ...)`
/// clause; it must be a trusted identifier, not user input. Returns an empty
/// string when the options fail validation.
#[must_use]
pub fn generate_pagination_prefix(
    options: &PaginationOptions,
    order_column: Option<&str>,
) -> String {
    let Some(request) = options.validate() else {
        return String::new();
    };

    let rank = rank_expression(options.ranking, order_column);
    let inner = if options.distinct {
        "SELECT DISTINCT * FROM ( "
    } else {
        " "
    };
    format!(
        " DECLARE @PageNumber AS INT, @RowsPage AS INT \
         SET @PageNumber = {page} \
         SET @RowsPage = {page_size} \
         SELECT * FROM (SELECT {rank} AS element_number,* FROM ({inner}",
        page = request.page,
        page_size = request.page_size,
    )
}

/// Generate the SQL suffix that follows the base fragment.
///
/// Closes the sub-selects opened by the prefix and filters ranks to the
/// one-based page window. Returns an empty string when the options fail
/// validation.
#[must_use]
pub fn generate_pagination_suffix(options: &PaginationOptions) -> String {
    if options.validate().is_none() {
        return String::new();
    }

    let close_distinct = if options.distinct {
        " ) AS distinct_rows"
    } else {
        " "
    };
    format!(
        "{close_distinct}) AS paging_element) AS ranked_element \
         WHERE element_number BETWEEN ((@PageNumber - 1) * @RowsPage + 1) \
         AND (@PageNumber * @RowsPage) ",
    )
}

/// Wrap a base fragment with the pagination prefix and suffix.
///
/// Passes the fragment through unmodified when the options fail validation.
#[must_use]
pub fn wrap_with_pagination<'a>(
    script: &'a str,
    options: &PaginationOptions,
    order_column: Option<&str>,
) -> Cow<'a, str> {
    if !options.is_valid() {
        return Cow::Borrowed(script);
    }
    let prefix = generate_pagination_prefix(options, order_column);
    let suffix = generate_pagination_suffix(options);
    Cow::Owned(format!("{prefix}{script}{suffix}"))
}

/// Ceiling-divide a row count into pages.
#[must_use]
pub fn pages_for_row_count(rows: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return 1;
    }
    rows.div_ceil(page_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_alone_passes_validation_with_default_page() {
        let options = PaginationOptions::new(10);
        let request = options.validate().unwrap();
        assert_eq!(request.page, 1);
        assert_eq!(request.page_size, 10);
    }

    #[test]
    fn empty_options_fail_validation_and_yield_empty_fragments() {
        let options = PaginationOptions::default();
        assert!(!options.is_valid());
        assert_eq!(generate_pagination_prefix(&options, Some("id")), "");
        assert_eq!(generate_pagination_suffix(&options), "");
    }

    #[test]
    fn zero_page_size_means_no_pagination() {
        let options = PaginationOptions::new(0);
        assert!(options.validate().is_none());
    }

    #[test]
    fn page_zero_normalizes_to_first_page() {
        let options = PaginationOptions::new(10).with_page(0);
        assert_eq!(options.validate().unwrap().page, 1);
    }

    #[test]
    fn one_based_window_arithmetic() {
        let request = PageRequest {
            page: 2,
            page_size: 10,
        };
        assert_eq!(request.window(), (11, 20));

        let first = PageRequest {
            page: 1,
            page_size: 25,
        };
        assert_eq!(first.window(), (1, 25));
    }

    #[test]
    fn dense_rank_prefix_and_suffix_shape() {
        let options = PaginationOptions::new(10).with_page(2);
        let prefix = generate_pagination_prefix(&options, Some("id"));
        let suffix = generate_pagination_suffix(&options);

        assert!(prefix.contains("DECLARE @PageNumber AS INT, @RowsPage AS INT"));
        assert!(prefix.contains("SET @PageNumber = 2"));
        assert!(prefix.contains("SET @RowsPage = 10"));
        assert!(prefix.contains("DENSE_RANK() OVER(ORDER BY id) AS element_number"));
        assert!(prefix.contains("SELECT DISTINCT * FROM ("));

        assert!(suffix.contains(") AS distinct_rows) AS paging_element) AS ranked_element"));
        assert!(suffix.contains("BETWEEN ((@PageNumber - 1) * @RowsPage + 1)"));
        assert!(suffix.contains("AND (@PageNumber * @RowsPage)"));
    }

    #[test]
    fn wrapped_fragment_balances_parentheses() {
        for distinct in [true, false] {
            let options = PaginationOptions::new(10).with_page(2).with_distinct(distinct);
            let sql = wrap_with_pagination("SELECT * FROM t", &options, Some("id"));
            let opens = sql.matches('(').count();
            let closes = sql.matches(')').count();
            assert_eq!(opens, closes, "distinct={distinct}: {sql}");
        }
    }

    #[test]
    fn row_number_strategy_uses_row_number() {
        let options = PaginationOptions::new(5).with_ranking(RankingStrategy::RowNumber);
        let prefix = generate_pagination_prefix(&options, Some("created_at"));
        assert!(prefix.contains("ROW_NUMBER() OVER(ORDER BY created_at)"));
        assert!(!prefix.contains("DENSE_RANK"));
    }

    #[test]
    fn missing_order_column_falls_back_to_count() {
        let options = PaginationOptions::new(5);
        let prefix = generate_pagination_prefix(&options, None);
        assert!(prefix.contains("COUNT(*) OVER() AS element_number"));

        let explicit = PaginationOptions::new(5).with_ranking(RankingStrategy::CountOnly);
        let prefix = generate_pagination_prefix(&explicit, Some("id"));
        assert!(prefix.contains("COUNT(*) OVER() AS element_number"));
    }

    #[test]
    fn distinct_off_drops_the_inner_projection() {
        let options = PaginationOptions::new(10).with_distinct(false);
        let prefix = generate_pagination_prefix(&options, Some("id"));
        let suffix = generate_pagination_suffix(&options);
        assert!(!prefix.contains("DISTINCT"));
        assert!(!suffix.contains("distinct_rows"));
    }

    #[test]
    fn invalid_options_pass_fragment_through_unmodified() {
        let options = PaginationOptions::default();
        let sql = wrap_with_pagination("SELECT * FROM t", &options, Some("id"));
        assert!(matches!(sql, Cow::Borrowed(_)));
        assert_eq!(sql, "SELECT * FROM t");
    }

    #[test]
    fn page_counts_use_ceiling_division() {
        assert_eq!(pages_for_row_count(25, 10), 3);
        assert_eq!(pages_for_row_count(30, 10), 3);
        assert_eq!(pages_for_row_count(1, 10), 1);
        assert_eq!(pages_for_row_count(0, 10), 0);
    }

    #[test]
    fn page_size_alias_accepted_on_deserialization() {
        let options: PaginationOptions = serde_json::from_str(r#"{"pagesize": 10}"#).unwrap();
        assert_eq!(options.page_size, Some(10));
        let options: PaginationOptions = serde_json::from_str(r#"{"pageSize": 10}"#).unwrap();
        assert_eq!(options.page_size, Some(10));
    }
}
