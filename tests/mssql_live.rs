//! Integration tests against a live SQL Server instance.
//!
//! These tests run only when connection details are provided through the
//! environment, and skip cleanly otherwise:
//!
//! ```text
//! MSSQL_TEST_HOST=10.0.0.5 \
//! MSSQL_TEST_PASSWORD=... \
//! MSSQL_TEST_DB=testing MSSQL_TEST_USER=sa cargo test --test mssql_live
//! ```

use std::env;

use mssql_persistence::prelude::*;

fn live_adapter() -> Option<MssqlPersistence> {
    let host = env::var("MSSQL_TEST_HOST").ok()?;
    let password = env::var("MSSQL_TEST_PASSWORD").ok()?;
    let database = env::var("MSSQL_TEST_DB").unwrap_or_else(|_| "master".to_string());
    let user = env::var("MSSQL_TEST_USER").unwrap_or_else(|_| "sa".to_string());
    let port = env::var("MSSQL_TEST_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(1433);

    let info = PersistenceInfo::new(host, database, user, password).with_port(port);
    MssqlPersistence::new(info).ok()
}

async fn reset_fixture(adapter: &MssqlPersistence, table: &str, rows: u64) {
    adapter
        .execute(
            &format!("IF OBJECT_ID('{table}','U') IS NOT NULL DROP TABLE {table}"),
            &[],
        )
        .await
        .expect("drop fixture");
    adapter
        .execute(&format!("CREATE TABLE {table} (id INT PRIMARY KEY)"), &[])
        .await
        .expect("create fixture");

    if rows > 0 {
        let values: Vec<String> = (1..=rows).map(|i| format!("({i})")).collect();
        adapter
            .execute(
                &format!("INSERT INTO {table} (id) VALUES {}", values.join(",")),
                &[],
            )
            .await
            .expect("insert fixture rows");
    }
}

fn collect_ids(record_set: &RecordSet) -> Vec<i64> {
    let mut ids: Vec<i64> = record_set
        .results
        .iter()
        .filter_map(|row| row.get("id").and_then(|v| v.as_int().copied()))
        .collect();
    ids.sort_unstable();
    ids
}

#[tokio::test]
async fn pagination_returns_the_exact_page_slice() {
    let Some(adapter) = live_adapter() else {
        eprintln!("skipping: MSSQL_TEST_HOST / MSSQL_TEST_PASSWORD not set");
        return;
    };

    let table = "paging_fixture_live";
    reset_fixture(&adapter, table, 25).await;

    let options = PaginationOptions::new(10).with_page(2);
    let page = adapter
        .query_page(
            &format!("SELECT * FROM {table}"),
            &[],
            &options,
            Some("id"),
        )
        .await
        .expect("paged query");

    let expected: Vec<i64> = (11..=20).collect();
    assert_eq!(collect_ids(&page), expected);

    // 25 rows at 10 per page round up to 3 pages
    let pages = adapter
        .get_pages(&format!("SELECT * FROM {table}"), &options)
        .await
        .expect("page count");
    assert_eq!(pages, 3);

    // An exact multiple must not round up an extra page
    adapter
        .execute(
            &format!("INSERT INTO {table} (id) VALUES (26),(27),(28),(29),(30)"),
            &[],
        )
        .await
        .expect("top up fixture");
    let pages = adapter
        .get_pages(&format!("SELECT * FROM {table}"), &options)
        .await
        .expect("page count");
    assert_eq!(pages, 3);

    // Invalid options degrade to a single page
    let pages = adapter
        .get_pages(&format!("SELECT * FROM {table}"), &PaginationOptions::default())
        .await
        .expect("page count");
    assert_eq!(pages, 1);

    adapter
        .execute(&format!("DROP TABLE {table}"), &[])
        .await
        .expect("cleanup");
}

#[tokio::test]
async fn substituted_values_round_trip() {
    let Some(adapter) = live_adapter() else {
        eprintln!("skipping: MSSQL_TEST_HOST / MSSQL_TEST_PASSWORD not set");
        return;
    };

    let table = "subst_fixture_live";
    adapter
        .execute(
            &format!("IF OBJECT_ID('{table}','U') IS NOT NULL DROP TABLE {table}"),
            &[],
        )
        .await
        .expect("drop fixture");
    adapter
        .execute(
            &format!("CREATE TABLE {table} (id INT PRIMARY KEY, name NVARCHAR(100))"),
            &[],
        )
        .await
        .expect("create fixture");

    let affected = adapter
        .execute(
            &format!("INSERT INTO {table} (id, name) VALUES ($1, $2), ($3, $4)"),
            &[
                SqlValue::Int(1),
                SqlValue::Text("O'Brien".into()),
                SqlValue::Int(2),
                SqlValue::Text("plain".into()),
            ],
        )
        .await
        .expect("insert");
    assert_eq!(affected, 2);

    // Array expansion drives the IN list
    let rows = adapter
        .query(
            &format!("SELECT * FROM {table} WHERE id IN $1"),
            &[SqlValue::Array(vec![SqlValue::Int(1), SqlValue::Int(2)])],
        )
        .await
        .expect("select");
    assert_eq!(rows.results.len(), 2);

    let quoted = adapter
        .query(
            &format!("SELECT * FROM {table} WHERE name = $1"),
            &[SqlValue::Text("O'Brien".into())],
        )
        .await
        .expect("select quoted");
    assert_eq!(quoted.results.len(), 1);

    adapter
        .execute(&format!("DROP TABLE {table}"), &[])
        .await
        .expect("cleanup");
}

#[tokio::test]
async fn transaction_lifecycle_commit_rollback_and_terminal_errors() {
    let Some(adapter) = live_adapter() else {
        eprintln!("skipping: MSSQL_TEST_HOST / MSSQL_TEST_PASSWORD not set");
        return;
    };

    let table = "tx_fixture_live";
    reset_fixture(&adapter, table, 0).await;
    let count_sql = format!("SELECT COUNT(*) AS n FROM {table}");
    let count = |rs: RecordSet| {
        rs.results
            .first()
            .and_then(|row| row.get_by_index(0))
            .and_then(|v| v.as_int().copied())
            .unwrap_or(-1)
    };

    // begin -> insert -> commit is visible afterwards
    let mut tx = adapter.transaction().await.expect("checkout");
    assert_eq!(tx.state(), TransactionState::Created);
    tx.begin(&BeginOptions::default()).await.expect("begin");
    assert_eq!(tx.state(), TransactionState::Active);
    tx.execute(&format!("INSERT INTO {table} (id) VALUES ($1)"), &[SqlValue::Int(1)])
        .await
        .expect("insert in tx");
    tx.commit().await.expect("commit");
    assert_eq!(tx.state(), TransactionState::Committed);

    let visible = adapter.query(&count_sql, &[]).await.expect("count");
    assert_eq!(count(visible), 1);

    // A second commit on the same handle surfaces the terminal-state error
    let err = tx.commit().await.expect_err("double commit must fail");
    assert!(matches!(err, PersistenceError::TransactionError(_)));

    // begin -> insert -> rollback leaves no trace
    let mut tx = adapter.transaction().await.expect("checkout");
    tx.begin(&BeginOptions::default()).await.expect("begin");
    tx.execute(&format!("INSERT INTO {table} (id) VALUES ($1)"), &[SqlValue::Int(2)])
        .await
        .expect("insert in tx");
    tx.rollback().await.expect("rollback");
    assert_eq!(tx.state(), TransactionState::RolledBack);

    let after_rollback = adapter.query(&count_sql, &[]).await.expect("count");
    assert_eq!(count(after_rollback), 1);

    // A handle that never began rejects commit/rollback and stays Created
    let mut fresh = adapter.transaction().await.expect("checkout");
    let err = fresh.rollback().await.expect_err("rollback before begin");
    assert!(matches!(err, PersistenceError::TransactionError(_)));
    assert_eq!(fresh.state(), TransactionState::Created);

    adapter
        .execute(&format!("DROP TABLE {table}"), &[])
        .await
        .expect("cleanup");

    adapter.end().await.expect("close pool");
    assert!(adapter.query("SELECT 1 AS one", &[]).await.is_err());
}
