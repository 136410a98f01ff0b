use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use csv_ingest::config::{Config, TableDefinition, DEFAULT_BATCH_SIZE};
use csv_ingest::model::{type_map, SqlType};
use csv_ingest::sink::PgValue;
use csv_ingest::{load_csv_to_table, LoadError, Loader, MemorySink};

fn orders_table() -> TableDefinition {
    TableDefinition::new(
        "orders",
        "orders.csv",
        type_map([
            ("order_id", SqlType::Integer),
            ("order_date", SqlType::Timestamp),
            ("order_value", SqlType::Numeric),
            ("attributed_to_promo", SqlType::Boolean),
            ("order_status", SqlType::Text),
        ]),
    )
    .with_parse_dates(&["order_date"])
    .with_boolean_cols(&["attributed_to_promo"])
}

/// Write `rows` order rows; the header lists columns out of type map order
fn write_orders(dir: &Path, rows: usize) -> PathBuf {
    let mut data = String::from("order_status,order_id,order_date,order_value,attributed_to_promo\n");
    for i in 0..rows {
        let flag = ["1", "0", "", "t", "f"][i % 5];
        data.push_str(&format!(
            "shipped,{},2024-01-{:02},{}.25,{}\n",
            i + 1,
            i % 28 + 1,
            i % 100,
            flag
        ));
    }
    let path = dir.join("orders.csv");
    fs::write(&path, data).unwrap();
    path
}

#[test]
fn twelve_thousand_rows_make_three_appends() {
    let dir = TempDir::new().unwrap();
    let path = write_orders(dir.path(), 12_000);

    let mut sink = MemorySink::counting();
    let summary =
        load_csv_to_table(&mut sink, &path, &orders_table(), "raw", DEFAULT_BATCH_SIZE).unwrap();

    let sizes: Vec<usize> = sink.appends.iter().map(|a| a.row_count).collect();
    assert_eq!(sizes, vec![5000, 5000, 2000]);
    assert_eq!(summary.rows, 12_000);
    assert_eq!(summary.batches, 3);
}

#[test]
fn row_count_and_column_order_are_preserved() {
    let dir = TempDir::new().unwrap();
    for (rows, batch_size) in [(0usize, 4usize), (1, 4), (4, 4), (9, 4), (10, 3)] {
        let path = write_orders(dir.path(), rows);
        let mut sink = MemorySink::new();
        load_csv_to_table(&mut sink, &path, &orders_table(), "raw", batch_size).unwrap();

        assert_eq!(sink.total_rows(), rows);
        assert_eq!(sink.appends.len(), rows.div_ceil(batch_size));
        for append in &sink.appends {
            assert_eq!(
                append.columns,
                vec![
                    "order_id",
                    "order_date",
                    "order_value",
                    "attributed_to_promo",
                    "order_status"
                ]
            );
        }

        let ids: Vec<PgValue> = sink
            .appends
            .iter()
            .flat_map(|a| a.rows.iter().map(|r| r[0].clone()))
            .collect();
        let expected: Vec<PgValue> = (1..=rows as i32).map(PgValue::Int32).collect();
        assert_eq!(ids, expected);
    }
}

#[test]
fn boolean_column_follows_lexical_table() {
    let dir = TempDir::new().unwrap();
    let path = write_orders(dir.path(), 5);
    let mut sink = MemorySink::new();
    load_csv_to_table(&mut sink, &path, &orders_table(), "raw", 100).unwrap();

    let flags: Vec<PgValue> = sink.appends[0].rows.iter().map(|r| r[3].clone()).collect();
    assert_eq!(
        flags,
        vec![
            PgValue::Boolean(true),
            PgValue::Boolean(false),
            PgValue::Null,
            PgValue::Boolean(true),
            PgValue::Boolean(false),
        ]
    );
}

#[test]
fn null_tokens_in_date_column_are_stored_as_null() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("orders.csv");
    fs::write(
        &path,
        "order_id,order_date\n1,NULL\n2,null\n3,NA\n4,N/A\n5, \n6,2024-02-01\n7,not-a-date\n",
    )
    .unwrap();

    let mut sink = MemorySink::new();
    load_csv_to_table(&mut sink, &path, &orders_table(), "raw", 100).unwrap();

    let dates: Vec<&PgValue> = sink.appends[0].rows.iter().map(|r| &r[1]).collect();
    for (i, value) in dates.iter().enumerate() {
        if i == 5 {
            assert!(matches!(value, PgValue::Timestamp(_)));
        } else {
            assert_eq!(**value, PgValue::Null, "row {}", i + 1);
        }
    }
}

#[test]
fn malformed_row_aborts_the_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("orders.csv");
    fs::write(&path, "order_id,order_status\n1,ok\n2,ok,extra\n").unwrap();

    let mut sink = MemorySink::new();
    let err = load_csv_to_table(&mut sink, &path, &orders_table(), "raw", 100).unwrap_err();
    assert!(matches!(err, LoadError::Csv { .. }));
    assert!(sink.appends.is_empty());
}

#[test]
fn missing_file_is_fatal_before_reading() {
    let dir = TempDir::new().unwrap();
    let config = Config::new(dir.path().to_path_buf()).with_tables(vec![orders_table()]);
    let loader = Loader::new(config).unwrap();

    let mut sink = MemorySink::new();
    let err = loader.run(&mut sink).unwrap_err();
    assert!(err.to_string().starts_with("Missing file:"));
    assert!(err.to_string().contains("orders.csv"));
    assert!(sink.prepared.is_empty());
}
