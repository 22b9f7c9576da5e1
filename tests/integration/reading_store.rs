//! Reading store behaviour against workbooks that already hold data.

use bcv_agent::store::readings::{COL_OBSERVATION_DATE, COL_QUERY_DATE, COL_RATE};
use bcv_agent::store::{Cell, RateReading, ReadingStore, Sheet};
use chrono::NaiveDate;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A store as a person might have kept it: real date cells and an extra
/// notes column.
fn seeded_store(path: &std::path::Path) -> Sheet {
    let mut sheet = Sheet::with_headers(&[COL_OBSERVATION_DATE, COL_RATE, COL_QUERY_DATE, "Nota"]);
    sheet.rows.push(vec![
        Cell::Date(date(2024, 4, 29)),
        Cell::Number(36.31),
        Cell::Date(date(2024, 4, 29)),
        Cell::Text("cargado a mano".into()),
    ]);
    sheet.rows.push(vec![
        Cell::Date(date(2024, 4, 30)),
        Cell::Number(36.4),
        Cell::Date(date(2024, 4, 30)),
        Cell::Empty,
    ]);
    sheet.write_atomic(path).unwrap();
    sheet
}

#[test]
fn append_preserves_existing_rows_and_columns() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("tasa_bcv.xlsx");
    seeded_store(&path);
    let store = ReadingStore::new(&path);

    let new = RateReading {
        observation_date: date(2024, 5, 1),
        rate: 36.45,
        query_date: date(2024, 5, 1),
    };
    assert!(store.append(&new).unwrap());

    let sheet = Sheet::read(&path).unwrap();
    assert_eq!(sheet.headers.len(), 4);
    assert_eq!(sheet.headers[3], "Nota");
    assert_eq!(sheet.rows.len(), 3);
    assert_eq!(sheet.rows[0][3], Cell::Text("cargado a mano".into()));

    let dates: Vec<String> = store
        .readings()
        .unwrap()
        .iter()
        .map(RateReading::date_key)
        .collect();
    assert_eq!(dates, vec!["2024-04-29", "2024-04-30", "2024-05-01"]);
}

#[test]
fn date_cells_count_as_recorded() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("tasa_bcv.xlsx");
    let before = seeded_store(&path);
    let store = ReadingStore::new(&path);

    assert!(store.contains(date(2024, 4, 30)).unwrap());

    let repeat = RateReading {
        observation_date: date(2024, 4, 30),
        rate: 40.0,
        query_date: date(2024, 5, 2),
    };
    assert!(!store.append(&repeat).unwrap());
    assert_eq!(Sheet::read(&path).unwrap(), before);
}

#[test]
fn unreadable_store_is_a_storage_error_and_left_alone() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("tasa_bcv.xlsx");
    std::fs::write(&path, b"this is not a workbook").unwrap();
    let store = ReadingStore::new(&path);

    let err = store
        .append(&RateReading {
            observation_date: date(2024, 5, 1),
            rate: 36.45,
            query_date: date(2024, 5, 1),
        })
        .unwrap_err();

    assert!(matches!(err, bcv_agent::AgentError::Storage(_)));
    assert_eq!(std::fs::read(&path).unwrap(), b"this is not a workbook");
}

fn new_reading() -> RateReading {
    RateReading {
        observation_date: date(2024, 5, 1),
        rate: 36.45,
        query_date: date(2024, 5, 1),
    }
}

#[test]
fn datetime_cells_stay_datetimes_after_append() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("tasa_bcv.xlsx");
    let consulted = date(2024, 4, 30).and_hms_opt(9, 15, 0).unwrap();
    let mut sheet = Sheet::with_headers(&[COL_OBSERVATION_DATE, COL_RATE, COL_QUERY_DATE]);
    sheet.rows.push(vec![
        Cell::Text("2024-04-30".into()),
        Cell::Number(36.4),
        Cell::DateTime(consulted),
    ]);
    sheet.write_atomic(&path).unwrap();

    assert!(ReadingStore::new(&path).append(&new_reading()).unwrap());

    let after = Sheet::read(&path).unwrap();
    assert_eq!(after.rows[0][2], Cell::DateTime(consulted));
}

#[test]
fn table_not_starting_at_a1_is_not_shifted() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("tasa_bcv.xlsx");
    let mut sheet = Sheet::with_headers(&[COL_OBSERVATION_DATE, COL_RATE, COL_QUERY_DATE]);
    sheet.origin = (0, 1);
    sheet.rows.push(vec![
        Cell::Text("2024-04-30".into()),
        Cell::Number(36.4),
        Cell::Text("2024-04-30".into()),
    ]);
    sheet.write_atomic(&path).unwrap();

    assert!(ReadingStore::new(&path).append(&new_reading()).unwrap());

    let after = Sheet::read(&path).unwrap();
    assert_eq!(after.origin, (0, 1));
    assert_eq!(after.rows.len(), 2);
    assert_eq!(after.rows[0], sheet.rows[0]);
}

#[test]
fn blank_rows_between_readings_are_kept() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("tasa_bcv.xlsx");
    let mut sheet = Sheet::with_headers(&[COL_OBSERVATION_DATE, COL_RATE, COL_QUERY_DATE]);
    sheet.rows.push(vec![
        Cell::Text("2024-04-29".into()),
        Cell::Number(36.31),
        Cell::Text("2024-04-29".into()),
    ]);
    sheet.rows.push(vec![Cell::Empty, Cell::Empty, Cell::Empty]);
    sheet.rows.push(vec![
        Cell::Text("2024-04-30".into()),
        Cell::Number(36.4),
        Cell::Text("2024-04-30".into()),
    ]);
    sheet.write_atomic(&path).unwrap();
    let store = ReadingStore::new(&path);

    assert!(store.append(&new_reading()).unwrap());

    let after = Sheet::read(&path).unwrap();
    assert_eq!(after.rows.len(), 4);
    assert_eq!(after.rows[..3], sheet.rows[..]);
    assert_eq!(store.readings().unwrap().len(), 3);
}
