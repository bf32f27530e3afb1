use chrono::NaiveDate;
use life_tracker::{
    Config, DeleteOutcome, FormState, MemoryStorage, NavTag, Record, RecordStore, RecordType,
    Screen, SqliteStorage, StorageArgs, SummaryStats, Tracker, DEFAULT_STORAGE_KEY,
};
use serde_json::json;

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

#[test]
fn expense_end_to_end() {
    let mut store = RecordStore::open(MemoryStorage::new(), DEFAULT_STORAGE_KEY).unwrap();
    let record: Record = serde_json::from_value(json!({
        "type": "expense",
        "amount": 20,
        "category": "Food",
        "date": "2024-01-01"
    }))
    .unwrap();

    store.add(record).unwrap();

    let list = store.list();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].primary_info(), "$20 • Food");
}

#[test]
fn mixed_records_renumber_after_middle_delete() {
    let store = RecordStore::open(MemoryStorage::new(), DEFAULT_STORAGE_KEY).unwrap();
    let mut tracker = Tracker::new(store);

    tracker.navigate(NavTag::Expense);
    let mut expense = FormState::from_pairs([
        ("amount", "12"),
        ("category", "Books"),
        ("method", "Cash"),
        ("note", "Used"),
    ]);
    tracker.submit(&mut expense, day()).unwrap();

    tracker.navigate(NavTag::Habit);
    let mut habit =
        FormState::from_pairs([("habit", "Read"), ("status", "Done"), ("mood", "Good")]);
    tracker.submit(&mut habit, day()).unwrap();

    tracker.navigate(NavTag::Work);
    let mut work = FormState::from_pairs([
        ("task", "Refactor"),
        ("category", "Work"),
        ("focus", "5"),
        ("hours", "3"),
    ]);
    tracker.submit(&mut work, day()).unwrap();

    tracker.navigate(NavTag::Summary);
    tracker.request_delete("1").unwrap();
    let outcome = tracker.resolve_delete(true).unwrap();
    assert!(matches!(outcome, DeleteOutcome::Deleted(ref r) if r.record_type == RecordType::Habit));

    let Screen::Summary(summary) = tracker.screen() else {
        panic!("summary should be mounted after a delete");
    };
    let rows: Vec<_> = summary
        .history
        .iter()
        .map(|r| (r.number, r.record_type.as_str(), r.primary_info.as_str()))
        .collect();
    assert_eq!(
        rows,
        vec![(1, "expense", "$12 • Books"), (2, "work", "Refactor • 3 hrs")]
    );
}

#[test]
fn aggregate_total_skips_bad_amounts() {
    let records: Vec<Record> = serde_json::from_value(json!([
        {"type": "expense", "date": "2024-01-01", "amount": 12},
        {"type": "expense", "date": "2024-01-02", "amount": "bad"},
        {"type": "expense", "date": "2024-01-03", "amount": 5}
    ]))
    .unwrap();

    assert_eq!(SummaryStats::compute(&records).total_expense, 17.0);
}

#[test]
fn sqlite_store_survives_restart() {
    let tmp = tempfile::tempdir().unwrap();
    let config = Config::resolve(&StorageArgs {
        data_dir: Some(tmp.path().to_path_buf()),
        key: None,
    })
    .unwrap();

    let original = {
        let mut store = config.open_store().unwrap();
        store
            .add(
                Record::new(RecordType::Activity, "2024-01-01")
                    .with_field("activity", "Swim")
                    .with_field("duration", 45),
            )
            .unwrap();
        store
            .add(
                Record::new(RecordType::Other("sleep".into()), "2024-01-02").with_field("hours", 8),
            )
            .unwrap();
        store.list()
    };

    let reopened = config.open_store().unwrap();
    assert_eq!(reopened.list(), original);
}

#[test]
fn malformed_sqlite_entry_opens_empty() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("tracker.db");

    {
        use life_tracker::KeyValueStorage;
        let mut storage = SqliteStorage::open(&path).unwrap();
        storage.set(DEFAULT_STORAGE_KEY, "{oops").unwrap();
    }

    let store =
        RecordStore::open(SqliteStorage::open(&path).unwrap(), DEFAULT_STORAGE_KEY).unwrap();
    assert!(store.is_empty());
}
