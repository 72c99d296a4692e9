mod common;

use mareero::editor::{EditAction, EditError, commit_grid, grid_for};
use mareero::entry::submit_entry;
use mareero::{NewEntry, SheetStore};

use common::{config, read, sample_records, seeded_store};

#[test]
fn delete_drops_flagged_rows_and_keeps_order() {
    let config = config();
    let store = seeded_store(&config, sample_records());
    let before = read(&store, &config);

    let mut rows = grid_for(&before);
    rows[1].delete = true;
    rows[3].delete = true;

    let stored = commit_grid(&store, &config, rows, before.version, EditAction::DeleteSelected)
        .unwrap();

    let expected: Vec<_> = before
        .records
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != 1 && *i != 3)
        .map(|(_, r)| r.clone())
        .collect();
    assert_eq!(stored.records, expected);
    assert_eq!(read(&store, &config), stored);
    assert_eq!(stored.version, before.version + 1);
}

#[test]
fn delete_with_nothing_flagged_changes_nothing_but_the_version() {
    let config = config();
    let store = seeded_store(&config, sample_records());
    let before = read(&store, &config);

    let stored = commit_grid(
        &store,
        &config,
        grid_for(&before),
        before.version,
        EditAction::DeleteSelected,
    )
    .unwrap();
    assert_eq!(stored.records, before.records);
}

#[test]
fn delete_keeps_edits_on_surviving_rows() {
    let config = config();
    let store = seeded_store(&config, sample_records());
    let before = read(&store, &config);

    let mut rows = grid_for(&before);
    rows[0].delete = true;
    rows[2].note = "cracked lens".to_string();

    let stored = commit_grid(&store, &config, rows, before.version, EditAction::DeleteSelected)
        .unwrap();
    assert_eq!(stored.len(), before.len() - 1);
    assert_eq!(stored.records[1].note, "cracked lens");
}

#[test]
fn save_reflects_edits_without_changing_row_count() {
    let config = config();
    let store = seeded_store(&config, sample_records());
    let before = read(&store, &config);

    let mut rows = grid_for(&before);
    rows[0].item = "Brake disc".to_string();
    rows[4].category = "Missing".to_string();
    // delete flags mean nothing to a save
    rows[2].delete = true;

    let stored = commit_grid(&store, &config, rows, before.version, EditAction::Save).unwrap();
    let after = read(&store, &config);

    assert_eq!(after, stored);
    assert_eq!(after.len(), before.len());
    assert_eq!(after.records[0].item, "Brake disc");
    assert_eq!(after.records[4].category, "Missing");
    assert_eq!(after.records[2], before.records[2]);
}

#[test]
fn stale_grid_is_rejected() {
    let config = config();
    let store = seeded_store(&config, sample_records());
    let loaded = read(&store, &config);

    // someone else appends while the manager is editing
    submit_entry(
        &store,
        &config,
        NewEntry {
            employee: "Hodan".to_string(),
            item: "Fan belt".to_string(),
            ..NewEntry::default()
        },
    )
    .unwrap();
    let current = read(&store, &config);

    let mut rows = grid_for(&loaded);
    rows[0].delete = true;
    let err = commit_grid(&store, &config, rows, loaded.version, EditAction::DeleteSelected)
        .unwrap_err();

    assert!(err.is_conflict(), "{err:?}");
    assert_eq!(read(&store, &config), current);
}

#[test]
fn grid_must_cover_the_stored_rows() {
    let config = config();
    let store = seeded_store(&config, sample_records());
    let before = read(&store, &config);

    let mut missing_row = grid_for(&before);
    missing_row.pop();
    let err = commit_grid(&store, &config, missing_row, before.version, EditAction::Save)
        .unwrap_err();
    assert!(matches!(err, EditError::InvalidRows(_)));

    let mut duplicated = grid_for(&before);
    duplicated[1].id = duplicated[0].id;
    let err = commit_grid(&store, &config, duplicated, before.version, EditAction::Save)
        .unwrap_err();
    assert!(matches!(err, EditError::InvalidRows(_)));

    assert_eq!(store.read(&config.sheet_id, &config.worksheet).unwrap(), before);
}

#[test]
fn empty_sheet_saves_empty_grid() {
    let config = config();
    let store = seeded_store(&config, Vec::new());
    let before = read(&store, &config);

    let stored = commit_grid(&store, &config, Vec::new(), before.version, EditAction::Save)
        .unwrap();
    assert!(stored.is_empty());
}
