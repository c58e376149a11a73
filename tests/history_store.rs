use std::collections::HashSet;

use rand::SeedableRng;
use rand::rngs::StdRng;

use talaga_terminal::history::{
    HistoryError, HistorySource, HistoryStore, MatchRecord, MergeStrategy, RecordDraft,
    RecordPatch, Score, Scorer, dedupe, dedupe_values, parse_history_json,
};

const NOW_MS: i64 = 1_750_000_000_000;

fn read_fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    std::fs::read_to_string(path).expect("fixture file should be readable")
}

fn draft(date: &str) -> RecordDraft {
    RecordDraft {
        date: date.to_string(),
        time: "20:00".to_string(),
        field: "3".to_string(),
        roster_a: vec!["Ana".to_string(), "Bea".to_string()],
        roster_b: vec!["Cami".to_string(), "Dani".to_string()],
        score: Score {
            team_a: 2,
            team_b: 1,
        },
        mvp: Some("Ana".to_string()),
        scorers: vec![Scorer {
            player: "Ana".to_string(),
            goals: 2,
        }],
        ..RecordDraft::default()
    }
}

fn record(id: i64, date: &str, updated_at: Option<&str>) -> MatchRecord {
    MatchRecord {
        id,
        date: date.to_string(),
        formatted_date: date.to_string(),
        time: "20:00".to_string(),
        field: "1".to_string(),
        roster_a: Vec::new(),
        roster_b: Vec::new(),
        confirmed_players: None,
        score: Some(Score {
            team_a: 1,
            team_b: 0,
        }),
        mvp: None,
        attendance: None,
        scorers: Vec::new(),
        status: None,
        updated_at: updated_at.map(str::to_string),
    }
}

#[test]
fn add_assigns_time_based_unique_ids() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut store = HistoryStore::default();
    let mut ids = HashSet::new();
    for day in 1..=28 {
        let outcome = store
            .add(draft(&format!("2025-02-{day:02}")), false, NOW_MS, &mut rng)
            .expect("distinct dates are not duplicates");
        assert_eq!(outcome.id / 1000, NOW_MS);
        assert!(ids.insert(outcome.id));
    }
    assert_eq!(store.len(), 28);
    let first = &store.records()[0];
    assert_eq!(first.formatted_date, "Saturday 1 de February");
    assert_eq!(first.status.as_deref(), Some("finalizado"));
}

#[test]
fn add_requires_a_date() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut store = HistoryStore::default();
    let err = store.add(draft("  "), false, NOW_MS, &mut rng).unwrap_err();
    assert_eq!(err, HistoryError::MissingDate);
    assert!(store.is_empty());
}

#[test]
fn duplicate_is_blocked_until_overridden() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut store = HistoryStore::default();
    let first = store.add(draft("2025-06-15"), false, NOW_MS, &mut rng).unwrap();
    store.add(draft("2025-06-08"), false, NOW_MS, &mut rng).unwrap();

    let mut reordered = draft("2025-06-15");
    reordered.roster_a.reverse();
    let err = store
        .add(reordered.clone(), false, NOW_MS + 1, &mut rng)
        .unwrap_err();
    assert!(matches!(err, HistoryError::Duplicate { existing_id, .. } if existing_id == first.id));
    assert_eq!(store.len(), 2);

    let outcome = store.add(reordered, true, NOW_MS + 1, &mut rng).unwrap();
    assert_eq!(outcome.replaced, Some(first.id));
    assert_eq!(store.len(), 2);
    assert_eq!(store.records()[0].id, outcome.id);
    assert!(store.get(first.id).is_none());
}

#[test]
fn edit_merges_only_given_fields() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut store = HistoryStore::default();
    let id = store.add(draft("2025-06-15"), false, NOW_MS, &mut rng).unwrap().id;

    let patch = RecordPatch {
        score: Some(Score {
            team_a: 4,
            team_b: 4,
        }),
        mvp: Some(None),
        ..RecordPatch::default()
    };
    let edited = store.edit(id, patch).unwrap().clone();
    assert_eq!(
        edited.score,
        Some(Score {
            team_a: 4,
            team_b: 4
        })
    );
    assert_eq!(edited.mvp, None);
    assert_eq!(edited.time, "20:00");
    assert_eq!(edited.scorers.len(), 1);

    let moved = store
        .edit(
            id,
            RecordPatch {
                date: Some("2025-06-22".to_string()),
                ..RecordPatch::default()
            },
        )
        .unwrap();
    assert_eq!(moved.formatted_date, "Sunday 22 de June");

    assert_eq!(
        store.edit(42, RecordPatch::default()).unwrap_err(),
        HistoryError::NotFound(42)
    );
}

#[test]
fn remove_unknown_id_is_not_found() {
    let mut rng = StdRng::seed_from_u64(9);
    let mut store = HistoryStore::default();
    let id = store.add(draft("2025-06-15"), false, NOW_MS, &mut rng).unwrap().id;
    assert_eq!(store.remove(id).unwrap().id, id);
    assert_eq!(store.remove(id).unwrap_err(), HistoryError::NotFound(id));
}

#[test]
fn length_merge_prefers_the_longer_collection() {
    let remote = vec![record(1, "2025-06-01", None)];
    let local = vec![record(1, "2025-06-01", None), record(2, "2025-06-08", None)];

    let (store, source) =
        HistoryStore::reconcile(remote.clone(), Some(local.clone()), MergeStrategy::Length);
    assert_eq!(source, HistorySource::Local);
    assert_eq!(store.len(), 2);

    let (store, source) =
        HistoryStore::reconcile(local.clone(), Some(remote.clone()), MergeStrategy::Length);
    assert_eq!(source, HistorySource::Remote);
    assert_eq!(store.len(), 2);

    let (store, source) = HistoryStore::reconcile(remote, None, MergeStrategy::Length);
    assert_eq!(source, HistorySource::Remote);
    assert_eq!(store.len(), 1);
}

#[test]
fn length_merge_tie_keeps_remote() {
    let remote = vec![record(1, "2025-06-01", None)];
    let local = vec![record(9, "2025-06-01", None)];
    let (store, source) = HistoryStore::reconcile(remote, Some(local), MergeStrategy::Length);
    assert_eq!(source, HistorySource::Remote);
    assert_eq!(store.records()[0].id, 1);
}

#[test]
fn id_merge_unions_and_keeps_newer_copy() {
    let mut newer = record(1, "2025-06-01", Some("2025-06-02T10:00:00"));
    newer.mvp = Some("Local".to_string());
    let remote = vec![
        record(1, "2025-06-01", Some("2025-06-01T10:00:00")),
        record(2, "2025-06-08", None),
    ];
    let local = vec![newer, record(3, "2025-06-15", None)];

    let (store, source) = HistoryStore::reconcile(remote, Some(local), MergeStrategy::ById);
    assert_eq!(source, HistorySource::Merged);
    let ids: Vec<i64> = store.records().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(store.get(1).unwrap().mvp.as_deref(), Some("Local"));
}

#[test]
fn sorted_for_display_is_newest_first() {
    let store = HistoryStore::new(vec![
        record(1, "2025-06-01", None),
        record(2, "2025-06-15", None),
        record(3, "2025-06-08", None),
    ]);
    let ids: Vec<i64> = store.sorted_for_display().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![2, 3, 1]);
}

#[test]
fn dedupe_keeps_most_recent_copy() {
    let records = parse_history_json(&read_fixture("historial_partidos.json")).unwrap();
    assert_eq!(records.len(), 4);

    let (cleaned, removed) = dedupe(records);
    assert_eq!(removed, 1);
    assert_eq!(cleaned.len(), 3);
    assert_eq!(cleaned[0].id, 1718480000000456);
    let dates: Vec<&str> = cleaned.iter().map(|r| r.date.as_str()).collect();
    assert_eq!(dates, vec!["2025-06-15", "2025-06-08", "2025-06-01"]);
}

#[test]
fn raw_dedupe_counts_same_id_copies_and_keeps_other_entries() {
    let rows = serde_json::json!([
        {
            "id": 1, "fecha": "2025-06-15", "hora": "20:00", "cancha": "3",
            "equipo_negro": ["Ana", "Bea"], "equipo_rojo": ["Cami"],
            "timestamp": "2025-06-15T22:00:00", "nota": "first"
        },
        {
            "id": 1, "fecha": "2025-06-15", "hora": "20:00", "cancha": "3",
            "equipo_negro": ["Bea", "Ana"], "equipo_rojo": ["Cami"],
            "timestamp": "2025-06-15T23:00:00", "nota": "second"
        },
        { "fecha": "2025-06-08", "hora": "19:00", "cancha": "1", "nota": "no id" },
        "not an object"
    ]);
    let rows = rows.as_array().unwrap().clone();

    let (cleaned, removed) = dedupe_values(rows);
    assert_eq!(removed, 1);
    assert_eq!(cleaned.len(), 3);
    assert_eq!(cleaned[0]["nota"], "second");
    assert_eq!(cleaned[1]["nota"], "no id");
    assert_eq!(cleaned[2], "not an object");
}

#[test]
fn raw_dedupe_matches_fixture_duplicates() {
    let doc: serde_json::Value =
        serde_json::from_str(&read_fixture("historial_partidos.json")).unwrap();
    let rows = doc.as_array().unwrap().clone();
    let before = rows.len();

    let (cleaned, removed) = dedupe_values(rows);
    assert_eq!(removed, 1);
    assert_eq!(cleaned.len(), before - 1);
    assert_eq!(cleaned[0]["id"], 1718480000000456i64);
}

#[test]
fn records_serialize_with_wire_names() {
    let value = serde_json::to_value(record(5, "2025-06-01", None)).unwrap();
    assert_eq!(value["fecha"], "2025-06-01");
    assert_eq!(value["resultado"]["negro"], 1);
    assert_eq!(value["resultado"]["rojo"], 0);
    assert!(value.get("mvp").is_none());
    assert!(value["goleadores"].as_array().unwrap().is_empty());
}
