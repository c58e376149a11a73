use talaga_terminal::history::{MatchRecord, Score, parse_history_json};
use talaga_terminal::stats::{MatchStats, is_qualifying, summarize, top_scorers};

fn fixture_records() -> Vec<MatchRecord> {
    let path = format!(
        "{}/tests/fixtures/historial_partidos.json",
        env!("CARGO_MANIFEST_DIR")
    );
    let raw = std::fs::read_to_string(path).expect("fixture file should be readable");
    parse_history_json(&raw).expect("fixture should parse")
}

#[test]
fn summary_skips_cancelled_matches() {
    let records = fixture_records();
    assert_eq!(
        summarize(&records),
        MatchStats {
            total: 3,
            wins_a: 2,
            wins_b: 0,
            draws: 1,
        }
    );
}

#[test]
fn goalless_draw_without_marker_still_counts() {
    let mut records = fixture_records();
    records[2].mvp = Some("Arturo".to_string());
    assert!(is_qualifying(&records[2]));
    assert_eq!(summarize(&records).draws, 2);
}

#[test]
fn unscored_records_do_not_qualify() {
    let mut records = fixture_records();
    records[0].score = None;
    assert!(!is_qualifying(&records[0]));
    assert_eq!(summarize(&records).total, 2);

    records[1].score = Some(Score {
        team_a: 0,
        team_b: 5,
    });
    assert_eq!(summarize(&records).wins_b, 1);
}

#[test]
fn top_scorers_sum_and_keep_first_seen_order_on_ties() {
    let records = fixture_records();
    let rows = top_scorers(&records, 10);
    let table: Vec<(&str, u32)> = rows.iter().map(|r| (r.player.as_str(), r.goals)).collect();
    assert_eq!(
        table,
        vec![
            ("Arturo", 5),
            ("Felipe", 2),
            ("Benja", 1),
            ("Claudio", 1),
            ("Hugo", 1),
        ]
    );

    let top_two = top_scorers(&records, 2);
    assert_eq!(top_two.len(), 2);
    assert_eq!(top_two[1].player, "Felipe");
}

#[test]
fn empty_history_has_no_stats() {
    assert_eq!(summarize(&[]), MatchStats::default());
    assert!(top_scorers(&[], 10).is_empty());
}
