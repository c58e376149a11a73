use std::collections::BTreeMap;

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use talaga_terminal::history::{MatchRecord, dedupe, parse_history_json};
use talaga_terminal::layout::{LayoutConfig, Side, layout_match, layout_side};
use talaga_terminal::match_data::{PositionTag, parse_match_json};
use talaga_terminal::stats::{TOP_SCORERS_LIMIT, summarize, top_scorers};

/// Fixture history repeated with fresh ids and dates, roughly two seasons of weekly games.
fn long_history(copies: usize) -> Vec<MatchRecord> {
    let base = parse_history_json(HISTORY_JSON).expect("valid fixture json");
    let mut out = Vec::with_capacity(base.len() * copies);
    for copy in 0..copies {
        for (idx, record) in base.iter().enumerate() {
            let mut record = record.clone();
            record.id = (copy * base.len() + idx) as i64 + 1;
            record.date = format!("20{:02}-{:02}-{:02}", 10 + copy / 12, copy % 12 + 1, idx + 1);
            out.push(record);
        }
    }
    out
}

fn bench_layout_fixture(c: &mut Criterion) {
    let info = parse_match_json(MATCH_JSON).expect("valid fixture json");
    let config = LayoutConfig::default();
    c.bench_function("layout_fixture", |b| {
        b.iter(|| {
            let layout = layout_match(black_box(&info), black_box(&config));
            black_box(layout.left.len() + layout.right.len());
        })
    });
}

fn bench_layout_crowded_side(c: &mut Criterion) {
    let tags = ["GK", "Def-Der", "LCB", "Mid-Centro", "CM", "Delantero", "ST", ""];
    let roster: Vec<String> = (0..22).map(|idx| format!("Jugador {idx}")).collect();
    let positions: BTreeMap<String, PositionTag> = roster
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.clone(), PositionTag::parse(tags[idx % tags.len()])))
        .collect();
    let config = LayoutConfig::default();
    c.bench_function("layout_crowded_side", |b| {
        b.iter(|| {
            let placed = layout_side(
                black_box(&roster),
                black_box(&positions),
                Side::Right,
                &config,
            );
            black_box(placed.len());
        })
    });
}

fn bench_history_parse(c: &mut Criterion) {
    c.bench_function("history_parse", |b| {
        b.iter(|| {
            let rows = parse_history_json(black_box(HISTORY_JSON)).unwrap();
            black_box(rows.len());
        })
    });
}

fn bench_stats(c: &mut Criterion) {
    let records = long_history(100);
    c.bench_function("stats_summarize", |b| {
        b.iter(|| {
            let stats = summarize(black_box(&records));
            black_box(stats.total);
        })
    });
    c.bench_function("stats_top_scorers", |b| {
        b.iter(|| {
            let rows = top_scorers(black_box(&records), TOP_SCORERS_LIMIT);
            black_box(rows.len());
        })
    });
}

fn bench_dedupe(c: &mut Criterion) {
    let records = long_history(100);
    c.bench_function("history_dedupe", |b| {
        b.iter(|| {
            let (kept, removed) = dedupe(black_box(records.clone()));
            black_box((kept.len(), removed));
        })
    });
}

criterion_group!(
    perf,
    bench_layout_fixture,
    bench_layout_crowded_side,
    bench_history_parse,
    bench_stats,
    bench_dedupe
);
criterion_main!(perf);

static MATCH_JSON: &str = include_str!("../tests/fixtures/equipos.json");
static HISTORY_JSON: &str = include_str!("../tests/fixtures/historial_partidos.json");
