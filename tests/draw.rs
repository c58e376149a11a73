use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use rand::SeedableRng;
use rand::rngs::StdRng;

use talaga_terminal::draw::{
    DrawError, Player, draw_teams, match_document, parse_confirmed_json, parse_players_json,
    select_confirmed,
};
use talaga_terminal::match_data::{RoleTag, parse_match_json};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture exists")
}

fn confirmed_players() -> Vec<Player> {
    let players = parse_players_json(&read_fixture("jugadores.json")).unwrap();
    let names = parse_confirmed_json(&read_fixture("confirmados.json"), None).unwrap();
    let (found, missing) = select_confirmed(&players, &names);
    assert_eq!(missing, vec!["Zoe"]);
    found
}

#[test]
fn confirmed_list_uses_requested_or_latest_date() {
    let raw = read_fixture("confirmados.json");
    assert_eq!(
        parse_confirmed_json(&raw, Some("2025-06-08")).unwrap(),
        vec!["Arturo", "Benja", "Mateo"]
    );
    assert_eq!(parse_confirmed_json(&raw, None).unwrap().len(), 13);
    assert_eq!(
        parse_confirmed_json(r#"["Ana", " ", "Bea"]"#, None).unwrap(),
        vec!["Ana", "Bea"]
    );
}

#[test]
fn confirmed_names_match_case_insensitively() {
    let players = confirmed_players();
    assert_eq!(players.len(), 12);
    assert_eq!(players[0].name, "Arturo");
    assert!(players.iter().all(|p| p.name != "Mateo"));
}

#[test]
fn draw_balances_sides_and_splits_goalkeepers() {
    let players = confirmed_players();
    let mut rng = StdRng::seed_from_u64(7);
    let draw = draw_teams(&players, 500, &mut rng).unwrap();

    assert_eq!(draw.black.players.len(), 6);
    assert_eq!(draw.red.players.len(), 6);
    assert_eq!(draw.black.players[0].code, "GK");
    assert_eq!(draw.red.players[0].code, "GK");
    let keepers: HashSet<&str> = [
        draw.black.players[0].name.as_str(),
        draw.red.players[0].name.as_str(),
    ]
    .into_iter()
    .collect();
    assert_eq!(keepers, HashSet::from(["Arturo", "Felipe"]));
    assert!(draw.black.natural_keeper && draw.red.natural_keeper);
    assert!(draw.difference() <= 0.5, "gap {}", draw.difference());

    let mut everyone: Vec<String> = draw.black.names();
    everyone.extend(draw.red.names());
    everyone.sort();
    let mut expected: Vec<String> = players.iter().map(|p| p.name.clone()).collect();
    expected.sort();
    assert_eq!(everyone, expected);
}

#[test]
fn same_seed_gives_the_same_draw() {
    let players = confirmed_players();
    let first = draw_teams(&players, 200, &mut StdRng::seed_from_u64(42)).unwrap();
    let second = draw_teams(&players, 200, &mut StdRng::seed_from_u64(42)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn written_document_feeds_the_pitch() {
    let players = confirmed_players();
    let draw = draw_teams(&players, 300, &mut StdRng::seed_from_u64(3)).unwrap();
    let doc = match_document(&draw, "2025-06-15", "20:00", "3");
    let info = parse_match_json(&doc.to_string()).unwrap();

    assert_eq!(info.date, "2025-06-15");
    assert_eq!(info.team_a, draw.black.names());
    assert_eq!(info.team_b, draw.red.names());
    let keeper = &draw.black.players[0].name;
    assert_eq!(info.positions_a[keeper].role, RoleTag::Goalkeeper);
    for (name, tag) in info.positions_a.iter().chain(info.positions_b.iter()) {
        assert_ne!(tag.role, RoleTag::Unspecified, "{name} has no role");
    }

    let all = draw.black.positions().into_iter().chain(draw.red.positions());
    let codes: Vec<(String, String)> = all.collect();
    assert!(codes.contains(&("Joaquin".to_string(), "LM".to_string())));
    assert!(codes.contains(&("Lucas".to_string(), "Defensa".to_string())));
    assert_eq!(doc["equipos"]["negro"], doc["negro"]);
}

#[test]
fn uneven_or_tiny_groups_are_rejected() {
    let players = confirmed_players();
    let mut rng = StdRng::seed_from_u64(1);
    assert_eq!(
        draw_teams(&players[..11], 10, &mut rng).unwrap_err(),
        DrawError::OddCount(11)
    );
    assert_eq!(
        draw_teams(&players[..1], 10, &mut rng).unwrap_err(),
        DrawError::TooFew { have: 1, need: 2 }
    );
}
