use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use talaga_terminal::draw::{
    DEFAULT_ATTEMPTS, draw_teams, match_document, parse_confirmed_json, parse_players_json,
    select_confirmed,
};
use talaga_terminal::match_data::UNCONFIRMED;

fn main() -> Result<()> {
    let players_path =
        parse_arg("players").map_or_else(|| PathBuf::from("jugadores.json"), PathBuf::from);
    let confirmed_path =
        parse_arg("confirmed").map_or_else(|| PathBuf::from("confirmados.json"), PathBuf::from);
    let output = parse_arg("output").map_or_else(|| PathBuf::from("equipos.json"), PathBuf::from);
    let date = parse_arg("date");
    let attempts = parse_arg("attempts")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(DEFAULT_ATTEMPTS)
        .max(1);

    let players = parse_players_json(
        &fs::read_to_string(&players_path)
            .with_context(|| format!("read players {}", players_path.display()))?,
    )?;
    let names = parse_confirmed_json(
        &fs::read_to_string(&confirmed_path)
            .with_context(|| format!("read confirmed list {}", confirmed_path.display()))?,
        date.as_deref(),
    )?;
    let (confirmed, missing) = select_confirmed(&players, &names);
    for name in &missing {
        eprintln!("[WARN] {name} is not in {}", players_path.display());
    }

    let draw = draw_teams(&confirmed, attempts, &mut rand::thread_rng())?;
    let doc = match_document(
        &draw,
        date.as_deref().unwrap_or(UNCONFIRMED),
        parse_arg("time").as_deref().unwrap_or(UNCONFIRMED),
        parse_arg("field").as_deref().unwrap_or(UNCONFIRMED),
    );

    let json = serde_json::to_string_pretty(&doc).context("serialize match document")?;
    let tmp = output.with_extension("json.tmp");
    fs::write(&tmp, json).context("write match document")?;
    fs::rename(&tmp, &output).context("swap match document")?;

    println!("Team draw complete");
    println!("Players confirmed: {} ({} unknown)", confirmed.len(), missing.len());
    for (label, team) in [("Black", &draw.black), ("Red", &draw.red)] {
        println!("{label} (avg {:.2}):", team.average());
        for player in &team.players {
            println!("  {:<4} {} ({})", player.code, player.name, player.rating);
        }
    }
    println!("Difference: {:.3}", draw.difference());
    println!("Written: {}", output.display());
    Ok(())
}

fn parse_arg(name: &str) -> Option<String> {
    let flag = format!("--{name}");
    let prefix = format!("--{name}=");
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if *arg == flag
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}
