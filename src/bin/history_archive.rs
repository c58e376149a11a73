use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use talaga_terminal::archive;
use talaga_terminal::config::AppConfig;
use talaga_terminal::history::parse_history_json;
use talaga_terminal::source::read_resource;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let config = AppConfig::from_env();

    let (label, raw) = match parse_path_arg("input") {
        Some(path) => {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("read history file {}", path.display()))?;
            (path.display().to_string(), raw)
        }
        None => {
            let location = config.resolve(&config.history);
            let fetched = read_resource(&location)?;
            (location, fetched.body)
        }
    };
    let records = parse_history_json(&raw)?;

    let db_path = parse_path_arg("db")
        .or_else(archive::default_db_path)
        .context("unable to resolve sqlite path")?;
    let mut conn = archive::open_db(&db_path)?;
    let summary = archive::archive_records(&mut conn, db_path, &records)?;
    let stored = archive::load_records(&conn)?;

    println!("History archive complete");
    println!("Source: {label}");
    println!("DB: {}", summary.db_path.display());
    println!("Records read: {}", summary.records_seen);
    println!("Records upserted: {}", summary.records_upserted);
    println!("Records stored: {}", stored.len());
    println!(
        "Latest match: {}",
        summary.latest_date.as_deref().unwrap_or("n/a")
    );
    Ok(())
}

fn parse_path_arg(name: &str) -> Option<PathBuf> {
    let flag = format!("--{name}");
    let prefix = format!("--{name}=");
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix(&prefix) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if *arg == flag
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(PathBuf::from(next));
        }
    }
    None
}
