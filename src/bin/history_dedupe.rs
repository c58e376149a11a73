use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

use serde_json::Value;

use talaga_terminal::history::{dedupe_values, history_rows};

const DEFAULT_INPUT: &str = "historial_partidos.json";

fn main() -> Result<()> {
    let input = parse_path_arg("input").unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT));
    let raw = fs::read_to_string(&input)
        .with_context(|| format!("read history file {}", input.display()))?;
    let mut doc: Value = serde_json::from_str(&raw).context("invalid history json")?;
    let rows = history_rows(&doc)?.clone();
    let before = rows.len();

    let (cleaned, removed) = dedupe_values(rows);
    println!("History dedupe");
    println!("File: {}", input.display());
    println!("Matches before: {before}");
    println!("Matches after: {}", cleaned.len());
    println!("Duplicates removed: {removed}");

    if removed == 0 {
        println!("No duplicates found; file left untouched");
        return Ok(());
    }

    let backup = backup_path(&input);
    fs::write(&backup, &raw).with_context(|| format!("write backup {}", backup.display()))?;
    println!("Backup: {}", backup.display());

    replace_rows(&mut doc, cleaned);
    let json = serde_json::to_string_pretty(&doc).context("serialize cleaned history")?;
    let tmp = input.with_extension("json.tmp");
    fs::write(&tmp, json).context("write cleaned history")?;
    fs::rename(&tmp, &input).context("swap cleaned history")?;
    println!("Cleaned file written");
    Ok(())
}

/// Put the cleaned entries back where they were read from.
fn replace_rows(doc: &mut Value, cleaned: Vec<Value>) {
    match doc {
        Value::Object(obj) => {
            let field = if obj.contains_key("historial") {
                "historial"
            } else {
                "rows"
            };
            obj.insert(field.to_string(), Value::Array(cleaned));
        }
        other => *other = Value::Array(cleaned),
    }
}

fn backup_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("historial_partidos");
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    input.with_file_name(format!("{stem}_backup_{stamp}.json"))
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
