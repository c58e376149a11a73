use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{CACHE_CONTROL, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use serde::{Deserialize, Serialize};

const CACHE_DIR: &str = "talaga_terminal";
const CACHE_FILE: &str = "validators.json";

/// Validators per URL, loaded from disk on first use.
static VALIDATORS: Mutex<Option<HashMap<String, Validated>>> = Mutex::new(None);

/// Last body seen for a URL with the validators the server sent alongside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Validated {
    body: String,
    etag: Option<String>,
    last_modified: Option<String>,
}

/// Body of a GET plus whether the server reported a change since the last fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub body: String,
    pub changed: bool,
}

/// GET `url` with a `_=<millis>` cache-busting query and ETag/Last-Modified revalidation.
///
/// Validators are keyed by the URL without the busting parameter, so a 304 still maps
/// back to the previously stored body.
pub fn fetch_text_revalidate(client: &Client, url: &str) -> Result<Fetched> {
    let cached_entry = with_validators(|all| all.get(url).cloned());

    let mut req = client
        .get(cache_busted(url, now_millis()))
        .header(CACHE_CONTROL, "no-cache");
    if let Some(entry) = cached_entry.as_ref() {
        if let Some(etag) = entry.etag.as_ref() {
            req = req.header(IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = entry.last_modified.as_ref() {
            req = req.header(IF_MODIFIED_SINCE, last_modified);
        }
    }

    let resp = req.send().context("request failed")?;
    let status = resp.status();
    let headers = resp.headers().clone();
    if status == StatusCode::NOT_MODIFIED {
        if let Some(entry) = cached_entry {
            return Ok(Fetched {
                body: entry.body,
                changed: false,
            });
        }
        return Err(anyhow::anyhow!("received 304 without cache body"));
    }

    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        return Err(anyhow::anyhow!("http {}: {}", status, body));
    }

    let etag = headers
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());
    let last_modified = headers
        .get(LAST_MODIFIED)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    let changed = cached_entry
        .as_ref()
        .is_none_or(|entry| entry.body != body);
    let entry = Validated {
        body: body.clone(),
        etag,
        last_modified,
    };
    with_validators(|all| {
        all.insert(url.to_string(), entry);
        store_validators(all);
    });
    Ok(Fetched { body, changed })
}

/// Append the `_=<millis>` parameter the static host uses to bypass intermediary caches.
pub fn cache_busted(url: &str, millis: i64) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}_={millis}")
}

/// Directory for the app's own files (HTTP validators, local storage, archive).
pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("TALAGA_STORAGE_DIR")
        && !dir.trim().is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    if let Ok(base) = std::env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(CACHE_DIR));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

fn with_validators<T>(f: impl FnOnce(&mut HashMap<String, Validated>) -> T) -> T {
    let mut guard = VALIDATORS.lock().expect("validator lock poisoned");
    f(guard.get_or_insert_with(load_validators))
}

/// Missing or unreadable file: start empty.
fn load_validators() -> HashMap<String, Validated> {
    validators_path()
        .and_then(|path| fs::read_to_string(path).ok())
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

fn store_validators(all: &HashMap<String, Validated>) {
    let Some(path) = validators_path() else {
        return;
    };
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).ok();
    }
    let Ok(json) = serde_json::to_string(all) else {
        return;
    };
    let tmp = path.with_extension("json.tmp");
    if fs::write(&tmp, json).is_ok() {
        fs::rename(&tmp, &path).ok();
    }
}

fn validators_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(CACHE_FILE))
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
