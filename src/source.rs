use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::is_remote;
use crate::http_cache::{Fetched, fetch_text_revalidate};
use crate::http_client::http_client;

/// Read a JSON resource from an http(s) URL or a local path.
///
/// Local files are always reported as changed; the state layer decides whether the
/// decoded payload differs from what is on screen.
pub fn read_resource(location: &str) -> Result<Fetched> {
    if is_remote(location) {
        let client = http_client()?;
        return fetch_text_revalidate(client, location)
            .with_context(|| format!("fetch {location}"));
    }
    let path = Path::new(location);
    let body = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Ok(Fetched {
        body,
        changed: true,
    })
}

/// Origin (`scheme://host[:port]`) of an http(s) URL, if any.
pub fn origin_of(url: &str) -> Option<String> {
    if !is_remote(url) {
        return None;
    }
    let (scheme, rest) = url.split_once("://")?;
    let host = rest.split(['/', '?', '#']).next()?;
    if host.is_empty() {
        return None;
    }
    Some(format!("{scheme}://{host}"))
}
