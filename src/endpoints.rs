//! Save endpoints and the ordered fallback used to reach them.

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;

use crate::config::{AppConfig, is_remote};
use crate::source::origin_of;

const API_RESULT_PATH: &str = "/api/guardar-resultado";
const API_HISTORY_PATH: &str = "/api/guardar-historial-completo";
const LOCAL_RESULT_PATH: &str = "/guardar-resultado";
const LOCAL_HISTORY_PATH: &str = "/guardar-historial-completo";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointCandidate {
    pub base: String,
    pub result_path: String,
    pub history_path: String,
}

impl EndpointCandidate {
    fn api(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            result_path: API_RESULT_PATH.to_string(),
            history_path: API_HISTORY_PATH.to_string(),
        }
    }

    fn local(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            result_path: LOCAL_RESULT_PATH.to_string(),
            history_path: LOCAL_HISTORY_PATH.to_string(),
        }
    }

    pub fn url(&self, kind: SaveKind) -> String {
        let path = match kind {
            SaveKind::Result => &self.result_path,
            SaveKind::History => &self.history_path,
        };
        format!("{}{}", self.base, path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveKind {
    /// One record, appended by the server.
    Result,
    /// The full collection, replacing the server copy.
    History,
}

impl SaveKind {
    pub fn label(self) -> &'static str {
        match self {
            SaveKind::Result => "result",
            SaveKind::History => "history",
        }
    }
}

/// Candidates in the order they are tried: the detected primary server, the all-in-one
/// server on the site origin, then the standalone local results server.
pub fn candidates_from_config(config: &AppConfig) -> Vec<EndpointCandidate> {
    let mut out: Vec<EndpointCandidate> = Vec::new();
    let primary = config
        .save_api_base
        .clone()
        .or_else(|| origin_of(&config.resolve(&config.match_data)));
    if let Some(base) = primary.filter(|b| is_remote(b)) {
        out.push(EndpointCandidate::api(&base));
    }
    if let Some(base) = config.site_base.as_deref().filter(|b| is_remote(b)) {
        push_unique(&mut out, EndpointCandidate::api(base));
    }
    if is_remote(&config.save_api_local) {
        push_unique(&mut out, EndpointCandidate::local(&config.save_api_local));
    }
    out
}

fn push_unique(out: &mut Vec<EndpointCandidate>, candidate: EndpointCandidate) {
    if !out.contains(&candidate) {
        out.push(candidate);
    }
}

/// POST `payload` to each candidate in turn and return the URL of the first one that
/// answers with a success status. Each candidate is tried once.
pub fn post_first_success<T: Serialize>(
    client: &Client,
    candidates: &[EndpointCandidate],
    kind: SaveKind,
    payload: &T,
) -> Result<String> {
    let body = serde_json::to_string(payload).context("serialize save payload")?;
    let mut failures: Vec<String> = Vec::new();
    for candidate in candidates {
        let url = candidate.url(kind);
        match post_json(client, &url, &body) {
            Ok(()) => return Ok(url),
            Err(err) => failures.push(format!("{url}: {err:#}")),
        }
    }
    if failures.is_empty() {
        return Err(anyhow::anyhow!("no {} save endpoint configured", kind.label()));
    }
    Err(anyhow::anyhow!(
        "could not save {} to any server ({})",
        kind.label(),
        failures.join("; ")
    ))
}

fn post_json(client: &Client, url: &str, body: &str) -> Result<()> {
    let resp = client
        .post(url)
        .header(CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .send()
        .context("request failed")?;
    let status = resp.status();
    if !status.is_success() {
        return Err(anyhow::anyhow!("http {status}"));
    }
    Ok(())
}
