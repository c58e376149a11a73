use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::config::AppConfig;
use crate::endpoints::{EndpointCandidate, SaveKind, candidates_from_config, post_first_success};
use crate::history::parse_history_json;
use crate::http_client::http_client;
use crate::match_data::parse_match_json;
use crate::session::parse_auth_config_json;
use crate::source::read_resource;
use crate::state::{Delta, ProviderCommand};

/// Resolved locations plus the last sequence number handed out per resource.
struct Sources {
    match_data: String,
    history: String,
    auth_config: String,
    candidates: Vec<EndpointCandidate>,
    match_seq: u64,
    history_seq: u64,
}

pub fn spawn_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>, config: AppConfig) {
    thread::spawn(move || {
        let mut sources = Sources {
            match_data: config.resolve(&config.match_data),
            history: config.resolve(&config.history),
            auth_config: config.resolve(&config.auth_config),
            candidates: candidates_from_config(&config),
            match_seq: 0,
            history_seq: 0,
        };
        let _ = tx.send(Delta::Log(format!(
            "[INFO] Watching {} every {}s",
            sources.match_data,
            config.match_poll.as_secs()
        )));

        refresh_auth_config(&sources, &tx);
        let mut last_match = Instant::now() - config.match_poll;
        let mut last_history = Instant::now() - config.history_poll;

        loop {
            if last_match.elapsed() >= config.match_poll {
                if let Err(err) = refresh_match_data(&mut sources, &tx) {
                    let _ = tx.send(Delta::Log(format!("[WARN] Match data error: {err:#}")));
                }
                last_match = Instant::now();
            }
            if last_history.elapsed() >= config.history_poll {
                if let Err(err) = refresh_history(&mut sources, &tx) {
                    let _ = tx.send(Delta::Log(format!("[WARN] History error: {err:#}")));
                }
                last_history = Instant::now();
            }

            loop {
                let cmd = match cmd_rx.try_recv() {
                    Ok(cmd) => cmd,
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return,
                };
                match cmd {
                    ProviderCommand::FetchMatchData => {
                        if let Err(err) = refresh_match_data(&mut sources, &tx) {
                            let _ =
                                tx.send(Delta::Log(format!("[WARN] Match data error: {err:#}")));
                        }
                        last_match = Instant::now();
                    }
                    ProviderCommand::FetchHistory => {
                        if let Err(err) = refresh_history(&mut sources, &tx) {
                            let _ = tx.send(Delta::Log(format!("[WARN] History error: {err:#}")));
                        }
                        last_history = Instant::now();
                    }
                    ProviderCommand::FetchAuthConfig => refresh_auth_config(&sources, &tx),
                    ProviderCommand::PushResult(record) => {
                        spawn_push(&tx, sources.candidates.clone(), SaveKind::Result, record)
                    }
                    ProviderCommand::PushHistory(records) => {
                        spawn_push(&tx, sources.candidates.clone(), SaveKind::History, records)
                    }
                }
            }

            thread::sleep(Duration::from_millis(200));
        }
    });
}

fn refresh_match_data(sources: &mut Sources, tx: &Sender<Delta>) -> Result<()> {
    let fetched = read_resource(&sources.match_data)?;
    if !fetched.changed && sources.match_seq > 0 {
        return Ok(());
    }
    let info = parse_match_json(&fetched.body)?;
    sources.match_seq += 1;
    let _ = tx.send(Delta::SetMatchInfo {
        seq: sources.match_seq,
        info,
    });
    Ok(())
}

fn refresh_history(sources: &mut Sources, tx: &Sender<Delta>) -> Result<()> {
    let fetched = read_resource(&sources.history)?;
    if !fetched.changed && sources.history_seq > 0 {
        return Ok(());
    }
    let records = parse_history_json(&fetched.body)?;
    sources.history_seq += 1;
    let _ = tx.send(Delta::SetRemoteHistory {
        seq: sources.history_seq,
        records,
    });
    Ok(())
}

/// A missing auth file is normal; the built-in passwords stay in effect.
fn refresh_auth_config(sources: &Sources, tx: &Sender<Delta>) {
    let config = read_resource(&sources.auth_config)
        .and_then(|fetched| parse_auth_config_json(&fetched.body));
    match config {
        Ok(config) => {
            let _ = tx.send(Delta::SetAuthConfig(config));
        }
        Err(_) => {
            let _ = tx.send(Delta::Log(
                "[INFO] Using default admin passwords".to_string(),
            ));
        }
    }
}

fn spawn_push<T>(tx: &Sender<Delta>, candidates: Vec<EndpointCandidate>, kind: SaveKind, payload: T)
where
    T: serde::Serialize + Send + 'static,
{
    let tx = tx.clone();
    thread::spawn(move || {
        let result = http_client()
            .and_then(|client| post_first_success(client, &candidates, kind, &payload))
            .map_err(|err| format!("{err:#}"));
        let _ = tx.send(Delta::SaveFinished { kind, result });
    });
}
