use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use rand::Rng;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::title::format_date;

/// MVP value the organisers use to mark a match that did not take place.
pub const CANCELLED_MARKER: &str = "Cancelled";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Score {
    #[serde(rename = "negro")]
    pub team_a: u32,
    #[serde(rename = "rojo")]
    pub team_b: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scorer {
    #[serde(rename = "jugador")]
    pub player: String,
    #[serde(rename = "goles")]
    pub goals: u32,
}

/// One played (or cancelled) match. Serialized with the field names the site's JSON
/// files and save endpoints use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    pub id: i64,
    #[serde(rename = "fecha")]
    pub date: String,
    #[serde(rename = "fecha_formato")]
    pub formatted_date: String,
    #[serde(rename = "hora")]
    pub time: String,
    #[serde(rename = "cancha")]
    pub field: String,
    #[serde(rename = "equipo_negro")]
    pub roster_a: Vec<String>,
    #[serde(rename = "equipo_rojo")]
    pub roster_b: Vec<String>,
    #[serde(
        rename = "jugadores_confirmados",
        skip_serializing_if = "Option::is_none"
    )]
    pub confirmed_players: Option<Vec<String>>,
    #[serde(rename = "resultado", skip_serializing_if = "Option::is_none")]
    pub score: Option<Score>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mvp: Option<String>,
    #[serde(rename = "asistencia", skip_serializing_if = "Option::is_none")]
    pub attendance: Option<u32>,
    #[serde(rename = "goleadores")]
    pub scorers: Vec<Scorer>,
    #[serde(rename = "estado", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "timestamp", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl MatchRecord {
    pub fn is_cancelled(&self) -> bool {
        matches!(self.score, Some(Score { team_a: 0, team_b: 0 }))
            && self.mvp.as_deref() == Some(CANCELLED_MARKER)
    }

    fn duplicate_key(&self) -> DuplicateKey {
        DuplicateKey::new(
            &self.date,
            &self.time,
            &self.field,
            &self.roster_a,
            &self.roster_b,
        )
    }
}

/// Identity used to detect the same match being submitted twice. Rosters are compared
/// as sets since a re-export of the same draw may list players in another order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DuplicateKey {
    date: String,
    time: String,
    field: String,
    roster_a: Vec<String>,
    roster_b: Vec<String>,
}

impl DuplicateKey {
    fn new(date: &str, time: &str, field: &str, roster_a: &[String], roster_b: &[String]) -> Self {
        let mut roster_a = roster_a.to_vec();
        let mut roster_b = roster_b.to_vec();
        roster_a.sort();
        roster_b.sort();
        Self {
            date: date.trim().to_string(),
            time: time.trim().to_string(),
            field: field.trim().to_string(),
            roster_a,
            roster_b,
        }
    }
}

/// A result as submitted from the form, before it has an id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordDraft {
    pub date: String,
    pub time: String,
    pub field: String,
    pub roster_a: Vec<String>,
    pub roster_b: Vec<String>,
    pub confirmed_players: Option<Vec<String>>,
    pub score: Score,
    pub mvp: Option<String>,
    pub attendance: Option<u32>,
    pub scorers: Vec<Scorer>,
}

/// Fields to overwrite on an existing record; `None` leaves the field untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordPatch {
    pub date: Option<String>,
    pub time: Option<String>,
    pub field: Option<String>,
    pub score: Option<Score>,
    pub mvp: Option<Option<String>>,
    pub attendance: Option<Option<u32>>,
    pub scorers: Option<Vec<Scorer>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    pub id: i64,
    pub replaced: Option<i64>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HistoryError {
    #[error("match date is required")]
    MissingDate,

    #[error("a result for {date} {time} on {field} with the same teams already exists")]
    Duplicate {
        existing_id: i64,
        date: String,
        time: String,
        field: String,
    },

    #[error("no match with id {0}")]
    NotFound(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Adopt whichever collection is longer.
    Length,
    /// Union by id, newer `updated_at` wins.
    ById,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistorySource {
    Remote,
    Local,
    Merged,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryStore {
    records: Vec<MatchRecord>,
}

impl HistoryStore {
    pub fn new(records: Vec<MatchRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[MatchRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<MatchRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&MatchRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Combine the served collection with the locally cached one.
    pub fn reconcile(
        remote: Vec<MatchRecord>,
        local: Option<Vec<MatchRecord>>,
        strategy: MergeStrategy,
    ) -> (Self, HistorySource) {
        let Some(local) = local else {
            return (Self::new(remote), HistorySource::Remote);
        };
        match strategy {
            MergeStrategy::Length => {
                if local.len() > remote.len() {
                    (Self::new(local), HistorySource::Local)
                } else {
                    (Self::new(remote), HistorySource::Remote)
                }
            }
            MergeStrategy::ById => (Self::new(merge_by_id(remote, local)), HistorySource::Merged),
        }
    }

    pub fn find_duplicate(&self, draft: &RecordDraft) -> Option<&MatchRecord> {
        let key = DuplicateKey::new(
            &draft.date,
            &draft.time,
            &draft.field,
            &draft.roster_a,
            &draft.roster_b,
        );
        self.records.iter().find(|r| r.duplicate_key() == key)
    }

    /// Insert a new result. An equivalent record blocks the insert unless
    /// `override_duplicate` is set, in which case the record sharing its date is replaced.
    pub fn add<R: Rng>(
        &mut self,
        draft: RecordDraft,
        override_duplicate: bool,
        now_ms: i64,
        rng: &mut R,
    ) -> Result<AddOutcome, HistoryError> {
        if draft.date.trim().is_empty() {
            return Err(HistoryError::MissingDate);
        }
        if let Some(existing) = self.find_duplicate(&draft)
            && !override_duplicate
        {
            return Err(HistoryError::Duplicate {
                existing_id: existing.id,
                date: existing.date.clone(),
                time: existing.time.clone(),
                field: existing.field.clone(),
            });
        }

        let id = self.next_id(now_ms, rng);
        let date = draft.date.trim().to_string();
        let record = MatchRecord {
            id,
            formatted_date: format_date(&date),
            date,
            time: draft.time,
            field: draft.field,
            roster_a: draft.roster_a,
            roster_b: draft.roster_b,
            confirmed_players: draft.confirmed_players,
            score: Some(draft.score),
            mvp: draft.mvp.filter(|m| !m.trim().is_empty()),
            attendance: draft.attendance,
            scorers: draft.scorers.into_iter().filter(|s| s.goals > 0).collect(),
            status: Some("finalizado".to_string()),
            updated_at: None,
        };

        let same_date = override_duplicate
            .then(|| self.records.iter().position(|r| r.date == record.date))
            .flatten();
        match same_date {
            Some(idx) => {
                let replaced = self.records[idx].id;
                self.records[idx] = record;
                Ok(AddOutcome {
                    id,
                    replaced: Some(replaced),
                })
            }
            None => {
                self.records.push(record);
                Ok(AddOutcome { id, replaced: None })
            }
        }
    }

    pub fn edit(&mut self, id: i64, patch: RecordPatch) -> Result<&MatchRecord, HistoryError> {
        if patch.date.as_deref().is_some_and(|d| d.trim().is_empty()) {
            return Err(HistoryError::MissingDate);
        }
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(HistoryError::NotFound(id))?;

        if let Some(date) = patch.date {
            let date = date.trim().to_string();
            record.formatted_date = format_date(&date);
            record.date = date;
        }
        if let Some(time) = patch.time {
            record.time = time;
        }
        if let Some(field) = patch.field {
            record.field = field;
        }
        if let Some(score) = patch.score {
            record.score = Some(score);
        }
        if let Some(mvp) = patch.mvp {
            record.mvp = mvp.filter(|m| !m.trim().is_empty());
        }
        if let Some(attendance) = patch.attendance {
            record.attendance = attendance;
        }
        if let Some(scorers) = patch.scorers {
            record.scorers = scorers.into_iter().filter(|s| s.goals > 0).collect();
        }
        Ok(record)
    }

    pub fn remove(&mut self, id: i64) -> Result<MatchRecord, HistoryError> {
        let idx = self
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or(HistoryError::NotFound(id))?;
        Ok(self.records.remove(idx))
    }

    /// Newest date first; records sharing a date keep their stored order.
    pub fn sorted_for_display(&self) -> Vec<&MatchRecord> {
        let mut out: Vec<&MatchRecord> = self.records.iter().collect();
        out.sort_by(|a, b| b.date.cmp(&a.date));
        out
    }

    fn next_id<R: Rng>(&self, now_ms: i64, rng: &mut R) -> i64 {
        let taken: HashSet<i64> = self.records.iter().map(|r| r.id).collect();
        let base = now_ms.saturating_mul(1000);
        loop {
            let candidate = base.saturating_add(rng.gen_range(0..1000));
            if !taken.contains(&candidate) {
                return candidate;
            }
        }
    }
}

fn merge_by_id(remote: Vec<MatchRecord>, local: Vec<MatchRecord>) -> Vec<MatchRecord> {
    let mut out = remote;
    let mut index: HashMap<i64, usize> = out.iter().enumerate().map(|(i, r)| (r.id, i)).collect();
    for record in local {
        match index.get(&record.id) {
            Some(&idx) => {
                let local_newer = match (&record.updated_at, &out[idx].updated_at) {
                    (Some(l), Some(r)) => l > r,
                    (Some(_), None) => true,
                    _ => false,
                };
                if local_newer {
                    out[idx] = record;
                }
            }
            None => {
                index.insert(record.id, out.len());
                out.push(record);
            }
        }
    }
    out
}

/// Collapse records describing the same match, keeping the most recently stamped copy.
/// Returns the cleaned list (newest date first) and how many entries were dropped.
pub fn dedupe(records: Vec<MatchRecord>) -> (Vec<MatchRecord>, usize) {
    let mut slots: HashMap<DuplicateKey, usize> = HashMap::new();
    let mut kept: Vec<MatchRecord> = Vec::new();
    let mut removed = 0usize;
    for record in records {
        let key = record.duplicate_key();
        match slots.get(&key) {
            Some(&idx) => {
                removed += 1;
                let newer = record.updated_at.as_deref().unwrap_or("")
                    > kept[idx].updated_at.as_deref().unwrap_or("");
                if newer {
                    kept[idx] = record;
                }
            }
            None => {
                slots.insert(key, kept.len());
                kept.push(record);
            }
        }
    }
    kept.sort_by(|a, b| b.date.cmp(&a.date));
    (kept, removed)
}

/// Same as [`dedupe`] but over the raw JSON entries of a history file, so entries keep
/// every field they carry. Copies sharing an id count as duplicates too. Entries that are
/// not objects are kept untouched.
pub fn dedupe_values(rows: Vec<Value>) -> (Vec<Value>, usize) {
    let mut by_key: HashMap<DuplicateKey, usize> = HashMap::new();
    let mut by_id: HashMap<i64, usize> = HashMap::new();
    let mut kept: Vec<Value> = Vec::new();
    let mut removed = 0usize;
    for row in rows {
        let Some(obj) = row.as_object() else {
            kept.push(row);
            continue;
        };
        let key = value_key(obj);
        let id = obj.get("id").and_then(as_i64);
        let slot = id
            .and_then(|id| by_id.get(&id))
            .or_else(|| by_key.get(&key))
            .copied();
        let idx = match slot {
            Some(idx) => {
                removed += 1;
                if raw_stamp(&row) <= raw_stamp(&kept[idx]) {
                    continue;
                }
                kept[idx] = row;
                idx
            }
            None => {
                kept.push(row);
                kept.len() - 1
            }
        };
        by_key.insert(key, idx);
        if let Some(id) = id {
            by_id.insert(id, idx);
        }
    }
    kept.sort_by_key(|row| std::cmp::Reverse(raw_date(row)));
    (kept, removed)
}

fn value_key(obj: &Map<String, Value>) -> DuplicateKey {
    let text = |name: &str| obj.get(name).and_then(as_text).unwrap_or_default();
    let (roster_a, roster_b) = rosters_of(obj);
    DuplicateKey::new(
        &text("fecha"),
        &text("hora"),
        &text("cancha"),
        &roster_a,
        &roster_b,
    )
}

fn raw_stamp(row: &Value) -> String {
    row.get("timestamp")
        .or_else(|| row.get("updated_at"))
        .and_then(as_text)
        .unwrap_or_default()
}

fn raw_date(row: &Value) -> String {
    row.get("fecha").and_then(as_text).unwrap_or_default()
}

/// Locate the entry list inside a history document: a bare array, or the `historial` /
/// `rows` field of an object.
pub fn history_rows(v: &Value) -> Result<&Vec<Value>> {
    match v {
        Value::Array(rows) => Ok(rows),
        Value::Object(obj) => obj
            .get("historial")
            .or_else(|| obj.get("rows"))
            .and_then(|h| h.as_array())
            .ok_or_else(|| anyhow::anyhow!("history object has no rows")),
        _ => Err(anyhow::anyhow!("history json is not a list")),
    }
}

/// Decode the history resource: a bare array, `{ "historial": [...] }`, or database rows
/// whose nested columns arrive as JSON-encoded strings. Unusable entries are skipped and
/// repeated ids keep their first occurrence.
pub fn parse_history_json(raw: &str) -> Result<Vec<MatchRecord>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let v: Value = serde_json::from_str(trimmed).context("invalid history json")?;
    Ok(records_from_values(history_rows(&v)?))
}

pub fn records_from_values(rows: &[Value]) -> Vec<MatchRecord> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter_map(record_from_value)
        .filter(|r| seen.insert(r.id))
        .collect()
}

pub fn record_from_value(v: &Value) -> Option<MatchRecord> {
    let obj = v.as_object()?;
    let id = obj.get("id").and_then(as_i64)?;
    let date = obj.get("fecha").and_then(as_text)?;
    if date.is_empty() {
        return None;
    }

    let (roster_a, roster_b) = rosters_of(obj);

    let formatted_date = obj
        .get("fecha_formato")
        .and_then(as_text)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| format_date(&date));

    Some(MatchRecord {
        id,
        formatted_date,
        date,
        time: obj.get("hora").and_then(as_text).unwrap_or_default(),
        field: obj.get("cancha").and_then(as_text).unwrap_or_default(),
        roster_a,
        roster_b,
        confirmed_players: obj
            .get("jugadores_confirmados")
            .and_then(decode_nested)
            .filter(|v| v.is_array())
            .map(|v| string_list(&v)),
        score: obj
            .get("resultado")
            .and_then(decode_nested)
            .and_then(|v| score_from_value(&v)),
        mvp: obj
            .get("mvp")
            .and_then(as_text)
            .filter(|s| !s.is_empty()),
        attendance: obj
            .get("asistencia")
            .and_then(as_i64)
            .and_then(|n| u32::try_from(n).ok()),
        scorers: obj
            .get("goleadores")
            .and_then(decode_nested)
            .map(|v| scorers_from_value(&v))
            .unwrap_or_default(),
        status: obj.get("estado").and_then(as_text),
        updated_at: obj
            .get("timestamp")
            .or_else(|| obj.get("updated_at"))
            .and_then(as_text),
    })
}

/// Rosters from `equipo_negro` / `equipo_rojo`, or from the `equipos` column of a
/// database row.
fn rosters_of(obj: &Map<String, Value>) -> (Vec<String>, Vec<String>) {
    let teams = obj.get("equipos").and_then(decode_nested);
    let roster = |flat: &str, nested: &str| -> Vec<String> {
        obj.get(flat)
            .and_then(decode_nested)
            .or_else(|| teams.as_ref().and_then(|t| t.get(nested)).cloned())
            .map(|v| string_list(&v))
            .unwrap_or_default()
    };
    (roster("equipo_negro", "negro"), roster("equipo_rojo", "rojo"))
}

/// Nested columns may be stored either as JSON or as a string holding JSON.
fn decode_nested(v: &Value) -> Option<Value> {
    match v {
        Value::Null => None,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            serde_json::from_str::<Value>(s).ok()
        }
        other => Some(other.clone()),
    }
}

fn score_from_value(v: &Value) -> Option<Score> {
    let team_a = v.get("negro").and_then(as_i64)?;
    let team_b = v.get("rojo").and_then(as_i64)?;
    Some(Score {
        team_a: u32::try_from(team_a).ok()?,
        team_b: u32::try_from(team_b).ok()?,
    })
}

fn scorers_from_value(v: &Value) -> Vec<Scorer> {
    let Some(arr) = v.as_array() else {
        return Vec::new();
    };
    arr.iter()
        .filter_map(|item| {
            let player = item.get("jugador").and_then(as_text)?;
            let goals = item.get("goles").and_then(as_i64)?;
            let goals = u32::try_from(goals).ok().filter(|g| *g > 0)?;
            if player.is_empty() {
                return None;
            }
            Some(Scorer { player, goals })
        })
        .collect()
}

fn string_list(v: &Value) -> Vec<String> {
    v.as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(as_text)
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn as_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}
