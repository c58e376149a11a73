//! Team draw: split the confirmed players into black and red sides of equal size with
//! close average ratings, give each side a goalkeeper, and tag everyone with a position
//! the pitch layout understands.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;

use crate::match_data::{PositionTag, RoleTag};

pub const DEFAULT_ATTEMPTS: usize = 2000;
const GOALKEEPER_CODE: &str = "GK";
const FALLBACK_CODE: &str = "CM";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Player {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "puntaje", default)]
    pub rating: f64,
    /// Comma separated codes, best first (`"GK, LCB"`).
    #[serde(rename = "posicion", default)]
    pub positions: String,
    #[serde(rename = "puntajes_posicion", default)]
    pub position_ratings: BTreeMap<String, f64>,
}

impl Player {
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.positions
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    pub fn can_keep_goal(&self) -> bool {
        self.codes()
            .any(|c| PositionTag::parse(c).role == RoleTag::Goalkeeper)
    }

    fn goalkeeping(&self) -> f64 {
        self.position_ratings
            .get(GOALKEEPER_CODE)
            .copied()
            .unwrap_or(self.rating)
    }

    /// First listed outfield code the layout recognises, else the best rated one.
    fn outfield_code(&self) -> String {
        let listed = self.codes().find(|c| {
            let tag = PositionTag::parse(c);
            tag.role != RoleTag::Unspecified && tag.role != RoleTag::Goalkeeper
        });
        if let Some(code) = listed {
            return code.to_string();
        }
        self.position_ratings
            .iter()
            .filter(|(code, _)| {
                let role = PositionTag::parse(code).role;
                role != RoleTag::Unspecified && role != RoleTag::Goalkeeper
            })
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(code, _)| code.clone())
            .unwrap_or_else(|| FALLBACK_CODE.to_string())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DrawError {
    #[error("need an even number of players, got {0}")]
    OddCount(usize),

    #[error("need at least {need} players, got {have}")]
    TooFew { have: usize, need: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawnPlayer {
    pub name: String,
    pub code: String,
    pub rating: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawnTeam {
    /// Goalkeeper first.
    pub players: Vec<DrawnPlayer>,
    /// The player in goal lists GK among their positions.
    pub natural_keeper: bool,
}

impl DrawnTeam {
    pub fn average(&self) -> f64 {
        if self.players.is_empty() {
            return 0.0;
        }
        self.players.iter().map(|p| p.rating).sum::<f64>() / self.players.len() as f64
    }

    pub fn names(&self) -> Vec<String> {
        self.players.iter().map(|p| p.name.clone()).collect()
    }

    pub fn positions(&self) -> BTreeMap<String, String> {
        self.players
            .iter()
            .map(|p| (p.name.clone(), p.code.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Draw {
    pub black: DrawnTeam,
    pub red: DrawnTeam,
}

impl Draw {
    pub fn difference(&self) -> f64 {
        (self.black.average() - self.red.average()).abs()
    }

    fn sides_without_keeper(&self) -> usize {
        usize::from(!self.black.natural_keeper) + usize::from(!self.red.natural_keeper)
    }

    fn better_than(&self, other: &Draw) -> bool {
        match self.sides_without_keeper().cmp(&other.sides_without_keeper()) {
            std::cmp::Ordering::Equal => self.difference() < other.difference(),
            ord => ord.is_lt(),
        }
    }
}

/// Players database: a bare array or `{ "jugadores": [...] }`.
pub fn parse_players_json(raw: &str) -> Result<Vec<Player>> {
    let v: Value = serde_json::from_str(raw).context("invalid players json")?;
    let rows = match v {
        Value::Object(mut obj) => obj
            .remove("jugadores")
            .ok_or_else(|| anyhow::anyhow!("players object has no jugadores"))?,
        other => other,
    };
    serde_json::from_value(rows).context("decode players")
}

/// Confirmed names: a bare array, `{ "jugadores": [...] }`, or a map of
/// `date -> { "jugadores": [...] }` where `date` is used when present and the most
/// recent date otherwise.
pub fn parse_confirmed_json(raw: &str, date: Option<&str>) -> Result<Vec<String>> {
    let v: Value = serde_json::from_str(raw).context("invalid confirmed json")?;
    let list = match &v {
        Value::Array(_) => Some(&v),
        Value::Object(obj) => obj.get("jugadores").or_else(|| {
            let entry = date
                .and_then(|d| obj.get(d))
                .or_else(|| obj.keys().max().and_then(|k| obj.get(k)))?;
            entry.get("jugadores")
        }),
        _ => None,
    };
    let names = list
        .and_then(|l| l.as_array())
        .ok_or_else(|| anyhow::anyhow!("no confirmed player list"))?;
    Ok(names
        .iter()
        .filter_map(|n| n.as_str())
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect())
}

/// Pick the confirmed players out of the database, matching names case-insensitively.
/// Returns the players in confirmation order and the names that were not found.
pub fn select_confirmed(players: &[Player], names: &[String]) -> (Vec<Player>, Vec<String>) {
    let mut found = Vec::new();
    let mut missing = Vec::new();
    for name in names {
        match players.iter().find(|p| p.name.eq_ignore_ascii_case(name)) {
            Some(player) if !found.iter().any(|f: &Player| f.name == player.name) => {
                found.push(player.clone())
            }
            Some(_) => {}
            None => missing.push(name.clone()),
        }
    }
    (found, missing)
}

/// Shuffle-and-split `attempts` times and keep the best split: first the one leaving the
/// fewest sides without a natural goalkeeper, then the smallest gap between average
/// ratings. Each side's best goalkeeper goes first.
pub fn draw_teams<R: Rng>(
    players: &[Player],
    attempts: usize,
    rng: &mut R,
) -> Result<Draw, DrawError> {
    if players.len() < 2 {
        return Err(DrawError::TooFew {
            have: players.len(),
            need: 2,
        });
    }
    if players.len() % 2 != 0 {
        return Err(DrawError::OddCount(players.len()));
    }

    let half = players.len() / 2;
    let mut pool: Vec<&Player> = players.iter().collect();
    let mut split = |rng: &mut R| {
        pool.shuffle(rng);
        Draw {
            black: build_team(&pool[..half]),
            red: build_team(&pool[half..]),
        }
    };
    let mut best = split(rng);
    for _ in 1..attempts {
        if best.sides_without_keeper() == 0 && best.difference() == 0.0 {
            break;
        }
        let draw = split(rng);
        if draw.better_than(&best) {
            best = draw;
        }
    }
    Ok(best)
}

fn build_team(members: &[&Player]) -> DrawnTeam {
    let keeper_idx = members
        .iter()
        .enumerate()
        .filter(|(_, p)| p.can_keep_goal())
        .max_by(|a, b| a.1.goalkeeping().total_cmp(&b.1.goalkeeping()))
        .or_else(|| {
            members
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.goalkeeping().total_cmp(&b.1.goalkeeping()))
        })
        .map(|(idx, _)| idx)
        .unwrap_or(0);

    let natural_keeper = members.get(keeper_idx).is_some_and(|p| p.can_keep_goal());
    let mut players = Vec::with_capacity(members.len());
    if let Some(keeper) = members.get(keeper_idx) {
        players.push(DrawnPlayer {
            name: keeper.name.clone(),
            code: GOALKEEPER_CODE.to_string(),
            rating: keeper.rating,
        });
    }
    for (idx, player) in members.iter().enumerate() {
        if idx == keeper_idx {
            continue;
        }
        players.push(DrawnPlayer {
            name: player.name.clone(),
            code: player.outfield_code(),
            rating: player.rating,
        });
    }
    DrawnTeam {
        players,
        natural_keeper,
    }
}

/// Current-match document as read by [`crate::match_data::parse_match_json`].
pub fn match_document(draw: &Draw, date: &str, time: &str, field: &str) -> Value {
    let round = |x: f64, places: i32| {
        let factor = 10f64.powi(places);
        (x * factor).round() / factor
    };
    json!({
        "fecha": date,
        "hora": time,
        "cancha": field,
        "negro": draw.black.names(),
        "rojo": draw.red.names(),
        "negro_posiciones": draw.black.positions(),
        "rojo_posiciones": draw.red.positions(),
        "promedio_negro": round(draw.black.average(), 2),
        "promedio_rojo": round(draw.red.average(), 2),
        "diferencia": round(draw.difference(), 3),
        "equipos": {
            "negro": draw.black.names(),
            "rojo": draw.red.names(),
        },
    })
}
