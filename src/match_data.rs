use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde_json::Value;

/// Placeholder shown for any match detail that has not been fixed yet.
pub const UNCONFIRMED: &str = "unconfirmed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoleTag {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
    Unspecified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Lane {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PositionTag {
    pub role: RoleTag,
    pub lane: Option<Lane>,
}

impl PositionTag {
    pub const UNSPECIFIED: PositionTag = PositionTag {
        role: RoleTag::Unspecified,
        lane: None,
    };

    pub fn new(role: RoleTag, lane: Option<Lane>) -> Self {
        Self { role, lane }
    }

    /// Parse a position tag as written in the roster file.
    ///
    /// Understands `Arquero`, `Defensa-Izq`, `Mediocampo-Centro`, `Delantero-Der`,
    /// English words (`defender-left`) and short codes (`GK`, `LCB`, `CM`, `ST`).
    pub fn parse(raw: &str) -> Self {
        let cleaned = raw.trim();
        if cleaned.is_empty() {
            return Self::UNSPECIFIED;
        }
        if let Some(tag) = parse_code(cleaned) {
            return tag;
        }

        let mut parts = cleaned.split(['-', '_', ' ']).filter(|p| !p.is_empty());
        let role = parts.next().map(parse_role).unwrap_or(RoleTag::Unspecified);
        let lane = parts.next().and_then(parse_lane);
        if role == RoleTag::Unspecified {
            return Self::UNSPECIFIED;
        }
        Self { role, lane }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchInfo {
    pub date: String,
    pub time: String,
    pub field: String,
    pub team_a: Vec<String>,
    pub team_b: Vec<String>,
    pub positions_a: BTreeMap<String, PositionTag>,
    pub positions_b: BTreeMap<String, PositionTag>,
}

impl Default for MatchInfo {
    fn default() -> Self {
        Self {
            date: UNCONFIRMED.to_string(),
            time: UNCONFIRMED.to_string(),
            field: UNCONFIRMED.to_string(),
            team_a: Vec::new(),
            team_b: Vec::new(),
            positions_a: BTreeMap::new(),
            positions_b: BTreeMap::new(),
        }
    }
}

impl MatchInfo {
    pub fn is_empty(&self) -> bool {
        self.team_a.is_empty() && self.team_b.is_empty()
    }
}

/// Decode the current-match document (`fecha`, `hora`, `cancha`, `negro`, `rojo`,
/// `negro_posiciones`, `rojo_posiciones`). Missing scalars fall back to [`UNCONFIRMED`].
pub fn parse_match_json(raw: &str) -> Result<MatchInfo> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(MatchInfo::default());
    }
    let v: Value = serde_json::from_str(trimmed).context("invalid match json")?;
    if !v.is_object() {
        return Err(anyhow::anyhow!("match json is not an object"));
    }

    Ok(MatchInfo {
        date: scalar_or_unconfirmed(v.get("fecha")),
        time: scalar_or_unconfirmed(v.get("hora")),
        field: scalar_or_unconfirmed(v.get("cancha")),
        team_a: name_list(v.get("negro")),
        team_b: name_list(v.get("rojo")),
        positions_a: position_map(v.get("negro_posiciones")),
        positions_b: position_map(v.get("rojo_posiciones")),
    })
}

fn scalar_or_unconfirmed(value: Option<&Value>) -> String {
    let text = match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };
    if text.is_empty() {
        UNCONFIRMED.to_string()
    } else {
        text
    }
}

fn name_list(value: Option<&Value>) -> Vec<String> {
    let Some(arr) = value.and_then(|v| v.as_array()) else {
        return Vec::new();
    };
    arr.iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.trim().to_string()),
            // Some draws store `{ "nombre": "...", ... }` objects instead of bare names.
            Value::Object(obj) => obj
                .get("nombre")
                .or_else(|| obj.get("name"))
                .and_then(|n| n.as_str())
                .map(|s| s.trim().to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect()
}

fn position_map(value: Option<&Value>) -> BTreeMap<String, PositionTag> {
    let Some(obj) = value.and_then(|v| v.as_object()) else {
        return BTreeMap::new();
    };
    obj.iter()
        .filter_map(|(name, tag)| {
            let tag = tag.as_str()?;
            Some((name.trim().to_string(), PositionTag::parse(tag)))
        })
        .collect()
}

fn parse_role(word: &str) -> RoleTag {
    match word.to_lowercase().as_str() {
        "arquero" | "portero" | "goalkeeper" | "keeper" | "goalie" => RoleTag::Goalkeeper,
        "defensa" | "defensor" | "defender" | "defence" | "defense" => RoleTag::Defender,
        "mediocampo" | "mediocampista" | "medio" | "midfielder" | "midfield" => {
            RoleTag::Midfielder
        }
        "delantero" | "atacante" | "forward" | "attacker" | "striker" => RoleTag::Forward,
        _ => RoleTag::Unspecified,
    }
}

fn parse_lane(word: &str) -> Option<Lane> {
    match word.to_lowercase().as_str() {
        "izq" | "izquierdo" | "izquierda" | "left" | "l" => Some(Lane::Left),
        "centro" | "central" | "center" | "centre" | "c" => Some(Lane::Center),
        "der" | "derecho" | "derecha" | "right" | "r" => Some(Lane::Right),
        _ => None,
    }
}

fn parse_code(raw: &str) -> Option<PositionTag> {
    let tag = match raw.to_ascii_uppercase().as_str() {
        "GK" | "POR" => PositionTag::new(RoleTag::Goalkeeper, None),
        "LB" | "LCB" => PositionTag::new(RoleTag::Defender, Some(Lane::Left)),
        "CB" => PositionTag::new(RoleTag::Defender, Some(Lane::Center)),
        "RB" | "RCB" => PositionTag::new(RoleTag::Defender, Some(Lane::Right)),
        "LM" => PositionTag::new(RoleTag::Midfielder, Some(Lane::Left)),
        "CM" | "DM" | "AM" => PositionTag::new(RoleTag::Midfielder, Some(Lane::Center)),
        "RM" => PositionTag::new(RoleTag::Midfielder, Some(Lane::Right)),
        "LW" => PositionTag::new(RoleTag::Forward, Some(Lane::Left)),
        "CF" | "ST" => PositionTag::new(RoleTag::Forward, Some(Lane::Center)),
        "RW" => PositionTag::new(RoleTag::Forward, Some(Lane::Right)),
        _ => return None,
    };
    Some(tag)
}
