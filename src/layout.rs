//! Roster → pitch placement.
//!
//! Players are bucketed by role into vertical lines. Each line sits at a fixed distance
//! from the side's own goal line; within a line players are spread evenly between the
//! top and bottom margins. The right-hand side uses the same numbers measured from the
//! right edge, with the vertical order mirrored so that "left" lanes face the same way
//! relative to each team's attacking direction.

use std::collections::BTreeMap;

use crate::match_data::{Lane, MatchInfo, PositionTag, RoleTag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

/// Percentages on the pitch. `horizontal` is measured from the side's own goal line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchCoordinate {
    pub horizontal: f32,
    pub vertical: f32,
    pub side: Side,
}

impl PitchCoordinate {
    /// Horizontal position measured from the left edge of the pitch.
    pub fn absolute_horizontal(&self) -> f32 {
        match self.side {
            Side::Left => self.horizontal,
            Side::Right => 100.0 - self.horizontal,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedPlayer {
    pub name: String,
    pub role: RoleTag,
    pub lane: Lane,
    pub coord: PitchCoordinate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub top_margin: f32,
    pub bottom_margin: f32,
    pub goalkeeper_line: f32,
    pub defense_line: f32,
    pub unspecified_line: f32,
    pub midfield_line: f32,
    pub attack_line: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            top_margin: 10.0,
            bottom_margin: 80.0,
            goalkeeper_line: 2.0,
            defense_line: 13.0,
            unspecified_line: 20.0,
            midfield_line: 26.0,
            attack_line: 38.0,
        }
    }
}

impl LayoutConfig {
    pub fn line_for(&self, role: RoleTag) -> f32 {
        match role {
            RoleTag::Goalkeeper => self.goalkeeper_line,
            RoleTag::Defender => self.defense_line,
            RoleTag::Midfielder => self.midfield_line,
            RoleTag::Forward => self.attack_line,
            RoleTag::Unspecified => self.unspecified_line,
        }
    }

    /// Vertical position of slot `index` in a line of `count` players.
    pub fn vertical_slot(&self, index: usize, count: usize) -> f32 {
        if count <= 1 {
            return (self.top_margin + self.bottom_margin) / 2.0;
        }
        let span = self.bottom_margin - self.top_margin;
        self.top_margin + span * index as f32 / (count - 1) as f32
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchLayout {
    pub left: Vec<PlacedPlayer>,
    pub right: Vec<PlacedPlayer>,
}

const BUCKET_ORDER: [RoleTag; 5] = [
    RoleTag::Goalkeeper,
    RoleTag::Defender,
    RoleTag::Midfielder,
    RoleTag::Forward,
    RoleTag::Unspecified,
];

/// Place team A on the left and team B on the right.
pub fn layout_match(info: &MatchInfo, config: &LayoutConfig) -> MatchLayout {
    MatchLayout {
        left: layout_side(&info.team_a, &info.positions_a, Side::Left, config),
        right: layout_side(&info.team_b, &info.positions_b, Side::Right, config),
    }
}

/// Place one roster. The result is in roster order, one entry per player.
pub fn layout_side(
    roster: &[String],
    positions: &BTreeMap<String, PositionTag>,
    side: Side,
    config: &LayoutConfig,
) -> Vec<PlacedPlayer> {
    let tags: Vec<PositionTag> = roster
        .iter()
        .map(|name| {
            positions
                .get(name)
                .copied()
                .unwrap_or(PositionTag::UNSPECIFIED)
        })
        .collect();

    let mut placed: Vec<Option<PlacedPlayer>> = vec![None; roster.len()];
    for role in BUCKET_ORDER {
        let mut members: Vec<usize> = (0..roster.len())
            .filter(|&idx| tags[idx].role == role)
            .collect();
        if members.is_empty() {
            continue;
        }

        let forced_pair =
            members.len() == 2 && matches!(role, RoleTag::Defender | RoleTag::Midfielder);
        if forced_pair {
            // sort_by_key is stable, so equal hints keep roster order
            members.sort_by_key(|&idx| lane_rank(tags[idx].lane));
        }

        let count = members.len();
        for (slot, &idx) in members.iter().enumerate() {
            let lane = if forced_pair {
                if slot == 0 { Lane::Left } else { Lane::Right }
            } else {
                tags[idx].lane.unwrap_or(Lane::Center)
            };
            let mut vertical = config.vertical_slot(slot, count);
            if side == Side::Right {
                vertical = config.top_margin + config.bottom_margin - vertical;
            }
            placed[idx] = Some(PlacedPlayer {
                name: roster[idx].clone(),
                role,
                lane,
                coord: PitchCoordinate {
                    horizontal: config.line_for(role),
                    vertical,
                    side,
                },
            });
        }
    }

    placed.into_iter().flatten().collect()
}

/// Map a coordinate onto a `width`×`height` character grid for a label of `label_width`
/// cells, keeping the label inside the grid.
pub fn to_cell(
    coord: &PitchCoordinate,
    width: u16,
    height: u16,
    label_width: u16,
) -> (u16, u16) {
    if width == 0 || height == 0 {
        return (0, 0);
    }
    let max_x = width.saturating_sub(label_width.max(1));
    let max_y = height - 1;
    let raw_x = coord.absolute_horizontal() / 100.0 * f32::from(width);
    let x = match coord.side {
        Side::Left => raw_x,
        Side::Right => raw_x - f32::from(label_width),
    };
    let y = coord.vertical / 100.0 * f32::from(height);
    let x = (x.max(0.0).round() as u16).min(max_x);
    let y = (y.max(0.0).round() as u16).min(max_y);
    (x, y)
}

fn lane_rank(lane: Option<Lane>) -> u8 {
    match lane {
        Some(Lane::Left) => 0,
        Some(Lane::Center) | None => 1,
        Some(Lane::Right) => 2,
    }
}
