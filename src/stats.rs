use std::collections::HashMap;

use crate::history::MatchRecord;

pub const TOP_SCORERS_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchStats {
    pub total: usize,
    pub wins_a: usize,
    pub wins_b: usize,
    pub draws: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScorerTotal {
    pub player: String,
    pub goals: u32,
}

/// A record counts toward statistics when it has a score and was not cancelled.
pub fn is_qualifying(record: &MatchRecord) -> bool {
    record.score.is_some() && !record.is_cancelled()
}

pub fn summarize(records: &[MatchRecord]) -> MatchStats {
    let mut stats = MatchStats::default();
    for score in records
        .iter()
        .filter(|r| is_qualifying(r))
        .filter_map(|r| r.score)
    {
        stats.total += 1;
        match score.team_a.cmp(&score.team_b) {
            std::cmp::Ordering::Greater => stats.wins_a += 1,
            std::cmp::Ordering::Less => stats.wins_b += 1,
            std::cmp::Ordering::Equal => stats.draws += 1,
        }
    }
    stats
}

/// Goals per player across qualifying records, highest first. Equal totals keep the
/// order in which the players first scored.
pub fn top_scorers(records: &[MatchRecord], limit: usize) -> Vec<ScorerTotal> {
    let mut order: Vec<String> = Vec::new();
    let mut totals: HashMap<String, u32> = HashMap::new();
    for scorer in records
        .iter()
        .filter(|r| is_qualifying(r))
        .flat_map(|r| r.scorers.iter())
    {
        let name = scorer.player.trim();
        if name.is_empty() || scorer.goals == 0 {
            continue;
        }
        match totals.get_mut(name) {
            Some(total) => *total += scorer.goals,
            None => {
                order.push(name.to_string());
                totals.insert(name.to_string(), scorer.goals);
            }
        }
    }

    let mut rows: Vec<ScorerTotal> = order
        .into_iter()
        .map(|player| {
            let goals = totals.get(&player).copied().unwrap_or(0);
            ScorerTotal { player, goals }
        })
        .collect();
    rows.sort_by(|a, b| b.goals.cmp(&a.goals));
    rows.truncate(limit);
    rows
}
