use thiserror::Error;

use crate::history::{MatchRecord, RecordDraft, RecordPatch, Score, Scorer};
use crate::match_data::{MatchInfo, UNCONFIRMED};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Date,
    Time,
    Field,
    ScoreA,
    ScoreB,
    Mvp,
    Attendance,
    Scorers,
}

impl FormField {
    pub const ALL: [FormField; 8] = [
        FormField::Date,
        FormField::Time,
        FormField::Field,
        FormField::ScoreA,
        FormField::ScoreB,
        FormField::Mvp,
        FormField::Attendance,
        FormField::Scorers,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::Date => "Date (YYYY-MM-DD)",
            FormField::Time => "Time",
            FormField::Field => "Field",
            FormField::ScoreA => "Black goals",
            FormField::ScoreB => "Red goals",
            FormField::Mvp => "MVP",
            FormField::Attendance => "Attendance",
            FormField::Scorers => "Scorers (Name:2, Other:1)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Add,
    Edit { id: i64 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("date is required")]
    MissingDate,

    #[error("{field} is required")]
    MissingScore { field: &'static str },

    #[error("{field} must be a whole number, got {value:?}")]
    NotANumber { field: &'static str, value: String },

    #[error("{field} cannot be negative")]
    Negative { field: &'static str },

    #[error("malformed scorer entry {0:?} (expected Name:goals)")]
    MalformedScorer(String),
}

/// Text state of the add/edit result overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultForm {
    pub mode: FormMode,
    pub focus: usize,
    pub values: [String; 8],
    pub error: Option<String>,
}

impl ResultForm {
    /// Blank form for a new result, prefilled with today's date and the current match's
    /// time and field when they are known.
    pub fn for_add(today: &str, info: &MatchInfo) -> Self {
        let known = |v: &str| {
            if v.eq_ignore_ascii_case(UNCONFIRMED) {
                String::new()
            } else {
                v.to_string()
            }
        };
        let mut values: [String; 8] = Default::default();
        values[0] = today.to_string();
        values[1] = known(&info.time);
        values[2] = known(&info.field);
        Self {
            mode: FormMode::Add,
            focus: 0,
            values,
            error: None,
        }
    }

    pub fn for_edit(record: &MatchRecord) -> Self {
        let (a, b) = record
            .score
            .map(|s| (s.team_a.to_string(), s.team_b.to_string()))
            .unwrap_or_default();
        let values = [
            record.date.clone(),
            record.time.clone(),
            record.field.clone(),
            a,
            b,
            record.mvp.clone().unwrap_or_default(),
            record
                .attendance
                .map(|n| n.to_string())
                .unwrap_or_default(),
            format_scorers(&record.scorers),
        ];
        Self {
            mode: FormMode::Edit { id: record.id },
            focus: 0,
            values,
            error: None,
        }
    }

    pub fn focused(&self) -> FormField {
        FormField::ALL[self.focus]
    }

    pub fn value(&self, field: FormField) -> &str {
        &self.values[field_index(field)]
    }

    pub fn set(&mut self, field: FormField, value: &str) {
        self.values[field_index(field)] = value.to_string();
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % FormField::ALL.len();
    }

    pub fn prev_field(&mut self) {
        self.focus = (self.focus + FormField::ALL.len() - 1) % FormField::ALL.len();
    }

    pub fn push_char(&mut self, c: char) {
        self.values[self.focus].push(c);
        self.error = None;
    }

    pub fn backspace(&mut self) {
        self.values[self.focus].pop();
        self.error = None;
    }

    /// Build a draft for a new record. Rosters come from the match currently on screen.
    pub fn to_draft(&self, info: &MatchInfo) -> Result<RecordDraft, FormError> {
        let date = self.required_date()?;
        Ok(RecordDraft {
            date,
            time: self.value(FormField::Time).trim().to_string(),
            field: self.value(FormField::Field).trim().to_string(),
            roster_a: info.team_a.clone(),
            roster_b: info.team_b.clone(),
            confirmed_players: None,
            score: self.score()?,
            mvp: optional_text(self.value(FormField::Mvp)),
            attendance: self.attendance()?,
            scorers: parse_scorers(self.value(FormField::Scorers))?,
        })
    }

    /// Every visible field is written back on edit.
    pub fn to_patch(&self) -> Result<RecordPatch, FormError> {
        Ok(RecordPatch {
            date: Some(self.required_date()?),
            time: Some(self.value(FormField::Time).trim().to_string()),
            field: Some(self.value(FormField::Field).trim().to_string()),
            score: Some(self.score()?),
            mvp: Some(optional_text(self.value(FormField::Mvp))),
            attendance: Some(self.attendance()?),
            scorers: Some(parse_scorers(self.value(FormField::Scorers))?),
        })
    }

    fn required_date(&self) -> Result<String, FormError> {
        let date = self.value(FormField::Date).trim();
        if date.is_empty() {
            return Err(FormError::MissingDate);
        }
        Ok(date.to_string())
    }

    fn score(&self) -> Result<Score, FormError> {
        Ok(Score {
            team_a: required_count("black goals", self.value(FormField::ScoreA))?,
            team_b: required_count("red goals", self.value(FormField::ScoreB))?,
        })
    }

    fn attendance(&self) -> Result<Option<u32>, FormError> {
        parse_count("attendance", self.value(FormField::Attendance))
    }
}

/// Parse `"Ana:2, Bea:1"`. A bare name counts as one goal.
pub fn parse_scorers(raw: &str) -> Result<Vec<Scorer>, FormError> {
    let mut out = Vec::new();
    for entry in raw.split([',', ';']).map(str::trim).filter(|e| !e.is_empty()) {
        let (name, goals) = match entry.rsplit_once(':') {
            Some((name, goals)) => {
                let goals = goals
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| FormError::MalformedScorer(entry.to_string()))?;
                (name.trim(), goals)
            }
            None => (entry, 1),
        };
        if name.is_empty() || goals == 0 {
            return Err(FormError::MalformedScorer(entry.to_string()));
        }
        out.push(Scorer {
            player: name.to_string(),
            goals,
        });
    }
    Ok(out)
}

pub fn format_scorers(scorers: &[Scorer]) -> String {
    scorers
        .iter()
        .map(|s| format!("{}:{}", s.player, s.goals))
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_count(field: &'static str, raw: &str) -> Result<Option<u32>, FormError> {
    let cleaned = raw.trim();
    if cleaned.is_empty() {
        return Ok(None);
    }
    match cleaned.parse::<i64>() {
        Ok(n) if n < 0 => Err(FormError::Negative { field }),
        Ok(n) => u32::try_from(n).map(Some).map_err(|_| FormError::NotANumber {
            field,
            value: cleaned.to_string(),
        }),
        Err(_) => Err(FormError::NotANumber {
            field,
            value: cleaned.to_string(),
        }),
    }
}

/// Blank goal counts are rejected rather than read as 0.
fn required_count(field: &'static str, raw: &str) -> Result<u32, FormError> {
    parse_count(field, raw)?.ok_or(FormError::MissingScore { field })
}

fn optional_text(raw: &str) -> Option<String> {
    let cleaned = raw.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

fn field_index(field: FormField) -> usize {
    FormField::ALL
        .iter()
        .position(|f| *f == field)
        .unwrap_or(0)
}
