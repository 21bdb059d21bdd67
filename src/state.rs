use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const UNKNOWN_TEAM: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(pub String);

impl TeamId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
}

/// Full-time score. A missing side means the match has not been played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreLine {
    pub home: Option<u32>,
    pub away: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredictionResult {
    HomeWin,
    Draw,
    AwayWin,
}

impl PredictionResult {
    /// Index space shared by confidence vectors and the predict endpoint.
    pub const ORDER: [PredictionResult; 3] = [
        PredictionResult::HomeWin,
        PredictionResult::Draw,
        PredictionResult::AwayWin,
    ];

    pub fn index(self) -> usize {
        match self {
            PredictionResult::HomeWin => 0,
            PredictionResult::Draw => 1,
            PredictionResult::AwayWin => 2,
        }
    }

    pub fn from_index(idx: u64) -> Option<Self> {
        usize::try_from(idx)
            .ok()
            .and_then(|i| Self::ORDER.get(i).copied())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub result: Option<PredictionResult>,
    // Aligned to PredictionResult::ORDER.
    pub confidence: Option<[f64; 3]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    pub id: Option<String>,
    pub utc_date: Option<DateTime<Utc>>,
    pub home_name: String,
    pub away_name: String,
    pub score: Option<ScoreLine>,
    pub prediction: Option<Prediction>,
}

impl Fixture {
    pub fn is_past(&self) -> bool {
        self.score.is_some()
    }
}

/// `matchday_number == None` means the snapshot could not be loaded.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchdaySnapshotData {
    pub matchday_number: Option<u32>,
    pub fixtures: Vec<Fixture>,
}

impl MatchdaySnapshotData {
    pub fn unavailable() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Next,
    Last,
}

impl Direction {
    pub fn path_segment(self) -> &'static str {
        match self {
            Direction::Next => "next",
            Direction::Last => "last",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
    Unavailable,
}
