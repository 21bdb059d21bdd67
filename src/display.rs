use chrono::{DateTime, Datelike, Utc};

use crate::labeler::{confidence_percent, label};
use crate::state::{Fixture, LoadState, MatchdaySnapshotData, Prediction, ScoreLine};

pub const SCORE_PLACEHOLDER: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureCard {
    pub home: String,
    pub away: String,
    pub prediction: String,
    pub confidence: Option<String>,
    pub score: Option<String>,
    pub date: String,
}

impl FixtureCard {
    pub fn from_fixture(fixture: &Fixture) -> Self {
        let (prediction, confidence) = prediction_text(
            fixture.prediction.as_ref(),
            &fixture.home_name,
            &fixture.away_name,
        );
        Self {
            home: fixture.home_name.clone(),
            away: fixture.away_name.clone(),
            prediction,
            confidence,
            score: fixture.score.map(score_text),
            date: date_text(fixture.utc_date),
        }
    }
}

pub fn cards(fixtures: &[Fixture]) -> Vec<FixtureCard> {
    fixtures.iter().map(FixtureCard::from_fixture).collect()
}

pub fn prediction_text(
    prediction: Option<&Prediction>,
    home: &str,
    away: &str,
) -> (String, Option<String>) {
    match prediction {
        Some(p) => (label(p.result, home, away), confidence_percent(p)),
        None => (label(None, home, away), None),
    }
}

pub fn score_text(score: ScoreLine) -> String {
    let side = |v: Option<u32>| v.map_or_else(|| SCORE_PLACEHOLDER.to_string(), |n| n.to_string());
    format!("{} – {}", side(score.home), side(score.away))
}

pub fn unplayed_score_text() -> String {
    score_text(ScoreLine::default())
}

pub fn date_text(utc: Option<DateTime<Utc>>) -> String {
    utc.map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "TBD".to_string())
}

/// `25th May` style date used on matchday headers.
pub fn nice_date(utc: DateTime<Utc>) -> String {
    let day = utc.day();
    let suffix = if (11..=13).contains(&day) {
        "th"
    } else {
        match day % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        }
    };
    format!("{day}{suffix} {}", utc.format("%B"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixturePanel {
    Next,
    Last,
}

pub fn fixture_panel_message(
    panel: FixturePanel,
    team_selected: bool,
    state: LoadState,
    is_empty: bool,
) -> Option<&'static str> {
    if !team_selected {
        return Some(match panel {
            FixturePanel::Next => "Select a team to view upcoming fixtures.",
            FixturePanel::Last => "Select a team to view recent results.",
        });
    }
    match state {
        LoadState::Idle | LoadState::Loading => Some("Loading..."),
        LoadState::Unavailable => Some(match panel {
            FixturePanel::Next => "Upcoming fixtures are unavailable right now.",
            FixturePanel::Last => "Recent results are unavailable right now.",
        }),
        LoadState::Ready if is_empty => Some(match panel {
            FixturePanel::Next => "No upcoming matches scheduled.",
            FixturePanel::Last => "No recent matches found.",
        }),
        LoadState::Ready => None,
    }
}

pub fn matchday_title(snapshot: &MatchdaySnapshotData) -> String {
    match snapshot.matchday_number {
        Some(n) => format!("Latest Matchday {n}"),
        None => "Latest Matchday".to_string(),
    }
}

/// A failed snapshot and a loaded-but-empty matchday read differently.
pub fn matchday_message(state: LoadState, snapshot: &MatchdaySnapshotData) -> Option<&'static str> {
    match state {
        LoadState::Idle | LoadState::Loading => Some("Loading..."),
        LoadState::Unavailable => Some("Matchday data unavailable."),
        LoadState::Ready if snapshot.matchday_number.is_none() => {
            Some("Matchday data unavailable.")
        }
        LoadState::Ready if snapshot.fixtures.is_empty() => {
            Some("No fixtures played in this matchday yet.")
        }
        LoadState::Ready => None,
    }
}
