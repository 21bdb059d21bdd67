use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::state::{
    Direction, Fixture, MatchdaySnapshotData, Prediction, PredictionResult, ScoreLine, Team,
    TeamId, UNKNOWN_TEAM,
};

pub fn normalize_teams(raw: &Value) -> Vec<Team> {
    let Some(arr) = raw.as_array() else {
        debug!("teams payload is not an array");
        return Vec::new();
    };
    arr.iter().filter_map(parse_team).collect()
}

pub fn normalize_fixtures(raw: &Value) -> Vec<Fixture> {
    let Some(arr) = raw.as_array() else {
        debug!("fixtures payload is not an array");
        return Vec::new();
    };
    arr.iter().filter_map(parse_fixture).collect()
}

// "Last" sequences only ever hold played fixtures.
pub fn normalize_directional(raw: &Value, direction: Direction, page_size: usize) -> Vec<Fixture> {
    let mut fixtures = normalize_fixtures(raw);
    if direction == Direction::Last {
        let before = fixtures.len();
        fixtures.retain(Fixture::is_past);
        if fixtures.len() != before {
            debug!(
                dropped = before - fixtures.len(),
                "dropped unplayed fixtures from last results"
            );
        }
    }
    fixtures.truncate(page_size);
    fixtures
}

pub fn normalize_matchday(raw: &Value) -> MatchdaySnapshotData {
    if !raw.is_object() {
        debug!("matchday payload is not an object");
        return MatchdaySnapshotData::unavailable();
    }
    let matchday_number = raw.get("matchday").and_then(as_u32);
    let fixtures = raw
        .get("fixtures")
        .map(normalize_fixtures)
        .unwrap_or_default();
    MatchdaySnapshotData {
        matchday_number,
        fixtures,
    }
}

pub fn normalize_prediction(raw: &Value) -> Option<Prediction> {
    let obj = raw.as_object()?;
    let result = obj.get("result").and_then(parse_result);
    let confidence = obj.get("confidence").and_then(parse_confidence);
    if result.is_none() && confidence.is_none() {
        return None;
    }
    Some(Prediction { result, confidence })
}

pub fn parse_teams_json(raw: &str) -> Vec<Team> {
    normalize_teams(&parse_value(raw))
}

pub fn parse_fixtures_json(raw: &str) -> Vec<Fixture> {
    normalize_fixtures(&parse_value(raw))
}

pub fn parse_matchday_json(raw: &str) -> MatchdaySnapshotData {
    normalize_matchday(&parse_value(raw))
}

fn parse_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(trimmed).unwrap_or(Value::Null)
}

fn parse_team(v: &Value) -> Option<Team> {
    let id = v.get("id").and_then(as_id)?;
    let name = pick_string(v, &["name", "shortName"]).unwrap_or_else(|| UNKNOWN_TEAM.to_string());
    Some(Team {
        id: TeamId(id),
        name,
    })
}

fn parse_fixture(v: &Value) -> Option<Fixture> {
    if !v.is_object() {
        return None;
    }
    let id = v.get("id").and_then(as_id);
    let utc_date = pick_string(v, &["utcDate", "utc_date", "kickoff"])
        .as_deref()
        .and_then(parse_utc);
    let home_name =
        pick_string(v, &["homeTeam", "home"]).unwrap_or_else(|| UNKNOWN_TEAM.to_string());
    let away_name =
        pick_string(v, &["awayTeam", "away"]).unwrap_or_else(|| UNKNOWN_TEAM.to_string());
    let score = v.get("score").and_then(parse_score);
    let prediction = v.get("prediction").and_then(parse_prediction);

    Some(Fixture {
        id,
        utc_date,
        home_name,
        away_name,
        score,
        prediction,
    })
}

fn parse_score(v: &Value) -> Option<ScoreLine> {
    // Matchday rows nest the result under `fullTime`.
    let line = v.get("fullTime").unwrap_or(v);
    let score = ScoreLine {
        home: line.get("home").and_then(as_u32),
        away: line.get("away").and_then(as_u32),
    };
    if score.home.is_none() && score.away.is_none() {
        return None;
    }
    Some(score)
}

fn parse_prediction(v: &Value) -> Option<Prediction> {
    if !v.is_object() {
        return None;
    }
    Some(Prediction {
        result: v.get("result").and_then(parse_result),
        confidence: v.get("confidence").and_then(parse_confidence),
    })
}

pub(crate) fn parse_result(v: &Value) -> Option<PredictionResult> {
    if let Some(idx) = v.as_u64() {
        return PredictionResult::from_index(idx);
    }
    let raw = v.as_str()?;
    let key: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    match key.as_str() {
        "homewin" | "home" | "h" => Some(PredictionResult::HomeWin),
        "draw" | "d" | "x" => Some(PredictionResult::Draw),
        "awaywin" | "away" | "a" => Some(PredictionResult::AwayWin),
        _ => key
            .parse::<u64>()
            .ok()
            .and_then(PredictionResult::from_index),
    }
}

fn parse_confidence(v: &Value) -> Option<[f64; 3]> {
    let arr = v.as_array()?;
    if arr.len() != 3 {
        return None;
    }
    let mut out = [0.0; 3];
    for (slot, item) in out.iter_mut().zip(arr) {
        let p = item.as_f64()?;
        if !p.is_finite() {
            return None;
        }
        *slot = p;
    }
    Some(out)
}

fn parse_utc(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    const FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];
    let cleaned = raw.trim_end_matches('Z');
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(cleaned, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn pick_string(value: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(v) = value.get(*key)
            && let Some(s) = as_string(v)
            && !s.is_empty()
        {
            return Some(s);
        }
    }
    None
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => {
            if let Some(Value::String(name)) = map.get("name") {
                return Some(name.trim().to_string());
            }
            if let Some(Value::String(name)) = map.get("shortName") {
                return Some(name.trim().to_string());
            }
            None
        }
        _ => None,
    }
}

fn as_id(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        _ => None,
    }
}

fn as_u32(value: &Value) -> Option<u32> {
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).ok();
    }
    value.as_str().and_then(|s| s.trim().parse::<u32>().ok())
}
