use tracing::warn;

use crate::api::{FetchError, PredictionApi};
use crate::league::League;
use crate::normalize::{normalize_directional, normalize_matchday, normalize_teams};
use crate::state::{Direction, Fixture, MatchdaySnapshotData, Team, TeamId};

pub const DEFAULT_PAGE_SIZE: usize = 5;

pub fn try_load_teams(api: &dyn PredictionApi, league: League) -> Result<Vec<Team>, FetchError> {
    api.teams(league).map(|raw| normalize_teams(&raw))
}

pub fn try_load_fixtures(
    api: &dyn PredictionApi,
    league: League,
    team_id: &TeamId,
    direction: Direction,
    page_size: usize,
) -> Result<Vec<Fixture>, FetchError> {
    api.fixtures(league, team_id, direction)
        .map(|raw| normalize_directional(&raw, direction, page_size))
}

pub fn try_load_latest_matchday(
    api: &dyn PredictionApi,
    league: League,
) -> Result<MatchdaySnapshotData, FetchError> {
    api.latest_matchday(league).map(|raw| normalize_matchday(&raw))
}

/// Logs a failed fetch and substitutes `fallback`. The failure line is
/// returned so callers can surface it elsewhere.
pub fn downgrade<T>(result: Result<T, FetchError>, what: &str, fallback: T) -> (T, Option<String>) {
    match result {
        Ok(data) => (data, None),
        Err(err) => {
            let line = format!("{what} failed: {err}");
            warn!("{line}");
            (fallback, Some(line))
        }
    }
}

pub fn load_teams(api: &dyn PredictionApi, league: League) -> Vec<Team> {
    let what = format!("{} teams", league.slug());
    downgrade(try_load_teams(api, league), &what, Vec::new()).0
}

pub fn load_fixtures(
    api: &dyn PredictionApi,
    league: League,
    team_id: &TeamId,
    direction: Direction,
    page_size: usize,
) -> Vec<Fixture> {
    let what = format!("{} fixtures for team {team_id}", direction.path_segment());
    downgrade(
        try_load_fixtures(api, league, team_id, direction, page_size),
        &what,
        Vec::new(),
    )
    .0
}

pub fn load_latest_matchday(api: &dyn PredictionApi, league: League) -> MatchdaySnapshotData {
    let what = format!("{} latest matchday", league.slug());
    downgrade(
        try_load_latest_matchday(api, league),
        &what,
        MatchdaySnapshotData::unavailable(),
    )
    .0
}
