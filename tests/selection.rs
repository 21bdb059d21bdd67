use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::{Value, json};

use fixture_predictor::api::{FetchError, PredictionApi};
use fixture_predictor::controller::{
    ControllerOptions, Delta, InputError, SelectionController,
};
use fixture_predictor::display::{FixturePanel, fixture_panel_message, matchday_message};
use fixture_predictor::fixture_fetch::{load_fixtures, load_latest_matchday, load_teams};
use fixture_predictor::labeler::confidence_percent;
use fixture_predictor::league::League;
use fixture_predictor::state::{Direction, LoadState, PredictionResult, TeamId};

const SETTLE: Duration = Duration::from_secs(5);

#[derive(Default)]
struct FakeApi {
    team_delays: HashMap<String, Duration>,
    league_delays: HashMap<&'static str, Duration>,
    predict_delays: HashMap<String, Duration>,
    next_override: Option<Value>,
    fail_matchday: bool,
    fail_teams: bool,
    fail_fixtures: bool,
    predict_calls: AtomicUsize,
    fixture_calls: Mutex<Vec<(String, Direction)>>,
}

impl FakeApi {
    fn fixture_for(team_id: &TeamId, direction: Direction) -> Value {
        let mut row = json!({
            "utcDate": "2025-08-17T19:30:00Z",
            "home": format!("{team_id} FC"),
            "away": "Rivals",
            "prediction": {"result": "Home Win", "confidence": [0.6, 0.25, 0.15]}
        });
        if direction == Direction::Last {
            row["score"] = json!({"home": 1, "away": 0});
        }
        json!([row])
    }
}

impl PredictionApi for FakeApi {
    fn teams(&self, league: League) -> Result<Value, FetchError> {
        if let Some(delay) = self.league_delays.get(league.slug()) {
            thread::sleep(*delay);
        }
        if self.fail_teams {
            return Err(FetchError::Other("connection refused".to_string()));
        }
        Ok(json!([
            {"id": 1, "name": format!("{} One", league.slug())},
            {"id": 2, "name": format!("{} Two", league.slug())}
        ]))
    }

    fn fixtures(
        &self,
        _league: League,
        team_id: &TeamId,
        direction: Direction,
    ) -> Result<Value, FetchError> {
        self.fixture_calls
            .lock()
            .expect("calls lock")
            .push((team_id.to_string(), direction));
        if let Some(delay) = self.team_delays.get(team_id.as_str()) {
            thread::sleep(*delay);
        }
        if self.fail_fixtures {
            return Err(FetchError::Status {
                url: "/api/fixtures".to_string(),
                status: 503,
            });
        }
        if direction == Direction::Next
            && let Some(raw) = self.next_override.as_ref()
        {
            return Ok(raw.clone());
        }
        Ok(Self::fixture_for(team_id, direction))
    }

    fn latest_matchday(&self, league: League) -> Result<Value, FetchError> {
        if let Some(delay) = self.league_delays.get(league.slug()) {
            thread::sleep(*delay);
        }
        if self.fail_matchday {
            return Err(FetchError::Other("timed out".to_string()));
        }
        Ok(json!({
            "matchday": 38,
            "fixtures": [{
                "utcDate": "2025-05-25T19:00:00Z",
                "homeTeam": {"name": format!("{} Home", league.slug())},
                "awayTeam": {"name": "Away"},
                "score": {"fullTime": {"home": 2, "away": 2}},
                "prediction": {"result": "Draw", "confidence": [0.25, 0.5, 0.25]}
            }]
        }))
    }

    fn predict(&self, home_id: &TeamId, _away_id: &TeamId) -> Result<Value, FetchError> {
        self.predict_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.predict_delays.get(home_id.as_str()) {
            thread::sleep(*delay);
        }
        Ok(json!({"result": 2, "confidence": [0.1, 0.15, 0.75]}))
    }
}

fn controller(api: Arc<FakeApi>) -> SelectionController {
    SelectionController::new(api, League::LaLiga, ControllerOptions::default())
}

fn team(id: &str) -> TeamId {
    TeamId::new(id)
}

#[test]
fn mount_loads_teams_and_matchday() {
    let mut c = controller(Arc::new(FakeApi::default()));
    c.mount();
    assert_eq!(c.teams().state, LoadState::Loading);
    assert!(c.settle(SETTLE));

    assert_eq!(c.teams().state, LoadState::Ready);
    assert_eq!(c.teams().data.len(), 2);
    assert_eq!(c.teams().data[0].name, "laliga One");
    assert_eq!(c.matchday().state, LoadState::Ready);
    assert_eq!(c.matchday().data.matchday_number, Some(38));
    assert_eq!(c.matchday().data.fixtures.len(), 1);
    assert_eq!(c.in_flight(), 0);
}

#[test]
fn last_issued_selection_wins_regardless_of_arrival() {
    let mut api = FakeApi::default();
    api.team_delays.insert("A".to_string(), Duration::from_millis(150));
    api.team_delays.insert("B".to_string(), Duration::from_millis(5));
    let mut c = controller(Arc::new(api));

    c.set_team(Some(team("A")));
    c.set_team(Some(team("B")));
    c.set_team(Some(team("A")));
    assert_eq!(c.selection().selection_token, 3);
    assert!(c.settle(SETTLE));

    assert_eq!(c.next_fixtures().state, LoadState::Ready);
    assert_eq!(c.next_fixtures().data.len(), 1);
    assert_eq!(c.next_fixtures().data[0].home_name, "A FC");
    assert_eq!(c.last_fixtures().data[0].home_name, "A FC");
    assert!(c.last_fixtures().data[0].is_past());
}

#[test]
fn slow_response_for_old_team_is_discarded() {
    let mut api = FakeApi::default();
    api.team_delays.insert("A".to_string(), Duration::from_millis(200));
    let mut c = controller(Arc::new(api));

    c.set_team(Some(team("A")));
    c.set_team(Some(team("B")));
    assert!(c.settle(SETTLE));

    assert_eq!(c.next_fixtures().data[0].home_name, "B FC");
    assert_eq!(c.last_fixtures().data[0].home_name, "B FC");
    assert_eq!(c.selection().team_id, Some(team("B")));
}

#[test]
fn stale_tokens_are_rejected_on_apply() {
    let mut c = controller(Arc::new(FakeApi::default()));
    c.set_team(Some(team("A")));
    c.set_team(Some(team("B")));

    let applied = c.apply(Delta::Fixtures {
        token: 1,
        direction: Direction::Next,
        fixtures: Vec::new(),
        state: LoadState::Unavailable,
    });
    assert!(!applied);
    assert_eq!(c.next_fixtures().state, LoadState::Loading);

    let applied = c.apply(Delta::Fixtures {
        token: 2,
        direction: Direction::Next,
        fixtures: Vec::new(),
        state: LoadState::Ready,
    });
    assert!(applied);
    assert_eq!(c.next_fixtures().state, LoadState::Ready);
}

#[test]
fn team_change_clears_fixtures_immediately() {
    let mut api = FakeApi::default();
    api.team_delays.insert("B".to_string(), Duration::from_millis(100));
    let mut c = controller(Arc::new(api));

    c.set_team(Some(team("A")));
    assert!(c.settle(SETTLE));
    assert_eq!(c.next_fixtures().data.len(), 1);

    c.set_team(Some(team("B")));
    assert!(c.next_fixtures().data.is_empty());
    assert!(c.last_fixtures().data.is_empty());
    assert_eq!(c.next_fixtures().state, LoadState::Loading);
    assert!(c.settle(SETTLE));
}

#[test]
fn clearing_team_issues_no_fetch() {
    let api = Arc::new(FakeApi::default());
    let mut c = controller(api.clone());

    c.set_team(None);
    assert_eq!(c.in_flight(), 0);
    assert_eq!(c.next_fixtures().state, LoadState::Idle);
    assert_eq!(c.last_fixtures().state, LoadState::Idle);
    assert!(api.fixture_calls.lock().expect("calls lock").is_empty());
    assert_eq!(
        fixture_panel_message(FixturePanel::Next, false, LoadState::Idle, true),
        Some("Select a team to view upcoming fixtures.")
    );
}

#[test]
fn malformed_next_payload_is_an_empty_list_not_an_error() {
    let api = FakeApi {
        next_override: Some(json!({"error": "unexpected"})),
        ..FakeApi::default()
    };
    let mut c = controller(Arc::new(api));
    c.set_team(Some(team("A")));
    assert!(c.settle(SETTLE));

    let next = c.next_fixtures();
    assert_eq!(next.state, LoadState::Ready);
    assert!(next.data.is_empty());
    assert_eq!(
        fixture_panel_message(FixturePanel::Next, true, next.state, next.data.is_empty()),
        Some("No upcoming matches scheduled.")
    );
    assert_eq!(c.last_fixtures().data.len(), 1);
}

#[test]
fn matchday_failure_is_null_snapshot() {
    let api = FakeApi {
        fail_matchday: true,
        ..FakeApi::default()
    };
    let mut c = controller(Arc::new(api));
    c.mount();
    assert!(c.settle(SETTLE));

    let matchday = c.matchday();
    assert_eq!(matchday.state, LoadState::Unavailable);
    assert_eq!(matchday.data.matchday_number, None);
    assert!(matchday.data.fixtures.is_empty());
    assert_eq!(
        matchday_message(matchday.state, &matchday.data),
        Some("Matchday data unavailable.")
    );
    assert_eq!(c.teams().state, LoadState::Ready);
    assert!(c.logs().iter().any(|l| l.starts_with("[WARN]")));
}

#[test]
fn transport_failures_degrade_to_unavailable() {
    let api = FakeApi {
        fail_teams: true,
        fail_fixtures: true,
        ..FakeApi::default()
    };
    let mut c = controller(Arc::new(api));
    c.mount();
    c.set_team(Some(team("A")));
    assert!(c.settle(SETTLE));

    assert_eq!(c.teams().state, LoadState::Unavailable);
    assert!(c.teams().data.is_empty());
    assert_eq!(c.next_fixtures().state, LoadState::Unavailable);
    assert_eq!(c.last_fixtures().state, LoadState::Unavailable);
    assert!(c.next_fixtures().data.is_empty());
}

#[test]
fn league_switch_discards_previous_league_results() {
    let mut api = FakeApi::default();
    api.league_delays.insert("laliga", Duration::from_millis(150));
    let mut c = controller(Arc::new(api));

    c.mount();
    c.set_team(Some(team("A")));
    c.set_league(League::PremierLeague);
    assert_eq!(c.selection().team_id, None);
    assert!(c.settle(SETTLE));

    assert_eq!(c.league(), League::PremierLeague);
    assert_eq!(c.teams().data[0].name, "epl One");
    assert_eq!(c.matchday().data.fixtures[0].home_name, "epl Home");
    assert_eq!(c.next_fixtures().state, LoadState::Idle);
    assert!(c.next_fixtures().data.is_empty());
}

#[test]
fn identical_teams_never_reach_the_service() {
    let api = Arc::new(FakeApi::default());
    let mut c = controller(api.clone());
    let a = team("81");

    assert!(!SelectionController::can_predict(Some(&a), Some(&a)));
    assert_eq!(
        c.request_prediction(Some(&a), Some(&a)),
        Err(InputError::SameTeam)
    );
    assert_eq!(
        c.request_prediction(Some(&a), None),
        Err(InputError::MissingTeam)
    );
    assert_eq!(c.in_flight(), 0);
    assert_eq!(api.predict_calls.load(Ordering::SeqCst), 0);
    assert_eq!(c.adhoc().state, LoadState::Idle);
}

#[test]
fn adhoc_prediction_maps_index_through_result_enum() {
    let api = Arc::new(FakeApi::default());
    let mut c = controller(api.clone());
    let home = team("81");
    let away = team("86");

    assert!(SelectionController::can_predict(Some(&home), Some(&away)));
    c.request_prediction(Some(&home), Some(&away))
        .expect("distinct teams are accepted");
    assert!(c.settle(SETTLE));
    assert_eq!(api.predict_calls.load(Ordering::SeqCst), 1);

    let adhoc = c.adhoc();
    assert_eq!(adhoc.state, LoadState::Ready);
    let result = adhoc.data.as_ref().expect("prediction stored");
    assert_eq!(result.home_id, home);
    let prediction = result.prediction.as_ref().expect("body normalized");
    assert_eq!(prediction.result, Some(PredictionResult::AwayWin));
    assert_eq!(confidence_percent(prediction).as_deref(), Some("75.0%"));
}

#[test]
fn reload_during_prediction_still_settles_it() {
    let mut api = FakeApi::default();
    api.predict_delays.insert("1".to_string(), Duration::from_millis(100));
    let api = Arc::new(api);
    let mut c = controller(api.clone());

    c.request_prediction(Some(&team("1")), Some(&team("2")))
        .expect("distinct teams are accepted");
    c.mount();
    assert!(c.settle(SETTLE));

    let adhoc = c.adhoc();
    assert_eq!(adhoc.state, LoadState::Ready);
    let result = adhoc.data.as_ref().expect("prediction stored");
    assert_eq!(result.home_id, team("1"));
    assert_eq!(result.away_id, team("2"));
    assert_eq!(c.teams().state, LoadState::Ready);
}

#[test]
fn latest_prediction_request_wins() {
    let mut api = FakeApi::default();
    api.predict_delays.insert("1".to_string(), Duration::from_millis(150));
    let api = Arc::new(api);
    let mut c = controller(api.clone());

    c.request_prediction(Some(&team("1")), Some(&team("2")))
        .expect("first pair accepted");
    c.request_prediction(Some(&team("3")), Some(&team("4")))
        .expect("second pair accepted");
    assert!(c.settle(SETTLE));
    assert_eq!(api.predict_calls.load(Ordering::SeqCst), 2);

    let adhoc = c.adhoc();
    assert_eq!(adhoc.state, LoadState::Ready);
    let result = adhoc.data.as_ref().expect("prediction stored");
    assert_eq!(result.home_id, team("3"));
    assert_eq!(result.away_id, team("4"));
}

#[test]
fn league_switch_drops_in_flight_prediction() {
    let mut api = FakeApi::default();
    api.predict_delays.insert("1".to_string(), Duration::from_millis(100));
    let mut c = controller(Arc::new(api));

    c.request_prediction(Some(&team("1")), Some(&team("2")))
        .expect("distinct teams are accepted");
    c.set_league(League::PremierLeague);
    assert!(c.settle(SETTLE));

    assert_eq!(c.adhoc().state, LoadState::Idle);
    assert!(c.adhoc().data.is_none());
}

#[test]
fn loaders_swallow_transport_errors() {
    let api = FakeApi {
        fail_teams: true,
        fail_fixtures: true,
        fail_matchday: true,
        ..FakeApi::default()
    };
    assert!(load_teams(&api, League::LaLiga).is_empty());
    assert!(load_fixtures(&api, League::LaLiga, &team("81"), Direction::Next, 5).is_empty());
    let snapshot = load_latest_matchday(&api, League::LaLiga);
    assert_eq!(snapshot.matchday_number, None);
    assert!(snapshot.fixtures.is_empty());
}
