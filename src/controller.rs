use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info};

use crate::api::{FetchError, PredictionApi};
use crate::fixture_fetch::{
    DEFAULT_PAGE_SIZE, downgrade, try_load_fixtures, try_load_latest_matchday, try_load_teams,
};
use crate::league::{League, LeagueProfile};
use crate::normalize::normalize_prediction;
use crate::state::{
    Direction, Fixture, LoadState, MatchdaySnapshotData, Prediction, Team, TeamId,
};

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    pub league: League,
    pub team_id: Option<TeamId>,
    pub selection_token: u64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Slice<T> {
    pub data: T,
    pub state: LoadState,
}

impl<T: Default> Slice<T> {
    fn reset(&mut self, state: LoadState) {
        self.data = T::default();
        self.state = state;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdhocPrediction {
    pub home_id: TeamId,
    pub away_id: TeamId,
    pub prediction: Option<Prediction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("pick both a home and an away team")]
    MissingTeam,
    #[error("home and away team must differ")]
    SameTeam,
}

#[derive(Debug, Clone)]
pub enum Delta {
    Teams {
        token: u64,
        teams: Vec<Team>,
        state: LoadState,
    },
    Matchday {
        token: u64,
        snapshot: MatchdaySnapshotData,
        state: LoadState,
    },
    Fixtures {
        token: u64,
        direction: Direction,
        fixtures: Vec<Fixture>,
        state: LoadState,
    },
    Prediction {
        token: u64,
        league: League,
        home_id: TeamId,
        away_id: TeamId,
        prediction: Option<Prediction>,
        state: LoadState,
    },
    Log(String),
}

impl Delta {
    fn completes_fetch(&self) -> bool {
        !matches!(self, Delta::Log(_))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ControllerOptions {
    pub page_size: usize,
    pub fetch_parallelism: usize,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            fetch_parallelism: 4,
        }
    }
}

pub struct SelectionController {
    api: Arc<dyn PredictionApi>,
    pool: Option<rayon::ThreadPool>,
    tx: Sender<Delta>,
    rx: Receiver<Delta>,
    page_size: usize,
    selection: SelectionState,
    league_token: u64,
    prediction_token: u64,
    in_flight: usize,
    teams: Slice<Vec<Team>>,
    next_fixtures: Slice<Vec<Fixture>>,
    last_fixtures: Slice<Vec<Fixture>>,
    matchday: Slice<MatchdaySnapshotData>,
    adhoc: Slice<Option<AdhocPrediction>>,
    logs: VecDeque<String>,
}

impl SelectionController {
    pub fn new(api: Arc<dyn PredictionApi>, league: League, options: ControllerOptions) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            api,
            pool: build_fetch_pool(options.fetch_parallelism),
            tx,
            rx,
            page_size: options.page_size.max(1),
            selection: SelectionState {
                league,
                team_id: None,
                selection_token: 0,
            },
            league_token: 0,
            prediction_token: 0,
            in_flight: 0,
            teams: Slice::default(),
            next_fixtures: Slice::default(),
            last_fixtures: Slice::default(),
            matchday: Slice::default(),
            adhoc: Slice::default(),
            logs: VecDeque::new(),
        }
    }

    /// Initial load: team list and latest matchday, side by side.
    pub fn mount(&mut self) {
        self.league_token += 1;
        self.issue_league_fetches();
    }

    pub fn set_league(&mut self, league: League) {
        self.league_token += 1;
        self.selection.selection_token += 1;
        self.prediction_token += 1;
        self.selection.league = league;
        self.selection.team_id = None;
        self.next_fixtures.reset(LoadState::Idle);
        self.last_fixtures.reset(LoadState::Idle);
        self.adhoc.reset(LoadState::Idle);
        info!(league = league.slug(), "league selected");
        self.issue_league_fetches();
    }

    pub fn set_team(&mut self, team_id: Option<TeamId>) {
        self.selection.selection_token += 1;
        self.selection.team_id = team_id.clone();

        let Some(team_id) = team_id else {
            self.next_fixtures.reset(LoadState::Idle);
            self.last_fixtures.reset(LoadState::Idle);
            return;
        };
        self.next_fixtures.reset(LoadState::Loading);
        self.last_fixtures.reset(LoadState::Loading);
        debug!(
            team = %team_id,
            token = self.selection.selection_token,
            "team selected"
        );

        let token = self.selection.selection_token;
        let league = self.selection.league;
        let page_size = self.page_size;
        for direction in [Direction::Next, Direction::Last] {
            let api = Arc::clone(&self.api);
            let team_id = team_id.clone();
            self.spawn(move |tx| {
                let what = format!("{} fixtures for team {team_id}", direction.path_segment());
                let (fixtures, state) = settle_fetch(
                    try_load_fixtures(api.as_ref(), league, &team_id, direction, page_size),
                    &what,
                    tx,
                );
                let _ = tx.send(Delta::Fixtures {
                    token,
                    direction,
                    fixtures,
                    state,
                });
            });
        }
    }

    pub fn can_predict(home: Option<&TeamId>, away: Option<&TeamId>) -> bool {
        check_prediction_input(home, away).is_ok()
    }

    /// Ad-hoc prediction for two teams of the current league. Invalid input
    /// is rejected before any request goes out.
    pub fn request_prediction(
        &mut self,
        home: Option<&TeamId>,
        away: Option<&TeamId>,
    ) -> Result<(), InputError> {
        let (home_id, away_id) = check_prediction_input(home, away)?;
        let home_id = home_id.clone();
        let away_id = away_id.clone();

        self.prediction_token += 1;
        self.adhoc.state = LoadState::Loading;
        let token = self.prediction_token;
        // Keyed on the league, so a reload does not orphan it.
        let league = self.selection.league;
        let api = Arc::clone(&self.api);
        self.spawn(move |tx| {
            let what = format!("prediction {home_id} vs {away_id}");
            let (prediction, state) = settle_fetch(
                api.predict(&home_id, &away_id)
                    .map(|raw| normalize_prediction(&raw)),
                &what,
                tx,
            );
            let _ = tx.send(Delta::Prediction {
                token,
                league,
                home_id,
                away_id,
                prediction,
                state,
            });
        });
        Ok(())
    }

    pub fn pump(&mut self) -> bool {
        let mut changed = false;
        while let Ok(delta) = self.rx.try_recv() {
            self.receive(delta);
            changed = true;
        }
        changed
    }

    /// Blocks until no fetch is in flight or `timeout` passes. Returns true
    /// when everything settled.
    pub fn settle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.in_flight > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(delta) => self.receive(delta),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return false;
                }
            }
        }
        self.pump();
        true
    }

    pub fn apply(&mut self, delta: Delta) -> bool {
        match delta {
            Delta::Teams {
                token,
                teams,
                state,
            } => {
                if token != self.league_token {
                    debug!(token, current = self.league_token, "discarding stale teams");
                    return false;
                }
                self.teams = Slice { data: teams, state };
                true
            }
            Delta::Matchday {
                token,
                snapshot,
                state,
            } => {
                if token != self.league_token {
                    debug!(token, current = self.league_token, "discarding stale matchday");
                    return false;
                }
                self.matchday = Slice {
                    data: snapshot,
                    state,
                };
                true
            }
            Delta::Fixtures {
                token,
                direction,
                fixtures,
                state,
            } => {
                if token != self.selection.selection_token {
                    debug!(
                        token,
                        current = self.selection.selection_token,
                        direction = direction.path_segment(),
                        "discarding stale fixtures"
                    );
                    return false;
                }
                let slot = match direction {
                    Direction::Next => &mut self.next_fixtures,
                    Direction::Last => &mut self.last_fixtures,
                };
                *slot = Slice {
                    data: fixtures,
                    state,
                };
                true
            }
            Delta::Prediction {
                token,
                league,
                home_id,
                away_id,
                prediction,
                state,
            } => {
                if token != self.prediction_token || league != self.selection.league {
                    debug!(
                        token,
                        current = self.prediction_token,
                        league = league.slug(),
                        "discarding stale prediction"
                    );
                    return false;
                }
                self.adhoc = Slice {
                    data: Some(AdhocPrediction {
                        home_id,
                        away_id,
                        prediction,
                    }),
                    state,
                };
                true
            }
            Delta::Log(line) => {
                self.push_log(line);
                true
            }
        }
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn league(&self) -> League {
        self.selection.league
    }

    pub fn profile(&self) -> &'static LeagueProfile {
        self.selection.league.profile()
    }

    pub fn selected_team(&self) -> Option<&Team> {
        let id = self.selection.team_id.as_ref()?;
        self.teams.data.iter().find(|t| &t.id == id)
    }

    pub fn teams(&self) -> &Slice<Vec<Team>> {
        &self.teams
    }

    pub fn next_fixtures(&self) -> &Slice<Vec<Fixture>> {
        &self.next_fixtures
    }

    pub fn last_fixtures(&self) -> &Slice<Vec<Fixture>> {
        &self.last_fixtures
    }

    pub fn matchday(&self) -> &Slice<MatchdaySnapshotData> {
        &self.matchday
    }

    pub fn adhoc(&self) -> &Slice<Option<AdhocPrediction>> {
        &self.adhoc
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn logs(&self) -> &VecDeque<String> {
        &self.logs
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    fn issue_league_fetches(&mut self) {
        let token = self.league_token;
        let league = self.selection.league;
        self.teams.reset(LoadState::Loading);
        self.matchday.reset(LoadState::Loading);

        let api = Arc::clone(&self.api);
        self.spawn(move |tx| {
            let (teams, state) = settle_fetch(
                try_load_teams(api.as_ref(), league),
                &format!("{} teams", league.slug()),
                tx,
            );
            let _ = tx.send(Delta::Teams {
                token,
                teams,
                state,
            });
        });

        let api = Arc::clone(&self.api);
        self.spawn(move |tx| {
            let (snapshot, state) = settle_fetch(
                try_load_latest_matchday(api.as_ref(), league),
                &format!("{} latest matchday", league.slug()),
                tx,
            );
            let _ = tx.send(Delta::Matchday {
                token,
                snapshot,
                state,
            });
        });
    }

    fn receive(&mut self, delta: Delta) {
        if delta.completes_fetch() {
            self.in_flight = self.in_flight.saturating_sub(1);
        }
        self.apply(delta);
    }

    fn spawn(&mut self, job: impl FnOnce(&Sender<Delta>) + Send + 'static) {
        self.in_flight += 1;
        let tx = self.tx.clone();
        let job = move || job(&tx);
        if let Some(pool) = self.pool.as_ref() {
            pool.spawn(job);
        } else {
            thread::spawn(job);
        }
    }
}

fn check_prediction_input<'a>(
    home: Option<&'a TeamId>,
    away: Option<&'a TeamId>,
) -> Result<(&'a TeamId, &'a TeamId), InputError> {
    let (Some(home), Some(away)) = (home, away) else {
        return Err(InputError::MissingTeam);
    };
    if home == away {
        return Err(InputError::SameTeam);
    }
    Ok((home, away))
}

fn settle_fetch<T: Default>(
    result: Result<T, FetchError>,
    what: &str,
    tx: &Sender<Delta>,
) -> (T, LoadState) {
    match downgrade(result, what, T::default()) {
        (data, None) => (data, LoadState::Ready),
        (data, Some(failure)) => {
            let _ = tx.send(Delta::Log(format!("[WARN] {failure}")));
            (data, LoadState::Unavailable)
        }
    }
}

fn build_fetch_pool(threads: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.clamp(2, 32))
        .thread_name(|i| format!("fetch-{i}"))
        .build()
        .ok()
}
