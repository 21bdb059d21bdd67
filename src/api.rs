use reqwest::blocking::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::league::League;
use crate::state::{Direction, TeamId};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered http {status}")]
    Status { url: String, status: u16 },

    #[error("invalid json from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{0}")]
    Other(String),
}

/// Raw access to the prediction service. Payloads come back unvalidated;
/// shaping them is the normalizer's job.
pub trait PredictionApi: Send + Sync {
    fn teams(&self, league: League) -> Result<Value, FetchError>;

    fn fixtures(
        &self,
        league: League,
        team_id: &TeamId,
        direction: Direction,
    ) -> Result<Value, FetchError>;

    fn latest_matchday(&self, league: League) -> Result<Value, FetchError>;

    fn predict(&self, home_id: &TeamId, away_id: &TeamId) -> Result<Value, FetchError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictBody<'a> {
    home_id: &'a str,
    away_id: &'a str,
}

#[derive(Debug, Clone)]
pub struct HttpPredictionApi {
    client: Client,
    base_url: String,
}

impl HttpPredictionApi {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn send_json(&self, url: String, req: RequestBuilder) -> Result<Value, FetchError> {
        debug!(%url, "fetching");
        let resp = req.send().map_err(|source| FetchError::Transport {
            url: url.clone(),
            source,
        })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }
        resp.json::<Value>()
            .map_err(|source| FetchError::Decode { url, source })
    }
}

impl PredictionApi for HttpPredictionApi {
    fn teams(&self, league: League) -> Result<Value, FetchError> {
        let url = self.url(&format!("/api/{}/teams", league.slug()));
        self.send_json(url.clone(), self.client.get(&url))
    }

    fn fixtures(
        &self,
        league: League,
        team_id: &TeamId,
        direction: Direction,
    ) -> Result<Value, FetchError> {
        let url = self.url(&format!(
            "/api/fixtures/{}/{}",
            direction.path_segment(),
            team_id
        ));
        let req = self.client.get(&url).query(&[("league", league.slug())]);
        self.send_json(url, req)
    }

    fn latest_matchday(&self, league: League) -> Result<Value, FetchError> {
        let url = self.url("/api/fixtures/matchday");
        let req = self.client.get(&url).query(&[("league", league.slug())]);
        self.send_json(url, req)
    }

    fn predict(&self, home_id: &TeamId, away_id: &TeamId) -> Result<Value, FetchError> {
        let url = self.url("/api/predict");
        let req = self.client.post(&url).json(&PredictBody {
            home_id: home_id.as_str(),
            away_id: away_id.as_str(),
        });
        self.send_json(url, req)
    }
}
