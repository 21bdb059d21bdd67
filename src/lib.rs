pub mod api;
pub mod config;
pub mod controller;
pub mod display;
pub mod fixture_fetch;
pub mod http_client;
pub mod labeler;
pub mod league;
pub mod loading_gate;
pub mod normalize;
pub mod state;

use std::sync::Arc;

use anyhow::Result;

use crate::api::HttpPredictionApi;
use crate::config::AppConfig;
use crate::controller::SelectionController;

/// Controller wired to the HTTP service described by `config`.
pub fn connect(config: &AppConfig) -> Result<SelectionController> {
    let client = http_client::http_client(config.request_timeout)?;
    let api = HttpPredictionApi::new(client.clone(), config.api_base.clone());
    Ok(SelectionController::new(
        Arc::new(api),
        config.league,
        config.controller_options(),
    ))
}
