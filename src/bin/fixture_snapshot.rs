use std::time::Duration;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use fixture_predictor::config::AppConfig;
use fixture_predictor::display::{
    self, FixturePanel, fixture_panel_message, matchday_message, matchday_title,
};
use fixture_predictor::league::League;
use fixture_predictor::state::{Fixture, LoadState, TeamId};

const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

fn main() -> Result<()> {
    let mut config = AppConfig::load();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(raw) = parse_flag("--league") {
        config.league =
            League::from_slug(&raw).with_context(|| format!("unknown league `{raw}`"))?;
    }
    let team = parse_flag("--team").map(TeamId::new);

    let mut controller = fixture_predictor::connect(&config)?;
    controller.mount();
    if !controller.settle(SETTLE_TIMEOUT) {
        eprintln!("warning: league data did not settle in time");
    }

    let profile = controller.profile();
    println!("{} ({})", profile.display_name, config.api_base);

    let teams = controller.teams();
    match teams.state {
        LoadState::Unavailable => println!("Teams: unavailable"),
        _ => println!("Teams: {}", teams.data.len()),
    }
    for t in &teams.data {
        println!("  {:>5}  {}", t.id, t.name);
    }

    let matchday = controller.matchday();
    println!();
    println!("{}", matchday_title(&matchday.data));
    match matchday_message(matchday.state, &matchday.data) {
        Some(message) => println!("  {message}"),
        None => print_fixtures(&matchday.data.fixtures),
    }

    let Some(team) = team else {
        return Ok(());
    };
    controller.set_team(Some(team.clone()));
    if !controller.settle(SETTLE_TIMEOUT) {
        eprintln!("warning: fixtures for team {team} did not settle in time");
    }

    for (panel, title, slice) in [
        (FixturePanel::Next, "Next fixtures", controller.next_fixtures()),
        (FixturePanel::Last, "Last results", controller.last_fixtures()),
    ] {
        println!();
        println!("{title} for team {team}");
        match fixture_panel_message(panel, true, slice.state, slice.data.is_empty()) {
            Some(message) => println!("  {message}"),
            None => print_fixtures(&slice.data),
        }
    }

    Ok(())
}

fn print_fixtures(fixtures: &[Fixture]) {
    for card in display::cards(fixtures) {
        let score = card
            .score
            .as_deref()
            .map(|s| format!(" {s} "))
            .unwrap_or_else(|| " vs ".to_string());
        let conf = card
            .confidence
            .map(|c| format!(" ({c})"))
            .unwrap_or_default();
        println!(
            "  {}  {}{}{}  | {}{}",
            card.date, card.home, score, card.away, card.prediction, conf
        );
    }
}

fn parse_flag(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}
