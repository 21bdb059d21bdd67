use std::io;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap};
use tracing::info;

use fixture_predictor::config::AppConfig;
use fixture_predictor::controller::SelectionController;
use fixture_predictor::display::{
    self, FixtureCard, FixturePanel, fixture_panel_message, matchday_message, matchday_title,
};
use fixture_predictor::league::League;
use fixture_predictor::loading_gate::LoadingGate;
use fixture_predictor::state::{LoadState, TeamId};

const SPLASH_LINES: [&str; 5] = [
    "Checking who is fit for the weekend...",
    "Replaying last season's set pieces...",
    "Counting late winners...",
    "Asking the model about derbies...",
    "Sorting out the fixture list...",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    LeaguePicker,
    League,
}

struct App {
    controller: SelectionController,
    gate: Option<LoadingGate>,
    screen: Screen,
    picker_index: usize,
    team_cursor: usize,
    predict_home: Option<TeamId>,
    predict_away: Option<TeamId>,
    help_overlay: bool,
    should_quit: bool,
}

impl App {
    fn new(controller: SelectionController, gate: LoadingGate) -> Self {
        let picker_index = League::ALL
            .iter()
            .position(|l| *l == controller.league())
            .unwrap_or(0);
        Self {
            controller,
            gate: Some(gate),
            screen: Screen::LeaguePicker,
            picker_index,
            team_cursor: 0,
            predict_home: None,
            predict_away: None,
            help_overlay: false,
            should_quit: false,
        }
    }

    fn tick(&mut self) {
        self.controller.pump();
        let finished = match self.gate.as_mut() {
            Some(gate) => {
                gate.poll();
                gate.is_ready()
            }
            None => false,
        };
        if finished {
            // Dropping the gate joins its timer thread.
            self.gate = None;
        }
        self.clamp_cursor();
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('q') {
            self.should_quit = true;
            return;
        }
        if self.gate.is_some() {
            return;
        }
        if key.code == KeyCode::Char('?') {
            self.help_overlay = !self.help_overlay;
            return;
        }
        match self.screen {
            Screen::LeaguePicker => self.on_picker_key(key),
            Screen::League => self.on_league_key(key),
        }
    }

    fn on_picker_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down | KeyCode::Right => {
                self.picker_index = (self.picker_index + 1) % League::ALL.len();
            }
            KeyCode::Char('k') | KeyCode::Up | KeyCode::Left => {
                self.picker_index = (self.picker_index + League::ALL.len() - 1) % League::ALL.len();
            }
            KeyCode::Enter => {
                let league = League::ALL[self.picker_index];
                if league != self.controller.league() {
                    self.switch_league(league);
                }
                self.screen = Screen::League;
            }
            _ => {}
        }
    }

    fn on_league_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('b') | KeyCode::Esc => self.screen = Screen::LeaguePicker,
            KeyCode::Char('j') | KeyCode::Down => self.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_cursor(-1),
            KeyCode::Enter => {
                let team = self.cursor_team();
                self.controller.set_team(team);
            }
            KeyCode::Char('x') => self.controller.set_team(None),
            KeyCode::Char('h') => self.predict_home = self.cursor_team(),
            KeyCode::Char('a') => self.predict_away = self.cursor_team(),
            KeyCode::Char('p') => self.request_prediction(),
            KeyCode::Char('l') => {
                let league = self.controller.league().other();
                self.switch_league(league);
            }
            KeyCode::Char('r') => self.controller.mount(),
            _ => {}
        }
    }

    fn switch_league(&mut self, league: League) {
        self.controller.set_league(league);
        self.picker_index = League::ALL.iter().position(|l| *l == league).unwrap_or(0);
        self.team_cursor = 0;
        self.predict_home = None;
        self.predict_away = None;
    }

    fn request_prediction(&mut self) {
        let home = self.predict_home.clone();
        let away = self.predict_away.clone();
        if let Err(err) = self
            .controller
            .request_prediction(home.as_ref(), away.as_ref())
        {
            self.controller
                .push_log(format!("[INFO] Predict disabled: {err}"));
        }
    }

    fn cursor_team(&self) -> Option<TeamId> {
        self.controller
            .teams()
            .data
            .get(self.team_cursor)
            .map(|t| t.id.clone())
    }

    fn move_cursor(&mut self, delta: isize) {
        let total = self.controller.teams().data.len();
        if total == 0 {
            self.team_cursor = 0;
            return;
        }
        let next = self.team_cursor as isize + delta;
        self.team_cursor = next.clamp(0, total as isize - 1) as usize;
    }

    fn clamp_cursor(&mut self) {
        let total = self.controller.teams().data.len();
        if total == 0 {
            self.team_cursor = 0;
        } else if self.team_cursor >= total {
            self.team_cursor = total - 1;
        }
    }

    fn team_name(&self, id: Option<&TeamId>) -> String {
        let Some(id) = id else {
            return "-".to_string();
        };
        self.controller
            .teams()
            .data
            .iter()
            .find(|t| &t.id == id)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| id.to_string())
    }
}

fn main() -> Result<()> {
    let config = AppConfig::load();
    init_tracing()?;
    info!(api = %config.api_base, league = config.league.slug(), "starting up");

    let mut controller = fixture_predictor::connect(&config)?;
    controller.mount();
    let gate = LoadingGate::start(config.splash);

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(controller, gate);
    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn init_tracing() -> Result<()> {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;
    let log_file = std::fs::File::create(log_dir.join("fixture_predictor.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fixture_predictor=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_names(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    loop {
        app.tick();
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn accent(app: &App) -> Color {
    let (r, g, b) = app.controller.profile().accent;
    Color::Rgb(r, g, b)
}

fn ui(frame: &mut Frame, app: &App) {
    if let Some(gate) = app.gate.as_ref() {
        render_splash(frame, frame.size(), app, gate);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(app))
        .style(Style::default().fg(accent(app)))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.screen {
        Screen::LeaguePicker => render_picker(frame, chunks[1], app),
        Screen::League => render_league(frame, chunks[1], app),
    }

    let footer = Paragraph::new(footer_text(app)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[2]);

    if app.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(app: &App) -> String {
    let title = match app.screen {
        Screen::LeaguePicker => "FIXTURE PREDICTOR | Choose your league".to_string(),
        Screen::League => {
            let team = app
                .controller
                .selected_team()
                .map(|t| t.name.as_str())
                .unwrap_or("no team selected");
            format!(
                "FIXTURE PREDICTOR | {} | {}",
                app.controller.profile().display_name,
                team
            )
        }
    };
    let busy = if app.controller.in_flight() > 0 {
        format!("  fetching ({})", app.controller.in_flight())
    } else {
        String::new()
    };
    format!("  (o)  {title}\n{busy}")
}

fn footer_text(app: &App) -> String {
    match app.screen {
        Screen::LeaguePicker => "j/k Move | Enter Open | ? Help | q Quit".to_string(),
        Screen::League => {
            let predict = if SelectionController::can_predict(
                app.predict_home.as_ref(),
                app.predict_away.as_ref(),
            ) {
                "p Predict"
            } else {
                "p Predict (pick two different teams)"
            };
            format!(
                "j/k Move | Enter Select | x Clear | h/a Home/Away | {predict} | l League | r Reload | b Back | q Quit"
            )
        }
    }
}

fn render_splash(frame: &mut Frame, area: Rect, app: &App, gate: &LoadingGate) {
    let popup = centered_rect(70, 30, area);
    frame.render_widget(Clear, popup);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Length(1),
        ])
        .split(popup);

    let title = format!(
        "Loading {} Data...",
        app.controller.profile().display_name
    );
    frame.render_widget(
        Paragraph::new(title)
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::BOLD)),
        rows[0],
    );

    let idx = (gate.elapsed().as_secs() / 2) as usize % SPLASH_LINES.len();
    frame.render_widget(
        Paragraph::new(SPLASH_LINES[idx])
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray)),
        rows[1],
    );

    let ratio = (gate.progress() / 100.0).clamp(0.0, 1.0);
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(accent(app)))
        .ratio(ratio)
        .label(format!("{:.0}%", gate.progress()));
    frame.render_widget(gauge, rows[2]);
}

fn render_picker(frame: &mut Frame, area: Rect, app: &App) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(centered_rect(80, 50, area));

    for (i, league) in League::ALL.iter().enumerate() {
        let profile = league.profile();
        let (r, g, b) = profile.accent;
        let color = Color::Rgb(r, g, b);
        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color));
        if i == app.picker_index {
            block = block.border_style(
                Style::default()
                    .fg(color)
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED),
            );
        }
        let text = format!("\n{}\n\n{}", profile.display_name, profile.tagline);
        let card = Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(card, cols[i]);
    }
}

fn render_league(frame: &mut Frame, area: Rect, app: &App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(28), Constraint::Min(40)])
        .split(area);

    render_teams(frame, columns[0], app);

    let panels = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Percentage(30),
            Constraint::Percentage(40),
            Constraint::Length(4),
            Constraint::Length(5),
        ])
        .split(columns[1]);

    render_fixture_panel(frame, panels[0], app, FixturePanel::Next);
    render_fixture_panel(frame, panels[1], app, FixturePanel::Last);
    render_matchday(frame, panels[2], app);
    render_adhoc(frame, panels[3], app);
    render_console(frame, panels[4], app);
}

fn panel_block(title: String, app: &App) -> Block<'static> {
    Block::default()
        .title(title)
        .borders(Borders::TOP)
        .border_style(Style::default().fg(accent(app)))
}

fn render_teams(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title("Teams")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent(app)));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let teams = app.controller.teams();
    let message = match teams.state {
        LoadState::Idle | LoadState::Loading => Some("Loading..."),
        LoadState::Unavailable => Some("Teams unavailable."),
        LoadState::Ready if teams.data.is_empty() => Some("No teams listed."),
        LoadState::Ready => None,
    };
    if let Some(message) = message {
        frame.render_widget(
            Paragraph::new(message).style(Style::default().fg(Color::DarkGray)),
            inner,
        );
        return;
    }

    let visible = inner.height as usize;
    let (start, end) = visible_range(app.team_cursor, teams.data.len(), visible);
    let selected = app.controller.selection().team_id.as_ref();
    let lines: Vec<Line> = teams.data[start..end]
        .iter()
        .enumerate()
        .map(|(offset, team)| {
            let idx = start + offset;
            let marker = if Some(&team.id) == selected { "> " } else { "  " };
            let mut tags = String::new();
            if app.predict_home.as_ref() == Some(&team.id) {
                tags.push_str(" [H]");
            }
            if app.predict_away.as_ref() == Some(&team.id) {
                tags.push_str(" [A]");
            }
            let style = if idx == app.team_cursor {
                Style::default().fg(Color::White).bg(Color::DarkGray)
            } else {
                Style::default()
            };
            Line::styled(format!("{marker}{}{tags}", team.name), style)
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_fixture_panel(frame: &mut Frame, area: Rect, app: &App, panel: FixturePanel) {
    let (title, slice) = match panel {
        FixturePanel::Next => (
            "Next Fixture Predictions",
            app.controller.next_fixtures(),
        ),
        FixturePanel::Last => ("Last Results", app.controller.last_fixtures()),
    };
    let block = panel_block(title.to_string(), app);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let team_selected = app.controller.selection().team_id.is_some();
    if let Some(message) =
        fixture_panel_message(panel, team_selected, slice.state, slice.data.is_empty())
    {
        frame.render_widget(
            Paragraph::new(message).style(Style::default().fg(Color::DarkGray)),
            inner,
        );
        return;
    }

    let lines: Vec<Line> = display::cards(&slice.data)
        .iter()
        .map(|card| match panel {
            FixturePanel::Next => upcoming_line(card, accent(app)),
            FixturePanel::Last => result_line(card, accent(app)),
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn upcoming_line(card: &FixtureCard, accent: Color) -> Line<'static> {
    let mut spans = vec![
        Span::styled(format!("{:<11}", card.date), Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{} vs {}  ", card.home, card.away)),
        Span::styled(card.prediction.clone(), Style::default().fg(accent)),
    ];
    if let Some(conf) = card.confidence.as_ref() {
        spans.push(Span::styled(
            format!(" ({conf})"),
            Style::default().fg(Color::Gray),
        ));
    }
    Line::from(spans)
}

fn result_line(card: &FixtureCard, accent: Color) -> Line<'static> {
    let score = card
        .score
        .clone()
        .unwrap_or_else(display::unplayed_score_text);
    let mut spans = vec![
        Span::styled(format!("{:<11}", card.date), Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{} ", card.home)),
        Span::styled(score, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(" {}  ", card.away)),
        Span::styled(
            format!("Predicted: {}", card.prediction),
            Style::default().fg(accent),
        ),
    ];
    if let Some(conf) = card.confidence.as_ref() {
        spans.push(Span::styled(
            format!(" ({conf})"),
            Style::default().fg(Color::Gray),
        ));
    }
    Line::from(spans)
}

fn render_matchday(frame: &mut Frame, area: Rect, app: &App) {
    let slice = app.controller.matchday();
    let block = panel_block(matchday_title(&slice.data), app);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if let Some(message) = matchday_message(slice.state, &slice.data) {
        frame.render_widget(
            Paragraph::new(message).style(Style::default().fg(Color::DarkGray)),
            inner,
        );
        return;
    }

    let lines: Vec<Line> = slice
        .data
        .fixtures
        .iter()
        .map(|fixture| {
            let mut card = FixtureCard::from_fixture(fixture);
            if let Some(utc) = fixture.utc_date {
                card.date = display::nice_date(utc);
            }
            result_line(&card, accent(app))
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_adhoc(frame: &mut Frame, area: Rect, app: &App) {
    let block = panel_block("Head to Head".to_string(), app);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let picks = format!(
        "Home: {}   Away: {}",
        app.team_name(app.predict_home.as_ref()),
        app.team_name(app.predict_away.as_ref())
    );
    let adhoc = app.controller.adhoc();
    let outcome = match (adhoc.state, adhoc.data.as_ref()) {
        (LoadState::Idle, _) => String::new(),
        (LoadState::Loading, _) => "Loading prediction...".to_string(),
        (LoadState::Unavailable, _) => "Prediction unavailable.".to_string(),
        (LoadState::Ready, Some(result)) => {
            let home = app.team_name(Some(&result.home_id));
            let away = app.team_name(Some(&result.away_id));
            match result.prediction.as_ref() {
                Some(prediction) => {
                    let (label, conf) = display::prediction_text(Some(prediction), &home, &away);
                    match conf {
                        Some(conf) => format!("{home} vs {away}: {label} ({conf})"),
                        None => format!("{home} vs {away}: {label}"),
                    }
                }
                None => format!("{home} vs {away}: no prediction returned"),
            }
        }
        (LoadState::Ready, None) => String::new(),
    };
    let text = vec![
        Line::raw(picks),
        Line::styled(outcome, Style::default().fg(accent(app))),
    ];
    frame.render_widget(Paragraph::new(text), inner);
}

fn render_console(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title("Console")
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let logs = app.controller.logs();
    let take = inner.height as usize;
    let lines: Vec<Line> = logs
        .iter()
        .skip(logs.len().saturating_sub(take))
        .map(|l| Line::styled(l.clone(), Style::default().fg(Color::DarkGray)))
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Fixture Predictor - Help",
        "",
        "League picker:",
        "  j/k or ↑/↓   Move",
        "  Enter        Open league",
        "",
        "League screen:",
        "  j/k or ↑/↓   Move team cursor",
        "  Enter        Show fixtures for team",
        "  x            Clear team",
        "  h / a        Mark home / away for head to head",
        "  p            Predict head to head",
        "  l            Switch league",
        "  r            Reload teams and matchday",
        "  b / Esc      Back",
        "",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
