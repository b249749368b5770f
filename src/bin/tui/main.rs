mod app;

use std::io;
use std::time::Duration;

use app::{format_pct, format_time_secs, game_label, trend_line, truncate, AppState, ConnectionStatus};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame, Terminal,
};

const RELOAD_INTERVAL: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> io::Result<()> {
    let base_url = std::env::var("API_URL")
        .unwrap_or_else(|_| "http://localhost:3000".to_string())
        .trim_end_matches('/')
        .to_string();

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .map_err(io::Error::other)?;

    let mut app = AppState::new(base_url);

    // Initial fetch before rendering
    app.reload(&client).await;

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &mut app, &client).await;

    // Restore terminal regardless of result
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
    client: &reqwest::Client,
) -> io::Result<()> {
    let mut last_tick = std::time::Instant::now();
    let mut scroll: u16 = 0;

    loop {
        terminal.draw(|f| render(f, app, scroll))?;

        let timeout = RELOAD_INTERVAL
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                        KeyCode::Char('r') | KeyCode::Char('R') => {
                            app.notice = Some("refreshing…".to_string());
                            terminal.draw(|f| render(f, app, scroll))?;
                            app.trigger_refresh(client).await;
                            last_tick = std::time::Instant::now();
                        }
                        KeyCode::Down | KeyCode::Char('j') => {
                            let max = games_pane_lines(app).len().saturating_sub(1) as u16;
                            scroll = (scroll + 1).min(max);
                        }
                        KeyCode::Up | KeyCode::Char('k') => {
                            scroll = scroll.saturating_sub(1);
                        }
                        _ => {}
                    }
                }
            }
        }

        if last_tick.elapsed() >= RELOAD_INTERVAL {
            app.reload(client).await;
            last_tick = std::time::Instant::now();
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render(f: &mut Frame, app: &AppState, scroll: u16) {
    let area = f.area();

    // Outer vertical split: header | body | footer
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Min(0),    // body
            Constraint::Length(1), // footer
        ])
        .split(area);

    render_header(f, app, chunks[0]);
    render_body(f, app, scroll, chunks[1]);
    render_footer(f, app, chunks[2]);
}

fn render_header(f: &mut Frame, app: &AppState, area: Rect) {
    let (status_text, status_color) = match &app.status {
        ConnectionStatus::Connected if app.health.refresh_in_flight => {
            ("◌ refreshing".to_string(), Color::Yellow)
        }
        ConnectionStatus::Connected => ("● connected".to_string(), Color::Green),
        ConnectionStatus::Connecting => ("◌ connecting".to_string(), Color::Yellow),
        ConnectionStatus::Error(e) => (format!("✗ {}", truncate(e, 40)), Color::Red),
    };

    let last_refresh = match (&app.health.last_error, app.health.last_success_at) {
        (Some(e), _) => Span::styled(
            format!("last refresh failed: {}", truncate(e, 30)),
            Style::default().fg(Color::Red),
        ),
        (None, Some(at)) => Span::styled(
            format!("refreshed {} UTC", format_time_secs(at)),
            Style::default().fg(Color::White),
        ),
        (None, None) => Span::styled("never refreshed", Style::default().fg(Color::DarkGray)),
    };

    let title_spans = vec![
        Span::styled(
            " MLB Trends  ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(status_text, Style::default().fg(status_color)),
        Span::raw("  │  "),
        Span::styled(
            format!("{} games stored", app.health.total_games),
            Style::default().fg(Color::White),
        ),
        Span::raw("  │  "),
        Span::styled(
            format!("{} games today", app.games.len()),
            Style::default().fg(Color::White),
        ),
        Span::raw("  │  "),
        last_refresh,
    ];

    let paragraph = Paragraph::new(Line::from(title_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );

    f.render_widget(paragraph, area);
}

fn render_body(f: &mut Frame, app: &AppState, scroll: u16, area: Rect) {
    // Horizontal split: aggregate trends (45%) | today's games (55%)
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    render_trends_table(f, app, halves[0]);
    render_games_pane(f, app, scroll, halves[1]);
}

fn render_trends_table(f: &mut Frame, app: &AppState, area: Rect) {
    let header_cells = ["Trend", "Bet", "Win %", "N"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = app
        .trends
        .iter()
        .map(|t| {
            let pct_color = if t.win_pct >= 60.0 {
                Color::Green
            } else if t.win_pct >= 50.0 {
                Color::Yellow
            } else {
                Color::Red
            };

            Row::new(vec![
                Cell::from(truncate(&t.description, 48)),
                Cell::from(t.bet_category.clone()).style(Style::default().fg(Color::Cyan)),
                Cell::from(format_pct(t.win_pct)).style(Style::default().fg(pct_color)),
                Cell::from(t.sample_size.to_string()).style(Style::default().fg(Color::DarkGray)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Min(20),
            Constraint::Length(10),
            Constraint::Length(7),
            Constraint::Length(5),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(
                " ACTIVE TRENDS ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
    );

    f.render_widget(table, area);
}

fn games_pane_lines(app: &AppState) -> Vec<Line<'static>> {
    if app.games.is_empty() {
        return vec![Line::from(Span::styled(
            "No games scheduled today.",
            Style::default().fg(Color::DarkGray),
        ))];
    }

    let mut lines = Vec::new();
    for game in &app.games {
        lines.push(Line::from(Span::styled(
            game_label(game),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )));

        if game.trends.is_empty() {
            lines.push(Line::from(Span::styled(
                "  No strong trends found for this game.",
                Style::default().fg(Color::DarkGray),
            )));
        }
        for t in &game.trends {
            let mut spans = vec![Span::raw(format!("  {}", trend_line(t)))];
            match t.win {
                Some(true) => spans.push(Span::styled("  ✓", Style::default().fg(Color::Green))),
                Some(false) => spans.push(Span::styled("  ✗", Style::default().fg(Color::Red))),
                None => {}
            }
            lines.push(Line::from(spans));
        }
        lines.push(Line::raw(""));
    }
    lines
}

fn render_games_pane(f: &mut Frame, app: &AppState, scroll: u16, area: Rect) {
    let paragraph = Paragraph::new(games_pane_lines(app))
        .scroll((scroll, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(Span::styled(
                    " TODAY'S GAMES ",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )),
        );

    f.render_widget(paragraph, area);
}

fn render_footer(f: &mut Frame, app: &AppState, area: Rect) {
    let mut spans = vec![
        Span::styled(" [q] ", Style::default().fg(Color::Yellow)),
        Span::raw("quit  "),
        Span::styled("[r] ", Style::default().fg(Color::Yellow)),
        Span::raw("refresh data  "),
        Span::styled("[↑↓ / j k] ", Style::default().fg(Color::Yellow)),
        Span::raw("scroll games  "),
        Span::styled("auto-reload: 5s", Style::default().fg(Color::DarkGray)),
    ];
    if let Some(notice) = &app.notice {
        spans.push(Span::raw("  │  "));
        spans.push(Span::styled(notice.clone(), Style::default().fg(Color::Cyan)));
    }
    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().fg(Color::White));
    f.render_widget(paragraph, area);
}
