mod app;

use std::io;
use std::time::{Duration, Instant};

use app::{format_change, format_currency, format_time_secs, truncate, Action, AppState, ConnectionStatus};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use scratch_ranker::types::Mover;

const REFRESH_INTERVAL: Duration = Duration::from_secs(10);

type Backend = CrosstermBackend<io::Stdout>;

/// Raw mode plus alternate screen for as long as it lives.
struct Screen {
    terminal: Terminal<Backend>,
}

impl Screen {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        Ok(Self { terminal: Terminal::new(CrosstermBackend::new(stdout))? })
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let base_url = std::env::var("API_URL").unwrap_or_else(|_| "http://localhost:5000".to_string());
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .map_err(io::Error::other)?;

    let mut app = AppState::new(base_url);
    app.refresh(&client).await;

    let mut screen = Screen::enter()?;
    let result = run(&mut screen.terminal, &mut app, &client).await;
    drop(screen);
    result
}

/// Redraw, wait for a key until the next poll is due, act.
async fn run(terminal: &mut Terminal<Backend>, app: &mut AppState, client: &reqwest::Client) -> io::Result<()> {
    let mut next_poll = Instant::now() + REFRESH_INTERVAL;

    loop {
        terminal.draw(|f| render(f, app))?;

        let wait = next_poll.saturating_duration_since(Instant::now());
        let mut action = if event::poll(wait)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.on_key(key.code),
                _ => Action::Continue,
            }
        } else {
            Action::Refresh
        };
        if action == Action::Continue && Instant::now() >= next_poll {
            action = Action::Refresh;
        }

        match action {
            Action::Quit => return Ok(()),
            Action::Refresh => {
                app.refresh(client).await;
                next_poll = Instant::now() + REFRESH_INTERVAL;
            }
            Action::Continue => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render(f: &mut Frame, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Length(4), // recommendation
            Constraint::Min(0),    // body
            Constraint::Length(1), // footer
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    render_recommendation(f, app, chunks[1]);
    render_body(f, app, chunks[2]);
    render_footer(f, app, chunks[3]);
}

fn bordered(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
}

fn render_header(f: &mut Frame, app: &AppState, area: Rect) {
    let (status_text, status_color) = match &app.status {
        ConnectionStatus::Connected => ("● connected".to_string(), Color::Green),
        ConnectionStatus::Connecting => ("◌ connecting".to_string(), Color::Yellow),
        ConnectionStatus::Error(e) => (format!("✗ {}", truncate(e, 40)), Color::Red),
    };

    let refresh_color = match app.health.last_refresh_ok {
        Some(true) => Color::White,
        Some(false) => Color::Red,
        None => Color::DarkGray,
    };

    let spans = vec![
        Span::styled(
            " Scratch-off Ranker  ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(status_text, Style::default().fg(status_color)),
        Span::raw("  │  "),
        Span::styled(
            format!("{} games", app.health.last_game_count),
            Style::default().fg(Color::White),
        ),
        Span::raw("  │  "),
        Span::styled(
            format!("last recompute {}", format_time_secs(app.health.last_refresh_at)),
            Style::default().fg(refresh_color),
        ),
        Span::raw("  │  "),
        Span::styled(
            format!("{} failed", app.health.refresh_failures),
            Style::default().fg(Color::DarkGray),
        ),
    ];

    let paragraph = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)));
    f.render_widget(paragraph, area);
}

fn render_recommendation(f: &mut Frame, app: &AppState, area: Rect) {
    let lines = match &app.recommendation {
        Some(rec) => vec![
            Line::from(vec![
                Span::styled(
                    format!(" {} ", rec.game.name),
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("#{}", rec.game.game_number), Style::default().fg(Color::DarkGray)),
                Span::raw("  │  "),
                Span::styled(format!("score {:.3}", rec.smart_score), Style::default().fg(Color::Yellow)),
                Span::raw("  │  "),
                Span::raw(format!("EV/$ {:.4}", rec.game.expected_value)),
                Span::raw("  │  "),
                Span::raw(format!("top {}", format_currency(rec.game.top_prize))),
            ]),
            Line::from(vec![
                Span::styled(
                    format!(
                        " value {:.2}  prizes {:.2}  grand {:.2}",
                        rec.value_norm, rec.prize_norm, rec.grand_norm
                    ),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw("  │  "),
                Span::raw(format!(
                    "{} prizes left ({:.0}%), {} grand",
                    rec.game.remaining_prizes,
                    rec.game.remaining_ratio * 100.0,
                    rec.game.grand_prizes_remaining
                )),
            ]),
        ],
        None => vec![Line::from(Span::styled(" No data available", Style::default().fg(Color::DarkGray)))],
    };

    f.render_widget(Paragraph::new(lines).block(bordered(" BEST BET ")), area);
}

fn render_body(f: &mut Frame, app: &AppState, area: Rect) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    render_games_table(f, app, halves[0]);

    let movers_area = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(halves[1]);

    match &app.movers {
        Some(m) => {
            render_movers(f, &m.gainers, " GAINERS ", Color::Green, movers_area[0]);
            render_movers(f, &m.losers, " LOSERS ", Color::Red, movers_area[1]);
        }
        None => {
            let note = Paragraph::new(Span::styled(" Not enough data yet", Style::default().fg(Color::DarkGray)))
                .block(bordered(" MOVERS "));
            f.render_widget(note, halves[1]);
        }
    }
}

fn render_games_table(f: &mut Frame, app: &AppState, area: Rect) {
    let header_cells = ["#", "Game", "EV/$", "Left", "Grand", "Top"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = app
        .displayed_games()
        .iter()
        .enumerate()
        .map(|(i, g)| {
            let ev_color = if g.value_score >= 0.7 {
                Color::Green
            } else if g.value_score >= 0.4 {
                Color::Yellow
            } else {
                Color::Red
            };

            Row::new(vec![
                Cell::from(format!("{}", i + 1)).style(Style::default().fg(Color::DarkGray)),
                Cell::from(truncate(&g.name, 28)),
                Cell::from(format!("{:.4}", g.expected_value)).style(Style::default().fg(ev_color)),
                Cell::from(g.remaining_prizes.to_string()),
                Cell::from(g.grand_prizes_remaining.to_string()).style(Style::default().fg(Color::Cyan)),
                Cell::from(format_currency(g.top_prize)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(6),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(bordered(app.view.title()))
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    let mut state = TableState::default().with_selected(app.selected);
    f.render_stateful_widget(table, area, &mut state);
}

fn render_movers(f: &mut Frame, movers: &[Mover], title: &str, color: Color, area: Rect) {
    let header_cells = ["Game", "Now", "Change"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = movers
        .iter()
        .map(|m| {
            Row::new(vec![
                Cell::from(truncate(&m.name, 22)),
                Cell::from(format!("{:.4}", m.expected_value_now)),
                Cell::from(format_change(m.change)).style(Style::default().fg(color)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [Constraint::Min(10), Constraint::Length(8), Constraint::Length(9)],
    )
    .header(header)
    .block(bordered(title));

    f.render_widget(table, area);
}

fn render_footer(f: &mut Frame, app: &AppState, area: Rect) {
    let line = Line::from(vec![
        Span::styled(" [q] ", Style::default().fg(Color::Yellow)),
        Span::raw("quit  "),
        Span::styled("[r] ", Style::default().fg(Color::Yellow)),
        Span::raw("refresh  "),
        Span::styled("[tab] ", Style::default().fg(Color::Yellow)),
        Span::raw("remaining / grand  "),
        Span::styled("[↑↓ / j k] ", Style::default().fg(Color::Yellow)),
        Span::raw("scroll  "),
        Span::styled(
            format!(
                "auto-refresh: {}s, polled {}s ago",
                REFRESH_INTERVAL.as_secs(),
                app.last_refresh.elapsed().as_secs()
            ),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    f.render_widget(Paragraph::new(line).style(Style::default().fg(Color::White)), area);
}
