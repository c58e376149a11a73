use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph};

use talaga_terminal::config::AppConfig;
use talaga_terminal::feed::spawn_provider;
use talaga_terminal::form::{FormField, FormMode};
use talaga_terminal::layout::{PlacedPlayer, Side, to_cell};
use talaga_terminal::persist::LocalStorage;
use talaga_terminal::state::{self, AppState, Overlay, ProviderCommand, Screen, apply_delta};
use talaga_terminal::stats::{TOP_SCORERS_LIMIT, summarize, top_scorers};
use talaga_terminal::title::{format_field, format_time, match_title};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
    rng: rand::rngs::ThreadRng,
}

impl App {
    fn new(config: &AppConfig, cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        let mut state = AppState::new(config.merge, LocalStorage::open_default());
        state.load_local(now_ms());
        Self {
            state,
            should_quit: false,
            cmd_tx,
            rng: rand::thread_rng(),
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.overlay.is_some() {
            self.on_overlay_key(key);
            return;
        }
        let now = now_ms();
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.state.set_screen(Screen::Pitch),
            KeyCode::Char('2') => self.state.set_screen(Screen::History),
            KeyCode::Char('3') => self.state.set_screen(Screen::Stats),
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('a') => self.state.request_add(now),
            KeyCode::Char('e') => self.state.request_edit(now),
            KeyCode::Char('x') | KeyCode::Delete => self.state.request_delete(now),
            KeyCode::Char('L') => self.state.request_login(now),
            KeyCode::Char('o') => self.state.logout(),
            KeyCode::Char('r') => {
                self.state.outbox.push(ProviderCommand::FetchMatchData);
                self.state.outbox.push(ProviderCommand::FetchHistory);
                self.state.push_log("[INFO] Refresh requested");
            }
            KeyCode::Char('?') => {
                self.state.help_overlay = !self.state.help_overlay;
                self.state.needs_redraw = true;
            }
            KeyCode::Esc if self.state.help_overlay => {
                self.state.help_overlay = false;
                self.state.needs_redraw = true;
            }
            _ => {}
        }
    }

    fn on_overlay_key(&mut self, key: KeyEvent) {
        let now = now_ms();
        self.state.needs_redraw = true;
        let Some(overlay) = self.state.overlay.as_mut() else {
            return;
        };
        match overlay {
            Overlay::Login { password, error } => match key.code {
                KeyCode::Esc => self.state.dismiss_overlay(),
                KeyCode::Enter => self.state.submit_login(now),
                KeyCode::Backspace => {
                    password.pop();
                }
                KeyCode::Char(c) => {
                    password.push(c);
                    *error = None;
                }
                _ => {}
            },
            Overlay::ResultForm(form) => match key.code {
                KeyCode::Esc => self.state.dismiss_overlay(),
                KeyCode::Enter => self.state.submit_form(now, &mut self.rng),
                KeyCode::Tab | KeyCode::Down => form.next_field(),
                KeyCode::BackTab | KeyCode::Up => form.prev_field(),
                KeyCode::Backspace => form.backspace(),
                KeyCode::Char(c) => form.push_char(c),
                _ => {}
            },
            Overlay::ConfirmDelete { .. } => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => self.state.confirm_delete(now),
                KeyCode::Char('n') | KeyCode::Esc => self.state.dismiss_overlay(),
                _ => {}
            },
            Overlay::ConfirmDuplicate { .. } => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    self.state.confirm_duplicate(now, &mut self.rng)
                }
                KeyCode::Char('n') | KeyCode::Esc => self.state.dismiss_overlay(),
                _ => {}
            },
        }
    }

    fn flush_outbox(&mut self) {
        let commands = self.state.take_outbox();
        if commands.is_empty() {
            return;
        }
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[INFO] Provider unavailable; changes kept locally");
            return;
        };
        let mut failed = false;
        for cmd in commands {
            failed |= tx.send(cmd).is_err();
        }
        if failed {
            self.state.push_log("[WARN] Provider request failed");
        }
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let config = AppConfig::from_env();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_provider(tx, cmd_rx, config.clone());

    let mut app = App::new(&config, Some(cmd_tx));
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<state::Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }
        app.flush_outbox();

        if app.state.needs_redraw {
            terminal.draw(|f| ui(f, app))?;
            app.state.needs_redraw = false;
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    app.on_key(key);
                    app.flush_outbox();
                }
                Event::Resize(_, _) => app.state.needs_redraw = true,
                _ => {}
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.state.tick(now_ms());
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Pitch => render_pitch(frame, chunks[1], &app.state),
        Screen::History => render_history(frame, chunks[1], &app.state),
        Screen::Stats => render_stats(frame, chunks[1], &app.state),
    }

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer =
        Paragraph::new(footer_text(&app.state)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
    if let Some(overlay) = &app.state.overlay {
        render_overlay(frame, frame.size(), overlay);
    }
}

fn header_text(state: &AppState) -> String {
    let admin = if state.is_admin(now_ms()) {
        "ADMIN"
    } else {
        "guest"
    };
    let screen = match state.screen {
        Screen::Pitch => "PITCH",
        Screen::History => "HISTORY",
        Screen::Stats => "STATS",
    };
    let line1 = format!("  (o)  {}", match_title(&state.match_info));
    let line2 = format!("  /|\\  {screen} | {admin} | {} matches", state.history.len());
    format!("{line1}\n{line2}")
}

fn footer_text(state: &AppState) -> String {
    match state.screen {
        Screen::Pitch => "1 Pitch | 2 History | 3 Stats | a Add | L Login | o Logout | r Refresh | ? Help | q Quit",
        Screen::History => "1 Pitch | 2 History | 3 Stats | j/k Move | a Add | e Edit | x Delete | L Login | o Logout | ? Help | q Quit",
        Screen::Stats => "1 Pitch | 2 History | 3 Stats | a Add | r Refresh | ? Help | q Quit",
    }
    .to_string()
}

fn render_pitch(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default()
        .title(format!(
            "Black ({}) vs Red ({})",
            state.match_info.team_a.len(),
            state.match_info.team_b.len()
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.width < 10 || inner.height < 4 {
        return;
    }

    if state.match_info.is_empty() {
        let empty =
            Paragraph::new("No teams drawn yet").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }

    let line_style = Style::default().fg(Color::DarkGray);
    let mid = inner.x + inner.width / 2;
    render_vline(frame, mid, inner.y, inner.height, line_style);

    let black = Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);
    let red = Style::default().fg(Color::Red).add_modifier(Modifier::BOLD);
    render_players(frame, inner, &state.layout.left, black);
    render_players(frame, inner, &state.layout.right, red);
}

fn render_vline(frame: &mut Frame, x: u16, y: u16, height: u16, style: Style) {
    let text = vec!["│"; height as usize].join("\n");
    let area = Rect {
        x,
        y,
        width: 1,
        height,
    };
    frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_players(frame: &mut Frame, inner: Rect, players: &[PlacedPlayer], style: Style) {
    let max_label = (inner.width / 4).max(3) as usize;
    for player in players {
        let label = player_label(player, max_label);
        let label_width = label.chars().count() as u16;
        let (x, y) = to_cell(&player.coord, inner.width, inner.height, label_width);
        let area = Rect {
            x: inner.x + x,
            y: inner.y + y,
            width: label_width.min(inner.width.saturating_sub(x)),
            height: 1,
        };
        frame.render_widget(Paragraph::new(label).style(style), area);
    }
}

fn player_label(player: &PlacedPlayer, max: usize) -> String {
    let name: String = player.name.chars().take(max.saturating_sub(2)).collect();
    match player.coord.side {
        Side::Left => format!("● {name}"),
        Side::Right => format!("{name} ●"),
    }
}

fn render_history(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Match History").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let records = state.display_records();
    if records.is_empty() {
        let empty =
            Paragraph::new("No matches recorded").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }
    if inner.height == 0 {
        return;
    }

    let visible = inner.height as usize;
    let (start, end) = visible_range(state.selected, records.len(), visible);
    for (i, idx) in (start..end).enumerate() {
        let record = records[idx];
        let selected = idx == state.selected;
        let style = if selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else if record.is_cancelled() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };
        let score = if record.is_cancelled() {
            "CANCELLED".to_string()
        } else {
            record
                .score
                .map(|s| format!("Black {} - {} Red", s.team_a, s.team_b))
                .unwrap_or_else(|| "no score".to_string())
        };
        let mvp = record
            .mvp
            .as_deref()
            .filter(|_| !record.is_cancelled())
            .map(|m| format!(" | MVP {m}"))
            .unwrap_or_default();
        let prefix = if selected { "> " } else { "  " };
        let line = format!(
            "{prefix}{:<22} {:<10} {:<9} {score}{mvp}",
            record.formatted_date,
            format_time(&record.time),
            format_field(&record.field),
        );
        let row = Rect {
            x: inner.x,
            y: inner.y + i as u16,
            width: inner.width,
            height: 1,
        };
        frame.render_widget(Paragraph::new(line).style(style), row);
    }
}

fn render_stats(frame: &mut Frame, area: Rect, state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(28), Constraint::Min(20)])
        .split(area);

    let stats = summarize(state.history.records());
    let text = format!(
        "Matches: {}\nBlack wins: {}\nRed wins: {}\nDraws: {}",
        stats.total, stats.wins_a, stats.wins_b, stats.draws
    );
    let summary =
        Paragraph::new(text).block(Block::default().title("Summary").borders(Borders::ALL));
    frame.render_widget(summary, cols[0]);

    let scorers = top_scorers(state.history.records(), TOP_SCORERS_LIMIT);
    let block = Block::default().title("Top Scorers").borders(Borders::ALL);
    if scorers.is_empty() {
        let empty = Paragraph::new("No goals recorded")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, cols[1]);
        return;
    }
    let bars: Vec<Bar> = scorers
        .iter()
        .map(|s| {
            Bar::default()
                .label(Line::from(s.player.clone()))
                .value(u64::from(s.goals))
                .style(Style::default().fg(Color::Yellow))
        })
        .collect();
    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0);
    frame.render_widget(chart, cols[1]);
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

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    let start = state.logs.len().saturating_sub(3);
    state
        .logs
        .iter()
        .skip(start)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_overlay(frame: &mut Frame, area: Rect, overlay: &Overlay) {
    match overlay {
        Overlay::Login { password, error } => {
            let popup = centered_rect(40, 30, area);
            frame.render_widget(Clear, popup);
            let mut lines = vec![
                "Admin password:".to_string(),
                format!("> {}", "*".repeat(password.chars().count())),
                String::new(),
            ];
            if let Some(err) = error {
                lines.push(format!("! {err}"));
            }
            lines.push("Enter Login | Esc Cancel".to_string());
            let widget = Paragraph::new(lines.join("\n"))
                .block(Block::default().title("Login").borders(Borders::ALL));
            frame.render_widget(widget, popup);
        }
        Overlay::ResultForm(form) => {
            let popup = centered_rect(60, 60, area);
            frame.render_widget(Clear, popup);
            let mut lines = Vec::new();
            for field in FormField::ALL {
                let marker = if form.focused() == field { ">" } else { " " };
                lines.push(format!("{marker} {:<26} {}", field.label(), form.value(field)));
            }
            lines.push(String::new());
            if let Some(err) = &form.error {
                lines.push(format!("! {err}"));
            }
            lines.push("Tab Next | Enter Save | Esc Cancel".to_string());
            let title = match form.mode {
                FormMode::Add => "Add Result".to_string(),
                FormMode::Edit { id } => format!("Edit Result {id}"),
            };
            let widget = Paragraph::new(lines.join("\n"))
                .block(Block::default().title(title).borders(Borders::ALL));
            frame.render_widget(widget, popup);
        }
        Overlay::ConfirmDelete { id } => {
            let popup = centered_rect(40, 20, area);
            frame.render_widget(Clear, popup);
            let widget = Paragraph::new(format!("Delete match {id}?\n\ny Yes | n No"))
                .block(Block::default().title("Confirm").borders(Borders::ALL));
            frame.render_widget(widget, popup);
        }
        Overlay::ConfirmDuplicate { draft, existing_id } => {
            let popup = centered_rect(50, 25, area);
            frame.render_widget(Clear, popup);
            let text = format!(
                "A result for {} {} already exists (match {existing_id}).\nReplace the match on that date?\n\ny Replace | n Cancel",
                draft.date, draft.time
            );
            let widget = Paragraph::new(text)
                .block(Block::default().title("Duplicate").borders(Borders::ALL));
            frame.render_widget(widget, popup);
        }
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Talaga Terminal - Help",
        "",
        "Screens:",
        "  1            Pitch",
        "  2            History",
        "  3            Stats",
        "",
        "History (admin):",
        "  a            Add result",
        "  e            Edit selected",
        "  x            Delete selected",
        "  j/k or ↑/↓   Move",
        "",
        "Session:",
        "  L            Login",
        "  o            Logout",
        "",
        "  r            Refresh now",
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
