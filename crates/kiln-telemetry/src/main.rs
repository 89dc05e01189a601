//! kiln-telemetry — terminal dashboard for a running kiln renderer.
//!
//! Listens for the JSON snapshots kiln sends over UDP and draws frame
//! timing, per-pass draw calls, scene counts and shader reloads with
//! ratatui.
//!
//! Run the demo (diagnostics are on by default), then
//! `cargo run -p kiln-telemetry [address]`. The address defaults to
//! `127.0.0.1:9100`.

use std::collections::VecDeque;
use std::io;
use std::net::UdpSocket;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph, Sparkline};
use ratatui::Terminal;
use serde::Deserialize;

const DEFAULT_ADDRESS: &str = "127.0.0.1:9100";

// ── Wire types (kiln's diag::DiagSnapshot) ──────────────────────────────

#[derive(Deserialize, Clone, Default, Debug, PartialEq)]
struct DiagSnapshot {
    fps: f32,
    frame_ms: f32,
    frame_count: u64,
    elapsed_secs: f32,
    entities: usize,
    lights: usize,
    emitters: usize,
    living_particles: usize,
    particle_capacity: usize,
    #[serde(default)]
    passes: Vec<PassInfo>,
    total_draw_calls: u32,
    #[serde(default)]
    reloads: Vec<ReloadEventInfo>,
}

#[derive(Deserialize, Clone, Default, Debug, PartialEq)]
struct PassInfo {
    name: String,
    draw_calls: u32,
}

#[derive(Deserialize, Clone, Default, Debug, PartialEq)]
struct ReloadEventInfo {
    timestamp_secs: f32,
    path: String,
    kind: String,
    success: bool,
    error: Option<String>,
}

// ── Tabs ─────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Tab {
    Overview,
    Passes,
    Reloads,
}

impl Tab {
    const ALL: [Tab; 3] = [Tab::Overview, Tab::Passes, Tab::Reloads];

    fn next(self) -> Self {
        match self {
            Tab::Overview => Tab::Passes,
            Tab::Passes => Tab::Reloads,
            Tab::Reloads => Tab::Overview,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::Passes => "Passes",
            Tab::Reloads => "Reloads",
        }
    }
}

// ── App state ────────────────────────────────────────────────────────────

const HISTORY_CAP: usize = 1200;
const RELOAD_LOG_CAP: usize = 500;

struct App {
    latest: DiagSnapshot,
    fps_history: VecDeque<u64>,
    /// Frame time in microseconds.
    frame_history: VecDeque<u64>,
    particle_history: VecDeque<u64>,
    reload_log: Vec<ReloadEventInfo>,
    active_tab: Tab,
    paused: bool,
    connected: bool,
}

impl App {
    fn new() -> Self {
        Self {
            latest: DiagSnapshot::default(),
            fps_history: VecDeque::with_capacity(HISTORY_CAP),
            frame_history: VecDeque::with_capacity(HISTORY_CAP),
            particle_history: VecDeque::with_capacity(HISTORY_CAP),
            reload_log: Vec::new(),
            active_tab: Tab::Overview,
            paused: false,
            connected: false,
        }
    }

    fn push_snapshot(&mut self, mut snap: DiagSnapshot) {
        if self.paused {
            return;
        }

        push_capped(&mut self.fps_history, snap.fps.round().max(0.0) as u64);
        push_capped(&mut self.frame_history, (snap.frame_ms * 1000.0).round().max(0.0) as u64);
        push_capped(&mut self.particle_history, snap.living_particles as u64);

        self.reload_log.append(&mut snap.reloads);
        if self.reload_log.len() > RELOAD_LOG_CAP {
            let excess = self.reload_log.len() - RELOAD_LOG_CAP;
            self.reload_log.drain(..excess);
        }

        self.latest = snap;
        self.connected = true;
    }
}

fn push_capped(history: &mut VecDeque<u64>, value: u64) {
    if history.len() >= HISTORY_CAP {
        history.pop_front();
    }
    history.push_back(value);
}

fn main() -> io::Result<()> {
    let address = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_ADDRESS.to_string());
    let recv_socket = UdpSocket::bind(&address).map_err(|e| {
        io::Error::new(e.kind(), format!("failed to bind {address} (is another kiln-telemetry running?): {e}"))
    })?;
    recv_socket.set_nonblocking(true)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new();
    let mut buf = [0u8; 65536];

    loop {
        // Drain all pending datagrams.
        while let Ok(n) = recv_socket.recv(&mut buf) {
            if let Ok(snap) = serde_json::from_slice::<DiagSnapshot>(&buf[..n]) {
                app.push_snapshot(snap);
            }
        }

        terminal.draw(|f| ui(f, &app))?;

        if event::poll(Duration::from_millis(50))?
            && let Event::Key(key) = event::read()?
            && handle_key(&mut app, key)
        {
            break;
        }
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

// ── Key handling ─────────────────────────────────────────────────────────

/// Returns `true` if the app should quit.
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Char('p') => app.paused = !app.paused,
        KeyCode::Tab => app.active_tab = app.active_tab.next(),
        KeyCode::Char(c @ '1'..='3') => {
            let index = c as usize - '1' as usize;
            app.active_tab = Tab::ALL[index];
        }
        _ => {}
    }
    false
}

// ── Drawing ──────────────────────────────────────────────────────────────

fn ui(f: &mut ratatui::Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Length(1), // tab bar
            Constraint::Min(6),    // tab content
            Constraint::Length(1), // help bar
        ])
        .split(f.area());

    draw_header(f, app, chunks[0]);
    draw_tab_bar(f, app, chunks[1]);
    match app.active_tab {
        Tab::Overview => draw_overview_tab(f, app, chunks[2]),
        Tab::Passes => draw_passes_tab(f, app, chunks[2]),
        Tab::Reloads => draw_reload_log(f, app, chunks[2]),
    }
    draw_help_bar(f, chunks[3]);
}

fn draw_header(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let s = &app.latest;
    let (status, status_color) = if app.paused {
        (" PAUSED ", Color::Yellow)
    } else if app.connected {
        (" LIVE ", Color::Green)
    } else {
        (" WAITING ", Color::DarkGray)
    };

    let label = Style::default().fg(Color::DarkGray);
    let value = Style::default().fg(Color::White);
    let text = Line::from(vec![
        Span::styled(format!(" {status} "), Style::default().bg(status_color).fg(Color::Black)),
        Span::raw("  "),
        Span::styled("FPS: ", label),
        Span::styled(
            format!("{:.1}", s.fps),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled("Frame: ", label),
        Span::styled(format!("{}", s.frame_count), value),
        Span::raw("  |  "),
        Span::styled("\u{0394}: ", label),
        Span::styled(format!("{:.2}ms", s.frame_ms), value),
        Span::raw("  |  "),
        Span::styled("Up: ", label),
        Span::styled(format_uptime(s.elapsed_secs), value),
    ]);

    let block = Block::default()
        .title(" kiln-telemetry ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_tab_bar(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(" ")];
    for (i, tab) in Tab::ALL.iter().enumerate() {
        let (num_style, label_style) = if *tab == app.active_tab {
            (
                Style::default().bg(Color::Cyan).fg(Color::Black).add_modifier(Modifier::BOLD),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )
        } else {
            (Style::default().fg(Color::DarkGray), Style::default().fg(Color::DarkGray))
        };
        spans.push(Span::styled(format!(" {} ", i + 1), num_style));
        spans.push(Span::styled(format!("{} ", tab.label()), label_style));
        spans.push(Span::raw("  "));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

// ── Overview Tab ─────────────────────────────────────────────────────────

fn draw_overview_tab(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(5)])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    let fps: Vec<u64> = app.fps_history.iter().copied().collect();
    let (lo, avg, hi) = stats(&fps);
    draw_sparkline(
        f,
        top[0],
        " FPS History ",
        &fps,
        Color::Green,
        format!("min: {lo:.0}  avg: {avg:.0}  max: {hi:.0}"),
    );

    let frame: Vec<u64> = app.frame_history.iter().copied().collect();
    let (lo, avg, hi) = stats(&frame);
    draw_sparkline(
        f,
        top[1],
        " Frame Time ",
        &frame,
        Color::Yellow,
        format!(
            "min: {:.2}ms  avg: {:.2}ms  max: {:.2}ms",
            lo / 1000.0,
            avg / 1000.0,
            hi / 1000.0
        ),
    );

    let particles: Vec<u64> = app.particle_history.iter().copied().collect();
    draw_sparkline(
        f,
        bottom[0],
        " Living Particles ",
        &particles,
        Color::Magenta,
        format!("{} / {}", app.latest.living_particles, app.latest.particle_capacity),
    );

    draw_scene_panel(f, app, bottom[1]);
}

fn draw_sparkline(f: &mut ratatui::Frame, area: Rect, title: &str, data: &[u64], color: Color, footer: String) {
    let block = Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.height < 2 {
        return;
    }

    let spark_area = Rect {
        height: inner.height - 1,
        ..inner
    };
    let footer_area = Rect {
        y: inner.y + inner.height - 1,
        height: 1,
        ..inner
    };
    // Newest samples on the right edge.
    let visible = &data[data.len().saturating_sub(spark_area.width as usize)..];
    f.render_widget(Sparkline::default().data(visible).style(Style::default().fg(color)), spark_area);
    f.render_widget(
        Paragraph::new(Span::styled(footer, Style::default().fg(Color::DarkGray))),
        footer_area,
    );
}

fn draw_scene_panel(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let s = &app.latest;
    let row = |name: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("  {name:<12}"), Style::default().fg(Color::DarkGray)),
            Span::styled(value, Style::default().fg(Color::White)),
        ])
    };
    let lines = vec![
        row("Entities", s.entities.to_string()),
        row("Lights", s.lights.to_string()),
        row("Emitters", s.emitters.to_string()),
        row("Particles", format!("{} / {}", s.living_particles, s.particle_capacity)),
        row("Draw calls", s.total_draw_calls.to_string()),
    ];
    let block = Block::default()
        .title(" Scene ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

// ── Passes Tab ───────────────────────────────────────────────────────────

fn draw_passes_tab(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(format!(" Draw Calls per Pass (total {}) ", app.latest.total_draw_calls))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    if app.latest.passes.is_empty() {
        let text = Span::styled("  No frame received yet", Style::default().fg(Color::DarkGray));
        f.render_widget(Paragraph::new(text).block(block), area);
        return;
    }

    let bars: Vec<Bar> = app
        .latest
        .passes
        .iter()
        .map(|p| {
            Bar::default()
                .label(Line::from(p.name.clone()))
                .value(u64::from(p.draw_calls))
                .style(Style::default().fg(pass_color(&p.name)))
        })
        .collect();
    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(9)
        .bar_gap(2)
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan));
    f.render_widget(chart, area);
}

fn pass_color(name: &str) -> Color {
    match name {
        "geometry" => Color::Blue,
        "lighting" => Color::Yellow,
        "particles" => Color::Magenta,
        "overlay" => Color::Green,
        _ => Color::Gray,
    }
}

// ── Reloads Tab ──────────────────────────────────────────────────────────

fn draw_reload_log(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(format!(" Shader Reloads ({}) ", app.reload_log.len()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if app.reload_log.is_empty() {
        let text = Span::styled("  No reloads yet", Style::default().fg(Color::DarkGray));
        f.render_widget(Paragraph::new(text), inner);
        return;
    }

    let visible = inner.height as usize;
    let start = app.reload_log.len().saturating_sub(visible);
    let lines: Vec<Line> = app
        .reload_log
        .iter()
        .skip(start)
        .map(|ev| {
            let (badge, badge_color) = if ev.success { (" OK ", Color::Green) } else { ("FAIL", Color::Red) };
            let mut spans = vec![
                Span::styled(format!("  [{:>6.1}s]  ", ev.timestamp_secs), Style::default().fg(Color::DarkGray)),
                Span::styled(
                    format!("{badge} "),
                    Style::default().fg(badge_color).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("{} ({})", ev.path, ev.kind), Style::default().fg(Color::White)),
            ];
            if let Some(err) = &ev.error {
                spans.push(Span::styled(format!(" - \"{err}\""), Style::default().fg(Color::Red)));
            }
            Line::from(spans)
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_help_bar(f: &mut ratatui::Frame, area: Rect) {
    let key = Style::default().fg(Color::Cyan);
    let help = Line::from(vec![
        Span::styled(" [1-3]", key),
        Span::raw(" tab  "),
        Span::styled("[Tab]", key),
        Span::raw(" next  "),
        Span::styled("[p]", key),
        Span::raw(" pause  "),
        Span::styled("[q]", key),
        Span::raw(" quit"),
    ]);
    f.render_widget(Paragraph::new(help), area);
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn stats(data: &[u64]) -> (f64, f64, f64) {
    let (Some(min), Some(max)) = (data.iter().min(), data.iter().max()) else {
        return (0.0, 0.0, 0.0);
    };
    let avg = data.iter().sum::<u64>() as f64 / data.len() as f64;
    (*min as f64, avg, *max as f64)
}

fn format_uptime(secs: f32) -> String {
    let total = secs as u64;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    if h > 0 {
        format!("{h}h{m}m{s}s")
    } else if m > 0 {
        format!("{m}m{s}s")
    } else {
        format!("{secs:.1}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    const SAMPLE: &str = r#"{
        "fps": 59.6, "frame_ms": 16.78, "frame_count": 300, "elapsed_secs": 5.0,
        "entities": 4, "lights": 3, "emitters": 1,
        "living_particles": 80, "particle_capacity": 100,
        "passes": [{"name": "geometry", "draw_calls": 4}, {"name": "lighting", "draw_calls": 3}],
        "total_draw_calls": 7,
        "reloads": [{"timestamp_secs": 4.5, "path": "lighting.wgsl", "kind": "Lighting",
                     "success": false, "error": "parse error"}]
    }"#;

    fn sample() -> DiagSnapshot {
        serde_json::from_str(SAMPLE).expect("sample parses")
    }

    #[test]
    fn parses_kiln_snapshot() {
        let snap = sample();
        assert_eq!(snap.passes.len(), 2);
        assert_eq!(snap.passes[1].name, "lighting");
        assert_eq!(snap.reloads[0].error.as_deref(), Some("parse error"));
    }

    #[test]
    fn reload_list_is_optional_on_the_wire() {
        let snap: DiagSnapshot = serde_json::from_str(
            r#"{"fps": 1, "frame_ms": 1, "frame_count": 1, "elapsed_secs": 1, "entities": 0,
                "lights": 0, "emitters": 0, "living_particles": 0, "particle_capacity": 0,
                "passes": [], "total_draw_calls": 0}"#,
        )
        .expect("parses without reloads");
        assert!(snap.reloads.is_empty());
    }

    #[test]
    fn snapshots_fill_history_and_reload_log() {
        let mut app = App::new();
        app.push_snapshot(sample());
        app.push_snapshot(sample());

        assert!(app.connected);
        assert_eq!(app.fps_history.back(), Some(&60));
        assert_eq!(app.frame_history.back(), Some(&16780));
        assert_eq!(app.reload_log.len(), 2, "reloads accumulate across snapshots");
        assert!(app.latest.reloads.is_empty(), "moved into the log");
    }

    #[test]
    fn history_is_capped() {
        let mut app = App::new();
        for _ in 0..HISTORY_CAP + 10 {
            app.push_snapshot(DiagSnapshot::default());
        }
        assert_eq!(app.fps_history.len(), HISTORY_CAP);
        assert_eq!(app.particle_history.len(), HISTORY_CAP);
    }

    #[test]
    fn paused_app_ignores_snapshots() {
        let mut app = App::new();
        app.paused = true;
        app.push_snapshot(sample());
        assert!(!app.connected);
        assert!(app.fps_history.is_empty());
    }

    #[test]
    fn keys_switch_tabs_and_quit() {
        let mut app = App::new();
        let press = |code| KeyEvent::new(code, KeyModifiers::NONE);
        assert!(!handle_key(&mut app, press(KeyCode::Char('3'))));
        assert_eq!(app.active_tab, Tab::Reloads);
        handle_key(&mut app, press(KeyCode::Tab));
        assert_eq!(app.active_tab, Tab::Overview);
        assert!(handle_key(&mut app, press(KeyCode::Char('q'))));
    }

    #[test]
    fn stats_and_uptime_format() {
        assert_eq!(stats(&[]), (0.0, 0.0, 0.0));
        assert_eq!(stats(&[2, 4, 6]), (2.0, 4.0, 6.0));
        assert_eq!(format_uptime(5.5), "5.5s");
        assert_eq!(format_uptime(125.0), "2m5s");
        assert_eq!(format_uptime(3725.0), "1h2m5s");
    }
}
