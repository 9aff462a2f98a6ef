use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Wrap};
use ratatui::Frame;

use super::mode::TuiState;
use crate::loader::LoadStatus;
use crate::sequencing::PlayerState;
use crate::shared::{DisplayState, LoadRow};

const HELP: &str = "space pause/resume   c cancel   r restart   ? help   esc quit";

pub fn render(frame: &mut Frame, area: Rect, state: &DisplayState, ts: &TuiState) {
    let load_rows = state.loads.len().min(6) as u16;
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),             // title + state
            Constraint::Min(7),                // session
            Constraint::Length(load_rows + 2), // instrument loads
            Constraint::Length(if ts.show_help { 3 } else { 1 }),
        ])
        .split(area);

    draw_header(frame, sections[0], state);
    draw_session(frame, sections[1], state);
    draw_loads(frame, sections[2], &state.loads);
    draw_footer(frame, sections[3], state, ts);
}

fn state_label(state: PlayerState) -> (&'static str, Color) {
    match state {
        PlayerState::Idle => ("idle", Color::DarkGray),
        PlayerState::Preparing => ("preparing", Color::Yellow),
        PlayerState::CountingDown => ("get ready", Color::Yellow),
        PlayerState::Running => ("playing", Color::Green),
        PlayerState::Paused => ("paused", Color::Cyan),
        PlayerState::Completed => ("done", Color::Blue),
        PlayerState::Cancelled => ("stopped", Color::Red),
    }
}

fn draw_header(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let (label, color) = state_label(state.state);
    let line = Line::from(vec![
        Span::styled(state.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(label, Style::default().fg(color)),
        Span::raw(format!("  voice: {}", state.view.voice)),
        Span::raw(format!("  step {}", state.view.steps_played)),
    ]);
    frame.render_widget(
        Paragraph::new(line).block(Block::default().borders(Borders::ALL).title("solfa")),
        area,
    );
}

fn draw_session(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let view = &state.view;
    let mut lines = Vec::new();

    if let Some(n) = view.countdown {
        lines.push(Line::from(Span::styled(
            format!("starting in {n}"),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
    }

    if !view.phrase_notes.is_empty() {
        lines.push(Line::from(format!(
            "cycle {}   root {}/{}",
            view.cycle, view.phrase_step, view.phrase_steps
        )));
        let mut spans = vec![Span::styled(
            "root ",
            highlight(view.active_note == Some(-1)),
        )];
        for (i, note) in view.phrase_notes.iter().enumerate() {
            spans.push(Span::styled(
                format!("{note} "),
                highlight(view.active_note == Some(i as i32)),
            ));
        }
        lines.push(Line::from(spans));
        if let Some(tip) = &view.tip {
            lines.push(Line::from(Span::styled(
                tip.clone(),
                Style::default().add_modifier(Modifier::ITALIC),
            )));
        }
    } else if !view.label.is_empty() {
        let shown = if view.revealed { view.label.as_str() } else { "?" };
        lines.push(Line::from(Span::styled(
            shown.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
    }

    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn highlight(on: bool) -> Style {
    if on {
        Style::default().fg(Color::Black).bg(Color::Green)
    } else {
        Style::default()
    }
}

fn draw_loads(frame: &mut Frame, area: Rect, loads: &[LoadRow]) {
    let block = Block::default().borders(Borders::ALL).title("instruments");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(loads.iter().take(6).map(|_| Constraint::Length(1)))
        .split(inner);

    for (row, area) in loads.iter().zip(rows.iter()) {
        let (ratio, color, label) = match (row.status, row.progress) {
            (LoadStatus::Loaded, _) => (1.0, Color::Green, format!("{} ready", row.instrument)),
            (LoadStatus::Error, _) => (0.0, Color::Red, format!("{} failed", row.instrument)),
            (status, Some(p)) => (
                p.fraction(),
                Color::Yellow,
                format!("{} {}/{} {:?}", row.instrument, p.loaded, p.total, status),
            ),
            (status, None) => (0.0, Color::DarkGray, format!("{} {status:?}", row.instrument)),
        };
        frame.render_widget(
            Gauge::default()
                .gauge_style(Style::default().fg(color))
                .ratio(ratio.clamp(0.0, 1.0))
                .label(label),
            *area,
        );
    }
}

fn draw_footer(frame: &mut Frame, area: Rect, state: &DisplayState, ts: &TuiState) {
    let mut lines = Vec::new();
    if let Some(message) = &state.message {
        lines.push(Line::from(Span::styled(message.clone(), Style::default().fg(Color::Red))));
    }
    if ts.show_help || lines.is_empty() {
        lines.push(Line::from(HELP));
    }
    frame.render_widget(Paragraph::new(lines), area);
}
