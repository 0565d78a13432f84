use chrono::Utc;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::lifecycle::PomoState;
use crate::models::Status;
use crate::storage::Store;

use super::app::{App, Mode};
use super::editor::{Editor, Field};

const HELP: &[(&str, &str)] = &[
    ("s", "start pomodoro"),
    ("x", "cancel pomodoro / break"),
    ("b", "complete pomodoro and start break"),
    ("n", "new task"),
    ("e / Enter", "edit task"),
    ("d / Del", "delete task"),
    ("←↓↑→ / hjkl", "select"),
    ("shift+←↓↑→ / HJKL", "move task"),
    ("?", "toggle help"),
    ("q / ctrl+c", "quit"),
];

pub fn ui<S: Store>(f: &mut Frame, app: &mut App<S>) {
    let banner = call_to_action(app.pomodoro.state());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(if banner.is_some() { 3 } else { 0 }),
            Constraint::Min(0),    // Board
            Constraint::Length(1), // Footer
        ])
        .split(f.area());

    if let Some(text) = banner {
        let banner = Paragraph::new(text)
            .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(banner, chunks[0]);
    }

    if app.show_help {
        render_help(f, chunks[1]);
    } else {
        render_board(f, app, chunks[1]);
    }
    render_footer(f, app, chunks[2]);

    match &app.mode {
        Mode::Normal => {}
        Mode::NewTask(editor) => render_editor(f, editor, "New Task"),
        Mode::EditTask(editor) => render_editor(f, editor, "Edit Task"),
        Mode::Confirm(prompt) => {
            let area = centered_rect(50, 3, f.area());
            f.render_widget(Clear, area);
            let text = Line::from(vec![
                Span::raw(prompt.text.as_str()),
                Span::styled("  (y/n)", Style::default().fg(Color::Gray)),
            ]);
            let popup = Paragraph::new(text)
                .block(Block::default().borders(Borders::ALL).title("Confirm"));
            f.render_widget(popup, area);
        }
    }
}

fn render_board<S: Store>(f: &mut Frame, app: &mut App<S>, area: Rect) {
    let areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3); 3])
        .split(area);
    let focus = app.board.focus();

    for (status, area) in Status::ALL.into_iter().zip(areas.iter()) {
        let focused = status == focus;
        let items: Vec<ListItem> = app.board.columns()[status.index()]
            .tasks
            .iter()
            .map(|t| {
                let mut lines = vec![Line::from(t.name.clone())];
                if !t.notes.is_empty() {
                    lines.push(Line::styled(
                        t.notes.lines().next().unwrap_or_default().to_string(),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                ListItem::new(lines)
            })
            .collect();

        let border = if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border)
                    .title(status.title()),
            )
            .highlight_style(if focused {
                Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray)
            } else {
                Style::default()
            })
            .highlight_symbol(">> ");

        f.render_stateful_widget(list, *area, app.board.column_state_mut(status));
    }
}

fn render_footer<S: Store>(f: &mut Frame, app: &App<S>, area: Rect) {
    let pomodoro = &app.pomodoro;
    let completed = pomodoro.completed_today();
    let goal = pomodoro.config().daily_goal;
    let goal_met = goal > 0 && completed >= goal as usize;

    let mut spans = vec![
        Span::styled(
            format!(" {} ", state_label(pomodoro.state(), completed)),
            Style::default().fg(Color::Black).bg(Color::Magenta),
        ),
        Span::raw(" "),
        Span::styled(
            format!("🍅 {} 🍅", pomodoro.timer().view(Utc::now())),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
    ];
    if let Some(err) = &app.error {
        spans.push(Span::styled(
            format!("error: {err} "),
            Style::default().fg(Color::Red),
        ));
    }
    spans.push(Span::styled(
        pomos_label(completed, goal),
        if goal_met {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        },
    ));
    spans.push(Span::raw("  "));
    spans.push(if pomodoro.is_dirty() {
        Span::styled("● saving", Style::default().fg(Color::Yellow))
    } else {
        Span::styled("✓ saved", Style::default().fg(Color::Green))
    });
    spans.push(Span::styled("  ? help", Style::default().fg(Color::Gray)));

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_help(f: &mut Frame, area: Rect) {
    let lines: Vec<Line> = HELP
        .iter()
        .map(|(key, what)| {
            Line::from(vec![
                Span::styled(format!("{key:>20}  "), Style::default().fg(Color::Cyan)),
                Span::raw(*what),
            ])
        })
        .collect();
    let help = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(help, area);
}

fn render_editor(f: &mut Frame, editor: &Editor, title: &str) {
    let area = centered_rect(60, 8, f.area());
    f.render_widget(Clear, area);

    let field_style = |field: Field| {
        if editor.field == field {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        }
    };
    let mut lines = vec![
        Line::styled("Name", field_style(Field::Name).add_modifier(Modifier::BOLD)),
        Line::styled(editor.name.as_str(), field_style(Field::Name)),
        Line::styled("Notes", field_style(Field::Notes).add_modifier(Modifier::BOLD)),
        Line::styled(editor.notes.as_str(), field_style(Field::Notes)),
    ];
    match editor.error {
        Some(err) => lines.push(Line::styled(err, Style::default().fg(Color::Red))),
        None => lines.push(Line::styled(
            "Tab: switch field | Enter: save | Esc: cancel",
            Style::default().fg(Color::Gray),
        )),
    }

    let input = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(input, area);
}

/// The banner shown above the board, if the state calls for one.
pub fn call_to_action(state: PomoState) -> Option<&'static str> {
    match state {
        PomoState::Idle => Some("No pomodoro active."),
        PomoState::Ended => Some("Your pomodoro has ended. Update tasks and start your break!"),
        PomoState::BreakEnded => Some("Your break is over. Time to start another pomodoro!"),
        _ => None,
    }
}

pub fn state_label(state: PomoState, completed: usize) -> String {
    match state {
        PomoState::Idle => "idle".to_string(),
        PomoState::Active => format!("pomo {} in progress", completed + 1),
        PomoState::Ended => format!("pomo {} ended -- report tasks", completed + 1),
        PomoState::Break => "on a break".to_string(),
        PomoState::LongBreak => "on a long break".to_string(),
        PomoState::BreakEnded => "break ended -- start another pomo".to_string(),
    }
}

/// "3/8 pomos", with a trophy once the daily goal is met.
pub fn pomos_label(completed: usize, goal: u32) -> String {
    let mut s = String::new();
    if goal > 0 && completed >= goal as usize {
        s.push_str("🏆 ");
    }
    s.push_str(&completed.to_string());
    if goal > 0 {
        s.push_str(&format!("/{goal}"));
    }
    if completed == 1 && goal == 0 {
        s.push_str(" pomo");
    } else {
        s.push_str(" pomos");
    }
    s
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let height = height.min(r.height);
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((r.height - height) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn footer_labels() {
        assert_eq!(state_label(PomoState::Active, 2), "pomo 3 in progress");
        assert_eq!(state_label(PomoState::Ended, 0), "pomo 1 ended -- report tasks");
        assert_eq!(pomos_label(1, 0), "1 pomo");
        assert_eq!(pomos_label(0, 0), "0 pomos");
        assert_eq!(pomos_label(3, 8), "3/8 pomos");
        assert_eq!(pomos_label(8, 8), "🏆 8/8 pomos");
    }

    #[test]
    fn banner_only_when_waiting_on_the_user() {
        assert!(call_to_action(PomoState::Idle).is_some());
        assert!(call_to_action(PomoState::Ended).is_some());
        assert!(call_to_action(PomoState::BreakEnded).is_some());
        assert!(call_to_action(PomoState::Active).is_none());
        assert!(call_to_action(PomoState::LongBreak).is_none());
    }

    #[test]
    fn centered_rect_fits_small_areas() {
        let r = centered_rect(60, 8, Rect::new(0, 0, 40, 5));
        assert!(r.height <= 5);
    }
}
