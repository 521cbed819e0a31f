use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use crate::app::{App, InputMode};
use crate::store::Phase;
use crate::types::IssueState;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    render_search_bar(frame, app, chunks[0]);
    render_list(frame, app, chunks[1]);
}

fn render_search_bar(frame: &mut Frame, app: &App, area: Rect) {
    let editing = app.input_mode == InputMode::Search;

    let text = if editing {
        // Block cursor at the end of the input.
        Line::from(vec![
            Span::raw(app.search_input.clone()),
            Span::styled(" ", Style::default().bg(Color::White)),
        ])
    } else if app.search.term.is_empty() {
        Line::from(Span::styled(
            "press / to search",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(Span::raw(app.search.term.clone()))
    };

    let title = format!(
        " Search [state: {} | in: {}] ",
        app.search.state, app.search.scope
    );

    let border_style = if editing {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let bar = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title),
    );
    frame.render_widget(bar, area);
}

fn render_list(frame: &mut Frame, app: &App, area: Rect) {
    let loaded = app.issues.len();
    let total = app.issues.total_count();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Issues ({}/{}) ", loaded, total));

    if app.issues.is_empty() {
        let message = match app.issues.phase() {
            Phase::Idle | Phase::Loading => "Loading...",
            Phase::Error => "Search failed - press r to retry",
            _ => "No issues match this search",
        };
        let empty = Paragraph::new(message)
            .block(block)
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(empty, area);
        return;
    }

    let w = area.width.saturating_sub(2) as usize;
    let fixed = 34; // #num(7) + space + state(6) + space + space + @author(16) + comments(3)
    let flex = w.saturating_sub(fixed).max(10);

    let items: Vec<ListItem> = app
        .issues
        .items()
        .iter()
        .enumerate()
        .map(|(i, issue)| {
            let is_selected = i == app.issue_index;
            let style = if is_selected {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            let state_color = match issue.state {
                IssueState::Open => Color::Green,
                IssueState::Closed => Color::Red,
            };

            let title = super::truncated(&issue.title, flex);
            let author = super::truncated(&issue.author, 15);

            let line = Line::from(vec![
                Span::styled(
                    format!("#{:<6}", issue.number),
                    Style::default().fg(Color::Cyan),
                ),
                Span::raw(" "),
                Span::styled(format!("{:6}", issue.state), Style::default().fg(state_color)),
                Span::raw(" "),
                Span::styled(format!("{:<flex$}", title), style),
                Span::raw(" "),
                Span::styled(format!("@{:<15}", author), Style::default().fg(Color::Gray)),
                Span::styled(
                    format!("{:>3}", issue.comment_count),
                    Style::default().fg(Color::Magenta),
                ),
            ]);

            ListItem::new(line)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = ListState::default();
    state.select(Some(app.issue_index));

    frame.render_stateful_widget(list, area, &mut state);
}
