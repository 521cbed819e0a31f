use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::App;
use crate::store::Phase;
use crate::types::IssueState;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(issue) = &app.selected_issue else {
        let message = if app.detail_loading {
            "Loading issue..."
        } else if app.detail_error.is_some() {
            "Could not load issue - press r to retry"
        } else {
            "No issue selected"
        };
        let empty = Paragraph::new(message)
            .block(Block::default().borders(Borders::ALL))
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(empty, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Percentage(35),
            Constraint::Min(0),
        ])
        .split(area);

    render_meta(frame, app, issue, chunks[0]);
    render_body(frame, issue, chunks[1]);
    render_comments(frame, app, chunks[2]);
}

fn render_meta(frame: &mut Frame, app: &App, issue: &crate::types::Issue, area: Rect) {
    let state_color = match issue.state {
        IssueState::Open => Color::Green,
        IssueState::Closed => Color::Red,
    };

    let lines = vec![
        Line::from(vec![
            Span::styled(
                format!("#{} ", issue.number),
                Style::default().fg(Color::Cyan),
            ),
            Span::styled(
                issue.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled(format!("{} ", issue.state), Style::default().fg(state_color)),
            Span::styled(
                format!("@{} ", issue.author),
                Style::default().fg(Color::Gray),
            ),
            Span::styled(
                format!(
                    "opened {} | updated {}",
                    issue.created_at.format("%Y-%m-%d"),
                    issue.updated_at.format("%Y-%m-%d")
                ),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
    ];

    let meta = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", app.repo)),
    );
    frame.render_widget(meta, area);
}

fn render_body(frame: &mut Frame, issue: &crate::types::Issue, area: Rect) {
    let body = if issue.body.is_empty() {
        Span::styled("(no description)", Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(issue.body.as_str())
    };

    let paragraph = Paragraph::new(Line::from(body))
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(" Body "));
    frame.render_widget(paragraph, area);
}

fn render_comments(frame: &mut Frame, app: &App, area: Rect) {
    let loaded = app.comments.len();
    let total = app.comments.total_count();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Comments ({}/{}) ", loaded, total));

    if app.comments.is_empty() {
        let message = match app.comments.phase() {
            Phase::Idle | Phase::Loading => "Loading comments...",
            Phase::Error => "Could not load comments - press r to retry",
            _ => "No comments yet",
        };
        let empty = Paragraph::new(message)
            .block(block)
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(empty, area);
        return;
    }

    let w = area.width.saturating_sub(2) as usize;
    let fixed = 29; // @author(16) + space + date(10) + spaces
    let flex = w.saturating_sub(fixed).max(10);

    let items: Vec<ListItem> = app
        .comments
        .items()
        .iter()
        .enumerate()
        .map(|(i, comment)| {
            let is_selected = i == app.comment_index;
            let style = if is_selected {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            let first_line = comment.body.lines().next().unwrap_or("");
            let excerpt = super::truncated(first_line, flex);
            let author = super::truncated(&comment.author, 15);

            let line = Line::from(vec![
                Span::styled(
                    format!("@{:<15}", author),
                    Style::default().fg(Color::Gray),
                ),
                Span::raw(" "),
                Span::styled(
                    format!("{} ", comment.created_at.format("%Y-%m-%d")),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(excerpt, style),
            ]);

            ListItem::new(line)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = ListState::default();
    state.select(Some(app.comment_index));

    frame.render_stateful_widget(list, area, &mut state);
}
