mod issue_detail;
mod issue_list;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::{App, InputMode, Screen};
use crate::store::Phase;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);

    match app.screen {
        Screen::IssueList => issue_list::render(frame, app, chunks[1]),
        Screen::IssueDetail => issue_detail::render(frame, app, chunks[1]),
    }

    render_status_bar(frame, app, chunks[2]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.screen {
        Screen::IssueList => format!("triage - {} issues", app.repo),
        Screen::IssueDetail => {
            if let Some(issue) = &app.selected_issue {
                format!("triage - #{}: {}", issue.number, issue.title)
            } else {
                format!("triage - {}", app.repo)
            }
        }
    };

    let header = Paragraph::new(Line::from(vec![Span::styled(
        title,
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )]))
    .style(Style::default().bg(Color::DarkGray));

    frame.render_widget(header, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let error = match app.screen {
        Screen::IssueList => app.issues.error(),
        Screen::IssueDetail => app.detail_error.as_deref().or(app.comments.error()),
    };

    let status = if let Some(error) = error {
        Line::from(vec![Span::styled(
            format!("Error: {} (r: retry)", error),
            Style::default().fg(Color::Red),
        )])
    } else if loading_label(app).is_some() {
        Line::from(vec![Span::styled(
            loading_label(app).unwrap_or("Loading..."),
            Style::default().fg(Color::Yellow),
        )])
    } else if app.input_mode == InputMode::Search {
        Line::from(vec![Span::styled(
            "type to search | Enter: run | Esc: cancel",
            Style::default().fg(Color::Gray),
        )])
    } else {
        let help = match app.screen {
            Screen::IssueList => {
                "/: search | s: state | i: scope | j/k/g/G: nav | Enter: open | o: browser | R: reload | q: quit"
            }
            Screen::IssueDetail => "j/k/g/G: comments | o: browser | R: reload | q: back",
        };
        Line::from(vec![Span::styled(help, Style::default().fg(Color::Gray))])
    };

    let status_bar = Paragraph::new(status).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status_bar, area);
}

/// Truncate to `max` characters with a `...` marker. Counts chars, not
/// bytes, so multi-byte names never split mid-codepoint.
fn truncated(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

fn loading_label(app: &App) -> Option<&'static str> {
    match app.screen {
        Screen::IssueList => match app.issues.phase() {
            Phase::Loading => Some("Searching issues..."),
            Phase::LoadingMore => Some("Loading more issues..."),
            _ => None,
        },
        Screen::IssueDetail => {
            if app.detail_loading {
                return Some("Loading issue...");
            }
            match app.comments.phase() {
                Phase::Loading => Some("Loading comments..."),
                Phase::LoadingMore => Some("Loading more comments..."),
                _ => None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::truncated;

    #[test]
    fn truncation_counts_chars_not_bytes() {
        // Byte-indexed slicing would panic inside the first codepoint here.
        assert_eq!(truncated("ülkü-çağrı-öztürk", 15), "ülkü-çağrı-ö...");
        assert_eq!(
            truncated("日本語のユーザー名がとても長いです", 15),
            "日本語のユーザー名がとて..."
        );
    }

    #[test]
    fn short_text_passes_through() {
        assert_eq!(truncated("octocat", 15), "octocat");
        assert_eq!(truncated("exactly15chars!", 15), "exactly15chars!");
    }
}
