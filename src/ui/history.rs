use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};
use typeflow::{history::SessionSummary, rating::format_clock, session::CompletionReason};

use crate::App;

/// Pure presenter for a single history row
pub fn present_row(summary: &SessionSummary) -> Row<'static> {
    let accuracy_color = match summary.accuracy {
        98.. => Color::Green,
        90..=97 => Color::Yellow,
        _ => Color::Red,
    };

    let ending = match summary.completion {
        CompletionReason::Matched => "done",
        CompletionReason::TimeExpired => "time",
    };

    Row::new(vec![
        Cell::from(summary.finished_at.format("%Y-%m-%d %H:%M").to_string()),
        Cell::from(format!("{}/{}", summary.category, summary.item)),
        Cell::from(summary.wpm.to_string()).style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(format!("{}%", summary.accuracy)).style(Style::default().fg(accuracy_color)),
        Cell::from(summary.flow.map_or_else(|| "-".to_string(), |f| f.to_string())),
        Cell::from(format_clock(summary.elapsed_ms / 1000)),
        Cell::from(ending),
    ])
}

/// Render the session history screen
pub fn render_history(app: &mut App, f: &mut Frame) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Table
            Constraint::Length(2), // Instructions
        ])
        .split(area);

    let title = Paragraph::new(format!("Recent Sessions ({})", app.recent.len()))
        .block(Block::default().borders(Borders::ALL).title("History"))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    if app.recent.is_empty() {
        let message = if app.history.is_some() {
            "No sessions recorded yet. Finish a practice run to see it here."
        } else {
            "History is unavailable."
        };
        let no_data = Paragraph::new(message)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray));
        f.render_widget(no_data, chunks[1]);
    } else {
        let table_height = chunks[1].height.saturating_sub(3) as usize; // borders + header
        let max_scroll = app.recent.len().saturating_sub(table_height);
        if app.history_view.scroll_offset > max_scroll {
            app.history_view.scroll_offset = max_scroll;
        }

        let header = Row::new(vec![
            Cell::from("Finished"),
            Cell::from("Text"),
            Cell::from("WPM"),
            Cell::from("Acc"),
            Cell::from("Flow"),
            Cell::from("Time"),
            Cell::from("End"),
        ])
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

        let visible_rows: Vec<Row> = app
            .recent
            .iter()
            .skip(app.history_view.scroll_offset)
            .take(table_height)
            .map(present_row)
            .collect();

        let widths = [
            Constraint::Length(17),
            Constraint::Min(16),
            Constraint::Length(5),
            Constraint::Length(5),
            Constraint::Length(5),
            Constraint::Length(6),
            Constraint::Length(5),
        ];

        let table = Table::new(visible_rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title("Sessions"))
            .column_spacing(2);

        f.render_widget(table, chunks[1]);
    }

    let instructions = Paragraph::new("(↑/↓) scroll  (b/backspace) back  (n) next  (r) retry  (esc) quit")
        .alignment(Alignment::Center)
        .wrap(ratatui::widgets::Wrap { trim: true });
    f.render_widget(instructions, chunks[2]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    #[test]
    fn present_row_handles_missing_flow() {
        let summary = SessionSummary {
            category: "tests".into(),
            item: "short".into(),
            wpm: 51,
            accuracy: 93,
            flow: None,
            elapsed_ms: 75_000,
            chars_typed: 320,
            completion: CompletionReason::TimeExpired,
            finished_at: Local::now(),
        };

        // Row has no public accessors; building it must not panic
        let _row = present_row(&summary);
    }
}
