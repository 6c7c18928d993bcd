pub mod charting;
pub mod history;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, Gauge, GraphType, Paragraph, Widget, Wrap},
};
use typeflow::{
    metrics::normalize_line_endings,
    rating::{format_clock, FlowLevel, PerformanceRating, SpeedTier},
    session::CompletionReason,
};
use unicode_width::UnicodeWidthStr;

use crate::{App, AppState, PromptSource};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_bold() -> Style {
    bold().add_modifier(Modifier::DIM)
}

/// Glyph for a character that would otherwise be invisible
fn visible(c: char) -> char {
    match c {
        ' ' => '·',
        '\n' => '↵',
        c => c,
    }
}

/// Colorizes the target against the typed text, one `Line` per target line.
///
/// Newlines in the target end the current line after a `↵` marker. Typed
/// characters beyond the target are appended in red.
pub fn prompt_lines(target: &str, input: &str) -> Vec<Line<'static>> {
    let green_bold = bold().fg(Color::Green);
    let red_bold = bold().fg(Color::Red);
    let cursor = dim_bold().add_modifier(Modifier::UNDERLINED);

    let typed: Vec<char> = input.chars().collect();
    let mut lines = Vec::new();
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut target_len = 0;

    for (idx, expected) in target.chars().enumerate() {
        target_len += 1;
        let span = match typed.get(idx) {
            Some(&c) if c == expected => {
                let shown = if expected == '\n' { '↵' } else { expected };
                Span::styled(shown.to_string(), green_bold)
            }
            Some(&c) => Span::styled(visible(c).to_string(), red_bold),
            None if idx == typed.len() => {
                let shown = if expected == '\n' { '↵' } else { expected };
                Span::styled(shown.to_string(), cursor)
            }
            None => {
                let shown = if expected == '\n' { '↵' } else { expected };
                Span::styled(shown.to_string(), dim_bold())
            }
        };
        spans.push(span);

        if expected == '\n' {
            lines.push(Line::from(std::mem::take(&mut spans)));
        }
    }

    if typed.len() > target_len {
        let overrun: String = typed[target_len..].iter().copied().map(visible).collect();
        spans.push(Span::styled(overrun, red_bold));
    }

    if !spans.is_empty() || lines.is_empty() {
        lines.push(Line::from(spans));
    }
    lines
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Results => self.render_results(area, buf),
            _ => self.render_typing(area, buf),
        }
    }
}

impl App {
    fn render_typing(&self, area: Rect, buf: &mut Buffer) {
        let session = &self.session;
        let now = self.now();
        let metrics = session.metrics();

        let target = normalize_line_endings(session.target());
        let input = normalize_line_endings(session.input());
        let lines = prompt_lines(&target, &input);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // title
                Constraint::Length(1), // padding
                Constraint::Min(1),    // prompt
                Constraint::Length(1), // metrics
                Constraint::Length(1), // progress
                Constraint::Length(1), // padding
                Constraint::Length(1), // legend
            ])
            .split(area);

        Paragraph::new(Span::styled(self.source.label(), bold().fg(Color::Cyan)))
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        // a short single-line prompt reads best centered
        let fits_one_line = !target.contains('\n')
            && target.width().max(input.width()) < chunks[2].width as usize;
        Paragraph::new(lines)
            .alignment(if fits_one_line {
                Alignment::Center
            } else {
                Alignment::Left
            })
            .wrap(Wrap { trim: false })
            .render(chunks[2], buf);

        let mut stats = vec![
            Span::styled(format!("{} wpm", metrics.wpm), bold()),
            Span::raw("   "),
            Span::styled(format!("{}% acc", metrics.accuracy), bold()),
        ];
        if session.config().track_flow {
            stats.push(Span::raw("   "));
            stats.push(Span::styled(format!("{} flow", metrics.flow), bold()));
        }
        stats.push(Span::raw("   "));
        stats.push(Span::styled(
            format_clock(session.elapsed_ms(now) / 1000),
            dim_bold(),
        ));
        if let Some(left) = session.remaining(now) {
            stats.push(Span::raw("   "));
            stats.push(Span::styled(
                format!("{} left", format_clock(left.as_secs())),
                bold().fg(Color::Yellow),
            ));
        }
        Paragraph::new(Line::from(stats))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);

        Gauge::default()
            .gauge_style(Style::default().fg(Color::Magenta))
            .percent(session.progress().min(100) as u16)
            .render(chunks[4], buf);

        Paragraph::new(Span::styled(
            "(←) restart / (→) next / (esc)ape",
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[6], buf);
    }

    fn render_results(&self, area: Rect, buf: &mut Buffer) {
        let session = &self.session;
        let metrics = session.metrics();
        let magenta_style = Style::default().fg(Color::Magenta);
        let flow = session.config().track_flow.then_some(metrics.flow);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Min(1),    // chart
                Constraint::Length(1), // stats
                Constraint::Length(1), // verdict
                Constraint::Length(1), // personal best
                Constraint::Length(1), // padding
                Constraint::Length(1), // legend
            ])
            .split(area);

        let elapsed_secs = session
            .completed_at()
            .map_or(0, |done| session.elapsed_ms(done) / 1000);
        let (overall_duration, highest_wpm) =
            charting::compute_chart_params(self.samples.points(), elapsed_secs as f64);

        let tuples = self.samples.as_tuples();
        let datasets = vec![Dataset::default()
            .marker(ratatui::symbols::Marker::Braille)
            .style(magenta_style)
            .graph_type(GraphType::Line)
            .data(&tuples)];

        let chart = Chart::new(datasets)
            .x_axis(
                Axis::default()
                    .title("seconds")
                    .bounds([0.0, overall_duration])
                    .labels(vec![
                        Span::styled("0", bold()),
                        Span::styled(charting::format_label(overall_duration), bold()),
                    ]),
            )
            .y_axis(
                Axis::default()
                    .title("wpm")
                    .bounds([0.0, highest_wpm])
                    .labels(vec![
                        Span::styled("0", bold()),
                        Span::styled(charting::format_label(highest_wpm), bold()),
                    ]),
            );
        chart.render(chunks[0], buf);

        let mut stats = format!("{} wpm   {}% acc", metrics.wpm, metrics.accuracy);
        if let Some(score) = flow {
            stats.push_str(&format!("   {score} flow ({})", FlowLevel::from_score(score)));
        }
        stats.push_str(&format!("   {}", format_clock(elapsed_secs)));
        Paragraph::new(Span::styled(stats, bold()))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

        let mut verdict = vec![
            Span::styled(
                PerformanceRating::rate(metrics.wpm, metrics.accuracy, flow).to_string(),
                bold().fg(Color::Green),
            ),
            Span::raw(" · "),
            Span::styled(SpeedTier::from_wpm(metrics.wpm).to_string(), dim_bold()),
        ];
        if session.completion() == Some(CompletionReason::TimeExpired) {
            verdict.push(Span::raw(" · "));
            verdict.push(Span::styled("time's up", bold().fg(Color::Yellow)));
        }
        Paragraph::new(Line::from(verdict))
            .alignment(Alignment::Center)
            .render(chunks[2], buf);

        let best_line = match (&self.source, &self.previous_best) {
            (PromptSource::Custom, _) => None,
            (_, Some(best)) if metrics.wpm > best.wpm => Some(Span::styled(
                format!("new personal best! previous {} wpm", best.wpm),
                bold().fg(Color::Green),
            )),
            (_, Some(best)) => Some(Span::styled(
                format!("personal best {} wpm / {}% acc", best.wpm, best.accuracy),
                dim_bold(),
            )),
            (_, None) if self.history.is_some() => {
                Some(Span::styled("first run of this text", dim_bold()))
            }
            _ => None,
        };
        if let Some(line) = best_line {
            Paragraph::new(line)
                .alignment(Alignment::Center)
                .render(chunks[3], buf);
        }

        Paragraph::new(Span::styled(
            "(r)etry / (n)ext / (h)istory / (esc)ape",
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[5], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn prompt_lines_split_on_newlines() {
        let lines = prompt_lines("ab\ncd", "");
        assert_eq!(lines.len(), 2);
        assert_eq!(text(&lines[0]), "ab↵");
        assert_eq!(text(&lines[1]), "cd");
    }

    #[test]
    fn prompt_lines_styles_by_outcome() {
        let lines = prompt_lines("cat", "cb");
        let spans = &lines[0].spans;

        assert_eq!(spans[0].style.fg, Some(Color::Green));
        assert_eq!(spans[1].content, "b");
        assert_eq!(spans[1].style.fg, Some(Color::Red));
        assert!(spans[2].style.add_modifier.contains(Modifier::UNDERLINED));
    }

    #[test]
    fn prompt_lines_show_wrong_space_and_overrun() {
        let lines = prompt_lines("ab", "a  x");
        let shown = text(&lines[0]);
        assert_eq!(shown, "a··x");
    }

    #[test]
    fn prompt_lines_empty_target() {
        let lines = prompt_lines("", "");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].spans.is_empty());
    }
}
