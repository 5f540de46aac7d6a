use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Margin, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Paragraph};
use unicode_width::UnicodeWidthStr;

use crate::markdown::{Style as MdStyle, StyledLine};
use crate::state::AppState;

const TITLE: &str = "⚡ AI Code Reviewer";
const EDITOR_PLACEHOLDER: &str = "Enter your code here...";
const ANALYZING_MESSAGE: &str = "Analyzing your code...";
const EMPTY_REVIEW_MESSAGE: &str = "Your AI review will appear here.";

const SPINNER_FRAMES: &[&str] = &["◐", "◓", "◑", "◒"];
/// Ticks per spinner frame, so the spinner does not blur at tick rate.
const SPINNER_SPEED_DIVISOR: usize = 4;

/// Screen regions: title bar, the two panes side by side, and a status line.
#[derive(Debug, Clone, Copy)]
pub struct AppLayout {
    pub title: Rect,
    pub editor: Rect,
    pub output: Rect,
    pub status: Rect,
}

impl AppLayout {
    /// Editor area inside its border.
    pub fn editor_inner(&self) -> Rect {
        self.editor.inner(Margin::new(1, 1))
    }

    /// Review area inside its border.
    pub fn output_inner(&self) -> Rect {
        self.output.inner(Margin::new(1, 1))
    }
}

/// Splits the screen. Shared with `update` so viewport bookkeeping and
/// drawing agree on pane sizes.
pub fn layout(area: Rect) -> AppLayout {
    let [title, panes, status] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(area);

    let [editor, output] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(panes);

    AppLayout {
        title,
        editor,
        output,
        status,
    }
}

pub fn render(frame: &mut Frame, app: &AppState) {
    let layout = layout(frame.area());

    render_title(frame, app, layout.title);
    render_editor(frame, app, layout.editor);
    render_output(frame, app, layout.output);
    render_status(frame, app, layout.status);
}

fn render_title(frame: &mut Frame, app: &AppState, area: Rect) {
    let mut spans = vec![Span::styled(TITLE, Style::default().add_modifier(Modifier::BOLD))];

    // Show the server URL when there is room for it
    let needed = TITLE.width() + 2 + app.server_url.width();
    if needed <= area.width as usize {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            app.server_url.as_str(),
            Style::default().fg(Color::DarkGray),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_editor(frame: &mut Frame, app: &AppState, area: Rect) {
    let block = Block::bordered().title(" Code ");
    let inner = area.inner(Margin::new(1, 1));

    if app.editor.buffer.text().is_empty() {
        let placeholder =
            Paragraph::new(EDITOR_PLACEHOLDER).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(block, area);
        frame.render_widget(placeholder, inner);
    } else {
        let text = Text::from(
            app.editor
                .buffer
                .lines()
                .iter()
                .map(|line| Line::raw(line.as_str()))
                .collect::<Vec<_>>(),
        );
        let paragraph = Paragraph::new(text).block(block).scroll((
            app.editor.scroll_row as u16,
            app.editor.scroll_col as u16,
        ));
        frame.render_widget(paragraph, area);
    }

    // Place the cursor when it is inside the viewport. It stays visible even
    // while a review is in flight, since the editor remains editable.
    let (row, _) = app.editor.buffer.cursor();
    let col = app.editor.buffer.cursor_display_col();
    if row >= app.editor.scroll_row
        && col >= app.editor.scroll_col
        && inner.width > 0
        && inner.height > 0
    {
        let x = col - app.editor.scroll_col;
        let y = row - app.editor.scroll_row;
        if x < inner.width as usize && y < inner.height as usize {
            frame.set_cursor_position(Position::new(
                inner.x + u16::try_from(x).unwrap_or(u16::MAX),
                inner.y + u16::try_from(y).unwrap_or(u16::MAX),
            ));
        }
    }
}

fn render_output(frame: &mut Frame, app: &AppState, area: Rect) {
    let block = Block::bordered().title(" Review ");
    let inner = area.inner(Margin::new(1, 1));
    frame.render_widget(block, area);

    let dim = Style::default().fg(Color::DarkGray);

    if app.review.is_busy() {
        let line = Line::from(vec![
            Span::styled(spinner_frame(app), Style::default().fg(Color::Cyan)),
            Span::raw(" "),
            Span::styled(ANALYZING_MESSAGE, dim),
        ]);
        frame.render_widget(Paragraph::new(line), inner);
        return;
    }

    if app.output.review().is_none() {
        frame.render_widget(Paragraph::new(EMPTY_REVIEW_MESSAGE).style(dim), inner);
        return;
    }

    let lines: Vec<Line> = app
        .output
        .rendered()
        .iter()
        .skip(app.output.scroll)
        .take(inner.height as usize)
        .map(convert_styled_line)
        .collect();

    frame.render_widget(Paragraph::new(Text::from(lines)), inner);
}

fn spinner_frame(app: &AppState) -> &'static str {
    SPINNER_FRAMES[(app.spinner_frame / SPINNER_SPEED_DIVISOR) % SPINNER_FRAMES.len()]
}

fn render_status(frame: &mut Frame, app: &AppState, area: Rect) {
    let mut spans = Vec::new();

    if app.review.is_busy() {
        spans.push(Span::styled(
            spinner_frame(app),
            Style::default().fg(Color::Cyan),
        ));
        spans.push(Span::styled(
            " Reviewing...",
            Style::default().fg(Color::Cyan),
        ));
        spans.push(Span::raw("  "));
    }

    let hint_style = Style::default().fg(Color::DarkGray);
    let submit_style = if app.review.is_busy() || app.editor.buffer.is_blank() {
        hint_style.add_modifier(Modifier::DIM)
    } else {
        hint_style
    };
    spans.push(Span::styled("Ctrl+R review", submit_style));
    spans.push(Span::styled("  Ctrl+C quit", hint_style));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn convert_styled_line(line: &StyledLine) -> Line<'static> {
    Line::from(
        line.spans
            .iter()
            .map(|span| Span::styled(span.text.clone(), convert_style(span.style)))
            .collect::<Vec<_>>(),
    )
}

/// Maps markdown styles onto terminal colors and modifiers.
fn convert_style(style: MdStyle) -> Style {
    match style {
        MdStyle::Plain => Style::default(),
        MdStyle::CodeInline | MdStyle::CodeBlock => Style::default().fg(Color::Cyan),
        MdStyle::CodeFence => Style::default().fg(Color::DarkGray),
        MdStyle::Emphasis => Style::default().add_modifier(Modifier::ITALIC),
        MdStyle::Strong => Style::default().add_modifier(Modifier::BOLD),
        MdStyle::H1 => Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        MdStyle::H2 => Style::default().add_modifier(Modifier::BOLD),
        MdStyle::H3 => Style::default().add_modifier(Modifier::ITALIC),
        MdStyle::Link => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::UNDERLINED),
        MdStyle::BlockQuote => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::ITALIC),
        MdStyle::ListBullet | MdStyle::ListNumber => Style::default().fg(Color::Yellow),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The two panes split the middle band evenly, with one-row bars above
    /// and below.
    #[test]
    fn layout_splits_panes_evenly() {
        let layout = layout(Rect::new(0, 0, 80, 24));

        assert_eq!(layout.title.height, 1);
        assert_eq!(layout.status.height, 1);
        assert_eq!(layout.editor.height, 22);
        assert_eq!(layout.output.height, 22);
        assert_eq!(layout.editor.width + layout.output.width, 80);
        assert_eq!(layout.output.x, layout.editor.width);
    }

    /// Inner areas are inset by the pane borders.
    #[test]
    fn inner_areas_are_inside_borders() {
        let layout = layout(Rect::new(0, 0, 80, 24));
        let inner = layout.editor_inner();

        assert_eq!(inner.x, layout.editor.x + 1);
        assert_eq!(inner.y, layout.editor.y + 1);
        assert_eq!(inner.width, layout.editor.width - 2);
        assert_eq!(inner.height, layout.editor.height - 2);
    }

    /// Degenerate sizes do not panic the layout math.
    #[test]
    fn tiny_terminal_is_handled() {
        let layout = layout(Rect::new(0, 0, 2, 2));

        assert!(layout.editor_inner().width <= layout.editor.width);
        assert!(layout.output_inner().height <= layout.output.height);
    }
}
