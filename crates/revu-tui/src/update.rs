use crossterm::event::{Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::layout::Rect;
use revu_core::review::FALLBACK_MESSAGE;

use crate::editor::CursorMove;
use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::render;
use crate::state::{AppState, ReviewState};

/// Applies one event to the state and returns the effects to execute.
///
/// This is the only place state changes. No I/O happens here.
pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick => {
            app.spinner_frame = app.spinner_frame.wrapping_add(1);
            vec![]
        }
        UiEvent::Frame { width, height } => {
            handle_frame(app, width, height);
            vec![]
        }
        UiEvent::Terminal(event) => handle_terminal(app, event),
        UiEvent::ReviewFinished(result) => {
            finish_review(app, result);
            vec![]
        }
    }
}

/// Settles layout-dependent state before input is handled.
fn handle_frame(app: &mut AppState, width: u16, height: u16) {
    let layout = render::layout(Rect::new(0, 0, width, height));

    let editor_inner = layout.editor_inner();
    app.editor
        .set_viewport(editor_inner.height as usize, editor_inner.width as usize);

    let output_inner = layout.output_inner();
    app.output.view_rows = output_inner.height as usize;
    app.output.ensure_rendered(output_inner.width as usize);

    let max_scroll = app
        .output
        .rendered()
        .len()
        .saturating_sub(app.output.view_rows);
    app.output.scroll = app.output.scroll.min(max_scroll);

    app.editor.follow_cursor();
}

fn handle_terminal(app: &mut AppState, event: CrosstermEvent) -> Vec<UiEffect> {
    match event {
        CrosstermEvent::Key(key) => handle_key(app, key),
        CrosstermEvent::Paste(text) => {
            let text = sanitize_paste(&text, app.config.tab_width);
            app.editor.buffer.insert_str(&text);
            app.editor.follow_cursor();
            vec![]
        }
        // Resize is picked up by the next Frame event
        _ => vec![],
    }
}

/// Decoded key modifiers, for readable match guards.
#[derive(Clone, Copy)]
struct Modifiers {
    ctrl: bool,
    shift: bool,
    alt: bool,
}

impl Modifiers {
    fn new(modifiers: KeyModifiers) -> Self {
        Self {
            ctrl: modifiers.contains(KeyModifiers::CONTROL),
            shift: modifiers.contains(KeyModifiers::SHIFT),
            alt: modifiers.contains(KeyModifiers::ALT),
        }
    }

    fn none(self) -> bool {
        !self.ctrl && !self.shift && !self.alt
    }

    fn only_ctrl(self) -> bool {
        self.ctrl && !self.shift && !self.alt
    }

    fn only_alt(self) -> bool {
        self.alt && !self.ctrl && !self.shift
    }
}

fn handle_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    if key.kind == KeyEventKind::Release {
        return vec![];
    }

    let mods = Modifiers::new(key.modifiers);

    match key.code {
        KeyCode::Char('c') if mods.only_ctrl() => return vec![UiEffect::Quit],
        KeyCode::Char('r') if mods.only_ctrl() => return submit_review(app),
        KeyCode::PageUp => {
            let page = app.output.view_rows.saturating_sub(1).max(1);
            app.output.scroll = app.output.scroll.saturating_sub(page);
        }
        KeyCode::PageDown => {
            let page = app.output.view_rows.saturating_sub(1).max(1);
            let max_scroll = app
                .output
                .rendered()
                .len()
                .saturating_sub(app.output.view_rows);
            app.output.scroll = (app.output.scroll + page).min(max_scroll);
        }
        KeyCode::Tab if mods.none() => {
            let spaces = " ".repeat(app.config.tab_width.max(1));
            app.editor.buffer.insert_str(&spaces);
            app.editor.follow_cursor();
        }
        KeyCode::Left if mods.only_alt() => {
            app.editor.buffer.move_word_left();
            app.editor.follow_cursor();
        }
        KeyCode::Right if mods.only_alt() => {
            app.editor.buffer.move_word_right();
            app.editor.follow_cursor();
        }
        KeyCode::Backspace if mods.only_alt() => {
            app.editor.buffer.delete_word_left();
            app.editor.follow_cursor();
        }
        KeyCode::Char('k') if mods.only_ctrl() => {
            app.editor.buffer.delete_line_by_end();
            app.editor.follow_cursor();
        }
        KeyCode::Home if mods.only_ctrl() => {
            app.editor.buffer.move_cursor(CursorMove::Top);
            app.editor.follow_cursor();
        }
        KeyCode::End if mods.only_ctrl() => {
            app.editor.buffer.move_cursor(CursorMove::Bottom);
            app.editor.follow_cursor();
        }
        _ => {
            app.editor.buffer.input(key);
            app.editor.follow_cursor();
        }
    }

    vec![]
}

/// Starts a review if the editor has code and no request is in flight.
///
/// The old review is cleared before the request goes out, so the pane shows
/// the in-progress message rather than a stale response.
fn submit_review(app: &mut AppState) -> Vec<UiEffect> {
    if app.review.is_busy() {
        return vec![];
    }
    if app.editor.buffer.is_blank() {
        return vec![];
    }

    app.output.clear();
    app.review = ReviewState::Reviewing;

    vec![UiEffect::SubmitReview {
        code: app.editor.buffer.text(),
    }]
}

/// Records the request outcome. The busy flag drops on both paths.
fn finish_review(app: &mut AppState, result: Result<String, String>) {
    match result {
        Ok(review) => app.output.set_review(review),
        Err(error) => {
            tracing::warn!(%error, "review request failed");
            app.output.set_review(FALLBACK_MESSAGE.to_string());
        }
    }
    app.review = ReviewState::Idle;
}

/// Normalizes pasted text: CRLF to LF, tabs to spaces, other control
/// characters dropped.
fn sanitize_paste(text: &str, tab_width: usize) -> String {
    let tab = " ".repeat(tab_width.max(1));
    let mut out = String::with_capacity(text.len());

    for ch in text.replace("\r\n", "\n").replace('\r', "\n").chars() {
        match ch {
            '\n' => out.push('\n'),
            '\t' => out.push_str(&tab),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }

    out
}
