use revu_core::config::Config;

use crate::editor::EditorState;
use crate::markdown::{StyledLine, render_markdown};

/// Whether a review request is in flight.
///
/// At most one request runs at a time. The state moves to `Reviewing` when
/// the request is dispatched and back to `Idle` when its completion event
/// arrives, whether the server answered or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewState {
    #[default]
    Idle,
    Reviewing,
}

impl ReviewState {
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Reviewing)
    }
}

/// The review pane: latest response plus its rendered form and scroll offset.
#[derive(Debug, Clone, Default)]
pub struct OutputState {
    /// Latest review text, replaced wholesale by each request.
    review: Option<String>,
    /// First visible rendered line.
    pub scroll: usize,
    /// Rendered lines, cached per width.
    rendered: Vec<StyledLine>,
    /// Width the cache was rendered at.
    rendered_width: usize,
    /// Visible height of the pane, updated each frame.
    pub view_rows: usize,
}

impl OutputState {
    pub fn review(&self) -> Option<&str> {
        self.review.as_deref()
    }

    /// Replaces the review text and resets the pane to the top.
    pub fn set_review(&mut self, review: String) {
        self.review = Some(review);
        self.scroll = 0;
        self.rendered.clear();
        self.rendered_width = 0;
    }

    /// Discards the current review text.
    pub fn clear(&mut self) {
        self.review = None;
        self.scroll = 0;
        self.rendered.clear();
        self.rendered_width = 0;
    }

    /// Re-renders the cached lines if the text or pane width changed.
    pub fn ensure_rendered(&mut self, width: usize) {
        let Some(review) = &self.review else {
            return;
        };

        if self.rendered.is_empty() || self.rendered_width != width {
            self.rendered = render_markdown(review, width);
            self.rendered_width = width;
        }
    }

    pub fn rendered(&self) -> &[StyledLine] {
        &self.rendered
    }
}

/// Complete UI state. Mutated only by `update`.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Config,
    /// Resolved review server base URL, shown in the title bar.
    pub server_url: String,
    /// Left pane: the code being written.
    pub editor: EditorState,
    pub review: ReviewState,
    /// Right pane: the latest review, if any.
    pub output: OutputState,
    /// Advances every tick to drive the spinner.
    pub spinner_frame: usize,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(config: Config, server_url: String) -> Self {
        Self {
            config,
            server_url,
            editor: EditorState::default(),
            review: ReviewState::default(),
            output: OutputState::default(),
            spinner_frame: 0,
            should_quit: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> AppState {
        AppState::new(Config::default(), "http://localhost:3000".to_string())
    }

    /// A fresh session has no text, no review, and is not busy.
    #[test]
    fn new_state_is_idle_and_empty() {
        let app = app();

        assert!(app.editor.buffer.is_blank());
        assert!(app.output.review().is_none());
        assert!(!app.review.is_busy());
        assert!(!app.should_quit);
    }

    /// Setting a review resets the scroll position and invalidates the cache.
    #[test]
    fn set_review_resets_scroll() {
        let mut output = OutputState::default();
        output.set_review("line\n\nline".to_string());
        output.ensure_rendered(40);
        output.scroll = 2;

        output.set_review("fresh".to_string());

        assert_eq!(output.scroll, 0);
        assert!(output.rendered().is_empty());
        assert_eq!(output.review(), Some("fresh"));
    }

    /// Rendering is cached until the width changes.
    #[test]
    fn ensure_rendered_caches_per_width() {
        let mut output = OutputState::default();
        output.set_review("some review text".to_string());

        output.ensure_rendered(40);
        let first = output.rendered().to_vec();
        output.ensure_rendered(40);
        assert_eq!(output.rendered(), &first[..]);

        output.ensure_rendered(10);
        assert!(!output.rendered().is_empty());
    }

    /// Clearing drops the review entirely.
    #[test]
    fn clear_discards_review() {
        let mut output = OutputState::default();
        output.set_review("old".to_string());
        output.ensure_rendered(40);

        output.clear();

        assert!(output.review().is_none());
        assert!(output.rendered().is_empty());
        assert_eq!(output.scroll, 0);
    }
}
