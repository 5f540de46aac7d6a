//! Editor pane state: the text buffer plus a scrolling viewport.
//!
//! Code is shown un-wrapped. The viewport scrolls vertically and
//! horizontally and follows the cursor after every edit.

pub mod buffer;

pub use buffer::{CursorMove, TextBuffer};

/// Editor pane state.
#[derive(Debug, Clone, Default)]
pub struct EditorState {
    pub buffer: TextBuffer,
    /// First visible buffer row.
    pub scroll_row: usize,
    /// First visible display column.
    pub scroll_col: usize,
    /// Viewport size in cells, taken from the frame layout.
    pub view_rows: usize,
    pub view_cols: usize,
}

impl EditorState {
    /// Records the viewport size from the current frame layout.
    pub fn set_viewport(&mut self, rows: usize, cols: usize) {
        self.view_rows = rows;
        self.view_cols = cols;
    }

    /// Scrolls just enough to bring the cursor back into view.
    pub fn follow_cursor(&mut self) {
        if self.view_rows == 0 || self.view_cols == 0 {
            return;
        }

        let (row, _) = self.buffer.cursor();
        let col = self.buffer.cursor_display_col();

        if row < self.scroll_row {
            self.scroll_row = row;
        } else if row >= self.scroll_row + self.view_rows {
            self.scroll_row = row + 1 - self.view_rows;
        }

        if col < self.scroll_col {
            self.scroll_col = col;
        } else if col >= self.scroll_col + self.view_cols {
            self.scroll_col = col + 1 - self.view_cols;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follow_cursor_scrolls_right_for_long_lines() {
        let mut editor = EditorState::default();
        editor.set_viewport(5, 10);
        editor
            .buffer
            .set_text("let result = some_function_with_a_long_name();");
        editor.buffer.move_cursor(CursorMove::End); // display col 46

        editor.follow_cursor();
        assert_eq!(editor.scroll_col, 37);
    }

    #[test]
    fn follow_cursor_scrolls_down_and_back_up() {
        let mut editor = EditorState::default();
        editor.set_viewport(4, 20);
        editor.buffer.set_text("a\nb\nc\nd\ne\nf\ng\nh\ni\nj");

        editor.buffer.move_cursor(CursorMove::Bottom); // row 9
        editor.follow_cursor();
        assert_eq!(editor.scroll_row, 6);

        editor.buffer.move_cursor(CursorMove::Top);
        editor.follow_cursor();
        assert_eq!(editor.scroll_row, 0);
    }

    #[test]
    fn follow_cursor_without_viewport_is_noop() {
        let mut editor = EditorState::default();
        editor.buffer.set_text("fn main() {}");
        editor.buffer.move_cursor(CursorMove::End);

        editor.follow_cursor();
        assert_eq!(editor.scroll_row, 0);
        assert_eq!(editor.scroll_col, 0);
    }
}
