//! Markdown rendering for the review pane.
//!
//! The server response is parsed with pulldown-cmark into semantic styled
//! lines wrapped to the pane width. Styles stay UI-agnostic here; they are
//! converted to terminal styles at render time.

mod parse;
mod wrap;

pub use parse::render_markdown;
pub use wrap::{WrapOptions, wrap_styled_spans};

/// Semantic text style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Default body text
    Plain,
    CodeInline,
    CodeBlock,
    /// The ``` fence line around a code block
    CodeFence,
    Emphasis,
    Strong,
    H1,
    H2,
    H3,
    Link,
    BlockQuote,
    ListBullet,
    ListNumber,
}

/// A run of text with a single style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledSpan {
    pub text: String,
    pub style: Style,
}

/// One display line of styled spans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledLine {
    pub spans: Vec<StyledSpan>,
}

impl StyledLine {
    pub fn empty() -> Self {
        Self { spans: vec![] }
    }
}
