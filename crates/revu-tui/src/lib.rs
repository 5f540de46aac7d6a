//! Full-screen TUI for revu.
//!
//! Elm-style architecture: `state` holds the model, `update` is the pure
//! reducer, `render` draws, and `runtime` owns the terminal and executes
//! effects.

pub mod editor;
pub mod effects;
pub mod events;
pub mod markdown;
pub mod render;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod update;

pub use runtime::run;
