use crossterm::event::Event as CrosstermEvent;

/// Input to the `update` function.
///
/// Terminal events are read directly by the runtime's event loop. Completion
/// events are sent into the runtime's inbox by spawned tasks and drained on
/// the next iteration, so the reducer never blocks on I/O.
#[derive(Debug, Clone)]
pub enum UiEvent {
    /// Animation heartbeat. The only event that marks the UI dirty.
    Tick,
    /// Current terminal size, prepended once per loop iteration so layout
    /// state is settled before input is handled.
    Frame { width: u16, height: u16 },
    /// Raw terminal input (keys, paste, resize).
    Terminal(CrosstermEvent),
    /// A review request completed, with the response body or an error
    /// description.
    ReviewFinished(Result<String, String>),
}
