/// Commands returned by `update` for the runtime to execute.
///
/// All I/O lives here. The reducer stays a pure function of state and event;
/// the runtime turns each effect into work and feeds results back as events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEffect {
    /// Stop the event loop and restore the terminal.
    Quit,
    /// Send the code to the review server. Completion arrives as a
    /// `ReviewFinished` event.
    SubmitReview { code: String },
}
