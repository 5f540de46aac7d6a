//! TUI runtime - owns the terminal, runs the event loop, executes effects.
//!
//! This is the "Elm runtime" boundary: all side effects happen here.
//! The reducer stays pure and produces effects; this module executes them.
//!
//! ## Inbox Pattern
//!
//! Review requests run as spawned tasks that send their completion `UiEvent`
//! to `inbox_tx`. The runtime drains `inbox_rx` each iteration, so the event
//! loop never blocks on the network.

use std::future::Future;
use std::io::Stdout;

use anyhow::{Context, Result};
use crossterm::event;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use revu_core::config::Config;
use revu_core::review::ReviewClient;
use tokio::sync::mpsc;

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::AppState;
use crate::{render, terminal, update};

/// Target frame rate while animating (60fps = ~16ms per frame).
pub const FRAME_DURATION: std::time::Duration = std::time::Duration::from_millis(16);

/// Poll duration when idle (no request in flight, no recent input).
/// Longer timeout reduces CPU usage when nothing is happening.
pub const IDLE_POLL_DURATION: std::time::Duration = std::time::Duration::from_millis(100);

type UiEventSender = mpsc::UnboundedSender<UiEvent>;
type UiEventReceiver = mpsc::UnboundedReceiver<UiEvent>;

/// Full-screen TUI runtime.
///
/// Owns the terminal and state. Runs the event loop and executes effects.
/// Terminal state is guaranteed to be restored on drop, panic, or Ctrl+C.
pub struct TuiRuntime {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    app: AppState,
    /// HTTP client for review requests, cloned into spawned tasks.
    client: ReviewClient,
    /// Inbox sender - spawned tasks send completion events here.
    inbox_tx: UiEventSender,
    /// Inbox receiver - the runtime drains this each iteration.
    inbox_rx: UiEventReceiver,
    /// Last time a Tick event was emitted.
    last_tick: std::time::Instant,
    /// Last time a terminal event was received (for fast polling while typing).
    last_terminal_event: std::time::Instant,
}

/// Runs the TUI until the user quits.
///
/// Must be called from within a tokio runtime; review requests are spawned
/// onto it.
pub async fn run(config: Config, client: ReviewClient, initial_text: Option<String>) -> Result<()> {
    let mut runtime = TuiRuntime::new(config, client, initial_text)?;
    runtime.event_loop()
}

impl TuiRuntime {
    fn new(config: Config, client: ReviewClient, initial_text: Option<String>) -> Result<Self> {
        // Set up panic hook BEFORE entering alternate screen
        terminal::install_panic_hook();

        let terminal = terminal::setup_terminal().context("Failed to setup terminal")?;

        let server_url = client.base_url().to_string();
        let mut app = AppState::new(config, server_url);
        if let Some(text) = initial_text {
            app.editor.buffer.set_text(&text);
        }

        // Inbox channel for async event collection
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();

        let now = std::time::Instant::now();
        Ok(Self {
            terminal,
            app,
            client,
            inbox_tx,
            inbox_rx,
            last_tick: now,
            last_terminal_event: now,
        })
    }

    fn event_loop(&mut self) -> Result<()> {
        let mut dirty = true; // Start dirty to ensure initial render

        while !self.app.should_quit {
            let mut events = self.collect_events()?;

            // Prepend Frame event with current terminal size so layout
            // bookkeeping settles before other events are handled
            let size = self.terminal.size()?;
            events.insert(
                0,
                UiEvent::Frame {
                    width: size.width,
                    height: size.height,
                },
            );

            for event in events {
                // Track terminal activity for fast tick mode
                if matches!(&event, UiEvent::Terminal(_)) {
                    self.last_terminal_event = std::time::Instant::now();
                }

                // Only Tick triggers a render - this caps the frame rate at
                // tick cadence; other events batch to the next Tick
                if matches!(&event, UiEvent::Tick) {
                    dirty = true;
                }

                let effects = update::update(&mut self.app, event);
                self.execute_effects(effects);
            }

            if dirty && !self.app.should_quit {
                self.terminal.draw(|frame| render::render(frame, &self.app))?;
                dirty = false;
            }
        }

        Ok(())
    }

    /// Collects events from the inbox and the terminal.
    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        // Fast polling while a request is in flight (spinner animation) or
        // the user was recently typing; slow polling otherwise to save CPU.
        let recent_terminal_activity = self.last_terminal_event.elapsed() < IDLE_POLL_DURATION;
        let needs_fast_poll = self.app.review.is_busy() || recent_terminal_activity;

        let tick_interval = if needs_fast_poll {
            FRAME_DURATION
        } else {
            IDLE_POLL_DURATION
        };

        // Drain inbox - request completions arrive here
        while let Ok(ev) = self.inbox_rx.try_recv() {
            events.push(ev);
        }

        // Poll terminal events:
        // - If events are already pending, do a non-blocking poll
        // - Otherwise block until the next tick is due, so input stays
        //   responsive while hitting the tick cadence
        let time_until_tick = tick_interval.saturating_sub(self.last_tick.elapsed());
        let poll_duration = if events.is_empty() {
            time_until_tick
        } else {
            std::time::Duration::ZERO
        };

        if event::poll(poll_duration)? {
            events.push(UiEvent::Terminal(event::read()?));
            // Drain any remaining buffered events (non-blocking)
            while event::poll(std::time::Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        if self.last_tick.elapsed() >= tick_interval {
            events.push(UiEvent::Tick);
            self.last_tick = std::time::Instant::now();
        }

        Ok(events)
    }

    fn execute_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    fn execute_effect(&mut self, effect: UiEffect) {
        match effect {
            UiEffect::Quit => {
                self.app.should_quit = true;
            }
            UiEffect::SubmitReview { code } => {
                let client = self.client.clone();
                spawn_effect(&self.inbox_tx, move || async move {
                    let result = client
                        .request_review(&code)
                        .await
                        .map_err(|e| format!("{e:#}"));
                    UiEvent::ReviewFinished(result)
                });
            }
        }
    }
}

impl Drop for TuiRuntime {
    fn drop(&mut self) {
        let _ = terminal::restore_terminal();
    }
}

/// Spawns an async effect and sends its result event into the inbox.
///
/// Effect handlers are pure async functions that return a `UiEvent`; the
/// runtime handles spawning and delivery.
fn spawn_effect<F, Fut>(tx: &UiEventSender, f: F)
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = UiEvent> + Send + 'static,
{
    let tx = tx.clone();
    tokio::spawn(async move {
        let _ = tx.send(f().await);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Spawned effects deliver their completion event through the inbox.
    #[tokio::test]
    async fn spawn_effect_delivers_result() {
        let (tx, mut rx) = mpsc::unbounded_channel();

        spawn_effect(&tx, || async {
            UiEvent::ReviewFinished(Ok("done".to_string()))
        });

        let event = rx.recv().await;
        assert!(matches!(
            event,
            Some(UiEvent::ReviewFinished(Ok(body))) if body == "done"
        ));
    }
}
