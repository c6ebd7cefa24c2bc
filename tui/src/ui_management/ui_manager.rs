use std::io::{self, IsTerminal, Stdout};

use anyhow::Context;
use crossterm::{
    event::{Event, EventStream},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::{
        broadcast,
        mpsc::{self, UnboundedReceiver},
    },
};
use tokio_stream::{wrappers::LinesStream, StreamExt};

use crate::{
    state_store::{action::Action, output::Output},
    termination::Interrupted,
};

use super::{
    components::{InputBox, InputOutcome},
    screen::Screen,
};

/// [UiManager] owns the terminal: it writes the state store output and turns keys into actions
pub struct UiManager {
    action_tx: mpsc::UnboundedSender<Action>,
}

impl UiManager {
    pub fn new() -> (Self, UnboundedReceiver<Action>) {
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        (Self { action_tx }, action_rx)
    }

    pub async fn main_loop(
        self,
        output_rx: UnboundedReceiver<Output>,
        interrupt_rx: broadcast::Receiver<Interrupted>,
    ) -> anyhow::Result<Interrupted> {
        if io::stdin().is_terminal() {
            self.interactive_loop(output_rx, interrupt_rx).await
        } else {
            self.piped_loop(output_rx, interrupt_rx).await
        }
    }

    /// Line editing in raw mode, with history and tab completion
    async fn interactive_loop(
        self,
        mut output_rx: UnboundedReceiver<Output>,
        mut interrupt_rx: broadcast::Receiver<Interrupted>,
    ) -> anyhow::Result<Interrupted> {
        let _raw_mode = RawMode::enable()?;
        let mut screen: Screen<Stdout> = Screen::new(io::stdout(), true);
        let mut input_box = InputBox::default();
        let mut crossterm_events = EventStream::new();
        let mut events_open = true;

        let result: anyhow::Result<Interrupted> = loop {
            tokio::select! {
                // Catch and handle crossterm events
                maybe_event = crossterm_events.next(), if events_open => match maybe_event {
                    Some(Ok(Event::Key(key))) => {
                        let drawn = match input_box.handle_key_event(key) {
                            InputOutcome::Unchanged => Ok(()),
                            InputOutcome::Redraw => screen.redraw_prompt(&input_box),
                            InputOutcome::Candidates(candidates) => {
                                screen.list_candidates(&candidates, &input_box)
                            }
                            InputOutcome::Submit(line) => {
                                self.dispatch(Action::SubmitLine { line });
                                screen.submit()
                            }
                            InputOutcome::Interrupt | InputOutcome::EndOfInput => {
                                self.dispatch(Action::Exit);
                                Ok(())
                            }
                        };

                        if let Err(err) = drawn.context("could not draw the prompt") {
                            break Err(err);
                        }
                    },
                    Some(Err(err)) => break Err(err).context("could not read terminal events"),
                    // the state store winds everything down once it handles the exit
                    None => {
                        events_open = false;
                        self.dispatch(Action::Exit);
                    },
                    _ => (),
                },
                // Write whatever the state store printed
                Some(output) = output_rx.recv() => {
                    if let Err(err) = screen
                        .write(output, &input_box)
                        .context("could not write to the terminal")
                    {
                        break Err(err);
                    }
                },
                // Catch and handle interrupt signal to gracefully shutdown
                Ok(interrupted) = interrupt_rx.recv() => {
                    break Ok(interrupted);
                }
                else => break Ok(Interrupted::UserInt),
            }
        };

        result
    }

    /// Reads standard input line by line, one line per prompt
    async fn piped_loop(
        self,
        mut output_rx: UnboundedReceiver<Output>,
        mut interrupt_rx: broadcast::Receiver<Interrupted>,
    ) -> anyhow::Result<Interrupted> {
        let mut screen: Screen<Stdout> = Screen::new(io::stdout(), false);
        let input_box = InputBox::default();
        let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
        let mut stdin_open = true;
        let mut prompting = false;

        let result: anyhow::Result<Interrupted> = loop {
            tokio::select! {
                // Only take the next line once the previous one was handled
                maybe_line = lines.next(), if stdin_open && prompting => match maybe_line {
                    Some(Ok(line)) => {
                        prompting = false;
                        self.dispatch(Action::SubmitLine { line });
                        if let Err(err) = screen.submit() {
                            break Err(err.into());
                        }
                    },
                    Some(Err(err)) => break Err(err).context("could not read standard input"),
                    None => {
                        stdin_open = false;
                        self.dispatch(Action::Exit);
                    },
                },
                Some(output) = output_rx.recv() => {
                    prompting |= output == Output::Prompt;
                    if let Err(err) = screen
                        .write(output, &input_box)
                        .context("could not write to standard output")
                    {
                        break Err(err);
                    }
                },
                // Catch and handle interrupt signal to gracefully shutdown
                Ok(interrupted) = interrupt_rx.recv() => {
                    break Ok(interrupted);
                }
                else => break Ok(Interrupted::UserInt),
            }
        };

        result
    }

    fn dispatch(&self, action: Action) {
        // the state store is gone when shutting down, nobody left to act on it
        let _ = self.action_tx.send(action);
    }
}

/// Keeps the terminal in raw mode until dropped
struct RawMode;

impl RawMode {
    fn enable() -> anyhow::Result<Self> {
        enable_raw_mode().context("could not enable raw mode")?;

        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(err) = disable_raw_mode() {
            tracing::warn!(error = %err, "could not restore the terminal");
        }
    }
}
