use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Instructions for the terminal, produced by the state store and written by the ui
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Lines(Vec<String>),
    ClearScreen,
    /// Show the prompt again and accept the next line
    Prompt,
}

/// [Console] is the write side of the terminal as seen by the state store
#[derive(Debug, Clone)]
pub struct Console {
    output_tx: UnboundedSender<Output>,
}

impl Console {
    pub fn new() -> (Self, UnboundedReceiver<Output>) {
        let (output_tx, output_rx) = mpsc::unbounded_channel();

        (Self { output_tx }, output_rx)
    }

    pub fn print(&self, lines: Vec<String>) {
        self.send(Output::Lines(lines));
    }

    pub fn print_line(&self, line: String) {
        self.send(Output::Lines(vec![line]));
    }

    pub fn clear(&self) {
        self.send(Output::ClearScreen);
    }

    pub fn prompt(&self) {
        self.send(Output::Prompt);
    }

    fn send(&self, output: Output) {
        // the ui is gone when shutting down, nothing left to draw on
        let _ = self.output_tx.send(output);
    }
}
