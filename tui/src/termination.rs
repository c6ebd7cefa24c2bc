#[cfg(unix)]
use tokio::signal::unix::signal;
use tokio::sync::broadcast;

/// Why the application is shutting down
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interrupted {
    /// SIGINT from the operating system
    OsSigInt,
    /// Ctrl+C or Ctrl+D at the prompt, or standard input was closed
    UserInt,
}

/// [Terminator] lets any loop ask every other loop to wind down
#[derive(Debug, Clone)]
pub struct Terminator {
    interrupt_tx: broadcast::Sender<Interrupted>,
}

impl Terminator {
    pub fn new(interrupt_tx: broadcast::Sender<Interrupted>) -> Self {
        Self { interrupt_tx }
    }

    pub fn terminate(&mut self, interrupted: Interrupted) -> anyhow::Result<()> {
        self.interrupt_tx.send(interrupted)?;

        Ok(())
    }
}

#[cfg(unix)]
async fn terminate_by_unix_signal(mut terminator: Terminator) {
    let mut interrupt_signal = match signal(tokio::signal::unix::SignalKind::interrupt()) {
        Ok(interrupt_signal) => interrupt_signal,
        Err(err) => {
            tracing::warn!(error = %err, "could not listen for the interrupt signal");
            return;
        }
    };

    interrupt_signal.recv().await;
    tracing::info!("received interrupt signal");

    if let Err(err) = terminator.terminate(Interrupted::OsSigInt) {
        tracing::warn!(error = %err, "nobody left to notify about the interrupt");
    }
}

// create a broadcast channel for retrieving the application kill signal
pub fn create_termination() -> (Terminator, broadcast::Receiver<Interrupted>) {
    let (tx, rx) = broadcast::channel(1);
    let terminator = Terminator::new(tx);

    #[cfg(unix)]
    tokio::spawn(terminate_by_unix_signal(terminator.clone()));

    (terminator, rx)
}
