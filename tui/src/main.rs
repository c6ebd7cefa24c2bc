use std::sync::Arc;

use anyhow::Context;
use comms::matrix::MatrixClient;
use config::Config;
use state_store::StateStore;
use termination::{create_termination, Interrupted};
use ui_management::UiManager;

mod config;
mod logging;
mod render;
mod state_store;
mod termination;
mod ui_management;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    logging::init(config.log_file.as_deref())?;

    let (terminator, interrupt_rx) = create_termination();

    let client = MatrixClient::connect(config.client.clone())
        .await
        .with_context(|| format!("could not connect to {}", config.client.base_url))?;
    tracing::info!(user_id = %config.client.user_id, "connected");

    let (state_store, output_rx) = StateStore::new(Arc::new(client));
    let (ui_manager, action_rx) = UiManager::new();

    let (reason, _) = tokio::try_join!(
        state_store.main_loop(terminator, action_rx, interrupt_rx.resubscribe()),
        ui_manager.main_loop(output_rx, interrupt_rx.resubscribe()),
    )?;

    match reason {
        Interrupted::UserInt => println!("exited per user request"),
        Interrupted::OsSigInt => println!("exited because of an os sig int"),
    }

    Ok(())
}
