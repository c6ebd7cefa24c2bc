pub use self::state_store::StateStore;

pub mod action;
pub mod command;
pub mod output;
mod state;
#[allow(clippy::module_inception)]
mod state_store;
#[cfg(test)]
mod test_client;

pub use self::state::State;
