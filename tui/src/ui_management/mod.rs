mod components;
mod screen;
mod ui_manager;

pub use ui_manager::UiManager;
