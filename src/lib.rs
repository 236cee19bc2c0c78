pub mod config;
pub mod engine;
pub mod presence;
pub mod tui;
