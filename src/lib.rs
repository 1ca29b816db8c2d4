pub mod classify;
pub mod client;
pub mod config;
pub mod errors;
pub mod hook;
pub mod poll;
pub mod stage;
pub mod steps;
pub mod ui;
