pub mod api;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod progress;
pub mod schedule;
pub mod utils;
pub mod views;
