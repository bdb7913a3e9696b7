pub mod app;
pub mod assets;
pub mod config;
pub mod domain;
pub mod error;
pub mod output;
pub mod repository;
pub mod schema;
pub mod tui;
pub mod views;
