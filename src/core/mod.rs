pub mod analytics;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod lifecycle;
pub mod settings;
pub mod terminal;
