pub mod aggregator;
pub mod alerts;
pub mod app;
pub mod commands;
pub mod config;
pub mod console;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod fetcher;
pub mod filters;
pub mod i18n;
pub mod logger;
pub mod models;
pub mod preferences;
pub mod probe;
pub mod scheduler;
pub mod strength;
pub mod widgets;
