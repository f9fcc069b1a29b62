pub mod alt_source;
pub mod app;
pub mod catalog;
pub mod config;
pub mod detail;
pub mod error;
pub mod query;
pub mod stats;
pub mod view;
