pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod graph;
pub mod logging;
pub mod models;
pub mod output;
pub mod query;
pub mod session;
pub mod validation;
