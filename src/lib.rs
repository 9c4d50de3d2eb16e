pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod log;
pub mod results;
pub mod server;
