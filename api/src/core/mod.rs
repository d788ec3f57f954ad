pub mod access;
pub mod app_state;
pub mod chain_client;
pub mod config;
pub mod http;
