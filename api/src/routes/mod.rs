pub mod chain;
pub mod ping_route;
pub mod webhook;
