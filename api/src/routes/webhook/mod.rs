pub mod command;
pub mod telegram_update;
pub mod update_handler;
pub mod webhook_route;
