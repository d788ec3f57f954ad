pub mod chain_link_route;
pub mod chain_response;
pub mod hourly_report_route;
mod preconditions;
pub mod trigger_report_route;
