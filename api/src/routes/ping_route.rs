/// Keep-alive endpoint for uptime pings.
pub async fn ping_route() -> &'static str {
    "pong"
}
