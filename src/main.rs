#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real deployments set the environment.
    dotenvy::dotenv().ok();

    api::telemetry::init();

    if let Err(err) = api::start().await {
        tracing::error!(error = %err, "server stopped with error");
        return Err(err.into());
    }

    Ok(())
}
