use anyhow::Context;
use wirehttp::config::Config;
use wirehttp::demo::DemoHandler;
use wirehttp::server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load();
    let handler = DemoHandler::new(&cfg.upstream)?;

    let server = Server::serve(cfg.port, handler)
        .await
        .context("Error starting server")?;
    tracing::info!(port = cfg.port, upstream = %cfg.upstream, "Server started");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    server.close().await?;
    tracing::info!("Server gracefully stopped");
    Ok(())
}
