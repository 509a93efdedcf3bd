use catrelay::prelude::*;

#[tokio::main]
async fn main() -> Result<(), CatrelayError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catrelay=info,catrelay_hub=info,catrelay_transport=info".into()),
        )
        .init();

    let config = ServerConfig::from_env();
    tracing::info!(
        "catrelay v{} starting on {}",
        env!("CARGO_PKG_VERSION"),
        config.bind_addr()
    );

    let server = RelayServer::builder().config(config).build().await?;

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await
}
