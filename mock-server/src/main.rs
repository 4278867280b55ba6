use std::sync::Arc;

use mock_server::{router, Cobbler, ENDPOINT};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "25151".to_string());
    let username = std::env::var("COBBLER_USERNAME").unwrap_or_else(|_| "cobbler".to_string());
    let password = std::env::var("COBBLER_PASSWORD").unwrap_or_else(|_| "cobbler".to_string());

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, endpoint = ENDPOINT, %username, "mock cobbler listening");

    let db = Arc::new(RwLock::new(Cobbler::new(&username, &password)));
    axum::serve(listener, router(db)).await
}
