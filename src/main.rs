use chat_server::config::{self, AuthConfig};
use chat_server::routes;
use chat_server::state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let auth = AuthConfig::from_env().expect("auth config");
    let port = config::port_from_env().expect("invalid PORT");

    let state = AppState::in_memory(auth);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "chat-server listening");
    axum::serve(listener, app).await.expect("server failed");
}
