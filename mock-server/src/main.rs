use mock_server::{MockOptions, ResponseFormat, DEFAULT_API_KEY};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mock_server=info")),
        )
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let options = MockOptions {
        api_key: std::env::var("MOCK_API_KEY").unwrap_or_else(|_| DEFAULT_API_KEY.to_string()),
        format: std::env::var("MOCK_RESPONSE_FORMAT")
            .map(|v| ResponseFormat::parse(&v))
            .unwrap_or_default(),
    };

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, format = ?options.format, "listening");
    mock_server::run_with(listener, options).await
}
