use dotenvy::dotenv;
use tracing::info;

use mediabot::config::settings::AppConfig;
use mediabot::state::AppState;
use mediabot::{app, workers};

#[tokio::main]
async fn main() {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting server...");

    let config = match AppConfig::new() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {} (is TELEGRAM_TOKEN/WEBHOOK_SECRET set?)", e);
            std::process::exit(1);
        }
    };

    std::fs::create_dir_all(&config.work_dir).expect("failed to create work dir");
    std::fs::create_dir_all(&config.artifact_dir).expect("failed to create artifact dir");

    let state = AppState::new(config.clone()).expect("failed to build application state");

    tokio::spawn(workers::transcoder::start_transcoder_worker(state.clone()));
    tokio::spawn(workers::janitor::start_janitor(state.clone()));

    let app = app::create_app(state).await;

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    info!("Server running on http://{}", addr);

    axum::serve(listener, app).await.unwrap();
}
