use anyhow::{Context, Result};
use clap::Parser;
use loqa_interviews::{create_router, AppState, Config};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "loqa-interviews", about = "Voice interview session service")]
struct Args {
    /// Configuration file (extension optional)
    #[arg(short, long, default_value = "config/loqa-interviews")]
    config: String,

    /// Override the HTTP port from the configuration
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    let port = args.port.unwrap_or(cfg.service.http.port);
    let addr = format!("{}:{}", cfg.service.http.bind, port);

    info!("Loqa Interviews v0.1.0");
    info!("Loaded config: {}", cfg.service.name);
    info!("Collaborators via NATS at {}", cfg.nats.url);
    info!(
        "Idle timeout {}ms, keep-alive {}s, turn cap {}",
        cfg.interview.idle_timeout_ms, cfg.interview.keep_alive_secs, cfg.interview.max_ai_turns
    );

    let state = AppState::new(cfg.nats.clone(), cfg.interview.clone());
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}
