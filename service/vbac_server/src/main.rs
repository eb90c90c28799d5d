use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use vbac_model::ModelArtifact;
use vbac_schema::SchemaRegistry;
use vbac_server::{router, AppState};

#[derive(Debug, Parser)]
#[command(
    name = "vbac_server",
    version,
    about = "Serve VBAC success predictions over HTTP"
)]
struct Args {
    /// Path to the trained model artifact (classifier + feature manifest)
    #[arg(long, env = "VBAC_MODEL_PATH", default_value = "models/vbac_model.json")]
    model: PathBuf,

    /// Address to bind
    #[arg(long, env = "VBAC_HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(long, env = "PORT", default_value_t = 5001)]
    port: u16,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let registry = match SchemaRegistry::natality() {
        Ok(r) => r,
        Err(e) => {
            log::error!("Invalid built-in schema registry: {e}");
            process::exit(1);
        }
    };
    // No traffic is accepted unless the artifact loads and matches the registry
    let artifact = match ModelArtifact::load_validated(&args.model, &registry) {
        Ok(a) => a,
        Err(e) => {
            log::error!("Failed to load model from {}: {e}", args.model.display());
            process::exit(1);
        }
    };

    let addr: SocketAddr = match format!("{}:{}", args.host, args.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            log::error!("Invalid bind address {}:{}: {e}", args.host, args.port);
            process::exit(2);
        }
    };
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            log::error!("Failed to bind {addr}: {e}");
            process::exit(1);
        }
    };
    log::info!("vbac_server listening on http://{addr}");
    if let Err(e) = axum::serve(listener, router(AppState::new(artifact))).await {
        log::error!("Server error: {e}");
        process::exit(1);
    }
}
