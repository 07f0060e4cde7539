use authlink::{Config, Server};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "authlink", about = "Authentication and identity linking service")]
struct Cli {
    /// Path to a YAML configuration file. Without it, configuration comes
    /// from defaults and AUTHLINK_* environment variables.
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from_file(path),
        None => Config::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .init();

    let server = match Server::new(config).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to initialize server: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        tracing::error!("Server exited with error: {e}");
        std::process::exit(1);
    }
}
