use clap::Parser;
use hazlink_core::HazlinkConfig;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "hazlink.toml")]
    config: String,

    /// Validate the configuration and exit
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience — production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Init logging
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    // Load config
    let config = match HazlinkConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    if args.check_config {
        let vocab = config.analysis.vocabulary();
        println!("✅ Config OK: {}", args.config);
        println!("   match policy: {:?}", config.analysis.match_policy);
        println!("   hazard tags: {}", vocab.tags().collect::<Vec<_>>().join(", "));
        println!("   report dir: {}", config.service.report_dir);
        return Ok(());
    }

    if !config.http.enabled {
        eprintln!("HTTP is disabled in {}; nothing to serve", args.config);
        std::process::exit(1);
    }

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    hazlink_server::http::start_http_server(config, tx.subscribe()).await?;

    Ok(())
}
