use anyhow::{Context, Result};
use clap::Parser;
use task_server::{
    config::Config,
    setup::initialize_app,
    telemetry::{init_telemetry, log_startup_info, report_error},
};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "task-server")]
#[command(about = "Task API backed by PostgreSQL")]
#[command(version)]
struct Cli {
    /// Configuration file path (toml, json, yaml, ini)
    #[arg(short, long, env = "CONFIG_FILE")]
    config: Option<String>,

    /// Legacy INI file with a [Postgresql] section
    #[arg(long, env = "CONFIG_INI")]
    ini: Option<String>,

    /// Database URL override
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Listen address override
    #[arg(long, env = "LISTEN_ADDR")]
    listen_addr: Option<String>,

    /// Port override
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level override
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,

    /// API key override
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;

    if let Some(ref ini) = cli.ini {
        config
            .apply_legacy_ini(ini)
            .with_context(|| format!("Failed to load legacy INI file {ini}"))?;
    }

    // Apply CLI overrides
    if let Some(ref database_url) = cli.database_url {
        config.database.url = Some(database_url.clone());
    }

    if let Some(ref listen_addr) = cli.listen_addr {
        config.server.listen_addr = listen_addr.clone();
    }

    if let Some(port) = cli.port {
        config.server.port = port;
    }

    if let Some(ref log_level) = cli.log_level {
        config.logging.level = log_level.clone();
    }

    if let Some(ref api_key) = cli.api_key {
        config.auth.api_key = api_key.clone();
    }

    Ok(config)
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to register SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, initiating graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(&cli).context("Failed to load configuration")?;

    let _log_guard = init_telemetry(&config.logging).context("Failed to initialize telemetry")?;

    if let Err(e) = config.validate() {
        report_error(&e, "configuration validation");
        std::process::exit(1);
    }
    log_startup_info(&config);

    let app = initialize_app(&config)
        .await
        .context("Failed to initialize application")?;

    let addr = config.server_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    app.run_until_shutdown(listener, shutdown_signal(), config.shutdown_timeout())
        .await
}
