use std::sync::Arc;

use arrrg::CommandLine;
use arrrg_derive::CommandLine;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use hospital_records::config::{ServerConfig, ServerOptions};
use hospital_records::{InMemoryStore, RedisStore, SharedStore, create_app, init_db};

#[derive(CommandLine, Default, PartialEq, Eq)]
struct Args {
    #[arrrg(optional, "Host to bind the HTTP server")]
    host: Option<String>,
    #[arrrg(optional, "Port to bind the HTTP server")]
    port: Option<u16>,
    #[arrrg(optional, "Redis connection URL")]
    redis_url: Option<String>,
    #[arrrg(optional, "Directory served under /static")]
    static_dir: Option<String>,
    #[arrrg(flag, "Keep all records in process memory instead of Redis")]
    in_memory: bool,
    #[arrrg(flag, "Enable verbose logging")]
    verbose: bool,
}

impl From<Args> for ServerOptions {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            redis_url: args.redis_url,
            static_dir: args.static_dir,
            in_memory: args.in_memory,
            verbose: args.verbose,
        }
    }
}

const HELP_TEXT: &str = r#"hospitald - hospital records server

USAGE:
    hospitald [OPTIONS]

OPTIONS:
    --host <HOST>          Host to bind the HTTP server [env: HOST, default: 0.0.0.0]
    --port <PORT>          Port to bind the HTTP server [env: PORT, default: 8888]
    --redis-url <URL>      Redis connection URL
                           [default: redis://$REDIS_HOST:$REDIS_PORT/0, i.e. redis://localhost:6379/0]
    --static-dir <DIR>     Directory served under /static [env: STATIC_DIR, default: static]
    --in-memory            Keep all records in process memory instead of Redis
    --verbose              Log at debug level (otherwise RUST_LOG, then LOG_LEVEL, then info)

ENDPOINTS:
    GET    /                     Landing page
    GET    /hospital             List hospitals
    POST   /hospital             Create a hospital
    GET    /doctor               List doctors
    POST   /doctor               Create a doctor
    GET    /patient              List patients
    POST   /patient              Create a patient
    GET    /diagnosis            List diagnoses
    POST   /diagnosis            Create a diagnosis
    GET    /doctor-patient       List doctor-patient links
    POST   /doctor-patient       Link a doctor and a patient
    GET    /analytics/entities   Record counts as JSON
    GET    /analytics/usage      Request statistics as JSON
    GET    /static/*             Static files

The server shuts down gracefully on Ctrl+C."#;

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received, stopping server");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, free) = Args::from_command_line("USAGE: hospitald [OPTIONS]");

    if !free.is_empty() && free[0] == "help" {
        println!("{}", HELP_TEXT);
        return Ok(());
    }
    if !free.is_empty() {
        eprintln!("Error: Unexpected arguments: {:?}", free);
        eprintln!();
        eprintln!("{}", HELP_TEXT);
        std::process::exit(1);
    }

    let config = ServerConfig::from_env(args.into())?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let store: SharedStore = if config.in_memory {
        tracing::warn!("using in-memory store; records are lost on exit");
        Arc::new(InMemoryStore::new())
    } else {
        match RedisStore::connect(&config.redis_url).await {
            Ok(store) => Arc::new(store),
            Err(err) => {
                tracing::error!(url = %config.redis_url, error = %err, "cannot connect to Redis");
                std::process::exit(1);
            }
        }
    };

    match init_db(store.as_ref()).await {
        Ok(true) => tracing::info!("initialized empty database"),
        Ok(false) => tracing::debug!("database already initialized"),
        Err(err) => {
            tracing::error!(error = %err, "cannot initialize database");
            std::process::exit(1);
        }
    }

    let app = create_app(store, &config.static_dir);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    tracing::info!(
        addr = %addr,
        static_dir = %config.static_dir.display(),
        in_memory = config.in_memory,
        "hospitald listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("hospitald stopped");
    Ok(())
}
