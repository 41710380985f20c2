//! Deployment parity CLI
//!
//! # Usage
//!
//! ```bash
//! # Check two deployments independently
//! parity_check run --target preview=https://app-preview.example.dev \
//!                  --target published=https://app.example.dev --cookie "sid=..."
//!
//! # Machine-readable output, raw parity report included
//! parity_check --format json run --target http://localhost:5000
//!
//! # Host /api/auth/user behind the identity gate (DEMO_BYPASS_AUTH=true for demo mode)
//! parity_check serve --bind 127.0.0.1:5000
//! ```

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use parity_check::api::create_app;
use parity_check::config::{DeploymentTarget, ENV_SESSION_COOKIE};
use parity_check::identity::{IdentityStore, InMemoryIdentityStore};
use parity_check::report::{render_json, render_text, TargetReport};
use parity_check::{AuthConfig, HttpTransport, ParityConfig, ParityOrchestrator};

#[derive(Parser)]
#[command(name = "parity_check")]
#[command(version)]
#[command(about = "Verify that a deployment exposes the expected data and behavior")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, short = 'o', global = true, default_value = "text", value_enum)]
    format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the check battery against one or more deployments
    Run {
        /// Deployment as NAME=URL or URL; repeat for several
        #[arg(
            short,
            long = "target",
            required = true,
            env = "PARITY_TARGETS",
            value_delimiter = ','
        )]
        targets: Vec<String>,

        /// Cookie header forwarded on credentialed checks
        #[arg(long, env = ENV_SESSION_COOKIE)]
        cookie: Option<String>,

        /// Per-request timeout in seconds (default: none)
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Print the raw parity report after the check list
        #[arg(long)]
        raw: bool,
    },

    /// Serve /api/auth/user behind the identity gate
    Serve {
        /// Listen address (overrides PARITY_BIND_ADDR)
        #[arg(long)]
        bind: Option<std::net::SocketAddr>,
    },
}

// =============================================================================
// MAIN
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parity_check=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            targets,
            cookie,
            timeout_secs,
            raw,
        } => cmd_run(&targets, cookie, timeout_secs, raw, cli.format).await,
        Commands::Serve { bind } => cmd_serve(bind).await.map(|_| true),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Returns `Ok(false)` when any check failed on any target
async fn cmd_run(
    targets: &[String],
    cookie: Option<String>,
    timeout_secs: Option<u64>,
    raw: bool,
    format: OutputFormat,
) -> Result<bool> {
    let targets = targets
        .iter()
        .map(|t| DeploymentTarget::parse(t))
        .collect::<Result<Vec<_>, _>>()?;

    let mut reports = Vec::with_capacity(targets.len());
    for target in targets {
        let mut config = ParityConfig::new(target.base_url.as_str())?;
        if let Some(cookie) = &cookie {
            config = config.with_session_cookie(cookie.clone());
        }
        if let Some(secs) = timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }

        tracing::info!("Checking {} at {}", target.name, target.base_url);
        let transport = HttpTransport::new(&config)?;
        let orchestrator = ParityOrchestrator::new(transport);
        let state = orchestrator
            .run_all()
            .await
            .with_context(|| format!("parity run for {}", target.name))?;

        let report = TargetReport::new(target.name, target.base_url.to_string(), state);
        if format == OutputFormat::Text {
            println!("{}", render_text(&report, raw));
        }
        reports.push(report);
    }

    if format == OutputFormat::Json {
        println!("{}", render_json(&reports)?);
    }

    Ok(!reports.iter().any(TargetReport::has_failures))
}

async fn cmd_serve(bind: Option<std::net::SocketAddr>) -> Result<()> {
    let mut config = AuthConfig::from_env()?;
    if let Some(addr) = bind {
        config.bind_addr = addr;
    }

    let store = identity_store(&config).await?;
    let app = create_app(&config, store);

    tracing::info!(
        "Identity gate: {}",
        if config.bypass { "bypass (demo)" } else { "strict" }
    );
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;
    tracing::info!("Serving /api/auth/user on http://{}", config.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

#[cfg(feature = "database")]
async fn identity_store(config: &AuthConfig) -> Result<Arc<dyn IdentityStore>> {
    use parity_check::identity::PgIdentityStore;

    match &config.database_url {
        Some(url) => {
            let store = PgIdentityStore::connect(url)
                .await
                .context("Database connection failed")?;
            store.ensure_schema().await?;
            tracing::info!("Identity store: postgres");
            Ok(Arc::new(store))
        }
        None => Ok(Arc::new(InMemoryIdentityStore::new())),
    }
}

#[cfg(not(feature = "database"))]
async fn identity_store(_config: &AuthConfig) -> Result<Arc<dyn IdentityStore>> {
    tracing::info!("Identity store: in-memory");
    Ok(Arc::new(InMemoryIdentityStore::new()))
}
