use anyhow::Context;
use clap::Parser;
use partes::config::{Args, Command, MigrateAction};
use partes::frontend::StaticRoot;
use partes::migrate::{self, RevertTarget};
use partes::{Application, Config, client_config, seed, telemetry};

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}

async fn run_migrate(config: &Config, action: &MigrateAction) -> anyhow::Result<()> {
    let pool = partes::connect(&config.database).await.context("Failed to connect to the database")?;

    match action {
        MigrateAction::Up => migrate::run(&pool).await?,
        MigrateAction::Down { all, target } => {
            let target = match (all, target) {
                (true, _) => RevertTarget::All,
                (false, Some(version)) => RevertTarget::Version(*version),
                (false, None) => RevertTarget::Last,
            };
            migrate::revert(&pool, target).await?;
        }
        MigrateAction::Status => {
            for migration in migrate::status(&pool).await? {
                let state = match migration.installed_on {
                    Some(at) => format!("applied {}", at.format("%Y-%m-%d %H:%M:%S")),
                    None => "pending".to_string(),
                };
                println!("{:>14}  {:<28} {}", migration.version, migration.description, state);
            }
        }
    }

    pool.close().await;
    Ok(())
}

async fn run_seed(config: &Config) -> anyhow::Result<()> {
    let outcome = seed::run(config).await?;

    print!("{}", outcome.report);
    let summary_error = match &outcome.summary {
        Some(Ok(summary)) => {
            print!("{summary}");
            None
        }
        Some(Err(e)) => {
            println!("summary unavailable: {e}");
            Some(e)
        }
        None => None,
    };

    if !outcome.report.is_success() {
        anyhow::bail!("{} of {} records failed", outcome.report.failed.len(), outcome.report.attempted);
    }
    if let Some(e) = summary_error {
        anyhow::bail!("roster loaded but the summary could not be read: {e}");
    }
    Ok(())
}

async fn run_client_config(config: &Config, document: Option<&str>) -> anyhow::Result<()> {
    let location = match document.or(config.seed.client_document.as_deref()) {
        Some(location) => location.to_string(),
        None => StaticRoot::from_config(&config.frontend)
            .config_document()
            .display()
            .to_string(),
    };

    let outcome = client_config::load(&location, &reqwest::Client::new()).await;
    let resolved = outcome.config();
    println!("document:    {location}");
    println!("environment: {}", resolved.environment.as_deref().unwrap_or("-"));
    println!("api:         {}", resolved.api_base);
    println!("frontend:    {}", resolved.frontend_base);
    if let client_config::ConfigOutcome::FellBackToDefault { reason, .. } = &outcome {
        println!("fallback:    {reason}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::load(&args)?;

    if args.validate {
        println!("Configuration is valid.");
        return Ok(());
    }

    telemetry::init_telemetry(config.enable_otel_export)?;
    tracing::debug!(command = ?args.command, "Parsed arguments");

    let result = match args.command.as_ref().unwrap_or(&Command::Serve) {
        Command::Serve => Application::new(config).await?.serve(shutdown_signal()).await,
        Command::Migrate { action } => run_migrate(&config, action).await,
        Command::Seed(_) => run_seed(&config).await,
        Command::ClientConfig { document } => run_client_config(&config, document.as_deref()).await,
    };

    telemetry::shutdown_telemetry();
    result
}
