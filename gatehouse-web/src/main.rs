use std::{net::SocketAddr, sync::Arc};

use clap::Parser;
use gatehouse_core::{Clock, Gatehouse, SystemClock};
use gatehouse_storage_sqlite::{SqliteRepositoryProvider, connect};
use gatehouse_web::{
    AppState,
    config::{Cli, Commands},
    create_router,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},tower_http=info", cli.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let command = cli.command();
    if command == Commands::Version {
        println!("gatehouse v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let pool = connect(&cli.database_url, cli.db_timeout()).await?;
    let repositories = Arc::new(SqliteRepositoryProvider::new(pool));

    if command == Commands::Rollback {
        repositories.rollback().await?;
        tracing::info!(database_url = %cli.database_url, "Database migrations rolled back");
        return Ok(());
    }

    let gatehouse = Gatehouse::new(repositories)
        .with_lockout_config(cli.lockout_config())
        .with_session_config(cli.session_config());

    gatehouse.migrate().await?;
    tracing::info!(database_url = %cli.database_url, "Database migrations completed");

    match command {
        Commands::Migrate | Commands::Rollback | Commands::Version => {}
        Commands::Unblock { ip } => {
            let was_blocked = gatehouse.unblock(&ip, SystemClock.now()).await?;
            if was_blocked {
                println!("{ip} was blocked and has been unblocked");
            } else {
                println!("{ip} was not blocked; its failure counter has been cleared");
            }
        }
        Commands::Serve => {
            let removed = gatehouse.cleanup_expired_sessions(SystemClock.now()).await?;
            if removed > 0 {
                tracing::info!(removed, "Removed expired sessions");
            }

            let lockout = gatehouse.lockout_config().clone();
            let state = AppState::new(Arc::new(gatehouse), cli.web_config());
            let app = create_router(state);

            let listener = tokio::net::TcpListener::bind(cli.bind).await?;
            tracing::info!(
                bind = %cli.bind,
                lockout_enabled = lockout.enabled,
                max_failed_attempts = lockout.max_failed_attempts,
                lockout_minutes = lockout.lockout_period.num_minutes(),
                "Server starting"
            );

            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await?;
        }
    }

    Ok(())
}
