use std::sync::Arc;
use tokio::signal;
use tracing::info;

use uno_persistence::InMemoryGameStore;
use uno_server::{
    auth::TokenService,
    config::Config,
    create_routes,
    game_manager::{GameManager, TableLimits},
    session::SessionCoordinator,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    info!("Starting Uno Arena server...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    let store = Arc::new(InMemoryGameStore::with_lock_timeout(config.lock_timeout()));
    let limits = TableLimits {
        min_players: config.min_players_per_game,
        max_players: config.max_players_per_game,
    };
    let game_manager = match config.shuffle_seed {
        Some(seed) => {
            info!("Shuffling reproducibly from seed {}", seed);
            Arc::new(GameManager::with_fixed_seed(store, limits, seed))
        }
        None => Arc::new(GameManager::new(store, limits)),
    };

    let tokens = Arc::new(TokenService::with_ttl(
        config.jwt_secret.as_bytes(),
        config.token_ttl(),
    ));
    let session = Arc::new(SessionCoordinator::new(
        game_manager.clone(),
        tokens,
        config.poll_retries,
    ));

    let routes = create_routes(session);

    // Start cleanup task
    let cleanup_game_manager = game_manager.clone();
    let cleanup_policy = config.cleanup_policy();
    let cleanup_interval = config.cleanup_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_interval);
        loop {
            interval.tick().await;
            cleanup_game_manager.cleanup(&cleanup_policy).await;
        }
    });

    let ip = match config.host.parse::<std::net::IpAddr>() {
        Ok(ip) => ip,
        Err(e) => {
            tracing::error!("Invalid HOST '{}': {}", config.host, e);
            std::process::exit(1);
        }
    };

    info!("Server starting on {}:{}", ip, config.port);

    let (addr, server) =
        warp::serve(routes).bind_with_graceful_shutdown((ip, config.port), shutdown_signal());

    info!("Server started successfully on {}. Press Ctrl+C to stop.", addr);
    server.await;
    info!("Server shutdown complete.");
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigint = registered_or_pending(
            signal::unix::signal(signal::unix::SignalKind::interrupt()),
            "SIGINT",
        )
        .await;
        let mut sigterm = registered_or_pending(
            signal::unix::signal(signal::unix::SignalKind::terminate()),
            "SIGTERM",
        )
        .await;

        tokio::select! {
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down gracefully...");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down gracefully...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl+c: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down gracefully...");
    }
}

/// The registered listener, or a future that never resolves if registration failed
async fn registered_or_pending<T>(registration: std::io::Result<T>, name: &str) -> T {
    match registration {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to listen for {}: {}", name, e);
            std::future::pending().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_failed_registration_never_resolves() {
        let failed: std::io::Result<()> = Err(std::io::Error::other("no signals here"));
        let waited =
            tokio::time::timeout(Duration::from_millis(50), registered_or_pending(failed, "SIGINT"))
                .await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_successful_registration_is_returned() {
        let listener = registered_or_pending(Ok(7u8), "SIGTERM").await;
        assert_eq!(listener, 7);
    }
}
