use foodgram::{
    api::{routes::routes, state::AppState},
    connect_cache, pool::connect, seed::seed_catalog, Config, Error,
};
use warp::Filter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        log::error!("{e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Error> {
    let config = Config::from_env()?;

    let pool = connect(&config.database_url, config.db_connections).await?;

    let cache = match &config.redis_url {
        Some(url) => match connect_cache(url).await {
            Ok(cache) => Some(cache),
            Err(e) => {
                log::error!("Cache unavailable, serving from the database only: {e}");
                None
            }
        },
        None => {
            log::info!("REDIS_URL not set, running without cache");
            None
        }
    };

    seed_catalog(&config, &pool, cache.clone()).await?;

    let port = config.port;
    let state = AppState::new(pool.clone(), cache, config);
    let routes = routes(state).with(warp::log("foodgram"));

    let (addr, server) = warp::serve(routes)
        .try_bind_with_graceful_shutdown(([0, 0, 0, 0], port), shutdown_signal())
        .map_err(|e| Error::Config(format!("Failed to bind port {port}: {e}")))?;

    log::info!("Listening on http://{addr}");
    server.await;

    pool.close().await;
    log::info!("Shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("Shutdown signal received");
}
