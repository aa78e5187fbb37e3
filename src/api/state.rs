use std::{convert::Infallible, sync::Arc};

use redis::aio::MultiplexedConnection;
use sqlx::{Pool, Sqlite};
use warp::Filter;

use crate::config::Config;

/// Shared handles every request works with.
#[derive(Clone)]
pub struct AppState {
    pub pool: Pool<Sqlite>,
    pub cache: Option<MultiplexedConnection>,
    pub config: Arc<Config>,
    pub secret: Arc<str>,
}

impl AppState {
    pub fn new(pool: Pool<Sqlite>, cache: Option<MultiplexedConnection>, config: Config) -> Self {
        let secret: Arc<str> = Arc::from(config.secret.as_str());

        Self {
            pool,
            cache,
            config: Arc::new(config),
            secret,
        }
    }
}

pub fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}
