mod database {
    pub mod actions;
    pub mod error;
    pub mod form;
    pub mod pagination;
    pub mod pool;
    pub mod schema;
    pub mod seed;
    pub mod validation;
}
mod authentication {
    pub mod cryptography;
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
mod config;
mod constants;

mod cache {
    pub mod cache;
}

pub mod api {
    pub mod handlers;
    pub mod rejection;
    pub mod routes;
    pub mod state;
}

pub use authentication::*;
pub use cache::cache::*;
pub use config::*;
pub use constants::*;
pub use database::*;
pub use database::error::{Error, FieldErrors};
