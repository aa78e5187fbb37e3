use std::path::Path;

use redis::aio::MultiplexedConnection;
use serde::Deserialize;
use sqlx::{Pool, Sqlite};

use crate::{
    actions::{create_ingredient, create_tag},
    cache::cache::{invalidate_catalog, CacheKeyType},
    config::Config,
    error::Error,
};

#[derive(Debug, Deserialize)]
pub struct IngredientSeed {
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Debug, Deserialize)]
pub struct TagSeed {
    pub name: String,
    pub color: String,
    pub slug: String,
}

async fn read_seed<T: for<'a> Deserialize<'a>>(path: &Path) -> Result<Vec<T>, Error> {
    let data = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;

    Ok(serde_json::from_str(&data)?)
}

pub async fn load_ingredients(items: Vec<IngredientSeed>, pool: &Pool<Sqlite>) -> Result<usize, Error> {
    let count = items.len();
    for item in items {
        create_ingredient(&item.name, &item.measurement_unit, pool).await?;
    }

    Ok(count)
}

pub async fn load_tags(items: Vec<TagSeed>, pool: &Pool<Sqlite>) -> Result<usize, Error> {
    let count = items.len();
    for item in items {
        create_tag(&item.name, &item.color, &item.slug, pool).await?;
    }

    Ok(count)
}

/// Loads the configured catalog files. Already present rows are kept.
pub async fn seed_catalog(
    config: &Config,
    pool: &Pool<Sqlite>,
    cache: Option<MultiplexedConnection>,
) -> Result<(), Error> {
    if let Some(path) = &config.ingredients_file {
        let count = load_ingredients(read_seed(path).await?, pool).await?;
        log::info!("Loaded {count} ingredients from {}", path.display());
        invalidate_catalog(CacheKeyType::Ingredient, cache.clone()).await;
    }

    if let Some(path) = &config.tags_file {
        let count = load_tags(read_seed(path).await?, pool).await?;
        log::info!("Loaded {count} tags from {}", path.display());
        invalidate_catalog(CacheKeyType::Tag, cache).await;
    }

    Ok(())
}
