use std::future::Future;

use redis::{aio::MultiplexedConnection, AsyncCommands, FromRedisValue, ToRedisArgs};
use redis_macros::{FromRedisValue, ToRedisArgs};
use serde::{Deserialize, Serialize};

use crate::{constants::CACHE_TTL_SECONDS, error::Error};

// Caching - keys

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheKeyType {
    Tag,
    Ingredient,
}

impl CacheKeyType {
    pub fn new<T: ToString>(self, key: T) -> CacheKey {
        CacheKey::from(self, key)
    }

    pub fn lifetime(&self) -> CacheLifetime {
        match self {
            CacheKeyType::Tag => CacheLifetime::BindTagCache,
            CacheKeyType::Ingredient => CacheLifetime::BindIngredientCache,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheKey {
    value: String,
    r#type: CacheKeyType,
}

impl CacheKey {
    pub fn from<T: ToString>(r#type: CacheKeyType, key: T) -> Self {
        Self {
            value: key.to_string(),
            r#type,
        }
    }

    pub fn key_type(&self) -> CacheKeyType {
        self.r#type
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.r#type {
            CacheKeyType::Tag => write!(f, "tag-{}", self.value),
            CacheKeyType::Ingredient => write!(f, "ingredient-{}", self.value),
        }
    }
}

// Cache - wrappers

/// Which binding token a cached value is tied to.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheLifetime {
    BindTagCache,
    BindIngredientCache,
}

impl CacheLifetime {
    pub fn bind_key(&self) -> &'static str {
        match self {
            CacheLifetime::BindTagCache => "tag-cache-key",
            CacheLifetime::BindIngredientCache => "ingredient-cache-key",
        }
    }

    pub async fn get_cache_bind(
        &self,
        cache: &mut MultiplexedConnection,
    ) -> Result<Option<String>, Error> {
        get_cache_value::<&str, String>(self.bind_key(), cache).await
    }

    /// Rotates the binding token, turning every value bound to it stale.
    pub async fn invalidate(&self, cache: &mut MultiplexedConnection) -> Result<(), Error> {
        let token = uuid::Uuid::new_v4().to_string();
        set_cache_value(self.bind_key(), token, cache).await?;
        log::trace!("> Invalidated {}", self.bind_key());

        Ok(())
    }
}

#[derive(Serialize, Deserialize, FromRedisValue, ToRedisArgs, Clone)]
pub struct RedisValue<T: Serialize + Send + Sync + Clone> {
    pub value: T,
    _lifetime: CacheLifetime,
    _bind: Option<String>,
}

impl<T: Serialize + Send + Sync + Clone + for<'a> Deserialize<'a>> RedisValue<T> {
    pub fn bound(value: T, lifetime: CacheLifetime, bind: Option<String>) -> Self {
        Self {
            value,
            _lifetime: lifetime,
            _bind: bind,
        }
    }

    /// Fresh when written under `lifetime` while `current` was the bind.
    pub fn is_fresh(&self, lifetime: CacheLifetime, current: &Option<String>) -> bool {
        self._lifetime == lifetime && &self._bind == current
    }

    /// Returns the cached value when fresh; otherwise runs `callback` and
    /// stores its result. Cache failures are logged and never surface.
    ///
    /// The bind is read once, before `callback`, and the fill is stored
    /// under it. A rotation during the fetch leaves the fill stale.
    pub async fn get_or<F, Fut>(
        key: CacheKey,
        cache: &mut MultiplexedConnection,
        callback: F,
    ) -> Result<T, Error>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, Error>> + Send,
    {
        let name = key.to_string();
        let lifetime = key.key_type().lifetime();

        let bind = match lifetime.get_cache_bind(cache).await {
            Ok(bind) => bind,
            Err(e) => {
                log::error!("> Failed to read {}: {e}", lifetime.bind_key());
                return callback().await;
            }
        };

        let value = get_cache_value::<&str, RedisValue<T>>(&name, cache)
            .await
            .unwrap_or_else(|e| {
                log::error!("> Failed to read cached value {name}: {e}");
                let mut c = cache.clone();
                let k = name.to_owned();
                tokio::spawn(async move {
                    if let Err(e) = delete_cache_value(k, &mut c).await {
                        log::error!("> Failed to delete cached value! {e}");
                    }
                });
                None
            });

        match value {
            Some(value) if value.is_fresh(lifetime, &bind) => {
                log::trace!("> Found {name}");
                return Ok(value.value);
            }
            Some(_) => log::trace!("> Stale {name}"),
            None => {}
        }

        log::trace!("> Fetching {name}");
        let value = callback().await?;

        let wrapped = RedisValue::bound(value.clone(), lifetime, bind);
        if let Err(e) = set_cache_value_ex(name.as_str(), wrapped, CACHE_TTL_SECONDS, cache).await {
            log::error!("{e:?}");
        }

        Ok(value)
    }
}

/// Reads through the cache when one is configured, straight from the
/// database otherwise.
pub async fn cached<T, F, Fut>(
    key: CacheKey,
    cache: Option<MultiplexedConnection>,
    callback: F,
) -> Result<T, Error>
where
    T: Serialize + Send + Sync + Clone + for<'a> Deserialize<'a>,
    F: FnOnce() -> Fut + Send,
    Fut: Future<Output = Result<T, Error>> + Send,
{
    match cache {
        Some(mut cache) => RedisValue::get_or(key, &mut cache, callback).await,
        None => callback().await,
    }
}

/// Marks every cached value of this catalog as stale.
pub async fn invalidate_catalog(r#type: CacheKeyType, cache: Option<MultiplexedConnection>) {
    if let Some(mut cache) = cache {
        if let Err(e) = r#type.lifetime().invalidate(&mut cache).await {
            log::error!("> Failed to invalidate {:?} cache: {e}", r#type);
        }
    }
}

// Cache - raw handlers

pub async fn connect_cache(url: &str) -> Result<MultiplexedConnection, Error> {
    let client = redis::Client::open(url)?;
    let connection = client.get_multiplexed_async_connection().await?;
    log::info!("Connected to cache at {url}");

    Ok(connection)
}

pub async fn set_cache_value<K: ToRedisArgs + Send + Sync, V: ToRedisArgs + Send + Sync>(
    key: K,
    value: V,
    cache: &mut MultiplexedConnection,
) -> Result<(), Error> {
    let _: () = cache.set(key, value).await?;

    Ok(())
}

pub async fn set_cache_value_ex<K: ToRedisArgs + Send + Sync, V: ToRedisArgs + Send + Sync>(
    key: K,
    value: V,
    seconds: u64,
    cache: &mut MultiplexedConnection,
) -> Result<(), Error> {
    let _: () = cache.set_ex(key, value, seconds).await?;

    Ok(())
}

pub async fn delete_cache_value<K: ToRedisArgs + Send + Sync>(
    key: K,
    cache: &mut MultiplexedConnection,
) -> Result<(), Error> {
    let _: () = cache.del(key).await?;

    Ok(())
}

pub async fn get_cache_value<K: ToRedisArgs + Send + Sync, V: FromRedisValue>(
    key: K,
    cache: &mut MultiplexedConnection,
) -> Result<Option<V>, Error> {
    let value: Option<V> = cache.get(key).await?;

    Ok(value)
}
