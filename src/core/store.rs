use async_trait::async_trait;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Redis connection error: {0}")]
    ConnectionError(#[from] redis::RedisError),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Store lock poisoned")]
    Poisoned,
}

/// Key/value persistence shared by the draft store, pending-payment
/// bookkeeping, recovery sessions and the repair audit trail.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set_raw(
        &self,
        key: &str,
        value: String,
        expiry: Option<Duration>,
    ) -> Result<(), StoreError>;

    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    async fn lpush_raw(&self, key: &str, value: String) -> Result<(), StoreError>;

    async fn lrange_raw(&self, key: &str) -> Result<Vec<String>, StoreError>;

    /// Atomically increments an integer counter and returns the new value.
    /// A missing key counts from zero. The expiry is refreshed on every call.
    async fn incr(&self, key: &str, expiry: Option<Duration>) -> Result<i64, StoreError>;
}

pub async fn get<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get_raw(key).await? {
        Some(v) => Ok(Some(serde_json::from_str(&v)?)),
        None => Ok(None),
    }
}

pub async fn set<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
    expiry: Option<Duration>,
) -> Result<(), StoreError> {
    let serialized = serde_json::to_string(value)?;
    store.set_raw(key, serialized, expiry).await
}

pub async fn lpush<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let serialized = serde_json::to_string(value)?;
    store.lpush_raw(key, serialized).await
}

pub async fn lrange<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Vec<T>, StoreError> {
    store
        .lrange_raw(key)
        .await?
        .iter()
        .map(|v| serde_json::from_str(v).map_err(StoreError::from))
        .collect()
}

pub struct RedisStore {
    client: redis::Client,
}

impl RedisStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    async fn get_conn(&self) -> Result<redis::aio::Connection, StoreError> {
        self.client
            .get_async_connection()
            .await
            .map_err(StoreError::ConnectionError)
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.get_conn().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_raw(
        &self,
        key: &str,
        value: String,
        expiry: Option<Duration>,
    ) -> Result<(), StoreError> {
        let mut conn = self.get_conn().await?;
        match expiry {
            Some(exp) => {
                conn.set_ex::<_, _, ()>(key, value, exp.as_secs().max(1) as usize)
                    .await?
            }
            None => conn.set::<_, _, ()>(key, value).await?,
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.get_conn().await?;
        let deleted: i32 = conn.del(key).await?;
        Ok(deleted > 0)
    }

    async fn lpush_raw(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut conn = self.get_conn().await?;
        conn.lpush::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn lrange_raw(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.get_conn().await?;
        let values: Vec<String> = conn.lrange(key, 0, -1).await?;
        Ok(values)
    }

    async fn incr(&self, key: &str, expiry: Option<Duration>) -> Result<i64, StoreError> {
        let mut conn = self.get_conn().await?;
        let mut pipe = redis::pipe();
        pipe.atomic().incr(key, 1);
        if let Some(exp) = expiry {
            pipe.expire(key, exp.as_secs().max(1) as usize).ignore();
        }
        let (count,): (i64,) = pipe.query_async(&mut conn).await?;
        Ok(count)
    }
}

enum MemoryValue {
    Scalar(String),
    List(Vec<String>),
}

struct MemoryEntry {
    value: MemoryValue,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_live(&self) -> bool {
        self.expires_at.map_or(true, |at| Instant::now() < at)
    }
}

/// In-process store used by tests and single-node deployments without Redis.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, MemoryEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entries<R>(
        &self,
        f: impl FnOnce(&mut HashMap<String, MemoryEntry>) -> R,
    ) -> Result<R, StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.retain(|_, entry| entry.is_live());
        Ok(f(&mut entries))
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.with_entries(|entries| match entries.get(key) {
            Some(MemoryEntry {
                value: MemoryValue::Scalar(v),
                ..
            }) => Some(v.clone()),
            _ => None,
        })
    }

    async fn set_raw(
        &self,
        key: &str,
        value: String,
        expiry: Option<Duration>,
    ) -> Result<(), StoreError> {
        self.with_entries(|entries| {
            entries.insert(
                key.to_string(),
                MemoryEntry {
                    value: MemoryValue::Scalar(value),
                    expires_at: expiry.map(|exp| Instant::now() + exp),
                },
            );
        })
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.with_entries(|entries| entries.remove(key).is_some())
    }

    async fn lpush_raw(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.with_entries(|entries| {
            let entry = entries.entry(key.to_string()).or_insert(MemoryEntry {
                value: MemoryValue::List(Vec::new()),
                expires_at: None,
            });
            match &mut entry.value {
                MemoryValue::List(items) => items.insert(0, value),
                scalar => *scalar = MemoryValue::List(vec![value]),
            }
        })
    }

    async fn lrange_raw(&self, key: &str) -> Result<Vec<String>, StoreError> {
        self.with_entries(|entries| match entries.get(key) {
            Some(MemoryEntry {
                value: MemoryValue::List(items),
                ..
            }) => items.clone(),
            _ => Vec::new(),
        })
    }

    async fn incr(&self, key: &str, expiry: Option<Duration>) -> Result<i64, StoreError> {
        self.with_entries(|entries| {
            let current = match entries.get(key) {
                Some(MemoryEntry {
                    value: MemoryValue::Scalar(v),
                    ..
                }) => serde_json::from_str::<i64>(v)?,
                _ => 0,
            };
            let next = current + 1;
            entries.insert(
                key.to_string(),
                MemoryEntry {
                    value: MemoryValue::Scalar(next.to_string()),
                    expires_at: expiry.map(|exp| Instant::now() + exp),
                },
            );
            Ok::<_, StoreError>(next)
        })?
    }
}
