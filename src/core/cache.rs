use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

pub const DEFAULT_CAPACITY: usize = 1000;

struct Entries<K, V> {
    values: HashMap<K, V>,
    order: VecDeque<K>,
}

/// Bounded cache evicting the oldest inserted entry (FIFO, not LRU).
///
/// Lookups, loads and inserts run under one lock, so concurrent misses on
/// the same key invoke the loader once.
#[derive(Clone)]
pub struct Cache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: Arc<Mutex<Entries<K, V>>>,
    capacity: usize,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync,
    V: Clone + Send + Sync,
{
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Entries {
                values: HashMap::with_capacity(capacity.min(DEFAULT_CAPACITY)),
                order: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            })),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the cached value for `key`, or loads, stores and returns it.
    ///
    /// A failing loader leaves the cache untouched.
    pub async fn get<F, Fut, E>(&self, key: &K, loader: F) -> Result<V, E>
    where
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let mut entries = self.inner.lock().await;
        if let Some(value) = entries.values.get(key) {
            debug!("Cache HIT for key: {:?}", key);
            return Ok(value.clone());
        }
        debug!("Cache MISS for key: {:?}", key);

        let value = loader(key.clone()).await?;
        if self.capacity == 0 {
            return Ok(value);
        }
        while entries.order.len() >= self.capacity {
            if let Some(oldest) = entries.order.pop_front() {
                debug!("Cache EVICT for key: {:?}", oldest);
                entries.values.remove(&oldest);
            }
        }
        entries.order.push_back(key.clone());
        entries.values.insert(key.clone(), value.clone());
        debug!("Cache PUT for key: {:?}", key);
        Ok(value)
    }

    /// Reads a value without loading it.
    pub async fn peek(&self, key: &K) -> Option<V> {
        self.inner.lock().await.values.get(key).cloned()
    }

    pub async fn contains(&self, key: &K) -> bool {
        self.inner.lock().await.values.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.order.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) {
        let mut entries = self.inner.lock().await;
        entries.values.clear();
        entries.order.clear();
        debug!("Cache CLEAR");
    }
}

impl<K, V> Default for Cache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync,
    V: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}
