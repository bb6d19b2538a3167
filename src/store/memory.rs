//! In-process content store.
//!
//! Permanent objects are seeded with [`MemoryStore::insert`] and live until
//! removed. Temporary objects written by components live in an LRU table
//! with a per-object deadline.

use super::{ContentStore, PutOptions, StoredObject};
use crate::core::error::{StoreError, StoreResult};
use crate::core::types::{Meta, Ticket};
use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

const DEFAULT_CAPACITY: usize = 1024;

/// Configuration for [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// Maximum number of temporary objects kept at once.
    pub capacity: usize,
    /// Lifetime of a temporary object.
    #[serde(with = "duration_secs")]
    pub temp_ttl: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            temp_ttl: Duration::from_secs(3600),
        }
    }
}

impl StoreOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the temporary object capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the temporary object lifetime.
    pub fn with_temp_ttl(mut self, ttl: Duration) -> Self {
        self.temp_ttl = ttl;
        self
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

/// Store access counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of `get` calls.
    pub gets: u64,
    /// Number of `put_temp` calls.
    pub puts: u64,
    /// Temporary objects dropped to stay within capacity.
    pub evictions: u64,
    /// Temporary objects found past their deadline.
    pub expirations: u64,
}

struct TempEntry {
    object: StoredObject,
    owner: Option<String>,
    /// `None` when the deadline lies beyond what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl TempEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

/// Thread-safe in-memory [`ContentStore`].
pub struct MemoryStore {
    permanent: Mutex<HashMap<Ticket, StoredObject>>,
    temporary: Mutex<LruCache<Ticket, TempEntry>>,
    ttl: Duration,
    stats: Mutex<StoreStats>,
}

impl MemoryStore {
    /// Create a store with default options.
    pub fn new() -> Self {
        Self::with_options(StoreOptions::default())
    }

    /// Create a store with custom options.
    pub fn with_options(options: StoreOptions) -> Self {
        let capacity = NonZeroUsize::new(options.capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            permanent: Mutex::new(HashMap::new()),
            temporary: Mutex::new(LruCache::new(capacity)),
            ttl: options.temp_ttl,
            stats: Mutex::new(StoreStats::default()),
        }
    }

    /// Seed a permanent object and return its ticket.
    pub fn insert(&self, data: Vec<u8>, mime_type: impl Into<String>, meta: Meta) -> Ticket {
        let ticket = Ticket::generate();
        let object = StoredObject {
            ticket: ticket.clone(),
            data,
            mime_type: mime_type.into(),
            meta,
        };
        self.permanent.lock().insert(ticket.clone(), object);
        ticket
    }

    /// Remove an object of either kind.
    pub fn remove(&self, ticket: &Ticket) -> Option<StoredObject> {
        if let Some(object) = self.permanent.lock().remove(ticket) {
            return Some(object);
        }
        self.temporary.lock().pop(ticket).map(|entry| entry.object)
    }

    /// User a temporary object was written for.
    pub fn owner(&self, ticket: &Ticket) -> Option<String> {
        self.temporary
            .lock()
            .peek(ticket)
            .and_then(|entry| entry.owner.clone())
    }

    /// Drop every expired temporary object. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut temporary = self.temporary.lock();
        let expired: Vec<Ticket> = temporary
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(ticket, _)| ticket.clone())
            .collect();
        for ticket in &expired {
            temporary.pop(ticket);
        }
        self.stats.lock().expirations += expired.len() as u64;
        expired.len()
    }

    /// Access counters.
    pub fn stats(&self) -> StoreStats {
        self.stats.lock().clone()
    }

    /// Number of objects held, permanent and temporary.
    pub fn len(&self) -> usize {
        self.permanent.lock().len() + self.temporary.lock().len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentStore for MemoryStore {
    fn get(&self, ticket: &Ticket) -> StoreResult<StoredObject> {
        self.stats.lock().gets += 1;

        if let Some(object) = self.permanent.lock().get(ticket) {
            return Ok(object.clone());
        }

        let mut temporary = self.temporary.lock();
        match temporary.get(ticket) {
            Some(entry) if entry.is_expired(Instant::now()) => {
                temporary.pop(ticket);
                self.stats.lock().expirations += 1;
                Err(StoreError::Expired(ticket.clone()))
            }
            Some(entry) => Ok(entry.object.clone()),
            None => Err(StoreError::NotFound(ticket.clone())),
        }
    }

    fn put_temp(
        &self,
        data: Vec<u8>,
        options: PutOptions,
        meta: Meta,
    ) -> StoreResult<StoredObject> {
        let ticket = Ticket::generate();
        let object = StoredObject {
            ticket: ticket.clone(),
            data,
            mime_type: options.mime_type,
            meta,
        };
        let entry = TempEntry {
            object: object.clone(),
            owner: options.user_id,
            expires_at: Instant::now().checked_add(self.ttl),
        };

        let evicted = self.temporary.lock().push(ticket.clone(), entry);
        let mut stats = self.stats.lock();
        stats.puts += 1;
        if evicted.is_some_and(|(old, _)| old != ticket) {
            stats.evictions += 1;
        }
        log::trace!("stored temporary object {}", ticket);

        Ok(object)
    }
}
