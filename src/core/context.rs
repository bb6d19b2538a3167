//! Invocation payloads and execution contexts.
//!
//! A [`Payload`] is the flat JSON object a host sends to a component. The
//! [`ExecutionContext`] carries everything else an invocation needs: the
//! content store, the caller's identity, and execution options.

use crate::core::error::PayloadError;
use crate::core::types::{ImageRef, ParamType};
use crate::pipeline::options::ExecutionOptions;
use crate::store::ContentStore;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Flat request or result payload.
///
/// `null` fields are treated as absent, matching how hosts clear optional
/// inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Map<String, Value>);

impl Payload {
    /// Create an empty payload.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build a payload from a JSON value; anything but an object is rejected.
    pub fn from_value(value: Value) -> Result<Self, PayloadError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(PayloadError::TypeMismatch {
                field: "<payload>".to_string(),
                expected: ParamType::ObjectArray,
            }),
        }
    }

    /// Set a field, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Set a field.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    /// Remove a field.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    /// Whether a non-null field is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Get a non-null field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Convert into a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    // ========================================================================
    // Parameter Getters
    // ========================================================================

    /// Get a parameter as a float. Numeric strings are accepted.
    pub fn get_float(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Get a parameter as an integer.
    ///
    /// Fractional numbers and numeric strings are truncated toward zero.
    pub fn get_integer(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(|f| f.trunc() as i64))
            }
            _ => None,
        }
    }

    /// Get a parameter as a string.
    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.get(name)?.as_str()
    }

    /// Get a parameter as a boolean.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name)?.as_bool()
    }

    /// Get a sequence of image references.
    ///
    /// Returns `Ok(None)` when the field is absent, which callers treat as
    /// "nothing to do".
    pub fn image_refs(&self, name: &str) -> Result<Option<Vec<ImageRef>>, PayloadError> {
        let Some(value) = self.get(name) else {
            return Ok(None);
        };
        let items = value.as_array().ok_or_else(|| PayloadError::NotASequence {
            field: name.to_string(),
        })?;

        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value::<ImageRef>(item.clone()).map_err(|e| {
                    PayloadError::InvalidReference {
                        field: name.to_string(),
                        index,
                        reason: e.to_string(),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Identity of the caller an invocation runs on behalf of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Stable user identifier, recorded on every written object.
    pub id: String,
}

impl UserIdentity {
    /// Create an identity from a user id.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Context provided to a component for one invocation.
#[derive(Clone)]
pub struct ExecutionContext {
    store: Arc<dyn ContentStore>,
    user: Option<UserIdentity>,
    options: ExecutionOptions,
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl ExecutionContext {
    /// Create a context around a content store with default options.
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            user: None,
            options: ExecutionOptions::default(),
            pool: None,
        }
    }

    /// Run on behalf of a user.
    pub fn with_user(mut self, user: UserIdentity) -> Self {
        self.user = Some(user);
        self
    }

    /// Replace the execution options.
    ///
    /// A non-zero `max_threads` gets a dedicated thread pool; if the pool
    /// cannot be built the global rayon pool is used instead.
    pub fn with_options(mut self, options: ExecutionOptions) -> Self {
        self.pool = if options.max_threads > 0 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(options.max_threads)
                .build()
            {
                Ok(pool) => Some(Arc::new(pool)),
                Err(e) => {
                    log::warn!("falling back to the global thread pool: {}", e);
                    None
                }
            }
        } else {
            None
        };
        self.options = options;
        self
    }

    /// The content store for this invocation.
    pub fn store(&self) -> &dyn ContentStore {
        self.store.as_ref()
    }

    /// The caller, if known.
    pub fn user(&self) -> Option<&UserIdentity> {
        self.user.as_ref()
    }

    /// The caller's id, if known.
    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }

    /// Execution options.
    pub fn options(&self) -> &ExecutionOptions {
        &self.options
    }

    /// Apply `f` to every item and join.
    ///
    /// Results keep the input order. The first error wins and the rest of
    /// the batch is abandoned; work that already finished is not undone.
    pub fn fan_out<T, U, E, F>(&self, items: Vec<T>, f: F) -> Result<Vec<U>, E>
    where
        T: Send,
        U: Send,
        E: Send,
        F: Fn(T) -> Result<U, E> + Send + Sync,
    {
        if !self.options.parallel || items.len() < 2 {
            return items.into_iter().map(f).collect();
        }

        let run = || items.into_par_iter().map(&f).collect::<Result<Vec<U>, E>>();
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("store", &"<content store>")
            .field("user", &self.user)
            .field("options", &self.options)
            .field("dedicated_pool", &self.pool.is_some())
            .finish()
    }
}
