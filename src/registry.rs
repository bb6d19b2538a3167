//! Component registry: the table of published components.
//!
//! The registry is built once at startup and then only read. It maps each
//! operation key to a [`Descriptor`], the schema and executor pair a host
//! registers.

use crate::core::context::{ExecutionContext, Payload};
use crate::core::error::{ComponentError, ComponentResult};
use crate::core::node::{Category, Component, ComponentSchema};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// A schema together with the component that executes it.
#[derive(Clone)]
pub struct Descriptor {
    /// Frozen schema, captured at registration.
    pub schema: Arc<ComponentSchema>,
    /// Stateless executor.
    pub component: Arc<dyn Component>,
}

impl Descriptor {
    /// Operation key.
    pub fn key(&self) -> &str {
        &self.schema.key
    }

    /// Run one invocation.
    ///
    /// A payload missing any required image sequence is returned as is.
    /// Otherwise absent parameters are filled from the schema defaults
    /// before the component runs.
    pub fn invoke(&self, payload: Payload, ctx: &ExecutionContext) -> ComponentResult<Payload> {
        let missing = self
            .schema
            .inputs
            .iter()
            .any(|port| port.required && !payload.contains(&port.name));
        if missing {
            log::debug!("{}: no input images, payload returned unchanged", self.key());
            return Ok(payload);
        }

        let mut payload = payload;
        self.schema.apply_defaults(&mut payload);
        self.component.execute(payload, ctx)
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("key", &self.schema.key)
            .field("title", &self.schema.title)
            .finish()
    }
}

/// Pair a component with its schema.
pub fn build_descriptor<C>(component: C) -> Descriptor
where
    C: Component + 'static,
{
    Descriptor {
        schema: Arc::new(component.schema()),
        component: Arc::new(component),
    }
}

/// Registry for all published components.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    /// Descriptors indexed by operation key, in registration order.
    components: IndexMap<String, Descriptor>,
}

impl ComponentRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with the built-in components.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::components::register_all(&mut registry);
        registry
    }

    /// Register a component. A component with the same key is replaced.
    pub fn register<C>(&mut self, component: C)
    where
        C: Component + 'static,
    {
        self.register_descriptor(build_descriptor(component));
    }

    /// Register a prebuilt descriptor.
    pub fn register_descriptor(&mut self, descriptor: Descriptor) {
        let key = descriptor.schema.key.clone();
        if self.components.insert(key.clone(), descriptor).is_some() {
            log::warn!("component '{}' registered twice; keeping the latest", key);
        }
    }

    /// Look up a descriptor by key.
    pub fn get(&self, key: &str) -> Option<&Descriptor> {
        self.components.get(key)
    }

    /// Check if a component is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.components.contains_key(key)
    }

    /// All registered keys, in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    /// All schemas, in registration order.
    pub fn schemas(&self) -> impl Iterator<Item = &ComponentSchema> {
        self.components.values().map(|d| d.schema.as_ref())
    }

    /// Descriptors in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &Descriptor> {
        self.components.values()
    }

    /// Keys of components in a category.
    pub fn by_category(&self, category: Category) -> Vec<&str> {
        self.components
            .values()
            .filter(|d| d.schema.category == category)
            .map(Descriptor::key)
            .collect()
    }

    /// Get the number of registered components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Run the component registered under `key`.
    pub fn invoke(
        &self,
        key: &str,
        payload: Payload,
        ctx: &ExecutionContext,
    ) -> ComponentResult<Payload> {
        self.get(key)
            .ok_or_else(|| ComponentError::UnknownComponent(key.to_string()))?
            .invoke(payload, ctx)
    }

    /// Hand every descriptor to a host factory, in registration order.
    pub fn create_components<T, F>(&self, mut factory: F) -> Vec<T>
    where
        F: FnMut(Arc<ComponentSchema>, Arc<dyn Component>) -> T,
    {
        self.components
            .values()
            .map(|d| factory(d.schema.clone(), d.component.clone()))
            .collect()
    }
}
