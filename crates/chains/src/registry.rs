//! The chain handler registry: built once in the composition root, frozen,
//! and shared read-only with the scheduler and the lifecycle API.

use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::{ChainError, ChainResult};
use crate::handler::ChainHandler;

/// Accumulates handlers during bootstrap.
#[derive(Default)]
pub struct ChainRegistryBuilder {
    handlers: HashMap<String, Arc<dyn ChainHandler>>,
}

impl ChainRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under its own `chain_name`. Registering the same
    /// name twice is a bootstrap bug and errors.
    pub fn register(&mut self, handler: Arc<dyn ChainHandler>) -> ChainResult<()> {
        let name = handler.chain_name().to_string();
        if self.handlers.contains_key(&name) {
            return Err(ChainError::Other(format!(
                "chain {name} registered twice"
            )));
        }
        self.handlers.insert(name, handler);
        Ok(())
    }

    /// Freezes the registry.
    pub fn build(self) -> ChainRegistry {
        ChainRegistry {
            handlers: Arc::new(self.handlers),
        }
    }
}

/// Read-only map of chain name to handler.
#[derive(Clone)]
pub struct ChainRegistry {
    handlers: Arc<HashMap<String, Arc<dyn ChainHandler>>>,
}

impl ChainRegistry {
    /// Exact-case lookup.
    pub fn get(&self, chain_name: &str) -> Option<Arc<dyn ChainHandler>> {
        self.handlers.get(chain_name).cloned()
    }

    pub fn contains(&self, chain_name: &str) -> bool {
        self.handlers.contains_key(chain_name)
    }

    pub fn handlers(&self) -> impl Iterator<Item = &Arc<dyn ChainHandler>> {
        self.handlers.values()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
