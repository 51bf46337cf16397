//! Test loaders — mock `StructureLoader` implementations for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use cns_core::error::LoadError;
use cns_structure::application::loader::StructureLoader;
use cns_structure::domain::definition::NodeDefinition;
use cns_structure::domain::structure::ContentStructure;

/// A loader that serves fixed node lists by process ID and counts calls.
/// Unknown processes fail with `LoadError::MissingDefinition`.
#[derive(Debug, Default)]
pub struct StaticStructureLoader {
    definitions: Mutex<HashMap<String, Vec<NodeDefinition>>>,
    loads: AtomicUsize,
}

impl StaticStructureLoader {
    /// Create an empty loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the nodes for `process_id`. Each node's title is its ID
    /// prefixed with `Title `.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_process(self, process_id: &str, node_ids: &[&str]) -> Self {
        self.definitions.lock().unwrap().insert(
            process_id.to_owned(),
            node_ids
                .iter()
                .map(|id| NodeDefinition::new(*id, format!("Title {id}")))
                .collect(),
        );
        self
    }

    /// Number of `load` calls so far.
    #[must_use]
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StructureLoader for StaticStructureLoader {
    async fn load(&self, process_id: &str) -> Result<ContentStructure, LoadError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let nodes = self
            .definitions
            .lock()
            .unwrap()
            .get(process_id)
            .cloned()
            .ok_or_else(|| LoadError::MissingDefinition(process_id.to_owned()))?;
        Ok(ContentStructure::new(process_id, nodes))
    }
}

/// A loader that always fails with `LoadError::UnsupportedFormat`. Useful
/// for testing error-handling paths.
#[derive(Debug)]
pub struct FailingStructureLoader;

#[async_trait]
impl StructureLoader for FailingStructureLoader {
    async fn load(&self, _process_id: &str) -> Result<ContentStructure, LoadError> {
        Err(LoadError::UnsupportedFormat("bpmn".into()))
    }
}

/// A loader that sleeps before delegating. Used to exercise load timeouts.
#[derive(Debug)]
pub struct SlowStructureLoader<L> {
    delay: Duration,
    inner: L,
}

impl<L> SlowStructureLoader<L> {
    /// Wrap `inner`, delaying every load by `delay`.
    #[must_use]
    pub fn new(delay: Duration, inner: L) -> Self {
        Self { delay, inner }
    }
}

#[async_trait]
impl<L: StructureLoader> StructureLoader for SlowStructureLoader<L> {
    async fn load(&self, process_id: &str) -> Result<ContentStructure, LoadError> {
        tokio::time::sleep(self.delay).await;
        self.inner.load(process_id).await
    }
}
