use std::collections::BTreeMap;
use std::sync::{Arc, Once};

use parking_lot::Mutex;

use crate::error::{EngineError, EngineResult};

use super::{RenderStage, ShaderStage};

/// Zero-argument constructor for a stage.
pub type StageFactory = Arc<dyn Fn() -> Box<dyn RenderStage> + Send + Sync>;

/// Name → factory map.
///
/// Every operation is serialized on one lock; factories run outside it so a
/// factory may itself consult the registry.
pub struct StageRegistry {
    factories: Mutex<BTreeMap<String, StageFactory>>,
}

static GLOBAL: StageRegistry = StageRegistry::new();

/// The process-wide registry.
pub fn registry() -> &'static StageRegistry {
    &GLOBAL
}

/// Registers the stages shipped with the engine into [`registry()`].
///
/// Runs once per process; later calls return immediately.
pub fn register_builtin_stages() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        if let Err(e) = registry().register(ShaderStage::NAME, || Box::new(ShaderStage::new())) {
            log::warn!("builtin registration skipped: {e}");
        }
    });
}

impl StageRegistry {
    pub const fn new() -> Self {
        Self {
            factories: Mutex::new(BTreeMap::new()),
        }
    }

    /// Fails on an empty or already registered name.
    ///
    /// Stages built by `factory` must report `name` from
    /// [`RenderStage::name`]; the engine rejects instances that do not.
    pub fn register<F>(&self, name: &str, factory: F) -> EngineResult<()>
    where
        F: Fn() -> Box<dyn RenderStage> + Send + Sync + 'static,
    {
        if name.is_empty() {
            return Err(EngineError::Registration("empty stage name".into()));
        }

        let mut factories = self.factories.lock();
        if factories.contains_key(name) {
            return Err(EngineError::Registration(format!(
                "stage '{name}' already registered"
            )));
        }
        factories.insert(name.to_owned(), Arc::new(factory));
        log::debug!("stage '{name}' registered");
        Ok(())
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.factories.lock().remove(name).is_some()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.factories.lock().contains_key(name)
    }

    /// New instance of `name`, or `None` if unknown.
    pub fn create(&self, name: &str) -> Option<Box<dyn RenderStage>> {
        let factory = self.factories.lock().get(name).cloned()?;
        Some(factory())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.factories.lock().keys().cloned().collect()
    }
}

impl Default for StageRegistry {
    fn default() -> Self {
        Self::new()
    }
}
