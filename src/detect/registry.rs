use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::detect::backend::DetectorBackend;
use crate::detect::backends::PixelDiffBackend;
use crate::model::ZoneLayout;

/// Builds a backend for one run's layout.
pub type BackendFactory = Arc<dyn Fn(&ZoneLayout) -> Result<Box<dyn DetectorBackend>> + Send + Sync>;

/// Named detector constructors.
///
/// Backends hold per-run state (classification caches, last result), so the registry
/// stores factories and every run gets a fresh instance.
#[derive(Clone)]
pub struct BackendRegistry {
    factories: BTreeMap<String, BackendFactory>,
    default_name: Option<String>,
}

impl BackendRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
            default_name: None,
        }
    }

    /// Registry with every built-in backend. `pixel-diff` is the default.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(PixelDiffBackend::NAME, |layout| {
            Ok(Box::new(PixelDiffBackend::new(layout)) as Box<dyn DetectorBackend>)
        });
        registry
    }

    /// Register a factory. The first registered backend becomes the default.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&ZoneLayout) -> Result<Box<dyn DetectorBackend>> + Send + Sync + 'static,
    {
        if self.default_name.is_none() {
            self.default_name = Some(name.to_string());
        }
        self.factories.insert(name.to_string(), Arc::new(factory));
    }

    /// Set default backend by name.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.factories.contains_key(name) {
            return Err(anyhow!("backend '{}' not registered", name));
        }
        self.default_name = Some(name.to_string());
        Ok(())
    }

    pub fn default_name(&self) -> Option<&str> {
        self.default_name.as_deref()
    }

    /// Build a fresh backend for `layout`.
    pub fn create(&self, name: &str, layout: &ZoneLayout) -> Result<Box<dyn DetectorBackend>> {
        let factory = self.factories.get(name).ok_or_else(|| {
            anyhow!(
                "backend '{}' not registered (available: {})",
                name,
                self.list().join(", ")
            )
        })?;
        factory(layout)
    }

    /// Build the default backend for `layout`.
    pub fn create_default(&self, layout: &ZoneLayout) -> Result<Box<dyn DetectorBackend>> {
        let name = self
            .default_name
            .as_deref()
            .ok_or_else(|| anyhow!("no detector backends registered"))?;
        self.create(name, layout)
    }

    /// Registered names, sorted.
    pub fn list(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
