//! Embedded app factories
//!
//! `main` registers every built-in factory before the lifecycle manager is
//! constructed. Embedded manifests name their factory in `entry`.

use std::collections::HashMap;

use log::debug;

use roundel_core::app::AppManifest;

use super::embedded::EmbeddedApp;

/// Builds an app instance from its manifest
pub type AppFactory = fn(&AppManifest) -> Box<dyn EmbeddedApp>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("factory '{0}' is already registered")]
    Duplicate(String),
}

/// Factory table keyed by entry name
#[derive(Debug, Default)]
pub struct AppRegistry {
    factories: HashMap<String, AppFactory>,
}

impl AppRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: &str, factory: AppFactory) -> Result<(), RegistryError> {
        if self.factories.contains_key(key) {
            return Err(RegistryError::Duplicate(key.to_string()));
        }
        self.factories.insert(key.to_string(), factory);
        debug!("Registered embedded app factory '{}'", key);
        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// New instance from the factory registered under `key`
    pub fn create(&self, key: &str, manifest: &AppManifest) -> Option<Box<dyn EmbeddedApp>> {
        self.factories.get(key).map(|factory| factory(manifest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::embedded::InitError;
    use crate::toolkit::ContainerId;
    use roundel_core::app::RawManifest;

    struct Nop;

    impl EmbeddedApp for Nop {
        fn init(&mut self, _container: ContainerId) -> Result<(), InitError> {
            Ok(())
        }
        fn show(&mut self) {}
        fn hide(&mut self) {}
        fn cleanup(&mut self) {}
    }

    fn nop(_: &AppManifest) -> Box<dyn EmbeddedApp> {
        Box::new(Nop)
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut reg = AppRegistry::new();
        reg.register("nop", nop).unwrap();
        assert_eq!(reg.register("nop", nop), Err(RegistryError::Duplicate("nop".into())));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_create() {
        let mut reg = AppRegistry::new();
        reg.register("nop", nop).unwrap();
        let manifest = AppManifest::validate(&RawManifest {
            id: "nop",
            name: "Nop",
            version: "1.0.0",
            mode: "embedded",
            entry: "nop",
            ..RawManifest::default()
        })
        .unwrap();

        assert!(reg.create("nop", &manifest).is_some());
        assert!(reg.create("other", &manifest).is_none());
    }
}
