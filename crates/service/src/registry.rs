//! Kind-tag to service-instance dispatch.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use atelier_core::record::AssetKind;

use crate::service::AssetService;

/// Maps each asset kind tag to its service instance.
///
/// Built once at startup; call sites resolve a typed service by kind
/// instead of switching on an asset-type enum.
#[derive(Default)]
pub struct ServiceRegistry {
    services: HashMap<&'static str, Arc<dyn Any + Send + Sync>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: AssetKind>(&mut self, service: Arc<AssetService<T>>) {
        self.services.insert(T::KIND, service);
    }

    /// Resolve the service for kind `T`, if registered.
    pub fn get<T: AssetKind>(&self) -> Option<Arc<AssetService<T>>> {
        let service = self.services.get(T::KIND)?.clone();
        service.downcast::<AssetService<T>>().ok()
    }

    /// All registered kind tags, sorted for stable iteration.
    pub fn kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<_> = self.services.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_store::MemoryStore;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Model {
        name: String,
    }
    impl AssetKind for Model {
        const KIND: &'static str = "model";
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Scene {
        label: String,
    }
    impl AssetKind for Scene {
        const KIND: &'static str = "scene";
    }

    fn service<T: AssetKind>() -> Arc<AssetService<T>> {
        Arc::new(AssetService::new(
            Arc::new(MemoryStore::<T>::new()),
            None,
            format!("atelier-{}", T::KIND),
        ))
    }

    #[test]
    fn registered_kind_resolves_to_typed_service() {
        let mut registry = ServiceRegistry::new();
        registry.register(service::<Model>());
        registry.register(service::<Scene>());

        assert!(registry.get::<Model>().is_some());
        assert!(registry.get::<Scene>().is_some());
        assert_eq!(registry.kinds(), vec!["model", "scene"]);
    }

    #[test]
    fn unregistered_kind_is_none() {
        let mut registry = ServiceRegistry::new();
        registry.register(service::<Model>());
        assert!(registry.get::<Scene>().is_none());
    }
}
