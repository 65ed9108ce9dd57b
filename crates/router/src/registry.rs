//! Capability registry — the static, validated set of routable services.
//!
//! Read-only after construction. Registration order is preserved because the
//! router breaks scoring ties by it.

use std::collections::{HashMap, HashSet};
use switchboard_core::capability::Capability;
use switchboard_core::error::RegistryError;
use switchboard_core::service::ServiceDescriptor;

#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    services: Vec<ServiceDescriptor>,
    index: HashMap<String, usize>,
}

impl CapabilityRegistry {
    /// Build a registry, rejecting duplicate names, dangling fallbacks and
    /// fallback cycles.
    pub fn new(services: Vec<ServiceDescriptor>) -> Result<Self, RegistryError> {
        let mut index = HashMap::with_capacity(services.len());
        for (i, descriptor) in services.iter().enumerate() {
            if descriptor.name.trim().is_empty() {
                return Err(RegistryError::EmptyName);
            }
            if index.insert(descriptor.name.clone(), i).is_some() {
                return Err(RegistryError::DuplicateService(descriptor.name.clone()));
            }
        }

        let registry = Self { services, index };
        registry.check_fallbacks()?;
        Ok(registry)
    }

    /// Each node has at most one fallback edge, so walking from every node
    /// until the chain ends finds any cycle.
    fn check_fallbacks(&self) -> Result<(), RegistryError> {
        for descriptor in &self.services {
            let Some(fallback) = descriptor.fallback.as_deref() else {
                continue;
            };
            if fallback == descriptor.name {
                return Err(RegistryError::SelfFallback(descriptor.name.clone()));
            }
            if !self.index.contains_key(fallback) {
                return Err(RegistryError::UnknownFallback {
                    service: descriptor.name.clone(),
                    fallback: fallback.to_string(),
                });
            }
        }

        for start in &self.services {
            let mut seen: HashSet<&str> = HashSet::new();
            let mut path: Vec<String> = Vec::new();
            let mut current = Some(start);
            while let Some(descriptor) = current {
                path.push(descriptor.name.clone());
                if !seen.insert(descriptor.name.as_str()) {
                    return Err(RegistryError::FallbackCycle(path));
                }
                current = descriptor.fallback.as_deref().and_then(|f| self.lookup(f));
            }
        }

        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&ServiceDescriptor> {
        self.index.get(name).map(|&i| &self.services[i])
    }

    /// Every descriptor, in registration order.
    pub fn all_services(&self) -> &[ServiceDescriptor] {
        &self.services
    }

    /// Names of services declaring `capability`, in registration order.
    pub fn services_with_capability(&self, capability: Capability) -> Vec<&str> {
        self.services
            .iter()
            .filter(|d| d.has_capability(capability))
            .map(|d| d.name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
