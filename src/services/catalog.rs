//! # Grouped service input.
//!
//! Configuration usually arrives grouped by capability type
//! (`capability → [services providing it]`). [`ServiceCatalog`] keeps that
//! shape for callers that want it, but the grouping is only a convenience:
//! the orchestrator flattens it and evaluates every service against the
//! single run-wide registry.
//!
//! ## Rules
//! - Flattening dedupes by identity (`Arc::ptr_eq`): a service listed under
//!   several groups launches once.
//! - Group order is the capability order; within a group, insertion order.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::services::capability::Capability;
use crate::services::service::Service;

/// Services grouped by capability type.
///
/// # Example
/// ```
/// use bootvisor::{Service, ServiceCatalog};
///
/// let net = Service::builder("net").provides(["net", "dns"]).build();
/// let app = Service::builder("app").needs(["net"]).build();
///
/// let mut catalog = ServiceCatalog::new();
/// catalog.push(net);
/// catalog.insert("apps", app);
///
/// // `net` sits under two groups but is listed once.
/// assert_eq!(catalog.services().len(), 2);
/// ```
#[derive(Debug, Default, Clone)]
pub struct ServiceCatalog {
    groups: BTreeMap<Capability, Vec<Arc<Service>>>,
    ungrouped: Vec<Arc<Service>>,
}

impl ServiceCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `service` under an explicit group key.
    pub fn insert(&mut self, group: impl Into<Capability>, service: Arc<Service>) {
        self.groups.entry(group.into()).or_default().push(service);
    }

    /// Adds `service` under every capability it provides, or as ungrouped if it provides none.
    pub fn push(&mut self, service: Arc<Service>) {
        if service.provides().is_empty() {
            self.ungrouped.push(service);
            return;
        }
        for cap in service.provides() {
            self.groups
                .entry(cap.clone())
                .or_default()
                .push(Arc::clone(&service));
        }
    }

    /// Returns the services registered under `group`.
    pub fn group(&self, group: &str) -> &[Arc<Service>] {
        self.groups.get(group).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns true if the catalog holds no service.
    pub fn is_empty(&self) -> bool {
        self.ungrouped.is_empty() && self.groups.values().all(Vec::is_empty)
    }

    /// Flattens the catalog into distinct services.
    pub fn services(&self) -> Vec<Arc<Service>> {
        dedupe(
            self.groups
                .values()
                .flatten()
                .chain(self.ungrouped.iter())
                .cloned(),
        )
    }
}

impl From<HashMap<Capability, Vec<Arc<Service>>>> for ServiceCatalog {
    fn from(groups: HashMap<Capability, Vec<Arc<Service>>>) -> Self {
        Self {
            groups: groups.into_iter().collect(),
            ungrouped: Vec::new(),
        }
    }
}

impl FromIterator<Arc<Service>> for ServiceCatalog {
    fn from_iter<T: IntoIterator<Item = Arc<Service>>>(iter: T) -> Self {
        let mut catalog = Self::new();
        for service in iter {
            catalog.push(service);
        }
        catalog
    }
}

impl IntoIterator for &ServiceCatalog {
    type Item = Arc<Service>;
    type IntoIter = std::vec::IntoIter<Arc<Service>>;

    fn into_iter(self) -> Self::IntoIter {
        self.services().into_iter()
    }
}

/// Keeps the first occurrence of every distinct service, preserving order.
pub(crate) fn dedupe(services: impl IntoIterator<Item = Arc<Service>>) -> Vec<Arc<Service>> {
    let mut out: Vec<Arc<Service>> = Vec::new();
    for service in services {
        if !out.iter().any(|s| Arc::ptr_eq(s, &service)) {
            out.push(service);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_provider_listed_once() {
        let both = Service::builder("both").provides(["a", "b"]).build();
        let plain = Service::builder("plain").build();
        let catalog: ServiceCatalog = [both.clone(), plain.clone()].into_iter().collect();

        assert_eq!(catalog.group("a").len(), 1);
        assert_eq!(catalog.group("b").len(), 1);
        assert!(catalog.group("c").is_empty());

        let names: Vec<String> = catalog
            .services()
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(names, ["both", "plain"]);
    }

    #[test]
    fn from_grouped_map() {
        let net = Service::builder("net").provides(["net"]).build();
        let mut map = HashMap::new();
        map.insert(Capability::from("net"), vec![net.clone(), net.clone()]);
        map.insert(Capability::from("other"), vec![net]);

        let catalog = ServiceCatalog::from(map);
        assert!(!catalog.is_empty());
        assert_eq!(catalog.services().len(), 1);
    }

    #[test]
    fn same_name_different_services_are_kept() {
        // Name clashes are the orchestrator's call, not the catalog's.
        let a1 = Service::builder("a").build();
        let a2 = Service::builder("a").build();
        assert_eq!(dedupe([a1.clone(), a2, a1]).len(), 2);
    }
}
