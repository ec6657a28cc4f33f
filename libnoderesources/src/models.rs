use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of a node resource, e.g. `cpu`, `memory` or `example.com/gpu`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceName(String);

pub const RESOURCE_CPU: &str = "cpu";
pub const RESOURCE_MEMORY: &str = "memory";
pub const RESOURCE_EPHEMERAL_STORAGE: &str = "ephemeral-storage";

const HUGE_PAGES_PREFIX: &str = "hugepages-";
const ATTACHABLE_VOLUMES_PREFIX: &str = "attachable-volumes-";
const DEFAULT_NAMESPACE: &str = "kubernetes.io/";
const REQUESTS_PREFIX: &str = "requests.";

impl ResourceName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn cpu() -> Self {
        Self::new(RESOURCE_CPU)
    }

    pub fn memory() -> Self {
        Self::new(RESOURCE_MEMORY)
    }

    pub fn ephemeral_storage() -> Self {
        Self::new(RESOURCE_EPHEMERAL_STORAGE)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extended resources live outside the `kubernetes.io/` namespace and
    /// must be domain qualified.
    pub fn is_extended(&self) -> bool {
        let name = self.0.as_str();
        if name.starts_with(REQUESTS_PREFIX) || !name.contains('/') {
            return false;
        }
        !name.contains(DEFAULT_NAMESPACE)
    }

    /// Scalar resources are tracked in [`Resource::scalar_resources`]:
    /// hugepages, attachable volumes and extended resources.
    pub fn is_scalar(&self) -> bool {
        self.0.starts_with(HUGE_PAGES_PREFIX)
            || self.0.starts_with(ATTACHABLE_VOLUMES_PREFIX)
            || self.is_extended()
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ResourceName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for ResourceName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Quantities keyed by resource name. CPU is measured in millicores,
/// everything else in its base unit (bytes for memory and storage).
pub type ResourceList = HashMap<ResourceName, i64>;

/// Capacity of the weighted resources on one node, as seen by the scorer.
pub type AllocatableView = ResourceList;

/// Requested amount of the weighted resources on one node, including the
/// incoming pod.
pub type RequestedView = ResourceList;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resource {
    /// CPU, measured in millicores.
    pub milli_cpu: i64,
    /// Memory, measured in bytes.
    pub memory: i64,
    /// Local ephemeral storage, measured in bytes.
    pub ephemeral_storage: i64,
    pub scalar_resources: HashMap<ResourceName, i64>,
}

impl Resource {
    pub fn new(milli_cpu: i64, memory: i64) -> Self {
        Self {
            milli_cpu,
            memory,
            ..Default::default()
        }
    }

    pub fn with_ephemeral_storage(mut self, ephemeral_storage: i64) -> Self {
        self.ephemeral_storage = ephemeral_storage;
        self
    }

    pub fn with_scalar(mut self, name: impl Into<ResourceName>, quantity: i64) -> Self {
        self.scalar_resources.insert(name.into(), quantity);
        self
    }

    pub fn scalar(&self, name: &ResourceName) -> i64 {
        self.scalar_resources.get(name).copied().unwrap_or(0)
    }
}

#[derive(Clone, Debug, Default)]
pub struct NodeInfo {
    pub name: String,
    pub allocatable: Resource,
    /// Sum of the requests of the pods already bound to the node.
    pub requested: Resource,
    /// Like `requested`, but pods without a cpu or memory request count
    /// with the scheduler's non-zero defaults.
    pub non_zero_requested: Resource,
}

impl NodeInfo {
    pub fn new(name: impl Into<String>, allocatable: Resource) -> Self {
        Self {
            name: name.into(),
            allocatable,
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Container {
    pub name: String,
    pub requests: ResourceList,
}

#[derive(Clone, Debug, Default)]
pub struct PodSpec {
    pub containers: Vec<Container>,
    pub init_containers: Vec<Container>,
    /// Resources consumed by the pod sandbox on top of its containers.
    pub overhead: Option<ResourceList>,
}

#[derive(Clone, Debug, Default)]
pub struct PodInfo {
    pub name: String,
    pub spec: PodSpec,
}
