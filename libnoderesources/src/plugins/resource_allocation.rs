use crate::config::WeightConfiguration;
use crate::models::{
    AllocatableView, NodeInfo, PodInfo, RESOURCE_CPU, RESOURCE_EPHEMERAL_STORAGE, RESOURCE_MEMORY,
    RequestedView, ResourceList, ResourceName,
};

/// CPU request, in millicores, assumed for containers that request none.
pub const DEFAULT_MILLI_CPU_REQUEST: i64 = 100;
/// Memory request, in bytes, assumed for containers that request none.
pub const DEFAULT_MEMORY_REQUEST: i64 = 200 * 1024 * 1024;

/// Scores a node from the allocatable and requested amounts of the weighted
/// resources.
pub struct ResourceAllocationScorer {
    pub name: &'static str,
    pub config: WeightConfiguration,
}

impl ResourceAllocationScorer {
    pub fn new(name: &'static str, config: WeightConfiguration) -> Self {
        Self { name, config }
    }

    pub fn score(&self, pod: &PodInfo, node_info: &NodeInfo) -> i64 {
        let (requested, allocatable) = self.resource_views(pod, node_info);
        let score = self.config.score(&allocatable);
        log::trace!(
            "{}: pod {} node {} allocatable {:?} requested {:?} score {}",
            self.name,
            pod.name,
            node_info.name,
            allocatable,
            requested,
            score
        );
        score
    }

    /// Collects the requested and allocatable views of every weighted resource.
    pub fn resource_views(
        &self,
        pod: &PodInfo,
        node_info: &NodeInfo,
    ) -> (RequestedView, AllocatableView) {
        let mut requested = RequestedView::with_capacity(self.config.weights().len());
        let mut allocatable = AllocatableView::with_capacity(self.config.weights().len());
        for resource in self.config.weights().keys() {
            let (alloc, req) = calculate_resource_allocatable_request(node_info, pod, resource);
            allocatable.insert(resource.clone(), alloc);
            requested.insert(resource.clone(), req);
        }
        (requested, allocatable)
    }
}

/// Returns the node's allocatable amount of `resource` and the amount that
/// would be requested once `pod` lands on it.
pub fn calculate_resource_allocatable_request(
    node_info: &NodeInfo,
    pod: &PodInfo,
    resource: &ResourceName,
) -> (i64, i64) {
    let pod_request = calculate_pod_resource_request(pod, resource);
    match resource.as_str() {
        RESOURCE_CPU => (
            node_info.allocatable.milli_cpu,
            node_info.non_zero_requested.milli_cpu + pod_request,
        ),
        RESOURCE_MEMORY => (
            node_info.allocatable.memory,
            node_info.non_zero_requested.memory + pod_request,
        ),
        RESOURCE_EPHEMERAL_STORAGE => (
            node_info.allocatable.ephemeral_storage,
            node_info.requested.ephemeral_storage + pod_request,
        ),
        _ if resource.is_scalar() => (
            node_info.allocatable.scalar(resource),
            node_info.requested.scalar(resource) + pod_request,
        ),
        _ => {
            log::trace!(
                "requested resource {} is omitted for node score calculation",
                resource
            );
            (0, 0)
        }
    }
}

/// Effective request of `pod` for `resource`: the sum over its containers,
/// raised to the largest init container request, plus the pod overhead.
pub fn calculate_pod_resource_request(pod: &PodInfo, resource: &ResourceName) -> i64 {
    let mut pod_request: i64 = pod
        .spec
        .containers
        .iter()
        .map(|c| request_for_resource(resource, &c.requests))
        .sum();

    for init_container in &pod.spec.init_containers {
        pod_request = pod_request.max(request_for_resource(resource, &init_container.requests));
    }

    if let Some(quantity) = pod
        .spec
        .overhead
        .as_ref()
        .and_then(|overhead| overhead.get(resource))
    {
        pod_request += quantity;
    }
    pod_request
}

/// Request of a single container, substituting the non-zero defaults for
/// cpu and memory when they are not set.
fn request_for_resource(resource: &ResourceName, requests: &ResourceList) -> i64 {
    let requested = requests.get(resource).copied();
    match resource.as_str() {
        RESOURCE_CPU => requested.unwrap_or(DEFAULT_MILLI_CPU_REQUEST),
        RESOURCE_MEMORY => requested.unwrap_or(DEFAULT_MEMORY_REQUEST),
        _ => requested.unwrap_or(0),
    }
}
