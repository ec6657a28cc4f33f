use std::sync::Arc;

use crate::{
    config::{NodeResourcesAllocatableArgs, WeightConfiguration},
    cycle_state::CycleState,
    error::Result,
    models::PodInfo,
    plugins::{
        NodeScore, Plugin, ScoreExtension, ScorePlugin, Status,
        normalize_scores, resource_allocation::ResourceAllocationScorer,
    },
    snapshot::NodeInfoLister,
};

/// Name of the plugin used in the registry and configurations.
pub const ALLOCATABLE_NAME: &str = "NodeResourcesAllocatable";

/// Score plugin that favors nodes based on their allocatable resources.
///
/// In `Least` mode nodes with fewer allocatable resources win, in `Most`
/// mode nodes with more. Raw scores are negative in `Least` mode and are
/// only meaningful after [`ScoreExtension::normalize_score`].
pub struct Allocatable {
    handle: Arc<dyn NodeInfoLister>,
    scorer: ResourceAllocationScorer,
}

impl Allocatable {
    pub fn new(
        args: Option<&NodeResourcesAllocatableArgs>,
        handle: Arc<dyn NodeInfoLister>,
    ) -> Result<Self> {
        let config = WeightConfiguration::from_args(args)?;
        log::debug!(
            "plugin {} configured with mode {} and weights {:?}",
            ALLOCATABLE_NAME,
            config.mode(),
            config.weights()
        );
        Ok(Self {
            handle,
            scorer: ResourceAllocationScorer::new(ALLOCATABLE_NAME, config),
        })
    }

    pub fn config(&self) -> &WeightConfiguration {
        &self.scorer.config
    }
}

impl Plugin for Allocatable {
    fn name(&self) -> &str {
        ALLOCATABLE_NAME
    }
}

impl ScorePlugin for Allocatable {
    fn score(&self, _state: &CycleState, pod: &PodInfo, node_name: &str) -> (i64, Status) {
        let node_info = match self.handle.get(node_name) {
            Ok(node_info) => node_info,
            Err(e) => {
                log::warn!("{ALLOCATABLE_NAME}: failed to get node {node_name}: {e}");
                return (
                    0,
                    Status::error(&format!("getting node {node_name:?} from snapshot: {e}"))
                        .with_plugin(ALLOCATABLE_NAME),
                );
            }
        };

        (self.scorer.score(pod, &node_info), Status::default())
    }

    fn score_extension(&self) -> Option<&dyn ScoreExtension> {
        Some(self)
    }
}

impl ScoreExtension for Allocatable {
    fn normalize_score(&self, _: &CycleState, _: &PodInfo, scores: &mut [NodeScore]) -> Status {
        normalize_scores(scores);
        Status::default()
    }
}
