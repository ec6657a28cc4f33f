//! Runs one score plugin over the candidate nodes of a scheduling round.

use std::sync::Arc;

use tokio::task::JoinSet;

use crate::cycle_state::CycleState;
use crate::models::PodInfo;
use crate::plugins::{NodeScore, ScorePlugin, Status};

/// Scores every node concurrently, then normalizes the full list once.
///
/// Scores come back in the order of `node_names`. If any node fails, the
/// round fails with the status of the first failing node in that order.
/// If the plugin is listed in `state.skip_score_plugins` no node is scored
/// and the list is empty.
pub async fn run_score_plugin(
    plugin: Arc<dyn ScorePlugin>,
    state: Arc<CycleState>,
    pod: Arc<PodInfo>,
    node_names: &[String],
) -> Result<Vec<NodeScore>, Status> {
    if state.skip_score_plugins.contains(plugin.name()) {
        log::debug!("skipping score plugin {} for pod {}", plugin.name(), pod.name);
        return Ok(Vec::new());
    }

    let mut tasks = JoinSet::new();
    for (index, node_name) in node_names.iter().enumerate() {
        let plugin = plugin.clone();
        let state = state.clone();
        let pod = pod.clone();
        let node_name = node_name.clone();
        tasks.spawn(async move {
            let (score, status) = plugin.score(&state, &pod, &node_name);
            (index, NodeScore::new(node_name, score), status)
        });
    }

    let mut slots: Vec<Option<(NodeScore, Status)>> = vec![None; node_names.len()];
    while let Some(joined) = tasks.join_next().await {
        let (index, node_score, status) = joined.map_err(|e| {
            Status::error(&format!("score task failed: {e}")).with_plugin(plugin.name())
        })?;
        slots[index] = Some((node_score, status));
    }

    let mut scores = Vec::with_capacity(slots.len());
    for (node_score, status) in slots.into_iter().flatten() {
        if !status.is_success() {
            return Err(status.with_plugin(plugin.name()));
        }
        scores.push(node_score);
    }

    if let Some(extension) = plugin.score_extension() {
        let status = extension.normalize_score(&state, &pod, &mut scores);
        if !status.is_success() {
            return Err(status.with_plugin(plugin.name()));
        }
    }
    Ok(scores)
}
