//! Score plugin framework.
//!
//! The traits mirror the Score extension point of the Kubernetes scheduling
//! framework. Some comments are quoted from the Kubernetes codebase.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::anyhow;

use crate::config::NodeResourcesAllocatableArgs;
use crate::cycle_state::CycleState;
use crate::models::PodInfo;
use crate::snapshot::NodeInfoLister;

pub mod allocatable;
pub mod resource_allocation;

/// MinNodeScore is the minimum score a Score plugin is expected to return.
pub const MIN_NODE_SCORE: i64 = 0;
/// MaxNodeScore is the maximum score a Score plugin is expected to return.
pub const MAX_NODE_SCORE: i64 = 100;

pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;
}

/// Plugin that ranks nodes passing the filtering phase.
pub trait ScorePlugin: Plugin {
    /// Assigns a score to a node. The node is looked up by name in the
    /// plugin's snapshot; a lookup failure is returned as an Error status.
    fn score(&self, state: &CycleState, pod: &PodInfo, node_name: &str) -> (i64, Status);

    /// Returns the normalizer applied once all nodes have been scored, if any.
    fn score_extension(&self) -> Option<&dyn ScoreExtension>;
}

pub trait ScoreExtension: Send + Sync {
    /// Called once per round after all nodes are scored. Rewrites every
    /// score in place; a non-success status aborts the round.
    fn normalize_score(
        &self,
        state: &CycleState,
        pod: &PodInfo,
        scores: &mut [NodeScore],
    ) -> Status;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeScore {
    pub name: String,
    pub score: i64,
}

impl NodeScore {
    pub fn new(name: impl Into<String>, score: i64) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

/// Rescales raw scores linearly into `[MIN_NODE_SCORE, MAX_NODE_SCORE]`.
///
/// The lowest raw score maps to `MIN_NODE_SCORE` and the highest to
/// `MAX_NODE_SCORE`. When every node scored the same, all of them get
/// `MIN_NODE_SCORE`. Each score is rescaled on its own with truncating
/// division.
pub fn normalize_scores(scores: &mut [NodeScore]) {
    let Some(highest) = scores.iter().map(|s| s.score).max() else {
        return;
    };
    let lowest = scores.iter().map(|s| s.score).min().unwrap_or(highest);

    let old_range = i128::from(highest) - i128::from(lowest);
    let new_range = i128::from(MAX_NODE_SCORE - MIN_NODE_SCORE);
    for node_score in scores.iter_mut() {
        if old_range == 0 {
            node_score.score = MIN_NODE_SCORE;
        } else {
            let scaled = (i128::from(node_score.score) - i128::from(lowest)) * new_range / old_range;
            // 0 <= scaled <= new_range
            node_score.score = scaled as i64 + MIN_NODE_SCORE;
        }
    }
}

#[derive(Clone, Debug)]
pub struct Status {
    pub code: Code,
    pub err: String,
    pub plugin: String,
}

impl Default for Status {
    /// Default success status
    fn default() -> Self {
        Self {
            code: Code::Success,
            err: String::new(),
            plugin: String::new(),
        }
    }
}

impl Status {
    pub fn error(error: &str) -> Self {
        Self {
            code: Code::Error,
            err: error.to_string(),
            ..Default::default()
        }
    }

    pub fn with_plugin(mut self, plugin: &str) -> Self {
        self.plugin = plugin.to_string();
        self
    }

    pub fn is_success(&self) -> bool {
        self.code == Code::Success
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.code)?;
        if !self.plugin.is_empty() {
            write!(f, " from plugin {}", self.plugin)?;
        }
        if !self.err.is_empty() {
            write!(f, ": {}", self.err)?;
        }
        Ok(())
    }
}

/// Code is the Status code/type which is returned from plugins.
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum Code {
    /// Success means that plugin ran correctly.
    Success,
    /// Error is used for internal plugin errors, unexpected input, etc.
    Error,
}

pub type PluginFactory =
    fn(Option<&str>, Arc<dyn NodeInfoLister>) -> anyhow::Result<Arc<dyn ScorePlugin>>;

/// Maps plugin names to the factories that build them from raw YAML args.
#[derive(Default)]
pub struct Registry {
    factories: HashMap<String, PluginFactory>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_plugins() -> Self {
        let mut registry = Self::new();
        registry.factories.insert(
            allocatable::ALLOCATABLE_NAME.to_string(),
            new_allocatable as PluginFactory,
        );
        registry
    }

    pub fn register(&mut self, name: &str, factory: PluginFactory) -> anyhow::Result<()> {
        if self.factories.contains_key(name) {
            return Err(anyhow!("a plugin named {name} already exists"));
        }
        self.factories.insert(name.to_string(), factory);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn build(
        &self,
        name: &str,
        args: Option<&str>,
        handle: Arc<dyn NodeInfoLister>,
    ) -> anyhow::Result<Arc<dyn ScorePlugin>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| anyhow!("plugin {name} is not registered"))?;
        factory(args, handle)
    }
}

fn new_allocatable(
    args: Option<&str>,
    handle: Arc<dyn NodeInfoLister>,
) -> anyhow::Result<Arc<dyn ScorePlugin>> {
    let args = args
        .map(NodeResourcesAllocatableArgs::from_yaml)
        .transpose()?;
    let plugin = allocatable::Allocatable::new(args.as_ref(), handle)?;
    Ok(Arc::new(plugin))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(raw: &[i64]) -> Vec<NodeScore> {
        raw.iter()
            .enumerate()
            .map(|(i, s)| NodeScore::new(format!("node{i}"), *s))
            .collect()
    }

    fn values(scores: &[NodeScore]) -> Vec<i64> {
        scores.iter().map(|s| s.score).collect()
    }

    #[test]
    fn test_normalize_empty() {
        let mut s: Vec<NodeScore> = vec![];
        normalize_scores(&mut s);
        assert!(s.is_empty());
    }

    #[test]
    fn test_normalize_single_node() {
        for raw in [-42, 0, 7, i64::MAX, i64::MIN] {
            let mut s = scores(&[raw]);
            normalize_scores(&mut s);
            assert_eq!(values(&s), vec![MIN_NODE_SCORE]);
        }
    }

    #[test]
    fn test_normalize_all_equal() {
        let mut s = scores(&[-5, -5, -5, -5]);
        normalize_scores(&mut s);
        assert_eq!(values(&s), vec![MIN_NODE_SCORE; 4]);
    }

    #[test]
    fn test_normalize_least_mode_scenario() {
        let mut s = scores(&[-6, -2]);
        normalize_scores(&mut s);
        assert_eq!(values(&s), vec![0, 100]);
    }

    #[test]
    fn test_normalize_truncates_per_node() {
        let mut s = scores(&[0, 1, 2, 3]);
        normalize_scores(&mut s);
        // 100/3 = 33, 200/3 = 66
        assert_eq!(values(&s), vec![0, 33, 66, 100]);
    }

    #[test]
    fn test_normalize_bounds() {
        let mut s = scores(&[17, -300, 45, 1_000_000, 12]);
        normalize_scores(&mut s);
        assert_eq!(s[1].score, MIN_NODE_SCORE);
        assert_eq!(s[3].score, MAX_NODE_SCORE);
        assert!(s.iter().all(|n| (MIN_NODE_SCORE..=MAX_NODE_SCORE).contains(&n.score)));
    }

    #[test]
    fn test_normalize_extreme_range() {
        let mut s = scores(&[i64::MIN, 0, i64::MAX]);
        normalize_scores(&mut s);
        assert_eq!(values(&s), vec![0, 50, 100]);
    }

    #[test]
    fn test_normalize_idempotent() {
        let mut s = scores(&[0, 13, 50, 99, 100]);
        normalize_scores(&mut s);
        assert_eq!(values(&s), vec![0, 13, 50, 99, 100]);
    }

    #[test]
    fn test_registry_unknown_plugin() {
        let registry = Registry::with_default_plugins();
        assert!(registry.contains(allocatable::ALLOCATABLE_NAME));
        let err = registry
            .build("NodeResourcesFit", None, Arc::new(crate::snapshot::Snapshot::default()))
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "plugin NodeResourcesFit is not registered");
    }

    #[test]
    fn test_registry_duplicate_plugin() {
        let mut registry = Registry::with_default_plugins();
        assert!(registry.register(allocatable::ALLOCATABLE_NAME, new_allocatable).is_err());
    }

    #[test]
    fn test_status_display() {
        let status = Status::error("boom").with_plugin("NodeResourcesAllocatable");
        assert!(!status.is_success());
        assert_eq!(status.to_string(), "Error from plugin NodeResourcesAllocatable: boom");
        assert!(Status::default().is_success());
    }
}
