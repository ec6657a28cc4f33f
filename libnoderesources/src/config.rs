//! Arguments of the NodeResourcesAllocatable plugin and the resource weight
//! configuration derived from them.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AllocatableError, Result};
use crate::models::{AllocatableView, ResourceName};

/// Whether nodes with the least or the most allocatable resources are
/// preferred.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModeType {
    #[default]
    Least,
    Most,
}

impl ModeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModeType::Least => "Least",
            ModeType::Most => "Most",
        }
    }
}

impl fmt::Display for ModeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModeType {
    type Err = AllocatableError;

    /// An empty mode falls back to [`ModeType::Least`].
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" | "Least" => Ok(ModeType::Least),
            "Most" => Ok(ModeType::Most),
            other => Err(AllocatableError::UnsupportedMode(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSpec {
    pub name: ResourceName,
    pub weight: i64,
}

impl ResourceSpec {
    pub fn new(name: impl Into<ResourceName>, weight: i64) -> Self {
        Self {
            name: name.into(),
            weight,
        }
    }
}

/// Args payload handed to the plugin by the scheduler configuration.
///
/// An absent or empty resource list selects the default weights, an absent
/// or empty mode selects `Least`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeResourcesAllocatableArgs {
    pub resources: Vec<ResourceSpec>,
    /// Kept as a string so unknown modes are reported by validation rather
    /// than as a decode error.
    pub mode: String,
}

impl NodeResourcesAllocatableArgs {
    pub fn from_yaml(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }
}

/// Checks that every weight is positive and the mode is supported. Weights
/// have no upper bound.
pub fn validate_node_resources_allocatable_args(args: &NodeResourcesAllocatableArgs) -> Result<()> {
    validate_resources(&args.resources)?;
    args.mode.parse::<ModeType>()?;
    Ok(())
}

fn validate_resources(resources: &[ResourceSpec]) -> Result<()> {
    for resource in resources {
        validate_weight(&resource.name, resource.weight)?;
    }
    Ok(())
}

fn validate_weight(resource: &ResourceName, weight: i64) -> Result<()> {
    if weight <= 0 {
        return Err(AllocatableError::Configuration {
            resource: resource.clone(),
            weight,
        });
    }
    Ok(())
}

/// Immutable, validated mapping from resource name to weight plus the
/// scoring mode. Never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeightConfiguration {
    weights: HashMap<ResourceName, i64>,
    mode: ModeType,
}

impl Default for WeightConfiguration {
    fn default() -> Self {
        Self {
            weights: default_resources_to_weight_map(),
            mode: ModeType::Least,
        }
    }
}

fn default_resources_to_weight_map() -> HashMap<ResourceName, i64> {
    HashMap::from([(ResourceName::memory(), 1), (ResourceName::cpu(), 1)])
}

impl WeightConfiguration {
    pub fn new(weights: HashMap<ResourceName, i64>, mode: ModeType) -> Result<Self> {
        if weights.is_empty() {
            return Err(AllocatableError::DegenerateConfiguration);
        }
        for (resource, weight) in &weights {
            validate_weight(resource, *weight)?;
        }
        Ok(Self { weights, mode })
    }

    /// Builds the configuration from optional plugin args. A non-empty
    /// resource list replaces the default weights entirely.
    pub fn from_args(args: Option<&NodeResourcesAllocatableArgs>) -> Result<Self> {
        let Some(args) = args else {
            return Ok(Self::default());
        };
        validate_node_resources_allocatable_args(args)?;
        let mode = args.mode.parse::<ModeType>()?;
        let weights = if args.resources.is_empty() {
            default_resources_to_weight_map()
        } else {
            args.resources
                .iter()
                .map(|r| (r.name.clone(), r.weight))
                .collect()
        };
        Self::new(weights, mode)
    }

    pub fn mode(&self) -> ModeType {
        self.mode
    }

    pub fn weights(&self) -> &HashMap<ResourceName, i64> {
        &self.weights
    }

    pub fn weight(&self, resource: &str) -> Option<i64> {
        self.weights.get(resource).copied()
    }

    /// Weighted average of the node's allocatable capacity. Negative in
    /// `Least` mode, positive in `Most` mode. Resources missing from the
    /// view count as zero capacity.
    pub fn score(&self, allocatable: &AllocatableView) -> i64 {
        let mut node_score: i128 = 0;
        let mut weight_sum: i128 = 0;
        for (resource, weight) in &self.weights {
            let capacity = allocatable.get(resource).copied().unwrap_or(0);
            node_score += resource_score(capacity, self.mode) * i128::from(*weight);
            weight_sum += i128::from(*weight);
        }
        // weight_sum > 0 is guaranteed by construction. Negating i64::MIN
        // in Least mode can push the average to 2^63, so clamp.
        let average = node_score / weight_sum;
        i64::try_from(average).unwrap_or(if average > 0 { i64::MAX } else { i64::MIN })
    }
}

fn resource_score(capacity: i64, mode: ModeType) -> i128 {
    match mode {
        ModeType::Least => -i128::from(capacity),
        ModeType::Most => i128::from(capacity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(entries: &[(&str, i64)]) -> AllocatableView {
        entries
            .iter()
            .map(|(name, value)| (ResourceName::from(*name), *value))
            .collect()
    }

    fn config(entries: &[(&str, i64)], mode: ModeType) -> WeightConfiguration {
        let weights = entries
            .iter()
            .map(|(name, weight)| (ResourceName::from(*name), *weight))
            .collect();
        WeightConfiguration::new(weights, mode).unwrap()
    }

    #[test]
    fn test_default_configuration() {
        let cfg = WeightConfiguration::from_args(None).unwrap();
        assert_eq!(cfg.mode(), ModeType::Least);
        assert_eq!(cfg.weights().len(), 2);
        assert_eq!(cfg.weight("cpu"), Some(1));
        assert_eq!(cfg.weight("memory"), Some(1));
    }

    #[test]
    fn test_resources_replace_defaults() {
        let args = NodeResourcesAllocatableArgs {
            resources: vec![ResourceSpec::new("example.com/gpu", 5)],
            mode: "Most".to_string(),
        };
        let cfg = WeightConfiguration::from_args(Some(&args)).unwrap();
        assert_eq!(cfg.mode(), ModeType::Most);
        assert_eq!(cfg.weights().len(), 1);
        assert_eq!(cfg.weight("example.com/gpu"), Some(5));
        assert_eq!(cfg.weight("cpu"), None);
    }

    #[test]
    fn test_empty_resources_and_mode_use_defaults() {
        let args = NodeResourcesAllocatableArgs {
            resources: vec![],
            mode: String::new(),
        };
        let cfg = WeightConfiguration::from_args(Some(&args)).unwrap();
        assert_eq!(cfg, WeightConfiguration::default());
    }

    #[test]
    fn test_non_positive_weight_is_rejected() {
        for weight in [0, -1, i64::MIN] {
            let args = NodeResourcesAllocatableArgs {
                resources: vec![
                    ResourceSpec::new("cpu", 1),
                    ResourceSpec::new("memory", weight),
                ],
                mode: "Least".to_string(),
            };
            let err = WeightConfiguration::from_args(Some(&args)).unwrap_err();
            match err {
                AllocatableError::Configuration { resource, weight: w } => {
                    assert_eq!(resource.as_str(), "memory");
                    assert_eq!(w, weight);
                }
                other => panic!("unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn test_error_message_names_resource() {
        let err = WeightConfiguration::new(HashMap::from([("cpu".into(), 0)]), ModeType::Least)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "resource weight of cpu should be a positive value, got 0"
        );
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let args = NodeResourcesAllocatableArgs {
            resources: vec![],
            mode: "Balanced".to_string(),
        };
        let err = WeightConfiguration::from_args(Some(&args)).unwrap_err();
        assert!(matches!(err, AllocatableError::UnsupportedMode(m) if m == "Balanced"));
    }

    #[test]
    fn test_empty_weights_are_degenerate() {
        let err = WeightConfiguration::new(HashMap::new(), ModeType::Most).unwrap_err();
        assert!(matches!(err, AllocatableError::DegenerateConfiguration));
    }

    #[test]
    fn test_no_upper_bound_on_weight() {
        let cfg = config(&[("cpu", i64::MAX), ("memory", i64::MAX)], ModeType::Most);
        assert_eq!(cfg.score(&view(&[("cpu", 4), ("memory", 8)])), 6);
    }

    #[test]
    fn test_args_from_yaml() {
        let raw = r#"
resources:
  - name: cpu
    weight: 1048576
  - name: memory
    weight: 1
mode: Most
"#;
        let args = NodeResourcesAllocatableArgs::from_yaml(raw).unwrap();
        assert_eq!(args.resources.len(), 2);
        assert_eq!(args.resources[0], ResourceSpec::new("cpu", 1 << 20));
        assert_eq!(args.mode, "Most");
    }

    #[test]
    fn test_args_from_yaml_missing_fields() {
        let args = NodeResourcesAllocatableArgs::from_yaml("mode: Least").unwrap();
        assert!(args.resources.is_empty());
        assert!(NodeResourcesAllocatableArgs::from_yaml("resources: 3").is_err());
    }

    #[test]
    fn test_absent_empty_and_no_args_share_defaults() {
        let absent = NodeResourcesAllocatableArgs::from_yaml("mode: Least").unwrap();
        let empty = NodeResourcesAllocatableArgs::from_yaml("resources: []\nmode: Least").unwrap();
        let absent_cfg = WeightConfiguration::from_args(Some(&absent)).unwrap();
        let empty_cfg = WeightConfiguration::from_args(Some(&empty)).unwrap();
        let none_cfg = WeightConfiguration::from_args(None).unwrap();
        let default_cfg =
            WeightConfiguration::from_args(Some(&NodeResourcesAllocatableArgs::default())).unwrap();
        assert_eq!(absent_cfg, empty_cfg);
        assert_eq!(empty_cfg, none_cfg);
        assert_eq!(none_cfg, default_cfg);
        assert_eq!(none_cfg.weight("cpu"), Some(1));
        assert_eq!(none_cfg.weight("memory"), Some(1));
    }

    #[test]
    fn test_least_mode_min_capacity_saturates() {
        let least = config(&[("cpu", 1)], ModeType::Least);
        assert_eq!(least.score(&view(&[("cpu", i64::MIN)])), i64::MAX);
        let most = config(&[("cpu", 1)], ModeType::Most);
        assert_eq!(most.score(&view(&[("cpu", i64::MIN)])), i64::MIN);
        let mixed = config(&[("cpu", 1), ("memory", 1)], ModeType::Least);
        assert_eq!(mixed.score(&view(&[("cpu", i64::MIN), ("memory", 0)])), 1 << 62);
    }

    #[test]
    fn test_score_least_and_most() {
        let least = config(&[("cpu", 1), ("memory", 1)], ModeType::Least);
        let most = config(&[("cpu", 1), ("memory", 1)], ModeType::Most);
        let a = view(&[("cpu", 4), ("memory", 8)]);
        let b = view(&[("cpu", 2), ("memory", 2)]);
        assert_eq!(least.score(&a), -6);
        assert_eq!(least.score(&b), -2);
        assert_eq!(most.score(&a), 6);
        assert_eq!(most.score(&b), 2);
    }

    #[test]
    fn test_score_truncates_toward_zero() {
        let least = config(&[("cpu", 1), ("memory", 2)], ModeType::Least);
        let most = config(&[("cpu", 1), ("memory", 2)], ModeType::Most);
        // (1*1 + 2*2) / 3 = 5 / 3
        let v = view(&[("cpu", 1), ("memory", 2)]);
        assert_eq!(most.score(&v), 1);
        assert_eq!(least.score(&v), -1);
    }

    #[test]
    fn test_missing_resource_counts_as_zero() {
        let cfg = config(&[("cpu", 1), ("example.com/gpu", 1)], ModeType::Most);
        assert_eq!(cfg.score(&view(&[("cpu", 10)])), 5);
    }

    #[test]
    fn test_score_is_monotonic_in_single_resource() {
        let most = config(&[("cpu", 3), ("memory", 7)], ModeType::Most);
        let least = config(&[("cpu", 3), ("memory", 7)], ModeType::Least);
        let mut last_most = i64::MIN;
        let mut last_least = i64::MAX;
        for capacity in (0..10_000).step_by(37) {
            let v = view(&[("memory", capacity)]);
            let (m, l) = (most.score(&v), least.score(&v));
            assert!(m >= last_most);
            assert!(l <= last_least);
            last_most = m;
            last_least = l;
        }
    }

    #[test]
    fn test_score_does_not_depend_on_insertion_order() {
        let entries = [("cpu", 3), ("memory", 5), ("ephemeral-storage", 11), ("example.com/gpu", 2)];
        let forward = config(&entries, ModeType::Most);
        let mut reversed_entries = entries;
        reversed_entries.reverse();
        let reversed = config(&reversed_entries, ModeType::Most);
        let v = view(&[("cpu", 4000), ("memory", 1 << 30), ("example.com/gpu", 4)]);
        assert_eq!(forward.score(&v), reversed.score(&v));
    }
}
