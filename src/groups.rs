//! Group profile builder: population statistics to simulation inputs.
//!
//! Simulations must always be runnable, even with no real data: when no
//! usable asymmetry is supplied the builder falls back to a fixed
//! advantaged/disadvantaged pair.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Baselines are clamped to this range before responsiveness is derived.
const BASELINE_MIN: f64 = 0.30;
const BASELINE_MAX: f64 = 0.95;

/// Step between synthetic descending baselines when a group carries no known
/// outcome rate.
const SYNTHETIC_BASELINE_STEP: f64 = 0.10;

/// One population segment as the simulator consumes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupProfile {
    pub name: String,
    /// Outcome rate with zero extra allocation, in `[0, 1]`.
    pub baseline_outcome: f64,
    /// Marginal outcome gain per unit of allocated resource, in `[0, 1]`.
    pub responsiveness: f64,
    /// Fraction of the population, in `(0, 1]`. Shares for one simulation
    /// sum to 1 (renormalized if they do not).
    pub population_share: f64,
}

/// Raw per-group statistics as detected by the (out-of-scope) caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStat {
    pub name: String,
    /// Observation count for this group.
    pub count: u64,
    /// Known outcome rate in `[0, 1]`, if the caller measured one.
    #[serde(default)]
    pub outcome_rate: Option<f64>,
}

/// Detected population asymmetry: one entry per group.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupAsymmetry {
    pub groups: Vec<GroupStat>,
}

/// Builds simulation-ready profiles from detected group statistics.
///
/// With no asymmetry, fewer than two distinct groups, or a zero total count,
/// returns the fixed fallback pair. Otherwise population share comes from
/// group counts, the baseline from the measured outcome rate (or an
/// evenly-spaced synthetic baseline descending from 0.85 by group index),
/// and responsiveness inversely from the baseline: structurally
/// disadvantaged groups have more room to improve per unit of resource.
pub fn build_profiles(asymmetry: Option<&GroupAsymmetry>) -> Vec<GroupProfile> {
    let Some(asymmetry) = asymmetry else {
        return fallback_profiles();
    };

    let mut names: Vec<&str> = asymmetry.groups.iter().map(|g| g.name.as_str()).collect();
    names.sort_unstable();
    names.dedup();
    let total: u64 = asymmetry.groups.iter().map(|g| g.count).sum();
    if names.len() < 2 || total == 0 {
        debug!(
            distinct = names.len(),
            total, "unusable group asymmetry, using fallback pair"
        );
        return fallback_profiles();
    }

    let profiles = asymmetry
        .groups
        .iter()
        .enumerate()
        .map(|(index, group)| {
            let baseline = group
                .outcome_rate
                .filter(|r| r.is_finite())
                .unwrap_or(0.85 - SYNTHETIC_BASELINE_STEP * index as f64)
                .clamp(BASELINE_MIN, BASELINE_MAX);
            GroupProfile {
                name: group.name.clone(),
                baseline_outcome: baseline,
                responsiveness: responsiveness_for(baseline),
                population_share: group.count as f64 / total as f64,
            }
        })
        .collect();
    normalize_shares(profiles)
}

/// The fixed two-group fallback: an advantaged majority-style group and a
/// disadvantaged group with more headroom.
pub fn fallback_profiles() -> Vec<GroupProfile> {
    vec![
        GroupProfile {
            name: "Group A".to_string(),
            baseline_outcome: 0.85,
            responsiveness: 0.10,
            population_share: 0.5,
        },
        GroupProfile {
            name: "Group B".to_string(),
            baseline_outcome: 0.55,
            responsiveness: 0.35,
            population_share: 0.5,
        },
    ]
}

/// Responsiveness derived inversely from the baseline, floored at 0.05.
fn responsiveness_for(baseline: f64) -> f64 {
    (0.4 * (1.0 - baseline)).max(0.05)
}

/// Renormalizes population shares to sum to exactly 1.
pub(crate) fn normalize_shares(mut profiles: Vec<GroupProfile>) -> Vec<GroupProfile> {
    let total: f64 = profiles.iter().map(|p| p.population_share).sum();
    if total > 0.0 && (total - 1.0).abs() > 1e-12 {
        for profile in &mut profiles {
            profile.population_share /= total;
        }
    }
    profiles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(name: &str, count: u64, rate: Option<f64>) -> GroupStat {
        GroupStat {
            name: name.to_string(),
            count,
            outcome_rate: rate,
        }
    }

    #[test]
    fn none_returns_fallback_pair_with_unit_share() {
        let profiles = build_profiles(None);
        assert_eq!(profiles.len(), 2);
        let share: f64 = profiles.iter().map(|p| p.population_share).sum();
        assert!((share - 1.0).abs() < 1e-12);
        assert!(profiles[0].baseline_outcome > profiles[1].baseline_outcome);
        assert!(profiles[1].responsiveness > profiles[0].responsiveness);
    }

    #[test]
    fn single_distinct_group_falls_back() {
        let asym = GroupAsymmetry {
            groups: vec![stat("only", 120, Some(0.7))],
        };
        assert_eq!(build_profiles(Some(&asym)), fallback_profiles());
    }

    #[test]
    fn shares_come_from_counts() {
        let asym = GroupAsymmetry {
            groups: vec![stat("a", 75, Some(0.9)), stat("b", 25, Some(0.5))],
        };
        let profiles = build_profiles(Some(&asym));
        assert!((profiles[0].population_share - 0.75).abs() < 1e-12);
        assert!((profiles[1].population_share - 0.25).abs() < 1e-12);
    }

    #[test]
    fn missing_rates_get_descending_synthetic_baselines() {
        let asym = GroupAsymmetry {
            groups: vec![stat("a", 1, None), stat("b", 1, None), stat("c", 1, None)],
        };
        let profiles = build_profiles(Some(&asym));
        assert!((profiles[0].baseline_outcome - 0.85).abs() < 1e-12);
        assert!((profiles[1].baseline_outcome - 0.75).abs() < 1e-12);
        assert!((profiles[2].baseline_outcome - 0.65).abs() < 1e-12);
    }

    #[test]
    fn baselines_clamp_and_responsiveness_floors() {
        let asym = GroupAsymmetry {
            groups: vec![stat("hi", 1, Some(1.0)), stat("lo", 1, Some(0.01))],
        };
        let profiles = build_profiles(Some(&asym));
        assert!((profiles[0].baseline_outcome - 0.95).abs() < 1e-12);
        assert!((profiles[1].baseline_outcome - 0.30).abs() < 1e-12);
        assert!(profiles[0].responsiveness >= 0.05);
        assert!((profiles[1].responsiveness - 0.28).abs() < 1e-12);
    }
}
