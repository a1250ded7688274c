// ─────────────────────────────────────────────────────────────────────
// SCPN Actuator Core — Influence Resolver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Which ranks an actuator touches, and which of them coordinates it.

use std::collections::{BTreeMap, BTreeSet};

use actuator_types::config::RootPolicy;
use actuator_types::error::{ActuatorError, ActuatorResult};
use actuator_types::geometry::RealBox;

use crate::partition::SpatialPartition;

/// Owner set and root of one actuator under one partition epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ownership {
    pub owners: BTreeSet<usize>,
    pub root: usize,
    pub epoch: u64,
}

/// Number of actuators each rank roots within one resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootLoad {
    counts: BTreeMap<usize, usize>,
}

impl RootLoad {
    pub fn count(&self, rank: usize) -> usize {
        self.counts.get(&rank).copied().unwrap_or(0)
    }

    fn record(&mut self, rank: usize) {
        *self.counts.entry(rank).or_insert(0) += 1;
    }
}

/// Ranks whose boxes overlap `rbox` with nonzero volume.
pub fn determine_influenced_procs<P: SpatialPartition + ?Sized>(
    partition: &P,
    rbox: &RealBox,
) -> BTreeSet<usize> {
    partition
        .intersecting(rbox)
        .into_iter()
        .map(|(rank, _)| rank)
        .collect()
}

/// Overlap volume per owning rank, summed over the rank's boxes.
fn overlap_volumes<P: SpatialPartition + ?Sized>(
    partition: &P,
    rbox: &RealBox,
) -> BTreeMap<usize, f64> {
    let mut out = BTreeMap::new();
    for (rank, ov) in partition.intersecting(rbox) {
        *out.entry(rank).or_insert(0.0) += ov.volume();
    }
    out
}

/// Deterministic root election. `volumes` must be non-empty.
pub fn determine_root_proc(
    policy: RootPolicy,
    volumes: &BTreeMap<usize, f64>,
    load: &RootLoad,
) -> Option<usize> {
    // Ascending rank iteration; only a strictly better candidate replaces
    // the incumbent, so ties go to the lowest rank.
    match policy {
        RootPolicy::LowestRank => volumes.keys().next().copied(),
        RootPolicy::LargestOverlap => volumes
            .iter()
            .fold(None, |best: Option<(usize, f64)>, (&rank, &vol)| match best {
                Some((_, bv)) if bv >= vol => best,
                _ => Some((rank, vol)),
            })
            .map(|(rank, _)| rank),
        RootPolicy::LeastLoaded => volumes
            .keys()
            .fold(None, |best: Option<(usize, usize)>, &rank| {
                let c = load.count(rank);
                match best {
                    Some((_, bc)) if bc <= c => best,
                    _ => Some((rank, c)),
                }
            })
            .map(|(rank, _)| rank),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InfluenceResolver {
    policy: RootPolicy,
}

impl InfluenceResolver {
    pub fn new(policy: RootPolicy) -> Self {
        InfluenceResolver { policy }
    }

    pub fn policy(&self) -> RootPolicy {
        self.policy
    }

    /// Owner set and root for an actuator whose influence region is `rbox`.
    ///
    /// An empty owner set means the actuator lies outside the domain,
    /// which is a configuration error.
    pub fn resolve<P: SpatialPartition + ?Sized>(
        &self,
        label: &str,
        rbox: &RealBox,
        partition: &P,
        load: &mut RootLoad,
    ) -> ActuatorResult<Ownership> {
        if !rbox.is_finite() || rbox.is_empty() {
            return Err(ActuatorError::degenerate(
                label,
                format!("bounding box {rbox:?} has no volume"),
            ));
        }
        let volumes = overlap_volumes(partition, rbox);
        let root = determine_root_proc(self.policy, &volumes, load).ok_or_else(|| {
            ActuatorError::OutsideDomain {
                actuator: label.to_string(),
            }
        })?;
        load.record(root);
        Ok(Ownership {
            owners: volumes.keys().copied().collect(),
            root,
            epoch: partition.epoch(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::decompose_3d;
    use actuator_types::geometry::CartesianGrid3;
    use glam::DVec3;

    fn partition() -> crate::partition::PartitionMap {
        let grid = CartesianGrid3::new(DVec3::ZERO, DVec3::ONE, [8, 8, 8]);
        decompose_3d(&grid, [2, 2, 2], 7).expect("valid decomposition")
    }

    #[test]
    fn test_influenced_procs_octant() {
        let part = partition();
        let small = RealBox::new(DVec3::splat(0.5), DVec3::splat(1.5));
        assert_eq!(
            determine_influenced_procs(&part, &small),
            BTreeSet::from([0])
        );
        let centered = RealBox::new(DVec3::splat(3.0), DVec3::splat(5.0));
        assert_eq!(determine_influenced_procs(&part, &centered).len(), 8);
    }

    #[test]
    fn test_outside_domain_is_error() {
        let part = partition();
        let far = RealBox::new(DVec3::splat(20.0), DVec3::splat(21.0));
        let err = InfluenceResolver::default()
            .resolve("lost-wing", &far, &part, &mut RootLoad::default())
            .expect_err("outside domain");
        match err {
            ActuatorError::OutsideDomain { actuator } => assert_eq!(actuator, "lost-wing"),
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_root_policies() {
        let part = partition();
        // mostly in rank 7 (x,y,z >= 4), slivers in the others
        let rbox = RealBox::new(DVec3::splat(3.5), DVec3::splat(7.0));

        let low = InfluenceResolver::new(RootPolicy::LowestRank)
            .resolve("a", &rbox, &part, &mut RootLoad::default())
            .expect("inside");
        assert_eq!(low.root, 0);
        assert_eq!(low.owners.len(), 8);
        assert_eq!(low.epoch, 7);

        let big = InfluenceResolver::new(RootPolicy::LargestOverlap)
            .resolve("a", &rbox, &part, &mut RootLoad::default())
            .expect("inside");
        assert_eq!(big.root, 7);
    }

    #[test]
    fn test_least_loaded_spreads_roots() {
        let part = partition();
        let rbox = RealBox::new(DVec3::splat(3.0), DVec3::splat(5.0));
        let resolver = InfluenceResolver::new(RootPolicy::LeastLoaded);
        let mut load = RootLoad::default();
        let roots: Vec<usize> = (0..10)
            .map(|i| {
                resolver
                    .resolve(&format!("t{i}"), &rbox, &part, &mut load)
                    .expect("inside")
                    .root
            })
            .collect();
        assert_eq!(roots, vec![0, 1, 2, 3, 4, 5, 6, 7, 0, 1]);
        assert_eq!(load.count(0), 2);
        assert_eq!(load.count(7), 1);
    }

    #[test]
    fn test_largest_overlap_tie_breaks_to_lowest_rank() {
        let part = partition();
        let rbox = RealBox::new(DVec3::new(3.0, 1.0, 1.0), DVec3::new(5.0, 2.0, 2.0));
        let own = InfluenceResolver::new(RootPolicy::LargestOverlap)
            .resolve("tie", &rbox, &part, &mut RootLoad::default())
            .expect("inside");
        assert_eq!(own.owners, BTreeSet::from([0, 4]));
        assert_eq!(own.root, 0);
    }
}
