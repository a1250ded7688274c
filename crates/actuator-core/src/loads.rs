// ─────────────────────────────────────────────────────────────────────
// SCPN Actuator Core — Load Integrator
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Integrated actuator loads, reduced to the root rank.

use std::collections::BTreeMap;

use actuator_types::error::{ActuatorError, ActuatorResult};
use actuator_types::state::ActuatorNode;
use glam::DVec3;
use serde::Serialize;

use crate::actuator::LoadReference;
use crate::comm::ScopedComm;
use crate::influence::Ownership;
use crate::partition::SpatialPartition;

const LOAD_LEN: usize = 11;

/// Loads exerted by the flow on the body, summed over nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LoadVector {
    pub lift: f64,
    pub drag: f64,
    pub force: DVec3,
    /// Moment about the reference origin.
    pub moment: DVec3,
    /// Force along the reference axis.
    pub thrust: f64,
    /// Moment about the reference axis.
    pub torque: f64,
    pub power: f64,
}

impl LoadVector {
    /// Add one node; its stored force acts on the fluid, so the body load
    /// is the negative.
    pub fn add_node(&mut self, node: &ActuatorNode, reference: &LoadReference) {
        let f = -node.force;
        let m = (node.position - reference.origin).cross(f);
        let torque = m.dot(reference.axis);
        self.lift += node.lift;
        self.drag += node.drag;
        self.force += f;
        self.moment += m;
        self.thrust += f.dot(reference.axis);
        self.torque += torque;
        self.power += torque * reference.omega;
    }

    fn to_array(self) -> [f64; LOAD_LEN] {
        [
            self.lift,
            self.drag,
            self.force.x,
            self.force.y,
            self.force.z,
            self.moment.x,
            self.moment.y,
            self.moment.z,
            self.thrust,
            self.torque,
            self.power,
        ]
    }

    fn from_slice(v: &[f64]) -> Self {
        LoadVector {
            lift: v[0],
            drag: v[1],
            force: DVec3::new(v[2], v[3], v[4]),
            moment: DVec3::new(v[5], v[6], v[7]),
            thrust: v[8],
            torque: v[9],
            power: v[10],
        }
    }
}

/// Partial loads of the nodes assigned to one owner rank.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadContribution {
    pub rank: usize,
    pub epoch: u64,
    pub loads: LoadVector,
}

/// Totals held by the root after a reduction.
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedLoads {
    pub root: usize,
    pub epoch: u64,
    pub totals: LoadVector,
}

/// Split the node loads across the owner set. A node belongs to the
/// lowest owner whose box contains it, or to root if none does, so every
/// node is counted exactly once.
pub fn node_contributions<P: SpatialPartition + ?Sized>(
    label: &str,
    nodes: &[ActuatorNode],
    ownership: &Ownership,
    partition: &P,
    reference: &LoadReference,
) -> ActuatorResult<Vec<LoadContribution>> {
    if partition.epoch() != ownership.epoch {
        return Err(ActuatorError::StaleOwnership {
            actuator: label.to_string(),
            expected: partition.epoch(),
            found: ownership.epoch,
        });
    }
    let mut partial: BTreeMap<usize, LoadVector> = ownership
        .owners
        .iter()
        .map(|&r| (r, LoadVector::default()))
        .collect();

    for node in nodes {
        let rank = partition
            .owned_boxes()
            .iter()
            .filter(|b| ownership.owners.contains(&b.rank) && b.region.contains(node.position))
            .map(|b| b.rank)
            .min()
            .unwrap_or(ownership.root);
        if let Some(acc) = partial.get_mut(&rank) {
            acc.add_node(node, reference);
        }
    }

    Ok(partial
        .into_iter()
        .map(|(rank, loads)| LoadContribution {
            rank,
            epoch: ownership.epoch,
            loads,
        })
        .collect())
}

pub struct LoadIntegrator;

impl LoadIntegrator {
    /// Sum the owner contributions at root.
    pub fn reduce(
        label: &str,
        contributions: Vec<LoadContribution>,
        ownership: &Ownership,
    ) -> ActuatorResult<ReducedLoads> {
        let comm = ScopedComm::new(label, ownership, ownership.epoch)?;
        if let Some(c) = contributions.iter().find(|c| c.epoch != ownership.epoch) {
            return Err(ActuatorError::StaleOwnership {
                actuator: label.to_string(),
                expected: ownership.epoch,
                found: c.epoch,
            });
        }
        let parts = contributions
            .into_iter()
            .map(|c| (c.rank, c.loads.to_array().to_vec()))
            .collect();
        let summed = comm.reduce_sum(parts)?;
        Ok(ReducedLoads {
            root: comm.root(),
            epoch: comm.epoch(),
            totals: LoadVector::from_slice(&summed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::decompose_3d;
    use actuator_types::geometry::CartesianGrid3;
    use glam::DMat3;

    fn node_at(p: DVec3, force: DVec3) -> ActuatorNode {
        let mut n = ActuatorNode::new(p, DMat3::IDENTITY, 1.0, 1.0);
        n.force = force;
        n.lift = 1.0;
        n.drag = 0.5;
        n
    }

    fn reference() -> LoadReference {
        LoadReference {
            origin: DVec3::ZERO,
            axis: DVec3::Z,
            omega: 2.0,
        }
    }

    #[test]
    fn test_add_node_moment_and_power() {
        let mut lv = LoadVector::default();
        // body force +y at x = 1: torque about +z is +1
        lv.add_node(&node_at(DVec3::X, DVec3::new(0.0, -1.0, 0.0)), &reference());
        assert_eq!(lv.force, DVec3::Y);
        assert!((lv.torque - 1.0).abs() < 1e-14);
        assert!((lv.power - 2.0).abs() < 1e-14);
        assert_eq!(lv.thrust, 0.0);
    }

    #[test]
    fn test_contributions_assign_each_node_once() {
        let grid = CartesianGrid3::new(DVec3::ZERO, DVec3::ONE, [8, 4, 4]);
        let part = decompose_3d(&grid, [2, 1, 1], 0).expect("valid decomposition");
        let ownership = Ownership {
            owners: [0, 1].into_iter().collect(),
            root: 1,
            epoch: 0,
        };
        let nodes = vec![
            node_at(DVec3::new(1.0, 2.0, 2.0), DVec3::X),
            node_at(DVec3::new(4.0, 2.0, 2.0), DVec3::X),
            node_at(DVec3::new(6.0, 2.0, 2.0), DVec3::X),
            // outside the domain: falls back to root
            node_at(DVec3::new(9.0, 2.0, 2.0), DVec3::X),
        ];
        let parts = node_contributions("w", &nodes, &ownership, &part, &reference())
            .expect("fresh ownership");
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].loads.lift, 1.0);
        assert_eq!(parts[1].loads.lift, 3.0);

        let reduced = LoadIntegrator::reduce("w", parts, &ownership).expect("reduce");
        assert_eq!(reduced.root, 1);
        assert_eq!(reduced.totals.lift, 4.0);
        assert_eq!(reduced.totals.force, DVec3::new(-4.0, 0.0, 0.0));
    }

    #[test]
    fn test_reduce_rejects_mixed_epochs() {
        let ownership = Ownership {
            owners: [0, 1].into_iter().collect(),
            root: 0,
            epoch: 3,
        };
        let parts = vec![
            LoadContribution {
                rank: 0,
                epoch: 3,
                loads: LoadVector::default(),
            },
            LoadContribution {
                rank: 1,
                epoch: 2,
                loads: LoadVector::default(),
            },
        ];
        let err = LoadIntegrator::reduce("w", parts, &ownership).expect_err("mixed epochs");
        assert!(matches!(err, ActuatorError::StaleOwnership { found: 2, .. }));
    }
}
