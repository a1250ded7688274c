//! Collectives scoped to one actuator's owner set.
//!
//! Every owning rank hands in exactly one buffer; the sum is formed in
//! ascending rank order so the result does not depend on the order in
//! which ranks finished. With MPI these map onto `MPI_Reduce` /
//! `MPI_Allreduce` over a communicator split by owner set.

use std::collections::BTreeSet;

use actuator_types::error::{ActuatorError, ActuatorResult};

use crate::influence::Ownership;

#[derive(Debug, Clone, Copy)]
pub struct ScopedComm<'a> {
    label: &'a str,
    owners: &'a BTreeSet<usize>,
    root: usize,
    epoch: u64,
}

impl<'a> ScopedComm<'a> {
    /// Refuses ownership resolved under a different partition epoch.
    pub fn new(label: &'a str, ownership: &'a Ownership, current_epoch: u64) -> ActuatorResult<Self> {
        if ownership.epoch != current_epoch {
            return Err(ActuatorError::StaleOwnership {
                actuator: label.to_string(),
                expected: current_epoch,
                found: ownership.epoch,
            });
        }
        Ok(ScopedComm {
            label,
            owners: &ownership.owners,
            root: ownership.root,
            epoch: ownership.epoch,
        })
    }

    pub fn label(&self) -> &str {
        self.label
    }

    pub fn owners(&self) -> &BTreeSet<usize> {
        self.owners
    }

    pub fn root(&self) -> usize {
        self.root
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn size(&self) -> usize {
        self.owners.len()
    }

    /// Sum of all owner buffers, delivered to root.
    pub fn reduce_sum(&self, parts: Vec<(usize, Vec<f64>)>) -> ActuatorResult<Vec<f64>> {
        self.sum_in_rank_order(parts)
    }

    /// Sum of all owner buffers, delivered to every owner.
    pub fn allreduce_sum(&self, parts: Vec<(usize, Vec<f64>)>) -> ActuatorResult<Vec<f64>> {
        self.sum_in_rank_order(parts)
    }

    fn sum_in_rank_order(&self, mut parts: Vec<(usize, Vec<f64>)>) -> ActuatorResult<Vec<f64>> {
        parts.sort_by_key(|(rank, _)| *rank);

        let ranks: Vec<usize> = parts.iter().map(|(r, _)| *r).collect();
        if ranks.windows(2).any(|w| w[0] == w[1]) {
            return Err(ActuatorError::Collective(format!(
                "actuator '{}': duplicate contribution in {ranks:?}",
                self.label
            )));
        }
        if let Some(stranger) = ranks.iter().find(|r| !self.owners.contains(r)) {
            return Err(ActuatorError::Collective(format!(
                "actuator '{}': rank {stranger} is not in owner set {:?}",
                self.label, self.owners
            )));
        }
        if ranks.len() != self.owners.len() {
            let missing: Vec<usize> = self
                .owners
                .iter()
                .filter(|r| !ranks.contains(r))
                .copied()
                .collect();
            return Err(ActuatorError::Collective(format!(
                "actuator '{}': no contribution from owner ranks {missing:?}",
                self.label
            )));
        }

        let len = parts.first().map(|(_, v)| v.len()).unwrap_or(0);
        if let Some((rank, v)) = parts.iter().find(|(_, v)| v.len() != len) {
            return Err(ActuatorError::Collective(format!(
                "actuator '{}': rank {rank} sent {} values, expected {len}",
                self.label,
                v.len()
            )));
        }

        let mut out = vec![0.0; len];
        for (_, v) in &parts {
            for (acc, x) in out.iter_mut().zip(v) {
                *acc += x;
            }
        }
        if out.iter().any(|v| !v.is_finite()) {
            return Err(ActuatorError::NonFinite(format!(
                "reduction for actuator '{}'",
                self.label
            )));
        }
        Ok(out)
    }
}
