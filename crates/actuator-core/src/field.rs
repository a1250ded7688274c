// ─────────────────────────────────────────────────────────────────────
// SCPN Actuator Core — Rank-Local Fields
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Per-rank velocity and momentum-source storage, plus the sampler and
//! writer that couple actuators to it.
//!
//! Every owned box carries its own `(nx, ny, nz, 3)` arrays; no rank reads
//! or writes another rank's patch. Cross-rank sums go through
//! [`ScopedComm`].

use actuator_math::kernel::GaussianKernel;
use actuator_types::error::{ActuatorError, ActuatorResult};
use actuator_types::geometry::{CartesianGrid3, IndexBox, RealBox};
use actuator_types::state::ActuatorNode;
use glam::DVec3;
use ndarray::{s, Array4};
use rayon::prelude::*;
use tracing::debug;

use crate::actuator::{FlowSampler, SourceWriter};
use crate::comm::ScopedComm;
use crate::partition::{PartitionMap, SpatialPartition};

/// Field data of one owned box.
#[derive(Debug, Clone)]
pub struct FieldPatch {
    pub rank: usize,
    pub cells: IndexBox,
    pub velocity: Array4<f64>,
    /// Body-force density (N/m^3).
    pub source: Array4<f64>,
}

impl FieldPatch {
    fn zeros(rank: usize, cells: IndexBox) -> Self {
        let [nx, ny, nz] = cells.shape();
        FieldPatch {
            rank,
            cells,
            velocity: Array4::zeros((nx, ny, nz, 3)),
            source: Array4::zeros((nx, ny, nz, 3)),
        }
    }

    #[inline]
    fn local(&self, idx: [usize; 3]) -> [usize; 3] {
        [
            idx[0] - self.cells.lo[0],
            idx[1] - self.cells.lo[1],
            idx[2] - self.cells.lo[2],
        ]
    }

    /// Cells of this patch inside the kernel support of a node.
    fn support(&self, grid: &CartesianGrid3, node: &ActuatorNode, radius: f64) -> Option<IndexBox> {
        let reach = RealBox::new(node.position, node.position).grow(radius);
        grid.cells_in(&reach, &self.cells)
    }

    pub fn velocity_at(&self, idx: [usize; 3]) -> DVec3 {
        let [i, j, k] = self.local(idx);
        DVec3::new(
            self.velocity[[i, j, k, 0]],
            self.velocity[[i, j, k, 1]],
            self.velocity[[i, j, k, 2]],
        )
    }

    pub fn source_at(&self, idx: [usize; 3]) -> DVec3 {
        let [i, j, k] = self.local(idx);
        DVec3::new(
            self.source[[i, j, k, 0]],
            self.source[[i, j, k, 1]],
            self.source[[i, j, k, 2]],
        )
    }

    /// Partial `(Σ w V u, Σ w V)` of this patch for one node.
    pub fn sample_partial(
        &self,
        grid: &CartesianGrid3,
        kernel: &GaussianKernel,
        node: &ActuatorNode,
    ) -> (DVec3, f64) {
        let Some(bx) = self.support(grid, node, kernel.support_radius()) else {
            return (DVec3::ZERO, 0.0);
        };
        let vol = grid.cell_volume();
        let mut num = DVec3::ZERO;
        let mut den = 0.0;
        for i in bx.lo[0]..bx.hi[0] {
            for j in bx.lo[1]..bx.hi[1] {
                for k in bx.lo[2]..bx.hi[2] {
                    let w = kernel.weight(node.local_offset(grid.cell_center([i, j, k]))) * vol;
                    if w > 0.0 {
                        num += w * self.velocity_at([i, j, k]);
                        den += w;
                    }
                }
            }
        }
        (num, den)
    }

    /// Add `node.force` spread by the kernel; only this patch's cells change.
    pub fn spread(&mut self, grid: &CartesianGrid3, kernel: &GaussianKernel, node: &ActuatorNode) {
        let Some(bx) = self.support(grid, node, kernel.support_radius()) else {
            return;
        };
        for i in bx.lo[0]..bx.hi[0] {
            for j in bx.lo[1]..bx.hi[1] {
                for k in bx.lo[2]..bx.hi[2] {
                    let w = kernel.weight(node.local_offset(grid.cell_center([i, j, k])));
                    if w > 0.0 {
                        let [li, lj, lk] = self.local([i, j, k]);
                        let f = w * node.force;
                        self.source[[li, lj, lk, 0]] += f.x;
                        self.source[[li, lj, lk, 1]] += f.y;
                        self.source[[li, lj, lk, 2]] += f.z;
                    }
                }
            }
        }
    }
}

/// Mesh partitioned across simulated ranks, each holding its own patches.
#[derive(Debug, Clone)]
pub struct ParallelMesh {
    partition: PartitionMap,
    patches: Vec<FieldPatch>,
}

impl ParallelMesh {
    pub fn new(partition: PartitionMap) -> Self {
        let patches = partition
            .owned_boxes()
            .iter()
            .map(|b| FieldPatch::zeros(b.rank, b.cells))
            .collect();
        ParallelMesh { partition, patches }
    }

    pub fn partition(&self) -> &PartitionMap {
        &self.partition
    }

    pub fn grid(&self) -> &CartesianGrid3 {
        self.partition.grid()
    }

    pub fn epoch(&self) -> u64 {
        self.partition.epoch()
    }

    pub fn patches(&self) -> &[FieldPatch] {
        &self.patches
    }

    pub fn patches_of(&self, rank: usize) -> impl Iterator<Item = &FieldPatch> {
        self.patches.iter().filter(move |p| p.rank == rank)
    }

    /// Replace the partition as a whole. The new map must cover the same
    /// grid under a newer epoch; velocity is redistributed cell by cell and
    /// the source field starts from zero.
    pub fn regrid(&mut self, partition: PartitionMap) -> ActuatorResult<()> {
        if partition.grid() != self.partition.grid() {
            return Err(ActuatorError::Partition(
                "regrid must keep the grid geometry".to_string(),
            ));
        }
        if partition.epoch() <= self.partition.epoch() {
            return Err(ActuatorError::Partition(format!(
                "regrid epoch {} does not advance past {}",
                partition.epoch(),
                self.partition.epoch()
            )));
        }
        let mut next = ParallelMesh::new(partition);
        next.patches.par_iter_mut().for_each(|dst| {
            for src in &self.patches {
                let Some(ov) = src.cells.intersection(&dst.cells) else {
                    continue;
                };
                let from = src.local(ov.lo);
                let to = dst.local(ov.lo);
                let [nx, ny, nz] = ov.shape();
                dst.velocity
                    .slice_mut(s![to[0]..to[0] + nx, to[1]..to[1] + ny, to[2]..to[2] + nz, ..])
                    .assign(&src.velocity.slice(s![
                        from[0]..from[0] + nx,
                        from[1]..from[1] + ny,
                        from[2]..from[2] + nz,
                        ..
                    ]));
            }
        });
        debug!(
            epoch = next.epoch(),
            boxes = next.patches.len(),
            "mesh regridded"
        );
        *self = next;
        Ok(())
    }

    /// Set the velocity of every cell from its center position.
    pub fn fill_velocity<F>(&mut self, f: F)
    where
        F: Fn(DVec3) -> DVec3 + Sync,
    {
        let grid = self.partition.grid().clone();
        self.patches.par_iter_mut().for_each(|p| {
            let lo = p.cells.lo;
            for ((i, j, k, c), v) in p.velocity.indexed_iter_mut() {
                let u = f(grid.cell_center([lo[0] + i, lo[1] + j, lo[2] + k]));
                *v = u[c];
            }
        });
    }

    pub fn zero_source(&mut self) {
        self.patches
            .par_iter_mut()
            .for_each(|p| p.source.fill(0.0));
    }

    /// Volume integral of the source field over all ranks (N).
    pub fn source_integral(&self) -> DVec3 {
        let vol = self.grid().cell_volume();
        // summed in partition patch order
        let per_patch: Vec<DVec3> = self
            .patches
            .par_iter()
            .map(|p| {
                let mut sum = DVec3::ZERO;
                for c in 0..3 {
                    sum[c] = p.source.slice(s![.., .., .., c]).sum();
                }
                sum * vol
            })
            .collect();
        per_patch.into_iter().sum()
    }
}

/// Velocity sampling over an actuator's owner ranks.
pub struct MeshSampler<'a> {
    mesh: &'a ParallelMesh,
    comm: ScopedComm<'a>,
}

impl<'a> MeshSampler<'a> {
    pub fn new(mesh: &'a ParallelMesh, comm: ScopedComm<'a>) -> ActuatorResult<Self> {
        if comm.epoch() != mesh.epoch() {
            return Err(ActuatorError::StaleOwnership {
                actuator: comm.label().to_string(),
                expected: mesh.epoch(),
                found: comm.epoch(),
            });
        }
        Ok(MeshSampler { mesh, comm })
    }
}

impl FlowSampler for MeshSampler<'_> {
    fn sample_velocity(
        &self,
        nodes: &[ActuatorNode],
        kernel: &GaussianKernel,
    ) -> ActuatorResult<Vec<DVec3>> {
        let grid = self.mesh.grid();
        let owners: Vec<usize> = self.comm.owners().iter().copied().collect();
        let parts: Vec<(usize, Vec<f64>)> = owners
            .par_iter()
            .map(|&rank| {
                let mut buf = vec![0.0; 4 * nodes.len()];
                for patch in self.mesh.patches_of(rank) {
                    for (n, node) in nodes.iter().enumerate() {
                        let (num, den) = patch.sample_partial(grid, kernel, node);
                        buf[4 * n] += num.x;
                        buf[4 * n + 1] += num.y;
                        buf[4 * n + 2] += num.z;
                        buf[4 * n + 3] += den;
                    }
                }
                (rank, buf)
            })
            .collect();

        let totals = self.comm.allreduce_sum(parts)?;
        totals
            .chunks_exact(4)
            .enumerate()
            .map(|(n, chunk)| {
                let den = chunk[3];
                if den > 0.0 {
                    Ok(DVec3::new(chunk[0], chunk[1], chunk[2]) / den)
                } else {
                    Err(ActuatorError::degenerate(
                        self.comm.label(),
                        format!(
                            "node {n} at {} has no cell center inside its kernel support",
                            nodes[n].position
                        ),
                    ))
                }
            })
            .collect()
    }
}

/// Force projection into the source patches of an actuator's owner ranks.
pub struct MeshWriter<'a> {
    mesh: &'a mut ParallelMesh,
    comm: ScopedComm<'a>,
}

impl<'a> MeshWriter<'a> {
    pub fn new(mesh: &'a mut ParallelMesh, comm: ScopedComm<'a>) -> ActuatorResult<Self> {
        if comm.epoch() != mesh.epoch() {
            return Err(ActuatorError::StaleOwnership {
                actuator: comm.label().to_string(),
                expected: mesh.epoch(),
                found: comm.epoch(),
            });
        }
        Ok(MeshWriter { mesh, comm })
    }
}

impl SourceWriter for MeshWriter<'_> {
    fn accumulate(&mut self, nodes: &[ActuatorNode], kernel: &GaussianKernel) -> ActuatorResult<()> {
        let owners = self.comm.owners();
        let grid = self.mesh.partition.grid();
        self.mesh
            .patches
            .par_iter_mut()
            .filter(|p| owners.contains(&p.rank))
            .for_each(|patch| {
                for node in nodes {
                    patch.spread(grid, kernel, node);
                }
            });
        Ok(())
    }
}
