// ─────────────────────────────────────────────────────────────────────
// SCPN Actuator Core — Mesh Partition
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Box-per-rank ownership of the Cartesian mesh.
//!
//! A partition maps every rank to the set of index boxes it owns. Ranks
//! are simulated in-process; the map itself is the same metadata an MPI
//! run would broadcast after each regrid, so the resolver only ever
//! queries it.

use actuator_types::error::{ActuatorError, ActuatorResult};
use actuator_types::geometry::{CartesianGrid3, IndexBox, RealBox};
use glam::DVec3;

/// One block of cells owned by one rank.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedBox {
    pub rank: usize,
    pub cells: IndexBox,
    /// Physical extent (cell faces) of `cells`.
    pub region: RealBox,
}

/// Read-only view of the mesh ownership used by the influence resolver.
pub trait SpatialPartition: Sync {
    /// Incremented on every regrid.
    fn epoch(&self) -> u64;
    fn nranks(&self) -> usize;
    fn domain(&self) -> RealBox;
    /// Finest cell size per axis.
    fn cell_size(&self) -> DVec3;
    fn owned_boxes(&self) -> &[OwnedBox];

    /// (rank, overlap) for every owned box with nonzero-volume overlap.
    fn intersecting(&self, region: &RealBox) -> Vec<(usize, RealBox)> {
        self.owned_boxes()
            .iter()
            .filter_map(|b| b.region.intersection(region).map(|ov| (b.rank, ov)))
            .collect()
    }
}

/// Immutable partition of a [`CartesianGrid3`]; replaced whole on regrid.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionMap {
    grid: CartesianGrid3,
    boxes: Vec<OwnedBox>,
    nranks: usize,
    epoch: u64,
}

impl PartitionMap {
    /// Build from (rank, index box) pairs. Boxes must be non-empty, lie in
    /// the grid, and be pairwise disjoint.
    pub fn new(
        grid: CartesianGrid3,
        owned: Vec<(usize, IndexBox)>,
        nranks: usize,
        epoch: u64,
    ) -> ActuatorResult<Self> {
        if nranks == 0 {
            return Err(ActuatorError::Partition(
                "partition requires nranks >= 1".to_string(),
            ));
        }
        if grid.dims.iter().any(|&n| n == 0) {
            return Err(ActuatorError::Partition(format!(
                "grid dims must be >= 1, got {:?}",
                grid.dims
            )));
        }
        if !grid.dx.is_finite() || grid.dx.min_element() <= 0.0 {
            return Err(ActuatorError::Partition(format!(
                "grid spacing must be finite and > 0, got {}",
                grid.dx
            )));
        }
        let domain_cells = grid.index_box();
        let mut boxes = Vec::with_capacity(owned.len());
        for (rank, cells) in owned {
            if rank >= nranks {
                return Err(ActuatorError::Partition(format!(
                    "box {cells:?} assigned to rank {rank}, only {nranks} ranks exist"
                )));
            }
            if cells.is_empty() {
                return Err(ActuatorError::Partition(format!(
                    "empty box {cells:?} on rank {rank}"
                )));
            }
            if domain_cells.intersection(&cells) != Some(cells) {
                return Err(ActuatorError::Partition(format!(
                    "box {cells:?} on rank {rank} leaves the grid {:?}",
                    grid.dims
                )));
            }
            if let Some(other) = boxes
                .iter()
                .find(|b: &&OwnedBox| b.cells.intersection(&cells).is_some())
            {
                return Err(ActuatorError::Partition(format!(
                    "box {cells:?} on rank {rank} overlaps box {:?} on rank {}",
                    other.cells, other.rank
                )));
            }
            boxes.push(OwnedBox {
                rank,
                cells,
                region: grid.real_box(&cells),
            });
        }
        Ok(PartitionMap {
            grid,
            boxes,
            nranks,
            epoch,
        })
    }

    pub fn grid(&self) -> &CartesianGrid3 {
        &self.grid
    }

    pub fn boxes_of(&self, rank: usize) -> impl Iterator<Item = &OwnedBox> {
        self.boxes.iter().filter(move |b| b.rank == rank)
    }

    /// Rank owning the cell that contains `p`, if any.
    pub fn owner_of(&self, p: DVec3) -> Option<usize> {
        self.boxes
            .iter()
            .find(|b| b.region.contains(p))
            .map(|b| b.rank)
    }
}

impl SpatialPartition for PartitionMap {
    fn epoch(&self) -> u64 {
        self.epoch
    }

    fn nranks(&self) -> usize {
        self.nranks
    }

    fn domain(&self) -> RealBox {
        self.grid.domain()
    }

    fn cell_size(&self) -> DVec3 {
        self.grid.dx
    }

    fn owned_boxes(&self) -> &[OwnedBox] {
        &self.boxes
    }
}

/// Split `n` cells across `k` buckets as evenly as possible.
fn balanced_split(n: usize, k: usize) -> Vec<usize> {
    let base = n / k;
    let rem = n % k;
    (0..k).map(|i| base + usize::from(i < rem)).collect()
}

fn offsets(sizes: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(sizes.len() + 1);
    let mut cursor = 0usize;
    out.push(cursor);
    for &s in sizes {
        cursor += s;
        out.push(cursor);
    }
    out
}

/// Decompose the grid into a (px × py × pz) Cartesian process topology,
/// one box per rank, rank = (ix * py + iy) * pz + iz.
pub fn decompose_3d(
    grid: &CartesianGrid3,
    procs: [usize; 3],
    epoch: u64,
) -> ActuatorResult<PartitionMap> {
    if procs.iter().any(|&p| p == 0) {
        return Err(ActuatorError::Partition(
            "process grid dimensions must be >= 1".to_string(),
        ));
    }
    for d in 0..3 {
        if procs[d] > grid.dims[d] {
            return Err(ActuatorError::Partition(format!(
                "cannot split {:?} cells across {:?} processes",
                grid.dims, procs
            )));
        }
    }
    let cuts: Vec<Vec<usize>> = (0..3)
        .map(|d| offsets(&balanced_split(grid.dims[d], procs[d])))
        .collect();

    let mut owned = Vec::with_capacity(procs[0] * procs[1] * procs[2]);
    for ix in 0..procs[0] {
        for iy in 0..procs[1] {
            for iz in 0..procs[2] {
                let rank = (ix * procs[1] + iy) * procs[2] + iz;
                let cells = IndexBox::new(
                    [cuts[0][ix], cuts[1][iy], cuts[2][iz]],
                    [cuts[0][ix + 1], cuts[1][iy + 1], cuts[2][iz + 1]],
                );
                owned.push((rank, cells));
            }
        }
    }
    PartitionMap::new(grid.clone(), owned, procs[0] * procs[1] * procs[2], epoch)
}

/// Chop the grid into boxes of at most `max_box` cells per axis and deal
/// them round-robin to `nranks` ranks, so a rank may own several boxes.
pub fn chop_round_robin(
    grid: &CartesianGrid3,
    max_box: [usize; 3],
    nranks: usize,
    epoch: u64,
) -> ActuatorResult<PartitionMap> {
    if max_box.iter().any(|&m| m == 0) {
        return Err(ActuatorError::Partition(
            "max box size must be >= 1 on every axis".to_string(),
        ));
    }
    let counts: Vec<usize> = (0..3)
        .map(|d| grid.dims[d].div_ceil(max_box[d]).max(1))
        .collect();
    let cuts: Vec<Vec<usize>> = (0..3)
        .map(|d| offsets(&balanced_split(grid.dims[d], counts[d])))
        .collect();

    let mut owned = Vec::with_capacity(counts[0] * counts[1] * counts[2]);
    let mut next = 0usize;
    for ix in 0..counts[0] {
        for iy in 0..counts[1] {
            for iz in 0..counts[2] {
                let cells = IndexBox::new(
                    [cuts[0][ix], cuts[1][iy], cuts[2][iz]],
                    [cuts[0][ix + 1], cuts[1][iy + 1], cuts[2][iz + 1]],
                );
                owned.push((next % nranks.max(1), cells));
                next += 1;
            }
        }
    }
    PartitionMap::new(grid.clone(), owned, nranks, epoch)
}

/// Process-grid factorisation of `nranks` that minimises the
/// surface-to-volume ratio of each box.
pub fn optimal_process_grid(dims: [usize; 3], nranks: usize) -> [usize; 3] {
    let mut best = [1, 1, nranks.max(1)];
    let mut best_cost = f64::MAX;
    for px in 1..=nranks {
        if nranks % px != 0 {
            continue;
        }
        for py in 1..=(nranks / px) {
            if (nranks / px) % py != 0 {
                continue;
            }
            let pz = nranks / px / py;
            if px > dims[0] || py > dims[1] || pz > dims[2] {
                continue;
            }
            let lx = dims[0] as f64 / px as f64;
            let ly = dims[1] as f64 / py as f64;
            let lz = dims[2] as f64 / pz as f64;
            let cost = 2.0 * (lx * ly + ly * lz + lx * lz) / (lx * ly * lz);
            if cost < best_cost {
                best_cost = cost;
                best = [px, py, pz];
            }
        }
    }
    best
}
