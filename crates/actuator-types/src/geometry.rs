// ─────────────────────────────────────────────────────────────────────
// SCPN Actuator Core — Geometry Primitives
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Axis-aligned boxes in physical and index space, and the uniform
//! cell-centered Cartesian grid that the partition is laid over.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Axis-aligned box in physical coordinates.
///
/// A box with `hi <= lo` on any axis has no volume and is treated as empty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RealBox {
    pub lo: DVec3,
    pub hi: DVec3,
}

impl RealBox {
    pub fn new(lo: DVec3, hi: DVec3) -> Self {
        RealBox { lo, hi }
    }

    /// Inverted box; extending it with any point yields that point.
    pub fn empty() -> Self {
        RealBox {
            lo: DVec3::splat(f64::INFINITY),
            hi: DVec3::splat(f64::NEG_INFINITY),
        }
    }

    pub fn from_points<I: IntoIterator<Item = DVec3>>(points: I) -> Self {
        let mut bx = RealBox::empty();
        for p in points {
            bx.extend(p);
        }
        bx
    }

    pub fn extend(&mut self, p: DVec3) {
        self.lo = self.lo.min(p);
        self.hi = self.hi.max(p);
    }

    /// Grow isotropically by `r` on every face.
    pub fn grow(&self, r: f64) -> Self {
        RealBox {
            lo: self.lo - DVec3::splat(r),
            hi: self.hi + DVec3::splat(r),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hi.x <= self.lo.x || self.hi.y <= self.lo.y || self.hi.z <= self.lo.z
    }

    pub fn lengths(&self) -> DVec3 {
        (self.hi - self.lo).max(DVec3::ZERO)
    }

    pub fn volume(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let l = self.lengths();
        l.x * l.y * l.z
    }

    /// Intersection with nonzero volume, `None` if the boxes only touch
    /// or are disjoint.
    pub fn intersection(&self, other: &RealBox) -> Option<RealBox> {
        let bx = RealBox {
            lo: self.lo.max(other.lo),
            hi: self.hi.min(other.hi),
        };
        if bx.is_empty() {
            None
        } else {
            Some(bx)
        }
    }

    pub fn intersects(&self, other: &RealBox) -> bool {
        self.intersection(other).is_some()
    }

    /// Half-open containment `lo <= p < hi`, so a point on a shared face
    /// belongs to exactly one of two abutting boxes.
    pub fn contains(&self, p: DVec3) -> bool {
        p.cmpge(self.lo).all() && p.cmplt(self.hi).all()
    }

    pub fn is_finite(&self) -> bool {
        self.lo.is_finite() && self.hi.is_finite()
    }
}

/// Half-open box `[lo, hi)` of cell indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexBox {
    pub lo: [usize; 3],
    pub hi: [usize; 3],
}

impl IndexBox {
    pub fn new(lo: [usize; 3], hi: [usize; 3]) -> Self {
        IndexBox { lo, hi }
    }

    pub fn shape(&self) -> [usize; 3] {
        [
            self.hi[0].saturating_sub(self.lo[0]),
            self.hi[1].saturating_sub(self.lo[1]),
            self.hi[2].saturating_sub(self.lo[2]),
        ]
    }

    pub fn num_cells(&self) -> usize {
        let s = self.shape();
        s[0] * s[1] * s[2]
    }

    pub fn is_empty(&self) -> bool {
        self.num_cells() == 0
    }

    pub fn contains(&self, idx: [usize; 3]) -> bool {
        (0..3).all(|d| idx[d] >= self.lo[d] && idx[d] < self.hi[d])
    }

    pub fn intersection(&self, other: &IndexBox) -> Option<IndexBox> {
        let lo = [
            self.lo[0].max(other.lo[0]),
            self.lo[1].max(other.lo[1]),
            self.lo[2].max(other.lo[2]),
        ];
        let hi = [
            self.hi[0].min(other.hi[0]),
            self.hi[1].min(other.hi[1]),
            self.hi[2].min(other.hi[2]),
        ];
        let bx = IndexBox { lo, hi };
        if bx.is_empty() {
            None
        } else {
            Some(bx)
        }
    }
}

/// Uniform cell-centered Cartesian grid covering the computational domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartesianGrid3 {
    /// Lower corner of the domain.
    pub origin: DVec3,
    /// Cell sizes per axis.
    pub dx: DVec3,
    /// Number of cells per axis.
    pub dims: [usize; 3],
}

impl CartesianGrid3 {
    pub fn new(origin: DVec3, dx: DVec3, dims: [usize; 3]) -> Self {
        CartesianGrid3 { origin, dx, dims }
    }

    /// Grid spanning `domain` with `dims` cells per axis.
    pub fn from_domain(domain: &RealBox, dims: [usize; 3]) -> Self {
        let l = domain.lengths();
        let dx = DVec3::new(
            l.x / dims[0].max(1) as f64,
            l.y / dims[1].max(1) as f64,
            l.z / dims[2].max(1) as f64,
        );
        CartesianGrid3 {
            origin: domain.lo,
            dx,
            dims,
        }
    }

    pub fn domain(&self) -> RealBox {
        self.real_box(&self.index_box())
    }

    pub fn index_box(&self) -> IndexBox {
        IndexBox::new([0, 0, 0], self.dims)
    }

    pub fn cell_volume(&self) -> f64 {
        self.dx.x * self.dx.y * self.dx.z
    }

    pub fn cell_center(&self, idx: [usize; 3]) -> DVec3 {
        self.origin
            + DVec3::new(
                (idx[0] as f64 + 0.5) * self.dx.x,
                (idx[1] as f64 + 0.5) * self.dx.y,
                (idx[2] as f64 + 0.5) * self.dx.z,
            )
    }

    /// Physical extent of a block of cells (cell faces, not centers).
    pub fn real_box(&self, bx: &IndexBox) -> RealBox {
        RealBox {
            lo: self.origin
                + DVec3::new(
                    bx.lo[0] as f64 * self.dx.x,
                    bx.lo[1] as f64 * self.dx.y,
                    bx.lo[2] as f64 * self.dx.z,
                ),
            hi: self.origin
                + DVec3::new(
                    bx.hi[0] as f64 * self.dx.x,
                    bx.hi[1] as f64 * self.dx.y,
                    bx.hi[2] as f64 * self.dx.z,
                ),
        }
    }

    /// Cells of `within` whose centers fall inside the closed `region`.
    pub fn cells_in(&self, region: &RealBox, within: &IndexBox) -> Option<IndexBox> {
        let mut lo = [0usize; 3];
        let mut hi = [0usize; 3];
        for d in 0..3 {
            let h = self.dx[d];
            // center_i = origin + (i + 0.5) h  ∈ [region.lo, region.hi]
            let first = ((region.lo[d] - self.origin[d]) / h - 0.5).ceil();
            let last = ((region.hi[d] - self.origin[d]) / h - 0.5).floor();
            if !first.is_finite() || !last.is_finite() || last < first {
                return None;
            }
            let first = first.max(within.lo[d] as f64);
            let last = last.min(within.hi[d] as f64 - 1.0);
            if last < first {
                return None;
            }
            lo[d] = first as usize;
            hi[d] = last as usize + 1;
        }
        Some(IndexBox { lo, hi })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_real_box_touching_faces_do_not_intersect() {
        let a = RealBox::new(DVec3::ZERO, DVec3::ONE);
        let b = RealBox::new(DVec3::new(1.0, 0.0, 0.0), DVec3::new(2.0, 1.0, 1.0));
        assert!(!a.intersects(&b));
        let c = RealBox::new(DVec3::splat(0.5), DVec3::splat(1.5));
        let overlap = a.intersection(&c).expect("overlapping boxes");
        assert!((overlap.volume() - 0.125).abs() < 1e-14);
    }

    #[test]
    fn test_real_box_half_open_contains() {
        let a = RealBox::new(DVec3::ZERO, DVec3::ONE);
        assert!(a.contains(DVec3::ZERO));
        assert!(!a.contains(DVec3::new(1.0, 0.5, 0.5)));
    }

    #[test]
    fn test_from_points_and_grow() {
        let bx = RealBox::from_points([DVec3::new(1.0, 2.0, 3.0), DVec3::new(-1.0, 0.0, 5.0)]);
        assert_eq!(bx.lo, DVec3::new(-1.0, 0.0, 3.0));
        assert_eq!(bx.hi, DVec3::new(1.0, 2.0, 5.0));
        let g = bx.grow(0.5);
        assert_eq!(g.lo, DVec3::new(-1.5, -0.5, 2.5));
        assert!(RealBox::from_points(std::iter::empty()).is_empty());
    }

    #[test]
    fn test_grid_cell_geometry() {
        let grid = CartesianGrid3::from_domain(
            &RealBox::new(DVec3::ZERO, DVec3::new(8.0, 4.0, 2.0)),
            [8, 4, 2],
        );
        assert_eq!(grid.dx, DVec3::ONE);
        assert!((grid.cell_volume() - 1.0).abs() < 1e-14);
        assert_eq!(grid.cell_center([0, 0, 0]), DVec3::splat(0.5));
        assert_eq!(grid.domain().hi, DVec3::new(8.0, 4.0, 2.0));
    }

    #[test]
    fn test_cells_in_region_clipped_to_box() {
        let grid = CartesianGrid3::new(DVec3::ZERO, DVec3::ONE, [10, 10, 10]);
        let region = RealBox::new(DVec3::splat(2.2), DVec3::splat(4.7));
        let cells = grid
            .cells_in(&region, &grid.index_box())
            .expect("region covers cells");
        // centers 2.5, 3.5, 4.5
        assert_eq!(cells.lo, [2, 2, 2]);
        assert_eq!(cells.hi, [5, 5, 5]);

        let half = IndexBox::new([0, 0, 0], [4, 10, 10]);
        let clipped = grid.cells_in(&region, &half).expect("partial overlap");
        assert_eq!(clipped.hi[0], 4);

        let outside = RealBox::new(DVec3::splat(20.0), DVec3::splat(30.0));
        assert!(grid.cells_in(&outside, &grid.index_box()).is_none());
    }

    #[test]
    fn test_index_box_intersection() {
        let a = IndexBox::new([0, 0, 0], [4, 4, 4]);
        let b = IndexBox::new([2, 2, 2], [6, 6, 6]);
        let c = a.intersection(&b).expect("overlap");
        assert_eq!(c.num_cells(), 8);
        assert!(a.intersection(&IndexBox::new([4, 0, 0], [5, 4, 4])).is_none());
    }
}
