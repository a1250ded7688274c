// ─────────────────────────────────────────────────────────────────────
// SCPN Actuator Core — State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use std::collections::BTreeSet;

use glam::{DMat3, DVec3};
use serde::{Deserialize, Serialize};

use crate::geometry::RealBox;

/// One blade-element station of an actuator.
///
/// Updated once per timestep in the order sample → coefficients → force.
#[derive(Debug, Clone, PartialEq)]
pub struct ActuatorNode {
    pub position: DVec3,
    /// Local frame; rows are (chord, span, normal) unit vectors.
    /// `frame * (x - position)` maps a global offset into the local frame.
    pub frame: DMat3,
    pub chord: f64,
    /// Section width along the span (m).
    pub width: f64,
    /// Twist plus pitch applied to the frame (deg), kept for output.
    pub twist: f64,
    /// Velocity of the structure at this node.
    pub body_velocity: DVec3,
    /// Flow velocity sampled at the node.
    pub flow_velocity: DVec3,
    /// Relative velocity in the chord-normal plane.
    pub relative_velocity: DVec3,
    /// Angle of attack (deg).
    pub aoa: f64,
    pub cl: f64,
    pub cd: f64,
    /// Sectional lift and drag magnitudes (N).
    pub lift: f64,
    pub drag: f64,
    /// Force exerted by the body on the fluid (N).
    pub force: DVec3,
}

impl ActuatorNode {
    pub fn new(position: DVec3, frame: DMat3, chord: f64, width: f64) -> Self {
        ActuatorNode {
            position,
            frame,
            chord,
            width,
            twist: 0.0,
            body_velocity: DVec3::ZERO,
            flow_velocity: DVec3::ZERO,
            relative_velocity: DVec3::ZERO,
            aoa: 0.0,
            cl: 0.0,
            cd: 0.0,
            lift: 0.0,
            drag: 0.0,
            force: DVec3::ZERO,
        }
    }

    pub fn chord_axis(&self) -> DVec3 {
        self.frame.row(0)
    }

    pub fn span_axis(&self) -> DVec3 {
        self.frame.row(1)
    }

    pub fn normal_axis(&self) -> DVec3 {
        self.frame.row(2)
    }

    /// Offset of `x` from the node, expressed in the local frame.
    pub fn local_offset(&self, x: DVec3) -> DVec3 {
        self.frame * (x - self.position)
    }
}

/// Identity and parallel metadata of one actuator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuatorInfo {
    pub label: String,
    pub id: usize,
    /// Node extent grown by the kernel cutoff radius.
    pub bounding_box: RealBox,
    /// Ranks whose boxes intersect the bounding box.
    pub procs: BTreeSet<usize>,
    pub root_proc: Option<usize>,
    /// Partition epoch the ownership was resolved against.
    pub epoch: Option<u64>,
}

impl ActuatorInfo {
    pub fn new(label: &str, id: usize) -> Self {
        ActuatorInfo {
            label: label.to_string(),
            id,
            bounding_box: RealBox::empty(),
            procs: BTreeSet::new(),
            root_proc: None,
            epoch: None,
        }
    }

    /// True if `rank` holds any part of this actuator's influence region.
    pub fn is_active(&self, rank: usize) -> bool {
        self.procs.contains(&rank)
    }

    pub fn is_root(&self, rank: usize) -> bool {
        self.root_proc == Some(rank)
    }

    /// Drop ownership so it must be resolved again before use.
    pub fn invalidate(&mut self) {
        self.procs.clear();
        self.root_proc = None;
        self.epoch = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_local_offset_uses_frame_rows() {
        // chord = +y, span = -x, normal = +z
        let frame = DMat3::from_cols(
            DVec3::new(0.0, -1.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(0.0, 0.0, 1.0),
        );
        let node = ActuatorNode::new(DVec3::new(1.0, 1.0, 1.0), frame, 1.0, 0.5);
        assert_eq!(node.chord_axis(), DVec3::new(0.0, 1.0, 0.0));
        assert_eq!(node.span_axis(), DVec3::new(-1.0, 0.0, 0.0));
        let local = node.local_offset(DVec3::new(1.0, 3.0, 1.0));
        assert!((local - DVec3::new(2.0, 0.0, 0.0)).length() < 1e-14);
    }

    #[test]
    fn test_info_invalidate_clears_ownership() {
        let mut info = ActuatorInfo::new("wing", 0);
        info.procs.insert(2);
        info.root_proc = Some(2);
        info.epoch = Some(4);
        assert!(info.is_root(2));
        assert!(info.is_active(2));
        info.invalidate();
        assert!(info.procs.is_empty());
        assert!(info.root_proc.is_none());
        assert!(info.epoch.is_none());
    }
}
