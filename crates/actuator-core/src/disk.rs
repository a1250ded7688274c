// ─────────────────────────────────────────────────────────────────────
// SCPN Actuator Core — Rotor Disk
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Time-averaged blade-element rotor disk.
//!
//! Blade stations are swept over the full azimuth; each station's width
//! is scaled by `num_blades / num_azimuthal` so the disk carries the load
//! of `num_blades` blades averaged over one revolution. Rotation is
//! right-handed about `axis`.

use std::f64::consts::TAU;

use actuator_math::frame::{pitch_frame, section_frame};
use actuator_types::error::{ActuatorError, ActuatorResult};
use actuator_types::state::ActuatorNode;
use glam::DVec3;
use serde::Deserialize;

use crate::actuator::{ActuatorCore, ActuatorModel, Distribution, LoadReference};
use crate::registry::BuildContext;

fn default_axis() -> [f64; 3] {
    [1.0, 0.0, 0.0]
}

fn default_num_blades() -> usize {
    3
}

/// `geometry` block of a `"RotorDisk"` actuator.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiskGeometry {
    pub center: [f64; 3],
    /// Rotor axis; the flow through the disk is expected along it.
    #[serde(default = "default_axis")]
    pub axis: [f64; 3],
    pub diameter: f64,
    #[serde(default)]
    pub hub_diameter: f64,
    pub num_radial: usize,
    pub num_azimuthal: usize,
    #[serde(default = "default_num_blades")]
    pub num_blades: usize,
    /// Angular speed (rad/s), >= 0.
    #[serde(default)]
    pub rotor_speed: f64,
    /// Per radial station, hub to tip.
    pub chord: Distribution,
    /// Per radial station (deg), added to `pitch`.
    #[serde(default)]
    pub twist: Distribution,
    /// Collective pitch (deg).
    #[serde(default)]
    pub pitch: f64,
}

#[derive(Debug)]
pub struct RotorDisk {
    core: ActuatorCore,
    center: DVec3,
    axis: DVec3,
    omega: f64,
    num_radial: usize,
    num_azimuthal: usize,
}

impl RotorDisk {
    pub const IDENTIFIER: &'static str = "RotorDisk";

    pub fn create(ctx: &BuildContext<'_>) -> ActuatorResult<Box<dyn ActuatorModel>> {
        let geometry: DiskGeometry = ctx.config.geometry_as()?;
        Ok(Box::new(Self::from_geometry(ctx, &geometry)?))
    }

    pub fn from_geometry(ctx: &BuildContext<'_>, g: &DiskGeometry) -> ActuatorResult<Self> {
        let label = ctx.config.label.as_str();
        let radius = 0.5 * g.diameter;
        let hub = 0.5 * g.hub_diameter;
        if !radius.is_finite() || radius <= 0.0 {
            return Err(ActuatorError::degenerate(
                label,
                format!("diameter must be > 0, got {}", g.diameter),
            ));
        }
        if !hub.is_finite() || hub < 0.0 || hub >= radius {
            return Err(ActuatorError::degenerate(
                label,
                format!(
                    "hub_diameter must lie in [0, diameter), got {}",
                    g.hub_diameter
                ),
            ));
        }
        if g.num_radial == 0 || g.num_azimuthal == 0 || g.num_blades == 0 {
            return Err(ActuatorError::degenerate(
                label,
                "num_radial, num_azimuthal and num_blades must be >= 1",
            ));
        }
        if !g.rotor_speed.is_finite() || g.rotor_speed < 0.0 {
            return Err(ActuatorError::config(
                label,
                format!("rotor_speed must be finite and >= 0, got {}", g.rotor_speed),
            ));
        }
        if !g.pitch.is_finite() {
            return Err(ActuatorError::config(label, "pitch must be finite"));
        }
        let axis = DVec3::from_array(g.axis)
            .try_normalize()
            .ok_or_else(|| ActuatorError::degenerate(label, "rotor axis has zero length"))?;
        let center = DVec3::from_array(g.center);

        let chords = g.chord.expand(label, "chord", g.num_radial)?;
        let twists = g.twist.expand(label, "twist", g.num_radial)?;
        let dr = (radius - hub) / g.num_radial as f64;
        let width = dr * g.num_blades as f64 / g.num_azimuthal as f64;
        let (e1, e2) = axis.any_orthonormal_pair();

        let mut nodes = Vec::with_capacity(g.num_radial * g.num_azimuthal);
        for k in 0..g.num_azimuthal {
            let (sin_t, cos_t) = (TAU * k as f64 / g.num_azimuthal as f64).sin_cos();
            let e_r = cos_t * e1 + sin_t * e2;
            let e_theta = axis.cross(e_r);
            // blades move along +e_theta, so the leading edge faces it
            let base = section_frame(-e_theta, e_r).ok_or_else(|| {
                ActuatorError::degenerate(label, "could not build a station frame")
            })?;
            for j in 0..g.num_radial {
                let r = hub + (j as f64 + 0.5) * dr;
                let twist = twists[j] + g.pitch;
                let mut node =
                    ActuatorNode::new(center + r * e_r, pitch_frame(base, twist), chords[j], width);
                node.twist = twist;
                node.body_velocity = g.rotor_speed * r * e_theta;
                nodes.push(node);
            }
        }

        let core = ActuatorCore::new(ctx.config, ctx.id, ctx.density, ctx.polars, nodes)?;
        Ok(RotorDisk {
            core,
            center,
            axis,
            omega: g.rotor_speed,
            num_radial: g.num_radial,
            num_azimuthal: g.num_azimuthal,
        })
    }

    pub fn center(&self) -> DVec3 {
        self.center
    }

    pub fn axis(&self) -> DVec3 {
        self.axis
    }

    pub fn rotor_speed(&self) -> f64 {
        self.omega
    }

    /// Node index of radial station `j` at azimuth `k`.
    pub fn station(&self, j: usize, k: usize) -> Option<usize> {
        (j < self.num_radial && k < self.num_azimuthal).then_some(k * self.num_radial + j)
    }
}

impl ActuatorModel for RotorDisk {
    fn type_name(&self) -> &'static str {
        Self::IDENTIFIER
    }

    fn core(&self) -> &ActuatorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActuatorCore {
        &mut self.core
    }

    fn load_reference(&self) -> LoadReference {
        LoadReference {
            origin: self.center,
            axis: self.axis,
            omega: self.omega,
        }
    }
}
