// ─────────────────────────────────────────────────────────────────────
// SCPN Actuator Core — Actuator Line
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Actuator line through explicit node coordinates.

use actuator_math::frame::{pitch_frame, section_frame};
use actuator_types::constants::GEOMETRY_EPS;
use actuator_types::error::{ActuatorError, ActuatorResult};
use actuator_types::state::ActuatorNode;
use glam::DVec3;
use serde::Deserialize;

use crate::actuator::{ActuatorCore, ActuatorModel, Distribution, LoadReference};
use crate::registry::BuildContext;

fn default_chord_axis() -> [f64; 3] {
    [1.0, 0.0, 0.0]
}

/// `geometry` block of an `"ActuatorLine"` actuator.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineGeometry {
    /// Ordered node coordinates, at least two.
    pub points: Vec<[f64; 3]>,
    pub chord: Distribution,
    /// Per-node twist (deg).
    #[serde(default)]
    pub twist: Distribution,
    #[serde(default = "default_chord_axis")]
    pub chord_axis: [f64; 3],
    /// Rigid translation velocity of the whole line.
    #[serde(default)]
    pub velocity: [f64; 3],
}

/// Unit span tangents by central differences, one-sided at the ends.
fn span_tangents(points: &[DVec3]) -> Vec<DVec3> {
    let n = points.len();
    (0..n)
        .map(|i| {
            let prev = points[i.saturating_sub(1)];
            let next = points[(i + 1).min(n - 1)];
            next - prev
        })
        .collect()
}

/// Half the length of the segments adjacent to each node.
fn segment_widths(points: &[DVec3]) -> Vec<f64> {
    let n = points.len();
    let seg: Vec<f64> = points.windows(2).map(|w| (w[1] - w[0]).length()).collect();
    (0..n)
        .map(|i| {
            let left = if i > 0 { seg[i - 1] } else { 0.0 };
            let right = if i + 1 < n { seg[i] } else { 0.0 };
            0.5 * (left + right)
        })
        .collect()
}

#[derive(Debug)]
pub struct ActuatorLine {
    core: ActuatorCore,
    chord_axis: DVec3,
}

impl ActuatorLine {
    pub const IDENTIFIER: &'static str = "ActuatorLine";

    pub fn create(ctx: &BuildContext<'_>) -> ActuatorResult<Box<dyn ActuatorModel>> {
        let geometry: LineGeometry = ctx.config.geometry_as()?;
        Ok(Box::new(Self::from_geometry(ctx, &geometry)?))
    }

    pub fn from_geometry(ctx: &BuildContext<'_>, g: &LineGeometry) -> ActuatorResult<Self> {
        let label = ctx.config.label.as_str();
        let n = g.points.len();
        if n < 2 {
            return Err(ActuatorError::degenerate(
                label,
                format!("a line needs at least 2 points, got {n}"),
            ));
        }
        let points: Vec<DVec3> = g.points.iter().map(|p| DVec3::from_array(*p)).collect();
        if let Some(i) = points
            .windows(2)
            .position(|w| (w[1] - w[0]).length() <= GEOMETRY_EPS)
        {
            return Err(ActuatorError::degenerate(
                label,
                format!("points {i} and {} coincide", i + 1),
            ));
        }
        let velocity = DVec3::from_array(g.velocity);
        if !velocity.is_finite() {
            return Err(ActuatorError::config(label, "velocity must be finite"));
        }

        let chords = g.chord.expand(label, "chord", n)?;
        let twists = g.twist.expand(label, "twist", n)?;
        let widths = segment_widths(&points);
        let chord_axis = DVec3::from_array(g.chord_axis);

        let mut nodes = Vec::with_capacity(n);
        for (i, tangent) in span_tangents(&points).into_iter().enumerate() {
            let frame = section_frame(chord_axis, tangent).ok_or_else(|| {
                ActuatorError::degenerate(
                    label,
                    format!("chord_axis is parallel to the line at node {i}"),
                )
            })?;
            let mut node =
                ActuatorNode::new(points[i], pitch_frame(frame, twists[i]), chords[i], widths[i]);
            node.twist = twists[i];
            node.body_velocity = velocity;
            nodes.push(node);
        }

        let core = ActuatorCore::new(ctx.config, ctx.id, ctx.density, ctx.polars, nodes)?;
        Ok(ActuatorLine { core, chord_axis })
    }

    /// Total length along the polyline.
    pub fn length(&self) -> f64 {
        self.core
            .nodes
            .windows(2)
            .map(|w| (w[1].position - w[0].position).length())
            .sum()
    }
}

impl ActuatorModel for ActuatorLine {
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
            origin: self.core.nodes[0].position,
            axis: self.chord_axis.normalize_or_zero(),
            omega: 0.0,
        }
    }
}
