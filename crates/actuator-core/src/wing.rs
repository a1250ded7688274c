// ─────────────────────────────────────────────────────────────────────
// SCPN Actuator Core — Fixed Wing
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Straight wing with uniform pitch; chord may vary along the span.

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

/// `geometry` block of a `"FixedWing"` actuator.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WingGeometry {
    pub start: [f64; 3],
    pub end: [f64; 3],
    pub num_points: usize,
    pub chord: Distribution,
    /// Nose-up pitch about the span axis (deg).
    #[serde(default)]
    pub pitch: f64,
    /// Leading-to-trailing edge direction before pitch.
    #[serde(default = "default_chord_axis")]
    pub chord_axis: [f64; 3],
}

/// Trapezoid weights of `n >= 2` equally spaced points over `length`.
pub(crate) fn trapezoid_widths(length: f64, n: usize) -> Vec<f64> {
    let h = length / (n - 1) as f64;
    (0..n)
        .map(|i| if i == 0 || i == n - 1 { 0.5 * h } else { h })
        .collect()
}

#[derive(Debug)]
pub struct FixedWing {
    core: ActuatorCore,
    start: DVec3,
    end: DVec3,
    pitch: f64,
}

impl FixedWing {
    pub const IDENTIFIER: &'static str = "FixedWing";

    pub fn create(ctx: &BuildContext<'_>) -> ActuatorResult<Box<dyn ActuatorModel>> {
        let geometry: WingGeometry = ctx.config.geometry_as()?;
        Ok(Box::new(Self::from_geometry(ctx, &geometry)?))
    }

    pub fn from_geometry(ctx: &BuildContext<'_>, g: &WingGeometry) -> ActuatorResult<Self> {
        let label = ctx.config.label.as_str();
        if g.num_points < 2 {
            return Err(ActuatorError::degenerate(
                label,
                format!("num_points must be >= 2, got {}", g.num_points),
            ));
        }
        if !g.pitch.is_finite() {
            return Err(ActuatorError::config(label, "pitch must be finite"));
        }
        let start = DVec3::from_array(g.start);
        let end = DVec3::from_array(g.end);
        let span = end - start;
        let length = span.length();
        if !length.is_finite() || length <= GEOMETRY_EPS {
            return Err(ActuatorError::degenerate(label, "start and end coincide"));
        }
        let frame = section_frame(DVec3::from_array(g.chord_axis), span).ok_or_else(|| {
            ActuatorError::degenerate(label, "chord_axis is parallel to the span")
        })?;
        let frame = pitch_frame(frame, g.pitch);

        let chords = g.chord.expand(label, "chord", g.num_points)?;
        let widths = trapezoid_widths(length, g.num_points);
        let nodes = (0..g.num_points)
            .map(|i| {
                let t = i as f64 / (g.num_points - 1) as f64;
                let mut node = ActuatorNode::new(start + t * span, frame, chords[i], widths[i]);
                node.twist = g.pitch;
                node
            })
            .collect();

        let core = ActuatorCore::new(ctx.config, ctx.id, ctx.density, ctx.polars, nodes)?;
        Ok(FixedWing {
            core,
            start,
            end,
            pitch: g.pitch,
        })
    }

    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    pub fn span_length(&self) -> f64 {
        (self.end - self.start).length()
    }
}

impl ActuatorModel for FixedWing {
    fn type_name(&self) -> &'static str {
        Self::IDENTIFIER
    }

    fn core(&self) -> &ActuatorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActuatorCore {
        &mut self.core
    }

    /// Moments about the root; thrust along the unpitched chord axis.
    fn load_reference(&self) -> LoadReference {
        let frame = pitch_frame(self.core.nodes[0].frame, -self.pitch);
        LoadReference {
            origin: self.start,
            axis: frame.row(0),
            omega: 0.0,
        }
    }
}
