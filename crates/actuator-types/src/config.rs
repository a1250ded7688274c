// ─────────────────────────────────────────────────────────────────────
// SCPN Actuator Core — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use glam::DVec3;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_DENSITY;
use crate::error::{ActuatorError, ActuatorResult};

/// Top-level actuator configuration.
/// Maps 1:1 to the `actuators.json` schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Fluid density (kg/m^3), shared by actuators that do not override it.
    #[serde(default = "default_density")]
    pub density: f64,
    #[serde(default)]
    pub root_policy: RootPolicy,
    #[serde(default)]
    pub polars: Vec<PolarConfig>,
    pub actuators: Vec<ActuatorConfig>,
}

fn default_density() -> f64 {
    DEFAULT_DENSITY
}

/// How the coordinating rank of an actuator is elected among its owners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootPolicy {
    /// Smallest owning rank.
    LowestRank,
    /// Owner with the largest intersection volume, lowest rank on ties.
    LargestOverlap,
    /// Owner rooting the fewest actuators so far in the pass, lowest rank on ties.
    #[default]
    LeastLoaded,
}

/// Behaviour when the angle of attack leaves the tabulated range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AoaPolicy {
    /// Hold the end value.
    #[default]
    Clamp,
    /// Continue the slope of the end segment; drag is floored at zero.
    Extrapolate,
    /// Report a polar error.
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolarConfig {
    pub name: String,
    #[serde(flatten)]
    pub source: PolarSource,
}

/// Where a polar comes from. Tables are built outside this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolarSource {
    /// Inline table, angles in degrees.
    Table {
        aoa: Vec<f64>,
        cl: Vec<f64>,
        cd: Vec<f64>,
        #[serde(default)]
        extrapolation: AoaPolicy,
    },
    /// Three-column text file: aoa(deg) cl cd.
    File {
        path: String,
        #[serde(default)]
        extrapolation: AoaPolicy,
    },
    /// cl = 2π sin(α), cd = cd0.
    ThinAirfoil {
        #[serde(default)]
        cd0: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActuatorConfig {
    /// Unique label, used in every error and report.
    pub label: String,
    /// Factory identifier, e.g. "FixedWing".
    #[serde(rename = "type")]
    pub actuator_type: String,
    /// Gaussian smoothing radii in the local (chord, span, normal) frame.
    pub epsilon: [f64; 3],
    /// Name of the polar used by every section.
    pub polar: String,
    /// Overrides the global density.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<f64>,
    /// Variant-specific geometry, decoded by the variant.
    #[serde(default)]
    pub geometry: serde_json::Value,
}

impl ActuatorConfig {
    pub fn epsilon_vec(&self) -> DVec3 {
        DVec3::from_array(self.epsilon)
    }

    /// Decode the geometry block into the variant's own input struct.
    pub fn geometry_as<T: DeserializeOwned>(&self) -> ActuatorResult<T> {
        serde_json::from_value(self.geometry.clone()).map_err(|e| {
            ActuatorError::config(&self.label, format!("invalid geometry block: {e}"))
        })
    }
}

impl SimulationConfig {
    /// Load from a JSON file.
    pub fn from_file(path: &str) -> ActuatorResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> ActuatorResult<Self> {
        let config: Self = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that do not need the variant or the mesh.
    pub fn validate(&self) -> ActuatorResult<()> {
        if !self.density.is_finite() || self.density <= 0.0 {
            return Err(ActuatorError::config(
                "<global>",
                format!("density must be finite and > 0, got {}", self.density),
            ));
        }
        for act in &self.actuators {
            if let Some(rho) = act.density {
                if !rho.is_finite() || rho <= 0.0 {
                    return Err(ActuatorError::config(
                        &act.label,
                        format!("density must be finite and > 0, got {rho}"),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Density seen by one actuator.
    pub fn density_for(&self, act: &ActuatorConfig) -> f64 {
        act.density.unwrap_or(self.density)
    }
}
