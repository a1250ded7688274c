// ─────────────────────────────────────────────────────────────────────
// SCPN Actuator Core — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Squared non-dimensional cutoff of the Gaussian kernel.
/// exp(-16) ≈ 1.1e-7 of the peak; 4 smoothing lengths of support.
pub const GAUSSIAN_CUTOFF_SQR: f64 = 16.0;

/// Support radius in smoothing lengths (sqrt of the squared cutoff).
pub const GAUSSIAN_CUTOFF_RADIUS: f64 = 4.0;

/// Gaussian normalization 1 / sqrt(pi^3).
pub const GAUSSIAN_NORM: f64 = 0.17958712212516656;

/// Air density at sea level (kg/m^3), used when the config omits one.
pub const DEFAULT_DENSITY: f64 = 1.225;

/// Degrees → radians.
pub const DEG2RAD: f64 = std::f64::consts::PI / 180.0;

/// Radians → degrees.
pub const RAD2DEG: f64 = 180.0 / std::f64::consts::PI;

/// Geometric tolerance for degenerate lengths (m).
pub const GEOMETRY_EPS: f64 = 1e-12;
