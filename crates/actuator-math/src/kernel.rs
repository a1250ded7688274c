// ─────────────────────────────────────────────────────────────────────
// SCPN Actuator Core — Regularization Kernel
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Anisotropic Gaussian smearing kernel.
//!
//!   g(d; ε) = π^{-3/2} / (εx εy εz) · exp(-|d/ε|²),   |d/ε|² < 16
//!
//! `d` is the offset of a cell center from an actuator node, expressed in
//! the node's local frame. The kernel integrates to one over R³; truncating
//! at four smoothing lengths loses ~5e-7 of the mass.

use actuator_types::constants::{GAUSSIAN_CUTOFF_RADIUS, GAUSSIAN_CUTOFF_SQR, GAUSSIAN_NORM};
use actuator_types::error::{ActuatorError, ActuatorResult};
use glam::DVec3;

/// Gaussian smearing factor for a local-frame offset `dist`.
///
/// Returns exactly 0.0 once the non-dimensional squared distance reaches
/// the cutoff.
#[inline]
pub fn gaussian3d(dist: DVec3, eps: DVec3) -> f64 {
    let rr = dist / eps;
    let rr_sqr = rr.length_squared();
    if rr_sqr < GAUSSIAN_CUTOFF_SQR {
        let eps_fac = eps.x * eps.y * eps.z;
        (GAUSSIAN_NORM / eps_fac) * (-rr_sqr).exp()
    } else {
        0.0
    }
}

/// Radius of a sphere that encloses the kernel support in any frame.
#[inline]
pub fn cutoff_radius(eps: DVec3) -> f64 {
    GAUSSIAN_CUTOFF_RADIUS * eps.max_element()
}

/// Reject smoothing radii for which the normalization is undefined.
pub fn validate_epsilon(actuator: &str, eps: DVec3) -> ActuatorResult<()> {
    if !eps.is_finite() {
        return Err(ActuatorError::degenerate(
            actuator,
            format!("smoothing radii must be finite, got {eps}"),
        ));
    }
    if eps.min_element() <= 0.0 {
        return Err(ActuatorError::degenerate(
            actuator,
            format!("smoothing radii must be > 0 on every axis, got {eps}"),
        ));
    }
    Ok(())
}

/// Reject radii the grid cannot resolve.
///
/// The support must reach past the cell half-diagonal, so every point of
/// the domain has at least one cell center with a positive weight:
/// `4·min(ε) > |dx| / 2`.
pub fn validate_resolution(actuator: &str, eps: DVec3, cell_size: DVec3) -> ActuatorResult<()> {
    let reach = GAUSSIAN_CUTOFF_RADIUS * eps.min_element();
    let half_diagonal = 0.5 * cell_size.length();
    if reach <= half_diagonal {
        return Err(ActuatorError::degenerate(
            actuator,
            format!(
                "smoothing radii {eps} are unresolved on cells of size {cell_size}: \
                 4·min(ε) = {reach} must exceed the cell half-diagonal {half_diagonal}"
            ),
        ));
    }
    Ok(())
}

/// Kernel with precomputed reciprocal radii, for hot loops over cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianKernel {
    eps: DVec3,
    inv_eps: DVec3,
    amplitude: f64,
}

impl GaussianKernel {
    pub fn new(actuator: &str, eps: DVec3) -> ActuatorResult<Self> {
        validate_epsilon(actuator, eps)?;
        Ok(GaussianKernel {
            eps,
            inv_eps: eps.recip(),
            amplitude: GAUSSIAN_NORM / (eps.x * eps.y * eps.z),
        })
    }

    pub fn epsilon(&self) -> DVec3 {
        self.eps
    }

    pub fn support_radius(&self) -> f64 {
        cutoff_radius(self.eps)
    }

    /// Same value as [`gaussian3d`] for the stored radii.
    #[inline]
    pub fn weight(&self, local_dist: DVec3) -> f64 {
        let rr_sqr = (local_dist * self.inv_eps).length_squared();
        if rr_sqr < GAUSSIAN_CUTOFF_SQR {
            self.amplitude * (-rr_sqr).exp()
        } else {
            0.0
        }
    }
}
