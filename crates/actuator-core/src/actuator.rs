// ─────────────────────────────────────────────────────────────────────
// SCPN Actuator Core — Actuator Model
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Blade-element actuator contract and the physics shared by all variants.
//!
//! A variant only builds its nodes and names its load reference; sampling,
//! sectional loads and projection run through [`ActuatorCore`].

use std::sync::Arc;

use actuator_math::frame::{angle_of_attack, in_plane};
use actuator_math::kernel::GaussianKernel;
use actuator_math::polar::{AeroDataProvider, Polar};
use actuator_types::config::ActuatorConfig;
use actuator_types::constants::GEOMETRY_EPS;
use actuator_types::error::{ActuatorError, ActuatorResult};
use actuator_types::geometry::RealBox;
use actuator_types::state::{ActuatorInfo, ActuatorNode};
use glam::DVec3;
use serde::Deserialize;

use crate::influence::Ownership;
use crate::loads::{LoadVector, ReducedLoads};

/// Reads the flow at actuator nodes.
pub trait FlowSampler {
    /// Kernel-weighted velocity at every node, using each node's frame.
    fn sample_velocity(
        &self,
        nodes: &[ActuatorNode],
        kernel: &GaussianKernel,
    ) -> ActuatorResult<Vec<DVec3>>;
}

/// Receives node forces as body-force density.
pub trait SourceWriter {
    /// Adds each node's `force` spread by the kernel. Never overwrites.
    fn accumulate(&mut self, nodes: &[ActuatorNode], kernel: &GaussianKernel)
        -> ActuatorResult<()>;
}

/// Point and axis that moments, thrust and torque are taken about.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadReference {
    pub origin: DVec3,
    /// Unit axis; thrust is force along it, torque is moment about it.
    pub axis: DVec3,
    /// Angular speed about `axis` (rad/s); power = torque · omega.
    pub omega: f64,
}

/// Scalar or one value per station, e.g. `"chord": 1.0` or `"chord": [1.0, 0.8]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Distribution {
    Uniform(f64),
    PerStation(Vec<f64>),
}

impl Default for Distribution {
    fn default() -> Self {
        Distribution::Uniform(0.0)
    }
}

impl Distribution {
    /// Expand to `n` values; a per-station list must have exactly `n`.
    pub fn expand(&self, actuator: &str, what: &str, n: usize) -> ActuatorResult<Vec<f64>> {
        let values = match self {
            Distribution::Uniform(v) => vec![*v; n],
            Distribution::PerStation(v) if v.len() == n => v.clone(),
            Distribution::PerStation(v) => {
                return Err(ActuatorError::config(
                    actuator,
                    format!("{what} lists {} values for {n} stations", v.len()),
                ))
            }
        };
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(ActuatorError::config(
                actuator,
                format!("{what} must be finite, got {bad}"),
            ));
        }
        Ok(values)
    }
}

/// Nodes, kernel, polar and reduced totals of one actuator.
#[derive(Debug)]
pub struct ActuatorCore {
    pub info: ActuatorInfo,
    pub nodes: Vec<ActuatorNode>,
    pub kernel: GaussianKernel,
    pub density: f64,
    pub polar: Arc<dyn Polar>,
    reduced: Option<ReducedLoads>,
}

impl ActuatorCore {
    /// Validates nodes, radii and polar, and derives the bounding box.
    pub fn new(
        config: &ActuatorConfig,
        id: usize,
        density: f64,
        polars: &dyn AeroDataProvider,
        nodes: Vec<ActuatorNode>,
    ) -> ActuatorResult<Self> {
        let label = config.label.as_str();
        let kernel = GaussianKernel::new(label, config.epsilon_vec())?;
        let polar = polars
            .polar(&config.polar)
            .ok_or_else(|| ActuatorError::MissingPolar {
                actuator: label.to_string(),
                polar: config.polar.clone(),
            })?;
        if !density.is_finite() || density <= 0.0 {
            return Err(ActuatorError::config(
                label,
                format!("density must be finite and > 0, got {density}"),
            ));
        }
        if nodes.is_empty() {
            return Err(ActuatorError::degenerate(label, "actuator has no nodes"));
        }
        for (i, node) in nodes.iter().enumerate() {
            if !node.position.is_finite() {
                return Err(ActuatorError::degenerate(
                    label,
                    format!("node {i} position {} is not finite", node.position),
                ));
            }
            if !node.chord.is_finite() || node.chord <= 0.0 {
                return Err(ActuatorError::degenerate(
                    label,
                    format!("node {i} chord must be > 0, got {}", node.chord),
                ));
            }
            if !node.width.is_finite() || node.width <= GEOMETRY_EPS {
                return Err(ActuatorError::degenerate(
                    label,
                    format!("node {i} width must be > 0, got {}", node.width),
                ));
            }
        }

        let mut info = ActuatorInfo::new(label, id);
        info.bounding_box =
            RealBox::from_points(nodes.iter().map(|n| n.position)).grow(kernel.support_radius());

        Ok(ActuatorCore {
            info,
            nodes,
            kernel,
            density,
            polar,
            reduced: None,
        })
    }

    pub fn label(&self) -> &str {
        &self.info.label
    }

    /// Record a resolved owner set and root.
    pub fn set_ownership(&mut self, ownership: &Ownership) {
        self.info.procs = ownership.owners.clone();
        self.info.root_proc = Some(ownership.root);
        self.info.epoch = Some(ownership.epoch);
    }

    /// Forget ownership and the last reduction after a partition change.
    pub fn invalidate(&mut self) {
        self.info.invalidate();
        self.reduced = None;
    }

    pub fn sample(&mut self, sampler: &dyn FlowSampler) -> ActuatorResult<()> {
        let velocities = sampler.sample_velocity(&self.nodes, &self.kernel)?;
        if velocities.len() != self.nodes.len() {
            return Err(ActuatorError::Collective(format!(
                "actuator '{}': sampler returned {} velocities for {} nodes",
                self.info.label,
                velocities.len(),
                self.nodes.len()
            )));
        }
        for (i, (node, u)) in self.nodes.iter_mut().zip(velocities).enumerate() {
            if !u.is_finite() {
                return Err(ActuatorError::NonFinite(format!(
                    "sampled velocity at node {i} of actuator '{}'",
                    self.info.label
                )));
            }
            node.flow_velocity = u;
        }
        Ok(())
    }

    /// Sectional lift, drag and force on the fluid for every node.
    pub fn compute_forces(&mut self) -> ActuatorResult<()> {
        let rho = self.density;
        for (i, node) in self.nodes.iter_mut().enumerate() {
            let u_rel = in_plane(&node.frame, node.flow_velocity - node.body_velocity);
            let vmag = u_rel.length();
            let aoa = angle_of_attack(&node.frame, u_rel);
            let (cl, cd) = self.polar.coefficients(aoa)?;

            let q_area = 0.5 * rho * vmag * vmag * node.chord * node.width;
            let lift = q_area * cl;
            let drag = q_area * cd;

            let body_force = match u_rel.try_normalize() {
                Some(d_hat) => {
                    let l_hat = d_hat.cross(node.span_axis());
                    lift * l_hat + drag * d_hat
                }
                None => DVec3::ZERO,
            };
            if !body_force.is_finite() {
                return Err(ActuatorError::NonFinite(format!(
                    "force at node {i} of actuator '{}'",
                    self.info.label
                )));
            }

            node.relative_velocity = u_rel;
            node.aoa = aoa;
            node.cl = cl;
            node.cd = cd;
            node.lift = lift;
            node.drag = drag;
            node.force = -body_force;
        }
        Ok(())
    }

    pub fn project(&self, writer: &mut dyn SourceWriter) -> ActuatorResult<()> {
        writer.accumulate(&self.nodes, &self.kernel)
    }

    /// Store this step's reduction, replacing the previous one.
    pub fn set_reduced(&mut self, reduced: ReducedLoads) {
        self.reduced = Some(reduced);
    }

    /// Totals of the last reduction, if it ran under the current ownership.
    pub fn integrated(&self, rank: usize) -> ActuatorResult<&LoadVector> {
        let reduced = self
            .reduced
            .as_ref()
            .filter(|r| self.info.epoch == Some(r.epoch))
            .ok_or_else(|| ActuatorError::LoadsNotReduced(self.info.label.clone()))?;
        if rank != reduced.root {
            return Err(ActuatorError::NotRoot {
                actuator: self.info.label.clone(),
                rank,
                root: reduced.root,
            });
        }
        Ok(&reduced.totals)
    }
}

/// One actuator instance, driven by the registry each timestep.
pub trait ActuatorModel: Send + Sync {
    /// Factory identifier, e.g. `"FixedWing"`.
    fn type_name(&self) -> &'static str;
    fn core(&self) -> &ActuatorCore;
    fn core_mut(&mut self) -> &mut ActuatorCore;
    fn load_reference(&self) -> LoadReference;

    fn label(&self) -> &str {
        self.core().label()
    }

    fn info(&self) -> &ActuatorInfo {
        &self.core().info
    }

    fn nodes(&self) -> &[ActuatorNode] {
        &self.core().nodes
    }

    fn epsilon(&self) -> DVec3 {
        self.core().kernel.epsilon()
    }

    fn bounding_box(&self) -> RealBox {
        self.core().info.bounding_box
    }

    fn sample_state(&mut self, sampler: &dyn FlowSampler) -> ActuatorResult<()> {
        self.core_mut().sample(sampler)
    }

    fn compute_loads(&mut self) -> ActuatorResult<()> {
        self.core_mut().compute_forces()
    }

    fn project_forces(&self, writer: &mut dyn SourceWriter) -> ActuatorResult<()> {
        self.core().project(writer)
    }

    /// Totals of the last reduction; only the root rank holds them.
    fn integrated_loads(&self, rank: usize) -> ActuatorResult<&LoadVector> {
        self.core().integrated(rank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actuator_math::frame::section_frame;
    use actuator_math::polar::{PolarLibrary, ThinAirfoil};
    use std::f64::consts::PI;

    struct Uniform(DVec3);

    impl FlowSampler for Uniform {
        fn sample_velocity(
            &self,
            nodes: &[ActuatorNode],
            _kernel: &GaussianKernel,
        ) -> ActuatorResult<Vec<DVec3>> {
            Ok(vec![self.0; nodes.len()])
        }
    }

    fn config(polar: &str) -> ActuatorConfig {
        serde_json::from_value(serde_json::json!({
            "label": "section",
            "type": "Test",
            "epsilon": [1.0, 1.0, 1.0],
            "polar": polar,
        }))
        .expect("valid config")
    }

    fn library(cd0: f64) -> PolarLibrary {
        let mut lib = PolarLibrary::new();
        lib.insert(Arc::new(ThinAirfoil::new("thin", cd0).expect("valid polar")))
            .expect("unique polar");
        lib
    }

    fn single_node() -> Vec<ActuatorNode> {
        let frame = section_frame(DVec3::X, DVec3::Y).expect("valid frame");
        vec![ActuatorNode::new(DVec3::ZERO, frame, 2.0, 0.5)]
    }

    #[test]
    fn test_core_rejects_missing_polar() {
        let err = ActuatorCore::new(&config("naca"), 0, 1.0, &library(0.0), single_node())
            .expect_err("missing polar");
        match err {
            ActuatorError::MissingPolar { actuator, polar } => {
                assert_eq!(actuator, "section");
                assert_eq!(polar, "naca");
            }
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_bounding_box_grown_by_cutoff() {
        let core = ActuatorCore::new(&config("thin"), 0, 1.0, &library(0.0), single_node())
            .expect("valid core");
        assert_eq!(core.info.bounding_box.lo, DVec3::splat(-4.0));
        assert_eq!(core.info.bounding_box.hi, DVec3::splat(4.0));
    }

    #[test]
    fn test_sectional_loads_thin_airfoil() {
        let mut core = ActuatorCore::new(&config("thin"), 0, 1.2, &library(0.01), single_node())
            .expect("valid core");
        let alpha = 5.0_f64.to_radians();
        let u = 10.0 * DVec3::new(alpha.cos(), 0.0, alpha.sin());
        core.sample(&Uniform(u)).expect("sample");
        core.compute_forces().expect("loads");

        let node = &core.nodes[0];
        let q_area = 0.5 * 1.2 * 100.0 * 2.0 * 0.5;
        assert!((node.aoa - 5.0).abs() < 1e-10);
        assert!((node.lift - q_area * 2.0 * PI * alpha.sin()).abs() < 1e-9);
        assert!((node.drag - q_area * 0.01).abs() < 1e-12);
        // lift is perpendicular to the flow, drag along it
        let body = -node.force;
        let d_hat = u.normalize();
        assert!((body.dot(d_hat) - node.drag).abs() < 1e-9);
        assert!(body.z > 0.0);
    }

    #[test]
    fn test_span_flow_is_ignored() {
        let mut core = ActuatorCore::new(&config("thin"), 0, 1.0, &library(0.0), single_node())
            .expect("valid core");
        core.sample(&Uniform(DVec3::new(0.0, 25.0, 0.0)))
            .expect("sample");
        core.compute_forces().expect("loads");
        assert_eq!(core.nodes[0].force, DVec3::ZERO);
        assert_eq!(core.nodes[0].aoa, 0.0);
    }

    #[test]
    fn test_integrated_before_reduction_fails() {
        let core = ActuatorCore::new(&config("thin"), 0, 1.0, &library(0.0), single_node())
            .expect("valid core");
        assert!(matches!(
            core.integrated(0),
            Err(ActuatorError::LoadsNotReduced(_))
        ));
    }

    #[test]
    fn test_totals_follow_ownership_epoch() {
        let mut core = ActuatorCore::new(&config("thin"), 0, 1.0, &library(0.0), single_node())
            .expect("valid core");
        let own = Ownership {
            owners: [0, 1].into_iter().collect(),
            root: 1,
            epoch: 3,
        };
        core.set_ownership(&own);
        core.set_reduced(ReducedLoads {
            root: 1,
            epoch: 3,
            totals: LoadVector::default(),
        });
        assert!(core.integrated(1).is_ok());

        // re-resolved under a newer partition, reduction not yet rerun
        core.set_ownership(&Ownership { epoch: 4, ..own.clone() });
        assert!(matches!(core.integrated(1), Err(ActuatorError::LoadsNotReduced(_))));

        core.set_ownership(&own);
        core.set_reduced(ReducedLoads {
            root: 1,
            epoch: 3,
            totals: LoadVector::default(),
        });
        core.invalidate();
        assert!(core.info.root_proc.is_none());
        assert!(matches!(core.integrated(1), Err(ActuatorError::LoadsNotReduced(_))));
    }

    #[test]
    fn test_distribution_expand() {
        assert_eq!(
            Distribution::Uniform(0.5)
                .expand("a", "chord", 3)
                .expect("uniform"),
            vec![0.5; 3]
        );
        assert!(Distribution::PerStation(vec![1.0, 2.0])
            .expand("a", "chord", 3)
            .is_err());
        let d: Distribution = serde_json::from_str("[1.0, 0.5]").expect("list");
        assert_eq!(d, Distribution::PerStation(vec![1.0, 0.5]));
    }
}
