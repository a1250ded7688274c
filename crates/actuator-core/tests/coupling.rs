// ─────────────────────────────────────────────────────────────────────
// SCPN Actuator Core — Coupling Scenarios
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! End-to-end coupling: configuration → registry → mesh steps.

use actuator_core::field::ParallelMesh;
use actuator_core::loads::{node_contributions, LoadIntegrator};
use actuator_core::partition::{decompose_3d, SpatialPartition};
use actuator_core::registry::{ActuatorFactory, ActuatorRegistry};
use actuator_math::polar::PolarLibrary;
use actuator_types::config::SimulationConfig;
use actuator_types::error::ActuatorError;
use actuator_types::geometry::CartesianGrid3;
use glam::DVec3;

const U_INF: f64 = 10.0;
const CD0: f64 = 0.01;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn grid() -> CartesianGrid3 {
    // 8 x 8 x 4 m at 0.25 m
    CartesianGrid3::new(DVec3::ZERO, DVec3::splat(0.25), [32, 32, 16])
}

fn mesh(procs: [usize; 3], epoch: u64) -> ParallelMesh {
    let mut m = ParallelMesh::new(decompose_3d(&grid(), procs, epoch).expect("valid decomposition"));
    m.fill_velocity(|_| DVec3::new(U_INF, 0.0, 0.0));
    m
}

fn config(wing_x: f64) -> SimulationConfig {
    let json = format!(
        r#"{{
            "density": 1.225,
            "polars": [{{ "name": "flat", "kind": "thin_airfoil", "cd0": {CD0} }}],
            "actuators": [{{
                "label": "wing",
                "type": "FixedWing",
                "epsilon": [0.5, 0.5, 0.5],
                "polar": "flat",
                "geometry": {{
                    "start": [{wing_x}, 2.5, 2.0],
                    "end": [{wing_x}, 5.5, 2.0],
                    "num_points": 10,
                    "chord": 0.5
                }}
            }}]
        }}"#
    );
    SimulationConfig::from_json_str(&json).expect("valid config")
}

fn registry(config: &SimulationConfig, m: &ParallelMesh) -> Result<ActuatorRegistry, ActuatorError> {
    let polars = PolarLibrary::from_configs(&config.polars)?;
    ActuatorRegistry::build(config, &ActuatorFactory::default(), &polars, m.partition())
}

#[test]
fn ten_point_wing_across_two_shards() {
    init_tracing();
    let mut m = mesh([2, 1, 1], 0);
    let mut reg = registry(&config(3.9), &m).expect("valid registry");
    let own = reg.ownership("wing").expect("resolved").clone();
    assert_eq!(own.owners.iter().copied().collect::<Vec<_>>(), vec![0, 1]);

    m.zero_source();
    let report = reg.advance(&mut m, 0.0).expect("step");
    let summary = report.summary("wing").expect("reported");

    let q = 0.5 * 1.225 * U_INF * U_INF;
    let expected_drag = q * 0.5 * 3.0 * CD0;
    for node in reg.get("wing").expect("registered").nodes() {
        assert_eq!(node.aoa, 0.0);
        assert_eq!(node.lift, 0.0);
    }
    assert_eq!(summary.loads.lift, 0.0);
    assert!((summary.loads.drag - expected_drag).abs() < 1e-9 * expected_drag);
    assert!((summary.loads.force.x - expected_drag).abs() < 1e-9 * expected_drag);

    // loads live on root only
    let root = summary.root;
    assert!(reg.integrated_loads("wing", root).is_ok());
    for rank in own.owners.iter().filter(|&&r| r != root) {
        assert!(matches!(
            reg.integrated_loads("wing", *rank),
            Err(ActuatorError::NotRoot { .. })
        ));
    }

    // both shards received part of the momentum source
    for rank in 0..2 {
        let touched = m
            .patches_of(rank)
            .any(|p| p.source.iter().any(|&v| v != 0.0));
        assert!(touched, "rank {rank} received no source");
    }
}

#[test]
fn ten_point_wing_straddles_the_split() {
    init_tracing();
    // span along y crosses the y = 4 split: five nodes per rank
    let mut m = mesh([1, 2, 1], 0);
    let mut reg = registry(&config(3.9), &m).expect("valid registry");
    let report = reg.advance(&mut m, 0.0).expect("step");
    let summary = report.summary("wing").expect("reported");
    assert_eq!(summary.owners, vec![0, 1]);

    let q = 0.5 * 1.225 * U_INF * U_INF;
    let expected_drag = q * 0.5 * 3.0 * CD0;
    assert!((summary.loads.drag - expected_drag).abs() < 1e-9 * expected_drag);

    let wing = reg.get("wing").expect("registered");
    let own = reg.ownership("wing").expect("resolved");
    let parts = node_contributions("wing", wing.nodes(), own, m.partition(), &wing.load_reference())
        .expect("fresh ownership");
    assert_eq!(parts.len(), 2);
    for part in &parts {
        // end node carries half a width, so each half of the span holds half the drag
        assert!(
            (part.loads.drag - 0.5 * expected_drag).abs() < 1e-9 * expected_drag,
            "rank {} drag {}",
            part.rank,
            part.loads.drag
        );
    }
    let reduced = LoadIntegrator::reduce("wing", parts, own).expect("complete");
    assert_eq!(reduced.root, summary.root);
    assert!((reduced.totals.drag - summary.loads.drag).abs() < 1e-12 * expected_drag);
}

#[test]
fn projected_momentum_matches_node_forces() {
    let mut m = mesh([2, 2, 1], 0);
    let mut reg = registry(&config(3.9), &m).expect("valid registry");
    m.zero_source();
    reg.advance(&mut m, 0.0).expect("step");

    let node_sum: DVec3 = reg
        .get("wing")
        .expect("registered")
        .nodes()
        .iter()
        .map(|n| n.force)
        .sum();
    let projected = m.source_integral();
    let rel = (projected - node_sum).length() / node_sum.length();
    assert!(rel < 1e-6, "relative conservation error {rel:e}");
}

#[test]
fn totals_do_not_depend_on_rank_count() {
    let reference = {
        let mut m = mesh([1, 1, 1], 0);
        let mut reg = registry(&config(3.9), &m).expect("valid registry");
        reg.advance(&mut m, 0.0).expect("step").actuators[0].loads
    };
    for procs in [[2, 1, 1], [2, 2, 1], [4, 2, 2]] {
        let mut m = mesh(procs, 0);
        let mut reg = registry(&config(3.9), &m).expect("valid registry");
        let loads = reg.advance(&mut m, 0.0).expect("step").actuators[0].loads;
        assert!((loads.drag - reference.drag).abs() < 1e-12 * reference.drag);
        assert!((loads.force - reference.force).length() < 1e-12 * reference.force.length());
    }
}

#[test]
fn actuator_outside_domain_fails_at_build() {
    let m = mesh([2, 1, 1], 0);
    match registry(&config(50.0), &m) {
        Err(ActuatorError::OutsideDomain { actuator }) => assert_eq!(actuator, "wing"),
        Err(other) => panic!("Unexpected error: {other:?}"),
        Ok(_) => panic!("registry built for an actuator outside the domain"),
    }
}

#[test]
fn under_resolved_rotor_fails_at_build() {
    let json = r#"{
        "polars": [{ "name": "flat", "kind": "thin_airfoil", "cd0": 0.01 }],
        "actuators": [
            { "label": "rotor", "type": "RotorDisk", "epsilon": [0.02, 0.02, 0.02], "polar": "flat",
              "geometry": { "center": [4.0, 4.0, 2.0], "diameter": 1.2, "num_radial": 4,
                            "num_azimuthal": 12, "rotor_speed": 20.0, "chord": 0.1 } }
        ]
    }"#;
    let cfg = SimulationConfig::from_json_str(json).expect("valid config");
    let m = mesh([2, 1, 1], 0);
    match registry(&cfg, &m) {
        Err(ActuatorError::DegenerateGeometry { actuator, message }) => {
            assert_eq!(actuator, "rotor");
            assert!(message.contains("unresolved"));
        }
        Err(other) => panic!("Unexpected error: {other:?}"),
        Ok(_) => panic!("registry built with a kernel narrower than a cell"),
    }
}

#[test]
fn missing_polar_fails_at_build() {
    let m = mesh([1, 1, 1], 0);
    let mut cfg = config(3.9);
    cfg.actuators[0].polar = "naca0012".to_string();
    match registry(&cfg, &m) {
        Err(ActuatorError::MissingPolar { actuator, polar }) => {
            assert_eq!(actuator, "wing");
            assert_eq!(polar, "naca0012");
        }
        Err(other) => panic!("Unexpected error: {other:?}"),
        Ok(_) => panic!("registry built with a missing polar"),
    }
}

#[test]
fn regrid_re_resolves_ownership() {
    init_tracing();
    let mut m = mesh([2, 1, 1], 0);
    let mut reg = registry(&config(3.9), &m).expect("valid registry");
    let before = reg.advance(&mut m, 0.0).expect("step").actuators[0].loads;

    let next = decompose_3d(&grid(), [1, 2, 2], 1).expect("valid decomposition");
    m.regrid(next).expect("regrid");
    reg.post_regrid();
    assert!(reg.ownership("wing").is_none());
    assert!(reg.get("wing").expect("registered").info().root_proc.is_none());

    let report = reg.advance(&mut m, 0.1).expect("step after regrid");
    assert_eq!(report.epoch, 1);
    let own = reg.ownership("wing").expect("re-resolved");
    assert_eq!(own.epoch, 1);
    // wing spans y in [0.5, 7.5] after growth: both y-halves, both z-halves
    assert_eq!(own.owners.len(), 4);
    let after = report.actuators[0].loads;
    assert!((after.drag - before.drag).abs() < 1e-12 * before.drag);
}

#[test]
fn advance_detects_epoch_change_without_hook() {
    let mut m = mesh([2, 1, 1], 0);
    let mut reg = registry(&config(3.9), &m).expect("valid registry");
    reg.advance(&mut m, 0.0).expect("step");

    let next = decompose_3d(&grid(), [1, 1, 2], 5).expect("valid decomposition");
    m.regrid(next).expect("regrid");
    let report = reg.advance(&mut m, 0.1).expect("step after regrid");
    assert_eq!(report.epoch, 5);
    assert_eq!(report.step, 2);
}

#[test]
fn stale_ownership_is_rejected_by_reduction() {
    let mut m = mesh([2, 1, 1], 0);
    let mut reg = registry(&config(3.9), &m).expect("valid registry");
    reg.advance(&mut m, 0.0).expect("step");
    let stale = reg.ownership("wing").expect("resolved").clone();

    let next = decompose_3d(&grid(), [1, 2, 1], 1).expect("valid decomposition");
    m.regrid(next).expect("regrid");
    let wing = reg.get("wing").expect("registered");
    let err = node_contributions(
        "wing",
        wing.nodes(),
        &stale,
        m.partition(),
        &wing.load_reference(),
    )
    .expect_err("stale ownership");
    assert!(matches!(
        err,
        ActuatorError::StaleOwnership {
            expected: 1,
            found: 0,
            ..
        }
    ));
    assert_eq!(m.partition().epoch(), 1);
    assert!(LoadIntegrator::reduce("wing", Vec::new(), &stale).is_err());
}

#[test]
fn rotor_and_line_share_a_step_with_the_wing() {
    let json = r#"{
        "polars": [
            { "name": "flat", "kind": "thin_airfoil", "cd0": 0.01 },
            { "name": "table", "kind": "table",
              "aoa": [-10.0, 0.0, 10.0], "cl": [-1.0, 0.0, 1.0], "cd": [0.02, 0.01, 0.02] }
        ],
        "actuators": [
            { "label": "wing", "type": "FixedWing", "epsilon": [0.5, 0.5, 0.5], "polar": "flat",
              "geometry": { "start": [3.9, 2.5, 2.0], "end": [3.9, 5.5, 2.0],
                            "num_points": 10, "chord": 0.5, "pitch": 4.0 } },
            { "label": "rotor", "type": "RotorDisk", "epsilon": [0.4, 0.4, 0.4], "polar": "flat",
              "geometry": { "center": [6.0, 4.0, 2.0], "diameter": 1.2, "num_radial": 4,
                            "num_azimuthal": 12, "num_blades": 3, "rotor_speed": 20.0,
                            "chord": 0.1 } },
            { "label": "line", "type": "ActuatorLine", "epsilon": [0.4, 0.4, 0.4], "polar": "table",
              "geometry": { "points": [[2.0, 3.0, 1.5], [2.0, 4.0, 1.6], [2.0, 5.0, 1.8]],
                            "chord": [0.3, 0.25, 0.2], "twist": 2.0 } }
        ]
    }"#;
    let cfg = SimulationConfig::from_json_str(json).expect("valid config");
    let mut m = mesh([2, 2, 1], 0);
    let mut reg = registry(&cfg, &m).expect("valid registry");
    assert_eq!(reg.len(), 3);

    m.zero_source();
    let report = reg.advance(&mut m, 0.0).expect("step");
    assert_eq!(report.actuators.len(), 3);

    let wing = report.summary("wing").expect("wing");
    assert!(wing.loads.lift > 0.0);
    let rotor = report.summary("rotor").expect("rotor");
    assert!(rotor.loads.thrust > 0.0);
    assert!((rotor.loads.power - 20.0 * rotor.loads.torque).abs() < 1e-9 * rotor.loads.power.abs());
    let line = report.summary("line").expect("line");
    assert!(line.loads.lift > 0.0);

    let total: DVec3 = report.actuators.iter().map(|a| a.loads.force).sum();
    let projected = m.source_integral();
    assert!((projected + total).length() < 1e-6 * total.length());

    let json = report.to_json().expect("serializable");
    assert!(json.contains("\"rotor\""));
}
