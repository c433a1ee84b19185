use std::f64::consts::PI;
use std::path::PathBuf;

use odesim::{
    cart_coords, integrate, spherical_coords, BinaryParams, FrameSource, IntegratorConfig, NVec3, OdeSystem,
    PendulumParams, PendulumState, PlanarBinary, PlanarState, PostNewtonianParams, RelativisticBinary, Scenario,
    ScenarioConfig, ScenarioKind, ScenarioRun, SimError, SolverParams, SpatialState, SphericalPendulum, TimeGrid,
};

const G_SI: f64 = 6.67430e-11;
const M_SUN: f64 = 1.989e30;
const M_EARTH: f64 = 5.972e24;

/// Planar state with body 1 at `p1` and body 2 at `p2`, given velocities
pub fn planar_state(p1: [f64; 2], v1: [f64; 2], p2: [f64; 2], v2: [f64; 2]) -> PlanarState {
    PlanarState::from([p1[0], v1[0], p1[1], v1[1], p2[0], v2[0], p2[1], v2[1]])
}

/// Spatial state with body 1 at `p1` and body 2 at `p2`, given velocities
pub fn spatial_state(p1: [f64; 3], v1: [f64; 3], p2: [f64; 3], v2: [f64; 3]) -> SpatialState {
    SpatialState::from([
        p1[0], v1[0], p1[1], v1[1], p1[2], v1[2],
        p2[0], v2[0], p2[1], v2[1], p2[2], v2[2],
    ])
}

/// Sun/Earth parameters for tests
pub fn sun_earth() -> BinaryParams {
    BinaryParams { G: G_SI, m1: M_SUN, m2: M_EARTH }
}

pub fn pendulum() -> SphericalPendulum {
    SphericalPendulum::new(PendulumParams { g: 9.81, l: 1.0 }).unwrap()
}

fn accel_planar(dy: &PlanarState, i: usize) -> [f64; 2] {
    [dy[4 * i + 1], dy[4 * i + 3]]
}

fn accel_spatial(dy: &SpatialState, i: usize) -> NVec3 {
    NVec3::new(dy[6 * i + 1], dy[6 * i + 3], dy[6 * i + 5])
}

fn rel_diff(a: &NVec3, b: &NVec3) -> f64 {
    (a - b).norm() / b.norm()
}

// ==================================================================================
// Pendulum derivative and coordinate transform
// ==================================================================================

#[test]
fn pendulum_without_azimuthal_motion_stays_planar() {
    let sys = pendulum();
    for i in 1..60 {
        let theta = i as f64 * 0.05;
        for omega_theta in [-2.0, 0.0, 0.7, 3.1] {
            let dy = sys.derivative(0.0, &PendulumState::new(theta, omega_theta, 0.4, 0.0));
            assert_eq!(dy[3], 0.0, "theta = {theta}, omega_theta = {omega_theta}");
            assert_eq!(dy[2], 0.0);
        }
    }
}

#[test]
fn pendulum_derivative_matches_equations() {
    let sys = pendulum();
    let (theta, wt, phi, wp) = (0.8, 0.3, 1.1, -0.6);
    let dy = sys.derivative(0.0, &PendulumState::new(theta, wt, phi, wp));

    assert_eq!(dy[0], wt);
    assert!((dy[1] - (-9.81 * theta.sin() - wp * wp * theta.sin() * theta.cos())).abs() < 1e-12);
    assert_eq!(dy[2], wp);
    assert!((dy[3] - 2.0 * wt * wp * theta.cos() / theta.sin()).abs() < 1e-12);
}

#[test]
fn coordinate_transform_round_trip() {
    let l = 1.7;
    for i in 1..30 {
        let theta = i as f64 * PI / 30.0;
        for j in -9..10 {
            let phi = j as f64 * 0.33;
            let p = cart_coords(theta, phi, l);
            assert!((p.norm() - l).abs() < 1e-12);

            let (theta_back, phi_back) = spherical_coords(&p, l);
            assert!((theta_back - theta).abs() < 1e-9, "theta {theta} -> {theta_back}");
            assert!((phi_back - phi).abs() < 1e-9, "phi {phi} -> {phi_back}");
        }
    }
}

#[test]
fn bob_hangs_below_pivot() {
    let p = cart_coords(1e-3, 0.0, 2.0);
    assert!((p.z + 2.0).abs() < 1e-5);
}

#[test]
fn pendulum_on_axis_is_rejected() {
    let grid = TimeGrid::linspace(0.0, 1.0, 10).unwrap();
    for theta in [0.0, PI] {
        let err = integrate(&pendulum(), &PendulumState::new(theta, 0.0, 0.0, 1.0), &grid, &SolverParams::default())
            .unwrap_err();
        assert!(matches!(err, SimError::InvalidInput(_)), "theta = {theta}: {err:?}");
    }
}

// ==================================================================================
// Gravity tests
// ==================================================================================

#[test]
fn gravity_newton_third_law() {
    let params = BinaryParams { G: 0.1, m1: 2.0, m2: 3.0 };
    let sys = PlanarBinary::new(params).unwrap();

    for (p1, p2) in [([-0.5, 0.0], [0.5, 0.0]), ([1.0, 2.0], [-3.0, 0.5]), ([0.0, 1e-3], [2e-3, 0.0])] {
        let dy = sys.derivative(0.0, &planar_state(p1, [0.1, 0.0], p2, [0.0, -0.2]));
        let a1 = accel_planar(&dy, 0);
        let a2 = accel_planar(&dy, 1);

        for k in 0..2 {
            let net = params.m1 * a1[k] + params.m2 * a2[k];
            let scale = (params.m1 * a1[k]).abs().max(1e-300);
            assert!(net.abs() / scale < 1e-12, "net momentum change not zero: {net}");
        }
    }
}

#[test]
fn gravity_points_toward_other_body() {
    let sys = PlanarBinary::new(BinaryParams { G: 1.0, m1: 1.0, m2: 1.0 }).unwrap();
    let dy = sys.derivative(0.0, &planar_state([-1.0, 0.0], [0.0; 2], [1.0, 0.0], [0.0; 2]));

    assert!(dy[1] > 0.0, "body 1 not pulled toward body 2");
    assert!(dy[5] < 0.0, "body 2 not pulled toward body 1");
    assert_eq!(dy[3], 0.0);
}

#[test]
fn gravity_inverse_square_law() {
    let sys = PlanarBinary::new(sun_earth()).unwrap();
    let near = sys.derivative(0.0, &planar_state([0.0; 2], [0.0; 2], [1.0e11, 0.0], [0.0; 2]));
    let far = sys.derivative(0.0, &planar_state([0.0; 2], [0.0; 2], [2.0e11, 0.0], [0.0; 2]));

    let ratio = near[5] / far[5];
    assert!((ratio - 4.0).abs() < 1e-9, "expected 4x, got {ratio}");

    // a2 = G M1 / r^2 toward body 1
    assert!((near[5] + G_SI * M_SUN / 1.0e22).abs() < 1e-12);
}

#[test]
fn post_newtonian_vanishes_for_large_c() {
    let newtonian = PlanarBinary::new(sun_earth()).unwrap();
    let relativistic = RelativisticBinary::new(PostNewtonianParams { binary: sun_earth(), c: 1.0e30 }).unwrap();

    let cases = [
        ([0.0, 0.0], [0.0, 0.0], [1.496e11, 0.0], [0.0, 29.29e3]),
        ([1.0e9, -2.0e9], [12.0, 3.0], [-7.0e10, 9.0e10], [-2.0e4, -1.5e4]),
    ];
    for (p1, v1, p2, v2) in cases {
        let dy_n = newtonian.derivative(0.0, &planar_state(p1, v1, p2, v2));
        let dy_r = relativistic.derivative(
            0.0,
            &spatial_state([p1[0], p1[1], 0.0], [v1[0], v1[1], 0.0], [p2[0], p2[1], 0.0], [v2[0], v2[1], 0.0]),
        );

        for i in 0..2 {
            let a_n = accel_planar(&dy_n, i);
            let a_n = NVec3::new(a_n[0], a_n[1], 0.0);
            let a_r = accel_spatial(&dy_r, i);
            assert!(rel_diff(&a_r, &a_n) < 1e-12, "body {i}: {a_r:?} vs {a_n:?}");
        }
    }
}

#[test]
fn post_newtonian_correction_is_small_but_present() {
    let newtonian = RelativisticBinary::new(PostNewtonianParams { binary: sun_earth(), c: 1.0e40 }).unwrap();
    let relativistic = RelativisticBinary::new(PostNewtonianParams { binary: sun_earth(), c: 3.0e8 }).unwrap();
    let y = spatial_state([0.0; 3], [0.0; 3], [1.496e11, 0.0, 0.0], [0.0, 29.29e3, 0.0]);

    let a_n = accel_spatial(&newtonian.derivative(0.0, &y), 1);
    let a_r = accel_spatial(&relativistic.derivative(0.0, &y), 1);
    let d = rel_diff(&a_r, &a_n);

    // Of order (v / c)^2 ~ 1e-8
    assert!(d > 1e-10 && d < 1e-6, "relative 1PN correction {d}");
}

#[test]
fn colliding_bodies_are_rejected() {
    let grid = TimeGrid::linspace(0.0, 1.0, 10).unwrap();
    let sys = PlanarBinary::new(sun_earth()).unwrap();
    let y0 = planar_state([5.0, 5.0], [0.0; 2], [5.0, 5.0], [1.0, 0.0]);

    let err = integrate(&sys, &y0, &grid, &SolverParams::default()).unwrap_err();
    assert!(matches!(err, SimError::InvalidInput(_)));
}

// ==================================================================================
// Time grid tests
// ==================================================================================

#[test]
fn linspace_includes_both_ends() {
    let grid = TimeGrid::linspace(0.0, 10.0, 1000).unwrap();
    assert_eq!(grid.len(), 1000);
    assert_eq!(grid.start(), 0.0);
    assert_eq!(grid.end(), 10.0);
}

#[test]
fn bad_grids_are_rejected() {
    assert!(matches!(TimeGrid::linspace(0.0, 1.0, 0), Err(SimError::InvalidTimeGrid(_))));
    assert!(matches!(TimeGrid::new(vec![]), Err(SimError::InvalidTimeGrid(_))));
    assert!(matches!(TimeGrid::new(vec![0.0, 1.0, 1.0]), Err(SimError::InvalidTimeGrid(_))));
    assert!(matches!(TimeGrid::new(vec![0.0, f64::NAN]), Err(SimError::InvalidTimeGrid(_))));
    assert!(matches!(TimeGrid::linspace(1.0, 0.0, 5), Err(SimError::InvalidTimeGrid(_))));
}

// ==================================================================================
// End-to-end scenarios
// ==================================================================================

/// Largest `|omega_phi - C sin^2(theta)|` with `C` taken from the first sample
fn azimuthal_residual(traj: &[PendulumState]) -> f64 {
    let c = SphericalPendulum::azimuthal_invariant(&traj[0]);
    traj.iter().map(|y| (y[3] - c * y[0].sin().powi(2)).abs()).fold(0.0, f64::max)
}

#[test]
fn pendulum_scenario_end_to_end() {
    let run = Scenario::builtin(ScenarioKind::Pendulum).unwrap().run().unwrap();
    let summary = run.summary();
    let ScenarioRun::Pendulum { trajectory, frames, .. } = run else {
        panic!("wrong scenario");
    };

    assert_eq!(trajectory.shape(), (1000, 4));
    assert!(trajectory.states().iter().all(|y| y.iter().all(|v| v.is_finite())));
    assert!(trajectory.check_finite().is_ok());

    // The bob swings through the vertical axis and comes out on the other side
    assert!(trajectory.states().iter().any(|y| y[0] < -0.5));

    // omega_phi / sin^2(theta) keeps its initial value pi across the crossings
    assert!((SphericalPendulum::azimuthal_invariant(&trajectory.states()[0]) - PI).abs() < 1e-12);
    assert!(azimuthal_residual(trajectory.states()) < 1e-4);

    match summary.check {
        odesim::RunCheck::EnergyDrift(drift) => assert!(drift < 1e-4, "energy drift {drift}"),
        other => panic!("unexpected check {other:?}"),
    }

    // The trace is built with cart_coords, so read it back through the inverse
    assert_eq!(frames.trace().len(), 1000);
    for (p, y) in frames.trace().points().iter().zip(trajectory.states()) {
        let (theta, phi) = spherical_coords(p, 1.0);
        assert!((theta.cos() - y[0].cos()).abs() < 1e-12);
        assert!((cart_coords(theta, phi, 1.0) - p).norm() < 1e-7);
    }

    assert_eq!(frames.len(), 1000);
    assert_eq!(frames.time(999), Some(10.0));
    assert!(frames.frame(1000).is_none());
}

#[test]
fn pendulum_rk4_end_to_end() {
    let mut cfg = ScenarioConfig::builtin(ScenarioKind::Pendulum);
    cfg.engine.integrator = IntegratorConfig::Rk4;
    let run = Scenario::from_config(&cfg).unwrap().run().unwrap();

    let ScenarioRun::Pendulum { trajectory, system, .. } = run else {
        panic!("wrong scenario");
    };
    assert_eq!(trajectory.shape(), (1000, 4));
    assert!(trajectory.check_finite().is_ok());
    assert_eq!(trajectory.stats().evals, 999 * 10 * 4);
    assert!(azimuthal_residual(trajectory.states()) < 1e-9);
    assert!(odesim::simulation::scenario::energy_drift(&system, &trajectory) < 1e-4);
}

#[test]
fn nearly_planar_pendulum_crosses_axis() {
    let grid = TimeGrid::linspace(0.0, 5.0, 500).unwrap();
    let y0 = PendulumState::new(0.5, 0.0, 0.0, 1e-3);
    let traj = integrate(&pendulum(), &y0, &grid, &SolverParams::default()).unwrap();

    assert_eq!(traj.shape(), (500, 4));
    assert!(traj.check_finite().is_ok());
    assert!(traj.states().iter().any(|y| y[0] < -0.4));
    assert!(azimuthal_residual(traj.states()) < 1e-6);
}

#[test]
fn blow_up_reports_singular_time() {
    // y' = 1 + y^2, y(0) = 0 is tan(t), singular at pi/2
    let sys = odesim::FnSystem(|_t: f64, y: &odesim::State<1>| odesim::State::<1>::new(1.0 + y[0] * y[0]));
    let grid = TimeGrid::linspace(0.0, 3.0, 31).unwrap();
    let err = integrate(&sys, &odesim::State::<1>::new(0.0), &grid, &SolverParams::default()).unwrap_err();

    match &err {
        SimError::Singular { t } => assert!((t - PI / 2.0).abs() < 1e-3, "stopped at {t}"),
        other => panic!("expected singular, got {other:?}"),
    }
    assert!(err.time().is_some());
}

#[test]
fn binary_scenario_stays_bound() {
    let run = Scenario::builtin(ScenarioKind::Binary).unwrap().run().unwrap();
    let summary = run.summary();
    let ScenarioRun::Binary { trajectory, frames } = run else {
        panic!("wrong scenario");
    };

    assert_eq!(trajectory.shape(), (1000, 8));
    assert!(trajectory.check_finite().is_ok());

    for y in trajectory.states() {
        let r = ((y[4] - y[0]).powi(2) + (y[6] - y[2]).powi(2)).sqrt();
        assert!(r > 1.3e11 && r < 1.6e11, "separation {r} out of range");
    }

    // Total momentum is a linear invariant of the flow
    let momentum = |y: &PlanarState| [M_SUN * y[1] + M_EARTH * y[5], M_SUN * y[3] + M_EARTH * y[7]];
    let p0 = momentum(&trajectory.states()[0]);
    let p_end = momentum(trajectory.states().last().unwrap());
    let scale = M_EARTH * 29.29e3;
    assert!((p_end[0] - p0[0]).abs() / scale < 1e-8);
    assert!((p_end[1] - p0[1]).abs() / scale < 1e-8);

    assert!(frames.extent() > 1.4e11);
    match summary.check {
        odesim::RunCheck::Separation { min, max } => assert!(min > 1.3e11 && max < 1.6e11),
        other => panic!("unexpected check {other:?}"),
    }
}

#[test]
fn relativistic_binary_scenario_stays_bound() {
    let run = Scenario::builtin(ScenarioKind::Binary1pn).unwrap().run().unwrap();
    let ScenarioRun::Binary1pn { trajectory, frames } = run else {
        panic!("wrong scenario");
    };

    assert_eq!(trajectory.shape(), (10_000, 12));
    assert!(trajectory.check_finite().is_ok());

    for y in trajectory.states() {
        let d = NVec3::new(y[6] - y[0], y[8] - y[2], y[10] - y[4]);
        assert!(d.norm() > 1.3e11 && d.norm() < 1.6e11);
        // Motion stays in the initial plane
        assert!(y[4].abs() < 1.0 && y[10].abs() < 1.0);
    }

    let last = frames.frame(9_999).unwrap();
    assert_eq!(last.bodies.len(), 2);
    assert_eq!(last.trail.len(), odesim::simulation::frames::ORBIT_TRAIL);
}

// ==================================================================================
// Configuration tests
// ==================================================================================

fn scenario_file(name: &str) -> ScenarioConfig {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(name);
    let file = std::fs::File::open(&path).unwrap();
    ScenarioConfig::from_yaml_reader(file).unwrap()
}

#[test]
fn scenario_files_match_builtins() {
    assert_eq!(scenario_file("pendulum.yaml"), ScenarioConfig::builtin(ScenarioKind::Pendulum));
    assert_eq!(scenario_file("binary.yaml"), ScenarioConfig::builtin(ScenarioKind::Binary));
    assert_eq!(scenario_file("binary_1pn.yaml"), ScenarioConfig::builtin(ScenarioKind::Binary1pn));
}

#[test]
fn minimal_yaml_uses_defaults() {
    let cfg = ScenarioConfig::from_yaml_str(
        "time: { t_end: 2.0, samples: 5 }\nsystem: { kind: pendulum, g: 9.81, l: 0.5, y0: [1.0, 0.0, 0.0, 0.5] }\n",
    )
    .unwrap();

    assert_eq!(cfg.kind(), ScenarioKind::Pendulum);
    assert_eq!(cfg.engine.integrator, IntegratorConfig::Rk45);
    assert_eq!(cfg.time.t0, 0.0);
    assert_eq!(cfg.solver_params().h_max, f64::INFINITY);

    let run = Scenario::from_config(&cfg).unwrap().run().unwrap();
    assert_eq!(run.summary().samples, 5);
}

#[test]
fn invalid_parameters_are_rejected() {
    let mut cfg = ScenarioConfig::builtin(ScenarioKind::Pendulum);
    cfg.system = odesim::SystemConfig::Pendulum { g: 9.81, l: -1.0, y0: [0.5, 0.0, 0.0, 0.0] };
    assert!(matches!(Scenario::from_config(&cfg), Err(SimError::InvalidInput(_))));

    let mut cfg = ScenarioConfig::builtin(ScenarioKind::Binary);
    cfg.solver.rtol = 0.0;
    assert!(matches!(Scenario::from_config(&cfg), Err(SimError::InvalidInput(_))));

    let mut cfg = ScenarioConfig::builtin(ScenarioKind::Binary1pn);
    cfg.time.samples = 0;
    assert!(matches!(Scenario::from_config(&cfg), Err(SimError::InvalidTimeGrid(_))));
}
