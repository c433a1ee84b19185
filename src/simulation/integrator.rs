//! Time integrators producing a dense trajectory on a sample grid
//!
//! Provides an adaptive Dormand-Prince 5(4) integrator with dense output and a
//! classical fixed-step RK4, both driven by an [`OdeSystem`] and
//! [`SolverParams`]. Each call runs the whole grid in one blocking pass and
//! returns an owned [`Trajectory`].
//!
//! Non-finite values never reach the trajectory silently: a derivative or
//! step that turns NaN/infinite is rejected, and if shrinking the step cannot
//! get past it the run fails with [`SimError::Singular`] at the last good time.
//! The same holds when the step has to shrink to the floating-point resolution
//! of the time axis, which is what a finite-time blow-up looks like.
//! [`SimError::StepSizeUnderflow`] is reserved for a caller-set `min_step`.
//!
//! After every accepted step the state goes through [`OdeSystem::project`].
//! Systems with first integrals use it to keep them exact.

use log::debug;

use crate::configuration::config::IntegratorConfig;
use crate::simulation::error::{SimError, SimResult};
use crate::simulation::params::SolverParams;
use crate::simulation::states::State;
use crate::simulation::systems::OdeSystem;
use crate::simulation::trajectory::{SolveStats, TimeGrid, Trajectory};

// Dormand-Prince 5(4) tableau
const C: [f64; 7] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0];
const A: [[f64; 6]; 7] = [
    [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0, 0.0],
    [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0, 0.0],
    [19372.0 / 6561.0, -25360.0 / 2187.0, 64448.0 / 6561.0, -212.0 / 729.0, 0.0, 0.0],
    [9017.0 / 3168.0, -355.0 / 33.0, 46732.0 / 5247.0, 49.0 / 176.0, -5103.0 / 18656.0, 0.0],
    [35.0 / 384.0, 0.0, 500.0 / 1113.0, 125.0 / 192.0, -2187.0 / 6784.0, 11.0 / 84.0],
];
// 5th-order weights are the last row of A (FSAL)
const B: [f64; 6] = A[6];
// 5th-order minus embedded 4th-order weights, 7 stages
const E: [f64; 7] = [
    -71.0 / 57600.0,
    0.0,
    71.0 / 16695.0,
    -71.0 / 1920.0,
    17253.0 / 339200.0,
    -22.0 / 525.0,
    1.0 / 40.0,
];

/// Step-size controller constants
const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;
/// 1 / (q + 1) with q = 4, the order of the error estimate
const ERR_EXPONENT: f64 = -1.0 / 5.0;

/// Integrate `sys` from `y0` over every time in `grid`
///
/// `grid.start()` is the initial time; the first sample is `y0` itself.
/// Dispatches on `params.integrator` and validates the returned trajectory.
pub fn integrate<const N: usize, S>(
    sys: &S,
    y0: &State<N>,
    grid: &TimeGrid,
    params: &SolverParams,
) -> SimResult<Trajectory<N>>
where
    S: OdeSystem<N> + ?Sized,
{
    params.validate()?;
    sys.check_initial(y0)?;

    let traj = match params.integrator {
        IntegratorConfig::Rk45 => rk45_dense(sys, y0, grid, params)?,
        IntegratorConfig::Rk4 => rk4_fixed(sys, y0, grid, params.rk4_substeps)?,
    };
    traj.check_finite()?;

    let stats = traj.stats();
    debug!(
        "integrated {} samples: {} evals, {} accepted, {} rejected",
        traj.len(),
        stats.evals,
        stats.accepted,
        stats.rejected
    );
    Ok(traj)
}

fn all_finite<const N: usize>(y: &State<N>) -> bool {
    y.iter().all(|v| v.is_finite())
}

/// Root-mean-square of `v / scale`
fn rms_norm<const N: usize>(v: &State<N>, scale: &State<N>) -> f64 {
    (v.component_div(scale).norm_squared() / N as f64).sqrt()
}

// =========================================================================================
// Adaptive Dormand-Prince 5(4)
// =========================================================================================

/// Result of one attempted Dormand-Prince step
struct DpStep<const N: usize> {
    y: State<N>,
    f: State<N>, // derivative at the new state (FSAL)
    err: State<N>,
}

/// Attempt one step of size `h` from `(t, y)` with known derivative `f`
fn dp_step<const N: usize, S>(sys: &S, t: f64, y: &State<N>, f: &State<N>, h: f64, stats: &mut SolveStats) -> DpStep<N>
where
    S: OdeSystem<N> + ?Sized,
{
    let mut k = [State::<N>::zeros(); 7];
    k[0] = *f;

    for s in 1..6 {
        let mut dy = State::<N>::zeros();
        for (j, a) in A[s][..s].iter().enumerate() {
            dy += *a * k[j];
        }
        k[s] = sys.derivative(t + C[s] * h, &(y + h * dy));
    }

    // 5th-order solution
    let mut dy = State::<N>::zeros();
    for (j, b) in B.iter().enumerate() {
        dy += *b * k[j];
    }
    let y_new = y + h * dy;

    // Last stage doubles as the derivative at the new point
    k[6] = sys.derivative(t + h, &y_new);
    stats.evals += 6;

    let mut err = State::<N>::zeros();
    for (j, e) in E.iter().enumerate() {
        err += *e * k[j];
    }

    DpStep { y: y_new, f: k[6], err: h * err }
}

/// Cubic Hermite interpolation between two accepted steps
fn hermite<const N: usize>(
    t0: f64,
    y0: &State<N>,
    f0: &State<N>,
    t1: f64,
    y1: &State<N>,
    f1: &State<N>,
    t: f64,
) -> State<N> {
    if t == t1 {
        return *y1;
    }
    let h = t1 - t0;
    let s = (t - t0) / h;
    let s2 = s * s;
    let s3 = s2 * s;

    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;

    h00 * *y0 + (h10 * h) * *f0 + h01 * *y1 + (h11 * h) * *f1
}

/// Starting step estimate (Hairer, Norsett & Wanner, sec. II.4)
fn initial_step<const N: usize, S>(
    sys: &S,
    t0: f64,
    y0: &State<N>,
    f0: &State<N>,
    span: f64,
    params: &SolverParams,
    stats: &mut SolveStats,
) -> f64
where
    S: OdeSystem<N> + ?Sized,
{
    let scale = y0.abs() * params.rtol + State::<N>::repeat(params.atol);
    let d0 = rms_norm(y0, &scale);
    let d1 = rms_norm(f0, &scale);

    let h0 = if d0 < 1.0e-5 || d1 < 1.0e-5 { 1.0e-6 } else { 0.01 * d0 / d1 };
    let h0 = h0.min(span);

    let y1 = y0 + h0 * *f0;
    let f1 = sys.derivative(t0 + h0, &y1);
    stats.evals += 1;
    let d2 = rms_norm(&(f1 - f0), &scale) / h0;

    let h1 = if d1 <= 1.0e-15 && d2 <= 1.0e-15 {
        (h0 * 1.0e-3).max(1.0e-6)
    } else {
        (0.01 / d1.max(d2)).powf(-ERR_EXPONENT)
    };

    let h = (100.0 * h0).min(h1).min(span);
    if h.is_finite() && h > 0.0 { h } else { h0 }
}

/// Adaptive Dormand-Prince 5(4) with dense output on `grid`
pub fn rk45_dense<const N: usize, S>(
    sys: &S,
    y0: &State<N>,
    grid: &TimeGrid,
    params: &SolverParams,
) -> SimResult<Trajectory<N>>
where
    S: OdeSystem<N> + ?Sized,
{
    let times = grid.times();
    let tf = grid.end();
    let mut stats = SolveStats::default();

    let mut out = Vec::with_capacity(times.len());
    out.push(*y0);
    if times.len() == 1 {
        return Ok(Trajectory::new(times.to_vec(), out, stats));
    }

    let mut t = grid.start();
    let span = tf - t;
    let mut y = *y0;
    let mut f = sys.derivative(t, &y);
    stats.evals += 1;
    if !all_finite(&f) {
        return Err(SimError::Singular { t });
    }

    let mut h = match params.h0 {
        Some(h0) => h0,
        None => initial_step(sys, t, &y, &f, span, params, &mut stats),
    };

    let mut next = 1; // next grid sample to emit
    let mut steps = 0;
    let mut just_rejected = false;

    while next < times.len() {
        if steps >= params.max_steps {
            return Err(SimError::MaxStepsExceeded { t, steps });
        }
        steps += 1;

        // Smallest step that still moves t
        let h_floor = 10.0 * f64::EPSILON * t.abs().max(span);
        let h_min = params.min_step.max(h_floor);
        let mut h_try = h.min(params.h_max);
        let last = t + h_try >= tf;
        if last {
            h_try = tf - t;
        }

        let step = dp_step(sys, t, &y, &f, h_try, &mut stats);
        let scale = y.abs().sup(&step.y.abs()) * params.rtol + State::<N>::repeat(params.atol);
        let err = rms_norm(&step.err, &scale);
        let mut finite = err.is_finite() && all_finite(&step.y) && all_finite(&step.f);
        let t_new = if last { tf } else { t + h_try };
        let mut y_new = step.y;
        let mut f_new = step.f;

        if finite && err <= 1.0 && sys.project(y0, &mut y_new) {
            f_new = sys.derivative(t_new, &y_new);
            stats.evals += 1;
            finite = all_finite(&y_new) && all_finite(&f_new);
        }

        if finite && err <= 1.0 {
            // Emit every requested sample covered by this step
            while next < times.len() && times[next] <= t_new {
                out.push(hermite(t, &y, &f, t_new, &y_new, &f_new, times[next]));
                next += 1;
            }

            let mut factor = if err == 0.0 {
                MAX_FACTOR
            } else {
                (SAFETY * err.powf(ERR_EXPONENT)).min(MAX_FACTOR)
            };
            // No growth right after a rejection
            if just_rejected {
                factor = factor.min(1.0);
            }

            h = h_try * factor;
            t = t_new;
            y = y_new;
            f = f_new;
            stats.accepted += 1;
            just_rejected = false;
        } else {
            stats.rejected += 1;
            just_rejected = true;

            h = if finite {
                h_try * (SAFETY * err.powf(ERR_EXPONENT)).max(MIN_FACTOR)
            } else {
                h_try * MIN_FACTOR
            };

            if h < h_min {
                // Only a caller-set floor is a tolerance problem; hitting
                // the time resolution means the solution itself blows up
                return Err(if finite && params.min_step > h_floor {
                    SimError::StepSizeUnderflow { t, h }
                } else {
                    SimError::Singular { t }
                });
            }
        }
    }

    Ok(Trajectory::new(times.to_vec(), out, stats))
}

// =========================================================================================
// Fixed-step RK4
// =========================================================================================

/// One classical RK4 step of size `h`
pub fn rk4_step<const N: usize, S>(sys: &S, t: f64, y: &State<N>, h: f64) -> State<N>
where
    S: OdeSystem<N> + ?Sized,
{
    let half = 0.5 * h;
    let k1 = sys.derivative(t, y);
    let k2 = sys.derivative(t + half, &(y + half * k1));
    let k3 = sys.derivative(t + half, &(y + half * k2));
    let k4 = sys.derivative(t + h, &(y + h * k3));
    y + (h / 6.0) * (k1 + 2.0 * k2 + 2.0 * k3 + k4)
}

/// Fixed-step RK4 taking `substeps` equal steps between consecutive samples
pub fn rk4_fixed<const N: usize, S>(
    sys: &S,
    y0: &State<N>,
    grid: &TimeGrid,
    substeps: usize,
) -> SimResult<Trajectory<N>>
where
    S: OdeSystem<N> + ?Sized,
{
    let times = grid.times();
    let mut stats = SolveStats::default();
    let mut out = Vec::with_capacity(times.len());
    out.push(*y0);

    let mut y = *y0;
    for w in times.windows(2) {
        let (a, b) = (w[0], w[1]);
        let dt = (b - a) / substeps as f64;

        for k in 0..substeps {
            let t = a + dt * k as f64;
            let y_new = rk4_step(sys, t, &y, dt);
            stats.evals += 4;
            if !all_finite(&y_new) {
                return Err(SimError::Singular { t });
            }
            y = y_new;
            sys.project(y0, &mut y);
            stats.accepted += 1;
        }
        out.push(y);
    }

    Ok(Trajectory::new(times.to_vec(), out, stats))
}
