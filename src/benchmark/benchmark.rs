use std::time::Instant;

use crate::configuration::config::{IntegratorConfig, ScenarioKind};
use crate::simulation::scenario::{Scenario, ScenarioRun};

/// Relative tolerances swept by [`bench_tolerances`]
const RTOLS: [f64; 4] = [1.0e-4, 1.0e-6, 1.0e-8, 1.0e-10];

/// Fixed-step substep counts swept by [`bench_rk4`]
const SUBSTEPS: [usize; 4] = [1, 4, 16, 64];

/// Run every built-in scenario across a range of `rtol` values
/// Paste output directly into excel to graph
pub fn bench_tolerances() {
    println!("scenario,rtol,evals,accepted,rejected,ms");

    for kind in [ScenarioKind::Pendulum, ScenarioKind::Binary, ScenarioKind::Binary1pn] {
        for rtol in RTOLS {
            let scenario = match Scenario::builtin(kind) {
                Ok(s) => s,
                Err(e) => {
                    println!("{kind:?},{rtol:e},error: {e}");
                    continue;
                }
            };
            let mut solver = scenario.solver.clone();
            solver.rtol = rtol;
            let scenario = scenario.with_solver(solver);

            let t0 = Instant::now();
            match scenario.run() {
                Ok(run) => {
                    let ms = t0.elapsed().as_secs_f64() * 1000.0;
                    let s = run.stats();
                    println!("{kind:?},{rtol:e},{},{},{},{ms:.3}", s.evals, s.accepted, s.rejected);
                }
                Err(e) => println!("{kind:?},{rtol:e},error: {e}"),
            }
        }
    }
}

/// Fixed-step RK4 on the pendulum: cost and final `theta` against substeps
pub fn bench_rk4() {
    println!("substeps,evals,ms,final_theta");

    for substeps in SUBSTEPS {
        let scenario = match Scenario::builtin(ScenarioKind::Pendulum) {
            Ok(s) => s,
            Err(e) => {
                println!("{substeps},error: {e}");
                continue;
            }
        };
        let mut solver = scenario.solver.clone();
        solver.integrator = IntegratorConfig::Rk4;
        solver.rk4_substeps = substeps;
        let scenario = scenario.with_solver(solver);

        let t0 = Instant::now();
        match scenario.run() {
            Ok(ScenarioRun::Pendulum { trajectory, .. }) => {
                let ms = t0.elapsed().as_secs_f64() * 1000.0;
                let last = trajectory.len() - 1;
                let theta = trajectory.component(last, 0).unwrap_or(f64::NAN);
                println!("{substeps},{},{ms:.3},{theta:.12}", trajectory.stats().evals);
            }
            Ok(_) => {}
            Err(e) => println!("{substeps},error: {e}"),
        }
    }
}
