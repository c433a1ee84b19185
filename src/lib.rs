pub mod simulation;
pub mod configuration;
pub mod visualization;
pub mod benchmark;

pub use simulation::states::{Body, System, NVec2, Body3, System3, NVec3, State, PendulumState, PlanarState, SpatialState};
pub use simulation::params::{PendulumParams, BinaryParams, PostNewtonianParams, SolverParams};
pub use simulation::error::{SimError, SimResult};
pub use simulation::forces::{Acceleration, AccelSet, NewtonianGravity, Acceleration3, AccelSet3, NewtonianGravity3, PostNewtonian1};
pub use simulation::systems::{OdeSystem, FnSystem, SphericalPendulum, PlanarBinary, RelativisticBinary, cart_coords, spherical_coords};
pub use simulation::trajectory::{TimeGrid, Trajectory, CartesianTrace, SolveStats};
pub use simulation::integrator::{integrate, rk45_dense, rk4_fixed, rk4_step};
pub use simulation::frames::{Frame, FrameSource, PendulumFrames, PlanarBinaryFrames, SpatialBinaryFrames};
pub use simulation::scenario::{Scenario, ScenarioRun, RunSummary, RunCheck};

pub use configuration::config::{IntegratorConfig, ScenarioKind, EngineConfig, SolverConfig, TimeConfig, SystemConfig, ScenarioConfig};

pub use visualization::{vis2d::run_2d, vis3d::run_3d};

pub use benchmark::benchmark::{bench_tolerances, bench_rk4};
