//! Core state types for the two-body and pendulum scenarios.
//!
//! Defines 2D and 3D body/system structs:
//! - `Body` / `System`  using `NVec2` (2d)
//! - `Body3` / `System3` using `NVec3` (3d)
//!
//! and the fixed state-vector layouts the solver works on:
//! - pendulum: `[theta, omega_theta, phi, omega_phi]`
//! - planar binary: `[x1, vx1, y1, vy1, x2, vx2, y2, vy2]`
//! - spatial binary: `[x1, vx1, y1, vy1, z1, vz1, x2, vx2, y2, vy2, z2, vz2]`
//!
//! Positions and velocities are interleaved per axis. The pack/unpack helpers
//! below are the only code that knows the binary layouts.

use nalgebra::{SVector, Vector2, Vector3};
pub type NVec2 = Vector2<f64>;
pub type NVec3 = Vector3<f64>;

/// Solver state vector of fixed length `N`
pub type State<const N: usize> = SVector<f64, N>;

pub type PendulumState = State<4>;
pub type PlanarState = State<8>;
pub type SpatialState = State<12>;

#[derive(Debug, Clone)]
pub struct Body {
    pub x: NVec2, // position
    pub v: NVec2, // velocity
    pub m: f64, // mass
}

#[derive(Debug, Clone)]
pub struct System {
    pub bodies: Vec<Body>, // 2d collection of bodies
    pub t: f64, // time
}

#[derive(Debug, Clone)]
pub struct Body3 {
    pub x: NVec3, // 3d position
    pub v: NVec3, // 3d velocity
    pub m: f64, // mass
}

#[derive(Debug, Clone)]
pub struct System3 {
    pub bodies: Vec<Body3>, // 3d collection of bodies
    pub t: f64, // time
}

impl System {
    /// Build the two bodies of a planar state vector
    pub fn from_planar(t: f64, y: &PlanarState, masses: [f64; 2]) -> Self {
        let bodies = (0..2)
            .map(|i| Body {
                x: planar_position(y, i),
                v: NVec2::new(y[4 * i + 1], y[4 * i + 3]),
                m: masses[i],
            })
            .collect();
        Self { bodies, t }
    }
}

impl System3 {
    /// Build the two bodies of a spatial state vector
    pub fn from_spatial(t: f64, y: &SpatialState, masses: [f64; 2]) -> Self {
        let bodies = (0..2)
            .map(|i| Body3 {
                x: spatial_position(y, i),
                v: NVec3::new(y[6 * i + 1], y[6 * i + 3], y[6 * i + 5]),
                m: masses[i],
            })
            .collect();
        Self { bodies, t }
    }
}

/// Position of body `i` (0 or 1) in a planar state vector
pub fn planar_position(y: &PlanarState, i: usize) -> NVec2 {
    NVec2::new(y[4 * i], y[4 * i + 2])
}

/// Position of body `i` (0 or 1) in a spatial state vector
pub fn spatial_position(y: &SpatialState, i: usize) -> NVec3 {
    NVec3::new(y[6 * i], y[6 * i + 2], y[6 * i + 4])
}

/// Pack velocities and accelerations into a planar derivative vector
pub fn pack_planar(v: [NVec2; 2], a: [NVec2; 2]) -> PlanarState {
    let mut dy = PlanarState::zeros();
    for i in 0..2 {
        dy[4 * i] = v[i].x;
        dy[4 * i + 1] = a[i].x;
        dy[4 * i + 2] = v[i].y;
        dy[4 * i + 3] = a[i].y;
    }
    dy
}

/// Pack velocities and accelerations into a spatial derivative vector
pub fn pack_spatial(v: [NVec3; 2], a: [NVec3; 2]) -> SpatialState {
    let mut dy = SpatialState::zeros();
    for i in 0..2 {
        for k in 0..3 {
            dy[6 * i + 2 * k] = v[i][k];
            dy[6 * i + 2 * k + 1] = a[i][k];
        }
    }
    dy
}
