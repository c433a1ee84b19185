//! Frame sources: draw-ready coordinates for one animation frame
//!
//! A renderer asks a [`FrameSource`] for frame `i` and gets back a [`Frame`]
//! holding the sample time and the points to draw. Sources only read the
//! precomputed trajectory, so frames can be requested in any order and any
//! number of times.

use crate::simulation::states::{planar_position, spatial_position, NVec2, NVec3};
use crate::simulation::trajectory::{CartesianTrace, Trajectory};

/// Trail length of the pendulum bob, in samples
pub const PENDULUM_TRAIL: usize = 100;
/// Trail length of the orbiting body in the binaries, in samples
pub const ORBIT_TRAIL: usize = 500;

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct Frame<P> {
    pub index: usize,
    pub t: f64,
    pub bodies: Vec<P>, // current body positions
    pub anchor: Option<P>, // fixed pivot a rod is drawn from, if any
    pub trail: Vec<P>, // recent positions of the tracked body, oldest first
}

pub trait FrameSource {
    type Point: Copy;

    /// Number of frames
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Frame `index`, `None` past the end
    fn frame(&self, index: usize) -> Option<Frame<Self::Point>>;

    /// Largest absolute coordinate over all frames, for fitting the view
    fn extent(&self) -> f64;

    /// Simulation time of frame `index`
    fn time(&self, index: usize) -> Option<f64>;
}

fn trail_window(index: usize, len: usize) -> std::ops::Range<usize> {
    index.saturating_sub(len)..index
}

// =========================================================================================
// Pendulum
// =========================================================================================

/// Bob, rod and trail of the spherical pendulum
pub struct PendulumFrames {
    times: Vec<f64>,
    trace: CartesianTrace,
    l: f64,
    trail_len: usize,
}

impl PendulumFrames {
    pub fn new(traj: &Trajectory<4>, l: f64) -> Self {
        Self {
            times: traj.times().to_vec(),
            trace: CartesianTrace::from_pendulum(traj, l),
            l,
            trail_len: PENDULUM_TRAIL,
        }
    }

    pub fn trace(&self) -> &CartesianTrace {
        &self.trace
    }
}

impl FrameSource for PendulumFrames {
    type Point = NVec3;

    fn len(&self) -> usize {
        self.times.len()
    }

    fn frame(&self, index: usize) -> Option<Frame<NVec3>> {
        let bob = self.trace.get(index)?;
        Some(Frame {
            index,
            t: self.times[index],
            bodies: vec![bob],
            anchor: Some(NVec3::zeros()),
            trail: self.trace.points()[trail_window(index, self.trail_len)].to_vec(),
        })
    }

    fn extent(&self) -> f64 {
        self.l
    }

    fn time(&self, index: usize) -> Option<f64> {
        self.times.get(index).copied()
    }
}

// =========================================================================================
// Planar binary
// =========================================================================================

/// Positions of both bodies in the plane plus a trail of the second body
pub struct PlanarBinaryFrames {
    times: Vec<f64>,
    positions: Vec<[NVec2; 2]>,
    extent: f64,
    trail_len: usize,
}

impl PlanarBinaryFrames {
    pub fn new(traj: &Trajectory<8>) -> Self {
        let positions: Vec<[NVec2; 2]> = traj
            .states()
            .iter()
            .map(|y| [planar_position(y, 0), planar_position(y, 1)])
            .collect();
        let extent = positions
            .iter()
            .flatten()
            .map(|p| p.amax())
            .fold(0.0, f64::max);

        Self {
            times: traj.times().to_vec(),
            positions,
            extent,
            trail_len: ORBIT_TRAIL,
        }
    }
}

impl FrameSource for PlanarBinaryFrames {
    type Point = NVec2;

    fn len(&self) -> usize {
        self.times.len()
    }

    fn frame(&self, index: usize) -> Option<Frame<NVec2>> {
        let pos = self.positions.get(index)?;
        let trail = self.positions[trail_window(index, self.trail_len)]
            .iter()
            .map(|p| p[1])
            .collect();

        Some(Frame {
            index,
            t: self.times[index],
            bodies: pos.to_vec(),
            anchor: None,
            trail,
        })
    }

    fn extent(&self) -> f64 {
        self.extent
    }

    fn time(&self, index: usize) -> Option<f64> {
        self.times.get(index).copied()
    }
}

// =========================================================================================
// Spatial binary
// =========================================================================================

/// Positions of both bodies in space plus a trail of the second body
pub struct SpatialBinaryFrames {
    times: Vec<f64>,
    positions: Vec<[NVec3; 2]>,
    extent: f64,
    trail_len: usize,
}

impl SpatialBinaryFrames {
    pub fn new(traj: &Trajectory<12>) -> Self {
        let positions: Vec<[NVec3; 2]> = traj
            .states()
            .iter()
            .map(|y| [spatial_position(y, 0), spatial_position(y, 1)])
            .collect();
        let extent = positions
            .iter()
            .flatten()
            .map(|p| p.amax())
            .fold(0.0, f64::max);

        Self {
            times: traj.times().to_vec(),
            positions,
            extent,
            trail_len: ORBIT_TRAIL,
        }
    }
}

impl FrameSource for SpatialBinaryFrames {
    type Point = NVec3;

    fn len(&self) -> usize {
        self.times.len()
    }

    fn frame(&self, index: usize) -> Option<Frame<NVec3>> {
        let pos = self.positions.get(index)?;
        let trail = self.positions[trail_window(index, self.trail_len)]
            .iter()
            .map(|p| p[1])
            .collect();

        Some(Frame {
            index,
            t: self.times[index],
            bodies: pos.to_vec(),
            anchor: None,
            trail,
        })
    }

    fn extent(&self) -> f64 {
        self.extent
    }

    fn time(&self, index: usize) -> Option<f64> {
        self.times.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::states::{PendulumState, PlanarState};
    use crate::simulation::trajectory::SolveStats;

    fn pendulum_traj(n: usize) -> Trajectory<4> {
        let times: Vec<f64> = (0..n).map(|i| i as f64 * 0.1).collect();
        let states = (0..n)
            .map(|i| PendulumState::new(0.5, 0.0, 0.01 * i as f64, 0.0))
            .collect();
        Trajectory::new(times, states, SolveStats::default())
    }

    #[test]
    fn pendulum_trail_is_capped() {
        let frames = PendulumFrames::new(&pendulum_traj(250), 2.0);

        let early = frames.frame(10).unwrap();
        assert_eq!(early.trail.len(), 10);
        assert_eq!(early.anchor, Some(NVec3::zeros()));

        let late = frames.frame(200).unwrap();
        assert_eq!(late.trail.len(), PENDULUM_TRAIL);
        assert_eq!(late.trail.last().copied(), frames.trace().get(199));
        assert!((late.t - 20.0).abs() < 1e-12);
        assert!((late.bodies[0].norm() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn frames_end_with_trajectory() {
        let frames = PendulumFrames::new(&pendulum_traj(5), 1.0);
        assert_eq!(frames.len(), 5);
        assert!(frames.frame(4).is_some());
        assert!(frames.frame(5).is_none());
        assert_eq!(frames.time(5), None);
    }

    #[test]
    fn planar_extent_covers_both_bodies() {
        let mut y = PlanarState::zeros();
        y[0] = -3.0;
        y[6] = 5.0;
        let traj = Trajectory::new(vec![0.0], vec![y], SolveStats::default());
        let frames = PlanarBinaryFrames::new(&traj);

        assert_eq!(frames.extent(), 5.0);
        let f = frames.frame(0).unwrap();
        assert_eq!(f.bodies, vec![NVec2::new(-3.0, 0.0), NVec2::new(0.0, 5.0)]);
        assert!(f.trail.is_empty());
    }
}
