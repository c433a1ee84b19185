//! Force / acceleration contributors for the two-body scenarios
//!
//! Defines 2D and 3D acceleration traits, direct Newtonian gravity,
//! and the first post-Newtonian (1PN) correction term.
//!
//! There is no softening: two bodies at zero separation produce
//! non-finite accelerations, which the integrator reports as a
//! singular configuration.

use crate::simulation::states::{System, System3, NVec2, NVec3};

/// Collection of 2D acceleration terms
/// Each term implements [`Acceleration`] and their contributions are summed
/// into a single acceleration vector per body
pub struct AccelSet {
    terms: Vec<Box<dyn Acceleration + Send + Sync>>,
}

impl AccelSet {
    /// Create an empty acceleration set
    pub fn new() -> Self {
        Self {
            terms: Vec::new()
        }
    }

    /// Add an acceleration term
    pub fn with<T>(mut self, term: T) -> Self
    where
        T: Acceleration + Send + Sync + 'static,
    {
        self.terms.push(Box::new(term));
        self
    }

    /// Compute total accelerations at time `t` for all bodies in `sys`
    /// - `out[i]` will be set to the sum of contributions from all terms
    pub fn accumulate_accels(&self, t: f64, sys: &System, out: &mut [NVec2]) {
        // Zero buffer
        for a in out.iter_mut() {
            *a = NVec2::zeros();
        }
        // Iterate over all acceleration contributors
        for term in &self.terms {
            term.acceleration(t, sys, out);
        }
    }
}

impl Default for AccelSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for 2D acceleration sources operating on [`System`]
/// Implementations add their contribution into `out[i]` for each body
pub trait Acceleration {
    fn acceleration(&self, t: f64, sys: &System, out: &mut [NVec2]);
}

/// 2D Newtonian gravity, direct pairwise sum
#[allow(non_snake_case)]
pub struct NewtonianGravity {
    pub G: f64, // gravitational constant
}

impl Acceleration for NewtonianGravity {
    fn acceleration(&self, _t: f64, sys: &System, out: &mut [NVec2]) {
        let n = sys.bodies.len();

        // Loop over each unordered pair (i, j) with i < j
        for i in 0..n {
            let bi = &sys.bodies[i];
            for j in (i + 1)..n {
                let bj = &sys.bodies[j];

                // r points from i to j: i is pulled along +r, j along -r
                let r = bj.x - bi.x;
                let r2 = r.dot(&r);

                // coef = G / |r|^3
                let inv_r = r2.sqrt().recip();
                let coef = self.G * inv_r * inv_r * inv_r;

                // a_i +=  G m_j r / |r|^3
                // a_j += -G m_i r / |r|^3
                out[i] += coef * bj.m * r;
                out[j] -= coef * bi.m * r;
            }
        }
    }
}

// =========================================================================================
// 2D stuff above
// 3D stuff below
// =========================================================================================

/// Collection of 3D acceleration terms
/// Each term implements [`Acceleration3`] and their contributions are summed
/// into a single acceleration vector per body
pub struct AccelSet3 {
    terms: Vec<Box<dyn Acceleration3 + Send + Sync>>,
}

impl AccelSet3 {
    /// Constructor
    pub fn new() -> Self {
        Self {
            terms: Vec::new(),
        }
    }

    /// Add an acceleration term
    pub fn with(mut self, term: impl Acceleration3 + Send + Sync + 'static) -> Self {
        self.terms.push(Box::new(term));
        self
    }

    /// Compute total accelerations at time `t` for all bodies in `sys`
    /// - `out[i]` will be set to the sum of contributions from all terms
    pub fn accumulate_accels(&self, t: f64, sys: &System3, out: &mut [NVec3]) {
        // Zero buffer
        for a in out.iter_mut() {
            *a = NVec3::zeros();
        }
        for term in &self.terms {
            term.acceleration(t, sys, out);
        }
    }
}

impl Default for AccelSet3 {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for 3D acceleration sources operating on [`System3`]
pub trait Acceleration3 {
    fn acceleration(&self, t: f64, sys: &System3, out: &mut [NVec3]);
}

/// 3D Newtonian gravity (direct n^2 sum)
#[allow(non_snake_case)]
pub struct NewtonianGravity3 {
    pub G: f64,
}

impl Acceleration3 for NewtonianGravity3 {
    fn acceleration(&self, _t: f64, sys: &System3, out: &mut [NVec3]) {
        let n = sys.bodies.len();

        for i in 0..n {
            let bi = &sys.bodies[i];
            for j in (i + 1)..n {
                let bj = &sys.bodies[j];

                // Displacement from i to j
                let r = bj.x - bi.x;
                let inv_r = r.norm().recip();
                let coef = self.G * inv_r * inv_r * inv_r;

                out[i] += coef * bj.m * r;
                out[j] -= coef * bi.m * r;
            }
        }
    }
}

// =========================================================================================
// 1PN correction
// =========================================================================================

/// First post-Newtonian correction for a pair of bodies
///
/// With `r = x_i - x_j`, `vsum = |v_i|^2 + |v_j|^2` and `vdr = (v_i - v_j) . r`:
///
/// ```text
/// a_i += G m_j / (c^2 |r|^3) * ((4 G m_i / |r| - vsum) r - 2 vdr v_i)
/// a_j += G m_i / (c^2 |r|^3) * ((4 G m_j / |r| - vsum) r + 2 vdr v_j)
/// ```
///
/// This is the two-body form of the correction; for more bodies it is
/// evaluated for every pair. It vanishes as `c` grows without bound and is
/// meant to be combined with [`NewtonianGravity3`] in one [`AccelSet3`].
#[allow(non_snake_case)]
pub struct PostNewtonian1 {
    pub G: f64, // gravitational constant
    pub c: f64, // speed of light
}

impl Acceleration3 for PostNewtonian1 {
    fn acceleration(&self, _t: f64, sys: &System3, out: &mut [NVec3]) {
        let n = sys.bodies.len();
        let inv_c2 = (self.c * self.c).recip();

        for i in 0..n {
            let bi = &sys.bodies[i];
            for j in (i + 1)..n {
                let bj = &sys.bodies[j];

                // Separation points from j to i here, opposite to the Newtonian terms
                let r_vec = bi.x - bj.x;
                let r = r_vec.norm();
                let inv_r3 = (r * r * r).recip();

                let vsum = bi.v.norm_squared() + bj.v.norm_squared();
                let vdr = (bi.v - bj.v).dot(&r_vec);

                let pref_i = self.G * bj.m * inv_c2 * inv_r3;
                let pref_j = self.G * bi.m * inv_c2 * inv_r3;

                out[i] += pref_i * ((4.0 * self.G * bi.m / r - vsum) * r_vec - 2.0 * vdr * bi.v);
                out[j] += pref_j * ((4.0 * self.G * bj.m / r - vsum) * r_vec + 2.0 * vdr * bj.v);
            }
        }
    }
}
