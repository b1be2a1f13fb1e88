//! Simulation clock.
//!
//! Simulated time is counted in fixed steps, not wall-clock seconds, so
//! playback is identical at any frame rate. Every angle in the scene is a
//! function of the accumulated simulated time `tau`, which avoids summing
//! rounding error into the angles themselves.

use std::f64::consts::TAU;

pub const DEFAULT_DT_SCALE: f64 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimClock {
    dt_scale: f64,
    tau: f64,
    steps: u64,
}

impl SimClock {
    pub fn new(dt_scale: f64) -> Self {
        Self { dt_scale, tau: 0.0, steps: 0 }
    }

    pub fn dt_scale(&self) -> f64 {
        self.dt_scale
    }

    /// Accumulated `Σ multiplier × dt_scale`.
    pub fn tau(&self) -> f64 {
        self.tau
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn advance(&mut self, steps: u64, multiplier: f64) {
        self.tau += steps as f64 * multiplier * self.dt_scale;
        self.steps += steps;
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(DEFAULT_DT_SCALE)
    }
}

/// Angle reached by something turning at `speed` radians per unit of simulated
/// time, starting from `phase0`, wrapped into `[0, 2π)`.
pub fn phase_at(phase0: f64, speed: f64, tau: f64) -> f64 {
    (phase0 + speed * tau).rem_euclid(TAU)
}
