//! Orbital kinematics.
//!
//! Orbits are circles and bodies do not interact; speeds are the tuned
//! constants from [`crate::celestial`]. The global multiplier applies to every
//! body alike, so orbital ratios are preserved at any playback speed.

use std::f64::consts::TAU;
use std::sync::Arc;

use crate::celestial::{BodyDescriptor, CelestialBody};
use crate::time::{phase_at, SimClock};

/// Discrete playback speeds. Pausing is a separate flag, not a speed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SpeedMultiplier {
    Quarter,
    Half,
    #[default]
    Normal,
    Double,
    Five,
    Ten,
}

impl SpeedMultiplier {
    pub const ALL: [SpeedMultiplier; 6] = [
        SpeedMultiplier::Quarter,
        SpeedMultiplier::Half,
        SpeedMultiplier::Normal,
        SpeedMultiplier::Double,
        SpeedMultiplier::Five,
        SpeedMultiplier::Ten,
    ];

    pub fn factor(&self) -> f64 {
        match self {
            SpeedMultiplier::Quarter => 0.25,
            SpeedMultiplier::Half => 0.5,
            SpeedMultiplier::Normal => 1.0,
            SpeedMultiplier::Double => 2.0,
            SpeedMultiplier::Five => 5.0,
            SpeedMultiplier::Ten => 10.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SpeedMultiplier::Quarter => "0.25×",
            SpeedMultiplier::Half => "0.5×",
            SpeedMultiplier::Normal => "1×",
            SpeedMultiplier::Double => "2×",
            SpeedMultiplier::Five => "5×",
            SpeedMultiplier::Ten => "10×",
        }
    }

    pub fn from_factor(factor: f64) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.factor() == factor)
    }

    pub fn faster(self) -> Self {
        let i = Self::ALL.iter().position(|s| *s == self).unwrap_or(2);
        Self::ALL[(i + 1).min(Self::ALL.len() - 1)]
    }

    pub fn slower(self) -> Self {
        let i = Self::ALL.iter().position(|s| *s == self).unwrap_or(2);
        Self::ALL[i.saturating_sub(1)]
    }
}

/// Live state of one body. For the Moon, `orbit_angle` is its angle around
/// Earth and is independent of Earth's own orbital angle.
#[derive(Clone, Debug)]
pub struct BodyInstance {
    pub descriptor: Arc<BodyDescriptor>,
    pub phase0: f64,
    pub orbit_angle: f64,
    pub spin_angle: f64,
    /// Cloud shell rotation, for bodies that carry one.
    pub cloud_angle: Option<f64>,
}

impl BodyInstance {
    pub fn new(descriptor: Arc<BodyDescriptor>, phase0: f64, has_clouds: bool) -> Self {
        let phase0 = phase0.rem_euclid(TAU);
        Self {
            descriptor,
            phase0,
            orbit_angle: phase0,
            spin_angle: 0.0,
            cloud_angle: has_clouds.then_some(0.0),
        }
    }

    pub fn body(&self) -> CelestialBody {
        self.descriptor.body
    }

    fn sync(&mut self, tau: f64, cloud_speed: f64) {
        self.orbit_angle = phase_at(self.phase0, self.descriptor.orbit_speed, tau);
        self.spin_angle = phase_at(0.0, self.descriptor.rotation_speed, tau);
        if let Some(angle) = self.cloud_angle.as_mut() {
            *angle = phase_at(0.0, cloud_speed, tau);
        }
    }
}

/// Spreads initial orbital angles so planets do not start in a line.
pub fn initial_phase(body: CelestialBody) -> f64 {
    const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;
    let i = CelestialBody::ALL.iter().position(|b| *b == body).unwrap_or(0);
    (i as f64 * GOLDEN_ANGLE).rem_euclid(TAU)
}

/// Advances every instance from the shared simulation clock.
#[derive(Clone, Debug)]
pub struct Kinematics {
    clock: SimClock,
    cloud_speed: f64,
}

impl Kinematics {
    pub fn new(dt_scale: f64, cloud_speed: f64) -> Self {
        Self { clock: SimClock::new(dt_scale), cloud_speed }
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// One render tick. While paused the clock and all angles stay put.
    pub fn step(&mut self, instances: &mut [BodyInstance], multiplier: SpeedMultiplier, paused: bool) {
        self.advance_steps(instances, 1, multiplier, paused);
    }

    pub fn advance_steps(
        &mut self,
        instances: &mut [BodyInstance],
        steps: u64,
        multiplier: SpeedMultiplier,
        paused: bool,
    ) {
        if paused || steps == 0 {
            return;
        }
        self.clock.advance(steps, multiplier.factor());
        self.sync(instances);
    }

    pub fn sync(&self, instances: &mut [BodyInstance]) {
        let tau = self.clock.tau();
        for inst in instances.iter_mut() {
            inst.sync(tau, self.cloud_speed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::celestial::descriptor;
    use proptest::prelude::*;

    fn instance_with_speed(speed: f64) -> BodyInstance {
        let mut d = descriptor(CelestialBody::Earth);
        d.orbit_speed = speed;
        BodyInstance::new(Arc::new(d), 0.0, true)
    }

    #[test]
    fn thousand_unit_steps_reach_ten_radians() {
        let mut kin = Kinematics::new(1.0, 0.0);
        let mut bodies = vec![instance_with_speed(0.01)];
        for _ in 0..1000 {
            kin.step(&mut bodies, SpeedMultiplier::Normal, false);
        }
        assert_eq!(bodies[0].orbit_angle, 10.0f64.rem_euclid(TAU));
    }

    #[test]
    fn pause_freezes_every_angle() {
        let mut kin = Kinematics::new(1.0, 0.024);
        let mut bodies: Vec<_> = crate::celestial::descriptors()
            .into_iter()
            .map(|d| BodyInstance::new(Arc::new(d), 0.3, true))
            .collect();
        kin.advance_steps(&mut bodies, 17, SpeedMultiplier::Double, false);
        let before: Vec<_> = bodies.iter().map(|b| (b.orbit_angle, b.spin_angle, b.cloud_angle)).collect();
        for _ in 0..250 {
            kin.step(&mut bodies, SpeedMultiplier::Ten, true);
        }
        let after: Vec<_> = bodies.iter().map(|b| (b.orbit_angle, b.spin_angle, b.cloud_angle)).collect();
        assert_eq!(before, after);
        assert_eq!(kin.clock().steps(), 17);
    }

    #[test]
    fn multiplier_preserves_orbital_ratios() {
        let mut kin = Kinematics::new(1.0, 0.0);
        let mut bodies = vec![instance_with_speed(0.001), instance_with_speed(0.002)];
        kin.advance_steps(&mut bodies, 300, SpeedMultiplier::Five, false);
        assert!((bodies[1].orbit_angle - 2.0 * bodies[0].orbit_angle).abs() < 1e-12);
    }

    #[test]
    fn speed_steps_saturate() {
        assert_eq!(SpeedMultiplier::Ten.faster(), SpeedMultiplier::Ten);
        assert_eq!(SpeedMultiplier::Quarter.slower(), SpeedMultiplier::Quarter);
        assert_eq!(SpeedMultiplier::Normal.faster(), SpeedMultiplier::Double);
        assert_eq!(SpeedMultiplier::from_factor(0.5), Some(SpeedMultiplier::Half));
        assert_eq!(SpeedMultiplier::from_factor(3.0), None);
    }

    proptest! {
        #[test]
        fn angle_is_closed_form_of_steps(
            steps in 0u64..20_000,
            speed in -0.05f64..0.05,
            idx in 0usize..SpeedMultiplier::ALL.len(),
        ) {
            let m = SpeedMultiplier::ALL[idx];
            let mut kin = Kinematics::new(1.0, 0.0);
            let mut bodies = vec![instance_with_speed(speed)];
            for _ in 0..steps {
                kin.step(&mut bodies, m, false);
            }
            let expected = (steps as f64 * speed * m.factor()).rem_euclid(TAU);
            let diff = (bodies[0].orbit_angle - expected).abs();
            prop_assert!(diff < 1e-9 || (TAU - diff) < 1e-9, "diff {diff}");
        }
    }
}
