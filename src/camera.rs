//! Orbit camera with fly-to transitions.
//!
//! The camera sits on a sphere around its look-at point: `distance`,
//! azimuth `theta` and polar angle `phi` (see [`crate::math`] for the
//! convention). A fly-to eases the look-at point onto a body and the distance
//! onto a stand-off while the viewing direction is kept, so the position
//! covers `fly_damping` of the remaining way each frame, measured in the
//! frame of the (possibly moving) target body. Once arrived the camera keeps
//! following the body until the focus is released.
//!
//! Zoom is clamped twice: at least `min_distance` from the look-at point, and
//! never further than `max_distance` from the origin, also while following a
//! body far out.

use std::f64::consts::PI;

use nalgebra::{Matrix3, Vector2, Vector3};

use crate::celestial::CelestialBody;
use crate::config::CameraConfig;
use crate::math::{is_finite_vec, spherical_to_cartesian, Ray};

const DEFAULT_THETA: f64 = 0.6;
const DEFAULT_PHI: f64 = 1.15;
pub const NEAR: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Flight {
    pub body: CelestialBody,
    pub standoff: f64,
    last_focus: Vector3<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrbitCamera {
    config: CameraConfig,
    distance: f64,
    theta: f64,
    phi: f64,
    look_at: Vector3<f64>,
    flight: Option<Flight>,
    follow: Option<(CelestialBody, Vector3<f64>)>,
    aspect: f64,
}

impl OrbitCamera {
    pub fn new(config: CameraConfig) -> Self {
        let distance = config.default_distance;
        Self {
            config,
            distance,
            theta: DEFAULT_THETA,
            phi: DEFAULT_PHI,
            look_at: Vector3::zeros(),
            flight: None,
            follow: None,
            aspect: 16.0 / 9.0,
        }
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    pub fn phi(&self) -> f64 {
        self.phi
    }

    pub fn look_at(&self) -> Vector3<f64> {
        self.look_at
    }

    pub fn aspect(&self) -> f64 {
        self.aspect
    }

    pub fn flight(&self) -> Option<&Flight> {
        self.flight.as_ref()
    }

    pub fn is_flying(&self) -> bool {
        self.flight.is_some()
    }

    /// Body whose position the camera needs every frame, if any.
    pub fn tracked(&self) -> Option<CelestialBody> {
        self.flight.map(|f| f.body).or(self.follow.map(|(b, _)| b))
    }

    pub fn position(&self) -> Vector3<f64> {
        self.look_at + spherical_to_cartesian(self.distance, self.theta, self.phi)
    }

    /// Distance from the camera to the Sun at the origin, for telemetry.
    pub fn telemetry_distance(&self) -> f64 {
        self.position().norm()
    }

    pub fn rotate(&mut self, dx: f64, dy: f64) {
        if !(dx.is_finite() && dy.is_finite()) {
            return;
        }
        let eps = self.config.polar_epsilon;
        self.theta = (self.theta - dx * self.config.rotate_sensitivity).rem_euclid(2.0 * PI);
        self.phi = (self.phi - dy * self.config.rotate_sensitivity).clamp(eps, PI - eps);
        if self.flight.is_none() {
            self.clamp_distance();
        }
    }

    /// Multiplies the distance by `factor`, clamped to the zoom range. A zoom
    /// during a fly-to ends the transition but keeps following the body.
    pub fn zoom(&mut self, factor: f64) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        if let Some(flight) = self.flight.take() {
            self.follow = Some((flight.body, flight.last_focus));
        }
        self.distance *= factor;
        self.clamp_distance();
    }

    /// Largest distance from `look_at` along the current viewing direction
    /// that keeps the camera within `max_distance` of the origin. Never below
    /// `min_distance`.
    fn distance_cap(&self, look_at: &Vector3<f64>) -> f64 {
        let dir = spherical_to_cartesian(1.0, self.theta, self.phi);
        let along = look_at.dot(&dir);
        let disc = along * along - look_at.norm_squared() + self.config.max_distance.powi(2);
        let fit = if disc >= 0.0 { disc.sqrt() - along } else { 0.0 };
        fit.clamp(self.config.min_distance, self.config.max_distance)
    }

    fn clamp_distance(&mut self) {
        self.distance = self.distance.clamp(self.config.min_distance, self.distance_cap(&self.look_at));
    }

    /// Zoom factor for a wheel delta. Speed grows with distance so the far
    /// end of the range is reached in a similar number of notches, and is
    /// capped.
    pub fn wheel_factor(&self, delta: f64) -> f64 {
        let speed = (self.config.zoom_speed * (self.distance / self.config.default_distance).sqrt())
            .min(self.config.max_zoom_speed);
        (-delta * speed).exp()
    }

    /// Starts (or retargets) a transition toward a body. The current
    /// position is kept, so retargeting never jumps.
    pub fn fly_to(&mut self, body: CelestialBody, focus: Vector3<f64>, radius: f64) {
        if !is_finite_vec(&focus) || !radius.is_finite() {
            tracing::warn!(?body, "ignoring fly-to with a non-finite target");
            return;
        }
        let standoff = (radius * self.config.focus_factor).clamp(self.config.min_distance, self.distance_cap(&focus));
        self.follow = None;
        self.flight = Some(Flight { body, standoff, last_focus: focus });
    }

    /// Stops following; the camera stays where it is.
    pub fn release(&mut self) {
        self.flight = None;
        self.follow = None;
    }

    /// Per-frame update. `focus` is the current world position of
    /// [`Self::tracked`].
    pub fn update(&mut self, focus: Option<Vector3<f64>>) {
        self.sanitize();
        let Some(focus) = focus.filter(is_finite_vec) else {
            return;
        };

        if let Some((body, last)) = self.follow {
            self.look_at += focus - last;
            self.follow = Some((body, focus));
            self.clamp_distance();
            return;
        }
        let Some(mut flight) = self.flight else {
            return;
        };

        self.look_at += focus - flight.last_focus;
        flight.last_focus = focus;

        let k = self.config.fly_damping;
        self.look_at += (focus - self.look_at) * k;
        self.distance += (flight.standoff - self.distance) * k;

        let dir = spherical_to_cartesian(1.0, self.theta, self.phi);
        let goal = focus + dir * flight.standoff;
        if (goal - self.position()).norm() < self.config.arrive_epsilon {
            self.flight = None;
            self.follow = Some((flight.body, focus));
            tracing::debug!(body = ?flight.body, "fly-to arrived");
        } else {
            self.flight = Some(flight);
        }
    }

    /// Where the running transition will come to rest, given the target's
    /// current position.
    pub fn flight_goal(&self, focus: Vector3<f64>) -> Option<Vector3<f64>> {
        self.flight
            .map(|f| focus + spherical_to_cartesian(f.standoff, self.theta, self.phi))
    }

    /// Recovers from non-finite state by returning to the default view.
    pub fn sanitize(&mut self) {
        let ok = self.distance.is_finite()
            && self.theta.is_finite()
            && self.phi.is_finite()
            && is_finite_vec(&self.look_at);
        if ok {
            return;
        }
        tracing::warn!(
            distance = self.distance,
            theta = self.theta,
            phi = self.phi,
            "camera state went non-finite, resetting"
        );
        self.reset();
    }

    pub fn reset(&mut self) {
        self.distance = self.config.default_distance;
        self.theta = DEFAULT_THETA;
        self.phi = DEFAULT_PHI;
        self.look_at = Vector3::zeros();
        self.flight = None;
        self.follow = None;
    }

    pub fn set_aspect(&mut self, width: f64, height: f64) {
        let aspect = width / height;
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    /// Camera basis as columns `(right, up, back)` in world space.
    pub fn basis(&self) -> Matrix3<f64> {
        let back = spherical_to_cartesian(1.0, self.theta, self.phi);
        let right = Vector3::y().cross(&back).normalize();
        let up = back.cross(&right);
        Matrix3::from_columns(&[right, up, back])
    }

    fn tan_half_fov(&self) -> f64 {
        (self.config.fov_deg.to_radians() * 0.5).tan()
    }

    /// Ray through a point in normalised device coordinates (`x` right, `y`
    /// up, both in `[-1, 1]`).
    pub fn screen_ray(&self, ndc: Vector2<f64>) -> Option<Ray> {
        let basis = self.basis();
        let t = self.tan_half_fov();
        let local = Vector3::new(ndc.x * t * self.aspect, ndc.y * t, -1.0);
        Ray::new(self.position(), basis * local)
    }

    /// Camera-space depth and NDC of a world point; `None` behind the near
    /// plane.
    pub fn project(&self, world: &Vector3<f64>) -> Option<(f64, Vector2<f64>)> {
        let local = self.basis().transpose() * (world - self.position());
        let depth = -local.z;
        if !(depth > NEAR) {
            return None;
        }
        let t = self.tan_half_fov();
        Some((depth, Vector2::new(local.x / (depth * t * self.aspect), local.y / (depth * t))))
    }

    /// Apparent radius of a sphere at `depth`, as a fraction of half the
    /// viewport height.
    pub fn projected_radius(&self, depth: f64, radius: f64) -> f64 {
        radius / (depth * self.tan_half_fov())
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn polar_angle_stays_off_the_poles() {
        let mut cam = OrbitCamera::default();
        cam.rotate(0.0, 1e6);
        assert_eq!(cam.phi(), 0.05);
        cam.rotate(0.0, -1e6);
        assert_eq!(cam.phi(), PI - 0.05);
    }

    #[test]
    fn wheel_zoom_is_multiplicative_and_capped() {
        let mut cam = OrbitCamera::default();
        let f = cam.wheel_factor(100.0);
        assert!(f < 1.0 && f >= (-100.0 * 0.004f64).exp());
        let before = cam.distance();
        cam.zoom(f);
        assert!((cam.distance() - before * f).abs() < 1e-9);
        cam.zoom(1e-9);
        assert_eq!(cam.distance(), 10.0);
    }

    #[test]
    fn nan_state_resets_to_default() {
        let mut cam = OrbitCamera::default();
        cam.fly_to(CelestialBody::Mars, Vector3::new(30.0, 0.0, 0.0), 1.0);
        cam.distance = f64::NAN;
        cam.update(Some(Vector3::new(30.0, 0.0, 0.0)));
        assert_eq!(cam.distance(), 140.0);
        assert!(!cam.is_flying());
        assert_eq!(cam.tracked(), None);
    }

    #[test]
    fn fly_to_arrives_and_follows() {
        let mut cam = OrbitCamera::default();
        let earth = Vector3::new(23.0, 0.0, 0.0);
        cam.fly_to(CelestialBody::Earth, earth, 1.3);
        for _ in 0..2000 {
            cam.update(Some(earth));
        }
        assert!(!cam.is_flying());
        assert_eq!(cam.tracked(), Some(CelestialBody::Earth));
        assert!((cam.look_at() - earth).norm() < 0.01);
        assert!((cam.distance() - 10.0).abs() < 0.01);

        let offset = cam.look_at() - earth;
        let moved = earth + Vector3::new(0.0, 0.0, -2.0);
        cam.update(Some(moved));
        assert!((cam.look_at() - moved - offset).norm() < 1e-12);
    }

    #[test]
    fn retarget_mid_flight_never_jumps() {
        let mut cam = OrbitCamera::default();
        let a = Vector3::new(30.0, 0.0, 0.0);
        let b = Vector3::new(-54.0, 0.0, 20.0);
        cam.fly_to(CelestialBody::Mars, a, 1.0);
        for _ in 0..40 {
            cam.update(Some(a));
        }
        let before = cam.position();
        cam.fly_to(CelestialBody::Jupiter, b, 3.2);
        assert_eq!(cam.position(), before);

        let k = cam.config().fly_damping;
        let mut frames = 0;
        while cam.is_flying() {
            let goal = cam.flight_goal(b).unwrap();
            let pos = cam.position();
            cam.update(Some(b));
            let moved = (cam.position() - pos).norm();
            assert!(moved <= k * (goal - pos).norm() + 1e-9, "frame {frames}: moved {moved}");
            frames += 1;
            assert!(frames < 5000);
        }
        assert!((cam.look_at() - b).norm() < 0.01);
        assert!((cam.distance() - 16.0).abs() < 0.01);
    }

    #[test]
    fn following_an_outer_planet_stays_inside_the_zoom_range() {
        let mut cam = OrbitCamera::default();
        let mut neptune = Vector3::new(105.0, 0.0, 0.0);
        cam.fly_to(CelestialBody::Neptune, neptune, 2.2);
        for _ in 0..3000 {
            cam.update(Some(neptune));
        }
        assert_eq!(cam.tracked(), Some(CelestialBody::Neptune));
        for i in 0..200 {
            cam.zoom(10.0);
            neptune = Vector3::new(105.0 * (i as f64 * 0.01).cos(), 0.0, -105.0 * (i as f64 * 0.01).sin());
            cam.update(Some(neptune));
            assert!(cam.telemetry_distance() <= 250.0 + 1e-9, "frame {i}: {}", cam.telemetry_distance());
            assert!(cam.distance() >= 10.0);
        }
        cam.rotate(-400.0, 150.0);
        assert!(cam.telemetry_distance() <= 250.0 + 1e-9);
    }

    #[test]
    fn zoom_cap_is_the_plain_range_at_the_origin() {
        let mut cam = OrbitCamera::default();
        cam.zoom(1e9);
        assert_eq!(cam.distance(), 250.0);
        assert!((cam.telemetry_distance() - 250.0).abs() < 1e-9);
    }

    #[test]
    fn screen_ray_and_projection_agree() {
        let mut cam = OrbitCamera::default();
        cam.set_aspect(1600.0, 900.0);
        let ndc = Vector2::new(0.3, -0.4);
        let ray = cam.screen_ray(ndc).unwrap();
        let (depth, back) = cam.project(&ray.at(50.0)).unwrap();
        assert!(depth > 0.0);
        assert!((back - ndc).norm() < 1e-9);
    }

    #[test]
    fn points_behind_the_camera_do_not_project() {
        let cam = OrbitCamera::default();
        let behind = cam.position() + (cam.position() - cam.look_at());
        assert!(cam.project(&behind).is_none());
        assert!(cam.project(&cam.look_at()).is_some());
    }

    #[test]
    fn degenerate_aspect_is_ignored() {
        let mut cam = OrbitCamera::default();
        cam.set_aspect(800.0, 0.0);
        cam.set_aspect(f64::NAN, 10.0);
        assert_eq!(cam.aspect(), 16.0 / 9.0);
    }

    proptest! {
        #[test]
        fn zoom_stays_clamped(factors in prop::collection::vec(0.01f64..100.0, 1..50)) {
            let mut cam = OrbitCamera::default();
            for f in factors {
                cam.zoom(f);
                prop_assert!(cam.distance() >= 10.0 && cam.distance() <= 250.0);
            }
        }

        #[test]
        fn zoom_and_drag_keep_camera_near_the_origin(
            look in (-100.0f64..100.0, -20.0f64..20.0, -100.0f64..100.0),
            moves in prop::collection::vec((0.01f64..100.0, -500.0f64..500.0, -500.0f64..500.0), 1..40),
        ) {
            let mut cam = OrbitCamera::default();
            cam.look_at = Vector3::new(look.0, look.1, look.2);
            for (factor, dx, dy) in moves {
                cam.zoom(factor);
                cam.rotate(dx, dy);
                prop_assert!(cam.distance() >= 10.0);
                prop_assert!(cam.telemetry_distance() <= 250.0 + 1e-9);
            }
        }

        #[test]
        fn drags_keep_polar_inside_bounds(drags in prop::collection::vec((-5000.0f64..5000.0, -5000.0f64..5000.0), 1..50)) {
            let mut cam = OrbitCamera::default();
            for (dx, dy) in drags {
                cam.rotate(dx, dy);
                prop_assert!(cam.phi() > 0.049 && cam.phi() < PI - 0.049);
            }
        }
    }
}
