//! 3D rotations, spherical coordinates and ray queries.
//!
//! World space is y-up. Spherical coordinates follow the camera convention:
//! `theta` is the azimuth around +y measured from +z, `phi` the polar angle
//! from +y.

use nalgebra::{Matrix3, Vector3};

pub fn rotation_y(angle: f64) -> Matrix3<f64> {
    let (s, c) = angle.sin_cos();
    Matrix3::new(
        c, 0.0, s,
        0.0, 1.0, 0.0,
        -s, 0.0, c,
    )
}

pub fn rotation_z(angle: f64) -> Matrix3<f64> {
    let (s, c) = angle.sin_cos();
    Matrix3::new(
        c, -s, 0.0,
        s, c, 0.0,
        0.0, 0.0, 1.0,
    )
}

/// Body frame: spin about the body's own axis, then tilt that axis.
pub fn body_orientation(tilt_deg: f64, spin: f64) -> Matrix3<f64> {
    rotation_z(tilt_deg.to_radians()) * rotation_y(spin)
}

pub fn spherical_to_cartesian(radius: f64, theta: f64, phi: f64) -> Vector3<f64> {
    let sin_phi = phi.sin();
    Vector3::new(
        radius * sin_phi * theta.sin(),
        radius * phi.cos(),
        radius * sin_phi * theta.cos(),
    )
}

pub fn is_finite_vec(v: &Vector3<f64>) -> bool {
    v.iter().all(|c| c.is_finite())
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vector3<f64>,
    /// Unit length.
    pub dir: Vector3<f64>,
}

impl Ray {
    pub fn new(origin: Vector3<f64>, dir: Vector3<f64>) -> Option<Self> {
        let dir = dir.try_normalize(1e-12)?;
        Some(Self { origin, dir })
    }

    pub fn at(&self, t: f64) -> Vector3<f64> {
        self.origin + self.dir * t
    }
}

/// Distance along `ray` to the nearest intersection with a sphere in front
/// of the origin, if any.
pub fn ray_sphere(ray: &Ray, center: &Vector3<f64>, radius: f64) -> Option<f64> {
    let oc = ray.origin - center;
    let b = oc.dot(&ray.dir);
    let c = oc.norm_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    let near = -b - sq;
    if near >= 0.0 {
        return Some(near);
    }
    let far = -b + sq;
    (far >= 0.0).then_some(far)
}
