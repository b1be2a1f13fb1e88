//! Raster buffers and the stamping primitives the generators draw with.
//!
//! Rasters are equirectangular: `u` runs around the body (wrapping), `v`
//! runs pole to pole (clamped).

use nalgebra::{Matrix3, Vector3};
use std::f64::consts::PI;
use std::path::Path;

use crate::error::ConfigurationError;

pub const MIN_WIDTH: u32 = 512;
pub const MIN_HEIGHT: u32 = 256;
pub const MAX_WIDTH: u32 = 8192;
pub const MAX_HEIGHT: u32 = 4096;

/// Resolution and seed shared by every generator in one session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureSpec {
    pub width: u32,
    pub height: u32,
    pub seed: u64,
}

impl TextureSpec {
    pub fn new(width: u32, height: u32, seed: u64) -> Result<Self, ConfigurationError> {
        if width < MIN_WIDTH || height < MIN_HEIGHT {
            return Err(ConfigurationError::ResolutionTooSmall { width, height });
        }
        if width > MAX_WIDTH || height > MAX_HEIGHT {
            return Err(ConfigurationError::ResolutionTooLarge { width, height });
        }
        Ok(Self { width, height, seed })
    }
}

impl Default for TextureSpec {
    fn default() -> Self {
        Self { width: 1024, height: 512, seed: 7 }
    }
}

#[derive(Clone, PartialEq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[u8; 4]>,
}

impl std::fmt::Debug for Raster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Raster")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl Raster {
    pub fn new(width: u32, height: u32, fill: [u8; 4]) -> Self {
        Self { width, height, pixels: vec![fill; width as usize * height as usize] }
    }

    /// Fills every pixel from a function of normalised `(u, v)` at the pixel centre.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(f64, f64) -> [u8; 4]) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            let v = (y as f64 + 0.5) / height as f64;
            for x in 0..width {
                let u = (x as f64 + 0.5) / width as f64;
                pixels.push(f(u, v));
            }
        }
        Self { width, height, pixels }
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if y < 0 || y >= self.height as i64 {
            return None;
        }
        let x = x.rem_euclid(self.width as i64);
        Some((y * self.width as i64 + x) as usize)
    }

    pub fn get(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Alpha-blends `color` over the pixel at `(x, y)`; `x` wraps, `y` clips.
    pub fn blend(&mut self, x: i64, y: i64, color: [u8; 3], alpha: f64) {
        let Some(idx) = self.index(x, y) else { return };
        let a = alpha.clamp(0.0, 1.0);
        let dst = &mut self.pixels[idx];
        for c in 0..3 {
            dst[c] = (dst[c] as f64 * (1.0 - a) + color[c] as f64 * a).round() as u8;
        }
        dst[3] = (dst[3] as f64 + (255.0 - dst[3] as f64) * a).round() as u8;
    }

    /// Multiplies the RGB of the pixel at `(x, y)` by `factor`.
    pub fn shade(&mut self, x: i64, y: i64, factor: f64) {
        let Some(idx) = self.index(x, y) else { return };
        let dst = &mut self.pixels[idx];
        for c in dst.iter_mut().take(3) {
            *c = (*c as f64 * factor).clamp(0.0, 255.0).round() as u8;
        }
    }

    /// Impact crater: a darkened floor and a bright rim, both radial gradients.
    /// Centre and radius are in normalised texture units (radius relative to height).
    pub fn stamp_crater(&mut self, cu: f64, cv: f64, radius: f64, depth: f64) {
        let cx = cu * self.width as f64;
        let cy = cv * self.height as f64;
        let r = (radius * self.height as f64).max(1.0);
        // Horizontal stretch keeps craters round on the sphere away from the equator.
        let lat = (0.5 - cv) * PI;
        let stretch = 1.0 / lat.cos().max(0.2);
        let rx = r * stretch * 2.0 * self.height as f64 / self.width as f64;
        let reach = 1.25;
        let x0 = (cx - rx * reach).floor() as i64;
        let x1 = (cx + rx * reach).ceil() as i64;
        let y0 = (cy - r * reach).floor() as i64;
        let y1 = (cy + r * reach).ceil() as i64;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = (x as f64 + 0.5 - cx) / rx;
                let dy = (y as f64 + 0.5 - cy) / r;
                let d = (dx * dx + dy * dy).sqrt();
                if d > reach {
                    continue;
                }
                let factor = if d < 0.8 {
                    1.0 - depth * (1.0 - (d / 0.8).powi(2))
                } else if d < 1.0 {
                    1.0 + depth * 0.6 * ((d - 0.8) / 0.2)
                } else {
                    1.0 + depth * 0.6 * (1.0 - (d - 1.0) / (reach - 1.0))
                };
                self.shade(x, y, factor);
            }
        }
    }

    /// Storm ellipse drawn as concentric layers of decreasing alpha.
    pub fn stamp_storm(&mut self, cu: f64, cv: f64, ru: f64, rv: f64, colors: &[[u8; 3]], alpha: f64) {
        let cx = cu * self.width as f64;
        let cy = cv * self.height as f64;
        let rx = (ru * self.width as f64).max(1.0);
        let ry = (rv * self.height as f64).max(1.0);
        let layers = colors.len().max(1);
        for (layer, color) in colors.iter().enumerate() {
            let scale = 1.0 - layer as f64 / layers as f64 * 0.7;
            let layer_alpha = alpha * (1.0 - layer as f64 / (layers as f64 + 1.0));
            let (lx, ly) = (rx * scale, ry * scale);
            for y in (cy - ly).floor() as i64..=(cy + ly).ceil() as i64 {
                for x in (cx - lx).floor() as i64..=(cx + lx).ceil() as i64 {
                    let dx = (x as f64 + 0.5 - cx) / lx;
                    let dy = (y as f64 + 0.5 - cy) / ly;
                    let d = dx * dx + dy * dy;
                    if d <= 1.0 {
                        self.blend(x, y, *color, layer_alpha * (1.0 - d * d));
                    }
                }
            }
        }
    }

    /// Nearest-texel lookup with `u` wrapping and `v` clamped.
    pub fn sample(&self, u: f64, v: f64) -> [u8; 4] {
        let x = ((u.rem_euclid(1.0) * self.width as f64) as u32).min(self.width - 1);
        let y = ((v.clamp(0.0, 1.0) * self.height as f64) as u32).min(self.height - 1);
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn downscale(&self, factor: u32) -> Self {
        if factor <= 1 {
            return self.clone();
        }
        let new_width = self.width / factor;
        let new_height = self.height / factor;
        let mut pixels = Vec::with_capacity((new_width * new_height) as usize);
        for y in 0..new_height {
            for x in 0..new_width {
                let mut sum = [0u32; 4];
                for dy in 0..factor {
                    for dx in 0..factor {
                        let p = self.get(x * factor + dx, y * factor + dy);
                        for c in 0..4 {
                            sum[c] += p[c] as u32;
                        }
                    }
                }
                let count = factor * factor;
                pixels.push(sum.map(|s| (s / count) as u8));
            }
        }
        Self { width: new_width, height: new_height, pixels }
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| *p).collect()
    }

    pub fn save_png(&self, path: &Path) -> Result<(), image::ImageError> {
        image::save_buffer(path, &self.as_bytes(), self.width, self.height, image::ColorType::Rgba8)
    }

    /// Software-shaded sphere preview, used for the info panel thumbnail.
    pub fn render_sphere(&self, size: usize, rot: &Matrix3<f64>) -> egui::ColorImage {
        let mut pixels = vec![egui::Color32::TRANSPARENT; size * size];
        let center = size as f64 / 2.0;
        let radius = center;
        let inv_rot = rot.transpose();

        for py in 0..size {
            for px in 0..size {
                let dx = px as f64 + 0.5 - center;
                let dy = py as f64 + 0.5 - center;
                let dist_sq = dx * dx + dy * dy;
                if dist_sq >= radius * radius {
                    continue;
                }
                let z = (radius * radius - dist_sq).sqrt() / radius;
                let v = inv_rot * Vector3::new(dx / radius, -dy / radius, z);

                let lat = v.y.clamp(-1.0, 1.0).asin();
                let lon = (-v.z).atan2(v.x);
                let [r, g, b, _] = self.sample((lon + PI) / (2.0 * PI), (PI / 2.0 - lat) / PI);

                let shade = (0.3 + 0.7 * z.max(0.0)) as f32;
                pixels[py * size + px] = egui::Color32::from_rgb(
                    (r as f32 * shade) as u8,
                    (g as f32 * shade) as u8,
                    (b as f32 * shade) as u8,
                );
            }
        }

        egui::ColorImage { size: [size, size], pixels, source_size: egui::Vec2::ZERO }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_rejects_small_rasters() {
        assert!(TextureSpec::new(256, 128, 1).is_err());
        assert!(TextureSpec::new(512, 256, 1).is_ok());
    }

    #[test]
    fn spec_rejects_oversized_rasters() {
        assert_eq!(
            TextureSpec::new(65536, 65536, 1),
            Err(ConfigurationError::ResolutionTooLarge { width: 65536, height: 65536 })
        );
        assert!(TextureSpec::new(8192, 8192, 1).is_err());
        assert!(TextureSpec::new(8192, 4096, 1).is_ok());
    }

    #[test]
    fn blend_wraps_horizontally_and_clips_vertically() {
        let mut r = Raster::new(8, 4, [0, 0, 0, 255]);
        r.blend(-1, 0, [255, 255, 255], 1.0);
        assert_eq!(r.get(7, 0), [255, 255, 255, 255]);
        r.blend(0, 10, [255, 0, 0], 1.0);
        assert!(r.pixels.iter().filter(|p| p[0] == 255).count() == 1);
    }

    #[test]
    fn crater_darkens_its_floor() {
        let mut r = Raster::new(512, 256, [128, 128, 128, 255]);
        r.stamp_crater(0.5, 0.5, 0.05, 0.5);
        assert!(r.get(256, 128)[0] < 128);
    }

    #[test]
    fn downscale_averages_blocks() {
        let mut r = Raster::new(4, 2, [0, 0, 0, 255]);
        r.pixels[0] = [200, 100, 40, 255];
        let small = r.downscale(2);
        assert_eq!((small.width, small.height), (2, 1));
        assert_eq!(small.pixels[0], [50, 25, 10, 255]);
    }

    #[test]
    fn sample_wraps_u() {
        let r = Raster::from_fn(4, 2, |u, _| [(u * 255.0) as u8, 0, 0, 255]);
        assert_eq!(r.sample(1.1, 0.0), r.sample(0.1, 0.0));
    }
}
