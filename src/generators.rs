//! Per-body surface generators and the startup texture table.
//!
//! Each generator is a pure function of the [`TextureSpec`]: feature
//! placement draws from a PRNG seeded with the session seed mixed with the
//! key, so regenerating a key gives pixel-identical output.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::f64::consts::{PI, TAU};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use crate::error::{ConfigurationError, SceneInitError};
use crate::noise::{fbm, fbm3, seed_offset, turbulence3};
use crate::texture::{Raster, TextureSpec};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TextureKey {
    Mercury,
    Venus,
    Earth,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Sun,
    Moon,
    Asteroid,
    EarthClouds,
    Ring,
    UranusRing,
}

impl TextureKey {
    pub const ALL: [TextureKey; 14] = [
        TextureKey::Mercury,
        TextureKey::Venus,
        TextureKey::Earth,
        TextureKey::Mars,
        TextureKey::Jupiter,
        TextureKey::Saturn,
        TextureKey::Uranus,
        TextureKey::Neptune,
        TextureKey::Sun,
        TextureKey::Moon,
        TextureKey::Asteroid,
        TextureKey::EarthClouds,
        TextureKey::Ring,
        TextureKey::UranusRing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TextureKey::Mercury => "mercury",
            TextureKey::Venus => "venus",
            TextureKey::Earth => "earth",
            TextureKey::Mars => "mars",
            TextureKey::Jupiter => "jupiter",
            TextureKey::Saturn => "saturn",
            TextureKey::Uranus => "uranus",
            TextureKey::Neptune => "neptune",
            TextureKey::Sun => "sun",
            TextureKey::Moon => "moon",
            TextureKey::Asteroid => "asteroid",
            TextureKey::EarthClouds => "earth-clouds",
            TextureKey::Ring => "ring",
            TextureKey::UranusRing => "uranus-ring",
        }
    }

    fn salt(&self) -> u64 {
        self.as_str()
            .bytes()
            .fold(0xcbf2_9ce4_8422_2325u64, |h, b| (h ^ b as u64).wrapping_mul(0x0100_0000_01b3))
    }
}

impl fmt::Display for TextureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextureKey {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TextureKey::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ConfigurationError::UnknownTextureKey(s.to_string()))
    }
}

/// Looks up a generator by its textual key. Unknown keys are an error, never
/// silently mapped to a default.
pub fn generate_named(name: &str, spec: &TextureSpec) -> Result<Raster, ConfigurationError> {
    Ok(generate(name.parse()?, spec))
}

pub fn generate(key: TextureKey, spec: &TextureSpec) -> Raster {
    let mut g = Gen::new(key, spec);
    match key {
        TextureKey::Mercury => mercury(&mut g),
        TextureKey::Venus => venus(&mut g),
        TextureKey::Earth => earth(&mut g),
        TextureKey::Mars => mars(&mut g),
        TextureKey::Jupiter => jupiter(&mut g),
        TextureKey::Saturn => saturn(&mut g),
        TextureKey::Uranus => uranus(&mut g),
        TextureKey::Neptune => neptune(&mut g),
        TextureKey::Sun => sun(&mut g),
        TextureKey::Moon => moon(&mut g),
        TextureKey::Asteroid => asteroid(&mut g),
        TextureKey::EarthClouds => earth_clouds(&mut g),
        TextureKey::Ring => saturn_ring(&mut g),
        TextureKey::UranusRing => uranus_ring(&mut g),
    }
}

/// Generated rasters for one session, keyed by texture.
#[derive(Clone, Debug, Default)]
pub struct TextureAtlas {
    spec: TextureSpec,
    rasters: HashMap<TextureKey, Arc<Raster>>,
}

impl TextureAtlas {
    pub fn generate(spec: TextureSpec) -> Self {
        Self::generate_keys(spec, &TextureKey::ALL)
    }

    pub fn generate_keys(spec: TextureSpec, keys: &[TextureKey]) -> Self {
        let _span = tracing::info_span!("generate_textures", width = spec.width, height = spec.height).entered();
        let started = Instant::now();
        let mut rasters = HashMap::with_capacity(keys.len());
        for &key in keys {
            let t = Instant::now();
            rasters.insert(key, Arc::new(generate(key, &spec)));
            tracing::debug!(%key, elapsed_ms = t.elapsed().as_millis() as u64, "texture generated");
        }
        tracing::info!(count = rasters.len(), elapsed_ms = started.elapsed().as_millis() as u64, "textures ready");
        Self { spec, rasters }
    }

    /// Wraps rasters produced elsewhere, e.g. loaded from disk.
    pub fn from_rasters(spec: TextureSpec, rasters: impl IntoIterator<Item = (TextureKey, Raster)>) -> Self {
        let rasters = rasters.into_iter().map(|(k, r)| (k, Arc::new(r))).collect();
        Self { spec, rasters }
    }

    pub fn spec(&self) -> TextureSpec {
        self.spec
    }

    pub fn get(&self, key: TextureKey) -> Result<Arc<Raster>, SceneInitError> {
        self.rasters.get(&key).cloned().ok_or(SceneInitError::MissingTexture(key))
    }

    pub fn contains(&self, key: TextureKey) -> bool {
        self.rasters.contains_key(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TextureKey, &Arc<Raster>)> {
        self.rasters.iter().map(|(k, v)| (*k, v))
    }
}

struct Gen {
    width: u32,
    height: u32,
    ox: f64,
    oy: f64,
    rng: StdRng,
}

impl Gen {
    fn new(key: TextureKey, spec: &TextureSpec) -> Self {
        let seed = spec.seed ^ key.salt();
        let (ox, oy) = seed_offset(seed);
        Self {
            width: spec.width,
            height: spec.height,
            ox,
            oy,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Maps `(u, v)` onto a cylinder whose circumference is `scale`, so the
    /// field wraps at `u = 0 / u = 1` with the same contrast everywhere.
    fn cylinder(&self, u: f64, v: f64, scale: f64) -> (f64, f64, f64) {
        let theta = TAU * u;
        let r = scale / TAU;
        (self.ox + r * theta.cos(), self.oy + r * theta.sin(), v * scale)
    }

    fn fbm(&self, u: f64, v: f64, scale: f64, octaves: u32) -> f64 {
        let (x, y, z) = self.cylinder(u, v, scale);
        fbm3(x, y, z, octaves)
    }

    fn turbulence(&self, u: f64, v: f64, scale: f64, size: f64) -> f64 {
        let (x, y, z) = self.cylinder(u, v, scale);
        turbulence3(x, y, z, size)
    }

    fn fill(&self, f: impl Fn(f64, f64) -> [u8; 4]) -> Raster {
        Raster::from_fn(self.width, self.height, f)
    }

    fn craters(&mut self, raster: &mut Raster, count: usize, radius: (f64, f64), depth: (f64, f64)) {
        for _ in 0..count {
            let u = self.rng.gen_range(0.0..1.0);
            let v = self.rng.gen_range(0.12..0.88);
            let r = self.rng.gen_range(radius.0..radius.1);
            let d = self.rng.gen_range(depth.0..depth.1);
            raster.stamp_crater(u, v, r, d);
        }
    }
}

fn mix(a: [u8; 3], b: [u8; 3], t: f64) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    [0, 1, 2].map(|i| (a[i] as f64 + (b[i] as f64 - a[i] as f64) * t).round() as u8)
}

fn opaque(c: [u8; 3]) -> [u8; 4] {
    [c[0], c[1], c[2], 255]
}

fn smoothstep(e0: f64, e1: f64, x: f64) -> f64 {
    let t = ((x - e0) / (e1 - e0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// 0 at the equator, 1 at the poles.
fn latitude(v: f64) -> f64 {
    ((v - 0.5) * 2.0).abs()
}

fn mercury(g: &mut Gen) -> Raster {
    let mut r = g.fill(|u, v| {
        let h = g.fbm(u, v, 8.0, 6);
        opaque(mix([95, 90, 85], [175, 170, 165], h))
    });
    g.craters(&mut r, 60, (0.008, 0.05), (0.2, 0.45));
    r
}

fn venus(g: &mut Gen) -> Raster {
    g.fill(|u, v| {
        let t = g.turbulence(u, v, 64.0, 16.0);
        let band = ((v + t * 0.15) * PI * 9.0).sin() * 0.5 + 0.5;
        let c = mix([190, 140, 70], [245, 215, 150], band * 0.7 + t * 0.3);
        opaque(c)
    })
}

fn earth(g: &mut Gen) -> Raster {
    g.fill(|u, v| {
        let h = g.fbm(u, v, 5.0, 6);
        let lat = latitude(v);
        let ice_edge = 0.86 + (g.fbm(u, v, 40.0, 1) - 0.5) * 0.08;
        let c = if lat > ice_edge {
            [236, 242, 248]
        } else if h < 0.52 {
            mix([8, 32, 96], [30, 90, 170], smoothstep(0.3, 0.52, h))
        } else if h < 0.535 {
            [194, 178, 128]
        } else if h < 0.66 {
            let dry = smoothstep(0.0, 0.5, 1.0 - lat) * smoothstep(0.55, 0.65, h);
            mix([38, 110, 46], [140, 118, 70], dry)
        } else {
            mix([120, 110, 100], [240, 240, 240], smoothstep(0.66, 0.78, h))
        };
        opaque(c)
    })
}

fn mars(g: &mut Gen) -> Raster {
    let mut r = g.fill(|u, v| {
        let h = g.fbm(u, v, 6.0, 6);
        let maria = g.fbm(u, v, 2.5, 3);
        let lat = latitude(v);
        let mut c = mix([150, 62, 30], [225, 125, 75], h);
        if maria > 0.6 {
            c = mix(c, [90, 45, 30], smoothstep(0.6, 0.7, maria) * 0.6);
        }
        if lat > 0.9 + (h - 0.5) * 0.05 {
            c = [235, 230, 225];
        }
        opaque(c)
    });
    g.craters(&mut r, 25, (0.005, 0.025), (0.15, 0.3));
    r
}

fn jupiter(g: &mut Gen) -> Raster {
    const PALETTE: [[u8; 3]; 4] = [[200, 160, 120], [235, 215, 185], [170, 115, 80], [225, 190, 150]];
    let mut r = g.fill(|u, v| {
        let t = g.turbulence(u, v, 48.0, 16.0);
        let band = ((v * 14.0 + t * 1.5) * PI).sin() * 0.5 + 0.5;
        let idx = ((v * 14.0 + t) as usize) % PALETTE.len();
        let next = (idx + 1) % PALETTE.len();
        opaque(mix(PALETTE[idx], PALETTE[next], band))
    });
    r.stamp_storm(0.65, 0.62, 0.06, 0.05, &[[175, 80, 50], [200, 100, 60], [220, 140, 100]], 0.9);
    for _ in 0..6 {
        let u = g.rng.gen_range(0.0..1.0);
        let v = g.rng.gen_range(0.25..0.75);
        r.stamp_storm(u, v, 0.012, 0.01, &[[245, 240, 230], [230, 220, 200]], 0.7);
    }
    r
}

fn saturn(g: &mut Gen) -> Raster {
    g.fill(|u, v| {
        let t = g.turbulence(u, v, 40.0, 8.0);
        let band = ((v * 10.0 + t * 0.8) * PI).sin() * 0.5 + 0.5;
        opaque(mix([200, 175, 120], [240, 225, 180], band))
    })
}

fn uranus(g: &mut Gen) -> Raster {
    g.fill(|u, v| {
        let lat = latitude(v);
        let n = g.fbm(u, v, 3.0, 3);
        let band = ((v * 16.0) * PI).sin() * 0.03;
        opaque(mix([165, 225, 235], [115, 195, 212], lat * 0.7 + band + (n - 0.5) * 0.1))
    })
}

fn neptune(g: &mut Gen) -> Raster {
    let mut r = g.fill(|u, v| {
        let t = g.turbulence(u, v, 32.0, 8.0);
        let band = ((v * 8.0 + t * 0.6) * PI).sin() * 0.5 + 0.5;
        opaque(mix([35, 60, 170], [75, 115, 225], band))
    });
    r.stamp_storm(0.4, 0.6, 0.04, 0.03, &[[20, 30, 90], [30, 45, 120]], 0.8);
    r.stamp_storm(0.55, 0.7, 0.01, 0.006, &[[220, 230, 245]], 0.7);
    r
}

fn sun(g: &mut Gen) -> Raster {
    g.fill(|u, v| {
        let t = g.turbulence(u, v, 96.0, 32.0);
        let f = g.fbm(u, v, 12.0, 4);
        opaque(mix([255, 120, 0], [255, 240, 150], t * 0.7 + f * 0.3))
    })
}

fn moon(g: &mut Gen) -> Raster {
    let mut r = g.fill(|u, v| {
        let h = g.fbm(u, v, 7.0, 6);
        let maria = g.fbm(u, v, 2.0, 3);
        let mut c = mix([110, 110, 110], [190, 188, 185], h);
        if maria > 0.58 {
            c = mix(c, [70, 70, 72], smoothstep(0.58, 0.68, maria) * 0.7);
        }
        opaque(c)
    });
    g.craters(&mut r, 120, (0.004, 0.04), (0.2, 0.5));
    r
}

fn asteroid(g: &mut Gen) -> Raster {
    let mut r = g.fill(|u, v| {
        let h = g.fbm(u, v, 10.0, 8);
        opaque(mix([60, 55, 50], [125, 115, 105], h))
    });
    g.craters(&mut r, 40, (0.01, 0.06), (0.2, 0.4));
    r
}

fn earth_clouds(g: &mut Gen) -> Raster {
    g.fill(|u, v| {
        let swirl = g.turbulence(u, v, 48.0, 16.0);
        let n = g.fbm(u + swirl * 0.05, v, 6.0, 6);
        let a = smoothstep(0.48, 0.72, n * 0.75 + swirl * 0.35);
        [255, 255, 255, (a * 230.0) as u8]
    })
}

/// Radial profile: `u` is distance across the ring (inner to outer), every
/// row is identical.
fn saturn_ring(g: &mut Gen) -> Raster {
    let oy = g.oy;
    g.fill(|u, _| {
        let density = fbm(u * 60.0, oy, 4);
        let mut alpha = 0.35 + density * 0.6;
        if (0.62..0.68).contains(&u) {
            alpha *= 0.08;
        }
        alpha *= smoothstep(0.0, 0.05, u) * (1.0 - smoothstep(0.93, 1.0, u));
        let c = mix([150, 130, 100], [235, 220, 185], density);
        [c[0], c[1], c[2], (alpha.clamp(0.0, 1.0) * 255.0) as u8]
    })
}

fn uranus_ring(g: &mut Gen) -> Raster {
    const RINGLETS: [f64; 6] = [0.1, 0.25, 0.4, 0.55, 0.7, 0.95];
    g.fill(|u, _| {
        let alpha = RINGLETS
            .iter()
            .map(|c| 1.0 - smoothstep(0.0, 0.012, (u - c).abs()))
            .fold(0.0f64, f64::max);
        [200, 210, 220, (alpha * 0.8 * 255.0) as u8]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> TextureSpec {
        TextureSpec::new(512, 256, 11).unwrap()
    }

    #[test]
    fn same_key_and_seed_is_pixel_identical() {
        for key in [TextureKey::Mercury, TextureKey::Jupiter, TextureKey::EarthClouds, TextureKey::Ring] {
            assert_eq!(generate(key, &small()), generate(key, &small()), "{key}");
        }
    }

    #[test]
    fn different_seeds_differ() {
        let a = generate(TextureKey::Moon, &small());
        let b = generate(TextureKey::Moon, &TextureSpec { seed: 12, ..small() });
        assert_ne!(a, b);
    }

    #[test]
    fn keys_round_trip_through_names() {
        for key in TextureKey::ALL {
            assert_eq!(key.as_str().parse::<TextureKey>().unwrap(), key);
        }
    }

    #[test]
    fn unknown_key_is_a_configuration_error() {
        let err = generate_named("pluto", &small()).unwrap_err();
        assert_eq!(err, ConfigurationError::UnknownTextureKey("pluto".into()));
    }

    #[test]
    fn rasters_have_requested_size() {
        let spec = small();
        let r = generate(TextureKey::Sun, &spec);
        assert_eq!((r.width, r.height), (512, 256));
        assert_eq!(r.pixels.len(), 512 * 256);
    }

    #[test]
    fn ring_rows_are_identical() {
        let r = generate(TextureKey::Ring, &small());
        let row = |y: u32| (0..r.width).map(|x| r.get(x, y)).collect::<Vec<_>>();
        assert_eq!(row(0), row(r.height - 1));
    }

    #[test]
    fn fields_wrap_at_the_seam() {
        let g = Gen::new(TextureKey::Venus, &small());
        for i in 0..50 {
            let v = i as f64 / 50.0;
            assert!((g.fbm(0.0, v, 8.0, 6) - g.fbm(1.0, v, 8.0, 6)).abs() < 1e-9);
            assert!((g.turbulence(0.0, v, 64.0, 16.0) - g.turbulence(1.0, v, 64.0, 16.0)).abs() < 1e-9);
        }
    }

    #[test]
    fn contrast_holds_across_the_map() {
        // Spread of the field at the middle of the map against near the seam.
        let spread = |u: f64| {
            let samples: Vec<f64> = (0..200u64)
                .flat_map(|seed| {
                    let g = Gen::new(TextureKey::Mercury, &TextureSpec { seed, ..small() });
                    (0..12).map(move |i| g.fbm(u, 0.1 + i as f64 * 0.07, 8.0, 6))
                })
                .collect();
            let mean = samples.iter().sum::<f64>() / samples.len() as f64;
            (samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / samples.len() as f64).sqrt()
        };
        let ratio = spread(0.5) / spread(0.02);
        assert!(ratio > 0.85, "mid-map spread is {ratio:.2} of the seam's");
    }

    #[test]
    fn atlas_reports_missing_keys() {
        let atlas = TextureAtlas::generate_keys(small(), &[TextureKey::Mars]);
        assert!(atlas.get(TextureKey::Mars).is_ok());
        assert_eq!(atlas.get(TextureKey::Venus).unwrap_err(), SceneInitError::MissingTexture(TextureKey::Venus));
    }
}
