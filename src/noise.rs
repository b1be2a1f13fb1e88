//! Deterministic scalar fields used to rasterize body surfaces.
//!
//! Every function here is a pure function of its arguments. Seeding is done
//! by shifting the sample coordinates (see [`seed_offset`]), never by hidden
//! state.

pub const DEFAULT_OCTAVES: u32 = 5;

/// Sinusoidal lattice hash in `[0, 1)`.
pub fn hash2(x: f64, y: f64) -> f64 {
    let s = (x * 12.9898 + y * 78.233).sin() * 43758.5453;
    s - s.floor()
}

/// [`hash2`] extended with a third lattice axis.
pub fn hash3(x: f64, y: f64, z: f64) -> f64 {
    let s = (x * 12.9898 + y * 78.233 + z * 37.719).sin() * 43758.5453;
    s - s.floor()
}

fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Value noise in `[0, 1)`: the lattice hash interpolated with a smoothstep.
pub fn noise2d(x: f64, y: f64) -> f64 {
    let x0 = x.floor();
    let y0 = y.floor();
    let sx = smoothstep(x - x0);
    let sy = smoothstep(y - y0);

    let c00 = hash2(x0, y0);
    let c10 = hash2(x0 + 1.0, y0);
    let c01 = hash2(x0, y0 + 1.0);
    let c11 = hash2(x0 + 1.0, y0 + 1.0);

    lerp(lerp(c00, c10, sx), lerp(c01, c11, sx), sy)
}

/// Trilinear value noise in `[0, 1)`.
pub fn noise3d(x: f64, y: f64, z: f64) -> f64 {
    let (x0, y0, z0) = (x.floor(), y.floor(), z.floor());
    let sx = smoothstep(x - x0);
    let sy = smoothstep(y - y0);
    let sz = smoothstep(z - z0);

    let layer = |z: f64| {
        let c00 = hash3(x0, y0, z);
        let c10 = hash3(x0 + 1.0, y0, z);
        let c01 = hash3(x0, y0 + 1.0, z);
        let c11 = hash3(x0 + 1.0, y0 + 1.0, z);
        lerp(lerp(c00, c10, sx), lerp(c01, c11, sx), sy)
    };
    lerp(layer(z0), layer(z0 + 1.0), sz)
}

fn octave_sum(octaves: u32, sample: impl Fn(f64) -> f64) -> f64 {
    let mut sum = 0.0;
    let mut norm = 0.0;
    let mut amp = 1.0;
    let mut freq = 1.0;
    for _ in 0..octaves.max(1) {
        sum += sample(freq) * amp;
        norm += amp;
        amp *= 0.5;
        freq *= 2.0;
    }
    sum / norm
}

fn turbulence_sum(size: f64, sample: impl Fn(f64) -> f64) -> f64 {
    let mut size = size.max(1.0);
    let mut sum = 0.0;
    let mut norm = 0.0;
    while size >= 1.0 {
        let n = sample(size) * 2.0 - 1.0;
        sum += n.abs() * size;
        norm += size;
        size /= 2.0;
    }
    if norm <= 0.0 {
        return 0.0;
    }
    (sum / norm).clamp(0.0, 1.0)
}

/// Fractal sum of [`noise2d`]: frequency doubles and amplitude halves per
/// octave. Normalised back into `[0, 1)`.
pub fn fbm(x: f64, y: f64, octaves: u32) -> f64 {
    octave_sum(octaves, |f| noise2d(x * f, y * f))
}

/// [`fbm`] over [`noise3d`].
pub fn fbm3(x: f64, y: f64, z: f64, octaves: u32) -> f64 {
    octave_sum(octaves, |f| noise3d(x * f, y * f, z * f))
}

/// Sum of `|signed noise| * size` over halving sizes down to 1, normalised
/// to `[0, 1]`. Produces ridged, marbled patterns.
pub fn turbulence(x: f64, y: f64, size: f64) -> f64 {
    turbulence_sum(size, |s| noise2d(x / s, y / s))
}

/// [`turbulence`] over [`noise3d`].
pub fn turbulence3(x: f64, y: f64, z: f64, size: f64) -> f64 {
    turbulence_sum(size, |s| noise3d(x / s, y / s, z / s))
}

/// Coordinate shift derived from a seed. Kept small so `sin` in [`hash2`]
/// stays well conditioned.
pub fn seed_offset(seed: u64) -> (f64, f64) {
    let mut h = seed ^ 0x9e37_79b9_7f4a_7c15;
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    let ox = (h & 0xffff) as f64 / 65535.0 * 512.0;
    let oy = ((h >> 16) & 0xffff) as f64 / 65535.0 * 512.0;
    (ox, oy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_is_bounded_and_pure() {
        for i in 0..500 {
            let x = i as f64 * 0.37 - 40.0;
            let y = i as f64 * 0.11 + 3.0;
            let n = noise2d(x, y);
            assert!((0.0..1.0).contains(&n), "noise2d({x}, {y}) = {n}");
            assert_eq!(n.to_bits(), noise2d(x, y).to_bits());
        }
    }

    #[test]
    fn noise_matches_hash_on_lattice_points() {
        assert_eq!(noise2d(3.0, -7.0), hash2(3.0, -7.0));
    }

    #[test]
    fn fbm_stays_in_unit_range() {
        for i in 0..200 {
            let v = fbm(i as f64 * 0.21, i as f64 * 0.05, 6);
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn turbulence_stays_in_unit_range() {
        for i in 0..200 {
            let v = turbulence(i as f64 * 1.7, 90.0 - i as f64, 32.0);
            assert!((0.0..=1.0).contains(&v));
        }
        assert!(turbulence(1.0, 1.0, 0.25) >= 0.0);
    }

    #[test]
    fn noise3d_is_bounded_and_hits_the_lattice() {
        for i in 0..500 {
            let (x, y, z) = (i as f64 * 0.37 - 40.0, i as f64 * 0.11 + 3.0, i as f64 * 0.53);
            assert!((0.0..1.0).contains(&noise3d(x, y, z)));
            assert!((0.0..1.0).contains(&fbm3(x, y, z, 6)));
            assert!((0.0..=1.0).contains(&turbulence3(x, y, z, 16.0)));
        }
        assert_eq!(noise3d(3.0, -7.0, 2.0), hash3(3.0, -7.0, 2.0));
    }

    #[test]
    fn seed_offsets_differ() {
        assert_ne!(seed_offset(1), seed_offset(2));
        assert_eq!(seed_offset(42), seed_offset(42));
    }
}
