//! Authored body data.
//!
//! One [`BodyDescriptor`] per body, compiled in. Scene-space units are
//! arbitrary "simulation units"; speeds are radians per simulation step and
//! are tuned for a readable orrery, not for astronomical ratios.

use crate::error::ConfigurationError;
use crate::generators::TextureKey;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum CelestialBody {
    Sun,
    Mercury,
    Venus,
    Earth,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Moon,
}

impl CelestialBody {
    pub const ALL: [CelestialBody; 10] = [
        CelestialBody::Sun,
        CelestialBody::Mercury,
        CelestialBody::Venus,
        CelestialBody::Earth,
        CelestialBody::Mars,
        CelestialBody::Jupiter,
        CelestialBody::Saturn,
        CelestialBody::Uranus,
        CelestialBody::Neptune,
        CelestialBody::Moon,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CelestialBody::Sun => "Sun",
            CelestialBody::Mercury => "Mercury",
            CelestialBody::Venus => "Venus",
            CelestialBody::Earth => "Earth",
            CelestialBody::Mars => "Mars",
            CelestialBody::Jupiter => "Jupiter",
            CelestialBody::Saturn => "Saturn",
            CelestialBody::Uranus => "Uranus",
            CelestialBody::Neptune => "Neptune",
            CelestialBody::Moon => "Moon",
        }
    }

    /// Bodies that orbit something other than the Sun.
    pub fn parent_body(&self) -> Option<CelestialBody> {
        match self {
            CelestialBody::Moon => Some(CelestialBody::Earth),
            _ => None,
        }
    }

    pub fn display_color(&self) -> [u8; 3] {
        match self {
            CelestialBody::Sun => [255, 200, 60],
            CelestialBody::Mercury => [170, 165, 160],
            CelestialBody::Venus => [230, 190, 120],
            CelestialBody::Earth => [80, 140, 230],
            CelestialBody::Mars => [210, 100, 60],
            CelestialBody::Jupiter => [215, 170, 120],
            CelestialBody::Saturn => [225, 200, 140],
            CelestialBody::Uranus => [140, 215, 225],
            CelestialBody::Neptune => [70, 100, 220],
            CelestialBody::Moon => [190, 190, 190],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AtmosphereSpec {
    pub color: [f32; 3],
    pub opacity: f32,
    /// Shell radius as a multiple of the body radius.
    pub scale: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RingSpec {
    pub inner: f32,
    pub outer: f32,
    pub texture: TextureKey,
}

/// Display-only facts shown in the info panel.
#[derive(Clone, Debug, PartialEq)]
pub struct BodyInfo {
    pub diameter: &'static str,
    pub mass: &'static str,
    pub temperature: &'static str,
    pub day_length: &'static str,
    pub year_length: &'static str,
    pub moons: u32,
    pub description: &'static str,
    pub facts: &'static [&'static str],
}

#[derive(Clone, Debug, PartialEq)]
pub struct BodyDescriptor {
    pub body: CelestialBody,
    pub name: &'static str,
    pub radius: f64,
    /// Distance from the parent body (the Sun, or Earth for the Moon).
    pub distance: f64,
    pub orbit_speed: f64,
    pub rotation_speed: f64,
    pub tilt_deg: f64,
    pub roughness: f32,
    pub metalness: f32,
    pub texture: TextureKey,
    pub atmosphere: Option<AtmosphereSpec>,
    pub rings: Option<RingSpec>,
    pub info: BodyInfo,
}

impl BodyDescriptor {
    pub fn is_emissive(&self) -> bool {
        self.body == CelestialBody::Sun
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.name.trim().is_empty() {
            return Err(ConfigurationError::MissingName { body: self.body });
        }
        let positive = |field: &'static str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigurationError::InvalidField { body: self.body, field, value })
            }
        };
        let finite = |field: &'static str, value: f64| {
            if value.is_finite() {
                Ok(())
            } else {
                Err(ConfigurationError::InvalidField { body: self.body, field, value })
            }
        };
        positive("radius", self.radius)?;
        if self.body != CelestialBody::Sun {
            positive("distance", self.distance)?;
        }
        finite("orbit_speed", self.orbit_speed)?;
        finite("rotation_speed", self.rotation_speed)?;
        finite("tilt_deg", self.tilt_deg)?;
        finite("roughness", self.roughness as f64)?;
        finite("metalness", self.metalness as f64)?;
        if let Some(ring) = self.rings {
            let ok = ring.inner.is_finite()
                && ring.outer.is_finite()
                && ring.inner > self.radius as f32
                && ring.inner < ring.outer;
            if !ok {
                return Err(ConfigurationError::InvalidRing {
                    body: self.body,
                    inner: ring.inner,
                    outer: ring.outer,
                });
            }
        }
        Ok(())
    }
}

pub fn descriptors() -> Vec<BodyDescriptor> {
    CelestialBody::ALL.iter().map(|b| descriptor(*b)).collect()
}

pub fn descriptor(body: CelestialBody) -> BodyDescriptor {
    match body {
        CelestialBody::Sun => BodyDescriptor {
            body,
            name: "Sun",
            radius: 5.0,
            distance: 0.0,
            orbit_speed: 0.0,
            rotation_speed: 0.002,
            tilt_deg: 7.25,
            roughness: 1.0,
            metalness: 0.0,
            texture: TextureKey::Sun,
            atmosphere: Some(AtmosphereSpec { color: [1.0, 0.6, 0.15], opacity: 0.35, scale: 1.25 }),
            rings: None,
            info: BodyInfo {
                diameter: "1,392,700 km",
                mass: "1.989 × 10^30 kg",
                temperature: "5,500 °C (surface)",
                day_length: "25 - 35 days",
                year_length: "230 million years (galactic orbit)",
                moons: 0,
                description: "The star at the centre of the Solar System. A nearly perfect ball \
                    of hot plasma whose fusion core powers almost all life on Earth.",
                facts: &[
                    "The Sun holds 99.86% of the mass of the Solar System.",
                    "Light from the Sun takes about 8 minutes 20 seconds to reach Earth.",
                    "About 1.3 million Earths could fit inside the Sun.",
                    "The core reaches roughly 15 million °C.",
                ],
            },
        },
        CelestialBody::Mercury => BodyDescriptor {
            body,
            name: "Mercury",
            radius: 0.8,
            distance: 12.0,
            orbit_speed: 0.0415,
            rotation_speed: 0.004,
            tilt_deg: 0.03,
            roughness: 0.9,
            metalness: 0.1,
            texture: TextureKey::Mercury,
            atmosphere: None,
            rings: None,
            info: BodyInfo {
                diameter: "4,879 km",
                mass: "3.30 × 10^23 kg",
                temperature: "-173 to 427 °C",
                day_length: "59 Earth days",
                year_length: "88 Earth days",
                moons: 0,
                description: "The smallest planet and the closest to the Sun, a cratered world \
                    with almost no atmosphere to hold heat.",
                facts: &[
                    "A year on Mercury is shorter than its solar day.",
                    "Mercury is shrinking as its iron core cools.",
                    "Despite being closest to the Sun, it is not the hottest planet.",
                ],
            },
        },
        CelestialBody::Venus => BodyDescriptor {
            body,
            name: "Venus",
            radius: 1.2,
            distance: 17.0,
            orbit_speed: 0.0162,
            rotation_speed: -0.002,
            tilt_deg: 177.4,
            roughness: 0.8,
            metalness: 0.05,
            texture: TextureKey::Venus,
            atmosphere: Some(AtmosphereSpec { color: [1.0, 0.85, 0.55], opacity: 0.3, scale: 1.08 }),
            rings: None,
            info: BodyInfo {
                diameter: "12,104 km",
                mass: "4.87 × 10^24 kg",
                temperature: "465 °C",
                day_length: "243 Earth days",
                year_length: "225 Earth days",
                moons: 0,
                description: "Earth's cloud-wrapped twin in size, with a crushing carbon-dioxide \
                    atmosphere and a runaway greenhouse effect.",
                facts: &[
                    "Venus spins backwards compared to most planets.",
                    "It is the hottest planet in the Solar System.",
                    "Surface pressure is about 92 times that on Earth.",
                ],
            },
        },
        CelestialBody::Earth => BodyDescriptor {
            body,
            name: "Earth",
            radius: 1.3,
            distance: 23.0,
            orbit_speed: 0.01,
            rotation_speed: 0.02,
            tilt_deg: 23.44,
            roughness: 0.7,
            metalness: 0.1,
            texture: TextureKey::Earth,
            atmosphere: Some(AtmosphereSpec { color: [0.35, 0.6, 1.0], opacity: 0.25, scale: 1.06 }),
            rings: None,
            info: BodyInfo {
                diameter: "12,742 km",
                mass: "5.97 × 10^24 kg",
                temperature: "15 °C (average)",
                day_length: "24 hours",
                year_length: "365.25 days",
                moons: 1,
                description: "Our home planet, the only world known to host life, with liquid \
                    water covering about 71% of its surface.",
                facts: &[
                    "Earth is the densest planet in the Solar System.",
                    "Its rotation is slowing by about 1.7 ms per century.",
                    "The magnetic field shields the surface from the solar wind.",
                    "Earth is the only planet not named after a deity.",
                ],
            },
        },
        CelestialBody::Mars => BodyDescriptor {
            body,
            name: "Mars",
            radius: 1.0,
            distance: 30.0,
            orbit_speed: 0.0053,
            rotation_speed: 0.018,
            tilt_deg: 25.19,
            roughness: 0.95,
            metalness: 0.0,
            texture: TextureKey::Mars,
            atmosphere: Some(AtmosphereSpec { color: [1.0, 0.55, 0.35], opacity: 0.12, scale: 1.04 }),
            rings: None,
            info: BodyInfo {
                diameter: "6,779 km",
                mass: "6.42 × 10^23 kg",
                temperature: "-63 °C (average)",
                day_length: "24 hours 37 minutes",
                year_length: "687 Earth days",
                moons: 2,
                description: "The red planet: a cold desert world with polar ice caps, the \
                    tallest volcano and the deepest canyon in the Solar System.",
                facts: &[
                    "Olympus Mons is nearly three times the height of Everest.",
                    "Mars has seasons because its axis is tilted like Earth's.",
                    "Its red colour comes from iron oxide dust.",
                ],
            },
        },
        CelestialBody::Jupiter => BodyDescriptor {
            body,
            name: "Jupiter",
            radius: 3.2,
            distance: 54.0,
            orbit_speed: 0.00084,
            rotation_speed: 0.04,
            tilt_deg: 3.13,
            roughness: 0.6,
            metalness: 0.0,
            texture: TextureKey::Jupiter,
            atmosphere: None,
            rings: None,
            info: BodyInfo {
                diameter: "139,820 km",
                mass: "1.90 × 10^27 kg",
                temperature: "-108 °C (cloud tops)",
                day_length: "9 hours 56 minutes",
                year_length: "11.86 Earth years",
                moons: 95,
                description: "The largest planet, a gas giant with banded clouds and a storm \
                    larger than Earth that has raged for centuries.",
                facts: &[
                    "Jupiter has the shortest day of all the planets.",
                    "The Great Red Spot has been observed since at least 1830.",
                    "Its magnetic field is about 20,000 times stronger than Earth's.",
                ],
            },
        },
        CelestialBody::Saturn => BodyDescriptor {
            body,
            name: "Saturn",
            radius: 2.7,
            distance: 72.0,
            orbit_speed: 0.00034,
            rotation_speed: 0.038,
            tilt_deg: 26.73,
            roughness: 0.6,
            metalness: 0.0,
            texture: TextureKey::Saturn,
            atmosphere: None,
            rings: Some(RingSpec { inner: 3.4, outer: 6.2, texture: TextureKey::Ring }),
            info: BodyInfo {
                diameter: "116,460 km",
                mass: "5.68 × 10^26 kg",
                temperature: "-139 °C",
                day_length: "10 hours 42 minutes",
                year_length: "29.46 Earth years",
                moons: 146,
                description: "The ringed gas giant, light enough on average to float in water, \
                    circled by a vast system of ice and rock rings.",
                facts: &[
                    "The main rings are up to 280,000 km wide but often only 10 m thick.",
                    "Saturn is the least dense planet.",
                    "Its moon Titan has a thicker atmosphere than Earth.",
                ],
            },
        },
        CelestialBody::Uranus => BodyDescriptor {
            body,
            name: "Uranus",
            radius: 1.9,
            distance: 90.0,
            orbit_speed: 0.00012,
            rotation_speed: -0.03,
            tilt_deg: 97.77,
            roughness: 0.5,
            metalness: 0.0,
            texture: TextureKey::Uranus,
            atmosphere: Some(AtmosphereSpec { color: [0.6, 0.9, 1.0], opacity: 0.2, scale: 1.05 }),
            rings: Some(RingSpec { inner: 2.4, outer: 3.4, texture: TextureKey::UranusRing }),
            info: BodyInfo {
                diameter: "50,724 km",
                mass: "8.68 × 10^25 kg",
                temperature: "-197 °C",
                day_length: "17 hours 14 minutes",
                year_length: "84 Earth years",
                moons: 28,
                description: "An ice giant that rolls around the Sun on its side, tinted cyan by \
                    methane in its upper atmosphere.",
                facts: &[
                    "Uranus is tilted by almost 98 degrees.",
                    "Each pole gets around 42 years of continuous sunlight.",
                    "It was the first planet discovered with a telescope.",
                ],
            },
        },
        CelestialBody::Neptune => BodyDescriptor {
            body,
            name: "Neptune",
            radius: 1.85,
            distance: 105.0,
            orbit_speed: 0.00006,
            rotation_speed: 0.032,
            tilt_deg: 28.32,
            roughness: 0.5,
            metalness: 0.0,
            texture: TextureKey::Neptune,
            atmosphere: Some(AtmosphereSpec { color: [0.3, 0.45, 1.0], opacity: 0.2, scale: 1.05 }),
            rings: None,
            info: BodyInfo {
                diameter: "49,244 km",
                mass: "1.02 × 10^26 kg",
                temperature: "-201 °C",
                day_length: "16 hours 6 minutes",
                year_length: "164.8 Earth years",
                moons: 16,
                description: "The most distant planet, a windy deep-blue ice giant whose \
                    existence was predicted by mathematics before it was seen.",
                facts: &[
                    "Neptune has the fastest winds in the Solar System, over 2,000 km/h.",
                    "It completed its first observed orbit in 2011.",
                    "Triton, its largest moon, orbits backwards.",
                ],
            },
        },
        CelestialBody::Moon => BodyDescriptor {
            body,
            name: "Moon",
            radius: 0.35,
            distance: 2.6,
            orbit_speed: 0.037,
            rotation_speed: 0.037,
            tilt_deg: 6.68,
            roughness: 0.95,
            metalness: 0.0,
            texture: TextureKey::Moon,
            atmosphere: None,
            rings: None,
            info: BodyInfo {
                diameter: "3,475 km",
                mass: "7.35 × 10^22 kg",
                temperature: "-173 to 127 °C",
                day_length: "27.3 Earth days",
                year_length: "27.3 Earth days (around Earth)",
                moons: 0,
                description: "Earth's only natural satellite, tidally locked so the same face \
                    always points towards us.",
                facts: &[
                    "The Moon is drifting away from Earth by about 3.8 cm per year.",
                    "Twelve people have walked on its surface.",
                    "Its gravity drives most of Earth's ocean tides.",
                ],
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authored_descriptors_validate() {
        for d in descriptors() {
            d.validate().unwrap_or_else(|e| panic!("{}: {e}", d.name));
            assert!(!d.info.facts.is_empty(), "{} has no facts", d.name);
        }
    }

    #[test]
    fn nan_radius_is_rejected() {
        let mut d = descriptor(CelestialBody::Mars);
        d.radius = f64::NAN;
        assert!(matches!(
            d.validate(),
            Err(ConfigurationError::InvalidField { field: "radius", .. })
        ));
    }

    #[test]
    fn inverted_ring_is_rejected() {
        let mut d = descriptor(CelestialBody::Saturn);
        d.rings = Some(RingSpec { inner: 6.0, outer: 4.0, texture: TextureKey::Ring });
        assert!(matches!(d.validate(), Err(ConfigurationError::InvalidRing { .. })));
    }

    #[test]
    fn only_the_moon_has_a_parent() {
        for body in CelestialBody::ALL {
            let expected = (body == CelestialBody::Moon).then_some(CelestialBody::Earth);
            assert_eq!(body.parent_body(), expected);
        }
    }
}
