//! Scene graph assembly, world transforms and picking.
//!
//! Nodes live in an [`Arena`] and refer to each other by [`NodeId`]; a node
//! never owns its parent or children. Body nodes carry the index of the
//! [`BodyInstance`] that drives them, shells and rings reuse their body's
//! instance.

use std::collections::HashMap;
use std::f64::consts::TAU;
use std::sync::Arc;
use std::time::Instant;

use nalgebra::{Matrix3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::arena::{Arena, IdLike};
use crate::celestial::{BodyDescriptor, CelestialBody};
use crate::config::SceneConfig;
use crate::error::{ConfigurationError, Error};
use crate::generators::{TextureAtlas, TextureKey};
use crate::math::{body_orientation, ray_sphere, Ray};
use crate::orbit::{initial_phase, BodyInstance};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl IdLike for NodeId {
    fn from_raw(index: usize) -> Self {
        Self(index)
    }

    fn into_raw(self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Body,
    Atmosphere,
    Clouds,
    Ring,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeChildren {
    pub atmosphere: Option<NodeId>,
    pub clouds: Option<NodeId>,
    pub ring: Option<NodeId>,
    pub moon: Option<NodeId>,
}

/// Local transform inputs. `offset` is the orbital radius around the parent
/// (or the origin); shells have zero offset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalTransform {
    pub offset: f64,
    pub radius: f64,
    pub tilt_deg: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
    pub kind: NodeKind,
    pub body: CelestialBody,
    pub instance: usize,
    pub parent: Option<NodeId>,
    pub children: NodeChildren,
    pub local: LocalTransform,
    pub texture: Option<TextureKey>,
}

/// Flat annulus in the body's equatorial plane. UVs are remapped so `u` is
/// the radial fraction and `v` the angle fraction, matching how ring rasters
/// are laid out.
#[derive(Clone, Debug, PartialEq)]
pub struct RingMesh {
    pub node: NodeId,
    pub inner: f64,
    pub outer: f64,
    pub positions: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl RingMesh {
    pub fn new(node: NodeId, inner: f64, outer: f64, segments: usize) -> Self {
        let mut positions = Vec::with_capacity(segments * 2);
        let mut uvs = Vec::with_capacity(segments * 2);
        for i in 0..segments {
            let frac = i as f64 / segments as f64;
            let (s, c) = (frac * TAU).sin_cos();
            for r in [inner, outer] {
                positions.push([(r * c) as f32, 0.0, (r * s) as f32]);
                uvs.push([Self::u(inner, outer, r) as f32, frac as f32]);
            }
        }
        let mut indices = Vec::with_capacity(segments * 6);
        for i in 0..segments {
            let a = (2 * i) as u32;
            let b = (2 * ((i + 1) % segments)) as u32;
            indices.extend_from_slice(&[a, a + 1, b, b, a + 1, b + 1]);
        }
        Self { node, inner, outer, positions, uvs, indices }
    }

    fn u(inner: f64, outer: f64, r: f64) -> f64 {
        (r - inner) / (outer - inner)
    }

    /// Radial texture coordinate at distance `r` from the ring centre.
    pub fn u_at(&self, r: f64) -> f64 {
        Self::u(self.inner, self.outer, r)
    }

    /// [`Self::u_at`] as `(scale, offset)` for a radius measured in body
    /// radii: `u = scale * r + offset`. The ray-cast shader evaluates this.
    pub fn radial_map(&self, body_radius: f64) -> (f64, f64) {
        let offset = self.u_at(0.0);
        (self.u_at(body_radius) - offset, offset)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CloudLayer {
    pub texture: TextureKey,
    /// Longitude shift of the clouds against the surface, in turns.
    pub shift: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AtmosphereLayer {
    pub color: [f32; 3],
    pub opacity: f32,
    /// Shell radius in body radii.
    pub scale: f64,
}

/// Ring disc in body radii, with the radial texture mapping of its mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RingLayer {
    pub texture: TextureKey,
    pub inner: f64,
    pub outer: f64,
    pub u_scale: f64,
    pub u_offset: f64,
}

/// Everything drawn together with a body node, read from its children.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BodyLayers {
    pub clouds: Option<CloudLayer>,
    pub atmosphere: Option<AtmosphereLayer>,
    pub ring: Option<RingLayer>,
}

impl BodyLayers {
    /// Outermost drawn radius, in body radii.
    pub fn extent(&self) -> f64 {
        let ring = self.ring.map_or(1.0, |r| r.outer);
        let atmo = self.atmosphere.map_or(1.0, |a| a.scale);
        ring.max(atmo).max(1.0)
    }
}

/// Circle traced by one orbiting body, relative to `center` (or the origin).
#[derive(Clone, Debug, PartialEq)]
pub struct OrbitPath {
    pub body: CelestialBody,
    pub center: Option<NodeId>,
    pub radius: f64,
    pub points: Vec<Vector3<f64>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpectralClass {
    O,
    B,
    A,
    F,
    G,
    K,
    M,
}

impl SpectralClass {
    /// Rough share of naked-eye stars per class, used as sampling weights.
    const WEIGHTS: [(SpectralClass, f64); 7] = [
        (SpectralClass::O, 0.02),
        (SpectralClass::B, 0.10),
        (SpectralClass::A, 0.14),
        (SpectralClass::F, 0.16),
        (SpectralClass::G, 0.20),
        (SpectralClass::K, 0.24),
        (SpectralClass::M, 0.14),
    ];

    pub fn color(&self) -> [u8; 3] {
        match self {
            SpectralClass::O => [155, 176, 255],
            SpectralClass::B => [170, 191, 255],
            SpectralClass::A => [202, 215, 255],
            SpectralClass::F => [248, 247, 255],
            SpectralClass::G => [255, 244, 234],
            SpectralClass::K => [255, 210, 161],
            SpectralClass::M => [255, 204, 111],
        }
    }

    fn sample(rng: &mut StdRng) -> Self {
        let total: f64 = Self::WEIGHTS.iter().map(|(_, w)| w).sum();
        let mut pick = rng.gen_range(0.0..total);
        for (class, w) in Self::WEIGHTS {
            if pick < w {
                return class;
            }
            pick -= w;
        }
        SpectralClass::M
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Star {
    pub position: Vector3<f64>,
    pub class: SpectralClass,
    pub brightness: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Asteroid {
    pub position: Vector3<f64>,
    pub size: f32,
    pub shade: u8,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickHit {
    pub node: NodeId,
    pub body: CelestialBody,
    pub distance: f64,
}

const STAR_SALT: u64 = 0x5354_4152_4649_454c;
const BELT_SALT: u64 = 0x4245_4c54_4153_5452;

#[derive(Clone, Debug)]
pub struct Scene {
    nodes: Arena<NodeId, SceneNode>,
    descriptors: Vec<Arc<BodyDescriptor>>,
    /// Indexed like `descriptors` and the instances built from them.
    body_nodes: Vec<NodeId>,
    rings: Vec<RingMesh>,
    orbits: Vec<OrbitPath>,
    stars: Vec<Star>,
    asteroids: Vec<Asteroid>,
    atlas: TextureAtlas,
}

impl Scene {
    /// Assembles the full scene from validated descriptors and a generated
    /// atlas. Nothing is returned unless every node's texture is present.
    pub fn build(descriptors: &[BodyDescriptor], atlas: TextureAtlas, config: &SceneConfig) -> Result<Self, Error> {
        let _span = tracing::info_span!("build_scene", bodies = descriptors.len()).entered();
        let started = Instant::now();

        for d in descriptors {
            d.validate()?;
        }
        // Parents before satellites, so a satellite can always find its parent node.
        let mut ordered: Vec<&BodyDescriptor> = descriptors.iter().collect();
        ordered.sort_by_key(|d| d.body.parent_body().is_some());

        let mut scene = Scene {
            nodes: Arena::new(),
            descriptors: Vec::with_capacity(ordered.len()),
            body_nodes: Vec::with_capacity(ordered.len()),
            rings: Vec::new(),
            orbits: Vec::new(),
            stars: Vec::new(),
            asteroids: Vec::new(),
            atlas,
        };
        let mut by_body: HashMap<CelestialBody, NodeId> = HashMap::new();

        for d in ordered {
            if by_body.contains_key(&d.body) {
                return Err(ConfigurationError::InvalidSetting {
                    key: "descriptors",
                    reason: format!("{} is described twice", d.name),
                }
                .into());
            }
            let parent = match d.body.parent_body() {
                Some(p) => Some(*by_body.get(&p).ok_or_else(|| ConfigurationError::InvalidSetting {
                    key: "descriptors",
                    reason: format!("{} orbits {}, which is not in the scene", d.name, p.label()),
                })?),
                None => None,
            };
            let id = scene.add_body(d, parent, config)?;
            by_body.insert(d.body, id);
        }

        let seed = scene.atlas.spec().seed;
        scene.stars = starfield(seed, config);
        scene.asteroids = asteroid_belt(seed, config);

        tracing::info!(
            nodes = scene.nodes.len(),
            stars = scene.stars.len(),
            asteroids = scene.asteroids.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "scene built"
        );
        Ok(scene)
    }

    fn add_body(&mut self, d: &BodyDescriptor, parent: Option<NodeId>, config: &SceneConfig) -> Result<NodeId, Error> {
        let instance = self.descriptors.len();
        self.atlas.get(d.texture)?;
        let id = self.nodes.push(SceneNode {
            kind: NodeKind::Body,
            body: d.body,
            instance,
            parent,
            children: NodeChildren::default(),
            local: LocalTransform { offset: d.distance, radius: d.radius, tilt_deg: d.tilt_deg },
            texture: Some(d.texture),
        });

        let shell = |kind, radius, texture| SceneNode {
            kind,
            body: d.body,
            instance,
            parent: Some(id),
            children: NodeChildren::default(),
            local: LocalTransform { offset: 0.0, radius, tilt_deg: d.tilt_deg },
            texture,
        };

        if let Some(atmo) = d.atmosphere {
            let child = self.nodes.push(shell(NodeKind::Atmosphere, d.radius * atmo.scale as f64, None));
            self.nodes[id].children.atmosphere = Some(child);
        }
        if has_clouds(d.body) {
            self.atlas.get(TextureKey::EarthClouds)?;
            let child = self.nodes.push(shell(NodeKind::Clouds, d.radius * 1.02, Some(TextureKey::EarthClouds)));
            self.nodes[id].children.clouds = Some(child);
        }
        if let Some(ring) = d.rings {
            self.atlas.get(ring.texture)?;
            let child = self.nodes.push(shell(NodeKind::Ring, ring.outer as f64, Some(ring.texture)));
            self.nodes[id].children.ring = Some(child);
            self.rings.push(RingMesh::new(child, ring.inner as f64, ring.outer as f64, config.ring_segments));
        }
        if let Some(p) = parent {
            self.nodes[p].children.moon = Some(id);
        }
        if d.distance > 0.0 {
            self.orbits.push(OrbitPath {
                body: d.body,
                center: parent,
                radius: d.distance,
                points: circle_points(d.distance, config.orbit_segments),
            });
        }

        self.descriptors.push(Arc::new(d.clone()));
        self.body_nodes.push(id);
        Ok(id)
    }

    /// One live instance per body, in the scene's body order.
    pub fn spawn_instances(&self) -> Vec<BodyInstance> {
        self.descriptors
            .iter()
            .map(|d| BodyInstance::new(Arc::clone(d), initial_phase(d.body), has_clouds(d.body)))
            .collect()
    }

    pub fn nodes(&self) -> &Arena<NodeId, SceneNode> {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    pub fn descriptors(&self) -> &[Arc<BodyDescriptor>] {
        &self.descriptors
    }

    pub fn body_node(&self, body: CelestialBody) -> Option<NodeId> {
        self.body_nodes.iter().copied().find(|id| self.nodes[*id].body == body)
    }

    pub fn body_nodes(&self) -> &[NodeId] {
        &self.body_nodes
    }

    pub fn rings(&self) -> &[RingMesh] {
        &self.rings
    }

    pub fn ring_for(&self, body: CelestialBody) -> Option<&RingMesh> {
        self.rings.iter().find(|r| self.nodes[r.node].body == body)
    }

    pub fn orbits(&self) -> &[OrbitPath] {
        &self.orbits
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub fn asteroids(&self) -> &[Asteroid] {
        &self.asteroids
    }

    pub fn atlas(&self) -> &TextureAtlas {
        &self.atlas
    }

    /// World-space centre of a node: the parent's world position plus the
    /// node's own orbital offset. Shells and rings sit at their body's centre.
    pub fn world_position(&self, id: NodeId, instances: &[BodyInstance]) -> Vector3<f64> {
        let node = &self.nodes[id];
        let base = node
            .parent
            .map(|p| self.world_position(p, instances))
            .unwrap_or_else(Vector3::zeros);
        match node.kind {
            NodeKind::Body => base + orbit_offset(node.local.offset, instances[node.instance].orbit_angle),
            _ => base,
        }
    }

    pub fn body_position(&self, body: CelestialBody, instances: &[BodyInstance]) -> Option<Vector3<f64>> {
        self.body_node(body).map(|id| self.world_position(id, instances))
    }

    /// Orientation of a node: axial tilt applied after the spin (or cloud
    /// spin for cloud shells).
    pub fn rotation(&self, id: NodeId, instances: &[BodyInstance]) -> Matrix3<f64> {
        let node = &self.nodes[id];
        let inst = &instances[node.instance];
        let spin = match node.kind {
            NodeKind::Clouds => inst.cloud_angle.unwrap_or(inst.spin_angle),
            NodeKind::Ring => 0.0,
            _ => inst.spin_angle,
        };
        body_orientation(node.local.tilt_deg, spin)
    }

    /// Cloud, atmosphere and ring layers of a body node, taken from its child
    /// nodes and the ring mesh.
    pub fn layers(&self, id: NodeId, instances: &[BodyInstance]) -> BodyLayers {
        let node = &self.nodes[id];
        let inst = &instances[node.instance];
        let radius = node.local.radius;
        let clouds = node.children.clouds.and_then(|c| {
            let texture = self.nodes[c].texture?;
            let shift = inst.cloud_angle.map_or(0.0, |a| (inst.spin_angle - a) / TAU);
            Some(CloudLayer { texture, shift })
        });
        let atmosphere = node.children.atmosphere.and_then(|c| {
            let spec = inst.descriptor.atmosphere?;
            Some(AtmosphereLayer { color: spec.color, opacity: spec.opacity, scale: self.nodes[c].local.radius / radius })
        });
        let ring = node.children.ring.and_then(|c| {
            let texture = self.nodes[c].texture?;
            let mesh = self.rings.iter().find(|m| m.node == c)?;
            let (u_scale, u_offset) = mesh.radial_map(radius);
            Some(RingLayer { texture, inner: mesh.inner / radius, outer: mesh.outer / radius, u_scale, u_offset })
        });
        BodyLayers { clouds, atmosphere, ring }
    }

    /// Nearest body hit by `ray`. Shells and rings are not pickable.
    pub fn pick(&self, ray: &Ray, instances: &[BodyInstance]) -> Option<PickHit> {
        self.body_nodes
            .iter()
            .filter_map(|&id| {
                let node = &self.nodes[id];
                let center = self.world_position(id, instances);
                ray_sphere(ray, &center, node.local.radius)
                    .map(|distance| PickHit { node: id, body: node.body, distance })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

fn has_clouds(body: CelestialBody) -> bool {
    body == CelestialBody::Earth
}

/// Position on a circular orbit in the ecliptic (xz) plane, counter-clockwise
/// seen from +y.
pub fn orbit_offset(radius: f64, angle: f64) -> Vector3<f64> {
    let (s, c) = angle.sin_cos();
    Vector3::new(radius * c, 0.0, -radius * s)
}

pub fn circle_points(radius: f64, segments: usize) -> Vec<Vector3<f64>> {
    (0..=segments)
        .map(|i| orbit_offset(radius, TAU * i as f64 / segments as f64))
        .collect()
}

fn starfield(seed: u64, config: &SceneConfig) -> Vec<Star> {
    let mut rng = StdRng::seed_from_u64(seed ^ STAR_SALT);
    (0..config.star_count)
        .map(|_| {
            let y: f64 = rng.gen_range(-1.0..1.0);
            let theta: f64 = rng.gen_range(0.0..TAU);
            let ring = (1.0 - y * y).sqrt();
            let r = config.star_radius * rng.gen_range(1.0..1.15);
            let class = SpectralClass::sample(&mut rng);
            Star {
                position: Vector3::new(r * ring * theta.cos(), r * y, r * ring * theta.sin()),
                class,
                brightness: rng.gen_range(0.25f32..1.0).powi(2),
            }
        })
        .collect()
}

fn asteroid_belt(seed: u64, config: &SceneConfig) -> Vec<Asteroid> {
    let mut rng = StdRng::seed_from_u64(seed ^ BELT_SALT);
    (0..config.asteroid_count)
        .map(|_| {
            let angle: f64 = rng.gen_range(0.0..TAU);
            let r = rng.gen_range(config.belt_inner..config.belt_outer);
            let y = if config.belt_jitter > 0.0 {
                rng.gen_range(-config.belt_jitter..=config.belt_jitter)
            } else {
                0.0
            };
            Asteroid {
                position: orbit_offset(r, angle) + Vector3::new(0.0, y, 0.0),
                size: rng.gen_range(0.6f32..1.8),
                shade: rng.gen_range(90..170),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::celestial::{descriptor, descriptors};
    use crate::error::SceneInitError;
    use crate::texture::{Raster, TextureSpec};
    use proptest::prelude::*;

    fn stub_atlas(keys: &[TextureKey]) -> TextureAtlas {
        TextureAtlas::from_rasters(
            TextureSpec::default(),
            keys.iter().map(|k| (*k, Raster::new(1, 1, [128, 128, 128, 255]))),
        )
    }

    fn scene() -> Scene {
        Scene::build(&descriptors(), stub_atlas(&TextureKey::ALL), &SceneConfig::default()).unwrap()
    }

    #[test]
    fn builds_every_body_with_its_children() {
        let scene = scene();
        assert_eq!(scene.body_nodes().len(), CelestialBody::ALL.len());
        let earth = &scene.nodes()[scene.body_node(CelestialBody::Earth).unwrap()];
        assert!(earth.children.clouds.is_some());
        assert!(earth.children.atmosphere.is_some());
        assert_eq!(earth.children.moon, scene.body_node(CelestialBody::Moon));
        let saturn = &scene.nodes()[scene.body_node(CelestialBody::Saturn).unwrap()];
        assert!(saturn.children.ring.is_some());
        assert_eq!(scene.rings().len(), 2);
        // Everything but the Sun orbits.
        assert_eq!(scene.orbits().len(), CelestialBody::ALL.len() - 1);
        assert_eq!(scene.stars().len(), 6000);
        assert_eq!(scene.asteroids().len(), 1500);
    }

    #[test]
    fn missing_texture_is_a_scene_init_error() {
        let keys: Vec<_> = TextureKey::ALL.into_iter().filter(|k| *k != TextureKey::Ring).collect();
        let err = Scene::build(&descriptors(), stub_atlas(&keys), &SceneConfig::default()).unwrap_err();
        assert_eq!(err, Error::SceneInit(SceneInitError::MissingTexture(TextureKey::Ring)));
    }

    #[test]
    fn malformed_descriptor_is_a_configuration_error() {
        let mut bad = descriptors();
        bad[4].radius = f64::NAN;
        let err = Scene::build(&bad, stub_atlas(&TextureKey::ALL), &SceneConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Configuration(ConfigurationError::InvalidField { field: "radius", .. })));
    }

    #[test]
    fn moon_without_earth_is_rejected() {
        let only_moon = vec![descriptor(CelestialBody::Sun), descriptor(CelestialBody::Moon)];
        let err = Scene::build(&only_moon, stub_atlas(&TextureKey::ALL), &SceneConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Configuration(ConfigurationError::InvalidSetting { .. })));
    }

    #[test]
    fn moon_position_composes_through_earth() {
        let scene = scene();
        let mut instances = scene.spawn_instances();
        let earth = scene.body_node(CelestialBody::Earth).unwrap();
        let moon = scene.body_node(CelestialBody::Moon).unwrap();
        let moon_distance = descriptor(CelestialBody::Moon).distance;

        let before = scene.world_position(moon, &instances) - scene.world_position(earth, &instances);
        assert!((before.norm() - moon_distance).abs() < 1e-9);

        // Moving Earth carries the Moon along without touching its own angle.
        let earth_idx = scene.nodes()[earth].instance;
        instances[earth_idx].orbit_angle += 1.0;
        let after = scene.world_position(moon, &instances) - scene.world_position(earth, &instances);
        assert!((after - before).norm() < 1e-9);
    }

    #[test]
    fn pick_returns_nearest_body() {
        let scene = scene();
        let instances = scene.spawn_instances();
        let earth = scene.body_position(CelestialBody::Earth, &instances).unwrap();
        let origin = earth + Vector3::new(0.0, 50.0, 0.0);
        let ray = Ray::new(origin, earth - origin).unwrap();
        let hit = scene.pick(&ray, &instances).unwrap();
        assert_eq!(hit.body, CelestialBody::Earth);
        assert!((hit.distance - (50.0 - descriptor(CelestialBody::Earth).radius)).abs() < 1e-9);

        let away = Ray::new(origin, Vector3::new(0.0, 1.0, 0.0)).unwrap();
        assert_eq!(scene.pick(&away, &instances), None);
    }

    #[test]
    fn starfield_and_belt_are_seeded() {
        let a = scene();
        let b = scene();
        assert_eq!(a.stars(), b.stars());
        assert_eq!(a.asteroids(), b.asteroids());
        for rock in a.asteroids() {
            let planar = Vector3::new(rock.position.x, 0.0, rock.position.z).norm();
            assert!((42.0..48.0).contains(&planar), "{planar}");
            assert!(rock.position.y.abs() <= 0.6);
        }
    }

    #[test]
    fn layers_come_from_child_nodes() {
        let scene = scene();
        let mut instances = scene.spawn_instances();

        let saturn = scene.body_node(CelestialBody::Saturn).unwrap();
        let d = descriptor(CelestialBody::Saturn);
        let spec = d.rings.unwrap();
        let ring = scene.layers(saturn, &instances).ring.unwrap();
        assert_eq!(ring.texture, spec.texture);
        assert!((ring.inner - spec.inner as f64 / d.radius).abs() < 1e-9);
        assert!((ring.outer - spec.outer as f64 / d.radius).abs() < 1e-9);
        assert!(ring.u_offset.abs() > 0.0);
        assert!((ring.u_scale * ring.inner + ring.u_offset).abs() < 1e-9);
        assert!((ring.u_scale * ring.outer + ring.u_offset - 1.0).abs() < 1e-9);
        assert_eq!(scene.layers(saturn, &instances).extent(), ring.outer);

        let earth = scene.body_node(CelestialBody::Earth).unwrap();
        let atmo = descriptor(CelestialBody::Earth).atmosphere.unwrap();
        let idx = scene.nodes()[earth].instance;
        instances[idx].spin_angle = 1.0;
        instances[idx].cloud_angle = Some(0.5);
        let layers = scene.layers(earth, &instances);
        assert!((layers.atmosphere.unwrap().scale - atmo.scale as f64).abs() < 1e-6);
        let clouds = layers.clouds.unwrap();
        assert_eq!(clouds.texture, TextureKey::EarthClouds);
        assert!((clouds.shift - 0.5 / TAU).abs() < 1e-12);
        assert!(layers.ring.is_none());

        let mercury = scene.body_node(CelestialBody::Mercury).unwrap();
        assert_eq!(scene.layers(mercury, &instances), BodyLayers::default());
        assert_eq!(BodyLayers::default().extent(), 1.0);
    }

    #[test]
    fn orbit_paths_close() {
        let pts = circle_points(10.0, 64);
        assert_eq!(pts.len(), 65);
        assert!((pts[0] - pts[64]).norm() < 1e-9);
    }

    proptest! {
        #[test]
        fn ring_u_is_monotonic_in_radius(
            inner in 1.0f64..20.0,
            width in 0.1f64..20.0,
            segments in 8usize..256,
            a in 0.0f64..1.0,
            b in 0.0f64..1.0,
        ) {
            let outer = inner + width;
            let mesh = RingMesh::new(NodeId(0), inner, outer, segments);
            prop_assert_eq!(mesh.positions.len(), segments * 2);
            for (p, uv) in mesh.positions.iter().zip(&mesh.uvs) {
                let r = (p[0] as f64).hypot(p[2] as f64);
                prop_assert!((uv[0] as f64 - mesh.u_at(r)).abs() < 1e-3);
            }
            let (ra, rb) = (inner + a * width, inner + b * width);
            if ra < rb {
                prop_assert!(mesh.u_at(ra) < mesh.u_at(rb));
            }
            let body_radius = inner * 0.5;
            let (scale, offset) = mesh.radial_map(body_radius);
            prop_assert!((scale * ra / body_radius + offset - mesh.u_at(ra)).abs() < 1e-9);
            prop_assert_eq!(mesh.u_at(inner), 0.0);
            prop_assert!((mesh.u_at(outer) - 1.0).abs() < 1e-12);
        }
    }
}
