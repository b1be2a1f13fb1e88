//! GPU sphere rendering.
//!
//! Every body is ray-cast on a full-screen quad covering its own screen rect:
//! surface texture, day-side shading with roughness/metalness, cloud shell,
//! atmosphere rim and ring disc. The Sun is drawn emissive.

use eframe::glow;
use glow::HasContext as _;
use nalgebra::{Matrix3, Vector3};
use std::collections::HashMap;

use solar_viz::error::SceneInitError;
use solar_viz::generators::{TextureAtlas, TextureKey};
use solar_viz::scene::BodyLayers;
use solar_viz::texture::Raster;

const SHADER_VERSION: &str = "#version 330";

/// Per-body inputs for one paint call. Directions are in the body's local
/// frame; lengths are in body radii.
#[derive(Clone, Copy, Debug)]
pub struct BodyDraw {
    pub texture: TextureKey,
    pub inv_rotation: Matrix3<f64>,
    pub sun_dir: Vector3<f64>,
    /// Body radius as a fraction of the rect's half-size.
    pub scale: f32,
    pub roughness: f32,
    pub metalness: f32,
    pub emissive: bool,
    pub layers: BodyLayers,
}

pub struct SolarRenderer {
    program: glow::Program,
    vertex_array: glow::VertexArray,
    textures: HashMap<TextureKey, glow::Texture>,
}

impl SolarRenderer {
    pub fn new(gl: &glow::Context) -> Result<Self, SceneInitError> {
        unsafe {
            let program = gl
                .create_program()
                .map_err(|reason| SceneInitError::Gpu { what: "program", reason })?;

            let vertex_shader_source = r#"
                const vec2 verts[4] = vec2[4](
                    vec2(-1.0, -1.0),
                    vec2( 1.0, -1.0),
                    vec2(-1.0,  1.0),
                    vec2( 1.0,  1.0)
                );
                out vec2 v_uv;
                void main() {
                    v_uv = verts[gl_VertexID] * 0.5 + 0.5;
                    gl_Position = vec4(verts[gl_VertexID], 0.0, 1.0);
                }
            "#;

            let fragment_shader_source = r#"
                precision highp float;
                in vec2 v_uv;
                out vec4 out_color;

                uniform sampler2D u_texture;
                uniform sampler2D u_clouds;
                uniform sampler2D u_ring_texture;
                uniform mat3 u_inv_rotation;
                uniform float u_scale;
                uniform vec3 u_sun_dir;
                uniform float u_roughness;
                uniform float u_metalness;
                uniform float u_emissive;
                uniform float u_has_clouds;
                uniform float u_cloud_shift;
                uniform float u_has_atmosphere;
                uniform vec3 u_atmo_color;
                uniform float u_atmo_opacity;
                uniform float u_atmo_scale;
                uniform float u_has_rings;
                uniform float u_ring_inner;
                uniform float u_ring_outer;
                uniform float u_ring_u_scale;
                uniform float u_ring_u_offset;

                const float PI = 3.14159265359;

                void main() {
                    vec2 centered = (v_uv - 0.5) * 2.0 / u_scale;

                    vec3 O = u_inv_rotation * vec3(centered.x, centered.y, 0.0);
                    vec3 D = u_inv_rotation * vec3(0.0, 0.0, -1.0);

                    float B = 2.0 * dot(O, D);
                    float C = dot(O, O) - 1.0;
                    float discriminant = B * B - 4.0 * C;
                    bool hit = discriminant >= 0.0;
                    float t_sphere = hit ? (-B - sqrt(discriminant)) * 0.5 : 1e10;

                    float ring_alpha = 0.0;
                    vec3 ring_color = vec3(0.0);
                    float t_ring = 1e10;
                    if (u_has_rings > 0.5 && abs(D.y) > 0.0001) {
                        float t_disc = -O.y / D.y;
                        vec3 rh = O + t_disc * D;
                        float r = length(vec2(rh.x, rh.z));
                        if (r >= u_ring_inner && r <= u_ring_outer) {
                            float ru = u_ring_u_scale * r + u_ring_u_offset;
                            vec4 rs = texture(u_ring_texture, vec2(ru, 0.5));
                            float lit = u_emissive > 0.5 ? 1.0 : 0.35 + 0.65 * abs(u_sun_dir.y);
                            ring_color = rs.rgb * lit;
                            ring_alpha = rs.a;
                            t_ring = t_disc;
                        }
                    }
                    bool ring_in_front = ring_alpha > 0.01 && t_ring < t_sphere;

                    if (!hit) {
                        float screen_dist = length(centered);
                        float glow = 0.0;
                        if (u_has_atmosphere > 0.5 && screen_dist < u_atmo_scale) {
                            float depth = clamp((screen_dist - 1.0) / (u_atmo_scale - 1.0), 0.0, 1.0);
                            glow = pow(1.0 - depth, 2.0) * u_atmo_opacity;
                        }
                        if (ring_alpha < 0.01 && glow < 0.01) { discard; }
                        float a = ring_alpha + glow * (1.0 - ring_alpha);
                        vec3 c = (ring_color * ring_alpha + u_atmo_color * glow * (1.0 - ring_alpha)) / max(a, 0.0001);
                        out_color = vec4(c, a);
                        return;
                    }

                    vec3 p = O + t_sphere * D;
                    vec3 normal = normalize(p);
                    float lat = asin(clamp(p.y, -1.0, 1.0));
                    float lon = atan(-p.z, p.x);
                    float tex_u = (lon + PI) / (2.0 * PI);
                    float tex_v = (PI / 2.0 - lat) / PI;

                    vec3 albedo = texture(u_texture, vec2(tex_u, tex_v)).rgb;
                    if (u_has_clouds > 0.5) {
                        float cloud = texture(u_clouds, vec2(fract(tex_u + u_cloud_shift), tex_v)).a;
                        albedo = mix(albedo, vec3(1.0), cloud);
                    }

                    vec3 color;
                    if (u_emissive > 0.5) {
                        float limb = pow(max(dot(normal, -D), 0.0), 0.4);
                        color = albedo * (0.75 + 0.35 * limb);
                    } else {
                        vec3 V = -D;
                        vec3 L = u_sun_dir;
                        float diffuse = max(dot(normal, L), 0.0);
                        float shininess = mix(64.0, 4.0, u_roughness);
                        float spec = pow(max(dot(reflect(-L, normal), V), 0.0), shininess) * (1.0 - u_roughness) * 0.5;
                        vec3 spec_color = mix(vec3(1.0), albedo, u_metalness);
                        color = albedo * (0.06 + 0.94 * diffuse) * (1.0 - 0.5 * u_metalness) + spec_color * spec * step(0.0, diffuse);
                    }

                    if (u_has_atmosphere > 0.5) {
                        float fresnel = pow(1.0 - max(dot(normal, -D), 0.0), 3.0);
                        float sun_side = u_emissive > 0.5 ? 1.0 : max(dot(normal, u_sun_dir) + 0.3, 0.0);
                        color = mix(color, u_atmo_color * sun_side, fresnel * u_atmo_opacity);
                    }

                    if (ring_in_front) {
                        color = mix(color, ring_color, ring_alpha);
                    }

                    out_color = vec4(color, 1.0);
                }
            "#;

            let shader_sources = [
                (glow::VERTEX_SHADER, vertex_shader_source),
                (glow::FRAGMENT_SHADER, fragment_shader_source),
            ];

            let mut shaders = Vec::with_capacity(shader_sources.len());
            for (shader_type, shader_source) in shader_sources {
                let shader = gl
                    .create_shader(shader_type)
                    .map_err(|reason| SceneInitError::Gpu { what: "shader", reason })?;
                gl.shader_source(shader, &format!("{SHADER_VERSION}\n{shader_source}"));
                gl.compile_shader(shader);
                if !gl.get_shader_compile_status(shader) {
                    let log = gl.get_shader_info_log(shader);
                    gl.delete_shader(shader);
                    gl.delete_program(program);
                    return Err(SceneInitError::Shader(log));
                }
                gl.attach_shader(program, shader);
                shaders.push(shader);
            }

            gl.link_program(program);
            let linked = gl.get_program_link_status(program);
            for shader in shaders {
                gl.detach_shader(program, shader);
                gl.delete_shader(shader);
            }
            if !linked {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(SceneInitError::Shader(log));
            }

            let vertex_array = gl
                .create_vertex_array()
                .map_err(|reason| SceneInitError::Gpu { what: "vertex array", reason })?;

            Ok(Self { program, vertex_array, textures: HashMap::new() })
        }
    }

    /// Uploads every raster in the atlas. Ring rasters clamp in both
    /// directions, surfaces repeat around the body.
    pub fn upload_atlas(&mut self, gl: &glow::Context, atlas: &TextureAtlas) -> Result<(), SceneInitError> {
        for (key, raster) in atlas.iter() {
            let wrap_s = match key {
                TextureKey::Ring | TextureKey::UranusRing => glow::CLAMP_TO_EDGE,
                _ => glow::REPEAT,
            };
            self.upload_texture(gl, key, raster, wrap_s)?;
        }
        tracing::info!(textures = self.textures.len(), "textures uploaded to GPU");
        Ok(())
    }

    fn upload_texture(&mut self, gl: &glow::Context, key: TextureKey, raster: &Raster, wrap_s: u32) -> Result<(), SceneInitError> {
        if self.textures.contains_key(&key) {
            return Ok(());
        }
        unsafe {
            let texture = gl
                .create_texture()
                .map_err(|reason| SceneInitError::Gpu { what: "texture", reason })?;
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            let pixels = raster.as_bytes();
            gl.tex_image_2d(
                glow::TEXTURE_2D, 0, glow::RGBA as i32,
                raster.width as i32, raster.height as i32, 0,
                glow::RGBA, glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(&pixels)),
            );
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, wrap_s as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
            self.textures.insert(key, texture);
        }
        Ok(())
    }

    pub fn paint(&self, gl: &glow::Context, draw: &BodyDraw) {
        let Some(texture) = self.textures.get(&draw.texture).copied() else { return };
        let layers = &draw.layers;
        let cloud_tex = layers.clouds.and_then(|c| self.textures.get(&c.texture).copied());
        let ring_tex = layers.ring.and_then(|r| self.textures.get(&r.texture).copied());

        unsafe {
            gl.use_program(Some(self.program));
            gl.bind_vertex_array(Some(self.vertex_array));

            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.uniform_1_i32(gl.get_uniform_location(self.program, "u_texture").as_ref(), 0);

            gl.active_texture(glow::TEXTURE1);
            gl.bind_texture(glow::TEXTURE_2D, Some(cloud_tex.unwrap_or(texture)));
            gl.uniform_1_i32(gl.get_uniform_location(self.program, "u_clouds").as_ref(), 1);
            self.set_flag(gl, "u_has_clouds", cloud_tex.is_some());
            let shift = layers.clouds.map_or(0.0, |c| c.shift as f32);
            gl.uniform_1_f32(gl.get_uniform_location(self.program, "u_cloud_shift").as_ref(), shift);

            gl.active_texture(glow::TEXTURE2);
            gl.bind_texture(glow::TEXTURE_2D, Some(ring_tex.unwrap_or(texture)));
            gl.uniform_1_i32(gl.get_uniform_location(self.program, "u_ring_texture").as_ref(), 2);
            self.set_flag(gl, "u_has_rings", ring_tex.is_some());
            let ring = layers.ring;
            let (ring_inner, ring_outer) = ring.map_or((0.0, 0.0), |r| (r.inner as f32, r.outer as f32));
            let (u_scale, u_offset) = ring.map_or((0.0, 0.0), |r| (r.u_scale as f32, r.u_offset as f32));
            gl.uniform_1_f32(gl.get_uniform_location(self.program, "u_ring_inner").as_ref(), ring_inner);
            gl.uniform_1_f32(gl.get_uniform_location(self.program, "u_ring_outer").as_ref(), ring_outer);
            gl.uniform_1_f32(gl.get_uniform_location(self.program, "u_ring_u_scale").as_ref(), u_scale);
            gl.uniform_1_f32(gl.get_uniform_location(self.program, "u_ring_u_offset").as_ref(), u_offset);

            let rot = &draw.inv_rotation;
            let rot_data: [f32; 9] = [
                rot[(0, 0)] as f32, rot[(1, 0)] as f32, rot[(2, 0)] as f32,
                rot[(0, 1)] as f32, rot[(1, 1)] as f32, rot[(2, 1)] as f32,
                rot[(0, 2)] as f32, rot[(1, 2)] as f32, rot[(2, 2)] as f32,
            ];
            gl.uniform_matrix_3_f32_slice(
                gl.get_uniform_location(self.program, "u_inv_rotation").as_ref(),
                false,
                &rot_data,
            );

            gl.uniform_1_f32(gl.get_uniform_location(self.program, "u_scale").as_ref(), draw.scale);
            let sun = draw.sun_dir;
            gl.uniform_3_f32(gl.get_uniform_location(self.program, "u_sun_dir").as_ref(), sun.x as f32, sun.y as f32, sun.z as f32);
            gl.uniform_1_f32(gl.get_uniform_location(self.program, "u_roughness").as_ref(), draw.roughness);
            gl.uniform_1_f32(gl.get_uniform_location(self.program, "u_metalness").as_ref(), draw.metalness);
            self.set_flag(gl, "u_emissive", draw.emissive);

            self.set_flag(gl, "u_has_atmosphere", layers.atmosphere.is_some());
            let (color, opacity, scale) = layers.atmosphere.map_or(([0.0; 3], 0.0, 1.0), |a| (a.color, a.opacity, a.scale as f32));
            gl.uniform_3_f32(gl.get_uniform_location(self.program, "u_atmo_color").as_ref(), color[0], color[1], color[2]);
            gl.uniform_1_f32(gl.get_uniform_location(self.program, "u_atmo_opacity").as_ref(), opacity);
            gl.uniform_1_f32(gl.get_uniform_location(self.program, "u_atmo_scale").as_ref(), scale.max(1.0001));

            gl.enable(glow::BLEND);
            gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);

            gl.draw_arrays(glow::TRIANGLE_STRIP, 0, 4);
        }
    }

    unsafe fn set_flag(&self, gl: &glow::Context, name: &str, on: bool) {
        gl.uniform_1_f32(gl.get_uniform_location(self.program, name).as_ref(), if on { 1.0 } else { 0.0 });
    }

    /// Releases every texture, then the program and vertex array.
    pub fn destroy(&mut self, gl: &glow::Context) {
        unsafe {
            for (_, texture) in self.textures.drain() {
                gl.delete_texture(texture);
            }
            gl.delete_program(self.program);
            gl.delete_vertex_array(self.vertex_array);
        }
    }
}
