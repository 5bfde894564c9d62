//! The 3D universal-field visualization.
//!
//! Topology is fixed: six labelled phase-space nodes around a central unity
//! object, joined by five weighted connections, floating in a background
//! point cloud whose density follows the complexity level.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::{Vec2, Vec3};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    entities::{Connection, FieldParticle, PhaseSpaceNode},
    render::{
        CameraState, EffectPass, Fog, Light, Material, Mesh, Rgb, SceneCommand, SceneFrame,
    },
    sketches::{StatusSource, SurfaceStatus},
    Bounds, Complexity, FrameContext, FrameHandler, InputEvent, RenderParams,
};

const FIELD_EXTENT: f32 = 20.0;
const LABEL_LIFT: f32 = 2.0;
const FLOAT_SPEED: f32 = 2.0;
const FLOAT_ROTATION_INTENSITY: f32 = 0.5;
const FLOAT_INTENSITY: f32 = 0.5;

const NODES: [([f32; 3], &str, &str); 6] = [
    ([-3.0, 0.0, 0.0], "#4F46E5", "Physical Reality"),
    ([3.0, 0.0, 0.0], "#7C3AED", "Consciousness"),
    ([0.0, 3.0, 0.0], "#EC4899", "Quantum Realm"),
    ([0.0, -3.0, 0.0], "#10B981", "Information"),
    ([2.0, 2.0, 2.0], "#F59E0B", "Emergence"),
    ([-2.0, -2.0, -2.0], "#EF4444", "Entropy"),
];

const CONNECTIONS: [([f32; 3], [f32; 3], f32); 5] = [
    ([-3.0, 0.0, 0.0], [3.0, 0.0, 0.0], 0.8),
    ([0.0, 3.0, 0.0], [0.0, -3.0, 0.0], 0.6),
    ([2.0, 2.0, 2.0], [-2.0, -2.0, -2.0], 0.4),
    ([-3.0, 0.0, 0.0], [0.0, 3.0, 0.0], 0.7),
    ([3.0, 0.0, 0.0], [0.0, -3.0, 0.0], 0.5),
];

/// Orbit/zoom camera around a fixed target. There is no pan; the target
/// never moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    target: Vec3,
    radius: f32,
    azimuth: f32,
    polar: f32,
    fov_degrees: f32,
}

impl OrbitCamera {
    const ORBIT_SPEED: f32 = 0.005;
    const ZOOM_STEP: f32 = 0.95;
    const MIN_RADIUS: f32 = 2.0;
    const MAX_RADIUS: f32 = 50.0;
    const POLAR_EPSILON: f32 = 0.01;

    pub fn new() -> Self {
        Self {
            target: Vec3::ZERO,
            radius: 10.0,
            azimuth: 0.0,
            polar: FRAC_PI_2,
            fov_degrees: 60.0,
        }
    }

    /// Rotates around the target by a pointer drag of `delta` pixels.
    pub fn orbit(&mut self, delta: Vec2) {
        self.azimuth -= delta.x * Self::ORBIT_SPEED;
        self.polar = (self.polar - delta.y * Self::ORBIT_SPEED)
            .clamp(Self::POLAR_EPSILON, PI - Self::POLAR_EPSILON);
    }

    /// Positive `delta` zooms out, negative zooms in.
    pub fn zoom(&mut self, delta: f32) {
        let factor = if delta > 0.0 {
            1.0 / Self::ZOOM_STEP
        } else if delta < 0.0 {
            Self::ZOOM_STEP
        } else {
            1.0
        };
        self.radius = (self.radius * factor).clamp(Self::MIN_RADIUS, Self::MAX_RADIUS);
    }

    pub fn position(&self) -> Vec3 {
        let (sin_polar, cos_polar) = self.polar.sin_cos();
        let (sin_az, cos_az) = self.azimuth.sin_cos();
        self.target + Vec3::new(sin_polar * sin_az, cos_polar, sin_polar * cos_az) * self.radius
    }

    pub fn state(&self) -> CameraState {
        CameraState {
            position: self.position(),
            target: self.target,
            fov_degrees: self.fov_degrees,
        }
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new()
    }
}

/// Scene composer for the field visualization.
#[derive(Debug)]
pub struct FieldScene {
    nodes: Vec<PhaseSpaceNode>,
    connections: Vec<Connection>,
    field: Vec<FieldParticle>,
    field_complexity: Option<Complexity>,
    regenerations: u32,
    params: RenderParams,
    camera: OrbitCamera,
    rng: StdRng,
}

impl FieldScene {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            nodes: NODES
                .iter()
                .map(|(position, color, label)| {
                    PhaseSpaceNode::new(Vec3::from(*position), Rgb::from_hex(color), *label)
                })
                .collect(),
            connections: CONNECTIONS
                .iter()
                .map(|(start, end, strength)| {
                    Connection::new(Vec3::from(*start), Vec3::from(*end), *strength)
                })
                .collect(),
            field: Vec::new(),
            field_complexity: None,
            regenerations: 0,
            params: RenderParams::default(),
            camera: OrbitCamera::new(),
            rng,
        }
    }

    pub fn nodes(&self) -> &[PhaseSpaceNode] {
        &self.nodes
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn field(&self) -> &[FieldParticle] {
        &self.field
    }

    /// How many times the background field has been generated.
    pub fn regenerations(&self) -> u32 {
        self.regenerations
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    fn regenerate_field(&mut self) {
        let count = self.params.field_particle_count;
        let half = FIELD_EXTENT * 0.5;
        let rng = &mut self.rng;
        self.field = (0..count)
            .map(|_| FieldParticle {
                position: Vec3::new(
                    rng.gen_range(-half..half),
                    rng.gen_range(-half..half),
                    rng.gen_range(-half..half),
                ),
                color: Rgb([
                    rng.gen::<f32>() * 0.5 + 0.5,
                    rng.gen::<f32>() * 0.5 + 0.5,
                    rng.gen::<f32>() * 0.5 + 0.5,
                ]),
            })
            .collect();
        self.field_complexity = Some(self.params.complexity);
        self.regenerations += 1;
        tracing::info!(
            complexity = %self.params.complexity,
            count,
            "background field regenerated"
        );
    }

    fn set_hover(&mut self, index: usize, hovered: bool) {
        if let Some(node) = self.nodes.get_mut(index) {
            node.set_hovered(hovered);
        }
    }

    fn compose(&self, elapsed: f32) -> SceneFrame {
        let mut commands = Vec::with_capacity(self.nodes.len() * 2 + self.connections.len() + 2);

        commands.push(SceneCommand::PointCloud {
            positions: self.field.iter().map(|p| p.position).collect(),
            colors: self.field.iter().map(|p| p.color).collect(),
            size: 0.05,
            opacity: 0.6,
        });

        let gold = Rgb::from_hex("#FFD700");
        commands.push(SceneCommand::Mesh {
            mesh: Mesh::Dodecahedron { radius: 0.5 },
            position: Vec3::ZERO,
            rotation: Vec3::new(0.1, 0.15, 0.2) * elapsed,
            scale: 1.0,
            material: Material {
                color: gold,
                emissive: Some((gold, 0.5)),
                opacity: 1.0,
                roughness: 0.2,
                metalness: 0.8,
                distort: None,
            },
        });

        for (index, node) in self.nodes.iter().enumerate() {
            let (bob, sway) = float_offset(elapsed, index as f32, self.params.motion_scale);
            let position = node.position + bob;
            commands.push(SceneCommand::Mesh {
                mesh: Mesh::Sphere {
                    radius: 1.0,
                    segments: 32,
                },
                position,
                rotation: PhaseSpaceNode::rotation(elapsed) + sway,
                scale: node.scale(),
                material: Material {
                    color: node.color,
                    emissive: None,
                    opacity: 0.7,
                    roughness: 0.2,
                    metalness: 0.8,
                    distort: Some((0.3, 2.0)),
                },
            });
            if node.is_hovered() {
                commands.push(SceneCommand::Label {
                    position: position + Vec3::Y * LABEL_LIFT,
                    text: node.label.clone(),
                    size: 0.5,
                    color: Rgb([1.0, 1.0, 1.0]),
                });
            }
        }

        if self.params.show_connections {
            for connection in &self.connections {
                let strength = connection.strength();
                commands.push(SceneCommand::Curve {
                    points: connection.curve().to_vec(),
                    color: Rgb::from_hsl(strength * 360.0, 0.7, 0.5),
                    width: strength * 3.0,
                    opacity: 0.6,
                });
            }
        }

        let effects = if self.params.post_processing {
            vec![
                EffectPass::Bloom {
                    luminance_threshold: 0.5,
                    luminance_smoothing: 0.9,
                    height: 300,
                },
                EffectPass::ChromaticAberration {
                    offset: Vec2::splat(0.001),
                },
            ]
        } else {
            Vec::new()
        };

        let background = Rgb::from_hex("#000011");
        SceneFrame {
            background,
            fog: Fog {
                color: background,
                near: 5.0,
                far: 25.0,
            },
            camera: self.camera.state(),
            lights: vec![
                Light::Ambient { intensity: 0.5 },
                Light::Point {
                    position: Vec3::splat(10.0),
                    intensity: 1.0,
                },
                Light::Point {
                    position: Vec3::splat(-10.0),
                    intensity: 0.5,
                },
            ],
            commands,
            effects,
        }
    }
}

impl Default for FieldScene {
    fn default() -> Self {
        Self::new()
    }
}

/// Gentle floating motion: a vertical bob and a small sway rotation.
fn float_offset(elapsed: f32, phase: f32, motion_scale: f32) -> (Vec3, Vec3) {
    let t = (elapsed + phase) / 4.0 * FLOAT_SPEED;
    let (sin_t, cos_t) = t.sin_cos();
    let bob = Vec3::Y * (sin_t / 10.0 * FLOAT_INTENSITY * motion_scale);
    let sway = Vec3::new(cos_t / 8.0, sin_t / 8.0, sin_t / 20.0)
        * (FLOAT_ROTATION_INTENSITY * motion_scale);
    (bob, sway)
}

impl FrameHandler for FieldScene {
    type Frame = SceneFrame;

    fn setup(&mut self, _bounds: Bounds, params: &RenderParams) {
        self.params = *params;
        self.camera = OrbitCamera::new();
        self.regenerate_field();
    }

    fn input(&mut self, event: &InputEvent, _bounds: Bounds) {
        match *event {
            InputEvent::PointerEnter(index) => self.set_hover(index, true),
            InputEvent::PointerLeave(index) => self.set_hover(index, false),
            InputEvent::PointerDrag { delta, .. } if self.params.interactive => {
                self.camera.orbit(delta);
            }
            InputEvent::Wheel { delta } if self.params.interactive => self.camera.zoom(delta),
            _ => {}
        }
    }

    // The scene lives in world space; only the viewport changes.
    fn resize(&mut self, _previous: Bounds, _current: Bounds) {}

    fn reconfigure(&mut self, params: &RenderParams) {
        self.params = *params;
        if self.field_complexity != Some(params.complexity) {
            self.regenerate_field();
        }
    }

    fn frame(&mut self, ctx: &FrameContext<'_>) -> SceneFrame {
        let dt = ctx.clock.delta() as f32;
        for node in &mut self.nodes {
            node.animate(dt);
        }
        self.compose(ctx.clock.elapsed() as f32)
    }
}

impl StatusSource for FieldScene {
    fn status(&self) -> SurfaceStatus {
        SurfaceStatus::Field {
            complexity: self.params.complexity,
            points: self.field.len(),
            connections: if self.params.show_connections {
                self.connections.len()
            } else {
                0
            },
            hovered: self
                .nodes
                .iter()
                .find(|node| node.is_hovered())
                .map(|node| node.label.clone()),
        }
    }
}
