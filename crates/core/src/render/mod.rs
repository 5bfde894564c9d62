//! Draw-command types and the renderer seam.
//!
//! Scene composers never talk to a graphics API. Each frame they build a plain
//! list of typed commands, a [`DrawList`] for the 2D sketches or a
//! [`SceneFrame`] for the field visualization, and the host hands that list to
//! a [`Renderer`].

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Colour in one of the two spaces the sketches paint with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Color {
    /// 8-bit RGB channels plus alpha in `0..=255`.
    Rgba { r: u8, g: u8, b: u8, a: f32 },
    /// Hue in degrees, saturation/brightness in `0..=255`, alpha in `0..=255`.
    Hsba { h: f32, s: f32, b: f32, a: f32 },
}

impl Color {
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::Rgba { r, g, b, a: 255.0 }
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self::Rgba {
            r,
            g,
            b,
            a: a.clamp(0.0, 255.0),
        }
    }

    pub fn hsba(h: f32, s: f32, b: f32, a: f32) -> Self {
        Self::Hsba {
            h: h.rem_euclid(360.0),
            s,
            b,
            a: a.clamp(0.0, 255.0),
        }
    }

    /// Same colour with a different alpha.
    pub fn with_alpha(self, alpha: f32) -> Self {
        let a = alpha.clamp(0.0, 255.0);
        match self {
            Self::Rgba { r, g, b, .. } => Self::Rgba { r, g, b, a },
            Self::Hsba { h, s, b, .. } => Self::Hsba { h, s, b, a },
        }
    }

    pub fn alpha(&self) -> f32 {
        match self {
            Self::Rgba { a, .. } | Self::Hsba { a, .. } => *a,
        }
    }
}

/// Linear RGB triple in `0..=1`, used by the 3D scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb(pub [f32; 3]);

impl Rgb {
    /// Parses a `#rrggbb` literal. Anything else yields black.
    pub fn from_hex(hex: &str) -> Self {
        let digits = hex.trim_start_matches('#');
        let channel = |range: std::ops::Range<usize>| {
            digits
                .get(range)
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .map(|v| f32::from(v) / 255.0)
                .unwrap_or(0.0)
        };
        Self([channel(0..2), channel(2..4), channel(4..6)])
    }

    /// Converts HSL (hue in degrees, saturation and lightness in `0..=1`).
    pub fn from_hsl(hue: f32, saturation: f32, lightness: f32) -> Self {
        let h = hue.rem_euclid(360.0) / 60.0;
        let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = lightness - c * 0.5;
        Self([r + m, g + m, b + m])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: Color,
    pub weight: f32,
}

/// Fill and outline for a closed shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Paint {
    pub fill: Option<Color>,
    pub stroke: Option<Stroke>,
}

impl Paint {
    pub fn fill(color: Color) -> Self {
        Self {
            fill: Some(color),
            stroke: None,
        }
    }

    pub fn stroke(color: Color, weight: f32) -> Self {
        Self {
            fill: None,
            stroke: Some(Stroke { color, weight }),
        }
    }

    pub fn with_stroke(mut self, color: Color, weight: f32) -> Self {
        self.stroke = Some(Stroke { color, weight });
        self
    }
}

/// Immediate-mode 2D drawing command. Coordinates are surface-local.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command2d {
    Clear(Color),
    Line {
        from: Vec2,
        to: Vec2,
        stroke: Stroke,
    },
    /// Open polyline; each vertex carries the stroke used for the segment
    /// leading into it.
    Polyline {
        points: Vec<Vec2>,
        strokes: Vec<Stroke>,
    },
    Circle {
        center: Vec2,
        diameter: f32,
        paint: Paint,
    },
    Ellipse {
        center: Vec2,
        width: f32,
        height: f32,
        paint: Paint,
    },
    /// Elliptical arc from `start` to `stop` radians, clockwise in screen space.
    Arc {
        center: Vec2,
        width: f32,
        height: f32,
        start: f32,
        stop: f32,
        stroke: Stroke,
    },
    Rect {
        origin: Vec2,
        size: Vec2,
        radius: f32,
        fill: Color,
    },
    /// Text centred on `position`.
    Text {
        position: Vec2,
        text: String,
        size: f32,
        color: Color,
    },
}

/// One frame worth of 2D commands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawList {
    commands: Vec<Command2d>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[Command2d] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn push(&mut self, command: Command2d) {
        self.commands.push(command);
    }

    pub fn clear_with(&mut self, color: Color) {
        self.push(Command2d::Clear(color));
    }

    pub fn line(&mut self, from: Vec2, to: Vec2, color: Color, weight: f32) {
        self.push(Command2d::Line {
            from,
            to,
            stroke: Stroke { color, weight },
        });
    }

    pub fn circle(&mut self, center: Vec2, diameter: f32, paint: Paint) {
        self.push(Command2d::Circle {
            center,
            diameter,
            paint,
        });
    }

    pub fn ellipse(&mut self, center: Vec2, width: f32, height: f32, paint: Paint) {
        self.push(Command2d::Ellipse {
            center,
            width,
            height,
            paint,
        });
    }

    pub fn rect(&mut self, origin: Vec2, size: Vec2, radius: f32, fill: Color) {
        self.push(Command2d::Rect {
            origin,
            size,
            radius,
            fill,
        });
    }

    pub fn text(&mut self, position: Vec2, text: impl Into<String>, size: f32, color: Color) {
        self.push(Command2d::Text {
            position,
            text: text.into(),
            size,
            color,
        });
    }
}

/// Material description for meshes in the 3D scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub color: Rgb,
    pub emissive: Option<(Rgb, f32)>,
    pub opacity: f32,
    pub roughness: f32,
    pub metalness: f32,
    /// Vertex distortion amount and speed for animated surfaces.
    pub distort: Option<(f32, f32)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Light {
    Ambient { intensity: f32 },
    Point { position: Vec3, intensity: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Mesh {
    Sphere { radius: f32, segments: u32 },
    Dodecahedron { radius: f32 },
}

/// Post-processing pass, applied in list order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EffectPass {
    Bloom {
        luminance_threshold: f32,
        luminance_smoothing: f32,
        height: u32,
    },
    ChromaticAberration {
        offset: Vec2,
    },
}

/// Retained-scene command for the 3D field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SceneCommand {
    Mesh {
        mesh: Mesh,
        position: Vec3,
        rotation: Vec3,
        scale: f32,
        material: Material,
    },
    Curve {
        points: Vec<Vec3>,
        color: Rgb,
        width: f32,
        opacity: f32,
    },
    PointCloud {
        positions: Vec<Vec3>,
        colors: Vec<Rgb>,
        size: f32,
        opacity: f32,
    },
    Label {
        position: Vec3,
        text: String,
        size: f32,
        color: Rgb,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_degrees: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fog {
    pub color: Rgb,
    pub near: f32,
    pub far: f32,
}

/// One frame of the 3D field scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneFrame {
    pub background: Rgb,
    pub fog: Fog,
    pub camera: CameraState,
    pub lights: Vec<Light>,
    pub commands: Vec<SceneCommand>,
    pub effects: Vec<EffectPass>,
}

impl SceneFrame {
    pub fn curves(&self) -> impl Iterator<Item = &SceneCommand> {
        self.commands
            .iter()
            .filter(|command| matches!(command, SceneCommand::Curve { .. }))
    }

    /// Number of points in the background cloud, zero if absent.
    pub fn point_count(&self) -> usize {
        self.commands
            .iter()
            .map(|command| match command {
                SceneCommand::PointCloud { positions, .. } => positions.len(),
                _ => 0,
            })
            .sum()
    }
}

/// Anything that can consume frames of type `F`.
pub trait Renderer<F> {
    fn present(&mut self, frame: &F) -> Result<()>;
}

/// Statistics about the frames presented so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frames: u64,
    pub last_command_count: usize,
    pub peak_command_count: usize,
}

impl FrameStats {
    fn record(&mut self, commands: usize) {
        self.frames += 1;
        self.last_command_count = commands;
        self.peak_command_count = self.peak_command_count.max(commands);
    }
}

/// In-process renderer that validates and accounts for every frame it is
/// handed. Rasterization is left to whichever graphics binding the host wires
/// in behind the same [`Renderer`] seam.
#[derive(Debug, Default)]
pub struct RenderGraph {
    stats: FrameStats,
}

impl RenderGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }
}

impl Renderer<DrawList> for RenderGraph {
    fn present(&mut self, frame: &DrawList) -> Result<()> {
        self.stats.record(frame.len());
        tracing::trace!(commands = frame.len(), "presented 2d frame");
        Ok(())
    }
}

impl Renderer<SceneFrame> for RenderGraph {
    fn present(&mut self, frame: &SceneFrame) -> Result<()> {
        self.stats.record(frame.commands.len());
        tracing::trace!(
            commands = frame.commands.len(),
            points = frame.point_count(),
            effects = frame.effects.len(),
            "presented scene frame"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        let Rgb([r, g, b]) = Rgb::from_hex("#FFD700");
        assert_eq!(r, 1.0);
        assert!((g - 215.0 / 255.0).abs() < 1e-6);
        assert_eq!(b, 0.0);
        assert_eq!(Rgb::from_hex("nope"), Rgb([0.0, 0.0, 0.0]));
    }

    #[test]
    fn hsl_primaries() {
        let Rgb(red) = Rgb::from_hsl(0.0, 1.0, 0.5);
        let Rgb(green) = Rgb::from_hsl(120.0, 1.0, 0.5);
        assert!((red[0] - 1.0).abs() < 1e-6 && red[1].abs() < 1e-6);
        assert!((green[1] - 1.0).abs() < 1e-6 && green[0].abs() < 1e-6);
    }

    #[test]
    fn render_graph_tracks_frame_stats() {
        let mut graph = RenderGraph::new();
        let mut list = DrawList::new();
        list.clear_with(Color::BLACK);
        list.circle(Vec2::ZERO, 4.0, Paint::fill(Color::WHITE));

        graph.present(&list).unwrap();
        graph.present(&DrawList::new()).unwrap();

        let stats = graph.stats();
        assert_eq!(stats.frames, 2);
        assert_eq!(stats.last_command_count, 0);
        assert_eq!(stats.peak_command_count, 2);
    }

    #[test]
    fn alpha_is_clamped() {
        assert_eq!(Color::rgba(1, 2, 3, 400.0).alpha(), 255.0);
        assert_eq!(Color::hsba(10.0, 1.0, 1.0, 20.0).with_alpha(-5.0).alpha(), 0.0);
    }
}
