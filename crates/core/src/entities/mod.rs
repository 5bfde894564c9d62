//! Plain mutable records updated once per frame.

use std::collections::VecDeque;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::{
    kernels::{self, ScaleSpring},
    render::{Color, Rgb},
    Bounds,
};

pub const TRAIL_CAPACITY: usize = 20;
pub const MIRROR_DRIFT: f32 = 0.005;
pub const WAVE_POINT_COUNT: usize = 50;
const HOVER_SCALE: f32 = 1.2;

/// Fixed-capacity ring that evicts its oldest entry on overflow.
#[derive(Debug, Clone)]
pub struct BoundedRing<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedRing<T> {
    /// A zero capacity is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends `item`, returning the evicted oldest entry if the ring was full.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut()
    }

    /// Oldest-first view as a single slice.
    pub fn make_contiguous(&mut self) -> &[T] {
        self.items.make_contiguous()
    }

    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
        self.items.retain(keep);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mirror {
    pub position: Vec2,
    /// Orientation of the reflecting segment in radians.
    pub angle: f32,
    pub size: f32,
}

impl Mirror {
    pub fn new(position: Vec2, angle: f32, size: f32) -> Self {
        Self {
            position,
            angle,
            size,
        }
    }

    pub fn drift(&mut self) {
        self.angle += MIRROR_DRIFT;
    }

    /// Both ends of the reflecting segment.
    pub fn endpoints(&self) -> (Vec2, Vec2) {
        let half = Vec2::from_angle(self.angle) * (self.size * 0.5);
        (self.position - half, self.position + half)
    }
}

#[derive(Debug, Clone)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub hue: f32,
    trail: BoundedRing<Vec2>,
}

impl Particle {
    pub fn new(position: Vec2, velocity: Vec2, hue: f32) -> Self {
        Self {
            position,
            velocity,
            hue,
            trail: BoundedRing::new(TRAIL_CAPACITY),
        }
    }

    /// Moves one step, records the trail and wraps toroidally.
    pub fn step(&mut self, bounds: Bounds) {
        self.position += self.velocity;
        self.trail.push(self.position);

        if self.position.x < 0.0 {
            self.position.x = bounds.width;
        }
        if self.position.x > bounds.width {
            self.position.x = 0.0;
        }
        if self.position.y < 0.0 {
            self.position.y = bounds.height;
        }
        if self.position.y > bounds.height {
            self.position.y = 0.0;
        }
    }

    /// Recent positions, oldest first.
    pub fn trail(&self) -> &BoundedRing<Vec2> {
        &self.trail
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WavePoint {
    pub position: Vec2,
    pub phase: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WaveState {
    Propagating,
    /// Terminal: the instance is a single point from here on.
    Collapsed { position: Vec2 },
}

/// A wave instance travelling through the double slit.
#[derive(Debug, Clone)]
pub struct Wavefront {
    origin: Vec2,
    pub(crate) points: Vec<WavePoint>,
    state: WaveState,
}

impl Wavefront {
    pub fn new(origin: Vec2) -> Self {
        Self {
            origin,
            points: vec![
                WavePoint {
                    position: origin,
                    phase: 0.0,
                };
                WAVE_POINT_COUNT
            ],
            state: WaveState::Propagating,
        }
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn points(&self) -> &[WavePoint] {
        &self.points
    }

    pub fn state(&self) -> WaveState {
        self.state
    }

    pub fn is_collapsed(&self) -> bool {
        matches!(self.state, WaveState::Collapsed { .. })
    }

    /// Mean position of the wave points.
    pub fn centroid(&self) -> Vec2 {
        if self.points.is_empty() {
            return self.origin;
        }
        let sum: Vec2 = self.points.iter().map(|p| p.position).sum();
        sum / self.points.len() as f32
    }

    /// Leading coordinate used for the off-surface test.
    pub fn forward_position(&self) -> f32 {
        match self.state {
            WaveState::Propagating => self
                .points
                .first()
                .map(|p| p.position.x)
                .unwrap_or(self.origin.x),
            WaveState::Collapsed { position } => position.x,
        }
    }

    /// Collapses at `position`. Has no effect once collapsed.
    pub(crate) fn collapse_at(&mut self, position: Vec2) -> bool {
        if self.is_collapsed() {
            return false;
        }
        self.state = WaveState::Collapsed { position };
        true
    }

    pub(crate) fn set_collapsed_position(&mut self, next: Vec2) {
        if let WaveState::Collapsed { position } = &mut self.state {
            *position = next;
        }
    }
}

/// Vertical barrier with one aperture between `y1` and `y2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Slit {
    pub x: f32,
    pub y1: f32,
    pub y2: f32,
}

impl Slit {
    pub fn aperture_midpoint(&self) -> Vec2 {
        Vec2::new(self.x, (self.y1 + self.y2) * 0.5)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    #[default]
    Undecided,
    /// Keep the money.
    Keep,
    /// Help the friend.
    Help,
}

impl Decision {
    pub fn is_decided(&self) -> bool {
        !matches!(self, Self::Undecided)
    }
}

impl From<bool> for Decision {
    fn from(help: bool) -> Self {
        if help {
            Self::Help
        } else {
            Self::Keep
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub name: String,
    pub position: Vec2,
    pub color: Color,
    pub decision: Decision,
}

impl Agent {
    pub fn new(name: impl Into<String>, position: Vec2, color: Color) -> Self {
        Self {
            name: name.into(),
            position,
            color,
            decision: Decision::Undecided,
        }
    }
}

/// Labelled sphere in the field visualization.
#[derive(Debug, Clone)]
pub struct PhaseSpaceNode {
    pub position: Vec3,
    pub color: Rgb,
    pub label: String,
    pub base_scale: f32,
    hovered: bool,
    scale: ScaleSpring,
}

impl PhaseSpaceNode {
    pub fn new(position: Vec3, color: Rgb, label: impl Into<String>) -> Self {
        Self {
            position,
            color,
            label: label.into(),
            base_scale: 1.0,
            hovered: false,
            scale: ScaleSpring::new(1.0),
        }
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
        let target = if hovered {
            self.base_scale * HOVER_SCALE
        } else {
            self.base_scale
        };
        self.scale.set_target(target);
    }

    /// Advances the hover animation by `dt` seconds.
    pub fn animate(&mut self, dt: f32) {
        self.scale.step(dt);
    }

    pub fn scale(&self) -> f32 {
        self.scale.value()
    }

    /// Wobble at `elapsed` seconds; derived from time, never stored.
    pub fn rotation(elapsed: f32) -> Vec3 {
        Vec3::new(
            (elapsed * 0.3).sin() * 0.1,
            (elapsed * 0.2).sin() * 0.1,
            0.0,
        )
    }
}

/// Weighted edge between two phase-space nodes with a cached curve.
#[derive(Debug, Clone)]
pub struct Connection {
    start: Vec3,
    end: Vec3,
    strength: f32,
    curve: Vec<Vec3>,
    revision: u32,
}

impl Connection {
    pub fn new(start: Vec3, end: Vec3, strength: f32) -> Self {
        let mut connection = Self {
            start,
            end,
            strength: strength.clamp(0.0, 1.0),
            curve: Vec::new(),
            revision: 0,
        };
        connection.rebuild();
        connection
    }

    pub fn start(&self) -> Vec3 {
        self.start
    }

    pub fn end(&self) -> Vec3 {
        self.end
    }

    pub fn strength(&self) -> f32 {
        self.strength
    }

    pub fn curve(&self) -> &[Vec3] {
        &self.curve
    }

    /// Bumped every time the curve is recomputed.
    pub fn revision(&self) -> u32 {
        self.revision
    }

    pub fn set_strength(&mut self, strength: f32) {
        let strength = strength.clamp(0.0, 1.0);
        if strength != self.strength {
            self.strength = strength;
            self.rebuild();
        }
    }

    pub fn set_endpoints(&mut self, start: Vec3, end: Vec3) {
        if start != self.start || end != self.end {
            self.start = start;
            self.end = end;
            self.rebuild();
        }
    }

    fn rebuild(&mut self) {
        self.curve = kernels::connection_curve(self.start, self.end, self.strength);
        self.revision += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldParticle {
    pub position: Vec3,
    pub color: Rgb,
}
