use std::f32::consts::{FRAC_PI_2, FRAC_PI_3, TAU};

use glam::Vec2;
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::{StatusSource, SurfaceStatus};
use crate::{
    entities::{BoundedRing, Mirror, Particle},
    kernels::{self, CoherenceMeter},
    render::{Color, Command2d, DrawList, Paint, Stroke},
    Bounds, FrameContext, FrameHandler, InputEvent, RenderParams,
};

const RING_MIRRORS: usize = 6;
const RING_RADIUS: f32 = 100.0;
const RING_MIRROR_SIZE: f32 = 80.0;
const PLACED_MIRROR_SIZE: f32 = 60.0;
const MIRROR_CAPACITY: usize = 12;
const PARTICLE_COUNT: usize = 10;
const FIELD_THRESHOLD: f32 = 0.1;

/// Particles bouncing between slowly turning mirrors; the more reflections,
/// the higher the coherence level.
#[derive(Debug)]
pub struct MirrorSketch {
    mirrors: BoundedRing<Mirror>,
    particles: Vec<Particle>,
    coherence: CoherenceMeter,
    interactive: bool,
    motion_scale: f32,
    rng: StdRng,
}

impl MirrorSketch {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            mirrors: BoundedRing::new(MIRROR_CAPACITY),
            particles: Vec::new(),
            coherence: CoherenceMeter::default(),
            interactive: true,
            motion_scale: 1.0,
            rng,
        }
    }

    pub fn coherence_level(&self) -> f32 {
        self.coherence.level()
    }

    pub fn mirrors(&self) -> impl Iterator<Item = &Mirror> {
        self.mirrors.iter()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Places a mirror at `position`, evicting the oldest past the cap.
    pub fn place_mirror(&mut self, position: Vec2) {
        let angle = self.rng.gen_range(0.0..TAU);
        if self
            .mirrors
            .push(Mirror::new(position, angle, PLACED_MIRROR_SIZE))
            .is_some()
        {
            tracing::debug!("evicted oldest mirror");
        }
    }

    fn step(&mut self, bounds: Bounds) -> usize {
        for mirror in self.mirrors.iter_mut() {
            mirror.drift();
        }

        for particle in &mut self.particles {
            particle.step(bounds);
        }
        let mirrors = self.mirrors.make_contiguous();
        let reflections = kernels::reflect_all(self.particles.iter_mut(), mirrors);
        self.coherence.update(reflections);
        reflections
    }

    fn draw(&self, frame: u64, bounds: Bounds) -> DrawList {
        let mut list = DrawList::new();
        let center = bounds.center();
        let level = self.coherence.level();
        list.clear_with(Color::hsba(240.0, 30.0, 20.0, 255.0));

        if level > FIELD_THRESHOLD {
            for i in 0..5 {
                let pulse = (frame as f32 * 0.02 + i as f32).sin() * 20.0 * self.motion_scale;
                list.circle(
                    center,
                    100.0 + i as f32 * 50.0 + pulse,
                    Paint::stroke(Color::hsba(260.0, 50.0, 100.0, level * 50.0), 2.0),
                );
            }
        }

        let spin = frame as f32 * 0.01 * self.motion_scale;
        for i in 1..=6 {
            let tip = center + Vec2::from_angle(spin + i as f32 * FRAC_PI_3) * 30.0;
            list.line(center, tip, Color::hsba(60.0, 100.0, 255.0, 255.0), 2.0);
        }

        for mirror in self.mirrors.iter() {
            let (a, b) = mirror.endpoints();
            list.line(a, b, Color::hsba(200.0, 200.0, 255.0, 255.0), 3.0);
            list.line(a, b, Color::hsba(150.0, 150.0, 255.0, 100.0), 8.0);
        }

        for particle in &self.particles {
            let trail = particle.trail();
            if !trail.is_empty() {
                let strokes = (0..trail.len())
                    .map(|i| Stroke {
                        color: Color::hsba(particle.hue, 200.0, 255.0, i as f32 * 10.0),
                        weight: i as f32 * 0.2,
                    })
                    .collect();
                list.push(Command2d::Polyline {
                    points: trail.iter().copied().collect(),
                    strokes,
                });
            }
            list.circle(
                particle.position,
                8.0,
                Paint::fill(Color::hsba(particle.hue, 200.0, 255.0, 255.0)),
            );
            list.circle(particle.position, 4.0, Paint::fill(Color::rgba(255, 255, 255, 100.0)));
        }

        let bar_origin = Vec2::new(center.x - 100.0, 40.0);
        list.text(Vec2::new(center.x, 30.0), "Consciousness Level", 16.0, Color::WHITE);
        list.rect(bar_origin, Vec2::new(200.0, 20.0), 10.0, Color::hsba(0.0, 0.0, 30.0, 255.0));
        list.rect(
            bar_origin,
            Vec2::new(200.0 * level, 20.0),
            10.0,
            Color::hsba(260.0, 80.0, 100.0, 255.0),
        );
        list.text(
            Vec2::new(center.x, 80.0),
            "Self-reflection creates awareness",
            12.0,
            Color::WHITE,
        );
        list
    }
}

impl Default for MirrorSketch {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameHandler for MirrorSketch {
    type Frame = DrawList;

    fn setup(&mut self, bounds: Bounds, params: &RenderParams) {
        self.reconfigure(params);
        self.mirrors.clear();
        self.particles.clear();
        self.coherence = CoherenceMeter::default();

        let center = bounds.center();
        for i in 0..RING_MIRRORS {
            let angle = i as f32 / RING_MIRRORS as f32 * TAU;
            let position = center + Vec2::from_angle(angle) * RING_RADIUS;
            self.mirrors
                .push(Mirror::new(position, angle + FRAC_PI_2, RING_MIRROR_SIZE));
        }

        for _ in 0..PARTICLE_COUNT {
            let position = Vec2::new(
                self.rng.gen_range(0.0..bounds.width),
                self.rng.gen_range(0.0..bounds.height),
            );
            let velocity = Vec2::new(self.rng.gen_range(-2.0..2.0), self.rng.gen_range(-2.0..2.0));
            let hue = self.rng.gen_range(0.0..360.0);
            self.particles.push(Particle::new(position, velocity, hue));
        }
    }

    fn input(&mut self, event: &InputEvent, _bounds: Bounds) {
        if !self.interactive {
            return;
        }
        if let InputEvent::PointerDown(position) = *event {
            self.place_mirror(position);
        }
    }

    fn resize(&mut self, previous: Bounds, current: Bounds) {
        let shift = current.center() - previous.center();
        for mirror in self.mirrors.iter_mut() {
            mirror.position += shift;
        }
    }

    fn reconfigure(&mut self, params: &RenderParams) {
        self.interactive = params.interactive;
        self.motion_scale = params.motion_scale;
    }

    fn frame(&mut self, ctx: &FrameContext<'_>) -> DrawList {
        self.step(ctx.bounds);
        self.draw(ctx.clock.frame_count(), ctx.bounds)
    }
}

impl StatusSource for MirrorSketch {
    fn status(&self) -> SurfaceStatus {
        SurfaceStatus::Mirror {
            coherence: self.coherence.level(),
            mirrors: self.mirrors.len(),
        }
    }
}
