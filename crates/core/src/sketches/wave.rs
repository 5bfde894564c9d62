use std::f32::consts::TAU;

use glam::Vec2;

use super::{StatusSource, SurfaceStatus};
use crate::{
    entities::{BoundedRing, Slit, WaveState, Wavefront},
    kernels,
    render::{Color, Command2d, DrawList, Paint, Stroke},
    Bounds, FrameContext, FrameHandler, InputEvent, RenderParams,
};

/// A new wave leaves the emitter every this many frames.
pub const SPAWN_INTERVAL_FRAMES: u64 = 30;
const EMITTER_X: f32 = 50.0;
const SLIT_GAP: f32 = 80.0;
const WAVE_CAPACITY: usize = 64;

/// Double-slit experiment: waves interfere until someone looks.
#[derive(Debug)]
pub struct WaveSketch {
    waves: BoundedRing<Wavefront>,
    slits: [Slit; 2],
    observer: Option<Vec2>,
    collapses: u64,
    interactive: bool,
}

impl WaveSketch {
    pub fn new() -> Self {
        Self {
            waves: BoundedRing::new(WAVE_CAPACITY),
            slits: slits_for(Bounds::new(0.0, 0.0)),
            observer: None,
            collapses: 0,
            interactive: true,
        }
    }

    pub fn observing(&self) -> bool {
        self.observer.is_some()
    }

    pub fn observer(&self) -> Option<Vec2> {
        self.observer
    }

    pub fn waves(&self) -> impl Iterator<Item = &Wavefront> {
        self.waves.iter()
    }

    pub fn slits(&self) -> &[Slit; 2] {
        &self.slits
    }

    pub fn collapses(&self) -> u64 {
        self.collapses
    }

    fn step(&mut self, frame: u64, bounds: Bounds) {
        if let Some(observer) = self.observer {
            for wave in self.waves.iter_mut() {
                if kernels::observe(wave, observer) {
                    self.collapses += 1;
                    tracing::debug!(x = wave.centroid().x, "wave collapsed");
                }
            }
        }

        for wave in self.waves.iter_mut() {
            kernels::propagate(wave);
        }
        self.waves.retain(|wave| !kernels::has_exited(wave, bounds));

        if frame % SPAWN_INTERVAL_FRAMES == 0 {
            self.waves
                .push(Wavefront::new(Vec2::new(EMITTER_X, bounds.height / 2.0)));
        }
    }

    fn draw(&self, bounds: Bounds) -> DrawList {
        let mut list = DrawList::new();
        let (w, h) = (bounds.width, bounds.height);
        list.clear_with(Color::rgb(250, 245, 255));

        list.text(Vec2::new(w / 2.0, 30.0), "Wave-Particle Duality", 20.0, Color::BLACK);
        let caption = if self.observing() {
            "OBSERVING - Particles collapse!"
        } else {
            "NOT OBSERVING - Waves interfere"
        };
        list.text(Vec2::new(w / 2.0, 50.0), caption, 14.0, Color::BLACK);

        let wall = Color::rgb(100, 100, 100);
        for slit in &self.slits {
            list.line(Vec2::new(slit.x, 0.0), Vec2::new(slit.x, slit.y1), wall, 4.0);
            list.line(Vec2::new(slit.x, slit.y2), Vec2::new(slit.x, h), wall, 4.0);
        }

        if let Some(observer) = self.observer {
            list.ellipse(
                observer,
                40.0,
                20.0,
                Paint::fill(Color::WHITE).with_stroke(Color::BLACK, 2.0),
            );
            list.circle(observer, 15.0, Paint::fill(Color::rgb(100, 150, 255)));
            list.circle(observer, 8.0, Paint::fill(Color::BLACK));
            for i in 0..8 {
                let ray = Vec2::from_angle(i as f32 / 8.0 * TAU) * 60.0;
                list.line(
                    observer,
                    observer + ray,
                    Color::rgba(255, 200, 100, 100.0),
                    2.0,
                );
            }
        }

        for wave in self.waves.iter() {
            draw_wave(&mut list, wave);
        }

        if !self.observing() {
            let [a, b] = self.slits.map(|slit| slit.aperture_midpoint());
            for (point, intensity) in kernels::interference_field(bounds, a, b) {
                list.circle(
                    point,
                    5.0,
                    Paint::fill(Color::rgba(100, 150, 255, intensity.abs() * 50.0)),
                );
            }
        }

        list.text(
            Vec2::new(w / 2.0, h - 30.0),
            "Hold mouse down to observe",
            14.0,
            Color::BLACK,
        );
        list
    }
}

impl Default for WaveSketch {
    fn default() -> Self {
        Self::new()
    }
}

fn slits_for(bounds: Bounds) -> [Slit; 2] {
    let x = bounds.width * 0.4;
    let center = bounds.height / 2.0;
    [
        Slit {
            x,
            y1: center - SLIT_GAP,
            y2: center - SLIT_GAP / 2.0,
        },
        Slit {
            x,
            y1: center + SLIT_GAP / 2.0,
            y2: center + SLIT_GAP,
        },
    ]
}

fn draw_wave(list: &mut DrawList, wave: &Wavefront) {
    match wave.state() {
        WaveState::Propagating => {
            let points = wave.points();
            let strokes = (0..points.len())
                .map(|i| Stroke {
                    color: Color::rgba(100, 150, 255, 255.0 - i as f32 * 5.0),
                    weight: 3.0 - i as f32 * 0.05,
                })
                .collect();
            list.push(Command2d::Polyline {
                points: points.iter().map(|p| p.position).collect(),
                strokes,
            });
            for point in points.iter().step_by(5) {
                list.circle(
                    point.position,
                    40.0,
                    Paint::fill(Color::rgba(100, 150, 255, 30.0)),
                );
            }
        }
        WaveState::Collapsed { position } => {
            list.circle(position, 10.0, Paint::fill(Color::rgb(255, 100, 100)));
            list.circle(position, 20.0, Paint::fill(Color::rgba(255, 100, 100, 50.0)));
        }
    }
}

impl FrameHandler for WaveSketch {
    type Frame = DrawList;

    fn setup(&mut self, bounds: Bounds, params: &RenderParams) {
        self.reconfigure(params);
        self.slits = slits_for(bounds);
        self.waves.clear();
        self.observer = None;
    }

    fn input(&mut self, event: &InputEvent, _bounds: Bounds) {
        match *event {
            InputEvent::PointerDown(position) if self.interactive => {
                self.observer = Some(position);
            }
            InputEvent::PointerDrag { position, .. } if self.observer.is_some() => {
                self.observer = Some(position);
            }
            // Release ends an observation regardless of the interaction flag.
            InputEvent::PointerUp(_) => self.observer = None,
            _ => {}
        }
    }

    fn resize(&mut self, _previous: Bounds, current: Bounds) {
        self.slits = slits_for(current);
    }

    fn reconfigure(&mut self, params: &RenderParams) {
        self.interactive = params.interactive;
    }

    fn frame(&mut self, ctx: &FrameContext<'_>) -> DrawList {
        self.step(ctx.clock.frame_count(), ctx.bounds);
        self.draw(ctx.bounds)
    }
}

impl StatusSource for WaveSketch {
    fn status(&self) -> SurfaceStatus {
        SurfaceStatus::Wave {
            observing: self.observing(),
            in_flight: self.waves.len(),
            collapses: self.collapses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FrameLoop, Surface, SurfaceConfig};

    fn start(width: f32, height: f32) -> FrameLoop<WaveSketch> {
        let surface = Surface::new("wave", width, height).unwrap();
        FrameLoop::start(surface, WaveSketch::new(), SurfaceConfig::default()).unwrap()
    }

    fn run(frame_loop: &mut FrameLoop<WaveSketch>, frames: u64) -> Option<DrawList> {
        let mut last = None;
        for _ in 0..frames {
            let now = frame_loop.clock().frame_count() as f64 / 60.0;
            last = frame_loop.tick(now);
        }
        last
    }

    #[test]
    fn slits_straddle_the_vertical_center() {
        let frame_loop = start(1000.0, 600.0);
        let [upper, lower] = *frame_loop.handler().slits();

        assert_eq!(upper.x, 400.0);
        assert_eq!((upper.y1, upper.y2), (220.0, 260.0));
        assert_eq!((lower.y1, lower.y2), (340.0, 380.0));
    }

    #[test]
    fn waves_spawn_on_cadence_and_leave_the_surface() {
        let mut frame_loop = start(300.0, 400.0);
        run(&mut frame_loop, SPAWN_INTERVAL_FRAMES - 1);
        assert_eq!(frame_loop.handler().waves().count(), 0);

        run(&mut frame_loop, 1);
        assert_eq!(frame_loop.handler().waves().count(), 1);

        // (300 - 50) / 2 = 125 frames to reach the far edge, one more to pass it.
        run(&mut frame_loop, 126);
        assert!(frame_loop
            .handler()
            .waves()
            .all(|w| w.forward_position() <= 300.0));
        assert_eq!(frame_loop.handler().waves().count(), 4);
    }

    #[test]
    fn observation_collapses_nearby_waves_only() {
        let mut frame_loop = start(1000.0, 400.0);
        run(&mut frame_loop, SPAWN_INTERVAL_FRAMES + 20);

        frame_loop.push_input(InputEvent::PointerDown(Vec2::new(90.0, 200.0)));
        run(&mut frame_loop, 1);
        assert!(frame_loop.handler().observing());
        assert!(frame_loop.handler().waves().all(|w| w.is_collapsed()));
        assert_eq!(frame_loop.handler().collapses(), 1);

        frame_loop.push_input(InputEvent::PointerUp(Vec2::new(90.0, 200.0)));
        run(&mut frame_loop, SPAWN_INTERVAL_FRAMES);
        let sketch = frame_loop.handler();
        assert!(!sketch.observing());
        assert_eq!(sketch.waves().filter(|w| w.is_collapsed()).count(), 1);
        assert_eq!(sketch.waves().filter(|w| !w.is_collapsed()).count(), 1);
    }

    #[test]
    fn collapsed_waves_stay_collapsed() {
        let mut frame_loop = start(1000.0, 400.0);
        run(&mut frame_loop, SPAWN_INTERVAL_FRAMES + 10);
        frame_loop.push_input(InputEvent::PointerDown(Vec2::new(70.0, 200.0)));
        run(&mut frame_loop, 1);

        let drags = [Vec2::new(900.0, 10.0), Vec2::new(5.0, 390.0)];
        for (i, position) in drags.iter().cycle().take(40).enumerate() {
            frame_loop.push_input(InputEvent::PointerDrag {
                position: *position,
                delta: Vec2::ZERO,
            });
            if i % 7 == 0 {
                frame_loop.push_input(InputEvent::PointerUp(*position));
            }
            run(&mut frame_loop, 1);
            assert!(frame_loop.handler().waves().next().unwrap().is_collapsed());
        }
    }

    #[test]
    fn interference_overlay_only_without_observer() {
        let mut frame_loop = start(1000.0, 400.0);
        let circles = |list: &DrawList| {
            list.commands()
                .iter()
                .filter(|c| matches!(c, Command2d::Circle { diameter, .. } if *diameter == 5.0))
                .count()
        };

        let idle = run(&mut frame_loop, 1).unwrap();
        assert!(circles(&idle) > 0);

        frame_loop.push_input(InputEvent::PointerDown(Vec2::new(500.0, 200.0)));
        let observing = run(&mut frame_loop, 1).unwrap();
        assert_eq!(circles(&observing), 0);
    }

    #[test]
    fn status_reports_observation() {
        let mut frame_loop = start(800.0, 400.0);
        frame_loop.push_input(InputEvent::PointerDown(Vec2::new(1.0, 1.0)));
        run(&mut frame_loop, 1);

        assert!(matches!(
            frame_loop.handler().status(),
            SurfaceStatus::Wave {
                observing: true,
                ..
            }
        ));
    }
}
