use std::f32::consts::PI;

use glam::Vec2;
use rand::{rngs::StdRng, SeedableRng};

use super::{StatusSource, SurfaceStatus};
use crate::{
    entities::{Agent, Decision},
    kernels::{self, DecisionDraw},
    render::{Color, Command2d, DrawList, Paint, Stroke},
    Bounds, FrameContext, FrameHandler, InputEvent, RenderParams,
};

/// How long a decision stays on screen before both agents reset.
pub const RESULT_DISPLAY_SECONDS: f64 = 3.0;
const SLIDER_HALF_WIDTH: f32 = 150.0;

/// Display window of the current decision.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ResultWindow {
    Hidden,
    /// Decided; the window opens on the next frame.
    Pending,
    /// Shown until this frame-clock time.
    Until(f64),
}

/// Two agents whose choices are correlated through the coupling `K`.
#[derive(Debug)]
pub struct FriendshipSketch {
    agents: [Agent; 2],
    coupling: f64,
    last_draw: Option<DecisionDraw>,
    result: ResultWindow,
    interactive: bool,
    motion_scale: f32,
    rng: StdRng,
}

impl FriendshipSketch {
    pub fn new(coupling: f64) -> Self {
        Self::with_rng(coupling, StdRng::from_entropy())
    }

    pub fn with_rng(coupling: f64, rng: StdRng) -> Self {
        Self {
            agents: [
                Agent::new("Alice", Vec2::ZERO, Color::rgb(100, 150, 255)),
                Agent::new("Bob", Vec2::ZERO, Color::rgb(255, 150, 100)),
            ],
            coupling: coupling.clamp(0.0, 1.0),
            last_draw: None,
            result: ResultWindow::Hidden,
            interactive: true,
            motion_scale: 1.0,
            rng,
        }
    }

    pub fn coupling(&self) -> f64 {
        self.coupling
    }

    pub fn set_coupling(&mut self, coupling: f64) {
        self.coupling = coupling.clamp(0.0, 1.0);
    }

    pub fn agents(&self) -> &[Agent; 2] {
        &self.agents
    }

    pub fn decisions(&self) -> (Decision, Decision) {
        (self.agents[0].decision, self.agents[1].decision)
    }

    /// Whether both agents made the same choice; `None` while undecided.
    pub fn matched(&self) -> Option<bool> {
        match self.decisions() {
            (a, b) if a.is_decided() && b.is_decided() => Some(a == b),
            _ => None,
        }
    }

    pub fn is_showing_result(&self) -> bool {
        self.result != ResultWindow::Hidden
    }

    pub fn last_draw(&self) -> Option<DecisionDraw> {
        self.last_draw
    }

    /// Makes both agents decide at once. Ignored while a previous result is
    /// still on display.
    pub fn decide(&mut self) -> Option<DecisionDraw> {
        if self.is_showing_result() {
            return None;
        }

        let draw = kernels::correlated_decision(&mut self.rng, self.coupling);
        let (first, second) = draw.outcomes();
        self.agents[0].decision = first.into();
        self.agents[1].decision = second.into();
        self.last_draw = Some(draw);
        self.result = ResultWindow::Pending;
        tracing::debug!(?draw, coupling = self.coupling, "agents decided");
        Some(draw)
    }

    /// Opens a pending window at `now` or closes an elapsed one.
    fn update_result(&mut self, now: f64) {
        match self.result {
            ResultWindow::Pending => {
                self.result = ResultWindow::Until(now + RESULT_DISPLAY_SECONDS);
            }
            ResultWindow::Until(until) if now >= until => {
                self.result = ResultWindow::Hidden;
                for agent in &mut self.agents {
                    agent.decision = Decision::Undecided;
                }
            }
            _ => {}
        }
    }

    fn place_agents(&mut self, bounds: Bounds) {
        self.agents[0].position = Vec2::new(bounds.width * 0.3, bounds.height * 0.4);
        self.agents[1].position = Vec2::new(bounds.width * 0.7, bounds.height * 0.4);
    }

    fn draw(&self, frame: u64, bounds: Bounds) -> DrawList {
        let mut list = DrawList::new();
        let (w, h) = (bounds.width, bounds.height);
        let coupling = self.coupling as f32;
        list.clear_with(Color::rgb(250, 245, 255));

        let mid = (self.agents[0].position + self.agents[1].position) * 0.5;
        for i in 0..5 {
            let fade = 1.0 - i as f32 / 5.0;
            let pulse = (frame as f32 * 0.02 + i as f32).sin() * 20.0 * self.motion_scale;
            let size = 100.0 + i as f32 * 50.0 + pulse;
            list.ellipse(
                mid,
                size * coupling,
                size * coupling * 0.6,
                Paint::stroke(Color::rgba(150, 100, 255, fade * coupling * 100.0), 2.0),
            );
        }

        for agent in &self.agents {
            draw_agent(&mut list, agent);
        }

        let slider_origin = Vec2::new(w / 2.0 - SLIDER_HALF_WIDTH, h * 0.75);
        list.text(Vec2::new(w / 2.0, h * 0.7), "Friendship Strength (K)", 16.0, Color::BLACK);
        list.rect(slider_origin, Vec2::new(300.0, 30.0), 15.0, Color::rgb(230, 230, 230));
        list.rect(
            slider_origin,
            Vec2::new(300.0 * coupling, 30.0),
            15.0,
            Color::rgb(150, 100, 255),
        );
        list.text(
            Vec2::new(w / 2.0, h * 0.82),
            format!("K = {:.2}", self.coupling),
            16.0,
            Color::BLACK,
        );

        match self.matched() {
            None => {
                list.text(
                    Vec2::new(w / 2.0, h * 0.1),
                    "Click to make both people decide!",
                    20.0,
                    Color::BLACK,
                );
                list.text(
                    Vec2::new(w / 2.0, h * 0.15),
                    "Will they choose to help each other (quantum correlation)?",
                    14.0,
                    Color::BLACK,
                );
            }
            Some(matched) => {
                let (headline, detail, color) = if matched {
                    (
                        "They made the same choice!".to_string(),
                        format!("Quantum correlation demonstrated (K={:.2})", self.coupling),
                        Color::rgb(0, 200, 0),
                    )
                } else {
                    (
                        "They made different choices".to_string(),
                        "Low coupling = less correlation".to_string(),
                        Color::rgb(200, 0, 0),
                    )
                };
                list.text(Vec2::new(w / 2.0, h * 0.1), headline, 24.0, color);
                list.text(Vec2::new(w / 2.0, h * 0.15), detail, 16.0, color);

                for agent in &self.agents {
                    let choice = match agent.decision {
                        Decision::Help => "Help friend ($1000)",
                        _ => "Keep money ($500)",
                    };
                    list.text(
                        agent.position + Vec2::new(0.0, 80.0),
                        format!("{}: {choice}", agent.name),
                        14.0,
                        Color::BLACK,
                    );
                }
            }
        }
        list
    }
}

fn draw_agent(list: &mut DrawList, agent: &Agent) {
    let at = agent.position;
    let glow = if agent.decision == Decision::Help {
        100.0
    } else {
        0.0
    };

    list.circle(at, 60.0, Paint::fill(agent.color));
    list.circle(at, 80.0, Paint::fill(Color::rgba(255, 200, 100, glow)));
    for eye in [Vec2::new(-10.0, -5.0), Vec2::new(10.0, -5.0)] {
        list.circle(at + eye, 8.0, Paint::fill(Color::WHITE));
        list.circle(at + eye, 4.0, Paint::fill(Color::BLACK));
    }
    list.push(Command2d::Arc {
        center: at + Vec2::new(0.0, 5.0),
        width: 20.0,
        height: 20.0,
        start: 0.0,
        stop: PI,
        stroke: Stroke {
            color: Color::WHITE,
            weight: 2.0,
        },
    });
    list.text(at + Vec2::new(0.0, 50.0), agent.name.clone(), 12.0, Color::BLACK);
}

impl FrameHandler for FriendshipSketch {
    type Frame = DrawList;

    fn setup(&mut self, bounds: Bounds, params: &RenderParams) {
        self.reconfigure(params);
        self.place_agents(bounds);
    }

    fn input(&mut self, event: &InputEvent, bounds: Bounds) {
        if !self.interactive {
            return;
        }
        match *event {
            InputEvent::PointerDown(_) => {
                self.decide();
            }
            InputEvent::PointerMove(position) => {
                let band = bounds.height * 0.6..bounds.height * 0.9;
                if band.start < position.y && position.y < band.end {
                    let center = bounds.width / 2.0;
                    let k = kernels::normalize_clamped(
                        position.x,
                        center - SLIDER_HALF_WIDTH,
                        center + SLIDER_HALF_WIDTH,
                    );
                    self.set_coupling(f64::from(k));
                }
            }
            _ => {}
        }
    }

    fn resize(&mut self, _previous: Bounds, current: Bounds) {
        self.place_agents(current);
    }

    fn reconfigure(&mut self, params: &RenderParams) {
        self.interactive = params.interactive;
        self.motion_scale = params.motion_scale;
    }

    fn frame(&mut self, ctx: &FrameContext<'_>) -> DrawList {
        self.update_result(ctx.clock.elapsed());
        self.draw(ctx.clock.frame_count(), ctx.bounds)
    }
}

impl StatusSource for FriendshipSketch {
    fn status(&self) -> SurfaceStatus {
        SurfaceStatus::Friendship {
            coupling: self.coupling,
            decisions: self.decisions(),
            matched: self.matched(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FrameLoop, Surface, SurfaceConfig};

    fn start(coupling: f64, seed: u64) -> FrameLoop<FriendshipSketch> {
        let surface = Surface::new("friendship", 1000.0, 500.0).unwrap();
        FrameLoop::start(
            surface,
            FriendshipSketch::with_rng(coupling, StdRng::seed_from_u64(seed)),
            SurfaceConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn agents_start_undecided_at_their_seats() {
        let frame_loop = start(0.5, 1);
        let sketch = frame_loop.handler();

        assert_eq!(sketch.decisions(), (Decision::Undecided, Decision::Undecided));
        assert_eq!(sketch.matched(), None);
        assert_eq!(sketch.agents()[0].position, Vec2::new(300.0, 200.0));
        assert_eq!(sketch.agents()[1].position, Vec2::new(700.0, 200.0));
    }

    #[test]
    fn click_decides_and_result_expires() {
        let mut frame_loop = start(1.0, 2);
        frame_loop.tick(0.0);
        frame_loop.push_input(InputEvent::PointerDown(Vec2::new(10.0, 10.0)));
        frame_loop.tick(0.5);

        let sketch = frame_loop.handler();
        assert_eq!(sketch.matched(), Some(true));
        assert!(matches!(sketch.last_draw(), Some(DecisionDraw::Correlated(_))));

        frame_loop.tick(3.4);
        assert!(frame_loop.handler().is_showing_result());

        frame_loop.tick(3.6);
        let sketch = frame_loop.handler();
        assert!(!sketch.is_showing_result());
        assert_eq!(sketch.decisions(), (Decision::Undecided, Decision::Undecided));
    }

    #[test]
    fn result_window_starts_at_the_deciding_frame_after_idle() {
        let mut frame_loop = start(1.0, 7);
        frame_loop.tick(0.0);
        frame_loop.push_input(InputEvent::PointerDown(Vec2::new(10.0, 10.0)));
        frame_loop.tick(10.0);

        assert!(frame_loop.handler().is_showing_result());
        assert_eq!(frame_loop.handler().matched(), Some(true));

        frame_loop.tick(12.9);
        assert!(frame_loop.handler().is_showing_result());

        frame_loop.tick(13.1);
        assert!(!frame_loop.handler().is_showing_result());
        assert_eq!(frame_loop.handler().matched(), None);
    }

    #[test]
    fn pending_result_blocks_new_decisions() {
        let mut sketch = FriendshipSketch::with_rng(0.0, StdRng::seed_from_u64(3));
        let first = sketch.decide();
        assert!(first.is_some());
        let decisions = sketch.decisions();

        for _ in 0..20 {
            assert!(sketch.decide().is_none());
        }
        assert_eq!(sketch.decisions(), decisions);
        assert_eq!(sketch.last_draw(), first);
    }

    #[test]
    fn pointer_in_slider_band_sets_coupling() {
        let mut frame_loop = start(0.5, 4);
        frame_loop.push_input(InputEvent::PointerMove(Vec2::new(350.0, 400.0)));
        frame_loop.tick(0.0);
        assert_eq!(frame_loop.handler().coupling(), 0.0);

        frame_loop.push_input(InputEvent::PointerMove(Vec2::new(575.0, 400.0)));
        frame_loop.tick(0.1);
        assert!((frame_loop.handler().coupling() - 0.75).abs() < 1e-6);

        frame_loop.push_input(InputEvent::PointerMove(Vec2::new(650.0, 100.0)));
        frame_loop.tick(0.2);
        assert!((frame_loop.handler().coupling() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn resize_moves_agents() {
        let mut frame_loop = start(0.5, 5);
        frame_loop.handle().request_resize(2000.0, 1000.0).unwrap();
        frame_loop.tick(0.0);

        let agents = frame_loop.handler().agents();
        assert_eq!(agents[0].position, Vec2::new(600.0, 400.0));
        assert_eq!(agents[1].position, Vec2::new(1400.0, 400.0));
    }

    #[test]
    fn result_text_reports_the_choices() {
        let mut frame_loop = start(1.0, 6);
        frame_loop.push_input(InputEvent::PointerDown(Vec2::ZERO));
        let list = frame_loop.tick(0.0).unwrap();

        let texts: Vec<&str> = list
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command2d::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert!(texts.contains(&"They made the same choice!"));
        assert!(texts.iter().any(|t| t.starts_with("Alice: ")));
    }
}
