//! Frame scheduling for drawing surfaces.
//!
//! A [`FrameLoop`] owns one [`Surface`] and one [`FrameHandler`] and invokes
//! the handler once per display refresh. The host drives it by calling
//! [`FrameLoop::tick`] from its refresh callback (or from a [`DisplayLink`]
//! when running headless). Everything here is single-threaded: the loop is
//! only ever touched from the thread that created it.

use std::{cell::Cell, collections::VecDeque, rc::Rc};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{FieldError, RenderParams, Result, SurfaceConfig};

/// Size of a surface in its local coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Placement of a surface on the host screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub origin: Vec2,
    pub bounds: Bounds,
}

impl Viewport {
    /// Translates a screen-space point into the surface's local space.
    pub fn to_local(&self, screen: Vec2) -> Vec2 {
        screen - self.origin
    }
}

/// A drawing surface handed to the engine by the host.
#[derive(Debug, Clone)]
pub struct Surface {
    label: String,
    viewport: Viewport,
    attached: bool,
}

impl Surface {
    /// Creates a surface with an attached drawing context.
    pub fn new(label: impl Into<String>, width: f32, height: f32) -> Result<Self> {
        let bounds = Bounds::new(width, height);
        if bounds.is_empty() {
            return Err(FieldError::InvalidInput("surface size must be non-zero"));
        }

        Ok(Self {
            label: label.into(),
            viewport: Viewport {
                origin: Vec2::ZERO,
                bounds,
            },
            attached: true,
        })
    }

    /// Creates a surface whose drawing context could not be acquired.
    pub fn detached(label: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            label: label.into(),
            viewport: Viewport {
                origin: Vec2::ZERO,
                bounds: Bounds::new(width, height),
            },
            attached: false,
        }
    }

    /// Places the surface at `origin` in screen space.
    pub fn with_origin(mut self, origin: Vec2) -> Self {
        self.viewport.origin = origin;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn bounds(&self) -> Bounds {
        self.viewport.bounds
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    fn resize(&mut self, bounds: Bounds) {
        self.viewport.bounds = bounds;
    }

    fn detach(&mut self) {
        self.attached = false;
    }
}

/// Discrete input messages delivered to scene composers.
///
/// Positions are in surface-local coordinates once they reach a handler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    PointerDown(Vec2),
    PointerUp(Vec2),
    PointerMove(Vec2),
    PointerDrag { position: Vec2, delta: Vec2 },
    Wheel { delta: f32 },
    /// Pointer entered the pickable object with the given index.
    PointerEnter(usize),
    PointerLeave(usize),
}

impl InputEvent {
    pub fn position(&self) -> Option<Vec2> {
        match *self {
            Self::PointerDown(p) | Self::PointerUp(p) | Self::PointerMove(p) => Some(p),
            Self::PointerDrag { position, .. } => Some(position),
            Self::Wheel { .. } | Self::PointerEnter(_) | Self::PointerLeave(_) => None,
        }
    }

    fn map_position(self, f: impl Fn(Vec2) -> Vec2) -> Self {
        match self {
            Self::PointerDown(p) => Self::PointerDown(f(p)),
            Self::PointerUp(p) => Self::PointerUp(f(p)),
            Self::PointerMove(p) => Self::PointerMove(f(p)),
            Self::PointerDrag { position, delta } => Self::PointerDrag {
                position: f(position),
                delta,
            },
            other => other,
        }
    }
}

/// Elapsed-time bookkeeping for a frame loop.
#[derive(Debug, Default, Clone)]
pub struct FrameClock {
    started_at: Option<f64>,
    elapsed: f64,
    delta: f64,
    frame_count: u64,
}

impl FrameClock {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Records a refresh at host time `now` (seconds).
    pub fn advance(&mut self, now: f64) {
        let start = *self.started_at.get_or_insert(now);
        let elapsed = (now - start).max(0.0);
        self.delta = (elapsed - self.elapsed).max(0.0);
        self.elapsed = elapsed;
        self.frame_count += 1;
    }

    /// Seconds since the first frame.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Number of frames run so far, counting the current one.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Per-frame view handed to [`FrameHandler::frame`].
pub struct FrameContext<'a> {
    pub clock: &'a FrameClock,
    pub bounds: Bounds,
    pub params: &'a RenderParams,
    pub handle: &'a LoopHandle,
}

/// Callbacks driven by a [`FrameLoop`].
pub trait FrameHandler {
    /// Output produced by a single frame, handed to a renderer by the host.
    type Frame;

    /// Called once from [`FrameLoop::start`].
    fn setup(&mut self, bounds: Bounds, params: &RenderParams);

    /// Called at the start of a frame for each queued input event.
    fn input(&mut self, event: &InputEvent, bounds: Bounds);

    /// Called at the start of the first frame after the surface changed size.
    fn resize(&mut self, previous: Bounds, current: Bounds);

    /// Called at the start of the first frame after the configuration changed.
    fn reconfigure(&mut self, _params: &RenderParams) {}

    fn frame(&mut self, ctx: &FrameContext<'_>) -> Self::Frame;
}

#[derive(Debug, Default)]
struct LoopShared {
    stopped: Cell<bool>,
    in_frame: Cell<bool>,
    pending_resize: Cell<Option<Bounds>>,
}

/// Cheap handle that can stop a loop or request a resize from anywhere on the
/// owning thread, including from inside a frame callback.
#[derive(Debug, Clone, Default)]
pub struct LoopHandle {
    shared: Rc<LoopShared>,
}

impl LoopHandle {
    /// Stops the loop. Idempotent; no frame runs after this returns.
    pub fn stop(&self) {
        if !self.shared.stopped.replace(true) {
            tracing::info!("frame loop stopped");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.get()
    }

    /// Queues a resize. Rebasing always happens at the start of the next
    /// frame, never in the middle of one.
    pub fn request_resize(&self, width: f32, height: f32) -> Result<()> {
        let bounds = Bounds::new(width, height);
        if bounds.is_empty() {
            return Err(FieldError::InvalidInput("surface size must be non-zero"));
        }
        if self.shared.in_frame.get() {
            tracing::debug!(width, height, "resize arrived mid-frame, deferring");
        }
        self.shared.pending_resize.set(Some(bounds));
        Ok(())
    }
}

/// Continuous update/draw cycle for one surface.
pub struct FrameLoop<H: FrameHandler> {
    surface: Surface,
    handler: H,
    handle: LoopHandle,
    clock: FrameClock,
    config: SurfaceConfig,
    params: RenderParams,
    config_dirty: bool,
    inputs: VecDeque<InputEvent>,
}

impl<H: FrameHandler> FrameLoop<H> {
    /// Acquires the surface and runs the handler's setup. Fails with
    /// [`FieldError::SurfaceUnavailable`] if the surface has no context, in
    /// which case the handler is never called.
    pub fn start(surface: Surface, mut handler: H, config: SurfaceConfig) -> Result<Self> {
        if !surface.is_attached() {
            tracing::warn!(surface = surface.label(), "drawing context unavailable");
            return Err(FieldError::surface_unavailable(surface.label()));
        }

        let params = RenderParams::from_config(&config);
        handler.setup(surface.bounds(), &params);
        tracing::info!(
            surface = surface.label(),
            width = surface.bounds().width,
            height = surface.bounds().height,
            complexity = %params.complexity,
            "frame loop started"
        );

        Ok(Self {
            surface,
            handler,
            handle: LoopHandle::default(),
            clock: FrameClock::default(),
            config,
            params,
            config_dirty: false,
            inputs: VecDeque::new(),
        })
    }

    pub fn handle(&self) -> LoopHandle {
        self.handle.clone()
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn params(&self) -> &RenderParams {
        &self.params
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_stopped()
    }

    pub fn stop(&self) {
        self.handle.stop();
    }

    /// Tears the surface down. The loop stops with it.
    pub fn destroy_surface(&mut self) {
        self.surface.detach();
        self.handle.stop();
    }

    /// Replaces the configuration snapshot; it is applied on the next tick.
    pub fn set_config(&mut self, config: SurfaceConfig) {
        if config != self.config {
            self.config = config;
            self.config_dirty = true;
        }
    }

    /// Queues an event that is already in surface-local coordinates.
    pub fn push_input(&mut self, event: InputEvent) {
        if self.is_running() {
            self.inputs.push_back(event);
        }
    }

    /// Queues an event given in screen coordinates.
    pub fn push_screen_input(&mut self, event: InputEvent) {
        let viewport = self.surface.viewport();
        self.push_input(event.map_position(|p| viewport.to_local(p)));
    }

    /// Runs one frame at host time `now` (seconds). Returns `None` without
    /// touching the handler once the loop has been stopped.
    pub fn tick(&mut self, now: f64) -> Option<H::Frame> {
        if self.handle.is_stopped() {
            return None;
        }
        if !self.surface.is_attached() {
            self.handle.stop();
            return None;
        }

        if let Some(bounds) = self.handle.shared.pending_resize.take() {
            let previous = self.surface.bounds();
            if previous != bounds {
                self.surface.resize(bounds);
                self.handler.resize(previous, bounds);
                tracing::info!(
                    surface = self.surface.label(),
                    width = bounds.width,
                    height = bounds.height,
                    "surface resized"
                );
            }
        }

        if self.config_dirty {
            self.config_dirty = false;
            let params = RenderParams::from_config(&self.config);
            if params != self.params {
                self.params = params;
                self.handler.reconfigure(&self.params);
                tracing::info!(complexity = %self.params.complexity, "configuration applied");
            }
        }

        let bounds = self.surface.bounds();
        while let Some(event) = self.inputs.pop_front() {
            self.handler.input(&event, bounds);
        }

        self.clock.advance(now);
        self.handle.shared.in_frame.set(true);
        let frame = self.handler.frame(&FrameContext {
            clock: &self.clock,
            bounds,
            params: &self.params,
            handle: &self.handle,
        });
        self.handle.shared.in_frame.set(false);
        Some(frame)
    }
}

/// Headless stand-in for the display's refresh signal.
#[derive(Debug, Clone)]
pub struct DisplayLink {
    interval: f64,
    refreshes: u64,
}

impl DisplayLink {
    pub fn new(refresh_hz: u32) -> Self {
        Self {
            interval: 1.0 / f64::from(refresh_hz.max(1)),
            refreshes: 0,
        }
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Timestamp of the next refresh in seconds.
    pub fn next_refresh(&mut self) -> f64 {
        let now = self.refreshes as f64 * self.interval;
        self.refreshes += 1;
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        setups: usize,
        frames: usize,
        resizes: Vec<(Bounds, Bounds)>,
        inputs: Vec<InputEvent>,
        reconfigured: usize,
        stop_after: Option<usize>,
    }

    impl FrameHandler for Counter {
        type Frame = usize;

        fn setup(&mut self, _bounds: Bounds, _params: &RenderParams) {
            self.setups += 1;
        }

        fn input(&mut self, event: &InputEvent, _bounds: Bounds) {
            self.inputs.push(*event);
        }

        fn resize(&mut self, previous: Bounds, current: Bounds) {
            self.resizes.push((previous, current));
        }

        fn reconfigure(&mut self, _params: &RenderParams) {
            self.reconfigured += 1;
        }

        fn frame(&mut self, ctx: &FrameContext<'_>) -> usize {
            self.frames += 1;
            if Some(self.frames) == self.stop_after {
                ctx.handle.stop();
            }
            self.frames
        }
    }

    fn surface() -> Surface {
        Surface::new("test", 200.0, 100.0).unwrap()
    }

    #[test]
    fn detached_surface_fails_without_scheduling() {
        let surface = Surface::detached("missing", 10.0, 10.0);
        let err = FrameLoop::start(surface, Counter::default(), SurfaceConfig::default())
            .err()
            .expect("start should fail");

        assert!(matches!(err, FieldError::SurfaceUnavailable { .. }));
    }

    #[test]
    fn no_frames_after_stop() {
        let mut frame_loop =
            FrameLoop::start(surface(), Counter::default(), SurfaceConfig::default()).unwrap();
        let mut link = DisplayLink::new(60);

        for _ in 0..5 {
            frame_loop.tick(link.next_refresh());
        }
        frame_loop.stop();
        let frames = frame_loop.handler().frames;

        for _ in 0..10 {
            assert!(frame_loop.tick(link.next_refresh()).is_none());
        }
        frame_loop.stop();

        assert_eq!(frames, 5);
        assert_eq!(frame_loop.handler().frames, frames);
        assert_eq!(frame_loop.clock().frame_count(), 5);
    }

    #[test]
    fn stop_from_inside_a_frame_cancels_the_queued_tick() {
        let handler = Counter {
            stop_after: Some(3),
            ..Counter::default()
        };
        let mut frame_loop = FrameLoop::start(surface(), handler, SurfaceConfig::default()).unwrap();

        for i in 0..6 {
            frame_loop.tick(i as f64 / 60.0);
        }

        assert_eq!(frame_loop.handler().frames, 3);
        assert!(!frame_loop.is_running());
    }

    #[test]
    fn external_handle_stops_the_loop() {
        let mut frame_loop =
            FrameLoop::start(surface(), Counter::default(), SurfaceConfig::default()).unwrap();
        let handle = frame_loop.handle();

        frame_loop.tick(0.0);
        handle.stop();
        handle.stop();

        assert!(frame_loop.tick(1.0).is_none());
        assert_eq!(frame_loop.handler().frames, 1);
    }

    #[test]
    fn resize_is_applied_at_the_next_frame_once() {
        let mut frame_loop =
            FrameLoop::start(surface(), Counter::default(), SurfaceConfig::default()).unwrap();
        let handle = frame_loop.handle();

        handle.request_resize(300.0, 150.0).unwrap();
        handle.request_resize(400.0, 200.0).unwrap();
        assert!(frame_loop.handler().resizes.is_empty());

        frame_loop.tick(0.0);
        frame_loop.tick(0.1);

        let resizes = &frame_loop.handler().resizes;
        assert_eq!(resizes.len(), 1);
        assert_eq!(resizes[0].1, Bounds::new(400.0, 200.0));
        assert_eq!(frame_loop.surface().bounds(), Bounds::new(400.0, 200.0));
        assert_eq!(frame_loop.handler().setups, 1);
        assert!(handle.request_resize(0.0, 10.0).is_err());
    }

    #[test]
    fn screen_input_is_translated_to_local_space() {
        let surface = surface().with_origin(Vec2::new(50.0, 20.0));
        let mut frame_loop =
            FrameLoop::start(surface, Counter::default(), SurfaceConfig::default()).unwrap();

        frame_loop.push_screen_input(InputEvent::PointerDown(Vec2::new(60.0, 25.0)));
        frame_loop.tick(0.0);

        assert_eq!(
            frame_loop.handler().inputs,
            vec![InputEvent::PointerDown(Vec2::new(10.0, 5.0))]
        );
    }

    #[test]
    fn configuration_changes_are_polled_once_per_tick() {
        let mut frame_loop =
            FrameLoop::start(surface(), Counter::default(), SurfaceConfig::default()).unwrap();

        frame_loop.set_config(SurfaceConfig {
            complexity: crate::Complexity::High,
            ..SurfaceConfig::default()
        });
        assert_eq!(frame_loop.handler().reconfigured, 0);

        frame_loop.tick(0.0);
        frame_loop.tick(0.1);
        assert_eq!(frame_loop.handler().reconfigured, 1);
        assert!(frame_loop.params().post_processing);
    }

    #[test]
    fn destroyed_surface_stops_the_loop() {
        let mut frame_loop =
            FrameLoop::start(surface(), Counter::default(), SurfaceConfig::default()).unwrap();
        frame_loop.destroy_surface();

        assert!(frame_loop.tick(0.0).is_none());
        assert_eq!(frame_loop.handler().frames, 0);
    }

    #[test]
    fn clock_tracks_elapsed_and_delta() {
        let mut clock = FrameClock::default();
        clock.advance(10.0);
        clock.advance(10.5);

        assert_eq!(clock.frame_count(), 2);
        assert!((clock.elapsed() - 0.5).abs() < 1e-9);
        assert!((clock.delta() - 0.5).abs() < 1e-9);
    }
}
