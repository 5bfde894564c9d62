//! Physics and interaction kernels.
//!
//! Every function here is synchronous and O(entity count). The constants are
//! the ones the sketches have always used; they are illustrative, not physical.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    entities::{Mirror, Particle, WaveState, Wavefront},
    Bounds,
};

pub const HIT_MARGIN: f32 = 10.0;
pub const REFLECTED_SPEED: f32 = 2.0;
pub const COHERENCE_PER_REFLECTION: f32 = 0.1;
pub const COHERENCE_SMOOTHING: f32 = 0.05;

pub const WAVE_SPEED: f32 = 2.0;
pub const WAVE_PHASE_STEP: f32 = 0.1;
pub const WAVE_POINT_SPACING: f32 = 0.3;
pub const WAVE_AMPLITUDE: f32 = 30.0;
pub const COLLAPSED_SPEED: f32 = 3.0;
pub const OBSERVATION_RADIUS: f32 = 100.0;
pub const INTERFERENCE_SCALE: f32 = 0.1;
pub const INTERFERENCE_STEP: f32 = 10.0;

pub const CONNECTION_ARC_HEIGHT: f32 = 2.0;
pub const CURVE_DIVISIONS: usize = 50;

const SPRING_TENSION: f32 = 300.0;
const SPRING_FRICTION: f32 = 20.0;
const SPRING_SUBSTEP: f32 = 0.001;
const SPRING_MAX_STEP: f32 = 0.1;

// Mirror universe ------------------------------------------------------------

/// Direction of the reflected velocity for a particle seen from the mirror
/// centre at `observed` radians, against a mirror oriented at `mirror_angle`.
pub fn reflection_angle(observed: f32, mirror_angle: f32) -> f32 {
    let normal = mirror_angle + FRAC_PI_2;
    let incident = observed - normal;
    normal - incident
}

/// Reflects `particle` off `mirror` if it is within reach, replacing its
/// velocity. Returns whether a reflection happened.
pub fn reflect(particle: &mut Particle, mirror: &Mirror) -> bool {
    let offset = particle.position - mirror.position;
    if offset.length() >= mirror.size * 0.5 + HIT_MARGIN {
        return false;
    }

    let observed = offset.y.atan2(offset.x);
    particle.velocity = Vec2::from_angle(reflection_angle(observed, mirror.angle)) * REFLECTED_SPEED;
    true
}

/// Tests every particle against every mirror and returns the number of
/// reflections. Empty collections simply yield zero.
pub fn reflect_all<'a>(
    particles: impl IntoIterator<Item = &'a mut Particle>,
    mirrors: &[Mirror],
) -> usize {
    let mut count = 0;
    for particle in particles {
        for mirror in mirrors {
            if reflect(particle, mirror) {
                count += 1;
            }
        }
    }
    count
}

/// Exponential smoothing step: `level += (target - level) * factor`.
pub fn smooth_toward(level: f32, target: f32, factor: f32) -> f32 {
    level + (target - level) * factor
}

/// Smoothed scalar in `[0, 1]` that rises with reflection frequency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CoherenceMeter {
    level: f32,
    target: f32,
}

impl CoherenceMeter {
    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    /// Folds one frame's reflection count into the level.
    pub fn update(&mut self, reflections: usize) -> f32 {
        self.target = (reflections as f32 * COHERENCE_PER_REFLECTION).min(1.0);
        self.level = smooth_toward(self.level, self.target, COHERENCE_SMOOTHING).clamp(0.0, 1.0);
        self.level
    }
}

// Quantum friendship ---------------------------------------------------------

/// Outcome of one correlated draw, keeping track of which branch produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionDraw {
    /// One boolean shared by both agents.
    Correlated(bool),
    /// One boolean per agent.
    Independent(bool, bool),
}

impl DecisionDraw {
    pub fn outcomes(&self) -> (bool, bool) {
        match *self {
            Self::Correlated(choice) => (choice, choice),
            Self::Independent(first, second) => (first, second),
        }
    }

    pub fn agrees(&self) -> bool {
        let (first, second) = self.outcomes();
        first == second
    }
}

/// Draws a threshold; below `coupling` both agents share a single draw,
/// otherwise each gets an independent draw.
pub fn correlated_decision<R: Rng + ?Sized>(rng: &mut R, coupling: f64) -> DecisionDraw {
    let coupling = coupling.clamp(0.0, 1.0);
    let threshold: f64 = rng.gen();
    if threshold < coupling {
        DecisionDraw::Correlated(rng.gen::<f64>() > 0.5)
    } else {
        DecisionDraw::Independent(rng.gen::<f64>() > 0.5, rng.gen::<f64>() > 0.5)
    }
}

/// Maps `value` from `[from_lo, from_hi]` onto `[0, 1]`, clamped.
pub fn normalize_clamped(value: f32, from_lo: f32, from_hi: f32) -> f32 {
    if (from_hi - from_lo).abs() <= f32::EPSILON {
        return 0.0;
    }
    ((value - from_lo) / (from_hi - from_lo)).clamp(0.0, 1.0)
}

// Wave-particle duality ------------------------------------------------------

/// Advances a wave instance by one frame.
pub fn propagate(wave: &mut Wavefront) {
    match wave.state() {
        WaveState::Propagating => {
            let base_y = wave.origin().y;
            for (index, point) in wave.points.iter_mut().enumerate() {
                point.position.x += WAVE_SPEED;
                point.phase += WAVE_PHASE_STEP;
                point.position.y = base_y
                    + (point.phase + index as f32 * WAVE_POINT_SPACING).sin() * WAVE_AMPLITUDE;
            }
        }
        WaveState::Collapsed { position } => {
            let next = Vec2::new(position.x + COLLAPSED_SPEED, wave.origin().y);
            wave.set_collapsed_position(next);
        }
    }
}

/// Collapses `wave` if its centroid lies within the observation radius of
/// `observer`. Returns true only on the frame the collapse happens.
pub fn observe(wave: &mut Wavefront, observer: Vec2) -> bool {
    if wave.is_collapsed() {
        return false;
    }
    let centroid = wave.centroid();
    if centroid.distance(observer) < OBSERVATION_RADIUS {
        wave.collapse_at(centroid)
    } else {
        false
    }
}

/// Whether the instance has left the surface through its far edge.
pub fn has_exited(wave: &Wavefront, bounds: Bounds) -> bool {
    wave.forward_position() > bounds.width
}

/// Interference intensity at `point` for apertures centred at `a` and `b`.
pub fn interference_intensity(point: Vec2, a: Vec2, b: Vec2) -> f32 {
    ((point.distance(a) - point.distance(b)) * INTERFERENCE_SCALE).sin()
}

/// Samples the interference overlay over its display grid.
pub fn interference_field(bounds: Bounds, a: Vec2, b: Vec2) -> Vec<(Vec2, f32)> {
    let mut samples = Vec::new();
    let mut x = bounds.width * 0.6;
    while x < bounds.width - 50.0 {
        let mut y = 100.0;
        while y < bounds.height - 100.0 {
            let point = Vec2::new(x, y);
            samples.push((point, interference_intensity(point, a, b)));
            y += INTERFERENCE_STEP;
        }
        x += INTERFERENCE_STEP;
    }
    samples
}

// Field scene ----------------------------------------------------------------

/// Midpoint control for a connection, lifted by `sin(strength * pi)`.
pub fn connection_midpoint(start: Vec3, end: Vec3, strength: f32) -> Vec3 {
    let mid = (start + end) * 0.5;
    mid + Vec3::Y * ((strength * PI).sin() * CONNECTION_ARC_HEIGHT)
}

/// Sampled curve through the two endpoints and the lifted midpoint.
pub fn connection_curve(start: Vec3, end: Vec3, strength: f32) -> Vec<Vec3> {
    let controls = [start, connection_midpoint(start, end, strength), end];
    catmull_rom_points(&controls, CURVE_DIVISIONS)
}

/// Samples an open centripetal Catmull-Rom spline at `divisions + 1` evenly
/// spaced parameters. Fewer than two controls are returned as-is.
pub fn catmull_rom_points(controls: &[Vec3], divisions: usize) -> Vec<Vec3> {
    if controls.len() < 2 {
        return controls.to_vec();
    }
    let divisions = divisions.max(1);
    (0..=divisions)
        .map(|d| catmull_rom_point(controls, d as f32 / divisions as f32))
        .collect()
}

fn catmull_rom_point(controls: &[Vec3], t: f32) -> Vec3 {
    let len = controls.len();
    let p = (len - 1) as f32 * t;
    let mut segment = p.floor() as usize;
    let mut weight = p - segment as f32;

    if segment >= len - 1 {
        segment = len - 2;
        weight = 1.0;
    }

    let p1 = controls[segment];
    let p2 = controls[segment + 1];
    let p0 = if segment > 0 {
        controls[segment - 1]
    } else {
        p1 + (p1 - p2)
    };
    let p3 = if segment + 2 < len {
        controls[segment + 2]
    } else {
        p2 + (p2 - p1)
    };

    let mut dt0 = p0.distance_squared(p1).powf(0.25);
    let mut dt1 = p1.distance_squared(p2).powf(0.25);
    let mut dt2 = p2.distance_squared(p3).powf(0.25);
    if dt1 < 1e-4 {
        dt1 = 1.0;
    }
    if dt0 < 1e-4 {
        dt0 = dt1;
    }
    if dt2 < 1e-4 {
        dt2 = dt1;
    }

    let t1 = ((p1 - p0) / dt0 - (p2 - p0) / (dt0 + dt1) + (p2 - p1) / dt1) * dt1;
    let t2 = ((p2 - p1) / dt1 - (p3 - p1) / (dt1 + dt2) + (p3 - p2) / dt2) * dt1;

    // Cubic Hermite between p1 and p2.
    let c2 = -3.0 * p1 + 3.0 * p2 - 2.0 * t1 - t2;
    let c3 = 2.0 * p1 - 2.0 * p2 + t1 + t2;
    p1 + t1 * weight + c2 * weight * weight + c3 * weight * weight * weight
}

/// Damped spring used for transient hover scaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleSpring {
    value: f32,
    velocity: f32,
    target: f32,
}

impl ScaleSpring {
    pub fn new(value: f32) -> Self {
        Self {
            value,
            velocity: 0.0,
            target: value,
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Integrates `dt` seconds in fixed substeps. Gaps are capped at 100 ms
    /// and NaN is ignored.
    pub fn step(&mut self, dt: f32) {
        let mut remaining = if dt.is_nan() {
            0.0
        } else {
            dt.clamp(0.0, SPRING_MAX_STEP)
        };
        while remaining > 0.0 {
            let h = remaining.min(SPRING_SUBSTEP);
            let force =
                -SPRING_TENSION * (self.value - self.target) - SPRING_FRICTION * self.velocity;
            self.velocity += force * h;
            self.value += self.velocity * h;
            remaining -= h;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::TAU;

    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn angle_diff(a: f32, b: f32) -> f32 {
        let d = (a - b).rem_euclid(TAU);
        d.min(TAU - d)
    }

    #[test]
    fn reflection_sets_speed_and_mirrored_direction() {
        let mirror = Mirror::new(Vec2::new(100.0, 100.0), 0.7, 80.0);
        let reach = mirror.size * 0.5 + HIT_MARGIN;

        for step in 0..64 {
            let observed = step as f32 / 64.0 * TAU;
            let position = mirror.position + Vec2::from_angle(observed) * (reach * 0.5);
            let mut particle = Particle::new(position, Vec2::new(0.3, 0.1), 0.0);

            assert!(reflect(&mut particle, &mirror));

            let normal = mirror.angle + FRAC_PI_2;
            let offset = position - mirror.position;
            let expected = 2.0 * normal - offset.y.atan2(offset.x);
            let velocity = particle.velocity;
            assert!((velocity.length() - REFLECTED_SPEED).abs() < 1e-4);
            assert!(angle_diff(velocity.y.atan2(velocity.x), expected) < 1e-3);
        }
    }

    #[test]
    fn particles_out_of_reach_are_untouched() {
        let mirror = Mirror::new(Vec2::ZERO, 0.0, 80.0);
        let mut particle = Particle::new(Vec2::new(50.0, 0.0), Vec2::new(1.0, 1.0), 0.0);

        assert!(!reflect(&mut particle, &mirror));
        assert_eq!(particle.velocity, Vec2::new(1.0, 1.0));
        assert_eq!(reflect_all(std::iter::empty(), &[mirror]), 0);
        assert_eq!(reflect_all([&mut particle], &[]), 0);
    }

    #[test]
    fn coherence_approaches_target_exponentially() {
        let mut meter = CoherenceMeter::default();
        let first = meter.update(5);
        assert!((first - 0.025).abs() < 1e-6);

        for _ in 0..500 {
            meter.update(20);
        }
        assert!((meter.level() - 1.0).abs() < 1e-3);
        assert_eq!(meter.target(), 1.0);

        for _ in 0..500 {
            meter.update(0);
        }
        assert!(meter.level() < 1e-3);
    }

    fn agreement_rate(coupling: f64, trials: usize, seed: u64) -> f64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let agreed = (0..trials)
            .filter(|_| correlated_decision(&mut rng, coupling).agrees())
            .count();
        agreed as f64 / trials as f64
    }

    #[test]
    fn full_coupling_always_agrees() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            assert!(matches!(
                correlated_decision(&mut rng, 1.0),
                DecisionDraw::Correlated(_)
            ));
        }
        assert_eq!(agreement_rate(1.0, 10_000, 1), 1.0);
    }

    #[test]
    fn zero_coupling_agrees_about_half_the_time() {
        let rate = agreement_rate(0.0, 20_000, 2);
        assert!((rate - 0.5).abs() < 0.02, "rate was {rate}");
    }

    #[test]
    fn agreement_rate_grows_with_coupling() {
        let couplings = [0.0, 0.25, 0.5, 0.75, 1.0];
        let rates: Vec<f64> = couplings
            .iter()
            .map(|&k| agreement_rate(k, 20_000, 3))
            .collect();

        for pair in rates.windows(2) {
            assert!(pair[1] >= pair[0] - 0.01, "rates were {rates:?}");
        }
        for (k, rate) in couplings.iter().zip(&rates) {
            let expected = 0.5 + 0.5 * k;
            assert!((rate - expected).abs() < 0.02, "k={k} rate={rate}");
        }
    }

    #[test]
    fn propagating_wave_is_spatially_extended() {
        let mut wave = Wavefront::new(Vec2::new(50.0, 200.0));
        for _ in 0..10 {
            propagate(&mut wave);
        }

        let points = wave.points();
        assert!(points.iter().all(|p| (p.position.x - 70.0).abs() < 1e-4));
        let expected = 200.0 + (1.0 + 3.0 * WAVE_POINT_SPACING).sin() * WAVE_AMPLITUDE;
        assert!((points[3].position.y - expected).abs() < 1e-3);
        let spread = points
            .iter()
            .map(|p| p.position.y)
            .fold(f32::MIN, f32::max)
            - points.iter().map(|p| p.position.y).fold(f32::MAX, f32::min);
        assert!(spread > WAVE_AMPLITUDE);
    }

    #[test]
    fn collapse_is_irreversible() {
        let mut wave = Wavefront::new(Vec2::new(50.0, 200.0));
        propagate(&mut wave);
        assert!(!observe(&mut wave, Vec2::new(500.0, 500.0)));
        let centroid = wave.centroid();
        assert!(observe(&mut wave, centroid));

        let observers = [Vec2::new(5_000.0, 0.0), Vec2::ZERO, wave.centroid()];
        for step in 0..30 {
            observe(&mut wave, observers[step % observers.len()]);
            propagate(&mut wave);
            assert!(wave.is_collapsed());
        }
    }

    #[test]
    fn collapsed_point_advances_at_its_own_speed() {
        let mut wave = Wavefront::new(Vec2::new(50.0, 200.0));
        propagate(&mut wave);
        observe(&mut wave, Vec2::new(52.0, 200.0));
        let start = wave.forward_position();
        propagate(&mut wave);

        assert!((wave.forward_position() - start - COLLAPSED_SPEED).abs() < 1e-4);
        assert_eq!(
            wave.state(),
            WaveState::Collapsed {
                position: Vec2::new(start + COLLAPSED_SPEED, 200.0)
            }
        );
    }

    #[test]
    fn interference_is_zero_on_the_symmetry_axis() {
        let a = Vec2::new(100.0, 80.0);
        let b = Vec2::new(100.0, 120.0);
        assert!(interference_intensity(Vec2::new(400.0, 100.0), a, b).abs() < 1e-5);

        let field = interference_field(Bounds::new(1000.0, 400.0), a, b);
        assert!(!field.is_empty());
        assert!(field.iter().all(|(_, i)| (-1.0..=1.0).contains(i)));
        assert!(field.iter().all(|(p, _)| p.x >= 600.0 && p.x < 950.0));
        assert!(interference_field(Bounds::new(10.0, 10.0), a, b).is_empty());
    }

    #[test]
    fn curve_passes_through_lifted_midpoint() {
        let start = Vec3::new(-3.0, 0.0, 0.0);
        let end = Vec3::new(3.0, 0.0, 0.0);
        let curve = connection_curve(start, end, 0.5);

        assert_eq!(curve.len(), CURVE_DIVISIONS + 1);
        assert!(curve[0].distance(start) < 1e-5);
        assert!(curve[CURVE_DIVISIONS].distance(end) < 1e-5);
        assert!(curve[CURVE_DIVISIONS / 2].distance(Vec3::new(0.0, 2.0, 0.0)) < 1e-4);
    }

    #[test]
    fn stronger_connections_arc_higher_up_to_half() {
        let start = Vec3::new(0.0, 3.0, 0.0);
        let end = Vec3::new(0.0, -3.0, 0.0);
        let lift = |s: f32| connection_midpoint(start, end, s).y;

        assert!(lift(0.0).abs() < 1e-6);
        assert!(lift(0.4) > lift(0.2));
        assert!((lift(0.5) - CONNECTION_ARC_HEIGHT).abs() < 1e-6);
    }

    #[test]
    fn spring_survives_unbounded_gaps() {
        let mut spring = ScaleSpring::new(1.0);
        spring.set_target(1.2);

        spring.step(f32::INFINITY);
        spring.step(f32::NAN);
        spring.step(1.0e9);
        spring.step(-5.0);
        assert!(spring.value().is_finite());

        for _ in 0..60 {
            spring.step(1.0e9);
        }
        assert!((spring.value() - 1.2).abs() < 1e-3);
    }

    #[test]
    fn normalizes_into_unit_range() {
        assert_eq!(normalize_clamped(-10.0, 0.0, 10.0), 0.0);
        assert_eq!(normalize_clamped(5.0, 0.0, 10.0), 0.5);
        assert_eq!(normalize_clamped(50.0, 0.0, 10.0), 1.0);
        assert_eq!(normalize_clamped(1.0, 2.0, 2.0), 0.0);
    }
}
