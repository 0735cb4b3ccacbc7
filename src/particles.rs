//! Pointer-reactive particle field.
//!
//! Pure simulation: no canvas, no clock. [`ParticleField::step`] advances
//! one display frame; drawing and frame scheduling live in
//! [`animator`](crate::animator).

use crate::config;
use rand::seq::IndexedRandom;
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ParticleError {
    EmptyPalette,
    /// A configured `(min, max)` range is empty or not finite
    InvalidRange(&'static str),
}

impl fmt::Display for ParticleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParticleError::EmptyPalette => write!(f, "Particle palette has no colours"),
            ParticleError::InvalidRange(name) => write!(f, "Invalid particle {} range", name),
        }
    }
}

impl std::error::Error for ParticleError {}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub radius: f64,
    pub color: &'static str,
    pub opacity: f64,
    /// Signed opacity change per frame
    pub fade: f64,
    /// Repulsion strength from the pointer
    pub density: f64,
}

/// Tuning for a [`ParticleField`]. Ranges are half-open `(min, max)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleConfig {
    pub count: usize,
    pub radius: (f64, f64),
    /// Each velocity component is drawn from `[-drift, drift)`
    pub drift: f64,
    pub start_opacity: (f64, f64),
    /// Fade rate is drawn from `[-fade, fade)`
    pub fade: f64,
    pub density: (f64, f64),
    pub palette: &'static [&'static str],
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            count: config::PARTICLE_COUNT,
            radius: (config::PARTICLE_MIN_RADIUS, config::PARTICLE_MAX_RADIUS),
            drift: config::PARTICLE_DRIFT,
            start_opacity: (config::PARTICLE_MIN_START_OPACITY, config::MAX_OPACITY),
            fade: config::PARTICLE_FADE_RATE,
            density: (config::PARTICLE_MIN_DENSITY, config::PARTICLE_MAX_DENSITY),
            palette: config::PARTICLE_PALETTE,
        }
    }
}

// Distributions built once per field, reused on every re-seed
#[derive(Debug, Clone)]
struct Sampler {
    radius: Uniform<f64>,
    drift: Uniform<f64>,
    opacity: Uniform<f64>,
    fade: Uniform<f64>,
    density: Uniform<f64>,
}

impl Sampler {
    fn new(cfg: &ParticleConfig) -> Result<Self, ParticleError> {
        if cfg.palette.is_empty() {
            return Err(ParticleError::EmptyPalette);
        }
        let range = |(lo, hi): (f64, f64), name: &'static str| {
            Uniform::<f64>::new(lo, hi).map_err(|_| ParticleError::InvalidRange(name))
        };
        Ok(Self {
            radius: range(cfg.radius, "radius")?,
            drift: range((-cfg.drift, cfg.drift), "drift")?,
            opacity: range(cfg.start_opacity, "opacity")?,
            fade: range((-cfg.fade, cfg.fade), "fade")?,
            density: range(cfg.density, "density")?,
        })
    }
}

/// Pointer position smoothed toward the latest raw sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pointer {
    current: Point,
    target: Point,
}

impl Pointer {
    pub fn at(point: Point) -> Self {
        Self {
            current: point,
            target: point,
        }
    }

    pub fn current(&self) -> Point {
        self.current
    }

    pub fn target(&self) -> Point {
        self.target
    }

    pub fn aim(&mut self, target: Point) {
        self.target = target;
    }

    /// Move `ease` of the remaining distance toward the target.
    pub fn ease(&mut self, ease: f64) {
        self.current.x += (self.target.x - self.current.x) * ease;
        self.current.y += (self.target.y - self.current.y) * ease;
    }
}

pub struct ParticleField {
    config: ParticleConfig,
    sampler: Sampler,
    width: f64,
    height: f64,
    particles: Vec<Particle>,
    pointer: Pointer,
}

impl ParticleField {
    pub fn new<R: Rng>(
        config: ParticleConfig,
        width: f64,
        height: f64,
        rng: &mut R,
    ) -> Result<Self, ParticleError> {
        let sampler = Sampler::new(&config)?;
        let mut field = Self {
            config,
            sampler,
            width: 0.0,
            height: 0.0,
            particles: Vec::new(),
            pointer: Pointer::default(),
        };
        field.resize(width, height, rng);
        Ok(field)
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn pointer(&self) -> &Pointer {
        &self.pointer
    }

    /// Discard every particle and seed a fresh set for the new bounds. The
    /// pointer recentres.
    pub fn resize<R: Rng>(&mut self, width: f64, height: f64, rng: &mut R) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
        self.pointer = Pointer::at(Point::new(self.width / 2.0, self.height / 2.0));
        self.particles.clear();
        for _ in 0..self.config.count {
            let particle = self.spawn(rng);
            self.particles.push(particle);
        }
    }

    fn spawn<R: Rng>(&self, rng: &mut R) -> Particle {
        let s = &self.sampler;
        Particle {
            x: rng.random::<f64>() * self.width,
            y: rng.random::<f64>() * self.height,
            vx: s.drift.sample(rng),
            vy: s.drift.sample(rng),
            radius: s.radius.sample(rng),
            color: self
                .config
                .palette
                .choose(rng)
                .copied()
                .unwrap_or(config::PARTICLE_PALETTE[0]),
            opacity: s.opacity.sample(rng),
            fade: s.fade.sample(rng),
            density: s.density.sample(rng),
        }
    }

    /// Record the latest raw pointer sample. Applied gradually by `step`.
    pub fn set_pointer_target(&mut self, x: f64, y: f64) {
        self.pointer.aim(Point::new(x, y));
    }

    /// Advance one frame.
    pub fn step(&mut self) {
        self.pointer.ease(config::POINTER_EASE);
        let pointer = self.pointer.current();
        let (width, height) = (self.width, self.height);

        for p in &mut self.particles {
            let dx = pointer.x - p.x;
            let dy = pointer.y - p.y;
            let distance = (dx * dx + dy * dy).sqrt();
            if distance < config::INTERACTION_RADIUS {
                let force = (config::INTERACTION_RADIUS - distance) / config::INTERACTION_RADIUS;
                let angle = dy.atan2(dx);
                let push = force * p.density * config::PUSH_SCALE;
                p.x -= angle.cos() * push;
                p.y -= angle.sin() * push;
            }

            p.x += p.vx;
            p.y += p.vy;

            // Triangular wave between the opacity bounds
            p.opacity += p.fade;
            if p.opacity >= config::MAX_OPACITY || p.opacity <= config::MIN_OPACITY {
                p.fade = -p.fade;
                p.opacity = p.opacity.clamp(config::MIN_OPACITY, config::MAX_OPACITY);
            }

            wrap(&mut p.x, width);
            wrap(&mut p.y, height);
        }
    }
}

/// Toroidal wrap with a margin so particles leave the screen fully before
/// reappearing.
#[inline]
fn wrap(coord: &mut f64, extent: f64) {
    let margin = config::WRAP_MARGIN;
    if *coord < -margin {
        *coord = extent + margin;
    } else if *coord > extent + margin {
        *coord = -margin;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn field(seed: u64, width: f64, height: f64) -> ParticleField {
        let mut rng = StdRng::seed_from_u64(seed);
        ParticleField::new(ParticleConfig::default(), width, height, &mut rng).unwrap()
    }

    fn single(field: &mut ParticleField, particle: Particle) {
        field.particles = vec![particle];
    }

    fn still_particle(x: f64, y: f64) -> Particle {
        Particle {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            radius: 3.0,
            color: "#3186FF",
            opacity: 0.5,
            fade: 0.0,
            density: 10.0,
        }
    }

    #[test]
    fn seeds_configured_count_inside_bounds() {
        let field = field(1, 800.0, 600.0);
        assert_eq!(field.particles().len(), config::PARTICLE_COUNT);
        for p in field.particles() {
            assert!((0.0..=800.0).contains(&p.x));
            assert!((0.0..=600.0).contains(&p.y));
            assert!((2.0..6.0).contains(&p.radius));
            assert!((0.3..1.0).contains(&p.opacity));
            assert!(config::PARTICLE_PALETTE.contains(&p.color));
        }
    }

    #[test]
    fn rejects_empty_palette() {
        let mut rng = StdRng::seed_from_u64(0);
        let cfg = ParticleConfig {
            palette: &[],
            ..ParticleConfig::default()
        };
        let err = ParticleField::new(cfg, 10.0, 10.0, &mut rng).err();
        assert_eq!(err, Some(ParticleError::EmptyPalette));
    }

    #[test]
    fn rejects_inverted_range() {
        let mut rng = StdRng::seed_from_u64(0);
        let cfg = ParticleConfig {
            density: (25.0, 5.0),
            ..ParticleConfig::default()
        };
        let err = ParticleField::new(cfg, 10.0, 10.0, &mut rng).err();
        assert_eq!(err, Some(ParticleError::InvalidRange("density")));
    }

    #[test]
    fn pointer_eases_five_percent_per_frame() {
        let mut field = field(2, 200.0, 200.0);
        field.particles.clear();
        field.set_pointer_target(200.0, 100.0);
        field.step();
        let p = field.pointer().current();
        assert!((p.x - 105.0).abs() < 1e-9);
        assert!((p.y - 100.0).abs() < 1e-9);
        assert_eq!(field.pointer().target(), Point::new(200.0, 100.0));
    }

    #[test]
    fn nearby_particle_is_pushed_away_from_pointer() {
        let mut field = field(3, 1000.0, 1000.0);
        // Pointer rests at the centre (500, 500)
        single(&mut field, still_particle(550.0, 500.0));
        field.step();
        let p = &field.particles()[0];
        // (1 - 50/150) * 10 * 0.5
        let expected = 550.0 + (100.0 / 150.0) * 10.0 * 0.5;
        assert!((p.x - expected).abs() < 1e-9, "x = {}", p.x);
        assert!((p.y - 500.0).abs() < 1e-9);
    }

    #[test]
    fn distant_particle_only_drifts() {
        let mut field = field(4, 1000.0, 1000.0);
        let mut particle = still_particle(100.0, 100.0);
        particle.vx = 0.2;
        particle.vy = -0.1;
        single(&mut field, particle);
        field.step();
        let p = &field.particles()[0];
        assert!((p.x - 100.2).abs() < 1e-9);
        assert!((p.y - 99.9).abs() < 1e-9);
    }

    #[test]
    fn wraps_to_opposite_edge() {
        let mut field = field(5, 300.0, 200.0);
        field.set_pointer_target(150.0, 100.0);
        let mut particle = still_particle(-10.0, 210.0);
        particle.vx = -0.5;
        particle.vy = 0.5;
        single(&mut field, particle);
        field.step();
        let p = &field.particles()[0];
        assert_eq!(p.x, 310.0);
        assert_eq!(p.y, -10.0);
    }

    #[test]
    fn opacity_reverses_at_band_edges() {
        let mut field = field(6, 1000.0, 1000.0);
        let mut particle = still_particle(10.0, 10.0);
        particle.opacity = 0.998;
        particle.fade = 0.005;
        single(&mut field, particle);
        field.step();
        let p = &field.particles()[0];
        assert_eq!(p.opacity, 1.0);
        assert!(p.fade < 0.0);
    }

    #[test]
    fn invariants_hold_over_many_frames() {
        let mut field = field(7, 640.0, 480.0);
        let mut rng = StdRng::seed_from_u64(99);
        for frame in 0..2000 {
            if frame % 25 == 0 {
                field.set_pointer_target(
                    rng.random_range(-50.0..690.0),
                    rng.random_range(-50.0..530.0),
                );
            }
            field.step();
            for p in field.particles() {
                assert!(p.x >= -10.0 && p.x <= 650.0, "x out of bounds: {}", p.x);
                assert!(p.y >= -10.0 && p.y <= 490.0, "y out of bounds: {}", p.y);
                assert!(p.opacity >= 0.2 - 1e-12 && p.opacity <= 1.0 + 1e-12);
            }
        }
    }

    #[test]
    fn resize_reseeds_and_recentres() {
        let mut field = field(8, 100.0, 100.0);
        field.set_pointer_target(0.0, 0.0);
        field.step();
        let before = field.particles().to_vec();
        let mut rng = StdRng::seed_from_u64(8);
        field.resize(400.0, 200.0, &mut rng);
        assert_eq!(field.particles().len(), before.len());
        assert_ne!(field.particles(), before.as_slice());
        assert_eq!(field.pointer().current(), Point::new(200.0, 100.0));
        assert_eq!(field.width(), 400.0);
    }
}
