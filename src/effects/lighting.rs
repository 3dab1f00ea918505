//! Lighting effects writing 0-255 intensities.

use core::f32::consts::PI;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::{instance_seed, Animate, OutputTargets};
use crate::traits::OutputBank;

const TAU: f32 = 2.0 * PI;

/// Reference frame time the flicker increment is expressed in (60 fps).
const FLICKER_FRAME_MS: f32 = 16.67;

// ============================================================================
// Steady
// ============================================================================

/// Fixed brightness while active.
#[derive(Clone, Debug)]
pub struct Steady {
    brightness: u8,
    active: bool,
}

impl Steady {
    /// Create a steady light at `brightness`.
    pub fn new(brightness: u8) -> Self {
        Self {
            brightness,
            active: false,
        }
    }

    /// Full brightness, as used by the standard function mappings.
    pub fn full() -> Self {
        Self::new(u8::MAX)
    }
}

impl Animate for Steady {
    fn update<B: OutputBank + ?Sized>(
        &mut self,
        _elapsed_ms: u32,
        outputs: &mut OutputTargets<'_, B>,
    ) -> Result<(), B::Error> {
        outputs.fill(if self.active { self.brightness } else { 0 })
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

// ============================================================================
// Dimming
// ============================================================================

/// Two brightness levels selected by the dimmed flag.
///
/// ```
/// use dcc_aux::effects::{Animate, Dimming};
///
/// let mut headlight = Dimming::new(255, 60);
/// headlight.set_dimmed(true);
/// assert!(headlight.is_dimmed());
/// assert_eq!(headlight.level(), 0); // inactive
///
/// headlight.set_active(true);
/// assert_eq!(headlight.level(), 60);
/// ```
#[derive(Clone, Debug)]
pub struct Dimming {
    full: u8,
    dimmed_level: u8,
    active: bool,
    dimmed: bool,
}

impl Dimming {
    /// Create a dimmable light.
    pub fn new(full: u8, dimmed: u8) -> Self {
        Self {
            full,
            dimmed_level: dimmed,
            active: false,
            dimmed: false,
        }
    }

    /// The level the outputs would receive right now.
    pub fn level(&self) -> u8 {
        match (self.active, self.dimmed) {
            (false, _) => 0,
            (true, true) => self.dimmed_level,
            (true, false) => self.full,
        }
    }
}

impl Animate for Dimming {
    fn update<B: OutputBank + ?Sized>(
        &mut self,
        _elapsed_ms: u32,
        outputs: &mut OutputTargets<'_, B>,
    ) -> Result<(), B::Error> {
        outputs.fill(self.level())
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_dimmed(&mut self, dimmed: bool) {
        self.dimmed = dimmed;
    }

    fn is_dimmed(&self) -> bool {
        self.dimmed
    }
}

// ============================================================================
// Flicker
// ============================================================================

/// Firebox or lantern flicker driven by smooth value noise.
///
/// The noise position advances by `0.01 + speed/255 × 0.1` per 16.67 ms of
/// elapsed time and the noise value in `[0, 1]` swings the output around
/// `base` by up to `depth / 2` in each direction.
///
/// The position is kept as a lattice cell plus a fraction in `[0, 1)`.
#[derive(Clone, Debug)]
pub struct Flicker {
    base: u8,
    depth: u8,
    increment: f32,
    cell: i32,
    fraction: f32,
    lattice_seed: u32,
    active: bool,
}

impl Flicker {
    /// Create a flicker around `base` with amplitude `depth`.
    pub fn new(base: u8, depth: u8, speed: u8) -> Self {
        let seed = ((base as u64) << 16) | ((depth as u64) << 8) | speed as u64;
        Self {
            base,
            depth,
            increment: 0.01 + (speed as f32 / 255.0) * 0.1,
            cell: 0,
            fraction: 0.0,
            lattice_seed: 0,
            active: false,
        }
        .with_seed(instance_seed(seed))
    }

    /// Reseed the noise for a reproducible sequence.
    pub fn with_seed(mut self, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.cell = rng.random_range(0..1000);
        self.fraction = rng.random_range(0.0..1.0);
        self.lattice_seed = rng.random();
        self
    }

    fn advance(&mut self, elapsed_ms: u32) {
        let position = self.fraction + self.increment * (elapsed_ms as f32 / FLICKER_FRAME_MS);
        let whole = libm::floorf(position);
        self.cell = self.cell.wrapping_add(whole as i32);
        self.fraction = position - whole;
    }

    fn lattice(&self, cell: i32) -> f32 {
        let mut h = (cell as u32).wrapping_mul(0x9E37_79B1) ^ self.lattice_seed;
        h ^= h >> 15;
        h = h.wrapping_mul(0x85EB_CA6B);
        h ^= h >> 13;
        (h & 0xFFFF) as f32 / 65535.0
    }

    /// Smoothstep-interpolated value noise in `[0, 1]`.
    fn noise(&self) -> f32 {
        let t = self.fraction;
        let t = t * t * (3.0 - 2.0 * t);
        let a = self.lattice(self.cell);
        let b = self.lattice(self.cell.wrapping_add(1));
        a + (b - a) * t
    }

    fn level(&self) -> u8 {
        let swing = (self.noise() * self.depth as f32) as i32;
        let value = self.base as i32 + swing - (self.depth / 2) as i32;
        value.clamp(0, 255) as u8
    }
}

impl Animate for Flicker {
    fn update<B: OutputBank + ?Sized>(
        &mut self,
        elapsed_ms: u32,
        outputs: &mut OutputTargets<'_, B>,
    ) -> Result<(), B::Error> {
        if !self.active {
            return outputs.fill(0);
        }
        self.advance(elapsed_ms);
        outputs.fill(self.level())
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

// ============================================================================
// Strobe
// ============================================================================

/// Periodic flash with a duty cycle.
///
/// ```
/// use dcc_aux::effects::Strobe;
///
/// let strobe = Strobe::new(10, 50, 200);
/// assert_eq!(strobe.period_ms(), 100);
/// assert_eq!(strobe.on_time_ms(), 50);
///
/// // 0 Hz is treated as 1 Hz
/// assert_eq!(Strobe::new(0, 50, 200).period_ms(), 1000);
/// ```
#[derive(Clone, Debug)]
pub struct Strobe {
    period_ms: u32,
    on_time_ms: u32,
    brightness: u8,
    timer: u32,
    active: bool,
}

impl Strobe {
    /// Create a strobe flashing at `frequency_hz`.
    pub fn new(frequency_hz: u16, duty_percent: u8, brightness: u8) -> Self {
        let period_ms = (1000 / frequency_hz.max(1) as u32).max(1);
        Self {
            period_ms,
            on_time_ms: period_ms * duty_percent.min(100) as u32 / 100,
            brightness,
            timer: 0,
            active: false,
        }
    }

    /// Length of one flash cycle.
    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    /// Lit part of each cycle.
    pub fn on_time_ms(&self) -> u32 {
        self.on_time_ms
    }
}

impl Animate for Strobe {
    fn update<B: OutputBank + ?Sized>(
        &mut self,
        elapsed_ms: u32,
        outputs: &mut OutputTargets<'_, B>,
    ) -> Result<(), B::Error> {
        if !self.active {
            return outputs.fill(0);
        }
        self.timer = ((self.timer as u64 + elapsed_ms as u64) % self.period_ms as u64) as u32;
        outputs.fill(if self.timer < self.on_time_ms {
            self.brightness
        } else {
            0
        })
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
        if !active {
            self.timer = 0;
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

// ============================================================================
// MarsLight
// ============================================================================

/// Oscillating beacon (Mars light, Gyralite) following a sine wave.
#[derive(Clone, Debug)]
pub struct MarsLight {
    period_ms: f32,
    peak: f32,
    phase_shift: f32,
    angle: f32,
    active: bool,
}

impl MarsLight {
    /// Create a beacon oscillating at `frequency_mhz` milli-Hertz.
    ///
    /// `phase_shift_percent` offsets the starting phase by a fraction of a
    /// full cycle, so several beacons can run out of step.
    pub fn new(frequency_mhz: u16, peak: u8, phase_shift_percent: i8) -> Self {
        let phase_shift = TAU * (phase_shift_percent as f32 / 100.0);
        Self {
            period_ms: 1_000_000.0 / frequency_mhz.max(1) as f32,
            peak: peak as f32,
            phase_shift,
            angle: phase_shift,
            active: false,
        }
    }

    /// Length of one oscillation.
    pub fn period_ms(&self) -> f32 {
        self.period_ms
    }
}

impl Animate for MarsLight {
    fn update<B: OutputBank + ?Sized>(
        &mut self,
        elapsed_ms: u32,
        outputs: &mut OutputTargets<'_, B>,
    ) -> Result<(), B::Error> {
        if !self.active {
            return outputs.fill(0);
        }
        let elapsed = libm::fmodf(elapsed_ms as f32, self.period_ms);
        self.angle += (TAU / self.period_ms) * elapsed;
        if self.angle > TAU + self.phase_shift {
            self.angle -= TAU;
        }
        let wave = (libm::sinf(self.angle) + 1.0) / 2.0;
        outputs.fill((wave * self.peak).clamp(0.0, 255.0) as u8)
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

// ============================================================================
// SoftStartStop
// ============================================================================

/// Linear fade towards `target` while active and back to 0 while inactive.
///
/// A zero fade time jumps straight to the end level.
#[derive(Clone, Debug)]
pub struct SoftStartStop {
    fade_in_per_ms: Option<f32>,
    fade_out_per_ms: Option<f32>,
    target: f32,
    current: f32,
    active: bool,
}

impl SoftStartStop {
    /// Create a fade with the given ramp durations.
    pub fn new(fade_in_ms: u16, fade_out_ms: u16, target: u8) -> Self {
        let rate = |ms: u16| (ms > 0).then(|| target as f32 / ms as f32);
        Self {
            fade_in_per_ms: rate(fade_in_ms),
            fade_out_per_ms: rate(fade_out_ms),
            target: target as f32,
            current: 0.0,
            active: false,
        }
    }

    /// Current level, truncated to an intensity.
    pub fn level(&self) -> u8 {
        self.current as u8
    }
}

impl Animate for SoftStartStop {
    fn update<B: OutputBank + ?Sized>(
        &mut self,
        elapsed_ms: u32,
        outputs: &mut OutputTargets<'_, B>,
    ) -> Result<(), B::Error> {
        if self.active {
            if self.current < self.target {
                self.current = match self.fade_in_per_ms {
                    Some(rate) => (self.current + rate * elapsed_ms as f32).min(self.target),
                    None => self.target,
                };
            }
        } else if self.current > 0.0 {
            self.current = match self.fade_out_per_ms {
                Some(rate) => (self.current - rate * elapsed_ms as f32).max(0.0),
                None => 0.0,
            };
        }
        outputs.fill(self.level())
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
