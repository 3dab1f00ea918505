//! Effect state machines driving physical outputs.
//!
//! Every logical function owns exactly one [`Effect`]. Effects are small,
//! self-contained animations: they hold only their own timing fields and
//! react to two inputs, the active flag and (for [`Dimming`]) the dimmed
//! flag, plus the elapsed time passed to each update.
//!
//! # Available Effects
//!
//! | Effect | Output | Character |
//! |--------|--------|-----------|
//! | [`Steady`] | intensity | Fixed brightness |
//! | [`Dimming`] | intensity | Full or dimmed brightness |
//! | [`Flicker`] | intensity | Firebox / lantern noise |
//! | [`Strobe`] | intensity | Periodic flash |
//! | [`MarsLight`] | intensity | Sinusoidal oscillating beacon |
//! | [`SoftStartStop`] | intensity | Linear fade in and out |
//! | [`Servo`] | angle | Ping-pong between two endpoints |
//! | [`SmokeGenerator`] | intensity | Heater + fan pair |
//! | [`Fire`] | intensity | Heat diffusion across several outputs |
//!
//! The variant set is closed: the standards define which effects a decoder
//! offers, so [`Effect`] is an enum dispatching to the [`Animate`]
//! implementation of each variant.
//!
//! # Example
//!
//! ```rust
//! use dcc_aux::effects::{Animate, Effect, OutputTargets, Strobe};
//! use dcc_aux::hal::MockOutput;
//! use dcc_aux::traits::{OutputId, OutputKind};
//!
//! let mut outputs = vec![MockOutput::new(OutputKind::Intensity)];
//! let ids = [OutputId(1)];
//!
//! let mut effect = Effect::from(Strobe::new(10, 50, 200));
//! effect.set_active(true);
//!
//! effect.update(30, &mut OutputTargets::new(&ids, &mut outputs)).unwrap();
//! assert_eq!(outputs[0].value, 200);
//!
//! effect.update(30, &mut OutputTargets::new(&ids, &mut outputs)).unwrap();
//! assert_eq!(outputs[0].value, 0);
//! ```

mod fire;
mod lighting;
mod mechanical;

pub use fire::Fire;
pub use lighting::{Dimming, Flicker, MarsLight, SoftStartStop, Steady, Strobe};
pub use mechanical::{Servo, SmokeGenerator};

use core::sync::atomic::{AtomicU32, Ordering};

use crate::traits::{OutputBank, OutputId};

static RANDOM_INSTANCES: AtomicU32 = AtomicU32::new(0);

/// Seed for a new randomised effect, mixed with a per-instance counter so
/// effects built with equal parameters still differ.
pub(crate) fn instance_seed(parameters: u64) -> u64 {
    let instance = RANDOM_INSTANCES.fetch_add(1, Ordering::Relaxed) as u64;
    parameters ^ instance.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// The outputs one logical function drives, resolved through a bank.
///
/// Slots are positions in the function's output list. Slots whose id does
/// not resolve in the bank are skipped by the bank itself.
pub struct OutputTargets<'a, B: OutputBank + ?Sized> {
    ids: &'a [OutputId],
    bank: &'a mut B,
}

impl<'a, B: OutputBank + ?Sized> OutputTargets<'a, B> {
    /// Bind an ordered id list to a bank.
    pub fn new(ids: &'a [OutputId], bank: &'a mut B) -> Self {
        Self { ids, bank }
    }

    /// Number of output slots.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether there are no output slots.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Write an intensity to every slot.
    pub fn fill(&mut self, value: u8) -> Result<(), B::Error> {
        for id in self.ids {
            self.bank.set_value(*id, value)?;
        }
        Ok(())
    }

    /// Write an intensity to one slot; missing slots are ignored.
    pub fn set_value(&mut self, slot: usize, value: u8) -> Result<(), B::Error> {
        match self.ids.get(slot) {
            Some(id) => self.bank.set_value(*id, value),
            None => Ok(()),
        }
    }

    /// Write a servo angle to every slot.
    pub fn fill_angle(&mut self, degrees: u16) -> Result<(), B::Error> {
        for id in self.ids {
            self.bank.set_servo_angle(*id, degrees)?;
        }
        Ok(())
    }
}

/// Common interface of all effect state machines.
pub trait Animate {
    /// Advance by `elapsed_ms` and write the resulting values.
    fn update<B: OutputBank + ?Sized>(
        &mut self,
        elapsed_ms: u32,
        outputs: &mut OutputTargets<'_, B>,
    ) -> Result<(), B::Error>;

    /// Activate or deactivate the effect.
    fn set_active(&mut self, active: bool);

    /// Whether the effect is active.
    fn is_active(&self) -> bool;

    /// Set the dimmed flag. Only effects with a dimmed level store it.
    fn set_dimmed(&mut self, _dimmed: bool) {}

    /// Whether the effect is dimmed.
    fn is_dimmed(&self) -> bool {
        false
    }
}

/// Any effect a logical function can own.
#[derive(Clone, Debug)]
pub enum Effect {
    /// Fixed brightness.
    Steady(Steady),
    /// Full or dimmed brightness.
    Dimming(Dimming),
    /// Noise-driven flicker.
    Flicker(Flicker),
    /// Periodic flash.
    Strobe(Strobe),
    /// Oscillating beacon.
    MarsLight(MarsLight),
    /// Linear fade in and out.
    SoftStartStop(SoftStartStop),
    /// Servo sweeping between two endpoints.
    Servo(Servo),
    /// Heater and fan of a smoke unit.
    SmokeGenerator(SmokeGenerator),
    /// Heat-diffusion fire.
    Fire(Fire),
}

macro_rules! dispatch {
    ($self:expr, $effect:ident => $body:expr) => {
        match $self {
            Effect::Steady($effect) => $body,
            Effect::Dimming($effect) => $body,
            Effect::Flicker($effect) => $body,
            Effect::Strobe($effect) => $body,
            Effect::MarsLight($effect) => $body,
            Effect::SoftStartStop($effect) => $body,
            Effect::Servo($effect) => $body,
            Effect::SmokeGenerator($effect) => $body,
            Effect::Fire($effect) => $body,
        }
    };
}

impl Animate for Effect {
    fn update<B: OutputBank + ?Sized>(
        &mut self,
        elapsed_ms: u32,
        outputs: &mut OutputTargets<'_, B>,
    ) -> Result<(), B::Error> {
        dispatch!(self, e => e.update(elapsed_ms, outputs))
    }

    fn set_active(&mut self, active: bool) {
        dispatch!(self, e => e.set_active(active))
    }

    fn is_active(&self) -> bool {
        dispatch!(self, e => e.is_active())
    }

    fn set_dimmed(&mut self, dimmed: bool) {
        dispatch!(self, e => e.set_dimmed(dimmed))
    }

    fn is_dimmed(&self) -> bool {
        dispatch!(self, e => e.is_dimmed())
    }
}

macro_rules! impl_from_variant {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Effect {
                fn from(effect: $variant) -> Self {
                    Effect::$variant(effect)
                }
            }
        )*
    };
}

impl_from_variant!(
    Steady,
    Dimming,
    Flicker,
    Strobe,
    MarsLight,
    SoftStartStop,
    Servo,
    SmokeGenerator,
    Fire,
);
