//! Heat-diffusion fire spread across a row of outputs.
//!
//! A classic "Fire2012" simulation: a row of heat cells cools randomly,
//! heat drifts away from the base, and sparks ignite near the base. Cell `i`
//! drives output slot `i`, so a firebox with three LEDs uses a fire of
//! length 3 bound to three outputs.

extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::{instance_seed, Animate, OutputTargets};
use crate::traits::OutputBank;

/// Sparks only ignite in the first few cells.
const SPARK_ZONE: usize = 7;

/// Heat-diffusion fire.
///
/// ```
/// use dcc_aux::effects::{Animate, Fire};
///
/// let fire = Fire::new(55, 120, 0);
/// assert_eq!(fire.heat().len(), 1); // zero length becomes one cell
/// assert!(!fire.is_active());
/// ```
#[derive(Clone, Debug)]
pub struct Fire {
    cooling: u8,
    sparking: u8,
    heat: Vec<u8>,
    rng: ChaCha8Rng,
    active: bool,
}

impl Fire {
    /// Create a fire of `length` cells.
    ///
    /// Higher `cooling` gives shorter flames, higher `sparking` a more
    /// roaring fire.
    pub fn new(cooling: u8, sparking: u8, length: u8) -> Self {
        let seed = ((cooling as u64) << 16) | ((sparking as u64) << 8) | length as u64;
        Self {
            cooling,
            sparking,
            heat: vec![0; length.max(1) as usize],
            rng: ChaCha8Rng::seed_from_u64(instance_seed(seed)),
            active: false,
        }
    }

    /// Reseed the random source for a reproducible fire.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    /// Current heat of every cell.
    pub fn heat(&self) -> &[u8] {
        &self.heat
    }

    fn simulate(&mut self) {
        let len = self.heat.len();

        let max_cooldown = (self.cooling as usize * 10 / len + 2).min(u8::MAX as usize) as u8;
        for cell in self.heat.iter_mut() {
            let cooldown = self.rng.random_range(0..max_cooldown);
            *cell = cell.saturating_sub(cooldown);
        }

        for k in (2..len).rev() {
            let drift = self.heat[k - 1] as u16 + 2 * self.heat[k - 2] as u16;
            self.heat[k] = (drift / 3) as u8;
        }

        if self.rng.random::<u8>() < self.sparking {
            let y = self.rng.random_range(0..len.min(SPARK_ZONE));
            let spark = self.rng.random_range(160..255u8);
            self.heat[y] = self.heat[y].saturating_add(spark);
        }
    }
}

impl Animate for Fire {
    fn update<B: OutputBank + ?Sized>(
        &mut self,
        _elapsed_ms: u32,
        outputs: &mut OutputTargets<'_, B>,
    ) -> Result<(), B::Error> {
        if !self.active {
            return outputs.fill(0);
        }
        self.simulate();
        let count = self.heat.len().min(outputs.len());
        for (slot, heat) in self.heat[..count].iter().enumerate() {
            outputs.set_value(slot, *heat)?;
        }
        Ok(())
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
