//! Logical functions: one effect bound to an ordered list of outputs.
//!
//! A logical function is a named feature of the model ("front headlight",
//! "cab light", "coupler servo"). It owns its [`Effect`] and refers to the
//! outputs it drives by [`OutputId`]; the outputs themselves belong to the
//! surrounding firmware and are lent to [`LogicalFunction::update`].
//!
//! ```rust
//! use dcc_aux::function::LogicalFunction;
//! use dcc_aux::effects::Steady;
//! use dcc_aux::hal::MockOutput;
//! use dcc_aux::traits::{OutputId, OutputKind};
//!
//! let mut outputs = vec![MockOutput::new(OutputKind::Intensity); 2];
//!
//! let mut cab_light = LogicalFunction::new(Steady::new(90));
//! cab_light.add_output(OutputId(2));
//! cab_light.set_active(true);
//! cab_light.update(20, &mut outputs).unwrap();
//!
//! assert_eq!(outputs[1].value, 90);
//! ```

extern crate alloc;

use alloc::vec::Vec;

use crate::effects::{Animate, Effect, OutputTargets};
use crate::traits::{OutputBank, OutputId};

/// Index of a logical function in the compiled function table.
pub type FunctionId = u16;

/// A controllable feature bound to one effect and a set of outputs.
#[derive(Clone, Debug)]
pub struct LogicalFunction {
    effect: Effect,
    outputs: Vec<OutputId>,
}

impl LogicalFunction {
    /// Create a function owning `effect`, with no outputs yet.
    pub fn new(effect: impl Into<Effect>) -> Self {
        Self {
            effect: effect.into(),
            outputs: Vec::new(),
        }
    }

    /// Builder form of [`add_output`](Self::add_output).
    pub fn with_output(mut self, output: OutputId) -> Self {
        self.add_output(output);
        self
    }

    /// Append an output to drive.
    pub fn add_output(&mut self, output: OutputId) {
        self.outputs.push(output);
    }

    /// Outputs in the order the effect addresses them.
    pub fn outputs(&self) -> &[OutputId] {
        &self.outputs
    }

    /// The owned effect.
    pub fn effect(&self) -> &Effect {
        &self.effect
    }

    /// Advance the effect and write its outputs.
    pub fn update<B: OutputBank + ?Sized>(
        &mut self,
        elapsed_ms: u32,
        bank: &mut B,
    ) -> Result<(), B::Error> {
        self.effect
            .update(elapsed_ms, &mut OutputTargets::new(&self.outputs, bank))
    }

    /// Activate or deactivate the effect.
    pub fn set_active(&mut self, active: bool) {
        self.effect.set_active(active);
    }

    /// Whether the effect is active.
    pub fn is_active(&self) -> bool {
        self.effect.is_active()
    }

    /// Set the dimmed flag of the effect.
    pub fn set_dimmed(&mut self, dimmed: bool) {
        self.effect.set_dimmed(dimmed);
    }

    /// Whether the effect is dimmed.
    pub fn is_dimmed(&self) -> bool {
        self.effect.is_dimmed()
    }
}
