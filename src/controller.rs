//! The auxiliary function controller.
//!
//! [`AuxController`] owns the compiled function mapping and the decoder state
//! and drives the effects from the firmware's main loop.
//!
//! # Overview
//!
//! The controller:
//! - Compiles the function mapping from the configuration store
//! - Accepts function key, direction, speed and binary state updates
//! - Re-evaluates the mapping rules when that state changed
//! - Advances every effect and writes the physical outputs on each tick
//!
//! # Example
//!
//! ```rust
//! use dcc_aux::{AuxController, Direction};
//! use dcc_aux::hal::{MockConfigStore, MockOutput};
//! use dcc_aux::traits::OutputKind;
//!
//! // RCN-225: F0 forward on output 1, F0 reverse on output 2
//! let mut store = MockConfigStore::new();
//! store.set(96, 1);
//! store.set(33, 0b01);
//! store.set(34, 0b10);
//!
//! let mut controller = AuxController::new();
//! controller.load_from_cvs(&mut store).unwrap();
//! let mut outputs = vec![MockOutput::new(OutputKind::Intensity); 4];
//!
//! controller.set_function_state(0, true);
//! controller.tick(20, &mut outputs).unwrap();
//! assert_eq!((outputs[0].value, outputs[1].value), (255, 0));
//!
//! // compiled mappings only switch on, so output 1 stays lit
//! controller.set_direction(Direction::Reverse);
//! controller.tick(20, &mut outputs).unwrap();
//! assert_eq!((outputs[0].value, outputs[1].value), (255, 255));
//! ```
//!
//! # Timing
//!
//! Rules are evaluated at the start of a tick, before any effect advances,
//! and only when the state is dirty. A setter called between two ticks takes
//! effect on the next one.

extern crate alloc;

use alloc::vec::Vec;

use tracing::{debug, trace};

use crate::compiler::{self, CompileError, CompiledMapping};
use crate::config::CvLayout;
use crate::function::LogicalFunction;
use crate::mapping::{ConditionVariable, CvId, MappingRule, MappingTable};
use crate::state::{DecoderState, Direction};
use crate::traits::{ConfigStore, OutputBank};

/// Auxiliary function controller.
///
/// Outputs are not owned: the bank is lent to every [`tick`](Self::tick), so
/// the same outputs can also be driven by other firmware code between ticks.
#[derive(Debug, Default)]
pub struct AuxController {
    layout: CvLayout,
    functions: Vec<LogicalFunction>,
    table: MappingTable,
    state: DecoderState,
}

impl AuxController {
    /// Create a controller with an empty mapping and the default CV layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the CV layout used by [`load_from_cvs`](Self::load_from_cvs).
    pub fn with_layout(mut self, layout: CvLayout) -> Self {
        self.layout = layout;
        self
    }

    /// The CV layout in use.
    pub fn layout(&self) -> &CvLayout {
        &self.layout
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Compile the mapping from `store` and install it.
    ///
    /// On success the previous mapping is replaced and the decoder state is
    /// reset. On error the controller is left untouched.
    pub fn load_from_cvs<S: ConfigStore + ?Sized>(
        &mut self,
        store: &mut S,
    ) -> Result<(), CompileError> {
        let mapping = compiler::compile(store, &self.layout)?;
        self.install(mapping)
    }

    /// Install a prepared mapping.
    ///
    /// The mapping is verified first; the decoder state is reset on success.
    pub fn install(&mut self, mapping: CompiledMapping) -> Result<(), CompileError> {
        mapping.verify()?;
        let (functions, table) = mapping.into_parts();
        debug!(
            functions = functions.len(),
            condition_variables = table.condition_variables().len(),
            rules = table.rules().len(),
            "function mapping installed"
        );
        self.functions = functions;
        self.table = table;
        self.state.reset();
        Ok(())
    }

    /// Drop the mapping and return the decoder state to power-up defaults.
    pub fn reset(&mut self) {
        self.functions.clear();
        self.table = MappingTable::new();
        self.state.reset();
    }

    // ========================================================================
    // Main loop
    // ========================================================================

    /// Advance all effects by `elapsed_ms` and write the outputs.
    ///
    /// If any input changed since the last tick the rules are evaluated
    /// first. Driver errors stop the tick and are returned.
    pub fn tick<B: OutputBank + ?Sized>(
        &mut self,
        elapsed_ms: u32,
        outputs: &mut B,
    ) -> Result<(), B::Error> {
        if self.state.is_dirty() {
            self.evaluate();
        }
        for function in &mut self.functions {
            function.update(elapsed_ms, outputs)?;
        }
        Ok(())
    }

    fn evaluate(&mut self) {
        let results = self.table.evaluate_all(&self.state, &self.functions);
        trace!(condition_variables = results.len(), "evaluating mapping rules");
        self.table.apply(&results, &mut self.functions);
        self.state.store_condition_variables(results);
        self.state.clear_dirty();
    }

    // ========================================================================
    // Inputs
    // ========================================================================

    /// Set a function key (F0-F28). Returns `true` if the state changed.
    pub fn set_function_state(&mut self, function: u8, on: bool) -> bool {
        self.state.set_function_state(function, on)
    }

    /// Set the direction of travel. Returns `true` if it changed.
    pub fn set_direction(&mut self, direction: Direction) -> bool {
        self.state.set_direction(direction)
    }

    /// Set the current speed. Returns `true` if it changed.
    pub fn set_speed(&mut self, speed: u16) -> bool {
        self.state.set_speed(speed)
    }

    /// Set an RCN-227 binary state. Returns `true` if it changed.
    pub fn set_binary_state(&mut self, id: u16, value: bool) -> bool {
        self.state.set_binary_state(id, value)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Current decoder state.
    pub fn state(&self) -> &DecoderState {
        &self.state
    }

    /// Whether the next tick will re-evaluate the rules.
    pub fn is_dirty(&self) -> bool {
        self.state.is_dirty()
    }

    /// Result of condition variable `id` from the last evaluation.
    pub fn condition_variable_state(&self, id: CvId) -> bool {
        self.state.condition_variable_state(id)
    }

    /// Logical function at `index`.
    pub fn logical_function(&self, index: usize) -> Option<&LogicalFunction> {
        self.functions.get(index)
    }

    /// Mutable access to the logical function at `index`.
    ///
    /// A flag changed directly is overridden by any rule targeting the
    /// function that fires on the next evaluation pass.
    pub fn logical_function_mut(&mut self, index: usize) -> Option<&mut LogicalFunction> {
        self.functions.get_mut(index)
    }

    /// All logical functions in compiled order.
    pub fn logical_functions(&self) -> &[LogicalFunction] {
        &self.functions
    }

    /// Compiled condition variables.
    pub fn condition_variables(&self) -> &[ConditionVariable] {
        self.table.condition_variables()
    }

    /// Compiled mapping rules.
    pub fn mapping_rules(&self) -> &[MappingRule] {
        self.table.rules()
    }
}
