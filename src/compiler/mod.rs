//! Function mapping compiler.
//!
//! Reads the decoder's configuration variables and compiles them into
//! [`LogicalFunction`]s plus a [`MappingTable`] of condition variables and
//! rules. The mapping method CV selects one of five layouts:
//!
//! | Method | Layout | Module |
//! |--------|--------|--------|
//! | 1 | RCN-225 output location CVs | [`basic`] |
//! | 2 | RCN-227 per-function matrix | [`per_function`] |
//! | 3 | RCN-227 per-output, function bitmask | [`per_output`] |
//! | 4 | RCN-227 per-output, function numbers | [`per_output`] |
//! | 5 | RCN-227 per-output, descriptors | [`per_output`] |
//!
//! Every decoder creates at most one logical function per output, driving it
//! with `Steady(255)`, and emits one `Activate` rule per trigger. Compiled
//! rules never switch a function off again; a hand-built mapping installed
//! through [`AuxController::install`](crate::AuxController::install) can add
//! `Deactivate` rules for that.
//!
//! # Condition variable ids
//!
//! Each layout draws its ids from its own range, so ids never collide:
//!
//! | Layout | Slot ids | Blocking ids |
//! |--------|----------|--------------|
//! | RCN-225 | 1 + slot | - |
//! | Per-function | 1000 + f·2 + dir | 1500 + function |
//! | Per-output V1 | 2000 + out·64 + dir·32 + f | - |
//! | Per-output V2 | 4000 + out·8 + dir·4 + i | 4500 + function |
//! | Per-output V3 | 5000 + out·8 + i | 5000 + out·8 + i |
//!
//! # Example
//!
//! ```rust
//! use dcc_aux::compiler::{compile, MappingMethod};
//! use dcc_aux::config::CvLayout;
//! use dcc_aux::hal::MockConfigStore;
//!
//! let layout = CvLayout::default();
//! let mut store = MockConfigStore::new();
//! store.set(layout.mapping_method_cv, MappingMethod::Rcn225 as u8);
//! store.set(layout.basic_first_cv, 0b0000_0001); // F0 forward -> output 1
//!
//! let mapping = compile(&mut store, &layout).unwrap();
//! assert_eq!(mapping.functions().len(), 1);
//! assert_eq!(mapping.rules().len(), 1);
//! ```

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::CvLayout;
use crate::effects::Steady;
use crate::function::{FunctionId, LogicalFunction};
use crate::mapping::{
    Condition, ConditionVariable, CvId, MappingAction, MappingRule, MappingTable,
};
use crate::state::Direction;
use crate::traits::{ConfigStore, OutputId};

pub mod basic;
pub mod per_function;
pub mod per_output;

// ============================================================================
// Errors
// ============================================================================

/// Errors raised while compiling or installing a function mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CompileError {
    /// A rule targets a function outside the function table.
    #[error("rule {rule} targets function {target}, but only {function_count} functions exist")]
    TargetOutOfRange {
        /// Position of the rule in the table.
        rule: usize,
        /// Offending target index.
        target: FunctionId,
        /// Size of the function table.
        function_count: usize,
    },
    /// A condition variable holds more conditions than fit.
    #[error("condition variable {id} has too many conditions")]
    TooManyConditions {
        /// Id of the condition variable.
        id: CvId,
    },
    /// A rule references more condition variables than fit.
    #[error("rule for function {target} references too many condition variables")]
    TooManyRuleConditions {
        /// Target of the rule.
        target: FunctionId,
    },
}

// ============================================================================
// Mapping Method
// ============================================================================

/// Layout selected by the mapping method CV.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum MappingMethod {
    /// Manufacturer-specific mapping; compiles to nothing.
    Proprietary = 0,
    /// RCN-225 output location CVs.
    Rcn225 = 1,
    /// RCN-227 per-function output matrix.
    PerFunction = 2,
    /// RCN-227 per-output function bitmask.
    PerOutputV1 = 3,
    /// RCN-227 per-output function numbers with blocking.
    PerOutputV2 = 4,
    /// RCN-227 per-output function descriptors.
    PerOutputV3 = 5,
}

impl MappingMethod {
    /// Decode a mapping method CV value.
    pub const fn from_cv(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Proprietary),
            1 => Some(Self::Rcn225),
            2 => Some(Self::PerFunction),
            3 => Some(Self::PerOutputV1),
            4 => Some(Self::PerOutputV2),
            5 => Some(Self::PerOutputV3),
            _ => None,
        }
    }

    /// Human-readable name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Proprietary => "proprietary",
            Self::Rcn225 => "RCN-225",
            Self::PerFunction => "RCN-227 per-function",
            Self::PerOutputV1 => "RCN-227 per-output V1",
            Self::PerOutputV2 => "RCN-227 per-output V2",
            Self::PerOutputV3 => "RCN-227 per-output V3",
        }
    }
}

// ============================================================================
// Compiled Mapping
// ============================================================================

/// Result of a compile pass: the function table and its mapping table.
///
/// A `CompiledMapping` can also be assembled by hand to bind richer effects
/// than the standard layouts express, then handed to
/// [`AuxController::install`](crate::AuxController::install).
///
/// ```rust
/// use dcc_aux::compiler::CompiledMapping;
/// use dcc_aux::effects::Strobe;
/// use dcc_aux::function::LogicalFunction;
/// use dcc_aux::mapping::{Condition, ConditionVariable, MappingAction, MappingRule, MappingTable};
/// use dcc_aux::traits::OutputId;
///
/// let mut table = MappingTable::new();
/// table.add_condition_variable(ConditionVariable::new(1, &[Condition::function_key(5)]).unwrap());
/// table.add_rule(MappingRule::new(0, MappingAction::Deactivate));
/// table.add_rule(MappingRule::new(0, MappingAction::Activate).require(1).unwrap());
///
/// let beacon = LogicalFunction::new(Strobe::new(2, 20, 255)).with_output(OutputId(3));
/// let mapping = CompiledMapping::new(vec![beacon], table);
/// assert!(mapping.verify().is_ok());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CompiledMapping {
    functions: Vec<LogicalFunction>,
    table: MappingTable,
}

impl CompiledMapping {
    /// Bundle a function table with its mapping table.
    pub fn new(functions: Vec<LogicalFunction>, table: MappingTable) -> Self {
        Self { functions, table }
    }

    /// Logical functions in compiled order.
    pub fn functions(&self) -> &[LogicalFunction] {
        &self.functions
    }

    /// Condition variables and rules.
    pub fn table(&self) -> &MappingTable {
        &self.table
    }

    /// Condition variables in declaration order.
    pub fn condition_variables(&self) -> &[ConditionVariable] {
        self.table.condition_variables()
    }

    /// Rules in declaration order.
    pub fn rules(&self) -> &[MappingRule] {
        self.table.rules()
    }

    /// Whether nothing was configured.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.table.is_empty()
    }

    /// Check that every rule targets an existing function.
    pub fn verify(&self) -> Result<(), CompileError> {
        self.table.verify(self.functions.len())
    }

    /// Split into the function table and the mapping table.
    pub fn into_parts(self) -> (Vec<LogicalFunction>, MappingTable) {
        (self.functions, self.table)
    }
}

// ============================================================================
// Compile
// ============================================================================

/// Compile the mapping selected by `layout.mapping_method_cv`.
///
/// Proprietary and unknown methods compile to an empty mapping. The result
/// is verified before it is returned.
#[instrument(level = "debug", skip_all)]
pub fn compile<S: ConfigStore + ?Sized>(
    store: &mut S,
    layout: &CvLayout,
) -> Result<CompiledMapping, CompileError> {
    let raw = store.read_byte(layout.mapping_method_cv);
    let Some(method) = MappingMethod::from_cv(raw) else {
        warn!(value = raw, "unsupported mapping method, nothing mapped");
        return Ok(CompiledMapping::default());
    };

    let mut builder = MappingBuilder::new();
    match method {
        MappingMethod::Proprietary => {}
        MappingMethod::Rcn225 => basic::decode(store, layout, &mut builder)?,
        MappingMethod::PerFunction => per_function::decode(store, layout, &mut builder)?,
        MappingMethod::PerOutputV1 => per_output::decode_v1(store, layout, &mut builder)?,
        MappingMethod::PerOutputV2 => per_output::decode_v2(store, layout, &mut builder)?,
        MappingMethod::PerOutputV3 => per_output::decode_v3(store, layout, &mut builder)?,
    }

    let mapping = builder.finish()?;
    debug!(
        method = method.as_str(),
        functions = mapping.functions().len(),
        condition_variables = mapping.condition_variables().len(),
        rules = mapping.rules().len(),
        "compiled function mapping"
    );
    Ok(mapping)
}

// ============================================================================
// Builder
// ============================================================================

/// Accumulates functions, condition variables and rules for one compile pass.
#[derive(Debug, Default)]
pub(crate) struct MappingBuilder {
    functions: Vec<LogicalFunction>,
    by_output: BTreeMap<OutputId, FunctionId>,
    table: MappingTable,
}

impl MappingBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Function driving `output`, created on first use.
    pub(crate) fn function_for(&mut self, output: OutputId) -> FunctionId {
        if let Some(index) = self.by_output.get(&output) {
            return *index;
        }
        let index = self.functions.len() as FunctionId;
        self.functions
            .push(LogicalFunction::new(Steady::full()).with_output(output));
        self.by_output.insert(output, index);
        index
    }

    /// Register a condition variable for `condition`, optionally restricted
    /// to one direction.
    pub(crate) fn trigger(
        &mut self,
        id: CvId,
        condition: Condition,
        direction: Option<Direction>,
    ) -> Result<(), CompileError> {
        match direction {
            Some(direction) => {
                self.condition_variable(id, &[condition, Condition::direction(direction)])
            }
            None => self.condition_variable(id, &[condition]),
        }
    }

    /// Register a condition variable unless `id` is already taken.
    pub(crate) fn condition_variable(
        &mut self,
        id: CvId,
        conditions: &[Condition],
    ) -> Result<(), CompileError> {
        if !self.table.contains_condition_variable(id) {
            self.table
                .add_condition_variable(ConditionVariable::new(id, conditions)?);
        }
        Ok(())
    }

    /// Switch `output` on when `trigger` holds and no id of `blocking` does.
    pub(crate) fn activate(
        &mut self,
        output: OutputId,
        trigger: CvId,
        blocking: &[CvId],
    ) -> Result<(), CompileError> {
        let target = self.function_for(output);
        let rule = MappingRule::new(target, MappingAction::Activate)
            .require(trigger)?
            .block_all(blocking)?;
        self.table.add_rule(rule);
        Ok(())
    }

    pub(crate) fn finish(self) -> Result<CompiledMapping, CompileError> {
        let mapping = CompiledMapping::new(self.functions, self.table);
        mapping.verify()?;
        Ok(mapping)
    }
}

/// Selects an indexed CV page and reads from it.
pub(crate) struct Page<'a, S: ConfigStore + ?Sized> {
    store: &'a mut S,
    base: u16,
}

impl<'a, S: ConfigStore + ?Sized> Page<'a, S> {
    /// Write the page selector, high byte first.
    pub(crate) fn open(store: &'a mut S, layout: &CvLayout, page: u8) -> Self {
        store.write_byte(layout.index_high_cv, 0);
        store.write_byte(layout.index_low_cv, page);
        Self {
            store,
            base: layout.indexed_base_cv,
        }
    }

    pub(crate) fn byte(&mut self, offset: u16) -> u8 {
        self.store.read_byte(self.base.wrapping_add(offset))
    }

    /// Little-endian value of `N` bytes starting at `offset`.
    pub(crate) fn le_bits<const N: usize>(&mut self, offset: u16) -> u32 {
        (0..N as u16).fold(0, |acc, i| acc | (self.byte(offset + i) as u32) << (8 * i))
    }
}

/// Unused descriptor byte.
pub(crate) const UNUSED: u8 = 0xFF;

/// Outputs selected by the set bits of `mask`, bit 0 first.
pub(crate) fn outputs_in(mask: u32) -> impl Iterator<Item = OutputId> {
    (0..32u8)
        .filter(move |bit| mask & (1u32 << bit) != 0)
        .map(|bit| OutputId(bit + 1))
}
