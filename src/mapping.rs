//! Condition variables and mapping rules.
//!
//! The function mapping is a two-level boolean graph:
//!
//! 1. A [`ConditionVariable`] is the AND of a few atomic [`Condition`]s
//!    (function key on, direction forward, speed above a threshold, …).
//!    An empty condition list is vacuously true.
//! 2. A [`MappingRule`] fires when all of its *positive* condition variables
//!    are true and none of its *negative* (blocking) ones is, and then applies
//!    a [`MappingAction`] to one logical function.
//!
//! # Evaluation
//!
//! [`MappingTable::evaluate_all`] recomputes every condition variable against
//! the [`DecoderState`] and the live logical functions. [`MappingTable::apply`]
//! then visits the rules in declaration order. Actions are staged on a copy of
//! each function's flags and committed once at the end, so an effect only sees
//! the net change of an evaluation pass.
//!
//! ```rust
//! use dcc_aux::mapping::{
//!     Condition, ConditionVariable, MappingAction, MappingRule, MappingTable,
//! };
//! use dcc_aux::function::LogicalFunction;
//! use dcc_aux::effects::Steady;
//! use dcc_aux::state::DecoderState;
//!
//! let mut table = MappingTable::new();
//! table.add_condition_variable(ConditionVariable::new(1, &[Condition::function_key(4)]).unwrap());
//! table.add_rule(MappingRule::new(0, MappingAction::Activate).require(1).unwrap());
//!
//! let mut functions = vec![LogicalFunction::new(Steady::full())];
//! let mut state = DecoderState::new();
//! state.set_function_state(4, true);
//!
//! let results = table.evaluate_all(&state, &functions);
//! table.apply(&results, &mut functions);
//! assert!(functions[0].is_active());
//! ```

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use tracing::trace;

use crate::compiler::CompileError;
use crate::function::{FunctionId, LogicalFunction};
use crate::state::{DecoderState, Direction};

/// Identifier of a condition variable.
pub type CvId = u16;

/// Maximum number of conditions in one condition variable.
pub const MAX_CONDITIONS: usize = 4;

/// Maximum number of ids in a rule's positive or negative set.
pub const MAX_RULE_CONDITIONS: usize = 8;

/// What a condition reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TriggerSource {
    /// A DCC function key; the parameter is the key number.
    FuncKey,
    /// Direction of travel, compared as Forward = 1, Reverse = 0.
    Direction,
    /// Current speed.
    Speed,
    /// Whether a logical function is active; the parameter is its index.
    LogicalFunctionState,
    /// An RCN-227 binary state; the parameter is its id.
    BinaryState,
}

impl TriggerSource {
    /// Sources addressing a boolean by index rather than producing a value.
    pub const fn is_indexed(self) -> bool {
        matches!(
            self,
            TriggerSource::FuncKey
                | TriggerSource::LogicalFunctionState
                | TriggerSource::BinaryState
        )
    }
}

/// How a condition compares its source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Comparator {
    /// `value == parameter`
    Eq,
    /// `value != parameter`
    Neq,
    /// `value > parameter`
    Gt,
    /// `value < parameter`
    Lt,
    /// `value >= parameter`
    Gte,
    /// `value <= parameter`
    Lte,
    /// `value & parameter != 0`
    BitAnd,
    /// Boolean sources: the addressed flag is set. Valued sources: `value != 0`.
    IsTrue,
}

impl Comparator {
    /// Compare a source value against a parameter.
    pub const fn compare(self, value: u16, parameter: u16) -> bool {
        match self {
            Comparator::Eq => value == parameter,
            Comparator::Neq => value != parameter,
            Comparator::Gt => value > parameter,
            Comparator::Lt => value < parameter,
            Comparator::Gte => value >= parameter,
            Comparator::Lte => value <= parameter,
            Comparator::BitAnd => value & parameter != 0,
            Comparator::IsTrue => value != 0,
        }
    }
}

/// A single atomic test against decoder state.
///
/// Indexed sources ([`FuncKey`], [`LogicalFunctionState`], [`BinaryState`])
/// use the parameter to pick the flag and only support
/// [`Comparator::IsTrue`]; any other comparator evaluates false. Valued
/// sources ([`Direction`], [`Speed`]) compare against the parameter.
///
/// [`FuncKey`]: TriggerSource::FuncKey
/// [`LogicalFunctionState`]: TriggerSource::LogicalFunctionState
/// [`BinaryState`]: TriggerSource::BinaryState
/// [`Direction`]: TriggerSource::Direction
/// [`Speed`]: TriggerSource::Speed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Condition {
    /// What to read.
    pub source: TriggerSource,
    /// How to compare.
    pub comparator: Comparator,
    /// Index or comparison value.
    pub parameter: u16,
}

impl Condition {
    /// Create a condition.
    pub const fn new(source: TriggerSource, comparator: Comparator, parameter: u16) -> Self {
        Self {
            source,
            comparator,
            parameter,
        }
    }

    /// Function key `function` is on.
    pub const fn function_key(function: u16) -> Self {
        Self::new(TriggerSource::FuncKey, Comparator::IsTrue, function)
    }

    /// Travelling in `direction`.
    pub const fn direction(direction: Direction) -> Self {
        Self::new(TriggerSource::Direction, Comparator::Eq, direction.value())
    }

    /// Binary state `id` is set.
    pub const fn binary_state(id: u16) -> Self {
        Self::new(TriggerSource::BinaryState, Comparator::IsTrue, id)
    }

    /// Logical function `index` is active.
    pub const fn function_active(index: FunctionId) -> Self {
        Self::new(TriggerSource::LogicalFunctionState, Comparator::IsTrue, index)
    }

    /// Speed compared against `threshold`.
    pub const fn speed(comparator: Comparator, threshold: u16) -> Self {
        Self::new(TriggerSource::Speed, comparator, threshold)
    }

    /// Evaluate against live state. Missing functions read inactive.
    pub fn evaluate(&self, state: &DecoderState, functions: &[LogicalFunction]) -> bool {
        if self.source.is_indexed() {
            if self.comparator != Comparator::IsTrue {
                return false;
            }
            return match self.source {
                TriggerSource::FuncKey => state.function_state(self.parameter),
                TriggerSource::BinaryState => state.binary_state(self.parameter),
                _ => functions
                    .get(self.parameter as usize)
                    .is_some_and(LogicalFunction::is_active),
            };
        }
        let value = match self.source {
            TriggerSource::Direction => state.direction().value(),
            _ => state.speed(),
        };
        self.comparator.compare(value, self.parameter)
    }
}

/// A named AND of conditions.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConditionVariable {
    /// Unique id within the compiled table.
    pub id: CvId,
    /// Conditions that must all hold.
    pub conditions: heapless::Vec<Condition, MAX_CONDITIONS>,
}

impl ConditionVariable {
    /// Create a condition variable from a list of conditions.
    pub fn new(id: CvId, conditions: &[Condition]) -> Result<Self, CompileError> {
        let conditions = heapless::Vec::from_slice(conditions)
            .map_err(|_| CompileError::TooManyConditions { id })?;
        Ok(Self { id, conditions })
    }

    /// AND over all conditions; true when there are none.
    pub fn evaluate(&self, state: &DecoderState, functions: &[LogicalFunction]) -> bool {
        self.conditions
            .iter()
            .all(|condition| condition.evaluate(state, functions))
    }
}

/// What a firing rule does to its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MappingAction {
    /// Switch the function on.
    Activate,
    /// Switch the function off.
    Deactivate,
    /// Invert the dimmed flag. Fires on every evaluation pass in which the
    /// rule holds, not only on its rising edge.
    ToggleDimmed,
}

/// A guarded action on one logical function.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MappingRule {
    /// Index of the logical function acted upon.
    pub target: FunctionId,
    /// Condition variables that must all be true.
    pub positive: heapless::Vec<CvId, MAX_RULE_CONDITIONS>,
    /// Condition variables of which none may be true.
    pub negative: heapless::Vec<CvId, MAX_RULE_CONDITIONS>,
    /// Action applied when the rule fires.
    pub action: MappingAction,
}

impl MappingRule {
    /// Create an unconditional rule.
    pub fn new(target: FunctionId, action: MappingAction) -> Self {
        Self {
            target,
            positive: heapless::Vec::new(),
            negative: heapless::Vec::new(),
            action,
        }
    }

    /// Add a required condition variable. Duplicates are ignored.
    pub fn require(mut self, id: CvId) -> Result<Self, CompileError> {
        insert_id(&mut self.positive, id, self.target)?;
        Ok(self)
    }

    /// Add a blocking condition variable. Duplicates are ignored.
    pub fn block(mut self, id: CvId) -> Result<Self, CompileError> {
        insert_id(&mut self.negative, id, self.target)?;
        Ok(self)
    }

    /// Add every id of `ids` as blocking.
    pub fn block_all(self, ids: &[CvId]) -> Result<Self, CompileError> {
        ids.iter().try_fold(self, |rule, id| rule.block(*id))
    }

    /// AND of the positive set, NOR of the negative set.
    ///
    /// Both checks are vacuously true on empty sets.
    pub fn fires(&self, results: &BTreeMap<CvId, bool>) -> bool {
        let lookup = |id: &CvId| results.get(id).copied().unwrap_or(false);
        self.positive.iter().all(lookup) && !self.negative.iter().any(lookup)
    }
}

fn insert_id(
    set: &mut heapless::Vec<CvId, MAX_RULE_CONDITIONS>,
    id: CvId,
    target: FunctionId,
) -> Result<(), CompileError> {
    if set.contains(&id) {
        return Ok(());
    }
    set.push(id)
        .map_err(|_| CompileError::TooManyRuleConditions { target })
}

/// Condition variables and rules of one compiled mapping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MappingTable {
    condition_variables: Vec<ConditionVariable>,
    rules: Vec<MappingRule>,
}

impl MappingTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition variable unless one with the same id exists.
    ///
    /// Returns `true` if it was added.
    pub fn add_condition_variable(&mut self, cv: ConditionVariable) -> bool {
        if self.contains_condition_variable(cv.id) {
            return false;
        }
        self.condition_variables.push(cv);
        true
    }

    /// Whether a condition variable with `id` exists.
    pub fn contains_condition_variable(&self, id: CvId) -> bool {
        self.condition_variables.iter().any(|cv| cv.id == id)
    }

    /// Append a rule.
    pub fn add_rule(&mut self, rule: MappingRule) {
        self.rules.push(rule);
    }

    /// Condition variables in declaration order.
    pub fn condition_variables(&self) -> &[ConditionVariable] {
        &self.condition_variables
    }

    /// Rules in declaration order.
    pub fn rules(&self) -> &[MappingRule] {
        &self.rules
    }

    /// Whether the table holds nothing.
    pub fn is_empty(&self) -> bool {
        self.condition_variables.is_empty() && self.rules.is_empty()
    }

    /// Recompute every condition variable.
    pub fn evaluate_all(
        &self,
        state: &DecoderState,
        functions: &[LogicalFunction],
    ) -> BTreeMap<CvId, bool> {
        self.condition_variables
            .iter()
            .map(|cv| (cv.id, cv.evaluate(state, functions)))
            .collect()
    }

    /// Apply every firing rule in declaration order.
    ///
    /// Rules targeting a function outside `functions` are skipped.
    pub fn apply(&self, results: &BTreeMap<CvId, bool>, functions: &mut [LogicalFunction]) {
        let mut staged: Vec<(bool, bool)> = functions
            .iter()
            .map(|f| (f.is_active(), f.is_dimmed()))
            .collect();

        for rule in &self.rules {
            if !rule.fires(results) {
                continue;
            }
            let Some(flags) = staged.get_mut(rule.target as usize) else {
                continue;
            };
            match rule.action {
                MappingAction::Activate => flags.0 = true,
                MappingAction::Deactivate => flags.0 = false,
                MappingAction::ToggleDimmed => flags.1 = !flags.1,
            }
        }

        for (index, (function, (active, dimmed))) in
            functions.iter_mut().zip(staged).enumerate()
        {
            if function.is_active() != active {
                trace!(function = index, active, "logical function switched");
                function.set_active(active);
            }
            if function.is_dimmed() != dimmed {
                function.set_dimmed(dimmed);
            }
        }
    }

    /// Check that every rule targets an existing function.
    pub fn verify(&self, function_count: usize) -> Result<(), CompileError> {
        match self
            .rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.target as usize >= function_count)
        {
            Some((index, rule)) => Err(CompileError::TargetOutOfRange {
                rule: index,
                target: rule.target,
                function_count,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{Dimming, Steady};
    use alloc::vec;

    fn results(pairs: &[(CvId, bool)]) -> BTreeMap<CvId, bool> {
        pairs.iter().copied().collect()
    }

    // === Condition Tests ===
    #[test]
    fn function_key_condition() {
        let mut state = DecoderState::new();
        let c = Condition::function_key(3);
        assert!(!c.evaluate(&state, &[]));
        state.set_function_state(3, true);
        assert!(c.evaluate(&state, &[]));
    }

    #[test]
    fn indexed_source_rejects_value_comparators() {
        let mut state = DecoderState::new();
        state.set_function_state(1, true);
        let c = Condition::new(TriggerSource::FuncKey, Comparator::Eq, 1);
        assert!(!c.evaluate(&state, &[]));
    }

    #[test]
    fn direction_condition() {
        let mut state = DecoderState::new();
        let forward = Condition::direction(Direction::Forward);
        let reverse = Condition::direction(Direction::Reverse);
        assert!(forward.evaluate(&state, &[]));
        assert!(!reverse.evaluate(&state, &[]));
        state.set_direction(Direction::Reverse);
        assert!(!forward.evaluate(&state, &[]));
        assert!(reverse.evaluate(&state, &[]));
    }

    #[test]
    fn speed_comparators() {
        let mut state = DecoderState::new();
        state.set_speed(50);
        let check = |cmp, p| Condition::speed(cmp, p).evaluate(&state, &[]);
        assert!(check(Comparator::Eq, 50));
        assert!(check(Comparator::Neq, 49));
        assert!(check(Comparator::Gt, 49));
        assert!(!check(Comparator::Gt, 50));
        assert!(check(Comparator::Lt, 51));
        assert!(check(Comparator::Gte, 50));
        assert!(check(Comparator::Lte, 50));
        assert!(check(Comparator::BitAnd, 0b0010_0000));
        assert!(!check(Comparator::BitAnd, 0b0000_0001));
        assert!(check(Comparator::IsTrue, 0));
    }

    #[test]
    fn binary_state_condition() {
        let mut state = DecoderState::new();
        let c = Condition::binary_state(300);
        assert!(!c.evaluate(&state, &[]));
        state.set_binary_state(300, true);
        assert!(c.evaluate(&state, &[]));
    }

    #[test]
    fn logical_function_state_condition() {
        let state = DecoderState::new();
        let mut functions = vec![LogicalFunction::new(Steady::full())];
        let c = Condition::function_active(0);
        assert!(!c.evaluate(&state, &functions));
        functions[0].set_active(true);
        assert!(c.evaluate(&state, &functions));
        assert!(!Condition::function_active(5).evaluate(&state, &functions));
    }

    // === ConditionVariable Tests ===
    #[test]
    fn empty_condition_variable_is_true() {
        let cv = ConditionVariable::new(1, &[]).unwrap();
        assert!(cv.evaluate(&DecoderState::new(), &[]));
    }

    #[test]
    fn condition_variable_is_and() {
        let mut state = DecoderState::new();
        let cv = ConditionVariable::new(
            1,
            &[
                Condition::function_key(0),
                Condition::direction(Direction::Forward),
            ],
        )
        .unwrap();
        assert!(!cv.evaluate(&state, &[]));
        state.set_function_state(0, true);
        assert!(cv.evaluate(&state, &[]));
        state.set_direction(Direction::Reverse);
        assert!(!cv.evaluate(&state, &[]));
    }

    #[test]
    fn condition_variable_capacity() {
        let many = [Condition::function_key(0); MAX_CONDITIONS + 1];
        assert_eq!(
            ConditionVariable::new(9, &many),
            Err(CompileError::TooManyConditions { id: 9 })
        );
    }

    // === MappingRule Tests ===
    #[test]
    fn rule_without_negatives_depends_on_positives() {
        let rule = MappingRule::new(0, MappingAction::Activate)
            .require(1)
            .unwrap()
            .require(2)
            .unwrap();
        assert!(rule.fires(&results(&[(1, true), (2, true)])));
        assert!(!rule.fires(&results(&[(1, true), (2, false)])));
        assert!(!rule.fires(&results(&[(1, true)])));
    }

    #[test]
    fn rule_negatives_block() {
        let rule = MappingRule::new(0, MappingAction::Activate)
            .require(1)
            .unwrap()
            .block_all(&[5, 6])
            .unwrap();
        assert!(rule.fires(&results(&[(1, true), (5, false)])));
        assert!(!rule.fires(&results(&[(1, true), (6, true)])));
    }

    #[test]
    fn unconditional_rule_always_fires() {
        let rule = MappingRule::new(0, MappingAction::Deactivate);
        assert!(rule.fires(&BTreeMap::new()));
    }

    #[test]
    fn rule_ids_are_a_set() {
        let rule = MappingRule::new(0, MappingAction::Activate)
            .require(1)
            .unwrap()
            .require(1)
            .unwrap();
        assert_eq!(rule.positive.len(), 1);
    }

    #[test]
    fn rule_capacity() {
        let ids: Vec<CvId> = (0..=MAX_RULE_CONDITIONS as CvId).collect();
        let result = MappingRule::new(3, MappingAction::Activate).block_all(&ids);
        assert_eq!(result, Err(CompileError::TooManyRuleConditions { target: 3 }));
    }

    // === MappingTable Tests ===
    #[test]
    fn table_dedupes_condition_variables() {
        let mut table = MappingTable::new();
        assert!(table.add_condition_variable(ConditionVariable::new(4, &[]).unwrap()));
        assert!(!table.add_condition_variable(
            ConditionVariable::new(4, &[Condition::function_key(1)]).unwrap()
        ));
        assert_eq!(table.condition_variables().len(), 1);
    }

    #[test]
    fn apply_in_declaration_order() {
        let mut table = MappingTable::new();
        table.add_rule(MappingRule::new(0, MappingAction::Activate));
        table.add_rule(MappingRule::new(0, MappingAction::Deactivate));
        let mut functions = vec![LogicalFunction::new(Steady::full())];
        table.apply(&BTreeMap::new(), &mut functions);
        assert!(!functions[0].is_active());
    }

    #[test]
    fn toggle_dimmed_alternates_each_pass() {
        let mut table = MappingTable::new();
        table.add_rule(MappingRule::new(0, MappingAction::ToggleDimmed));
        let mut functions = vec![LogicalFunction::new(Dimming::new(255, 10))];

        table.apply(&BTreeMap::new(), &mut functions);
        assert!(functions[0].is_dimmed());
        table.apply(&BTreeMap::new(), &mut functions);
        assert!(!functions[0].is_dimmed());
        table.apply(&BTreeMap::new(), &mut functions);
        assert!(functions[0].is_dimmed());
    }

    #[test]
    fn apply_skips_dangling_targets() {
        let mut table = MappingTable::new();
        table.add_rule(MappingRule::new(7, MappingAction::Activate));
        let mut functions = vec![LogicalFunction::new(Steady::full())];
        table.apply(&BTreeMap::new(), &mut functions);
        assert!(!functions[0].is_active());
    }

    #[test]
    fn verify_rejects_out_of_range_targets() {
        let mut table = MappingTable::new();
        table.add_rule(MappingRule::new(0, MappingAction::Activate));
        table.add_rule(MappingRule::new(2, MappingAction::Activate));
        assert!(table.verify(3).is_ok());
        assert_eq!(
            table.verify(2),
            Err(CompileError::TargetOutOfRange {
                rule: 1,
                target: 2,
                function_count: 2
            })
        );
    }

    #[test]
    fn evaluate_all_covers_every_variable() {
        let mut table = MappingTable::new();
        table.add_condition_variable(ConditionVariable::new(1, &[]).unwrap());
        table.add_condition_variable(
            ConditionVariable::new(2, &[Condition::function_key(9)]).unwrap(),
        );
        let results = table.evaluate_all(&DecoderState::new(), &[]);
        assert_eq!(results.len(), 2);
        assert_eq!(results[&1], true);
        assert_eq!(results[&2], false);
    }
}
