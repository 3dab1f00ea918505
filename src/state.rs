//! Live decoder state consumed by the rule engine.
//!
//! [`DecoderState`] is the explicit context the mapping rules are evaluated
//! against: function keys, direction, speed and RCN-227 binary states. It
//! also carries the cache of condition-variable results from the last
//! evaluation pass and a dirty flag.
//!
//! Every setter is compare-and-set: only an actual change marks the state
//! dirty, so protocol receivers can forward repeated packets without
//! triggering re-evaluation.
//!
//! ```rust
//! use dcc_aux::state::{DecoderState, Direction};
//!
//! let mut state = DecoderState::new();
//! state.clear_dirty();
//!
//! assert!(state.set_function_state(0, true));
//! assert!(!state.set_function_state(0, true)); // no change
//! assert!(state.is_dirty());
//!
//! assert!(!state.set_direction(Direction::Forward)); // already forward
//! ```

extern crate alloc;

use alloc::collections::BTreeMap;

use crate::mapping::CvId;

/// Number of DCC function keys tracked (F0-F28).
pub const MAX_FUNCTIONS: usize = 29;

/// Direction of travel as seen by the decoder.
///
/// # Default
///
/// Defaults to [`Forward`](Self::Forward), the power-up direction of a
/// decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    /// Reverse travel. Compared as `0` by direction conditions.
    Reverse = 0,
    /// Forward travel. Compared as `1` by direction conditions.
    #[default]
    Forward = 1,
}

impl Direction {
    /// Numeric value used when a condition compares the direction.
    #[inline]
    pub const fn value(self) -> u16 {
        self as u16
    }

    /// Returns the direction as a lowercase string.
    ///
    /// ```
    /// use dcc_aux::state::Direction;
    ///
    /// assert_eq!(Direction::Forward.as_str(), "forward");
    /// assert_eq!(Direction::Reverse.as_str(), "reverse");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Reverse => "reverse",
        }
    }

    /// Direction for the `dir` index used by the RCN-227 matrices
    /// (0 = forward, 1 = reverse).
    #[inline]
    pub const fn from_matrix_index(dir: usize) -> Self {
        if dir == 0 {
            Direction::Forward
        } else {
            Direction::Reverse
        }
    }
}

/// Mutable snapshot of everything the mapping rules can observe.
#[derive(Clone, Debug)]
pub struct DecoderState {
    function_states: [bool; MAX_FUNCTIONS],
    direction: Direction,
    speed: u16,
    binary_states: BTreeMap<u16, bool>,
    condition_variable_cache: BTreeMap<CvId, bool>,
    dirty: bool,
}

impl DecoderState {
    /// Create a state with every key off, forward, speed 0, marked dirty.
    pub fn new() -> Self {
        Self {
            function_states: [false; MAX_FUNCTIONS],
            direction: Direction::Forward,
            speed: 0,
            binary_states: BTreeMap::new(),
            condition_variable_cache: BTreeMap::new(),
            dirty: true,
        }
    }

    /// Return to power-up defaults and mark dirty.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Set a function key. Keys beyond F28 are ignored.
    ///
    /// Returns `true` if the state changed.
    pub fn set_function_state(&mut self, function: u8, on: bool) -> bool {
        match self.function_states.get_mut(function as usize) {
            Some(slot) if *slot != on => {
                *slot = on;
                self.dirty = true;
                true
            }
            _ => false,
        }
    }

    /// Set the direction of travel. Returns `true` if it changed.
    pub fn set_direction(&mut self, direction: Direction) -> bool {
        if self.direction == direction {
            return false;
        }
        self.direction = direction;
        self.dirty = true;
        true
    }

    /// Set the current speed. Returns `true` if it changed.
    pub fn set_speed(&mut self, speed: u16) -> bool {
        if self.speed == speed {
            return false;
        }
        self.speed = speed;
        self.dirty = true;
        true
    }

    /// Set a binary state. Returns `true` if it changed.
    ///
    /// A binary state that was never set reads `false`, but writing `false`
    /// to it for the first time still counts as a change.
    pub fn set_binary_state(&mut self, id: u16, value: bool) -> bool {
        if self.binary_states.get(&id) == Some(&value) {
            return false;
        }
        self.binary_states.insert(id, value);
        self.dirty = true;
        true
    }

    /// State of a function key; keys beyond F28 read `false`.
    pub fn function_state(&self, function: u16) -> bool {
        self.function_states
            .get(function as usize)
            .copied()
            .unwrap_or(false)
    }

    /// Current direction of travel.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Current speed.
    pub fn speed(&self) -> u16 {
        self.speed
    }

    /// Value of a binary state; unknown ids read `false`.
    pub fn binary_state(&self, id: u16) -> bool {
        self.binary_states.get(&id).copied().unwrap_or(false)
    }

    /// Cached result of a condition variable; unknown ids read `false`.
    pub fn condition_variable_state(&self, id: CvId) -> bool {
        self.condition_variable_cache
            .get(&id)
            .copied()
            .unwrap_or(false)
    }

    /// Replace the condition-variable cache with a fresh evaluation.
    pub fn store_condition_variables(&mut self, cache: BTreeMap<CvId, bool>) {
        self.condition_variable_cache = cache;
    }

    /// Whether any input changed since the last evaluation.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark the state as evaluated.
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Force re-evaluation on the next tick.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

impl Default for DecoderState {
    fn default() -> Self {
        Self::new()
    }
}
