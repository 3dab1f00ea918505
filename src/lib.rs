//! # dcc-aux
//!
//! Auxiliary function engine for model railroad decoders: lights, servos,
//! smoke units and fire effects switched by DCC function keys.
//!
//! ## Features
//!
//! - **Function mapping compiler**: RCN-225 output location CVs and the four
//!   RCN-227 layouts (per-function, per-output V1/V2/V3)
//! - **Rule engine**: AND/NOR mapping rules over function keys, direction,
//!   speed, binary states and other functions
//! - **Effects**: steady, dimming, flicker, strobe, Mars light, soft
//!   start/stop, servo, smoke generator and fire
//! - **Hardware abstraction**: traits for physical outputs and CV storage,
//!   `no_std` + `alloc` without the default `std` feature
//!
//! ## Architecture
//!
//! - `traits` - Output and CV storage abstractions
//! - `compiler` - CV layouts to logical functions and mapping rules
//! - `mapping` - Condition variables, rules and their evaluation
//! - `effects` - Effect state machines
//! - `function` - Logical functions binding an effect to outputs
//! - `state` - Decoder state the rules are evaluated against
//! - `controller` - Main controller that ties everything together
//! - `hal` - Mock implementations for testing
//!
//! ## Example
//!
//! ```rust
//! use dcc_aux::{AuxController, CvLayout, MappingMethod};
//! use dcc_aux::hal::{MockConfigStore, MockOutput};
//! use dcc_aux::traits::OutputKind;
//!
//! let layout = CvLayout::default();
//!
//! // RCN-227 per-output V3: output 1 on with F5 forward, blocked by F6
//! let mut store = MockConfigStore::new();
//! store.set(layout.mapping_method_cv, MappingMethod::PerOutputV3 as u8);
//! store.fill_page(43, 256, 0xFF);
//! store.set_indexed_bytes(43, 257, &[0x45, 0xC6]);
//!
//! let mut controller = AuxController::new().with_layout(layout);
//! controller.load_from_cvs(&mut store).unwrap();
//!
//! let mut outputs = vec![MockOutput::new(OutputKind::Intensity); 4];
//! controller.set_function_state(6, true);
//! controller.set_function_state(5, true);
//! controller.tick(20, &mut outputs).unwrap();
//! assert_eq!(outputs[0].value, 0);
//!
//! controller.set_function_state(6, false);
//! controller.tick(20, &mut outputs).unwrap();
//! assert_eq!(outputs[0].value, 255);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// CV layouts compiled into logical functions and mapping rules.
pub mod compiler;
/// CV addresses of the mapping configuration.
pub mod config;
/// Main controller that evaluates the mapping and drives the effects.
pub mod controller;
/// Effect state machines.
pub mod effects;
/// Logical functions binding one effect to a set of outputs.
pub mod function;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Condition variables, mapping rules and their evaluation.
pub mod mapping;
/// Decoder state observed by the mapping rules.
pub mod state;
/// Core traits for outputs and configuration storage.
pub mod traits;

// Re-exports for convenience
pub use compiler::{compile, CompileError, CompiledMapping, MappingMethod};
pub use config::CvLayout;
pub use controller::AuxController;
pub use effects::{
    Animate, Dimming, Effect, Fire, Flicker, MarsLight, Servo, SmokeGenerator, SoftStartStop,
    Steady, Strobe,
};
pub use function::{FunctionId, LogicalFunction};
pub use mapping::{
    Comparator, Condition, ConditionVariable, CvId, MappingAction, MappingRule, MappingTable,
    TriggerSource,
};
pub use state::{DecoderState, Direction};
pub use traits::{ConfigStore, OutputBank, OutputId, OutputKind, PhysicalOutput};
