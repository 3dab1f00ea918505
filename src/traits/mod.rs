//! Trait definitions for hardware abstraction and configuration storage.
//!
//! This module defines the external seams of dcc-aux:
//! - Physical outputs the effects write to
//! - The configuration store the compiler reads CVs from
//!
//! # Submodules
//!
//! - `hardware`: [`PhysicalOutput`], [`OutputBank`] and [`OutputId`]
//! - `storage`: [`ConfigStore`]
//!
//! Mock implementations for desktop testing live in [`crate::hal::mock`].

pub mod hardware;
pub mod storage;

pub use hardware::*;
pub use storage::*;
