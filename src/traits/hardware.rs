//! Hardware abstraction traits for physical outputs.
//!
//! This module defines the output interfaces that allow dcc-aux to drive
//! lights, servos and smoke units on different platforms (decoder firmware,
//! desktop mocks, etc.).
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`PhysicalOutput`] | One PWM or servo pin |
//! | [`OutputBank`] | The decoder's output table, addressed by [`OutputId`] |
//!
//! The controller never creates or destroys outputs. The surrounding firmware
//! allocates them once, calls [`OutputBank::begin_all`], and lends the bank
//! to every [`AuxController::tick`].
//!
//! # Example
//!
//! ```rust
//! use dcc_aux::traits::{OutputBank, OutputId, OutputKind};
//! use dcc_aux::hal::MockOutput;
//!
//! let mut outputs = vec![MockOutput::new(OutputKind::Intensity); 4];
//! outputs.begin_all().unwrap();
//!
//! outputs.set_value(OutputId(2), 128).unwrap();
//! assert_eq!(outputs[1].value, 128);
//!
//! // Unknown outputs are ignored
//! outputs.set_value(OutputId(9), 255).unwrap();
//! ```
//!
//! [`AuxController::tick`]: crate::AuxController::tick

extern crate alloc;

use alloc::vec::Vec;

/// Number of an output as counted by the function mapping CVs.
///
/// Output numbers are 1-based: bit 0 of an RCN-225 mapping mask selects
/// `OutputId(1)`. `OutputId(0)` never resolves to an output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OutputId(pub u8);

impl OutputId {
    /// Position of this output in a zero-based output table.
    ///
    /// ```
    /// use dcc_aux::traits::OutputId;
    ///
    /// assert_eq!(OutputId(1).index(), Some(0));
    /// assert_eq!(OutputId(0).index(), None);
    /// ```
    #[inline]
    pub const fn index(self) -> Option<usize> {
        match self.0 {
            0 => None,
            n => Some(n as usize - 1),
        }
    }
}

/// Electrical kind of a physical output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OutputKind {
    /// PWM intensity output (LEDs, bulbs, heater, fan).
    #[default]
    Intensity,
    /// Servo pulse output driven by an angle in degrees.
    Servo,
}

/// A single physical output pin.
///
/// Implement this trait for your output driver. Intensity outputs should
/// ignore [`set_servo_angle`](Self::set_servo_angle) and servo outputs should
/// ignore [`set_value`](Self::set_value), so an effect bound to the wrong kind
/// of output is harmless.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use dcc_aux::traits::{OutputKind, PhysicalOutput};
///
/// struct LedPin { /* PWM channel */ }
///
/// impl PhysicalOutput for LedPin {
///     type Error = ();
///
///     fn begin(&mut self) -> Result<(), ()> {
///         // Configure pin as PWM, start dark...
///         Ok(())
///     }
///
///     fn set_value(&mut self, value: u8) -> Result<(), ()> {
///         // Write duty cycle...
///         Ok(())
///     }
///
///     fn set_servo_angle(&mut self, _degrees: u16) -> Result<(), ()> {
///         Ok(())
///     }
///
///     fn kind(&self) -> OutputKind {
///         OutputKind::Intensity
///     }
/// }
/// ```
pub trait PhysicalOutput {
    /// Error type for output operations.
    type Error;

    /// One-time hardware setup (pin mode, servo attach).
    fn begin(&mut self) -> Result<(), Self::Error>;

    /// Set the intensity (0-255).
    fn set_value(&mut self, value: u8) -> Result<(), Self::Error>;

    /// Set the servo angle in degrees.
    fn set_servo_angle(&mut self, degrees: u16) -> Result<(), Self::Error>;

    /// The electrical kind of this output.
    fn kind(&self) -> OutputKind;
}

/// The decoder's table of physical outputs.
///
/// Logical functions only hold [`OutputId`]s; the bank resolves them at
/// update time. Ids that do not resolve are silently ignored.
pub trait OutputBank {
    /// Error type for output operations.
    type Error;

    /// Set the intensity of one output.
    fn set_value(&mut self, id: OutputId, value: u8) -> Result<(), Self::Error>;

    /// Set the servo angle of one output.
    fn set_servo_angle(&mut self, id: OutputId, degrees: u16) -> Result<(), Self::Error>;

    /// Run the one-time setup of every output.
    fn begin_all(&mut self) -> Result<(), Self::Error>;
}

impl<O: PhysicalOutput> OutputBank for [O] {
    type Error = O::Error;

    fn set_value(&mut self, id: OutputId, value: u8) -> Result<(), O::Error> {
        match id.index().and_then(|i| self.get_mut(i)) {
            Some(output) => output.set_value(value),
            None => Ok(()),
        }
    }

    fn set_servo_angle(&mut self, id: OutputId, degrees: u16) -> Result<(), O::Error> {
        match id.index().and_then(|i| self.get_mut(i)) {
            Some(output) => output.set_servo_angle(degrees),
            None => Ok(()),
        }
    }

    fn begin_all(&mut self) -> Result<(), O::Error> {
        for output in self.iter_mut() {
            output.begin()?;
        }
        Ok(())
    }
}

impl<O: PhysicalOutput> OutputBank for Vec<O> {
    type Error = O::Error;

    fn set_value(&mut self, id: OutputId, value: u8) -> Result<(), O::Error> {
        self.as_mut_slice().set_value(id, value)
    }

    fn set_servo_angle(&mut self, id: OutputId, degrees: u16) -> Result<(), O::Error> {
        self.as_mut_slice().set_servo_angle(id, degrees)
    }

    fn begin_all(&mut self) -> Result<(), O::Error> {
        self.as_mut_slice().begin_all()
    }
}
