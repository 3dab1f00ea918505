//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for the output and storage traits,
//! enabling development and testing on desktop without a decoder board.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockOutput`] | [`PhysicalOutput`] | Records the last value/angle written |
//! | [`MockConfigStore`] | [`ConfigStore`] | CV map with indexed-page emulation |
//!
//! # Example
//!
//! ```rust
//! use dcc_aux::{AuxController, hal::{MockConfigStore, MockOutput}};
//! use dcc_aux::traits::OutputKind;
//!
//! // RCN-225 mapping: F0 forward lights output 1
//! let mut store = MockConfigStore::new();
//! store.set(96, 1);
//! store.set(33, 0b0000_0001);
//!
//! let mut controller = AuxController::new();
//! controller.load_from_cvs(&mut store).unwrap();
//!
//! let mut outputs = vec![MockOutput::new(OutputKind::Intensity); 8];
//! controller.set_function_state(0, true);
//! controller.tick(20, &mut outputs).unwrap();
//!
//! assert_eq!(outputs[0].value, 255);
//! ```
//!
//! [`PhysicalOutput`]: crate::traits::PhysicalOutput
//! [`ConfigStore`]: crate::traits::ConfigStore

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::config::CvLayout;
use crate::traits::{ConfigStore, OutputKind, PhysicalOutput};

// ============================================================================
// Output Mocks
// ============================================================================

/// Mock physical output for testing.
///
/// Records the last intensity and angle written. Like a real pin driver it
/// ignores writes that do not match its [`OutputKind`].
///
/// # Example
///
/// ```rust
/// use dcc_aux::hal::MockOutput;
/// use dcc_aux::traits::{OutputKind, PhysicalOutput};
///
/// let mut led = MockOutput::new(OutputKind::Intensity);
/// led.begin().unwrap();
/// led.set_value(200).unwrap();
/// led.set_servo_angle(90).unwrap(); // ignored
///
/// assert!(led.attached);
/// assert_eq!(led.value, 200);
/// assert_eq!(led.angle, 0);
/// assert_eq!(led.write_count, 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct MockOutput {
    /// Electrical kind of this output.
    pub kind: OutputKind,
    /// Last intensity written (0-255).
    pub value: u8,
    /// Last servo angle written (degrees).
    pub angle: u16,
    /// Whether `begin` was called.
    pub attached: bool,
    /// Number of accepted writes.
    pub write_count: usize,
    /// Every accepted write in order (intensity or angle).
    pub history: Vec<u16>,
}

impl MockOutput {
    /// Creates a new mock output of the given kind.
    pub fn new(kind: OutputKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Creates a mock servo output resting at `angle`.
    pub fn servo_at(angle: u16) -> Self {
        Self {
            kind: OutputKind::Servo,
            angle,
            ..Self::default()
        }
    }

    fn record(&mut self, value: u16) {
        self.write_count += 1;
        self.history.push(value);
    }
}

impl PhysicalOutput for MockOutput {
    type Error = ();

    fn begin(&mut self) -> Result<(), ()> {
        self.attached = true;
        if self.kind == OutputKind::Intensity {
            self.value = 0;
        }
        Ok(())
    }

    fn set_value(&mut self, value: u8) -> Result<(), ()> {
        if self.kind == OutputKind::Intensity {
            self.value = value;
            self.record(value as u16);
        }
        Ok(())
    }

    fn set_servo_angle(&mut self, degrees: u16) -> Result<(), ()> {
        if self.kind == OutputKind::Servo {
            self.angle = degrees;
            self.record(degrees);
        }
        Ok(())
    }

    fn kind(&self) -> OutputKind {
        self.kind
    }
}

/// Mock output that fails every write.
///
/// Used to check that driver errors propagate out of the tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct FailingOutput;

impl PhysicalOutput for FailingOutput {
    type Error = &'static str;

    fn begin(&mut self) -> Result<(), &'static str> {
        Err("begin failed")
    }

    fn set_value(&mut self, _value: u8) -> Result<(), &'static str> {
        Err("write failed")
    }

    fn set_servo_angle(&mut self, _degrees: u16) -> Result<(), &'static str> {
        Err("write failed")
    }

    fn kind(&self) -> OutputKind {
        OutputKind::Intensity
    }
}

// ============================================================================
// Storage Mocks
// ============================================================================

/// Mock CV store for testing.
///
/// Plain CVs live in one map. CVs at or above the layout's indexed base
/// (257) are stored per page, where the page is whatever the index
/// high/low selector CVs (31/32) currently hold, so reading an indexed CV
/// without first selecting its page returns the default byte.
///
/// # Example
///
/// ```rust
/// use dcc_aux::hal::MockConfigStore;
/// use dcc_aux::traits::ConfigStore;
///
/// let mut store = MockConfigStore::new().with_default(255);
/// store.set(33, 3);
/// assert_eq!(store.read_byte(33), 3);
/// assert_eq!(store.read_byte(34), 255);
///
/// store.write_byte(31, 0);
/// store.write_byte(32, 43);
/// assert_eq!(store.writes, vec![(31, 0), (32, 43)]);
/// ```
#[derive(Clone, Debug)]
pub struct MockConfigStore {
    layout: CvLayout,
    plain: BTreeMap<u16, u8>,
    indexed: BTreeMap<(u16, u16), u8>,
    default_byte: u8,
    /// Every `write_byte` call in order.
    pub writes: Vec<(u16, u8)>,
    /// Number of `read_byte` calls.
    pub read_count: usize,
}

impl MockConfigStore {
    /// Creates an empty store where every CV reads 0.
    pub fn new() -> Self {
        Self::with_layout(CvLayout::default())
    }

    /// Creates an empty store using the selector addresses of `layout`.
    pub fn with_layout(layout: CvLayout) -> Self {
        Self {
            layout,
            plain: BTreeMap::new(),
            indexed: BTreeMap::new(),
            default_byte: 0,
            writes: Vec::new(),
            read_count: 0,
        }
    }

    /// Sets the value returned for CVs that were never written.
    pub fn with_default(mut self, byte: u8) -> Self {
        self.default_byte = byte;
        self
    }

    /// Sets a plain CV (or an indexed CV of the currently selected page).
    pub fn set(&mut self, address: u16, value: u8) {
        if address >= self.layout.indexed_base_cv {
            let page = self.selected_page();
            self.indexed.insert((page, address), value);
        } else {
            self.plain.insert(address, value);
        }
    }

    /// Sets an indexed CV on a specific page.
    pub fn set_indexed(&mut self, page: u16, address: u16, value: u8) {
        self.indexed.insert((page, address), value);
    }

    /// Sets consecutive indexed CVs on `page` starting at `address`.
    pub fn set_indexed_bytes(&mut self, page: u16, address: u16, bytes: &[u8]) {
        for (offset, byte) in bytes.iter().enumerate() {
            self.set_indexed(page, address + offset as u16, *byte);
        }
    }

    /// Fills `count` indexed CVs on `page` with `value`.
    pub fn fill_page(&mut self, page: u16, count: u16, value: u8) {
        let base = self.layout.indexed_base_cv;
        for address in base..base + count {
            self.set_indexed(page, address, value);
        }
    }

    /// The page currently selected by the index CVs.
    pub fn selected_page(&self) -> u16 {
        let high = self.plain_byte(self.layout.index_high_cv) as u16;
        let low = self.plain_byte(self.layout.index_low_cv) as u16;
        (high << 8) | low
    }

    fn plain_byte(&self, address: u16) -> u8 {
        self.plain.get(&address).copied().unwrap_or(self.default_byte)
    }
}

impl Default for MockConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for MockConfigStore {
    fn read_byte(&mut self, address: u16) -> u8 {
        self.read_count += 1;
        if address >= self.layout.indexed_base_cv {
            let page = self.selected_page();
            self.indexed
                .get(&(page, address))
                .copied()
                .unwrap_or(self.default_byte)
        } else {
            self.plain_byte(address)
        }
    }

    fn write_byte(&mut self, address: u16, value: u8) {
        self.writes.push((address, value));
        self.plain.insert(address, value);
    }
}

// ============================================================================
// Tests
// ============================================================================
