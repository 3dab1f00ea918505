//! Configuration variable storage trait.
//!
//! The function mapping lives in the decoder's configuration variables
//! (CVs). Where those bytes come from (EEPROM, flash, a test fixture) is up
//! to the implementation of [`ConfigStore`].
//!
//! # Indexed CVs
//!
//! RCN-227 layouts sit above CV 256 in *indexed* pages. A page is selected by
//! writing the index high byte (CV 31) and low byte (CV 32) before reading
//! CV 257 onwards. The compiler performs those writes itself, so a store only
//! needs to honour the selector the way the decoder's CV handler does.
//!
//! ```rust
//! use dcc_aux::traits::ConfigStore;
//! use dcc_aux::hal::MockConfigStore;
//!
//! let mut store = MockConfigStore::new();
//! store.set_indexed(41, 257, 0x0F);
//!
//! store.write_byte(31, 0);
//! store.write_byte(32, 41);
//! assert_eq!(store.read_byte(257), 0x0F);
//! ```

/// Byte-addressable configuration variable storage.
pub trait ConfigStore {
    /// Read the CV at `address`.
    fn read_byte(&mut self, address: u16) -> u8;

    /// Write `value` to the CV at `address`.
    fn write_byte(&mut self, address: u16, value: u8);
}

impl<S: ConfigStore + ?Sized> ConfigStore for &mut S {
    fn read_byte(&mut self, address: u16) -> u8 {
        (**self).read_byte(address)
    }

    fn write_byte(&mut self, address: u16, value: u8) {
        (**self).write_byte(address, value)
    }
}
