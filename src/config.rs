//! CV layout configuration.
//!
//! Describes where the function mapping lives in the configuration store:
//! the mapping method selector, the RCN-225 mapping range, the indexed-CV
//! page selector and the RCN-227 page numbers. The defaults follow RCN-225 and
//! RCN-227; firmware with a different CV map overrides individual fields.
//!
//! # Example
//!
//! ```rust
//! use dcc_aux::config::CvLayout;
//!
//! // Use defaults
//! let layout = CvLayout::default();
//! assert_eq!(layout.basic_first_cv, 33);
//! assert_eq!(layout.indexed_base_cv, 257);
//!
//! // Or customize
//! let layout = CvLayout::default()
//!     .with_mapping_method_cv(120)
//!     .with_basic_range(33, 40);
//! assert_eq!(layout.basic_slot_count(), 8);
//! ```

/// Location of every CV the compiler reads or writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CvLayout {
    /// CV holding the [`MappingMethod`](crate::compiler::MappingMethod) selector.
    pub mapping_method_cv: u16,
    /// First RCN-225 output location CV (F0 forward).
    pub basic_first_cv: u16,
    /// Last RCN-225 output location CV (inclusive).
    pub basic_last_cv: u16,
    /// Indexed CV page selector, high byte.
    pub index_high_cv: u16,
    /// Indexed CV page selector, low byte.
    pub index_low_cv: u16,
    /// First CV of an indexed page.
    pub indexed_base_cv: u16,
    /// Page holding the RCN-227 per-function matrix.
    pub per_function_page: u8,
    /// Page holding the RCN-227 per-output V1 matrix.
    pub per_output_v1_page: u8,
    /// Page holding the RCN-227 per-output V2 function numbers.
    pub per_output_v2_page: u8,
    /// Page holding the RCN-227 per-output V3 descriptors.
    pub per_output_v3_page: u8,
}

impl Default for CvLayout {
    fn default() -> Self {
        Self {
            mapping_method_cv: 96,
            basic_first_cv: 33,
            basic_last_cv: 46,
            index_high_cv: 31,
            index_low_cv: 32,
            indexed_base_cv: 257,
            per_function_page: 40,
            per_output_v1_page: 41,
            per_output_v2_page: 42,
            per_output_v3_page: 43,
        }
    }
}

impl CvLayout {
    /// Set the mapping method selector CV
    pub fn with_mapping_method_cv(mut self, cv: u16) -> Self {
        self.mapping_method_cv = cv;
        self
    }

    /// Set the RCN-225 output location range (inclusive)
    pub fn with_basic_range(mut self, first: u16, last: u16) -> Self {
        self.basic_first_cv = first;
        self.basic_last_cv = last;
        self
    }

    /// Set the indexed CV selector addresses
    pub fn with_index_selector(mut self, high: u16, low: u16) -> Self {
        self.index_high_cv = high;
        self.index_low_cv = low;
        self
    }

    /// Set the first CV of an indexed page
    pub fn with_indexed_base(mut self, cv: u16) -> Self {
        self.indexed_base_cv = cv;
        self
    }

    /// Set the four RCN-227 page numbers
    pub fn with_pages(mut self, per_function: u8, v1: u8, v2: u8, v3: u8) -> Self {
        self.per_function_page = per_function;
        self.per_output_v1_page = v1;
        self.per_output_v2_page = v2;
        self.per_output_v3_page = v3;
        self
    }

    /// Number of RCN-225 mapping slots in the configured range.
    ///
    /// An inverted range has no slots.
    pub fn basic_slot_count(&self) -> usize {
        if self.basic_last_cv < self.basic_first_cv {
            0
        } else {
            (self.basic_last_cv - self.basic_first_cv) as usize + 1
        }
    }
}
