//! RCN-227 per-output layouts.
//!
//! All three variants describe, for each output, which functions switch it
//! on:
//!
//! - **V1** (page 41): a 32-bit little-endian function mask per output and
//!   direction.
//! - **V2** (page 42): up to three function numbers per output and
//!   direction, plus one blocking function.
//! - **V3** (page 43): four one-byte descriptors and two extended
//!   descriptors per output, each either activating or blocking.

extern crate alloc;

use alloc::vec::Vec;

use tracing::trace;

use super::{CompileError, MappingBuilder, Page, UNUSED};
use crate::config::CvLayout;
use crate::mapping::{Condition, CvId};
use crate::state::Direction;
use crate::traits::{ConfigStore, OutputId};

// ============================================================================
// V1: function bitmask
// ============================================================================

/// Outputs covered by the V1 layout.
pub const V1_OUTPUT_COUNT: u8 = 24;

/// First condition variable id of the V1 layout.
pub const V1_ID_BASE: CvId = 2000;

pub(crate) fn decode_v1<S: ConfigStore + ?Sized>(
    store: &mut S,
    layout: &CvLayout,
    builder: &mut MappingBuilder,
) -> Result<(), CompileError> {
    let mut page = Page::open(store, layout, layout.per_output_v1_page);

    for out in 0..V1_OUTPUT_COUNT {
        let output = OutputId(out + 1);
        for dir in 0..2u16 {
            let record = (out as u16 * 2 + dir) * 4;
            let mask = page.le_bits::<4>(record);
            if mask == 0 {
                continue;
            }
            trace!(out, dir, mask, "per-output V1 record");

            let direction = Direction::from_matrix_index(dir as usize);
            for function in (0..32u16).filter(|f| mask & (1u32 << *f) != 0) {
                let id = V1_ID_BASE + out as u16 * 64 + dir * 32 + function;
                builder.trigger(id, Condition::function_key(function), Some(direction))?;
                builder.activate(output, id, &[])?;
            }
        }
    }
    Ok(())
}

// ============================================================================
// V2: function numbers with blocking
// ============================================================================

/// Outputs covered by the V2 and V3 layouts.
pub const OUTPUT_COUNT: u8 = 32;

/// First slot condition variable id of the V2 layout.
pub const V2_ID_BASE: CvId = 4000;

/// First blocking condition variable id of the V2 layout.
pub const V2_BLOCKING_ID_BASE: CvId = 4500;

pub(crate) fn decode_v2<S: ConfigStore + ?Sized>(
    store: &mut S,
    layout: &CvLayout,
    builder: &mut MappingBuilder,
) -> Result<(), CompileError> {
    let mut page = Page::open(store, layout, layout.per_output_v2_page);

    for out in 0..OUTPUT_COUNT {
        let output = OutputId(out + 1);
        for dir in 0..2u16 {
            let record = (out as u16 * 2 + dir) * 4;
            let functions = [page.byte(record), page.byte(record + 1), page.byte(record + 2)];
            let blocking = page.byte(record + 3);

            // registered even when no function of the slot is used
            let blocking_id = if blocking != UNUSED {
                let blocking_id = V2_BLOCKING_ID_BASE + blocking as CvId;
                builder.condition_variable(
                    blocking_id,
                    &[Condition::function_key(blocking as u16)],
                )?;
                Some(blocking_id)
            } else {
                None
            };

            let direction = Direction::from_matrix_index(dir as usize);
            for (i, function) in functions.iter().enumerate() {
                if *function == UNUSED {
                    continue;
                }
                trace!(out, dir, function, blocking, "per-output V2 entry");
                let id = V2_ID_BASE + out as u16 * 8 + dir * 4 + i as u16;
                builder.trigger(
                    id,
                    Condition::function_key(*function as u16),
                    Some(direction),
                )?;
                builder.activate(output, id, blocking_id.as_slice())?;
            }
        }
    }
    Ok(())
}

// ============================================================================
// V3: descriptors
// ============================================================================

/// First condition variable id of the V3 layout.
pub const V3_ID_BASE: CvId = 5000;

/// Highest extended descriptor value naming a function key.
pub const MAX_EXTENDED_FUNCTION: u16 = 68;

/// A decoded V3 descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Descriptor {
    /// What the descriptor tests.
    pub condition: Condition,
    /// Optional direction restriction.
    pub direction: Option<Direction>,
    /// Whether the descriptor blocks rather than activates.
    pub blocking: bool,
}

impl Descriptor {
    /// Decode a one-byte descriptor; 255 is unused.
    ///
    /// The low six bits name the function, the top two bits the mode:
    /// 0 any direction, 1 forward, 2 reverse, 3 blocking.
    pub fn from_byte(byte: u8) -> Option<Self> {
        if byte == UNUSED {
            return None;
        }
        let (direction, blocking) = match byte >> 6 {
            1 => (Some(Direction::Forward), false),
            2 => (Some(Direction::Reverse), false),
            3 => (None, true),
            _ => (None, false),
        };
        Some(Self {
            condition: Condition::function_key((byte & 0x3F) as u16),
            direction,
            blocking,
        })
    }

    /// Decode a big-endian two-byte extended descriptor; `FF FF` is unused.
    ///
    /// The top bit marks blocking. The remaining 15 bits name a function key
    /// up to 68, or binary state `value - 69` above.
    pub fn from_extended(high: u8, low: u8) -> Option<Self> {
        if high == UNUSED && low == UNUSED {
            return None;
        }
        let value = u16::from_be_bytes([high & 0x7F, low]);
        let condition = if value <= MAX_EXTENDED_FUNCTION {
            Condition::function_key(value)
        } else {
            Condition::binary_state(value - (MAX_EXTENDED_FUNCTION + 1))
        };
        Some(Self {
            condition,
            direction: None,
            blocking: high & 0x80 != 0,
        })
    }
}

pub(crate) fn decode_v3<S: ConfigStore + ?Sized>(
    store: &mut S,
    layout: &CvLayout,
    builder: &mut MappingBuilder,
) -> Result<(), CompileError> {
    let mut page = Page::open(store, layout, layout.per_output_v3_page);

    for out in 0..OUTPUT_COUNT {
        let record = out as u16 * 8;
        let mut descriptors = [None; 6];
        for (i, descriptor) in descriptors.iter_mut().take(4).enumerate() {
            *descriptor = Descriptor::from_byte(page.byte(record + i as u16));
        }
        for i in 0..2u16 {
            let high = page.byte(record + 4 + i * 2);
            let low = page.byte(record + 5 + i * 2);
            descriptors[4 + i as usize] = Descriptor::from_extended(high, low);
        }

        let mut activating = Vec::new();
        let mut blocking = Vec::new();
        for (i, descriptor) in descriptors.iter().enumerate() {
            let Some(descriptor) = descriptor else {
                continue;
            };
            trace!(out, slot = i, ?descriptor, "per-output V3 descriptor");
            let id = V3_ID_BASE + record + i as u16;
            builder.trigger(id, descriptor.condition, descriptor.direction)?;
            if descriptor.blocking {
                blocking.push(id);
            } else {
                activating.push(id);
            }
        }

        let output = OutputId(out + 1);
        for id in activating {
            builder.activate(output, id, &blocking)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{compile, MappingMethod};
    use crate::hal::MockConfigStore;
    use crate::mapping::MappingAction;

    fn store(method: MappingMethod, page: u16, fill: u8) -> MockConfigStore {
        let layout = CvLayout::default();
        let mut store = MockConfigStore::new();
        store.set(layout.mapping_method_cv, method as u8);
        store.fill_page(page, 256, fill);
        store
    }

    // === V1 ===
    #[test]
    fn v1_function_mask() {
        let mut store = store(MappingMethod::PerOutputV1, 41, 0);
        // output 3, forward: F0 and F9
        store.set_indexed_bytes(41, 257 + (2 * 2) * 4, &[0x01, 0x02, 0x00, 0x00]);
        // output 3, reverse: F31
        store.set_indexed_bytes(41, 257 + (2 * 2 + 1) * 4, &[0x00, 0x00, 0x00, 0x80]);
        let mapping = compile(&mut store, &CvLayout::default()).unwrap();

        assert_eq!(mapping.functions().len(), 1);
        assert_eq!(mapping.functions()[0].outputs(), [OutputId(3)]);
        let ids: Vec<CvId> = mapping.condition_variables().iter().map(|cv| cv.id).collect();
        assert_eq!(ids, [2128, 2137, 2191]);
        assert_eq!(
            mapping.condition_variables()[2].conditions.as_slice(),
            [
                Condition::function_key(31),
                Condition::direction(Direction::Reverse)
            ]
        );
        // one activation per set bit
        assert_eq!(mapping.rules().len(), 3);
    }

    // === V2 ===
    #[test]
    fn v2_functions_with_blocking() {
        let mut store = store(MappingMethod::PerOutputV2, 42, UNUSED);
        // output 2, forward: F1, F4; blocked by F8
        store.set_indexed_bytes(42, 257 + (1 * 2) * 4, &[1, UNUSED, 4, 8]);
        let mapping = compile(&mut store, &CvLayout::default()).unwrap();

        assert_eq!(mapping.functions().len(), 1);
        assert_eq!(mapping.functions()[0].outputs(), [OutputId(2)]);
        let ids: Vec<CvId> = mapping.condition_variables().iter().map(|cv| cv.id).collect();
        assert_eq!(ids, [4508, 4008, 4010]);

        let activations: Vec<_> = mapping
            .rules()
            .iter()
            .filter(|r| r.action == MappingAction::Activate)
            .collect();
        assert_eq!(activations.len(), 2);
        assert!(activations.iter().all(|r| r.negative.as_slice() == [4508]));
    }

    #[test]
    fn v2_blocking_registered_without_functions() {
        let mut store = store(MappingMethod::PerOutputV2, 42, UNUSED);
        store.set_indexed(42, 257 + 3, 12);
        let mapping = compile(&mut store, &CvLayout::default()).unwrap();
        assert!(mapping.functions().is_empty());
        assert_eq!(mapping.condition_variables().len(), 1);
        assert_eq!(mapping.condition_variables()[0].id, 4512);
    }

    // === V3 ===
    #[test]
    fn descriptor_byte_modes() {
        let any = Descriptor::from_byte(0x05).unwrap();
        assert_eq!(any.condition, Condition::function_key(5));
        assert_eq!(any.direction, None);
        assert!(!any.blocking);

        let forward = Descriptor::from_byte(0x45).unwrap();
        assert_eq!(forward.direction, Some(Direction::Forward));

        let reverse = Descriptor::from_byte(0x85).unwrap();
        assert_eq!(reverse.direction, Some(Direction::Reverse));

        let blocking = Descriptor::from_byte(0xC6).unwrap();
        assert!(blocking.blocking);
        assert_eq!(blocking.condition, Condition::function_key(6));

        assert_eq!(Descriptor::from_byte(UNUSED), None);
    }

    #[test]
    fn extended_descriptor_values() {
        assert_eq!(Descriptor::from_extended(UNUSED, UNUSED), None);

        let key = Descriptor::from_extended(0x00, 68).unwrap();
        assert_eq!(key.condition, Condition::function_key(68));

        let state = Descriptor::from_extended(0x01, 0x00).unwrap();
        assert_eq!(state.condition, Condition::binary_state(256 - 69));

        let blocking = Descriptor::from_extended(0x80, 69).unwrap();
        assert!(blocking.blocking);
        assert_eq!(blocking.condition, Condition::binary_state(0));

        // only one byte unused is still a descriptor
        assert!(Descriptor::from_extended(UNUSED, 0x00).is_some());
    }

    #[test]
    fn v3_blocking_descriptor() {
        let mut store = store(MappingMethod::PerOutputV3, 43, UNUSED);
        // output 1: F5 forward activates, F6 blocks
        store.set_indexed_bytes(43, 257, &[0x45, 0xC6]);
        let mapping = compile(&mut store, &CvLayout::default()).unwrap();

        assert_eq!(mapping.functions().len(), 1);
        assert_eq!(mapping.functions()[0].outputs(), [OutputId(1)]);
        assert_eq!(mapping.condition_variables().len(), 2);

        let rule = mapping
            .rules()
            .iter()
            .find(|r| r.action == MappingAction::Activate)
            .unwrap();
        assert_eq!(rule.positive.as_slice(), [5000]);
        assert_eq!(rule.negative.as_slice(), [5001]);
    }

    #[test]
    fn v3_only_blocking_creates_no_function() {
        let mut store = store(MappingMethod::PerOutputV3, 43, UNUSED);
        store.set_indexed(43, 257 + 8, 0xC2);
        let mapping = compile(&mut store, &CvLayout::default()).unwrap();
        assert!(mapping.functions().is_empty());
        assert!(mapping.rules().is_empty());
        assert_eq!(mapping.condition_variables()[0].id, 5008);
    }

    #[test]
    fn v3_extended_binary_state() {
        let mut store = store(MappingMethod::PerOutputV3, 43, UNUSED);
        // output 2: binary state 31 via the first extended descriptor
        store.set_indexed_bytes(43, 257 + 8 + 4, &[0x00, 100]);
        let mapping = compile(&mut store, &CvLayout::default()).unwrap();
        assert_eq!(mapping.functions()[0].outputs(), [OutputId(2)]);
        let cv = &mapping.condition_variables()[0];
        assert_eq!(cv.id, 5012);
        assert_eq!(cv.conditions.as_slice(), [Condition::binary_state(31)]);
    }
}
