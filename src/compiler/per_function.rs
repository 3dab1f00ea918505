//! RCN-227 per-function output matrix.
//!
//! One 4-byte record per function and direction at
//! `base + (f·2 + dir)·4`: a little-endian 24-bit output mask followed by a
//! blocking function number (255 for none).

use tracing::trace;

use super::{outputs_in, CompileError, MappingBuilder, Page, UNUSED};
use crate::config::CvLayout;
use crate::mapping::{Condition, CvId};
use crate::state::Direction;
use crate::traits::ConfigStore;

/// Functions covered by the matrix.
pub const FUNCTION_COUNT: u16 = 32;

/// First id of the slot condition variables.
pub const SLOT_ID_BASE: CvId = 1000;

/// First id of the blocking condition variables.
pub const BLOCKING_ID_BASE: CvId = 1500;

pub(crate) fn decode<S: ConfigStore + ?Sized>(
    store: &mut S,
    layout: &CvLayout,
    builder: &mut MappingBuilder,
) -> Result<(), CompileError> {
    let mut page = Page::open(store, layout, layout.per_function_page);

    for function in 0..FUNCTION_COUNT {
        for dir in 0..2u16 {
            let slot = function * 2 + dir;
            let record = slot * 4;
            let mask = page.le_bits::<3>(record);
            let blocking = page.byte(record + 3);
            if mask == 0 {
                continue;
            }
            trace!(function, dir, mask, blocking, "per-function record");

            let id = SLOT_ID_BASE + slot;
            let direction = Direction::from_matrix_index(dir as usize);
            builder.trigger(id, Condition::function_key(function), Some(direction))?;

            let blocking_id = if blocking != UNUSED {
                let blocking_id = BLOCKING_ID_BASE + blocking as CvId;
                builder.condition_variable(
                    blocking_id,
                    &[Condition::function_key(blocking as u16)],
                )?;
                Some(blocking_id)
            } else {
                None
            };

            for output in outputs_in(mask) {
                builder.activate(output, id, blocking_id.as_slice())?;
            }
        }
    }
    Ok(())
}
