//! RCN-225 output location CVs.
//!
//! Each CV in the configured range is one slot holding an 8-bit output mask.
//! Slot 0 is F0 forward, slot 1 is F0 reverse, slot `i ≥ 2` is F(i−1) in
//! either direction. Bit `b` of the mask selects output `b + 1`.

use tracing::trace;

use super::{outputs_in, CompileError, MappingBuilder};
use crate::config::CvLayout;
use crate::mapping::{Condition, CvId};
use crate::state::Direction;
use crate::traits::ConfigStore;

/// First condition variable id of this layout.
pub const SLOT_ID_BASE: CvId = 1;

/// Function key and optional direction under which `slot` switches its
/// outputs on.
pub fn slot_trigger(slot: u16) -> (Condition, Option<Direction>) {
    match slot {
        0 => (Condition::function_key(0), Some(Direction::Forward)),
        1 => (Condition::function_key(0), Some(Direction::Reverse)),
        n => (Condition::function_key(n - 1), None),
    }
}

pub(crate) fn decode<S: ConfigStore + ?Sized>(
    store: &mut S,
    layout: &CvLayout,
    builder: &mut MappingBuilder,
) -> Result<(), CompileError> {
    for slot in 0..layout.basic_slot_count() as u16 {
        let mask = store.read_byte(layout.basic_first_cv + slot);
        if mask == 0 {
            continue;
        }
        trace!(slot, mask, "output location");

        let id = SLOT_ID_BASE + slot;
        let (key, direction) = slot_trigger(slot);
        builder.trigger(id, key, direction)?;
        for output in outputs_in(mask as u32) {
            builder.activate(output, id, &[])?;
        }
    }
    Ok(())
}
