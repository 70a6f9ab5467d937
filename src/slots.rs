//! Fixed-record slot region carved from the unused tail of the medium,
//! holding full calibration grids that would be uneconomical inside the
//! blob. Geometry is derived from current capacity on every query, never
//! cached, so it self-adjusts when the blob or the medium grows. Records
//! are laid out back-to-front from the end of the medium; the region floor
//! sits a growth margin above the blob so small blob growth across firmware
//! versions cannot collide with slot 0.

use crate::platform::align_ceil;
use crate::schema;

/// Bytes reserved per record. The compiled grid must fit; the assertion
/// below keeps the record size stable when the grid is resized within it.
pub const SLOT_SIZE: usize = 128;

/// Headroom above the blob so it can float up a little between versions.
pub(crate) const GROWTH_MARGIN: usize = 32;
pub(crate) const SLOT_ALIGN: usize = 8;
/// Bytes at the very end of the medium the slot region must not claim.
pub(crate) const RESERVED_TRAILER: usize = 0;

const _: () = assert!(
    crate::machine::GRID_BYTES <= SLOT_SIZE,
    "calibration grid record exceeds the slot size"
);

/// First byte the slot region may use: end of the blob, padded and aligned.
pub(crate) fn region_start(blob_offset: u32) -> usize {
    align_ceil(
        blob_offset as usize + schema::DATA_SIZE + GROWTH_MARGIN,
        SLOT_ALIGN,
    )
}

/// One past the last byte the slot region may use.
pub(crate) fn region_end(capacity: usize) -> usize {
    capacity - RESERVED_TRAILER
}

pub(crate) fn slot_count(blob_offset: u32, capacity: usize) -> u16 {
    let start = region_start(blob_offset);
    let end = region_end(capacity);
    (end.saturating_sub(start) / SLOT_SIZE) as u16
}

/// Byte offset of record `index`, counted back from the region end.
pub(crate) fn slot_offset(index: u8, capacity: usize) -> u32 {
    (region_end(capacity) - (index as usize + 1) * SLOT_SIZE) as u32
}
