pub use embedded_storage::{ReadStorage, Storage};

/// Byte-addressable non-volatile medium hosting both the settings blob and
/// the slot region. See README.md for an example implementation.
///
/// Every logical operation brackets its access with [`begin`](Platform::begin)
/// and [`commit`](Platform::commit). A `begin` that returns `false` guarantees
/// that nothing was acquired, so there is nothing to release; the crate makes
/// this explicit by only constructing its access guard after `begin` succeeds.
pub trait Platform: Storage {
    /// Open an access window on the medium. Returning `false` reports the
    /// medium as unavailable without acquiring anything.
    fn begin(&mut self) -> bool {
        true
    }

    /// Close the window opened by [`begin`](Platform::begin) and flush any
    /// buffered writes.
    fn commit(&mut self) {}

    /// Restore the configuration region from an alternate backup copy, if
    /// the board has one. Returning `true` means the region content was
    /// replaced and is worth re-validating once.
    fn restore_backup(&mut self) -> bool {
        false
    }
}

#[inline(always)]
pub(crate) const fn align_ceil(size: usize, alignment: usize) -> usize {
    assert!(alignment.is_power_of_two());
    (size + alignment - 1) & !(alignment - 1)
}
