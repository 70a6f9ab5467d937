#![doc = include_str!("../README.md")]
#![cfg_attr(not(target_arch = "x86_64"), no_std)]

pub mod error;
mod codec;
mod defaults;
mod machine;
pub mod platform;
mod report;
mod schema;
mod slots;

extern crate alloc;

use crate::codec::{Decoder, Encoder, Session, decode_all, encode_all};
use alloc::string::String;
#[cfg(feature = "defmt")]
use defmt::trace;

pub use error::Error;
pub use machine::{
    AXES, Axis, DISTINCT_AXES, E_STEPPERS, Filament, GRID_X, GRID_Y, Grid, HotendPid, Leveling,
    Machine, Motion, Probe, Runout,
};
pub use platform::Platform;
pub use slots::SLOT_SIZE;

/// Persistent settings engine over one non-volatile medium.
///
/// The medium carries two independent address spaces: the versioned,
/// checksummed settings blob at `offset`, and a fixed-record slot region
/// carved from the tail for full calibration grids. Restores run in two
/// passes, a read-only validate followed by a committing decode, so
/// corrupted or version-stale data can never partially mutate live state.
pub struct Settings<T: Platform> {
    hal: T,
    offset: u32,
    auto_init: bool,
}

impl<T: Platform> Settings<T> {
    /// `offset` is the byte address of the configuration region on the
    /// medium. Construction performs no I/O.
    pub fn new(offset: u32, hal: T) -> Self {
        Self {
            hal,
            offset,
            auto_init: false,
        }
    }

    /// When enabled, a failed [`load`](Settings::load) immediately persists
    /// the compiled defaults it fell back to, so the next boot validates.
    pub fn with_auto_init(mut self, enabled: bool) -> Self {
        self.auto_init = enabled;
        self
    }

    /// Hand the medium back, for example to reuse it between operations.
    pub fn into_inner(self) -> T {
        self.hal
    }

    /// Size of the settings blob for this compiled schema, header included.
    pub fn datasize(&self) -> usize {
        schema::DATA_SIZE
    }

    /// Records currently available in the slot region. Recomputed from
    /// capacity and blob geometry on every call.
    pub fn slot_count(&self) -> u16 {
        slots::slot_count(self.offset, self.hal.capacity())
    }

    /// Encode every live value into the blob. The version slot holds a torn
    /// marker while the payload is in flight; the real tag and the final
    /// checksum are written last, only after the payload landed cleanly.
    pub fn save(&mut self, machine: &Machine) -> Result<(), Error> {
        let mut session = Session::begin(&mut self.hal)?;
        let mut scratch_crc = 0u16;
        session.write(self.offset, &schema::TORN_TAG, &mut scratch_crc)?;

        let mut enc = Encoder::new(&mut session, self.offset + schema::HEADER_SIZE as u32);
        encode_all(machine, &mut enc)?;
        let (len, final_crc) = (enc.len, enc.crc);

        if len as usize != schema::PAYLOAD_SIZE {
            return Err(Error::SizeMismatch {
                expected: schema::PAYLOAD_SIZE as u16,
                actual: len.min(u16::MAX as u32) as u16,
            });
        }

        session.write(self.offset, &schema::VERSION_TAG, &mut scratch_crc)?;
        session.write(self.offset + 4, &final_crc.to_le_bytes(), &mut scratch_crc)?;

        #[cfg(feature = "defmt")]
        trace!("settings stored ({} bytes; crc {:#x})", len, final_crc);
        Ok(())
    }

    /// Read-only integrity pass over the stored blob: never changes any
    /// provider, regardless of outcome. On failure, retries exactly once if
    /// the platform restored a backup copy of the medium; no further
    /// retries.
    pub fn validate(&mut self, machine: &mut Machine) -> Result<(), Error> {
        match self.run_pass(machine, false) {
            Ok(()) => Ok(()),
            Err(first) => {
                if self.hal.restore_backup() {
                    #[cfg(feature = "defmt")]
                    trace!("settings restored from backup, revalidating");
                    self.run_pass(machine, false)
                } else {
                    Err(first)
                }
            }
        }
    }

    /// Validate, then re-run the full decode committing restored bytes to
    /// the providers. The deliberate double read guarantees integrity is
    /// confirmed before any live state mutates. On ultimate validation
    /// failure every provider is reset to compiled defaults instead, and
    /// persisted when auto-init is enabled; the original diagnostic is
    /// returned either way.
    pub fn load(&mut self, machine: &mut Machine) -> Result<(), Error> {
        match self.validate(machine) {
            Ok(()) => {
                self.run_pass(machine, true)?;
                machine.postprocess();
                Ok(())
            }
            Err(e) => {
                self.reset(machine);
                if self.auto_init {
                    // Best effort: the load already failed and reports why.
                    let _ = self.save(machine);
                }
                Err(e)
            }
        }
    }

    /// Reset every provider to compiled defaults and re-derive dependent
    /// values. Touches no storage.
    pub fn reset(&self, machine: &mut Machine) {
        *machine = Machine::default();
        machine.postprocess();
    }

    /// Render the live configuration as replayable command text. With
    /// `replay` set, the human-oriented heading comments are omitted.
    pub fn report(&self, machine: &Machine, replay: bool) -> String {
        report::report(machine, replay)
    }

    /// Write a calibration grid into slot `index`. Checks the index against
    /// current geometry before performing any I/O; a medium failure is
    /// local to this slot and leaves the blob untouched.
    pub fn store_slot(&mut self, index: u8, grid: &Grid) -> Result<(), Error> {
        let count = self.slot_count();
        if index as u16 >= count {
            return Err(Error::SlotIndexOutOfRange { index, count });
        }
        let pos = slots::slot_offset(index, self.hal.capacity());
        let mut session = Session::begin(&mut self.hal)?;
        let mut crc = 0u16;
        session
            .write(pos, &grid.to_bytes(), &mut crc)
            .map_err(|_| Error::SlotIoFailure)?;
        #[cfg(feature = "defmt")]
        trace!("grid saved in slot {} (crc {:#x})", index, crc);
        Ok(())
    }

    /// Read the calibration grid stored in slot `index` into `into`,
    /// typically the live grid of a [`Machine`].
    pub fn load_slot(&mut self, index: u8, into: &mut Grid) -> Result<(), Error> {
        let count = self.slot_count();
        if index as u16 >= count {
            return Err(Error::SlotIndexOutOfRange { index, count });
        }
        let pos = slots::slot_offset(index, self.hal.capacity());
        let mut session = Session::begin(&mut self.hal)?;
        let mut crc = 0u16;
        let mut bytes = [0u8; machine::GRID_BYTES];
        session
            .read(pos, &mut bytes, &mut crc)
            .map_err(|_| Error::SlotIoFailure)?;
        *into = Grid::from_bytes(&bytes);
        #[cfg(feature = "defmt")]
        trace!("grid loaded from slot {} (crc {:#x})", index, crc);
        Ok(())
    }

    /// One full walk over the stored blob. `commit` selects the mutating
    /// pass; cursor and checksum behave identically in both, which is what
    /// lets the two passes agree exactly.
    fn run_pass(&mut self, machine: &mut Machine, commit: bool) -> Result<(), Error> {
        let mut session = Session::begin(&mut self.hal)?;
        let mut scratch_crc = 0u16;

        let mut tag = [0u8; 4];
        session.read(self.offset, &mut tag, &mut scratch_crc)?;
        let mut crc_bytes = [0u8; 2];
        session.read(self.offset + 4, &mut crc_bytes, &mut scratch_crc)?;
        let stored_crc = u16::from_le_bytes(crc_bytes);

        if tag != schema::VERSION_TAG {
            // Abort without interpreting a single payload byte. The session
            // guard still releases the medium.
            return Err(Error::VersionMismatch { stored: tag });
        }

        let mut dec = Decoder::new(
            &mut session,
            self.offset + schema::HEADER_SIZE as u32,
            commit,
        );
        decode_all(machine, &mut dec)?;
        let (len, computed, delta) = (dec.len, dec.crc, dec.delta);
        drop(session); // release before the comparisons

        let expected = schema::PAYLOAD_SIZE as i64 + delta as i64;
        if len as i64 != expected {
            return Err(Error::SizeMismatch {
                expected: expected.clamp(0, u16::MAX as i64) as u16,
                actual: len.min(u16::MAX as u32) as u16,
            });
        }
        if computed != stored_crc {
            return Err(Error::ChecksumMismatch {
                stored: stored_crc,
                computed,
            });
        }
        Ok(())
    }
}
