//! Byte-cursor codec walking the schema table over the medium, one
//! descriptor at a time, accumulating the payload checksum as it goes. The
//! read-only validate pass and the mutating commit pass run the exact same
//! walk; the only difference is whether restored bytes reach a provider.

use crate::error::Error;
use crate::machine::{DISTINCT_AXES, GRID_X, GRID_Y, Machine};
use crate::platform::Platform;
use crate::schema::{self, AXIS_CELL, AXIS_LANES, DESCRIPTORS, Payload};
#[cfg(feature = "defmt")]
use defmt::trace;

/// CRC-16/XMODEM, the checksum the wire format is defined over. The starting
/// value is 0 and encode and decode accumulate it identically, so chained
/// updates equal one update over the concatenated payload.
const CRC16: crc::Crc<u16> = crc::Crc::<u16>::new(&crc::CRC_16_XMODEM);

pub(crate) fn crc16(init: u16, data: &[u8]) -> u16 {
    let mut digest = CRC16.digest_with_initial(init);
    digest.update(data);
    digest.finalize()
}

/// Scoped access window on the medium. Constructed only after
/// [`Platform::begin`] has succeeded, so a failed acquisition never leaves
/// anything to release; the paired [`Platform::commit`] runs on drop, on
/// every exit path.
pub(crate) struct Session<'a, T: Platform> {
    hal: &'a mut T,
}

impl<'a, T: Platform> Session<'a, T> {
    pub(crate) fn begin(hal: &'a mut T) -> Result<Self, Error> {
        if !hal.begin() {
            return Err(Error::AcquisitionFailure);
        }
        Ok(Self { hal })
    }

    pub(crate) fn capacity(&self) -> usize {
        self.hal.capacity()
    }

    /// Read `buf.len()` bytes at `offset`, folding them into `crc`.
    pub(crate) fn read(&mut self, offset: u32, buf: &mut [u8], crc: &mut u16) -> Result<(), Error> {
        self.hal.read(offset, buf).map_err(|_| Error::MediumError)?;
        *crc = crc16(*crc, buf);
        Ok(())
    }

    /// Write `buf` at `offset`, folding it into `crc`.
    pub(crate) fn write(&mut self, offset: u32, buf: &[u8], crc: &mut u16) -> Result<(), Error> {
        self.hal.write(offset, buf).map_err(|_| Error::MediumError)?;
        *crc = crc16(*crc, buf);
        Ok(())
    }
}

impl<T: Platform> Drop for Session<'_, T> {
    fn drop(&mut self) {
        self.hal.commit();
    }
}

pub(crate) struct Encoder<'s, 'a, T: Platform> {
    session: &'s mut Session<'a, T>,
    index: u32,
    /// Payload bytes written since construction.
    pub(crate) len: u32,
    pub(crate) crc: u16,
}

impl<'s, 'a, T: Platform> Encoder<'s, 'a, T> {
    pub(crate) fn new(session: &'s mut Session<'a, T>, base: u32) -> Self {
        Self {
            session,
            index: base,
            len: 0,
            crc: 0,
        }
    }

    fn put(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.session.write(self.index, bytes, &mut self.crc)?;
        self.index += bytes.len() as u32;
        self.len += bytes.len() as u32;
        Ok(())
    }
}

pub(crate) struct Decoder<'s, 'a, T: Platform> {
    session: &'s mut Session<'a, T>,
    index: u32,
    capacity: usize,
    /// Payload bytes consumed since construction.
    pub(crate) len: u32,
    pub(crate) crc: u16,
    /// Only a committing pass hands bytes to providers. Cursor and checksum
    /// advance identically either way.
    pub(crate) commit: bool,
    /// Stored-layout length shift relative to the compiled schema,
    /// accumulated from count and dimension prefixes.
    pub(crate) delta: i32,
}

impl<'s, 'a, T: Platform> Decoder<'s, 'a, T> {
    pub(crate) fn new(session: &'s mut Session<'a, T>, base: u32, commit: bool) -> Self {
        let capacity = session.capacity();
        Self {
            session,
            index: base,
            capacity,
            len: 0,
            crc: 0,
            commit,
            delta: 0,
        }
    }

    /// Consume `buf.len()` bytes, always folding them into the checksum. A
    /// stored layout that runs past the medium (a corrupt count prefix, for
    /// instance) is reported as a size mismatch before any out-of-range read.
    fn take(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        if self.index as usize + buf.len() > self.capacity {
            return Err(Error::SizeMismatch {
                expected: schema::PAYLOAD_SIZE as u16,
                actual: (self.len as usize).saturating_add(buf.len()).min(u16::MAX as usize)
                    as u16,
            });
        }
        self.session.read(self.index, buf, &mut self.crc)?;
        self.index += buf.len() as u32;
        self.len += buf.len() as u32;
        Ok(())
    }
}

/// Encode every descriptor in schema order. Absent descriptors emit a
/// neutral placeholder of the same width so the blob length stays
/// deterministic for this compiled image.
pub(crate) fn encode_all<T: Platform>(
    machine: &Machine,
    enc: &mut Encoder<'_, '_, T>,
) -> Result<(), Error> {
    let mut expected = 0usize;
    for d in DESCRIPTORS {
        match &d.payload {
            Payload::Scalar { read, .. } => {
                let mut scratch = [0u8; schema::MAX_SCALAR_WIDTH];
                let buf = &mut scratch[..d.width];
                if d.present {
                    read(machine, buf);
                }
                enc.put(buf)?;
            }
            Payload::AxisGroup { read, .. } => {
                enc.put(&[DISTINCT_AXES as u8])?;
                for lane in 0..AXIS_LANES {
                    for axis in 0..DISTINCT_AXES {
                        enc.put(&read(machine, lane, axis))?;
                    }
                }
            }
            Payload::Grid { read, .. } => {
                enc.put(&[GRID_X as u8, GRID_Y as u8])?;
                let placeholder = [0u8; AXIS_CELL];
                for y in 0..GRID_Y {
                    for x in 0..GRID_X {
                        if d.present {
                            enc.put(&read(machine, x, y))?;
                        } else {
                            enc.put(&placeholder)?;
                        }
                    }
                }
            }
        }
        expected += d.width;
        debug_assert_eq!(
            enc.len as usize, expected,
            "schema offset drift after {}",
            d.name
        );
    }
    Ok(())
}

/// Decode every descriptor in schema order, resolving each one to a value:
/// from the stream when shape and presence agree, from the defaulting engine
/// otherwise. Never errors on a shape mismatch; stored bytes are consumed
/// byte-for-byte so length and checksum accounting stay exact.
pub(crate) fn decode_all<T: Platform>(
    machine: &mut Machine,
    dec: &mut Decoder<'_, '_, T>,
) -> Result<(), Error> {
    let mut expected = 0usize;
    for d in DESCRIPTORS {
        match &d.payload {
            Payload::Scalar { apply, .. } => {
                let mut scratch = [0u8; schema::MAX_SCALAR_WIDTH];
                let buf = &mut scratch[..d.width];
                dec.take(buf)?;
                if d.present && dec.commit {
                    apply(machine, buf);
                }
            }
            Payload::AxisGroup {
                apply, fallback, ..
            } => {
                let mut count = [0u8; 1];
                dec.take(&mut count)?;
                let stored = count[0] as usize;
                for lane in 0..AXIS_LANES {
                    // Entries the stream has, capped at the compiled count.
                    for axis in 0..stored {
                        let mut cell = [0u8; AXIS_CELL];
                        dec.take(&mut cell)?;
                        if dec.commit && axis < DISTINCT_AXES {
                            apply(machine, lane, axis, cell);
                        }
                    }
                    // Entries this image added since the blob was stored.
                    if dec.commit {
                        for axis in stored..DISTINCT_AXES {
                            fallback(machine, lane, axis);
                        }
                    }
                }
                dec.delta += (stored as i32 - DISTINCT_AXES as i32) * (AXIS_LANES * AXIS_CELL) as i32;
            }
            Payload::Grid { apply, reset, .. } => {
                let mut dims = [0u8; 2];
                dec.take(&mut dims)?;
                let (sx, sy) = (dims[0] as usize, dims[1] as usize);
                let fits = sx == GRID_X && sy == GRID_Y;
                for y in 0..sy {
                    for x in 0..sx {
                        let mut cell = [0u8; AXIS_CELL];
                        dec.take(&mut cell)?;
                        if d.present && fits && dec.commit {
                            apply(machine, x, y, cell);
                        }
                    }
                }
                // Stale stored dimensions: payload was consumed above to
                // keep the cursor and checksum exact, the live grid restarts
                // from its default state.
                if d.present && !fits && dec.commit {
                    reset(machine);
                }
                dec.delta += AXIS_CELL as i32 * (sx as i32 * sy as i32 - (GRID_X * GRID_Y) as i32);
            }
        }
        expected += d.width;
        debug_assert_eq!(
            dec.len as i64,
            expected as i64 + dec.delta as i64,
            "schema offset drift after {}",
            d.name
        );
    }
    #[cfg(feature = "defmt")]
    trace!("decoded {} payload bytes, crc {:#x}", dec.len, dec.crc);
    Ok(())
}
