#![allow(dead_code)]

// filename according to https://doc.rust-lang.org/book/ch11-03-test-organization.html
use embedded_storage::{ReadStorage, Storage};
use settings_store::platform::Platform;

pub const EEPROM_SIZE: usize = 4096;
pub const BLOB_OFFSET: u32 = 100;

/// Byte-rewritable mock medium with an operation log and fault injection,
/// wrapped in session bookkeeping so tests can assert that no access ever
/// happens outside an acquired session.
pub struct Eeprom {
    pub buf: Vec<u8>,
    pub operations: Vec<Operation>,
    pub fail_after_operation: usize,
    /// Pending `begin` calls to refuse before accepting again.
    pub begin_refusals: usize,
    /// Second copy of the medium handed back by `restore_backup`.
    pub backup: Option<Vec<u8>>,
    open: bool,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Operation {
    Begin,
    Read { offset: u32, len: usize },
    Write { offset: u32, len: usize },
    Commit,
    Restore,
}

impl Eeprom {
    pub fn new() -> Self {
        Self::with_size(EEPROM_SIZE)
    }

    pub fn with_size(size: usize) -> Self {
        Self {
            buf: vec![0xffu8; size],
            operations: Vec::new(),
            fail_after_operation: usize::MAX,
            begin_refusals: 0,
            backup: None,
            open: false,
        }
    }

    pub fn disable_faults(&mut self) {
        self.fail_after_operation = usize::MAX;
    }

    pub fn reads(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| matches!(op, Operation::Read { .. }))
            .count()
    }

    pub fn writes(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| matches!(op, Operation::Write { .. }))
            .count()
    }

    pub fn dump_operations(&self) {
        println!("Operations:");
        for op in &self.operations {
            println!("  {:?}", op);
        }
    }

    fn faulted(&self) -> bool {
        self.operations.len() >= self.fail_after_operation
    }
}

#[derive(Debug)]
pub struct EepromError;

impl ReadStorage for Eeprom {
    type Error = EepromError;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        assert!(self.open, "read outside an acquired session");
        println!(
            "    eeprom: read:  0x{offset:04X}[0x{:04X}] #{:>2}",
            bytes.len(),
            self.operations.len()
        );
        if self.faulted() {
            println!("    eeprom: FAULT");
            return Err(EepromError);
        }
        self.operations.push(Operation::Read {
            offset,
            len: bytes.len(),
        });

        let offset = offset as usize;
        bytes.copy_from_slice(&self.buf[offset..offset + bytes.len()]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.buf.len()
    }
}

impl Storage for Eeprom {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        assert!(self.open, "write outside an acquired session");
        println!(
            "    eeprom: write: 0x{offset:04X}[0x{:04X}] #{:>2}",
            bytes.len(),
            self.operations.len()
        );
        if self.faulted() {
            println!("    eeprom: FAULT");
            return Err(EepromError);
        }
        self.operations.push(Operation::Write {
            offset,
            len: bytes.len(),
        });

        let offset = offset as usize;
        self.buf[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}

impl Platform for Eeprom {
    fn begin(&mut self) -> bool {
        if self.begin_refusals > 0 {
            self.begin_refusals -= 1;
            return false;
        }
        assert!(!self.open, "nested session");
        self.open = true;
        self.operations.push(Operation::Begin);
        true
    }

    fn commit(&mut self) {
        assert!(self.open, "commit without a session");
        self.open = false;
        self.operations.push(Operation::Commit);
    }

    fn restore_backup(&mut self) -> bool {
        match self.backup.take() {
            Some(copy) => {
                self.buf = copy;
                self.operations.push(Operation::Restore);
                true
            }
            None => false,
        }
    }
}

/// CRC-16/XMODEM over `data`, as stored in the blob header. Recomputed here
/// so splice tests can forge a valid checksum for a hand-edited payload.
pub fn payload_crc(data: &[u8]) -> u16 {
    crc::Crc::<u16>::new(&crc::CRC_16_XMODEM).checksum(data)
}
