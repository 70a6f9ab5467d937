use thiserror::Error;

/// Errors that can occur while persisting or restoring settings. Marked as
/// non-exhaustive to allow for future additions without breaking the API.
/// All blob-level errors are recoverable: callers fall back to
/// [`Settings::reset`](crate::Settings::reset) and keep running on compiled
/// defaults. Slot errors are local to the one slot operation that raised them.
#[derive(Error, Debug, PartialEq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The medium refused to open an access window. Nothing was acquired,
    /// so there is nothing to release.
    #[error("medium access refused")]
    AcquisitionFailure,

    /// The stored version tag differs from the compiled tag. The payload
    /// is never interpreted in this case.
    #[error("settings version mismatch")]
    VersionMismatch {
        /// Tag found at the start of the configuration region.
        stored: [u8; 4],
    },

    /// Payload length accounting disagrees with the compiled schema.
    #[error("settings size mismatch (expected {expected}, got {actual})")]
    SizeMismatch { expected: u16, actual: u16 },

    /// The checksum accumulated over the payload differs from the stored one.
    #[error("settings checksum mismatch (stored {stored:#06x}, computed {computed:#06x})")]
    ChecksumMismatch { stored: u16, computed: u16 },

    /// Slot index outside the current slot region geometry. No I/O has been
    /// performed.
    #[error("slot index {index} out of range ({count} slots)")]
    SlotIndexOutOfRange { index: u8, count: u16 },

    /// The medium failed during a slot transfer. Blob state and other slots
    /// are unaffected.
    #[error("slot i/o failure")]
    SlotIoFailure,

    /// The medium failed during a blob transfer. The error value returned by
    /// the [`Platform`](crate::platform::Platform) implementation is dropped.
    #[error("medium i/o failure")]
    MediumError,
}
