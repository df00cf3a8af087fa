use crate::bus::BusType;
use std::error::Error;
use std::fmt;

//===========================================================================//

/// An error encountered while building a memory layout.
///
/// Batch operations on a [`MemoryLayout`](super::MemoryLayout) report the
/// first error and leave the layout unmodified; there is no partial commit
/// to recover from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LayoutError {
    /// A bank's address range would extend past the end of the address
    /// space.
    AddressOverflow {
        /// The start address that was assigned to the bank.
        start_address: u64,
        /// The requested bank size, in KiB.
        size_kib: u32,
    },
    /// A second interleave group was requested; a layout supports at most
    /// one.
    InterleavedGroupExists,
    /// An interleave group was requested on a bus type that does not
    /// support interleaved memory.
    InterleavingUnsupported {
        /// The bus type that the layout was created with.
        bus_type: BusType,
    },
    /// A requested bank size was zero or not a power of two.
    InvalidBankSize {
        /// The requested size, in KiB.
        size_kib: u32,
    },
    /// The requested number of banks for an interleave group was zero or
    /// not a power of two.
    InvalidGroupCount {
        /// The requested number of banks.
        count: u32,
    },
}

impl LayoutError {
    /// Returns the coarse classification of this error, for callers that
    /// branch on the failure category rather than the exact variant.
    pub fn kind(&self) -> LayoutErrorKind {
        match self {
            LayoutError::AddressOverflow { .. }
            | LayoutError::InvalidBankSize { .. }
            | LayoutError::InvalidGroupCount { .. } => LayoutErrorKind::Value,
            LayoutError::InterleavedGroupExists => LayoutErrorKind::State,
            LayoutError::InterleavingUnsupported { .. } => {
                LayoutErrorKind::Unsupported
            }
        }
    }
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            LayoutError::AddressOverflow { start_address, size_kib } => {
                write!(
                    f,
                    "a {size_kib} KiB bank at {start_address:#x} would \
                     overflow the address space"
                )
            }
            LayoutError::InterleavedGroupExists => {
                write!(f, "only one interleaved bank group is possible")
            }
            LayoutError::InterleavingUnsupported { bus_type } => {
                write!(
                    f,
                    "this system has a {bus_type} bus, which does not \
                     support interleaved memory"
                )
            }
            LayoutError::InvalidBankSize { size_kib } => {
                write!(
                    f,
                    "bank sizes must be a power of two of at least 1 KiB, \
                     got {size_kib}"
                )
            }
            LayoutError::InvalidGroupCount { count } => {
                write!(
                    f,
                    "a power of two is required for the number of \
                     interleaved banks, got {count}"
                )
            }
        }
    }
}

impl Error for LayoutError {}

//===========================================================================//

/// A coarse classification of [`LayoutError`]s.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LayoutErrorKind {
    /// An argument had the right type but an invalid value.
    Value,
    /// The operation is invalid in the layout's current state.
    State,
    /// The operation is not supported by the layout's fixed configuration.
    Unsupported,
}

//===========================================================================//


//===========================================================================//
