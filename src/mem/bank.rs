use super::error::LayoutError;
use std::fmt;
use std::num::NonZero;

//===========================================================================//

/// The number of bytes in one KiB.
const KIB: u64 = 1024;

//===========================================================================//

/// Represents the size of a single RAM bank, in KiB.
///
/// Essentially, a `BankSize` is an unsigned 32-bit KiB count that is
/// guaranteed to be a power of two, and therefore at least 1 KiB.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct BankSize(NonZero<u32>);

impl BankSize {
    /// The smallest permitted bank size, 1 KiB.
    pub const MIN: BankSize = BankSize(NonZero::new(1).unwrap());

    /// Returns the size in KiB.
    pub fn kib(self) -> u32 {
        self.0.get()
    }

    /// Returns the size in bytes.
    pub fn bytes(self) -> u64 {
        u64::from(self.0.get()) * KIB
    }

    /// Returns the base-2 logarithm of the KiB count.
    ///
    /// This is always exact, as `self` represents a power of two.
    pub fn log2(self) -> u32 {
        self.0.ilog2()
    }
}

impl TryFrom<u32> for BankSize {
    type Error = LayoutError;

    fn try_from(value: u32) -> Result<BankSize, LayoutError> {
        if let Some(nonzero) = NonZero::new(value)
            && nonzero.is_power_of_two()
        {
            Ok(BankSize(nonzero))
        } else {
            Err(LayoutError::InvalidBankSize { size_kib: value })
        }
    }
}

impl From<BankSize> for u32 {
    fn from(size: BankSize) -> u32 {
        size.0.get()
    }
}

impl fmt::Debug for BankSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "BankSize({:?})", self.0)
    }
}

impl fmt::Display for BankSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        self.0.fmt(f)
    }
}

//===========================================================================//

/// A bank's membership in an interleave group: the number of low address
/// bits that select a bank within the group, and this bank's position.
///
/// Stored as a whole so that a one-bank group (zero select bits) is still
/// distinguishable from a contiguous bank.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
struct IlGroup {
    bits: u32,
    index: u32,
}

//===========================================================================//

/// Represents one physical RAM bank within a memory layout.
///
/// A bank is immutable once created.  Banks are allocated by the owning
/// [`MemoryLayout`](super::MemoryLayout), which assigns each bank its start
/// address, allocation index, and interleave group membership; the bank
/// itself computes its end address from its size and start address.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Bank {
    size: BankSize,
    start_address: u64,
    index: u32,
    il_group: Option<IlGroup>,
}

impl Bank {
    /// Allocates a contiguous bank.
    pub(crate) fn new(
        size_kib: u32,
        start_address: u64,
        index: u32,
    ) -> Result<Bank, LayoutError> {
        Bank::build(size_kib, start_address, index, None)
    }

    /// Allocates a bank belonging to an interleave group.
    pub(crate) fn new_interleaved(
        size_kib: u32,
        start_address: u64,
        index: u32,
        group_bits: u32,
        group_index: u32,
    ) -> Result<Bank, LayoutError> {
        let il_group = IlGroup { bits: group_bits, index: group_index };
        Bank::build(size_kib, start_address, index, Some(il_group))
    }

    fn build(
        size_kib: u32,
        start_address: u64,
        index: u32,
        il_group: Option<IlGroup>,
    ) -> Result<Bank, LayoutError> {
        let size = BankSize::try_from(size_kib)?;
        if start_address.checked_add(size.bytes()).is_none() {
            return Err(LayoutError::AddressOverflow {
                start_address,
                size_kib,
            });
        }
        Ok(Bank { size, start_address, index, il_group })
    }

    /// Returns the size of this bank.
    pub fn size(&self) -> BankSize {
        self.size
    }

    /// Returns the address of the first byte of this bank.
    pub fn start_address(&self) -> u64 {
        self.start_address
    }

    /// Returns the address one past the last byte of this bank.
    pub fn end_address(&self) -> u64 {
        self.start_address + self.size.bytes()
    }

    /// Returns this bank's position in allocation order, starting at 1.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Returns the number of low address bits used to select a bank within
    /// this bank's interleave group, or 0 for a contiguous bank (and for a
    /// bank in a one-bank group, which needs no select bits).
    pub fn il_group_bits(&self) -> u32 {
        self.il_group.map(|il_group| il_group.bits).unwrap_or(0)
    }

    /// Returns this bank's position within its interleave group, or 0 for
    /// a contiguous bank.
    pub fn il_group_index(&self) -> u32 {
        self.il_group.map(|il_group| il_group.index).unwrap_or(0)
    }

    /// Returns true if this bank belongs to an interleave group.
    pub fn is_interleaved(&self) -> bool {
        self.il_group.is_some()
    }
}

//===========================================================================//


//===========================================================================//
