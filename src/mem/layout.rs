use super::bank::Bank;
use super::error::LayoutError;
use crate::bus::BusType;
use std::error::Error;
use std::fmt;
use std::ops::Range;
use std::slice;

//===========================================================================//

/// A mutable builder that accumulates RAM banks, assigns their address
/// ranges, and answers the derived-layout queries a downstream generator
/// needs.
///
/// Banks are appended with [`add_contiguous_banks`] and
/// [`add_interleaved_banks`].  Each new bank is placed directly after the
/// previous one, so bank order, allocation order, and address order are all
/// the same, and the assigned ranges never have gaps or overlaps.  Once
/// building is done, the layout is read back through the query methods;
/// nothing enforces that mutation stops at that point, but the expected
/// usage is a single build pass followed by queries.
///
/// [`add_contiguous_banks`]: MemoryLayout::add_contiguous_banks
/// [`add_interleaved_banks`]: MemoryLayout::add_interleaved_banks
#[derive(Clone, Debug)]
pub struct MemoryLayout {
    bus_type: BusType,
    ram_start_address: u64,
    banks: Vec<Bank>,
    il_positions: Option<Range<usize>>,
    next_index: u32,
    next_address: u64,
}

impl MemoryLayout {
    /// Returns a new, empty layout with RAM starting at address 0.
    pub fn new(bus_type: BusType) -> MemoryLayout {
        MemoryLayout::with_start_address(bus_type, 0)
    }

    /// Returns a new, empty layout whose first bank will be placed at
    /// `ram_start_address`.
    pub fn with_start_address(
        bus_type: BusType,
        ram_start_address: u64,
    ) -> MemoryLayout {
        MemoryLayout {
            bus_type,
            ram_start_address,
            banks: Vec::new(),
            il_positions: None,
            next_index: 1,
            next_address: ram_start_address,
        }
    }

    /// Appends one bank per entry of `sizes_kib`, in order, each placed
    /// directly after the previous bank.
    ///
    /// Sizes are in KiB and must each be a power of two (and therefore at
    /// least 1 KiB).  If any entry is invalid, the layout is left
    /// unmodified.
    pub fn add_contiguous_banks(
        &mut self,
        sizes_kib: &[u32],
    ) -> Result<(), LayoutError> {
        let mut banks = Vec::<Bank>::with_capacity(sizes_kib.len());
        let mut next_address = self.next_address;
        let mut next_index = self.next_index;
        for &size_kib in sizes_kib {
            let bank = Bank::new(size_kib, next_address, next_index)?;
            next_address = bank.end_address();
            next_index += 1;
            banks.push(bank);
        }
        self.commit(banks, next_address, next_index);
        Ok(())
    }

    /// Appends `count` banks of `size_kib` KiB each, together forming the
    /// layout's interleave group.
    ///
    /// `count` must be a power of two (a one-bank group is permitted and
    /// needs no select bits); the low `count.ilog2()` address bits select
    /// the bank within the group.  Each bank still occupies its own
    /// distinct address range directly after the previous bank:
    /// interleaving is group membership plus a bit-select, not an
    /// address-overlap scheme.  At most one interleave group may exist per
    /// layout, and only on a bus type that supports interleaving.  On
    /// error, the layout is left unmodified.
    pub fn add_interleaved_banks(
        &mut self,
        count: u32,
        size_kib: u32,
    ) -> Result<(), LayoutError> {
        if !self.bus_type.supports_interleaving() {
            return Err(LayoutError::InterleavingUnsupported {
                bus_type: self.bus_type,
            });
        }
        if self.il_positions.is_some() {
            return Err(LayoutError::InterleavedGroupExists);
        }
        if !count.is_power_of_two() {
            return Err(LayoutError::InvalidGroupCount { count });
        }
        let group_bits = count.ilog2();
        let first = self.banks.len();
        let mut banks = Vec::<Bank>::with_capacity(count as usize);
        let mut next_address = self.next_address;
        let mut next_index = self.next_index;
        for group_index in 0..count {
            let bank = Bank::new_interleaved(
                size_kib,
                next_address,
                next_index,
                group_bits,
                group_index,
            )?;
            next_address = bank.end_address();
            next_index += 1;
            banks.push(bank);
        }
        self.commit(banks, next_address, next_index);
        self.il_positions = Some(first..self.banks.len());
        Ok(())
    }

    /// Appends a fully-validated batch of banks and advances the cursors.
    /// Mutation must go through here so that a failed batch never leaves
    /// the layout partially updated.
    fn commit(&mut self, mut banks: Vec<Bank>, address: u64, index: u32) {
        self.banks.append(&mut banks);
        self.next_address = address;
        self.next_index = index;
    }

    /// Returns the bus type that the layout was created with.
    pub fn bus_type(&self) -> BusType {
        self.bus_type
    }

    /// Returns the address of the first RAM bank.
    pub fn ram_start_address(&self) -> u64 {
        self.ram_start_address
    }

    /// Returns the address one past the last byte of the last RAM bank, or
    /// the start address if no banks have been added yet.
    pub fn ram_end_address(&self) -> u64 {
        self.next_address
    }

    /// Returns the total number of banks.
    pub fn bank_count(&self) -> usize {
        self.banks.len()
    }

    /// Returns the number of banks in the interleave group, or 0 if the
    /// layout has none.
    pub fn interleaved_bank_count(&self) -> usize {
        self.il_positions.clone().map(|positions| positions.len()).unwrap_or(0)
    }

    /// Returns the number of banks outside the interleave group.
    pub fn contiguous_bank_count(&self) -> usize {
        self.bank_count() - self.interleaved_bank_count()
    }

    /// Returns the sum of all bank sizes, in KiB.
    pub fn total_ram_size_kib(&self) -> u64 {
        self.banks.iter().map(|bank| u64::from(bank.size().kib())).sum()
    }

    /// Returns the sum of the interleave group's bank sizes, in KiB, or 0
    /// if the layout has no interleave group.
    pub fn interleaved_ram_size_kib(&self) -> u64 {
        self.iter_interleaved_banks()
            .map(|bank| u64::from(bank.size().kib()))
            .sum()
    }

    /// Returns an iterator over all banks, in address order.
    pub fn iter_banks(&self) -> slice::Iter<'_, Bank> {
        self.banks.iter()
    }

    /// Returns an iterator over the banks outside the interleave group, in
    /// address order.
    pub fn iter_contiguous_banks(&self) -> impl Iterator<Item = &Bank> + '_ {
        self.banks.iter().filter(|bank| !bank.is_interleaved())
    }

    /// Returns an iterator over the banks of the interleave group, in
    /// address order.
    pub fn iter_interleaved_banks(&self) -> impl Iterator<Item = &Bank> + '_ {
        self.banks.iter().filter(|bank| bank.is_interleaved())
    }

    /// Returns true if an interleave group has been added to this layout.
    pub fn has_interleaved_ram(&self) -> bool {
        self.il_positions.is_some()
    }

    /// Returns the start address of the first bank of the interleave
    /// group, or `None` if the layout has no interleave group.
    pub fn interleaved_ram_start_address(&self) -> Option<u64> {
        let positions = self.il_positions.clone()?;
        Some(self.banks[positions.start].start_address())
    }

    /// Returns the end address of the last bank of the interleave group,
    /// or `None` if the layout has no interleave group.
    pub fn interleaved_ram_end_address(&self) -> Option<u64> {
        let positions = self.il_positions.clone()?;
        Some(self.banks[positions.end - 1].end_address())
    }

    /// Returns the number of bytes spanned by the interleave group, or
    /// `None` if the layout has no interleave group.
    pub fn interleaved_ram_size_bytes(&self) -> Option<u64> {
        let start = self.interleaved_ram_start_address()?;
        let end = self.interleaved_ram_end_address()?;
        Some(end - start)
    }

    /// Returns true if the layout satisfies the default
    /// [`BankCountPolicy`].
    ///
    /// This check is advisory: a failing layout still answers queries and
    /// still accepts further banks.
    pub fn validate(&self) -> bool {
        self.validate_with(&BankCountPolicy::default()).is_ok()
    }

    /// Checks the layout against `policy`, returning a diagnostic that
    /// describes the violated bound if the policy does not hold.
    pub fn validate_with(
        &self,
        policy: &BankCountPolicy,
    ) -> Result<(), LayoutDiagnostic> {
        let count = self.bank_count();
        if count < policy.min_banks {
            Err(LayoutDiagnostic::TooFewBanks {
                count,
                min: policy.min_banks,
            })
        } else if count > policy.max_banks {
            Err(LayoutDiagnostic::TooManyBanks {
                count,
                max: policy.max_banks,
            })
        } else {
            Ok(())
        }
    }
}

//===========================================================================//

/// Policy bounds on how many banks a layout should have.
///
/// The defaults, 2 to 16 banks, are what current generators accept.  The
/// upper bound in particular is provisional, which is why the bounds are a
/// policy value checked by [`MemoryLayout::validate_with`] rather than a
/// structural invariant of the layout.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct BankCountPolicy {
    /// The smallest acceptable number of banks.
    pub min_banks: usize,
    /// The largest acceptable number of banks.
    pub max_banks: usize,
}

impl Default for BankCountPolicy {
    fn default() -> BankCountPolicy {
        BankCountPolicy { min_banks: 2, max_banks: 16 }
    }
}

//===========================================================================//

/// A policy violation reported by [`MemoryLayout::validate_with`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LayoutDiagnostic {
    /// The layout has fewer banks than the policy minimum.
    TooFewBanks {
        /// The number of banks in the layout.
        count: usize,
        /// The policy minimum.
        min: usize,
    },
    /// The layout has more banks than the policy maximum.
    TooManyBanks {
        /// The number of banks in the layout.
        count: usize,
        /// The policy maximum.
        max: usize,
    },
}

impl fmt::Display for LayoutDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            LayoutDiagnostic::TooFewBanks { count, min } => {
                write!(
                    f,
                    "the number of banks should be at least {min}, got \
                     {count}"
                )
            }
            LayoutDiagnostic::TooManyBanks { count, max } => {
                write!(
                    f,
                    "the number of banks should be at most {max}, got \
                     {count}"
                )
            }
        }
    }
}

impl Error for LayoutDiagnostic {}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{BankCountPolicy, LayoutDiagnostic, MemoryLayout};
    use crate::bus::BusType;
    use crate::mem::{LayoutError, LayoutErrorKind};

    #[test]
    fn contiguous_banks_are_contiguous() {
        let mut layout = MemoryLayout::new(BusType::OneToM);
        layout.add_contiguous_banks(&[32, 1, 8, 64]).unwrap();
        let mut address = 0;
        let mut index = 1;
        for bank in layout.iter_banks() {
            assert_eq!(bank.start_address(), address);
            assert_eq!(bank.end_address(), address + bank.size().bytes());
            assert_eq!(bank.index(), index);
            address = bank.end_address();
            index += 1;
        }
        assert_eq!(address, (32 + 1 + 8 + 64) * 1024);
        assert_eq!(layout.ram_end_address(), address);
    }

    #[test]
    fn contiguous_bank_batches_accumulate() {
        let mut layout = MemoryLayout::new(BusType::NToM);
        layout.add_contiguous_banks(&[16]).unwrap();
        layout.add_contiguous_banks(&[16, 32]).unwrap();
        assert_eq!(layout.bank_count(), 3);
        let last = layout.iter_banks().last().unwrap();
        assert_eq!(last.index(), 3);
        assert_eq!(last.start_address(), 0x8000);
    }

    #[test]
    fn failed_contiguous_batch_leaves_layout_unmodified() {
        let mut layout = MemoryLayout::new(BusType::NToM);
        layout.add_contiguous_banks(&[32]).unwrap();
        let error = layout.add_contiguous_banks(&[16, 3, 64]).unwrap_err();
        assert_eq!(error, LayoutError::InvalidBankSize { size_kib: 3 });
        assert_eq!(layout.bank_count(), 1);
        assert_eq!(layout.ram_end_address(), 0x8000);
        // The next batch reuses the cursors the failed batch left alone.
        layout.add_contiguous_banks(&[32]).unwrap();
        let last = layout.iter_banks().last().unwrap();
        assert_eq!(last.index(), 2);
        assert_eq!(last.start_address(), 0x8000);
    }

    #[test]
    fn interleaved_banks_share_group_bits() {
        let mut layout = MemoryLayout::new(BusType::NToM);
        layout.add_interleaved_banks(4, 16).unwrap();
        assert_eq!(layout.interleaved_bank_count(), 4);
        for (i, bank) in layout.iter_interleaved_banks().enumerate() {
            assert_eq!(bank.il_group_bits(), 2);
            assert_eq!(bank.il_group_index(), i as u32);
        }
    }

    #[test]
    fn interleaved_banks_advance_the_address_cursor() {
        let mut layout = MemoryLayout::new(BusType::NToM);
        layout.add_contiguous_banks(&[32]).unwrap();
        layout.add_interleaved_banks(4, 16).unwrap();
        assert_eq!(layout.interleaved_ram_start_address(), Some(0x8000));
        assert_eq!(layout.interleaved_ram_end_address(), Some(0x18000));
        assert_eq!(layout.interleaved_ram_size_bytes(), Some(0x10000));
        // Banks appended after the group go directly after it.
        layout.add_contiguous_banks(&[8]).unwrap();
        let last = layout.iter_banks().last().unwrap();
        assert_eq!(last.start_address(), 0x18000);
    }

    #[test]
    fn only_one_interleaved_group() {
        let mut layout = MemoryLayout::new(BusType::NToM);
        layout.add_interleaved_banks(2, 16).unwrap();
        let error = layout.add_interleaved_banks(2, 16).unwrap_err();
        assert_eq!(error, LayoutError::InterleavedGroupExists);
        assert_eq!(error.kind(), LayoutErrorKind::State);
        assert_eq!(layout.bank_count(), 2);
    }

    #[test]
    fn interleaving_requires_a_compatible_bus() {
        let mut layout = MemoryLayout::new(BusType::OneToM);
        let error = layout.add_interleaved_banks(2, 16).unwrap_err();
        assert_eq!(
            error,
            LayoutError::InterleavingUnsupported {
                bus_type: BusType::OneToM,
            }
        );
        assert_eq!(error.kind(), LayoutErrorKind::Unsupported);
        assert_eq!(layout.bank_count(), 0);
    }

    #[test]
    fn interleaved_group_count_must_be_a_power_of_two() {
        let mut layout = MemoryLayout::new(BusType::NToM);
        for count in [0, 3, 6] {
            let error = layout.add_interleaved_banks(count, 16).unwrap_err();
            assert_eq!(error, LayoutError::InvalidGroupCount { count });
            assert_eq!(error.kind(), LayoutErrorKind::Value);
        }
        assert_eq!(layout.bank_count(), 0);
        assert!(!layout.has_interleaved_ram());
    }

    #[test]
    fn one_bank_interleaved_group() {
        // 1 is a power of two; the group just needs no select bits.
        let mut layout = MemoryLayout::new(BusType::NToM);
        layout.add_contiguous_banks(&[32]).unwrap();
        layout.add_interleaved_banks(1, 16).unwrap();
        assert!(layout.has_interleaved_ram());
        assert_eq!(layout.interleaved_bank_count(), 1);
        assert_eq!(layout.contiguous_bank_count(), 1);
        assert_eq!(layout.interleaved_ram_size_kib(), 16);
        assert_eq!(layout.interleaved_ram_start_address(), Some(0x8000));
        assert_eq!(layout.interleaved_ram_end_address(), Some(0xc000));
        let bank = layout.iter_interleaved_banks().next().unwrap();
        assert!(bank.is_interleaved());
        assert_eq!(bank.il_group_bits(), 0);
        assert_eq!(bank.il_group_index(), 0);
        // The group slot is taken, even with a single bank in it.
        let error = layout.add_interleaved_banks(2, 16).unwrap_err();
        assert_eq!(error, LayoutError::InterleavedGroupExists);
    }

    #[test]
    fn failed_interleaved_batch_leaves_layout_unmodified() {
        let mut layout = MemoryLayout::new(BusType::NToM);
        layout.add_contiguous_banks(&[32]).unwrap();
        let error = layout.add_interleaved_banks(2, 3).unwrap_err();
        assert_eq!(error, LayoutError::InvalidBankSize { size_kib: 3 });
        assert_eq!(layout.bank_count(), 1);
        assert_eq!(layout.ram_end_address(), 0x8000);
        assert!(!layout.has_interleaved_ram());
        assert_eq!(layout.interleaved_bank_count(), 0);
        // The next batch reuses the cursors the failed batch left alone,
        // and may still claim the group slot.
        layout.add_interleaved_banks(2, 16).unwrap();
        assert_eq!(layout.interleaved_ram_start_address(), Some(0x8000));
        let indices: Vec<u32> =
            layout.iter_interleaved_banks().map(|bank| bank.index()).collect();
        assert_eq!(indices, [2, 3]);
    }

    #[test]
    fn size_sums() {
        let mut layout = MemoryLayout::new(BusType::NToM);
        layout.add_contiguous_banks(&[32]).unwrap();
        layout.add_interleaved_banks(4, 16).unwrap();
        assert_eq!(layout.bank_count(), 5);
        assert_eq!(layout.contiguous_bank_count(), 1);
        assert_eq!(layout.interleaved_bank_count(), 4);
        assert_eq!(layout.interleaved_ram_size_kib(), 64);
        assert_eq!(layout.total_ram_size_kib(), 96);
        let contiguous_kib: u64 = layout
            .iter_contiguous_banks()
            .map(|bank| u64::from(bank.size().kib()))
            .sum();
        assert_eq!(
            layout.total_ram_size_kib(),
            contiguous_kib + layout.interleaved_ram_size_kib()
        );
        assert!(layout.validate());
    }

    #[test]
    fn queries_without_an_interleaved_group() {
        let mut layout = MemoryLayout::new(BusType::NToM);
        layout.add_contiguous_banks(&[16, 16]).unwrap();
        assert!(!layout.has_interleaved_ram());
        assert_eq!(layout.interleaved_bank_count(), 0);
        assert_eq!(layout.interleaved_ram_size_kib(), 0);
        assert_eq!(layout.interleaved_ram_start_address(), None);
        assert_eq!(layout.interleaved_ram_end_address(), None);
        assert_eq!(layout.interleaved_ram_size_bytes(), None);
        assert_eq!(layout.iter_interleaved_banks().count(), 0);
    }

    #[test]
    fn queries_are_idempotent() {
        let mut layout = MemoryLayout::new(BusType::NToM);
        layout.add_contiguous_banks(&[32]).unwrap();
        layout.add_interleaved_banks(4, 16).unwrap();
        for _ in 0..2 {
            assert_eq!(layout.bank_count(), 5);
            assert_eq!(layout.total_ram_size_kib(), 96);
            assert_eq!(layout.iter_banks().count(), 5);
            assert_eq!(layout.iter_contiguous_banks().count(), 1);
            assert_eq!(layout.interleaved_ram_start_address(), Some(0x8000));
            assert!(layout.validate());
        }
    }

    #[test]
    fn validate_bank_count_bounds() {
        let mut layout = MemoryLayout::new(BusType::NToM);
        assert!(!layout.validate());
        layout.add_contiguous_banks(&[16]).unwrap();
        assert!(!layout.validate());
        layout.add_contiguous_banks(&[16]).unwrap();
        assert!(layout.validate());
        layout.add_contiguous_banks(&[16; 14]).unwrap();
        assert_eq!(layout.bank_count(), 16);
        assert!(layout.validate());
        layout.add_contiguous_banks(&[16]).unwrap();
        assert!(!layout.validate());
    }

    #[test]
    fn validate_diagnostics() {
        let policy = BankCountPolicy::default();
        let layout = MemoryLayout::new(BusType::NToM);
        assert_eq!(
            layout.validate_with(&policy),
            Err(LayoutDiagnostic::TooFewBanks { count: 0, min: 2 })
        );
        let mut layout = MemoryLayout::new(BusType::NToM);
        layout.add_contiguous_banks(&[1; 17]).unwrap();
        let diagnostic = layout.validate_with(&policy).unwrap_err();
        assert_eq!(
            diagnostic,
            LayoutDiagnostic::TooManyBanks { count: 17, max: 16 }
        );
        assert_eq!(
            format!("{}", diagnostic),
            "the number of banks should be at most 16, got 17"
        );
        let _: &dyn std::error::Error = &diagnostic;
    }

    #[test]
    fn validate_with_a_custom_policy() {
        let policy = BankCountPolicy { min_banks: 1, max_banks: 32 };
        let mut layout = MemoryLayout::new(BusType::NToM);
        layout.add_contiguous_banks(&[16]).unwrap();
        assert!(!layout.validate());
        assert_eq!(layout.validate_with(&policy), Ok(()));
    }

    #[test]
    fn nonzero_start_address() {
        let mut layout =
            MemoryLayout::with_start_address(BusType::NToM, 0x2000_0000);
        assert_eq!(layout.ram_start_address(), 0x2000_0000);
        layout.add_contiguous_banks(&[64]).unwrap();
        layout.add_interleaved_banks(2, 32).unwrap();
        let first = layout.iter_banks().next().unwrap();
        assert_eq!(first.start_address(), 0x2000_0000);
        assert_eq!(layout.interleaved_ram_start_address(), Some(0x2001_0000));
        assert_eq!(layout.ram_end_address(), 0x2002_0000);
    }
}

//===========================================================================//
