use crate::mem::MemoryLayout;
use rangemap::RangeInclusiveSet;
use std::error::Error;
use std::fmt;
use std::ops::RangeInclusive;
use std::rc::Rc;

//===========================================================================//

/// A named address range that a linker script places code or data in.
///
/// Sections are half-open ranges, `start..end`, in the same byte address
/// space as the banks of a [`MemoryLayout`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LinkerSection {
    name: Rc<str>,
    start: u64,
    end: u64,
}

impl LinkerSection {
    /// Returns a new section covering the addresses `start..end`.  Fails
    /// if that range is empty.
    pub fn new(
        name: &str,
        start: u64,
        end: u64,
    ) -> Result<LinkerSection, SectionError> {
        if end <= start {
            return Err(SectionError::EmptySection { name: Rc::from(name) });
        }
        Ok(LinkerSection { name: Rc::from(name), start, end })
    }

    /// Returns the name of this section.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the address of the first byte of this section.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Returns the address one past the last byte of this section.
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Returns the size of this section, in bytes.
    pub fn size(&self) -> u64 {
        self.end - self.start
    }

    fn byte_range(&self) -> RangeInclusive<u64> {
        debug_assert!(self.start < self.end);
        self.start..=(self.end - 1)
    }
}

//===========================================================================//

/// Checks that every section fits wholly within the RAM address range of
/// `layout`, and that no two sections claim overlapping addresses.
///
/// Sections may be given in any order and may leave gaps between one
/// another; only containment and overlap are checked.
pub fn check_sections(
    layout: &MemoryLayout,
    sections: &[LinkerSection],
) -> Result<(), SectionError> {
    let ram_start = layout.ram_start_address();
    let ram_end = layout.ram_end_address();
    let mut claimed = RangeInclusiveSet::<u64>::new();
    for section in sections {
        if section.start < ram_start || section.end > ram_end {
            return Err(SectionError::OutOfRange {
                name: section.name.clone(),
            });
        }
        // RAM is nonempty here, since it contains this section.
        let ram_range = ram_start..=(ram_end - 1);
        let range = section.byte_range();
        let fits = claimed.gaps(&ram_range).any(|gap| {
            gap.start() <= range.start() && range.end() <= gap.end()
        });
        if !fits {
            return Err(SectionError::Overlap { name: section.name.clone() });
        }
        claimed.insert(range);
    }
    Ok(())
}

//===========================================================================//

/// An error encountered while creating linker sections or checking them
/// against a memory layout.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SectionError {
    /// A section's address range was empty.
    EmptySection {
        /// The name of the offending section.
        name: Rc<str>,
    },
    /// A section was not wholly contained in the layout's RAM range.
    OutOfRange {
        /// The name of the offending section.
        name: Rc<str>,
    },
    /// A section overlapped one of the sections before it.
    Overlap {
        /// The name of the offending section.
        name: Rc<str>,
    },
}

impl fmt::Display for SectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            SectionError::EmptySection { name } => {
                write!(f, "section `{name}` has an empty address range")
            }
            SectionError::OutOfRange { name } => {
                write!(f, "section `{name}` does not fit in RAM")
            }
            SectionError::Overlap { name } => {
                write!(f, "section `{name}` overlaps another section")
            }
        }
    }
}

impl Error for SectionError {}

//===========================================================================//


//===========================================================================//
