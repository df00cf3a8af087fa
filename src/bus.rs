//! The on-chip interconnect topologies that a memory layout can target.

use std::fmt;

//===========================================================================//

/// The topology of the on-chip bus connecting manager ports to memory.
///
/// The bus type is fixed when a [`MemoryLayout`](crate::mem::MemoryLayout)
/// is created, and determines which memory organization features the layout
/// may use.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BusType {
    /// A shared bus: one manager port at a time reaches the M subordinate
    /// ports.
    OneToM,
    /// A full crossbar from N manager ports to M subordinate ports.
    NToM,
}

impl BusType {
    /// Returns true if this bus type supports interleaved memory banks.
    ///
    /// Interleaving spreads consecutive words over the banks of a group to
    /// let multiple managers access memory in parallel, so it is only
    /// available on topologies with more than one concurrent manager port.
    pub fn supports_interleaving(self) -> bool {
        match self {
            BusType::OneToM => false,
            BusType::NToM => true,
        }
    }
}

impl fmt::Display for BusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            BusType::OneToM => "onetoM".fmt(f),
            BusType::NToM => "NtoM".fmt(f),
        }
    }
}

//===========================================================================//


//===========================================================================//
