//! The RAM bank layout model: bank descriptors, their sizes, and the
//! mutable layout builder that assigns addresses and answers the queries a
//! downstream generator relies on.

mod bank;
mod error;
mod layout;

pub use bank::{Bank, BankSize};
pub use error::{LayoutError, LayoutErrorKind};
pub use layout::{BankCountPolicy, LayoutDiagnostic, MemoryLayout};

//===========================================================================//
