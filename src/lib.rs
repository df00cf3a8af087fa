//! Memory bank layout modeling for SoC configuration generators.
//!
//! This crate models the RAM subsystem of a microcontroller-style SoC: it
//! accumulates memory banks (contiguous and interleaved), assigns each bank
//! its address range, and validates the resulting layout before it is
//! handed to a downstream code or RTL generator.
//!
//! # Example
//!
//! ```
//! use memlay::bus::BusType;
//! use memlay::mem::MemoryLayout;
//!
//! let mut layout = MemoryLayout::new(BusType::NToM);
//! layout.add_contiguous_banks(&[64, 64])?;
//! layout.add_interleaved_banks(2, 64)?;
//! assert!(layout.validate());
//! assert_eq!(layout.bank_count(), 4);
//! assert_eq!(layout.total_ram_size_kib(), 256);
//! assert_eq!(layout.interleaved_ram_start_address(), Some(0x20000));
//! # Ok::<(), memlay::mem::LayoutError>(())
//! ```

#![warn(missing_docs)]

pub mod bus;
pub mod link;
pub mod mem;
