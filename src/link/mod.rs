//! Facilities for mapping linker script sections onto a finished memory
//! layout.

mod section;

pub use section::{LinkerSection, SectionError, check_sections};

//===========================================================================//
