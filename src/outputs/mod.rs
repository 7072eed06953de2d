//! Report output.
//!
//! - [`csv`]: writes the deduplicated rows as a two-column `Name,Link` table

pub mod csv;
