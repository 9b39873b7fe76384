//! Analysis logic for parsed Go sources
//!
//! Pure queries over a [`SourceFile`](crate::syntax::SourceFile), separated
//! from the code that mutates it.

pub mod entry_point;

pub use entry_point::{find_entry_file, find_entry_point, has_entry_point, EntryPointRef};
