//! CSV input and output for surfaces, paths and profiles.
//!
//! Every table layout is a marker type implementing [`traits::CsvTable`], which
//! supplies headed reading and writing over readers, writers and file paths.

pub mod tables;
pub mod traits;
