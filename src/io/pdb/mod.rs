//! Legacy Protein Data Bank fixed-column format.

pub mod reader;
pub mod writer;
