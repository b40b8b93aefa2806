//! Macromolecular Crystallographic Information File (mmCIF).

pub mod reader;
pub mod syntax;
pub mod writer;
