//! # bio-convert
//!
//! **bio-convert** converts macromolecular structure files between the legacy PDB format, mmCIF and the binary MMTF encoding. Every reader produces the same in-memory [`Structure`] and every writer consumes it, so any input format can be written in any output format.
//!
//! ## Features
//!
//! - **Three formats** – Fixed-column PDB, STAR-based mmCIF and MessagePack MMTF are read and written with metadata (id code, title, unit cell) carried across.
//! - **Format detection** – Inputs are recognized by extension and, failing that, by content; gzip-compressed inputs are inflated transparently.
//! - **Structured diagnostics** – Parse errors report the format, file and line, and lossy writes (overlong chain ids, out-of-range serials) are logged through `log`.
//! - **Conversion workflow** – [`convert::Conversion`] plans, loads and writes a conversion the way the `bioconvert` binary does.

mod model;

pub mod convert;
pub mod io;

pub use model::atom::Atom;
pub use model::chain::Chain;
pub use model::models::Model;
pub use model::residue::Residue;
pub use model::structure::Structure;
pub use model::types::{Element, Point, StandardResidue, UnitCell};
