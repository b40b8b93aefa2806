//! Core data structures modeling biological macromolecules.
//!
//! This module defines the structure object every reader produces and every writer consumes:
//! atoms, residues, chains, models and the owning structure. Conversions never reach into
//! these types beyond summary counts; all format knowledge lives in `io`.

pub mod atom;
pub mod chain;
pub mod models;
pub mod residue;
pub mod structure;
pub mod types;
