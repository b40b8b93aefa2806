//! Macromolecular Transmission Format: MessagePack container with compressed binary columns.

pub mod codec;
pub mod reader;
pub mod types;
pub mod writer;
