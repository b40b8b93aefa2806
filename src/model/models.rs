//! Coordinate models (NMR ensembles, multi-state depositions).

use super::atom::Atom;
use super::chain::Chain;
use std::fmt;

/// One coordinate model of a structure, holding chains in first-appearance order.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    /// Model number as written in `MODEL` records or `pdbx_PDB_model_num`.
    pub serial: i32,
    chains: Vec<Chain>,
}

impl Model {
    pub fn new(serial: i32) -> Self {
        Self {
            serial,
            chains: Vec::new(),
        }
    }

    pub fn add_chain(&mut self, chain: Chain) {
        debug_assert!(
            self.chain(&chain.id).is_none(),
            "Attempted to add a duplicate chain ID '{}' to model {}",
            chain.id,
            self.serial
        );
        self.chains.push(chain);
    }

    pub fn chain(&self, id: &str) -> Option<&Chain> {
        self.chains.iter().find(|c| c.id == id)
    }

    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    pub fn residue_count(&self) -> usize {
        self.chains.iter().map(|c| c.residue_count()).sum()
    }

    pub fn atom_count(&self) -> usize {
        self.chains.iter().map(|c| c.iter_atoms().count()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    pub fn iter_chains(&self) -> std::slice::Iter<'_, Chain> {
        self.chains.iter()
    }

    pub fn iter_atoms(&self) -> impl Iterator<Item = &Atom> {
        self.chains.iter().flat_map(|c| c.iter_atoms())
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Model {{ serial: {}, chains: {}, atoms: {} }}",
            self.serial,
            self.chain_count(),
            self.atom_count()
        )
    }
}
