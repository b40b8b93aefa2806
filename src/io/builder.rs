//! Incremental assembly of a [`Structure`] from flat atom records.
//!
//! PDB and mmCIF both describe atoms one row at a time and repeat the model, chain and residue
//! labels on every row. The builder groups those rows into the model hierarchy while keeping
//! first-appearance order at every level, so a chain that reappears later in a model (for
//! example waters listed after all polymer chains) is appended to the existing chain.
//!
//! Residues are grouped by consecutive rows only. A row extends the chain's last residue when
//! its number, insertion code and name all match; anything else opens a new residue, even when
//! an earlier residue of the chain carries the same number.

use crate::model::{atom::Atom, chain::Chain, models::Model, residue::Residue};
use std::collections::HashMap;

/// Residue labels shared by every atom of a residue.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResidueSite<'a> {
    pub chain_id: &'a str,
    pub seq_id: i32,
    pub insertion_code: Option<char>,
    pub name: &'a str,
    pub hetero: bool,
}

struct ChainBuffer {
    id: String,
    residues: Vec<Residue>,
}

impl ChainBuffer {
    /// The residue the next atom of `site` belongs to, opened if the last one differs.
    fn residue_for(&mut self, site: &ResidueSite<'_>) -> &mut Residue {
        let continues = self.residues.last().is_some_and(|last| {
            last.id == site.seq_id
                && last.insertion_code == site.insertion_code
                && last.name == site.name
        });
        if !continues {
            self.residues.push(Residue::new(
                site.seq_id,
                site.insertion_code,
                site.name,
                site.hetero,
            ));
        }
        let last = self.residues.len() - 1;
        &mut self.residues[last]
    }
}

struct ModelBuffer {
    serial: i32,
    chains: Vec<ChainBuffer>,
    index: HashMap<String, usize>,
}

#[derive(Default)]
pub(crate) struct StructureBuilder {
    models: Vec<ModelBuffer>,
    index: HashMap<i32, usize>,
    atoms: usize,
}

impl StructureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn atom_count(&self) -> usize {
        self.atoms
    }

    /// Files the atom under its model, chain and residue, creating each level on first sight.
    pub fn add_atom(&mut self, model_serial: i32, site: ResidueSite<'_>, atom: Atom) {
        let model_idx = *self.index.entry(model_serial).or_insert_with(|| {
            self.models.push(ModelBuffer {
                serial: model_serial,
                chains: Vec::new(),
                index: HashMap::new(),
            });
            self.models.len() - 1
        });
        let model = &mut self.models[model_idx];

        let chain_idx = match model.index.get(site.chain_id) {
            Some(&idx) => idx,
            None => {
                model.chains.push(ChainBuffer {
                    id: site.chain_id.to_string(),
                    residues: Vec::new(),
                });
                let idx = model.chains.len() - 1;
                model.index.insert(site.chain_id.to_string(), idx);
                idx
            }
        };
        let chain = &mut model.chains[chain_idx];

        chain.residue_for(&site).add_atom(atom);
        self.atoms += 1;
    }

    /// Consumes the buffers and returns the models in first-appearance order.
    pub fn finish(self) -> Vec<Model> {
        self.models
            .into_iter()
            .map(|buffer| {
                let mut model = Model::new(buffer.serial);
                for chain_buffer in buffer.chains {
                    let mut chain = Chain::new(&chain_buffer.id);
                    for residue in chain_buffer.residues {
                        chain.add_residue(residue);
                    }
                    model.add_chain(chain);
                }
                model
            })
            .collect()
    }
}
