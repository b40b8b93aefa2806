use super::atom::Atom;
use super::chain::Chain;
use super::models::Model;
use super::types::UnitCell;
use std::fmt;

/// In-memory structure shared by every reader and writer.
///
/// Entry-level metadata (identifier, title, unit cell) sits next to an ordered list of
/// coordinate models. Single-model files produce exactly one [`Model`].
#[derive(Debug, Clone, Default)]
pub struct Structure {
    /// Four-character PDB identifier or mmCIF data block name.
    pub id_code: Option<String>,
    pub title: Option<String>,
    pub cell: Option<UnitCell>,
    models: Vec<Model>,
}

impl Structure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_model(&mut self, model: Model) {
        self.models.push(model);
    }

    pub fn model(&self, serial: i32) -> Option<&Model> {
        self.models.iter().find(|m| m.serial == serial)
    }

    /// The model writers and summaries treat as representative.
    pub fn first_model(&self) -> Option<&Model> {
        self.models.first()
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn chain_count(&self) -> usize {
        self.models.iter().map(|m| m.chain_count()).sum()
    }

    pub fn residue_count(&self) -> usize {
        self.models.iter().map(|m| m.residue_count()).sum()
    }

    pub fn atom_count(&self) -> usize {
        self.models.iter().map(|m| m.atom_count()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.models.iter().all(|m| m.is_empty())
    }

    pub fn iter_models(&self) -> std::slice::Iter<'_, Model> {
        self.models.iter()
    }

    pub fn iter_chains(&self) -> impl Iterator<Item = &Chain> {
        self.models.iter().flat_map(|m| m.iter_chains())
    }

    pub fn iter_atoms(&self) -> impl Iterator<Item = &Atom> {
        self.models.iter().flat_map(|m| m.iter_atoms())
    }

    /// Distinct chain identifiers in first-appearance order across all models.
    pub fn chain_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for chain in self.iter_chains() {
            if !ids.contains(&chain.id.as_str()) {
                ids.push(chain.id.as_str());
            }
        }
        ids
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Structure {{ models: {}, chains: {}, residues: {}, atoms: {} }}",
            self.model_count(),
            self.chain_count(),
            self.residue_count(),
            self.atom_count()
        )
    }
}

impl FromIterator<Model> for Structure {
    fn from_iter<T: IntoIterator<Item = Model>>(iter: T) -> Self {
        Self {
            models: iter.into_iter().collect(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::residue::Residue;
    use crate::model::types::{Element, Point};

    fn model_with_chains(serial: i32, chain_ids: &[&str]) -> Model {
        let mut model = Model::new(serial);
        for id in chain_ids {
            let mut chain = Chain::new(id);
            let mut residue = Residue::new(1, None, "ALA", false);
            residue.add_atom(Atom::new("CA", Element::C, Point::origin()));
            chain.add_residue(residue);
            model.add_chain(chain);
        }
        model
    }

    #[test]
    fn structure_new_creates_empty_structure() {
        let structure = Structure::new();

        assert!(structure.is_empty());
        assert_eq!(structure.model_count(), 0);
        assert_eq!(structure.atom_count(), 0);
        assert!(structure.cell.is_none());
        assert!(structure.id_code.is_none());
    }

    #[test]
    fn structure_counts_span_all_models() {
        let structure: Structure = vec![
            model_with_chains(1, &["A", "B"]),
            model_with_chains(2, &["A", "B"]),
        ]
        .into_iter()
        .collect();

        assert_eq!(structure.model_count(), 2);
        assert_eq!(structure.chain_count(), 4);
        assert_eq!(structure.residue_count(), 4);
        assert_eq!(structure.atom_count(), 4);
        assert_eq!(structure.model(2).unwrap().serial, 2);
        assert_eq!(structure.first_model().unwrap().serial, 1);
    }

    #[test]
    fn structure_chain_ids_are_deduplicated_in_order() {
        let mut structure = Structure::new();
        structure.add_model(model_with_chains(1, &["B", "A"]));
        structure.add_model(model_with_chains(2, &["A", "C"]));

        assert_eq!(structure.chain_ids(), vec!["B", "A", "C"]);
    }

    #[test]
    fn structure_with_empty_model_is_empty() {
        let mut structure = Structure::new();
        structure.add_model(Model::new(1));

        assert!(structure.is_empty());
    }

    #[test]
    fn structure_display_formats_correctly() {
        let mut structure = Structure::new();
        structure.add_model(model_with_chains(1, &["A"]));

        assert_eq!(
            structure.to_string(),
            "Structure { models: 1, chains: 1, residues: 1, atoms: 1 }"
        );
    }
}
