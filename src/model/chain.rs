use super::atom::Atom;
use super::residue::Residue;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    pub id: String,
    residues: Vec<Residue>,
}

impl Chain {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            residues: Vec::new(),
        }
    }

    /// Appends a residue. Numbers may repeat within a chain (waters or ligands reusing a
    /// polymer number, wrapped numbering), so no uniqueness is enforced.
    pub fn add_residue(&mut self, residue: Residue) {
        self.residues.push(residue);
    }

    /// First residue with the given number and insertion code.
    pub fn residue(&self, id: i32, insertion_code: Option<char>) -> Option<&Residue> {
        self.residues
            .iter()
            .find(|r| r.id == id && r.insertion_code == insertion_code)
    }

    pub fn residues(&self) -> &[Residue] {
        &self.residues
    }

    pub fn residue_count(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    pub fn iter_residues(&self) -> std::slice::Iter<'_, Residue> {
        self.residues.iter()
    }

    pub fn iter_atoms(&self) -> impl Iterator<Item = &Atom> {
        self.residues.iter().flat_map(|r| r.iter_atoms())
    }

    /// Last residue belonging to the polymer, which closes the chain with a `TER` record.
    pub fn last_polymer_residue(&self) -> Option<&Residue> {
        self.residues.iter().rev().find(|r| r.is_polymer())
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Chain {{ id: \"{}\", residues: {} }}",
            self.id,
            self.residue_count()
        )
    }
}
