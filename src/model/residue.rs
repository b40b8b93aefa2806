use super::atom::Atom;
use super::types::StandardResidue;
use std::fmt;
use std::str::FromStr;

/// A residue (group) holding its atoms in file order.
///
/// Alternate conformers share a residue and may repeat atom names; lookups by name return
/// the first conformer.
#[derive(Debug, Clone, PartialEq)]
pub struct Residue {
    pub id: i32,
    pub insertion_code: Option<char>,
    pub name: String,
    /// `true` when the source described the residue with `HETATM` records.
    pub hetero: bool,
    atoms: Vec<Atom>,
}

impl Residue {
    pub fn new(id: i32, insertion_code: Option<char>, name: &str, hetero: bool) -> Self {
        Self {
            id,
            insertion_code,
            name: name.to_string(),
            hetero,
            atoms: Vec::new(),
        }
    }

    pub fn standard_name(&self) -> Option<StandardResidue> {
        StandardResidue::from_str(&self.name).ok()
    }

    /// Polymer membership: a known amino or nucleic acid that was not flagged `HETATM`.
    pub fn is_polymer(&self) -> bool {
        !self.hetero && self.standard_name().is_some_and(|s| s.is_polymer())
    }

    pub fn add_atom(&mut self, atom: Atom) {
        self.atoms.push(atom);
    }

    pub fn atom(&self, name: &str) -> Option<&Atom> {
        self.atoms.iter().find(|a| a.name == name)
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn iter_atoms(&self) -> std::slice::Iter<'_, Atom> {
        self.atoms.iter()
    }
}

impl fmt::Display for Residue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Residue {{ id: {}{}, name: \"{}\", hetero: {}, atoms: {} }}",
            self.id,
            self.insertion_code.map(String::from).unwrap_or_default(),
            self.name,
            self.hetero,
            self.atom_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::{Element, Point};

    #[test]
    fn residue_new_starts_empty() {
        let residue = Residue::new(10, Some('A'), "SER", false);

        assert_eq!(residue.id, 10);
        assert_eq!(residue.insertion_code, Some('A'));
        assert_eq!(residue.name, "SER");
        assert!(residue.is_empty());
    }

    #[test]
    fn residue_keeps_alternate_conformers() {
        let mut residue = Residue::new(1, None, "GLY", false);
        residue.add_atom(
            Atom::new("CA", Element::C, Point::new(1.0, 0.0, 0.0)).with_alt_loc(Some('A')),
        );
        residue.add_atom(
            Atom::new("CA", Element::C, Point::new(2.0, 0.0, 0.0)).with_alt_loc(Some('B')),
        );

        assert_eq!(residue.atom_count(), 2);
        assert_eq!(residue.atom("CA").unwrap().alt_loc, Some('A'));
    }

    #[test]
    fn residue_polymer_membership_respects_hetero_flag() {
        assert!(Residue::new(1, None, "ALA", false).is_polymer());
        assert!(Residue::new(1, None, "DA", false).is_polymer());
        assert!(!Residue::new(1, None, "ALA", true).is_polymer());
        assert!(!Residue::new(1, None, "HOH", false).is_polymer());
        assert!(!Residue::new(1, None, "LIG", false).is_polymer());
    }

    #[test]
    fn residue_display_includes_insertion_code() {
        let residue = Residue::new(52, Some('B'), "TYR", false);

        assert_eq!(
            residue.to_string(),
            "Residue { id: 52B, name: \"TYR\", hetero: false, atoms: 0 }"
        );
    }
}
