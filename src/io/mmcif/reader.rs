//! mmCIF structure reader built on the STAR syntax layer.
//!
//! Entry metadata is taken from `_entry`, `_struct`, `_cell` and `_symmetry`; coordinates
//! come from `_atom_site`, whether it is written as a loop or (for single-atom entries) as
//! key/value pairs. Author-assigned identifiers win over label identifiers so residue numbers
//! and chain names match what PDB files of the same entry show.

use super::syntax::{self, Cell, DataBlock, Table};
use crate::io::builder::{ResidueSite, StructureBuilder};
use crate::io::error::Error;
use crate::model::{
    atom::Atom,
    structure::Structure,
    types::{Element, Point, UnitCell},
};
use std::io::Read;
use std::str::FromStr;

const FORMAT: &str = "mmCIF";

/// Column positions of the `_atom_site` items the reader understands.
#[derive(Default)]
struct AtomSiteIndices {
    group_pdb: Option<usize>,
    id: Option<usize>,
    type_symbol: Option<usize>,
    auth_atom_id: Option<usize>,
    label_atom_id: Option<usize>,
    label_alt_id: Option<usize>,
    auth_comp_id: Option<usize>,
    label_comp_id: Option<usize>,
    auth_asym_id: Option<usize>,
    label_asym_id: Option<usize>,
    auth_seq_id: Option<usize>,
    label_seq_id: Option<usize>,
    pdbx_pdb_ins_code: Option<usize>,
    cartn_x: Option<usize>,
    cartn_y: Option<usize>,
    cartn_z: Option<usize>,
    occupancy: Option<usize>,
    b_iso: Option<usize>,
    formal_charge: Option<usize>,
    model_num: Option<usize>,
}

impl AtomSiteIndices {
    fn map(table: &Table) -> Self {
        Self {
            group_pdb: table.column("group_PDB"),
            id: table.column("id"),
            type_symbol: table.column("type_symbol"),
            auth_atom_id: table.column("auth_atom_id"),
            label_atom_id: table.column("label_atom_id"),
            label_alt_id: table.column("label_alt_id"),
            auth_comp_id: table.column("auth_comp_id"),
            label_comp_id: table.column("label_comp_id"),
            auth_asym_id: table.column("auth_asym_id"),
            label_asym_id: table.column("label_asym_id"),
            auth_seq_id: table.column("auth_seq_id"),
            label_seq_id: table.column("label_seq_id"),
            pdbx_pdb_ins_code: table.column("pdbx_PDB_ins_code"),
            cartn_x: table.column("Cartn_x"),
            cartn_y: table.column("Cartn_y"),
            cartn_z: table.column("Cartn_z"),
            occupancy: table.column("occupancy"),
            b_iso: table.column("B_iso_or_equiv"),
            formal_charge: table.column("pdbx_formal_charge"),
            model_num: table.column("pdbx_PDB_model_num"),
        }
    }

    /// Ensures the columns without which no atom can be placed are present.
    fn validate(&self, line: usize) -> Result<(), Error> {
        let required = [
            (
                self.auth_atom_id.or(self.label_atom_id),
                "atom identifier",
            ),
            (self.auth_comp_id.or(self.label_comp_id), "residue name"),
            (self.auth_asym_id.or(self.label_asym_id), "chain identifier"),
            (
                self.auth_seq_id.or(self.label_seq_id),
                "residue sequence number",
            ),
            (self.cartn_x, "Cartn_x"),
            (self.cartn_y, "Cartn_y"),
            (self.cartn_z, "Cartn_z"),
        ];

        match required.iter().find(|(idx, _)| idx.is_none()) {
            Some((_, what)) => Err(Error::parse(
                FORMAT,
                None,
                line,
                format!("_atom_site is missing the {} column", what),
            )),
            None => Ok(()),
        }
    }
}

/// Parses an mmCIF stream into a [`Structure`].
///
/// # Errors
///
/// Returns [`Error::Parse`] on syntax errors, missing required `_atom_site` columns, or
/// malformed numeric values, and [`Error::InconsistentData`] when the block holds no atoms.
///
/// # Examples
///
/// ```
/// use bio_convert::io::read_mmcif_structure;
///
/// let cif = "data_TEST\n\
/// loop_\n\
/// _atom_site.group_PDB\n\
/// _atom_site.type_symbol\n\
/// _atom_site.label_atom_id\n\
/// _atom_site.label_comp_id\n\
/// _atom_site.label_asym_id\n\
/// _atom_site.label_seq_id\n\
/// _atom_site.Cartn_x\n\
/// _atom_site.Cartn_y\n\
/// _atom_site.Cartn_z\n\
/// ATOM N N GLY A 1 0.0 0.0 0.0\n";
/// let structure = read_mmcif_structure(cif.as_bytes()).unwrap();
/// assert_eq!(structure.atom_count(), 1);
/// ```
pub fn read<R: Read>(mut reader: R) -> Result<Structure, Error> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| Error::from_io(e, None))?;
    from_str(&text)
}

/// Parses mmCIF text held in memory.
pub fn from_str(text: &str) -> Result<Structure, Error> {
    let block = syntax::parse(text)?;

    let mut structure = Structure::new();
    read_metadata(&block, &mut structure);

    let table = block.table("_atom_site").ok_or_else(|| {
        Error::inconsistent_data(FORMAT, None, "no _atom_site records found")
    })?;

    let builder = read_atom_site(table)?;
    if builder.atom_count() == 0 {
        return Err(Error::inconsistent_data(
            FORMAT,
            None,
            "_atom_site contains no atoms with coordinates",
        ));
    }

    log::debug!(
        "Parsed {} mmCIF atom sites from block '{}'",
        builder.atom_count(),
        block.name
    );

    for model in builder.finish() {
        structure.add_model(model);
    }

    Ok(structure)
}

fn read_metadata(block: &DataBlock, structure: &mut Structure) {
    structure.id_code = block
        .value("_entry.id")
        .map(str::to_string)
        .or_else(|| (!block.name.is_empty()).then(|| block.name.clone()));

    structure.title = block
        .value("_struct.title")
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "));

    structure.cell = read_cell(block);
}

/// Builds the unit cell when all three edge lengths are present and numeric.
fn read_cell(block: &DataBlock) -> Option<UnitCell> {
    let number = |tag: &str| block.value(tag).and_then(|v| f64::from_str(v).ok());

    let (a, b, c) = match (
        number("_cell.length_a"),
        number("_cell.length_b"),
        number("_cell.length_c"),
    ) {
        (Some(a), Some(b), Some(c)) => (a, b, c),
        _ => {
            if block.table("_cell").is_some() {
                log::debug!("Ignoring _cell without numeric edge lengths");
            }
            return None;
        }
    };

    let mut cell = UnitCell::new(
        a,
        b,
        c,
        number("_cell.angle_alpha").unwrap_or(90.0),
        number("_cell.angle_beta").unwrap_or(90.0),
        number("_cell.angle_gamma").unwrap_or(90.0),
    );
    cell.space_group = block
        .value("_symmetry.space_group_name_H-M")
        .map(str::to_string);
    Some(cell)
}

fn read_atom_site(table: &Table) -> Result<StructureBuilder, Error> {
    let indices = AtomSiteIndices::map(table);
    indices.validate(table.line)?;

    let mut builder = StructureBuilder::new();
    let mut skipped = 0usize;

    for (row_idx, row) in table.rows.iter().enumerate() {
        let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i));
        let text = |idx: Option<usize>| cell(idx).and_then(Cell::as_str);
        let preferred = |auth: Option<usize>, label: Option<usize>| text(auth).or(text(label));
        let row_line = row.first().map(|c| c.line).unwrap_or(table.line);

        let (Some(x), Some(y), Some(z)) = (
            cell(indices.cartn_x),
            cell(indices.cartn_y),
            cell(indices.cartn_z),
        ) else {
            continue;
        };
        let (Some(x), Some(y), Some(z)) = (
            parse_number::<f64>(x, "Cartn_x")?,
            parse_number::<f64>(y, "Cartn_y")?,
            parse_number::<f64>(z, "Cartn_z")?,
        ) else {
            skipped += 1;
            continue;
        };

        let atom_name = preferred(indices.auth_atom_id, indices.label_atom_id).unwrap_or("");
        let res_name = preferred(indices.auth_comp_id, indices.label_comp_id).unwrap_or("");
        let chain_id = preferred(indices.auth_asym_id, indices.label_asym_id).unwrap_or("");

        let seq_id = match cell(indices.auth_seq_id).filter(|c| c.value.is_some()) {
            Some(c) => parse_number::<i32>(c, "auth_seq_id")?,
            None => match cell(indices.label_seq_id) {
                Some(c) => parse_number::<i32>(c, "label_seq_id")?,
                None => None,
            },
        }
        .unwrap_or(1);

        let serial = match cell(indices.id) {
            Some(c) => parse_number::<i32>(c, "id")?,
            None => None,
        }
        .unwrap_or(row_idx as i32 + 1);

        let occupancy = match cell(indices.occupancy) {
            Some(c) => parse_number::<f64>(c, "occupancy")?,
            None => None,
        }
        .unwrap_or(1.0);

        let b_factor = match cell(indices.b_iso) {
            Some(c) => parse_number::<f64>(c, "B_iso_or_equiv")?,
            None => None,
        }
        .unwrap_or(0.0);

        let formal_charge = match cell(indices.formal_charge) {
            Some(c) => parse_number::<i8>(c, "pdbx_formal_charge")?,
            None => None,
        }
        .unwrap_or(0);

        let model = match cell(indices.model_num) {
            Some(c) => parse_number::<i32>(c, "pdbx_PDB_model_num")?,
            None => None,
        }
        .unwrap_or(1);

        let element = text(indices.type_symbol)
            .and_then(|s| Element::from_str(s).ok())
            .unwrap_or(Element::Unknown);

        let alt_loc = text(indices.label_alt_id).and_then(|s| s.chars().next());
        let insertion_code = text(indices.pdbx_pdb_ins_code).and_then(|s| s.chars().next());
        let hetero = text(indices.group_pdb).is_some_and(|g| g.eq_ignore_ascii_case("HETATM"));

        let atom = Atom::new(atom_name, element, Point::new(x, y, z))
            .with_serial(serial)
            .with_alt_loc(alt_loc)
            .with_occupancy(occupancy)
            .with_b_factor(b_factor)
            .with_formal_charge(formal_charge);

        log::trace!("Line {}: atom {} {}", row_line, serial, atom_name);

        builder.add_atom(
            model,
            ResidueSite {
                chain_id,
                seq_id,
                insertion_code,
                name: res_name,
                hetero,
            },
            atom,
        );
    }

    if skipped > 0 {
        log::debug!("Skipped {} atom sites without coordinates", skipped);
    }

    Ok(builder)
}

/// Parses a numeric cell; `Ok(None)` for `.`/`?`, [`Error::Parse`] for garbage.
fn parse_number<T: FromStr>(cell: &Cell, item: &str) -> Result<Option<T>, Error> {
    match cell.as_str() {
        None => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(|_| {
            Error::parse(
                FORMAT,
                None,
                cell.line,
                format!("Invalid _atom_site.{} value '{}'", item, raw),
            )
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "\
loop_
_atom_site.group_PDB
_atom_site.id
_atom_site.type_symbol
_atom_site.label_atom_id
_atom_site.label_alt_id
_atom_site.label_comp_id
_atom_site.label_asym_id
_atom_site.label_seq_id
_atom_site.pdbx_PDB_ins_code
_atom_site.Cartn_x
_atom_site.Cartn_y
_atom_site.Cartn_z
_atom_site.occupancy
_atom_site.B_iso_or_equiv
_atom_site.pdbx_formal_charge
_atom_site.auth_seq_id
_atom_site.auth_comp_id
_atom_site.auth_asym_id
_atom_site.auth_atom_id
_atom_site.pdbx_PDB_model_num
";

    fn parse(body: &str) -> Result<Structure, Error> {
        from_str(&format!("data_1ABC\n{}{}", HEADER, body))
    }

    #[test]
    fn read_parses_metadata() {
        let cif = "\
data_1ABC
_entry.id 1ABC
_struct.title
;
CRYSTAL STRUCTURE
OF A TEST
;
_cell.length_a 10.000
_cell.length_b 20.000
_cell.length_c 30.000
_cell.angle_alpha 90.00
_cell.angle_beta 90.00
_cell.angle_gamma 120.00
_symmetry.space_group_name_H-M 'P 61'
#
_atom_site.group_PDB ATOM
_atom_site.type_symbol N
_atom_site.label_atom_id N
_atom_site.label_comp_id GLY
_atom_site.label_asym_id A
_atom_site.label_seq_id 1
_atom_site.Cartn_x 1.0
_atom_site.Cartn_y 2.0
_atom_site.Cartn_z 3.0
";

        let structure = from_str(cif).unwrap();

        assert_eq!(structure.id_code.as_deref(), Some("1ABC"));
        assert_eq!(
            structure.title.as_deref(),
            Some("CRYSTAL STRUCTURE OF A TEST")
        );
        let cell = structure.cell.as_ref().unwrap();
        assert!((cell.gamma - 120.0).abs() < 1e-6);
        assert_eq!(cell.space_group.as_deref(), Some("P 61"));
        assert_eq!(structure.atom_count(), 1);
    }

    #[test]
    fn read_prefers_author_identifiers() {
        let structure = parse(
            "ATOM 1 C CA . ALA A 1 ? 1.0 2.0 3.0 1.00 10.0 ? 42 ALA X CA 1\n\
             HETATM 2 O O . HOH B . ? 4.0 5.0 6.0 1.00 20.0 ? 301 HOH X O 1\n",
        )
        .unwrap();

        let model = structure.first_model().unwrap();
        assert_eq!(structure.chain_ids(), vec!["X"]);
        let chain = model.chain("X").unwrap();
        assert_eq!(chain.residue(42, None).unwrap().name, "ALA");
        let water = chain.residue(301, None).unwrap();
        assert!(water.hetero);
        assert!((water.atom("O").unwrap().b_factor - 20.0).abs() < 1e-6);
    }

    #[test]
    fn read_keeps_annotations() {
        let structure = parse(
            "HETATM 7 ZN ZN . ZN C 1 B 1.0 2.0 3.0 0.50 15.0 2 501 ZN C ZN 1\n\
             ATOM 8 C CA A SER C 2 ? 1.0 2.0 3.0 0.60 15.0 ? 12 SER C CA 1\n",
        )
        .unwrap();

        let atoms: Vec<_> = structure.iter_atoms().collect();
        assert_eq!(atoms[0].serial, 7);
        assert_eq!(atoms[0].element, Element::Zn);
        assert_eq!(atoms[0].formal_charge, 2);
        assert!((atoms[0].occupancy - 0.5).abs() < 1e-6);
        assert_eq!(atoms[1].alt_loc, Some('A'));

        let chain = structure.first_model().unwrap().chain("C").unwrap();
        assert!(chain.residue(501, Some('B')).is_some());
    }

    #[test]
    fn read_splits_models() {
        let structure = parse(
            "ATOM 1 N N . GLY A 1 ? 0.0 0.0 0.0 1.00 0.0 ? 1 GLY A N 1\n\
             ATOM 2 N N . GLY A 1 ? 0.5 0.0 0.0 1.00 0.0 ? 1 GLY A N 2\n",
        )
        .unwrap();

        assert_eq!(structure.model_count(), 2);
        assert!(structure.model(2).is_some());
    }

    #[test]
    fn read_skips_rows_without_coordinates() {
        let structure = parse(
            "ATOM 1 N N . GLY A 1 ? 0.0 0.0 0.0 1.00 0.0 ? 1 GLY A N 1\n\
             ATOM 2 C CA . GLY A 1 ? ? ? ? 1.00 0.0 ? 1 GLY A CA 1\n",
        )
        .unwrap();

        assert_eq!(structure.atom_count(), 1);
    }

    #[test]
    fn read_reports_malformed_number_with_line() {
        let err = parse("ATOM 1 N N . GLY A 1 ? abc 0.0 0.0 1.00 0.0 ? 1 GLY A N 1\n")
            .unwrap_err();

        match err {
            Error::Parse {
                line_number,
                details,
                ..
            } => {
                assert_eq!(line_number, 23);
                assert!(details.contains("Cartn_x"));
            }
            other => panic!("expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn read_requires_coordinate_columns() {
        let err = from_str("data_X\nloop_\n_atom_site.id\n_atom_site.label_atom_id\n1 N\n")
            .unwrap_err();

        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn read_rejects_blocks_without_atom_site() {
        let err = from_str("data_X\n_entry.id X\n").unwrap_err();

        assert!(matches!(err, Error::InconsistentData { .. }));
    }
}
