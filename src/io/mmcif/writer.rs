//! mmCIF writer utilities that encode structures into loop-based records.
//!
//! The serializer emits a `data_` header, entry metadata (`_entry`, `_struct`, `_cell`,
//! `_symmetry`), the polymer sequence of every chain in `_entity_poly_seq`, and a complete
//! `_atom_site` loop carrying alternate locations, occupancies, B-factors, charges and model
//! numbers so PDB and MMTF inputs convert without losing per-atom annotations.

use crate::io::error::Error;
use crate::model::{
    atom::Atom, chain::Chain, residue::Residue, structure::Structure, types::UnitCell,
};
use std::collections::HashMap;
use std::io::Write;

const DEFAULT_BLOCK_NAME: &str = "bio_convert_export";

const ATOM_SITE_COLUMNS: [&str; 21] = [
    "group_PDB",
    "id",
    "type_symbol",
    "label_atom_id",
    "label_alt_id",
    "label_comp_id",
    "label_asym_id",
    "label_entity_id",
    "label_seq_id",
    "pdbx_PDB_ins_code",
    "Cartn_x",
    "Cartn_y",
    "Cartn_z",
    "occupancy",
    "B_iso_or_equiv",
    "pdbx_formal_charge",
    "auth_seq_id",
    "auth_comp_id",
    "auth_asym_id",
    "auth_atom_id",
    "pdbx_PDB_model_num",
];

/// Serializes a [`Structure`] into mmCIF format.
///
/// # Arguments
///
/// * `writer` - Destination that implements [`Write`].
/// * `structure` - Source structure providing metadata, models and atoms.
///
/// # Returns
///
/// [`Ok`] on success or [`Error`] if any IO operation fails.
pub fn write_structure<W: Write>(writer: W, structure: &Structure) -> Result<(), Error> {
    let mut ctx = WriterContext::new(writer, structure);

    ctx.write_header(structure)?;

    if let Some(cell) = &structure.cell {
        ctx.write_cell(cell)?;
    }

    ctx.write_entity_poly_seq(structure)?;

    ctx.write_atoms(structure)?;

    ctx.flush()
}

/// Renders the structure as mmCIF text held in memory.
pub fn to_string(structure: &Structure) -> Result<String, Error> {
    let mut buffer = Vec::new();
    write_structure(&mut buffer, structure)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Stateful helper that tracks entity numbering and writes mmCIF sections.
struct WriterContext<W> {
    writer: W,
    block_name: String,
    entity_ids: HashMap<String, usize>,
}

impl<W: Write> WriterContext<W> {
    /// Creates a writer context and assigns one entity per chain in first-appearance order.
    fn new(writer: W, structure: &Structure) -> Self {
        let block_name = structure
            .id_code
            .as_deref()
            .map(|id| id.split_whitespace().collect::<String>())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| DEFAULT_BLOCK_NAME.to_string());

        let entity_ids = structure
            .chain_ids()
            .into_iter()
            .enumerate()
            .map(|(idx, id)| (id.to_string(), idx + 1))
            .collect();

        Self {
            writer,
            block_name,
            entity_ids,
        }
    }

    fn line(&mut self, text: &str) -> Result<(), Error> {
        writeln!(self.writer, "{}", text).map_err(|e| Error::from_io(e, None))
    }

    fn flush(&mut self) -> Result<(), Error> {
        self.writer.flush().map_err(|e| Error::from_io(e, None))
    }

    /// Writes the `data_` block header, `_entry.id` and `_struct.title`.
    fn write_header(&mut self, structure: &Structure) -> Result<(), Error> {
        let name = self.block_name.clone();
        self.line(&format!("data_{}", name))?;
        self.line("#")?;
        self.line(&format!("_entry.id   {}", quote_string(&name)))?;
        self.line("#")?;

        if let Some(title) = &structure.title {
            if title.contains('\n') || (title.contains('\'') && title.contains('"')) {
                self.line("_struct.title")?;
                self.line(";")?;
                self.line(title)?;
                self.line(";")?;
            } else {
                self.line(&format!("_struct.title   {}", quote_string(title)))?;
            }
            self.line("#")?;
        }
        Ok(())
    }

    /// Emits `_cell.*` parameters and the space group.
    fn write_cell(&mut self, cell: &UnitCell) -> Result<(), Error> {
        let entry = quote_string(&self.block_name);
        self.line(&format!("_cell.entry_id           {}", entry))?;
        self.line(&format!("_cell.length_a           {:.3}", cell.a))?;
        self.line(&format!("_cell.length_b           {:.3}", cell.b))?;
        self.line(&format!("_cell.length_c           {:.3}", cell.c))?;
        self.line(&format!("_cell.angle_alpha        {:.2}", cell.alpha))?;
        self.line(&format!("_cell.angle_beta         {:.2}", cell.beta))?;
        self.line(&format!("_cell.angle_gamma        {:.2}", cell.gamma))?;
        self.line("_cell.Z_PDB              1")?;
        self.line("#")?;
        self.line(&format!("_symmetry.entry_id                 {}", entry))?;
        self.line(&format!(
            "_symmetry.space_group_name_H-M     {}",
            quote_string(cell.space_group_or_p1())
        ))?;
        self.line("#")
    }

    /// Lists polymer residues of each chain (taken from the first model containing it).
    fn write_entity_poly_seq(&mut self, structure: &Structure) -> Result<(), Error> {
        let mut rows = Vec::new();
        let mut written: Vec<&str> = Vec::new();

        for chain in structure.iter_chains() {
            if written.contains(&chain.id.as_str()) {
                continue;
            }
            written.push(chain.id.as_str());

            let entity_id = self.entity_id(&chain.id);
            for (i, residue) in polymer_residues(chain).enumerate() {
                rows.push(format!(
                    "{} {} {} n",
                    entity_id,
                    i + 1,
                    quote_string(&residue.name)
                ));
            }
        }

        if rows.is_empty() {
            return Ok(());
        }

        self.line("loop_")?;
        self.line("_entity_poly_seq.entity_id")?;
        self.line("_entity_poly_seq.num")?;
        self.line("_entity_poly_seq.mon_id")?;
        self.line("_entity_poly_seq.hetero")?;
        for row in rows {
            self.line(&row)?;
        }
        self.line("#")
    }

    fn entity_id(&self, chain_id: &str) -> usize {
        self.entity_ids.get(chain_id).copied().unwrap_or(1)
    }

    /// Writes the `_atom_site` loop with sequential atom IDs across all models.
    fn write_atoms(&mut self, structure: &Structure) -> Result<(), Error> {
        self.line("loop_")?;
        for column in ATOM_SITE_COLUMNS {
            self.line(&format!("_atom_site.{}", column))?;
        }

        let mut atom_id = 1usize;
        for model in structure.iter_models() {
            for chain in model.iter_chains() {
                let entity_id = self.entity_id(&chain.id);
                let mut polymer_index = 0usize;

                for residue in chain.iter_residues() {
                    let label_seq_id = if residue.is_polymer() {
                        polymer_index += 1;
                        polymer_index.to_string()
                    } else {
                        ".".to_string()
                    };

                    for atom in residue.iter_atoms() {
                        let row = AtomRow {
                            atom_id,
                            atom,
                            residue,
                            chain,
                            entity_id,
                            label_seq_id: &label_seq_id,
                            model_num: model.serial,
                        };
                        self.line(&row.render())?;
                        atom_id += 1;
                    }
                }
            }
        }

        self.line("#")
    }
}

/// Values of one `_atom_site` row.
struct AtomRow<'a> {
    atom_id: usize,
    atom: &'a Atom,
    residue: &'a Residue,
    chain: &'a Chain,
    entity_id: usize,
    label_seq_id: &'a str,
    model_num: i32,
}

impl AtomRow<'_> {
    fn render(&self) -> String {
        let group_pdb = if self.residue.hetero { "HETATM" } else { "ATOM" };
        let atom_name = quote_string(&self.atom.name);
        let comp_id = quote_string(&self.residue.name);
        let asym_id = quote_string(&self.chain.id);
        let alt_id = optional_char(self.atom.alt_loc, ".");
        let ins_code = optional_char(self.residue.insertion_code, "?");
        let charge = match self.atom.formal_charge {
            0 => "?".to_string(),
            c => c.to_string(),
        };

        format!(
            "{group_pdb} {id} {type_symbol} {atom_name} {alt_id} {comp_id} {asym_id} {entity_id} {label_seq_id} {ins_code} {x:.3} {y:.3} {z:.3} {occupancy:.2} {b_factor:.2} {charge} {auth_seq_id} {comp_id} {asym_id} {atom_name} {model_num}",
            id = self.atom_id,
            type_symbol = self.atom.element.pdb_symbol(),
            entity_id = self.entity_id,
            label_seq_id = self.label_seq_id,
            x = self.atom.pos.x,
            y = self.atom.pos.y,
            z = self.atom.pos.z,
            occupancy = self.atom.occupancy,
            b_factor = self.atom.b_factor,
            auth_seq_id = self.residue.id,
            model_num = self.model_num,
        )
    }
}

fn polymer_residues(chain: &Chain) -> impl Iterator<Item = &Residue> {
    chain.iter_residues().filter(|r| r.is_polymer())
}

fn optional_char(value: Option<char>, missing: &str) -> String {
    value
        .map(|c| quote_string(&c.to_string()))
        .unwrap_or_else(|| missing.to_string())
}

/// Quotes a value when a bare token would be misread by a CIF parser.
///
/// A quote only closes a value when whitespace follows it, so the delimiter is chosen to avoid
/// such pairs inside the value. Values that defeat both delimiters, or span lines, are written
/// as `;` text fields on lines of their own.
fn quote_string(s: &str) -> String {
    if s.is_empty() {
        return "?".to_string();
    }
    let reserved = matches!(s, "." | "?")
        || s.starts_with(['_', '#', '$', ';', '[', ']'])
        || s.get(..5).is_some_and(|p| {
            p.eq_ignore_ascii_case("data_") || p.eq_ignore_ascii_case("loop_")
        });
    if !reserved && !s.contains(char::is_whitespace) && !s.contains('\'') && !s.contains('"')
    {
        return s.to_string();
    }

    let closes_early = |quote: char| {
        s.char_indices()
            .any(|(i, c)| c == quote && s[i + 1..].starts_with(char::is_whitespace))
    };
    let delimiters = if s.contains('\'') {
        ['"', '\'']
    } else {
        ['\'', '"']
    };
    match delimiters.into_iter().find(|&q| !closes_early(q)) {
        Some(quote) if !s.contains('\n') => format!("{quote}{s}{quote}"),
        _ => format!("\n;{}\n;\n", s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::mmcif::reader;
    use crate::model::models::Model;
    use crate::model::types::{Element, Point};

    fn build_test_structure() -> Structure {
        let mut structure = Structure::new();
        structure.id_code = Some("1ABC".to_string());
        structure.title = Some("Structure of a 'test' protein".to_string());
        structure.cell = Some(UnitCell::new(10.0, 11.0, 12.0, 90.0, 90.0, 90.0));

        let mut model = Model::new(1);
        let mut chain = Chain::new("A");

        let mut gly = Residue::new(10, None, "GLY", false);
        gly.add_atom(Atom::new("N", Element::N, Point::new(0.0, 0.0, 0.0)));
        gly.add_atom(
            Atom::new("CA", Element::C, Point::new(1.0, 0.0, 0.0))
                .with_alt_loc(Some('A'))
                .with_occupancy(0.5),
        );
        chain.add_residue(gly);

        let mut lig = Residue::new(301, Some('B'), "LIG", true);
        lig.add_atom(
            Atom::new("O5'", Element::O, Point::new(4.0, 5.0, 6.0)).with_formal_charge(-1),
        );
        chain.add_residue(lig);

        model.add_chain(chain);
        structure.add_model(model);
        structure
    }

    #[test]
    fn write_structure_outputs_metadata_and_atom_site() {
        let text = to_string(&build_test_structure()).unwrap();

        assert!(text.starts_with("data_1ABC\n"));
        assert!(text.contains("_entry.id   1ABC"));
        assert!(text.contains("_struct.title   \"Structure of a 'test' protein\""));
        assert!(text.contains("_cell.length_a           10.000"));
        assert!(text.contains("_symmetry.space_group_name_H-M     'P 1'"));
        assert!(text.contains("_atom_site.pdbx_PDB_model_num"));
        assert!(text.contains("ATOM 1 N N . GLY A 1 1 ? 0.000 0.000 0.000 1.00 0.00 ? 10 GLY A N 1"));
        assert!(text.contains("ATOM 2 C CA A GLY A 1 1 ?"));
        assert!(text.contains(
            "HETATM 3 O \"O5'\" . LIG A 1 . B 4.000 5.000 6.000 1.00 0.00 -1 301 LIG A \"O5'\" 1"
        ));
    }

    #[test]
    fn write_structure_lists_polymer_sequence_only() {
        let text = to_string(&build_test_structure()).unwrap();

        assert!(text.contains("_entity_poly_seq.mon_id"));
        assert!(text.contains("1 1 GLY n"));
        assert!(!text.contains("1 2 LIG n"));
    }

    #[test]
    fn write_structure_omits_poly_seq_without_polymers() {
        let mut structure = Structure::new();
        let mut model = Model::new(1);
        let mut chain = Chain::new("W");
        let mut water = Residue::new(1, None, "HOH", true);
        water.add_atom(Atom::new("O", Element::O, Point::origin()));
        chain.add_residue(water);
        model.add_chain(chain);
        structure.add_model(model);

        let text = to_string(&structure).unwrap();

        assert!(text.starts_with("data_bio_convert_export\n"));
        assert!(!text.contains("_entity_poly_seq"));
        assert!(!text.contains("_cell."));
    }

    #[test]
    fn written_text_reads_back() {
        let original = build_test_structure();
        let text = to_string(&original).unwrap();

        let parsed = reader::from_str(&text).unwrap();

        assert_eq!(parsed.atom_count(), 3);
        assert_eq!(parsed.id_code.as_deref(), Some("1ABC"));
        assert_eq!(parsed.title, original.title);
        let chain = parsed.first_model().unwrap().chain("A").unwrap();
        let lig = chain.residue(301, Some('B')).unwrap();
        assert!(lig.hetero);
        let oxygen = lig.atom("O5'").unwrap();
        assert_eq!(oxygen.formal_charge, -1);
        let ca = chain.residue(10, None).unwrap().atom("CA").unwrap();
        assert_eq!(ca.alt_loc, Some('A'));
        assert!((ca.occupancy - 0.5).abs() < 1e-6);
    }

    #[test]
    fn quote_string_handles_reserved_tokens() {
        assert_eq!(quote_string("CA"), "CA");
        assert_eq!(quote_string(""), "?");
        assert_eq!(quote_string("."), "'.'");
        assert_eq!(quote_string("_x"), "'_x'");
        assert_eq!(quote_string("data_x"), "'data_x'");
        assert_eq!(quote_string("O5'"), "\"O5'\"");
        assert_eq!(quote_string("two words"), "'two words'");
        assert_eq!(quote_string("it's \"x\""), "\"it's \"x\"\"");
        assert_eq!(quote_string("a' b\" c"), "\n;a' b\" c\n;\n");
    }

    #[test]
    fn values_with_both_quote_kinds_read_back() {
        let mut structure = Structure::new();
        let mut model = Model::new(1);
        let mut chain = Chain::new("A");
        let mut ligand = Residue::new(1, None, "LIG", true);
        ligand.add_atom(Atom::new("C1' \"x\" y", Element::C, Point::new(1.0, 2.0, 3.0)));
        ligand.add_atom(Atom::new("N'\"", Element::N, Point::new(4.0, 5.0, 6.0)));
        chain.add_residue(ligand);
        model.add_chain(chain);
        structure.add_model(model);

        let text = to_string(&structure).unwrap();
        let parsed = reader::from_str(&text).unwrap();

        let names: Vec<_> = parsed.iter_atoms().map(|a| a.name.to_string()).collect();
        assert_eq!(names, vec!["C1' \"x\" y", "N'\""]);
        let second = parsed.iter_atoms().nth(1).unwrap();
        assert!((second.pos.z - 6.0).abs() < 1e-6);
    }
}
